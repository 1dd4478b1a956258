// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use opsrelay::config::Config;
use opsrelay::core::RelayError;
use opsrelay::core::commands::Registry;
use opsrelay::core::handler::{DispatchOutcome, Dispatcher};
use opsrelay::core::process::{ProcessOutput, ProcessRunner, ProcessSpec};
use opsrelay::core::protocol::{Activity, FormatHint, InboundMessage};
use opsrelay::core::state::RelayState;
use opsrelay::core::transport::Transport;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// The principal id every test context is configured with.
pub const PRINCIPAL: &str = "4242";
/// A sender that is not the principal.
pub const STRANGER: &str = "1337";

pub const BACKUP_SCRIPT: &str = "/scripts/backup_n8n.sh";
pub const UPDATE_SCRIPT: &str = "/scripts/update_n8n.sh";

/// One message captured by the [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        recipient: String,
        text: String,
        format: FormatHint,
    },
    File {
        recipient: String,
        path: PathBuf,
        caption: String,
        /// File contents read at send time, before the cleaner can remove it.
        contents: String,
    },
}

impl Sent {
    pub fn recipient(&self) -> &str {
        match self {
            Sent::Text { recipient, .. } | Sent::File { recipient, .. } => recipient,
        }
    }

    /// The message text, or the caption for files.
    pub fn text(&self) -> &str {
        match self {
            Sent::Text { text, .. } => text,
            Sent::File { caption, .. } => caption,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Sent::File { .. })
    }
}

/// A transport that records everything instead of talking to a network.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    activities: Mutex<Vec<(String, Activity)>>,
    /// When set, every send is recorded and then reported as failed.
    pub fail_sends: AtomicBool,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn activities(&self) -> Vec<(String, Activity)> {
        self.activities.lock().unwrap().clone()
    }

    fn result(&self) -> Result<(), RelayError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            Err(RelayError::Api("sendMessage: Bad Request".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(
        &self,
        recipient: &str,
        text: &str,
        format: FormatHint,
    ) -> Result<(), RelayError> {
        self.sent.lock().unwrap().push(Sent::Text {
            recipient: recipient.to_string(),
            text: text.to_string(),
            format,
        });
        self.result()
    }

    async fn send_file(
        &self,
        recipient: &str,
        path: &Path,
        caption: &str,
    ) -> Result<(), RelayError> {
        let contents = std::fs::read_to_string(path).unwrap_or_default();
        self.sent.lock().unwrap().push(Sent::File {
            recipient: recipient.to_string(),
            path: path.to_path_buf(),
            caption: caption.to_string(),
            contents,
        });
        self.result()
    }

    async fn send_activity(&self, recipient: &str, activity: Activity) -> Result<(), RelayError> {
        self.activities
            .lock()
            .unwrap()
            .push((recipient.to_string(), activity));
        Ok(())
    }
}

/// What a scripted process does when invoked.
#[derive(Debug, Clone)]
pub enum Script {
    Output(ProcessOutput),
    Timeout,
}

#[derive(Debug, Clone)]
struct Rule {
    prefix: String,
    script: Script,
    delay: Option<Duration>,
}

/// A process runner that answers from rules matched against the command line.
///
/// Rules match when the rendered command line starts with their prefix; the
/// most recently added matching rule wins. Unmatched commands succeed with no output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    invocations: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    fn push(&self, prefix: &str, script: Script, delay: Option<Duration>) {
        self.rules.lock().unwrap().push(Rule {
            prefix: prefix.to_string(),
            script,
            delay,
        });
    }

    /// Commands starting with `prefix` exit 0 and print `stdout`.
    pub fn succeed(&self, prefix: &str, stdout: &str) {
        self.push(prefix, Script::Output(ok_output(stdout)), None);
    }

    /// Like [`succeed`](Self::succeed), but the process takes `delay` to finish.
    pub fn succeed_after(&self, prefix: &str, stdout: &str, delay: Duration) {
        self.push(prefix, Script::Output(ok_output(stdout)), Some(delay));
    }

    /// Commands starting with `prefix` exit with `code` and print `stderr`.
    pub fn fail(&self, prefix: &str, code: i32, stderr: &str) {
        self.push(
            prefix,
            Script::Output(ProcessOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
            None,
        );
    }

    /// Commands starting with `prefix` exceed their budget.
    pub fn time_out(&self, prefix: &str) {
        self.push(prefix, Script::Timeout, None);
    }

    /// Every command line run so far, in invocation order.
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    /// How many invocations started with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.invocations()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }
}

fn ok_output(stdout: &str) -> ProcessOutput {
    ProcessOutput {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, spec: &ProcessSpec, timeout: Duration) -> Result<ProcessOutput, RelayError> {
        let line = spec.to_string();
        self.invocations.lock().unwrap().push(line.clone());

        let rule = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|rule| line.starts_with(&rule.prefix))
            .cloned();

        let Some(rule) = rule else {
            return Ok(ok_output(""));
        };
        if let Some(delay) = rule.delay {
            tokio::time::sleep(delay).await;
        }
        match rule.script {
            Script::Output(output) => Ok(output),
            Script::Timeout => Err(RelayError::ProcessTimeout {
                command: line,
                secs: timeout.as_secs(),
            }),
        }
    }
}

/// Builds a configuration rooted in `dir`, with `overrides` applied on top.
pub fn test_config(dir: &Path, overrides: &[(&str, &str)]) -> Config {
    let mut values: HashMap<String, String> = HashMap::new();
    values.insert("TG_BOT_TOKEN".into(), "123456:TEST-TOKEN".into());
    values.insert("TG_USER_ID".into(), PRINCIPAL.into());
    values.insert(
        "RELAY_BACKUP_DIR".into(),
        dir.join("backups").to_string_lossy().into_owned(),
    );
    values.insert(
        "RELAY_DUMP_DIR".into(),
        dir.join("dumps").to_string_lossy().into_owned(),
    );
    values.insert("RELAY_BACKUP_SCRIPT".into(), BACKUP_SCRIPT.into());
    values.insert("RELAY_UPDATE_SCRIPT".into(), UPDATE_SCRIPT.into());
    values.insert("RELAY_PROBE_TIMEOUT_SECS".into(), "5".into());
    for (key, value) in overrides {
        values.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(move |key| values.get(key).cloned()).expect("test config should be valid")
}

/// TestContext provides a complete relay with stubbed transport and processes.
pub struct TestContext {
    pub state: Arc<RelayState>,
    pub dispatcher: Dispatcher,
    pub transport: Arc<RecordingTransport>,
    pub runner: Arc<ScriptedRunner>,
    cleanup_rx: Mutex<mpsc::Receiver<PathBuf>>,
    arrival: AtomicU64,
    pub dir: TempDir,
}

impl TestContext {
    /// Creates a new test context with the default registry and configuration.
    pub fn new() -> Self {
        Self::with_overrides(&[])
    }

    /// Creates a new test context with configuration overrides.
    pub fn with_overrides(overrides: &[(&str, &str)]) -> Self {
        Self::build(overrides, None)
    }

    /// Creates a new test context around a custom registry.
    pub fn with_registry(registry: Registry) -> Self {
        Self::build(&[], Some(registry))
    }

    fn build(overrides: &[(&str, &str)], registry: Option<Registry>) -> Self {
        init_test_tracing();

        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("dumps")).expect("create dump dir");
        let config = test_config(dir.path(), overrides);

        let transport = Arc::new(RecordingTransport::default());
        let runner = Arc::new(ScriptedRunner::default());
        let init = match registry {
            Some(registry) => {
                RelayState::with_registry(config, registry, transport.clone(), runner.clone())
            }
            None => RelayState::initialize(config, transport.clone(), runner.clone()),
        }
        .expect("Failed to initialize relay state");

        Self {
            dispatcher: Dispatcher::new(init.state.clone()),
            state: init.state,
            transport,
            runner,
            cleanup_rx: Mutex::new(init.cleanup_rx),
            arrival: AtomicU64::new(1),
            dir,
        }
    }

    /// Dispatches `text` as if it arrived from `sender`.
    pub async fn send(&self, sender: &str, text: &str) -> DispatchOutcome {
        let order = self.arrival.fetch_add(1, Ordering::SeqCst);
        self.dispatcher
            .dispatch(InboundMessage::new(sender, text, order))
            .await
    }

    /// Dispatches `text` from the principal.
    pub async fn command(&self, text: &str) -> DispatchOutcome {
        self.send(PRINCIPAL, text).await
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.transport.sent()
    }

    /// The only message sent so far; panics if there is not exactly one.
    pub fn single_response(&self) -> Sent {
        let sent = self.sent();
        assert_eq!(sent.len(), 1, "expected exactly one response, got {sent:?}");
        sent.into_iter().next().unwrap()
    }

    /// Paths the dispatcher queued for the file cleaner.
    pub fn queued_cleanups(&self) -> Vec<PathBuf> {
        let mut rx = self.cleanup_rx.lock().unwrap();
        let mut paths = Vec::new();
        while let Ok(path) = rx.try_recv() {
            paths.push(path);
        }
        paths
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.dir.path().join("backups")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

fn init_test_tracing() {
    // Ignore the error if another test already installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("warn"))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
