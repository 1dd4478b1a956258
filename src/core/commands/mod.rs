// src/core/commands/mod.rs

//! The action registry and the handlers behind every operator keyword.
//!
//! Keywords are matched exactly against the normalized command token. Tokens
//! that only share a prefix with registered keywords (`backupz`, `back`) are
//! not guessed at; they resolve to [`Resolution::NotFound`] with the near
//! candidates attached so the reply can point the operator at them.

pub mod command_trait;
pub mod logs;
pub mod maintenance;
pub mod pipeline;
pub mod probe;

use crate::core::RelayError;
use command_trait::ActionHandler;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The declared behavior of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Read-only and fast.
    Probe,
    /// Bounded log tail that may overflow to a file.
    LogRetrieval,
    /// Changes system state; runs exclusively per pipeline.
    MutatingPipeline,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Probe => "probe",
            CommandKind::LogRetrieval => "log-retrieval",
            CommandKind::MutatingPipeline => "mutating-pipeline",
        };
        f.write_str(name)
    }
}

/// A registered command. Immutable once the registry is built.
#[derive(Clone)]
pub struct Command {
    pub keyword: &'static str,
    pub summary: &'static str,
    pub kind: CommandKind,
    pub handler: Arc<dyn ActionHandler>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("keyword", &self.keyword)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// The result of looking up a command token.
#[derive(Debug)]
pub enum Resolution<'a> {
    Found(&'a Command),
    NotFound {
        token: String,
        /// Registered keywords that are a prefix of the token or that the token is a prefix of.
        suggestions: Vec<&'static str>,
    },
}

/// Maps keywords to commands. Pure lookup, no I/O.
#[derive(Default)]
pub struct Registry {
    commands: HashMap<&'static str, Command>,
    order: Vec<&'static str>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a keyword. Duplicate keywords are a fatal startup error.
    pub fn register(
        &mut self,
        keyword: &'static str,
        summary: &'static str,
        kind: CommandKind,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<(), RelayError> {
        if normalize_token(keyword) != keyword {
            return Err(RelayError::Internal(format!(
                "keyword '{keyword}' must be lowercase and hyphenated"
            )));
        }
        if self.commands.contains_key(keyword) {
            return Err(RelayError::DuplicateKeyword(keyword.to_string()));
        }
        self.commands.insert(
            keyword,
            Command {
                keyword,
                summary,
                kind,
                handler,
            },
        );
        self.order.push(keyword);
        Ok(())
    }

    /// Resolves the command text that followed the command marker.
    pub fn resolve(&self, text: &str) -> Resolution<'_> {
        let token = normalize_token(text);
        if let Some(command) = self.commands.get(token.as_str()) {
            return Resolution::Found(command);
        }
        let suggestions = if token.is_empty() {
            Vec::new()
        } else {
            self.order
                .iter()
                .copied()
                .filter(|k| k.starts_with(token.as_str()) || token.starts_with(k))
                .collect()
        };
        Resolution::NotFound { token, suggestions }
    }

    /// Iterates registered commands in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.order.iter().filter_map(|k| self.commands.get(k))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Extracts the keyword from command text.
///
/// Takes the first whitespace-separated token, drops a leading command marker
/// and any `@botname` suffix, lowercases it, and accepts `_` for `-` since
/// Telegram command names cannot contain hyphens.
pub fn normalize_token(text: &str) -> String {
    let token = text.split_whitespace().next().unwrap_or("");
    let token = token.trim_start_matches('/');
    let token = token.split('@').next().unwrap_or("");
    token.to_lowercase().replace('_', "-")
}

/// Builds the registry with every operator-facing command.
pub fn default_registry() -> Result<Registry, RelayError> {
    use maintenance::{BackupCommand, ListBackupsCommand, UpdateCommand};
    use probe::{CommandProbe, HealthProbe, HelpCommand, StatusProbe};

    let mut registry = Registry::new();
    let help: Arc<dyn ActionHandler> = Arc::new(HelpCommand);
    let backup: Arc<dyn ActionHandler> = Arc::new(BackupCommand);

    registry.register("help", "This help", CommandKind::Probe, help.clone())?;
    registry.register("start", "Same as /help", CommandKind::Probe, help)?;
    registry.register(
        "status",
        "Uptime and running containers",
        CommandKind::Probe,
        Arc::new(StatusProbe),
    )?;
    registry.register(
        "logs",
        "Tail of the container logs",
        CommandKind::LogRetrieval,
        Arc::new(logs::LogsCommand),
    )?;
    registry.register(
        "backup",
        "Run the backup script",
        CommandKind::MutatingPipeline,
        backup.clone(),
    )?;
    registry.register(
        "backups",
        "Same as /backup",
        CommandKind::MutatingPipeline,
        backup,
    )?;
    registry.register(
        "list-backups",
        "Most recent backup archives",
        CommandKind::Probe,
        Arc::new(ListBackupsCommand),
    )?;
    registry.register(
        "update",
        "Backup, then run the update script",
        CommandKind::MutatingPipeline,
        Arc::new(UpdateCommand),
    )?;
    registry.register(
        "docker-status",
        "All containers with image and state",
        CommandKind::Probe,
        Arc::new(CommandProbe::docker_status()),
    )?;
    registry.register(
        "health",
        "Container state and health endpoint",
        CommandKind::Probe,
        Arc::new(HealthProbe),
    )?;
    registry.register(
        "disk",
        "Filesystem usage",
        CommandKind::Probe,
        Arc::new(CommandProbe::disk()),
    )?;
    registry.register(
        "memory",
        "Memory usage",
        CommandKind::Probe,
        Arc::new(CommandProbe::memory()),
    )?;
    registry.register(
        "version",
        "Version of the managed service",
        CommandKind::Probe,
        Arc::new(CommandProbe::version()),
    )?;

    Ok(registry)
}
