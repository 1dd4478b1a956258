// src/core/tasks/file_cleaner.rs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Removes per-request dump files once their delivery attempt has finished.
///
/// The dispatcher pushes the path of every transient file it sent (or failed
/// to send) into the queue; deletion happens here so a slow filesystem never
/// delays the next response.
pub struct FileCleanerTask {
    pub rx: mpsc::Receiver<PathBuf>,
}

impl FileCleanerTask {
    pub fn new(rx: mpsc::Receiver<PathBuf>) -> Self {
        Self { rx }
    }

    /// Runs the main loop for the cleaner. On shutdown, remaining paths are drained.
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        debug!("Transient file cleaner task started.");
        loop {
            tokio::select! {
                maybe_path = self.rx.recv() => {
                    match maybe_path {
                        Some(path) => remove_transient(&path).await,
                        None => {
                            debug!("Cleanup queue closed; file cleaner exiting.");
                            return;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Transient file cleaner shutting down.");
                    self.rx.close();
                    while let Some(path) = self.rx.recv().await {
                        remove_transient(&path).await;
                        tokio::task::yield_now().await;
                    }
                    return;
                }
            }
        }
    }
}

/// Deletes `path`, treating an already-missing file as done.
pub async fn remove_transient(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed transient file {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove transient file {}: {}", path.display(), e),
    }
}
