// src/core/commands/maintenance/list_backups.rs

//! Lists the most recent backup archives.
//!
//! "Most recent" is approximated by sorting names in descending order, which
//! is only chronological when archive names carry a sortable timestamp (the
//! stock backup script names them `n8n_backup_YYYYMMDD_HHMMSS.tar.gz`).

use crate::core::commands::command_trait::{ActionContext, ActionHandler, ActionResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct ListBackupsCommand;

/// A backup archive found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub name: String,
    pub size: u64,
}

/// Reads `dir` and returns up to `limit` regular files ending in `suffix`, newest name first.
///
/// A missing directory is treated as empty.
pub async fn scan_backups(
    dir: &Path,
    suffix: &str,
    limit: usize,
) -> std::io::Result<Vec<BackupEntry>> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Backup directory {} does not exist.", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(suffix) {
            continue;
        }
        match entry.metadata().await {
            Ok(meta) if meta.is_file() => entries.push(BackupEntry {
                name,
                size: meta.len(),
            }),
            Ok(_) => {}
            Err(e) => warn!("Skipping backup entry '{}': {}", name, e),
        }
    }

    entries.sort_by(|a, b| b.name.cmp(&a.name));
    entries.truncate(limit);
    Ok(entries)
}

/// Formats a byte count with a binary unit, e.g. `12.3 MiB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[async_trait]
impl ActionHandler for ListBackupsCommand {
    async fn run(&self, ctx: &ActionContext) -> ActionResult {
        let backup = &ctx.state.config.backup;
        let entries = match scan_backups(&backup.dir, &backup.suffix, backup.list_limit).await {
            Ok(entries) => entries,
            Err(e) => {
                return ActionResult::failed(
                    format!("Could not read {}", backup.dir.display()),
                    e.to_string(),
                );
            }
        };

        if entries.is_empty() {
            return ActionResult::prose(
                "No backups found",
                format!(
                    "No *{} files in {}.",
                    backup.suffix,
                    backup.dir.display()
                ),
            );
        }

        let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
        let body = entries
            .iter()
            .map(|e| format!("{:<width$}  {:>10}", e.name, format_size(e.size)))
            .collect::<Vec<_>>()
            .join("\n");
        ActionResult::ok(format!("Latest {} backup(s)", entries.len()), body)
    }
}
