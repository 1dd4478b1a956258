// src/core/commands/maintenance/mod.rs

//! Commands that mutate the managed install, plus the read-only backup listing.

mod backup;
mod list_backups;
mod update;

pub use backup::{BACKUP_PIPELINE, BackupCommand, backup_step};
pub use list_backups::{BackupEntry, ListBackupsCommand, format_size, scan_backups};
pub use update::{UPDATE_PIPELINE, UpdateCommand, deploy_step};
