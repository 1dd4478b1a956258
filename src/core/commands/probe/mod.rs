// src/core/commands/probe/mod.rs

//! Read-only, bounded-time probes. All of them use the configured probe timeout.

mod health;
mod help;
mod simple;
mod status;

pub use health::HealthProbe;
pub use help::{HelpCommand, help_text};
pub use simple::CommandProbe;
pub use status::{StatusProbe, container_list_spec};
