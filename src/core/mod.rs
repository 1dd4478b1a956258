// src/core/mod.rs

//! The command-dispatch and response-delivery engine of the relay.

pub mod commands;
pub mod errors;
pub mod handler;
pub mod metrics;
pub mod packager;
pub mod process;
pub mod protocol;
pub mod state;
pub mod tasks;
pub mod transport;

pub use commands::Command;
pub use errors::RelayError;
