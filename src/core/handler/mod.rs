// src/core/handler/mod.rs

pub mod dispatcher;
pub mod gate;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use gate::{COMMAND_MARKER, GateDecision, authorize};
