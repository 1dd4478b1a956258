// src/core/tasks/mod.rs

//! Long-running background tasks owned by the server.

pub mod file_cleaner;
