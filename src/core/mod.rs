//! Core infrastructure: terminal output, error types and the session lock

pub mod error;
pub mod lock;
pub mod output;
