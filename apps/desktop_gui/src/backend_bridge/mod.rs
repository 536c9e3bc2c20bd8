//! Backend worker thread: owns the tokio runtime and the article provider.

pub mod commands;
pub mod runtime;
