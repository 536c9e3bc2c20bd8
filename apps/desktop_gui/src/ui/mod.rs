//! UI layer for the reader window: app shell, listing and aside.

pub mod app;

pub use app::{BlogReaderApp, StartupConfig};
