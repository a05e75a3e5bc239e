//! Configuration module for RAG Notebook.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the service
//! clients, the session controller and the exporter, `AppPaths` for
//! cross-platform directories, and TOML persistence via
//! `AppConfig::load_or_create` / `AppConfig::save_to`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, ExportConfig, ServiceConfig, SessionConfig};
