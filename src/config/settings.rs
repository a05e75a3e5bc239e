//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to the
//! session controller and the exporter at construction time.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Connection details for the Upload and Answer services.
///
/// Injected into the HTTP clients; nothing about the backend address is
/// global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base address of the RAG backend (no trailing slash).
    pub base_url: String,
    /// Path of the multipart upload endpoint.
    pub upload_path: String,
    /// Path of the question endpoint.
    pub ask_path: String,
    /// Maximum seconds to wait for any single service call.
    pub timeout_secs: u64,
}

impl ServiceConfig {
    /// Full URL of the upload endpoint.
    pub fn upload_url(&self) -> String {
        join_url(&self.base_url, &self.upload_path)
    }

    /// Full URL of the question endpoint.
    pub fn ask_url(&self) -> String {
        join_url(&self.base_url, &self.ask_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            upload_path: "/process-docs".into(),
            ask_path: "/ask-doc".into(),
            timeout_secs: 60,
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Behaviour of the conversation session controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Content of the Assistant placeholder turn while a question is in
    /// flight.
    pub thinking_indicator: String,
    /// Replay the settled conversation to the Answer Service with every
    /// question.  Off by default: the backend keeps per-document state.
    pub send_history: bool,
    /// Maximum seconds to wait for an answer before the turn is marked as
    /// failed.
    pub answer_timeout_secs: u64,
}

impl SessionConfig {
    pub fn answer_timeout(&self) -> Duration {
        Duration::from_secs(self.answer_timeout_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            thinking_indicator: "Thinking...".into(),
            send_history: false,
            answer_timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// ExportConfig
// ---------------------------------------------------------------------------

/// Page geometry for the PDF transcript export.
///
/// All lengths are PDF points (1/72 inch).  Defaults describe an A4
/// portrait page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub page_width: f32,
    pub page_height: f32,
    /// Left / right margin.
    pub margin_x: f32,
    /// Top / bottom margin.
    pub margin_y: f32,
    /// Font size of body and speaker-label lines.
    pub font_size: f32,
    /// Font size of the title line on the first page.
    pub title_font_size: f32,
    /// Vertical advance per body line.
    pub line_height: f32,
    /// Extra vertical space after each turn's content.
    pub turn_gap: f32,
    /// Directory the export is written to.  `None` means the platform data
    /// dir's `exports/` folder.
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin_x: 40.0,
            margin_y: 50.0,
            font_size: 11.0,
            title_font_size: 16.0,
            line_height: 14.0,
            turn_gap: 10.0,
            output_dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use rag_notebook::config::AppConfig;
///
/// // First run writes the defaults so they can be edited by hand.
/// let config = AppConfig::load_or_create().unwrap();
/// println!("backend: {}", config.service.base_url);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend service endpoints.
    pub service: ServiceConfig,
    /// Session controller behaviour.
    pub session: SessionConfig,
    /// PDF export layout.
    pub export: ExportConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`,
    /// writing the defaults there first when the file does not exist yet.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&AppPaths::new().settings_file)
    }

    /// [`load_or_create`](Self::load_or_create) against an explicit path.
    pub fn load_or_create_at(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from(path);
        }
        let config = Self::default();
        config.save_to(path)?;
        log::info!("Wrote default settings to {}", path.display());
        Ok(config)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Directory exports are written to, honouring `export.output_dir`.
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().exports_dir)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
