//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\rag-notebook\
//!   macOS:   ~/Library/Application Support/rag-notebook/
//!   Linux:   ~/.config/rag-notebook/
//!
//! Data dir (exports):
//!   Windows: %LOCALAPPDATA%\rag-notebook\
//!   macOS:   ~/Library/Application Support/rag-notebook/
//!   Linux:   ~/.local/share/rag-notebook/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default directory for exported transcripts.
    pub exports_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "rag-notebook";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let exports_dir = data_dir.join("exports");

        Self {
            config_dir,
            settings_file,
            exports_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .exports_dir
            .file_name()
            .is_some_and(|n| n == "exports"));
    }
}
