//! Application configuration.
//!
//! Configuration is plain TOML; every field has a default, so an empty
//! document (or none at all) gives a working setup.
//!
//! ```
//! use kestrel_core::ApplicationConfig;
//!
//! let config = ApplicationConfig::from_toml_str(r#"
//! idle_wait_ms = 5
//!
//! [window]
//! title = "Paint"
//! width = 400
//! "#).unwrap();
//!
//! assert_eq!(config.window.title, "Paint");
//! assert_eq!(config.window.width, 400);
//! assert_eq!(config.window.height, 250);
//! ```

use std::path::Path;
use std::time::Duration;

use kestrel_render::Size;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::platform::WindowRequest;

/// Defaults for the top-level native window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            width: 250,
            height: 250,
        }
    }
}

/// Settings for an [`Application`](crate::Application).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub window: WindowConfig,
    /// Upper bound on events dispatched per loop iteration; 0 means no limit.
    pub max_events_per_iteration: usize,
    /// How long an idle loop blocks before polling again, in milliseconds.
    pub idle_wait_ms: u64,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            max_events_per_iteration: 0,
            idle_wait_ms: 10,
        }
    }
}

impl ApplicationConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(target: "kestrel_core", path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    /// The request used to create the top-level window.
    pub fn window_request(&self) -> WindowRequest {
        WindowRequest {
            title: self.window.title.clone(),
            size: Size::new(self.window.width as f32, self.window.height as f32),
            position: None,
        }
    }
}
