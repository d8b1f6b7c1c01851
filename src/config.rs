//! User settings as stored by the extension's options page.
//!
//! The store is a flat JSON object:
//!
//! ```json
//! {
//!   "customSelectors": { "chatgpt": { "contentSelector": ".markdown" } },
//!   "debugOptions": { "enableSentry": false, "enableDomSnapshot": true },
//!   "timing": { "debounceMs": 300 }
//! }
//! ```
//!
//! Every key is optional. A missing store, a missing key, or an unreadable
//! file all produce the built-in defaults; nothing here is fatal.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dialect::Platform;
use crate::error::Result;

/// Everything the configuration collaborator can hand us.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Per-platform selector overrides, keyed by platform id.
    pub custom_selectors: HashMap<String, SelectorOverrides>,
    pub debug_options: DebugOptions,
    pub timing: Timing,
}

/// Partial selector set for one platform. Empty or absent fields fall back
/// to the platform default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectorOverrides {
    pub message_selector: Option<String>,
    pub button_container_selector: Option<String>,
    pub copy_button_selector: Option<String>,
    pub content_selector: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DebugOptions {
    /// Send failure reports to the telemetry collaborator.
    #[serde(rename = "enableSentry")]
    pub enable_telemetry: bool,
    /// Attach an HTML snapshot of the offending node to conversion failure
    /// reports.
    pub enable_dom_snapshot: bool,
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self {
            enable_telemetry: true,
            enable_dom_snapshot: false,
        }
    }
}

/// Delays used by the controller and the bootstrap, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timing {
    /// Quiet period after the last relevant mutation before a re-scan.
    pub debounce_ms: u64,
    /// How long the success face stays on a control.
    pub feedback_ms: u64,
    /// How long a claim token stays in the in-flight set after insertion.
    pub claim_grace_ms: u64,
    /// Interval between checks for the main content landmark.
    pub ready_poll_ms: u64,
    /// Give up waiting for the landmark after this long.
    pub ready_timeout_ms: u64,
    /// Extra settle time before the first scan.
    pub settle_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            feedback_ms: 1000,
            claim_grace_ms: 100,
            ready_poll_ms: 100,
            ready_timeout_ms: 5000,
            settle_ms: 1000,
        }
    }
}

impl Timing {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }

    pub fn claim_grace(&self) -> Duration {
        Duration::from_millis(self.claim_grace_ms)
    }

    pub fn ready_poll(&self) -> Duration {
        Duration::from_millis(self.ready_poll_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Settings {
    /// Parse settings from the store's JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Read settings from a JSON file, falling back to defaults on any
    /// failure.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("using default settings, could not read {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Overrides stored for a platform, if any.
    pub fn overrides_for(&self, platform: Platform) -> Option<&SelectorOverrides> {
        self.custom_selectors.get(platform.id())
    }
}
