//! PID settings snapshot
//!
//! The generator and template engine take an explicit [`PidSettings`] value
//! instead of reading a process-wide settings store, so callers (and tests)
//! decide exactly which configuration applies to a call.

use crate::codec::Protocol;
use crate::error::{PidError, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

// =============================================================================
// GENERATION STYLE
// =============================================================================

/// How new identifier suffixes are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationStyle {
    /// Six random uppercase alphanumerics after the prefix
    #[default]
    RandomString,
    /// Values from the object store's counter (or a per-dataset counter for
    /// dependent file identifiers)
    StoredProcedure,
}

impl GenerationStyle {
    /// Lenient parse: unknown names fall back to random strings.
    pub fn from_setting(value: &str) -> Self {
        match value.trim() {
            "stored-procedure" | "storedProcGenerated" => GenerationStyle::StoredProcedure,
            "random-string" | "randomString" => GenerationStyle::RandomString,
            other => {
                warn!(
                    "Unknown identifier generation style '{}', using random-string",
                    other
                );
                GenerationStyle::RandomString
            }
        }
    }
}

impl FromStr for GenerationStyle {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_setting(s))
    }
}

impl<'de> Deserialize<'de> for GenerationStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_setting(&raw))
    }
}

// =============================================================================
// FILE PID FORMAT
// =============================================================================

/// Whether file identifiers are scoped under their dataset's identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilePidFormat {
    #[default]
    Dependent,
    Independent,
}

impl FromStr for FilePidFormat {
    type Err = PidError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEPENDENT" => Ok(FilePidFormat::Dependent),
            "INDEPENDENT" => Ok(FilePidFormat::Independent),
            other => Err(PidError::Config(format!(
                "Unknown file PID format '{}'. Valid values: DEPENDENT, INDEPENDENT",
                other
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for FilePidFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Read-only configuration for one minting or rendering call
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PidSettings {
    pub protocol: Protocol,
    pub authority: String,
    /// Fixed prefix inserted before generated identifiers
    pub shoulder: String,
    pub generation_style: GenerationStyle,
    pub file_pid_format: FilePidFormat,
    /// Name of the hosting installation, reported as the publisher
    pub publisher: String,
    /// Base URL that target URLs are built from
    pub site_url: String,
    pub registry_timeout_ms: u64,
}

impl Default for PidSettings {
    fn default() -> Self {
        Self {
            protocol: Protocol::Doi,
            authority: "10.5072".to_string(),
            shoulder: "FK2/".to_string(),
            generation_style: GenerationStyle::RandomString,
            file_pid_format: FilePidFormat::Dependent,
            publisher: String::new(),
            site_url: "http://localhost:8080".to_string(),
            registry_timeout_ms: 5000,
        }
    }
}

impl PidSettings {
    /// Defaults overlaid with `PID_*` environment variables (a `.env` file is
    /// loaded first when present).
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(protocol) = lookup("PID_PROTOCOL") {
            settings.protocol = protocol.trim().parse()?;
        }
        if let Some(authority) = lookup("PID_AUTHORITY") {
            settings.authority = authority.trim().to_string();
        }
        if let Some(shoulder) = lookup("PID_SHOULDER") {
            settings.shoulder = shoulder.trim().to_string();
        }
        if let Some(style) = lookup("PID_GENERATION_STYLE") {
            settings.generation_style = GenerationStyle::from_setting(&style);
        }
        if let Some(format) = lookup("PID_FILE_FORMAT") {
            settings.file_pid_format = format.parse()?;
        }
        if let Some(publisher) = lookup("PID_PUBLISHER") {
            settings.publisher = publisher;
        }
        if let Some(site_url) = lookup("PID_SITE_URL") {
            settings.site_url = site_url.trim().to_string();
        }
        if let Some(timeout) = lookup("PID_REGISTRY_TIMEOUT_MS") {
            settings.registry_timeout_ms = timeout.trim().parse().map_err(|_| {
                PidError::Config(format!("PID_REGISTRY_TIMEOUT_MS is not a number: '{}'", timeout))
            })?;
        }

        Ok(settings)
    }

    pub fn registry_timeout(&self) -> Duration {
        Duration::from_millis(self.registry_timeout_ms)
    }
}
