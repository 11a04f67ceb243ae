//! Centralized runner configuration.
//!
//! This module provides strongly-typed configuration for the job runner,
//! loaded via the `config` crate from environment variables.

use serde::Deserialize;

/// Runner configuration.
#[derive(Debug, Deserialize)]
pub struct RunnerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Practice identity, used in the fixed fallback message.
    pub practice: PracticeConfig,

    /// Eligibility scan cycle.
    #[serde(default)]
    pub scan: ScanSettings,

    /// Due-step processing cycle.
    #[serde(default)]
    pub process: ProcessSettings,
}

/// Practice identity.
#[derive(Debug, Clone, Deserialize)]
pub struct PracticeConfig {
    /// Practice display name.
    pub name: String,
    /// Front-desk phone number.
    pub phone: String,
}

impl PracticeConfig {
    /// The fixed, category-neutral message used when both templates and
    /// generation are unavailable.
    #[must_use]
    pub fn fallback_message(&self) -> String {
        format!(
            "Hi, it's time to schedule your next visit with {}. Call us at {}.",
            self.name, self.phone
        )
    }
}

/// Settings for the eligibility scan cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanSettings {
    /// Seconds between scans.
    #[serde(default = "default_scan_interval_seconds")]
    pub interval_seconds: u64,

    /// Candidate batch cap per category per scan.
    #[serde(default = "default_category_batch")]
    pub category_batch: i64,
}

fn default_scan_interval_seconds() -> u64 {
    3600
}

fn default_category_batch() -> i64 {
    20
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            interval_seconds: default_scan_interval_seconds(),
            category_batch: default_category_batch(),
        }
    }
}

/// Settings for the due-step processing cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessSettings {
    /// Seconds between processing runs.
    #[serde(default = "default_process_interval_seconds")]
    pub interval_seconds: u64,

    /// Maximum enrollments processed per run. The batch cap is the only
    /// backpressure on the content-generation service.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,

    /// Claim lease duration in seconds. Must exceed the worst-case run
    /// time or an overlapping runner can double-process.
    #[serde(default = "default_lease_seconds")]
    pub lease_seconds: i64,
}

fn default_process_interval_seconds() -> u64 {
    900
}

fn default_batch_size() -> i64 {
    30
}

fn default_lease_seconds() -> i64 {
    300
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            interval_seconds: default_process_interval_seconds(),
            batch_size: default_batch_size(),
            lease_seconds: default_lease_seconds(),
        }
    }
}

impl RunnerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
