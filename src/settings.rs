// Copyright 2025 Cowboy AI, LLC.

//! Engine-wide settings

use crate::errors::ConfigurationResult;
use serde::{Deserialize, Serialize};

/// Interchange format version written on export
pub const FORMAT_VERSION: &str = "1.0";

/// Oldest interchange major version accepted on import
pub const MIN_SUPPORTED_MAJOR: u32 = 1;

/// Settings shared by builders, the serializer and the engine cache
///
/// Every field has a default, so a settings file only needs to name what it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// Version written into exported documents
    pub format_version: String,
    /// Oldest major version accepted on import
    pub min_supported_major: u32,
    /// `createdWith` label of exported documents
    pub created_with: String,
    /// Margin kept free when fitting a primary territory to the canvas
    pub fit_padding: f64,
    /// Number of engines an [`crate::EngineCache`] keeps
    pub cache_capacity: usize,
    /// Precision for sub-projections that do not set one
    pub default_precision: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            min_supported_major: MIN_SUPPORTED_MAJOR,
            created_with: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            fit_padding: 0.0,
            cache_capacity: 8,
            default_precision: 0.1,
        }
    }
}

impl EngineSettings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> ConfigurationResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
