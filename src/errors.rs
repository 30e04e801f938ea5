// Copyright 2025 Cowboy AI, LLC.

//! Error types for configuration operations and document import

use crate::interchange::ValidationReport;
use thiserror::Error;

/// Errors raised when an edit would break a configuration invariant
///
/// Every mutator checks its input before touching state, so receiving one of
/// these always means the configuration still holds its previous valid value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Atlas id was empty or whitespace
    #[error("Atlas id must not be empty")]
    EmptyAtlasId,

    /// Reference scale was zero, negative or not finite
    #[error("Reference scale must be strictly positive, got {0}")]
    InvalidReferenceScale(f64),

    /// Canvas width or height was zero, negative or not finite
    #[error("Canvas dimensions must be strictly positive, got {width}x{height}")]
    InvalidCanvasDimensions {
        /// Requested width
        width: f64,
        /// Requested height
        height: f64,
    },

    /// Territory code was empty or whitespace
    #[error("Territory code must not be empty")]
    EmptyTerritoryCode,

    /// Projection id was empty or whitespace
    #[error("Projection id must not be empty for territory {code}")]
    EmptyProjectionId {
        /// Territory the projection id belongs to
        code: String,
    },

    /// Scale multiplier was zero, negative or not finite
    #[error("Scale multiplier must be strictly positive for territory {code}, got {value}")]
    InvalidScaleMultiplier {
        /// Territory the multiplier belongs to
        code: String,
        /// Rejected value
        value: f64,
    },

    /// A territory with this code is already registered
    #[error("Territory already exists: {0}")]
    DuplicateTerritory(String),

    /// No territory with this code is registered
    #[error("Territory not found: {0}")]
    TerritoryNotFound(String),

    /// Removing this territory would leave the configuration empty
    #[error("Cannot remove {0}: a configuration needs at least one territory")]
    LastTerritory(String),

    /// Parameters failed the family's constraint checks
    #[error("Invalid parameters for territory {code}: {message}")]
    InvalidParameters {
        /// Territory the parameters belong to
        code: String,
        /// Every rejected parameter, joined
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for configuration operations
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

impl From<serde_json::Error> for ConfigurationError {
    fn from(err: serde_json::Error) -> Self {
        ConfigurationError::Serialization(err.to_string())
    }
}

impl ConfigurationError {
    /// Check if this is a missing territory error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigurationError::TerritoryNotFound(_))
    }

    /// Check if this error rejects an invalid value
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ConfigurationError::EmptyAtlasId
                | ConfigurationError::InvalidReferenceScale(_)
                | ConfigurationError::InvalidCanvasDimensions { .. }
                | ConfigurationError::EmptyTerritoryCode
                | ConfigurationError::EmptyProjectionId { .. }
                | ConfigurationError::InvalidScaleMultiplier { .. }
                | ConfigurationError::InvalidParameters { .. }
        )
    }
}

/// Errors raised when importing an interchange document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// The document failed ingest validation
    #[error("Invalid document: {0}")]
    Invalid(ValidationReport),

    /// The document was valid but produced an inconsistent configuration
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The document could not be parsed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::Serialization(err.to_string())
    }
}

impl ImportError {
    /// Validation report, if validation rejected the document
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            ImportError::Invalid(report) => Some(report),
            _ => None,
        }
    }
}
