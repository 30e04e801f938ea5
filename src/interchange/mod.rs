// Copyright 2025 Cowboy AI, LLC.

//! Interchange documents
//!
//! A versioned JSON snapshot of a [`crate::CompositeConfiguration`] that can
//! be shared between tools. [`ConfigurationSerializer`] writes and reads it;
//! [`DocumentValidator`] checks a raw document before anything is built from
//! it.

mod document;
mod serializer;
mod validate;

pub use document::{
    CompositionPattern, ExportMetadata, ExportedConfiguration, ExportedLayout, ExportedProjection,
    ExportedTerritory,
};
pub use serializer::{ConfigurationSerializer, ExportOptions, ImportOutcome};
pub use validate::{DocumentValidator, IssueCode, ValidationIssue, ValidationReport};

/// JSON schema of [`ExportedConfiguration`]
pub fn document_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(ExportedConfiguration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names_required_fields() {
        let schema = serde_json::to_value(document_schema()).unwrap();
        let required = schema["required"].as_array().unwrap();
        for field in ["version", "metadata", "pattern", "referenceScale", "territories"] {
            assert!(required.iter().any(|r| r == field), "{field} not required");
        }
        assert!(schema["definitions"]["ExportedLayout"].is_object());
    }
}
