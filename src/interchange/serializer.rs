// Copyright 2025 Cowboy AI, LLC.

//! Export to and import from interchange documents

use super::document::{
    CompositionPattern, ExportMetadata, ExportedConfiguration, ExportedLayout, ExportedProjection,
    ExportedTerritory,
};
use super::validate::{parse_bounds, DocumentValidator, ValidationIssue, ValidationReport};
use crate::configuration::{CompositeConfiguration, TerritoryProjectionConfig};
use crate::constraints::ParameterConstraintsEngine;
use crate::errors::{ConfigurationResult, ImportError};
use crate::family::{InterchangeFamily, ProjectionFamily};
use crate::geometry::{CanvasDimensions, GeoBounds, PixelExtent};
use crate::parameters::{ParameterChain, ParameterLayer, ParameterProvider};
use crate::registry::ProjectionRegistry;
use crate::settings::EngineSettings;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Optional inputs of an export
#[derive(Clone, Default)]
pub struct ExportOptions<'a> {
    /// Source of per-territory parameter overrides
    pub provider: Option<&'a dyn ParameterProvider>,
    /// Pattern to write instead of the inferred one
    pub pattern: Option<CompositionPattern>,
    /// Reference scale to write instead of the configuration's
    pub reference_scale: Option<f64>,
    /// Canvas to write instead of the configuration's
    pub canvas_dimensions: Option<CanvasDimensions>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Timestamp to write instead of now
    pub export_date: Option<DateTime<Utc>>,
}

/// Result of a successful import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// Rebuilt configuration
    pub configuration: CompositeConfiguration,
    /// Pattern the document declared
    pub pattern: CompositionPattern,
    /// Metadata the document carried
    pub metadata: ExportMetadata,
    /// Warnings from validation
    pub warnings: Vec<ValidationIssue>,
}

/// Converts configurations to interchange documents and back
#[derive(Debug, Clone)]
pub struct ConfigurationSerializer {
    registry: Arc<ProjectionRegistry>,
    constraints: ParameterConstraintsEngine,
    settings: EngineSettings,
}

impl ConfigurationSerializer {
    /// Serializer with default settings
    pub fn new(registry: Arc<ProjectionRegistry>) -> Self {
        Self {
            registry,
            constraints: ParameterConstraintsEngine::new(),
            settings: EngineSettings::default(),
        }
    }

    /// Replace the settings
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Settings in use
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Validator sharing this serializer's registry and settings
    pub fn validator(&self) -> DocumentValidator<'_> {
        DocumentValidator::new(&self.registry, &self.constraints, &self.settings)
    }

    /// Build the document for a configuration
    ///
    /// Each territory's stored parameters are overlaid with the provider's
    /// exportable parameters. Scale travels as a multiplier of the reference
    /// scale; absolute scales are never written.
    pub fn export(
        &self,
        configuration: &CompositeConfiguration,
        options: &ExportOptions<'_>,
    ) -> ExportedConfiguration {
        let territories: Vec<ExportedTerritory> = configuration
            .get_all_territories()
            .iter()
            .map(|territory| export_territory(territory, options.provider))
            .collect();

        let atlas_name = configuration.atlas_name();
        debug!(
            atlas_id = configuration.atlas_id(),
            territories = territories.len(),
            "exporting composite configuration"
        );

        ExportedConfiguration {
            version: self.settings.format_version.clone(),
            metadata: ExportMetadata {
                atlas_id: configuration.atlas_id().to_string(),
                atlas_name: (!atlas_name.is_empty()).then(|| atlas_name.to_string()),
                export_date: Some(options.export_date.unwrap_or_else(Utc::now)),
                created_with: Some(self.settings.created_with.clone()),
                notes: options.notes.clone(),
            },
            pattern: options
                .pattern
                .unwrap_or_else(|| CompositionPattern::infer(configuration)),
            reference_scale: options
                .reference_scale
                .unwrap_or_else(|| configuration.reference_scale()),
            canvas_dimensions: options
                .canvas_dimensions
                .unwrap_or_else(|| configuration.canvas_dimensions()),
            territories,
        }
    }

    /// Export as a JSON value
    pub fn export_to_json(
        &self,
        configuration: &CompositeConfiguration,
        options: &ExportOptions<'_>,
    ) -> ConfigurationResult<Value> {
        Ok(serde_json::to_value(self.export(configuration, options))?)
    }

    /// Export as pretty-printed JSON text
    pub fn export_to_string(
        &self,
        configuration: &CompositeConfiguration,
        options: &ExportOptions<'_>,
    ) -> ConfigurationResult<String> {
        Ok(serde_json::to_string_pretty(&self.export(configuration, options))?)
    }

    /// Validate a document without importing it
    pub fn validate(&self, document: &Value) -> ValidationReport {
        self.validator().validate(document)
    }

    /// Rebuild a configuration from a document
    ///
    /// The document is validated first and rejected if it has any error.
    /// Malformed bounds only warn during validation, so they are dropped
    /// here rather than failing the parse.
    pub fn import(&self, document: &Value) -> Result<ImportOutcome, ImportError> {
        let report = self.validate(document);
        if !report.valid {
            warn!(
                errors = report.errors.len(),
                first = %report.errors[0],
                "rejecting interchange document"
            );
            return Err(ImportError::Invalid(report));
        }

        let exported: ExportedConfiguration =
            serde_json::from_value(without_malformed_bounds(document))?;
        let configuration = self.rebuild(&exported)?;

        info!(
            atlas_id = configuration.atlas_id(),
            territories = configuration.territory_count(),
            warnings = report.warnings.len(),
            "imported composite configuration"
        );
        Ok(ImportOutcome {
            configuration,
            pattern: exported.pattern,
            metadata: exported.metadata,
            warnings: report.warnings,
        })
    }

    /// Parse JSON text and import it
    pub fn import_str(&self, json: &str) -> Result<ImportOutcome, ImportError> {
        let document: Value = serde_json::from_str(json)?;
        self.import(&document)
    }

    fn rebuild(&self, exported: &ExportedConfiguration) -> ConfigurationResult<CompositeConfiguration> {
        let mut configuration = CompositeConfiguration::new(
            exported.metadata.atlas_id.clone(),
            exported.metadata.atlas_name.clone().unwrap_or_default(),
            exported.reference_scale,
            exported.canvas_dimensions,
        )?;

        for territory in &exported.territories {
            let projection = &territory.projection;
            let family = self
                .registry
                .family_of(&projection.id)
                .unwrap_or_else(|| ProjectionFamily::from(projection.family));
            let name = if territory.name.is_empty() {
                territory.code.clone()
            } else {
                territory.name.clone()
            };

            let mut config = TerritoryProjectionConfig::new(
                territory.code.clone(),
                name,
                territory.role,
                projection.id.clone(),
                family,
            )
            .with_parameters(projection.parameters.clone())
            .with_translate_offset(territory.layout.translate_offset);
            config.pixel_clip_extent = territory.layout.pixel_clip_extent.map(PixelExtent::from);
            config.bounds = territory.bounds.map(GeoBounds::from);

            configuration.add_territory(config)?;
        }
        Ok(configuration)
    }
}

fn export_territory(
    territory: &TerritoryProjectionConfig,
    provider: Option<&dyn ParameterProvider>,
) -> ExportedTerritory {
    let mut chain =
        ParameterChain::new().with_layer(ParameterLayer::Territory, territory.parameters.clone());
    if let Some(provider) = provider {
        chain = chain.with_layers(
            provider
                .layers(&territory.code)
                .into_iter()
                .filter(|(layer, _)| *layer != ParameterLayer::Global),
        );
    }

    ExportedTerritory {
        code: territory.code.clone(),
        name: territory.name.clone(),
        role: territory.role,
        projection: ExportedProjection {
            id: territory.projection_id.clone(),
            family: InterchangeFamily::from(territory.family),
            parameters: chain.resolve(),
        },
        layout: ExportedLayout {
            translate_offset: territory.translate_offset,
            pixel_clip_extent: territory.pixel_clip_extent.map(Into::into),
        },
        bounds: territory.bounds.map(Into::into),
    }
}

fn without_malformed_bounds(document: &Value) -> Value {
    let mut document = document.clone();
    if let Some(territories) = document.get_mut("territories").and_then(Value::as_array_mut) {
        for territory in territories.iter_mut().filter_map(Value::as_object_mut) {
            let malformed = territory
                .get("bounds")
                .is_some_and(|b| !b.is_null() && parse_bounds(b).is_none());
            if malformed {
                territory.remove("bounds");
            }
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::TerritoryRole;
    use crate::parameters::{LayeredParameterProvider, ProjectionParameters};
    use crate::IssueCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn serializer() -> ConfigurationSerializer {
        ConfigurationSerializer::new(Arc::new(ProjectionRegistry::standard()))
    }

    fn portugal() -> CompositeConfiguration {
        let mut configuration = CompositeConfiguration::new(
            "portugal",
            "Portugal",
            3200.0,
            CanvasDimensions::new(800.0, 600.0),
        )
        .unwrap();
        configuration
            .add_territory(
                TerritoryProjectionConfig::new(
                    "PT-CONT",
                    "Continental Portugal",
                    TerritoryRole::Primary,
                    "mercator",
                    ProjectionFamily::Cylindrical,
                )
                .with_parameters(ProjectionParameters {
                    center: Some([-8.0, 39.5]),
                    ..Default::default()
                })
                .with_bounds(GeoBounds::new([-9.6, 36.9], [-6.1, 42.2])),
            )
            .unwrap();
        configuration
            .add_territory(
                TerritoryProjectionConfig::new(
                    "PT-20",
                    "Azores",
                    TerritoryRole::Secondary,
                    "mercator",
                    ProjectionFamily::Cylindrical,
                )
                .with_parameters(ProjectionParameters {
                    center: Some([-28.0, 38.5]),
                    scale_multiplier: Some(0.6),
                    ..Default::default()
                })
                .with_translate_offset([-250.0, 150.0])
                .with_pixel_clip_extent(PixelExtent::new(-90.0, -60.0, 90.0, 60.0))
                .with_bounds(GeoBounds::new([-31.3, 36.9], [-25.0, 39.8])),
            )
            .unwrap();
        configuration
    }

    #[test]
    fn test_export_shape() {
        let json = serializer()
            .export_to_json(&portugal(), &ExportOptions::default())
            .unwrap();

        assert_eq!(json["version"], "1.0");
        assert_eq!(json["pattern"], "single-focus");
        assert_eq!(json["metadata"]["atlasId"], "portugal");
        assert_eq!(json["territories"][0]["layout"]["pixelClipExtent"], Value::Null);
        assert_eq!(
            json["territories"][1]["projection"]["parameters"],
            json!({"center": [-28.0, 38.5], "scaleMultiplier": 0.6})
        );
        assert_eq!(json["territories"][1]["projection"]["family"], "CYLINDRICAL");
        assert!(json["territories"][1]["projection"]["parameters"].get("scale").is_none());
    }

    #[test]
    fn test_round_trip() {
        let serializer = serializer();
        let original = portugal();
        let json = serializer.export_to_json(&original, &ExportOptions::default()).unwrap();
        let outcome = serializer.import(&json).unwrap();

        assert_eq!(outcome.configuration, original);
        assert_eq!(outcome.pattern, CompositionPattern::SingleFocus);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_provider_overrides_are_exported() {
        let mut provider = LayeredParameterProvider::new();
        provider.set_territory(
            "PT-20",
            ProjectionParameters {
                scale_multiplier: Some(0.8),
                ..Default::default()
            },
        );
        let options = ExportOptions {
            provider: Some(&provider),
            notes: Some("tuned".into()),
            ..Default::default()
        };

        let exported = serializer().export(&portugal(), &options);
        let azores = &exported.territories[1].projection.parameters;
        assert_eq!(azores.scale_multiplier, Some(0.8));
        assert_eq!(azores.center, Some([-28.0, 38.5]));
        assert_eq!(exported.metadata.notes.as_deref(), Some("tuned"));
    }

    #[test]
    fn test_import_rejects_invalid_documents() {
        let mut json = serializer()
            .export_to_json(&portugal(), &ExportOptions::default())
            .unwrap();
        json["version"] = json!("3.0");

        let err = serializer().import(&json).unwrap_err();
        let report = err.report().unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, IssueCode::VersionUnsupported);
    }

    #[test]
    fn test_import_unknown_projection_keeps_declared_family() {
        let mut json = serializer()
            .export_to_json(&portugal(), &ExportOptions::default())
            .unwrap();
        json["territories"][1]["projection"]["id"] = json!("van-der-grinten");
        json["territories"][1]["projection"]["family"] = json!("POLYCONIC");
        json["territories"][1]["bounds"] = json!("somewhere");

        let outcome = serializer().import(&json).unwrap();
        let azores = outcome.configuration.get_territory("PT-20").unwrap();
        assert_eq!(azores.family, ProjectionFamily::Other);
        assert_eq!(azores.projection_id, "van-der-grinten");
        assert_eq!(azores.bounds, None);

        let codes: Vec<IssueCode> = outcome.warnings.iter().map(|w| w.code).collect();
        assert_eq!(codes, vec![IssueCode::UnknownProjection, IssueCode::InvalidBounds]);
    }

    #[test]
    fn test_import_str_reports_parse_errors() {
        let err = serializer().import_str("{ not json").unwrap_err();
        assert!(matches!(err, ImportError::Serialization(_)));
    }
}
