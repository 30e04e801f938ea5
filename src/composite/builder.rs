// Copyright 2025 Cowboy AI, LLC.

//! Keeps one live sub-projection per territory and compiles them into a
//! [`CompositeProjection`]

use super::instance::SubProjectionInstance;
use super::projection::CompositeProjection;
use super::router::TerritoryRouter;
use crate::configuration::{CompositeConfiguration, TerritoryProjectionConfig, TerritoryUpdate};
use crate::constraints::{ParameterConstraintsEngine, ParameterSetValidation};
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::geometry::CanvasDimensions;
use crate::parameters::{ParameterChain, ParameterLayer, ParameterProvider, ProjectionParameters};
use crate::positioning;
use crate::registry::ProjectionRegistry;
use crate::settings::EngineSettings;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns a configuration and the sub-projections built from it
///
/// Every mutation updates the stored configuration first and then only the
/// sub-projection it concerns. Edits naming an unknown territory are logged
/// and ignored.
#[derive(Clone)]
pub struct CompositeProjectionBuilder {
    configuration: CompositeConfiguration,
    registry: Arc<ProjectionRegistry>,
    constraints: ParameterConstraintsEngine,
    provider: Option<Arc<dyn ParameterProvider>>,
    settings: EngineSettings,
    instances: IndexMap<String, SubProjectionInstance>,
}

impl fmt::Debug for CompositeProjectionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeProjectionBuilder")
            .field("atlas_id", &self.configuration.atlas_id())
            .field("territories", &self.instances.keys().collect::<Vec<_>>())
            .field("has_provider", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}

impl CompositeProjectionBuilder {
    /// Instantiate every territory of `configuration`
    pub fn new(configuration: CompositeConfiguration, registry: Arc<ProjectionRegistry>) -> Self {
        let instances = configuration
            .get_all_territories()
            .into_iter()
            .map(|t| (t.code.clone(), SubProjectionInstance::new(t, &registry)))
            .collect();
        let mut builder = Self {
            configuration,
            registry,
            constraints: ParameterConstraintsEngine::new(),
            provider: None,
            settings: EngineSettings::default(),
            instances,
        };
        builder.refresh_all();
        builder
    }

    /// Use `settings` from now on
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self.refresh_all();
        self
    }

    /// Layer `provider`'s parameters over the stored ones
    pub fn with_parameter_provider(mut self, provider: Arc<dyn ParameterProvider>) -> Self {
        self.provider = Some(provider);
        self.refresh_all();
        self
    }

    /// Stored configuration
    pub fn configuration(&self) -> &CompositeConfiguration {
        &self.configuration
    }

    /// Registry sub-projections come from
    pub fn registry(&self) -> &ProjectionRegistry {
        &self.registry
    }

    /// Settings in use
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Live sub-projection of one territory
    pub fn instance(&self, code: &str) -> Option<&SubProjectionInstance> {
        self.instances.get(code)
    }

    /// Parameters a territory renders with
    ///
    /// Provider global and atlas defaults, then the stored territory
    /// parameters, then the provider's per-territory override.
    pub fn effective_parameters(&self, code: &str) -> Option<ProjectionParameters> {
        self.configuration
            .get_territory(code)
            .map(|t| self.resolve_parameters(&t))
    }

    fn resolve_parameters(&self, territory: &TerritoryProjectionConfig) -> ProjectionParameters {
        let chain =
            ParameterChain::new().with_layer(ParameterLayer::Territory, territory.parameters.clone());
        match &self.provider {
            Some(provider) => chain.with_layers(provider.layers(&territory.code)),
            None => chain,
        }
        .resolve()
    }

    fn anchor(&self) -> [f64; 2] {
        self.configuration.canvas_dimensions().center()
    }

    /// Sync one instance with the stored configuration
    fn refresh(&mut self, code: &str) {
        let Some(territory) = self.configuration.get_territory(code) else {
            return;
        };
        let parameters = self.resolve_parameters(&territory);
        let reference_scale = self.configuration.reference_scale();
        let anchor = self.anchor();
        if let Some(instance) = self.instances.get_mut(code) {
            instance.set_territory(territory);
            instance.apply_parameters(&parameters, &self.constraints, self.settings.default_precision);
            instance.place(reference_scale, anchor);
        }
    }

    fn refresh_all(&mut self) {
        for code in self.configuration.get_territory_codes() {
            self.refresh(&code);
        }
    }

    fn place_all(&mut self) {
        let reference_scale = self.configuration.reference_scale();
        let anchor = self.anchor();
        for instance in self.instances.values_mut() {
            instance.place(reference_scale, anchor);
        }
    }

    fn known(&self, code: &str, operation: &str) -> Option<TerritoryProjectionConfig> {
        let territory = self.configuration.get_territory(code);
        if territory.is_none() {
            warn!(territory = %code, operation, "Unknown territory, edit ignored");
        }
        territory
    }

    /// Switch a territory to another projection
    ///
    /// The sub-projection is re-created, and stored `center` / `rotate` are
    /// rewritten into the new family's native form.
    pub fn update_territory_projection(
        &mut self,
        code: &str,
        projection_id: &str,
    ) -> ConfigurationResult<()> {
        let Some(current) = self.known(code, "update_territory_projection") else {
            return Ok(());
        };
        let family = self.registry.family_of(projection_id).unwrap_or(current.family);
        let update = TerritoryUpdate {
            projection_id: Some(projection_id.to_string()),
            family: Some(family),
            parameters: Some(positioning::normalize_parameters(family, &current.parameters)),
            ..Default::default()
        };
        self.configuration.update_territory(code, &update)?;

        if let Some(territory) = self.configuration.get_territory(code) {
            self.instances.insert(
                code.to_string(),
                SubProjectionInstance::new(territory, &self.registry),
            );
        }
        self.refresh(code);
        debug!(territory = %code, projection_id = %projection_id, family = %family, "projection replaced");
        Ok(())
    }

    /// Re-apply a territory's resolved parameters to its existing instance
    pub fn update_territory_parameters(&mut self, code: &str) {
        if self.known(code, "update_territory_parameters").is_some() {
            self.refresh(code);
        }
    }

    /// Validate, store and apply a new parameter set
    ///
    /// Warnings are logged and returned; errors reject the whole set.
    pub fn set_territory_parameters(
        &mut self,
        code: &str,
        parameters: ProjectionParameters,
    ) -> ConfigurationResult<ParameterSetValidation> {
        let family = self
            .instances
            .get(code)
            .map(SubProjectionInstance::family)
            .ok_or_else(|| ConfigurationError::TerritoryNotFound(code.to_string()))?;
        let validation = self.constraints.validate_set(family, &parameters);
        if !validation.is_valid {
            let message = validation
                .errors
                .iter()
                .map(|issue| issue.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ConfigurationError::InvalidParameters {
                code: code.to_string(),
                message,
            });
        }
        for issue in &validation.warnings {
            warn!(territory = %code, parameter = %issue.key, "{}", issue.message);
        }

        let update = TerritoryUpdate {
            parameters: Some(parameters),
            ..Default::default()
        };
        self.configuration.update_territory(code, &update)?;
        self.refresh(code);
        Ok(validation)
    }

    /// Move a territory relative to the canvas center
    pub fn update_translation_offset(&mut self, code: &str, offset: [f64; 2]) -> ConfigurationResult<()> {
        if self.known(code, "update_translation_offset").is_none() {
            return Ok(());
        }
        let update = TerritoryUpdate {
            translate_offset: Some(offset),
            ..Default::default()
        };
        self.configuration.update_territory(code, &update)?;
        self.refresh(code);
        Ok(())
    }

    /// Change one territory's scale multiplier
    pub fn update_scale(&mut self, code: &str, multiplier: f64) -> ConfigurationResult<()> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(ConfigurationError::InvalidScaleMultiplier {
                code: code.to_string(),
                value: multiplier,
            });
        }
        let Some(current) = self.known(code, "update_scale") else {
            return Ok(());
        };
        let update = TerritoryUpdate {
            parameters: Some(ProjectionParameters {
                scale_multiplier: Some(multiplier),
                ..current.parameters
            }),
            ..Default::default()
        };
        self.configuration.update_territory(code, &update)?;
        self.refresh(code);
        Ok(())
    }

    /// Change the scale every multiplier applies to
    pub fn update_reference_scale(&mut self, scale: f64) -> ConfigurationResult<()> {
        self.configuration.set_reference_scale(scale)?;
        self.place_all();
        Ok(())
    }

    /// Change the canvas; every territory moves with its center
    pub fn update_canvas_dimensions(&mut self, dimensions: CanvasDimensions) -> ConfigurationResult<()> {
        self.configuration.set_canvas_dimensions(dimensions)?;
        self.place_all();
        Ok(())
    }

    /// Add a territory and instantiate its projection
    pub fn add_territory(&mut self, territory: TerritoryProjectionConfig) -> ConfigurationResult<()> {
        let code = territory.code.clone();
        self.configuration.add_territory(territory.clone())?;
        self.instances
            .insert(code.clone(), SubProjectionInstance::new(territory, &self.registry));
        self.refresh(&code);
        Ok(())
    }

    /// Remove a territory and drop its projection
    pub fn remove_territory(&mut self, code: &str) -> ConfigurationResult<bool> {
        let removed = self.configuration.remove_territory(code)?;
        if removed {
            self.instances.shift_remove(code);
        }
        Ok(removed)
    }

    /// Compile the current state into a fresh composite on a `width` × `height` canvas
    ///
    /// With `auto_fit`, a territory with an inset is fitted to its bounds
    /// inside that inset, and a primary territory without one is fitted to
    /// the padded canvas. The builder itself is left untouched.
    pub fn build(&self, width: f64, height: f64, auto_fit: bool) -> ConfigurationResult<CompositeProjection> {
        let canvas = CanvasDimensions::new(width, height);
        if !canvas.is_valid() {
            return Err(ConfigurationError::InvalidCanvasDimensions { width, height });
        }
        let anchor = canvas.center();
        let reference_scale = self.configuration.reference_scale();

        let mut instances: Vec<SubProjectionInstance> = self.instances.values().cloned().collect();
        for instance in &mut instances {
            instance.place(reference_scale, anchor);
        }

        if auto_fit {
            let padding = self.settings.fit_padding;
            for instance in &mut instances {
                let extent = match instance.territory().pixel_clip_extent {
                    Some(inset) => Some(inset.placed_at(instance.inset_origin(anchor))),
                    None if instance.territory().role.is_primary() => {
                        Some([[padding, padding], [width - padding, height - padding]])
                    }
                    None => None,
                };
                if let Some(extent) = extent {
                    if instance.fit(extent, reference_scale, anchor) {
                        debug!(territory = %instance.code(), ?extent, "territory fitted");
                    }
                }
            }
            for instance in &mut instances {
                instance.place(reference_scale, anchor);
            }
        }

        let territories: Vec<TerritoryProjectionConfig> =
            instances.iter().map(|i| i.territory().clone()).collect();
        for (first, second) in TerritoryRouter::overlapping(&territories) {
            warn!(first = %first, second = %second, "Territory bounds overlap; the smaller one wins");
        }

        info!(
            atlas_id = %self.configuration.atlas_id(),
            territories = instances.len(),
            auto_fit,
            "Composite projection built"
        );
        Ok(CompositeProjection::new(
            instances,
            reference_scale,
            anchor,
            self.settings.default_precision,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::TerritoryRole;
    use crate::family::ProjectionFamily;
    use crate::geometry::{GeoBounds, PixelExtent};
    use crate::parameters::LayeredParameterProvider;
    use crate::projection::Projection;

    fn builder() -> CompositeProjectionBuilder {
        let mut configuration =
            CompositeConfiguration::new("france", "France", 2700.0, CanvasDimensions::new(960.0, 500.0))
                .unwrap();
        configuration
            .add_territory(
                TerritoryProjectionConfig::new(
                    "FR-MET",
                    "France métropolitaine",
                    TerritoryRole::Primary,
                    "conic-conformal",
                    ProjectionFamily::Conic,
                )
                .with_parameters(ProjectionParameters {
                    rotate: Some([-3.0, -46.5, 0.0]),
                    parallels: Some([44.0, 49.0]),
                    ..Default::default()
                })
                .with_bounds(GeoBounds::new([-5.5, 41.0], [10.0, 51.5])),
            )
            .unwrap();
        configuration
            .add_territory(
                TerritoryProjectionConfig::new(
                    "FR-GP",
                    "Guadeloupe",
                    TerritoryRole::Secondary,
                    "mercator",
                    ProjectionFamily::Cylindrical,
                )
                .with_parameters(ProjectionParameters {
                    center: Some([-61.4, 16.2]),
                    scale_multiplier: Some(1.4),
                    ..Default::default()
                })
                .with_translate_offset([-350.0, 150.0])
                .with_pixel_clip_extent(PixelExtent::new(-60.0, -60.0, 60.0, 60.0))
                .with_bounds(GeoBounds::new([-61.9, 15.8], [-60.9, 16.6])),
            )
            .unwrap();
        CompositeProjectionBuilder::new(configuration, Arc::new(ProjectionRegistry::standard()))
    }

    #[test]
    fn test_new_instantiates_and_places_every_territory() {
        let builder = builder();
        let guadeloupe = builder.instance("FR-GP").unwrap();
        assert_eq!(guadeloupe.projection().scale(), 2700.0 * 1.4);
        assert_eq!(guadeloupe.projection().translate(), [130.0, 400.0]);
        assert_eq!(guadeloupe.projection().center(), [-61.4, 16.2]);
        assert_eq!(
            builder.instance("FR-MET").unwrap().projection().parallels(),
            Some([44.0, 49.0])
        );
    }

    #[test]
    fn test_update_scale_rejects_non_positive() {
        let mut builder = builder();
        assert!(builder.update_scale("FR-GP", 0.0).is_err());
        assert_eq!(builder.instance("FR-GP").unwrap().projection().scale(), 2700.0 * 1.4);

        builder.update_scale("FR-GP", 2.0).unwrap();
        assert_eq!(builder.instance("FR-GP").unwrap().projection().scale(), 5400.0);
    }

    #[test]
    fn test_unknown_territory_edits_are_no_ops() {
        let mut builder = builder();
        let before = builder.configuration().clone();
        builder.update_translation_offset("XX", [1.0, 1.0]).unwrap();
        builder.update_scale("XX", 2.0).unwrap();
        builder.update_territory_projection("XX", "mercator").unwrap();
        builder.update_territory_parameters("XX");
        assert_eq!(builder.configuration(), &before);
    }

    #[test]
    fn test_projection_change_normalizes_positioning() {
        let mut builder = builder();
        builder.update_territory_projection("FR-GP", "azimuthal-equal-area").unwrap();

        let stored = builder.configuration().get_territory("FR-GP").unwrap();
        assert_eq!(stored.family, ProjectionFamily::Azimuthal);
        assert_eq!(stored.parameters.rotate, Some([61.4, -16.2, 0.0]));
        assert_eq!(stored.parameters.center, Some([0.0, 0.0]));
        assert_eq!(
            builder.instance("FR-GP").unwrap().projection_id(),
            "azimuthal-equal-area"
        );
    }

    #[test]
    fn test_reference_scale_applies_to_all() {
        let mut builder = builder();
        builder.update_reference_scale(1000.0).unwrap();
        assert_eq!(builder.instance("FR-MET").unwrap().projection().scale(), 1000.0);
        assert_eq!(builder.instance("FR-GP").unwrap().projection().scale(), 1400.0);
        assert!(builder.update_reference_scale(-1.0).is_err());
    }

    #[test]
    fn test_set_parameters_rejects_invalid_sets() {
        let mut builder = builder();
        let result = builder.set_territory_parameters(
            "FR-MET",
            ProjectionParameters {
                clip_angle: Some(500.0),
                parallels: Some([200.0, 10.0]),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(ConfigurationError::InvalidParameters { .. })));

        let validation = builder
            .set_territory_parameters(
                "FR-MET",
                ProjectionParameters {
                    parallels: Some([45.0, 45.5]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(validation.warnings.len(), 1);
        assert_eq!(
            builder.instance("FR-MET").unwrap().projection().parallels(),
            Some([45.0, 45.5])
        );
    }

    #[test]
    fn test_provider_overrides_stored_parameters() {
        let mut provider = LayeredParameterProvider::new();
        provider.set_territory(
            "FR-GP",
            ProjectionParameters {
                scale_multiplier: Some(3.0),
                ..Default::default()
            },
        );
        let builder = builder().with_parameter_provider(Arc::new(provider));
        assert_eq!(builder.instance("FR-GP").unwrap().projection().scale(), 8100.0);
        assert_eq!(
            builder.effective_parameters("FR-GP").unwrap().center,
            Some([-61.4, 16.2])
        );
    }

    fn with_atlas_defaults() -> CompositeProjectionBuilder {
        let mut provider = LayeredParameterProvider::new();
        provider.set_global(ProjectionParameters {
            precision: Some(0.25),
            ..Default::default()
        });
        provider.set_atlas(ProjectionParameters {
            scale_multiplier: Some(1.0),
            center: Some([0.0, 0.0]),
            ..Default::default()
        });
        builder().with_parameter_provider(Arc::new(provider))
    }

    #[test]
    fn test_provider_defaults_do_not_mask_stored_parameters() {
        let builder = with_atlas_defaults();
        let guadeloupe = builder.instance("FR-GP").unwrap().projection();
        assert_eq!(guadeloupe.scale(), 2700.0 * 1.4);
        assert_eq!(guadeloupe.center(), [-61.4, 16.2]);
        assert_eq!(guadeloupe.precision(), 0.25);
    }

    #[test]
    fn test_update_scale_reaches_projection_under_provider_defaults() {
        let mut builder = with_atlas_defaults();
        builder.update_scale("FR-GP", 2.0).unwrap();
        assert_eq!(builder.instance("FR-GP").unwrap().projection().scale(), 5400.0);
        assert_eq!(
            builder.effective_parameters("FR-GP").unwrap().scale_multiplier,
            Some(2.0)
        );
    }

    #[test]
    fn test_parameter_edits_reach_projection_under_provider_defaults() {
        let mut builder = with_atlas_defaults();
        builder
            .set_territory_parameters(
                "FR-GP",
                ProjectionParameters {
                    center: Some([-61.0, 16.0]),
                    scale_multiplier: Some(1.5),
                    ..Default::default()
                },
            )
            .unwrap();
        let guadeloupe = builder.instance("FR-GP").unwrap().projection();
        assert_eq!(guadeloupe.center(), [-61.0, 16.0]);
        assert_eq!(guadeloupe.scale(), 2700.0 * 1.5);

        builder.update_territory_parameters("FR-GP");
        assert_eq!(builder.instance("FR-GP").unwrap().projection().center(), [-61.0, 16.0]);
    }

    #[test]
    fn test_build_is_side_effect_free() {
        let builder = builder();
        let before = builder.instance("FR-GP").unwrap().projection().scale();
        let composite = builder.build(960.0, 500.0, true).unwrap();

        assert_eq!(builder.instance("FR-GP").unwrap().projection().scale(), before);
        assert_eq!(composite.territory_codes(), vec!["FR-MET", "FR-GP"]);
        assert!(builder.build(0.0, 500.0, false).is_err());
    }

    #[test]
    fn test_auto_fit_places_inset_territory_inside_its_inset() {
        let composite = builder().build(960.0, 500.0, true).unwrap();
        let p = composite.project([-61.4, 16.2]).unwrap();
        // inset: canvas center + offset ± 60
        assert!(p[0] >= 70.0 && p[0] <= 190.0, "x = {}", p[0]);
        assert!(p[1] >= 340.0 && p[1] <= 460.0, "y = {}", p[1]);
    }

    #[test]
    fn test_remove_drops_instance() {
        let mut builder = builder();
        assert_eq!(builder.remove_territory("FR-GP"), Ok(true));
        assert!(builder.instance("FR-GP").is_none());
        assert!(builder.remove_territory("FR-MET").is_err());
    }
}
