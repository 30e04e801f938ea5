// Copyright 2025 Cowboy AI, LLC.

//! One territory paired with its live projection

use crate::configuration::TerritoryProjectionConfig;
use crate::constraints::ParameterConstraintsEngine;
use crate::family::{PositioningMode, ProjectionFamily};
use crate::parameters::{ParameterKey, ProjectionParameters};
use crate::positioning;
use crate::projection::Projection;
use crate::registry::ProjectionRegistry;
use tracing::{debug, warn};

/// Vertices per bounds edge when fitting to a territory's bounds
const BOUNDS_DENSITY: usize = 16;

/// A territory and the projection instance drawing it
///
/// Placement keeps two numbers apart from the stored configuration: the
/// effective scale multiplier and pixel offset. They start out as the
/// configured values and are replaced when the instance is fitted.
#[derive(Debug, Clone)]
pub struct SubProjectionInstance {
    territory: TerritoryProjectionConfig,
    projection_id: String,
    family: ProjectionFamily,
    projection: Box<dyn Projection>,
    multiplier: f64,
    offset: [f64; 2],
}

impl SubProjectionInstance {
    /// Instantiate the territory's projection from `registry`
    ///
    /// Unknown projection ids fall back to the family default.
    pub fn new(territory: TerritoryProjectionConfig, registry: &ProjectionRegistry) -> Self {
        let resolved = registry.resolve(&territory.projection_id, territory.family);
        if resolved.substituted {
            debug!(
                territory = %territory.code,
                requested = %territory.projection_id,
                projection_id = %resolved.id,
                "projection substituted"
            );
        }
        Self {
            multiplier: territory.scale_multiplier(),
            offset: territory.translate_offset,
            projection_id: resolved.id,
            family: resolved.family,
            projection: resolved.projection,
            territory,
        }
    }

    /// Territory code
    pub fn code(&self) -> &str {
        &self.territory.code
    }

    /// Territory configuration this instance was last given
    pub fn territory(&self) -> &TerritoryProjectionConfig {
        &self.territory
    }

    /// Id of the projection actually instantiated
    pub fn projection_id(&self) -> &str {
        &self.projection_id
    }

    /// Family of the projection actually instantiated
    pub fn family(&self) -> ProjectionFamily {
        self.family
    }

    /// The live projection
    pub fn projection(&self) -> &dyn Projection {
        self.projection.as_ref()
    }

    /// Effective scale multiplier
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Effective pixel offset from the anchor
    pub fn offset(&self) -> [f64; 2] {
        self.offset
    }

    pub(crate) fn set_territory(&mut self, territory: TerritoryProjectionConfig) {
        self.offset = territory.translate_offset;
        self.territory = territory;
    }

    pub(crate) fn set_precision(&mut self, precision: f64) {
        self.projection.set_precision(precision);
    }

    /// Push `parameters` into the projection
    ///
    /// Values rejected by the family's constraints, and values the family
    /// does not use, are skipped. Unset values keep the projection's own.
    pub(crate) fn apply_parameters(
        &mut self,
        parameters: &ProjectionParameters,
        constraints: &ParameterConstraintsEngine,
        default_precision: f64,
    ) {
        let family = self.family;
        let mut accepted = parameters.clone();
        let validation = constraints.validate_set(family, parameters);
        for issue in &validation.errors {
            warn!(
                territory = %self.territory.code,
                parameter = %issue.key,
                "skipping parameter: {}",
                issue.message
            );
            accepted.clear(issue.key);
        }
        for key in accepted.present_keys() {
            if !constraints.is_relevant(family, key)
                && !matches!(key, ParameterKey::Center | ParameterKey::Rotate)
            {
                debug!(territory = %self.territory.code, parameter = %key, family = %family, "parameter not used by family");
                accepted.clear(key);
            }
        }

        if family.positioning_mode() != PositioningMode::Fixed {
            let canonical = positioning::resolve(family, &accepted);
            positioning::apply_positioning(self.projection.as_mut(), family, &canonical);
        }
        if let Some(parallels) = accepted.parallels {
            if !self.projection.set_parallels(parallels) {
                debug!(territory = %self.territory.code, projection_id = %self.projection_id, "projection has no parallels");
            }
        }
        if let Some(angle) = accepted.clip_angle {
            self.projection.set_clip_angle(Some(angle));
        }
        if let Some(distance) = accepted.distance {
            if !self.projection.set_distance(distance) {
                debug!(territory = %self.territory.code, projection_id = %self.projection_id, "projection has no distance");
            }
        }
        if let Some(tilt) = accepted.tilt {
            if !self.projection.set_tilt(tilt) {
                debug!(territory = %self.territory.code, projection_id = %self.projection_id, "projection has no tilt");
            }
        }
        self.projection
            .set_precision(accepted.precision.unwrap_or(default_precision));
        self.multiplier = accepted.scale_multiplier.unwrap_or(1.0);

        debug!(
            territory = %self.territory.code,
            projection_id = %self.projection_id,
            multiplier = self.multiplier,
            "parameters applied"
        );
    }

    /// Origin the territory's inset is measured from
    pub(crate) fn inset_origin(&self, anchor: [f64; 2]) -> [f64; 2] {
        [
            anchor[0] + self.territory.translate_offset[0],
            anchor[1] + self.territory.translate_offset[1],
        ]
    }

    /// Set scale, translate and clip extent around `anchor`
    pub(crate) fn place(&mut self, reference_scale: f64, anchor: [f64; 2]) {
        self.place_scaled(reference_scale, anchor, 1.0);
    }

    /// [`Self::place`] with pixel offsets and insets multiplied by `layout`
    ///
    /// A layout factor `k` together with a reference scale multiplied by `k`
    /// scales the whole territory's output about `anchor` by `k`.
    pub(crate) fn place_scaled(&mut self, reference_scale: f64, anchor: [f64; 2], layout: f64) {
        self.projection.set_scale(reference_scale * self.multiplier);
        self.projection.set_translate([
            anchor[0] + layout * self.offset[0],
            anchor[1] + layout * self.offset[1],
        ]);
        let origin = [
            anchor[0] + layout * self.territory.translate_offset[0],
            anchor[1] + layout * self.territory.translate_offset[1],
        ];
        self.projection.set_clip_extent(self.territory.pixel_clip_extent.map(|inset| {
            let [[x0, y0], [x1, y1]] = inset.placed_at([0.0, 0.0]);
            [
                [origin[0] + layout * x0, origin[1] + layout * y0],
                [origin[0] + layout * x1, origin[1] + layout * y1],
            ]
        }));
    }

    /// Fit the territory's bounds into `extent`; `false` without bounds
    ///
    /// The fitted scale and translate become the effective multiplier and
    /// offset, so later placement keeps them.
    pub(crate) fn fit(&mut self, extent: [[f64; 2]; 2], reference_scale: f64, anchor: [f64; 2]) -> bool {
        let Some(bounds) = self.territory.bounds else {
            return false;
        };
        self.projection
            .fit_extent(extent, &bounds.to_polygon(BOUNDS_DENSITY));
        self.multiplier = self.projection.scale() / reference_scale;
        let translate = self.projection.translate();
        self.offset = [translate[0] - anchor[0], translate[1] - anchor[1]];
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::TerritoryRole;
    use crate::geometry::{GeoBounds, PixelExtent};

    fn instance(projection_id: &str, family: ProjectionFamily) -> SubProjectionInstance {
        let territory = TerritoryProjectionConfig::new("FR-GP", "Guadeloupe", TerritoryRole::Secondary, projection_id, family)
            .with_translate_offset([-300.0, 100.0])
            .with_pixel_clip_extent(PixelExtent::new(-50.0, -50.0, 50.0, 50.0))
            .with_bounds(GeoBounds::new([-61.9, 15.8], [-60.9, 16.6]));
        SubProjectionInstance::new(territory, &ProjectionRegistry::standard())
    }

    #[test]
    fn test_unknown_id_falls_back_to_family_default() {
        let instance = instance("no-such-projection", ProjectionFamily::Conic);
        assert_eq!(instance.projection_id(), ProjectionRegistry::default_id_for(ProjectionFamily::Conic));
        assert_eq!(instance.family(), ProjectionFamily::Conic);
    }

    #[test]
    fn test_place_uses_multiplier_and_offset() {
        let mut instance = instance("mercator", ProjectionFamily::Cylindrical);
        let parameters = ProjectionParameters {
            scale_multiplier: Some(1.5),
            ..Default::default()
        };
        instance.apply_parameters(&parameters, &ParameterConstraintsEngine::new(), 0.1);
        instance.place(1000.0, [480.0, 250.0]);

        assert_eq!(instance.projection().scale(), 1500.0);
        assert_eq!(instance.projection().translate(), [180.0, 350.0]);
        assert_eq!(
            instance.projection().clip_extent(),
            Some([[130.0, 300.0], [230.0, 400.0]])
        );
    }

    #[test]
    fn test_apply_positions_by_family() {
        let mut mercator = instance("mercator", ProjectionFamily::Cylindrical);
        let parameters = ProjectionParameters {
            center: Some([-61.4, 16.2]),
            ..Default::default()
        };
        mercator.apply_parameters(&parameters, &ParameterConstraintsEngine::new(), 0.1);
        assert_eq!(mercator.projection().center(), [-61.4, 16.2]);
        assert_eq!(mercator.projection().rotate(), [0.0, 0.0, 0.0]);

        let mut conic = instance("conic-conformal", ProjectionFamily::Conic);
        conic.apply_parameters(&parameters, &ParameterConstraintsEngine::new(), 0.1);
        assert_eq!(conic.projection().center(), [0.0, 0.0]);
        assert_eq!(conic.projection().rotate(), [61.4, -16.2, 0.0]);
    }

    #[test]
    fn test_invalid_values_are_skipped() {
        let mut conic = instance("conic-conformal", ProjectionFamily::Conic);
        let parameters = ProjectionParameters {
            parallels: Some([120.0, 130.0]),
            precision: Some(0.5),
            ..Default::default()
        };
        conic.apply_parameters(&parameters, &ParameterConstraintsEngine::new(), 0.1);
        assert_eq!(conic.projection().parallels(), Some([30.0, 50.0]));
        assert_eq!(conic.projection().precision(), 0.5);
    }

    #[test]
    fn test_layout_factor_scales_offset_and_inset() {
        let mut instance = instance("mercator", ProjectionFamily::Cylindrical);
        instance.place_scaled(500.0, [100.0, 100.0], 0.5);

        assert_eq!(instance.projection().scale(), 500.0);
        assert_eq!(instance.projection().translate(), [-50.0, 150.0]);
        assert_eq!(
            instance.projection().clip_extent(),
            Some([[-75.0, 125.0], [-25.0, 175.0]])
        );
    }

    #[test]
    fn test_fit_keeps_result_across_placement() {
        let mut instance = instance("mercator", ProjectionFamily::Cylindrical);
        instance.place(1000.0, [480.0, 250.0]);
        let extent = PixelExtent::new(-50.0, -50.0, 50.0, 50.0).placed_at(instance.inset_origin([480.0, 250.0]));
        assert!(instance.fit(extent, 1000.0, [480.0, 250.0]));

        let fitted_scale = instance.projection().scale();
        instance.place(1000.0, [480.0, 250.0]);
        assert!((instance.projection().scale() - fitted_scale).abs() < 1e-9);

        let p = instance.projection().project([-61.4, 16.2]).unwrap();
        assert!(p[0] >= 130.0 && p[0] <= 230.0 && p[1] >= 300.0 && p[1] <= 400.0);
    }
}
