// Copyright 2025 Cowboy AI, LLC.

//! Projection parameters and their layered resolution
//!
//! Parameters can be set globally, per atlas preset and per territory. The
//! value a territory actually uses is resolved through one explicit
//! [`ParameterChain`], later layers overriding earlier ones field by field.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Name of a projection parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterKey {
    /// `[λ, φ, γ]` rotation
    Rotate,
    /// `[longitude, latitude]` center
    Center,
    /// Two standard parallels
    Parallels,
    /// Factor applied to the shared reference scale
    ScaleMultiplier,
    /// Small-circle clip radius
    ClipAngle,
    /// Perspective distance
    Distance,
    /// Perspective tilt
    Tilt,
    /// Resampling threshold
    Precision,
}

impl ParameterKey {
    /// Every key
    pub const ALL: [ParameterKey; 8] = [
        ParameterKey::Rotate,
        ParameterKey::Center,
        ParameterKey::Parallels,
        ParameterKey::ScaleMultiplier,
        ParameterKey::ClipAngle,
        ParameterKey::Distance,
        ParameterKey::Tilt,
        ParameterKey::Precision,
    ];

    /// Name as used in documents
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterKey::Rotate => "rotate",
            ParameterKey::Center => "center",
            ParameterKey::Parallels => "parallels",
            ParameterKey::ScaleMultiplier => "scaleMultiplier",
            ParameterKey::ClipAngle => "clipAngle",
            ParameterKey::Distance => "distance",
            ParameterKey::Tilt => "tilt",
            ParameterKey::Precision => "precision",
        }
    }

    /// Number of components a value for this key has
    pub fn arity(self) -> usize {
        match self {
            ParameterKey::Rotate => 3,
            ParameterKey::Center | ParameterKey::Parallels => 2,
            ParameterKey::ScaleMultiplier
            | ParameterKey::ClipAngle
            | ParameterKey::Distance
            | ParameterKey::Tilt
            | ParameterKey::Precision => 1,
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of one parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// Scalar
    Number(f64),
    /// Two components
    Pair([f64; 2]),
    /// Three components
    Triple([f64; 3]),
}

impl ParameterValue {
    /// Components as a slice
    pub fn components(&self) -> &[f64] {
        match self {
            ParameterValue::Number(n) => std::slice::from_ref(n),
            ParameterValue::Pair(p) => p,
            ParameterValue::Triple(t) => t,
        }
    }
}

/// Family-dependent projection knobs; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionParameters {
    /// `[λ, φ, γ]` in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<[f64; 3]>,
    /// `[longitude, latitude]` in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 2]>,
    /// Standard parallels in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallels: Option<[f64; 2]>,
    /// Relative scale; absolute scale is reference scale × multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_multiplier: Option<f64>,
    /// Clip radius in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_angle: Option<f64>,
    /// Perspective distance in sphere radii
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Perspective tilt in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    /// Resampling threshold in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,
}

impl ProjectionParameters {
    /// Read one parameter
    pub fn get(&self, key: ParameterKey) -> Option<ParameterValue> {
        match key {
            ParameterKey::Rotate => self.rotate.map(ParameterValue::Triple),
            ParameterKey::Center => self.center.map(ParameterValue::Pair),
            ParameterKey::Parallels => self.parallels.map(ParameterValue::Pair),
            ParameterKey::ScaleMultiplier => self.scale_multiplier.map(ParameterValue::Number),
            ParameterKey::ClipAngle => self.clip_angle.map(ParameterValue::Number),
            ParameterKey::Distance => self.distance.map(ParameterValue::Number),
            ParameterKey::Tilt => self.tilt.map(ParameterValue::Number),
            ParameterKey::Precision => self.precision.map(ParameterValue::Number),
        }
    }

    /// Keys that carry a value
    pub fn present_keys(&self) -> Vec<ParameterKey> {
        ParameterKey::ALL
            .into_iter()
            .filter(|k| self.get(*k).is_some())
            .collect()
    }

    /// Unset one parameter
    pub fn clear(&mut self, key: ParameterKey) {
        match key {
            ParameterKey::Rotate => self.rotate = None,
            ParameterKey::Center => self.center = None,
            ParameterKey::Parallels => self.parallels = None,
            ParameterKey::ScaleMultiplier => self.scale_multiplier = None,
            ParameterKey::ClipAngle => self.clip_angle = None,
            ParameterKey::Distance => self.distance = None,
            ParameterKey::Tilt => self.tilt = None,
            ParameterKey::Precision => self.precision = None,
        }
    }

    /// Whether no parameter is set
    pub fn is_empty(&self) -> bool {
        self.present_keys().is_empty()
    }

    /// `self` layered over `base`: set fields win, unset fields fall through
    pub fn merged_over(&self, base: &ProjectionParameters) -> ProjectionParameters {
        ProjectionParameters {
            rotate: self.rotate.or(base.rotate),
            center: self.center.or(base.center),
            parallels: self.parallels.or(base.parallels),
            scale_multiplier: self.scale_multiplier.or(base.scale_multiplier),
            clip_angle: self.clip_angle.or(base.clip_angle),
            distance: self.distance.or(base.distance),
            tilt: self.tilt.or(base.tilt),
            precision: self.precision.or(base.precision),
        }
    }
}

/// Where a layer of parameters comes from, lowest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParameterLayer {
    /// Application-wide defaults
    Global,
    /// Atlas preset
    Atlas,
    /// Stored territory configuration
    Territory,
    /// Live override (editor state)
    Override,
}

/// Ordered precedence chain of parameter layers
#[derive(Debug, Clone, Default)]
pub struct ParameterChain {
    layers: Vec<(ParameterLayer, ProjectionParameters)>,
}

impl ParameterChain {
    /// Empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer; layers are kept sorted by precedence
    pub fn with_layer(mut self, layer: ParameterLayer, parameters: ProjectionParameters) -> Self {
        let at = self
            .layers
            .iter()
            .position(|(l, _)| *l > layer)
            .unwrap_or(self.layers.len());
        self.layers.insert(at, (layer, parameters));
        self
    }

    /// Add several layers at once
    pub fn with_layers<I>(self, layers: I) -> Self
    where
        I: IntoIterator<Item = (ParameterLayer, ProjectionParameters)>,
    {
        layers
            .into_iter()
            .fold(self, |chain, (layer, parameters)| chain.with_layer(layer, parameters))
    }

    /// Fold every layer, highest precedence winning per field
    pub fn resolve(&self) -> ProjectionParameters {
        self.layers
            .iter()
            .fold(ProjectionParameters::default(), |acc, (_, p)| p.merged_over(&acc))
    }
}

/// Source of per-territory parameters outside the configuration itself
///
/// A provider contributes layers rather than a finished parameter set, so
/// its global and atlas defaults sit below the stored territory
/// configuration and only its per-territory override sits above it.
pub trait ParameterProvider: Send + Sync {
    /// Layers this provider contributes for a territory
    fn layers(&self, code: &str) -> Vec<(ParameterLayer, ProjectionParameters)>;

    /// Parameters a territory renders with, from this provider alone
    fn effective_parameters(&self, code: &str) -> ProjectionParameters {
        ParameterChain::new().with_layers(self.layers(code)).resolve()
    }

    /// Parameters that belong in an exported document
    ///
    /// Global defaults are application state and never exported.
    fn exportable_parameters(&self, code: &str) -> ProjectionParameters {
        ParameterChain::new()
            .with_layers(
                self.layers(code)
                    .into_iter()
                    .filter(|(layer, _)| *layer != ParameterLayer::Global),
            )
            .resolve()
    }
}

/// Provider layering global defaults, an atlas preset and territory overrides
#[derive(Debug, Clone, Default)]
pub struct LayeredParameterProvider {
    global: ProjectionParameters,
    atlas: ProjectionParameters,
    territories: HashMap<String, ProjectionParameters>,
}

impl LayeredParameterProvider {
    /// Empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the global layer
    pub fn set_global(&mut self, parameters: ProjectionParameters) {
        self.global = parameters;
    }

    /// Replace the atlas layer
    pub fn set_atlas(&mut self, parameters: ProjectionParameters) {
        self.atlas = parameters;
    }

    /// Replace one territory's override layer
    pub fn set_territory(&mut self, code: impl Into<String>, parameters: ProjectionParameters) {
        self.territories.insert(code.into(), parameters);
    }

    /// Drop one territory's override layer
    pub fn clear_territory(&mut self, code: &str) -> bool {
        self.territories.remove(code).is_some()
    }

    fn territory(&self, code: &str) -> ProjectionParameters {
        self.territories.get(code).cloned().unwrap_or_default()
    }
}

impl ParameterProvider for LayeredParameterProvider {
    fn layers(&self, code: &str) -> Vec<(ParameterLayer, ProjectionParameters)> {
        vec![
            (ParameterLayer::Global, self.global.clone()),
            (ParameterLayer::Atlas, self.atlas.clone()),
            (ParameterLayer::Override, self.territory(code)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_prefers_set_fields() {
        let base = ProjectionParameters {
            rotate: Some([1.0, 2.0, 3.0]),
            precision: Some(0.5),
            ..Default::default()
        };
        let top = ProjectionParameters {
            rotate: Some([4.0, 5.0, 6.0]),
            scale_multiplier: Some(2.0),
            ..Default::default()
        };
        let merged = top.merged_over(&base);

        assert_eq!(merged.rotate, Some([4.0, 5.0, 6.0]));
        assert_eq!(merged.precision, Some(0.5));
        assert_eq!(merged.scale_multiplier, Some(2.0));
    }

    #[test]
    fn test_chain_orders_layers_by_precedence() {
        let chain = ParameterChain::new()
            .with_layer(
                ParameterLayer::Override,
                ProjectionParameters {
                    clip_angle: Some(40.0),
                    ..Default::default()
                },
            )
            .with_layer(
                ParameterLayer::Global,
                ProjectionParameters {
                    clip_angle: Some(90.0),
                    precision: Some(0.2),
                    ..Default::default()
                },
            );
        let resolved = chain.resolve();

        assert_eq!(resolved.clip_angle, Some(40.0));
        assert_eq!(resolved.precision, Some(0.2));
    }

    #[test]
    fn test_layered_provider() {
        let mut provider = LayeredParameterProvider::new();
        provider.set_global(ProjectionParameters {
            precision: Some(0.1),
            ..Default::default()
        });
        provider.set_atlas(ProjectionParameters {
            scale_multiplier: Some(1.0),
            ..Default::default()
        });
        provider.set_territory(
            "FR-GF",
            ProjectionParameters {
                scale_multiplier: Some(0.8),
                ..Default::default()
            },
        );

        let effective = provider.effective_parameters("FR-GF");
        assert_eq!(effective.scale_multiplier, Some(0.8));
        assert_eq!(effective.precision, Some(0.1));

        let exportable = provider.exportable_parameters("FR-GF");
        assert_eq!(exportable.scale_multiplier, Some(0.8));
        assert_eq!(exportable.precision, None);

        assert_eq!(
            provider.effective_parameters("unknown").scale_multiplier,
            Some(1.0)
        );
    }

    #[test]
    fn test_provider_defaults_sit_below_the_territory_layer() {
        let mut provider = LayeredParameterProvider::new();
        provider.set_global(ProjectionParameters {
            precision: Some(0.3),
            ..Default::default()
        });
        provider.set_atlas(ProjectionParameters {
            scale_multiplier: Some(1.0),
            center: Some([0.0, 0.0]),
            ..Default::default()
        });
        provider.set_territory(
            "FR-GP",
            ProjectionParameters {
                clip_angle: Some(30.0),
                ..Default::default()
            },
        );
        let stored = ProjectionParameters {
            scale_multiplier: Some(2.0),
            center: Some([-61.4, 16.2]),
            clip_angle: Some(60.0),
            ..Default::default()
        };

        let resolved = ParameterChain::new()
            .with_layer(ParameterLayer::Territory, stored)
            .with_layers(provider.layers("FR-GP"))
            .resolve();

        assert_eq!(resolved.scale_multiplier, Some(2.0));
        assert_eq!(resolved.center, Some([-61.4, 16.2]));
        assert_eq!(resolved.clip_angle, Some(30.0));
        assert_eq!(resolved.precision, Some(0.3));
    }

    #[test]
    fn test_parameters_serialize_camel_case_and_skip_unset() {
        let parameters = ProjectionParameters {
            scale_multiplier: Some(1.5),
            clip_angle: Some(60.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&parameters).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"scaleMultiplier": 1.5, "clipAngle": 60.0})
        );
    }

    #[test]
    fn test_present_keys() {
        let parameters = ProjectionParameters {
            center: Some([2.0, 46.0]),
            tilt: Some(10.0),
            ..Default::default()
        };
        assert_eq!(
            parameters.present_keys(),
            vec![ParameterKey::Center, ParameterKey::Tilt]
        );
        assert!(ProjectionParameters::default().is_empty());
    }
}
