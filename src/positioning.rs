// Copyright 2025 Cowboy AI, LLC.

//! Family-independent positioning
//!
//! A territory's focus point is stored once, as a [`CanonicalPositioning`],
//! and translated to whatever the projection family natively understands:
//! `center` for cylindrical families, `rotate` for conic, azimuthal and
//! similar families. Composites keep both untouched.
//!
//! Focus `(lon, lat)` converts as `center = [lon, lat]` and
//! `rotate = [-lon, -lat, γ]`; the conversions are exact inverses.

use crate::family::{PositioningMode, ProjectionFamily};
use crate::parameters::ProjectionParameters;
use crate::projection::Projection;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Focus used when neither `center` nor `rotate` says anything
pub const DEFAULT_FOCUS: [f64; 2] = [0.0, 0.0];

/// Where a territory's view is aimed, independent of family
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPositioning {
    /// Focus longitude in degrees
    pub focus_longitude: f64,
    /// Focus latitude in degrees
    pub focus_latitude: f64,
    /// Roll about the view axis in degrees
    #[serde(default)]
    pub rotate_gamma: f64,
}

impl CanonicalPositioning {
    /// Focus on `(longitude, latitude)` without roll
    pub fn focus(longitude: f64, latitude: f64) -> Self {
        Self {
            focus_longitude: longitude,
            focus_latitude: latitude,
            rotate_gamma: 0.0,
        }
    }

    /// Set the roll
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.rotate_gamma = gamma;
        self
    }
}

/// Native `center` / `rotate` values for one family
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NativePositioning {
    /// Value for the projection's center, if the family sets it
    pub center: Option<[f64; 2]>,
    /// Value for the projection's rotation, if the family sets it
    pub rotate: Option<[f64; 3]>,
}

/// `center` form of a focus
pub fn canonical_to_center(canonical: &CanonicalPositioning) -> [f64; 2] {
    [canonical.focus_longitude, canonical.focus_latitude]
}

/// `rotate` form of a focus
pub fn canonical_to_rotate(canonical: &CanonicalPositioning) -> [f64; 3] {
    [
        -canonical.focus_longitude,
        -canonical.focus_latitude,
        canonical.rotate_gamma,
    ]
}

/// Focus expressed by a `center`
pub fn center_to_canonical(center: [f64; 2]) -> CanonicalPositioning {
    CanonicalPositioning::focus(center[0], center[1])
}

/// Focus expressed by a `rotate`
pub fn rotate_to_canonical(rotate: [f64; 3]) -> CanonicalPositioning {
    CanonicalPositioning::focus(-rotate[0], -rotate[1]).with_gamma(rotate[2])
}

/// Native values for `family`; the non-native knob is reset to zero
pub fn to_native(family: ProjectionFamily, canonical: &CanonicalPositioning) -> NativePositioning {
    match family.positioning_mode() {
        PositioningMode::Center => NativePositioning {
            center: Some(canonical_to_center(canonical)),
            rotate: Some([0.0, 0.0, 0.0]),
        },
        PositioningMode::Rotate => NativePositioning {
            center: Some([0.0, 0.0]),
            rotate: Some(canonical_to_rotate(canonical)),
        },
        PositioningMode::Fixed => NativePositioning::default(),
    }
}

fn is_zero(values: &[f64]) -> bool {
    values.iter().all(|v| *v == 0.0)
}

/// Focus implied by stored `center` / `rotate`, preferring non-zero values
///
/// `center` wins when both are non-zero; the roll still comes from `rotate`.
pub fn infer_canonical_from_legacy(
    center: Option<[f64; 2]>,
    rotate: Option<[f64; 3]>,
) -> CanonicalPositioning {
    let gamma = rotate.map_or(0.0, |r| r[2]);
    match (center, rotate) {
        (Some(c), _) if !is_zero(&c) => center_to_canonical(c).with_gamma(gamma),
        (_, Some(r)) if !is_zero(&r) => rotate_to_canonical(r),
        _ => CanonicalPositioning::focus(DEFAULT_FOCUS[0], DEFAULT_FOCUS[1]).with_gamma(gamma),
    }
}

/// Focus for a family, reading its native parameter first
///
/// A non-zero native value wins, then a non-zero value of the other knob,
/// then [`DEFAULT_FOCUS`]. For rotate families a `center` keeps the roll of
/// any stored `rotate`.
pub fn resolve(family: ProjectionFamily, parameters: &ProjectionParameters) -> CanonicalPositioning {
    let center = parameters.center.filter(|c| !is_zero(c));
    let rotate = parameters.rotate.filter(|r| !is_zero(r));
    match family.positioning_mode() {
        PositioningMode::Center => match (center, rotate) {
            (Some(c), _) => center_to_canonical(c),
            (None, Some(r)) => rotate_to_canonical(r),
            (None, None) => CanonicalPositioning::focus(DEFAULT_FOCUS[0], DEFAULT_FOCUS[1]),
        },
        PositioningMode::Rotate => match (rotate, center) {
            (Some(r), _) => rotate_to_canonical(r),
            (None, Some(c)) => {
                center_to_canonical(c).with_gamma(parameters.rotate.map_or(0.0, |r| r[2]))
            }
            (None, None) => CanonicalPositioning::focus(DEFAULT_FOCUS[0], DEFAULT_FOCUS[1]),
        },
        PositioningMode::Fixed => infer_canonical_from_legacy(parameters.center, parameters.rotate),
    }
}

/// Rewrite `center` / `rotate` so only the family's native knob carries the focus
///
/// Fixed families come back unchanged.
pub fn normalize_parameters(
    family: ProjectionFamily,
    parameters: &ProjectionParameters,
) -> ProjectionParameters {
    if family.positioning_mode() == PositioningMode::Fixed {
        return parameters.clone();
    }
    let native = to_native(family, &resolve(family, parameters));
    ProjectionParameters {
        center: native.center,
        rotate: native.rotate,
        ..parameters.clone()
    }
}

/// Set `projection`'s center and rotation for `family`
pub fn apply_positioning(
    projection: &mut dyn Projection,
    family: ProjectionFamily,
    canonical: &CanonicalPositioning,
) {
    let native = to_native(family, canonical);
    if let Some(rotate) = native.rotate {
        projection.set_rotate(rotate);
    }
    if let Some(center) = native.center {
        projection.set_center(center);
    }
    debug!(
        family = %family,
        focus_longitude = canonical.focus_longitude,
        focus_latitude = canonical.focus_latitude,
        "applied positioning"
    );
}

/// Wrap a longitude into `[-180, 180]`; values already inside are untouched
pub fn normalize_longitude(longitude: f64) -> f64 {
    if !longitude.is_finite() || (-180.0..=180.0).contains(&longitude) {
        return longitude;
    }
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}

/// Clamp a latitude into `[-90, 90]`
pub fn clamp_latitude(latitude: f64) -> f64 {
    latitude.clamp(-90.0, 90.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{RawProjection, StandardProjection};
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(181.0, -179.0 ; "just past the antimeridian")]
    #[test_case(-181.0, 179.0 ; "just before the antimeridian")]
    #[test_case(180.0, 180.0 ; "east edge untouched")]
    #[test_case(-180.0, -180.0 ; "west edge untouched")]
    #[test_case(45.5, 45.5 ; "inside untouched")]
    #[test_case(540.0, -180.0 ; "one and a half turns")]
    fn test_normalize_longitude(input: f64, expected: f64) {
        assert!((normalize_longitude(input) - expected).abs() < 1e-9);
    }

    #[test_case(95.0, 90.0 ; "above the north pole")]
    #[test_case(-91.0, -90.0 ; "below the south pole")]
    #[test_case(12.0, 12.0 ; "ordinary latitude")]
    fn test_clamp_latitude(input: f64, expected: f64) {
        assert_eq!(clamp_latitude(input), expected);
    }

    #[test]
    fn test_to_native_per_mode() {
        let focus = CanonicalPositioning::focus(2.5, 46.5).with_gamma(5.0);

        let cylindrical = to_native(ProjectionFamily::Cylindrical, &focus);
        assert_eq!(cylindrical.center, Some([2.5, 46.5]));
        assert_eq!(cylindrical.rotate, Some([0.0, 0.0, 0.0]));

        let conic = to_native(ProjectionFamily::Conic, &focus);
        assert_eq!(conic.center, Some([0.0, 0.0]));
        assert_eq!(conic.rotate, Some([-2.5, -46.5, 5.0]));

        assert_eq!(
            to_native(ProjectionFamily::Composite, &focus),
            NativePositioning::default()
        );
    }

    #[test]
    fn test_legacy_prefers_non_zero() {
        assert_eq!(
            infer_canonical_from_legacy(Some([0.0, 0.0]), Some([-10.0, -20.0, 0.0])),
            CanonicalPositioning::focus(10.0, 20.0)
        );
        assert_eq!(
            infer_canonical_from_legacy(Some([3.0, 4.0]), Some([0.0, 0.0, 0.0])),
            CanonicalPositioning::focus(3.0, 4.0)
        );
        assert_eq!(
            infer_canonical_from_legacy(Some([3.0, 4.0]), Some([-10.0, -20.0, 7.0])),
            CanonicalPositioning::focus(3.0, 4.0).with_gamma(7.0)
        );
        assert_eq!(
            infer_canonical_from_legacy(None, None),
            CanonicalPositioning::focus(0.0, 0.0)
        );
    }

    #[test]
    fn test_resolve_prefers_native_knob() {
        let parameters = ProjectionParameters {
            center: Some([2.0, 46.0]),
            rotate: Some([-10.0, 0.0, 0.0]),
            ..Default::default()
        };
        assert_eq!(
            resolve(ProjectionFamily::Cylindrical, &parameters),
            CanonicalPositioning::focus(2.0, 46.0)
        );
        assert_eq!(
            resolve(ProjectionFamily::Conic, &parameters),
            CanonicalPositioning::focus(10.0, 0.0)
        );
    }

    #[test]
    fn test_normalize_moves_focus_to_native_knob() {
        let parameters = ProjectionParameters {
            center: Some([-61.0, 16.0]),
            scale_multiplier: Some(1.2),
            ..Default::default()
        };
        let normalized = normalize_parameters(ProjectionFamily::Azimuthal, &parameters);
        assert_eq!(normalized.rotate, Some([61.0, -16.0, 0.0]));
        assert_eq!(normalized.center, Some([0.0, 0.0]));
        assert_eq!(normalized.scale_multiplier, Some(1.2));
    }

    #[test]
    fn test_apply_aims_projection_at_focus() {
        let mut projection = StandardProjection::new(RawProjection::AzimuthalEqualArea);
        projection.set_translate([50.0, 50.0]);
        apply_positioning(
            &mut projection,
            ProjectionFamily::Azimuthal,
            &CanonicalPositioning::focus(-61.5, 16.2),
        );
        let p = projection.project([-61.5, 16.2]).unwrap();
        assert!((p[0] - 50.0).abs() < 1e-6 && (p[1] - 50.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_center_round_trip(lon in -180.0f64..180.0, lat in -90.0f64..90.0) {
            let back = canonical_to_center(&center_to_canonical([lon, lat]));
            prop_assert_eq!(back, [lon, lat]);
        }

        #[test]
        fn prop_rotate_round_trip(
            lon in -180.0f64..180.0,
            lat in -90.0f64..90.0,
            gamma in -180.0f64..180.0,
        ) {
            let canonical = CanonicalPositioning::focus(lon, lat).with_gamma(gamma);
            prop_assert_eq!(rotate_to_canonical(canonical_to_rotate(&canonical)), canonical);
        }

        #[test]
        fn prop_normalized_longitude_in_range(lon in -10_000.0f64..10_000.0) {
            let n = normalize_longitude(lon);
            prop_assert!((-180.0..=180.0).contains(&n));
        }
    }
}
