// Copyright 2025 Cowboy AI, LLC.

//! Per-territory projection configuration

use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::family::ProjectionFamily;
use crate::geometry::{GeoBounds, PixelExtent};
use crate::parameters::ProjectionParameters;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Part a territory plays in the composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TerritoryRole {
    /// Mainland; catches geometry no other territory claims
    Primary,
    /// Remote territory placed in an inset
    Secondary,
    /// Peer in an equal-members composition
    Member,
}

impl TerritoryRole {
    /// Whether this is the primary role
    pub fn is_primary(self) -> bool {
        matches!(self, TerritoryRole::Primary)
    }
}

impl fmt::Display for TerritoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TerritoryRole::Primary => "primary",
            TerritoryRole::Secondary => "secondary",
            TerritoryRole::Member => "member",
        })
    }
}

/// Projection settings for one territory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryProjectionConfig {
    /// Unique key, never changes once added
    pub code: String,
    /// Display name
    pub name: String,
    /// Role in the composition
    pub role: TerritoryRole,
    /// Registry id of the projection
    pub projection_id: String,
    /// Family of that projection
    pub family: ProjectionFamily,
    /// Family-dependent parameters
    #[serde(default)]
    pub parameters: ProjectionParameters,
    /// Pixel offset from the canvas center
    #[serde(default)]
    pub translate_offset: [f64; 2],
    /// Inset rectangle relative to the territory's placement
    #[serde(default)]
    pub pixel_clip_extent: Option<PixelExtent>,
    /// Geographic extent the territory owns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<GeoBounds>,
}

impl TerritoryProjectionConfig {
    /// Territory with no parameters, no offset, no inset and no bounds
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        role: TerritoryRole,
        projection_id: impl Into<String>,
        family: ProjectionFamily,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            role,
            projection_id: projection_id.into(),
            family,
            parameters: ProjectionParameters::default(),
            translate_offset: [0.0, 0.0],
            pixel_clip_extent: None,
            bounds: None,
        }
    }

    /// Set the parameters
    pub fn with_parameters(mut self, parameters: ProjectionParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the pixel offset from the canvas center
    pub fn with_translate_offset(mut self, offset: [f64; 2]) -> Self {
        self.translate_offset = offset;
        self
    }

    /// Set the inset rectangle
    pub fn with_pixel_clip_extent(mut self, extent: PixelExtent) -> Self {
        self.pixel_clip_extent = Some(extent);
        self
    }

    /// Set the owned geographic extent
    pub fn with_bounds(mut self, bounds: GeoBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Scale multiplier, 1 when unset
    pub fn scale_multiplier(&self) -> f64 {
        self.parameters.scale_multiplier.unwrap_or(1.0)
    }

    /// Check the territory-level invariants
    pub fn validate(&self) -> ConfigurationResult<()> {
        if self.code.trim().is_empty() {
            return Err(ConfigurationError::EmptyTerritoryCode);
        }
        if self.projection_id.trim().is_empty() {
            return Err(ConfigurationError::EmptyProjectionId {
                code: self.code.clone(),
            });
        }
        if let Some(value) = self.parameters.scale_multiplier {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigurationError::InvalidScaleMultiplier {
                    code: self.code.clone(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Partial edit of a territory; the code cannot be changed
///
/// `None` leaves a field as is. The nested options on the inset and bounds
/// allow clearing them with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerritoryUpdate {
    /// New display name
    pub name: Option<String>,
    /// New role
    pub role: Option<TerritoryRole>,
    /// New projection id
    pub projection_id: Option<String>,
    /// New family
    pub family: Option<ProjectionFamily>,
    /// Replacement parameter set
    pub parameters: Option<ProjectionParameters>,
    /// New offset
    pub translate_offset: Option<[f64; 2]>,
    /// New inset, or `Some(None)` to clear it
    pub pixel_clip_extent: Option<Option<PixelExtent>>,
    /// New bounds, or `Some(None)` to clear them
    pub bounds: Option<Option<GeoBounds>>,
}

impl TerritoryUpdate {
    /// Merged copy of `current`
    pub fn apply_to(&self, current: &TerritoryProjectionConfig) -> TerritoryProjectionConfig {
        TerritoryProjectionConfig {
            code: current.code.clone(),
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            role: self.role.unwrap_or(current.role),
            projection_id: self
                .projection_id
                .clone()
                .unwrap_or_else(|| current.projection_id.clone()),
            family: self.family.unwrap_or(current.family),
            parameters: self
                .parameters
                .clone()
                .unwrap_or_else(|| current.parameters.clone()),
            translate_offset: self.translate_offset.unwrap_or(current.translate_offset),
            pixel_clip_extent: self.pixel_clip_extent.unwrap_or(current.pixel_clip_extent),
            bounds: self.bounds.unwrap_or(current.bounds),
        }
    }
}
