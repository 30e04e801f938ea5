// Copyright 2025 Cowboy AI, LLC.

//! Shape of the interchange document

use crate::configuration::{CompositeConfiguration, TerritoryRole};
use crate::family::InterchangeFamily;
use crate::geometry::CanvasDimensions;
use crate::parameters::ProjectionParameters;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the territories of an atlas relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CompositionPattern {
    /// One mainland with insets around it
    SingleFocus,
    /// Peers of equal standing
    EqualMembers,
    /// Anything else
    Hierarchical,
}

impl CompositionPattern {
    /// Accepted document names
    pub const NAMES: [&'static str; 3] = ["single-focus", "equal-members", "hierarchical"];

    /// Document name
    pub fn as_str(self) -> &'static str {
        match self {
            CompositionPattern::SingleFocus => "single-focus",
            CompositionPattern::EqualMembers => "equal-members",
            CompositionPattern::Hierarchical => "hierarchical",
        }
    }

    /// Pattern implied by the roles of a configuration
    ///
    /// Exactly one primary with everything else secondary or member is a
    /// single focus; only members is equal members.
    pub fn infer(configuration: &CompositeConfiguration) -> Self {
        let roles: Vec<TerritoryRole> = configuration
            .get_all_territories()
            .iter()
            .map(|t| t.role)
            .collect();
        let primaries = roles.iter().filter(|r| r.is_primary()).count();

        if primaries == 1 {
            CompositionPattern::SingleFocus
        } else if !roles.is_empty() && roles.iter().all(|r| *r == TerritoryRole::Member) {
            CompositionPattern::EqualMembers
        } else {
            CompositionPattern::Hierarchical
        }
    }
}

impl fmt::Display for CompositionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portable snapshot of a composite configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportedConfiguration {
    /// Format version, `major.minor`
    pub version: String,
    /// Who and what
    pub metadata: ExportMetadata,
    /// Composition pattern
    pub pattern: CompositionPattern,
    /// Shared reference scale
    pub reference_scale: f64,
    /// Canvas the layout was made for
    pub canvas_dimensions: CanvasDimensions,
    /// Territories in declaration order
    pub territories: Vec<ExportedTerritory>,
}

/// Document metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    /// Atlas identifier
    pub atlas_id: String,
    /// Atlas display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atlas_name: Option<String>,
    /// When the document was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
    /// Tool and version that wrote the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_with: Option<String>,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One territory of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportedTerritory {
    /// Territory code
    pub code: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Role in the composition
    pub role: TerritoryRole,
    /// Projection and its parameters
    pub projection: ExportedProjection,
    /// Pixel placement
    pub layout: ExportedLayout,
    /// `[[minLon, minLat], [maxLon, maxLat]]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[[f64; 2]; 2]>,
}

/// Projection of an exported territory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportedProjection {
    /// Registry id
    pub id: String,
    /// Family in document vocabulary
    pub family: InterchangeFamily,
    /// Parameters; carries a scale multiplier, never an absolute scale
    #[serde(default)]
    pub parameters: ProjectionParameters,
}

/// Pixel placement of an exported territory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportedLayout {
    /// Offset from the canvas center
    pub translate_offset: [f64; 2],
    /// Inset rectangle `[x1, y1, x2, y2]`, `null` when there is none
    pub pixel_clip_extent: Option<[f64; 4]>,
}
