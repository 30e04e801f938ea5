// Copyright 2025 Cowboy AI, LLC.

//! Projection families
//!
//! A family groups projections whose parameters behave the same way. Every
//! place that needs family-specific behavior matches on [`ProjectionFamily`]
//! exhaustively, so adding a family is checked at each call site.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Family of a projection
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionFamily {
    /// Cylindrical projections (Mercator, equirectangular)
    Cylindrical,
    /// Conic projections, configured with two standard parallels
    Conic,
    /// Azimuthal projections (orthographic, stereographic, ...)
    Azimuthal,
    /// Pseudocylindrical projections (Natural Earth, Equal Earth)
    Pseudocylindrical,
    /// Polyhedral projections
    Polyhedral,
    /// Projections that are themselves composites
    Composite,
    /// Anything not classified above
    Other,
}

/// How a family expresses the point it is focused on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositioningMode {
    /// Focus is a `center` point; rotation stays at `[0, 0, 0]`
    Center,
    /// Focus is a `rotate` triple; center stays at `[0, 0]`
    Rotate,
    /// The projection positions its own parts; neither is applied
    Fixed,
}

impl ProjectionFamily {
    /// All families, in declaration order
    pub const ALL: [ProjectionFamily; 7] = [
        ProjectionFamily::Cylindrical,
        ProjectionFamily::Conic,
        ProjectionFamily::Azimuthal,
        ProjectionFamily::Pseudocylindrical,
        ProjectionFamily::Polyhedral,
        ProjectionFamily::Composite,
        ProjectionFamily::Other,
    ];

    /// Which native parameter is authoritative for this family
    pub fn positioning_mode(self) -> PositioningMode {
        match self {
            ProjectionFamily::Cylindrical | ProjectionFamily::Pseudocylindrical => {
                PositioningMode::Center
            }
            ProjectionFamily::Conic
            | ProjectionFamily::Azimuthal
            | ProjectionFamily::Polyhedral
            | ProjectionFamily::Other => PositioningMode::Rotate,
            ProjectionFamily::Composite => PositioningMode::Fixed,
        }
    }

    /// Upper-case name as used in documents
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectionFamily::Cylindrical => "CYLINDRICAL",
            ProjectionFamily::Conic => "CONIC",
            ProjectionFamily::Azimuthal => "AZIMUTHAL",
            ProjectionFamily::Pseudocylindrical => "PSEUDOCYLINDRICAL",
            ProjectionFamily::Polyhedral => "POLYHEDRAL",
            ProjectionFamily::Composite => "COMPOSITE",
            ProjectionFamily::Other => "OTHER",
        }
    }
}

impl fmt::Display for ProjectionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family vocabulary of the interchange document
///
/// The document format predates the in-memory family list and uses a
/// slightly different set of names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterchangeFamily {
    /// Cylindrical
    Cylindrical,
    /// Conic
    Conic,
    /// Azimuthal
    Azimuthal,
    /// Pseudocylindrical
    Pseudocylindrical,
    /// Polyconic
    Polyconic,
    /// Everything else
    Miscellaneous,
}

impl InterchangeFamily {
    /// Accepted document names
    pub const NAMES: [&'static str; 6] = [
        "CYLINDRICAL",
        "CONIC",
        "AZIMUTHAL",
        "PSEUDOCYLINDRICAL",
        "POLYCONIC",
        "MISCELLANEOUS",
    ];
}

impl From<ProjectionFamily> for InterchangeFamily {
    fn from(family: ProjectionFamily) -> Self {
        match family {
            ProjectionFamily::Cylindrical => InterchangeFamily::Cylindrical,
            ProjectionFamily::Conic => InterchangeFamily::Conic,
            ProjectionFamily::Azimuthal => InterchangeFamily::Azimuthal,
            ProjectionFamily::Pseudocylindrical => InterchangeFamily::Pseudocylindrical,
            ProjectionFamily::Polyhedral
            | ProjectionFamily::Composite
            | ProjectionFamily::Other => InterchangeFamily::Miscellaneous,
        }
    }
}

impl From<InterchangeFamily> for ProjectionFamily {
    fn from(family: InterchangeFamily) -> Self {
        match family {
            InterchangeFamily::Cylindrical => ProjectionFamily::Cylindrical,
            InterchangeFamily::Conic => ProjectionFamily::Conic,
            InterchangeFamily::Azimuthal => ProjectionFamily::Azimuthal,
            InterchangeFamily::Pseudocylindrical => ProjectionFamily::Pseudocylindrical,
            InterchangeFamily::Polyconic | InterchangeFamily::Miscellaneous => {
                ProjectionFamily::Other
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positioning_modes() {
        assert_eq!(
            ProjectionFamily::Cylindrical.positioning_mode(),
            PositioningMode::Center
        );
        assert_eq!(
            ProjectionFamily::Pseudocylindrical.positioning_mode(),
            PositioningMode::Center
        );
        assert_eq!(ProjectionFamily::Conic.positioning_mode(), PositioningMode::Rotate);
        assert_eq!(ProjectionFamily::Azimuthal.positioning_mode(), PositioningMode::Rotate);
        assert_eq!(ProjectionFamily::Other.positioning_mode(), PositioningMode::Rotate);
        assert_eq!(ProjectionFamily::Composite.positioning_mode(), PositioningMode::Fixed);
    }

    #[test]
    fn test_serde_names() {
        for family in ProjectionFamily::ALL {
            let json = serde_json::to_string(&family).unwrap();
            assert_eq!(json, format!("\"{}\"", family.as_str()));
            let back: ProjectionFamily = serde_json::from_str(&json).unwrap();
            assert_eq!(back, family);
        }
    }

    #[test]
    fn test_interchange_mapping() {
        assert_eq!(
            InterchangeFamily::from(ProjectionFamily::Polyhedral),
            InterchangeFamily::Miscellaneous
        );
        assert_eq!(
            ProjectionFamily::from(InterchangeFamily::Polyconic),
            ProjectionFamily::Other
        );
        assert_eq!(
            ProjectionFamily::from(InterchangeFamily::from(ProjectionFamily::Conic)),
            ProjectionFamily::Conic
        );
    }
}
