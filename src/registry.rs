// Copyright 2025 Cowboy AI, LLC.

//! Projection registry
//!
//! Maps projection ids to a family and a constructor. A registry is assembled
//! once through [`ProjectionRegistryBuilder`] and is immutable afterwards;
//! [`ProjectionRegistryBuilder::register`] is the single extension point for
//! custom projections.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::family::ProjectionFamily;
use crate::projection::{Projection, RawProjection, StandardProjection};

/// Factory producing a fresh projection instance
pub type ProjectionConstructor = Arc<dyn Fn() -> Box<dyn Projection> + Send + Sync>;

/// One registered projection
#[derive(Clone)]
pub struct ProjectionDefinition {
    /// Registry key, e.g. `"conic-conformal"`
    pub id: String,
    /// Human readable name
    pub name: String,
    /// Family the projection belongs to
    pub family: ProjectionFamily,
    constructor: ProjectionConstructor,
}

impl ProjectionDefinition {
    /// Create a definition
    pub fn new<F>(
        id: impl Into<String>,
        name: impl Into<String>,
        family: ProjectionFamily,
        constructor: F,
    ) -> Self
    where
        F: Fn() -> Box<dyn Projection> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            family,
            constructor: Arc::new(constructor),
        }
    }

    /// Build a fresh instance
    pub fn instantiate(&self) -> Box<dyn Projection> {
        (self.constructor)()
    }
}

impl fmt::Debug for ProjectionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("family", &self.family)
            .finish()
    }
}

/// Static description of a built-in projection
#[derive(Debug, Clone, Copy)]
struct Registration {
    id: &'static str,
    name: &'static str,
    family: ProjectionFamily,
    kind: RawProjection,
    parallels: Option<[f64; 2]>,
}

const BUILTIN_PROJECTIONS: &[Registration] = &[
    Registration {
        id: "mercator",
        name: "Mercator",
        family: ProjectionFamily::Cylindrical,
        kind: RawProjection::Mercator,
        parallels: None,
    },
    Registration {
        id: "equirectangular",
        name: "Equirectangular",
        family: ProjectionFamily::Cylindrical,
        kind: RawProjection::Equirectangular,
        parallels: None,
    },
    Registration {
        id: "conic-conformal",
        name: "Conic Conformal",
        family: ProjectionFamily::Conic,
        kind: RawProjection::ConicConformal,
        parallels: None,
    },
    Registration {
        id: "conic-equal-area",
        name: "Conic Equal Area",
        family: ProjectionFamily::Conic,
        kind: RawProjection::ConicEqualArea,
        parallels: None,
    },
    Registration {
        id: "albers",
        name: "Albers",
        family: ProjectionFamily::Conic,
        kind: RawProjection::ConicEqualArea,
        parallels: Some([29.5, 45.5]),
    },
    Registration {
        id: "conic-equidistant",
        name: "Conic Equidistant",
        family: ProjectionFamily::Conic,
        kind: RawProjection::ConicEquidistant,
        parallels: None,
    },
    Registration {
        id: "azimuthal-equal-area",
        name: "Azimuthal Equal Area",
        family: ProjectionFamily::Azimuthal,
        kind: RawProjection::AzimuthalEqualArea,
        parallels: None,
    },
    Registration {
        id: "azimuthal-equidistant",
        name: "Azimuthal Equidistant",
        family: ProjectionFamily::Azimuthal,
        kind: RawProjection::AzimuthalEquidistant,
        parallels: None,
    },
    Registration {
        id: "orthographic",
        name: "Orthographic",
        family: ProjectionFamily::Azimuthal,
        kind: RawProjection::Orthographic,
        parallels: None,
    },
    Registration {
        id: "stereographic",
        name: "Stereographic",
        family: ProjectionFamily::Azimuthal,
        kind: RawProjection::Stereographic,
        parallels: None,
    },
    Registration {
        id: "natural-earth",
        name: "Natural Earth",
        family: ProjectionFamily::Pseudocylindrical,
        kind: RawProjection::NaturalEarth,
        parallels: None,
    },
    Registration {
        id: "equal-earth",
        name: "Equal Earth",
        family: ProjectionFamily::Pseudocylindrical,
        kind: RawProjection::EqualEarth,
        parallels: None,
    },
];

impl Registration {
    fn definition(self) -> ProjectionDefinition {
        let kind = self.kind;
        let parallels = self.parallels;
        ProjectionDefinition::new(self.id, self.name, self.family, move || {
            let projection = StandardProjection::new(kind);
            let projection = match parallels {
                Some(p) => projection.with_parallels(p),
                None => projection,
            };
            Box::new(projection) as Box<dyn Projection>
        })
    }
}

/// Projection instantiated for a requested id
#[derive(Debug)]
pub struct ResolvedProjection {
    /// Id actually instantiated
    pub id: String,
    /// Family of the instantiated projection
    pub family: ProjectionFamily,
    /// The instance
    pub projection: Box<dyn Projection>,
    /// Whether a default replaced an unknown id
    pub substituted: bool,
}

/// Immutable id → projection lookup
#[derive(Debug, Clone)]
pub struct ProjectionRegistry {
    definitions: IndexMap<String, ProjectionDefinition>,
}

impl Default for ProjectionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ProjectionRegistry {
    /// Start assembling a registry
    pub fn builder() -> ProjectionRegistryBuilder {
        ProjectionRegistryBuilder::new()
    }

    /// Registry holding the built-in projections only
    pub fn standard() -> Self {
        ProjectionRegistryBuilder::new()
            .with_standard_projections()
            .build()
    }

    /// Look up a definition
    pub fn get(&self, id: &str) -> Option<&ProjectionDefinition> {
        self.definitions.get(id)
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    /// Family of a registered id
    pub fn family_of(&self, id: &str) -> Option<ProjectionFamily> {
        self.definitions.get(id).map(|d| d.family)
    }

    /// Registered ids, in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Definitions belonging to `family`
    pub fn by_family(&self, family: ProjectionFamily) -> Vec<&ProjectionDefinition> {
        self.definitions
            .values()
            .filter(|d| d.family == family)
            .collect()
    }

    /// Number of registered projections
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Preferred stand-in id for a family
    pub fn default_id_for(family: ProjectionFamily) -> &'static str {
        match family {
            ProjectionFamily::Cylindrical => "mercator",
            ProjectionFamily::Conic => "conic-conformal",
            ProjectionFamily::Azimuthal => "azimuthal-equal-area",
            ProjectionFamily::Pseudocylindrical => "natural-earth",
            ProjectionFamily::Polyhedral
            | ProjectionFamily::Composite
            | ProjectionFamily::Other => "equirectangular",
        }
    }

    /// Instantiate a registered id
    pub fn create(&self, id: &str) -> Option<Box<dyn Projection>> {
        self.get(id).map(ProjectionDefinition::instantiate)
    }

    /// Instantiate `id`, substituting a family-appropriate default if unknown
    pub fn resolve(&self, id: &str, family_hint: ProjectionFamily) -> ResolvedProjection {
        if let Some(definition) = self.get(id) {
            return ResolvedProjection {
                id: definition.id.clone(),
                family: definition.family,
                projection: definition.instantiate(),
                substituted: false,
            };
        }

        let fallback = self
            .get(Self::default_id_for(family_hint))
            .or_else(|| self.by_family(family_hint).into_iter().next())
            .or_else(|| self.definitions.values().next());

        match fallback {
            Some(definition) => {
                warn!(
                    projection_id = %id,
                    fallback = %definition.id,
                    family = %family_hint,
                    "Unknown projection id, using family default"
                );
                ResolvedProjection {
                    id: definition.id.clone(),
                    family: definition.family,
                    projection: definition.instantiate(),
                    substituted: true,
                }
            }
            None => {
                warn!(
                    projection_id = %id,
                    "Unknown projection id and empty registry, using equirectangular"
                );
                ResolvedProjection {
                    id: "equirectangular".to_string(),
                    family: ProjectionFamily::Cylindrical,
                    projection: Box::new(StandardProjection::new(RawProjection::Equirectangular)),
                    substituted: true,
                }
            }
        }
    }
}

/// Assembles a [`ProjectionRegistry`]
#[derive(Debug, Default)]
pub struct ProjectionRegistryBuilder {
    definitions: IndexMap<String, ProjectionDefinition>,
}

impl ProjectionRegistryBuilder {
    /// Empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every built-in projection
    pub fn with_standard_projections(mut self) -> Self {
        for registration in BUILTIN_PROJECTIONS {
            let definition = registration.definition();
            self.definitions.insert(definition.id.clone(), definition);
        }
        self
    }

    /// Register a projection; an existing id is replaced
    pub fn register(mut self, definition: ProjectionDefinition) -> Self {
        if self.definitions.contains_key(&definition.id) {
            debug!(projection_id = %definition.id, "Replacing registered projection");
        }
        self.definitions.insert(definition.id.clone(), definition);
        self
    }

    /// Freeze into a registry
    pub fn build(self) -> ProjectionRegistry {
        ProjectionRegistry {
            definitions: self.definitions,
        }
    }
}
