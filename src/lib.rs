// Copyright 2025 Cowboy AI, LLC.

//! # Composite Projection
//!
//! Composite map projections: several territories, each drawn by its own
//! cartographic projection, laid out on one canvas and exposed as a single
//! projection.
//!
//! The crate is organised around a few building blocks:
//! - **Configuration**: [`CompositeConfiguration`], the validated aggregate of
//!   territories, reference scale and canvas
//! - **Families**: [`ProjectionFamily`] decides how a projection is positioned
//!   and which parameters it accepts
//! - **Positioning**: canonical focus points converted to each family's native
//!   `center` or `rotate`
//! - **Constraints**: [`ParameterConstraintsEngine`], per-family parameter
//!   rules
//! - **Building**: [`CompositeProjectionBuilder`] instantiates sub-projections
//!   from a [`ProjectionRegistry`] and produces a [`CompositeProjection`]
//! - **Interchange**: versioned JSON documents written and read by
//!   [`ConfigurationSerializer`]
//!
//! ## Design Principles
//!
//! 1. **Validated state**: every mutator checks its input before changing
//!    anything, so a configuration is never observed half-updated
//! 2. **Relative scale**: territories carry a multiplier of the shared
//!    reference scale, never an absolute scale
//! 3. **Declared order**: territories keep insertion order, which is also the
//!    routing tie-break order
//! 4. **No globals**: registries, caches and settings are plain values owned by
//!    the caller

#![warn(missing_docs)]

mod cache;
mod composite;
mod configuration;
mod constraints;
mod errors;
mod family;
mod geometry;
mod parameters;
mod registry;
mod settings;

pub mod interchange;
pub mod positioning;
pub mod projection;

pub use cache::EngineCache;
pub use composite::{
    CompositeProjection, CompositeProjectionBuilder, RouterStream, SubProjectionInstance,
    TerritoryRouter,
};
pub use configuration::{
    CompositeConfiguration, TerritoryProjectionConfig, TerritoryRole, TerritoryUpdate,
};
pub use constraints::{
    CustomValidator, ParameterConstraint, ParameterConstraintsEngine, ParameterIssue,
    ParameterSetValidation, ParameterValidation,
};
pub use errors::{ConfigurationError, ConfigurationResult, ImportError};
pub use family::{InterchangeFamily, PositioningMode, ProjectionFamily};
pub use geometry::{
    extent_contains, stream_geometry, CanvasDimensions, GeoBounds, Geometry, PixelExtent, Position,
};
pub use interchange::{
    document_schema, CompositionPattern, ConfigurationSerializer, DocumentValidator, ExportOptions,
    ExportedConfiguration, ImportOutcome, IssueCode, ValidationIssue, ValidationReport,
};
pub use parameters::{
    LayeredParameterProvider, ParameterChain, ParameterKey, ParameterLayer, ParameterProvider,
    ParameterValue, ProjectionParameters,
};
pub use positioning::{CanonicalPositioning, NativePositioning};
pub use projection::{GeoStream, Projection, RecordingStream, StreamEvent};
pub use registry::{
    ProjectionConstructor, ProjectionDefinition, ProjectionRegistry, ProjectionRegistryBuilder,
    ResolvedProjection,
};
pub use settings::{EngineSettings, FORMAT_VERSION, MIN_SUPPORTED_MAJOR};
