// Copyright 2025 Cowboy AI, LLC.

//! Composite projections
//!
//! [`CompositeProjectionBuilder`] keeps a live sub-projection per territory
//! and applies edits to them one at a time. [`CompositeProjectionBuilder::build`]
//! snapshots them into a [`CompositeProjection`], which routes every point,
//! line and ring to the territory owning it.

mod builder;
mod instance;
mod projection;
mod router;

pub use builder::CompositeProjectionBuilder;
pub use instance::SubProjectionInstance;
pub use projection::CompositeProjection;
pub use router::{RouterStream, TerritoryRouter};
