// Copyright 2025 Cowboy AI, LLC.

//! Composite configuration: the territories of one atlas and what they share

mod aggregate;
mod territory;

pub use aggregate::CompositeConfiguration;
pub use territory::{TerritoryProjectionConfig, TerritoryRole, TerritoryUpdate};
