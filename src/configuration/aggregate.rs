// Copyright 2025 Cowboy AI, LLC.

//! The composite configuration aggregate

use super::territory::{TerritoryProjectionConfig, TerritoryUpdate};
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::geometry::CanvasDimensions;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Every territory of one atlas, with the settings they share
///
/// Territories keep their insertion order, which is also the order used to
/// break ties when routing. Once a territory has been added the
/// configuration never drops back to zero territories.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeConfiguration {
    atlas_id: String,
    atlas_name: String,
    reference_scale: f64,
    canvas_dimensions: CanvasDimensions,
    territories: IndexMap<String, TerritoryProjectionConfig>,
}

/// Serialized form
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigurationRecord {
    atlas_id: String,
    #[serde(default)]
    atlas_name: String,
    reference_scale: f64,
    canvas_dimensions: CanvasDimensions,
    #[serde(default)]
    territories: Vec<TerritoryProjectionConfig>,
}

fn check_reference_scale(scale: f64) -> ConfigurationResult<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidReferenceScale(scale))
    }
}

fn check_canvas(dimensions: CanvasDimensions) -> ConfigurationResult<()> {
    if dimensions.is_valid() {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidCanvasDimensions {
            width: dimensions.width,
            height: dimensions.height,
        })
    }
}

impl CompositeConfiguration {
    /// Create an empty configuration
    pub fn new(
        atlas_id: impl Into<String>,
        atlas_name: impl Into<String>,
        reference_scale: f64,
        canvas_dimensions: CanvasDimensions,
    ) -> ConfigurationResult<Self> {
        let atlas_id = atlas_id.into();
        if atlas_id.trim().is_empty() {
            return Err(ConfigurationError::EmptyAtlasId);
        }
        check_reference_scale(reference_scale)?;
        check_canvas(canvas_dimensions)?;

        Ok(Self {
            atlas_id,
            atlas_name: atlas_name.into(),
            reference_scale,
            canvas_dimensions,
            territories: IndexMap::new(),
        })
    }

    /// Atlas identifier
    pub fn atlas_id(&self) -> &str {
        &self.atlas_id
    }

    /// Atlas display name
    pub fn atlas_name(&self) -> &str {
        &self.atlas_name
    }

    /// Scale every multiplier applies to
    pub fn reference_scale(&self) -> f64 {
        self.reference_scale
    }

    /// Canvas size
    pub fn canvas_dimensions(&self) -> CanvasDimensions {
        self.canvas_dimensions
    }

    /// Add a territory; its code must be new
    pub fn add_territory(&mut self, territory: TerritoryProjectionConfig) -> ConfigurationResult<()> {
        territory.validate()?;
        if self.territories.contains_key(&territory.code) {
            return Err(ConfigurationError::DuplicateTerritory(territory.code));
        }
        debug!(territory = %territory.code, projection_id = %territory.projection_id, "territory added");
        self.territories.insert(territory.code.clone(), territory);
        Ok(())
    }

    /// Copy of one territory
    pub fn get_territory(&self, code: &str) -> Option<TerritoryProjectionConfig> {
        self.territories.get(code).cloned()
    }

    /// Whether `code` is configured
    pub fn has_territory(&self, code: &str) -> bool {
        self.territories.contains_key(code)
    }

    /// Number of territories
    pub fn territory_count(&self) -> usize {
        self.territories.len()
    }

    /// Merge `update` into a territory
    pub fn update_territory(&mut self, code: &str, update: &TerritoryUpdate) -> ConfigurationResult<()> {
        let current = self
            .territories
            .get(code)
            .ok_or_else(|| ConfigurationError::TerritoryNotFound(code.to_string()))?;
        let merged = update.apply_to(current);
        merged.validate()?;
        if let Some(slot) = self.territories.get_mut(code) {
            *slot = merged;
        }
        Ok(())
    }

    /// Remove a territory; `Ok(false)` when it was not there
    pub fn remove_territory(&mut self, code: &str) -> ConfigurationResult<bool> {
        if !self.territories.contains_key(code) {
            return Ok(false);
        }
        if self.territories.len() == 1 {
            return Err(ConfigurationError::LastTerritory(code.to_string()));
        }
        self.territories.shift_remove(code);
        debug!(territory = %code, "territory removed");
        Ok(true)
    }

    /// Copies of all territories in declaration order
    pub fn get_all_territories(&self) -> Vec<TerritoryProjectionConfig> {
        self.territories.values().cloned().collect()
    }

    /// Codes in declaration order
    pub fn get_territory_codes(&self) -> Vec<String> {
        self.territories.keys().cloned().collect()
    }

    /// Territories with the primary role
    pub fn get_primary_territories(&self) -> Vec<TerritoryProjectionConfig> {
        self.territories
            .values()
            .filter(|t| t.role.is_primary())
            .cloned()
            .collect()
    }

    /// Territories with any other role
    pub fn get_secondary_territories(&self) -> Vec<TerritoryProjectionConfig> {
        self.territories
            .values()
            .filter(|t| !t.role.is_primary())
            .cloned()
            .collect()
    }

    /// Change the reference scale
    pub fn set_reference_scale(&mut self, scale: f64) -> ConfigurationResult<()> {
        check_reference_scale(scale)?;
        self.reference_scale = scale;
        Ok(())
    }

    /// Change the canvas size
    pub fn set_canvas_dimensions(&mut self, dimensions: CanvasDimensions) -> ConfigurationResult<()> {
        check_canvas(dimensions)?;
        self.canvas_dimensions = dimensions;
        Ok(())
    }

    /// Change the display name
    pub fn set_atlas_name(&mut self, name: impl Into<String>) {
        self.atlas_name = name.into();
    }

    /// JSON form, territories as an array in declaration order
    pub fn to_json(&self) -> ConfigurationResult<serde_json::Value> {
        let record = ConfigurationRecord {
            atlas_id: self.atlas_id.clone(),
            atlas_name: self.atlas_name.clone(),
            reference_scale: self.reference_scale,
            canvas_dimensions: self.canvas_dimensions,
            territories: self.get_all_territories(),
        };
        Ok(serde_json::to_value(record)?)
    }

    /// Rebuild from [`CompositeConfiguration::to_json`] output, checking every invariant
    pub fn from_json(value: &serde_json::Value) -> ConfigurationResult<Self> {
        let record: ConfigurationRecord = serde_json::from_value(value.clone())?;
        let mut configuration = Self::new(
            record.atlas_id,
            record.atlas_name,
            record.reference_scale,
            record.canvas_dimensions,
        )?;
        for territory in record.territories {
            configuration.add_territory(territory)?;
        }
        Ok(configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::TerritoryRole;
    use crate::family::ProjectionFamily;

    fn territory(code: &str, role: TerritoryRole) -> TerritoryProjectionConfig {
        TerritoryProjectionConfig::new(code, code, role, "mercator", ProjectionFamily::Cylindrical)
    }

    fn configuration() -> CompositeConfiguration {
        CompositeConfiguration::new("france", "France", 2700.0, CanvasDimensions::new(960.0, 500.0))
            .unwrap()
    }

    #[test]
    fn test_new_rejects_bad_inputs() {
        let canvas = CanvasDimensions::new(960.0, 500.0);
        assert_eq!(
            CompositeConfiguration::new(" ", "x", 1.0, canvas),
            Err(ConfigurationError::EmptyAtlasId)
        );
        assert!(matches!(
            CompositeConfiguration::new("a", "x", f64::NAN, canvas),
            Err(ConfigurationError::InvalidReferenceScale(_))
        ));
        assert!(CompositeConfiguration::new("a", "x", 0.0, canvas).is_err());
        assert!(
            CompositeConfiguration::new("a", "x", 1.0, CanvasDimensions::new(0.0, 1.0)).is_err()
        );
    }

    #[test]
    fn test_duplicate_is_rejected_without_change() {
        let mut config = configuration();
        config.add_territory(territory("FR-MET", TerritoryRole::Primary)).unwrap();

        let mut replacement = territory("FR-MET", TerritoryRole::Secondary);
        replacement.name = "Other".into();
        assert_eq!(
            config.add_territory(replacement),
            Err(ConfigurationError::DuplicateTerritory("FR-MET".into()))
        );
        assert_eq!(config.get_territory("FR-MET").unwrap().role, TerritoryRole::Primary);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut config = configuration();
        for code in ["A", "B", "C"] {
            config.add_territory(territory(code, TerritoryRole::Member)).unwrap();
        }
        assert_eq!(config.remove_territory("B"), Ok(true));
        assert_eq!(config.get_territory_codes(), vec!["A", "C"]);
        assert_eq!(config.remove_territory("missing"), Ok(false));
    }

    #[test]
    fn test_update_unknown_territory() {
        let mut config = configuration();
        let result = config.update_territory("nope", &TerritoryUpdate::default());
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_is_atomic() {
        let mut config = configuration();
        config.add_territory(territory("FR-MET", TerritoryRole::Primary)).unwrap();
        let before = config.clone();

        let update = TerritoryUpdate {
            name: Some("Renamed".into()),
            projection_id: Some("".into()),
            ..Default::default()
        };
        assert!(config.update_territory("FR-MET", &update).is_err());
        assert_eq!(config, before);
    }

    #[test]
    fn test_role_filters() {
        let mut config = configuration();
        config.add_territory(territory("FR-MET", TerritoryRole::Primary)).unwrap();
        config.add_territory(territory("FR-GP", TerritoryRole::Secondary)).unwrap();
        config.add_territory(territory("FR-RE", TerritoryRole::Member)).unwrap();

        assert_eq!(config.get_primary_territories().len(), 1);
        assert_eq!(config.get_secondary_territories().len(), 2);
    }
}
