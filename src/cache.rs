// Copyright 2025 Cowboy AI, LLC.

//! Builders kept per atlas

use crate::composite::CompositeProjectionBuilder;
use crate::configuration::CompositeConfiguration;
use crate::registry::ProjectionRegistry;
use crate::settings::EngineSettings;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info};

/// Least-recently-used cache of builders keyed by atlas id
///
/// Every builder created here shares the cache's registry and settings.
#[derive(Debug)]
pub struct EngineCache {
    engines: LruCache<String, CompositeProjectionBuilder>,
    registry: Arc<ProjectionRegistry>,
    settings: EngineSettings,
}

impl EngineCache {
    /// Cache sized by `settings.cache_capacity`, at least one entry
    pub fn new(registry: Arc<ProjectionRegistry>, settings: EngineSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            engines: LruCache::new(capacity),
            registry,
            settings,
        }
    }

    /// Builder for an atlas, marking it recently used
    pub fn get(&mut self, atlas_id: &str) -> Option<&mut CompositeProjectionBuilder> {
        self.engines.get_mut(atlas_id)
    }

    /// Whether a builder for the atlas is cached, without touching recency
    pub fn contains(&self, atlas_id: &str) -> bool {
        self.engines.contains(atlas_id)
    }

    /// Cached builder for the configuration's atlas, creating it if absent
    ///
    /// An existing builder is returned as is; the configuration passed in is
    /// only used when nothing is cached.
    pub fn get_or_create(
        &mut self,
        configuration: CompositeConfiguration,
    ) -> &mut CompositeProjectionBuilder {
        let atlas_id = configuration.atlas_id().to_string();
        if self.engines.contains(&atlas_id) {
            debug!(atlas_id = %atlas_id, "engine cache hit");
        }
        let registry = Arc::clone(&self.registry);
        let settings = self.settings.clone();
        self.engines.get_or_insert_mut(atlas_id, move || {
            info!(
                atlas_id = configuration.atlas_id(),
                territories = configuration.territory_count(),
                "creating composite engine"
            );
            CompositeProjectionBuilder::new(configuration, registry).with_settings(settings)
        })
    }

    /// Fresh builder for the configuration's atlas, replacing any cached one
    pub fn create(&mut self, configuration: CompositeConfiguration) -> &mut CompositeProjectionBuilder {
        if self.engines.pop(configuration.atlas_id()).is_some() {
            debug!(atlas_id = configuration.atlas_id(), "replacing cached engine");
        }
        self.get_or_create(configuration)
    }

    /// Drop the builder for an atlas
    pub fn evict(&mut self, atlas_id: &str) -> Option<CompositeProjectionBuilder> {
        let evicted = self.engines.pop(atlas_id);
        if evicted.is_some() {
            debug!(atlas_id, "evicted engine");
        }
        evicted
    }

    /// Drop every builder
    pub fn clear(&mut self) {
        self.engines.clear();
    }

    /// Number of cached builders
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Most builders kept at once
    pub fn capacity(&self) -> usize {
        self.engines.cap().get()
    }
}
