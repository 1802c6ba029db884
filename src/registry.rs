// registry.rs - name → constructor tables for features and coordinate systems
//
// A registry is filled before any World is built and only read afterwards.
// `Registry::global()` hands out the built-in registry, created on first use;
// callers with their own plug-ins build a `Registry` and pass it to
// `World::with_registry`.

use crate::coordinate_systems::{self, CoordinateSystem, CoordinateSystemFactory};
use crate::error::{Result, WorldBuilderError};
use crate::features::{self, Feature};
use rustc_hash::FxHashMap;
use std::sync::{Arc, OnceLock};
use tracing::warn;

/// Constructor stored in the registry. Features are default-constructed and
/// then read their own entries from the parameter store.
pub type FeatureFactory = fn() -> Box<dyn Feature>;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    features: FxHashMap<String, FeatureFactory>,
    coordinate_systems: FxHashMap<String, CoordinateSystemFactory>,
}

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in feature and coordinate system.
    pub fn with_builtins() -> Self {
        let mut registry = Registry::new();
        registry
            .register_feature(features::CONTINENTAL_PLATE, features::create_continental_plate)
            .register_feature(features::OCEANIC_PLATE, features::create_oceanic_plate)
            .register_feature(features::SUBDUCTION_ZONE, features::create_subduction_zone)
            .register_coordinate_system("cartesian", coordinate_systems::create_cartesian)
            .register_coordinate_system("spherical", coordinate_systems::create_spherical);
        registry
    }

    /// Shared built-in registry.
    pub fn global() -> Arc<Registry> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Registry::with_builtins())))
    }

    pub fn register_feature(&mut self, type_name: &str, factory: FeatureFactory) -> &mut Self {
        if self.features.insert(type_name.to_string(), factory).is_some() {
            warn!(type_name, "feature factory replaced");
        }
        self
    }

    pub fn register_coordinate_system(
        &mut self,
        name: &str,
        factory: CoordinateSystemFactory,
    ) -> &mut Self {
        if self.coordinate_systems.insert(name.to_string(), factory).is_some() {
            warn!(name, "coordinate system factory replaced");
        }
        self
    }

    /// Feature type for a node name. The exact name wins; otherwise a
    /// trailing `_<digits>` suffix is dropped, so `ContinentalPlate_2`
    /// resolves to `ContinentalPlate`.
    pub fn resolve_feature_type<'a>(&self, node_name: &'a str) -> Option<&'a str> {
        if self.features.contains_key(node_name) {
            return Some(node_name);
        }
        let (base, suffix) = node_name.rsplit_once('_')?;
        let numbered = !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit());
        (numbered && self.features.contains_key(base)).then_some(base)
    }

    /// Construct the feature registered for `node_name`; `path` is only
    /// used for the error message.
    pub fn create_feature(&self, node_name: &str, path: &str) -> Result<Box<dyn Feature>> {
        self.resolve_feature_type(node_name)
            .and_then(|type_name| self.features.get(type_name))
            .map(|factory| factory())
            .ok_or_else(|| WorldBuilderError::UnknownFeatureType {
                name: node_name.to_string(),
                path: path.to_string(),
            })
    }

    pub fn has_coordinate_system(&self, name: &str) -> bool {
        self.coordinate_systems.contains_key(name)
    }

    pub fn create_coordinate_system(&self, name: &str) -> Result<Box<dyn CoordinateSystem>> {
        self.coordinate_systems
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| WorldBuilderError::UnknownCoordinateSystemType {
                name: name.to_string(),
            })
    }

    /// Registered feature type names, sorted.
    pub fn feature_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.features.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
