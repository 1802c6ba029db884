// world/cache.rs - LRU cache of section results
//
// Keyed by a deterministic hash of the world's fingerprint and the request
// (plus a discriminant for the kind of section), so one cache can serve
// several worlds. Results sit behind `Arc` so a hit is a reference-count
// bump. Thread-safe via Mutex.

use super::section::{
    evaluate_composition_section, evaluate_temperature_section, CompositionSectionResult,
    SectionRequest, SectionResult,
};
use super::World;
use crate::error::Result;
use lru::LruCache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

/// Section results for any number of worlds.
pub struct SectionCache {
    temperature: Mutex<LruCache<u64, Arc<SectionResult>>>,
    composition: Mutex<LruCache<u64, Arc<CompositionSectionResult>>>,
}

/// A poisoned lock only means another query panicked mid-insert; the LRU
/// itself is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SectionCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            temperature: Mutex::new(LruCache::new(cap)),
            composition: Mutex::new(LruCache::new(cap)),
        }
    }

    // ── Temperature ──

    pub fn get_temperature(&self, hash: u64) -> Option<Arc<SectionResult>> {
        lock(&self.temperature).get(&hash).cloned()
    }

    pub fn put_temperature(&self, hash: u64, result: SectionResult) -> Arc<SectionResult> {
        let result = Arc::new(result);
        lock(&self.temperature).put(hash, Arc::clone(&result));
        result
    }

    // ── Composition ──

    pub fn get_composition(&self, hash: u64) -> Option<Arc<CompositionSectionResult>> {
        lock(&self.composition).get(&hash).cloned()
    }

    pub fn put_composition(
        &self,
        hash: u64,
        result: CompositionSectionResult,
    ) -> Arc<CompositionSectionResult> {
        let result = Arc::new(result);
        lock(&self.composition).put(hash, Arc::clone(&result));
        result
    }

    // ── Evaluate through the cache ──

    pub fn temperature_section(
        &self,
        world: &World,
        request: &SectionRequest,
    ) -> Result<Arc<SectionResult>> {
        let hash = hash_section_request(world.fingerprint(), request, None);
        if let Some(hit) = self.get_temperature(hash) {
            trace!(hash, "temperature section cache hit");
            return Ok(hit);
        }
        let result = evaluate_temperature_section(world, request)?;
        Ok(self.put_temperature(hash, result))
    }

    pub fn composition_section(
        &self,
        world: &World,
        request: &SectionRequest,
        composition_number: u32,
    ) -> Result<Arc<CompositionSectionResult>> {
        let hash = hash_section_request(world.fingerprint(), request, Some(composition_number));
        if let Some(hit) = self.get_composition(hash) {
            trace!(hash, "composition section cache hit");
            return Ok(hit);
        }
        let result = evaluate_composition_section(world, request, composition_number)?;
        Ok(self.put_composition(hash, result))
    }

    // ── Maintenance ──

    pub fn clear(&self) {
        lock(&self.temperature).clear();
        lock(&self.composition).clear();
    }

    /// Entries across both caches.
    pub fn len(&self) -> usize {
        lock(&self.temperature).len() + lock(&self.composition).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hash a section request against the world it is evaluated on
/// ([`World::fingerprint`]). `composition_number` is `None` for temperature
/// sections, so the two kinds never collide.
pub fn hash_section_request(
    world_fingerprint: u64,
    request: &SectionRequest,
    composition_number: Option<u32>,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    world_fingerprint.hash(&mut hasher);

    match composition_number {
        Some(n) => {
            "composition".hash(&mut hasher);
            n.hash(&mut hasher);
        }
        None => "temperature".hash(&mut hasher),
    }

    request.resolution_along.hash(&mut hasher);
    request.resolution_depth.hash(&mut hasher);
    for v in [
        request.along_min,
        request.along_max,
        request.depth_min,
        request.depth_max,
        request.surface,
        request.gravity,
    ] {
        v.to_bits().hash(&mut hasher);
    }

    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(value: f64) -> SectionResult {
        SectionResult {
            values: vec![value],
            resolution_along: 1,
            resolution_depth: 1,
            min_value: value,
            max_value: value,
        }
    }

    #[test]
    fn same_request_same_hash() {
        let a = SectionRequest::default();
        let b = SectionRequest::default();
        assert_eq!(hash_section_request(7, &a, None), hash_section_request(7, &b, None));
    }

    #[test]
    fn any_field_changes_hash() {
        let base = SectionRequest::default();
        let h = hash_section_request(7, &base, None);
        let variants = [
            SectionRequest { resolution_along: 8, ..base.clone() },
            SectionRequest { depth_max: 1.0, ..base.clone() },
            SectionRequest { surface: 10.0, ..base.clone() },
            SectionRequest { gravity: 10.0, ..base.clone() },
        ];
        for v in &variants {
            assert_ne!(h, hash_section_request(7, v, None));
        }
        assert_ne!(h, hash_section_request(8, &base, None));
    }

    #[test]
    fn temperature_vs_composition_different_hash() {
        let req = SectionRequest::default();
        assert_ne!(
            hash_section_request(7, &req, None),
            hash_section_request(7, &req, Some(0))
        );
        assert_ne!(
            hash_section_request(7, &req, Some(0)),
            hash_section_request(7, &req, Some(1))
        );
    }

    #[test]
    fn cache_put_get() {
        let cache = SectionCache::new(4);
        assert!(cache.get_temperature(42).is_none());
        let stored = cache.put_temperature(42, make_result(7.0));
        let cached = cache.get_temperature(42).unwrap();
        assert!(Arc::ptr_eq(&stored, &cached));
        assert_eq!(cached.values, vec![7.0]);
        assert!(cache.get_composition(42).is_none());
    }

    #[test]
    fn cache_lru_eviction() {
        let cache = SectionCache::new(2);
        cache.put_temperature(1, make_result(1.0));
        cache.put_temperature(2, make_result(2.0));
        // Evicts key 1
        cache.put_temperature(3, make_result(3.0));

        assert!(cache.get_temperature(1).is_none());
        assert!(cache.get_temperature(2).is_some());
        assert!(cache.get_temperature(3).is_some());
    }

    #[test]
    fn evaluation_goes_through_cache() {
        let world = World::new(serde_json::json!({
            "Cross section": [[0, 0], [1, 0]],
            "Surface objects": {},
        }))
        .unwrap();
        let cache = SectionCache::new(4);
        let req = SectionRequest {
            resolution_along: 2,
            resolution_depth: 2,
            ..SectionRequest::default()
        };
        let first = cache.temperature_section(&world, &req).unwrap();
        let second = cache.temperature_section(&world, &req).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.values.len(), 4);

        let comp = cache.composition_section(&world, &req, 0).unwrap();
        assert_eq!(comp.present, 0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn worlds_sharing_a_cache_keep_their_own_results() {
        let world = |temperature: f64| {
            World::new(serde_json::json!({
                "Cross section": [[0, 0], [1, 0]],
                "Surface objects": {
                    "OceanicPlate": {
                        "Coordinates": [[-1e6, -1e6], [1e6, -1e6], [1e6, 1e6], [-1e6, 1e6]],
                        "Temperature submodule": {"name": "constant", "Temperature": temperature},
                        "Composition submodule": {"name": "constant", "Compositions": [1]},
                    }
                }
            }))
            .unwrap()
        };
        let (cold, hot) = (world(100.0), world(900.0));
        assert_ne!(cold.fingerprint(), hot.fingerprint());

        let cache = SectionCache::new(4);
        let req = SectionRequest {
            resolution_along: 2,
            resolution_depth: 2,
            along_max: 1000.0,
            depth_max: 1000.0,
            ..SectionRequest::default()
        };
        let cold_section = cache.temperature_section(&cold, &req).unwrap();
        let hot_section = cache.temperature_section(&hot, &req).unwrap();
        assert!(cold_section.values.iter().all(|&t| t == 100.0));
        assert!(hot_section.values.iter().all(|&t| t == 900.0));
        assert!(Arc::ptr_eq(&cold_section, &cache.temperature_section(&cold, &req).unwrap()));

        let empty = World::new(serde_json::json!({
            "Cross section": [[0, 0], [1, 0]],
            "Surface objects": {},
        }))
        .unwrap();
        assert_eq!(cache.composition_section(&cold, &req, 1).unwrap().present, 4);
        assert_eq!(cache.composition_section(&empty, &req, 1).unwrap().present, 0);
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn cache_clear() {
        let cache = SectionCache::new(4);
        cache.put_temperature(1, make_result(1.0));
        cache.put_composition(
            1,
            CompositionSectionResult {
                values: vec![true],
                resolution_along: 1,
                resolution_depth: 1,
                composition_number: 0,
                present: 1,
            },
        );
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get_temperature(1).is_none());
    }
}
