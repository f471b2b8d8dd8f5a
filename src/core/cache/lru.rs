//! Memory-budgeted LRU cache of decoded rasters.

use super::{CacheConfig, CacheStats};
use crate::core::raster::{ImageId, Raster, RasterDecoder};
use crate::error::DecodeError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Decodes on miss and remembers the result, within a byte budget
pub struct RasterCache {
    decoder: Arc<dyn RasterDecoder>,
    budget_bytes: usize,
    state: Mutex<LruState>,
}

struct Slot {
    raster: Arc<Raster>,
    stamp: u64,
}

/// Bookkeeping guarded by the cache mutex.
///
/// `recency` maps a monotonically increasing stamp to the id last touched
/// at that stamp, so its first key is always the least recently used entry.
#[derive(Default)]
struct LruState {
    entries: HashMap<ImageId, Slot>,
    recency: BTreeMap<u64, ImageId>,
    clock: u64,
    used_bytes: usize,
    hits: usize,
    misses: usize,
    evictions: usize,
    oversized: usize,
}

impl LruState {
    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Look up `id` and mark it most recently used
    fn touch(&mut self, id: &ImageId) -> Option<Arc<Raster>> {
        let stamp = self.next_stamp();
        let slot = self.entries.get_mut(id)?;
        self.recency.remove(&slot.stamp);
        slot.stamp = stamp;
        self.recency.insert(stamp, id.clone());
        Some(Arc::clone(&slot.raster))
    }

    fn remove(&mut self, id: &ImageId) -> Option<Slot> {
        let slot = self.entries.remove(id)?;
        self.recency.remove(&slot.stamp);
        self.used_bytes -= slot.raster.byte_size();
        Some(slot)
    }

    fn insert(&mut self, id: ImageId, raster: Arc<Raster>, budget_bytes: usize) {
        self.remove(&id);

        let size = raster.byte_size();
        if size > budget_bytes {
            self.oversized += 1;
            debug!(
                "{} needs {} bytes, over the {} byte budget; not caching",
                id, size, budget_bytes
            );
            return;
        }

        while self.used_bytes + size > budget_bytes {
            let Some((_, victim)) = self.recency.pop_first() else {
                break;
            };
            if let Some(slot) = self.entries.remove(&victim) {
                self.used_bytes -= slot.raster.byte_size();
                self.evictions += 1;
                debug!("evicted {} from raster cache", victim);
            }
        }

        let stamp = self.next_stamp();
        self.recency.insert(stamp, id.clone());
        self.used_bytes += size;
        self.entries.insert(id, Slot { raster, stamp });
    }
}

impl RasterCache {
    /// Create a cache in front of `decoder`
    pub fn new(decoder: Arc<dyn RasterDecoder>, config: CacheConfig) -> Self {
        Self {
            decoder,
            budget_bytes: config.budget_bytes,
            state: Mutex::new(LruState::default()),
        }
    }

    /// Fetch the raster for `id`, decoding it on a miss.
    ///
    /// Decode errors are returned unchanged and nothing is cached for them,
    /// so a later call retries the decode.
    pub fn get(&self, id: &ImageId) -> Result<Arc<Raster>, DecodeError> {
        {
            let mut state = self.lock();
            if let Some(raster) = state.touch(id) {
                state.hits += 1;
                return Ok(raster);
            }
            state.misses += 1;
        }

        let raster = Arc::new(self.decoder.decode(id)?);

        let mut state = self.lock();
        // Another reader may have decoded the same id while we were busy.
        if let Some(existing) = state.touch(id) {
            return Ok(existing);
        }
        state.insert(id.clone(), Arc::clone(&raster), self.budget_bytes);
        Ok(raster)
    }

    /// Whether `id` is cached right now. Does not affect recency.
    pub fn contains(&self, id: &ImageId) -> bool {
        self.lock().entries.contains_key(id)
    }

    /// Drop a single entry
    pub fn invalidate(&self, id: &ImageId) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.recency.clear();
        state.used_bytes = 0;
    }

    pub fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            oversized: state.oversized,
            entries: state.entries.len(),
            used_bytes: state.used_bytes,
            budget_bytes: self.budget_bytes,
        }
    }

    // A panic while holding the lock cannot leave the maps half-updated
    // in a way that breaks later lookups, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, LruState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::InMemoryDecoder;
    use std::thread;

    /// 10×10 single-channel raster: 100 bytes
    fn raster(value: u8) -> Raster {
        Raster::new(10, 10, 1, vec![value; 100]).unwrap()
    }

    fn decoder_with(ids: &[&str]) -> Arc<InMemoryDecoder> {
        let mut decoder = InMemoryDecoder::new();
        for (i, id) in ids.iter().enumerate() {
            decoder.insert(*id, raster(i as u8));
        }
        Arc::new(decoder)
    }

    fn cache(decoder: &Arc<InMemoryDecoder>, budget_bytes: usize) -> RasterCache {
        RasterCache::new(
            Arc::clone(decoder) as Arc<dyn RasterDecoder>,
            CacheConfig::with_budget_bytes(budget_bytes),
        )
    }

    #[test]
    fn repeated_get_decodes_once() {
        let decoder = decoder_with(&["/a.png"]);
        let cache = cache(&decoder, 1_000);
        let id = ImageId::from("/a.png");

        let first = cache.get(&id).unwrap();
        let second = cache.get(&id).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, decoder.decode(&id).unwrap());
        assert_eq!(decoder.decode_count(), 2); // one miss + the direct decode above

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.used_bytes, 100);
    }

    #[test]
    fn evicts_least_recently_used_first() {
        let decoder = decoder_with(&["/a.png", "/b.png", "/c.png"]);
        let cache = cache(&decoder, 200);
        let (a, b, c) = (
            ImageId::from("/a.png"),
            ImageId::from("/b.png"),
            ImageId::from("/c.png"),
        );

        cache.get(&a).unwrap();
        cache.get(&b).unwrap();
        cache.get(&a).unwrap(); // b is now the oldest
        cache.get(&c).unwrap();

        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.contains(&c));
        assert_eq!(cache.stats().evictions, 1);
        assert!(cache.stats().used_bytes <= 200);
    }

    #[test]
    fn evicted_entry_is_decoded_again() {
        let decoder = decoder_with(&["/a.png", "/b.png"]);
        let cache = cache(&decoder, 100);
        let (a, b) = (ImageId::from("/a.png"), ImageId::from("/b.png"));

        let held = cache.get(&a).unwrap();
        cache.get(&b).unwrap();
        assert!(!cache.contains(&a));

        let again = cache.get(&a).unwrap();

        assert_eq!(decoder.decode_count(), 3);
        assert_eq!(*held, *again);
        assert!(!Arc::ptr_eq(&held, &again));
    }

    #[test]
    fn oversized_raster_is_returned_but_not_cached() {
        let decoder = decoder_with(&["/big.png"]);
        let cache = cache(&decoder, 50);
        let id = ImageId::from("/big.png");

        let raster = cache.get(&id).unwrap();

        assert_eq!(raster.byte_size(), 100);
        assert!(!cache.contains(&id));
        assert_eq!(cache.stats().oversized, 1);
        assert_eq!(cache.stats().used_bytes, 0);
    }

    #[test]
    fn decode_errors_pass_through_and_are_not_cached() {
        let decoder = decoder_with(&[]);
        let cache = cache(&decoder, 1_000);
        let id = ImageId::from("/missing.png");

        assert!(matches!(cache.get(&id), Err(DecodeError::NotFound { .. })));
        assert!(matches!(cache.get(&id), Err(DecodeError::NotFound { .. })));
        assert_eq!(decoder.decode_count(), 2);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn invalidate_and_clear_release_bytes() {
        let decoder = decoder_with(&["/a.png", "/b.png"]);
        let cache = cache(&decoder, 1_000);
        let (a, b) = (ImageId::from("/a.png"), ImageId::from("/b.png"));

        cache.get(&a).unwrap();
        cache.get(&b).unwrap();
        assert!(cache.invalidate(&a));
        assert!(!cache.invalidate(&a));
        assert_eq!(cache.stats().used_bytes, 100);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
        assert_eq!(cache.stats().used_bytes, 0);
    }

    #[test]
    fn concurrent_readers_under_tight_budget() {
        let ids: Vec<String> = (0..8).map(|i| format!("/{}.png", i)).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let decoder = decoder_with(&id_refs);
        let cache = Arc::new(cache(&decoder, 300));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                let ids = ids.clone();
                thread::spawn(move || {
                    for round in 0..50 {
                        let index = (t + round) % ids.len();
                        let raster = cache.get(&ImageId::from(ids[index].as_str())).unwrap();
                        // Contents must match the id even if it was evicted meanwhile
                        assert!(raster.pixels().iter().all(|&v| v == index as u8));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert!(stats.used_bytes <= 300);
        assert!(stats.entries <= 3);
        assert_eq!(stats.hits + stats.misses, 200);
    }
}
