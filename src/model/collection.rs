//! Ordered region storage with positional identity.
//!
//! Regions are addressed by their index. A removal shifts every later
//! region down by one, so each removal (and each wholesale reload) bumps a
//! generation counter. [`RegionKey`]s carry the generation they were issued
//! under and stop resolving once it moves on.

use crate::model::region::{Region, RegionPatch};

/// Index of a region stamped with the collection generation it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionKey {
    pub index: usize,
    pub generation: u64,
}

/// The regions of one editing session, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RegionCollection {
    regions: Vec<Region>,
    generation: u64,
}

impl RegionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection, e.g. when predictions arrive.
    pub fn replace_all(&mut self, regions: impl IntoIterator<Item = Region>) {
        self.regions.clear();
        self.regions.extend(regions);
        self.generation += 1;
        log::debug!(
            "Region collection reloaded with {} regions (generation {})",
            self.regions.len(),
            self.generation
        );
    }

    /// Append a region and return its index.
    pub fn append(&mut self, region: Region) -> usize {
        self.regions.push(region);
        self.regions.len() - 1
    }

    /// Merge `patch` into the region at `index` and mark it modified.
    ///
    /// Returns false without touching anything if `index` is out of range.
    pub fn patch(&mut self, index: usize, patch: &RegionPatch) -> bool {
        match self.regions.get_mut(index) {
            Some(region) => {
                region.apply(patch);
                true
            }
            None => {
                log::debug!(
                    "Ignoring patch for index {} (collection has {} regions)",
                    index,
                    self.regions.len()
                );
                false
            }
        }
    }

    /// Remove the region at `index`, shifting later regions down.
    pub fn remove(&mut self, index: usize) -> Option<Region> {
        if index >= self.regions.len() {
            log::debug!("Ignoring removal of stale index {}", index);
            return None;
        }
        let removed = self.regions.remove(index);
        self.generation += 1;
        Some(removed)
    }

    pub fn get(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn as_slice(&self) -> &[Region] {
        &self.regions
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Key for `index` under the current generation, if the index exists.
    pub fn key(&self, index: usize) -> Option<RegionKey> {
        (index < self.regions.len()).then_some(RegionKey {
            index,
            generation: self.generation,
        })
    }

    /// Resolve a key to an index if it is still current.
    pub fn resolve(&self, key: RegionKey) -> Option<usize> {
        if key.generation == self.generation && key.index < self.regions.len() {
            Some(key.index)
        } else {
            log::debug!(
                "Stale region key {:?} (current generation {}, {} regions)",
                key,
                self.generation,
                self.regions.len()
            );
            None
        }
    }
}
