//! In-memory Application -> Location[] store.
//!
//! Owned by the hierarchy controller; nothing else mutates it. An entry marked
//! stale is still served to readers until a replacement list lands, so readers
//! never observe a partially refreshed list.

use filehub_core::{ApplicationId, Location};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct CacheEntry {
    locations: Vec<Location>,
    stale: bool,
}

#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: HashMap<ApplicationId, CacheEntry>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached list for the application, stale or not.
    pub fn get(&self, application_id: ApplicationId) -> Option<&[Location]> {
        self.entries
            .get(&application_id)
            .map(|entry| entry.locations.as_slice())
    }

    pub fn is_fresh(&self, application_id: ApplicationId) -> bool {
        self.entries
            .get(&application_id)
            .is_some_and(|entry| !entry.stale)
    }

    pub fn contains(&self, application_id: ApplicationId) -> bool {
        self.entries.contains_key(&application_id)
    }

    pub fn store(&mut self, application_id: ApplicationId, locations: Vec<Location>) {
        self.entries.insert(
            application_id,
            CacheEntry {
                locations,
                stale: false,
            },
        );
    }

    /// Keep serving the entry but require a refetch before it is trusted.
    pub fn mark_stale(&mut self, application_id: ApplicationId) {
        if let Some(entry) = self.entries.get_mut(&application_id) {
            entry.stale = true;
        }
    }

    pub fn invalidate(&mut self, application_id: ApplicationId) {
        self.entries.remove(&application_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: i64, name: &str) -> Location {
        Location {
            id,
            location_name: name.to_string(),
            path: format!("/srv/{}", name),
        }
    }

    #[test]
    fn store_then_get() {
        let mut cache = ResourceCache::new();
        assert!(cache.get(1).is_none());

        cache.store(1, vec![location(10, "inbox")]);
        assert_eq!(cache.get(1).unwrap().len(), 1);
        assert!(cache.is_fresh(1));
        assert!(!cache.contains(2));
    }

    #[test]
    fn stale_entry_is_still_served() {
        let mut cache = ResourceCache::new();
        cache.store(1, vec![location(10, "inbox")]);
        cache.mark_stale(1);

        assert!(!cache.is_fresh(1));
        assert_eq!(cache.get(1).unwrap()[0].location_name, "inbox");

        cache.store(1, vec![location(10, "inbox"), location(11, "archive")]);
        assert!(cache.is_fresh(1));
        assert_eq!(cache.get(1).unwrap().len(), 2);
    }

    #[test]
    fn mark_stale_on_missing_entry_is_noop() {
        let mut cache = ResourceCache::new();
        cache.mark_stale(7);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_and_clear() {
        let mut cache = ResourceCache::new();
        cache.store(1, vec![]);
        cache.store(2, vec![location(20, "out")]);

        cache.invalidate(1);
        assert!(!cache.contains(1));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
