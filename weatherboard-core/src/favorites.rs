//! Recently searched locations, kept in a [`KeyValueStore`].
//!
//! The persisted list is the only state: each mutation reads the whole list,
//! changes it and writes the whole list back. Names are unique, newest first,
//! and the list never grows past its capacity.

use crate::storage::{KeyValueStore, StorageError};

/// Maximum number of saved locations by default.
pub const DEFAULT_CAPACITY: usize = 5;

/// Largest capacity the configuration accepts.
pub const MAX_CAPACITY: usize = 50;

pub const FAVORITES_KEY: &str = "savedLocations";
pub const LAST_SEARCH_KEY: &str = "lastSearchedCity";

/// The persisted list, or an empty one when nothing valid is stored.
pub fn list<S: KeyValueStore + ?Sized>(store: &S) -> Vec<String> {
    let Some(raw) = store.get_string(FAVORITES_KEY) else {
        return Vec::new();
    };

    serde_json::from_str(&raw).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "saved locations are corrupt, treating as empty");
        Vec::new()
    })
}

/// Insert `name` at the front unless it is already saved, dropping the
/// oldest entries beyond `capacity`. An existing entry keeps its position.
pub fn add<S: KeyValueStore + ?Sized>(
    store: &S,
    name: &str,
    capacity: usize,
) -> Result<Vec<String>, StorageError> {
    let mut names = list(store);

    if !names.iter().any(|saved| saved == name) {
        names.insert(0, name.to_string());
        names.truncate(capacity);
    }

    write(store, &names)?;
    Ok(names)
}

/// Drop every entry equal to `name`.
pub fn remove<S: KeyValueStore + ?Sized>(store: &S, name: &str) -> Result<Vec<String>, StorageError> {
    let mut names = list(store);
    names.retain(|saved| saved != name);

    write(store, &names)?;
    Ok(names)
}

pub fn last_search<S: KeyValueStore + ?Sized>(store: &S) -> Option<String> {
    store
        .get_string(LAST_SEARCH_KEY)
        .filter(|name| !name.trim().is_empty())
}

pub fn set_last_search<S: KeyValueStore + ?Sized>(store: &S, name: &str) -> Result<(), StorageError> {
    store.set_string(LAST_SEARCH_KEY, name)
}

fn write<S: KeyValueStore + ?Sized>(store: &S, names: &[String]) -> Result<(), StorageError> {
    let json = serde_json::to_string(names)?;
    store.set_string(FAVORITES_KEY, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn seeded(names: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .set_string(FAVORITES_KEY, &serde_json::to_string(names).unwrap())
            .unwrap();
        store
    }

    #[test]
    fn add_to_empty_then_duplicate_then_new() {
        let store = MemoryStore::new();

        assert_eq!(add(&store, "Paris", DEFAULT_CAPACITY).unwrap(), vec!["Paris"]);
        assert_eq!(add(&store, "Paris", DEFAULT_CAPACITY).unwrap(), vec!["Paris"]);
        assert_eq!(add(&store, "Rome", DEFAULT_CAPACITY).unwrap(), vec!["Rome", "Paris"]);
        assert_eq!(list(&store), vec!["Rome", "Paris"]);
    }

    #[test]
    fn existing_name_is_not_moved_to_front() {
        let store = seeded(&["Rome", "Paris"]);

        add(&store, "Paris", DEFAULT_CAPACITY).unwrap();

        assert_eq!(list(&store), vec!["Rome", "Paris"]);
    }

    #[test]
    fn add_beyond_capacity_evicts_oldest() {
        let store = seeded(&["A", "B", "C", "D", "E"]);

        let names = add(&store, "F", DEFAULT_CAPACITY).unwrap();

        assert_eq!(names, vec!["F", "A", "B", "C", "D"]);
        assert_eq!(list(&store), names);
    }

    #[test]
    fn remove_present_and_absent() {
        let store = seeded(&["F", "A", "B", "C", "D"]);

        assert_eq!(remove(&store, "C").unwrap(), vec!["F", "A", "B", "D"]);
        assert_eq!(remove(&store, "Z").unwrap(), vec!["F", "A", "B", "D"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = seeded(&["F", "A", "B"]);

        let once = remove(&store, "A").unwrap();
        let twice = remove(&store, "A").unwrap();

        assert_eq!(once, twice);
        assert_eq!(list(&store), vec!["F", "B"]);
    }

    #[test]
    fn list_absent_is_empty() {
        assert!(list(&MemoryStore::new()).is_empty());
    }

    #[test]
    fn list_corrupt_is_empty() {
        for raw in ["not json", "{\"a\":1}", "[1,2,3]", "\"Paris\""] {
            let store = MemoryStore::new();
            store.set_string(FAVORITES_KEY, raw).unwrap();
            assert!(list(&store).is_empty(), "{raw} should read as empty");
        }
    }

    #[test]
    fn add_over_corrupt_storage_starts_fresh() {
        let store = MemoryStore::new();
        store.set_string(FAVORITES_KEY, "[[[").unwrap();

        assert_eq!(add(&store, "Oslo", DEFAULT_CAPACITY).unwrap(), vec!["Oslo"]);
    }

    #[test]
    fn last_search_round_trip_and_blank_is_absent() {
        let store = MemoryStore::new();
        assert_eq!(last_search(&store), None);

        set_last_search(&store, "Lisbon").unwrap();
        assert_eq!(last_search(&store).as_deref(), Some("Lisbon"));

        set_last_search(&store, "   ").unwrap();
        assert_eq!(last_search(&store), None);
    }

    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        reads: AtomicUsize,
        writes: AtomicUsize,
    }

    impl KeyValueStore for CountingStore {
        fn get_string(&self, key: &str) -> Option<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get_string(key)
        }

        fn set_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set_string(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn each_mutation_is_one_read_and_one_write() {
        let store = CountingStore::default();

        add(&store, "Paris", DEFAULT_CAPACITY).unwrap();
        add(&store, "Paris", DEFAULT_CAPACITY).unwrap();
        remove(&store, "Paris").unwrap();

        assert_eq!(store.reads.load(Ordering::SeqCst), 3);
        assert_eq!(store.writes.load(Ordering::SeqCst), 3);
    }
}
