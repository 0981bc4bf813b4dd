use crate::store::{load_json, save_json, KeyValueStore, KEY_USER_FACTS};
use anyhow::Result;
use std::sync::Arc;

/// Append each candidate that is not already known, preserving order.
///
/// Comparison is exact string equality. Candidates repeated inside one batch
/// are collapsed too, so the result never holds two identical entries.
pub fn merge_facts(existing: &[String], candidates: &[String]) -> (Vec<String>, usize) {
    let mut merged = existing.to_vec();
    let mut added = 0;
    for candidate in candidates {
        if !merged.iter().any(|f| f == candidate) {
            merged.push(candidate.clone());
            added += 1;
        }
    }
    (merged, added)
}

/// Facts the companion remembers about the user across sessions.
pub struct FactStore {
    store: Arc<dyn KeyValueStore>,
}

impl FactStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn all(&self) -> Result<Vec<String>> {
        Ok(load_json(self.store.as_ref(), KEY_USER_FACTS)?.unwrap_or_default())
    }

    /// Merge a batch and persist the result. Returns how many were new.
    pub fn remember(&self, candidates: &[String]) -> Result<usize> {
        let existing = self.all()?;
        let (merged, added) = merge_facts(&existing, candidates);
        save_json(self.store.as_ref(), KEY_USER_FACTS, &merged)?;
        if added > 0 {
            tracing::info!("Remembered {} new fact(s), {} total", added, merged.len());
        }
        Ok(added)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(KEY_USER_FACTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn s(items: &[&str]) -> Vec<String> {
        items.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_merge_appends_only_unknown_in_order() {
        let (merged, added) = merge_facts(&s(&["Likes tea"]), &s(&["Has a cat", "Likes tea", "Runs"]));
        assert_eq!(merged, s(&["Likes tea", "Has a cat", "Runs"]));
        assert_eq!(added, 2);
    }

    #[test]
    fn test_merge_collapses_batch_duplicates() {
        let (merged, added) = merge_facts(&[], &s(&["Likes jazz", "Likes jazz"]));
        assert_eq!(merged, s(&["Likes jazz"]));
        assert_eq!(added, 1);
    }

    #[test]
    fn test_merge_is_case_sensitive() {
        let (merged, _) = merge_facts(&s(&["likes jazz"]), &s(&["Likes jazz"]));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_store_persists_after_each_call() {
        let backing = Arc::new(MemoryStore::new());
        let facts = FactStore::new(backing.clone());
        assert_eq!(facts.remember(&s(&["Name is Priya"])).unwrap(), 1);
        assert_eq!(facts.remember(&s(&["Name is Priya"])).unwrap(), 0);

        let reopened = FactStore::new(backing);
        assert_eq!(reopened.all().unwrap(), s(&["Name is Priya"]));
        reopened.clear().unwrap();
        assert!(reopened.all().unwrap().is_empty());
    }
}
