// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Merge-on-write access to stored profiles
//!
//! Every write reads the latest stored record for the identity, merges the
//! incoming history on top of it and writes the result back. Nothing here locks
//! across the read and the write: two writers racing on the same identity and
//! timestamp resolve as last-write-wins.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::db::{ProfileStore, StoredProfile};
use crate::models::{now_timestamp, AnalysisHistory, AnalysisRecord, Profile};
use crate::Result;

/// Incoming entries overlaid on the existing history; incoming wins on collision
pub fn merge_history(existing: &AnalysisHistory, incoming: &AnalysisHistory) -> AnalysisHistory {
    let mut merged = existing.clone();
    merged.extend(incoming.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Profile repository over a [`ProfileStore`]
///
/// Subscribers receive the full profile list after every successful write.
pub struct ProfileRepository<S> {
    store: S,
    updates: watch::Sender<Vec<Profile>>,
}

impl<S: ProfileStore> ProfileRepository<S> {
    /// Wrap a store, seeding subscribers with its current contents
    pub fn new(store: S) -> Result<Self> {
        let (updates, _) = watch::channel(store.list_all()?);
        Ok(Self { store, updates })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Receiver holding the latest snapshot of all profiles
    pub fn subscribe(&self) -> watch::Receiver<Vec<Profile>> {
        self.updates.subscribe()
    }

    pub fn all_profiles(&self) -> Result<Vec<Profile>> {
        self.store.list_all()
    }

    pub fn find(&self, name: &str, age: &str, gender: &str) -> Result<Option<Profile>> {
        Ok(self.store.find_by_identity(name, age, gender)?.map(|s| s.profile))
    }

    /// Save a profile without dropping any history already stored for it
    pub fn save_profile(&self, incoming: &Profile) -> Result<()> {
        let key = incoming.key();
        match self.store.find_by_identity(key.name, key.age, key.gender)? {
            Some(mut existing) => {
                existing.profile.history = merge_history(&existing.profile.history, &incoming.history);
                self.store.upsert(&existing)?;
                debug!("Merged profile {} ({} analyses)", key, existing.profile.history.len());
            }
            None => {
                self.store.upsert(&StoredProfile::new(incoming.clone()))?;
                info!("Created profile {}", key);
            }
        }
        self.publish();
        Ok(())
    }

    /// Record one analysis under `timestamp`
    ///
    /// The stored profile is re-read first; `profile` only supplies identity.
    pub fn add_analysis(&self, profile: &Profile, timestamp: &str, analysis: AnalysisRecord) -> Result<()> {
        let key = profile.key();
        let record = match self.store.find_by_identity(key.name, key.age, key.gender)? {
            Some(mut existing) => {
                if existing.profile.history.contains_key(timestamp) {
                    warn!("Replacing analysis at {} for {}", timestamp, key);
                }
                existing.profile.history.insert(timestamp.to_string(), analysis);
                existing
            }
            None => {
                let mut created = Profile::new(key.name, key.age, key.gender);
                created.history.insert(timestamp.to_string(), analysis);
                info!("Created profile {} from first analysis", key);
                StoredProfile::new(created)
            }
        };
        self.store.upsert(&record)?;
        debug!("Recorded analysis at {} for {}", timestamp, key);
        self.publish();
        Ok(())
    }

    /// Record one analysis stamped with the current local time; returns the key used
    pub fn add_analysis_now(&self, profile: &Profile, analysis: AnalysisRecord) -> Result<String> {
        let timestamp = now_timestamp();
        self.add_analysis(profile, &timestamp, analysis)?;
        Ok(timestamp)
    }

    /// Delete the stored profile with the same identity. Returns whether one existed.
    pub fn delete_profile(&self, profile: &Profile) -> Result<bool> {
        let key = profile.key();
        let Some(id) = self
            .store
            .find_by_identity(key.name, key.age, key.gender)?
            .and_then(|s| s.id)
        else {
            return Ok(false);
        };
        let removed = self.store.delete(id)?;
        if removed {
            info!("Deleted profile {}", key);
            self.publish();
        }
        Ok(removed)
    }

    fn publish(&self) {
        match self.store.list_all() {
            Ok(snapshot) => {
                self.updates.send_replace(snapshot);
            }
            Err(e) => warn!("Failed to refresh profile subscribers: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn repo() -> ProfileRepository<Database> {
        ProfileRepository::new(Database::in_memory().unwrap()).unwrap()
    }

    fn alice() -> Profile {
        Profile::new("Alice", "30", "Female")
    }

    fn scored(jaggedness: &str) -> AnalysisRecord {
        AnalysisRecord {
            jaggedness: Some(jaggedness.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn save_then_lookup() {
        let repo = repo();
        assert!(repo.find("Alice", "30", "Female").unwrap().is_none());

        repo.save_profile(&alice()).unwrap();
        let found = repo.find("Alice", "30", "Female").unwrap().unwrap();
        assert!(found.history.is_empty());
    }

    #[test]
    fn empty_save_keeps_stored_history() {
        let repo = repo();
        repo.add_analysis(&alice(), "2024-01-01 10:00:00", scored("10")).unwrap();
        repo.add_analysis(&alice(), "2024-01-02 10:00:00", scored("20")).unwrap();

        repo.save_profile(&alice()).unwrap();

        let stored = repo.find("Alice", "30", "Female").unwrap().unwrap();
        assert_eq!(stored.history.len(), 2);
        assert_eq!(stored.history["2024-01-02 10:00:00"], scored("20"));
        assert_eq!(repo.all_profiles().unwrap().len(), 1);
    }

    #[test]
    fn save_overlays_incoming_entries() {
        let repo = repo();
        repo.add_analysis(&alice(), "2024-01-01 10:00:00", scored("10")).unwrap();
        repo.add_analysis(&alice(), "2024-01-02 10:00:00", scored("20")).unwrap();

        let mut incoming = alice();
        incoming.history.insert("2024-01-02 10:00:00".to_string(), scored("99"));
        incoming.history.insert("2024-01-03 10:00:00".to_string(), scored("30"));
        repo.save_profile(&incoming).unwrap();

        let stored = repo.find("Alice", "30", "Female").unwrap().unwrap();
        assert_eq!(stored.history.len(), 3);
        assert_eq!(stored.history["2024-01-01 10:00:00"], scored("10"));
        assert_eq!(stored.history["2024-01-02 10:00:00"], scored("99"));
    }

    #[test]
    fn distinct_timestamps_accumulate() {
        let repo = repo();
        repo.save_profile(&alice()).unwrap();
        repo.add_analysis(&alice(), "2024-01-01 10:00:00", scored("10")).unwrap();
        repo.add_analysis(&alice(), "2024-01-01 10:00:01", scored("11")).unwrap();

        let stored = repo.find("Alice", "30", "Female").unwrap().unwrap();
        assert_eq!(stored.history.len(), 2);
    }

    #[test]
    fn same_timestamp_last_write_wins() {
        let repo = repo();
        repo.add_analysis(&alice(), "2024-01-01 10:00:00", scored("10")).unwrap();
        repo.add_analysis(&alice(), "2024-01-01 10:00:00", scored("55")).unwrap();

        let stored = repo.find("Alice", "30", "Female").unwrap().unwrap();
        assert_eq!(stored.history.len(), 1);
        assert_eq!(stored.history["2024-01-01 10:00:00"], scored("55"));
    }

    #[test]
    fn add_ignores_stale_caller_copy() {
        let repo = repo();
        let stale = alice();
        repo.add_analysis(&stale, "2024-01-01 10:00:00", scored("10")).unwrap();
        // `stale` still has an empty history; the stored entry must survive.
        repo.add_analysis(&stale, "2024-01-05 10:00:00", scored("50")).unwrap();

        let stored = repo.find("Alice", "30", "Female").unwrap().unwrap();
        assert_eq!(stored.history.len(), 2);
    }

    #[test]
    fn add_creates_missing_profile_with_single_entry() {
        let repo = repo();
        let mut caller = alice();
        caller.history.insert("2023-12-31 23:59:59".to_string(), scored("5"));
        repo.add_analysis(&caller, "2024-01-01 00:00:00", scored("6")).unwrap();

        let stored = repo.find("Alice", "30", "Female").unwrap().unwrap();
        assert_eq!(stored.history.len(), 1);
        assert_eq!(stored.history["2024-01-01 00:00:00"], scored("6"));
    }

    #[test]
    fn add_now_uses_formatted_timestamp() {
        let repo = repo();
        let stamp = repo.add_analysis_now(&alice(), scored("1")).unwrap();
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");

        let stored = repo.find("Alice", "30", "Female").unwrap().unwrap();
        assert!(stored.history.contains_key(&stamp));
    }

    #[test]
    fn delete_profile_by_identity() {
        let repo = repo();
        repo.save_profile(&alice()).unwrap();
        assert!(repo.delete_profile(&alice()).unwrap());
        assert!(!repo.delete_profile(&alice()).unwrap());
        assert!(repo.find("Alice", "30", "Female").unwrap().is_none());
    }

    #[test]
    fn subscribers_see_writes() {
        let repo = repo();
        let mut rx = repo.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        repo.save_profile(&alice()).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update()[0].name, "Alice");

        repo.add_analysis(&alice(), "2024-01-01 10:00:00", scored("1")).unwrap();
        assert_eq!(rx.borrow_and_update()[0].history.len(), 1);
    }

    #[tokio::test]
    async fn subscriber_wakes_on_change() {
        let repo = repo();
        let mut rx = repo.subscribe();

        let waiter = tokio::spawn(async move {
            rx.changed().await.unwrap();
            let names: Vec<String> = rx.borrow().iter().map(|p| p.name.clone()).collect();
            names
        });

        repo.save_profile(&Profile::new("Bob", "41", "Male")).unwrap();
        assert_eq!(waiter.await.unwrap(), vec!["Bob"]);
    }

    #[test]
    fn merge_prefers_incoming() {
        let mut existing = AnalysisHistory::new();
        existing.insert("a".to_string(), scored("1"));
        existing.insert("b".to_string(), scored("2"));
        let mut incoming = AnalysisHistory::new();
        incoming.insert("b".to_string(), scored("3"));

        let merged = merge_history(&existing, &incoming);
        assert_eq!(merged["a"], scored("1"));
        assert_eq!(merged["b"], scored("3"));
    }
}
