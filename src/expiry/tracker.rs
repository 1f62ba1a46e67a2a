//! Deadline bookkeeping for expiring entries.
//!
//! The tracker maps entry identifiers to absolute deadlines, persists the
//! map as one JSON document rewritten in full on every change, and sweeps
//! expired entries out of the content store. Bookkeeping failures are
//! logged and recovered locally; they never block the primary operation.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::hub::BroadcastHub;
use crate::store::{ContentStore, EntryId, StoreError};

use super::ExpiryOption;

/// On-disk schema of the expiry file
#[derive(Debug, Default, Serialize, Deserialize)]
struct ExpiryFile {
    /// Identifier (`category/name`) to deadline instant
    expirations: HashMap<String, DateTime<Utc>>,
}

/// Tracks per-entry expiration deadlines and sweeps expired entries.
///
/// All mutating operations are serialized by one async mutex, so the
/// persisted file always reflects a consistent snapshot of some ordering of
/// the calls. The tracker owns handles to the content store (to delete
/// expired entries) and the broadcast hub (to announce the deletions).
pub struct ExpirationTracker {
    state_path: PathBuf,
    store: ContentStore,
    hub: BroadcastHub,
    deadlines: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl ExpirationTracker {
    /// Load the tracker from `state_path`.
    ///
    /// A missing file means no deadlines; a malformed file is logged and
    /// treated the same way. Startup never fails on bad expiry state.
    pub async fn load(
        state_path: impl Into<PathBuf>,
        store: ContentStore,
        hub: BroadcastHub,
    ) -> Self {
        let state_path = state_path.into();

        let deadlines = match fs::read_to_string(&state_path).await {
            Ok(content) => match serde_json::from_str::<ExpiryFile>(&content) {
                Ok(file) => file.expirations,
                Err(e) => {
                    tracing::warn!(
                        "Malformed expiry file {}, starting empty: {}",
                        state_path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(
                    "Could not read expiry file {}, starting empty: {}",
                    state_path.display(),
                    e
                );
                HashMap::new()
            }
        };

        if !deadlines.is_empty() {
            tracing::info!("Loaded {} tracked deadline(s)", deadlines.len());
        }

        Self {
            state_path,
            store,
            hub,
            deadlines: Mutex::new(deadlines),
        }
    }

    /// Set or clear the expiration for an entry.
    ///
    /// Options resolving to "no expiry" remove any existing deadline;
    /// everything else sets `now + duration`. The map is persisted before
    /// returning; a persistence failure is logged, not propagated.
    pub async fn set_expiration(&self, id: &EntryId, option: &ExpiryOption) {
        match option.duration() {
            Some(duration) => self.set_deadline(id, Utc::now() + duration).await,
            None => {
                let mut deadlines = self.deadlines.lock().await;
                if deadlines.remove(&id.key()).is_some() {
                    tracing::debug!("Cleared deadline for {}", id);
                }
                self.persist(&deadlines).await;
            }
        }
    }

    /// Set an absolute deadline for an entry
    pub async fn set_deadline(&self, id: &EntryId, deadline: DateTime<Utc>) {
        let mut deadlines = self.deadlines.lock().await;
        deadlines.insert(id.key(), deadline);
        tracing::debug!("Deadline for {} set to {}", id, deadline.to_rfc3339());
        self.persist(&deadlines).await;
    }

    /// The current deadline for an entry, if one is tracked
    pub async fn deadline(&self, id: &EntryId) -> Option<DateTime<Utc>> {
        self.deadlines.lock().await.get(&id.key()).copied()
    }

    /// Drop the deadline for an explicitly deleted entry
    pub async fn remove(&self, id: &EntryId) {
        let mut deadlines = self.deadlines.lock().await;
        if deadlines.remove(&id.key()).is_some() {
            self.persist(&deadlines).await;
        }
    }

    /// Carry a deadline over to a renamed entry.
    ///
    /// Old key out, new key in with the same instant, as one critical
    /// section; the total number of tracked deadlines is unchanged.
    pub async fn rename(&self, old: &EntryId, new: &EntryId) {
        let mut deadlines = self.deadlines.lock().await;
        if let Some(deadline) = deadlines.remove(&old.key()) {
            deadlines.insert(new.key(), deadline);
            self.persist(&deadlines).await;
        }
    }

    /// Number of tracked deadlines
    pub async fn tracked(&self) -> usize {
        self.deadlines.lock().await.len()
    }

    /// Delete every entry whose deadline has passed.
    ///
    /// Expired entries are removed from the content store (an already-absent
    /// entry counts as deleted) and dropped from the map. When anything was
    /// removed the map is persisted and subscribers are notified; otherwise
    /// this is a no-op that does not rewrite the file. Returns the removed
    /// identifiers.
    pub async fn cleanup_expired(&self) -> Vec<EntryId> {
        let now = Utc::now();
        let mut deadlines = self.deadlines.lock().await;

        let expired: Vec<String> = deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();

        if expired.is_empty() {
            return Vec::new();
        }

        let mut removed = Vec::new();
        for key in expired {
            match key.parse::<EntryId>() {
                Ok(id) => {
                    match self.store.delete(&id).await {
                        Ok(()) => tracing::info!("Expired entry {} deleted", id),
                        Err(StoreError::NotFound(_)) => {
                            tracing::debug!("Expired entry {} already gone", id);
                        }
                        Err(e) => {
                            tracing::warn!("Could not delete expired entry {}: {}", id, e);
                        }
                    }
                    removed.push(id);
                }
                Err(e) => {
                    // Stale key that no longer maps to an entry; drop it.
                    tracing::warn!("Dropping unparseable expiry key {:?}: {}", key, e);
                }
            }
            deadlines.remove(&key);
        }

        self.persist(&deadlines).await;
        drop(deadlines);

        self.hub.notify();
        removed
    }

    /// Rewrite the persisted expiry file from the in-memory map. On failure
    /// the map stays the source of truth; the next mutation tries again.
    async fn persist(&self, deadlines: &HashMap<String, DateTime<Utc>>) {
        let file = ExpiryFile {
            expirations: deadlines.clone(),
        };

        let json = match serde_json::to_string_pretty(&file) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Could not serialize expiry state: {}", e);
                return;
            }
        };

        if let Err(e) = fs::write(&self.state_path, json).await {
            tracing::error!(
                "Could not persist expiry state to {}: {}",
                self.state_path.display(),
                e
            );
        }
    }
}
