//! Composition root wiring the store, expiration tracker and broadcast hub.
//!
//! Every mutation runs resolver → store → tracker → hub, so subscribers are
//! told whenever visible state changes. Listing sweeps synchronously first,
//! so a client reloading between ticks never sees already-expired content.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::ResolvedConfig;
use crate::expiry::{ExpirationTracker, ExpiryOption};
use crate::hub::{BroadcastHub, Subscription};
use crate::store::{Category, ContentStore, EntryId, EntryInfo};

/// The assembled content service.
///
/// Owns the content store, the expiration tracker and the broadcast hub;
/// front ends (CLI, HTTP collaborators) only go through this API.
pub struct Service {
    store: ContentStore,
    tracker: Arc<ExpirationTracker>,
    hub: BroadcastHub,
}

impl Service {
    /// Assemble a service from resolved configuration
    pub async fn open(config: &ResolvedConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.home)
            .await
            .with_context(|| format!("Failed to create home directory: {}", config.home.display()))?;

        let store = ContentStore::open(&config.data)
            .await
            .with_context(|| format!("Failed to open data directory: {}", config.data.display()))?;

        let hub = BroadcastHub::new();
        let tracker = Arc::new(
            ExpirationTracker::load(config.expiry_path(), store.clone(), hub.clone()).await,
        );

        Ok(Self {
            store,
            tracker,
            hub,
        })
    }

    /// Assemble a service over explicit parts (tests, embedders)
    pub fn from_parts(
        store: ContentStore,
        tracker: Arc<ExpirationTracker>,
        hub: BroadcastHub,
    ) -> Self {
        Self {
            store,
            tracker,
            hub,
        }
    }

    /// The expiration tracker, shared with the sweep scheduler
    pub fn tracker(&self) -> Arc<ExpirationTracker> {
        self.tracker.clone()
    }

    /// The broadcast hub
    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Open a live-update subscription
    pub fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }

    /// Store new content in a directory-backed category.
    ///
    /// The requested name is sanitized and de-collided; the entry ends up
    /// under the returned identifier.
    pub async fn add(
        &self,
        category: Category,
        requested_name: &str,
        bytes: &[u8],
        expiry: &ExpiryOption,
    ) -> Result<EntryId> {
        let id = self.store.create(category, requested_name, bytes).await?;
        self.tracker.set_expiration(&id, expiry).await;
        self.hub.notify();

        tracing::info!("Stored {}", id);
        Ok(id)
    }

    /// Append a link entry
    pub async fn add_link(&self, value: &str, expiry: &ExpiryOption) -> Result<EntryId> {
        let id = self.store.append_link(value).await?;
        self.tracker.set_expiration(&id, expiry).await;
        self.hub.notify();

        tracing::info!("Stored {}", id);
        Ok(id)
    }

    /// Read an entry's bytes
    pub async fn read(&self, id: &EntryId) -> Result<Vec<u8>> {
        Ok(self.store.read(id).await?)
    }

    /// List a category, sweeping expired entries first.
    ///
    /// Rows carry the entry deadline when one is tracked.
    pub async fn list(&self, category: Category) -> Result<Vec<EntryInfo>> {
        self.tracker.cleanup_expired().await;

        let mut rows = Vec::new();
        for name in self.store.list(category).await? {
            let id = EntryId::new(category, name);
            let expires_at = self.tracker.deadline(&id).await;
            rows.push(EntryInfo { id, expires_at });
        }

        Ok(rows)
    }

    /// Delete an entry and its deadline. The deletion itself must succeed;
    /// bookkeeping runs after.
    pub async fn delete(&self, id: &EntryId) -> Result<()> {
        self.store.delete(id).await?;
        self.tracker.remove(id).await;
        self.hub.notify();

        tracing::info!("Deleted {}", id);
        Ok(())
    }

    /// Rename an entry, carrying any deadline over to the new identifier
    pub async fn rename(&self, id: &EntryId, requested_name: &str) -> Result<EntryId> {
        let new_id = self.store.rename(id, requested_name).await?;
        self.tracker.rename(id, &new_id).await;
        self.hub.notify();

        tracing::info!("Renamed {} -> {}", id, new_id);
        Ok(new_id)
    }

    /// Set or clear an entry's expiration. The entry must exist.
    pub async fn set_expiration(&self, id: &EntryId, option: &ExpiryOption) -> Result<()> {
        if !self.store.exists(id).await? {
            return Err(crate::store::StoreError::NotFound(id.clone()).into());
        }

        self.tracker.set_expiration(id, option).await;
        self.hub.notify();
        Ok(())
    }

    /// Run one sweep, returning the removed identifiers
    pub async fn sweep(&self) -> Vec<EntryId> {
        self.tracker.cleanup_expired().await
    }
}
