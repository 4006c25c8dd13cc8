//! Tracking the root tree of the followed branch.
//!
//! The root id is the only mutable state of the filesystem. It is loaded on
//! first use and re-checked at most once per TTL window. The window is claimed
//! with a compare-and-swap on the last-refresh timestamp before the remote
//! call, so a thundering herd at expiry produces exactly one root fetch and
//! nobody waits for it: losers keep using the root they already have.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::remote::Remote;
use super::tree_cache::TreeCache;
use crate::client::RootSnapshot;
use ghfs_types::{ClientError, ObjectId};

/// What a call to [`RootTracker::maybe_refresh`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Still inside the TTL window; nothing fetched.
    Fresh,
    /// Another caller claimed this window's refresh.
    InFlightElsewhere,
    /// Refreshed; the branch still points at the same tree.
    Unchanged,
    /// Refreshed; the branch moved to this tree.
    Advanced(ObjectId),
    /// A later window's refresh claimed the root while this one was in flight,
    /// so this result was dropped.
    Superseded,
}

#[derive(Debug)]
pub struct RootTracker {
    remote: Remote,
    cache: Arc<TreeCache>,
    ttl: Duration,
    root: RwLock<Option<ObjectId>>,
    /// Serializes the very first load.
    init: Mutex<()>,
    epoch: Instant,
    /// Nanoseconds since `epoch` of the last refresh attempt, plus one. Zero means never.
    last_refreshed: AtomicU64,
}

impl RootTracker {
    pub(crate) fn new(remote: Remote, cache: Arc<TreeCache>, ttl: Duration) -> Self {
        Self {
            remote,
            cache,
            ttl,
            root: RwLock::new(None),
            init: Mutex::new(()),
            epoch: Instant::now(),
            last_refreshed: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The root id, if one has been loaded.
    pub async fn current(&self) -> Option<ObjectId> {
        self.root.read().await.clone()
    }

    /// The root id, loading it from the remote if this is the first call.
    ///
    /// The first load also seeds the tree cache with the root listing.
    pub async fn ensure_root(&self) -> Result<ObjectId, ClientError> {
        if let Some(id) = self.current().await {
            return Ok(id);
        }

        let _guard = self.init.lock().await;
        if let Some(id) = self.current().await {
            return Ok(id);
        }

        let RootSnapshot { tree_id, entries } = self.remote.root(true).await?;
        if let Some(entries) = entries {
            self.cache.insert(tree_id.clone(), entries).await;
        }
        *self.root.write().await = Some(tree_id.clone());
        self.last_refreshed.store(self.stamp(), Ordering::Release);

        tracing::info!(repo = %self.remote.repo(), root = tree_id.short(), "root loaded");
        Ok(tree_id)
    }

    /// Re-check the branch head if the TTL has expired.
    ///
    /// Cheap enough to call on every operation. On failure the previous root
    /// stays in place and the error goes to this caller only; the window is
    /// still consumed, so the next attempt waits for the following expiry.
    pub async fn maybe_refresh(&self) -> Result<RefreshOutcome, ClientError> {
        let last = self.last_refreshed.load(Ordering::Acquire);
        if last == 0 {
            self.ensure_root().await?;
            return Ok(RefreshOutcome::Fresh);
        }

        let now = self.stamp();
        if Duration::from_nanos(now.saturating_sub(last)) <= self.ttl {
            return Ok(RefreshOutcome::Fresh);
        }
        if self
            .last_refreshed
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(RefreshOutcome::InFlightElsewhere);
        }

        let snapshot = self.remote.root(false).await?;
        let previous = {
            let mut root = self.root.write().await;
            // A newer window was claimed while this fetch was outstanding; its
            // result is at least as recent as ours.
            if self.last_refreshed.load(Ordering::Acquire) != now {
                tracing::debug!(root = snapshot.tree_id.short(), "stale refresh result dropped");
                return Ok(RefreshOutcome::Superseded);
            }
            root.replace(snapshot.tree_id.clone())
        };

        if previous.as_ref() == Some(&snapshot.tree_id) {
            tracing::debug!(root = snapshot.tree_id.short(), "root unchanged");
            return Ok(RefreshOutcome::Unchanged);
        }
        tracing::info!(
            repo = %self.remote.repo(),
            from = previous.as_ref().map(ObjectId::short),
            to = snapshot.tree_id.short(),
            "root advanced"
        );
        Ok(RefreshOutcome::Advanced(snapshot.tree_id))
    }

    fn stamp(&self) -> u64 {
        let nanos = u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
        nanos.saturating_add(1)
    }
}
