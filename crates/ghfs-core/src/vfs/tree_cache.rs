//! Shared cache of tree listings keyed by tree id.
//!
//! A tree id names immutable content, so a listing never goes stale and is
//! kept for the life of the process. Concurrent misses for the same id may
//! both fetch; whichever insert lands last wins, and both results are equal.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::remote::Remote;
use ghfs_types::{ClientError, ObjectId, TreeEntry};

/// Children of one tree, ordered by name.
///
/// Entries carry no path: two directories with identical content share one
/// listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeListing {
    tree_id: ObjectId,
    entries: BTreeMap<String, TreeEntry>,
}

impl TreeListing {
    pub fn new(tree_id: ObjectId, entries: Vec<TreeEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();
        Self { tree_id, entries }
    }

    /// Id of the tree this listing was fetched for.
    pub fn tree_id(&self) -> &ObjectId {
        &self.tree_id
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Concurrency-safe map from tree id to listing.
#[derive(Debug)]
pub struct TreeCache {
    remote: Remote,
    trees: RwLock<HashMap<ObjectId, Arc<TreeListing>>>,
}

impl TreeCache {
    pub(crate) fn new(remote: Remote) -> Self {
        Self {
            remote,
            trees: RwLock::new(HashMap::new()),
        }
    }

    /// Listing for `id`, fetching it on a miss.
    pub async fn get_tree(&self, id: &ObjectId) -> Result<Arc<TreeListing>, ClientError> {
        if let Some(listing) = self.lookup(id).await {
            return Ok(listing);
        }

        tracing::debug!(tree = id.short(), "tree cache miss");
        let entries = self.remote.tree(id).await?;
        Ok(self.insert(id.clone(), entries).await)
    }

    /// Store a listing obtained elsewhere, e.g. alongside the root id.
    pub async fn insert(&self, id: ObjectId, entries: Vec<TreeEntry>) -> Arc<TreeListing> {
        let listing = Arc::new(TreeListing::new(id.clone(), entries));
        self.trees.write().await.insert(id, Arc::clone(&listing));
        listing
    }

    /// Drop the listing for `id`. Returns whether one was cached.
    pub async fn evict(&self, id: &ObjectId) -> bool {
        self.trees.write().await.remove(id).is_some()
    }

    pub async fn contains(&self, id: &ObjectId) -> bool {
        self.trees.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.trees.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.trees.read().await.is_empty()
    }

    /// Cached listing for `id`, or `None` on a miss.
    ///
    /// A listing stored under the wrong key is evicted and treated as a miss.
    async fn lookup(&self, id: &ObjectId) -> Option<Arc<TreeListing>> {
        let hit = self.trees.read().await.get(id).cloned()?;
        if hit.tree_id() == id {
            return Some(hit);
        }

        tracing::warn!(
            key = id.short(),
            found = hit.tree_id().short(),
            "evicting corrupt tree cache entry"
        );
        let mut trees = self.trees.write().await;
        // Only drop the entry we inspected; a concurrent refetch may have replaced it.
        if trees.get(id).is_some_and(|current| Arc::ptr_eq(current, &hit)) {
            trees.remove(id);
        }
        None
    }

    #[cfg(test)]
    pub(crate) async fn insert_raw(&self, key: ObjectId, listing: TreeListing) {
        self.trees.write().await.insert(key, Arc::new(listing));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{GitObjectClient, MemoryObjectStore};
    use ghfs_types::RepoRef;

    async fn setup() -> (Arc<MemoryObjectStore>, TreeCache, ObjectId) {
        let store = Arc::new(MemoryObjectStore::new());
        let about = store.blob_entry("about.md", vec![b'x'; 42]).await;
        let content = store.tree_entry("content", vec![about]).await.unwrap();
        let root = store.put_tree(vec![content]).await.unwrap();
        let remote = Remote::new(RepoRef::new("octo", "site"), store.clone());
        (store, TreeCache::new(remote), root)
    }

    #[test]
    fn test_listing_is_name_ordered() {
        let listing = TreeListing::new(
            ObjectId::from("t"),
            vec![
                TreeEntry::blob("zeta", "z", 1),
                TreeEntry::tree("alpha", "a"),
                TreeEntry::blob("mid", "m", 2),
            ],
        );
        assert_eq!(listing.names().collect::<Vec<_>>(), vec!["alpha", "mid", "zeta"]);
        assert_eq!(listing.len(), 3);
        assert_eq!(listing.get("mid").map(|e| e.size), Some(2));
        assert!(listing.get("nope").is_none());
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let (store, cache, root) = setup().await;

        let first = cache.get_tree(&root).await.unwrap();
        assert_eq!(store.tree_fetches(), 1);
        assert!(cache.contains(&root).await);

        let second = cache.get_tree(&root).await.unwrap();
        assert_eq!(store.tree_fetches(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_seeded_listing_is_a_hit() {
        let (store, cache, root) = setup().await;
        let entries = store.fetch_tree(&RepoRef::new("octo", "site"), &root).await.unwrap();
        cache.insert(root.clone(), entries).await;
        let before = store.tree_fetches();

        let listing = cache.get_tree(&root).await.unwrap();
        assert!(listing.get("content").is_some());
        assert_eq!(store.tree_fetches(), before);
    }

    #[tokio::test]
    async fn test_missing_tree_is_not_cached() {
        let (store, cache, _) = setup().await;
        let ghost = ObjectId::from("0000000000000000000000000000000000000000");

        assert!(matches!(
            cache.get_tree(&ghost).await,
            Err(ClientError::NotFound { .. })
        ));
        assert!(cache.is_empty().await);
        let _ = cache.get_tree(&ghost).await;
        assert_eq!(store.tree_fetches(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_evicted_and_refetched() {
        let (store, cache, root) = setup().await;
        let bogus = TreeListing::new(ObjectId::from("somethingelse"), vec![]);
        cache.insert_raw(root.clone(), bogus).await;

        let listing = cache.get_tree(&root).await.unwrap();
        assert_eq!(listing.tree_id(), &root);
        assert!(listing.get("content").is_some());
        assert_eq!(store.tree_fetches(), 1);

        // healed: the next lookup is a plain hit
        cache.get_tree(&root).await.unwrap();
        assert_eq!(store.tree_fetches(), 1);
    }

    #[tokio::test]
    async fn test_evict() {
        let (store, cache, root) = setup().await;
        cache.get_tree(&root).await.unwrap();
        assert!(cache.evict(&root).await);
        assert!(!cache.evict(&root).await);

        cache.get_tree(&root).await.unwrap();
        assert_eq!(store.tree_fetches(), 2);
        assert_eq!(cache.len().await, 1);
    }
}
