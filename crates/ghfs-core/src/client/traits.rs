//! The remote object capability.

use async_trait::async_trait;
use ghfs_types::{ClientError, ObjectId, RepoRef, TreeEntry};

/// Where the tracked branch currently points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSnapshot {
    /// Id of the root tree of the branch head commit.
    pub tree_id: ObjectId,
    /// Children of the root tree, when the client fetched them in the same round trip.
    pub entries: Option<Vec<TreeEntry>>,
}

/// Abstract access to immutable git objects of one hosted repository.
///
/// Implementations report failures as `NotFound`, `RateLimited` or `Transport`.
/// They must be cheap to share: the filesystem holds one behind an `Arc` and
/// calls it from many tasks at once.
#[async_trait]
pub trait GitObjectClient: Send + Sync {
    /// List the direct children of the tree `id`.
    async fn fetch_tree(&self, repo: &RepoRef, id: &ObjectId) -> Result<Vec<TreeEntry>, ClientError>;

    /// Fetch the full content of the blob `id`.
    async fn fetch_blob(&self, repo: &RepoRef, id: &ObjectId) -> Result<Vec<u8>, ClientError>;

    /// Resolve the tracked branch to its current root tree.
    ///
    /// When `with_entries` is set the client may include the root's children,
    /// saving a separate `fetch_tree` for the first directory walk.
    async fn fetch_root(&self, repo: &RepoRef, with_entries: bool) -> Result<RootSnapshot, ClientError>;
}
