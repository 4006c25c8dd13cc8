//! `GithubFs`: a repository branch as a read-only filesystem.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::file::VirtualFile;
use super::remote::Remote;
use super::resolver::PathResolver;
use super::root::RootTracker;
use super::traits::Filesystem;
use super::tree_cache::TreeCache;
use crate::client::{GitObjectClient, GithubClient};
use crate::config::GithubFsConfig;
use ghfs_types::{FsError, FsResult, ObjectId, RepoRef};

/// Read-only filesystem over the current head of one branch.
///
/// Every operation resolves against the root id it read when it started, so
/// a branch update racing with a lookup never mixes two snapshots.
#[derive(Debug)]
pub struct GithubFs {
    remote: Remote,
    cache: Arc<TreeCache>,
    roots: RootTracker,
    resolver: PathResolver,
}

impl GithubFs {
    /// Filesystem talking to GitHub with the given configuration.
    pub fn new(config: &GithubFsConfig) -> FsResult<Self> {
        let client = GithubClient::new(config)?;
        Ok(Self::with_client(
            config.repo.clone(),
            Arc::new(client),
            config.root_ttl,
        ))
    }

    /// Filesystem over any object client, e.g. a `MemoryObjectStore`.
    pub fn with_client(repo: RepoRef, client: Arc<dyn GitObjectClient>, root_ttl: Duration) -> Self {
        let remote = Remote::new(repo, client);
        let cache = Arc::new(TreeCache::new(remote.clone()));
        let roots = RootTracker::new(remote.clone(), cache.clone(), root_ttl);
        let resolver = PathResolver::new(cache.clone());
        Self {
            remote,
            cache,
            roots,
            resolver,
        }
    }

    pub fn repo(&self) -> &RepoRef {
        self.remote.repo()
    }

    pub fn tree_cache(&self) -> &TreeCache {
        &self.cache
    }

    pub fn root_tracker(&self) -> &RootTracker {
        &self.roots
    }

    /// The root id operations currently resolve against.
    pub async fn root_id(&self) -> FsResult<ObjectId> {
        self.current_root().await
    }

    /// Load the root if needed, give it a chance to refresh, and snapshot it.
    ///
    /// Only a missing root is fatal. A failed refresh is logged and the last
    /// known root is used.
    async fn current_root(&self) -> FsResult<ObjectId> {
        let loaded = self.roots.ensure_root().await?;
        if let Err(err) = self.roots.maybe_refresh().await {
            tracing::warn!(repo = %self.repo(), error = %err, "root refresh failed, serving stale root");
        }
        Ok(self.roots.current().await.unwrap_or(loaded))
    }
}

#[async_trait]
impl Filesystem for GithubFs {
    fn name(&self) -> &str {
        "GithubFs"
    }

    async fn open(&self, path: &str) -> FsResult<VirtualFile> {
        let root = self.current_root().await?;
        let object = self.resolver.resolve(path, &root).await?;
        tracing::debug!(path = %object.path, id = object.id.short(), kind = %object.kind, "open");
        Ok(VirtualFile::new(object, self.remote.clone(), self.cache.clone()))
    }

    async fn create(&self, _path: &str) -> FsResult<VirtualFile> {
        Err(FsError::ReadOnly)
    }

    async fn mkdir(&self, _path: &str, _mode: u32) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    async fn mkdir_all(&self, _path: &str, _mode: u32) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    async fn remove(&self, _path: &str) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    async fn remove_all(&self, _path: &str) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    async fn rename(&self, _from: &str, _to: &str) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    async fn chmod(&self, _path: &str, _mode: u32) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    async fn chtimes(&self, _path: &str, _atime: SystemTime, _mtime: SystemTime) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    fn read_only(&self) -> bool {
        true
    }
}
