//! The repository-bound view of a `GitObjectClient`.

use std::fmt;
use std::sync::Arc;

use crate::client::{GitObjectClient, RootSnapshot};
use ghfs_types::{ClientError, ObjectId, RepoRef, TreeEntry};

/// A client plus the repository it is asked about.
///
/// Cloning is cheap; every component of the filesystem holds one.
#[derive(Clone)]
pub(crate) struct Remote {
    repo: RepoRef,
    client: Arc<dyn GitObjectClient>,
}

impl Remote {
    pub(crate) fn new(repo: RepoRef, client: Arc<dyn GitObjectClient>) -> Self {
        Self { repo, client }
    }

    pub(crate) fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub(crate) async fn tree(&self, id: &ObjectId) -> Result<Vec<TreeEntry>, ClientError> {
        tracing::debug!(tree = id.short(), "remote tree fetch");
        let res = self.client.fetch_tree(&self.repo, id).await;
        note_rate_limit(&res, "tree", id.as_str());
        res
    }

    pub(crate) async fn blob(&self, id: &ObjectId) -> Result<Vec<u8>, ClientError> {
        tracing::debug!(blob = id.short(), "remote blob fetch");
        let res = self.client.fetch_blob(&self.repo, id).await;
        note_rate_limit(&res, "blob", id.as_str());
        res
    }

    pub(crate) async fn root(&self, with_entries: bool) -> Result<RootSnapshot, ClientError> {
        tracing::debug!(repo = %self.repo, with_entries, "remote root fetch");
        let res = self.client.fetch_root(&self.repo, with_entries).await;
        note_rate_limit(&res, "root", &self.repo.to_string());
        res
    }
}

impl fmt::Debug for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remote").field("repo", &self.repo).finish_non_exhaustive()
    }
}

/// Rate limiting is not retried here, only made visible to operators.
fn note_rate_limit<T>(res: &Result<T, ClientError>, what: &str, object: &str) {
    if let Err(ClientError::RateLimited { reset_at }) = res {
        tracing::warn!(what, object, ?reset_at, "github rate limit reached");
    }
}
