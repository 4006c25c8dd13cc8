//! In-memory object store.
//!
//! Used for tests and offline runs. Objects are addressed by their real git
//! object ids, so identical content always lands under the same id.

use async_trait::async_trait;
use sha1::{Digest, Sha1};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use super::traits::{GitObjectClient, RootSnapshot};
use ghfs_types::{ClientError, FsError, FsResult, ObjectId, ObjectKind, RepoRef, TreeEntry};

/// Object stored in memory.
#[derive(Debug, Clone)]
enum Object {
    Tree(Vec<TreeEntry>),
    Blob(Vec<u8>),
}

/// In-memory `GitObjectClient`.
///
/// Thread-safe via internal `RwLock`. Counts every fetch so callers can check
/// how often the remote side was actually consulted.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, Object>>,
    /// Branch name → root tree id. `None` is the default branch.
    roots: RwLock<HashMap<Option<String>, ObjectId>>,
    /// Errors returned by the next root fetches, in order.
    root_failures: Mutex<VecDeque<ClientError>>,
    latency: RwLock<Option<Duration>>,
    tree_fetches: AtomicUsize,
    blob_fetches: AtomicUsize,
    root_fetches: AtomicUsize,
}

impl MemoryObjectStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob, returning its git id.
    pub async fn put_blob(&self, data: impl Into<Vec<u8>>) -> ObjectId {
        let data = data.into();
        let id = git_object_id("blob", &data);
        self.objects.write().await.insert(id.clone(), Object::Blob(data));
        id
    }

    /// Store a tree, returning its git id.
    ///
    /// Entries are kept in git order; duplicate names are the caller's problem.
    /// Every entry id must be a full 40-digit hex git id, otherwise the tree
    /// has no well-defined id and `InvalidArgument` is returned.
    pub async fn put_tree(&self, mut entries: Vec<TreeEntry>) -> FsResult<ObjectId> {
        entries.sort_by_key(git_sort_key);
        let id = git_object_id("tree", &encode_tree(&entries)?);
        self.objects.write().await.insert(id.clone(), Object::Tree(entries));
        Ok(id)
    }

    /// Store a blob and return the tree entry naming it.
    pub async fn blob_entry(&self, name: &str, data: impl Into<Vec<u8>>) -> TreeEntry {
        let data = data.into();
        let size = data.len() as u64;
        TreeEntry::blob(name, self.put_blob(data).await, size)
    }

    /// Store a tree and return the tree entry naming it.
    pub async fn tree_entry(&self, name: &str, entries: Vec<TreeEntry>) -> FsResult<TreeEntry> {
        Ok(TreeEntry::tree(name, self.put_tree(entries).await?))
    }

    /// Point a branch at a root tree. `None` moves the default branch.
    pub async fn set_root(&self, branch: Option<&str>, tree: ObjectId) {
        self.roots
            .write()
            .await
            .insert(branch.map(str::to_string), tree);
    }

    /// Drop an object, as if it had vanished upstream.
    pub async fn remove(&self, id: &ObjectId) -> bool {
        self.objects.write().await.remove(id).is_some()
    }

    /// Make the next root fetch fail with `err`. Calls queue up.
    pub async fn fail_next_root(&self, err: ClientError) {
        self.root_failures.lock().await.push_back(err);
    }

    /// Delay every fetch by `latency` (observes tokio's clock, so paused tests stay fast).
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = Some(latency);
    }

    pub fn tree_fetches(&self) -> usize {
        self.tree_fetches.load(Ordering::SeqCst)
    }

    pub fn blob_fetches(&self) -> usize {
        self.blob_fetches.load(Ordering::SeqCst)
    }

    pub fn root_fetches(&self) -> usize {
        self.root_fetches.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn tree(&self, id: &ObjectId) -> Result<Vec<TreeEntry>, ClientError> {
        match self.objects.read().await.get(id) {
            Some(Object::Tree(entries)) => Ok(entries.clone()),
            Some(Object::Blob(_)) | None => Err(ClientError::not_found(id)),
        }
    }
}

#[async_trait]
impl GitObjectClient for MemoryObjectStore {
    async fn fetch_tree(&self, _repo: &RepoRef, id: &ObjectId) -> Result<Vec<TreeEntry>, ClientError> {
        self.tree_fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.tree(id).await
    }

    async fn fetch_blob(&self, _repo: &RepoRef, id: &ObjectId) -> Result<Vec<u8>, ClientError> {
        self.blob_fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        match self.objects.read().await.get(id) {
            Some(Object::Blob(data)) => Ok(data.clone()),
            Some(Object::Tree(_)) | None => Err(ClientError::not_found(id)),
        }
    }

    async fn fetch_root(&self, repo: &RepoRef, with_entries: bool) -> Result<RootSnapshot, ClientError> {
        self.root_fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if let Some(err) = self.root_failures.lock().await.pop_front() {
            return Err(err);
        }

        let tree_id = self
            .roots
            .read()
            .await
            .get(&repo.branch)
            .cloned()
            .ok_or_else(|| ClientError::NotFound { id: repo.to_string() })?;

        let entries = if with_entries {
            Some(self.tree(&tree_id).await?)
        } else {
            None
        };
        Ok(RootSnapshot { tree_id, entries })
    }
}

/// Git's object id: SHA-1 over `"<kind> <len>\0<body>"`.
fn git_object_id(kind: &str, body: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(format!("{} {}\0", kind, body.len()).as_bytes());
    hasher.update(body);
    ObjectId::new(hex::encode(hasher.finalize()))
}

/// Git tree body: `"<mode> <name>\0<20 raw id bytes>"` per entry.
fn encode_tree(entries: &[TreeEntry]) -> FsResult<Vec<u8>> {
    let mut body = Vec::new();
    for entry in entries {
        let mode = match entry.kind {
            ObjectKind::Tree => "40000",
            ObjectKind::Blob => "100644",
        };
        body.extend_from_slice(format!("{} {}\0", mode, entry.name).as_bytes());
        body.extend_from_slice(&raw_id(&entry.id)?);
    }
    Ok(body)
}

/// The 20 raw bytes of a hex git id.
fn raw_id(id: &ObjectId) -> FsResult<Vec<u8>> {
    match hex::decode(id.as_str()) {
        Ok(raw) if raw.len() == 20 => Ok(raw),
        _ => Err(FsError::InvalidArgument(format!("not a git object id: {}", id))),
    }
}

/// Git sorts tree entries as if directory names ended in `/`.
fn git_sort_key(entry: &TreeEntry) -> Vec<u8> {
    let mut key = entry.name.as_bytes().to_vec();
    if entry.kind == ObjectKind::Tree {
        key.push(b'/');
    }
    key
}
