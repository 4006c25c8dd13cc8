//! Open file handles.
//!
//! A handle wraps one resolved object. Blobs buffer their full content on
//! first read; trees borrow their listing from the shared tree cache. Every
//! mutation fails with `ReadOnly`.

use std::io::SeekFrom;
use std::sync::Arc;
use std::time::SystemTime;

use super::remote::Remote;
use super::tree_cache::{TreeCache, TreeListing};
use ghfs_types::{FileInfo, FsError, FsResult, ObjectKind, ObjectRef};

/// Per-kind handle state.
#[derive(Debug)]
enum Body {
    Tree {
        listing: Option<Arc<TreeListing>>,
    },
    Blob {
        content: Option<Vec<u8>>,
        pos: u64,
    },
}

/// Handle returned by `open`. Not shared between opens.
#[derive(Debug)]
pub struct VirtualFile {
    object: ObjectRef,
    body: Body,
    remote: Remote,
    cache: Arc<TreeCache>,
}

impl VirtualFile {
    pub(crate) fn new(object: ObjectRef, remote: Remote, cache: Arc<TreeCache>) -> Self {
        let body = match object.kind {
            ObjectKind::Tree => Body::Tree { listing: None },
            ObjectKind::Blob => Body::Blob {
                content: None,
                pos: 0,
            },
        };
        Self {
            object,
            body,
            remote,
            cache,
        }
    }

    /// The object this handle was opened on.
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// Full logical path.
    pub fn path(&self) -> &str {
        &self.object.path
    }

    /// Last path segment, `/` for the root.
    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn is_dir(&self) -> bool {
        self.object.is_tree()
    }

    pub fn stat(&self) -> FileInfo {
        FileInfo::from(&self.object)
    }

    // ========================================================================
    // Blob reads
    // ========================================================================

    /// Read from the cursor into `buf`, advancing the cursor. Returns 0 at end of file.
    pub async fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        self.load_content().await?;
        let Body::Blob {
            content: Some(content),
            pos,
        } = &mut self.body
        else {
            return Err(FsError::IsDirectory(self.object.path.clone()));
        };
        let n = copy_at(content, *pos, buf);
        *pos += n as u64;
        Ok(n)
    }

    /// Read at `offset` without moving the cursor.
    pub async fn read_at(&mut self, buf: &mut [u8], offset: u64) -> FsResult<usize> {
        let content = self.load_content().await?;
        Ok(copy_at(content, offset, buf))
    }

    /// Move the cursor. Positions past the end are allowed; before 0 is not.
    pub async fn seek(&mut self, from: SeekFrom) -> FsResult<u64> {
        let len = self.load_content().await?.len() as u64;
        let Body::Blob { pos, .. } = &mut self.body else {
            return Err(FsError::IsDirectory(self.object.path.clone()));
        };

        let target = match from {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => pos.checked_add_signed(delta),
            SeekFrom::End(delta) => len.checked_add_signed(delta),
        };
        let Some(target) = target else {
            return Err(FsError::InvalidArgument(format!(
                "seek before start of {}",
                self.object.path
            )));
        };
        *pos = target;
        Ok(target)
    }

    /// Everything from the cursor to the end; leaves the cursor at the end.
    pub async fn read_to_end(&mut self) -> FsResult<Vec<u8>> {
        self.load_content().await?;
        let Body::Blob {
            content: Some(content),
            pos,
        } = &mut self.body
        else {
            return Err(FsError::IsDirectory(self.object.path.clone()));
        };
        let start = usize::try_from(*pos).unwrap_or(usize::MAX).min(content.len());
        let rest = content[start..].to_vec();
        *pos = (*pos).max(content.len() as u64);
        Ok(rest)
    }

    /// Fetch the blob content on first use.
    async fn load_content(&mut self) -> FsResult<&[u8]> {
        let Body::Blob { content, .. } = &mut self.body else {
            return Err(FsError::IsDirectory(self.object.path.clone()));
        };
        if content.is_none() {
            let bytes = self
                .remote
                .blob(&self.object.id)
                .await
                .map_err(|err| FsError::from_client(err, &self.object.path))?;
            *content = Some(bytes);
        }
        Ok(content.as_deref().unwrap_or_default())
    }

    // ========================================================================
    // Tree reads
    // ========================================================================

    /// Children of this directory, in name order.
    pub async fn read_dir_entries(&mut self) -> FsResult<Vec<FileInfo>> {
        let listing = self.load_listing().await?;
        let parent = &self.object.path;
        Ok(listing
            .iter()
            .map(|entry| FileInfo::from(&entry.to_ref(parent)))
            .collect())
    }

    /// Names of this directory's children, in name order.
    pub async fn read_dir_names(&mut self) -> FsResult<Vec<String>> {
        let listing = self.load_listing().await?;
        Ok(listing.names().map(str::to_string).collect())
    }

    async fn load_listing(&mut self) -> FsResult<Arc<TreeListing>> {
        let Body::Tree { listing } = &mut self.body else {
            return Err(FsError::NotADirectory(self.object.path.clone()));
        };
        if let Some(listing) = listing.as_ref() {
            return Ok(Arc::clone(listing));
        }
        let fetched = self
            .cache
            .get_tree(&self.object.id)
            .await
            .map_err(|err| FsError::from_client(err, &self.object.path))?;
        *listing = Some(Arc::clone(&fetched));
        Ok(fetched)
    }

    // ========================================================================
    // Lifecycle and rejected mutations
    // ========================================================================

    pub async fn sync(&self) -> FsResult<()> {
        Ok(())
    }

    /// Content is immutable and already cached, so there is nothing to release.
    pub async fn close(self) -> FsResult<()> {
        Ok(())
    }

    pub async fn write(&mut self, _buf: &[u8]) -> FsResult<usize> {
        Err(FsError::ReadOnly)
    }

    pub async fn write_at(&mut self, _buf: &[u8], _offset: u64) -> FsResult<usize> {
        Err(FsError::ReadOnly)
    }

    pub async fn write_string(&mut self, _s: &str) -> FsResult<usize> {
        Err(FsError::ReadOnly)
    }

    pub async fn truncate(&mut self, _size: u64) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    pub async fn chmod(&mut self, _mode: u32) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    pub async fn chtimes(&mut self, _atime: SystemTime, _mtime: SystemTime) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }
}

/// Copy `content[offset..]` into `buf`; 0 when `offset` is at or past the end.
fn copy_at(content: &[u8], offset: u64, buf: &mut [u8]) -> usize {
    let Ok(start) = usize::try_from(offset) else {
        return 0;
    };
    let Some(rest) = content.get(start..) else {
        return 0;
    };
    let n = rest.len().min(buf.len());
    buf[..n].copy_from_slice(&rest[..n]);
    n
}
