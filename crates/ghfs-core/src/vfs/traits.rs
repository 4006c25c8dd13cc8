//! The filesystem capability consumers program against.

use async_trait::async_trait;
use std::time::SystemTime;

use super::file::VirtualFile;
use ghfs_types::{FileInfo, FsError, FsResult, OpenFlags};

/// Abstract filesystem interface.
///
/// Paths are absolute and slash-separated; leading, trailing and repeated
/// slashes are ignored. Mutation entry points exist so consumers written
/// against a writable filesystem can call them; a read-only implementation
/// returns `FsError::ReadOnly` from all of them.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Short name of the implementation.
    fn name(&self) -> &str;

    /// Open a file or directory for reading.
    async fn open(&self, path: &str) -> FsResult<VirtualFile>;

    /// Create (or truncate) a file.
    async fn create(&self, path: &str) -> FsResult<VirtualFile>;

    async fn mkdir(&self, path: &str, mode: u32) -> FsResult<()>;

    async fn mkdir_all(&self, path: &str, mode: u32) -> FsResult<()>;

    async fn remove(&self, path: &str) -> FsResult<()>;

    async fn remove_all(&self, path: &str) -> FsResult<()>;

    async fn rename(&self, from: &str, to: &str) -> FsResult<()>;

    async fn chmod(&self, path: &str, mode: u32) -> FsResult<()>;

    async fn chtimes(&self, path: &str, atime: SystemTime, mtime: SystemTime) -> FsResult<()>;

    /// Returns true if this filesystem is read-only.
    fn read_only(&self) -> bool;

    /// Open with explicit flags.
    ///
    /// A read-only filesystem refuses any write, append, create or truncate flag
    /// before looking the path up.
    async fn open_file(&self, path: &str, flags: OpenFlags) -> FsResult<VirtualFile> {
        if self.read_only() && flags.requests_write() {
            return Err(FsError::ReadOnly);
        }
        self.open(path).await
    }

    /// Metadata for a path.
    async fn stat(&self, path: &str) -> FsResult<FileInfo> {
        Ok(self.open(path).await?.stat())
    }

    /// Check if a path exists.
    async fn exists(&self, path: &str) -> bool {
        self.stat(path).await.is_ok()
    }

    /// Read the entire contents of a file.
    async fn read(&self, path: &str) -> FsResult<Vec<u8>> {
        self.open(path).await?.read_to_end().await
    }

    /// List entries in a directory, in name order.
    async fn read_dir(&self, path: &str) -> FsResult<Vec<FileInfo>> {
        self.open(path).await?.read_dir_entries().await
    }
}
