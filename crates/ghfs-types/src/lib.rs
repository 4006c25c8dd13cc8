//! ghfs-types: pure data types shared across ghfs crates.
//!
//! Nothing in here does I/O. The types describe:
//!
//! - **Objects**: content-addressed git trees and blobs (`ObjectId`, `ObjectRef`, `TreeEntry`)
//! - **File metadata**: what `stat` and directory listings return (`FileInfo`)
//! - **Repository coordinates**: `owner/name` plus an optional branch (`RepoRef`)
//! - **Errors**: the filesystem taxonomy (`FsError`) and the remote client's (`ClientError`)

mod error;
mod info;
mod object;
mod repo;

pub use error::{ClientError, FsError, FsResult};
pub use info::{FileInfo, OpenFlags};
pub use object::{ObjectId, ObjectKind, ObjectRef, TreeEntry};
pub use repo::RepoRef;
