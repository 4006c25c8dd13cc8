//! ghfs-core: a GitHub repository as a read-only filesystem.
//!
//! This crate provides:
//!
//! - **client**: the remote object capability (`GitObjectClient`) with a GitHub
//!   transport (`GithubClient`) and an in-memory store (`MemoryObjectStore`)
//! - **vfs**: the filesystem adapter (`GithubFs`) built from a tree cache, a root
//!   tracker, a path resolver and file handles
//! - **config**: repository coordinates, credentials and refresh TTL
//!
//! ```no_run
//! use ghfs_core::{Filesystem, GithubFs, GithubFsConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let fs = GithubFs::new(&GithubFsConfig::from_env()?)?;
//! let about = fs.read("/content/about.md").await?;
//! println!("{}", String::from_utf8_lossy(&about));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod vfs;

pub use client::{GitObjectClient, GithubClient, MemoryObjectStore, RootSnapshot};
pub use config::GithubFsConfig;
pub use ghfs_types::*;
pub use vfs::{
    Filesystem, GithubFs, PathResolver, RefreshOutcome, RootTracker, TreeCache, TreeListing,
    VirtualFile,
};
