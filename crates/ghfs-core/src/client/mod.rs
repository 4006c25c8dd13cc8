//! Remote object clients.
//!
//! The filesystem only ever needs three capabilities from the remote side:
//!
//! - fetch a tree listing by object id
//! - fetch a blob's raw bytes by object id
//! - fetch the current root tree id of the tracked branch
//!
//! ```text
//! GitObjectClient
//! ├── GithubClient       # REST for trees/blobs, GraphQL for the branch root
//! └── MemoryObjectStore  # in-process objects with real git ids (tests, offline)
//! ```
//!
//! Timeouts and retries belong to the client; the filesystem passes errors through.

mod github;
mod memory;
mod traits;

pub use github::GithubClient;
pub use memory::MemoryObjectStore;
pub use traits::{GitObjectClient, RootSnapshot};
