//! Read-only virtual filesystem over git objects.
//!
//! An `open` walks through these parts:
//!
//! - **RootTracker**: current root tree id of the branch, re-checked at most once per TTL
//! - **PathResolver**: walks path segments from that root
//! - **TreeCache**: tree listings keyed by immutable tree id, shared by all lookups
//! - **VirtualFile**: the handle; buffered bytes for blobs, a listing for trees
//!
//! ```text
//! GithubFs::open("/content/about.md")
//! ├── RootTracker::ensure_root / maybe_refresh   -> root id R
//! ├── PathResolver::resolve(path, R)
//! │   ├── TreeCache::get_tree(R)        "content" -> tree C
//! │   └── TreeCache::get_tree(C)        "about.md" -> blob B
//! └── VirtualFile { B, "/content/about.md" }
//! ```
//!
//! Objects are immutable once fetched, so the only coordination is around the
//! root id.

mod file;
mod github_fs;
mod remote;
mod resolver;
mod root;
mod traits;
mod tree_cache;

pub use file::VirtualFile;
pub use github_fs::GithubFs;
pub use resolver::PathResolver;
pub use root::{RefreshOutcome, RootTracker};
pub use traits::Filesystem;
pub use tree_cache::{TreeCache, TreeListing};
