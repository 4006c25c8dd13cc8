//! Path resolution against a root snapshot.

use std::sync::Arc;

use super::tree_cache::TreeCache;
use ghfs_types::{FsError, FsResult, ObjectId, ObjectRef};

/// Walks a slash-separated path from a root tree down through the tree cache.
///
/// Resolution never touches the root tracker: the caller hands in the root id
/// it read, and every segment is resolved against that one snapshot.
#[derive(Debug, Clone)]
pub struct PathResolver {
    cache: Arc<TreeCache>,
}

impl PathResolver {
    pub fn new(cache: Arc<TreeCache>) -> Self {
        Self { cache }
    }

    /// Split a path into its segments.
    ///
    /// Empty segments and `.` are dropped. `..` is rejected.
    pub fn segments(path: &str) -> FsResult<Vec<&str>> {
        let mut segments = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(FsError::InvalidArgument(format!(
                        "relative path component in {:?}",
                        path
                    )));
                }
                name => segments.push(name),
            }
        }
        Ok(segments)
    }

    /// Canonical absolute form of `path`.
    pub fn normalize(path: &str) -> FsResult<String> {
        Ok(format!("/{}", Self::segments(path)?.join("/")))
    }

    /// Resolve `path` starting at the tree `root`.
    ///
    /// A missing segment, or any segment below a blob, is `NotFound`.
    pub async fn resolve(&self, path: &str, root: &ObjectId) -> FsResult<ObjectRef> {
        let segments = Self::segments(path)?;
        let logical = format!("/{}", segments.join("/"));
        let mut cursor = ObjectRef::root(root.clone());

        for segment in segments {
            if !cursor.is_tree() {
                tracing::debug!(path = %logical, blob = %cursor.path, "path descends into a blob");
                return Err(FsError::NotFound(logical));
            }

            let listing = self
                .cache
                .get_tree(&cursor.id)
                .await
                .map_err(|err| FsError::from_client(err, &logical))?;
            let Some(entry) = listing.get(segment) else {
                return Err(FsError::NotFound(logical));
            };
            cursor = entry.to_ref(&cursor.path);
        }

        Ok(cursor)
    }
}
