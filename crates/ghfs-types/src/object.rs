//! Git object identity and references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque content address of a git object (a hex SHA as GitHub reports it).
///
/// Two objects with equal ids have byte-identical content, forever.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(7);
        self.0.get(..end).unwrap_or(&self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of git object reachable through a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Tree,
    Blob,
}

impl ObjectKind {
    /// Parse the `type` field of a GitHub tree entry.
    ///
    /// Returns `None` for kinds the filesystem does not expose (e.g. `commit`
    /// entries for submodules).
    pub fn from_git_type(s: &str) -> Option<Self> {
        match s {
            "tree" => Some(ObjectKind::Tree),
            "blob" => Some(ObjectKind::Blob),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Tree => f.write_str("tree"),
            ObjectKind::Blob => f.write_str("blob"),
        }
    }
}

/// One child of a tree object, independent of where the tree is mounted.
///
/// Tree listings are cached by tree id and shared between every path that
/// points at the same tree, so entries carry no logical path of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Single path segment, unique within its tree.
    pub name: String,
    pub id: ObjectId,
    pub kind: ObjectKind,
    /// Byte length for blobs, 0 for trees.
    pub size: u64,
}

impl TreeEntry {
    pub fn blob(name: impl Into<String>, id: impl Into<ObjectId>, size: u64) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            kind: ObjectKind::Blob,
            size,
        }
    }

    pub fn tree(name: impl Into<String>, id: impl Into<ObjectId>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            kind: ObjectKind::Tree,
            size: 0,
        }
    }

    /// Bind this entry to the logical path of its parent directory.
    pub fn to_ref(&self, parent_path: &str) -> ObjectRef {
        let path = if parent_path.is_empty() || parent_path == "/" {
            format!("/{}", self.name)
        } else {
            format!("{}/{}", parent_path.trim_end_matches('/'), self.name)
        };
        ObjectRef {
            id: self.id.clone(),
            kind: self.kind,
            path,
            size: self.size,
        }
    }
}

/// A resolved object at a logical filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub id: ObjectId,
    pub kind: ObjectKind,
    /// Full logical path from the filesystem root, always starting with `/`.
    pub path: String,
    /// Byte length for blobs, 0 for trees.
    pub size: u64,
}

impl ObjectRef {
    /// Reference to the repository root tree.
    pub fn root(id: ObjectId) -> Self {
        Self {
            id,
            kind: ObjectKind::Tree,
            path: "/".to_string(),
            size: 0,
        }
    }

    pub fn is_tree(&self) -> bool {
        self.kind == ObjectKind::Tree
    }

    /// Last path segment, or `/` for the root.
    pub fn name(&self) -> &str {
        match self.path.trim_end_matches('/').rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => "/",
        }
    }
}
