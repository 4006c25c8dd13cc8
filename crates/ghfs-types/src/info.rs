//! File metadata and open flags.

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

use crate::object::{ObjectKind, ObjectRef};

/// Metadata returned by `stat` and directory listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Name of the entry (not full path). The root is `/`.
    pub name: String,
    pub kind: ObjectKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Unix permission bits. Always read-only.
    pub mode: u32,
}

impl FileInfo {
    pub fn is_dir(&self) -> bool {
        self.kind == ObjectKind::Tree
    }

    pub fn is_file(&self) -> bool {
        self.kind == ObjectKind::Blob
    }
}

impl From<&ObjectRef> for FileInfo {
    fn from(obj: &ObjectRef) -> Self {
        let mode = match obj.kind {
            ObjectKind::Tree => 0o555,
            ObjectKind::Blob => 0o444,
        };
        Self {
            name: obj.name().to_string(),
            kind: obj.kind,
            size: obj.size,
            mode,
        }
    }
}

/// Flags passed to `open_file`, mirroring the POSIX `O_*` bits that matter here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct OpenFlags(u32);

impl OpenFlags {
    pub const READ_ONLY: OpenFlags = OpenFlags(0);
    pub const WRITE_ONLY: OpenFlags = OpenFlags(0o1);
    pub const READ_WRITE: OpenFlags = OpenFlags(0o2);
    pub const CREATE: OpenFlags = OpenFlags(0o100);
    pub const TRUNCATE: OpenFlags = OpenFlags(0o1000);
    pub const APPEND: OpenFlags = OpenFlags(0o2000);

    const MUTATING: u32 = 0o1 | 0o2 | 0o100 | 0o1000 | 0o2000;

    pub const fn from_bits(bits: u32) -> Self {
        OpenFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: OpenFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any write, append, create or truncate bit is set.
    pub const fn requests_write(self) -> bool {
        self.0 & Self::MUTATING != 0
    }
}

impl BitOr for OpenFlags {
    type Output = OpenFlags;

    fn bitor(self, rhs: OpenFlags) -> OpenFlags {
        OpenFlags(self.0 | rhs.0)
    }
}
