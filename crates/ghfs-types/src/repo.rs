//! Repository coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FsError;

/// Which repository (and branch) a filesystem tracks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
    /// Branch to track. `None` means the repository's default branch.
    pub branch: Option<String>,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch: None,
        }
    }

    /// Parse `owner/name`.
    pub fn parse(repo: &str) -> Result<Self, FsError> {
        let parts: Vec<&str> = repo.trim().split('/').collect();
        match parts.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::new(*owner, *name))
            }
            _ => Err(FsError::InvalidArgument(
                "invalid repo path, expected owner/repo style".to_string(),
            )),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        self.branch = if branch.is_empty() { None } else { Some(branch) };
        self
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)?;
        if let Some(branch) = &self.branch {
            write!(f, "@{}", branch)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owner_name() {
        let repo = RepoRef::parse("octo/site").unwrap();
        assert_eq!(repo.owner, "octo");
        assert_eq!(repo.name, "site");
        assert_eq!(repo.branch, None);
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for bad in ["", "octo", "octo/", "/site", "a/b/c"] {
            assert!(
                matches!(RepoRef::parse(bad), Err(FsError::InvalidArgument(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_empty_branch_means_default() {
        let repo = RepoRef::new("octo", "site").with_branch("");
        assert_eq!(repo.branch, None);
        let repo = RepoRef::new("octo", "site").with_branch("preview");
        assert_eq!(repo.to_string(), "octo/site@preview");
    }
}
