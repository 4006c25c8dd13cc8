//! Filesystem configuration.
//!
//! Everything the adapter needs to reach one repository: where it lives, which
//! branch to follow, how to authenticate and how often to re-check the root.

use std::time::Duration;

use ghfs_types::{FsError, FsResult, RepoRef};

/// How long a root tree id is trusted before the branch head is re-checked.
pub const DEFAULT_ROOT_TTL: Duration = Duration::from_secs(60);

/// Public GitHub API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const DEFAULT_USER_AGENT: &str = concat!("ghfs/", env!("CARGO_PKG_VERSION"));

/// Environment variables read by [`GithubFsConfig::from_env`].
pub mod env {
    pub const TOKEN: &str = "GHFS_GITHUB_TOKEN";
    pub const REPO: &str = "GHFS_GITHUB_REPO";
    pub const BRANCH: &str = "GHFS_GITHUB_BRANCH";
    pub const ROOT_TTL_SECS: &str = "GHFS_ROOT_TTL_SECS";
    pub const API_BASE: &str = "GHFS_API_BASE";
}

#[derive(Debug, Clone)]
pub struct GithubFsConfig {
    /// Repository and branch to expose.
    pub repo: RepoRef,
    /// Access token. Anonymous requests work for public repos at a much lower rate limit.
    pub token: Option<String>,
    /// REST/GraphQL base URL, without trailing slash.
    pub api_base: String,
    /// Root refresh TTL.
    pub root_ttl: Duration,
    pub user_agent: String,
}

impl GithubFsConfig {
    /// Config for `repo` with default TTL and endpoint, no token.
    pub fn new(repo: RepoRef) -> Self {
        Self {
            repo,
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            root_ttl: DEFAULT_ROOT_TTL,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Read configuration from the process environment.
    ///
    /// `GHFS_GITHUB_REPO` is required (`owner/repo`); the rest is optional.
    pub fn from_env() -> FsResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> FsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let repo = get(env::REPO)
            .ok_or_else(|| FsError::InvalidArgument(format!("{} is not set", env::REPO)))?;
        let mut repo = RepoRef::parse(&repo)?;
        if let Some(branch) = get(env::BRANCH) {
            repo = repo.with_branch(branch.trim());
        }

        let mut config = Self::new(repo);
        config.token = get(env::TOKEN);
        if let Some(base) = get(env::API_BASE) {
            config = config.with_api_base(base);
        }
        if let Some(secs) = get(env::ROOT_TTL_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                FsError::InvalidArgument(format!(
                    "{} must be a whole number of seconds, got {:?}",
                    env::ROOT_TTL_SECS,
                    secs
                ))
            })?;
            config.root_ttl = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_root_ttl(mut self, ttl: Duration) -> Self {
        self.root_ttl = ttl;
        self
    }
}
