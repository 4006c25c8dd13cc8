//! GitHub transport.
//!
//! Trees and blobs come from the REST git database API; the branch root comes
//! from GraphQL, which can return the root tree's entries in the same request.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

use super::traits::{GitObjectClient, RootSnapshot};
use crate::config::GithubFsConfig;
use ghfs_types::{ClientError, ObjectId, ObjectKind, RepoRef, TreeEntry};

const API_VERSION: &str = "2022-11-28";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

const DEFAULT_BRANCH_QUERY: &str = r#"
query($owner: String!, $name: String!, $withEntries: Boolean!) {
  repository(owner: $owner, name: $name) {
    branch: defaultBranchRef {
      target {
        ... on Commit {
          tree {
            oid
            entries @include(if: $withEntries) {
              name
              type
              object { oid ... on Blob { byteSize } }
            }
          }
        }
      }
    }
  }
}
"#;

const NAMED_BRANCH_QUERY: &str = r#"
query($owner: String!, $name: String!, $qualifiedName: String!, $withEntries: Boolean!) {
  repository(owner: $owner, name: $name) {
    branch: ref(qualifiedName: $qualifiedName) {
      target {
        ... on Commit {
          tree {
            oid
            entries @include(if: $withEntries) {
              name
              type
              object { oid ... on Blob { byteSize } }
            }
          }
        }
      }
    }
  }
}
"#;

/// `GitObjectClient` backed by api.github.com (or a compatible API base).
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GithubClient {
    pub fn new(config: &GithubFsConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ClientError::Transport("access token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| ClientError::Transport("user agent is not a valid header value".into()))?;
        headers.insert(USER_AGENT, user_agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(transport)?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn tree_url(&self, repo: &RepoRef, id: &ObjectId) -> String {
        format!("{}/repos/{}/{}/git/trees/{}", self.api_base, repo.owner, repo.name, id)
    }

    fn blob_url(&self, repo: &RepoRef, id: &ObjectId) -> String {
        format!("{}/repos/{}/{}/git/blobs/{}", self.api_base, repo.owner, repo.name, id)
    }

    fn graphql_url(&self) -> String {
        format!("{}/graphql", self.api_base)
    }

    /// Send a request and turn non-success statuses into `ClientError`s.
    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response, ClientError> {
        let res = builder.send().await.map_err(transport)?;
        match classify_status(res.status(), res.headers(), what) {
            None => Ok(res),
            Some(err) => {
                tracing::debug!(what, status = %res.status(), "github request failed");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl GitObjectClient for GithubClient {
    async fn fetch_tree(&self, repo: &RepoRef, id: &ObjectId) -> Result<Vec<TreeEntry>, ClientError> {
        tracing::debug!(%repo, tree = id.short(), "fetching tree");
        let res = self.send(self.http.get(self.tree_url(repo, id)), id.as_str()).await?;
        let tree: RestTree = res.json().await.map_err(transport)?;
        if tree.truncated {
            tracing::warn!(tree = id.short(), "github truncated tree listing");
        }
        Ok(tree.into_entries())
    }

    async fn fetch_blob(&self, repo: &RepoRef, id: &ObjectId) -> Result<Vec<u8>, ClientError> {
        tracing::debug!(%repo, blob = id.short(), "fetching blob");
        let req = self
            .http
            .get(self.blob_url(repo, id))
            .header(ACCEPT, RAW_MEDIA_TYPE);
        let res = self.send(req, id.as_str()).await?;
        let bytes = res.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }

    async fn fetch_root(&self, repo: &RepoRef, with_entries: bool) -> Result<RootSnapshot, ClientError> {
        tracing::debug!(%repo, with_entries, "fetching branch root");
        let body = root_query(repo, with_entries);
        let what = repo.to_string();
        let res = self.send(self.http.post(self.graphql_url()).json(&body), &what).await?;
        let payload: GraphQlResponse<RootData> = res.json().await.map_err(transport)?;
        payload.into_snapshot(repo)
    }
}

fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}

/// Map an HTTP status to the client error taxonomy. `None` means success.
fn classify_status(status: StatusCode, headers: &HeaderMap, what: &str) -> Option<ClientError> {
    if status.is_success() {
        return None;
    }

    let remaining = header_u64(headers, "x-ratelimit-remaining");
    let throttled = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && (remaining == Some(0) || headers.contains_key("retry-after")));
    if throttled {
        let reset_at = header_u64(headers, "x-ratelimit-reset").or_else(|| {
            header_u64(headers, "retry-after").map(|secs| unix_now().saturating_add(secs))
        });
        return Some(ClientError::RateLimited { reset_at });
    }

    if status == StatusCode::NOT_FOUND {
        return Some(ClientError::NotFound { id: what.to_string() });
    }

    Some(ClientError::Transport(format!("github returned {} for {}", status, what)))
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn root_query(repo: &RepoRef, with_entries: bool) -> serde_json::Value {
    match &repo.branch {
        Some(branch) => json!({
            "query": NAMED_BRANCH_QUERY,
            "variables": {
                "owner": repo.owner,
                "name": repo.name,
                "qualifiedName": format!("refs/heads/{}", branch),
                "withEntries": with_entries,
            },
        }),
        None => json!({
            "query": DEFAULT_BRANCH_QUERY,
            "variables": {
                "owner": repo.owner,
                "name": repo.name,
                "withEntries": with_entries,
            },
        }),
    }
}

// ============================================================================
// REST payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct RestTree {
    tree: Vec<RestTreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct RestTreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    size: Option<u64>,
}

impl RestTree {
    fn into_entries(self) -> Vec<TreeEntry> {
        self.tree
            .into_iter()
            .filter_map(|e| entry_from_parts(e.path, &e.kind, e.sha, e.size))
            .collect()
    }
}

/// Build a `TreeEntry`, skipping kinds the filesystem does not expose.
fn entry_from_parts(name: String, kind: &str, sha: String, size: Option<u64>) -> Option<TreeEntry> {
    let Some(kind) = ObjectKind::from_git_type(kind) else {
        tracing::debug!(name = %name, kind, "skipping tree entry");
        return None;
    };
    let size = match kind {
        ObjectKind::Tree => 0,
        ObjectKind::Blob => size.unwrap_or(0),
    };
    Some(TreeEntry {
        name,
        id: ObjectId::new(sha),
        kind,
        size,
    })
}

// ============================================================================
// GraphQL payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RootData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    branch: Option<BranchNode>,
}

#[derive(Debug, Deserialize)]
struct BranchNode {
    target: Option<CommitNode>,
}

#[derive(Debug, Deserialize)]
struct CommitNode {
    tree: Option<GraphQlTree>,
}

#[derive(Debug, Deserialize)]
struct GraphQlTree {
    oid: String,
    entries: Option<Vec<GraphQlEntry>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    object: Option<GraphQlObject>,
}

#[derive(Debug, Deserialize)]
struct GraphQlObject {
    oid: String,
    #[serde(rename = "byteSize", default)]
    byte_size: Option<u64>,
}

impl GraphQlResponse<RootData> {
    fn into_snapshot(self, repo: &RepoRef) -> Result<RootSnapshot, ClientError> {
        if let Some(err) = self.errors.first() {
            return Err(match err.kind.as_deref() {
                Some("NOT_FOUND") => ClientError::NotFound { id: repo.to_string() },
                Some("RATE_LIMITED") => ClientError::RateLimited { reset_at: None },
                _ => ClientError::Transport(format!("graphql: {}", err.message)),
            });
        }

        let tree = self
            .data
            .and_then(|d| d.repository)
            .and_then(|r| r.branch)
            .and_then(|b| b.target)
            .and_then(|c| c.tree)
            .ok_or_else(|| ClientError::NotFound { id: repo.to_string() })?;

        let entries = tree.entries.map(|entries| {
            entries
                .into_iter()
                .filter_map(|e| {
                    let object = e.object?;
                    entry_from_parts(e.name, &e.kind, object.oid, object.byte_size)
                })
                .collect()
        });

        Ok(RootSnapshot {
            tree_id: ObjectId::new(tree.oid),
            entries,
        })
    }
}
