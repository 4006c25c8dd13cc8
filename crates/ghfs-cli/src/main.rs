//! ghfs: browse a GitHub repository through the read-only filesystem adapter.
//!
//! # Usage
//!
//! ```bash
//! export GHFS_GITHUB_TOKEN=ghp_...
//! ghfs --repo octo/site ls /content
//! ghfs --repo octo/site --branch preview cat /content/about.md
//! ghfs --repo octo/site tree / --depth 2
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=ghfs_core=debug` to watch cache misses
//! and remote fetches.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ghfs_core::config::{DEFAULT_API_BASE, DEFAULT_ROOT_TTL};
use ghfs_core::{FileInfo, Filesystem, GithubFs, GithubFsConfig, RepoRef};

#[derive(Parser, Debug)]
#[command(name = "ghfs", version, about = "Read a GitHub repository as a filesystem")]
struct Cli {
    #[command(flatten)]
    repo: RepoArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct RepoArgs {
    /// Repository as owner/name
    #[arg(long, env = "GHFS_GITHUB_REPO", value_name = "OWNER/NAME")]
    repo: String,

    /// Branch to follow (default branch when unset)
    #[arg(long, env = "GHFS_GITHUB_BRANCH")]
    branch: Option<String>,

    /// Access token
    #[arg(long, env = "GHFS_GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Seconds between branch head checks
    #[arg(long, env = "GHFS_ROOT_TTL_SECS", value_name = "SECS", default_value_t = DEFAULT_ROOT_TTL.as_secs())]
    ttl: u64,

    /// API base URL
    #[arg(long, env = "GHFS_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a file
    Cat { path: String },
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
        /// Show kind, mode and size
        #[arg(short, long)]
        long: bool,
    },
    /// Show metadata for a path
    Stat { path: String },
    /// Print a directory tree
    Tree {
        #[arg(default_value = "/")]
        path: String,
        /// Stop descending below this depth
        #[arg(short, long)]
        depth: Option<usize>,
    },
}

impl RepoArgs {
    fn config(&self) -> Result<GithubFsConfig> {
        let mut repo = RepoRef::parse(&self.repo)?;
        if let Some(branch) = &self.branch {
            repo = repo.with_branch(branch.as_str());
        }
        let mut config = GithubFsConfig::new(repo)
            .with_api_base(self.api_base.as_str())
            .with_root_ttl(Duration::from_secs(self.ttl));
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            config = config.with_token(token);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("ghfs=info".parse()?)
                .add_directive("ghfs_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.repo.config()?;
    tracing::debug!(repo = %config.repo, api = %config.api_base, "starting");
    let fs = GithubFs::new(&config).context("Failed to set up GitHub client")?;

    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::Cat { path } => {
            let data = fs.read(&path).await.with_context(|| format!("cat {}", path))?;
            out.write_all(&data)?;
        }
        Command::Ls { path, long } => {
            let entries = fs.read_dir(&path).await.with_context(|| format!("ls {}", path))?;
            for entry in &entries {
                if long {
                    writeln!(out, "{}", long_line(entry))?;
                } else {
                    writeln!(out, "{}", display_name(entry))?;
                }
            }
        }
        Command::Stat { path } => {
            let info = fs.stat(&path).await.with_context(|| format!("stat {}", path))?;
            writeln!(out, "  Name: {}", info.name)?;
            writeln!(out, "  Kind: {}", info.kind)?;
            writeln!(out, "  Size: {}", info.size)?;
            writeln!(out, "  Mode: {}", mode_string(&info))?;
        }
        Command::Tree { path, depth } => {
            let lines = tree_lines(&fs, &path, depth).await.with_context(|| format!("tree {}", path))?;
            for line in lines {
                writeln!(out, "{}", line)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Walk a directory depth-first, producing indented lines.
async fn tree_lines(fs: &GithubFs, path: &str, max_depth: Option<usize>) -> Result<Vec<String>> {
    let root = fs.stat(path).await?;
    let mut lines = vec![display_name(&root)];
    if !root.is_dir() {
        return Ok(lines);
    }

    let mut stack = children(fs, path.trim_end_matches('/'), 1).await?;
    while let Some((child, depth, entry)) = stack.pop() {
        lines.push(format!("{}{}", "  ".repeat(depth), display_name(&entry)));
        if entry.is_dir() && max_depth.is_none_or(|max| depth < max) {
            stack.extend(children(fs, &child, depth + 1).await?);
        }
    }
    Ok(lines)
}

/// Children of `dir` as stack items, reversed so they pop in name order.
async fn children(fs: &GithubFs, dir: &str, depth: usize) -> Result<Vec<(String, usize, FileInfo)>> {
    let entries = fs.read_dir(if dir.is_empty() { "/" } else { dir }).await?;
    Ok(entries
        .into_iter()
        .rev()
        .map(|entry| (format!("{}/{}", dir, entry.name), depth, entry))
        .collect())
}

fn display_name(info: &FileInfo) -> String {
    if info.is_dir() && info.name != "/" {
        format!("{}/", info.name)
    } else {
        info.name.clone()
    }
}

fn mode_string(info: &FileInfo) -> String {
    let kind = if info.is_dir() { 'd' } else { '-' };
    let bits: String = (0..9)
        .map(|i| {
            let bit = 0o400 >> i;
            if info.mode & bit == 0 {
                '-'
            } else {
                ['r', 'w', 'x'][i % 3]
            }
        })
        .collect();
    format!("{}{}", kind, bits)
}

fn long_line(info: &FileInfo) -> String {
    format!("{} {:>10} {}", mode_string(info), info.size, display_name(info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ghfs_core::TreeEntry;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ls() {
        let cli = Cli::try_parse_from(["ghfs", "--repo", "octo/site", "ls", "-l", "/content"]).unwrap();
        assert_eq!(cli.repo.repo, "octo/site");
        assert!(matches!(cli.command, Command::Ls { ref path, long: true } if path == "/content"));
    }

    #[test]
    fn test_config_from_args() {
        let cli = Cli::try_parse_from([
            "ghfs", "--repo", "octo/site", "--branch", "preview", "--ttl", "5", "--token", "t",
            "stat", "/",
        ])
        .unwrap();
        let config = cli.repo.config().unwrap();
        assert_eq!(config.repo.branch.as_deref(), Some("preview"));
        assert_eq!(config.root_ttl, Duration::from_secs(5));
        assert_eq!(config.token.as_deref(), Some("t"));
    }

    #[test]
    fn test_bad_repo_is_rejected() {
        let cli = Cli::try_parse_from(["ghfs", "--repo", "nope", "cat", "/x"]).unwrap();
        assert!(cli.repo.config().is_err());
    }

    #[test]
    fn test_mode_string() {
        let dir = FileInfo::from(&TreeEntry::tree("content", "c").to_ref("/"));
        let file = FileInfo::from(&TreeEntry::blob("a.md", "b", 3).to_ref("/"));
        assert_eq!(mode_string(&dir), "dr-xr-xr-x");
        assert_eq!(mode_string(&file), "-r--r--r--");
        assert_eq!(display_name(&dir), "content/");
        assert_eq!(long_line(&file), "-r--r--r--          3 a.md");
    }
}
