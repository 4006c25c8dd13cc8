//! End-to-end tests for `GithubFs` over an in-memory object store.
//!
//! The repository used throughout:
//!
//! ```text
//! /
//! ├── README.md
//! └── content/
//!     ├── about.md        (42 bytes)
//!     └── posts/
//!         └── hello.md
//! ```

use std::io::SeekFrom;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use ghfs_core::{
    FileInfo, Filesystem, FsError, GithubFs, MemoryObjectStore, ObjectId, ObjectKind, OpenFlags,
    RepoRef,
};
use rstest::rstest;

const ABOUT: &[u8] = b"# About\n\nA small site, served from git!!\n\n";

struct Site {
    store: Arc<MemoryObjectStore>,
    fs: GithubFs,
    about: ObjectId,
}

async fn setup() -> Site {
    assert_eq!(ABOUT.len(), 42);
    let store = Arc::new(MemoryObjectStore::new());

    let hello = store.blob_entry("hello.md", b"hello\n".to_vec()).await;
    let posts = store.tree_entry("posts", vec![hello]).await.unwrap();
    let about = store.blob_entry("about.md", ABOUT.to_vec()).await;
    let about_id = about.id.clone();
    let content = store.tree_entry("content", vec![about, posts]).await.unwrap();
    let readme = store.blob_entry("README.md", b"# site\n".to_vec()).await;
    let root = store.put_tree(vec![readme, content]).await.unwrap();
    store.set_root(None, root).await;

    let fs = GithubFs::with_client(
        RepoRef::new("octo", "site"),
        store.clone(),
        Duration::from_secs(60),
    );
    Site {
        store,
        fs,
        about: about_id,
    }
}

// ============================================================================
// Path resolution
// ============================================================================

#[tokio::test]
async fn test_resolves_blob_through_tree() {
    let site = setup().await;
    let file = site.fs.open("/content/about.md").await.unwrap();
    let obj = file.object();
    assert_eq!(obj.id, site.about);
    assert_eq!(obj.kind, ObjectKind::Blob);
    assert_eq!(obj.size, 42);
}

#[rstest]
#[case::missing_leaf("/content/missing.md")]
#[case::missing_dir("/nope/about.md")]
#[case::below_blob("/content/about.md/x")]
#[case::below_nested_blob("/README.md/content/about.md")]
#[tokio::test]
async fn test_unresolvable_paths(#[case] path: &str) {
    let site = setup().await;
    let err = site.fs.open(path).await.err().unwrap();
    assert_eq!(err, FsError::NotFound(path.to_string()));
    assert_eq!(
        std::io::Error::from(err).kind(),
        std::io::ErrorKind::NotFound
    );
}

#[rstest]
#[case::plain("/content/about.md")]
#[case::relative("content/about.md")]
#[case::doubled_slashes("//content//about.md")]
#[case::trailing_slash("/content/about.md/")]
#[case::dot_segments("/./content/./about.md")]
#[tokio::test]
async fn test_path_spellings(#[case] path: &str) {
    let site = setup().await;
    let file = site.fs.open(path).await.unwrap();
    assert_eq!(file.path(), "/content/about.md");
    assert_eq!(file.object().id, site.about);
}

#[tokio::test]
async fn test_parent_segments_are_rejected() {
    let site = setup().await;
    assert!(matches!(
        site.fs.open("/content/../README.md").await,
        Err(FsError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let site = setup().await;
    let a = site.fs.open("/content/posts/hello.md").await.unwrap();
    let b = site.fs.open("/content/posts/hello.md").await.unwrap();
    assert_eq!(a.object(), b.object());
}

#[tokio::test]
async fn test_cached_trees_are_not_refetched() {
    let site = setup().await;
    site.fs.open("/content/posts/hello.md").await.unwrap();
    // root listing came with the root id; content and posts were fetched
    assert_eq!(site.store.tree_fetches(), 2);

    site.fs.open("/content/posts/hello.md").await.unwrap();
    site.fs.stat("/content/about.md").await.unwrap();
    site.fs.read_dir("/content").await.unwrap();
    assert_eq!(site.store.tree_fetches(), 2);
    assert_eq!(site.store.root_fetches(), 1);
    assert_eq!(site.fs.tree_cache().len().await, 3);
}

// ============================================================================
// Reading
// ============================================================================

#[tokio::test]
async fn test_read_whole_file() {
    let site = setup().await;
    assert_eq!(site.fs.read("/content/about.md").await.unwrap(), ABOUT);
}

#[tokio::test]
async fn test_handle_reads() {
    let site = setup().await;
    let mut file = site.fs.open("/content/about.md").await.unwrap();

    let mut buf = [0u8; 7];
    assert_eq!(file.read(&mut buf).await.unwrap(), 7);
    assert_eq!(&buf, b"# About");

    let mut word = [0u8; 5];
    assert_eq!(file.read_at(&mut word, 11).await.unwrap(), 5);
    assert_eq!(&word, b"small");

    assert_eq!(file.seek(SeekFrom::End(-2)).await.unwrap(), 40);
    assert_eq!(file.read_to_end().await.unwrap(), b"\n\n");
    assert_eq!(file.read(&mut buf).await.unwrap(), 0);

    assert_eq!(site.store.blob_fetches(), 1);
    file.close().await.unwrap();
}

#[tokio::test]
async fn test_each_open_buffers_separately() {
    let site = setup().await;
    site.fs.read("/README.md").await.unwrap();
    site.fs.read("/README.md").await.unwrap();
    assert_eq!(site.store.blob_fetches(), 2);
}

#[tokio::test]
async fn test_read_dir() {
    let site = setup().await;
    let entries = site.fs.read_dir("/content").await.unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["about.md", "posts"]);
    assert!(entries[0].is_file());
    assert_eq!(entries[0].size, 42);
    assert!(entries[1].is_dir());
    assert_eq!(entries[1].size, 0);

    let mut root = site.fs.open("/").await.unwrap();
    assert_eq!(root.read_dir_names().await.unwrap(), vec!["README.md", "content"]);
}

#[rstest]
#[case::root("/", "/", true, 0)]
#[case::dir("/content/posts", "posts", true, 0)]
#[case::file("/content/about.md", "about.md", false, 42)]
#[tokio::test]
async fn test_stat(#[case] path: &str, #[case] name: &str, #[case] is_dir: bool, #[case] size: u64) {
    let site = setup().await;
    let info: FileInfo = site.fs.stat(path).await.unwrap();
    assert_eq!(info.name, name);
    assert_eq!(info.is_dir(), is_dir);
    assert_eq!(info.size, size);
    assert_eq!(info.mode, if is_dir { 0o555 } else { 0o444 });
}

#[tokio::test]
async fn test_exists() {
    let site = setup().await;
    assert!(site.fs.exists("/").await);
    assert!(site.fs.exists("/content/posts/hello.md").await);
    assert!(!site.fs.exists("/content/posts/bye.md").await);
}

// ============================================================================
// Kind mismatches
// ============================================================================

#[tokio::test]
async fn test_reading_a_tree_is_is_directory() {
    let site = setup().await;
    assert_eq!(
        site.fs.read("/content").await,
        Err(FsError::IsDirectory("/content".into()))
    );
    let mut dir = site.fs.open("/content").await.unwrap();
    let mut buf = [0u8; 4];
    assert!(matches!(dir.read(&mut buf).await, Err(FsError::IsDirectory(_))));
    assert!(matches!(dir.seek(SeekFrom::Start(1)).await, Err(FsError::IsDirectory(_))));
}

#[tokio::test]
async fn test_listing_a_blob_is_not_a_directory() {
    let site = setup().await;
    assert_eq!(
        site.fs.read_dir("/README.md").await,
        Err(FsError::NotADirectory("/README.md".into()))
    );
    let mut file = site.fs.open("/README.md").await.unwrap();
    assert!(matches!(file.read_dir_names().await, Err(FsError::NotADirectory(_))));
}

// ============================================================================
// Read-only enforcement
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Create,
    Mkdir,
    MkdirAll,
    Remove,
    RemoveAll,
    Rename,
    Chmod,
    Chtimes,
}

async fn apply(fs: &GithubFs, mutation: Mutation, path: &str) -> Result<(), FsError> {
    let now = SystemTime::now();
    match mutation {
        Mutation::Create => fs.create(path).await.map(|_| ()),
        Mutation::Mkdir => fs.mkdir(path, 0o755).await,
        Mutation::MkdirAll => fs.mkdir_all(path, 0o755).await,
        Mutation::Remove => fs.remove(path).await,
        Mutation::RemoveAll => fs.remove_all(path).await,
        Mutation::Rename => fs.rename(path, "/elsewhere").await,
        Mutation::Chmod => fs.chmod(path, 0o644).await,
        Mutation::Chtimes => fs.chtimes(path, now, now).await,
    }
}

#[rstest]
#[tokio::test]
async fn test_filesystem_mutations_are_read_only(
    #[values(
        Mutation::Create,
        Mutation::Mkdir,
        Mutation::MkdirAll,
        Mutation::Remove,
        Mutation::RemoveAll,
        Mutation::Rename,
        Mutation::Chmod,
        Mutation::Chtimes
    )]
    mutation: Mutation,
    #[values("/content/about.md", "/content", "/", "/does/not/exist")] path: &str,
) {
    let site = setup().await;
    assert_eq!(apply(&site.fs, mutation, path).await, Err(FsError::ReadOnly));

    // nothing touched the remote, and the tree is as it was
    assert_eq!(site.store.root_fetches(), 0);
    assert_eq!(site.fs.read("/content/about.md").await.unwrap(), ABOUT);
    assert!(site.fs.exists("/content").await);
    assert!(!site.fs.exists("/elsewhere").await);
}

#[tokio::test]
async fn test_handle_mutations_are_read_only() {
    let site = setup().await;
    let now = SystemTime::now();
    let mut file = site.fs.open("/content/about.md").await.unwrap();

    assert_eq!(file.write(b"pwned").await, Err(FsError::ReadOnly));
    assert_eq!(file.write_at(b"pwned", 0).await, Err(FsError::ReadOnly));
    assert_eq!(file.write_string("pwned").await, Err(FsError::ReadOnly));
    assert_eq!(file.truncate(0).await, Err(FsError::ReadOnly));
    assert_eq!(file.chmod(0o600).await, Err(FsError::ReadOnly));
    assert_eq!(file.chtimes(now, now).await, Err(FsError::ReadOnly));
    assert_eq!(file.read_to_end().await.unwrap(), ABOUT);
}

#[rstest]
#[case::write_only(OpenFlags::WRITE_ONLY)]
#[case::read_write(OpenFlags::READ_WRITE)]
#[case::create(OpenFlags::CREATE)]
#[case::truncate(OpenFlags::TRUNCATE)]
#[case::append(OpenFlags::APPEND)]
#[case::create_truncate(OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE_ONLY)]
#[tokio::test]
async fn test_open_file_write_flags(#[case] flags: OpenFlags) {
    let site = setup().await;
    assert_eq!(
        site.fs.open_file("/content/about.md", flags).await.err(),
        Some(FsError::ReadOnly)
    );
}

#[tokio::test]
async fn test_open_file_read_only() {
    let site = setup().await;
    let mut file = site
        .fs
        .open_file("/content/about.md", OpenFlags::READ_ONLY)
        .await
        .unwrap();
    assert_eq!(file.read_to_end().await.unwrap(), ABOUT);
    assert!(matches!(
        site.fs.open_file("/missing", OpenFlags::READ_ONLY).await,
        Err(FsError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_read_only_is_permanent() {
    assert!(!FsError::ReadOnly.is_transient());
    let site = setup().await;
    assert!(site.fs.read_only());
}
