//! Store contracts and the directory-backed reference stores.
//!
//! `SourceStore` and `DestinationStore` are the seams the pipeline drives;
//! any object-store client that maps its native failures onto `StoreError`
//! can be dropped in. Both connection handles are expected to be long-lived
//! and reused across every item in a run.
//!
//! The directory-backed pair below maps buckets/containers to first-level
//! subdirectories of a root directory. It satisfies every contract,
//! including streamed remote digests, and is what the CLI and the pipeline
//! tests run against.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::checksums;
use crate::error::StoreError;
use crate::model::RemoteObject;

/// Outcome of an idempotent directory creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryStatus {
    Created,
    AlreadyExists,
}

/// Read side: enumerate and fetch objects from the source store.
pub trait SourceStore {
    /// Lightweight existence/permission probe for `bucket`, called once
    /// before listing or fetching.
    fn check_access(&self, bucket: &str) -> Result<(), StoreError>;

    /// Objects in `bucket` whose key ends in one of `extensions`
    /// (case-insensitive suffix match), sorted ascending by key.
    fn list_objects(
        &self,
        bucket: &str,
        extensions: &[&str],
    ) -> Result<Vec<RemoteObject>, StoreError>;

    /// Fetch the object `key` into the local file `local_path`.
    fn fetch(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), StoreError>;
}

/// Write side: place local files into the destination store.
pub trait DestinationStore {
    /// Lightweight existence/permission probe for `container`.
    fn check_access(&self, container: &str) -> Result<(), StoreError>;

    /// Create `path` inside `container` if absent. "Already exists" is
    /// success, not an error.
    fn ensure_directory(&self, container: &str, path: &str)
        -> Result<DirectoryStatus, StoreError>;

    /// Write the local file to `remote_path`, returning bytes written.
    fn write(
        &self,
        container: &str,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<u64, StoreError>;

    /// Digest of the remote object, streamed in `chunk_size` chunks
    /// without staging the object locally.
    fn remote_digest(
        &self,
        container: &str,
        remote_path: &str,
        chunk_size: usize,
    ) -> Result<String, StoreError>;
}

fn io_to_store(e: io::Error, what: String) -> StoreError {
    match e.kind() {
        io::ErrorKind::NotFound => StoreError::NotFound(what),
        io::ErrorKind::PermissionDenied => StoreError::AccessDenied(what),
        _ => StoreError::Store(format!("{}: {}", what, e)),
    }
}

/// Source store backed by a local directory tree.
///
/// First-level subdirectories of `root` are buckets; files below a bucket
/// are objects whose keys are `/`-separated relative paths.
#[derive(Debug, Clone)]
pub struct DirSourceStore {
    root: PathBuf,
}

impl DirSourceStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        DirSourceStore { root: root.into() }
    }

    fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }
}

impl SourceStore for DirSourceStore {
    fn check_access(&self, bucket: &str) -> Result<(), StoreError> {
        let path = self.bucket_path(bucket);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::Store(format!("'{}' is not a bucket", bucket))),
            Err(e) => Err(io_to_store(e, format!("bucket '{}'", bucket))),
        }
    }

    fn list_objects(
        &self,
        bucket: &str,
        extensions: &[&str],
    ) -> Result<Vec<RemoteObject>, StoreError> {
        self.check_access(bucket)?;
        let bucket_root = self.bucket_path(bucket);

        fn recurse(
            dir: &Path,
            prefix: &str,
            extensions: &[&str],
            objects: &mut Vec<RemoteObject>,
        ) -> io::Result<()> {
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                let meta = entry.metadata()?;
                let name = entry.file_name().to_string_lossy().into_owned();
                let key = if prefix.is_empty() {
                    name
                } else {
                    format!("{}/{}", prefix, name)
                };

                if meta.is_dir() {
                    recurse(&entry.path(), &key, extensions, objects)?;
                } else if key_matches(&key, extensions) {
                    objects.push(RemoteObject { key, size_bytes: meta.len() });
                }
            }
            Ok(())
        }

        let mut objects = Vec::new();
        recurse(&bucket_root, "", extensions, &mut objects)
            .map_err(|e| io_to_store(e, format!("listing bucket '{}'", bucket)))?;

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    fn fetch(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), StoreError> {
        let object = self.bucket_path(bucket).join(key);
        if !object.is_file() {
            return Err(StoreError::NotFound(format!(
                "object '{}' in bucket '{}'",
                key, bucket
            )));
        }

        fs::copy(&object, local_path)
            .map(|_| ())
            .map_err(|e| io_to_store(e, format!("fetching '{}'", key)))
    }
}

/// Destination store backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct DirDestinationStore {
    root: PathBuf,
}

impl DirDestinationStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        DirDestinationStore { root: root.into() }
    }

    fn container_path(&self, container: &str) -> PathBuf {
        self.root.join(container)
    }
}

impl DestinationStore for DirDestinationStore {
    fn check_access(&self, container: &str) -> Result<(), StoreError> {
        let path = self.container_path(container);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::Store(format!("'{}' is not a container", container))),
            Err(e) => Err(io_to_store(e, format!("container '{}'", container))),
        }
    }

    fn ensure_directory(
        &self,
        container: &str,
        path: &str,
    ) -> Result<DirectoryStatus, StoreError> {
        self.check_access(container)?;
        let dir = self.container_path(container).join(path);

        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => Ok(DirectoryStatus::AlreadyExists),
            Ok(_) => Err(StoreError::Store(format!(
                "'{}' exists but is not a directory",
                path
            ))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&dir)
                    .map_err(|e| io_to_store(e, format!("creating directory '{}'", path)))?;
                Ok(DirectoryStatus::Created)
            }
            Err(e) => Err(io_to_store(e, format!("directory '{}'", path))),
        }
    }

    fn write(
        &self,
        container: &str,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<u64, StoreError> {
        if !local_path.is_file() {
            return Err(StoreError::NotFound(format!(
                "local file '{}'",
                local_path.display()
            )));
        }

        let target = self.container_path(container).join(remote_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| io_to_store(e, format!("writing '{}'", remote_path)))?;
        }

        fs::copy(local_path, &target)
            .map_err(|e| io_to_store(e, format!("writing '{}'", remote_path)))
    }

    fn remote_digest(
        &self,
        container: &str,
        remote_path: &str,
        chunk_size: usize,
    ) -> Result<String, StoreError> {
        let target = self.container_path(container).join(remote_path);
        let file = File::open(&target)
            .map_err(|e| io_to_store(e, format!("object '{}'", remote_path)))?;

        checksums::digest_reader(file, chunk_size)
            .map_err(|e| io_to_store(e, format!("reading '{}'", remote_path)))
    }
}

/// Case-insensitive suffix match of `key` against `extensions`.
fn key_matches(key: &str, extensions: &[&str]) -> bool {
    let Some((_, ext)) = key.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksums::DIGEST_CHUNK_SIZE;
    use crate::model::DEFAULT_EXTENSIONS;

    fn seed_source(root: &Path) {
        let bucket = root.join("data");
        fs::create_dir_all(bucket.join("exports")).expect("Failed to create bucket");
        fs::write(bucket.join("b.parquet"), b"parquet bytes").expect("write failed");
        fs::write(bucket.join("a.CSV"), b"id\n1\n").expect("write failed");
        fs::write(bucket.join("exports").join("c.json"), b"{}").expect("write failed");
        fs::write(bucket.join("notes.txt"), b"ignored").expect("write failed");
    }

    #[test]
    fn test_list_objects_filters_and_sorts() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        seed_source(temp_dir.path());
        let store = DirSourceStore::new(temp_dir.path());

        let objects = store
            .list_objects("data", &DEFAULT_EXTENSIONS)
            .expect("list failed");

        let keys: Vec<&str> = objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a.CSV", "b.parquet", "exports/c.json"]);
        assert!(objects.iter().all(|o| o.size_bytes > 0));
    }

    #[test]
    fn test_list_objects_unknown_bucket() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = DirSourceStore::new(temp_dir.path());

        match store.list_objects("nope", &DEFAULT_EXTENSIONS) {
            Err(StoreError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_copies_object() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        seed_source(temp_dir.path());
        let store = DirSourceStore::new(temp_dir.path());

        let dest = temp_dir.path().join("local_a.csv");
        store.fetch("data", "a.CSV", &dest).expect("fetch failed");
        assert_eq!(fs::read(&dest).expect("read failed"), b"id\n1\n");
    }

    #[test]
    fn test_fetch_missing_object() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        seed_source(temp_dir.path());
        let store = DirSourceStore::new(temp_dir.path());

        let dest = temp_dir.path().join("local.csv");
        match store.fetch("data", "missing.csv", &dest) {
            Err(StoreError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_ensure_directory_is_idempotent() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("lake")).expect("Failed to create container");
        let store = DirDestinationStore::new(temp_dir.path());

        let first = store.ensure_directory("lake", "raw_data").expect("ensure failed");
        let second = store.ensure_directory("lake", "raw_data").expect("ensure failed");
        assert_eq!(first, DirectoryStatus::Created);
        assert_eq!(second, DirectoryStatus::AlreadyExists);
    }

    #[test]
    fn test_write_and_remote_digest_round_trip() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("lake")).expect("Failed to create container");
        let store = DirDestinationStore::new(temp_dir.path());

        let local = temp_dir.path().join("payload.bin");
        fs::write(&local, b"payload bytes").expect("write failed");

        let bytes = store
            .write("lake", &local, "raw_data/payload.bin")
            .expect("store write failed");
        assert_eq!(bytes, 13);

        let remote = store
            .remote_digest("lake", "raw_data/payload.bin", DIGEST_CHUNK_SIZE)
            .expect("remote digest failed");
        let local_digest =
            crate::checksums::digest_file(&local, DIGEST_CHUNK_SIZE).expect("local digest failed");
        assert_eq!(remote, local_digest);
    }

    #[test]
    fn test_write_missing_local_file() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("lake")).expect("Failed to create container");
        let store = DirDestinationStore::new(temp_dir.path());

        let result = store.write("lake", &temp_dir.path().join("absent"), "raw_data/x");
        match result {
            Err(StoreError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_remote_digest_missing_object() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("lake")).expect("Failed to create container");
        let store = DirDestinationStore::new(temp_dir.path());

        match store.remote_digest("lake", "raw_data/absent", DIGEST_CHUNK_SIZE) {
            Err(StoreError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_key_matches_is_case_insensitive() {
        assert!(key_matches("A.CSV", &["csv"]));
        assert!(key_matches("dir/a.Json", &["csv", "json"]));
        assert!(!key_matches("a.txt", &["csv", "json"]));
        assert!(!key_matches("noext", &["csv"]));
    }
}
