//! Content hashing for transfer verification.
//!
//! The digest is a 128-bit MD5 identity check used to compare local bytes
//! against the uploaded object; it is not an access-control primitive.
//! Local files and remote streams go through the same chunked reader with
//! the same chunk size, so the two hex digests are directly comparable.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::error::HashError;

/// Chunk size used for both local and remote digest streaming (1 MiB).
pub const DIGEST_CHUNK_SIZE: usize = 1024 * 1024;

/// Stream `reader` to completion and return the lowercase hex MD5 digest.
///
/// Reads in `chunk_size` chunks so arbitrarily large sources are never
/// buffered whole. A read error discards the partial digest.
pub fn digest_reader<R: Read>(mut reader: R, chunk_size: usize) -> io::Result<String> {
    let mut context = md5::Context::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => context.consume(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(format!("{:x}", context.compute()))
}

/// Compute the digest of a local file.
pub fn digest_file(path: &Path, chunk_size: usize) -> Result<String, HashError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            HashError::NotFound { path: path.to_path_buf() }
        } else {
            HashError::Io { path: path.to_path_buf(), source: e }
        }
    })?;

    digest_reader(file, chunk_size).map_err(|e| HashError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_digest_known_value() {
        let digest = digest_reader(&b"hello"[..], DIGEST_CHUNK_SIZE).expect("digest failed");
        assert_eq!(digest, "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn test_digest_empty_input() {
        let digest = digest_reader(&b""[..], DIGEST_CHUNK_SIZE).expect("digest failed");
        assert_eq!(digest, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_digest_independent_of_chunk_size() {
        let data = b"some moderately long content spanning several tiny chunks";
        let small = digest_reader(&data[..], 3).expect("digest failed");
        let large = digest_reader(&data[..], DIGEST_CHUNK_SIZE).expect("digest failed");
        assert_eq!(small, large);
    }

    #[test]
    fn test_digest_file_round_trip() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("data.bin");

        let data = b"round trip payload";
        let mut file = File::create(&path).expect("Failed to create file");
        file.write_all(data).expect("Failed to write file");
        drop(file);

        let from_file = digest_file(&path, DIGEST_CHUNK_SIZE).expect("digest failed");
        let from_bytes = digest_reader(&data[..], DIGEST_CHUNK_SIZE).expect("digest failed");
        assert_eq!(from_file, from_bytes);
    }

    #[test]
    fn test_digest_file_not_found() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let missing = temp_dir.path().join("missing.bin");

        match digest_file(&missing, DIGEST_CHUNK_SIZE) {
            Err(HashError::NotFound { path }) => assert_eq!(path, missing),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
