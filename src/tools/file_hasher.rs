use crate::error::{IngestError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB buffer

/// Length in hex characters of a content id (128 bits).
pub const CONTENT_ID_LEN: usize = 32;

/// Computes the content id of a file: the first 128 bits of its BLAKE3 digest,
/// hex encoded. Only the bytes matter; name, location and mtime do not.
pub fn compute_id(path: &Path) -> Result<String> {
    let hash_error = |source| IngestError::Hash {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(hash_error)?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(hash_error)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let mut id = hasher.finalize().to_hex().to_string();
    id.truncate(CONTENT_ID_LEN);
    Ok(id)
}

/// Checks that a string looks like an id produced by [`compute_id`].
///
/// Ids become file and directory names, so anything else is refused before it
/// reaches the filesystem. Only lowercase hex is accepted.
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    id.len() == CONTENT_ID_LEN && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
