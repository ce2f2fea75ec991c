//! Object key building.
//!
//! Key format: `{base_path}/{remote_dir}/{filename}`, each part trimmed of slashes,
//! empty parts dropped.

use crate::traits::{StorageError, StorageResult};

/// Join path parts into one key with single `/` separators.
///
/// Leading, trailing and repeated slashes are removed; blank parts are skipped.
/// Two empty inputs give an empty string.
pub fn join_remote_path(base_path: &str, relative: &str) -> String {
    join_segments(&[base_path, relative])
}

fn join_segments(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.trim().is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the object key for an upload.
///
/// Fails when the file name is empty after normalization or when any part contains
/// a `..` segment.
pub fn object_key(base_path: &str, remote_dir: &str, filename: &str) -> StorageResult<String> {
    if join_segments(&[filename]).is_empty() {
        return Err(StorageError::InvalidKey(format!(
            "file name '{}' is empty",
            filename
        )));
    }

    let key = join_remote_path(base_path, &join_remote_path(remote_dir, filename));
    if key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(key));
    }
    Ok(key)
}
