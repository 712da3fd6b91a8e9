//! Registry cache layout and checkpoint file utilities
//!
//! hf-hub stores files under the cache root like this:
//! ```text
//! {cache_dir}/
//! ├── models--NX-AI--TiRex/
//! │   ├── blobs/
//! │   │   └── {etag}
//! │   ├── snapshots/
//! │   │   └── {revision}/
//! │   │       └── model.ckpt -> ../../blobs/{etag}
//! │   └── refs/
//! │       └── main
//! └── model.ckpt            (canonical copy)
//! ```

use std::path::{Path, PathBuf};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Convert model ID to cache directory name
///
/// e.g., "NX-AI/TiRex" -> "models--NX-AI--TiRex"
pub fn model_id_to_cache_name(model_id: &str) -> String {
    format!("models--{}", model_id.replace('/', "--"))
}

/// Locate a file inside the registry cache layout of `cache_dir`
///
/// Resolves the revision via `refs/main` first and falls back to the first
/// snapshot that contains the file.
pub fn cached_snapshot_file(cache_dir: &Path, model_id: &str, filename: &str) -> Option<PathBuf> {
    let model_dir = cache_dir.join(model_id_to_cache_name(model_id));

    let refs_main = model_dir.join("refs/main");
    if let Ok(revision) = std::fs::read_to_string(&refs_main) {
        let candidate = model_dir
            .join("snapshots")
            .join(revision.trim())
            .join(filename);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let entries = std::fs::read_dir(model_dir.join("snapshots")).ok()?;
    entries
        .flatten()
        .map(|entry| entry.path().join(filename))
        .find(|candidate| candidate.is_file())
}

/// Whether two paths name the same file on disk
///
/// Paths that cannot be canonicalized (e.g. do not exist yet) are compared
/// literally.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Size of a regular file in bytes, following symlinks
pub fn file_size(path: &Path) -> std::io::Result<u64> {
    std::fs::metadata(path).map(|m| m.len())
}

/// Bytes expressed in gibibytes
pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GIB
}

/// Human readable size with two decimals, e.g. "0.14 GB"
pub fn format_gib(bytes: u64) -> String {
    format!("{:.2} GB", bytes_to_gib(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_snapshot(root: &Path, revision: &str, content: &str) -> PathBuf {
        let snapshot = root
            .join("models--NX-AI--TiRex/snapshots")
            .join(revision);
        std::fs::create_dir_all(&snapshot).unwrap();
        let file = snapshot.join("model.ckpt");
        std::fs::write(&file, content).unwrap();
        file
    }

    #[test]
    fn test_model_id_to_cache_name() {
        assert_eq!(model_id_to_cache_name("NX-AI/TiRex"), "models--NX-AI--TiRex");
        assert_eq!(model_id_to_cache_name("single"), "models--single");
    }

    #[test]
    fn test_cached_snapshot_file_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(cached_snapshot_file(temp_dir.path(), "NX-AI/TiRex", "model.ckpt").is_none());
    }

    #[test]
    fn test_cached_snapshot_file_prefers_refs_main() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_snapshot(temp_dir.path(), "aaa", "old");
        let current = write_snapshot(temp_dir.path(), "bbb", "new");
        let refs = temp_dir.path().join("models--NX-AI--TiRex/refs");
        std::fs::create_dir_all(&refs).unwrap();
        std::fs::write(refs.join("main"), "bbb\n").unwrap();

        let found = cached_snapshot_file(temp_dir.path(), "NX-AI/TiRex", "model.ckpt");
        assert_eq!(found, Some(current));
    }

    #[test]
    fn test_cached_snapshot_file_without_refs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = write_snapshot(temp_dir.path(), "abc123", "weights");
        let found = cached_snapshot_file(temp_dir.path(), "NX-AI/TiRex", "model.ckpt");
        assert_eq!(found, Some(file));
    }

    #[test]
    fn test_same_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("model.ckpt");
        std::fs::write(&file, "x").unwrap();
        let indirect = temp_dir.path().join(".").join("model.ckpt");
        assert!(same_file(&file, &indirect));
        assert!(!same_file(&file, &temp_dir.path().join("other.ckpt")));
    }

    #[test]
    fn test_format_gib() {
        assert_eq!(format_gib(0), "0.00 GB");
        assert_eq!(format_gib(1024 * 1024 * 1024), "1.00 GB");
        assert_eq!(format_gib(153_093_000), "0.14 GB");
        assert_eq!(format_gib(3 * 1024 * 1024 * 1024 / 2), "1.50 GB");
    }

    #[test]
    fn test_file_size() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("model.ckpt");
        std::fs::write(&file, "hello world").unwrap();
        assert_eq!(file_size(&file).unwrap(), 11);
        assert!(file_size(&temp_dir.path().join("missing")).is_err());
    }
}
