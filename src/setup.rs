//! Weights setup pipeline
//!
//! A run is a straight line of steps; the first failure ends it:
//! preflight → prepare cache dir → download → normalize location → report
//! size → optional env file → instructions.

use crate::config::{CHECKPOINT_FILENAME, SetupConfig, WEIGHTS_PATH_VAR};
use crate::error::{SetupError, SetupResult};
use crate::models::cache::{cached_snapshot_file, file_size, format_gib, same_file};
use crate::models::RegistryClient;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Outcome of a successful setup run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SetupReport {
    /// Path the registry client returned
    pub downloaded_path: PathBuf,
    /// Canonical `{cache_dir}/model.ckpt`
    pub checkpoint_path: PathBuf,
    /// Registry cache entry that already existed before this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previously_cached: Option<PathBuf>,
    /// Whether the checkpoint had to be copied to the canonical path
    pub copied: bool,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_file: Option<PathBuf>,
}

/// Run every setup step for `config`
///
/// Human readable progress goes to `out`; structured diagnostics go through
/// `tracing`.
pub async fn run_setup(
    config: &SetupConfig,
    client: &dyn RegistryClient,
    out: &mut dyn Write,
) -> SetupResult<SetupReport> {
    config.validate()?;
    preflight(client, &config.cache_dir)?;

    prepare_cache_dir(&config.cache_dir).await?;

    emit(out, format_args!("Downloading {} weights...", config.model_id));
    emit(out, format_args!("Cache directory: {}", config.cache_dir.display()));

    let previously_cached = find_cached_checkpoint(config).await;
    if let Some(cached) = &previously_cached {
        emit(
            out,
            format_args!("✓ Found cached copy, verifying with registry: {}", cached.display()),
        );
    }

    let downloaded_path = download_checkpoint(client, config).await?;
    emit(
        out,
        format_args!("✓ Downloaded successfully to: {}", downloaded_path.display()),
    );

    let checkpoint_path = config.checkpoint_path();
    let copied = normalize_location(&downloaded_path, &checkpoint_path).await?;
    if copied {
        emit(
            out,
            format_args!("✓ Copied to standard location: {}", checkpoint_path.display()),
        );
    }

    let size_bytes = checkpoint_size(&checkpoint_path)?;
    emit(out, format_args!("✓ Checkpoint size: {}", format_gib(size_bytes)));

    let env_file = if config.create_env_file {
        write_env_file(&config.env_file_path, &config.env_line()).await?;
        emit(
            out,
            format_args!(
                "✓ Created {} file with {}",
                config.env_file_path.display(),
                config.env_line()
            ),
        );
        Some(config.env_file_path.clone())
    } else {
        None
    };

    for line in instructions(config, env_file.is_some()) {
        emit(out, format_args!("{}", line));
    }

    tracing::info!(
        model_id = %config.model_id,
        checkpoint = ?checkpoint_path,
        size_bytes,
        copied,
        "Weights setup complete"
    );

    Ok(SetupReport {
        downloaded_path,
        previously_cached,
        checkpoint_path,
        copied,
        size_bytes,
        env_file,
    })
}

/// Confirm the registry client can be used with `cache_dir`
pub fn preflight(client: &dyn RegistryClient, cache_dir: &Path) -> SetupResult<()> {
    client.preflight(cache_dir).map_err(|message| {
        tracing::error!(error = %message, "Registry client preflight failed");
        SetupError::ClientUnavailable { message }
    })
}

/// Create the cache directory and any missing parents
pub async fn prepare_cache_dir(dir: &Path) -> SetupResult<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| SetupError::CreateCacheDir {
            path: dir.to_path_buf(),
            source,
        })?;
    tracing::debug!(cache_dir = ?dir, "Cache directory ready");
    Ok(())
}

/// Checkpoint left in the registry cache layout by an earlier run
///
/// The registry is still asked for the file afterwards; the client decides
/// whether the cached copy is current.
pub async fn find_cached_checkpoint(config: &SetupConfig) -> Option<PathBuf> {
    let cache_dir = config.cache_dir.clone();
    let model_id = config.model_id.clone();
    let cached = tokio::task::spawn_blocking(move || {
        cached_snapshot_file(&cache_dir, &model_id, CHECKPOINT_FILENAME)
    })
    .await
    .ok()
    .flatten();
    if let Some(path) = &cached {
        tracing::info!(path = ?path, "Checkpoint already present in registry cache");
    }
    cached
}

/// Fetch the checkpoint, using the cache directory as the client's cache root
pub async fn download_checkpoint(
    client: &dyn RegistryClient,
    config: &SetupConfig,
) -> SetupResult<PathBuf> {
    client
        .download(&config.model_id, CHECKPOINT_FILENAME, &config.cache_dir)
        .await
        .map_err(|message| {
            tracing::error!(model_id = %config.model_id, error = %message, "Download failed");
            SetupError::Download {
                model_id: config.model_id.clone(),
                message,
            }
        })
}

/// Copy `source` to `dest` unless they already are the same file
///
/// The client's cached copy is left in place. Returns whether a copy was made.
pub async fn normalize_location(source: &Path, dest: &Path) -> SetupResult<bool> {
    if same_file(source, dest) {
        tracing::debug!(path = ?dest, "Checkpoint already at canonical location");
        return Ok(false);
    }

    tokio::fs::copy(source, dest)
        .await
        .map_err(|e| SetupError::CopyCheckpoint {
            from: source.to_path_buf(),
            to: dest.to_path_buf(),
            source: e,
        })?;

    if let Err(e) = preserve_modified_time(source, dest) {
        tracing::warn!(error = %e, path = ?dest, "Could not preserve checkpoint modification time");
    }

    tracing::info!(from = ?source, to = ?dest, "Copied checkpoint to canonical location");
    Ok(true)
}

fn preserve_modified_time(from: &Path, to: &Path) -> std::io::Result<()> {
    let modified = std::fs::metadata(from)?.modified()?;
    std::fs::File::options()
        .write(true)
        .open(to)?
        .set_modified(modified)
}

/// Size of the canonical checkpoint in bytes
pub fn checkpoint_size(path: &Path) -> SetupResult<u64> {
    file_size(path).map_err(|source| SetupError::ReadMetadata {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `line` as the only content of the env file, replacing it if present
pub async fn write_env_file(path: &Path, line: &str) -> SetupResult<()> {
    tokio::fs::write(path, format!("{}\n", line))
        .await
        .map_err(|source| SetupError::WriteEnvFile {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = ?path, "Env file written");
    Ok(())
}

/// Follow-up hints printed after a successful run
pub fn instructions(config: &SetupConfig, env_file_written: bool) -> Vec<String> {
    let dir = config.cache_dir.display();
    let mut lines = Vec::new();

    if env_file_written {
        lines.push(
            "  Add to your notebook with: from dotenv import load_dotenv; load_dotenv()"
                .to_string(),
        );
    }

    lines.push(String::new());
    lines.push("To use offline, set environment variable:".to_string());
    lines.push(format!("  export {}={}", WEIGHTS_PATH_VAR, dir));
    lines.push(String::new());
    lines.push("Or in Python:".to_string());
    lines.push("  from tirex.offline import setup_offline_env".to_string());
    lines.push(format!("  setup_offline_env('{}')", dir));
    lines.push("  from tirex import load_model".to_string());
    lines.push(format!("  model = load_model('{}')", config.model_id));
    lines
}

fn emit(out: &mut dyn Write, line: fmt::Arguments<'_>) {
    if let Err(e) = writeln!(out, "{}", line) {
        tracing::debug!(error = %e, "Failed to write console output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> SetupConfig {
        SetupConfig::resolve(Some(dir.to_str().unwrap()), None, false, None).unwrap()
    }

    #[tokio::test]
    async fn test_prepare_cache_dir_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("a/b/c");
        prepare_cache_dir(&dir).await.unwrap();
        prepare_cache_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_prepare_cache_dir_over_file_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let err = prepare_cache_dir(&blocker.join("sub")).await.unwrap_err();
        assert_eq!(err.step(), "prepare");
    }

    #[tokio::test]
    async fn test_normalize_copies_and_keeps_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("blob");
        std::fs::write(&source, "weights").unwrap();
        let dest = temp_dir.path().join("model.ckpt");

        assert!(normalize_location(&source, &dest).await.unwrap());
        assert!(source.exists());
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "weights");

        let src_mtime = std::fs::metadata(&source).unwrap().modified().unwrap();
        let dst_mtime = std::fs::metadata(&dest).unwrap().modified().unwrap();
        assert_eq!(src_mtime, dst_mtime);
    }

    #[tokio::test]
    async fn test_normalize_skips_same_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dest = temp_dir.path().join("model.ckpt");
        std::fs::write(&dest, "weights").unwrap();
        assert!(!normalize_location(&dest, &dest).await.unwrap());
    }

    #[tokio::test]
    async fn test_normalize_missing_source_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = normalize_location(
            &temp_dir.path().join("missing"),
            &temp_dir.path().join("model.ckpt"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SetupError::CopyCheckpoint { .. }));
    }

    #[tokio::test]
    async fn test_write_env_file_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(".env");
        std::fs::write(&path, "OLD=1\nOTHER=2\n").unwrap();
        write_env_file(&path, "TIREX_WEIGHTS_PATH=/tmp/w").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "TIREX_WEIGHTS_PATH=/tmp/w\n"
        );
    }

    #[test]
    fn test_checkpoint_size_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = checkpoint_size(&temp_dir.path().join("model.ckpt")).unwrap_err();
        assert_eq!(err.step(), "report");
    }

    #[test]
    fn test_instructions_mention_dir_and_model() {
        let config = config_in(Path::new("/tmp/w"));
        let lines = instructions(&config, false).join("\n");
        assert!(lines.contains("export TIREX_WEIGHTS_PATH=/tmp/w"));
        assert!(lines.contains("setup_offline_env('/tmp/w')"));
        assert!(lines.contains("load_model('NX-AI/TiRex')"));
        assert!(!lines.contains("load_dotenv"));

        let with_env = instructions(&config, true).join("\n");
        assert!(with_env.contains("load_dotenv"));
    }
}
