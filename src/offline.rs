//! Offline weight discovery and diagnostics
//!
//! The TiRex library looks for weights in `TIREX_WEIGHTS_PATH` (a directory
//! holding `model.ckpt`, or the checkpoint file itself) and falls back to the
//! default cache directory. These helpers answer "would that lookup succeed?"
//! without loading anything.

use crate::config::{CHECKPOINT_FILENAME, DEFAULT_CACHE_DIR, WEIGHTS_PATH_VAR};
use crate::error::{SetupError, SetupResult};
use crate::models::cache::{file_size, format_gib};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Interpret a raw `TIREX_WEIGHTS_PATH` value
pub fn weights_path_from_env(value: Option<String>) -> Option<PathBuf> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Whether offline mode can be enabled with `path`
///
/// Only existence is checked; use [`resolve_checkpoint`] to find the file.
pub fn is_offline_ready(path: &Path) -> bool {
    path.exists()
}

/// Checkpoint file a weights path points at
///
/// A directory resolves to its `model.ckpt`; a file resolves to itself.
pub fn resolve_checkpoint(path: &Path) -> Option<PathBuf> {
    if path.is_dir() {
        let ckpt = path.join(CHECKPOINT_FILENAME);
        ckpt.is_file().then_some(ckpt)
    } else if path.is_file() {
        Some(path.to_path_buf())
    } else {
        None
    }
}

/// Make sure a weights directory exists
pub fn prepare_weights_dir(path: &Path, create_if_missing: bool) -> SetupResult<()> {
    if path.exists() {
        return Ok(());
    }
    if !create_if_missing {
        tracing::warn!(path = ?path, "Weights path does not exist");
        return Err(SetupError::WeightsPathMissing(path.to_path_buf()));
    }
    std::fs::create_dir_all(path).map_err(|source| SetupError::CreateCacheDir {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = ?path, "Created weights directory");
    Ok(())
}

/// State of the default checkpoint location
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocationCheck {
    pub path: PathBuf,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl LocationCheck {
    fn inspect(path: PathBuf) -> Self {
        let size_bytes = if path.is_file() { file_size(&path).ok() } else { None };
        Self {
            exists: path.exists(),
            path,
            size_bytes,
        }
    }
}

/// What `TIREX_WEIGHTS_PATH` points at
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvLocation {
    Directory {
        path: PathBuf,
        contains_checkpoint: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        size_bytes: Option<u64>,
    },
    File {
        path: PathBuf,
        size_bytes: u64,
    },
    Missing {
        path: PathBuf,
    },
}

impl EnvLocation {
    fn inspect(path: PathBuf) -> Self {
        let checkpoint = resolve_checkpoint(&path);
        let size_bytes = checkpoint.as_deref().and_then(|c| file_size(c).ok());
        match size_bytes {
            _ if path.is_dir() => Self::Directory {
                contains_checkpoint: checkpoint.is_some(),
                size_bytes,
                path,
            },
            Some(size_bytes) => Self::File { path, size_bytes },
            None => Self::Missing { path },
        }
    }

    fn has_checkpoint(&self) -> bool {
        match self {
            Self::Directory {
                contains_checkpoint, ..
            } => *contains_checkpoint,
            Self::File { .. } => true,
            Self::Missing { .. } => false,
        }
    }
}

/// Snapshot of every place offline weights may come from
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeightsDiagnostic {
    /// `None` when no home directory could be determined
    pub default_location: Option<LocationCheck>,
    /// `None` when `TIREX_WEIGHTS_PATH` is unset
    pub env_var: Option<EnvLocation>,
    pub ready: bool,
}

impl WeightsDiagnostic {
    /// Inspect the default weights directory and the env var value
    pub fn collect(default_dir: Option<&Path>, env_value: Option<PathBuf>) -> Self {
        let default_location =
            default_dir.map(|dir| LocationCheck::inspect(dir.join(CHECKPOINT_FILENAME)));
        let env_var = env_value.map(EnvLocation::inspect);

        let ready = default_location
            .as_ref()
            .is_some_and(|l| l.size_bytes.is_some())
            || env_var.as_ref().is_some_and(EnvLocation::has_checkpoint);

        tracing::debug!(ready, "Collected weights diagnostic");

        Self {
            default_location,
            env_var,
            ready,
        }
    }

    /// Print the diagnostic as a human readable report
    pub fn render(&self, out: &mut dyn Write) -> std::io::Result<()> {
        let rule = "=".repeat(60);
        writeln!(out, "{}", rule)?;
        writeln!(out, "TiRex Weights Diagnostic")?;
        writeln!(out, "{}", rule)?;

        writeln!(out, "\n1. Default weights location:")?;
        match &self.default_location {
            Some(loc) => {
                writeln!(out, "   Path: {}", loc.path.display())?;
                writeln!(out, "   Exists: {}", loc.exists)?;
                if let Some(size) = loc.size_bytes {
                    writeln!(out, "   Size: {}", format_gib(size))?;
                }
            }
            None => writeln!(out, "   Status: home directory unknown")?,
        }

        writeln!(out, "\n2. Environment variable ({}):", WEIGHTS_PATH_VAR)?;
        writeln!(out, "   Set: {}", self.env_var.is_some())?;
        match &self.env_var {
            Some(EnvLocation::Directory {
                path,
                contains_checkpoint,
                size_bytes,
            }) => {
                writeln!(out, "   Path: {}", path.display())?;
                writeln!(out, "   Type: Directory")?;
                writeln!(out, "   Contains {}: {}", CHECKPOINT_FILENAME, contains_checkpoint)?;
                if let Some(size) = size_bytes {
                    writeln!(out, "   File size: {}", format_gib(*size))?;
                }
            }
            Some(EnvLocation::File { path, size_bytes }) => {
                writeln!(out, "   Path: {}", path.display())?;
                writeln!(out, "   Type: File")?;
                writeln!(out, "   File size: {}", format_gib(*size_bytes))?;
            }
            Some(EnvLocation::Missing { path }) => {
                writeln!(out, "   Path: {}", path.display())?;
                writeln!(out, "   Status: Path does not exist!")?;
            }
            None => {}
        }

        writeln!(out, "\n{}", rule)?;
        if self.ready {
            writeln!(out, "✓ Weights found. TiRex is ready to use offline.")?;
        } else {
            writeln!(out, "✗ No weights found. Please follow the instructions below.")?;
            writeln!(out, "\nQuick setup:")?;
            writeln!(out, "  1. Run tirex-setup-weights")?;
            writeln!(out, "     or copy an existing {} file:", CHECKPOINT_FILENAME)?;
            writeln!(out, "  2. mkdir -p {}", DEFAULT_CACHE_DIR)?;
            writeln!(out, "  3. cp {} {}/", CHECKPOINT_FILENAME, DEFAULT_CACHE_DIR)?;
            writeln!(out, "  4. Run this check again to verify")?;
        }
        writeln!(out, "{}", rule)
    }
}
