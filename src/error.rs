//! Error types for the weights setup pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a setup run
///
/// Each variant names the step that failed so the binary can print a single
/// diagnostic line and exit non-zero.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Prerequisite check failed: could not determine the home directory for {0}")]
    HomeDirUnavailable(String),

    #[error(
        "Prerequisite check failed: registry client unavailable: {message}\n  \
         Check HF_ENDPOINT and HF_TOKEN, or run `huggingface-cli login`"
    )]
    ClientUnavailable { message: String },

    #[error("Failed to create cache directory {path:?}: {source}")]
    CreateCacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error downloading weights for {model_id}: {message}")]
    Download { model_id: String, message: String },

    #[error("Failed to copy checkpoint from {from:?} to {to:?}: {source}")]
    CopyCheckpoint {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read checkpoint size at {path:?}: {source}")]
    ReadMetadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write env file {path:?}: {source}")]
    WriteEnvFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Weights path does not exist: {}\n  Run: tirex-setup-weights --cache-dir {}",
        .0.display(),
        .0.display()
    )]
    WeightsPathMissing(PathBuf),
}

impl SetupError {
    /// Short name of the pipeline step this error belongs to
    pub fn step(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "config",
            Self::HomeDirUnavailable(_) | Self::ClientUnavailable { .. } => "preflight",
            Self::CreateCacheDir { .. } | Self::WeightsPathMissing(_) => "prepare",
            Self::Download { .. } => "download",
            Self::CopyCheckpoint { .. } => "normalize",
            Self::ReadMetadata { .. } => "report",
            Self::WriteEnvFile { .. } => "env-file",
        }
    }
}

pub type SetupResult<T> = Result<T, SetupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_surfaces_client_message() {
        let err = SetupError::Download {
            model_id: "bogus/repo".to_string(),
            message: "request error: 404 Not Found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("bogus/repo"));
        assert!(msg.contains("404 Not Found"));
        assert_eq!(err.step(), "download");
    }

    #[test]
    fn test_prerequisite_errors_are_distinct() {
        let home = SetupError::HomeDirUnavailable("~/.cache/tirex/weights".to_string());
        let client = SetupError::ClientUnavailable {
            message: "invalid endpoint".to_string(),
        };
        assert_eq!(home.step(), client.step());
        assert!(home.to_string().contains("home directory"));
        assert!(client.to_string().contains("registry client"));
        assert!(client.to_string().contains("HF_TOKEN"));
    }
}
