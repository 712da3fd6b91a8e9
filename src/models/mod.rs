//! Model registry access
//!
//! Provides functionality for:
//! - Downloading the checkpoint from the Hugging Face Hub
//! - Navigating the registry cache layout
//! - Reporting checkpoint sizes

pub mod cache;
pub mod download;

pub use cache::{cached_snapshot_file, file_size, format_gib, model_id_to_cache_name};
pub use download::{HfHubClient, RegistryClient};
