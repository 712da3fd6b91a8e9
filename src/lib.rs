//! TiRex weights - offline weight provisioning
//!
//! Downloads the TiRex checkpoint from the Hugging Face Hub into a local cache
//! directory, places it at a canonical path and reports how to point the TiRex
//! library at it.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod offline;
pub mod setup;

pub use config::{RegistrySettings, SetupConfig};
pub use error::{SetupError, SetupResult};
pub use models::{HfHubClient, RegistryClient};
pub use offline::WeightsDiagnostic;
pub use setup::{SetupReport, run_setup};
