// autobuild - deterministic signed-build configuration and artifact naming
//
// This is the library crate containing the core pipeline: config loading and
// validation, signing parameter resolution, and collision-free output path
// allocation. The binary crate (main.rs) provides the CLI entry point.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::load_build_config;
pub use error::BuildError;
pub use models::{BuildArtifact, BuildConfig, BuildOutcome, BuildReport, Severity};
pub use services::{BuildOrchestrator, SigningParams, TargetPlatform};
pub use state::{CounterStore, PrefsCounterStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
