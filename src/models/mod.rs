// Data model module
//
// Plain value types shared across the pipeline: the on-disk build
// configuration and the report structures handed back by the build engine.

pub mod config;
pub mod report;

pub use config::BuildConfig;
pub use report::{BuildArtifact, BuildOutcome, BuildReport, BuildStep, Severity, StepMessage};
