use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised by the build pipeline.
///
/// Every variant is terminal for a single invocation; nothing is retried
/// internally. The config variants abort before any filesystem mutation,
/// [`DirectoryUnwritable`](BuildError::DirectoryUnwritable) aborts before the
/// build counter is persisted, and
/// [`EngineFailure`](BuildError::EngineFailure) is the only variant that
/// leaves a durable artifact behind (the error log).
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Build config not found at {path}")]
    ConfigNotFound { path: Utf8PathBuf },

    #[error("Build config invalid: {reason}")]
    ConfigInvalid { reason: String },

    #[error("Cannot create output directory {path}: {source}")]
    DirectoryUnwritable {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Build failed with {error_count} error message(s). See {log_path}")]
    EngineFailure {
        error_count: usize,
        log_path: Utf8PathBuf,
    },
}
