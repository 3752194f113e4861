use std::io;
use std::path::PathBuf;

/// Failures that stop a batch before any image is converted.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("converter executable '{0}' not found on PATH")]
    ExecutableNotFound(String),

    #[error("converter executable {} does not exist or is not an executable file", .0.display())]
    InvalidExecutable(PathBuf),

    #[error("cannot prepare temporary directory {}: {source}", path.display())]
    TempDir { path: PathBuf, source: io::Error },
}

/// Failure of a single conversion. The batch records it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("failed to start converter: {0}")]
    Spawn(#[from] io::Error),

    #[error("converter exited with status {0}")]
    ExitStatus(i32),

    #[error("converter was terminated by a signal")]
    Terminated,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog i/o error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("catalog file {} is malformed: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no image with id {0} in catalog")]
    UnknownImage(u64),
}

/// Failure to bring one converted file into the collection.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("cannot move {} to {}: {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("cannot register {}: {source}", path.display())]
    Register { path: PathBuf, source: CatalogError },

    #[error("cannot tag {}: {source}", path.display())]
    Tag { path: PathBuf, source: CatalogError },

    #[error("catalog {} unavailable: {reason}", catalog.display())]
    CatalogUnavailable { catalog: PathBuf, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("no configuration directory available on this platform")]
    NoConfigDir,

    #[error("preferences i/o error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("preferences file {} is malformed: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}
