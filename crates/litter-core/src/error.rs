use std::path::PathBuf;

/// The three error classes from the failure-semantics design: configuration
/// mistakes caught before any work starts, system-level failures (I/O,
/// symbol resolution), and malformed artifacts. Observation misses are
/// deliberately not represented here — they are silent no-ops, not errors.
#[derive(thiserror::Error, Debug)]
pub enum LitterError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("system error: {0}")]
    System(String),

    #[error("{path} does not exist")]
    ArtifactMissing { path: PathBuf },

    #[error("malformed artifact at {path}: {source}")]
    ArtifactMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
