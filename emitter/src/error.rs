// error.rs — Fatal emission errors
//
// Every failure that aborts a run is one variant here. Recoverable problems
// (a missing or malformed external-function file) never reach this type; they
// are logged and treated as "no functions".
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::path::PathBuf;

/// Errors that abort program emission.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// Checksum algorithm name outside {asserts, hash, precompute}.
    #[error("unsupported checksum algorithm '{0}'")]
    UnsupportedCheckAlgo(String),

    /// An alignment enum value that has no byte size (the `max` sentinel).
    #[error("bad alignment size '{0}'")]
    UnsupportedAlignment(&'static str),

    /// The abstract program violates an invariant the emitter relies on.
    #[error("invalid program: {message}")]
    InvalidProgram { message: String },

    /// The abstract program file could not be read.
    #[error("{}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The abstract program file is not valid JSON for the program model.
    #[error("{}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Canonical serialization for the program fingerprint failed.
    #[error("cannot fingerprint program: {0}")]
    Fingerprint(#[source] serde_json::Error),

    /// The output artifact could not be written.
    #[error("can't open file {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EmitError {
    pub fn invalid(message: impl Into<String>) -> Self {
        EmitError::InvalidProgram {
            message: message.into(),
        }
    }

    /// True for failures caused by the filesystem rather than by the inputs.
    pub fn is_io(&self) -> bool {
        matches!(self, EmitError::Input { .. } | EmitError::Output { .. })
    }
}
