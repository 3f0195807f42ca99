use thiserror::Error as ThisError;

/// Errors surfaced while decoding raw trace data into the crate's typed model.
///
/// Only the constructor-level kinds below abort reconstruction; stream-level anomalies
/// (a call/create opcode with a too-short stack, or a trace that ends before a node's
/// terminator) are recoverable and do not appear here — they are logged via [`tracing::warn!`]
/// and produce a best-effort node instead. See the crate-level docs for the full taxonomy.
#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum Error {
    /// A byte or integer field could not be decoded from its textual representation.
    #[error("invalid hex in field '{field}': {value}")]
    InvalidHex {
        /// Name of the field that failed to decode.
        field: &'static str,
        /// The raw value that could not be parsed.
        value: String,
    },
    /// A required frame or call field was absent and has no default.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    /// The caller asked for internal (JUMP/JUMPI) call reconstruction.
    ///
    /// This is left unimplemented on purpose: see [`crate::tracing::config::TraceTreeConfig::show_internal`].
    #[error("internal call reconstruction (show_internal) is not supported")]
    UnsupportedFeature,
    /// Failed to deserialize raw trace JSON into the crate's input types.
    #[error("failed to deserialize trace input: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
