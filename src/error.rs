//! Custom error types for the application.
//!
//! This module defines the primary error type, `PickError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different failure domains of the pipeline.
//!
//! ## Error Hierarchy
//!
//! `PickError` consolidates the transport, processing, and persistence
//! domains:
//!
//! - **`Connect`**: A network, handshake, or authentication step of the hop
//!   chain failed, or the channel was used after teardown. Establishment and
//!   later calls share this variant; there is no automatic reconnection, so a
//!   broken session keeps surfacing it until the caller rebuilds the channel.
//! - **`Access`**: A remote path is missing or not permitted. Kept distinct
//!   from `Connect` so catalog enumeration can skip a bad station without
//!   treating the whole session as dead.
//! - **`Read`**: A whole-file read was truncated or lost mid-transfer after
//!   the file had been opened.
//! - **`Admission`**: The raw bytes of an entry were rejected by the
//!   admission gate. See [`AdmissionError`] for the subkinds. Aborts only the
//!   current entry; manual annotation remains possible.
//! - **`Oracle`**: The detection oracle failed. Callers treat this as "zero
//!   candidates" rather than aborting the entry.
//! - **`Ledger`**: Creating the ledger header or appending a record failed.
//!   Fatal to that save action and never silently swallowed, since it
//!   represents potential loss of an annotation decision.
//! - **`Config`**: A semantic configuration error caught during validation.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type PickResult<T> = std::result::Result<T, PickError>;

#[derive(Error, Debug)]
pub enum PickError {
    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Access error: {0}")]
    Access(String),

    #[error("Read error: {0}")]
    Read(String),

    #[error("Admission rejected: {0}")]
    Admission(#[from] AdmissionError),

    #[error("Detection oracle error: {0}")]
    Oracle(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Reasons the admission gate rejects raw waveform bytes.
///
/// The gate is atomic: whichever step fails, no partially normalized segment
/// escapes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdmissionError {
    #[error("waveform stream contained no traces")]
    EmptyStream,

    #[error("trace {channel} too short: {duration:.1}s below the {floor:.1}s floor")]
    TooShort {
        channel: String,
        duration: f64,
        floor: f64,
    },

    #[error("decode failure: {0}")]
    DecodeFailure(String),

    #[error("normalization failure: {0}")]
    NormalizationFailure(String),
}
