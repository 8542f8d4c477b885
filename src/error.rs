use std::io;

use thiserror::Error;

use crate::process::FAILURE_CODE;

/// Result type alias using [`RelayError`].
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors that abort the relay.
///
/// I/O errors inside a running pump are not represented here: they only end that pump.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RelayError {
    /// A system call needed to set up or finish the relay failed.
    #[error("{op}: {source}")]
    Setup {
        /// Name of the failing operation, e.g. `pipe` or `fork`.
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// The child was created but could not execute the target.
    #[error("exec: {0}")]
    Exec(#[source] io::Error),

    /// The arguments cannot be passed to a child process.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

impl RelayError {
    pub(crate) fn setup(op: &'static str) -> impl FnOnce(io::Error) -> RelayError {
        move |source| RelayError::Setup { op, source }
    }

    /// The code the relay exits with after this error.
    pub fn exit_code(&self) -> u8 {
        FAILURE_CODE
    }
}
