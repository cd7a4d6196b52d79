use std::io;

use thiserror::Error;

use crate::style::PathStyle;

/// Errors raised while building a [`Glob`](crate::Glob).
#[derive(Debug, Error)]
pub enum GlobError {
    /// The pattern text is not a valid glob. The message carries the
    /// parser's positioned diagnostic.
    #[error("invalid glob pattern: {0}")]
    Parse(String),

    /// Globs with different path styles or case modes cannot be combined.
    #[error("cannot combine globs with different {0}")]
    IncompatibleUnion(&'static str),
}

/// Errors raised while listing filesystem entries.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The glob was compiled for a path style the host platform doesn't use.
    #[error("glob was compiled for {glob} paths but the host uses {host} paths")]
    ContextMismatch { glob: PathStyle, host: PathStyle },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl WalkError {
    /// Whether this is a missing-entry error (POSIX `ENOENT` and friends).
    ///
    /// The walker absorbs these below wildcard descents and propagates them
    /// everywhere else.
    pub fn is_not_found(&self) -> bool {
        match self {
            WalkError::Io(err) => err.kind() == io::ErrorKind::NotFound,
            WalkError::Walk(err) => err
                .io_error()
                .is_some_and(|err| err.kind() == io::ErrorKind::NotFound),
            WalkError::ContextMismatch { .. } => false,
        }
    }
}
