use std::{fmt::Display, string::FromUtf8Error, sync::PoisonError};

use bincode::ErrorKind;

/// Custom Result type for sqlit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sqlit
///
/// `Parse` and `Precondition` are user-facing: the statement is simply not
/// executed. `Internal` covers storage and encoding failures, which are
/// reported to the caller without tearing down the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed or unrecognized statement
    Parse(String),
    /// A precondition of the statement does not hold (missing table, lock held, ...)
    Precondition(String),
    /// Transaction aborted during commit, with the failing cause if any
    Aborted(Option<Box<Error>>),
    /// Internal error (filesystem, serialization, etc.)
    Internal(String),
}

impl Error {
    /// Whether the error came from storage rather than from the statement
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Internal(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Internal(value.to_string())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(value: PoisonError<T>) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<Box<ErrorKind>> for Error {
    fn from(value: Box<ErrorKind>) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<FromUtf8Error> for Error {
    fn from(value: FromUtf8Error) -> Self {
        Error::Internal(value.to_string())
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "!Malformed statement: {}", err),
            Error::Precondition(err) => write!(f, "!{}", err),
            Error::Aborted(Some(cause)) => write!(f, "{}\n!Transaction abort.", cause),
            Error::Aborted(None) => write!(f, "!Transaction abort."),
            Error::Internal(err) => write!(f, "internal error {}", err),
        }
    }
}
