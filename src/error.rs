// Error types for atom parsing

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Result type used throughout the atom reader.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while walking an MP4 atom tree.
#[derive(Debug)]
pub enum Error {
    /// The underlying byte source failed.
    Io(io::Error),

    /// Fewer bytes were available than an atom declared or a read requested.
    TruncatedAtom {
        path: String,
        requested: u64,
        available: u64,
    },

    /// An atom header declared a length smaller than the header itself.
    MalformedAtom { path: String, length: u64 },

    /// The next atom was not one of the required types.
    AtomTypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// An atom's children were exhausted without finding a required type.
    AtomNotFound { path: String, expected: String },

    /// The mandatory ftyp/moov traversal failed; no metadata is available.
    ParseFailed(Box<Error>),
}

impl Error {
    /// Wrap an atom-level fault into the error surfaced to callers.
    pub(crate) fn parse_failed(self) -> Self {
        match self {
            Error::ParseFailed(_) => self,
            other => Error::ParseFailed(Box::new(other)),
        }
    }

    /// Attach an atom path to a truncation raised below the atom layer.
    pub(crate) fn at(self, atom_path: &str) -> Self {
        match self {
            Error::TruncatedAtom {
                path,
                requested,
                available,
            } if path.is_empty() => Error::TruncatedAtom {
                path: atom_path.to_string(),
                requested,
                available,
            },
            other => other,
        }
    }

    /// The fault that aborted the parse, looking through `ParseFailed`.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::ParseFailed(inner) => inner.root_cause(),
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::TruncatedAtom {
                path,
                requested,
                available,
            } => write!(
                f,
                "truncated atom {}: requested {} bytes, {} available",
                path, requested, available
            ),
            Error::MalformedAtom { path, length } => {
                write!(f, "malformed atom {}: declared length {}", path, length)
            }
            Error::AtomTypeMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "atom type mismatch at {}: expected {}, found {}",
                path, expected, actual
            ),
            Error::AtomNotFound { path, expected } => {
                write!(f, "atom not found in {}: {}", path, expected)
            }
            Error::ParseFailed(inner) => write!(f, "MP4 parse failed: {}", inner),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::ParseFailed(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Failure reported by an [`ImageCodec`](crate::mp4::cover::ImageCodec).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageError(pub String);

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image decode failed: {}", self.0)
    }
}

impl StdError for ImageError {}
