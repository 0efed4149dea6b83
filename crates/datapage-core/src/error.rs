use std::error::Error;
use std::fmt;

use datapage_common::{DataType, FetchError};

/// Errors surfaced by paging list and factory operations.
///
/// Everything here is a synchronous return-path error; the only variant the
/// core does not generate itself is `Fetch`, which carries whatever the
/// injected page fetcher raised, unchanged.
#[derive(Debug, Clone)]
pub enum PagingError {
    IndexOutOfRange { index: isize, len: usize },
    LengthMismatch { expected: usize, got: usize },
    TypeMismatch { left: DataType, right: DataType },
    UnknownField { name: String },
    InvalidLimit { limit: usize, total_count: usize },
    ZeroStep,
    Fetch(FetchError),
}

impl fmt::Display for PagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagingError::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for list of length {len}")
            }
            PagingError::LengthMismatch { expected, got } => {
                write!(
                    f,
                    "attempt to assign sequence of size {got} to extended slice of size {expected}"
                )
            }
            PagingError::TypeMismatch { left, right } => {
                write!(f, "can not combine a '{left}' list with a '{right}' list")
            }
            PagingError::UnknownField { name } => write!(f, "unknown field '{name}'"),
            PagingError::InvalidLimit { limit, total_count } => {
                write!(
                    f,
                    "page limit {limit} is invalid for a factory of {total_count} elements"
                )
            }
            PagingError::ZeroStep => write!(f, "slice step cannot be zero"),
            PagingError::Fetch(e) => write!(f, "page fetch failed: {e}"),
        }
    }
}

impl Error for PagingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PagingError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FetchError> for PagingError {
    fn from(e: FetchError) -> Self {
        PagingError::Fetch(e)
    }
}
