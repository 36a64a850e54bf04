//! Selector error types.

use std::fmt;
use std::io;
use nix::errno::Errno;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorError {
    /// The kernel refused to create the epoll handle or a source descriptor
    /// (timerfd, signalfd, pidfd, eventfd).
    Resource(Errno),
    /// The descriptor is beyond the process descriptor ceiling.
    Limit { fd: i32, limit: usize },
    /// The operation does not fit the current state of the slot.
    /// This is always a bug in the caller.
    InvalidState(&'static str),
    /// The platform lacks the requested facility.
    Unsupported(&'static str),
    /// Any other failed syscall.
    Os(Errno)
}

impl SelectorError {
    /// Returns the underlying errno, if the error came from a syscall.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Self::Resource(errno) | Self::Os(errno) => Some(*errno),
            _ => None
        }
    }
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(errno) => write!(f, "cannot allocate kernel descriptor: {}", errno.desc()),
            Self::Limit { fd, limit } => {
                write!(f, "descriptor {} exceeds the descriptor limit ({})", fd, limit)
            }
            Self::InvalidState(msg) => write!(f, "invalid state: {}", msg),
            Self::Unsupported(what) => write!(f, "{} is not supported on this platform", what),
            Self::Os(errno) => write!(f, "OS error: {}", errno.desc())
        }
    }
}

impl std::error::Error for SelectorError {}

impl From<Errno> for SelectorError {
    fn from(errno: Errno) -> Self {
        Self::Os(errno)
    }
}

impl From<SelectorError> for io::Error {
    fn from(err: SelectorError) -> Self {
        match err {
            SelectorError::Resource(errno) | SelectorError::Os(errno) => io::Error::from(errno),
            SelectorError::Limit { .. } => io::Error::new(io::ErrorKind::OutOfMemory, err),
            SelectorError::InvalidState(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
            SelectorError::Unsupported(_) => io::Error::new(io::ErrorKind::Unsupported, err)
        }
    }
}

pub type Result<T> = std::result::Result<T, SelectorError>;
