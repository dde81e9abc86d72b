//! Error types for the driver.

use core::fmt;

/// Failures reported by a display session or its bus interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The bus or device could not be claimed when the session was opened.
    /// Not recoverable for this session; the hardware configuration must be
    /// fixed before opening again.
    ResourceUnavailable,
    /// The hardware reported an error while submitting or completing a
    /// transfer. The current frame is dropped; the session remains usable.
    TransferFailed,
    /// A wait for queue space or for a transaction completion exceeded the
    /// poll budget configured in [`Config`](crate::Config).
    TimedOut,
    /// The driver was used outside of its contract: a frame was sent before
    /// `init`, `init` was called twice, a completion was drained with
    /// nothing in flight, or a command argument was out of range. Reported
    /// before any byte is queued.
    InvalidUsage,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ResourceUnavailable => write!(f, "bus or device could not be claimed"),
            Error::TransferFailed => write!(f, "transfer submission or completion failed"),
            Error::TimedOut => write!(f, "completion wait exceeded the poll budget"),
            Error::InvalidUsage => write!(f, "driver used outside of its contract"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
