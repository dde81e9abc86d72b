//! Bus and device parameters that the display session passes through to the
//! interface when it is opened.
//!
//! Pin mapping, SPI mode, and clock speed are the HAL's business and are fixed
//! before the interface is handed to [`Display::open`](crate::Display::open);
//! what remains configurable here is the execution-queue side of the device.

/// Queue depth used when none is configured. One frame is 16 transactions,
/// so the default depth lets a whole frame be submitted before any
/// completion is drained.
pub const DEFAULT_QUEUE_DEPTH: usize = 16;

/// Device configuration for a display session. Builder methods extend the
/// defaults, which reproduce the reference behavior: a 16-slot execution
/// queue and unbounded completion waits.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Bound on the number of transactions that may be queued for execution
    /// at once.
    pub queue_depth: usize,
    /// Bound on how many unsuccessful completion polls are tolerated per
    /// transaction; `None` waits forever.
    pub poll_budget: Option<u32>,
}

impl Config {
    pub fn new() -> Self {
        Config {
            queue_depth: DEFAULT_QUEUE_DEPTH,
            poll_budget: None,
        }
    }

    /// Extend this `Config` with an execution queue bound. Submitting beyond
    /// the bound makes the scheduler retire the oldest transaction first, so
    /// depths below 16 trade frame-transfer pipelining for queue memory.
    pub fn queue_depth(self, depth: usize) -> Self {
        Self {
            queue_depth: depth,
            ..self
        }
    }

    /// Extend this `Config` with a completion wait bound. A wait that polls
    /// the interface unsuccessfully more than `polls` times for one
    /// transaction is abandoned with [`Error::TimedOut`](crate::Error::TimedOut).
    pub fn poll_budget(self, polls: u32) -> Self {
        Self {
            poll_budget: Some(polls),
            ..self
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}
