//! Shared vocabulary of the completion waiters.

/// Upper bound for a blocking wait.
///
/// There is no default. Every wait call has to decide whether it may block forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitLimit {
    /// Wait until the terminal count event occurs, no matter how long it takes.
    Forever,
    /// Check for completion at most this many times before returning [TimeoutError].
    ///
    /// At least one check is always performed, so a value of 0 behaves like 1. For the polling
    /// waiter, a check is one read of the status register. For the interrupt waiter, a check
    /// is one inspection of the pending flag, with a wait-for-interrupt sleep in between.
    MaxChecks(u32),
}

impl WaitLimit {
    /// Returns whether no further check is allowed after `checks` checks were performed.
    #[inline]
    pub const fn is_exhausted(&self, checks: u32) -> bool {
        match self {
            WaitLimit::Forever => false,
            WaitLimit::MaxChecks(max) => checks >= *max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("terminal count was not observed before the wait limit was reached")]
pub struct TimeoutError;

/// State of a single counter run.
///
/// A run goes from [RunState::Idle] to [RunState::Armed] when the counter is enabled, to
/// [RunState::Expired] when the terminal count is observed and back once the event was
/// consumed by a waiter. The cycle can be repeated for any number of runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Armed,
    /// Terminal count observed but not consumed yet.
    Expired,
}

/// Completion waiter, implemented by the polling driver and by the interrupt driven driver.
///
/// On success, the terminal count event has been consumed: the TC status flag is cleared and,
/// for the interrupt strategy, the pending flag is cleared as well.
pub trait WaitTerminalCount {
    fn wait_terminal_count(&mut self, limit: WaitLimit) -> Result<(), TimeoutError>;
}
