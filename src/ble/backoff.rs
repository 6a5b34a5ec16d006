//! Exponential reconnect backoff.

/// Doubling delay between consecutive failed connection attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Backoff {
    current_ms: u32,
    initial_ms: u32,
    max_ms: u32,
}

impl Backoff {
    pub const fn new(initial_ms: u32, max_ms: u32) -> Self {
        Self {
            current_ms: initial_ms,
            initial_ms,
            max_ms,
        }
    }

    /// Delay the next retry would use.
    pub fn current(&self) -> u32 {
        self.current_ms
    }

    /// Record a failure: returns the delay to apply now and doubles the
    /// delay for the next failure, capped at the maximum.
    pub fn fail(&mut self) -> u32 {
        let delay = self.current_ms;
        self.current_ms = self.current_ms.saturating_mul(2).min(self.max_ms);
        delay
    }

    /// Back to the initial delay after a successful subscription.
    pub fn reset(&mut self) {
        self.current_ms = self.initial_ms;
    }
}
