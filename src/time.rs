//! Wrapping millisecond timestamps.
//!
//! The link runs off a free-running 32-bit millisecond counter that wraps
//! after ~49.7 days.  Deadlines are compared through the signed distance
//! between two readings, which stays correct across the wrap as long as
//! the two instants are less than ~24.8 days apart.

use core::ops::Add;

/// A point on the wrapping millisecond clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Millis(pub u32);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    /// `true` once `self` is at or past `deadline`.
    pub fn has_reached(self, deadline: Millis) -> bool {
        (self.0.wrapping_sub(deadline.0) as i32) >= 0
    }

    /// Milliseconds from `earlier` to `self`.
    pub fn since(self, earlier: Millis) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }
}

impl Add<u32> for Millis {
    type Output = Millis;

    fn add(self, ms: u32) -> Millis {
        Millis(self.0.wrapping_add(ms))
    }
}

impl From<u32> for Millis {
    fn from(ms: u32) -> Self {
        Millis(ms)
    }
}

/// Current time from the Embassy time driver, truncated to 32 bits.
#[cfg(feature = "embedded")]
pub fn now() -> Millis {
    Millis(embassy_time::Instant::now().as_millis() as u32)
}
