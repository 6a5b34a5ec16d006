//! User interface - OLED status screen + RESET button.
//!
//! The screen shows three lines derived from a metrics snapshot:
//!
//! ```text
//!   72                      <- current bpm, "--" until the first reading
//!   MIN 58   MAX 131        <- session min/max, "--" until the first reading
//!   TIME 00:12:07   connected
//! ```
//!
//! Building the lines is pure and host-tested; drawing them (SSD1306 via
//! `embedded-graphics`) and reading the button live in the embedded-only
//! submodules.
//!
//! ## Components
//!
//! - **Display**: SSD1306 128×64 OLED via I²C
//! - **Button**: 1 tactile switch with debouncing (RESET)

#[cfg(feature = "embedded")]
pub mod buttons;
#[cfg(feature = "embedded")]
pub mod display;

use core::fmt::Write;

use heapless::String;

use crate::metrics::MetricsSnapshot;
use crate::time::Millis;

/// Physical button events (after debouncing).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// Clear min/max and restart the session timer.
    Reset,
}

pub type BpmText = String<8>;
pub type MinMaxText = String<24>;
pub type StatusText = String<32>;

/// The three text lines of the status screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub bpm: BpmText,
    pub min_max: MinMaxText,
    pub status: StatusText,
}

impl Frame {
    pub fn from_snapshot(snap: &MetricsSnapshot, now: Millis) -> Self {
        Self {
            bpm: bpm_text(snap.current()),
            min_max: min_max_text(snap.min(), snap.max()),
            status: status_text(snap, now),
        }
    }
}

/// Current bpm, or `--` while unknown.
pub fn bpm_text(bpm: Option<u16>) -> BpmText {
    let mut s = BpmText::new();
    push_bpm(&mut s, bpm);
    s
}

pub fn min_max_text(min: Option<u16>, max: Option<u16>) -> MinMaxText {
    let mut s = MinMaxText::new();
    let _ = s.push_str("MIN ");
    push_bpm(&mut s, min);
    let _ = s.push_str("   MAX ");
    push_bpm(&mut s, max);
    s
}

/// `TIME hh:mm:ss   <state>`.
pub fn status_text(snap: &MetricsSnapshot, now: Millis) -> StatusText {
    let mut s = StatusText::new();
    let _ = write!(
        s,
        "TIME {}   {}",
        format_runtime(snap.elapsed_ms(now)),
        snap.state.label()
    );
    s
}

/// Render a duration as `hh:mm:ss`; hours keep growing past 99.
pub fn format_runtime(elapsed_ms: u32) -> String<12> {
    let secs = elapsed_ms / 1000;
    let mut s = String::new();
    let _ = write!(s, "{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60);
    s
}

fn push_bpm<const N: usize>(s: &mut String<N>, bpm: Option<u16>) {
    let _ = match bpm {
        Some(v) => write!(s, "{}", v),
        None => s.push_str("--").map_err(|_| core::fmt::Error),
    };
}
