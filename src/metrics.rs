//! Live heart-rate metrics shared between the link and the display.
//!
//! The store is the only state touched from more than one execution
//! context: the radio/link side writes readings and diagnostics, the
//! display side reads snapshots and requests resets.  Every access runs
//! inside a single critical section, so a reader never sees `current`
//! updated without `min`/`max` (or the other way round).
//!
//! `MetricsStore::new` is `const`, so the firmware keeps one in a
//! `static`.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::ble::{truncate_name, ConnectionState, DeviceName};
use crate::hrm::HeartRateMeasurement;
use crate::time::Millis;

/// Point-in-time copy of all metrics.
///
/// Raw bpm fields hold 0 while unknown; prefer the accessors, which map
/// "no reading yet" to `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MetricsSnapshot {
    pub current_bpm: u16,
    pub min_bpm: u16,
    pub max_bpm: u16,
    /// At least one reading since construction or the last reset.
    pub has_reading: bool,
    /// When the current session (and its min/max) started.
    pub session_start: Millis,
    /// When the last valid reading arrived.
    pub last_reading: Option<Millis>,
    pub state: ConnectionState,
    /// Name of the last advertisement seen, for diagnostics.
    pub last_adv_name: Option<DeviceName>,
    /// RSSI of the last advertisement seen, for diagnostics.
    pub last_adv_rssi: Option<i8>,
}

impl MetricsSnapshot {
    const fn empty() -> Self {
        Self {
            current_bpm: 0,
            min_bpm: 0,
            max_bpm: 0,
            has_reading: false,
            session_start: Millis::ZERO,
            last_reading: None,
            state: ConnectionState::Disconnected,
            last_adv_name: None,
            last_adv_rssi: None,
        }
    }

    pub fn current(&self) -> Option<u16> {
        self.has_reading.then_some(self.current_bpm)
    }

    pub fn min(&self) -> Option<u16> {
        self.has_reading.then_some(self.min_bpm)
    }

    pub fn max(&self) -> Option<u16> {
        self.has_reading.then_some(self.max_bpm)
    }

    /// Session runtime at `now`.
    pub fn elapsed_ms(&self, now: Millis) -> u32 {
        now.since(self.session_start)
    }

    /// Time since the last reading, if any.
    pub fn reading_age_ms(&self, now: Millis) -> Option<u32> {
        self.last_reading.map(|t| now.since(t))
    }

    fn record(&mut self, bpm: u16, now: Millis) {
        self.current_bpm = bpm;
        self.last_reading = Some(now);
        if self.has_reading {
            self.min_bpm = self.min_bpm.min(bpm);
            self.max_bpm = self.max_bpm.max(bpm);
        } else {
            self.min_bpm = bpm;
            self.max_bpm = bpm;
            self.has_reading = true;
        }
    }
}

/// Display-side view of the metrics.
pub trait MetricsSource {
    /// Consistent copy of the current metrics.
    fn snapshot(&self) -> MetricsSnapshot;
    /// Start a new session: clear readings and diagnostics.
    fn reset_metrics(&self, now: Millis);
}

/// Critical-section guarded metrics store.
pub struct MetricsStore {
    inner: Mutex<CriticalSectionRawMutex, RefCell<MetricsSnapshot>>,
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsStore {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(MetricsSnapshot::empty())),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut MetricsSnapshot) -> T) -> T {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Fold one heart-rate value into the metrics.
    pub fn record_heart_rate(&self, bpm: u16, now: Millis) {
        let (min, max) = self.with(|m| {
            m.record(bpm, now);
            (m.min_bpm, m.max_bpm)
        });
        debug!("HR: {} bpm (min {} max {})", bpm, min, max);
    }

    /// Decode a raw measurement notification and record it.
    ///
    /// Malformed payloads are dropped; returns the accepted bpm.
    pub fn on_notification(&self, data: &[u8], now: Millis) -> Option<u16> {
        let Some(measurement) = HeartRateMeasurement::parse(data) else {
            trace!("Dropping malformed HR notification ({} bytes)", data.len());
            return None;
        };
        trace!("HR measurement: {}", measurement);
        self.record_heart_rate(measurement.bpm, now);
        Some(measurement.bpm)
    }

    /// Remember the last advertisement seen, for diagnostics.
    pub fn record_advertisement(&self, name: Option<&str>, rssi: i8) {
        self.with(|m| {
            m.last_adv_name = name.map(truncate_name);
            m.last_adv_rssi = Some(rssi);
        });
    }

    /// Mirror the link state.
    pub fn set_state(&self, state: ConnectionState) {
        self.with(|m| m.state = state);
    }

    /// Clear readings and diagnostics; the session restarts at `now`.
    pub fn reset(&self, now: Millis) {
        self.with(|m| {
            let state = m.state;
            *m = MetricsSnapshot::empty();
            m.state = state;
            m.session_start = now;
        });
        info!("Metrics reset");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.with(|m| m.clone())
    }
}

impl MetricsSource for MetricsStore {
    fn snapshot(&self) -> MetricsSnapshot {
        MetricsStore::snapshot(self)
    }

    fn reset_metrics(&self, now: Millis) {
        self.reset(now);
    }
}
