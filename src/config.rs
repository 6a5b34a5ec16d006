//! Application-wide constants and runtime link configuration.
//!
//! Timing parameters, queue depths and protocol constants live here so
//! they can be tuned in one place.  [`LinkConfig`] bundles the values the
//! connection state machine consults at runtime.

// BLE

/// Heart Rate Service UUID (16-bit, Bluetooth SIG assigned).
pub const HR_SERVICE_UUID: u16 = 0x180D;

/// Heart Rate Measurement characteristic UUID (16-bit).
pub const HR_MEASUREMENT_CHAR_UUID: u16 = 0x2A37;

/// Duration of a BLE scan window (ms).
pub const SCAN_DURATION_MS: u32 = 7_000;

/// Gap between the end of a scan window and the next scan (ms).
///
/// Also the pause applied after an unexpected link drop.
pub const SCAN_PAUSE_MS: u32 = 1_000;

/// First reconnect delay after a failed connect/subscribe (ms).
pub const BACKOFF_INITIAL_MS: u32 = 1_000;

/// Upper bound for the reconnect delay (ms).
pub const BACKOFF_MAX_MS: u32 = 30_000;

/// Consecutive failed attempts against one candidate before it is dropped
/// and the next attempt goes through a fresh scan.
pub const MAX_ATTEMPTS_PER_CANDIDATE: u8 = 3;

/// Period at which the firmware drives `HrLink::advance` (ms).
pub const LINK_POLL_INTERVAL_MS: u64 = 20;

/// Depth of the inbound radio event queue.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Largest notification payload kept (default ATT MTU 23 - 3 byte header).
pub const MAX_NOTIFICATION_LEN: usize = 20;

/// Most 16-bit service UUIDs kept from one advertisement.
pub const MAX_ADV_SERVICES: usize = 8;

/// Capacity of advertised device names (bytes).
pub const DEVICE_NAME_LEN: usize = 32;

/// Name fragments of common chest straps and armbands.
pub const DEFAULT_NAME_HINTS: &[&str] = &["hrm", "heart", "polar", "wahoo", "tickr", "h10"];

// UI

/// Display refresh period (ms).
pub const DISPLAY_REFRESH_MS: u64 = 250;

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;

// Simulated sensor

/// Interval between simulated heart-rate notifications (ms).
pub const SIM_BEAT_INTERVAL_MS: u32 = 1_000;

/// Lower and upper bound of the simulated bpm sweep.
pub const SIM_BPM_LOW: u16 = 60;
pub const SIM_BPM_HIGH: u16 = 140;

/// Runtime configuration for the connection state machine and selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// Device name that is trusted outright (case-insensitive exact match).
    pub preferred_name: Option<&'static str>,
    /// Case-insensitive substrings that mark a likely heart-rate device.
    pub name_hints: &'static [&'static str],
    /// Radio scan window (ms).
    pub scan_duration_ms: u32,
    /// Pause between scan windows and after a link drop (ms).
    pub scan_pause_ms: u32,
    /// First reconnect delay (ms).
    pub backoff_initial_ms: u32,
    /// Reconnect delay ceiling (ms).
    pub backoff_max_ms: u32,
    /// Failed attempts against one candidate before it is discarded.
    pub max_attempts_per_candidate: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkConfig {
    /// Configuration built from the compile-time defaults.
    pub const fn new() -> Self {
        Self {
            preferred_name: None,
            name_hints: DEFAULT_NAME_HINTS,
            scan_duration_ms: SCAN_DURATION_MS,
            scan_pause_ms: SCAN_PAUSE_MS,
            backoff_initial_ms: BACKOFF_INITIAL_MS,
            backoff_max_ms: BACKOFF_MAX_MS,
            max_attempts_per_candidate: MAX_ATTEMPTS_PER_CANDIDATE,
        }
    }

    /// Set the preferred device name.
    pub const fn preferred_name(mut self, name: &'static str) -> Self {
        self.preferred_name = Some(name);
        self
    }

    /// Replace the name hint list.
    pub const fn name_hints(mut self, hints: &'static [&'static str]) -> Self {
        self.name_hints = hints;
        self
    }

    /// Set scan window and pause.
    pub const fn scan_timing(mut self, duration_ms: u32, pause_ms: u32) -> Self {
        self.scan_duration_ms = duration_ms;
        self.scan_pause_ms = pause_ms;
        self
    }

    /// Set backoff bounds.
    pub const fn backoff(mut self, initial_ms: u32, max_ms: u32) -> Self {
        self.backoff_initial_ms = initial_ms;
        self.backoff_max_ms = max_ms;
        self
    }

    /// Set the per-candidate attempt limit (0 is treated as 1).
    pub const fn max_attempts_per_candidate(mut self, attempts: u8) -> Self {
        self.max_attempts_per_candidate = attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = LinkConfig::default();
        assert_eq!(cfg.preferred_name, None);
        assert_eq!(cfg.scan_duration_ms, 7_000);
        assert_eq!(cfg.scan_pause_ms, 1_000);
        assert_eq!(cfg.backoff_initial_ms, 1_000);
        assert_eq!(cfg.backoff_max_ms, 30_000);
        assert_eq!(cfg.name_hints, DEFAULT_NAME_HINTS);
    }

    #[test]
    fn builder_overrides() {
        let cfg = LinkConfig::new()
            .preferred_name("Polar H10 1234")
            .scan_timing(3_000, 500)
            .backoff(200, 1_600)
            .max_attempts_per_candidate(5);
        assert_eq!(cfg.preferred_name, Some("Polar H10 1234"));
        assert_eq!(cfg.scan_duration_ms, 3_000);
        assert_eq!(cfg.scan_pause_ms, 500);
        assert_eq!(cfg.backoff_initial_ms, 200);
        assert_eq!(cfg.backoff_max_ms, 1_600);
        assert_eq!(cfg.max_attempts_per_candidate, 5);
    }
}
