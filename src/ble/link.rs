//! Connection state machine for a single heart-rate strap.
//!
//! `HrLink` owns the radio, the candidate selector, the backoff and all
//! deadlines.  It is driven by calling [`HrLink::advance`] every few tens
//! of milliseconds; each call drains the inbound event queue and then
//! takes at most one step per lifecycle rule:
//!
//! ```text
//!              scan deadline            candidate selected
//! Disconnected ─────────────► Scanning ───────────────────► Connecting
//!      ▲  ▲                      │                            │    │
//!      │  └──── window expired ──┘            connect + subscribe   │
//!      │                                                      ▼    │
//!      ├───────────── link dropped / lost ──────────── Subscribed  │
//!      └──────────── failure: retry after backoff ─────────────────┘
//! ```
//!
//! `Error` is reachable from anywhere, but only for a radio stack that
//! reports itself unavailable or an explicit [`HrLink::halt`].  Leaving it
//! requires [`HrLink::recover`].

use crate::ble::backoff::Backoff;
use crate::ble::radio::Radio;
use crate::ble::selector::{Candidate, CandidateSelector, Verdict};
use crate::ble::{hr_client, Advertisement, ConnectionState, DisconnectReason, EventQueue};
use crate::ble::{EventReceiver, RadioEvent};
use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::metrics::MetricsStore;
use crate::time::Millis;

/// The link context: everything the lifecycle needs, owned in one place.
pub struct HrLink<'a, R: Radio> {
    radio: R,
    config: LinkConfig,
    selector: CandidateSelector,
    metrics: &'a MetricsStore,
    events: EventReceiver<'a>,
    state: ConnectionState,
    backoff: Backoff,
    /// Earliest time a new scan may start.
    next_scan: Millis,
    /// Earliest time the next connect attempt may run.
    next_connect: Millis,
    /// End of the current scan window.
    scan_deadline: Millis,
    /// Consecutive failures against the current candidate.
    candidate_failures: u8,
    last_error: Option<LinkError>,
    #[cfg(test)]
    history: std::vec::Vec<ConnectionState>,
}

impl<'a, R: Radio> HrLink<'a, R> {
    /// Create the link in `Disconnected` with a scan due immediately.
    ///
    /// Starts a fresh metrics session at `now`.
    pub fn new(
        radio: R,
        config: LinkConfig,
        metrics: &'a MetricsStore,
        events: &'a EventQueue,
        now: Millis,
    ) -> Self {
        metrics.reset(now);
        metrics.set_state(ConnectionState::Disconnected);
        Self {
            radio,
            selector: CandidateSelector::new(&config),
            backoff: Backoff::new(config.backoff_initial_ms, config.backoff_max_ms),
            config,
            metrics,
            events: events.receiver(),
            state: ConnectionState::Disconnected,
            next_scan: now,
            next_connect: now,
            scan_deadline: now,
            candidate_failures: 0,
            last_error: None,
            #[cfg(test)]
            history: std::vec![ConnectionState::Disconnected],
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Delay the next failed attempt will impose.
    pub fn backoff_ms(&self) -> u32 {
        self.backoff.current()
    }

    /// Current connection target, if one is selected.
    pub fn selected(&self) -> Option<&Candidate> {
        self.selector.selected()
    }

    /// Most recent connect/subscribe failure.
    pub fn last_error(&self) -> Option<LinkError> {
        self.last_error
    }

    /// Earliest time of the next scan.
    pub fn next_scan_at(&self) -> Millis {
        self.next_scan
    }

    /// Earliest time of the next connect attempt.
    pub fn next_connect_at(&self) -> Millis {
        self.next_connect
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// One non-blocking poll step.
    pub fn advance(&mut self, now: Millis) {
        self.drain_events(now);

        if self.state == ConnectionState::Error {
            return;
        }

        self.check_link(now);
        self.maybe_start_scan(now);
        self.maybe_promote();
        self.maybe_connect(now);
        self.maybe_expire_scan(now);
    }

    /// Force the terminal `Error` state: stop scanning and drop any link.
    pub fn halt(&mut self) {
        warn!("Link halted");
        self.enter_error(None);
    }

    /// Leave `Error`: reset backoff and rescan immediately.
    ///
    /// Returns `false` (and does nothing) when not in `Error`.
    pub fn recover(&mut self, now: Millis) -> bool {
        if self.state != ConnectionState::Error {
            return false;
        }
        info!("Link recovering");
        self.backoff.reset();
        self.candidate_failures = 0;
        self.last_error = None;
        self.next_scan = now;
        self.next_connect = now;
        self.set_state(ConnectionState::Disconnected);
        true
    }

    fn drain_events(&mut self, now: Millis) {
        while let Ok(event) = self.events.try_receive() {
            match event {
                RadioEvent::Notification(data) => {
                    self.metrics.on_notification(&data, now);
                }
                RadioEvent::Advertisement(adv) => self.on_advertisement(&adv),
                RadioEvent::LinkDropped { reason } => self.on_link_dropped(reason, now),
            }
        }
    }

    fn on_advertisement(&mut self, adv: &Advertisement) {
        self.metrics.record_advertisement(adv.name.as_deref(), adv.rssi);

        if !matches!(
            self.state,
            ConnectionState::Scanning | ConnectionState::Disconnected
        ) {
            return;
        }

        if self.selector.observe(adv) == Verdict::Authoritative && self.radio.is_scanning() {
            info!("Preferred device {} found - stopping scan", adv.name);
            self.radio.stop_scan();
        }
    }

    fn on_link_dropped(&mut self, reason: DisconnectReason, now: Millis) {
        info!("Disconnected (reason={})", reason.0);
        // Outside Subscribed the poll check owns any leftover link.
        if self.state == ConnectionState::Subscribed {
            self.lost_link(now);
        }
    }

    /// Subscribed link went away: short fixed pause, backoff untouched.
    fn lost_link(&mut self, now: Millis) {
        self.radio.disconnect();
        self.next_scan = now + self.config.scan_pause_ms;
        self.next_connect = self.next_scan;
        self.set_state(ConnectionState::Disconnected);
    }

    // Reconciles the state with what the radio reports: a subscribed link
    // that went away without a drop event, or a stray link outside it.
    fn check_link(&mut self, now: Millis) {
        let connected = self.radio.is_connected();

        if self.state == ConnectionState::Subscribed {
            if !connected {
                warn!("Subscribed link no longer connected");
                self.lost_link(now);
            }
            return;
        }

        if !connected {
            return;
        }

        // Half-open link outside Subscribed: tear it down once.
        warn!("Dropping stray link in state {}", self.state.label());
        if self.radio.is_scanning() {
            self.radio.stop_scan();
        }
        self.radio.disconnect();
        self.next_scan = now + self.config.scan_pause_ms;
        self.next_connect = self.next_scan;
        if matches!(
            self.state,
            ConnectionState::Scanning | ConnectionState::Connecting
        ) {
            self.set_state(ConnectionState::Disconnected);
        }
    }

    fn maybe_start_scan(&mut self, now: Millis) {
        if self.state != ConnectionState::Disconnected
            || !now.has_reached(self.next_scan)
            || self.selector.selected().is_some()
        {
            return;
        }

        self.selector.reset();
        match self.radio.start_scan(self.config.scan_duration_ms) {
            Ok(()) => {
                info!(
                    "Scanning for Heart Rate Service 0x180D ({} ms window)",
                    self.config.scan_duration_ms
                );
                self.scan_deadline = now + self.config.scan_duration_ms;
                self.set_state(ConnectionState::Scanning);
            }
            Err(e) if e.is_fatal() => self.enter_error(Some(e.into())),
            Err(_e) => {
                warn!("Scan start failed: {}", _e);
                self.next_scan = now + self.config.scan_pause_ms;
            }
        }
    }

    fn maybe_promote(&mut self) {
        if !matches!(
            self.state,
            ConnectionState::Scanning | ConnectionState::Disconnected
        ) || self.selector.selected().is_none()
        {
            return;
        }
        if self.radio.is_scanning() {
            self.radio.stop_scan();
        }
        self.set_state(ConnectionState::Connecting);
    }

    // One connect + discover + subscribe attempt per Connecting entry.
    fn maybe_connect(&mut self, now: Millis) {
        if self.state != ConnectionState::Connecting || !now.has_reached(self.next_connect) {
            return;
        }

        let result = match self.selector.selected() {
            Some(target) => {
                info!("Connecting to {} ({})", target.name, target.rssi);
                attempt(&mut self.radio, target)
            }
            None => {
                self.set_state(ConnectionState::Disconnected);
                return;
            }
        };

        match result {
            Ok(()) => {
                self.selector.take();
                self.candidate_failures = 0;
                self.last_error = None;
                self.backoff.reset();
                self.set_state(ConnectionState::Subscribed);
            }
            Err(e) if e.is_fatal() => self.enter_error(Some(e)),
            Err(e) => self.schedule_retry(e, now),
        }
    }

    fn maybe_expire_scan(&mut self, now: Millis) {
        if self.state != ConnectionState::Scanning || !now.has_reached(self.scan_deadline) {
            return;
        }
        if self.radio.is_scanning() {
            self.radio.stop_scan();
        }
        debug!("Scan window closed without a target");
        self.next_scan = now + self.config.scan_pause_ms;
        self.set_state(ConnectionState::Disconnected);
    }

    fn schedule_retry(&mut self, e: LinkError, now: Millis) {
        let delay = self.backoff.fail();
        self.next_connect = now + delay;
        self.next_scan = self.next_connect;
        self.last_error = Some(e);
        warn!("Link attempt failed: {}; retry in {} ms", e, delay);

        self.candidate_failures = self.candidate_failures.saturating_add(1);
        if self.candidate_failures >= self.config.max_attempts_per_candidate.max(1) {
            info!("Dropping candidate after {} failures", self.candidate_failures);
            self.selector.reset();
            self.candidate_failures = 0;
        }

        self.set_state(ConnectionState::Disconnected);
    }

    fn enter_error(&mut self, cause: Option<LinkError>) {
        if self.radio.is_scanning() {
            self.radio.stop_scan();
        }
        if self.radio.is_connected() {
            self.radio.disconnect();
        }
        self.selector.reset();
        if cause.is_some() {
            self.last_error = cause;
        }
        self.set_state(ConnectionState::Error);
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        info!("State -> {}", next.label());
        self.state = next;
        self.metrics.set_state(next);
        #[cfg(test)]
        self.history.push(next);
    }
}

/// Connect, discover and subscribe; tears down a partial link on failure.
fn attempt<R: Radio>(radio: &mut R, target: &Candidate) -> Result<(), LinkError> {
    let result = radio
        .connect(target)
        .map_err(LinkError::from)
        .and_then(|()| hr_client::discover_and_subscribe(radio));
    if result.is_err() {
        radio.disconnect();
    }
    result
}
