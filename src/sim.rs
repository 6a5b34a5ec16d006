//! Simulated heart-rate strap.
//!
//! [`SimRadio`] implements [`Radio`] without any hardware: every scan
//! reports one strap advertising the Heart Rate Service, connections
//! succeed (after an optional number of scripted failures), and once
//! subscribed the strap sends one measurement per
//! [`SIM_BEAT_INTERVAL_MS`] with a bpm that sweeps between
//! [`SIM_BPM_LOW`] and [`SIM_BPM_HIGH`] in steps of 2.
//!
//! The owner drives it with [`SimRadio::tick`] from the same loop that
//! calls `HrLink::advance`.

use heapless::Vec;

use crate::ble::radio::{Radio, RemoteCharacteristic};
use crate::ble::selector::Candidate;
use crate::ble::{Address, Advertisement, EventSender};
use crate::config::{
    HR_MEASUREMENT_CHAR_UUID, HR_SERVICE_UUID, SIM_BEAT_INTERVAL_MS, SIM_BPM_HIGH, SIM_BPM_LOW,
};
use crate::error::RadioError;
use crate::hrm::{FLAG_CONTACT_DETECTED, FLAG_CONTACT_SUPPORTED};
use crate::time::Millis;

/// Static random address of the simulated strap.
pub const SIM_ADDRESS: Address = Address([0x3C, 0x71, 0xBF, 0x42, 0x10, 0xD5]);

/// Default advertised name.
pub const SIM_NAME: &str = "SIM HRM";

const SIM_RSSI: i8 = -58;
const BPM_STEP: u16 = 2;

// AD types used in the simulated advertisement.
const AD_FLAGS: u8 = 0x01;
const AD_COMPLETE_UUID16: u8 = 0x03;
const AD_COMPLETE_NAME: u8 = 0x09;

/// Only the Heart Rate Service exists on the simulated peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimService;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimCharacteristic {
    notify: bool,
}

impl RemoteCharacteristic for SimCharacteristic {
    fn can_notify(&self) -> bool {
        self.notify
    }
}

pub struct SimRadio<'a> {
    events: EventSender<'a>,
    name: &'static str,
    available: bool,
    scanning: bool,
    connected: bool,
    subscribed: bool,
    /// Connect attempts still scripted to fail.
    fail_connects: u8,
    bpm: u16,
    rising: bool,
    /// When the next measurement is due; `None` sends on the next tick.
    next_beat: Option<Millis>,
}

impl<'a> SimRadio<'a> {
    pub fn new(events: EventSender<'a>) -> Self {
        Self {
            events,
            name: SIM_NAME,
            available: true,
            scanning: false,
            connected: false,
            subscribed: false,
            fail_connects: 0,
            bpm: SIM_BPM_LOW,
            rising: true,
            next_beat: None,
        }
    }

    /// Advertise under a different name.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Make the next `count` connect attempts fail.
    pub fn with_connect_failures(mut self, count: u8) -> Self {
        self.fail_connects = count;
        self
    }

    /// Simulate the controller going away (or coming back).
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
        if !available {
            self.scanning = false;
            self.connected = false;
            self.subscribed = false;
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Next bpm the strap will report.
    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    /// Drop the link as if the strap walked out of range.
    pub fn drop_link(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        self.subscribed = false;
        // 0x08: connection timeout
        self.events.link_dropped(0x08);
    }

    /// Emit a measurement if one is due.  Returns the bpm sent.
    pub fn tick(&mut self, now: Millis) -> Option<u16> {
        if !self.subscribed {
            return None;
        }
        if let Some(due) = self.next_beat {
            if !now.has_reached(due) {
                return None;
            }
        }

        let bpm = self.bpm;
        let flags = FLAG_CONTACT_SUPPORTED | FLAG_CONTACT_DETECTED;
        // Sweep range fits the 8-bit format.
        self.events.notification(&[flags, bpm as u8]);
        self.next_beat = Some(now + SIM_BEAT_INTERVAL_MS);
        self.step();
        Some(bpm)
    }

    fn step(&mut self) {
        if self.rising {
            self.bpm = (self.bpm + BPM_STEP).min(SIM_BPM_HIGH);
            self.rising = self.bpm < SIM_BPM_HIGH;
        } else {
            self.bpm = self.bpm.saturating_sub(BPM_STEP).max(SIM_BPM_LOW);
            self.rising = self.bpm <= SIM_BPM_LOW;
        }
    }

    fn advertising_data(&self) -> Vec<u8, 31> {
        let mut data = Vec::new();
        let [lo, hi] = HR_SERVICE_UUID.to_le_bytes();
        let _ = data.extend_from_slice(&[2, AD_FLAGS, 0x06]);
        let _ = data.extend_from_slice(&[3, AD_COMPLETE_UUID16, lo, hi]);

        let name = self.name.as_bytes();
        let room = data.capacity() - data.len() - 2;
        let name = &name[..name.len().min(room)];
        let _ = data.push(name.len() as u8 + 1);
        let _ = data.push(AD_COMPLETE_NAME);
        let _ = data.extend_from_slice(name);
        data
    }
}

impl Radio for SimRadio<'_> {
    type Service = SimService;
    type Characteristic = SimCharacteristic;

    fn start_scan(&mut self, _duration_ms: u32) -> Result<(), RadioError> {
        if !self.available {
            return Err(RadioError::Unavailable);
        }
        self.scanning = true;
        let adv = Advertisement::from_ad_data(SIM_ADDRESS, SIM_RSSI, &self.advertising_data());
        self.events.advertisement(adv);
        Ok(())
    }

    fn stop_scan(&mut self) {
        self.scanning = false;
    }

    fn is_scanning(&self) -> bool {
        self.scanning
    }

    fn connect(&mut self, target: &Candidate) -> Result<(), RadioError> {
        if !self.available {
            return Err(RadioError::Unavailable);
        }
        if target.address != SIM_ADDRESS {
            return Err(RadioError::ConnectFailed);
        }
        if self.fail_connects > 0 {
            self.fail_connects -= 1;
            return Err(RadioError::ConnectFailed);
        }
        self.scanning = false;
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.subscribed = false;
    }

    fn find_service(&mut self, uuid: u16) -> Option<SimService> {
        (self.connected && uuid == HR_SERVICE_UUID).then_some(SimService)
    }

    fn find_characteristic(&mut self, _service: &SimService, uuid: u16) -> Option<SimCharacteristic> {
        (self.connected && uuid == HR_MEASUREMENT_CHAR_UUID)
            .then_some(SimCharacteristic { notify: true })
    }

    fn subscribe(&mut self, _characteristic: &SimCharacteristic) -> Result<(), RadioError> {
        if !self.connected {
            return Err(RadioError::SubscribeFailed);
        }
        self.subscribed = true;
        self.next_beat = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::selector::Tier;
    use crate::ble::{EventQueue, RadioEvent};
    use crate::hrm::HeartRateMeasurement;

    fn queue() -> &'static EventQueue {
        Box::leak(Box::new(EventQueue::new()))
    }

    fn target() -> Candidate {
        Candidate {
            address: SIM_ADDRESS,
            name: None,
            rssi: SIM_RSSI,
            tier: Tier::Service,
        }
    }

    fn subscribed(q: &'static EventQueue) -> SimRadio<'static> {
        let mut radio = SimRadio::new(EventSender::new(q));
        radio.connect(&target()).unwrap();
        let service = radio.find_service(HR_SERVICE_UUID).unwrap();
        let ch = radio
            .find_characteristic(&service, HR_MEASUREMENT_CHAR_UUID)
            .unwrap();
        radio.subscribe(&ch).unwrap();
        radio
    }

    #[test]
    fn scan_reports_heart_rate_strap() {
        let q = queue();
        let mut radio = SimRadio::new(EventSender::new(q)).with_name("Bench Strap");
        radio.start_scan(7_000).unwrap();
        assert!(radio.is_scanning());

        match q.try_receive() {
            Ok(RadioEvent::Advertisement(adv)) => {
                assert_eq!(adv.address, SIM_ADDRESS);
                assert_eq!(adv.name.as_deref(), Some("Bench Strap"));
                assert!(adv.advertises_heart_rate());
            }
            other => panic!("expected advertisement, got {:?}", other),
        }
    }

    #[test]
    fn long_name_is_clipped_to_advertising_payload() {
        let q = queue();
        let mut radio = SimRadio::new(EventSender::new(q))
            .with_name("A Remarkably Long Simulated Strap Name");
        radio.start_scan(7_000).unwrap();
        let Ok(RadioEvent::Advertisement(adv)) = q.try_receive() else {
            panic!("expected advertisement");
        };
        assert_eq!(adv.name.as_deref(), Some("A Remarkably Long Simu"));
    }

    #[test]
    fn scripted_connect_failures() {
        let q = queue();
        let mut radio = SimRadio::new(EventSender::new(q)).with_connect_failures(2);
        assert_eq!(radio.connect(&target()), Err(RadioError::ConnectFailed));
        assert_eq!(radio.connect(&target()), Err(RadioError::ConnectFailed));
        assert_eq!(radio.connect(&target()), Ok(()));
        assert!(radio.is_connected());
    }

    #[test]
    fn unknown_address_is_refused() {
        let q = queue();
        let mut radio = SimRadio::new(EventSender::new(q));
        let mut other = target();
        other.address = Address([1; 6]);
        assert_eq!(radio.connect(&other), Err(RadioError::ConnectFailed));
    }

    #[test]
    fn nothing_to_discover_while_disconnected() {
        let q = queue();
        let mut radio = SimRadio::new(EventSender::new(q));
        assert_eq!(radio.find_service(HR_SERVICE_UUID), None);
    }

    #[test]
    fn unavailable_controller() {
        let q = queue();
        let mut radio = SimRadio::new(EventSender::new(q));
        radio.set_available(false);
        assert_eq!(radio.start_scan(7_000), Err(RadioError::Unavailable));
        assert!(q.try_receive().is_err());
    }

    #[test]
    fn beats_once_per_interval() {
        let q = queue();
        let mut radio = subscribed(q);
        assert_eq!(radio.tick(Millis(0)), Some(60));
        assert_eq!(radio.tick(Millis(500)), None);
        assert_eq!(radio.tick(Millis(1_000)), Some(62));

        let Ok(RadioEvent::Notification(payload)) = q.try_receive() else {
            panic!("expected notification");
        };
        let m = HeartRateMeasurement::parse(&payload).unwrap();
        assert_eq!(m.bpm, 60);
    }

    #[test]
    fn bpm_sweeps_between_bounds() {
        let q = queue();
        let mut radio = subscribed(q);
        let mut seen = std::vec::Vec::new();
        for i in 0..120u32 {
            seen.push(radio.tick(Millis(i * SIM_BEAT_INTERVAL_MS)).unwrap());
            let _ = q.try_receive();
        }
        assert_eq!(seen[0], SIM_BPM_LOW);
        assert_eq!(seen[40], SIM_BPM_HIGH);
        assert_eq!(seen[41], SIM_BPM_HIGH - 2);
        assert_eq!(seen[80], SIM_BPM_LOW);
        assert_eq!(seen[81], SIM_BPM_LOW + 2);
        assert!(seen.iter().all(|&b| (SIM_BPM_LOW..=SIM_BPM_HIGH).contains(&b)));
        assert!(seen.windows(2).all(|w| w[0].abs_diff(w[1]) == 2));
    }

    #[test]
    fn drop_link_reports_and_stops_beats() {
        let q = queue();
        let mut radio = subscribed(q);
        radio.drop_link();
        assert!(!radio.is_connected());
        assert_eq!(
            q.try_receive(),
            Ok(RadioEvent::LinkDropped {
                reason: crate::ble::DisconnectReason(0x08)
            })
        );
        assert_eq!(radio.tick(Millis(5_000)), None);

        // Second drop is a no-op.
        radio.drop_link();
        assert!(q.try_receive().is_err());
    }
}
