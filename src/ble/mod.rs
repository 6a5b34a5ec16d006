//! Bluetooth Low Energy subsystem.
//!
//! The device runs in the **Central** role against a single heart-rate
//! strap:
//!
//! 1. **Selector** - scores advertisements and keeps the one best
//!    connection target.
//! 2. **HR Client** - performs GATT service/characteristic discovery on a
//!    connected peripheral and subscribes to Heart Rate Measurement
//!    notifications.
//! 3. **Link** - the connection state machine: scan, connect, subscribe,
//!    back off and recover.
//!
//! The radio stack itself sits behind the [`radio::Radio`] trait.  It hands
//! events back through the [`EventQueue`], which the link drains on every
//! poll.

pub mod adv_parser;
pub mod backoff;
pub mod hr_client;
pub mod link;
pub mod radio;
pub mod selector;

use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use heapless::{String, Vec};

use crate::config::{
    DEVICE_NAME_LEN, EVENT_QUEUE_DEPTH, HR_SERVICE_UUID, MAX_ADV_SERVICES, MAX_NOTIFICATION_LEN,
};

/// Advertised device name, truncated to [`DEVICE_NAME_LEN`] bytes.
pub type DeviceName = String<DEVICE_NAME_LEN>;

/// Raw heart-rate notification payload.
pub type NotificationData = Vec<u8, MAX_NOTIFICATION_LEN>;

/// Inbound event queue shared between the radio context and the link.
pub type EventQueue = Channel<CriticalSectionRawMutex, RadioEvent, EVENT_QUEUE_DEPTH>;

/// Receiving half of the [`EventQueue`], owned by the link.
pub type EventReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, RadioEvent, EVENT_QUEUE_DEPTH>;

/// 48-bit BLE device address (little-endian as on air).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(pub [u8; 6]);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[5], b[4], b[3], b[2], b[1], b[0]
        )
    }
}

/// Lifecycle of the link to the heart-rate strap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// Idle, waiting for the scan-resume deadline.
    #[default]
    Disconnected,
    /// Radio scan window open.
    Scanning,
    /// Target selected, connect attempt pending.
    Connecting,
    /// Connected and receiving measurements.
    Subscribed,
    /// Unrecoverable; left only through an explicit recover.
    Error,
}

impl ConnectionState {
    /// Whether `self -> next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (_, Error) => true,
            (Disconnected, Scanning) => true,
            (Disconnected | Scanning, Connecting) => true,
            (Scanning, Disconnected) => true,
            (Connecting, Subscribed | Disconnected) => true,
            (Subscribed, Disconnected) => true,
            (Error, Disconnected) => true,
            _ => false,
        }
    }

    /// Short lowercase label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Scanning => "scanning",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Subscribed => "connected",
            ConnectionState::Error => "error",
        }
    }
}

/// One observed advertisement.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Advertisement {
    pub address: Address,
    pub name: Option<DeviceName>,
    /// 16-bit service UUIDs listed in the advertisement.
    pub services: Vec<u16, MAX_ADV_SERVICES>,
    /// Received Signal Strength Indicator (dBm).
    pub rssi: i8,
}

impl Advertisement {
    /// Build from already-decoded fields.  Names longer than
    /// [`DEVICE_NAME_LEN`] bytes are truncated at a char boundary.
    pub fn new(address: Address, name: Option<&str>, services: &[u16], rssi: i8) -> Self {
        let mut list = Vec::new();
        for &uuid in services.iter().take(MAX_ADV_SERVICES) {
            let _ = list.push(uuid);
        }
        Self {
            address,
            name: name.map(truncate_name),
            services: list,
            rssi,
        }
    }

    /// Build from raw advertising data (AD structures).
    pub fn from_ad_data(address: Address, rssi: i8, data: &[u8]) -> Self {
        Self {
            address,
            name: adv_parser::extract_device_name(data),
            services: adv_parser::service_uuids16(data),
            rssi,
        }
    }

    /// `true` if `uuid` is in the advertised service list.
    pub fn advertises(&self, uuid: u16) -> bool {
        self.services.contains(&uuid)
    }

    /// `true` if the Heart Rate Service is advertised.
    pub fn advertises_heart_rate(&self) -> bool {
        self.advertises(HR_SERVICE_UUID)
    }
}

/// Copy `name` into a [`DeviceName`], dropping whatever does not fit.
pub fn truncate_name(name: &str) -> DeviceName {
    let mut out = DeviceName::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Why the radio stack reports the link as gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisconnectReason(pub u8);

/// Events the radio stack delivers inward.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioEvent {
    /// A device advertised while scanning.
    Advertisement(Advertisement),
    /// A Heart Rate Measurement notification arrived.
    Notification(NotificationData),
    /// The connection went away.
    LinkDropped { reason: DisconnectReason },
}

/// Producer handle the radio stack uses to push events.
///
/// Sending never blocks: when the queue is full the event is dropped,
/// matching the best-effort nature of the telemetry stream.
#[derive(Clone, Copy)]
pub struct EventSender<'a> {
    inner: Sender<'a, CriticalSectionRawMutex, RadioEvent, EVENT_QUEUE_DEPTH>,
}

impl<'a> EventSender<'a> {
    pub fn new(queue: &'a EventQueue) -> Self {
        Self {
            inner: queue.sender(),
        }
    }

    /// Queue an event; returns `false` if it was dropped.
    pub fn send(&self, event: RadioEvent) -> bool {
        if self.inner.try_send(event).is_err() {
            warn!("Radio event queue full - dropping event");
            return false;
        }
        true
    }

    /// Queue an advertisement report.
    pub fn advertisement(&self, adv: Advertisement) -> bool {
        self.send(RadioEvent::Advertisement(adv))
    }

    /// Queue a notification payload; oversized payloads are truncated to
    /// [`MAX_NOTIFICATION_LEN`] bytes.
    pub fn notification(&self, data: &[u8]) -> bool {
        let len = data.len().min(MAX_NOTIFICATION_LEN);
        let mut payload = NotificationData::new();
        let _ = payload.extend_from_slice(&data[..len]);
        self.send(RadioEvent::Notification(payload))
    }

    /// Queue a link-dropped report.
    pub fn link_dropped(&self, reason: u8) -> bool {
        self.send(RadioEvent::LinkDropped {
            reason: DisconnectReason(reason),
        })
    }
}
