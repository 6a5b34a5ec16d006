//! Radio stack boundary.
//!
//! The link never talks to a BLE controller directly; board integrations
//! implement [`Radio`] on top of whatever stack they run (SoftDevice,
//! NimBLE, a host adapter, or [`crate::sim::SimRadio`]).  Calls are
//! synchronous: a connect attempt runs to completion inside one poll.
//!
//! Anything the stack learns asynchronously (advertisements, notifications,
//! disconnects) goes through [`crate::ble::EventSender`] instead of
//! callbacks.

use crate::ble::selector::Candidate;
use crate::error::RadioError;

/// A discovered GATT characteristic.
pub trait RemoteCharacteristic {
    /// `true` if the characteristic supports notifications.
    fn can_notify(&self) -> bool;
}

/// Operations the link issues to the radio stack.
pub trait Radio {
    /// Handle to a discovered primary service.
    type Service;
    /// Handle to a discovered characteristic.
    type Characteristic: RemoteCharacteristic;

    /// Start an active scan lasting `duration_ms`.
    ///
    /// Advertisements are reported through the event queue.
    fn start_scan(&mut self, duration_ms: u32) -> Result<(), RadioError>;

    /// Stop a running scan; no-op if none.
    fn stop_scan(&mut self);

    /// `true` while a scan window is open.
    fn is_scanning(&self) -> bool;

    /// Establish a connection to `target`.
    fn connect(&mut self, target: &Candidate) -> Result<(), RadioError>;

    /// `true` while the link to the last connected peer is up.
    fn is_connected(&self) -> bool;

    /// Tear down the link (or a half-open attempt); no-op if none.
    fn disconnect(&mut self);

    /// Look up a primary service by 16-bit UUID on the connected peer.
    fn find_service(&mut self, uuid: u16) -> Option<Self::Service>;

    /// Look up a characteristic by 16-bit UUID within `service`.
    fn find_characteristic(
        &mut self,
        service: &Self::Service,
        uuid: u16,
    ) -> Option<Self::Characteristic>;

    /// Enable notifications on `characteristic`.
    ///
    /// Notification payloads are reported through the event queue.
    fn subscribe(&mut self, characteristic: &Self::Characteristic) -> Result<(), RadioError>;
}
