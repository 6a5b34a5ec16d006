//! GATT Heart Rate client - discovers and subscribes to the Heart Rate
//! Measurement characteristic on a connected peripheral.
//!
//! After the GAP connection is established, this module:
//! 1. Discovers the Heart Rate Service (UUID 0x180D).
//! 2. Finds the Heart Rate Measurement characteristic (UUID 0x2A37).
//! 3. Checks that it supports notifications.
//! 4. Enables CCCD notifications; payloads then arrive on the event queue.

use crate::ble::radio::{Radio, RemoteCharacteristic};
use crate::config::{HR_MEASUREMENT_CHAR_UUID, HR_SERVICE_UUID};
use crate::error::LinkError;

/// Discover the Heart Rate service on the connected peripheral and
/// subscribe to measurement notifications.
///
/// Leaves the link as-is on failure; the caller decides whether to tear
/// it down.
pub fn discover_and_subscribe<R: Radio>(radio: &mut R) -> Result<(), LinkError> {
    debug!("Discovering Heart Rate service...");

    let service = radio
        .find_service(HR_SERVICE_UUID)
        .ok_or(LinkError::ServiceNotFound)?;

    let measurement = radio
        .find_characteristic(&service, HR_MEASUREMENT_CHAR_UUID)
        .ok_or(LinkError::CharacteristicNotFound)?;

    if !measurement.can_notify() {
        return Err(LinkError::NotifyUnsupported);
    }

    radio.subscribe(&measurement)?;

    info!("Subscribed to heart rate notifications");
    Ok(())
}
