//! Heart Rate Measurement characteristic (0x2A37) payload decoding.
//!
//! Layout:
//! ```text
//! Byte 0: Flags
//!         Bit 0   = value format (0 = u8 bpm, 1 = u16 LE bpm)
//!         Bit 1-2 = sensor contact status
//!         Bit 3   = energy expended present
//!         Bit 4   = RR intervals present
//! Byte 1..: Heart rate value (1 or 2 bytes), then optional fields
//! ```
//!
//! Only the heart-rate value and the contact bits are interpreted; the
//! optional trailing fields are ignored.


/// Flags bit 0: heart-rate value is 16 bits wide.
pub const FLAG_HR_U16: u8 = 0x01;

/// Flags bit 2: sensor contact feature supported.
pub const FLAG_CONTACT_SUPPORTED: u8 = 0x04;

/// Flags bit 1: sensor contact detected (meaningful only when supported).
pub const FLAG_CONTACT_DETECTED: u8 = 0x02;

/// Skin contact as reported by the strap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorContact {
    /// The sensor does not report contact.
    Unsupported,
    /// Supported, and the strap is not touching skin.
    NotDetected,
    /// Supported, and contact is good.
    Detected,
}

impl SensorContact {
    fn from_flags(flags: u8) -> Self {
        match (
            flags & FLAG_CONTACT_SUPPORTED != 0,
            flags & FLAG_CONTACT_DETECTED != 0,
        ) {
            (false, _) => SensorContact::Unsupported,
            (true, false) => SensorContact::NotDetected,
            (true, true) => SensorContact::Detected,
        }
    }
}

/// One decoded heart-rate notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeartRateMeasurement {
    /// Beats per minute.
    pub bpm: u16,
    /// Contact status from flags bits 1-2.
    pub contact: SensorContact,
}

impl HeartRateMeasurement {
    /// Parse a raw notification.
    ///
    /// Returns `None` when the payload is shorter than the width the flags
    /// declare; such notifications are dropped without further action.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&flags, rest) = data.split_first()?;

        let bpm = if flags & FLAG_HR_U16 == 0 {
            u16::from(*rest.first()?)
        } else {
            match rest {
                [lo, hi, ..] => u16::from_le_bytes([*lo, *hi]),
                _ => return None,
            }
        };

        Some(Self {
            bpm,
            contact: SensorContact::from_flags(flags),
        })
    }
}
