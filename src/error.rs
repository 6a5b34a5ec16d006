//! Error types for hrlink.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

use core::fmt;

/// Failures reported by the radio stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// The radio stack is not initialised or has been shut down.
    ///
    /// This is the only radio failure the link cannot recover from.
    Unavailable,
    /// Scan was cancelled or could not start.
    ScanFailed,
    /// Connection attempt failed or timed out.
    ConnectFailed,
    /// CCCD write for notifications was rejected.
    SubscribeFailed,
    /// Raw stack-specific status code.
    Raw(u32),
}

impl RadioError {
    /// `true` when retrying cannot help.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RadioError::Unavailable)
    }
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadioError::Unavailable => f.write_str("radio unavailable"),
            RadioError::ScanFailed => f.write_str("scan failed"),
            RadioError::ConnectFailed => f.write_str("connect failed"),
            RadioError::SubscribeFailed => f.write_str("subscribe failed"),
            RadioError::Raw(code) => write!(f, "radio error {:#x}", code),
        }
    }
}

/// Why a connect + discover + subscribe attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// The radio stack rejected a call.
    Radio(RadioError),
    /// The peripheral does not expose the Heart Rate Service (0x180D).
    ServiceNotFound,
    /// The Heart Rate Measurement characteristic (0x2A37) was not found.
    CharacteristicNotFound,
    /// The measurement characteristic does not support notifications.
    NotifyUnsupported,
}

impl LinkError {
    /// `true` when the state machine should give up rather than back off.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LinkError::Radio(e) if e.is_fatal())
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Radio(e) => write!(f, "{}", e),
            LinkError::ServiceNotFound => f.write_str("heart rate service not found"),
            LinkError::CharacteristicNotFound => {
                f.write_str("heart rate measurement characteristic not found")
            }
            LinkError::NotifyUnsupported => f.write_str("characteristic cannot notify"),
        }
    }
}

// Convenience conversions

impl From<RadioError> for LinkError {
    fn from(e: RadioError) -> Self {
        LinkError::Radio(e)
    }
}
