//! Library interface for hrlink.
//!
//! Everything except the board glue lives here and builds on the host:
//! the connection state machine, candidate selection, measurement
//! decoding, the shared metrics store and the status-screen model.
//!
//! Usage: `cargo test --lib` (host) or `cargo test` for the integration
//! tests as well.
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and links against this library with the `embedded` feature enabled.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module.
mod fmt;

pub mod ble;
pub mod config;
pub mod error;
pub mod hrm;
pub mod metrics;
pub mod sim;
pub mod time;
pub mod ui;

pub use ble::link::HrLink;
pub use ble::radio::{Radio, RemoteCharacteristic};
pub use ble::{ConnectionState, EventQueue, EventSender, RadioEvent};
pub use config::LinkConfig;
pub use error::{LinkError, RadioError};
pub use metrics::{MetricsSnapshot, MetricsSource, MetricsStore};
pub use time::Millis;
