//! I2C transport for CryptoAuthentication secure elements
//!
//! This crate drives ATECC/ATSHA devices at the byte-transport level:
//!
//! - Bus registry (logical bus index to I2C master)
//! - Two-phase wake (electrical pulse, then wake-token verification)
//! - Framed command send and length-prefixed receive with retry
//! - Idle/sleep power states and release
//! - Device discovery by revision signature
//!
//! Command semantics (opcodes, CRC of arbitrary commands, zone layout)
//! belong to the command library sitting on top of [`Transport`]. The
//! only command built here is the revision request used by discovery.
//!
//! Everything is blocking and single-threaded. The transport borrows the
//! [`BusRegistry`] mutably, so one exchange holds the bus from start to
//! stop. A multi-threaded port needs a mutex per registry entry.
//!
//! # Features
//!
//! - `defmt`: log through `defmt` and derive `defmt::Format` on public types
//! - `serde`: derive `Serialize`/`Deserialize` on configuration types
//!
//! The configuration loading tests parse TOML and only build with the
//! `serde` feature, so run the full suite as `cargo test --features serde`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod discovery;
pub mod error;
pub mod packet;
pub mod registry;
pub mod retry;
pub mod transport;

#[cfg(test)]
mod sim;

pub use config::{BusConfig, DeviceType, InterfaceKind};
pub use discovery::{classify, discover_devices, DiscoveredDevice};
pub use error::TransportError;
pub use registry::BusRegistry;
pub use retry::{Attempt, RetryPolicy};
pub use transport::{Response, Transport, TransportState};
