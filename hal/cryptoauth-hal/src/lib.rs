//! CryptoAuth Hardware Abstraction Layer
//!
//! This crate defines the bus and timing capabilities the secure-element
//! transport consumes. Boards implement them on top of their own I2C
//! peripheral (bit-banged or hardware) and timer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Command/response library (not here)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cryptoauth-transport (wake/send/recv)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cryptoauth-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  board I2C    │       │  board timer  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cMaster`] - Byte-level I2C master operations
//! - [`delay::Delay`] - Blocking microsecond/millisecond waits

#![no_std]
#![deny(unsafe_code)]

pub mod delay;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use delay::{Delay, HalDelay};
pub use i2c::{I2cConfig, I2cMaster};
