//! Bus configuration
//!
//! Describes which bus and address a secure element sits on and how to
//! talk to it. Boards typically build this in code or load it alongside
//! the rest of their configuration (enable the `serde` feature).

use cryptoauth_hal::I2cConfig;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

/// Default 8-bit wire address of a factory-fresh device
pub const DEFAULT_SLAVE_ADDRESS: u8 = 0xC0;

/// Default bus clock (fast mode)
pub const DEFAULT_BAUD_RATE: u32 = I2cConfig::FAST.frequency;

/// Default wake recovery time in microseconds
pub const DEFAULT_WAKE_DELAY_US: u32 = 800;

/// Default number of receive attempts
pub const DEFAULT_RX_RETRIES: u8 = 20;

/// Physical interface the device is wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InterfaceKind {
    #[default]
    I2c,
    /// Single-wire interface
    Swi,
    Uart,
    Spi,
}

/// Secure element family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceType {
    Atsha204a,
    Atecc108a,
    Atecc508a,
    #[default]
    Atecc608a,
    /// Revision signature did not match any known family
    Unknown,
}

/// Per-device bus configuration
///
/// `bus_index` is a reference into the [`BusRegistry`](crate::BusRegistry)
/// that is resolved on every call, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BusConfig {
    /// Interface kind (only I2C is served by this transport)
    pub interface: InterfaceKind,
    /// Device family tag
    pub device_type: DeviceType,
    /// 8-bit wire address, stored with the read/write flag cleared
    #[cfg_attr(feature = "serde", serde(deserialize_with = "write_address"))]
    slave_address: u8,
    /// Index into the bus registry
    pub bus_index: u8,
    /// Bus clock in Hz
    pub baud_rate: u32,
    /// Wake recovery time in microseconds
    pub wake_delay_us: u32,
    /// Receive attempts before giving up (0 behaves as 1)
    pub rx_retries: u8,
}

#[cfg(feature = "serde")]
fn write_address<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    u8::deserialize(deserializer).map(|address| address & !0x01)
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            interface: InterfaceKind::I2c,
            device_type: DeviceType::Atecc608a,
            slave_address: DEFAULT_SLAVE_ADDRESS,
            bus_index: 0,
            baud_rate: DEFAULT_BAUD_RATE,
            wake_delay_us: DEFAULT_WAKE_DELAY_US,
            rx_retries: DEFAULT_RX_RETRIES,
        }
    }
}

impl BusConfig {
    /// Configuration for a device at a 7-bit address
    pub fn from_7bit_address(address: u8) -> Self {
        Self::default().with_slave_address(address << 1)
    }

    /// 8-bit write address (read/write flag cleared)
    pub fn slave_address(&self) -> u8 {
        self.slave_address & !0x01
    }

    /// 8-bit read address (read/write flag set)
    pub fn read_address(&self) -> u8 {
        self.slave_address() | 0x01
    }

    /// 7-bit device address
    pub fn address_7bit(&self) -> u8 {
        self.slave_address >> 1
    }

    pub fn with_slave_address(mut self, address: u8) -> Self {
        self.slave_address = address & !0x01;
        self
    }

    pub fn with_bus_index(mut self, bus_index: u8) -> Self {
        self.bus_index = bus_index;
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_wake_delay_us(mut self, wake_delay_us: u32) -> Self {
        self.wake_delay_us = wake_delay_us;
        self
    }

    pub fn with_rx_retries(mut self, rx_retries: u8) -> Self {
        self.rx_retries = rx_retries;
        self
    }

    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn with_interface(mut self, interface: InterfaceKind) -> Self {
        self.interface = interface;
        self
    }
}
