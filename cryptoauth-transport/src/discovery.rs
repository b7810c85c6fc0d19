//! Device discovery
//!
//! Walks every valid 7-bit address on a bus, asks whatever answers for
//! its revision, and classifies the device family from the 4-byte
//! revision signature.

use cryptoauth_hal::{Delay, I2cMaster};
use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{BusConfig, DeviceType};
use crate::error::TransportError;
use crate::packet::{
    info_revision_request, revision, verify_crc, INFO_EXECUTION_TIME_MS, INFO_RSP_SIZE,
    REVISION_SIZE,
};
use crate::registry::BusRegistry;
use crate::transport::Transport;

/// Lowest 7-bit address probed
pub const FIRST_ADDRESS: u8 = 0x07;

/// Highest 7-bit address probed
pub const LAST_ADDRESS: u8 = 0x78;

/// Recovery time after each probed address
pub const SETTLE_DELAY_MS: u32 = 15;

/// Bus clock used while probing
pub const PROBE_BAUD_RATE: u32 = 400_000;

/// Wake recovery time used while probing
pub const PROBE_WAKE_DELAY_US: u32 = 800;

/// Receive attempts per probe
pub const PROBE_RX_RETRIES: u8 = 3;

type Signature = [u8; REVISION_SIZE];

/// Known revision signatures, checked in order
const SIGNATURES: [(DeviceType, &[Signature]); 4] = [
    (
        DeviceType::Atecc608a,
        &[[0x00, 0x00, 0x60, 0x01], [0x00, 0x00, 0x60, 0x02]],
    ),
    (DeviceType::Atecc508a, &[[0x00, 0x00, 0x50, 0x00]]),
    (
        DeviceType::Atsha204a,
        &[
            [0x00, 0x02, 0x00, 0x08],
            [0x00, 0x02, 0x00, 0x09],
            [0x00, 0x04, 0x05, 0x00],
        ],
    ),
    (DeviceType::Atecc108a, &[[0x80, 0x00, 0x10, 0x01]]),
];

/// A device found by [`discover_devices`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiscoveredDevice {
    pub bus_index: u8,
    /// 8-bit wire address
    pub slave_address: u8,
    pub device_type: DeviceType,
}

impl DiscoveredDevice {
    /// Configuration for talking to this device with the probe settings
    pub fn to_config(&self) -> BusConfig {
        probe_config(self.bus_index, self.slave_address >> 1).with_device_type(self.device_type)
    }
}

/// Map a revision signature to its device family
pub fn classify(signature: &Signature) -> DeviceType {
    SIGNATURES
        .iter()
        .find(|(_, known)| known.contains(signature))
        .map(|(device_type, _)| *device_type)
        .unwrap_or(DeviceType::Unknown)
}

/// Configuration used to probe one 7-bit address
pub fn probe_config(bus_index: u8, address: u8) -> BusConfig {
    BusConfig::from_7bit_address(address)
        .with_bus_index(bus_index)
        .with_device_type(DeviceType::Atecc508a)
        .with_baud_rate(PROBE_BAUD_RATE)
        .with_wake_delay_us(PROBE_WAKE_DELAY_US)
        .with_rx_retries(PROBE_RX_RETRIES)
}

/// Scan `bus_index` and append recognised devices to `found`
///
/// Addresses that do not answer, or answer with an unknown signature,
/// are skipped. The settle delay follows every probed address. The scan
/// ends early once `found` is full.
///
/// Returns the number of devices appended.
pub fn discover_devices<M, D, const N: usize, const R: usize>(
    registry: &mut BusRegistry<M, N>,
    delay: &mut D,
    bus_index: u8,
    found: &mut Vec<DiscoveredDevice, R>,
) -> Result<usize, TransportError>
where
    M: I2cMaster,
    D: Delay,
{
    registry.resolve(bus_index)?;

    let request = info_revision_request();
    let mut count = 0;

    for address in FIRST_ADDRESS..=LAST_ADDRESS {
        if found.is_full() {
            debug!("result table full, stopping at {:#x}", address);
            break;
        }

        let config = probe_config(bus_index, address);
        let slave_address = config.slave_address();
        match probe(registry, &mut *delay, config, &request) {
            Ok(DeviceType::Unknown) => {
                warn!("unrecognised revision at {:#x}", address);
            }
            Ok(device_type) => {
                info!("found {} at {:#x}", device_type, address);
                let device = DiscoveredDevice {
                    bus_index,
                    slave_address,
                    device_type,
                };
                if found.push(device).is_ok() {
                    count += 1;
                }
            }
            Err(e) => {
                trace!("no response at {:#x}: {}", address, e);
            }
        }

        delay.delay_ms(SETTLE_DELAY_MS);
    }

    Ok(count)
}

/// Run one revision exchange against `config`'s address
fn probe<M, D, const N: usize>(
    registry: &mut BusRegistry<M, N>,
    delay: D,
    config: BusConfig,
    request: &[u8],
) -> Result<DeviceType, TransportError>
where
    M: I2cMaster,
    D: Delay,
{
    let mut transport = Transport::new(registry, delay, config);
    transport.init()?;
    let response = transport.execute(request, INFO_EXECUTION_TIME_MS, INFO_RSP_SIZE);
    transport.release()?;

    let response = response?;
    if !verify_crc(&response) {
        return Err(TransportError::BadCrc);
    }
    let signature = revision(&response).ok_or(TransportError::InvalidSize)?;
    Ok(classify(&signature))
}
