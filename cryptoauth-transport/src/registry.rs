//! Bus registry
//!
//! Owns every I2C master for the lifetime of the program. It is built
//! once by the board and handed by reference to the transport, which
//! resolves its configured bus index on every call.

use cryptoauth_hal::I2cMaster;
use heapless::Vec;

use crate::error::TransportError;

/// Fixed-size table of I2C masters indexed by logical bus number
pub struct BusRegistry<M, const N: usize> {
    buses: [M; N],
}

impl<M: I2cMaster, const N: usize> BusRegistry<M, N> {
    /// Create a registry from the board's bus masters
    pub fn new(buses: [M; N]) -> Self {
        Self { buses }
    }

    /// Number of configured buses
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Look up the master for `bus_index`
    pub fn resolve(&mut self, bus_index: u8) -> Result<&mut M, TransportError> {
        match self.buses.get_mut(usize::from(bus_index)) {
            Some(bus) => Ok(bus),
            None => {
                warn!("bus {} not available ({} configured)", bus_index, N);
                Err(TransportError::BusNotAvailable)
            }
        }
    }

    /// Configured bus indices
    ///
    /// This is a listing of the table, not an electrical scan.
    pub fn discover_buses(&self) -> Vec<u8, N> {
        (0..N).filter_map(|index| u8::try_from(index).ok()).collect()
    }

    /// Hand the masters back to the board
    pub fn into_inner(self) -> [M; N] {
        self.buses
    }
}
