//! I2C bus abstractions
//!
//! The secure element needs finer control over the bus than a
//! transaction-level API gives: the wake pulse is produced by pinging
//! address 0 at a reduced clock, and responses are read one byte at a
//! time because the first byte announces how many follow.

/// Byte-level I2C bus master
///
/// Addresses passed to this trait are 8-bit wire addresses: the 7-bit
/// device address already shifted left by one, with bit 0 holding the
/// read/write flag.
pub trait I2cMaster {
    /// Change the SCL frequency
    fn set_frequency(&mut self, hz: u32);

    /// Issue a start (or repeated start) condition
    fn start(&mut self);

    /// Issue a stop condition
    fn stop(&mut self);

    /// Clock one byte out
    ///
    /// Returns `true` if the receiver acknowledged it.
    fn send_byte(&mut self, byte: u8) -> bool;

    /// Clock one byte in
    ///
    /// # Arguments
    /// * `ack` - Acknowledge the byte so the device keeps sending. Pass
    ///   `false` for the final byte of a transfer.
    fn read_byte(&mut self, ack: bool) -> u8;

    /// Write `prefix` followed by `data` to the device at `address`
    ///
    /// The sequence is start, address (write), prefix, data, stop. The
    /// stop condition is issued even when a byte is not acknowledged.
    ///
    /// Returns `true` if every byte was acknowledged.
    fn put(&mut self, address: u8, prefix: u8, data: &[u8]) -> bool {
        self.start();
        let mut acked = self.send_byte(address & !0x01) && self.send_byte(prefix);
        if acked {
            for &byte in data {
                if !self.send_byte(byte) {
                    acked = false;
                    break;
                }
            }
        }
        self.stop();
        acked
    }

    /// Zero-length presence probe
    ///
    /// Returns `true` if a device acknowledged `address`.
    fn ping(&mut self, address: u8) -> bool {
        self.start();
        let acked = self.send_byte(address);
        self.stop();
        acked
    }
}

impl<T: I2cMaster + ?Sized> I2cMaster for &mut T {
    fn set_frequency(&mut self, hz: u32) {
        T::set_frequency(self, hz)
    }

    fn start(&mut self) {
        T::start(self)
    }

    fn stop(&mut self) {
        T::stop(self)
    }

    fn send_byte(&mut self, byte: u8) -> bool {
        T::send_byte(self, byte)
    }

    fn read_byte(&mut self, ack: bool) -> u8 {
        T::read_byte(self, ack)
    }

    fn put(&mut self, address: u8, prefix: u8, data: &[u8]) -> bool {
        T::put(self, address, prefix, data)
    }

    fn ping(&mut self, address: u8) -> bool {
        T::ping(self, address)
    }
}

/// Bus clock presets
///
/// The secure elements accept anything up to fast mode plus. Standard
/// mode is slow enough that a ping to address 0 holds SDA low for longer
/// than the minimum wake pulse width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// SCL frequency in Hz
    pub frequency: u32,
}

impl I2cConfig {
    /// 100 kHz, used for the wake pulse
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// 400 kHz, the usual operating clock
    pub const FAST: Self = Self { frequency: 400_000 };

    /// 1 MHz, the fastest clock the devices accept
    pub const FAST_PLUS: Self = Self {
        frequency: 1_000_000,
    };

    /// Apply this clock to `master`
    pub fn apply<M: I2cMaster + ?Sized>(&self, master: &mut M) {
        master.set_frequency(self.frequency);
    }
}
