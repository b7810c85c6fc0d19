//! Transport state machine
//!
//! Drives one secure element through its power states and moves frames
//! to and from it:
//!
//! ```text
//! Uninitialized ──init──▶ Ready ──wake──▶ Awake ◀──wake── Idle / Asleep
//!                                           │
//!                                           ├──idle──▶ Idle
//!                                           └──sleep─▶ Asleep
//!
//! any state ──release──▶ Released ──init──▶ Ready
//! ```
//!
//! The bus index in the configuration is resolved against the registry
//! on every call. Every path that issues a start condition issues the
//! matching stop before returning.

use cryptoauth_hal::{Delay, I2cConfig, I2cMaster};
use heapless::Vec;

use crate::config::{BusConfig, InterfaceKind};
use crate::error::TransportError;
use crate::packet::{
    word_address, RSP_SIZE_MAX, RSP_SIZE_MIN, WAKE_RESPONSE_EXPECTED, WAKE_SELFTEST_FAILED,
};
use crate::registry::BusRegistry;
use crate::retry::{Attempt, RetryPolicy};

/// Bus clock used while generating the wake pulse
pub const WAKE_CLOCK: I2cConfig = I2cConfig::STANDARD;

/// Wake pulse clock in Hz
pub const WAKE_FREQUENCY_HZ: u32 = WAKE_CLOCK.frequency;

/// A received frame; `len()` equals the length byte the device declared
pub type Response = Vec<u8, RSP_SIZE_MAX>;

/// Transport lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportState {
    /// No adapter bound yet
    Uninitialized,
    /// Adapter bound and clocked, device state unknown
    Ready,
    /// Wake token verified
    Awake,
    /// Idle command acknowledged
    Idle,
    /// Sleep command acknowledged
    Asleep,
    /// Bus handed back
    Released,
}

impl TransportState {
    /// Check if an adapter is bound in this state
    pub fn is_bound(&self) -> bool {
        !matches!(self, TransportState::Uninitialized | TransportState::Released)
    }
}

/// I2C transport for one device
///
/// Holds the registry mutably for its whole lifetime, so no other
/// exchange can run on any registered bus concurrently.
pub struct Transport<'r, M, D, const N: usize> {
    registry: &'r mut BusRegistry<M, N>,
    delay: D,
    config: BusConfig,
    state: TransportState,
}

impl<'r, M: I2cMaster, D: Delay, const N: usize> Transport<'r, M, D, N> {
    /// Create an unbound transport; call [`init`](Self::init) before use
    pub fn new(registry: &'r mut BusRegistry<M, N>, delay: D, config: BusConfig) -> Self {
        Self {
            registry,
            delay,
            config,
            state: TransportState::Uninitialized,
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Bind the configured bus and set its clock
    pub fn init(&mut self) -> Result<(), TransportError> {
        if self.config.interface != InterfaceKind::I2c {
            warn!("interface {} is not served by the I2C transport", self.config.interface);
            return Err(TransportError::BusNotAvailable);
        }

        let bus = self.registry.resolve(self.config.bus_index)?;
        bus.set_frequency(self.config.baud_rate);
        self.state = TransportState::Ready;

        debug!(
            "bus {} bound at {} Hz",
            self.config.bus_index, self.config.baud_rate
        );
        Ok(())
    }

    /// Wake the device and verify its wake token
    ///
    /// The pulse is a ping to address 0 at 100 kHz: nothing answers, but
    /// SDA is held low long enough to trip the wake circuit. After the
    /// recovery delay the real address is probed, then the 4-byte wake
    /// frame is read and compared.
    pub fn wake(&mut self) -> Result<(), TransportError> {
        self.ensure_bound()?;
        let bus = self.registry.resolve(self.config.bus_index)?;

        WAKE_CLOCK.apply(&mut *bus);
        // Address 0 never acknowledges; only the low SDA time matters
        let _ = bus.ping(0x00);
        bus.set_frequency(self.config.baud_rate);

        self.delay.delay_us(self.config.wake_delay_us);

        if !bus.ping(self.config.slave_address()) {
            debug!("no ack from {:#x} after wake", self.config.slave_address());
            return Err(TransportError::Timeout);
        }

        let frame = self.receive(RSP_SIZE_MIN)?;
        check_wake(&frame)?;

        self.state = TransportState::Awake;
        trace!("device {:#x} awake", self.config.slave_address());
        Ok(())
    }

    /// Send one command packet, prefixed with the command word address
    ///
    /// Not retried here; the device needs time to execute before a
    /// response exists, so retries live on the receive side.
    pub fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.put(word_address::COMMAND, data)
    }

    /// Receive one length-prefixed frame of at most `max_len` bytes
    ///
    /// `max_len` is clamped to [`RSP_SIZE_MAX`]. Only an unacknowledged
    /// read address is retried; length violations fail on the spot.
    pub fn receive(&mut self, max_len: usize) -> Result<Response, TransportError> {
        self.ensure_bound()?;
        if max_len == 0 {
            return Err(TransportError::BufferTooSmall);
        }

        let max_len = max_len.min(RSP_SIZE_MAX);
        let address = self.config.read_address();
        let policy = RetryPolicy::from_rx_retries(self.config.rx_retries);
        let bus = self.registry.resolve(self.config.bus_index)?;

        let result = policy.run(|_| read_frame(&mut *bus, address, max_len));
        if let Err(e) = &result {
            debug!("receive from {:#x} failed: {}", address, e);
        }
        result
    }

    /// Move the device to idle (RAM kept, fast wake)
    pub fn idle(&mut self) -> Result<(), TransportError> {
        self.put(word_address::IDLE, &[])?;
        self.state = TransportState::Idle;
        Ok(())
    }

    /// Move the device to sleep (needs a full wake afterwards)
    pub fn sleep(&mut self) -> Result<(), TransportError> {
        self.put(word_address::SLEEP, &[])?;
        self.state = TransportState::Asleep;
        Ok(())
    }

    /// Hand the bus back
    ///
    /// Idempotent and infallible; `init` binds the bus again.
    pub fn release(&mut self) -> Result<(), TransportError> {
        if self.state != TransportState::Released {
            trace!("bus {} released", self.config.bus_index);
        }
        self.state = TransportState::Released;
        Ok(())
    }

    /// Full command exchange: wake, send, wait, receive, idle
    ///
    /// The device is sent to idle whether or not the exchange succeeded.
    /// The first error wins.
    pub fn execute(
        &mut self,
        command: &[u8],
        execution_time_ms: u32,
        max_len: usize,
    ) -> Result<Response, TransportError> {
        let exchanged = self.wake().and_then(|()| {
            self.send(command)?;
            self.delay.delay_ms(execution_time_ms);
            self.receive(max_len)
        });
        let idled = self.idle();

        let response = exchanged?;
        idled?;
        Ok(response)
    }

    fn put(&mut self, prefix: u8, data: &[u8]) -> Result<(), TransportError> {
        self.ensure_bound()?;
        let address = self.config.slave_address();
        let bus = self.registry.resolve(self.config.bus_index)?;

        if bus.put(address, prefix, data) {
            Ok(())
        } else {
            debug!("write {:#x} to {:#x} not acknowledged", prefix, address);
            Err(TransportError::TxTimeout)
        }
    }

    fn ensure_bound(&self) -> Result<(), TransportError> {
        if self.state.is_bound() {
            Ok(())
        } else {
            Err(TransportError::BusNotAvailable)
        }
    }
}

/// One start/address/read/stop cycle
fn read_frame<M: I2cMaster>(bus: &mut M, read_address: u8, max_len: usize) -> Attempt<Response> {
    bus.start();
    if !bus.send_byte(read_address) {
        bus.stop();
        return Attempt::Retryable(TransportError::CommFail);
    }

    let declared = usize::from(bus.read_byte(true));
    if declared < RSP_SIZE_MIN {
        bus.stop();
        return Attempt::Fatal(TransportError::InvalidSize);
    }
    if declared > max_len {
        bus.stop();
        warn!("cannot receive {} bytes into {}", declared, max_len);
        return Attempt::Fatal(TransportError::BufferTooSmall);
    }

    let mut buffer = [0u8; RSP_SIZE_MAX];
    buffer[0] = declared as u8;
    for (i, byte) in buffer.iter_mut().enumerate().take(declared).skip(1) {
        // Final byte is not acknowledged to end the transfer
        *byte = bus.read_byte(i + 1 < declared);
    }
    bus.stop();

    match Response::from_slice(&buffer[..declared]) {
        Ok(frame) => Attempt::Success(frame),
        Err(()) => Attempt::Fatal(TransportError::BufferTooSmall),
    }
}

fn check_wake(frame: &[u8]) -> Result<(), TransportError> {
    if frame == WAKE_RESPONSE_EXPECTED {
        Ok(())
    } else if frame == WAKE_SELFTEST_FAILED {
        error!("device self test failed");
        Err(TransportError::SelfTestFailed)
    } else {
        Err(TransportError::WakeFailed)
    }
}
