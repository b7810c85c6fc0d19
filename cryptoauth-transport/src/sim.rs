//! Simulated I2C bus and secure elements for host tests
//!
//! The bus and the delay source append to one shared event log so tests
//! can assert the exact interleaving of bus traffic and waits.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use cryptoauth_hal::{Delay, I2cMaster};

use crate::packet::{
    crc16, info_revision_request, word_address, INFO_RSP_SIZE, WAKE_RESPONSE_EXPECTED,
};
use crate::transport::WAKE_FREQUENCY_HZ;

/// Something observable on the bus or the delay source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Frequency(u32),
    Start,
    Stop,
    Write { byte: u8, ack: bool },
    Read { byte: u8, ack: bool },
    DelayUs(u32),
    DelayMs(u32),
}

/// Shared, append-only event log
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    /// Drain everything logged so far
    pub fn take(&self) -> Vec<Event> {
        core::mem::take(&mut *self.0.borrow_mut())
    }
}

/// Behavioural model of one secure element
#[derive(Debug, Clone)]
pub struct SimDevice {
    /// 8-bit write address
    pub address: u8,
    pub awake: bool,
    wake_token: [u8; 4],
    revision: Option<[u8; 4]>,
    echo: bool,
    nack_reads: usize,
    pending: VecDeque<u8>,
}

impl SimDevice {
    /// Asleep device with the standard wake token and no revision
    pub fn new(address: u8) -> Self {
        Self {
            address,
            awake: false,
            wake_token: WAKE_RESPONSE_EXPECTED,
            revision: None,
            echo: false,
            nack_reads: 0,
            pending: VecDeque::new(),
        }
    }

    pub fn awake(mut self) -> Self {
        self.awake = true;
        self
    }

    pub fn with_wake_token(mut self, token: [u8; 4]) -> Self {
        self.wake_token = token;
        self
    }

    pub fn with_revision(mut self, revision: [u8; 4]) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Answer every command by echoing its bytes back in a response frame
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Refuse the read address this many times
    pub fn with_nack_reads(mut self, count: usize) -> Self {
        self.nack_reads = count;
        self
    }

    pub fn with_pending(mut self, bytes: &[u8]) -> Self {
        self.pending = bytes.iter().copied().collect();
        self
    }

    fn wake(&mut self) {
        self.awake = true;
        self.pending = self.wake_token.iter().copied().collect();
    }

    fn power_down(&mut self) {
        self.awake = false;
        self.pending.clear();
    }

    fn respond(&mut self, body: &[u8]) {
        let length = body.len() + 3;
        let mut frame = Vec::with_capacity(length);
        frame.push(length as u8);
        frame.extend_from_slice(body);
        frame.extend_from_slice(&crc16(&frame).to_le_bytes());
        self.pending = frame.into_iter().collect();
    }

    fn command(&mut self, packet: &[u8]) {
        if self.echo {
            self.respond(packet);
        } else if packet == info_revision_request() {
            if let Some(revision) = self.revision {
                self.respond(&revision);
                debug_assert_eq!(self.pending.len(), INFO_RSP_SIZE);
            }
        }
    }

    fn written(&mut self, bytes: &[u8]) {
        match bytes.split_first() {
            Some((&word_address::SLEEP, _)) | Some((&word_address::IDLE, _)) => {
                self.power_down()
            }
            Some((&word_address::COMMAND, packet)) => self.command(packet),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    None,
    /// Address byte not sent yet
    Addressing,
    Write(usize),
    Read(usize),
    Refused,
}

/// Bus with any number of simulated devices attached
pub struct SimBus {
    log: EventLog,
    frequency: u32,
    devices: Vec<SimDevice>,
    selection: Selection,
    written: Vec<u8>,
}

impl SimBus {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            frequency: 400_000,
            devices: Vec::new(),
            selection: Selection::None,
            written: Vec::new(),
        }
    }

    pub fn attach(&mut self, device: SimDevice) {
        self.devices.push(device);
    }

    fn address(&mut self, byte: u8) -> bool {
        if byte == 0x00 {
            // General call at reduced clock doubles as the wake pulse
            if self.frequency <= WAKE_FREQUENCY_HZ {
                self.devices.iter_mut().for_each(SimDevice::wake);
            }
            self.selection = Selection::Refused;
            return false;
        }

        let target = byte & !0x01;
        let reading = byte & 0x01 != 0;
        let Some(index) = self
            .devices
            .iter()
            .position(|d| d.address == target && d.awake)
        else {
            self.selection = Selection::Refused;
            return false;
        };

        if reading {
            let device = &mut self.devices[index];
            if device.nack_reads > 0 {
                device.nack_reads -= 1;
                self.selection = Selection::Refused;
                return false;
            }
            self.selection = Selection::Read(index);
        } else {
            self.written.clear();
            self.selection = Selection::Write(index);
        }
        true
    }
}

impl I2cMaster for SimBus {
    fn set_frequency(&mut self, hz: u32) {
        self.frequency = hz;
        self.log.push(Event::Frequency(hz));
    }

    fn start(&mut self) {
        self.selection = Selection::Addressing;
        self.log.push(Event::Start);
    }

    fn stop(&mut self) {
        if let Selection::Write(index) = self.selection {
            let bytes = core::mem::take(&mut self.written);
            self.devices[index].written(&bytes);
        }
        self.selection = Selection::None;
        self.log.push(Event::Stop);
    }

    fn send_byte(&mut self, byte: u8) -> bool {
        let ack = match self.selection {
            Selection::Addressing => self.address(byte),
            Selection::Write(_) => {
                self.written.push(byte);
                true
            }
            _ => false,
        };
        self.log.push(Event::Write { byte, ack });
        ack
    }

    fn read_byte(&mut self, ack: bool) -> u8 {
        let byte = match self.selection {
            Selection::Read(index) => self.devices[index].pending.pop_front().unwrap_or(0xFF),
            _ => 0xFF,
        };
        self.log.push(Event::Read { byte, ack });
        byte
    }
}

/// Delay source that only records
pub struct SimDelay {
    log: EventLog,
}

impl SimDelay {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl Delay for SimDelay {
    fn delay_us(&mut self, us: u32) {
        self.log.push(Event::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.push(Event::DelayMs(ms));
    }
}
