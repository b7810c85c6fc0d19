//! Wire constants and the revision request
//!
//! Every I2C write to the device starts with a word-address byte that
//! selects what the write means. Responses are length-prefixed: byte 0
//! is the total frame length including itself and the trailing CRC.

/// Word-address bytes
pub mod word_address {
    /// Enter sleep (deepest power state, full wake required)
    pub const SLEEP: u8 = 0x01;
    /// Enter idle (RAM retained, faster wake)
    pub const IDLE: u8 = 0x02;
    /// A command packet follows
    pub const COMMAND: u8 = 0x03;
}

/// Smallest valid response frame (length, status, CRC)
pub const RSP_SIZE_MIN: usize = 4;

/// Largest response the transport will buffer
pub const RSP_SIZE_MAX: usize = 75;

/// Frame read after a successful wake
pub const WAKE_RESPONSE_EXPECTED: [u8; 4] = [0x04, 0x11, 0x33, 0x43];

/// Frame read after a wake when the power-on self test failed
pub const WAKE_SELFTEST_FAILED: [u8; 4] = [0x04, 0x07, 0xC4, 0x40];

/// Info command opcode
pub const OPCODE_INFO: u8 = 0x30;

/// Info mode returning the 4-byte revision
pub const INFO_MODE_REVISION: u8 = 0x00;

/// Info response: length, 4 revision bytes, CRC
pub const INFO_RSP_SIZE: usize = 7;

/// Worst-case Info execution time
pub const INFO_EXECUTION_TIME_MS: u32 = 1;

/// Bytes in a revision signature
pub const REVISION_SIZE: usize = 4;

/// Device CRC-16 (polynomial 0x8005, data bits fed LSB first)
pub fn crc16(data: &[u8]) -> u16 {
    const POLYNOMIAL: u16 = 0x8005;

    let mut crc: u16 = 0;
    for &byte in data {
        for bit in 0..8 {
            let data_bit = (byte >> bit) & 0x01;
            let crc_bit = (crc >> 15) as u8;
            crc <<= 1;
            if data_bit != crc_bit {
                crc ^= POLYNOMIAL;
            }
        }
    }
    crc
}

/// Check the little-endian CRC trailing a frame
pub fn verify_crc(frame: &[u8]) -> bool {
    if frame.len() < 3 {
        return false;
    }
    let (body, tail) = frame.split_at(frame.len() - 2);
    crc16(body) == u16::from_le_bytes([tail[0], tail[1]])
}

/// Info (revision) command packet, excluding the word address
pub fn info_revision_request() -> [u8; 7] {
    let mut packet = [
        7,
        OPCODE_INFO,
        INFO_MODE_REVISION,
        0x00,
        0x00,
        0x00,
        0x00,
    ];
    let crc = crc16(&packet[..5]).to_le_bytes();
    packet[5] = crc[0];
    packet[6] = crc[1];
    packet
}

/// Revision bytes of an Info response
///
/// Returns `None` unless the frame has the Info response shape.
pub fn revision(response: &[u8]) -> Option<[u8; REVISION_SIZE]> {
    if response.len() != INFO_RSP_SIZE || usize::from(response[0]) != INFO_RSP_SIZE {
        return None;
    }
    let mut signature = [0u8; REVISION_SIZE];
    signature.copy_from_slice(&response[1..1 + REVISION_SIZE]);
    Some(signature)
}
