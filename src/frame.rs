//! Wire format of the PM1003 serial protocol.
//!
//! Measurement frame (8 bytes):
//!
//! ```text
//! 0x42 0x4D LEN=0x04 PM2.5_HI PM2.5_LO STATUS RESERVED CS
//! ```
//!
//! Command frame (Cubic command set, 5 bytes):
//!
//! ```text
//! 0x11 LEN=0x02 CMD DATA CS
//! ```
//!
//! The only command sent is "read measurement" (`11 02 0B 01 E1`).
//!
//! PM2.5 is transmitted in 0.1 µg/m³ steps. Bit 0 of STATUS is the presence
//! flag. CS makes the wrapping 8-bit sum of the whole frame zero.

use scroll::{Pread, Pwrite, BE};

use crate::Error;

pub const START_1: u8 = 0x42;
pub const START_2: u8 = 0x4D;

/// Number of payload bytes announced in the length byte
pub const PAYLOAD_LEN: u8 = 4;
pub const FRAME_SIZE: usize = 3 + PAYLOAD_LEN as usize + 1;
pub const COMMAND_SIZE: usize = 5;

const PM2_5_OFFSET: usize = 3;
const STATUS_OFFSET: usize = 5;
const STATUS_PRESENCE: u8 = 0x01;

pub const COMMAND_HEAD: u8 = 0x11;
/// Bytes following the length byte, checksum excluded
const COMMAND_LEN: u8 = 2;
pub const CMD_READ_MEASUREMENT: u8 = 0x0b;

/// Measurement request written once per poll
pub const UART_REQUEST: [u8; COMMAND_SIZE] = [0x11, 0x02, 0x0b, 0x01, 0xe1];

/// Raw bytes of one complete, checksum-valid measurement frame
pub type Frame = [u8; FRAME_SIZE];

/// One decoded measurement
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// PM2.5 concentration in µg/m³
    pub pm2_5: f32,
    /// Presence bit reported by the sensor
    pub presence: bool,
}

/// Value that makes the wrapping sum of `bytes` and itself zero.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |sum, byte| sum.wrapping_add(*byte))
        .wrapping_neg()
}

/// True if the whole frame, checksum byte included, sums to zero.
pub fn verify_checksum(frame: &[u8]) -> bool {
    frame.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte)) == 0
}

pub fn create_command(cmd: u8, data: u8) -> Result<[u8; COMMAND_SIZE], scroll::Error> {
    let mut buffer = [0_u8; COMMAND_SIZE];
    let mut offset = 0usize;

    buffer.gwrite::<u8>(COMMAND_HEAD, &mut offset)?;
    buffer.gwrite::<u8>(COMMAND_LEN, &mut offset)?;
    buffer.gwrite::<u8>(cmd, &mut offset)?;
    buffer.gwrite::<u8>(data, &mut offset)?;

    let cs = checksum(&buffer[..offset]);
    buffer.gwrite::<u8>(cs, &mut offset)?;

    Ok(buffer)
}

///
/// Decodes a measurement frame. Does not look at the checksum, the reader has
/// already verified it.
///
pub fn decode(frame: &[u8]) -> Result<Reading, Error> {
    if frame.len() < FRAME_SIZE || frame[0] != START_1 || frame[1] != START_2 {
        return Err(Error::MalformedFrame);
    }

    let pm2_5 = frame
        .pread_with::<u16>(PM2_5_OFFSET, BE)
        .map_err(|_| Error::MalformedFrame)?;
    let status = frame
        .pread_with::<u8>(STATUS_OFFSET, BE)
        .map_err(|_| Error::MalformedFrame)?;

    Ok(Reading {
        pm2_5: f32::from(pm2_5) / 10.0,
        presence: status & STATUS_PRESENCE != 0,
    })
}
