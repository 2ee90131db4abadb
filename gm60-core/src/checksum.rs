//! GM60 frame checksum
//!
//! From the scanner datasheet:
//! 1. CRC-16/CCITT, polynomial `0x1021`
//! 2. Initial value `0x0000`, no input/output reflection, no final XOR
//! 3. Transmitted big-endian, high byte first
//!
//! Request frames are checked from the function byte to the end of the data,
//! response frames from the status byte to the end of the data.

use tracing::trace;

/// CRC-CCITT generator polynomial
pub const POLYNOMIAL: u16 = 0x1021;

/// Calculate the checksum of a covered span
///
/// # Algorithm
///
/// ```text
/// crc = 0
/// for byte in span:
///     crc ^= byte << 8
///     repeat 8: crc = (crc & 0x8000) ? (crc << 1) ^ 0x1021 : crc << 1
/// ```
///
/// # Examples
///
/// ```
/// use gm60_core::checksum;
///
/// // Body of the write acknowledgement `02 00 00 01 00 33 31`
/// assert_eq!(checksum::calculate(&[0x00, 0x01, 0x00]), 0x3331);
/// ```
pub fn calculate(span: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    
    for &byte in span {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    
    trace!(
        span_len = span.len(),
        checksum = format!("0x{:04X}", crc),
        "Calculated checksum"
    );
    
    crc
}

/// Verify checksum
pub fn verify(span: &[u8], expected: u16) -> bool {
    calculate(span) == expected
}
