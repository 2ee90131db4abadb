//! GM60 frame structure and encoding/decoding

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::{
    checksum,
    constants::{CHECKSUM_SIZE, REQUEST_PREAMBLE, RESPONSE_PREAMBLE_TAIL},
    error::{Error, Result},
};

/// Request function codes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FunctionCode {
    /// Read a block of registers
    Read = 0x07,
    /// Write a block of registers
    Write = 0x08,
    /// Persist the register file to flash
    SaveToFlash = 0x09,
}

impl From<FunctionCode> for u8 {
    fn from(function: FunctionCode) -> u8 {
        function as u8
    }
}

impl TryFrom<u8> for FunctionCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x07 => Ok(Self::Read),
            0x08 => Ok(Self::Write),
            0x09 => Ok(Self::SaveToFlash),
            _ => Err(Error::UnknownFunction(value)),
        }
    }
}

/// Kind of a response frame, taken from its first preamble byte
///
/// Command replies and scan results share one byte stream; the kind is what
/// tells a reply apart from a scan the device pushed on its own.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameKind {
    /// Reply to a read, write or save request
    Reply = 0x02,
    /// Decoded barcode, sent whenever a scan completes
    ScanData = 0x03,
}

impl FrameKind {
    /// Map a first preamble byte to its frame kind
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            0x02 => Some(Self::Reply),
            0x03 => Some(Self::ScanData),
            _ => None,
        }
    }

    pub fn marker(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Reply => "REPLY",
            Self::ScanData => "SCAN_DATA",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.marker())
    }
}

/// Request frame (host to scanner)
///
/// # Frame Structure
///
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐
/// │ Preamble │ Function │   Lens   │ Address  │   Data   │   CRC    │
/// │  7E 00   │  1 byte  │  1 byte  │ 2 bytes  │  N bytes │ 2 bytes  │
/// │          │          │   (N)    │  (BE)    │          │  (BE)    │
/// └──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘
/// ```
///
/// The checksum covers everything from the function byte to the end of the
/// data.
///
/// # Examples
///
/// ```
/// use gm60_core::{FunctionCode, RequestFrame};
///
/// let frame = RequestFrame::new(FunctionCode::SaveToFlash, 0x0000, vec![0x00]).unwrap();
/// assert_eq!(
///     frame.encode().as_ref(),
///     &[0x7E, 0x00, 0x09, 0x01, 0x00, 0x00, 0x00, 0xDE, 0xC8]
/// );
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct RequestFrame {
    /// Function code
    pub function: FunctionCode,
    
    /// First register address
    pub address: u16,
    
    /// Request data (register values or read count)
    pub data: Bytes,
}

impl RequestFrame {
    /// Preamble, function, lens and address
    pub const HEADER_SIZE: usize = 6;
    
    /// `Lens` is a single byte
    pub const MAX_DATA_SIZE: usize = u8::MAX as usize;
    
    /// Create a request frame
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when the data does not fit the
    /// one-byte length field.
    pub fn new(function: FunctionCode, address: u16, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.len() > Self::MAX_DATA_SIZE {
            return Err(Error::InvalidRequest(format!(
                "request data too large: {} bytes (max: {} bytes)",
                data.len(),
                Self::MAX_DATA_SIZE
            )));
        }
        
        Ok(Self {
            function,
            address,
            data,
        })
    }
    
    fn put_body(&self, buf: &mut BytesMut) {
        buf.put_u8(self.function.into());
        buf.put_u8(self.data.len() as u8);
        buf.put_u16(self.address);
        buf.put_slice(&self.data);
    }
    
    /// Calculate checksum for this frame
    pub fn checksum(&self) -> u16 {
        let mut body = BytesMut::with_capacity(self.size());
        self.put_body(&mut body);
        checksum::calculate(&body)
    }
    
    /// Encode frame to bytes
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());
        
        buf.put_slice(&REQUEST_PREAMBLE);
        self.put_body(&mut buf);
        
        let crc = checksum::calculate(&buf[REQUEST_PREAMBLE.len()..]);
        buf.put_u16(crc);
        
        buf
    }
    
    /// Decode a complete request frame
    ///
    /// Bytes after the checksum are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Buffer is shorter than the frame it declares
    /// - Preamble is not `7E 00`
    /// - Checksum verification fails
    /// - Function code is unknown
    pub fn decode(mut buf: BytesMut) -> Result<Self> {
        let min_size = Self::HEADER_SIZE + CHECKSUM_SIZE;
        if buf.len() < min_size {
            return Err(Error::PacketTooShort {
                expected: min_size,
                actual: buf.len(),
            });
        }
        
        if buf[..2] != REQUEST_PREAMBLE {
            return Err(Error::InvalidPreamble([buf[0], buf[1]]));
        }
        
        let data_len = usize::from(buf[3]);
        let total = Self::HEADER_SIZE + data_len + CHECKSUM_SIZE;
        if buf.len() < total {
            return Err(Error::PacketTooShort {
                expected: total,
                actual: buf.len(),
            });
        }
        
        let received = BigEndian::read_u16(&buf[total - CHECKSUM_SIZE..total]);
        let expected = checksum::calculate(&buf[REQUEST_PREAMBLE.len()..total - CHECKSUM_SIZE]);
        if expected != received {
            return Err(Error::ChecksumMismatch { expected, received });
        }
        
        buf.advance(REQUEST_PREAMBLE.len());
        let function = FunctionCode::try_from(buf.get_u8())?;
        buf.advance(1);
        let address = buf.get_u16();
        let data = buf.split_to(data_len).freeze();
        
        Ok(Self {
            function,
            address,
            data,
        })
    }
    
    /// Get total frame size
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.data.len() + CHECKSUM_SIZE
    }
}

impl fmt::Debug for RequestFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestFrame")
            .field("function", &self.function)
            .field("address", &format!("0x{:04X}", self.address))
            .field("data", &hex::encode(&self.data))
            .field("checksum", &format!("0x{:04X}", self.checksum()))
            .finish()
    }
}

impl fmt::Display for RequestFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Request[{:?}](address=0x{:04X}, len={})",
            self.function,
            self.address,
            self.data.len()
        )
    }
}

/// Response frame (scanner to host)
///
/// # Frame Structure
///
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────┬──────────┐
/// │ Preamble │  Status  │   Lens   │   Data   │   CRC    │
/// │ KK 00    │  1 byte  │  1 byte  │  N bytes │ 2 bytes  │
/// │          │          │   (N)    │          │  (BE)    │
/// └──────────┴──────────┴──────────┴──────────┴──────────┘
/// ```
///
/// `KK` is the [`FrameKind`] marker. A `Lens` of zero stands for 256 bytes.
/// The checksum covers the status byte through the end of the data.
#[derive(Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Reply or scan data
    pub kind: FrameKind,
    
    /// Status byte (`0x00` on success)
    pub status: u8,
    
    /// Frame data
    pub payload: Bytes,
}

/// Result of scanning a receive buffer for one response frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A complete, checksum-verified frame was removed from the buffer
    Frame(ResponseFrame),
    
    /// The buffer ends before the frame it holds is complete
    NeedMoreData,
    
    /// A complete frame failed verification; its preamble was dropped
    InvalidFrame {
        expected: u16,
        received: u16,
    },
}

impl ResponseFrame {
    /// Preamble, status and lens
    pub const HEADER_SIZE: usize = 4;
    
    pub const MAX_PAYLOAD_SIZE: usize = 256;
    
    /// Create a response frame
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] unless the payload holds 1 to 256
    /// bytes; the length byte cannot express anything else.
    pub fn new(kind: FrameKind, status: u8, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.is_empty() || payload.len() > Self::MAX_PAYLOAD_SIZE {
            return Err(Error::InvalidRequest(format!(
                "response payload must hold 1 to {} bytes, got {}",
                Self::MAX_PAYLOAD_SIZE,
                payload.len()
            )));
        }
        
        Ok(Self {
            kind,
            status,
            payload,
        })
    }
    
    /// Successful reply carrying `payload`
    pub fn reply(payload: impl Into<Bytes>) -> Result<Self> {
        Self::new(FrameKind::Reply, crate::constants::STATUS_OK, payload)
    }
    
    /// Scan result carrying the decoded barcode text
    pub fn scan(text: impl Into<Bytes>) -> Result<Self> {
        Self::new(FrameKind::ScanData, crate::constants::STATUS_OK, text)
    }
    
    fn put_body(&self, buf: &mut BytesMut) {
        buf.put_u8(self.status);
        // 256 wraps to 0
        buf.put_u8(self.payload.len() as u8);
        buf.put_slice(&self.payload);
    }
    
    /// Calculate checksum for this frame
    pub fn checksum(&self) -> u16 {
        let mut body = BytesMut::with_capacity(self.size());
        self.put_body(&mut body);
        checksum::calculate(&body)
    }
    
    /// Encode frame to bytes
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());
        
        buf.put_u8(self.kind.marker());
        buf.put_u8(RESPONSE_PREAMBLE_TAIL);
        self.put_body(&mut buf);
        
        let crc = checksum::calculate(&buf[2..]);
        buf.put_u16(crc);
        
        buf
    }
    
    /// Scan `buf` for the next response frame
    ///
    /// Bytes ahead of the first preamble are dropped. A complete, verified
    /// frame is split off the front of the buffer. A frame that fails the
    /// checksum loses its preamble so the next call resumes scanning right
    /// after it; the rest of its bytes are left for the scanner to skip.
    /// While the frame at the front is still incomplete, a complete verified
    /// frame behind it is returned instead, since the first preamble was
    /// most likely noise.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use gm60_core::{ParseOutcome, ResponseFrame};
    ///
    /// let frame = ResponseFrame::reply(vec![0x8e]).unwrap();
    /// let mut buf = BytesMut::from(&b"\xFF\x55"[..]);
    /// buf.extend_from_slice(&frame.encode());
    ///
    /// assert_eq!(ResponseFrame::parse(&mut buf), ParseOutcome::Frame(frame));
    /// assert!(buf.is_empty());
    /// ```
    pub fn parse(buf: &mut BytesMut) -> ParseOutcome {
        let start = (0..buf.len().saturating_sub(1))
            .find_map(|offset| preamble_at(buf, offset).map(|kind| (offset, kind)));
        
        let Some((offset, kind)) = start else {
            // A trailing marker may be the first half of a preamble
            let keep = match buf.last() {
                Some(&byte) if FrameKind::from_marker(byte).is_some() => 1,
                _ => 0,
            };
            let skip = buf.len() - keep;
            if skip > 0 {
                trace!("Discarding {} bytes: {}", skip, hex::encode(&buf[..skip]));
                buf.advance(skip);
            }
            return ParseOutcome::NeedMoreData;
        };
        
        if offset > 0 {
            trace!("Discarding {} bytes: {}", offset, hex::encode(&buf[..offset]));
            buf.advance(offset);
        }
        
        match Candidate::at(buf) {
            Candidate::Valid { total, payload_len } => Self::take(buf, kind, total, payload_len),
            Candidate::Corrupt { expected, received } => {
                buf.advance(2);
                ParseOutcome::InvalidFrame { expected, received }
            }
            Candidate::Incomplete => {
                // The preamble may be noise with a bogus length. A complete
                // frame further on wins over waiting for it.
                match Self::complete_frame_after_start(buf) {
                    Some((skip, kind, total, payload_len)) => {
                        trace!("Discarding {} bytes: {}", skip, hex::encode(&buf[..skip]));
                        buf.advance(skip);
                        Self::take(buf, kind, total, payload_len)
                    }
                    None => ParseOutcome::NeedMoreData,
                }
            }
        }
    }
    
    fn complete_frame_after_start(buf: &[u8]) -> Option<(usize, FrameKind, usize, usize)> {
        (1..buf.len().saturating_sub(1)).find_map(|offset| {
            let kind = preamble_at(buf, offset)?;
            match Candidate::at(&buf[offset..]) {
                Candidate::Valid { total, payload_len } => Some((offset, kind, total, payload_len)),
                _ => None,
            }
        })
    }
    
    /// Split a verified frame off the front of the buffer
    fn take(buf: &mut BytesMut, kind: FrameKind, total: usize, payload_len: usize) -> ParseOutcome {
        let mut raw = buf.split_to(total);
        trace!("Parsed frame: {}", hex::encode(&raw));
        
        let status = raw[2];
        raw.advance(Self::HEADER_SIZE);
        raw.truncate(payload_len);
        
        ParseOutcome::Frame(Self {
            kind,
            status,
            payload: raw.freeze(),
        })
    }
    
    /// Check if the status byte reports success
    pub fn is_success(&self) -> bool {
        self.status == crate::constants::STATUS_OK
    }
    
    /// Get total frame size
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE
    }
}

/// Frame kind of a `marker 00` preamble starting at `offset`
fn preamble_at(buf: &[u8], offset: usize) -> Option<FrameKind> {
    match buf.get(offset..offset + 2)? {
        [marker, RESPONSE_PREAMBLE_TAIL] => FrameKind::from_marker(*marker),
        _ => None,
    }
}

/// What the bytes behind a preamble amount to
enum Candidate {
    Incomplete,
    Corrupt { expected: u16, received: u16 },
    Valid { total: usize, payload_len: usize },
}

impl Candidate {
    /// `buf` must start with a preamble
    fn at(buf: &[u8]) -> Self {
        if buf.len() < ResponseFrame::HEADER_SIZE {
            return Candidate::Incomplete;
        }
        
        let payload_len = match buf[3] {
            0 => ResponseFrame::MAX_PAYLOAD_SIZE,
            len => usize::from(len),
        };
        let total = ResponseFrame::HEADER_SIZE + payload_len + CHECKSUM_SIZE;
        if buf.len() < total {
            return Candidate::Incomplete;
        }
        
        let received = BigEndian::read_u16(&buf[total - CHECKSUM_SIZE..total]);
        let expected = checksum::calculate(&buf[2..total - CHECKSUM_SIZE]);
        if expected != received {
            return Candidate::Corrupt { expected, received };
        }
        
        Candidate::Valid { total, payload_len }
    }
}

impl fmt::Debug for ResponseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFrame")
            .field("kind", &self.kind)
            .field("status", &format!("0x{:02X}", self.status))
            .field("payload", &hex::encode(&self.payload))
            .field("checksum", &format!("0x{:04X}", self.checksum()))
            .finish()
    }
}

impl fmt::Display for ResponseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Response[{}](status=0x{:02X}, len={})",
            self.kind,
            self.status,
            self.payload.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    
    fn ack() -> ResponseFrame {
        ResponseFrame::reply(vec![0x00]).unwrap()
    }
    
    #[test]
    fn test_request_read_layout() {
        let frame = RequestFrame::new(FunctionCode::Read, 0x00E1, vec![0x05]).unwrap();
        let encoded = frame.encode();
        
        assert_eq!(&encoded[..7], &[0x7E, 0x00, 0x07, 0x01, 0x00, 0xE1, 0x05]);
        assert_eq!(encoded.len(), frame.size());
        assert_eq!(BigEndian::read_u16(&encoded[7..]), frame.checksum());
    }
    
    #[test]
    fn test_request_encode_decode() {
        let original = RequestFrame::new(FunctionCode::Write, 0x002C, vec![1, 2, 3, 4]).unwrap();
        
        let decoded = RequestFrame::decode(original.encode()).unwrap();
        
        assert_eq!(original, decoded);
    }
    
    #[test]
    fn test_request_too_large() {
        let result = RequestFrame::new(FunctionCode::Write, 0, vec![0; 256]);
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }
    
    #[test]
    fn test_request_checksum_verification() {
        let frame = RequestFrame::new(FunctionCode::Write, 0x0000, vec![0x8E]).unwrap();
        let mut encoded = frame.encode();
        
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;
        
        let result = RequestFrame::decode(encoded);
        if let Err(Error::ChecksumMismatch { expected, received }) = result {
            assert_ne!(expected, received);
        } else {
            panic!("Expected ChecksumMismatch error");
        }
    }
    
    #[test]
    fn test_request_bad_preamble() {
        let buf = BytesMut::from(&[0x02, 0x00, 0x07, 0x01, 0x00, 0x00, 0x01, 0xAB, 0xCD][..]);
        assert!(matches!(
            RequestFrame::decode(buf),
            Err(Error::InvalidPreamble([0x02, 0x00]))
        ));
    }
    
    #[test]
    fn test_request_too_short() {
        let buf = BytesMut::from(&[0x7E, 0x00, 0x08][..]);
        assert!(matches!(
            RequestFrame::decode(buf),
            Err(Error::PacketTooShort { .. })
        ));
        
        // Lens promises more data than present
        let buf = BytesMut::from(&[0x7E, 0x00, 0x08, 0x04, 0x00, 0x00, 0x01, 0x02][..]);
        assert!(matches!(
            RequestFrame::decode(buf),
            Err(Error::PacketTooShort { expected: 12, actual: 8 })
        ));
    }
    
    #[test]
    fn test_response_ack_bytes() {
        assert_eq!(
            ack().encode().as_ref(),
            &[0x02, 0x00, 0x00, 0x01, 0x00, 0x33, 0x31]
        );
    }
    
    #[test]
    fn test_response_payload_bounds() {
        assert!(ResponseFrame::reply(Vec::new()).is_err());
        assert!(ResponseFrame::reply(vec![0; 257]).is_err());
        assert!(ResponseFrame::reply(vec![0; 256]).is_ok());
    }
    
    #[test]
    fn test_parse_full_register_block() {
        // Lens 0 encodes a 256-byte payload
        let frame = ResponseFrame::reply((0..=255u8).collect::<Vec<_>>()).unwrap();
        let mut buf = frame.encode();
        assert_eq!(buf[3], 0);
        
        assert_eq!(ResponseFrame::parse(&mut buf), ParseOutcome::Frame(frame));
    }
    
    #[test]
    fn test_parse_partial_frame() {
        let encoded = ResponseFrame::scan(&b"4066447241358"[..]).unwrap().encode();
        
        for cut in 0..encoded.len() {
            let mut buf = BytesMut::from(&encoded[..cut]);
            assert_eq!(ResponseFrame::parse(&mut buf), ParseOutcome::NeedMoreData, "cut {}", cut);
            
            buf.extend_from_slice(&encoded[cut..]);
            assert!(matches!(ResponseFrame::parse(&mut buf), ParseOutcome::Frame(_)));
        }
    }
    
    #[test]
    fn test_parse_drops_garbage_without_preamble() {
        let mut buf = BytesMut::from(&[0x41, 0x42, 0x0D, 0x0A][..]);
        assert_eq!(ResponseFrame::parse(&mut buf), ParseOutcome::NeedMoreData);
        assert!(buf.is_empty());
        
        // A trailing marker survives until its second byte arrives
        let mut buf = BytesMut::from(&[0x41, 0x02][..]);
        assert_eq!(ResponseFrame::parse(&mut buf), ParseOutcome::NeedMoreData);
        assert_eq!(buf.as_ref(), &[0x02]);
    }
    
    #[test]
    fn test_parse_back_to_back_frames() {
        let scan = ResponseFrame::scan(&b"ABC"[..]).unwrap();
        let mut buf = scan.encode();
        buf.extend_from_slice(&ack().encode());
        
        assert_eq!(ResponseFrame::parse(&mut buf), ParseOutcome::Frame(scan));
        assert_eq!(ResponseFrame::parse(&mut buf), ParseOutcome::Frame(ack()));
        assert!(buf.is_empty());
    }
    
    #[test]
    fn test_parse_resyncs_after_corrupt_frame() {
        let mut corrupt = ResponseFrame::reply(vec![0x11, 0x22]).unwrap().encode();
        corrupt[4] ^= 0x01;
        
        let mut buf = corrupt.clone();
        buf.extend_from_slice(&ack().encode());
        
        assert!(matches!(
            ResponseFrame::parse(&mut buf),
            ParseOutcome::InvalidFrame { .. }
        ));
        assert_eq!(buf.len(), corrupt.len() - 2 + ack().size());
        assert_eq!(ResponseFrame::parse(&mut buf), ParseOutcome::Frame(ack()));
    }
    
    #[test]
    fn test_parse_skips_false_preamble_in_noise() {
        // `02 00 00 FF` looks like the start of a 255 byte reply
        let reply = ResponseFrame::reply(vec![0x64, 0x6E, 21, 3, 9]).unwrap();
        let mut buf = BytesMut::from(&[0x41, 0x02, 0x00, 0x00, 0xFF][..]);
        buf.extend_from_slice(&reply.encode());
        
        assert_eq!(ResponseFrame::parse(&mut buf), ParseOutcome::Frame(reply));
        assert!(buf.is_empty());
    }
    
    #[test]
    fn test_parse_waits_when_nothing_behind_false_preamble_is_complete() {
        let encoded = ack().encode();
        let mut buf = BytesMut::from(&[0x03, 0x00, 0x40][..]);
        buf.extend_from_slice(&encoded[..encoded.len() - 1]);
        
        assert_eq!(ResponseFrame::parse(&mut buf), ParseOutcome::NeedMoreData);
        
        buf.extend_from_slice(&encoded[encoded.len() - 1..]);
        assert_eq!(ResponseFrame::parse(&mut buf), ParseOutcome::Frame(ack()));
    }
    
    #[test]
    fn test_response_is_success() {
        assert!(ack().is_success());
        assert!(!ResponseFrame::new(FrameKind::Reply, 0x01, vec![0x00]).unwrap().is_success());
    }
    
    #[test]
    fn test_function_code_conversion() {
        assert_eq!(u8::from(FunctionCode::Write), 0x08);
        assert_eq!(FunctionCode::try_from(0x09).unwrap(), FunctionCode::SaveToFlash);
        assert!(matches!(FunctionCode::try_from(0x42), Err(Error::UnknownFunction(0x42))));
    }
    
    #[test]
    fn test_length_bit_flip_is_never_accepted() {
        let payloads: [&[u8]; 3] = [&[0x00], &[0x8E, 0x01, 0x7F], b"4066447241358"];
        
        for payload in payloads {
            for bit in 0..8 {
                let mut buf = ResponseFrame::reply(payload.to_vec()).unwrap().encode();
                buf[3] ^= 1 << bit;
                
                // Either incomplete or rejected, depending on the new length
                let outcome = ResponseFrame::parse(&mut buf);
                assert!(!matches!(outcome, ParseOutcome::Frame(_)), "bit {}", bit);
            }
        }
    }
    
    proptest! {
        #[test]
        fn prop_single_bit_flip_is_rejected(
            payload in proptest::collection::vec(any::<u8>(), 1..64),
            bit in any::<prop::sample::Index>(),
        ) {
            let mut buf = ResponseFrame::reply(payload).unwrap().encode();
            // Status, data and checksum; the length byte is covered separately
            let bytes = buf.len() - 3;
            let bit = bit.index(bytes * 8);
            let pos = match bit / 8 {
                0 => 2,
                n => n + 3,
            };
            buf[pos] ^= 1 << (bit % 8);
            
            let outcome = ResponseFrame::parse(&mut buf);
            prop_assert!(
                matches!(outcome, ParseOutcome::InvalidFrame { .. }),
                "corrupted frame not rejected: {:?}",
                outcome
            );
        }
        
        #[test]
        fn prop_garbage_prefix_is_skipped(
            garbage in proptest::collection::vec(any::<u8>(), 0..64),
            payload in proptest::collection::vec(any::<u8>(), 1..64),
        ) {
            let frame = ResponseFrame::scan(payload).unwrap();
            let mut buf = BytesMut::from(&garbage[..]);
            buf.extend_from_slice(&frame.encode());
            
            let mut found = None;
            for _ in 0..=buf.len() {
                match ResponseFrame::parse(&mut buf) {
                    ParseOutcome::Frame(parsed) => {
                        found = Some(parsed);
                        break;
                    }
                    ParseOutcome::InvalidFrame { .. } => continue,
                    ParseOutcome::NeedMoreData => break,
                }
            }
            
            prop_assert_eq!(found, Some(frame));
        }
    }
}
