//! Error types for gm60-core

use crate::frame::FrameKind;

/// Result type alias for gm60 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame is too short to be valid
    #[error("Frame too short: expected at least {expected} bytes, got {actual} bytes")]
    PacketTooShort {
        expected: usize,
        actual: usize,
    },
    
    /// Frame does not start with the expected preamble
    #[error("Invalid preamble: {0:02X?}")]
    InvalidPreamble([u8; 2]),
    
    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    ChecksumMismatch {
        expected: u16,
        received: u16,
    },
    
    /// Unknown function code in a request frame
    #[error("Unknown function code: 0x{0:02X}")]
    UnknownFunction(u8),
    
    /// Only frames of another kind arrived before the deadline
    #[error("Unexpected frame: waiting for {expected}, received {received}")]
    UnexpectedFrame {
        expected: FrameKind,
        received: FrameKind,
    },
    
    /// Checksum-valid frame whose contents do not fit the command
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    
    /// Scanner answered with a non-zero status byte
    #[error("Scanner rejected the request (status 0x{status:02X})")]
    DeviceRejected {
        status: u8,
    },
    
    /// Request cannot be encoded
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    
    /// Timeout waiting for response
    #[error("Timeout waiting for response after {millis}ms")]
    Timeout {
        millis: u64,
    },
}

impl Error {
    /// Check if the failure came from the link rather than the request
    ///
    /// Nothing is retried by the driver; callers may reissue the command.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ChecksumMismatch { .. }
                | Self::UnexpectedFrame { .. }
        )
    }
}
