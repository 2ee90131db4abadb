//! GM60 command catalog
//!
//! Maps each operation to the request frame it sends and the rule used to
//! decode the frame that answers it.

use std::fmt;

use bytes::Bytes;
use gm60_types::{RegisterValues, VersionInfo};

use crate::{
    constants::{registers, ACK_DATA, FACTORY_RESET_MAGIC, MAX_READ_COUNT},
    error::{Error, Result},
    frame::{FrameKind, FunctionCode, RequestFrame, ResponseFrame},
};

/// Operations understood by the scanner
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Read the hardware/software version block
    GetVersion,
    
    /// Restore the factory register file
    ResetToFactoryDefaults,
    
    /// Read `count` consecutive registers (1 to 256)
    GetRegister {
        address: u16,
        count: u16,
    },
    
    /// Write one or more consecutive registers
    ///
    /// The scanner only acknowledges; the value is not read back.
    SetRegister {
        address: u16,
        value: Bytes,
    },
    
    /// Wait for the next scan result; nothing is sent
    ReadBarcode,
    
    /// Persist the current register file to flash
    SaveToFlash,
}

/// Decoded response, one variant per response shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Version(VersionInfo),
    Ack,
    Registers(RegisterValues),
    Barcode(String),
}

impl Command {
    /// Read a single register
    pub fn get_register(address: u16) -> Self {
        Self::GetRegister { address, count: 1 }
    }
    
    /// Write a single register
    pub fn set_register(address: u16, value: u8) -> Self {
        Self::SetRegister {
            address,
            value: Bytes::copy_from_slice(&[value]),
        }
    }
    
    /// Get command name
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetVersion => "GET_VERSION",
            Self::ResetToFactoryDefaults => "RESET_TO_FACTORY_DEFAULTS",
            Self::GetRegister { .. } => "GET_REGISTER",
            Self::SetRegister { .. } => "SET_REGISTER",
            Self::ReadBarcode => "READ_BARCODE",
            Self::SaveToFlash => "SAVE_TO_FLASH",
        }
    }
    
    /// Kind of frame that answers this command
    pub fn expected_kind(&self) -> FrameKind {
        match self {
            Self::ReadBarcode => FrameKind::ScanData,
            _ => FrameKind::Reply,
        }
    }
    
    /// Build the request frame for this command
    ///
    /// Returns `None` for [`Command::ReadBarcode`], which only listens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for a read count outside 1..=256 or
    /// a write with no data or more than 255 bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use gm60_core::{Command, FunctionCode};
    ///
    /// let frame = Command::get_register(0x0000).request().unwrap().unwrap();
    /// assert_eq!(frame.function, FunctionCode::Read);
    /// assert_eq!(frame.data.as_ref(), &[0x01]);
    /// ```
    pub fn request(&self) -> Result<Option<RequestFrame>> {
        let frame = match self {
            Self::GetVersion => RequestFrame::new(
                FunctionCode::Read,
                registers::VERSION_BLOCK,
                vec![registers::VERSION_BLOCK_LEN as u8],
            )?,
            Self::ResetToFactoryDefaults => RequestFrame::new(
                FunctionCode::Write,
                registers::FACTORY_RESET,
                vec![FACTORY_RESET_MAGIC],
            )?,
            Self::GetRegister { address, count } => {
                if *count == 0 || *count > MAX_READ_COUNT {
                    return Err(Error::InvalidRequest(format!(
                        "register count must be 1 to {}, got {}",
                        MAX_READ_COUNT, count
                    )));
                }
                // 256 wraps to 0
                RequestFrame::new(FunctionCode::Read, *address, vec![*count as u8])?
            }
            Self::SetRegister { address, value } => {
                if value.is_empty() {
                    return Err(Error::InvalidRequest("register write without data".into()));
                }
                RequestFrame::new(FunctionCode::Write, *address, value.clone())?
            }
            Self::ReadBarcode => return Ok(None),
            Self::SaveToFlash => RequestFrame::new(FunctionCode::SaveToFlash, 0x0000, vec![0x00])?,
        };
        
        Ok(Some(frame))
    }
    
    /// Decode the frame that answers this command
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The frame is of another kind
    /// - The scanner reports a non-zero status
    /// - The payload does not have the shape this command expects
    pub fn decode(&self, frame: &ResponseFrame) -> Result<Response> {
        let expected = self.expected_kind();
        if frame.kind != expected {
            return Err(Error::UnexpectedFrame {
                expected,
                received: frame.kind,
            });
        }
        
        if !frame.is_success() {
            return Err(Error::DeviceRejected {
                status: frame.status,
            });
        }
        
        let payload = frame.payload.as_ref();
        
        match self {
            Self::GetVersion => {
                let info = VersionInfo::from_registers(payload)
                    .map_err(|e| Error::MalformedPayload(e.to_string()))?;
                Ok(Response::Version(info))
            }
            Self::GetRegister { address, count } => {
                if payload.len() != usize::from(*count) {
                    return Err(Error::MalformedPayload(format!(
                        "expected {} register bytes, got {}",
                        count,
                        payload.len()
                    )));
                }
                Ok(Response::Registers(RegisterValues::new(*address, payload.to_vec())))
            }
            Self::ResetToFactoryDefaults | Self::SetRegister { .. } | Self::SaveToFlash => {
                if payload != ACK_DATA {
                    return Err(Error::MalformedPayload(format!(
                        "expected acknowledgement, got {}",
                        hex::encode(payload)
                    )));
                }
                Ok(Response::Ack)
            }
            Self::ReadBarcode => {
                let text = std::str::from_utf8(payload)
                    .map_err(|e| Error::MalformedPayload(format!("barcode is not UTF-8: {}", e)))?
                    .trim_end_matches(['\r', '\n']);
                if text.is_empty() {
                    return Err(Error::MalformedPayload("empty barcode".into()));
                }
                Ok(Response::Barcode(text.to_owned()))
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetRegister { address, count } => {
                write!(f, "{}(0x{:04X}, count={})", self.name(), address, count)
            }
            Self::SetRegister { address, value } => {
                write!(f, "{}(0x{:04X}, {})", self.name(), address, hex::encode(value))
            }
            _ => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    
    fn catalog() -> Vec<Command> {
        vec![
            Command::GetVersion,
            Command::ResetToFactoryDefaults,
            Command::get_register(0x0000),
            Command::GetRegister { address: 0x002C, count: 256 },
            Command::set_register(0x0015, 0x63),
            Command::SetRegister {
                address: 0x0000,
                value: Bytes::from_static(&[0x8E, 0x01]),
            },
            Command::ReadBarcode,
            Command::SaveToFlash,
        ]
    }
    
    #[test]
    fn test_request_round_trip() {
        for command in catalog() {
            let Some(frame) = command.request().unwrap() else {
                assert_eq!(command, Command::ReadBarcode);
                continue;
            };
            
            let decoded = RequestFrame::decode(frame.encode()).unwrap();
            assert_eq!(decoded, frame, "{}", command);
        }
    }
    
    #[test]
    fn test_request_bytes() {
        let frame = Command::ResetToFactoryDefaults.request().unwrap().unwrap();
        assert_eq!(
            frame.encode().as_ref(),
            &[0x7E, 0x00, 0x08, 0x01, 0x00, 0xD9, 0x55, 0xD1, 0x76]
        );
        
        let frame = Command::get_register(0x0000).request().unwrap().unwrap();
        assert_eq!(
            frame.encode().as_ref(),
            &[0x7E, 0x00, 0x07, 0x01, 0x00, 0x00, 0x01, 0x01, 0x41]
        );
        
        let frame = Command::GetVersion.request().unwrap().unwrap();
        assert_eq!(frame.address, 0x00E1);
        assert_eq!(frame.data.as_ref(), &[0x05]);
    }
    
    #[test]
    fn test_request_invalid_counts() {
        let zero = Command::GetRegister { address: 0, count: 0 };
        assert!(matches!(zero.request(), Err(Error::InvalidRequest(_))));
        
        let too_many = Command::GetRegister { address: 0, count: 257 };
        assert!(matches!(too_many.request(), Err(Error::InvalidRequest(_))));
        
        let empty = Command::SetRegister { address: 0, value: Bytes::new() };
        assert!(matches!(empty.request(), Err(Error::InvalidRequest(_))));
        
        let large = Command::SetRegister { address: 0, value: Bytes::from(vec![0; 256]) };
        assert!(matches!(large.request(), Err(Error::InvalidRequest(_))));
    }
    
    #[test]
    fn test_response_round_trip() {
        let frames = [
            ResponseFrame::reply(vec![0x00]).unwrap(),
            ResponseFrame::reply(vec![0x64, 0x6E, 21, 3, 9]).unwrap(),
            ResponseFrame::scan(&b"4066447241358"[..]).unwrap(),
        ];
        
        for frame in frames {
            let mut buf = frame.encode();
            assert_eq!(
                ResponseFrame::parse(&mut buf),
                crate::frame::ParseOutcome::Frame(frame)
            );
        }
    }
    
    #[test]
    fn test_decode_version() {
        let frame = ResponseFrame::reply(vec![0x64, 0x6E, 21, 3, 9]).unwrap();
        let Response::Version(info) = Command::GetVersion.decode(&frame).unwrap() else {
            panic!("Expected version response");
        };
        
        assert_eq!(info.hardware.to_string(), "1.00");
        assert_eq!(info.software.to_string(), "1.10");
        assert_eq!(info.software_date_iso(), "2021-03-09");
    }
    
    #[test]
    fn test_decode_version_malformed() {
        let short = ResponseFrame::reply(vec![0x64, 0x6E]).unwrap();
        assert!(matches!(
            Command::GetVersion.decode(&short),
            Err(Error::MalformedPayload(_))
        ));
        
        let bad_date = ResponseFrame::reply(vec![0x64, 0x6E, 21, 2, 30]).unwrap();
        assert!(matches!(
            Command::GetVersion.decode(&bad_date),
            Err(Error::MalformedPayload(_))
        ));
    }
    
    #[test]
    fn test_decode_register() {
        let frame = ResponseFrame::reply(vec![0x8E]).unwrap();
        let response = Command::get_register(0x0000).decode(&frame).unwrap();
        
        assert_eq!(response, Response::Registers(RegisterValues::new(0x0000, vec![0x8E])));
    }
    
    #[test]
    fn test_decode_register_count_mismatch() {
        let frame = ResponseFrame::reply(vec![0x8E]).unwrap();
        let command = Command::GetRegister { address: 0x0000, count: 2 };
        
        assert!(matches!(command.decode(&frame), Err(Error::MalformedPayload(_))));
    }
    
    #[test]
    fn test_decode_ack() {
        let ack = ResponseFrame::reply(vec![0x00]).unwrap();
        assert_eq!(Command::set_register(0x0000, 0x8E).decode(&ack).unwrap(), Response::Ack);
        assert_eq!(Command::SaveToFlash.decode(&ack).unwrap(), Response::Ack);
        
        let not_ack = ResponseFrame::reply(vec![0x01, 0x02]).unwrap();
        assert!(matches!(
            Command::ResetToFactoryDefaults.decode(&not_ack),
            Err(Error::MalformedPayload(_))
        ));
    }
    
    #[test]
    fn test_decode_rejected_status() {
        let frame = ResponseFrame::new(FrameKind::Reply, 0x02, vec![0x00]).unwrap();
        assert!(matches!(
            Command::set_register(0x0000, 0x00).decode(&frame),
            Err(Error::DeviceRejected { status: 0x02 })
        ));
    }
    
    #[test]
    fn test_decode_barcode() {
        let frame = ResponseFrame::scan(&b"4066447241358\r"[..]).unwrap();
        assert_eq!(
            Command::ReadBarcode.decode(&frame).unwrap(),
            Response::Barcode("4066447241358".into())
        );
        
        let binary = ResponseFrame::scan(vec![0xFF, 0xFE]).unwrap();
        assert!(matches!(
            Command::ReadBarcode.decode(&binary),
            Err(Error::MalformedPayload(_))
        ));
    }
    
    #[test]
    fn test_decode_wrong_kind() {
        let scan = ResponseFrame::scan(&b"123"[..]).unwrap();
        assert!(matches!(
            Command::GetVersion.decode(&scan),
            Err(Error::UnexpectedFrame {
                expected: FrameKind::Reply,
                received: FrameKind::ScanData,
            })
        ));
        assert_eq!(Command::ReadBarcode.expected_kind(), FrameKind::ScanData);
    }
    
    #[test]
    fn test_command_display() {
        assert_eq!(Command::get_register(0x002C).to_string(), "GET_REGISTER(0x002C, count=1)");
        assert_eq!(Command::set_register(0x0015, 0x63).to_string(), "SET_REGISTER(0x0015, 63)");
        assert_eq!(Command::GetVersion.to_string(), "GET_VERSION");
    }
}
