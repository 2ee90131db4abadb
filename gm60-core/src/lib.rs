//! # gm60-core
//!
//! Core protocol implementation for GM60/GM65 barcode scanner modules.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding
//! - Checksum calculation
//! - Command catalog (request encoding, response decoding)
//! - Protocol constants

pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod frame;

pub use command::{Command, Response};
pub use error::{Error, Result};
pub use frame::{FrameKind, FunctionCode, ParseOutcome, RequestFrame, ResponseFrame};
