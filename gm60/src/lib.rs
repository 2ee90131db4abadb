//! # gm60
//!
//! Rust driver for the serial protocol of GM60/GM65 barcode scanner modules.
//!
//! ## Features
//!
//! - Type-safe frame codec with CRC-16 verification
//! - Async/await API using Tokio
//! - Tolerates line noise and unsolicited scan output
//! - Register read/write, version query, factory reset, barcode reads
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use gm60::{Scanner, StreamTransport};
//!
//! #[tokio::main]
//! async fn main() -> gm60::Result<()> {
//!     // Scanner UART exposed by a serial device server
//!     let transport = StreamTransport::connect_tcp("192.168.1.50:4001", Duration::from_secs(5)).await?;
//!     let mut scanner = Scanner::new(transport);
//!     
//!     let info = scanner.get_version().await?;
//!     println!("{}", info);
//!     
//!     let barcode = scanner.read_barcode().await?;
//!     println!("Scanned: {}", barcode);
//!     
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod scanner;
pub mod transaction;

// Re-exports
pub use error::{Error, Result};
pub use scanner::Scanner;
pub use transaction::{Transaction, TransactionState};

// Re-export types
pub use gm60_core::{constants, Command, FrameKind, Response};
pub use gm60_transport::{StreamTransport, Transport};
pub use gm60_types::{
    AimingLight, Illumination, OperationMode, RegisterValues, Revision, ScanFeedback, ScanMode,
    VersionInfo,
};
