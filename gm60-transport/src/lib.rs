//! Transport layer for the GM60 protocol
//!
//! The serial link itself is opened and configured by the host; the driver
//! only needs a byte pipe it can write to and read from with a deadline.

pub mod error;
pub mod stream;

pub use error::{Error, Result};
pub use stream::StreamTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Byte-oriented duplex link to a scanner
#[async_trait]
pub trait Transport: Send {
    /// Send raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;
    
    /// Receive whatever bytes are available, at most `max_bytes`
    ///
    /// Waits up to `timeout` for the first byte and fails with
    /// [`Error::ReadTimeout`] if none arrives.
    async fn receive(&mut self, max_bytes: usize, timeout: Duration) -> Result<BytesMut>;
    
    /// Describe the link (port name, bridge address, ...)
    fn describe(&self) -> String;
}
