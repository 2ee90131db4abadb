//! Transport over any tokio byte stream
//!
//! Works with a serial port stream, a serial-over-TCP bridge (ser2net and
//! similar device servers), or an in-memory pipe.

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::{error::*, Transport};

/// Transport wrapping an `AsyncRead + AsyncWrite` stream
pub struct StreamTransport<S> {
    stream: S,
    name: String,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already configured stream
    pub fn new(stream: S, name: impl Into<String>) -> Self {
        Self {
            stream,
            name: name.into(),
        }
    }
    
    /// Get the wrapped stream back
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl StreamTransport<TcpStream> {
    /// Connect to a serial device server forwarding the scanner's UART
    pub async fn connect_tcp(addr: impl Into<String>, connect_timeout: Duration) -> Result<Self> {
        let addr = addr.into();
        
        let addrs: Vec<_> = tokio::net::lookup_host(&addr)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr, e)))?
            .collect();
        
        let remote = addrs
            .first()
            .copied()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", addr)))?;
        
        debug!("Connecting to serial bridge {}...", remote);
        
        let stream = timeout(connect_timeout, TcpStream::connect(remote))
            .await
            .map_err(|_| Error::ConnectionTimeout)?
            .map_err(Error::Io)?;
        
        // Frames are tiny; do not hold them back
        stream.set_nodelay(true)?;
        
        debug!("Connected to serial bridge {}", remote);
        
        Ok(Self::new(stream, remote.to_string()))
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        trace!("Sending {} bytes: {:02X?}", data.len(), &data[..data.len().min(32)]);
        
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        
        Ok(())
    }
    
    async fn receive(&mut self, max_bytes: usize, timeout_duration: Duration) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(max_bytes);
        buf.resize(max_bytes, 0);
        
        let n = timeout(timeout_duration, self.stream.read(&mut buf))
            .await
            .map_err(|_| Error::ReadTimeout)?
            .map_err(Error::Io)?;
        
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        
        // Truncate to actual received size
        buf.truncate(n);
        
        trace!("Received {} bytes: {:02X?}", n, &buf[..n.min(32)]);
        
        Ok(buf)
    }
    
    fn describe(&self) -> String {
        self.name.clone()
    }
}
