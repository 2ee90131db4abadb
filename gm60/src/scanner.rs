//! High-level scanner interface

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};

use gm60_core::{
    constants::{
        registers, DEFAULT_SCAN_TIMEOUT_MS, DEFAULT_TIMEOUT_MS, FACTORY_RESET_SETTLE_MS,
        SCAN_TRIGGER_START,
    },
    Command, Response,
};
use gm60_transport::Transport;
use gm60_types::{RegisterValues, ScanMode, VersionInfo};

use crate::error::{Error, Result};
use crate::transaction::Transaction;

/// GM60 barcode scanner
///
/// High-level interface over one serial link. Every operation borrows the
/// scanner mutably, so exchanges on the link never overlap.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// use gm60::{Scanner, StreamTransport};
///
/// #[tokio::main]
/// async fn main() -> gm60::Result<()> {
///     let transport = StreamTransport::connect_tcp("192.168.1.50:4001", Duration::from_secs(5)).await?;
///     let mut scanner = Scanner::new(transport).with_timeout(Duration::from_millis(500));
///     
///     let settings = scanner.get_register_settings(0x0000).await?;
///     println!("Scan mode: {:?}", settings.to_strings());
///     
///     // LED always on
///     scanner.set_register_settings(0x0000, 0b1000_1110).await?;
///     Ok(())
/// }
/// ```
pub struct Scanner {
    transport: Box<dyn Transport>,
    timeout: Duration,
    scan_timeout: Duration,
    reset_settle: Duration,
}

impl Scanner {
    /// Create a scanner on an already configured link
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            scan_timeout: Duration::from_millis(DEFAULT_SCAN_TIMEOUT_MS),
            reset_settle: Duration::from_millis(FACTORY_RESET_SETTLE_MS),
        }
    }
    
    /// Set command timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
    
    /// Set how long [`read_barcode`](Self::read_barcode) waits for a scan
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }
    
    /// Set the pause after a factory reset
    pub fn with_reset_settle(mut self, settle: Duration) -> Self {
        self.reset_settle = settle;
        self
    }
    
    /// Describe the underlying link
    pub fn describe(&self) -> String {
        self.transport.describe()
    }
    
    /// Give up the scanner and get the link back
    pub fn into_transport(self) -> Box<dyn Transport> {
        self.transport
    }
    
    /// Get hardware/software version information
    pub async fn get_version(&mut self) -> Result<VersionInfo> {
        debug!("Getting version info...");
        
        match self.execute(Command::GetVersion, self.timeout).await? {
            Response::Version(info) => {
                debug!("Version info: {}", info);
                Ok(info)
            }
            other => Err(unexpected(&Command::GetVersion, other)),
        }
    }
    
    /// Restore factory settings
    ///
    /// Waits for the acknowledgement, then for the settle delay so the
    /// scanner is ready for the next command. Not retried on failure.
    ///
    /// Factory settings may switch the scanner's interface away from UART;
    /// that has to be restored by scanning the matching setup code.
    pub async fn reset_to_factory_defaults(&mut self) -> Result<()> {
        info!("Resetting scanner to factory defaults...");
        
        self.expect_ack(Command::ResetToFactoryDefaults).await?;
        tokio::time::sleep(self.reset_settle).await;
        
        info!("Factory reset complete");
        Ok(())
    }
    
    /// Read a single register
    ///
    /// The result renders as hex and binary strings for comparing against
    /// the register map.
    pub async fn get_register_settings(&mut self, address: u16) -> Result<RegisterValues> {
        self.get_register_range(address, 1).await
    }
    
    /// Read `count` consecutive registers (1 to 256)
    pub async fn get_register_range(&mut self, address: u16, count: u16) -> Result<RegisterValues> {
        debug!("Reading {} register(s) from 0x{:04X}...", count, address);
        
        let command = Command::GetRegister { address, count };
        match self.execute(command.clone(), self.timeout).await? {
            Response::Registers(values) => {
                debug!("Registers {}", values);
                Ok(values)
            }
            other => Err(unexpected(&command, other)),
        }
    }
    
    /// Write a single register
    ///
    /// The write is not read back; issue [`get_register_settings`](Self::get_register_settings)
    /// to confirm it.
    pub async fn set_register_settings(&mut self, address: u16, value: u8) -> Result<()> {
        self.set_register_bytes(address, &[value]).await
    }
    
    /// Write consecutive registers starting at `address`
    pub async fn set_register_bytes(&mut self, address: u16, value: &[u8]) -> Result<()> {
        debug!("Writing 0x{:04X} = {:02X?}...", address, value);
        
        self.expect_ack(Command::SetRegister {
            address,
            value: Bytes::copy_from_slice(value),
        })
        .await
    }
    
    /// Read and decode the scan mode register
    pub async fn get_scan_mode(&mut self) -> Result<ScanMode> {
        let values = self.get_register_settings(registers::SCAN_MODE).await?;
        values
            .first()
            .map(ScanMode::from)
            .ok_or_else(|| Error::InvalidResponse("empty scan mode register".into()))
    }
    
    /// Write the scan mode register
    pub async fn set_scan_mode(&mut self, mode: ScanMode) -> Result<()> {
        debug!("Setting scan mode {:?}", mode);
        self.set_register_settings(registers::SCAN_MODE, mode.bits()).await
    }
    
    /// Persist the current settings across power cycles
    pub async fn save_to_flash(&mut self) -> Result<()> {
        info!("Saving settings to flash...");
        self.expect_ack(Command::SaveToFlash).await
    }
    
    /// Wait for the next scanned barcode
    ///
    /// Nothing is sent; the scanner pushes a scan frame whenever it decodes
    /// a code. Waits up to the scan timeout.
    pub async fn read_barcode(&mut self) -> Result<String> {
        debug!("Waiting for barcode...");
        
        match self.execute(Command::ReadBarcode, self.scan_timeout).await? {
            Response::Barcode(text) => {
                debug!("Barcode: {}", text);
                Ok(text)
            }
            other => Err(unexpected(&Command::ReadBarcode, other)),
        }
    }
    
    /// Trigger a scan (command mode) and wait for its result
    pub async fn scan_barcode(&mut self) -> Result<String> {
        debug!("Triggering scan...");
        
        let trigger = Command::set_register(registers::SCAN_TRIGGER, SCAN_TRIGGER_START);
        let (result, pending) = Transaction::new(&trigger, self.timeout)
            .run_retaining(self.transport.as_mut())
            .await;
        match result? {
            Response::Ack => {}
            other => return Err(unexpected(&trigger, other)),
        }
        
        // The scan may have arrived together with the acknowledgement
        let wait = Command::ReadBarcode;
        match Transaction::new(&wait, self.scan_timeout)
            .with_pending(pending)
            .run(self.transport.as_mut())
            .await?
        {
            Response::Barcode(text) => {
                debug!("Barcode: {}", text);
                Ok(text)
            }
            other => Err(unexpected(&wait, other)),
        }
    }
    
    // Helper methods
    
    async fn expect_ack(&mut self, command: Command) -> Result<()> {
        match self.execute(command.clone(), self.timeout).await? {
            Response::Ack => Ok(()),
            other => Err(unexpected(&command, other)),
        }
    }
    
    async fn execute(&mut self, command: Command, timeout: Duration) -> Result<Response> {
        Transaction::new(&command, timeout)
            .run(self.transport.as_mut())
            .await
    }
}

fn unexpected(command: &Command, response: Response) -> Error {
    Error::InvalidResponse(format!("{} answered with {:?}", command, response))
}
