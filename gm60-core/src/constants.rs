//! Protocol constants

/// Request preamble (host to scanner)
pub const REQUEST_PREAMBLE: [u8; 2] = [0x7E, 0x00];

/// Second preamble byte shared by every response frame
pub const RESPONSE_PREAMBLE_TAIL: u8 = 0x00;

/// Successful status byte in a response frame
pub const STATUS_OK: u8 = 0x00;

/// Data carried by a write/save acknowledgement
pub const ACK_DATA: [u8; 1] = [0x00];

/// Checksum field size in bytes
pub const CHECKSUM_SIZE: usize = 2;

/// Largest register block a single read may request
///
/// The count byte wraps: `0x00` requests 256 registers.
pub const MAX_READ_COUNT: u16 = 256;

/// Default serial link settings (configured outside the driver)
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const MAX_BAUD_RATE: u32 = 57600;

/// Default command timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default time to wait for a scan (milliseconds)
pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 5000;

/// Time the scanner needs after a factory reset (milliseconds)
pub const FACTORY_RESET_SETTLE_MS: u64 = 1000;

/// Register map (subset used by the driver)
pub mod registers {
    /// Scan mode, light and buzzer settings
    pub const SCAN_MODE: u16 = 0x0000;
    
    /// Writing `0x01` starts a scan in command mode, `0x00` stops it
    pub const SCAN_TRIGGER: u16 = 0x0002;
    
    /// Scan session duration, in 100 ms steps
    pub const SCAN_DURATION: u16 = 0x0006;
    
    /// Factory reset trigger
    pub const FACTORY_RESET: u16 = 0x00D9;
    
    /// Hardware revision; followed by software revision, year, month, day
    pub const VERSION_BLOCK: u16 = 0x00E1;
    
    /// Length of the version block
    pub const VERSION_BLOCK_LEN: u16 = 5;
}

/// Magic value written to [`registers::FACTORY_RESET`]
pub const FACTORY_RESET_MAGIC: u8 = 0x55;

/// Value written to [`registers::SCAN_TRIGGER`] to start a scan
pub const SCAN_TRIGGER_START: u8 = 0x01;
