//! Register values and well-known register layouts

use std::fmt;

use bitflags::bitflags;

/// Values read from one or more consecutive registers
///
/// Keeps the raw bytes and renders them the way the datasheet lists them,
/// which makes comparing a dump against the register map straightforward.
///
/// # Examples
///
/// ```
/// use gm60_types::RegisterValues;
///
/// let values = RegisterValues::new(0x0000, vec![0x8e]);
/// assert_eq!(values.hex_strings(), vec!["0x8e"]);
/// assert_eq!(values.binary_strings(), vec!["0b10001110"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterValues {
    /// Address of the first register
    pub address: u16,
    
    /// One byte per register, in address order
    pub values: Vec<u8>,
}

impl RegisterValues {
    pub fn new(address: u16, values: Vec<u8>) -> Self {
        Self { address, values }
    }

    /// Value of the first register
    pub fn first(&self) -> Option<u8> {
        self.values.first().copied()
    }

    /// Values as lowercase hex literals, e.g. `0x8e`
    pub fn hex_strings(&self) -> Vec<String> {
        self.values.iter().map(|v| format!("{:#x}", v)).collect()
    }

    /// Values as binary literals, e.g. `0b10001110`
    pub fn binary_strings(&self) -> Vec<String> {
        self.values.iter().map(|v| format!("{:#b}", v)).collect()
    }

    /// `(hex_strings, binary_strings)` pair
    pub fn to_strings(&self) -> (Vec<String>, Vec<String>) {
        (self.hex_strings(), self.binary_strings())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for RegisterValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}: [{}]", self.address, self.hex_strings().join(", "))
    }
}

bitflags! {
    /// Feedback after a successful decode, bits 6-7 of the scan mode register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ScanFeedback: u8 {
        /// Flash the status LED
        const LED = 0x80;
        /// Beep
        const BUZZER = 0x40;
    }
}

/// Aiming light, bits 4-5 of the scan mode register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AimingLight {
    #[default]
    Off,
    /// Lit while scanning
    Standard,
    AlwaysOn,
}

/// Illumination LED, bits 2-3 of the scan mode register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Illumination {
    #[default]
    Off,
    /// Lit while scanning
    Standard,
    AlwaysOn,
}

/// Operation mode, bits 0-1 of the scan mode register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationMode {
    /// Scan while the trigger button is held
    #[default]
    Manual,
    /// Scan only when triggered over the serial link
    Command,
    Continuous,
    /// Scan when the image changes
    Sensing,
}

/// Scan mode register (`0x0000`)
///
/// # Examples
///
/// ```
/// use gm60_types::{Illumination, OperationMode, ScanFeedback, ScanMode};
///
/// let mode = ScanMode::from(0b1000_1110);
/// assert_eq!(mode.feedback, ScanFeedback::LED);
/// assert_eq!(mode.illumination, Illumination::AlwaysOn);
/// assert_eq!(mode.operation, OperationMode::Continuous);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScanMode {
    pub feedback: ScanFeedback,
    pub aiming: AimingLight,
    pub illumination: Illumination,
    pub operation: OperationMode,
}

impl ScanMode {
    /// Encode as the register byte
    pub fn bits(&self) -> u8 {
        let aiming = match self.aiming {
            AimingLight::Off => 0x00,
            AimingLight::Standard => 0x10,
            AimingLight::AlwaysOn => 0x20,
        };
        let illumination = match self.illumination {
            Illumination::Off => 0x00,
            Illumination::Standard => 0x04,
            Illumination::AlwaysOn => 0x08,
        };
        let operation = match self.operation {
            OperationMode::Manual => 0x00,
            OperationMode::Command => 0x01,
            OperationMode::Continuous => 0x02,
            OperationMode::Sensing => 0x03,
        };
        
        self.feedback.bits() | aiming | illumination | operation
    }
}

impl From<u8> for ScanMode {
    /// Light fields read `01` as standard and `1x` as always on
    fn from(value: u8) -> Self {
        let aiming = match (value >> 4) & 0b11 {
            0b00 => AimingLight::Off,
            0b01 => AimingLight::Standard,
            _ => AimingLight::AlwaysOn,
        };
        let illumination = match (value >> 2) & 0b11 {
            0b00 => Illumination::Off,
            0b01 => Illumination::Standard,
            _ => Illumination::AlwaysOn,
        };
        let operation = match value & 0b11 {
            0b00 => OperationMode::Manual,
            0b01 => OperationMode::Command,
            0b10 => OperationMode::Continuous,
            _ => OperationMode::Sensing,
        };
        
        Self {
            feedback: ScanFeedback::from_bits_truncate(value),
            aiming,
            illumination,
            operation,
        }
    }
}

impl From<ScanMode> for u8 {
    fn from(mode: ScanMode) -> Self {
        mode.bits()
    }
}
