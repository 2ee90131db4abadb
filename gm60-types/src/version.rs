//! Scanner version information

use std::fmt;

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// Fixed-point revision number as reported by the scanner
///
/// The scanner encodes revisions in hundredths, so `0x64` (100) is `1.00`
/// and `0x6E` (110) is `1.10`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(u8);

impl Revision {
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw register byte
    pub const fn raw(self) -> u8 {
        self.0
    }

    pub fn major(self) -> u8 {
        self.0 / 100
    }

    /// Fractional part, in hundredths
    pub fn minor(self) -> u8 {
        self.0 % 100
    }

    pub fn as_f32(self) -> f32 {
        f32::from(self.0) / 100.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major(), self.minor())
    }
}

/// Hardware/software version block (registers `0x00E1..=0x00E5`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Hardware revision
    pub hardware: Revision,
    
    /// Firmware revision
    pub software: Revision,
    
    /// Firmware build date
    pub software_date: NaiveDate,
}

impl VersionInfo {
    pub fn new(hardware: Revision, software: Revision, software_date: NaiveDate) -> Self {
        Self {
            hardware,
            software,
            software_date,
        }
    }

    /// Build from the raw register block `[hw, sw, year - 2000, month, day]`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the block is not exactly five bytes and
    /// [`Error::Parse`] if the date bytes do not form a calendar date.
    ///
    /// # Examples
    ///
    /// ```
    /// use gm60_types::VersionInfo;
    ///
    /// let info = VersionInfo::from_registers(&[0x64, 0x6E, 21, 3, 9]).unwrap();
    /// assert_eq!(info.hardware.to_string(), "1.00");
    /// assert_eq!(info.software.to_string(), "1.10");
    /// assert_eq!(info.software_date_iso(), "2021-03-09");
    /// ```
    pub fn from_registers(block: &[u8]) -> Result<Self> {
        let [hw, sw, year, month, day] = block else {
            return Err(Error::Validation(format!(
                "version block must be 5 bytes, got {}",
                block.len()
            )));
        };

        // only the years past 2000 are stored
        let year = 2000 + i32::from(*year);
        let software_date = NaiveDate::from_ymd_opt(year, u32::from(*month), u32::from(*day))
            .ok_or_else(|| {
                Error::Parse(format!(
                    "invalid build date: year {} month {} day {}",
                    year, month, day
                ))
            })?;

        Ok(Self::new(
            Revision::from_raw(*hw),
            Revision::from_raw(*sw),
            software_date,
        ))
    }

    /// Build date formatted as `YYYY-MM-DD`
    pub fn software_date_iso(&self) -> String {
        self.software_date.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scanner[HW: {}, SW: {} ({})]",
            self.hardware,
            self.software,
            self.software_date_iso()
        )
    }
}
