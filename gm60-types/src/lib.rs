//! Type definitions for gm60

pub mod error;
pub mod registers;
pub mod version;

pub use error::{Error, Result};
pub use registers::{AimingLight, Illumination, OperationMode, RegisterValues, ScanFeedback, ScanMode};
pub use version::{Revision, VersionInfo};
