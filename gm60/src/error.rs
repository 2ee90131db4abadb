//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] gm60_core::Error),
    
    #[error("Transport error: {0}")]
    Transport(#[from] gm60_transport::Error),
    
    #[error("Invalid response from scanner: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Check if the call ran out of time without a usable reply
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Core(
                gm60_core::Error::Timeout { .. }
                    | gm60_core::Error::ChecksumMismatch { .. }
                    | gm60_core::Error::UnexpectedFrame { .. }
            )
        )
    }
}
