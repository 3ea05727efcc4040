//! # Error Types
//!
//! Custom error types for the OBD2 gateway using `thiserror`.

use thiserror::Error;

/// Main error type for the OBD2 gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Empty or blank vehicle identification number on channel creation
    #[error("Invalid vehicle identification number: must not be blank")]
    InvalidVehicleId,

    /// No active session for the given channel identifier
    #[error("Channel with identifier {0} does not exist")]
    UnknownChannel(u32),

    /// Every channel identifier is in use
    #[error("No free channel identifier left")]
    ChannelsExhausted,

    /// A single payload entry could not be decoded
    #[error("Malformed entry: {0}")]
    MalformedEntry(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the OBD2 gateway
pub type Result<T> = std::result::Result<T, GatewayError>;
