//! Error types for hardware operations.
//!
//! This module defines error types specific to talking to the unit and to
//! the USB bus: link failures, protocol failures with their raw result, and
//! invalid data handed to the register master.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Link to the unit could not be opened.
    #[error("Device disconnected: {device}: {message}")]
    Disconnected { device: String, message: String },

    /// The unit answered with an error, a malformed frame or nothing at all.
    #[error("{error} {result}")]
    Protocol { error: String, result: String },

    /// Invalid data handed to or received from the device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// USB bus enumeration failed.
    #[error("USB error: {message}")]
    Usb { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create a new protocol error with the raw error and raw result text.
    pub fn protocol(error: impl Into<String>, result: impl Into<String>) -> Self {
        Self::Protocol {
            error: error.into(),
            result: result.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new USB error.
    pub fn usb(message: impl Into<String>) -> Self {
        Self::Usb {
            message: message.into(),
        }
    }
}

/// Every device-side failure is reported to the operator as a protocol
/// failure, except USB enumeration which belongs to the discovery tooling.
impl From<HardwareError> for sbox_core::Error {
    fn from(error: HardwareError) -> Self {
        match error {
            HardwareError::Protocol { error, result } => sbox_core::Error::protocol(error, result),
            HardwareError::Usb { message } => sbox_core::Error::external_tool("usb", message),
            other => sbox_core::Error::protocol(other.to_string(), "[]"),
        }
    }
}
