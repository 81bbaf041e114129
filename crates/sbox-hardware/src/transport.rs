//! Transport selection from a host identifier.

use sbox_core::constants::SERIAL_PATH_SEPARATOR;
use std::fmt;

/// Link used to reach the unit.
///
/// Selecting a transport never touches the device; an unreachable host or
/// a missing serial device only shows up on the first register call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Serial device path, e.g. `/dev/ttyUSB0`.
    Serial { path: String },
    /// `host:port` endpoint.
    Network { endpoint: String },
}

impl Transport {
    /// Choose the transport for `host`.
    ///
    /// A host starting with `/` is a serial device path; anything else is a
    /// network endpoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use sbox_hardware::Transport;
    ///
    /// assert!(Transport::select("/dev/ttyUSB0").is_serial());
    /// assert!(!Transport::select("192.168.1.5:502").is_serial());
    /// ```
    pub fn select(host: &str) -> Self {
        if host.starts_with(SERIAL_PATH_SEPARATOR) {
            Transport::Serial {
                path: host.to_string(),
            }
        } else {
            Transport::Network {
                endpoint: host.to_string(),
            }
        }
    }

    pub fn is_serial(&self) -> bool {
        matches!(self, Transport::Serial { .. })
    }

    /// Host identifier this transport was selected from.
    pub fn host(&self) -> &str {
        match self {
            Transport::Serial { path } => path,
            Transport::Network { endpoint } => endpoint,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Serial { path } => write!(f, "serial:{path}"),
            Transport::Network { endpoint } => write!(f, "tcp:{endpoint}"),
        }
    }
}
