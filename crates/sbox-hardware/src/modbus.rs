//! Register master backed by `tokio-modbus`.
//!
//! Framing, checksums and the request/response exchange are delegated to
//! `tokio-modbus`; this module only opens the link selected by
//! [`Transport`] and maps its results into [`HardwareError`].
//!
//! # Link lifecycle
//!
//! The link is opened lazily on the first register call, so building a
//! master (and validating the rest of a command line) never touches the
//! device. The link is closed when the master is dropped.
//!
//! ```no_run
//! use sbox_hardware::{ModbusMaster, Transport};
//! use sbox_hardware::traits::RegisterMaster;
//!
//! # async fn example() -> sbox_hardware::Result<()> {
//! let mut master = ModbusMaster::new(Transport::select("/dev/ttyUSB0"));
//! let bits = master.read_coils(0x01F4, 9).await?;
//! println!("{bits:?}");
//! # Ok(())
//! # }
//! ```

use crate::error::{HardwareError, Result};
use crate::traits::RegisterMaster;
use crate::transport::Transport;
use sbox_core::constants::{COIL_OFF, COIL_ON, SERIAL_BAUD_RATE, SERIAL_SLAVE_ID};
use std::fmt;
use tokio::net::lookup_host;
use tokio_modbus::client::{Context, rtu, tcp};
use tokio_modbus::prelude::{Reader, Slave, Writer};
use tokio_serial::{DataBits, Parity, SerialStream, StopBits};
use tracing::{debug, trace, warn};

/// Raw result text reported when the unit returned nothing usable.
const NO_RESULT: &str = "[]";

pub struct ModbusMaster {
    transport: Transport,
    context: Option<Context>,
}

impl ModbusMaster {
    /// Create a master for `transport`. No I/O happens here.
    pub fn new(transport: Transport) -> Self {
        debug!(%transport, "Creating register master");
        Self {
            transport,
            context: None,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn is_connected(&self) -> bool {
        self.context.is_some()
    }

    async fn context(&mut self) -> Result<&mut Context> {
        let context = match self.context.take() {
            Some(context) => context,
            None => self.connect().await?,
        };
        Ok(self.context.insert(context))
    }

    async fn connect(&self) -> Result<Context> {
        match &self.transport {
            Transport::Serial { path } => {
                debug!(path = %path, baud = SERIAL_BAUD_RATE, "Opening serial link");
                let builder = tokio_serial::new(path.as_str(), SERIAL_BAUD_RATE)
                    .data_bits(DataBits::Eight)
                    .parity(Parity::Even)
                    .stop_bits(StopBits::One);
                let port = SerialStream::open(&builder).map_err(|e| {
                    warn!(path = %path, error = %e, "Failed to open serial link");
                    HardwareError::disconnected(path.as_str(), e.to_string())
                })?;
                Ok(rtu::attach_slave(port, Slave(SERIAL_SLAVE_ID)))
            }
            Transport::Network { endpoint } => {
                debug!(endpoint = %endpoint, "Opening network link");
                let socket_addr = lookup_host(endpoint.as_str())
                    .await
                    .map_err(|e| HardwareError::disconnected(endpoint.as_str(), e.to_string()))?
                    .next()
                    .ok_or_else(|| {
                        HardwareError::disconnected(endpoint.as_str(), "host did not resolve")
                    })?;
                tcp::connect(socket_addr).await.map_err(|e| {
                    warn!(endpoint = %endpoint, error = %e, "Failed to open network link");
                    HardwareError::disconnected(endpoint.as_str(), e.to_string())
                })
            }
        }
    }
}

impl fmt::Debug for ModbusMaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModbusMaster")
            .field("transport", &self.transport)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Flatten a `tokio-modbus` response (transport error or exception code).
fn settle<T, X, E>(response: std::result::Result<std::result::Result<T, X>, E>) -> Result<T>
where
    X: fmt::Debug,
    E: fmt::Display,
{
    match response {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(exception)) => Err(HardwareError::protocol(
            format!("exception: {exception:?}"),
            NO_RESULT,
        )),
        Err(error) => Err(HardwareError::protocol(error.to_string(), NO_RESULT)),
    }
}

fn coil_state(value: u16) -> Result<bool> {
    match value {
        COIL_ON => Ok(true),
        COIL_OFF => Ok(false),
        other => Err(HardwareError::invalid_data(format!(
            "coil value must be 0xFF00 or 0x0000, got 0x{other:04X}"
        ))),
    }
}

impl RegisterMaster for ModbusMaster {
    async fn read_coils(&mut self, address: u16, quantity: u16) -> Result<Vec<bool>> {
        trace!(address, quantity, "read coils");
        let context = self.context().await?;
        settle(context.read_coils(address, quantity).await)
    }

    async fn read_discrete_inputs(&mut self, address: u16, quantity: u16) -> Result<Vec<bool>> {
        trace!(address, quantity, "read discrete inputs");
        let context = self.context().await?;
        settle(context.read_discrete_inputs(address, quantity).await)
    }

    async fn write_single_coil(&mut self, address: u16, value: u16) -> Result<()> {
        let state = coil_state(value)?;
        trace!(address, value, "write single coil");
        let context = self.context().await?;
        settle(context.write_single_coil(address, state).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_master_is_not_connected() {
        let master = ModbusMaster::new(Transport::select("/dev/does-not-exist"));
        assert!(!master.is_connected());
        assert!(master.transport().is_serial());
    }

    #[test]
    fn test_coil_state() {
        assert!(coil_state(0xFF00).unwrap());
        assert!(!coil_state(0x0000).unwrap());
        assert!(matches!(
            coil_state(0x0001),
            Err(HardwareError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_settle() {
        let ok: std::result::Result<std::result::Result<u8, &str>, String> = Ok(Ok(7));
        assert_eq!(settle(ok).unwrap(), 7);

        let exception: std::result::Result<std::result::Result<u8, &str>, String> =
            Ok(Err("IllegalDataAddress"));
        let error = settle(exception).unwrap_err();
        assert_eq!(error.to_string(), "exception: \"IllegalDataAddress\" []");

        let transport: std::result::Result<std::result::Result<u8, &str>, String> =
            Err("broken pipe".to_string());
        assert_eq!(settle(transport).unwrap_err().to_string(), "broken pipe []");
    }

    #[tokio::test]
    async fn test_missing_serial_device_fails_on_first_call() {
        let mut master = ModbusMaster::new(Transport::select("/dev/sbox-test-missing"));
        let result = master.read_coils(0x01F4, 9).await;
        assert!(matches!(result, Err(HardwareError::Disconnected { .. })));
        assert!(!master.is_connected());
    }

    #[tokio::test]
    async fn test_invalid_coil_value_sends_nothing() {
        let mut master = ModbusMaster::new(Transport::select("127.0.0.1:1"));
        let result = master.write_single_coil(0x019A, 0x1234).await;
        assert!(matches!(result, Err(HardwareError::InvalidData { .. })));
        assert!(!master.is_connected());
    }
}
