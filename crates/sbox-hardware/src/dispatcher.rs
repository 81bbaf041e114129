//! Action dispatch against a register master.
//!
//! Maps the four operator actions to register calls with the fixed block
//! quantity and the literal coil codes:
//!
//! | Action | Register call |
//! |--------|---------------|
//! | `read-coil` | read coils, quantity 9 |
//! | `read-input` | read discrete inputs, quantity 9 |
//! | `write-coil-on` | write single coil, `0xFF00` |
//! | `write-coil-off` | write single coil, `0x0000` |
//!
//! Each call is attempted once; there is no retry.

use crate::traits::RegisterMaster;
use sbox_core::constants::REGISTER_QUANTITY;
use sbox_core::{Action, ActionOutput, Error, Reading, Result, UnitAddress, WriteAck};
use tracing::{debug, error};

#[derive(Debug)]
pub struct ActionDispatcher<M> {
    master: M,
}

impl<M: RegisterMaster> ActionDispatcher<M> {
    pub fn new(master: M) -> Self {
        Self { master }
    }

    pub fn master(&self) -> &M {
        &self.master
    }

    pub fn into_inner(self) -> M {
        self.master
    }

    /// Parse an operator command and dispatch it.
    ///
    /// The address is validated first, then the action keyword; both
    /// checks happen before any register I/O.
    ///
    /// # Errors
    /// `Error::InvalidAddress` or `Error::UnknownAction` for bad input,
    /// `Error::Protocol` for any device failure.
    pub async fn dispatch_command(&mut self, keyword: &str, address: &str) -> Result<ActionOutput> {
        let address = UnitAddress::parse_hex(address)?;
        let action: Action = keyword.parse()?;
        self.dispatch(action, address).await
    }

    /// Run `action` at `address`.
    pub async fn dispatch(&mut self, action: Action, address: UnitAddress) -> Result<ActionOutput> {
        debug!(%action, %address, "Dispatching action");

        let output = match action {
            Action::ReadCoil => {
                let bits = self
                    .master
                    .read_coils(address.as_u16(), REGISTER_QUANTITY)
                    .await?;
                ActionOutput::Read(into_reading(bits)?)
            }
            Action::ReadInput => {
                let bits = self
                    .master
                    .read_discrete_inputs(address.as_u16(), REGISTER_QUANTITY)
                    .await?;
                ActionOutput::Read(into_reading(bits)?)
            }
            Action::WriteCoilOn | Action::WriteCoilOff => {
                let value = action
                    .coil_value()
                    .map(|coil| coil.code())
                    .ok_or_else(|| Error::UnknownAction(action.to_string()))?;
                self.master
                    .write_single_coil(address.as_u16(), value)
                    .await?;
                ActionOutput::Write(WriteAck { address, value })
            }
        };

        debug!(%action, %address, %output, "Action completed");
        Ok(output)
    }
}

fn into_reading(mut bits: Vec<bool>) -> Result<Reading> {
    if bits.is_empty() {
        error!("Device returned an empty result");
        return Err(Error::protocol("empty result", "[]"));
    }
    bits.truncate(usize::from(REGISTER_QUANTITY));
    Ok(Reading::new(bits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HardwareError;
    use crate::mock::{MockRegisterMaster, RegisterCall};
    use sbox_core::ErrorKind;

    #[tokio::test]
    async fn test_read_coil_uses_fixed_quantity() {
        let (master, handle) = MockRegisterMaster::new();
        handle.push_reading(vec![true, false, false, false, false, false, false, false, true]);
        let mut dispatcher = ActionDispatcher::new(master);

        let output = dispatcher.dispatch_command("read-coil", "1F4").await.unwrap();

        assert_eq!(output.to_string(), "[1 0 0 0 0 0 0 0 1]");
        assert_eq!(
            handle.calls(),
            vec![RegisterCall::ReadCoils {
                address: 0x01F4,
                quantity: 9
            }]
        );
    }

    #[tokio::test]
    async fn test_read_input() {
        let (master, handle) = MockRegisterMaster::new();
        let mut dispatcher = ActionDispatcher::new(master);

        dispatcher.dispatch_command("read-input", "410").await.unwrap();

        assert_eq!(
            handle.calls(),
            vec![RegisterCall::ReadDiscreteInputs {
                address: 0x0410,
                quantity: 9
            }]
        );
    }

    #[tokio::test]
    async fn test_write_coil_on_sends_ff00() {
        let (master, handle) = MockRegisterMaster::new();
        let mut dispatcher = ActionDispatcher::new(master);

        let output = dispatcher.dispatch_command("write-coil-on", "500").await.unwrap();

        assert_eq!(output.to_string(), "address=0x0500 value=0xFF00");
        assert_eq!(
            handle.calls(),
            vec![RegisterCall::WriteSingleCoil {
                address: 0x0500,
                value: 0xFF00
            }]
        );
    }

    #[tokio::test]
    async fn test_write_coil_off_sends_zero_regardless_of_state() {
        let (master, handle) = MockRegisterMaster::new();
        let mut dispatcher = ActionDispatcher::new(master);

        dispatcher.dispatch_command("write-coil-on", "19A").await.unwrap();
        dispatcher.dispatch_command("write-coil-off", "19A").await.unwrap();
        dispatcher.dispatch_command("write-coil-off", "19A").await.unwrap();

        let values: Vec<u16> = handle
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                RegisterCall::WriteSingleCoil { value, .. } => Some(value),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![0xFF00, 0x0000, 0x0000]);
    }

    #[tokio::test]
    async fn test_unknown_action_performs_no_io() {
        let (master, handle) = MockRegisterMaster::new();
        let mut dispatcher = ActionDispatcher::new(master);

        let result = dispatcher.dispatch_command("write-coil", "500").await;

        assert!(matches!(result, Err(Error::UnknownAction(_))));
        assert!(handle.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_address_performs_no_io() {
        let (master, handle) = MockRegisterMaster::new();
        let mut dispatcher = ActionDispatcher::new(master);

        let result = dispatcher.dispatch_command("read-coil", "XYZ").await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
        assert!(handle.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_is_protocol_error() {
        let (master, handle) = MockRegisterMaster::new();
        handle.push_reading(Vec::new());
        let mut dispatcher = ActionDispatcher::new(master);

        let error = dispatcher.dispatch_command("read-input", "1").await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Protocol);
        assert_eq!(error.to_string(), "empty result []");
    }

    #[tokio::test]
    async fn test_device_failure_attempted_once() {
        let (master, handle) = MockRegisterMaster::new();
        handle.push_failure(HardwareError::protocol("timeout", "[]"));
        let mut dispatcher = ActionDispatcher::new(master);

        let error = dispatcher.dispatch_command("read-coil", "1F4").await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Protocol);
        assert_eq!(handle.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_reading_truncated_to_block() {
        let (master, handle) = MockRegisterMaster::new();
        handle.push_reading(vec![false; 16]);
        let mut dispatcher = ActionDispatcher::new(master);

        let output = dispatcher
            .dispatch(Action::ReadCoil, UnitAddress::new(0))
            .await
            .unwrap();

        match output {
            ActionOutput::Read(reading) => assert_eq!(reading.len(), 9),
            other => panic!("unexpected output {other:?}"),
        }
    }
}
