//! Mock register master for testing and development.
//!
//! This module provides a simulated unit that records every register call
//! and answers reads from a queue of scripted responses.

use crate::{HardwareError, Result, traits::RegisterMaster};
use sbox_core::constants::REGISTER_QUANTITY;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// One register call observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterCall {
    ReadCoils { address: u16, quantity: u16 },
    ReadDiscreteInputs { address: u16, quantity: u16 },
    WriteSingleCoil { address: u16, value: u16 },
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<RegisterCall>,
    responses: VecDeque<Result<Vec<bool>>>,
}

/// Mock register master.
///
/// Reads pop the next scripted response; when the queue is empty they
/// return a block of released (all `false`) bits. Writes succeed unless a
/// failure is queued.
///
/// # Examples
///
/// ```
/// use sbox_hardware::mock::{MockRegisterMaster, RegisterCall};
/// use sbox_hardware::traits::RegisterMaster;
///
/// #[tokio::main]
/// async fn main() -> sbox_hardware::Result<()> {
///     let (mut master, handle) = MockRegisterMaster::new();
///     handle.push_reading(vec![true, false]);
///
///     let bits = master.read_coils(0x01F4, 9).await?;
///
///     assert_eq!(bits, vec![true, false]);
///     assert_eq!(
///         handle.calls(),
///         vec![RegisterCall::ReadCoils { address: 0x01F4, quantity: 9 }]
///     );
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockRegisterMaster {
    state: Arc<Mutex<MockState>>,
}

impl MockRegisterMaster {
    /// Create a mock master and the handle that scripts and inspects it.
    pub fn new() -> (Self, MockRegisterMasterHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let master = Self {
            state: Arc::clone(&state),
        };
        (master, MockRegisterMasterHandle { state })
    }

    fn record(&self, call: RegisterCall) -> Option<Result<Vec<bool>>> {
        let mut state = lock(&self.state);
        state.calls.push(call);
        state.responses.pop_front()
    }
}

impl Default for MockRegisterMaster {
    fn default() -> Self {
        Self::new().0
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn released_block() -> Vec<bool> {
    vec![false; usize::from(REGISTER_QUANTITY)]
}

impl RegisterMaster for MockRegisterMaster {
    async fn read_coils(&mut self, address: u16, quantity: u16) -> Result<Vec<bool>> {
        self.record(RegisterCall::ReadCoils { address, quantity })
            .unwrap_or_else(|| Ok(released_block()))
    }

    async fn read_discrete_inputs(&mut self, address: u16, quantity: u16) -> Result<Vec<bool>> {
        self.record(RegisterCall::ReadDiscreteInputs { address, quantity })
            .unwrap_or_else(|| Ok(released_block()))
    }

    async fn write_single_coil(&mut self, address: u16, value: u16) -> Result<()> {
        match self.record(RegisterCall::WriteSingleCoil { address, value }) {
            Some(Err(error)) => Err(error),
            _ => Ok(()),
        }
    }
}

/// Handle for scripting and inspecting a [`MockRegisterMaster`].
#[derive(Debug, Clone)]
pub struct MockRegisterMasterHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockRegisterMasterHandle {
    /// Queue the bits returned by the next read.
    pub fn push_reading(&self, bits: Vec<bool>) {
        lock(&self.state).responses.push_back(Ok(bits));
    }

    /// Queue a failure for the next call.
    pub fn push_failure(&self, error: HardwareError) {
        lock(&self.state).responses.push_back(Err(error));
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RegisterCall> {
        lock(&self.state).calls.clone()
    }
}
