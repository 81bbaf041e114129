//! Door calibration check.
//!
//! A door is calibrated when its input block reads as fully released. The
//! check is made on the printed reading rather than on the decoded bits: any
//! `1` in the text, an empty reading or a failed read (unparseable address
//! included) means the door is not calibrated.

use sbox_core::{Action, Door, Result};
use sbox_hardware::{ActionDispatcher, RegisterMaster};
use tracing::{debug, warn};

/// Outcome of a calibration check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calibration {
    Calibrated,
    NotCalibrated,
}

impl Calibration {
    pub fn is_calibrated(&self) -> bool {
        matches!(self, Calibration::Calibrated)
    }

    /// Judge the outcome of a `read-input` command.
    ///
    /// # Examples
    ///
    /// ```
    /// use sbox_installer::Calibration;
    ///
    /// assert_eq!(Calibration::judge(&Ok("[0 0 0]".to_string())), Calibration::Calibrated);
    /// assert_eq!(Calibration::judge(&Ok("[0 1 0]".to_string())), Calibration::NotCalibrated);
    /// assert_eq!(Calibration::judge(&Ok(String::new())), Calibration::NotCalibrated);
    /// ```
    pub fn judge(outcome: &Result<String>) -> Calibration {
        match outcome {
            Ok(output) if !output.is_empty() && !output.contains('1') => Calibration::Calibrated,
            _ => Calibration::NotCalibrated,
        }
    }
}

/// Reads a door's input block and judges its calibration.
#[derive(Debug)]
pub struct DoorCalibrationChecker<'a, M> {
    dispatcher: &'a mut ActionDispatcher<M>,
}

impl<'a, M: RegisterMaster> DoorCalibrationChecker<'a, M> {
    pub fn new(dispatcher: &'a mut ActionDispatcher<M>) -> Self {
        Self { dispatcher }
    }

    /// Check `door` by dispatching `read-input` at its input address.
    ///
    /// Never fails: every failure is folded into
    /// [`Calibration::NotCalibrated`].
    pub async fn check(&mut self, door: &Door) -> Calibration {
        let outcome = self
            .dispatcher
            .dispatch_command(Action::ReadInput.keyword(), &door.input)
            .await
            .map(|output| output.to_string());

        match &outcome {
            Ok(output) => debug!(door = %door.name, input = %door.input, %output, "Read door input"),
            Err(e) => warn!(door = %door.name, input = %door.input, error = %e, "Door input read failed"),
        }

        Calibration::judge(&outcome)
    }
}
