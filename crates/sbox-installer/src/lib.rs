//! SmartBox installer.
//!
//! This crate contains the commissioning workflow run on a freshly wired
//! unit: confirm, install the binary, bind the USB serial interface, load the
//! site configuration and door table, check the first door is calibrated and
//! register the unit with the inventory service.
//!
//! The workflow is an ordered pipeline guarded by a stage machine; see
//! [`stage`] for the stages and [`installer`] for what each one does.

pub mod binder;
pub mod calibration;
pub mod installer;
pub mod mock;
pub mod prompt;
pub mod report;
pub mod settings;
pub mod shell;
pub mod stage;

pub use binder::{AnyDeviceDiscovery, DeviceInterfaceBinder, DeviceInterfaceBinding, LsusbDiscovery};
pub use calibration::{Calibration, DoorCalibrationChecker};
pub use installer::{InstallContext, InstallDeps, Installer};
pub use prompt::{Prompt, TerminalPrompt};
pub use report::{DoorStatus, report_doors};
pub use settings::InstallerSettings;
pub use shell::{CommandOutput, Shell, ShellCommand, SystemShell};
pub use stage::{InstallMode, InstallStage, StageMachine, StageTransition};
