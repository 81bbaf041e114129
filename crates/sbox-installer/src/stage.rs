//! Install stage machine.
//!
//! The installer walks a fixed sequence of stages. This module owns that
//! sequence and refuses any transition that skips or reorders a stage.
//!
//! # Stages
//!
//! - `Pending`: nothing has run yet
//! - `Confirm`: the operator answered `Y`
//! - `FilesChecked`: config file and binary are present
//! - `BinaryInstalled`: binary copied into the system bin directory
//! - `InterfaceCreated`: serial driver bound to the unit's USB ids
//! - `InterfaceVerified`: the bound device path exists
//! - `OwnershipSet`: device path owned by the invoking user
//! - `ConfigLoaded`: config file decoded
//! - `DoorsLoaded`: door table decoded
//! - `DoorsValidated`: first door reads as calibrated
//! - `CredentialCollected`: deployer password entered
//! - `Registered`: inventory service accepted the unit
//! - `Done`: success
//!
//! # Valid Transitions
//!
//! - Pending → Confirm → FilesChecked → ... → Registered → Done
//! - OwnershipSet → Done (interface-only runs)
//!
//! # Examples
//!
//! ```
//! use sbox_installer::{InstallMode, InstallStage, StageMachine};
//!
//! let mut machine = StageMachine::new(InstallMode::Full);
//! machine.transition_to(InstallStage::Confirm).unwrap();
//! assert!(machine.transition_to(InstallStage::Registered).is_err());
//! assert_eq!(machine.current_stage(), InstallStage::Confirm);
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use sbox_core::{Error, Result};

/// Which part of the install workflow to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallMode {
    /// All twelve stages, ending with registration.
    #[default]
    Full,

    /// Stop after the device interface is bound and owned.
    InterfaceOnly,
}

impl InstallMode {
    /// Stages executed in this mode, in order.
    pub fn stages(&self) -> &'static [InstallStage] {
        match self {
            InstallMode::Full => &InstallStage::ORDER,
            InstallMode::InterfaceOnly => &INTERFACE_ONLY_ORDER,
        }
    }
}

/// One step of the install workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStage {
    Pending,
    Confirm,
    FilesChecked,
    BinaryInstalled,
    InterfaceCreated,
    InterfaceVerified,
    OwnershipSet,
    ConfigLoaded,
    DoorsLoaded,
    DoorsValidated,
    CredentialCollected,
    Registered,
    Done,
}

const INTERFACE_ONLY_ORDER: [InstallStage; 7] = [
    InstallStage::Confirm,
    InstallStage::FilesChecked,
    InstallStage::BinaryInstalled,
    InstallStage::InterfaceCreated,
    InstallStage::InterfaceVerified,
    InstallStage::OwnershipSet,
    InstallStage::Done,
];

impl InstallStage {
    /// Full install order.
    pub const ORDER: [InstallStage; 12] = [
        InstallStage::Confirm,
        InstallStage::FilesChecked,
        InstallStage::BinaryInstalled,
        InstallStage::InterfaceCreated,
        InstallStage::InterfaceVerified,
        InstallStage::OwnershipSet,
        InstallStage::ConfigLoaded,
        InstallStage::DoorsLoaded,
        InstallStage::DoorsValidated,
        InstallStage::CredentialCollected,
        InstallStage::Registered,
        InstallStage::Done,
    ];

    /// The stage that follows this one in a full install.
    pub fn successor(&self) -> Option<InstallStage> {
        match self {
            InstallStage::Pending => Some(InstallStage::Confirm),
            InstallStage::Done => None,
            stage => {
                let position = Self::ORDER.iter().position(|s| s == stage)?;
                Self::ORDER.get(position + 1).copied()
            }
        }
    }

    /// Check whether moving to `target` is permitted in `mode`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sbox_installer::{InstallMode, InstallStage};
    ///
    /// let stage = InstallStage::OwnershipSet;
    /// assert!(stage.can_transition_to(&InstallStage::ConfigLoaded, InstallMode::Full));
    /// assert!(stage.can_transition_to(&InstallStage::Done, InstallMode::InterfaceOnly));
    /// assert!(!stage.can_transition_to(&InstallStage::Done, InstallMode::Full));
    /// ```
    pub fn can_transition_to(&self, target: &InstallStage, mode: InstallMode) -> bool {
        match mode {
            InstallMode::Full => self.successor().as_ref() == Some(target),
            InstallMode::InterfaceOnly => {
                let stages = mode.stages();
                match self {
                    InstallStage::Pending => stages.first() == Some(target),
                    stage => stages
                        .iter()
                        .position(|s| s == stage)
                        .and_then(|position| stages.get(position + 1))
                        == Some(target),
                }
            }
        }
    }

    /// Operator-facing progress line printed when the stage starts.
    ///
    /// `owner` is the account the device interface is handed to.
    pub fn progress_message(&self, owner: Option<&str>) -> Option<String> {
        let message = match self {
            InstallStage::FilesChecked => "checking setup files...",
            InstallStage::BinaryInstalled => "copying sbox to bin...",
            InstallStage::InterfaceCreated => "creating device interface...",
            InstallStage::InterfaceVerified => "checking interface created...",
            InstallStage::OwnershipSet => match owner.filter(|owner| !owner.is_empty()) {
                Some(owner) => return Some(format!("setting owner to {owner} user...")),
                None => "setting interface owner...",
            },
            InstallStage::ConfigLoaded => "parsing config json file...",
            InstallStage::DoorsLoaded => "loading doors...",
            InstallStage::DoorsValidated => "validating doors...",
            InstallStage::Registered => "authenticating...",
            InstallStage::Pending
            | InstallStage::Confirm
            | InstallStage::CredentialCollected
            | InstallStage::Done => return None,
        };
        Some(message.to_string())
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage_str = match self {
            InstallStage::Pending => "PENDING",
            InstallStage::Confirm => "CONFIRM",
            InstallStage::FilesChecked => "FILES_CHECKED",
            InstallStage::BinaryInstalled => "BINARY_INSTALLED",
            InstallStage::InterfaceCreated => "INTERFACE_CREATED",
            InstallStage::InterfaceVerified => "INTERFACE_VERIFIED",
            InstallStage::OwnershipSet => "OWNERSHIP_SET",
            InstallStage::ConfigLoaded => "CONFIG_LOADED",
            InstallStage::DoorsLoaded => "DOORS_LOADED",
            InstallStage::DoorsValidated => "DOORS_VALIDATED",
            InstallStage::CredentialCollected => "CREDENTIAL_COLLECTED",
            InstallStage::Registered => "REGISTERED",
            InstallStage::Done => "DONE",
        };
        write!(f, "{}", stage_str)
    }
}

/// Record of one completed stage.
#[derive(Debug, Clone)]
pub struct StageTransition {
    pub from: InstallStage,
    pub to: InstallStage,
    pub timestamp: Instant,
}

impl StageTransition {
    pub fn new(from: InstallStage, to: InstallStage) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Time since the transition was recorded.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Stage machine for one install run.
///
/// Starts in `Pending` and keeps every transition; a run has at most
/// twelve of them, so the history is never trimmed.
#[derive(Debug)]
pub struct StageMachine {
    mode: InstallMode,
    current_stage: InstallStage,
    started_at: Instant,
    history: Vec<StageTransition>,
}

impl StageMachine {
    pub fn new(mode: InstallMode) -> Self {
        Self {
            mode,
            current_stage: InstallStage::Pending,
            started_at: Instant::now(),
            history: Vec::with_capacity(InstallStage::ORDER.len()),
        }
    }

    pub fn mode(&self) -> InstallMode {
        self.mode
    }

    pub fn current_stage(&self) -> InstallStage {
        self.current_stage
    }

    /// Time since the machine was created.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn history(&self) -> &[StageTransition] {
        &self.history
    }

    /// Stages reached so far, oldest first.
    pub fn completed(&self) -> Vec<InstallStage> {
        self.history.iter().map(|t| t.to).collect()
    }

    pub fn is_done(&self) -> bool {
        self.current_stage == InstallStage::Done
    }

    /// Move to `stage`, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStageTransition` if `stage` is not the next
    /// stage for this machine's mode. The machine is left unchanged.
    pub fn transition_to(&mut self, stage: InstallStage) -> Result<StageTransition> {
        if !self.current_stage.can_transition_to(&stage, self.mode) {
            return Err(Error::InvalidStageTransition {
                from: self.current_stage.to_string(),
                to: stage.to_string(),
            });
        }

        let transition = StageTransition::new(self.current_stage, stage);
        self.current_stage = stage;
        self.history.push(transition.clone());

        Ok(transition)
    }
}
