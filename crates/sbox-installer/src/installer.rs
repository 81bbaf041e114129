//! The install workflow.
//!
//! [`Installer`] runs the stages of an [`InstallMode`] in order. Each stage
//! either completes and is recorded by the [`StageMachine`], or fails and
//! ends the run; nothing already done is rolled back.
//!
//! Every collaborator is a trait so the whole workflow can run against the
//! [`mock`](crate::mock) implementations:
//!
//! | Seam | Production | Purpose |
//! |------|------------|---------|
//! | [`Shell`] | [`SystemShell`](crate::SystemShell) | `sudo cp`, `sudo modprobe`, `sudo chown` |
//! | [`DeviceDiscovery`] | [`AnyDeviceDiscovery`](crate::AnyDeviceDiscovery) | find the unit on the USB bus |
//! | [`Prompt`] | [`TerminalPrompt`](crate::TerminalPrompt) | confirmation and password |
//! | [`Registrar`] | `RegistrationClient` | inventory registration |
//! | [`RegisterMaster`] | `ModbusMaster` | door calibration read |

use sbox_core::constants::CONFIRM_ANSWER;
use sbox_core::{Config, Error, Result, VERSION, load_doors};
use sbox_hardware::{ActionDispatcher, DeviceDiscovery, RegisterMaster};
use sbox_network::{Registrar, RegistrationResponse};
use tracing::{debug, error, info};

use crate::binder::{DeviceInterfaceBinder, DeviceInterfaceBinding};
use crate::calibration::DoorCalibrationChecker;
use crate::prompt::Prompt;
use crate::settings::InstallerSettings;
use crate::shell::{Shell, ShellCommand};
use crate::stage::{InstallMode, InstallStage, StageMachine};

const CONFIRM_QUESTION: &str = "do you want to continue? [Y/n]: ";

/// Collaborators handed to the installer.
#[derive(Debug)]
pub struct InstallDeps<S, D, P, R, M> {
    pub shell: S,
    pub discovery: D,
    pub prompt: P,
    pub registrar: R,
    /// Master for the device interface being installed.
    pub master: M,
}

/// State gathered while the stages run.
#[derive(Debug, Default)]
pub struct InstallContext {
    pub binding: Option<DeviceInterfaceBinding>,
    pub config: Option<Config>,
    pub registration: Option<RegistrationResponse>,
}

impl InstallContext {
    fn config_mut(&mut self) -> Result<&mut Config> {
        self.config
            .as_mut()
            .ok_or_else(|| Error::InvalidConfig("configuration not loaded".to_string()))
    }
}

/// Runs the install workflow.
///
/// # Examples
///
/// ```no_run
/// use sbox_hardware::{ModbusMaster, Transport};
/// use sbox_installer::{
///     AnyDeviceDiscovery, InstallDeps, InstallMode, Installer, InstallerSettings, SystemShell,
///     TerminalPrompt,
/// };
/// use sbox_network::{RegistrationClient, RegistrationClientConfig};
///
/// # async fn example() -> sbox_core::Result<()> {
/// let settings = InstallerSettings::from_env();
/// let master = ModbusMaster::new(Transport::select(&settings.device_interface.to_string_lossy()));
///
/// let mut installer = Installer::new(
///     settings,
///     InstallMode::Full,
///     InstallDeps {
///         shell: SystemShell,
///         discovery: AnyDeviceDiscovery::default(),
///         prompt: TerminalPrompt::new(),
///         registrar: RegistrationClient::new(RegistrationClientConfig::default()),
///         master,
///     },
/// );
/// installer.run().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Installer<S, D, P, R, M> {
    settings: InstallerSettings,
    machine: StageMachine,
    shell: S,
    discovery: D,
    prompt: P,
    registrar: R,
    dispatcher: ActionDispatcher<M>,
}

impl<S, D, P, R, M> Installer<S, D, P, R, M>
where
    S: Shell,
    D: DeviceDiscovery,
    P: Prompt,
    R: Registrar,
    M: RegisterMaster,
{
    pub fn new(settings: InstallerSettings, mode: InstallMode, deps: InstallDeps<S, D, P, R, M>) -> Self {
        Self {
            settings,
            machine: StageMachine::new(mode),
            shell: deps.shell,
            discovery: deps.discovery,
            prompt: deps.prompt,
            registrar: deps.registrar,
            dispatcher: ActionDispatcher::new(deps.master),
        }
    }

    pub fn settings(&self) -> &InstallerSettings {
        &self.settings
    }

    pub fn machine(&self) -> &StageMachine {
        &self.machine
    }

    pub fn dispatcher(&self) -> &ActionDispatcher<M> {
        &self.dispatcher
    }

    /// Run every stage of the mode in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing stage; `Error::Aborted` if the
    /// operator did not confirm.
    pub async fn run(&mut self) -> Result<InstallContext> {
        let mut context = InstallContext::default();
        let mode = self.machine.mode();

        info!(?mode, "Starting install");

        for &stage in mode.stages() {
            if let Some(message) = stage.progress_message(self.settings.unit_user.as_deref()) {
                println!("{message}");
            }
            debug!(%stage, "Entering stage");

            if let Err(e) = self.execute(stage, &mut context).await {
                error!(%stage, error = %e, "Install stage failed");
                return Err(e);
            }

            self.machine.transition_to(stage)?;
        }

        info!(elapsed = ?self.machine.elapsed(), "Install finished");
        Ok(context)
    }

    async fn execute(&mut self, stage: InstallStage, context: &mut InstallContext) -> Result<()> {
        match stage {
            InstallStage::Pending => Ok(()),
            InstallStage::Confirm => self.confirm().await,
            InstallStage::FilesChecked => self.check_files().await,
            InstallStage::BinaryInstalled => self.install_binary().await,
            InstallStage::InterfaceCreated => {
                let binding = DeviceInterfaceBinder::new(&self.discovery, &self.shell)
                    .bind(&self.settings.device_label, &self.settings.device_interface)
                    .await?;
                context.binding = Some(binding);
                Ok(())
            }
            InstallStage::InterfaceVerified => self.verify_interface(context).await,
            InstallStage::OwnershipSet => self.set_owner(context).await,
            InstallStage::ConfigLoaded => {
                let config = Config::load(&self.settings.config_file)?;
                debug!(unit = %config.smartbox.id, deployer = %config.deployer.username, "Config loaded");
                context.config = Some(config);
                Ok(())
            }
            InstallStage::DoorsLoaded => {
                let config = context.config_mut()?;
                config.doors = load_doors(&config.path)?;
                info!(count = config.doors.len(), path = %config.path, "Doors loaded");
                Ok(())
            }
            InstallStage::DoorsValidated => {
                let config = context.config_mut()?;
                let door = config
                    .doors
                    .first()
                    .ok_or_else(|| Error::InvalidDoors("no doors defined".to_string()))?;

                let calibration = DoorCalibrationChecker::new(&mut self.dispatcher)
                    .check(door)
                    .await;
                if !calibration.is_calibrated() {
                    return Err(Error::NotCalibrated {
                        door: door.name.clone(),
                    });
                }
                Ok(())
            }
            InstallStage::CredentialCollected => {
                let config = context.config_mut()?;
                let question = format!("password for {}: ", config.deployer.username);
                config.deployer.password = self.prompt.ask_secret(&question).await?;
                Ok(())
            }
            InstallStage::Registered => {
                let config = context.config_mut()?;
                let response = self.registrar.register(config).await?;
                println!("{}", response.message);
                context.registration = Some(response);
                Ok(())
            }
            InstallStage::Done => {
                println!("setup complete!");
                Ok(())
            }
        }
    }

    async fn confirm(&mut self) -> Result<()> {
        println!("sbox {VERSION} installer");
        println!(
            "this copies sbox to {} and binds the {} device interface",
            self.settings.bin_dir.display(),
            self.settings.device_label
        );
        if self.machine.mode() == InstallMode::Full {
            println!(
                "then registers the unit described in {}",
                self.settings.config_file.display()
            );
        }

        let answer = self.prompt.ask(CONFIRM_QUESTION).await?;
        if answer != CONFIRM_ANSWER {
            info!(answer = %answer, "Install not confirmed");
            return Err(Error::Aborted);
        }
        Ok(())
    }

    async fn check_files(&self) -> Result<()> {
        for path in [&self.settings.config_file, &self.settings.binary_file] {
            match tokio::fs::metadata(path).await {
                Ok(metadata) if metadata.is_file() => {}
                _ => return Err(Error::MissingFile(path.display().to_string())),
            }
        }
        Ok(())
    }

    async fn install_binary(&self) -> Result<()> {
        let command = ShellCommand::new("sudo").args([
            "cp".to_string(),
            self.settings.binary_file.display().to_string(),
            self.settings.bin_dir.display().to_string(),
        ]);
        self.run_privileged(&command).await
    }

    async fn verify_interface(&self, context: &InstallContext) -> Result<()> {
        let path = context
            .binding
            .as_ref()
            .map_or(&self.settings.device_interface, |binding| &binding.bound_path);

        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            Ok(())
        } else {
            Err(Error::external_tool(
                "modprobe",
                format!("{} was not created", path.display()),
            ))
        }
    }

    async fn set_owner(&self, context: &InstallContext) -> Result<()> {
        let user = self
            .settings
            .unit_user
            .as_deref()
            .filter(|user| !user.is_empty())
            .ok_or_else(|| Error::Privilege("cannot determine the invoking user".to_string()))?;
        let path = context
            .binding
            .as_ref()
            .map_or(&self.settings.device_interface, |binding| &binding.bound_path);

        let command = ShellCommand::new("sudo").args([
            "chown".to_string(),
            format!("{user}:{user}"),
            path.display().to_string(),
        ]);
        self.run_privileged(&command).await
    }

    async fn run_privileged(&self, command: &ShellCommand) -> Result<()> {
        let output = self
            .shell
            .run(command)
            .await
            .map_err(|e| Error::Privilege(e.to_string()))?;

        if !output.success() {
            return Err(Error::Privilege(output.failure_reason()));
        }
        Ok(())
    }
}
