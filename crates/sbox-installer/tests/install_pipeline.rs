//! Integration tests for the install workflow
//!
//! These tests run the installer end to end against scripted collaborators
//! and a temporary site directory, and check which commands were issued,
//! which stages completed and where the run stopped.

use std::fs;
use std::path::PathBuf;

use sbox_core::{Error, ErrorKind};
use sbox_hardware::mock::{MockRegisterMaster, MockRegisterMasterHandle, RegisterCall};
use sbox_hardware::{HardwareError, UsbIds};
use sbox_installer::mock::{MockRegistrar, ScriptedPrompt, ScriptedShell};
use sbox_installer::{
    CommandOutput, InstallDeps, InstallMode, InstallStage, Installer, InstallerSettings,
    LsusbDiscovery,
};
use tempfile::TempDir;

const LSUSB_LINE: &str = "Bus 001 Device 004: ID 0403:6001 Delta Electronics\n";

type TestInstaller = Installer<
    ScriptedShell,
    LsusbDiscovery<ScriptedShell>,
    ScriptedPrompt,
    MockRegistrar,
    MockRegisterMaster,
>;

/// Temporary site directory with a config, a door table, the binary and a
/// stand-in for the serial device node.
struct Site {
    dir: TempDir,
}

impl Site {
    fn new() -> Self {
        let site = Self {
            dir: TempDir::new().unwrap(),
        };
        site.write_doors("name,input,output,width,height,length\nMain Gate,1F4,19A,90,210,4\nDock,1F5,19B,120,300,6\n");
        site.write_config("Alice");
        fs::write(site.binary(), b"\x7fELF").unwrap();
        fs::write(site.interface(), b"").unwrap();
        site
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self) -> PathBuf {
        self.path("config.json")
    }

    fn binary(&self) -> PathBuf {
        self.path("sbox")
    }

    fn interface(&self) -> PathBuf {
        self.path("ttyUSB0")
    }

    fn write_config(&self, username: &str) {
        let config = serde_json::json!({
            "port": 502,
            "path": self.path("doors.csv"),
            "api": "v1",
            "smartbox": { "id": "SB-0042", "name": "Warehouse" },
            "address": { "label": "HQ", "street": "Rua A", "city": "Recife", "state": "PE" },
            "deployer": { "username": username },
            "extras": [{ "name": "Floor", "value": "B2" }]
        });
        fs::write(self.config(), config.to_string()).unwrap();
    }

    fn write_doors(&self, table: &str) {
        fs::write(self.path("doors.csv"), table).unwrap();
    }

    fn settings(&self) -> InstallerSettings {
        InstallerSettings::default()
            .with_config_file(self.config())
            .with_binary_file(self.binary())
            .with_device_interface(self.interface())
            .with_unit_user("operator")
    }
}

struct Harness {
    installer: TestInstaller,
    shell: ScriptedShell,
    prompt: ScriptedPrompt,
    registrar: MockRegistrar,
    master: MockRegisterMasterHandle,
}

fn harness(site: &Site, mode: InstallMode, prompt: ScriptedPrompt, registrar: MockRegistrar) -> Harness {
    harness_with_bus(site, mode, prompt, registrar, CommandOutput::ok(LSUSB_LINE))
}

fn harness_with_bus(
    site: &Site,
    mode: InstallMode,
    prompt: ScriptedPrompt,
    registrar: MockRegistrar,
    enumeration: CommandOutput,
) -> Harness {
    let shell = ScriptedShell::new();
    shell.respond("lsusb | grep Delta", enumeration);
    let (master, handle) = MockRegisterMaster::new();

    let installer = Installer::new(
        site.settings(),
        mode,
        InstallDeps {
            shell: shell.clone(),
            discovery: LsusbDiscovery::new(shell.clone()),
            prompt: prompt.clone(),
            registrar: registrar.clone(),
            master,
        },
    );

    Harness {
        installer,
        shell,
        prompt,
        registrar,
        master: handle,
    }
}

fn confirmed() -> ScriptedPrompt {
    ScriptedPrompt::new().answer("Y").secret("Hunter2")
}

#[tokio::test]
async fn test_full_install_runs_every_stage_in_order() {
    let site = Site::new();
    let mut h = harness(&site, InstallMode::Full, confirmed(), MockRegistrar::accepting());

    let context = h.installer.run().await.unwrap();

    assert_eq!(h.installer.machine().completed(), InstallStage::ORDER.to_vec());
    assert_eq!(
        h.shell.commands(),
        vec![
            format!("sudo cp {} /usr/bin/", site.binary().display()),
            "lsusb | grep Delta".to_string(),
            "sudo modprobe usbserial vendor=0x0403 product=0x6001".to_string(),
            format!("sudo chown operator:operator {}", site.interface().display()),
        ]
    );
    assert_eq!(
        h.master.calls(),
        vec![RegisterCall::ReadDiscreteInputs { address: 0x01F4, quantity: 9 }]
    );

    let binding = context.binding.unwrap();
    assert_eq!(binding.ids, UsbIds::new("0403", "6001"));
    assert!(context.registration.unwrap().is_success());

    let registered = h.registrar.received();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].deployer.username, "Alice");
    assert_eq!(registered[0].deployer.password, "Hunter2");
    assert_eq!(registered[0].doors.len(), 2);
    assert_eq!(registered[0].doors[0].name, "Main Gate");
    assert_eq!(registered[0].extras[0].value, "B2");

    assert_eq!(
        h.prompt.questions(),
        vec![
            "do you want to continue? [Y/n]: ".to_string(),
            "password for Alice: ".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_declined_confirmation_does_nothing() {
    let site = Site::new();
    let prompt = ScriptedPrompt::new().answer("n");
    let mut h = harness(&site, InstallMode::Full, prompt, MockRegistrar::accepting());

    let error = h.installer.run().await.unwrap_err();

    assert!(matches!(error, Error::Aborted));
    assert_eq!(error.kind(), ErrorKind::Aborted);
    assert!(h.shell.commands().is_empty());
    assert!(h.master.calls().is_empty());
    assert!(h.registrar.received().is_empty());
    assert!(h.installer.machine().history().is_empty());
    assert_eq!(h.installer.machine().current_stage(), InstallStage::Pending);
}

#[tokio::test]
async fn test_confirmation_is_exact() {
    for answer in ["y", "yes", "Y ", " Y", ""] {
        let site = Site::new();
        let prompt = ScriptedPrompt::new().answer(answer);
        let mut h = harness(&site, InstallMode::Full, prompt, MockRegistrar::accepting());

        let error = h.installer.run().await.unwrap_err();
        assert!(matches!(error, Error::Aborted), "answer {answer:?} was accepted");
    }
}

#[tokio::test]
async fn test_missing_binary_stops_before_any_command() {
    let site = Site::new();
    fs::remove_file(site.binary()).unwrap();
    let mut h = harness(&site, InstallMode::Full, confirmed(), MockRegistrar::accepting());

    let error = h.installer.run().await.unwrap_err();

    assert!(matches!(error, Error::MissingFile(ref path) if path.ends_with("sbox")));
    assert!(h.shell.commands().is_empty());
    assert_eq!(h.installer.machine().completed(), vec![InstallStage::Confirm]);
}

#[tokio::test]
async fn test_failed_copy_is_privilege_error() {
    let site = Site::new();
    let mut h = harness(&site, InstallMode::Full, confirmed(), MockRegistrar::accepting());
    h.shell.respond(
        "sudo cp",
        CommandOutput::failed(1, "operator is not in the sudoers file"),
    );

    let error = h.installer.run().await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Privilege);
    assert!(error.to_string().starts_with("you must be a sudoer!"));
    assert_eq!(h.shell.commands().len(), 1);
    assert_eq!(
        h.installer.machine().current_stage(),
        InstallStage::FilesChecked
    );
}

#[tokio::test]
async fn test_unplugged_device_is_not_connected() {
    let site = Site::new();
    let mut h = harness_with_bus(
        &site,
        InstallMode::Full,
        confirmed(),
        MockRegistrar::accepting(),
        CommandOutput::failed(1, ""),
    );

    let error = h.installer.run().await.unwrap_err();

    assert!(matches!(error, Error::DeviceNotConnected { ref label } if label == "Delta"));
    assert!(!h.shell.commands().iter().any(|c| c.contains("modprobe")));
    assert_eq!(
        h.installer.machine().current_stage(),
        InstallStage::BinaryInstalled
    );
}

#[tokio::test]
async fn test_missing_device_node_stops_before_chown() {
    let site = Site::new();
    fs::remove_file(site.interface()).unwrap();
    let mut h = harness(&site, InstallMode::Full, confirmed(), MockRegistrar::accepting());

    let error = h.installer.run().await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::ExternalTool);
    assert!(!h.shell.commands().iter().any(|c| c.contains("chown")));
    assert_eq!(
        h.installer.machine().current_stage(),
        InstallStage::InterfaceCreated
    );
}

#[tokio::test]
async fn test_interface_only_stops_after_ownership() {
    let site = Site::new();
    let prompt = ScriptedPrompt::new().answer("Y");
    let mut h = harness(&site, InstallMode::InterfaceOnly, prompt, MockRegistrar::accepting());

    let context = h.installer.run().await.unwrap();

    assert!(h.installer.machine().is_done());
    assert_eq!(
        h.installer.machine().completed(),
        InstallMode::InterfaceOnly.stages().to_vec()
    );
    assert!(context.config.is_none());
    assert!(context.binding.is_some());
    assert_eq!(h.shell.commands().len(), 4);
    assert!(h.master.calls().is_empty());
    assert!(h.registrar.received().is_empty());
    assert_eq!(h.prompt.questions().len(), 1);
}

#[tokio::test]
async fn test_config_without_deployer_is_invalid() {
    let site = Site::new();
    site.write_config("  ");
    let mut h = harness(&site, InstallMode::Full, confirmed(), MockRegistrar::accepting());

    let error = h.installer.run().await.unwrap_err();

    assert!(matches!(error, Error::InvalidConfig(_)));
    assert_eq!(
        h.installer.machine().current_stage(),
        InstallStage::OwnershipSet
    );
}

#[tokio::test]
async fn test_empty_door_table_is_validation_error() {
    let site = Site::new();
    site.write_doors("name,input,output,width,height,length\n");
    let mut h = harness(&site, InstallMode::Full, confirmed(), MockRegistrar::accepting());

    let error = h.installer.run().await.unwrap_err();

    assert!(matches!(error, Error::InvalidDoors(_)));
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert!(h.master.calls().is_empty());
    assert_eq!(
        h.installer.machine().current_stage(),
        InstallStage::DoorsLoaded
    );
}

#[tokio::test]
async fn test_uncalibrated_door_stops_before_password() {
    let site = Site::new();
    let mut h = harness(&site, InstallMode::Full, confirmed(), MockRegistrar::accepting());
    h.master
        .push_reading(vec![true, false, false, false, false, false, false, false, false]);

    let error = h.installer.run().await.unwrap_err();

    assert!(matches!(error, Error::NotCalibrated { ref door } if door == "Main Gate"));
    assert_eq!(h.prompt.questions().len(), 1);
    assert!(h.registrar.received().is_empty());
}

#[tokio::test]
async fn test_unreadable_door_is_not_calibrated() {
    let site = Site::new();
    let mut h = harness(&site, InstallMode::Full, confirmed(), MockRegistrar::accepting());
    h.master
        .push_failure(HardwareError::protocol("timeout", "[]"));

    let error = h.installer.run().await.unwrap_err();

    assert!(matches!(error, Error::NotCalibrated { .. }));
}

#[tokio::test]
async fn test_rejected_registration_surfaces_message() {
    let site = Site::new();
    let mut h = harness(
        &site,
        InstallMode::Full,
        confirmed(),
        MockRegistrar::rejecting("deployer alice is not allowed"),
    );

    let error = h.installer.run().await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Network);
    assert_eq!(error.to_string(), "deployer alice is not allowed");
    assert_eq!(h.registrar.received().len(), 1);
    assert_eq!(
        h.installer.machine().current_stage(),
        InstallStage::CredentialCollected
    );
}

#[tokio::test]
async fn test_second_run_is_rejected_by_stage_machine() {
    let site = Site::new();
    let prompt = ScriptedPrompt::new().answer("Y").answer("Y");
    let mut h = harness(&site, InstallMode::InterfaceOnly, prompt, MockRegistrar::accepting());

    h.installer.run().await.unwrap();
    let error = h.installer.run().await.unwrap_err();

    assert!(matches!(error, Error::InvalidStageTransition { .. }));
}
