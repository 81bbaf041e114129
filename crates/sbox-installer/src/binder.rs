//! Device interface binding.
//!
//! Finding the unit on the USB bus and binding the generic USB serial driver
//! to its vendor/product ids, which makes the kernel create the serial
//! device node the register master talks to.
//!
//! Two discovery providers are available:
//!
//! - [`LsusbDiscovery`]: `lsusb | grep <label>`, parsed with
//!   [`parse_usb_ids`]. This is the default.
//! - `LibusbDiscovery` (feature `usb-discovery`): asks libusb directly.
//!
//! [`AnyDeviceDiscovery`] selects between them at runtime.

use std::path::{Path, PathBuf};

use sbox_core::constants::{SERIAL_DRIVER, TEXT_FILTER_COMMAND, USB_ENUMERATION_COMMAND};
use sbox_core::{Error, Result};
use sbox_hardware::discovery::parse_usb_ids;
use sbox_hardware::{DeviceDiscovery, Discovery, HardwareError, UsbIds};
use tracing::{debug, info, warn};

use crate::shell::{Shell, ShellCommand, SystemShell};

/// Discovery through the `lsusb | grep <label>` pipeline.
///
/// Empty filter output means the device is not plugged in. A matched line
/// whose id column cannot be read is an error.
#[derive(Debug, Clone, Default)]
pub struct LsusbDiscovery<S> {
    shell: S,
}

impl<S: Shell> LsusbDiscovery<S> {
    pub fn new(shell: S) -> Self {
        Self { shell }
    }
}

impl<S: Shell> DeviceDiscovery for LsusbDiscovery<S> {
    async fn discover(&self, label: &str) -> sbox_hardware::Result<Discovery> {
        let producer = ShellCommand::new(USB_ENUMERATION_COMMAND);
        let filter = ShellCommand::new(TEXT_FILTER_COMMAND).arg(label);

        let output = self
            .shell
            .pipe(&producer, &filter)
            .await
            .map_err(|e| HardwareError::usb(e.to_string()))?;

        if output.stdout.trim().is_empty() {
            debug!(label, "No enumeration line matched");
            return Ok(Discovery::NotFound);
        }

        parse_usb_ids(&output.stdout).map(Discovery::Found)
    }
}

/// Runtime choice of discovery provider.
#[derive(Debug, Clone)]
pub enum AnyDeviceDiscovery {
    Lsusb(LsusbDiscovery<SystemShell>),
    #[cfg(feature = "usb-discovery")]
    Libusb(sbox_hardware::discovery::LibusbDiscovery),
}

impl Default for AnyDeviceDiscovery {
    fn default() -> Self {
        AnyDeviceDiscovery::Lsusb(LsusbDiscovery::new(SystemShell))
    }
}

impl DeviceDiscovery for AnyDeviceDiscovery {
    async fn discover(&self, label: &str) -> sbox_hardware::Result<Discovery> {
        match self {
            AnyDeviceDiscovery::Lsusb(discovery) => discovery.discover(label).await,
            #[cfg(feature = "usb-discovery")]
            AnyDeviceDiscovery::Libusb(discovery) => discovery.discover(label).await,
        }
    }
}

/// Result of a successful bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInterfaceBinding {
    pub ids: UsbIds,
    /// Device node expected to appear once the driver is bound.
    pub bound_path: PathBuf,
}

/// Binds the serial driver to the unit found by a discovery provider.
#[derive(Debug)]
pub struct DeviceInterfaceBinder<'a, D, S> {
    discovery: &'a D,
    shell: &'a S,
}

impl<'a, D: DeviceDiscovery, S: Shell> DeviceInterfaceBinder<'a, D, S> {
    pub fn new(discovery: &'a D, shell: &'a S) -> Self {
        Self { discovery, shell }
    }

    /// Find the device labelled `label` and bind the serial driver to it.
    ///
    /// # Errors
    ///
    /// - `Error::DeviceNotConnected` if nothing matches `label`
    /// - `Error::ExternalTool` if discovery fails or the bind command
    ///   cannot run or exits nonzero
    pub async fn bind(&self, label: &str, interface: &Path) -> Result<DeviceInterfaceBinding> {
        let ids = match self
            .discovery
            .discover(label)
            .await
            .map_err(|e| Error::external_tool(USB_ENUMERATION_COMMAND, e.to_string()))?
        {
            Discovery::Found(ids) => ids,
            Discovery::NotFound => {
                warn!(label, "Device not found on the USB bus");
                return Err(Error::DeviceNotConnected {
                    label: label.to_string(),
                });
            }
        };

        info!(%ids, label, "Found device");

        let command = bind_command(&ids);
        let output = self.shell.run(&command).await?;
        if !output.success() {
            return Err(Error::external_tool(command.to_string(), output.failure_reason()));
        }

        Ok(DeviceInterfaceBinding {
            ids,
            bound_path: interface.to_path_buf(),
        })
    }
}

/// `sudo modprobe usbserial vendor=0x<vid> product=0x<pid>`
pub fn bind_command(ids: &UsbIds) -> ShellCommand {
    ShellCommand::new("sudo").args([
        "modprobe".to_string(),
        SERIAL_DRIVER.to_string(),
        format!("vendor=0x{}", ids.vendor),
        format!("product=0x{}", ids.product),
    ])
}
