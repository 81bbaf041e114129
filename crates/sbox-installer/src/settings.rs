//! Installer settings.
//!
//! Everything the installer needs to know about the host it runs on, built
//! once and handed to [`Installer`](crate::Installer). Defaults come from
//! [`sbox_core::constants`]; tests point the paths at temporary files.

use std::path::{Path, PathBuf};

use sbox_core::constants::{BIN_DIR, BINARY_FILE, CONFIG_FILE, DEVICE_INTERFACE, DEVICE_LABEL};

/// Host-side settings for one install run.
///
/// # Examples
///
/// ```
/// use sbox_installer::InstallerSettings;
///
/// let settings = InstallerSettings::default()
///     .with_config_file("/tmp/site/config.json")
///     .with_unit_user("operator");
///
/// assert_eq!(settings.device_label, "Delta");
/// assert_eq!(settings.unit_user.as_deref(), Some("operator"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerSettings {
    pub config_file: PathBuf,
    /// Executable copied into `bin_dir`.
    pub binary_file: PathBuf,
    pub bin_dir: PathBuf,
    /// Text the USB enumeration line must contain.
    pub device_label: String,
    /// Serial device node created by the driver bind.
    pub device_interface: PathBuf,
    /// Owner given to the device node.
    pub unit_user: Option<String>,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(CONFIG_FILE),
            binary_file: PathBuf::from(BINARY_FILE),
            bin_dir: PathBuf::from(BIN_DIR),
            device_label: DEVICE_LABEL.to_string(),
            device_interface: PathBuf::from(DEVICE_INTERFACE),
            unit_user: None,
        }
    }
}

impl InstallerSettings {
    /// Defaults, with the unit user taken from `$USER`.
    pub fn from_env() -> Self {
        Self {
            unit_user: std::env::var("USER").ok().filter(|user| !user.is_empty()),
            ..Self::default()
        }
    }

    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = path.as_ref().to_path_buf();
        self
    }

    pub fn with_binary_file(mut self, path: impl AsRef<Path>) -> Self {
        self.binary_file = path.as_ref().to_path_buf();
        self
    }

    pub fn with_bin_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.bin_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn with_device_label(mut self, label: impl Into<String>) -> Self {
        self.device_label = label.into();
        self
    }

    pub fn with_device_interface(mut self, path: impl AsRef<Path>) -> Self {
        self.device_interface = path.as_ref().to_path_buf();
        self
    }

    pub fn with_unit_user(mut self, user: impl Into<String>) -> Self {
        self.unit_user = Some(user.into());
        self
    }
}
