//! Core constants for the SmartBox commissioning toolkit.
//!
//! This module defines the register-level protocol parameters, the installer's
//! filesystem layout and the device identification values shared by every
//! crate in the workspace.
//!
//! # Register Operations
//!
//! Every register call against the unit uses the same fixed parameters:
//!
//! | Operation | Quantity | Value |
//! |-----------|----------|-------|
//! | `read-coil` | [`REGISTER_QUANTITY`] | - |
//! | `read-input` | [`REGISTER_QUANTITY`] | - |
//! | `write-coil-on` | 1 | [`COIL_ON`] |
//! | `write-coil-off` | 1 | [`COIL_OFF`] |
//!
//! # Usage
//!
//! ```
//! use sbox_core::constants::*;
//!
//! assert_eq!(REGISTER_QUANTITY, 9);
//! assert_eq!(COIL_ON, 0xFF00);
//! assert_eq!(COIL_OFF, 0x0000);
//! ```

// ============================================================================
// Register Protocol
// ============================================================================

/// Number of registers read per call.
///
/// A smartbox groups the contacts of one door into a block of nine
/// consecutive registers, so every read covers exactly one block.
pub const REGISTER_QUANTITY: u16 = 9;

/// Literal value written to switch a coil on.
pub const COIL_ON: u16 = 0xFF00;

/// Literal value written to switch a coil off.
pub const COIL_OFF: u16 = 0x0000;

/// Prefix synthesized in front of operator-supplied hex addresses.
///
/// Operators type addresses without a prefix (`1F4`); the prefix is added
/// internally before parsing.
pub const HEX_PREFIX: &str = "0x";

/// Maximum number of hex digits accepted for a unit address.
pub const MAX_ADDRESS_DIGITS: usize = 4;

/// Character that marks a host identifier as a serial device path.
pub const SERIAL_PATH_SEPARATOR: char = '/';

// ============================================================================
// Serial Line Defaults
// ============================================================================

/// Baud rate used when the unit is attached through a serial device.
pub const SERIAL_BAUD_RATE: u32 = 19200;

/// Slave address of the unit on a serial line.
pub const SERIAL_SLAVE_ID: u8 = 1;

// ============================================================================
// Installer Layout
// ============================================================================

/// Name of the executable copied into the system binary directory.
pub const BINARY_FILE: &str = "sbox";

/// Site configuration file, relative to the installer's working directory.
pub const CONFIG_FILE: &str = "./config.json";

/// System binary directory the executable is installed into.
pub const BIN_DIR: &str = "/usr/bin/";

/// Character device created by the kernel once the serial driver is bound.
pub const DEVICE_INTERFACE: &str = "/dev/ttyUSB0";

/// Vendor label searched for in the USB enumeration output.
pub const DEVICE_LABEL: &str = "Delta";

/// Kernel module bound to the unit's USB vendor/product pair.
pub const SERIAL_DRIVER: &str = "usbserial";

/// Literal answer that confirms the installation.
pub const CONFIRM_ANSWER: &str = "Y";

// ============================================================================
// USB Enumeration
// ============================================================================

/// Command that lists attached USB devices.
pub const USB_ENUMERATION_COMMAND: &str = "lsusb";

/// Command that filters the enumeration output.
pub const TEXT_FILTER_COMMAND: &str = "grep";

/// Zero-based column of the `vendor:product` pair in an enumeration line.
///
/// ```text
/// Bus 001 Device 004: ID 0403:6001 Delta Electronics
/// 0   1   2      3    4  5
/// ```
pub const USB_ID_COLUMN: usize = 5;

/// Separator between vendor and product IDs in the enumeration column.
pub const USB_ID_SEPARATOR: char = ':';

// ============================================================================
// Registration
// ============================================================================

/// Inventory endpoint a commissioned unit is registered with.
pub const REGISTRATION_URL: &str = "http://api.smartbox.io/v1/units/register";

/// Response type that marks a successful registration.
pub const REGISTRATION_SUCCESS: &str = "success";
