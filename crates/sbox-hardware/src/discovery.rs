//! USB device discovery helpers.
//!
//! The installer finds the unit by running the USB enumeration tool and
//! keeping the lines that mention the vendor label. Enumeration lines look
//! like:
//!
//! ```text
//! Bus 001 Device 004: ID 0403:6001 Delta Electronics
//! ```
//!
//! [`parse_usb_ids`] extracts the `vendor:product` pair from such output.
//! With the `usb-discovery` feature, [`LibusbDiscovery`] asks libusb
//! directly instead of parsing tool output.

use crate::error::{HardwareError, Result};
use crate::types::UsbIds;
use sbox_core::constants::{USB_ID_COLUMN, USB_ID_SEPARATOR};

/// Extract the vendor/product pair from filtered enumeration output.
///
/// Only the first line is considered. The line is split on single spaces and
/// the pair is read from column [`USB_ID_COLUMN`].
///
/// # Errors
/// Returns `HardwareError::InvalidData` if the column is missing or is not a
/// `vendor:product` pair.
///
/// # Examples
///
/// ```
/// use sbox_hardware::discovery::parse_usb_ids;
///
/// let ids = parse_usb_ids("Bus 001 Device 004: ID 0403:6001 Delta Electronics\n").unwrap();
/// assert_eq!(ids.vendor, "0403");
/// assert_eq!(ids.product, "6001");
/// ```
pub fn parse_usb_ids(output: &str) -> Result<UsbIds> {
    let line = output.lines().next().unwrap_or_default();

    let column = line.split(' ').nth(USB_ID_COLUMN).ok_or_else(|| {
        HardwareError::invalid_data(format!("no ID column in enumeration line `{line}`"))
    })?;

    let (vendor, product) = column
        .split_once(USB_ID_SEPARATOR)
        .filter(|(vendor, product)| !vendor.is_empty() && !product.is_empty())
        .ok_or_else(|| HardwareError::invalid_data(format!("`{column}` is not a vendor:product pair")))?;

    Ok(UsbIds::new(vendor, product))
}

#[cfg(feature = "usb-discovery")]
pub use libusb::LibusbDiscovery;

#[cfg(feature = "usb-discovery")]
mod libusb {
    use super::*;
    use crate::traits::DeviceDiscovery;
    use crate::types::Discovery;
    use tracing::{debug, trace};

    /// Discovery through libusb.
    ///
    /// Matches the label against the manufacturer and product strings of
    /// every device the process is allowed to open.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LibusbDiscovery;

    impl DeviceDiscovery for LibusbDiscovery {
        async fn discover(&self, label: &str) -> Result<Discovery> {
            let devices = rusb::devices().map_err(|e| HardwareError::usb(e.to_string()))?;

            for device in devices.iter() {
                let Ok(descriptor) = device.device_descriptor() else {
                    continue;
                };
                let handle = match device.open() {
                    Ok(handle) => handle,
                    Err(e) => {
                        trace!(bus = device.bus_number(), address = device.address(), error = %e, "Skipping device");
                        continue;
                    }
                };

                let manufacturer = handle
                    .read_manufacturer_string_ascii(&descriptor)
                    .unwrap_or_default();
                let product = handle
                    .read_product_string_ascii(&descriptor)
                    .unwrap_or_default();

                if manufacturer.contains(label) || product.contains(label) {
                    let ids = UsbIds::new(
                        format!("{:04x}", descriptor.vendor_id()),
                        format!("{:04x}", descriptor.product_id()),
                    );
                    debug!(%ids, manufacturer = %manufacturer, "Found device");
                    return Ok(Discovery::Found(ids));
                }
            }

            Ok(Discovery::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Bus 001 Device 004: ID 0403:6001 Delta Electronics", "0403", "6001")]
    #[case("Bus 002 Device 003: ID 1a86:7523 Delta Controls Inc.\nBus 003 Device 001: ID 1d6b:0002 Delta\n", "1a86", "7523")]
    fn test_parse_usb_ids(#[case] output: &str, #[case] vendor: &str, #[case] product: &str) {
        let ids = parse_usb_ids(output).unwrap();
        assert_eq!(ids, UsbIds::new(vendor, product));
        assert_eq!(ids.to_string(), format!("{vendor}:{product}"));
    }

    #[rstest]
    #[case("")]
    #[case("Bus 001 Device 004: ID")]
    #[case("Bus 001 Device 004: ID 04036001 Delta")]
    #[case("Bus 001 Device 004: ID :6001 Delta")]
    #[case("Bus  001 Device 004: ID 0403:6001 Delta")] // double space shifts columns
    fn test_parse_usb_ids_malformed(#[case] output: &str) {
        assert!(matches!(
            parse_usb_ids(output),
            Err(HardwareError::InvalidData { .. })
        ));
    }
}
