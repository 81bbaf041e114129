//! Common types shared across hardware implementations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// USB vendor/product pair, as lower-case hex digits without a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsbIds {
    pub vendor: String,
    pub product: String,
}

impl UsbIds {
    pub fn new(vendor: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            product: product.into(),
        }
    }
}

impl fmt::Display for UsbIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vendor, self.product)
    }
}

/// Outcome of a device discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    Found(UsbIds),
    NotFound,
}
