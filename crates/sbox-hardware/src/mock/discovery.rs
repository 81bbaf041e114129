//! Mock device discovery.

use crate::{Discovery, Result, traits::DeviceDiscovery};
use std::sync::{Arc, Mutex};

/// Discovery provider with a fixed answer that records the labels it was
/// asked for.
///
/// # Examples
///
/// ```
/// use sbox_hardware::mock::MockDiscovery;
/// use sbox_hardware::traits::DeviceDiscovery;
/// use sbox_hardware::{Discovery, UsbIds};
///
/// #[tokio::main]
/// async fn main() -> sbox_hardware::Result<()> {
///     let discovery = MockDiscovery::found(UsbIds::new("0403", "6001"));
///     let found = discovery.discover("Delta").await?;
///     assert_eq!(found, Discovery::Found(UsbIds::new("0403", "6001")));
///     assert_eq!(discovery.requests(), vec!["Delta".to_string()]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockDiscovery {
    answer: Discovery,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockDiscovery {
    pub fn found(ids: crate::UsbIds) -> Self {
        Self::with_answer(Discovery::Found(ids))
    }

    pub fn not_found() -> Self {
        Self::with_answer(Discovery::NotFound)
    }

    fn with_answer(answer: Discovery) -> Self {
        Self {
            answer,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Labels requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl DeviceDiscovery for MockDiscovery {
    async fn discover(&self, label: &str) -> Result<Discovery> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(label.to_string());
        }
        Ok(self.answer.clone())
    }
}
