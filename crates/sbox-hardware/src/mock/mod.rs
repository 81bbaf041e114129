//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without requiring physical hardware.

pub mod discovery;
pub mod master;

// Re-export commonly used types
pub use discovery::MockDiscovery;
pub use master::{MockRegisterMaster, MockRegisterMasterHandle, RegisterCall};
