//! Hardware access layer for SmartBox units.
//!
//! This crate drives the unit's coil and discrete-input registers and finds
//! the unit on the USB bus. The register protocol itself is delegated to
//! `tokio-modbus`; everything above it is expressed through traits so that
//! the commissioning logic can run against mocks.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Lazy links**: Selecting a transport and building a master perform no
//!   I/O; the link opens on the first register call.
//! - **Single attempt**: Nothing is retried. Failures carry the raw error and
//!   the raw result so the operator sees exactly what the unit answered.
//!
//! # Dispatching an action
//!
//! ```no_run
//! use sbox_hardware::{ActionDispatcher, ModbusMaster, Transport};
//!
//! # async fn example() -> sbox_core::Result<()> {
//! let transport = Transport::select("/dev/ttyUSB0");
//! let mut dispatcher = ActionDispatcher::new(ModbusMaster::new(transport));
//!
//! let output = dispatcher.dispatch_command("read-coil", "1F4").await?;
//! println!("{output}");
//! # Ok(())
//! # }
//! ```
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides a recording register master and a fixed-answer
//! discovery provider for tests.

pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod modbus;
pub mod traits;
pub mod transport;
pub mod types;

// Re-export commonly used types for convenience
pub use dispatcher::ActionDispatcher;
pub use error::{HardwareError, Result};
pub use modbus::ModbusMaster;
pub use traits::{DeviceDiscovery, RegisterMaster};
pub use transport::Transport;
pub use types::{Discovery, UsbIds};
