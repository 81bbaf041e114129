//! Hardware trait definitions.
//!
//! These traits are the seams between the commissioning logic and the
//! outside world: the register master that drives the unit and the provider
//! that finds the unit on the USB bus. Production code uses
//! [`ModbusMaster`](crate::ModbusMaster) and the enumeration pipeline; tests
//! substitute the [`mock`](crate::mock) implementations.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::Discovery;

/// Register-level master for the unit.
///
/// The wire protocol (framing, checksums) belongs to the implementation; the
/// caller only sees addresses, quantities and literal coil codes.
///
/// # Object Safety
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters:
///
/// ```no_run
/// use sbox_hardware::traits::RegisterMaster;
/// use sbox_hardware::error::Result;
///
/// async fn door_open<M: RegisterMaster>(master: &mut M, address: u16) -> Result<bool> {
///     let bits = master.read_discrete_inputs(address, 9).await?;
///     Ok(bits.first().copied().unwrap_or(false))
/// }
/// ```
pub trait RegisterMaster: Send {
    /// Read `quantity` coils starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be opened or the unit answers
    /// with an exception or a malformed frame.
    async fn read_coils(&mut self, address: u16, quantity: u16) -> Result<Vec<bool>>;

    /// Read `quantity` discrete inputs starting at `address`.
    ///
    /// # Errors
    ///
    /// Same as [`read_coils`](RegisterMaster::read_coils).
    async fn read_discrete_inputs(&mut self, address: u16, quantity: u16) -> Result<Vec<bool>>;

    /// Write the literal `value` to the coil at `address`.
    ///
    /// Only `0xFF00` and `0x0000` are meaningful coil codes.
    ///
    /// # Errors
    ///
    /// Returns an error for any other value, or on link/protocol failure.
    async fn write_single_coil(&mut self, address: u16, value: u16) -> Result<()>;
}

/// Finds the unit on the USB bus.
///
/// # Examples
///
/// ```no_run
/// use sbox_hardware::traits::DeviceDiscovery;
/// use sbox_hardware::Discovery;
///
/// async fn is_plugged<D: DeviceDiscovery>(discovery: &D) -> bool {
///     matches!(discovery.discover("Delta").await, Ok(Discovery::Found(_)))
/// }
/// ```
pub trait DeviceDiscovery {
    /// Look for a device whose description contains `label`.
    ///
    /// Returns [`Discovery::NotFound`] when nothing matches; errors are
    /// reserved for failures of the discovery mechanism itself.
    async fn discover(&self, label: &str) -> Result<Discovery>;
}
