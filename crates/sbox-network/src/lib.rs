//! Network communication layer for SmartBox commissioning
//!
//! This crate provides the HTTP client that registers a commissioned unit
//! with the inventory service.
//!
//! # Components
//!
//! - **RegistrationClient**: posts the unit configuration and checks the answer
//! - **Registrar**: trait seam used by the installer (mocked in tests)
//!
//! # Example
//!
//! ```no_run
//! use sbox_network::{Registrar, RegistrationClient, RegistrationClientConfig};
//!
//! # async fn example(config: sbox_core::Config) -> Result<(), Box<dyn std::error::Error>> {
//! let client = RegistrationClient::new(RegistrationClientConfig {
//!     url: "http://127.0.0.1:8080/register".to_string(),
//! });
//! client.register(&config).await?;
//! # Ok(())
//! # }
//! ```

mod client;

pub use client::{
    Registrar, RegistrationClient, RegistrationClientConfig, RegistrationError,
    RegistrationResponse, registration_body,
};
