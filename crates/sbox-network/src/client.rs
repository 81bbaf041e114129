//! HTTP client for unit registration.
//!
//! Once a unit is commissioned, its complete configuration (doors, extras
//! and the deployer credential) is posted to the inventory service, which
//! answers with a `{type, message}` document.
//!
//! # Architecture
//!
//! ```text
//! Installer
//!     │
//!     └─> RegistrationClient ───(HTTP POST, JSON)───> Inventory service
//!                                                          │
//!                 {"type": "success", "message": ...} <────┘
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use sbox_core::Config;
//! use sbox_network::{Registrar, RegistrationClient, RegistrationClientConfig};
//!
//! # async fn example(config: Config) -> Result<(), Box<dyn std::error::Error>> {
//! let client = RegistrationClient::new(RegistrationClientConfig::default());
//! let response = client.register(&config).await?;
//! println!("{}", response.message);
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! - **No automatic retry**: a failed registration aborts the install
//! - **No timeouts**: the call blocks until the service answers
//! - **No TLS options or signing**: the endpoint is taken as-is
//!
//! The request body is the serialized configuration lower-cased in its
//! entirety, credential included, which is the form the service indexes.

#![allow(async_fn_in_trait)]

use reqwest::header::CONTENT_TYPE;
use sbox_core::Config;
use sbox_core::constants::{REGISTRATION_SUCCESS, REGISTRATION_URL};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Configuration for the registration client
///
/// # Example
///
/// ```
/// use sbox_network::RegistrationClientConfig;
///
/// let config = RegistrationClientConfig {
///     url: "http://127.0.0.1:8080/register".to_string(),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct RegistrationClientConfig {
    /// Inventory endpoint
    pub url: String,
}

impl Default for RegistrationClientConfig {
    fn default() -> Self {
        Self {
            url: REGISTRATION_URL.to_string(),
        }
    }
}

/// Errors that can occur while registering a unit
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Configuration could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Request could not be sent or the body could not be read
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Service answered with something other than a `{type, message}` document
    #[error("Invalid response (HTTP {status}): {body}")]
    InvalidResponse { status: u16, body: String },

    /// Service refused the registration
    #[error("{0}")]
    Rejected(String),
}

impl From<RegistrationError> for sbox_core::Error {
    fn from(error: RegistrationError) -> Self {
        match error {
            RegistrationError::Rejected(message) => sbox_core::Error::RegistrationRejected(message),
            other => sbox_core::Error::Network(other.to_string()),
        }
    }
}

/// Answer from the inventory service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub message: String,
}

impl RegistrationResponse {
    /// Only the exact literal `success` passes.
    pub fn is_success(&self) -> bool {
        self.kind == REGISTRATION_SUCCESS
    }
}

/// Build the request body: the serialized configuration, lower-cased.
///
/// # Example
///
/// ```
/// use sbox_core::Config;
/// use sbox_network::registration_body;
///
/// let mut config = Config::default();
/// config.deployer.username = "Alice".to_string();
///
/// let body = registration_body(&config).unwrap();
/// assert!(body.contains("\"username\":\"alice\""));
/// ```
pub fn registration_body(config: &Config) -> Result<String, RegistrationError> {
    Ok(serde_json::to_string(config)?.to_lowercase())
}

/// Something that can register a commissioned unit.
pub trait Registrar {
    /// Register `config`.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::Rejected` with the service message when the
    /// response type is not `success`, and a transport or decoding error
    /// otherwise.
    async fn register(&self, config: &Config) -> Result<RegistrationResponse, RegistrationError>;
}

/// HTTP registration client
pub struct RegistrationClient {
    url: String,
    http: reqwest::Client,
}

impl RegistrationClient {
    /// Create a new client with the given configuration
    ///
    /// # Example
    ///
    /// ```
    /// use sbox_network::{RegistrationClient, RegistrationClientConfig};
    ///
    /// let client = RegistrationClient::new(RegistrationClientConfig::default());
    /// assert!(client.url().starts_with("http"));
    /// ```
    pub fn new(config: RegistrationClientConfig) -> Self {
        debug!("Creating registration client for {}", config.url);

        Self {
            url: config.url,
            http: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Registrar for RegistrationClient {
    async fn register(&self, config: &Config) -> Result<RegistrationResponse, RegistrationError> {
        let body = registration_body(config)?;

        info!(
            url = %self.url,
            doors = config.doors.len(),
            extras = config.extras.len(),
            "Registering unit"
        );

        let response = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Registration request failed: {}", e);
                RegistrationError::Transport(e)
            })?;

        let status = response.status().as_u16();
        let text = response.text().await?;

        let answer: RegistrationResponse =
            serde_json::from_str(&text).map_err(|_| RegistrationError::InvalidResponse {
                status,
                body: text.clone(),
            })?;

        if answer.is_success() {
            info!(message = %answer.message, "Registration accepted");
            Ok(answer)
        } else {
            warn!(kind = %answer.kind, message = %answer.message, "Registration rejected");
            Err(RegistrationError::Rejected(answer.message))
        }
    }
}
