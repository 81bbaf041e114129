pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{Config, Deployer, Door, Extra, SiteAddress, SmartboxIdentity, load_doors, parse_doors};
pub use error::{Error, ErrorKind, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
