use thiserror::Error;

/// Failure categories reported to the operator.
///
/// Every category is terminal for the current invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad or missing command line arguments.
    Usage,
    /// Bad address, invalid config, failed calibration.
    Validation,
    /// An operation that needs elevated privilege failed.
    Privilege,
    /// A spawned process failed or produced no output.
    ExternalTool,
    /// Device communication failed.
    Protocol,
    /// Registration transport or response failed.
    Network,
    /// The operator declined the installation.
    Aborted,
}

#[derive(Error, Debug)]
pub enum Error {
    // Usage errors
    #[error("{0}")]
    Usage(String),

    // Validation errors
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("undefined action for {0}")]
    UnknownAction(String),

    #[error("invalid config file: {0}")]
    InvalidConfig(String),

    #[error("invalid doors file: {0}")]
    InvalidDoors(String),

    #[error("door {door} is not calibrated")]
    NotCalibrated { door: String },

    #[error("missing file: {0}")]
    MissingFile(String),

    #[error("invalid install stage transition from {from} to {to}")]
    InvalidStageTransition { from: String, to: String },

    // Privilege errors
    #[error("you must be a sudoer! ({0})")]
    Privilege(String),

    // External tool errors
    #[error("{command} failed: {message}")]
    ExternalTool { command: String, message: String },

    #[error("device not connected! no `{label}` device found")]
    DeviceNotConnected { label: String },

    // Device errors
    #[error("{error} {result}")]
    Protocol { error: String, result: String },

    // Network errors
    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    RegistrationRejected(String),

    // Operator
    #[error("installation cancelled")]
    Aborted,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an external tool error.
    pub fn external_tool(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a protocol error carrying the raw error and raw result text.
    pub fn protocol(error: impl Into<String>, result: impl Into<String>) -> Self {
        Self::Protocol {
            error: error.into(),
            result: result.into(),
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Usage(_) => ErrorKind::Usage,
            Self::InvalidAddress(_)
            | Self::UnknownAction(_)
            | Self::InvalidConfig(_)
            | Self::InvalidDoors(_)
            | Self::NotCalibrated { .. }
            | Self::MissingFile(_)
            | Self::InvalidStageTransition { .. } => ErrorKind::Validation,
            Self::Privilege(_) => ErrorKind::Privilege,
            Self::ExternalTool { .. } | Self::DeviceNotConnected { .. } | Self::Io(_) => {
                ErrorKind::ExternalTool
            }
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::Network(_) | Self::RegistrationRejected(_) => ErrorKind::Network,
            Self::Aborted => ErrorKind::Aborted,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
