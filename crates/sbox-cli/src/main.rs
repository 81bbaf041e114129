//! sbox - SmartBox register tool and installer
//!
//! Direct mode runs one register action against a unit reached over a
//! serial device or TCP. Install mode commissions a freshly wired unit.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::error::{ContextKind, ErrorKind as ClapErrorKind};
use clap::{Parser, Subcommand};
use sbox_core::{Error, Result, load_doors};
use sbox_hardware::{ActionDispatcher, ModbusMaster, Transport};
use sbox_installer::{
    AnyDeviceDiscovery, InstallDeps, InstallMode, Installer, InstallerSettings, SystemShell,
    TerminalPrompt, report_doors,
};
use sbox_network::{RegistrationClient, RegistrationClientConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "
    Usage:
        sbox [host] [action] [address]
        sbox install
        sbox install-interface
        sbox doors [host] [csv] [--pace-ms N]
    Action:
        read-coil           READ_COILS
        read-input          READ_DISCRETE_INPUTS
        write-coil-on       WRITE_SINGLE_COIL 0xFF00
        write-coil-off      WRITE_SINGLE_COIL 0x0000
    Sample:
        sbox /dev/ttyUSB0 read-coil 500
        sbox /dev/ttyUSB0 read-input 410
        sbox /dev/ttyUSB0 write-coil-on 500
        sbox 192.168.1.5:502 write-coil-off 19A
";

const DEFAULT_LOG_LEVEL: &str = "off";

#[derive(Parser, Debug)]
#[command(name = "sbox")]
#[command(about = "SmartBox register tool and installer")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true, disable_help_subcommand = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG is used when absent
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Discover the unit through libusb instead of lsusb
    #[cfg(feature = "usb-discovery")]
    #[arg(long, global = true)]
    libusb: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// Serial device path (/dev/...) or host:port
    host: Option<String>,

    /// read-coil, read-input, write-coil-on or write-coil-off
    action: Option<String>,

    /// Register address in hex, without prefix
    address: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Install sbox, bind the device interface and register the unit
    Install,

    /// Install sbox and bind the device interface only
    InstallInterface,

    /// Print the input and output blocks of every door in a door table
    Doors {
        /// Serial device path (/dev/...) or host:port
        host: String,

        /// Door table (CSV with a header row)
        csv: PathBuf,

        /// Pause between doors, in milliseconds
        #[arg(long)]
        pace_ms: Option<u64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args == ["help"] {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if let Some(usage) = usage_error(&e) {
                println!("ERROR: {usage}");
                return ExitCode::FAILURE;
            }
            print!("{}", e.render());
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = init_tracing(cli.log_level.as_deref()) {
        println!("ERROR: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Surplus positionals after direct mode's three arguments are parsed as a
/// conflicting subcommand; report them as a usage error instead.
fn usage_error(e: &clap::Error) -> Option<Error> {
    if e.kind() != ClapErrorKind::ArgumentConflict {
        return None;
    }

    let message = match e.get(ContextKind::InvalidSubcommand) {
        Some(argument) => format!("unexpected argument '{argument}'"),
        None => "unexpected argument".to_string(),
    };
    Some(Error::Usage(message))
}

fn log_filter(level: Option<&str>) -> anyhow::Result<EnvFilter> {
    match level {
        Some(level) => EnvFilter::try_new(level).with_context(|| format!("invalid log level `{level}`")),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))),
    }
}

fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
    let filter = log_filter(level)?;

    // Log lines share stdout with operator output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Install) => install(&cli, InstallMode::Full).await,
        Some(Command::InstallInterface) => install(&cli, InstallMode::InterfaceOnly).await,
        Some(Command::Doors {
            ref host,
            ref csv,
            pace_ms,
        }) => doors(host, csv, pace_ms.map(Duration::from_millis)).await,
        None => {
            let (host, action, address) = direct_arguments(&cli)?;
            direct(host, action, address).await
        }
    }
}

/// Validate the positional arguments of direct mode.
fn direct_arguments(cli: &Cli) -> Result<(&str, &str, &str)> {
    let (Some(host), Some(action)) = (cli.host.as_deref(), cli.action.as_deref()) else {
        return Err(Error::Usage("host & action not specified".to_string()));
    };
    let address = cli
        .address
        .as_deref()
        .filter(|address| !address.is_empty())
        .ok_or_else(|| Error::Usage("address expected".to_string()))?;

    Ok((host, action, address))
}

async fn direct(host: &str, action: &str, address: &str) -> Result<()> {
    let transport = Transport::select(host);
    debug!(%transport, action, address, "Direct mode");

    let mut dispatcher = ActionDispatcher::new(ModbusMaster::new(transport));
    let output = dispatcher.dispatch_command(action, address).await?;
    println!("{output}");
    Ok(())
}

async fn install(cli: &Cli, mode: InstallMode) -> Result<()> {
    let settings = InstallerSettings::from_env();
    let interface = settings.device_interface.to_string_lossy().into_owned();

    let mut installer = Installer::new(
        settings,
        mode,
        InstallDeps {
            shell: SystemShell,
            discovery: discovery(cli),
            prompt: TerminalPrompt::new(),
            registrar: RegistrationClient::new(RegistrationClientConfig::default()),
            master: ModbusMaster::new(Transport::select(&interface)),
        },
    );

    installer.run().await.map(|_| ())
}

#[cfg(feature = "usb-discovery")]
fn discovery(cli: &Cli) -> AnyDeviceDiscovery {
    if cli.libusb {
        AnyDeviceDiscovery::Libusb(sbox_hardware::discovery::LibusbDiscovery)
    } else {
        AnyDeviceDiscovery::default()
    }
}

#[cfg(not(feature = "usb-discovery"))]
fn discovery(_cli: &Cli) -> AnyDeviceDiscovery {
    AnyDeviceDiscovery::default()
}

async fn doors(host: &str, csv: &Path, pace: Option<Duration>) -> Result<()> {
    let doors = load_doors(csv)?;
    let mut dispatcher = ActionDispatcher::new(ModbusMaster::new(Transport::select(host)));

    let mut stdout = std::io::stdout();
    report_doors(&mut dispatcher, &doors, pace, &mut stdout).await?;
    Ok(())
}
