use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use serial_session::config::ConfigLoader;
use serial_session::logging::init_logging;
use serial_session::port::DeviceInfo;
use serial_session::service::{AddPortOptions, SerialSession};
use std::process::ExitCode;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Multi-port serial session manager.",
    long_about = "Lists system serial ports and performs one framed exchange on a port. \
                  Settings come from serial-session.toml and SERIAL_SESSION_* variables."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial ports on this host.
    List,
    /// List ports whose path, description or hardware id matches REGEX.
    Find {
        /// Case-insensitive regular expression.
        regex: String,
    },
    /// Add a port, optionally write to it, then read one framed response.
    Exchange {
        /// Device path or `loop://`.
        locator: String,
        /// Data to write first, in the selected encoding.
        #[arg(short, long)]
        write: Option<String>,
        /// Terminator ending the read, in the selected encoding.
        #[arg(short, long)]
        terminator: Option<String>,
        /// Stop after this many bytes.
        #[arg(short, long)]
        size: Option<usize>,
        /// Encoding for written and read data.
        #[arg(short, long)]
        encoding: Option<String>,
        /// Port parameter override, e.g. `--set baudrate=115200`.
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
        overrides: Vec<(String, String)>,
    },
}

fn parse_override(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

fn print_devices(devices: &[DeviceInfo]) {
    for device in devices {
        println!("{}  {}  {}", device.device, device.description, device.hwid);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load()?.into_config();
    init_logging(&config.logging)?;
    let mut session = SerialSession::from_config(&config.session)?;

    match args.command {
        Command::List => print_devices(&session.list_com_ports()?),
        Command::Find { regex } => print_devices(&session.com_port_should_exist_regexp(&regex)?),
        Command::Exchange {
            locator,
            write,
            terminator,
            size,
            encoding,
            overrides,
        } => {
            let overrides: Map<String, Value> = overrides
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            let options = AddPortOptions::new()
                .make_current()
                .with_overrides(overrides);
            session.add_port(&locator, options)?;

            if let Some(data) = write {
                session.write_data(&data, encoding.as_deref(), None)?;
            }
            let response =
                session.read_until(terminator.as_deref(), size, encoding.as_deref(), None)?;
            println!("{response}");
            session.delete_all_ports();
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
