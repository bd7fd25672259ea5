mod commandline;
mod config;

use adbms_lib::commands::{Command, CommandCode, CommandKind};
use adbms_lib::pec::{pec10, pec15};
use adbms_lib::protocol::{self, CellVoltages, ChainLength, ParseOptions, RegisterGroup};
use anyhow::{bail, Context, Result};
use clap::Parser;
use commandline::{CliArgs, CliCommands};
use config::ChainConfig;
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use serde::Serialize;
use std::{ops::Deref, panic};

fn logging_init(loglevel: LevelFilter) -> Result<LoggerHandle> {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .with_context(|| "Cannot init logging")?
        .start()
        .with_context(|| "Cannot start logging")?;

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown>", 0, 0));
        let cause = panic_info
            .payload()
            .downcast_ref::<String>()
            .map(String::deref);
        let cause = cause.unwrap_or_else(|| {
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .unwrap_or("<cause unknown>")
        });

        error!(
            "Thread '{}' panicked at {}:{}:{}: {}",
            std::thread::current().name().unwrap_or("<unknown>"),
            filename,
            line,
            column,
            cause
        );
    }));
    Ok(log_handle)
}

macro_rules! print_output {
    ($json:expr, $value:expr, $text:expr) => {
        if $json {
            println!(
                "{}",
                serde_json::to_string_pretty(&$value).with_context(|| "Cannot serialize output")?
            )
        } else {
            println!("{}", $text)
        }
    };
}

fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_bytes(text: &str) -> Result<Vec<u8>> {
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&digits).with_context(|| format!("Cannot parse hex bytes '{text}'"))
}

fn parse_register_group(text: &str) -> Result<RegisterGroup> {
    let bytes = parse_bytes(text)?;
    RegisterGroup::try_from(bytes.as_slice()).with_context(|| {
        format!(
            "A register group has {} bytes, '{text}' has {}",
            protocol::REGISTER_GROUP_LEN,
            bytes.len()
        )
    })
}

#[derive(Debug, Serialize)]
struct CatalogEntry {
    name: &'static str,
    code: CommandCode,
    kind: CommandKind,
    pec15: u16,
}

#[derive(Debug, Serialize)]
struct Checksum {
    data: String,
    pec: u16,
}

#[derive(Debug, Serialize)]
struct Frame {
    command: CommandCode,
    devices: usize,
    frame: String,
}

#[derive(Debug, Serialize)]
struct ParsedDevice {
    device: usize,
    data: String,
    command_counter: u8,
    pec_ok: bool,
    volts: Option<[f32; 3]>,
}

fn build_frame(command: Command, chain: ChainLength, payloads: &[String]) -> Result<Vec<u8>> {
    if command.kind() != CommandKind::WriteConfiguration && !payloads.is_empty() {
        bail!("{command} does not take a payload");
    }
    let frame = match command.kind() {
        CommandKind::Action => protocol::build_command_frame(command.code()).to_vec(),
        CommandKind::WriteConfiguration => {
            let groups = payloads
                .iter()
                .map(|payload| parse_register_group(payload))
                .collect::<Result<Vec<_>>>()?;
            if groups.len() != chain.get() {
                bail!(
                    "{command} needs one payload per device, got {} for a chain of {chain}",
                    groups.len()
                );
            }
            protocol::build_write_frame(command.code(), &groups)?
        }
        CommandKind::ReadConfiguration | CommandKind::ReadMeasurement => {
            protocol::build_read_frame(command.code(), chain, protocol::REGISTER_GROUP_LEN)?
        }
    };
    Ok(frame)
}

fn parse_frame(
    command: Command,
    chain: ChainLength,
    response: &str,
    options: ParseOptions,
) -> Result<Vec<ParsedDevice>> {
    if !command.kind().is_read() {
        return Err(adbms_lib::Error::NotARead(command).into());
    }
    let rx_buffer = parse_bytes(response)?;
    let groups =
        protocol::parse_response(&rx_buffer, chain, protocol::REGISTER_GROUP_LEN, options)
            .with_context(|| format!("Cannot parse {command} response"))?;
    let with_volts = Command::CELL_VOLTAGE_GROUPS.contains(&command);
    Ok(groups
        .iter()
        .enumerate()
        .map(|(device, group)| ParsedDevice {
            device,
            data: format_bytes(&group.data),
            command_counter: group.command_counter,
            pec_ok: group.pec_ok,
            volts: with_volts.then(|| CellVoltages::decode(&group.data)),
        })
        .collect())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let _log_handle = logging_init(args.verbose.log_level_filter())?;

    let config = ChainConfig::resolve(args.config.as_deref())?.with_devices(args.devices);
    let chain = config.chain()?;
    debug!("Using chain of {chain} device(s): {config:?}");

    match args.command {
        CliCommands::Commands => {
            let catalog: Vec<CatalogEntry> = Command::ALL
                .iter()
                .map(|command| CatalogEntry {
                    name: command.name(),
                    code: command.code(),
                    kind: command.kind(),
                    pec15: pec15(&command.code().to_be_bytes()),
                })
                .collect();
            print_output!(
                args.json,
                catalog,
                catalog
                    .iter()
                    .map(|e| format!("{:<7} {} PEC={:#06X} {}", e.name, e.code, e.pec15, e.kind))
                    .collect::<Vec<_>>()
                    .join("\n")
            );
        }
        CliCommands::Pec15 { data } => {
            let bytes = parse_bytes(&data)?;
            let checksum = Checksum {
                data: format_bytes(&bytes),
                pec: pec15(&bytes),
            };
            print_output!(args.json, checksum, format!("PEC15: {:#06X}", checksum.pec));
        }
        CliCommands::Pec10 { data, status } => {
            let bytes = parse_bytes(&data)?;
            let checksum = Checksum {
                data: format_bytes(&bytes),
                pec: pec10(&bytes, status),
            };
            print_output!(args.json, checksum, format!("PEC10: {:#05X}", checksum.pec));
        }
        CliCommands::Frame { command, payload } => {
            let frame = Frame {
                command: command.code(),
                devices: chain.get(),
                frame: format_bytes(&build_frame(command, chain, &payload)?),
            };
            print_output!(args.json, frame, format!("{command}: {}", frame.frame));
        }
        CliCommands::Raw { code } => {
            let code = CommandCode::new(code)?;
            let frame = Frame {
                command: code,
                devices: chain.get(),
                frame: format_bytes(&protocol::build_command_frame(code)),
            };
            print_output!(args.json, frame, format!("{code}: {}", frame.frame));
        }
        CliCommands::Parse {
            command,
            response,
            check_echo,
        } => {
            let options = ParseOptions {
                check_command_echo: check_echo || config.check_command_echo(),
            };
            let devices = parse_frame(command, chain, &response, options)?;
            print_output!(
                args.json,
                devices,
                devices
                    .iter()
                    .map(|d| {
                        let volts = d.volts.map(|v| format!(" volts={v:?}")).unwrap_or_default();
                        format!(
                            "Device #{}: {} counter={} pec_ok={}{volts}",
                            d.device, d.data, d.command_counter, d.pec_ok
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            );
            let failed: Vec<usize> = devices
                .iter()
                .filter(|d| !d.pec_ok)
                .map(|d| d.device)
                .collect();
            if !failed.is_empty() {
                bail!("Invalid data PEC on device(s) {failed:?}");
            }
        }
    }

    Ok(())
}
