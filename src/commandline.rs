use adbms_lib::commands::Command;
use clap::{Parser, Subcommand};
use clap_num::maybe_hex;
use clap_verbosity_flag::{InfoLevel, Verbosity};

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// List all known commands with code, kind and command PEC
    Commands,
    /// Calculate the PEC15 of arbitrary bytes (e.g. "00 01")
    Pec15 {
        /// Hex encoded bytes, spaces and colons between bytes are ignored
        data: String,
    },
    /// Calculate the PEC10 of a register group (e.g. "80 00 00 00 00 00")
    Pec10 {
        /// Hex encoded bytes, spaces and colons between bytes are ignored
        data: String,
        /// Status byte received after the data; its command counter bits are folded in (e.g. 0x28)
        #[arg(long, short, value_parser = maybe_hex::<u8>)]
        status: Option<u8>,
    },
    /// Build the transmit frame of a command for the configured chain
    Frame {
        /// Command name, e.g. ADCV, WRCFGA or RDCVA
        command: Command,
        /// Register group of one device for write commands, repeat once per device in chain order
        #[arg(long, short)]
        payload: Vec<String>,
    },
    /// Build the frame of a payload-less command given by its raw code (e.g. 0x0260)
    Raw {
        #[arg(value_parser = maybe_hex::<u16>)]
        code: u16,
    },
    /// Parse and validate a captured response of a read command
    Parse {
        /// Command name of the read, e.g. RDCFGA or RDCVA
        command: Command,
        /// The complete received frame including the leading command bytes
        response: String,
        /// Validate the PEC15 of the echoed command word as well
        #[clap(long, action)]
        check_echo: bool,
    },
}

const fn about_text() -> &'static str {
    "ADBMS6948 frame and PEC command line tool"
}

#[derive(Parser, Debug)]
#[command(version, about=about_text(), long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Chain configuration file (YAML), defaults to ./adbms.yaml if present
    #[arg(short, long)]
    pub config: Option<String>,

    /// Number of devices in the daisy chain, overrides the configuration file
    #[arg(short, long)]
    pub devices: Option<usize>,

    /// Print results as JSON
    #[arg(long, action)]
    pub json: bool,

    #[command(subcommand)]
    pub command: CliCommands,
}
