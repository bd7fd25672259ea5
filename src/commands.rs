//! Command codes of the ADBMS6948.
//!
//! Every command is an 11 bit code sent as a big-endian 16 bit word whose
//! upper five bits are always zero.

use crate::Error;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Mask of the bits a command code may use.
pub const COMMAND_CODE_MASK: u16 = 0x07FF;

/// An 11 bit command code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CommandCode(u16);

impl CommandCode {
    pub fn new(code: u16) -> Result<Self, Error> {
        if code & !COMMAND_CODE_MASK != 0 {
            return Err(Error::InvalidCommandCode(code));
        }
        Ok(Self(code))
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    /// The command word as it goes over the wire.
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl TryFrom<u16> for CommandCode {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::new(code)
    }
}

impl From<Command> for CommandCode {
    fn from(command: Command) -> Self {
        command.code()
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#06X}", self.0)
    }
}

/// Tells the caller which frame shape a command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum CommandKind {
    /// Command word only, e.g. starting a conversion.
    Action,
    /// Command word followed by one register group per device.
    WriteConfiguration,
    /// Command word followed by placeholders for the configuration read back.
    ReadConfiguration,
    /// Command word followed by placeholders for measurement results.
    ReadMeasurement,
}

impl CommandKind {
    pub fn is_read(self) -> bool {
        matches!(
            self,
            CommandKind::ReadConfiguration | CommandKind::ReadMeasurement
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CommandKind::Action => write!(f, "action"),
            CommandKind::WriteConfiguration => write!(f, "write configuration"),
            CommandKind::ReadConfiguration => write!(f, "read configuration"),
            CommandKind::ReadMeasurement => write!(f, "read measurement"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Command {
    /// Start cell voltage ADC conversion
    Adcv,
    Wrcfga,
    Wrcfgb,
    Wrcfgc,
    Wrcfgd,
    Wrcfge,
    Wrcfgf,
    Wrcfgg,
    Wrcfgh,
    Wrcfgi,
    Rdcfga,
    Rdcfgb,
    Rdcfgc,
    Rdcfgd,
    Rdcfge,
    Rdcfgf,
    Rdcfgg,
    Rdcfgh,
    Rdcfgi,
    Rdcva,
    Rdcvb,
    Rdcvc,
    Rdcvd,
    Rdcve,
    Rdcvf,
}

impl Command {
    pub const ALL: [Command; 25] = [
        Command::Adcv,
        Command::Wrcfga,
        Command::Wrcfgb,
        Command::Wrcfgc,
        Command::Wrcfgd,
        Command::Wrcfge,
        Command::Wrcfgf,
        Command::Wrcfgg,
        Command::Wrcfgh,
        Command::Wrcfgi,
        Command::Rdcfga,
        Command::Rdcfgb,
        Command::Rdcfgc,
        Command::Rdcfgd,
        Command::Rdcfge,
        Command::Rdcfgf,
        Command::Rdcfgg,
        Command::Rdcfgh,
        Command::Rdcfgi,
        Command::Rdcva,
        Command::Rdcvb,
        Command::Rdcvc,
        Command::Rdcvd,
        Command::Rdcve,
        Command::Rdcvf,
    ];

    /// Cell voltage register groups A to F in read order.
    pub const CELL_VOLTAGE_GROUPS: [Command; 6] = [
        Command::Rdcva,
        Command::Rdcvb,
        Command::Rdcvc,
        Command::Rdcvd,
        Command::Rdcve,
        Command::Rdcvf,
    ];

    const fn raw_code(self) -> u16 {
        match self {
            Command::Adcv => 0x0260,
            Command::Wrcfga => 0x0001,
            Command::Wrcfgb => 0x0024,
            Command::Wrcfgc => 0x0081,
            Command::Wrcfgd => 0x00A4,
            Command::Wrcfge => 0x0073,
            Command::Wrcfgf => 0x0075,
            Command::Wrcfgg => 0x0077,
            Command::Wrcfgh => 0x0079,
            Command::Wrcfgi => 0x007B,
            Command::Rdcfga => 0x0002,
            Command::Rdcfgb => 0x0026,
            Command::Rdcfgc => 0x0082,
            Command::Rdcfgd => 0x00A6,
            Command::Rdcfge => 0x0074,
            Command::Rdcfgf => 0x0076,
            Command::Rdcfgg => 0x0078,
            Command::Rdcfgh => 0x007A,
            Command::Rdcfgi => 0x007C,
            Command::Rdcva => 0x0004,
            Command::Rdcvb => 0x0006,
            Command::Rdcvc => 0x0008,
            Command::Rdcvd => 0x000A,
            Command::Rdcve => 0x0009,
            Command::Rdcvf => 0x000B,
        }
    }

    pub const fn code(self) -> CommandCode {
        CommandCode(self.raw_code())
    }

    pub const fn kind(self) -> CommandKind {
        match self {
            Command::Adcv => CommandKind::Action,
            Command::Wrcfga
            | Command::Wrcfgb
            | Command::Wrcfgc
            | Command::Wrcfgd
            | Command::Wrcfge
            | Command::Wrcfgf
            | Command::Wrcfgg
            | Command::Wrcfgh
            | Command::Wrcfgi => CommandKind::WriteConfiguration,
            Command::Rdcfga
            | Command::Rdcfgb
            | Command::Rdcfgc
            | Command::Rdcfgd
            | Command::Rdcfge
            | Command::Rdcfgf
            | Command::Rdcfgg
            | Command::Rdcfgh
            | Command::Rdcfgi => CommandKind::ReadConfiguration,
            Command::Rdcva
            | Command::Rdcvb
            | Command::Rdcvc
            | Command::Rdcvd
            | Command::Rdcve
            | Command::Rdcvf => CommandKind::ReadMeasurement,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Command::Adcv => "ADCV",
            Command::Wrcfga => "WRCFGA",
            Command::Wrcfgb => "WRCFGB",
            Command::Wrcfgc => "WRCFGC",
            Command::Wrcfgd => "WRCFGD",
            Command::Wrcfge => "WRCFGE",
            Command::Wrcfgf => "WRCFGF",
            Command::Wrcfgg => "WRCFGG",
            Command::Wrcfgh => "WRCFGH",
            Command::Wrcfgi => "WRCFGI",
            Command::Rdcfga => "RDCFGA",
            Command::Rdcfgb => "RDCFGB",
            Command::Rdcfgc => "RDCFGC",
            Command::Rdcfgd => "RDCFGD",
            Command::Rdcfge => "RDCFGE",
            Command::Rdcfgf => "RDCFGF",
            Command::Rdcfgg => "RDCFGG",
            Command::Rdcfgh => "RDCFGH",
            Command::Rdcfgi => "RDCFGI",
            Command::Rdcva => "RDCVA",
            Command::Rdcvb => "RDCVB",
            Command::Rdcvc => "RDCVC",
            Command::Rdcvd => "RDCVD",
            Command::Rdcve => "RDCVE",
            Command::Rdcvf => "RDCVF",
        }
    }

    /// Fails with [`Error::CommandKind`] unless the command has the given kind.
    pub fn expect_kind(self, expected: CommandKind) -> Result<(), Error> {
        if self.kind() != expected {
            return Err(Error::CommandKind {
                command: self,
                expected,
            });
        }
        Ok(())
    }
}

// No catalog entry may use the upper five bits of the command word.
const _: () = {
    let mut i = 0;
    while i < Command::ALL.len() {
        assert!(Command::ALL[i].raw_code() & !COMMAND_CODE_MASK == 0);
        i += 1;
    }
};

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownCommand(s.to_string()))
    }
}
