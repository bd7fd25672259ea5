use crate::commands::{Command, CommandKind};

/// Errors produced by the protocol codec and the register catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A daisy chain needs at least one device.
    #[error("Invalid chain length {0}, at least one device is required")]
    InvalidChainLength(usize),
    /// The response buffer is shorter than the frame layout requires.
    #[error("Invalid buffer size - required={expected} received={actual}")]
    BufferLength { expected: usize, actual: usize },
    /// Only whole 6 byte register groups can be transferred.
    #[error("Invalid register group width - required={expected} requested={actual}")]
    GroupWidth { expected: usize, actual: usize },
    /// The number of register groups does not match the chain length.
    #[error("Invalid number of register groups - required={expected} received={actual}")]
    GroupCount { expected: usize, actual: usize },
    /// Command codes are 11 bits wide.
    #[error("Command code {0:#06X} does not fit into 11 bits")]
    InvalidCommandCode(u16),
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
    #[error("Command {command} is not a {expected} command")]
    CommandKind {
        command: Command,
        expected: CommandKind,
    },
    #[error("Command {0} does not read register groups")]
    NotARead(Command),
    /// The echoed command word failed its PEC15 check.
    #[error("Invalid command PEC - calculated={calculated:#06X} received={received:#06X}")]
    CommandPecMismatch { calculated: u16, received: u16 },
    /// The register group of a device failed its PEC10 check.
    #[error("Invalid data PEC on device #{device}")]
    PecMismatch { device: usize },
}

impl Error {
    /// Checksum failures may be transient bus noise, everything else is a
    /// caller bug and repeating the transaction will not help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::CommandPecMismatch { .. } | Error::PecMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_checksum_errors_are_retryable() {
        assert!(Error::PecMismatch { device: 0 }.is_retryable());
        assert!(Error::CommandPecMismatch {
            calculated: 0x3D6E,
            received: 0
        }
        .is_retryable());
        assert!(!Error::InvalidChainLength(0).is_retryable());
        assert!(!Error::BufferLength {
            expected: 12,
            actual: 4
        }
        .is_retryable());
        assert!(!Error::GroupWidth {
            expected: 6,
            actual: 34
        }
        .is_retryable());
    }

    #[test]
    fn display_names_the_offending_values() {
        let err = Error::BufferLength {
            expected: 12,
            actual: 8,
        };
        assert_eq!(
            err.to_string(),
            "Invalid buffer size - required=12 received=8"
        );
        assert_eq!(
            Error::InvalidCommandCode(0x0800).to_string(),
            "Command code 0x0800 does not fit into 11 bits"
        );
    }
}
