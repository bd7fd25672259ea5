//! Blocking client for a daisy chain of ADBMS6948 devices.
//!
//! # Example
//!
//! ```no_run
//! use adbms_lib::client::Adbms;
//! use adbms_lib::commands::Command;
//! use adbms_lib::protocol::ChainLength;
//! # use adbms_lib::transport::Transport;
//! # fn run<T: Transport>(spi: T) -> Result<(), adbms_lib::client::Error<T::Error>> {
//! let mut bms = Adbms::new(spi, ChainLength::new(2)?);
//! bms.write_register_group(Command::Wrcfga, &[[0x80, 0, 0, 0, 0, 0]; 2])?;
//! for (device, volts) in bms.read_cell_voltages()?.iter().enumerate() {
//!     println!("Device #{device}: {volts:?}");
//! }
//! # Ok(())
//! # }
//! ```

use crate::commands::{Command, CommandCode, CommandKind};
use crate::protocol::*;
use crate::transport::Transport;
use std::fmt;
use std::time::Duration;

/// Time the devices need to finish a cell voltage conversion.
pub const DEFAULT_CONVERSION_DELAY: Duration = Duration::from_millis(10);

/// Errors of the chain client.
#[derive(Debug, thiserror::Error)]
pub enum Error<E: fmt::Debug> {
    /// An error originating from the frame codec or the command catalog.
    #[error("ADBMS error: {0}")]
    Protocol(#[from] crate::Error),
    /// An error reported by the transport, passed through untouched.
    #[error("Transport error: {0:?}")]
    Transport(E),
}

type Result<T, E> = std::result::Result<T, Error<E>>;

#[derive(Debug)]
pub struct Adbms<T> {
    transport: T,
    chain: ChainLength,
    retries: u8,
    conversion_delay: Duration,
    options: ParseOptions,
}

impl<T: Transport> Adbms<T> {
    pub fn new(transport: T, chain: ChainLength) -> Self {
        Self {
            transport,
            chain,
            retries: 3,
            conversion_delay: DEFAULT_CONVERSION_DELAY,
            options: ParseOptions::default(),
        }
    }

    pub fn chain(&self) -> ChainLength {
        self.chain
    }

    /// sets the number of repeated reads after a checksum failure
    pub fn set_retry(&mut self, n_retries: u8) {
        self.retries = n_retries;
    }

    pub fn set_conversion_delay(&mut self, delay: Duration) {
        self.conversion_delay = delay;
    }

    /// Enables the PEC15 check of the command word echoed in read responses.
    pub fn set_check_command_echo(&mut self, enable: bool) {
        self.options.check_command_echo = enable;
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn exchange(&mut self, buffer: &mut [u8]) -> Result<(), T::Error> {
        log::trace!("write bytes: {buffer:02X?}");
        self.transport.exchange(buffer).map_err(Error::Transport)?;
        log::trace!("receive bytes: {buffer:02X?}");
        Ok(())
    }

    /// Sends a command word without payload, whatever its code.
    pub fn send_raw_command(&mut self, code: CommandCode) -> Result<(), T::Error> {
        let mut tx_buffer = build_command_frame(code);
        self.exchange(&mut tx_buffer)
    }

    pub fn send_command(&mut self, command: Command) -> Result<(), T::Error> {
        command.expect_kind(CommandKind::Action)?;
        self.send_raw_command(command.code())
    }

    /// Writes one register group per device, `groups[0]` going to the first
    /// slot of the frame.
    pub fn write_register_group(
        &mut self,
        command: Command,
        groups: &[RegisterGroup],
    ) -> Result<(), T::Error> {
        command.expect_kind(CommandKind::WriteConfiguration)?;
        if groups.len() != self.chain.get() {
            return Err(crate::Error::GroupCount {
                expected: self.chain.get(),
                actual: groups.len(),
            }
            .into());
        }
        let mut tx_buffer = build_write_frame(command.code(), groups)?;
        self.exchange(&mut tx_buffer)
    }

    fn read_once(&mut self, command: Command) -> Result<Vec<DeviceGroup>, T::Error> {
        let mut buffer = build_read_frame(command.code(), self.chain, REGISTER_GROUP_LEN)?;
        self.exchange(&mut buffer)?;
        Ok(parse_response(
            &buffer,
            self.chain,
            REGISTER_GROUP_LEN,
            self.options,
        )?)
    }

    /// Reads a register group from every device.
    ///
    /// Checksum failures are retried. If they persist, the last response is
    /// returned and [`DeviceGroup::pec_ok`] tells which devices are affected.
    pub fn read_register_group(&mut self, command: Command) -> Result<Vec<DeviceGroup>, T::Error> {
        if !command.kind().is_read() {
            return Err(crate::Error::NotARead(command).into());
        }
        for t in 0..self.retries {
            match self.read_once(command) {
                Ok(groups) => {
                    if groups.iter().all(|group| group.pec_ok) {
                        return Ok(groups);
                    }
                    log::debug!(
                        "Failed try {} of {}, repeating (invalid data PEC)",
                        t + 1,
                        self.retries
                    );
                }
                Err(Error::Protocol(err)) if err.is_retryable() => {
                    log::debug!("Failed try {} of {}, repeating ({err})", t + 1, self.retries);
                }
                Err(err) => return Err(err),
            }
        }
        self.read_once(command)
    }

    /// Like [`Self::read_register_group`], but every device has to deliver
    /// a valid group.
    pub fn read_register_group_checked(
        &mut self,
        command: Command,
    ) -> Result<Vec<RegisterGroup>, T::Error> {
        let groups = self.read_register_group(command)?;
        if let Some(device) = groups.iter().position(|group| !group.pec_ok) {
            return Err(crate::Error::PecMismatch { device }.into());
        }
        Ok(groups.into_iter().map(|group| group.data).collect())
    }

    /// Starts a cell voltage conversion and waits until it is done.
    pub fn start_cell_conversion(&mut self) -> Result<(), T::Error> {
        self.send_command(Command::Adcv)?;
        std::thread::sleep(self.conversion_delay);
        Ok(())
    }

    /// Measures all cells, returns the voltages of every device in chain order.
    pub fn read_cell_voltages(&mut self) -> Result<Vec<Vec<f32>>, T::Error> {
        self.start_cell_conversion()?;
        let mut groups_per_device =
            vec![Vec::with_capacity(Command::CELL_VOLTAGE_GROUPS.len()); self.chain.get()];
        for command in Command::CELL_VOLTAGE_GROUPS {
            let groups = self.read_register_group_checked(command)?;
            for (device_groups, group) in groups_per_device.iter_mut().zip(groups) {
                device_groups.push(group);
            }
        }
        Ok(groups_per_device
            .iter()
            .map(|groups| CellVoltages::decode_device(groups))
            .collect())
    }
}
