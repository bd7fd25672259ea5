use crate::commands::CommandCode;
use crate::pec::{pec10, pec15};
use crate::Error;
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Command word and its PEC15.
pub const COMMAND_FRAME_LEN: usize = 4;
/// Payload bytes of one register group.
pub const REGISTER_GROUP_LEN: usize = 6;
/// Bytes of the PEC10 field after every register group.
pub const DATA_PEC_LEN: usize = 2;
/// One register group including its PEC10.
pub const REGISTER_GROUP_LEN_WITH_PEC: usize = REGISTER_GROUP_LEN + DATA_PEC_LEN;

/// Cells monitored by a single ADBMS6948.
pub const CELLS_PER_DEVICE: usize = 16;
const CELL_VOLTAGE_LSB: f32 = 150e-6;
const CELL_VOLTAGE_OFFSET: f32 = 1.5;

/// One register group of one device.
pub type RegisterGroup = [u8; REGISTER_GROUP_LEN];

/// Number of devices in the daisy chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ChainLength(usize);

impl ChainLength {
    pub const SINGLE: ChainLength = ChainLength(1);

    pub fn new(devices: usize) -> Result<Self, Error> {
        if devices == 0 {
            return Err(Error::InvalidChainLength(devices));
        }
        Ok(Self(devices))
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Length of a frame carrying `bytes_per_device` payload bytes plus PEC
    /// for every device of the chain.
    pub fn frame_len(self, bytes_per_device: usize) -> usize {
        COMMAND_FRAME_LEN + (bytes_per_device + DATA_PEC_LEN) * self.0
    }
}

impl Default for ChainLength {
    fn default() -> Self {
        Self::SINGLE
    }
}

impl TryFrom<usize> for ChainLength {
    type Error = Error;

    fn try_from(devices: usize) -> Result<Self, Self::Error> {
        Self::new(devices)
    }
}

impl fmt::Display for ChainLength {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How [`parse_response`] treats the first four bytes of a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Validate the PEC15 of the command word at the start of the buffer.
    /// Only useful where the command is echoed back; a failure invalidates
    /// the whole response.
    pub check_command_echo: bool,
}

/// The register group one device returned, with its checksum verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DeviceGroup {
    pub data: RegisterGroup,
    /// 6 bit command counter transmitted in front of the PEC10.
    pub command_counter: u8,
    pub pec_ok: bool,
}

fn validate_group_width(bytes_per_device: usize) -> Result<(), Error> {
    if bytes_per_device != REGISTER_GROUP_LEN {
        return Err(Error::GroupWidth {
            expected: REGISTER_GROUP_LEN,
            actual: bytes_per_device,
        });
    }
    Ok(())
}

fn write_command(buffer: &mut [u8], code: CommandCode) {
    let command = code.to_be_bytes();
    buffer[..2].copy_from_slice(&command);
    buffer[2..COMMAND_FRAME_LEN].copy_from_slice(&pec15(&command).to_be_bytes());
}

/// Builds a frame that carries only a command word, e.g. to start a conversion.
pub fn build_command_frame(code: CommandCode) -> [u8; COMMAND_FRAME_LEN] {
    let mut tx_buffer = [0; COMMAND_FRAME_LEN];
    write_command(&mut tx_buffer, code);
    tx_buffer
}

/// Builds a frame writing one register group per device.
///
/// `groups` is in chain order; the position in the frame is the only
/// addressing there is.
pub fn build_write_frame(code: CommandCode, groups: &[RegisterGroup]) -> Result<Vec<u8>, Error> {
    let chain = ChainLength::new(groups.len())?;
    let mut tx_buffer = vec![0; chain.frame_len(REGISTER_GROUP_LEN)];
    write_command(&mut tx_buffer, code);
    for (group, slot) in groups
        .iter()
        .zip(tx_buffer[COMMAND_FRAME_LEN..].chunks_exact_mut(REGISTER_GROUP_LEN_WITH_PEC))
    {
        slot[..REGISTER_GROUP_LEN].copy_from_slice(group);
        // the command counter bits stay zero on transmit
        slot[REGISTER_GROUP_LEN..].copy_from_slice(&pec10(group, None).to_be_bytes());
    }
    Ok(tx_buffer)
}

/// Builds a frame reading `bytes_per_device` bytes from every device.
///
/// Everything behind the command PEC is zero; the devices shift their data
/// into these bytes during the exchange.
pub fn build_read_frame(
    code: CommandCode,
    chain: ChainLength,
    bytes_per_device: usize,
) -> Result<Vec<u8>, Error> {
    validate_group_width(bytes_per_device)?;
    let mut tx_buffer = vec![0; chain.frame_len(bytes_per_device)];
    write_command(&mut tx_buffer, code);
    Ok(tx_buffer)
}

/// Splits a response into the register groups of the chain devices and
/// checks each PEC10.
///
/// A PEC10 mismatch is reported per device through [`DeviceGroup::pec_ok`]
/// so the caller can decide on a retry. A failed command echo (when enabled
/// in `options`) fails the whole response.
pub fn parse_response(
    rx_buffer: &[u8],
    chain: ChainLength,
    bytes_per_device: usize,
    options: ParseOptions,
) -> Result<Vec<DeviceGroup>, Error> {
    validate_group_width(bytes_per_device)?;
    let expected = chain.frame_len(bytes_per_device);
    if rx_buffer.len() < expected {
        log::warn!(
            "Invalid buffer size - required={} received={}",
            expected,
            rx_buffer.len()
        );
        return Err(Error::BufferLength {
            expected,
            actual: rx_buffer.len(),
        });
    }

    if options.check_command_echo {
        let calculated = pec15(&rx_buffer[..2]);
        let received = u16::from_be_bytes([rx_buffer[2], rx_buffer[3]]);
        if calculated != received {
            log::warn!(
                "Invalid command PEC - calculated={:04X?} received={:04X?} buffer={:02X?}",
                calculated,
                received,
                &rx_buffer[..COMMAND_FRAME_LEN]
            );
            return Err(Error::CommandPecMismatch {
                calculated,
                received,
            });
        }
    }

    let groups = rx_buffer[COMMAND_FRAME_LEN..expected]
        .chunks_exact(REGISTER_GROUP_LEN_WITH_PEC)
        .enumerate()
        .map(|(device, slot)| {
            let mut data = [0; REGISTER_GROUP_LEN];
            data.copy_from_slice(&slot[..REGISTER_GROUP_LEN]);
            let status = slot[REGISTER_GROUP_LEN];
            let received = u16::from_be_bytes([status, slot[REGISTER_GROUP_LEN + 1]]) & 0x03FF;
            let calculated = pec10(&slot[..REGISTER_GROUP_LEN], Some(status));
            let pec_ok = calculated == received;
            if !pec_ok {
                log::warn!(
                    "Invalid data PEC on device #{} - calculated={:03X?} received={:03X?} group={:02X?}",
                    device,
                    calculated,
                    received,
                    slot
                );
            }
            DeviceGroup {
                data,
                command_counter: status >> 2,
                pec_ok,
            }
        })
        .collect();
    Ok(groups)
}

/// Converts a 16 bit cell voltage code to volts.
pub fn cell_code_to_voltage(code: u16) -> f32 {
    CELL_VOLTAGE_LSB * f32::from(code) + CELL_VOLTAGE_OFFSET
}

pub struct CellVoltages;

impl CellVoltages {
    /// Decodes the three cell voltages of a cell voltage register group.
    /// The codes are sent low byte first.
    pub fn decode(group: &RegisterGroup) -> [f32; 3] {
        let mut result = [0.0; 3];
        for (volt, code) in result.iter_mut().zip(group.chunks_exact(2)) {
            *volt = cell_code_to_voltage(u16::from_le_bytes([code[0], code[1]]));
        }
        result
    }

    /// Decodes cell voltage groups A to F of one device into its cell voltages.
    pub fn decode_device(groups: &[RegisterGroup]) -> Vec<f32> {
        let mut result = Vec::with_capacity(CELLS_PER_DEVICE);
        for (n_group, group) in groups.iter().enumerate() {
            for (i, volt) in Self::decode(group).into_iter().enumerate() {
                if result.len() == CELLS_PER_DEVICE {
                    return result;
                }
                log::trace!("Group #{} cell #{} volt={}", n_group, n_group * 3 + i + 1, volt);
                result.push(volt);
            }
        }
        result
    }
}
