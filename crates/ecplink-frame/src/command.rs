//! ECP command identifiers and typed payloads.
//!
//! Only the logic state command is implemented. Set, request and report all
//! share the same identifier and differ by payload length:
//! - request: `[id_hi, id_lo]`
//! - set / report: `[id_hi, id_lo, state]`

use crate::codec::Block;
use crate::error::Result;

/// Logic state set / request / report.
pub const LOGIC_STATE: u32 = 0x110E_0000;

/// Minimum declared length of a logic state report.
pub const LOGIC_REPORT_LEN: usize = 3;

/// Returns a human-readable name for a command identifier.
pub fn command_name(id: u32) -> &'static str {
    match id {
        LOGIC_STATE => "LOGIC_STATE",
        _ => "UNKNOWN",
    }
}

/// An outgoing logic command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicCommand {
    /// Drive a logic ON or OFF.
    Set { logic_id: u16, state: bool },
    /// Ask the console to report a logic's current state.
    Request { logic_id: u16 },
}

impl LogicCommand {
    /// Command identifier for this command.
    pub fn command_id(&self) -> u32 {
        LOGIC_STATE
    }

    /// The logic identifier this command addresses.
    pub fn logic_id(&self) -> u16 {
        match *self {
            LogicCommand::Set { logic_id, .. } | LogicCommand::Request { logic_id } => logic_id,
        }
    }

    /// Payload bytes for this command.
    pub fn payload(&self) -> Vec<u8> {
        match *self {
            LogicCommand::Set { logic_id, state } => {
                let [hi, lo] = logic_id.to_be_bytes();
                vec![hi, lo, u8::from(state)]
            }
            LogicCommand::Request { logic_id } => logic_id.to_be_bytes().to_vec(),
        }
    }

    /// Encode into a block.
    pub fn to_block(&self) -> Result<Block> {
        Block::new(self.command_id(), &self.payload())
    }
}

/// A logic state report received from the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicReport {
    pub logic_id: u16,
    pub state: bool,
}

impl LogicReport {
    /// Interpret a block as a logic state report.
    ///
    /// Returns `None` for other command identifiers and for blocks whose
    /// declared length is too short to carry a state byte.
    pub fn from_block(block: &Block) -> Option<Self> {
        if block.command_id() != LOGIC_STATE || block.declared_len() < LOGIC_REPORT_LEN {
            return None;
        }
        let payload = block.payload();
        Some(Self {
            logic_id: u16::from_be_bytes([payload[0], payload[1]]),
            state: payload[2] != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_block;

    #[test]
    fn set_payload_is_big_endian_with_state() {
        let cmd = LogicCommand::Set {
            logic_id: 0x1234,
            state: true,
        };
        assert_eq!(cmd.payload(), vec![0x12, 0x34, 0x01]);

        let off = LogicCommand::Set {
            logic_id: 7,
            state: false,
        };
        assert_eq!(off.payload(), vec![0x00, 0x07, 0x00]);
    }

    #[test]
    fn request_omits_state_byte() {
        let block = LogicCommand::Request { logic_id: 0xFFFF }.to_block().unwrap();
        assert_eq!(block.command_id(), LOGIC_STATE);
        assert_eq!(block.data(), &[0xFF, 0xFF]);
    }

    #[test]
    fn report_from_logic_5_on_block() {
        let raw = [
            0x03, 0x00, 0x11, 0x0E, 0x00, 0x00, 0x00, 0x05, 0x01, 0, 0, 0, 0, 0, 0, 0,
        ];
        let report = LogicReport::from_block(&decode_block(&raw)).unwrap();
        assert_eq!(
            report,
            LogicReport {
                logic_id: 5,
                state: true
            }
        );
    }

    #[test]
    fn any_nonzero_state_byte_is_on() {
        let block = Block::new(LOGIC_STATE, &[0x00, 0x09, 0x80]).unwrap();
        assert!(LogicReport::from_block(&block).unwrap().state);
    }

    #[test]
    fn short_or_foreign_blocks_are_not_reports() {
        let short = LogicCommand::Request { logic_id: 5 }.to_block().unwrap();
        assert!(LogicReport::from_block(&short).is_none());

        let foreign = Block::new(0x0100_0000, &[0, 5, 1]).unwrap();
        assert!(LogicReport::from_block(&foreign).is_none());
        assert_eq!(command_name(0x0100_0000), "UNKNOWN");
    }
}
