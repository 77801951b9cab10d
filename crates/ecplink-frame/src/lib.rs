//! Fixed-size block framing for the DHD ECP protocol.
//!
//! Every ECP message is exactly one 16-byte block:
//! - 1 byte declared payload length (0-8) and 1 reserved byte
//! - A 4-byte big-endian command identifier
//! - 8 payload bytes, zero padded beyond the declared length
//! - 2 reserved bytes
//!
//! There is no length prefix on the stream. [`BlockAssembler`] keeps partial
//! blocks across reads so callers only ever see complete blocks.

pub mod assembler;
pub mod codec;
pub mod command;
pub mod error;

#[cfg(feature = "async")]
pub mod framed;

pub use assembler::BlockAssembler;
pub use codec::{
    decode_block, encode_block, encode_block_into, split_blocks, Block, BLOCK_SIZE, MAX_PAYLOAD,
};
pub use command::{command_name, LogicCommand, LogicReport, LOGIC_STATE};
pub use error::{FrameError, Result};

#[cfg(feature = "async")]
pub use framed::BlockCodec;
