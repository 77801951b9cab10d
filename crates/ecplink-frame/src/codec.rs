use std::fmt;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Every ECP block is exactly 16 bytes on the wire.
pub const BLOCK_SIZE: usize = 16;

/// Payload bytes available in one block.
pub const MAX_PAYLOAD: usize = 8;

/// A decoded ECP block.
///
/// The declared length is kept exactly as received. Decoding never checks it
/// against the padding, so consumers must not assume bytes past the declared
/// length are zero.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Block {
    declared_len: u8,
    command_id: u32,
    payload: [u8; MAX_PAYLOAD],
}

impl Block {
    /// Build a block for sending.
    ///
    /// Payloads longer than [`MAX_PAYLOAD`] are rejected rather than truncated.
    pub fn new(command_id: u32, data: &[u8]) -> Result<Self> {
        if data.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: data.len(),
                max: MAX_PAYLOAD,
            });
        }
        let mut payload = [0u8; MAX_PAYLOAD];
        payload[..data.len()].copy_from_slice(data);
        Ok(Self {
            declared_len: data.len() as u8,
            command_id,
            payload,
        })
    }

    /// The payload length byte as received (not validated).
    pub fn declared_len(&self) -> usize {
        self.declared_len as usize
    }

    /// The 32-bit command identifier.
    pub fn command_id(&self) -> u32 {
        self.command_id
    }

    /// All eight payload bytes, including padding.
    pub fn payload(&self) -> &[u8; MAX_PAYLOAD] {
        &self.payload
    }

    /// The meaningful payload bytes, clamped to the block's capacity.
    pub fn data(&self) -> &[u8] {
        &self.payload[..self.declared_len().min(MAX_PAYLOAD)]
    }

    /// Append the wire representation to `dst`.
    ///
    /// ```text
    /// ┌─────┬─────┬──────────────┬──────────────────┬─────────┐
    /// │ Len │ 0x00│ Command (4B) │ Payload (8B)     │ 0x0000  │
    /// │ 1B  │ 1B  │ big-endian   │ zero padded      │ 2B      │
    /// └─────┴─────┴──────────────┴──────────────────┴─────────┘
    /// ```
    pub fn write_to(&self, dst: &mut impl BufMut) {
        dst.put_u8(self.declared_len);
        dst.put_u8(0);
        dst.put_u32(self.command_id);
        dst.put_slice(&self.payload);
        dst.put_u16(0);
    }

    /// The 16-byte wire representation.
    pub fn to_bytes(&self) -> [u8; BLOCK_SIZE] {
        let mut out = [0u8; BLOCK_SIZE];
        self.write_to(&mut &mut out[..]);
        out
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("declared_len", &self.declared_len)
            .field("command_id", &format_args!("0x{:08X}", self.command_id))
            .field("payload", &self.payload)
            .finish()
    }
}

/// Encode a command into one 16-byte block.
pub fn encode_block(command_id: u32, payload: &[u8]) -> Result<[u8; BLOCK_SIZE]> {
    Ok(Block::new(command_id, payload)?.to_bytes())
}

/// Encode a command and append it to a buffer.
pub fn encode_block_into(command_id: u32, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let block = Block::new(command_id, payload)?;
    dst.reserve(BLOCK_SIZE);
    block.write_to(dst);
    Ok(())
}

/// Decode one 16-byte block.
pub fn decode_block(raw: &[u8; BLOCK_SIZE]) -> Block {
    read_block(&mut &raw[..])
}

/// Split a buffer into complete blocks.
///
/// Returns the decoded blocks in order and the trailing bytes that did not
/// make up a full block.
pub fn split_blocks(buf: &[u8]) -> (Vec<Block>, &[u8]) {
    let complete = buf.len() - buf.len() % BLOCK_SIZE;
    let (mut head, rest) = buf.split_at(complete);
    let mut blocks = Vec::with_capacity(complete / BLOCK_SIZE);
    while head.has_remaining() {
        blocks.push(read_block(&mut head));
    }
    (blocks, rest)
}

/// Consume one block from `src`. Callers guarantee `BLOCK_SIZE` bytes remain.
pub(crate) fn read_block(src: &mut impl Buf) -> Block {
    let declared_len = src.get_u8();
    src.advance(1);
    let command_id = src.get_u32();
    let mut payload = [0u8; MAX_PAYLOAD];
    src.copy_to_slice(&mut payload);
    src.advance(2);
    Block {
        declared_len,
        command_id,
        payload,
    }
}
