use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::codec::{read_block, Block, BLOCK_SIZE};

const INITIAL_BUFFER_CAPACITY: usize = 4 * BLOCK_SIZE;

/// Reassembles blocks from arbitrarily sized chunks of a byte stream.
///
/// TCP gives no guarantee that reads line up with block boundaries. Trailing
/// bytes of an incomplete block are kept and prepended to the next chunk.
#[derive(Debug)]
pub struct BlockAssembler {
    buf: BytesMut,
}

impl BlockAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Append a chunk and return every block it completes, in arrival order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Block> {
        self.buf.extend_from_slice(chunk);
        let mut blocks = Vec::with_capacity(self.buf.len() / BLOCK_SIZE);
        while let Some(block) = self.next_block() {
            blocks.push(block);
        }
        if !self.buf.is_empty() {
            trace!(pending = self.buf.len(), "partial block buffered");
        }
        blocks
    }

    /// Take the next complete block off the front of the buffer, if any.
    pub fn next_block(&mut self) -> Option<Block> {
        if self.buf.remaining() < BLOCK_SIZE {
            return None;
        }
        Some(read_block(&mut self.buf))
    }

    /// Number of buffered bytes not yet forming a full block.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drop buffered bytes (used when a new stream starts).
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Default for BlockAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::codec::{encode_block, encode_block_into};
    use crate::command::LOGIC_STATE;

    #[test]
    fn single_block() {
        let raw = encode_block(LOGIC_STATE, &[0, 5, 1]).unwrap();
        let mut assembler = BlockAssembler::new();

        let blocks = assembler.push(&raw);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data(), &[0, 5, 1]);
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn many_blocks_in_one_chunk_keep_order() {
        let mut wire = BytesMut::new();
        for id in 0..5u8 {
            encode_block_into(LOGIC_STATE, &[0, id, id % 2], &mut wire).unwrap();
        }

        let blocks = BlockAssembler::new().push(&wire);
        assert_eq!(blocks.len(), 5);
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(block.payload()[1], i as u8);
        }
    }

    #[test]
    fn block_split_across_chunks() {
        let raw = encode_block(LOGIC_STATE, &[0x01, 0x02, 0x01]).unwrap();
        let mut assembler = BlockAssembler::new();

        assert!(assembler.push(&raw[..10]).is_empty());
        assert_eq!(assembler.pending(), 10);

        let blocks = assembler.push(&raw[10..]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].to_bytes(), raw);
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn byte_by_byte_delivery() {
        let mut wire = BytesMut::new();
        encode_block_into(LOGIC_STATE, &[0, 1, 1], &mut wire).unwrap();
        encode_block_into(LOGIC_STATE, &[0, 2, 0], &mut wire).unwrap();

        let mut assembler = BlockAssembler::new();
        let mut seen = Vec::new();
        for byte in wire.iter() {
            seen.extend(assembler.push(std::slice::from_ref(byte)));
        }

        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].data(), &[0, 1, 1]);
        assert_eq!(seen[1].data(), &[0, 2, 0]);
    }

    #[test]
    fn trailing_partial_block_is_retained() {
        let mut wire = BytesMut::new();
        encode_block_into(LOGIC_STATE, &[0, 1, 1], &mut wire).unwrap();
        let second = encode_block(LOGIC_STATE, &[0, 2, 1]).unwrap();
        wire.extend_from_slice(&second[..4]);

        let mut assembler = BlockAssembler::new();
        assert_eq!(assembler.push(&wire).len(), 1);
        assert_eq!(assembler.pending(), 4);

        let rest = assembler.push(&second[4..]);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].data(), &[0, 2, 1]);
    }

    #[test]
    fn clear_discards_partial_block() {
        let raw = encode_block(LOGIC_STATE, &[0, 3, 1]).unwrap();
        let mut assembler = BlockAssembler::new();
        assembler.push(&raw[..7]);
        assembler.clear();

        assert_eq!(assembler.pending(), 0);
        assert!(assembler.push(&raw[7..]).is_empty());
    }
}
