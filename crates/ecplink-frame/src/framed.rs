//! `tokio_util::codec` integration.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{read_block, Block, BLOCK_SIZE};
use crate::error::FrameError;

/// Codec for use with `FramedRead` / `FramedWrite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockCodec;

impl Decoder for BlockCodec {
    type Item = Block;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < BLOCK_SIZE {
            src.reserve(BLOCK_SIZE - src.len());
            return Ok(None);
        }
        Ok(Some(read_block(src)))
    }
}

impl Encoder<Block> for BlockCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Block, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(BLOCK_SIZE);
        item.write_to(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::command::{LogicCommand, LOGIC_STATE};

    #[test]
    fn decoder_waits_for_full_block() {
        let raw = LogicCommand::Request { logic_id: 5 }
            .to_block()
            .unwrap()
            .to_bytes();
        let mut codec = BlockCodec;
        let mut buf = BytesMut::from(&raw[..15]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&raw[15..]);
        let block = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(block.data(), &[0, 5]);
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (client, server) = tokio::io::duplex(64);
        let mut writer = FramedWrite::new(client, BlockCodec);
        let mut reader = FramedRead::new(server, BlockCodec);

        writer
            .send(Block::new(LOGIC_STATE, &[0, 1, 1]).unwrap())
            .await
            .unwrap();
        writer
            .send(Block::new(LOGIC_STATE, &[0, 2]).unwrap())
            .await
            .unwrap();
        drop(writer);

        let first = reader.next().await.unwrap().unwrap();
        let second = reader.next().await.unwrap().unwrap();
        assert_eq!(first.data(), &[0, 1, 1]);
        assert_eq!(second.data(), &[0, 2]);
        assert!(reader.next().await.is_none());
    }
}
