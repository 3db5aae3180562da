//! Reads exactly one MessagePack value from an async stream.
//!
//! The value is only framed here, never decoded: headers are parsed to learn
//! how many payload bytes and nested values follow, and every byte is copied
//! into a buffer that the synchronous [`Unpacker`] decodes afterwards. Bytes
//! after the value stay unread in the stream.
//!
//! [`Unpacker`]: crate::codec::Unpacker

use alloc::vec::Vec;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::codec::code::{Head, header_len};
use crate::error::{MessagePackError, Result};

async fn read_exact_into<R: AsyncRead + Unpin>(
    reader: &mut R,
    out: &mut Vec<u8>,
    len: u64,
) -> Result<()> {
    let start = out.len() as u64;
    let read = (&mut *reader).take(len).read_to_end(out).await? as u64;
    if read < len {
        return Err(MessagePackError::UnexpectedEndOfStream {
            offset: start + read,
        });
    }
    Ok(())
}

/// Copies the bytes of one complete value from `reader`.
pub async fn read_value_bytes<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_depth: usize,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    // Items still expected at each nesting level, outermost first.
    let mut pending: Vec<u64> = Vec::from([1]);

    while let Some(top) = pending.last_mut() {
        if *top == 0 {
            pending.pop();
            continue;
        }
        *top -= 1;

        let offset = out.len() as u64;
        let code = match reader.read_u8().await {
            Ok(code) => code,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(MessagePackError::UnexpectedEndOfStream { offset });
            }
            Err(e) => return Err(e.into()),
        };
        out.push(code);

        let extra = header_len(code, offset)?;
        read_exact_into(reader, &mut out, extra as u64).await?;
        let head = Head::decode(code, &out[out.len() - extra..], offset)?;

        read_exact_into(reader, &mut out, head.payload_len()).await?;

        // `pending` holds one entry per open container plus the root.
        if head.is_container() && pending.len() > max_depth {
            return Err(MessagePackError::DepthExceeded { max_depth });
        }
        let children = head.children();
        if children > 0 {
            pending.push(children);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::read_value_bytes;
    use crate::error::MessagePackError;

    #[tokio::test]
    async fn frames_one_value_and_leaves_the_rest() {
        let mut input: &[u8] = &[0x92, 0xa1, b'x', 0x81, 0x01, 0xc0, 0x07];
        let value = read_value_bytes(&mut input, 8).await.unwrap();
        assert_eq!(value, [0x92, 0xa1, b'x', 0x81, 0x01, 0xc0]);
        assert_eq!(input, [0x07]);
    }

    #[tokio::test]
    async fn truncated_input() {
        let mut input: &[u8] = &[0x93, 0x01];
        assert!(matches!(
            read_value_bytes(&mut input, 8).await,
            Err(MessagePackError::UnexpectedEndOfStream { offset: 2 })
        ));
    }

    #[tokio::test]
    async fn depth_limit() {
        let mut input: &[u8] = &[0x91, 0x91, 0xc0];
        assert!(matches!(
            read_value_bytes(&mut input, 1).await,
            Err(MessagePackError::DepthExceeded { max_depth: 1 })
        ));

        let mut input: &[u8] = &[0x91, 0x80];
        assert!(matches!(
            read_value_bytes(&mut input, 1).await,
            Err(MessagePackError::DepthExceeded { max_depth: 1 })
        ));

        let mut input: &[u8] = &[0x91, 0x80];
        assert_eq!(read_value_bytes(&mut input, 2).await.unwrap(), [0x91, 0x80]);
    }
}
