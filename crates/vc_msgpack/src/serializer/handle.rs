use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;
use std::io::{Read, Write};

use crate::codec::{DynPacker, DynUnpacker, Packer, Unpacker};
use crate::context::SerializationOptions;
use crate::error::Result;
use crate::info::unbox;
use crate::serializer::ErasedSerializer;

/// The typed handle returned by
/// [`SerializationContext::get_serializer`](crate::context::SerializationContext::get_serializer).
///
/// Cloning is cheap; clones share the built serializer graph. A handle
/// carries the options of the context that built it.
///
/// # Examples
///
/// ```
/// use vc_msgpack::context::SerializationContext;
///
/// let context = SerializationContext::new();
/// let serializer = context.get_serializer::<Vec<Option<i32>>>().unwrap();
///
/// let bytes = serializer.pack_single_object(&vec![Some(1), None]).unwrap();
/// assert_eq!(bytes, [0x92, 0x01, 0xc0]);
///
/// let back = serializer.unpack_single_object(&bytes).unwrap();
/// assert_eq!(back, vec![Some(1), None]);
/// ```
pub struct Serializer<T> {
    inner: Arc<dyn ErasedSerializer>,
    options: Arc<SerializationOptions>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Serializer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            options: Arc::clone(&self.options),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Serializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("target", &self.inner.target())
            .field("options", &self.options)
            .finish()
    }
}

impl<T: 'static> Serializer<T> {
    #[inline]
    pub(crate) fn new(inner: Arc<dyn ErasedSerializer>, options: Arc<SerializationOptions>) -> Self {
        Self {
            inner,
            options,
            _marker: PhantomData,
        }
    }

    /// The options this serializer was built with.
    #[inline]
    pub fn options(&self) -> &SerializationOptions {
        &self.options
    }

    /// The type-erased serializer behind this handle.
    #[inline]
    pub fn erased(&self) -> &Arc<dyn ErasedSerializer> {
        &self.inner
    }

    // -------------------------------------------------------------------------
    // Packing

    /// Writes `value` to `writer` and flushes it.
    pub fn pack<W: Write>(&self, writer: W, value: &T) -> Result<()> {
        let mut packer = Packer::with_options(writer, self.options.compatibility);
        self.pack_to(&mut packer.as_dyn(), value)?;
        packer.flush()
    }

    /// Writes `value` through an existing packer, e.g. as one item of a
    /// hand-written container.
    #[inline]
    pub fn pack_to(&self, packer: &mut DynPacker<'_>, value: &T) -> Result<()> {
        self.inner.pack_erased(packer, value)
    }

    /// Packs `value` into a fresh buffer.
    pub fn pack_single_object(&self, value: &T) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.pack(&mut buffer, value)?;
        Ok(buffer)
    }

    // -------------------------------------------------------------------------
    // Unpacking

    /// Reads one value from `reader`.
    ///
    /// Bytes after the value are left unread, although the reader may have
    /// buffered one byte of lookahead.
    pub fn unpack<R: Read>(&self, mut reader: R) -> Result<T> {
        let mut unpacker = Unpacker::with_max_depth(&mut reader as &mut dyn Read, self.options.max_depth);
        self.unpack_from(&mut unpacker)
    }

    /// Reads one value through an existing unpacker.
    #[inline]
    pub fn unpack_from(&self, unpacker: &mut DynUnpacker<'_>) -> Result<T> {
        unbox::<T>(self.inner.unpack_erased(unpacker)?)
    }

    /// Reads the first value in `bytes`.
    #[inline]
    pub fn unpack_single_object(&self, bytes: &[u8]) -> Result<T> {
        self.unpack(bytes)
    }
}

// -----------------------------------------------------------------------------
// Async

#[cfg(feature = "tokio")]
mod async_io {
    use core::future::Future;

    use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

    use super::Serializer;
    use crate::codec::frame::read_value_bytes;
    use crate::error::{MessagePackError, Result};

    impl<T: 'static> Serializer<T> {
        /// Packs `value` and writes it to `writer`.
        ///
        /// Encoding is synchronous; only the write suspends.
        pub async fn pack_async<W: AsyncWrite + Unpin>(&self, writer: &mut W, value: &T) -> Result<()> {
            let bytes = self.pack_single_object(value)?;
            writer.write_all(&bytes).await?;
            writer.flush().await?;
            Ok(())
        }

        /// [`pack_async`](Self::pack_async), abandoned with
        /// [`Cancelled`](MessagePackError::Cancelled) once `cancel` completes.
        ///
        /// A cancelled write may have reached the stream in part.
        pub async fn pack_async_cancellable<W, C>(&self, writer: &mut W, value: &T, cancel: C) -> Result<()>
        where
            W: AsyncWrite + Unpin,
            C: Future<Output = ()>,
        {
            tokio::select! {
                biased;
                () = cancel => Err(MessagePackError::Cancelled),
                result = self.pack_async(writer, value) => result,
            }
        }

        /// Reads exactly one value from `reader`.
        ///
        /// The value's bytes are framed first, so nothing is decoded until
        /// the whole value has arrived, and nothing after it is consumed.
        pub async fn unpack_async<R: AsyncRead + Unpin>(&self, reader: &mut R) -> Result<T> {
            let bytes = read_value_bytes(reader, self.options.max_depth).await?;
            self.unpack_single_object(&bytes)
        }

        /// [`unpack_async`](Self::unpack_async), abandoned with
        /// [`Cancelled`](MessagePackError::Cancelled) once `cancel` completes.
        ///
        /// No partial value is ever produced; the stream position after a
        /// cancellation is unspecified.
        pub async fn unpack_async_cancellable<R, C>(&self, reader: &mut R, cancel: C) -> Result<T>
        where
            R: AsyncRead + Unpin,
            C: Future<Output = ()>,
        {
            tokio::select! {
                biased;
                () = cancel => Err(MessagePackError::Cancelled),
                result = self.unpack_async(reader) => result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::codec::Unpacker;
    use crate::context::{SerializationContext, SerializationOptions};
    use crate::error::MessagePackError;

    #[test]
    fn stream_of_values() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<u32>().unwrap();

        let mut buffer = Vec::new();
        for v in [1_u32, 300, 70_000] {
            serializer.pack(&mut buffer, &v).unwrap();
        }

        let mut reader = buffer.as_slice();
        let mut unpacker = Unpacker::new(&mut reader as &mut dyn std::io::Read);
        let values: Vec<u32> = (0..3).map(|_| serializer.unpack_from(&mut unpacker).unwrap()).collect();
        assert_eq!(values, vec![1, 300, 70_000]);
        assert!(unpacker.read_value().unwrap().is_none());
    }

    #[test]
    fn truncated_input() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Vec<u32>>().unwrap();
        let err = serializer.unpack_single_object(&[0x93, 0x01]).unwrap_err();
        assert!(matches!(err, MessagePackError::UnexpectedEndOfStream { .. }));
    }

    #[test]
    fn depth_limit_follows_options() {
        let context = SerializationContext::with_options(SerializationOptions::default().with_max_depth(2));
        let serializer = context.get_serializer::<Vec<Vec<Vec<u16>>>>().unwrap();
        let err = serializer
            .unpack_single_object(&[0x91, 0x91, 0x91, 0x01])
            .unwrap_err();
        assert!(matches!(err, MessagePackError::DepthExceeded { max_depth: 2 }));

        let err = serializer.unpack_single_object(&[0x91, 0x91, 0x90]).unwrap_err();
        assert!(matches!(err, MessagePackError::DepthExceeded { max_depth: 2 }));

        assert_eq!(serializer.unpack_single_object(&[0x91, 0x90]).unwrap(), vec![Vec::<Vec<u16>>::new()]);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test(flavor = "current_thread")]
    async fn async_round_trip() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Vec<String>>().unwrap();

        let value = vec![String::from("a"), String::from("bc")];
        let mut buffer = Vec::new();
        serializer.pack_async(&mut buffer, &value).await.unwrap();
        buffer.extend_from_slice(&[0xc0]);

        let mut reader = buffer.as_slice();
        let back = serializer.unpack_async(&mut reader).await.unwrap();
        assert_eq!(back, value);
        assert_eq!(reader, [0xc0]);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test(flavor = "current_thread")]
    async fn async_cancellation() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<u8>().unwrap();

        let mut reader: &[u8] = &[0x01];
        let err = serializer
            .unpack_async_cancellable(&mut reader, core::future::ready(()))
            .await
            .unwrap_err();
        assert!(matches!(err, MessagePackError::Cancelled));

        let mut buffer = Vec::new();
        let value = serializer
            .unpack_async_cancellable(&mut &[0x07_u8][..], core::future::pending())
            .await
            .unwrap();
        assert_eq!(value, 7);
        serializer
            .pack_async_cancellable(&mut buffer, &value, core::future::pending())
            .await
            .unwrap();
        assert_eq!(buffer, [0x07]);
    }
}
