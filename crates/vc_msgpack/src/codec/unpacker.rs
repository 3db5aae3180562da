use alloc::string::String;
use alloc::vec::Vec;
use std::io::{self, Read};

use crate::codec::code::{self, Head, header_len, kind_of};
use crate::error::{MessagePackError, Result};
use crate::value::{ExtensionValue, Integer, Timestamp, Value, ValueKind};

/// Nesting limit used unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 512;

// Declared lengths come from untrusted input; never reserve more than this up front.
const PREALLOC_LIMIT: usize = 64 * 1024;

// -----------------------------------------------------------------------------
// Unpacker

#[derive(Debug, Clone, Copy)]
struct Frame {
    declared: u32,
    remaining: u64,
}

/// A streaming MessagePack reader that looks ahead at most one value header.
///
/// The unpacker tracks open arrays and maps so it can tell a clean end of
/// input (between top-level values) from a truncated one, and so that
/// nesting deeper than [`max_depth`](Self::max_depth) is refused before any
/// memory is spent on it.
///
/// Typed reads such as [`read_i64`](Self::read_i64) check the next format
/// byte first. On a [`TypeMismatch`] nothing is consumed, so the caller may
/// retry with another read.
///
/// # Examples
///
/// ```
/// use vc_msgpack::codec::Unpacker;
/// use vc_msgpack::value::Value;
///
/// let bytes: &[u8] = &[0x92, 0x01, 0xa1, b'x', 0xc0];
/// let mut unpacker = Unpacker::new(bytes);
///
/// assert_eq!(unpacker.read_array_header().unwrap(), 2);
/// assert_eq!(unpacker.items_count(), Some(2));
/// assert!(unpacker.read_str().is_err()); // an integer comes first
/// assert_eq!(unpacker.read_i64().unwrap(), 1);
/// assert_eq!(unpacker.read_str().unwrap(), "x");
///
/// assert_eq!(unpacker.read_value().unwrap(), Some(Value::Nil));
/// assert_eq!(unpacker.read_value().unwrap(), None);
/// ```
///
/// [`TypeMismatch`]: MessagePackError::TypeMismatch
#[derive(Debug)]
pub struct Unpacker<R> {
    reader: R,
    peeked: Option<u8>,
    // Header bytes after the peeked format byte, read but not consumed.
    header: [u8; 8],
    header_filled: usize,
    position: u64,
    frames: Vec<Frame>,
    max_depth: usize,
}

/// Unpacker over a type-erased reader, as handed to serializers.
pub type DynUnpacker<'a> = Unpacker<&'a mut dyn Read>;

impl<R: Read> Unpacker<R> {
    /// Creates an unpacker with [`DEFAULT_MAX_DEPTH`].
    #[inline]
    pub fn new(reader: R) -> Self {
        Self::with_max_depth(reader, DEFAULT_MAX_DEPTH)
    }

    /// Creates an unpacker that refuses containers nested deeper than `max_depth`.
    #[inline]
    pub fn with_max_depth(reader: R, max_depth: usize) -> Self {
        Self {
            reader,
            peeked: None,
            header: [0; 8],
            header_filled: 0,
            position: 0,
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of arrays and maps that still have unread items.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Declared item count of the innermost container that still has unread items.
    ///
    /// For maps this is the number of entries, not keys plus values.
    #[inline]
    pub fn items_count(&self) -> Option<u32> {
        self.frames.last().map(|frame| frame.declared)
    }

    #[inline]
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Consumes the unpacker, returning the underlying reader.
    ///
    /// Bytes already taken for lookahead are not given back.
    #[inline]
    pub fn into_inner(self) -> R {
        self.reader
    }

    // -------------------------------------------------------------------------
    // Lookahead

    fn fill_peek(&mut self) -> Result<Option<u8>> {
        if let Some(code) = self.peeked {
            return Ok(Some(code));
        }
        let mut buf = [0_u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.peeked = Some(buf[0]);
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Returns the next format byte without consuming it.
    pub fn peek_code(&mut self) -> Result<u8> {
        self.fill_peek()?.ok_or(MessagePackError::UnexpectedEndOfStream {
            offset: self.position,
        })
    }

    /// Returns the family of the next value without consuming it.
    pub fn peek_kind(&mut self) -> Result<ValueKind> {
        let code = self.peek_code()?;
        kind_of(code).ok_or(MessagePackError::Format {
            code,
            offset: self.position,
        })
    }

    #[inline]
    pub fn is_nil(&mut self) -> Result<bool> {
        Ok(self.peek_code()? == code::NIL)
    }

    #[inline]
    pub fn is_array_header(&mut self) -> Result<bool> {
        Ok(self.peek_kind()? == ValueKind::Array)
    }

    #[inline]
    pub fn is_map_header(&mut self) -> Result<bool> {
        Ok(self.peek_kind()? == ValueKind::Map)
    }

    fn expect(&mut self, accepted: &[ValueKind], expected: &'static str) -> Result<ValueKind> {
        let kind = self.peek_kind()?;
        if accepted.contains(&kind) {
            Ok(kind)
        } else {
            Err(MessagePackError::mismatch(kind.name(), expected))
        }
    }

    // -------------------------------------------------------------------------
    // Raw reads

    // Decodes the next header into the lookahead without consuming it.
    fn peek_head(&mut self) -> Result<Head> {
        let code = self.peek_code()?;
        let extra = header_len(code, self.position)?;
        while self.header_filled < extra {
            match self.reader.read(&mut self.header[self.header_filled..extra]) {
                Ok(0) => {
                    return Err(MessagePackError::UnexpectedEndOfStream {
                        offset: self.position + 1 + self.header_filled as u64,
                    });
                }
                Ok(n) => self.header_filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Head::decode(code, &self.header[..extra], self.position)
    }

    // Reads a header without touching container bookkeeping.
    fn read_head(&mut self) -> Result<Head> {
        let head = self.peek_head()?;
        self.position += 1 + self.header_filled as u64;
        self.peeked = None;
        self.header_filled = 0;
        Ok(head)
    }

    fn read_payload(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity((len as usize).min(PREALLOC_LIMIT));
        let read = self.reader.by_ref().take(len).read_to_end(&mut buf)? as u64;
        self.position += read;
        if read < len {
            return Err(MessagePackError::UnexpectedEndOfStream {
                offset: self.position,
            });
        }
        Ok(buf)
    }

    fn skip_payload(&mut self, len: u64) -> Result<()> {
        let skipped = io::copy(&mut self.reader.by_ref().take(len), &mut io::sink())?;
        self.position += skipped;
        if skipped < len {
            return Err(MessagePackError::UnexpectedEndOfStream {
                offset: self.position,
            });
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Container bookkeeping

    // One complete item ends: charge it to the enclosing container and close
    // every container that has nothing left.
    fn complete_item(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.remaining = frame.remaining.saturating_sub(1);
        }
        while matches!(self.frames.last(), Some(frame) if frame.remaining == 0) {
            self.frames.pop();
        }
    }

    fn charge(&mut self, head: &Head) -> Result<()> {
        if head.is_container() && self.frames.len() >= self.max_depth {
            return Err(MessagePackError::DepthExceeded {
                max_depth: self.max_depth,
            });
        }
        let children = head.children();
        if children == 0 {
            self.complete_item();
            return Ok(());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.remaining -= 1;
        }
        let declared = match *head {
            Head::Array(len) | Head::Map(len) => len,
            _ => 0,
        };
        self.frames.push(Frame {
            declared,
            remaining: children,
        });
        Ok(())
    }

    fn take_head(&mut self) -> Result<Head> {
        let head = self.read_head()?;
        self.charge(&head)?;
        Ok(head)
    }

    // -------------------------------------------------------------------------
    // Typed reads

    pub fn read_nil(&mut self) -> Result<()> {
        self.expect(&[ValueKind::Nil], "Nil")?;
        self.take_head()?;
        Ok(())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.expect(&[ValueKind::Boolean], "bool")?;
        match self.take_head()? {
            Head::Bool(v) => Ok(v),
            _ => Err(MessagePackError::mismatch("non-boolean", "bool")),
        }
    }

    /// Reads any integer encoding.
    pub fn read_integer(&mut self) -> Result<Integer> {
        self.expect(&[ValueKind::Integer], "Integer")?;
        match self.take_head()? {
            Head::Uint(v) => Ok(Integer::from(v)),
            Head::Int(v) => Ok(Integer::from(v)),
            _ => Err(MessagePackError::mismatch("non-integer", "Integer")),
        }
    }

    /// Reads an integer and converts it to `T`, failing if it does not fit.
    pub fn read_int<T: TryFrom<u64> + TryFrom<i64>>(&mut self) -> Result<T> {
        self.read_integer()?
            .cast::<T>()
            .ok_or(MessagePackError::mismatch("Integer", core::any::type_name::<T>()))
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_int::<i64>()
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_int::<u64>()
    }

    /// Reads a float of either width, or an integer converted to `f64`.
    pub fn read_f64(&mut self) -> Result<f64> {
        self.expect(
            &[ValueKind::Float64, ValueKind::Float32, ValueKind::Integer],
            "f64",
        )?;
        match self.take_head()? {
            Head::F64(v) => Ok(v),
            Head::F32(v) => Ok(f64::from(v)),
            Head::Uint(v) => Ok(v as f64),
            Head::Int(v) => Ok(v as f64),
            _ => Err(MessagePackError::mismatch("non-number", "f64")),
        }
    }

    /// Reads a float of either width, or an integer, converted to `f32`.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(self.read_f64()? as f32)
    }

    /// Reads the raw bytes of a string.
    pub fn read_string_bytes(&mut self) -> Result<Vec<u8>> {
        self.expect(&[ValueKind::String], "String")?;
        let len = self.take_head()?.payload_len();
        self.read_payload(len)
    }

    /// Reads a UTF-8 string.
    pub fn read_str(&mut self) -> Result<String> {
        self.expect(&[ValueKind::String], "String")?;
        let len = self.take_head()?.payload_len();
        let offset = self.position;
        let bytes = self.read_payload(len)?;
        String::from_utf8(bytes).map_err(|_| MessagePackError::InvalidUtf8 { offset })
    }

    /// Reads a binary, or a string written by a legacy raw-only packer.
    pub fn read_bin(&mut self) -> Result<Vec<u8>> {
        self.expect(&[ValueKind::Binary, ValueKind::String], "Binary")?;
        let len = self.take_head()?.payload_len();
        self.read_payload(len)
    }

    pub fn read_ext(&mut self) -> Result<ExtensionValue> {
        self.expect(&[ValueKind::Extension], "Extension")?;
        match self.take_head()? {
            Head::Ext { type_code, len } => Ok(ExtensionValue {
                type_code,
                data: self.read_payload(u64::from(len))?,
            }),
            _ => Err(MessagePackError::mismatch("non-extension", "Extension")),
        }
    }

    /// Reads a timestamp extension (type `-1`).
    ///
    /// Any other extension is a mismatch and stays unread. A timestamp with
    /// a malformed payload is consumed before the error is returned.
    pub fn read_timestamp(&mut self) -> Result<Timestamp> {
        self.expect(&[ValueKind::Extension], "Timestamp")?;
        if !matches!(self.peek_head()?, Head::Ext { type_code: code::TIMESTAMP_EXT, .. }) {
            return Err(MessagePackError::mismatch("Extension", "Timestamp"));
        }
        let ext = self.read_ext()?;
        Timestamp::decode(&ext.data).ok_or(MessagePackError::mismatch("Extension", "Timestamp"))
    }

    /// Reads an array header and returns its declared length.
    ///
    /// The caller must then read or skip exactly that many values.
    pub fn read_array_header(&mut self) -> Result<u32> {
        self.expect(&[ValueKind::Array], "Array")?;
        match self.take_head()? {
            Head::Array(len) => Ok(len),
            _ => Err(MessagePackError::mismatch("non-array", "Array")),
        }
    }

    /// Reads a map header and returns its declared number of entries.
    ///
    /// The caller must then read or skip exactly twice that many values.
    pub fn read_map_header(&mut self) -> Result<u32> {
        self.expect(&[ValueKind::Map], "Map")?;
        match self.take_head()? {
            Head::Map(len) => Ok(len),
            _ => Err(MessagePackError::mismatch("non-map", "Map")),
        }
    }

    // -------------------------------------------------------------------------
    // Whole values

    /// Reads one complete value.
    ///
    /// Returns `None` only when the input ends between top-level values.
    /// An end of input anywhere else is an [`UnexpectedEndOfStream`] error.
    ///
    /// [`UnexpectedEndOfStream`]: MessagePackError::UnexpectedEndOfStream
    pub fn read_value(&mut self) -> Result<Option<Value>> {
        if self.frames.is_empty() && self.fill_peek()?.is_none() {
            return Ok(None);
        }
        self.read_value_inner().map(Some)
    }

    fn read_value_inner(&mut self) -> Result<Value> {
        let head = self.read_head()?;
        let payload = match head {
            Head::Str(_) | Head::Bin(_) | Head::Ext { .. } => self.read_payload(head.payload_len())?,
            _ => Vec::new(),
        };
        self.charge(&head)?;
        Ok(match head {
            Head::Nil => Value::Nil,
            Head::Bool(v) => Value::Boolean(v),
            Head::Uint(v) => Value::Integer(Integer::from(v)),
            Head::Int(v) => Value::Integer(Integer::from(v)),
            Head::F32(v) => Value::Float32(v),
            Head::F64(v) => Value::Float64(v),
            Head::Str(_) => Value::String(payload),
            Head::Bin(_) => Value::Binary(payload),
            Head::Ext { type_code, .. } => Value::Extension(ExtensionValue {
                type_code,
                data: payload,
            }),
            Head::Array(len) => {
                let mut items = Vec::with_capacity((len as usize).min(PREALLOC_LIMIT));
                for _ in 0..len {
                    items.push(self.read_value_inner()?);
                }
                Value::Array(items)
            }
            Head::Map(len) => {
                let mut entries = Vec::with_capacity((len as usize).min(PREALLOC_LIMIT));
                for _ in 0..len {
                    let key = self.read_value_inner()?;
                    let value = self.read_value_inner()?;
                    entries.push((key, value));
                }
                Value::Map(entries)
            }
        })
    }

    /// Skips one complete value, including everything nested in it.
    ///
    /// Runs in constant memory regardless of nesting.
    pub fn skip_value(&mut self) -> Result<()> {
        let mut pending: u64 = 1;
        while pending > 0 {
            let head = self.read_head()?;
            self.skip_payload(head.payload_len())?;
            pending = pending - 1 + head.children();
        }
        self.complete_item();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::Unpacker;
    use crate::codec::Packer;
    use crate::error::MessagePackError;
    use crate::value::{Timestamp, Value, ValueKind};

    fn unpacker(bytes: &[u8]) -> Unpacker<&[u8]> {
        Unpacker::new(bytes)
    }

    #[test]
    fn scalars() {
        let mut u = unpacker(&[0xcc, 0xfa, 0xff, 0xd1, 0xff, 0x7f, 0xc3, 0xca, 0x3f, 0x80, 0, 0]);
        assert_eq!(u.read_i64().unwrap(), 250);
        assert_eq!(u.read_i64().unwrap(), -1);
        assert_eq!(u.read_int::<i16>().unwrap(), -129);
        assert!(u.read_bool().unwrap());
        assert_eq!(u.read_f32().unwrap(), 1.0);
        assert_eq!(u.position(), 12);
    }

    #[test]
    fn mismatch_does_not_consume() {
        let mut u = unpacker(&[0xa2, b'h', b'i']);
        assert!(matches!(
            u.read_i64(),
            Err(MessagePackError::TypeMismatch {
                actual: "String",
                expected: "Integer"
            })
        ));
        assert_eq!(u.position(), 0);
        assert_eq!(u.read_str().unwrap(), "hi");
    }

    #[test]
    fn out_of_range_integer() {
        let mut u = unpacker(&[0xcd, 0x01, 0x00]);
        assert!(matches!(u.read_int::<u8>(), Err(MessagePackError::TypeMismatch { .. })));
    }

    #[test]
    fn never_used_byte_is_format_error() {
        let mut u = unpacker(&[0x91, 0xc1]);
        assert_eq!(u.read_array_header().unwrap(), 1);
        assert!(matches!(
            u.read_value(),
            Err(MessagePackError::Format {
                code: 0xc1,
                offset: 1
            })
        ));
    }

    #[test]
    fn truncation() {
        // str8 announcing 5 bytes, only 2 present
        let mut u = unpacker(&[0xd9, 0x05, b'a', b'b']);
        assert!(matches!(
            u.read_value(),
            Err(MessagePackError::UnexpectedEndOfStream { .. })
        ));

        // array announcing 2 items, only 1 present
        let mut u = unpacker(&[0x92, 0x01]);
        assert!(matches!(
            u.read_value(),
            Err(MessagePackError::UnexpectedEndOfStream { offset: 2 })
        ));

        // header announcing an item that never comes, read item by item
        let mut u = unpacker(&[0x91]);
        u.read_array_header().unwrap();
        assert!(matches!(
            u.read_value(),
            Err(MessagePackError::UnexpectedEndOfStream { .. })
        ));
    }

    #[test]
    fn items_count_and_depth() {
        let mut u = unpacker(&[0x82, 0xa1, b'a', 0x93, 1, 2, 3, 0xa1, b'b', 0x90]);
        assert_eq!(u.read_map_header().unwrap(), 2);
        assert_eq!(u.items_count(), Some(2));
        assert_eq!(u.read_str().unwrap(), "a");
        assert_eq!(u.read_array_header().unwrap(), 3);
        assert_eq!(u.items_count(), Some(3));
        assert_eq!(u.depth(), 2);
        u.skip_value().unwrap();
        u.skip_value().unwrap();
        u.skip_value().unwrap();
        assert_eq!(u.items_count(), Some(2));
        assert_eq!(u.read_str().unwrap(), "b");
        assert_eq!(u.read_array_header().unwrap(), 0);
        assert_eq!(u.depth(), 0);
        assert_eq!(u.read_value().unwrap(), None);
    }

    #[test]
    fn skip_nested() {
        let mut bytes = Vec::new();
        let mut p = Packer::new(&mut bytes);
        p.pack_map_header(1).unwrap();
        p.pack_str("deep").unwrap();
        p.pack_array_header(2).unwrap();
        p.pack_bin(&[1, 2, 3]).unwrap();
        p.pack_ext(4, &[0; 20]).unwrap();
        p.pack_i32(42).unwrap();

        let mut u = unpacker(&bytes);
        u.skip_value().unwrap();
        assert_eq!(u.depth(), 0);
        assert_eq!(u.read_i64().unwrap(), 42);
    }

    #[test]
    fn depth_limit() {
        let bytes = [0x91, 0x91, 0x91, 0xc0];
        let mut u = Unpacker::with_max_depth(&bytes[..], 2);
        assert!(matches!(
            u.read_value(),
            Err(MessagePackError::DepthExceeded { max_depth: 2 })
        ));

        let mut u = Unpacker::with_max_depth(&bytes[..], 3);
        assert_eq!(
            u.read_value().unwrap().unwrap(),
            Value::Array(vec![Value::Array(vec![Value::Array(vec![Value::Nil])])])
        );
    }

    #[test]
    fn empty_containers_count_toward_depth() {
        let bytes = [0x91, 0x91, 0x90];
        let mut u = Unpacker::with_max_depth(&bytes[..], 2);
        assert!(matches!(
            u.read_value(),
            Err(MessagePackError::DepthExceeded { max_depth: 2 })
        ));

        let mut u = Unpacker::with_max_depth(&bytes[..], 2);
        assert_eq!(u.read_array_header().unwrap(), 1);
        assert_eq!(u.read_array_header().unwrap(), 1);
        assert!(matches!(
            u.read_map_header(),
            Err(MessagePackError::TypeMismatch { .. })
        ));
        assert!(matches!(
            u.read_array_header(),
            Err(MessagePackError::DepthExceeded { max_depth: 2 })
        ));

        let mut u = Unpacker::with_max_depth(&bytes[..], 3);
        assert_eq!(
            u.read_value().unwrap().unwrap(),
            Value::Array(vec![Value::Array(vec![Value::Array(vec![])])])
        );
    }

    #[test]
    fn other_extensions_are_not_timestamps() {
        // fixext1 of type 5
        let mut u = unpacker(&[0xd4, 0x05, 0x2a, 0xd6, 0xff, 0, 0, 0, 7]);
        assert!(matches!(
            u.read_timestamp(),
            Err(MessagePackError::TypeMismatch {
                actual: "Extension",
                expected: "Timestamp"
            })
        ));
        assert_eq!(u.position(), 0);

        let ext = u.read_ext().unwrap();
        assert_eq!((ext.type_code, ext.data), (5, vec![0x2a]));
        assert_eq!(u.position(), 3);
        assert_eq!(u.read_timestamp().unwrap(), Timestamp::new(7, 0).unwrap());
    }

    #[test]
    fn hostile_length_does_not_preallocate() {
        // array32 claiming u32::MAX items
        let mut u = unpacker(&[0xdd, 0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(
            u.read_value(),
            Err(MessagePackError::UnexpectedEndOfStream { .. })
        ));
    }

    #[test]
    fn value_round_trip() {
        let value = Value::Map(vec![
            (Value::from("list"), Value::Array(vec![Value::from(-40_i64), Value::from(3.25_f64)])),
            (Value::from("bin"), Value::from(vec![0_u8; 300])),
            (Value::from("when"), Value::from(Timestamp::new(1, 2).unwrap())),
            (Value::from("empty"), Value::Map(vec![])),
        ]);
        let mut bytes = Vec::new();
        Packer::new(&mut bytes).pack_value(&value).unwrap();

        let mut u = unpacker(&bytes);
        assert_eq!(u.peek_kind().unwrap(), ValueKind::Map);
        let back = u.read_value().unwrap().unwrap();
        assert_eq!(back, value);
        assert_eq!(back.get("when").unwrap().as_timestamp().unwrap(), Timestamp::new(1, 2).unwrap());
    }

    #[test]
    fn binary_accepts_raw_strings() {
        let mut u = unpacker(&[0xa1, 0x2a, 0xc4, 0x01, 0x2b]);
        assert_eq!(u.read_bin().unwrap(), [0x2a]);
        assert_eq!(u.read_bin().unwrap(), [0x2b]);
    }

    #[test]
    fn invalid_utf8() {
        let mut u = unpacker(&[0xa1, 0xff]);
        assert!(matches!(u.read_str(), Err(MessagePackError::InvalidUtf8 { offset: 1 })));
    }
}
