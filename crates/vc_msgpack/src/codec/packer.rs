use std::io::Write;

use crate::codec::PackerCompatibilityOptions;
use crate::codec::code;
use crate::error::{MessagePackError, Result};
use crate::value::{IntRepr, Integer, Timestamp, Value};

// -----------------------------------------------------------------------------
// Packer

/// A streaming MessagePack writer.
///
/// Every method writes exactly one value or one container header, always in
/// the narrowest encoding that holds the input losslessly. Containers are
/// written as a header followed by the caller writing each element in turn.
///
/// # Examples
///
/// ```
/// use vc_msgpack::codec::Packer;
///
/// let mut packer = Packer::new(Vec::new());
/// packer.pack_array_header(3).unwrap();
/// packer.pack_i64(5).unwrap();
/// packer.pack_i64(250).unwrap();
/// packer.pack_i64(-1).unwrap();
///
/// assert_eq!(packer.into_inner(), [0x93, 0x05, 0xcc, 0xfa, 0xff]);
/// ```
#[derive(Debug)]
pub struct Packer<W> {
    writer: W,
    options: PackerCompatibilityOptions,
}

/// Packer over a type-erased writer, as handed to serializers.
pub type DynPacker<'a> = Packer<&'a mut dyn Write>;

impl<W: Write> Packer<W> {
    /// Creates a packer with the current format.
    #[inline]
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, PackerCompatibilityOptions::NONE)
    }

    /// Creates a packer with the given compatibility flags.
    #[inline]
    pub fn with_options(writer: W, options: PackerCompatibilityOptions) -> Self {
        Self { writer, options }
    }

    /// Returns the compatibility flags in effect.
    #[inline]
    pub fn options(&self) -> PackerCompatibilityOptions {
        self.options
    }

    /// Returns the underlying writer.
    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consumes the packer, returning the underlying writer.
    #[inline]
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Borrows this packer as a [`DynPacker`] writing to the same stream.
    #[inline]
    pub fn as_dyn(&mut self) -> DynPacker<'_> {
        Packer {
            writer: &mut self.writer,
            options: self.options,
        }
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    #[inline]
    fn write_code_be<const N: usize>(&mut self, code: u8, bytes: [u8; N]) -> Result<()> {
        self.write(&[code])?;
        self.write(&bytes)
    }

    // -------------------------------------------------------------------------
    // Scalars

    /// Writes `nil`.
    #[inline]
    pub fn pack_nil(&mut self) -> Result<()> {
        self.write(&[code::NIL])
    }

    /// Writes `true` or `false`.
    #[inline]
    pub fn pack_bool(&mut self, value: bool) -> Result<()> {
        self.write(&[if value { code::TRUE } else { code::FALSE }])
    }

    /// Writes an unsigned integer as positive fixint or the smallest `uint` family member.
    pub fn pack_u64(&mut self, value: u64) -> Result<()> {
        if value <= u64::from(code::POSITIVE_FIXINT_MAX) {
            self.write(&[value as u8])
        } else if let Ok(v) = u8::try_from(value) {
            self.write_code_be(code::UINT8, [v])
        } else if let Ok(v) = u16::try_from(value) {
            self.write_code_be(code::UINT16, v.to_be_bytes())
        } else if let Ok(v) = u32::try_from(value) {
            self.write_code_be(code::UINT32, v.to_be_bytes())
        } else {
            self.write_code_be(code::UINT64, value.to_be_bytes())
        }
    }

    /// Writes a signed integer in the smallest lossless encoding.
    ///
    /// Non-negative values take the unsigned forms, so `250_i64` becomes `cc fa`.
    pub fn pack_i64(&mut self, value: i64) -> Result<()> {
        if value >= 0 {
            return self.pack_u64(value as u64);
        }
        if value >= -32 {
            self.write(&[value as i8 as u8])
        } else if let Ok(v) = i8::try_from(value) {
            self.write_code_be(code::INT8, v.to_be_bytes())
        } else if let Ok(v) = i16::try_from(value) {
            self.write_code_be(code::INT16, v.to_be_bytes())
        } else if let Ok(v) = i32::try_from(value) {
            self.write_code_be(code::INT32, v.to_be_bytes())
        } else {
            self.write_code_be(code::INT64, value.to_be_bytes())
        }
    }

    /// Writes a `u8` through [`pack_u64`](Self::pack_u64).
    ///
    /// The encoding depends on the value, not on the width of its type:
    ///
    /// ```
    /// use vc_msgpack::codec::Packer;
    ///
    /// let mut packer = Packer::new(Vec::new());
    /// packer.pack_u8(7).unwrap();
    /// packer.pack_u32(7).unwrap();
    /// packer.pack_i16(-200).unwrap();
    /// packer.pack_i32(200).unwrap();
    ///
    /// assert_eq!(packer.into_inner(), [0x07, 0x07, 0xd1, 0xff, 0x38, 0xcc, 0xc8]);
    /// ```
    #[inline]
    pub fn pack_u8(&mut self, value: u8) -> Result<()> {
        self.pack_u64(u64::from(value))
    }

    /// Writes a `u16` through [`pack_u64`](Self::pack_u64).
    #[inline]
    pub fn pack_u16(&mut self, value: u16) -> Result<()> {
        self.pack_u64(u64::from(value))
    }

    /// Writes a `u32` through [`pack_u64`](Self::pack_u64).
    #[inline]
    pub fn pack_u32(&mut self, value: u32) -> Result<()> {
        self.pack_u64(u64::from(value))
    }

    /// Writes an `i8` through [`pack_i64`](Self::pack_i64).
    #[inline]
    pub fn pack_i8(&mut self, value: i8) -> Result<()> {
        self.pack_i64(i64::from(value))
    }

    /// Writes an `i16` through [`pack_i64`](Self::pack_i64).
    #[inline]
    pub fn pack_i16(&mut self, value: i16) -> Result<()> {
        self.pack_i64(i64::from(value))
    }

    /// Writes an `i32` through [`pack_i64`](Self::pack_i64).
    #[inline]
    pub fn pack_i32(&mut self, value: i32) -> Result<()> {
        self.pack_i64(i64::from(value))
    }

    /// Writes a normalized [`Integer`].
    #[inline]
    pub fn pack_integer(&mut self, value: Integer) -> Result<()> {
        match value.0 {
            IntRepr::Unsigned(v) => self.pack_u64(v),
            IntRepr::Negative(v) => self.pack_i64(v),
        }
    }

    /// Writes `float32`.
    #[inline]
    pub fn pack_f32(&mut self, value: f32) -> Result<()> {
        self.write_code_be(code::FLOAT32, value.to_be_bytes())
    }

    /// Writes `float64`.
    #[inline]
    pub fn pack_f64(&mut self, value: f64) -> Result<()> {
        self.write_code_be(code::FLOAT64, value.to_be_bytes())
    }

    // -------------------------------------------------------------------------
    // Byte sequences

    /// Writes a UTF-8 string.
    pub fn pack_str(&mut self, value: &str) -> Result<()> {
        self.pack_str_header(value.len())?;
        self.write(value.as_bytes())
    }

    /// Writes the header of a string whose payload is `len` bytes long.
    pub fn pack_str_header(&mut self, len: usize) -> Result<()> {
        if len < 32 {
            self.write(&[code::FIXSTR | len as u8])
        } else if len <= 0xff && !self.options.binary_as_raw() {
            self.write_code_be(code::STR8, [len as u8])
        } else if let Ok(len) = u16::try_from(len) {
            self.write_code_be(code::STR16, len.to_be_bytes())
        } else {
            let len = Self::len32(len)?;
            self.write_code_be(code::STR32, len.to_be_bytes())
        }
    }

    /// Writes an opaque byte sequence.
    ///
    /// With [`PACK_BINARY_AS_RAW`](PackerCompatibilityOptions::PACK_BINARY_AS_RAW)
    /// the raw string headers are used instead of the `bin` family.
    pub fn pack_bin(&mut self, value: &[u8]) -> Result<()> {
        self.pack_bin_header(value.len())?;
        self.write(value)
    }

    /// Writes the header of a binary whose payload is `len` bytes long.
    pub fn pack_bin_header(&mut self, len: usize) -> Result<()> {
        if self.options.binary_as_raw() {
            return self.pack_str_header(len);
        }
        if let Ok(len) = u8::try_from(len) {
            self.write_code_be(code::BIN8, [len])
        } else if let Ok(len) = u16::try_from(len) {
            self.write_code_be(code::BIN16, len.to_be_bytes())
        } else {
            let len = Self::len32(len)?;
            self.write_code_be(code::BIN32, len.to_be_bytes())
        }
    }

    // -------------------------------------------------------------------------
    // Containers

    /// Writes an array header; the caller then writes `len` values.
    pub fn pack_array_header(&mut self, len: usize) -> Result<()> {
        if len < 16 {
            self.write(&[code::FIXARRAY | len as u8])
        } else if let Ok(len) = u16::try_from(len) {
            self.write_code_be(code::ARRAY16, len.to_be_bytes())
        } else {
            let len = Self::len32(len)?;
            self.write_code_be(code::ARRAY32, len.to_be_bytes())
        }
    }

    /// Writes a map header; the caller then writes `len` key/value pairs.
    pub fn pack_map_header(&mut self, len: usize) -> Result<()> {
        if len < 16 {
            self.write(&[code::FIXMAP | len as u8])
        } else if let Ok(len) = u16::try_from(len) {
            self.write_code_be(code::MAP16, len.to_be_bytes())
        } else {
            let len = Self::len32(len)?;
            self.write_code_be(code::MAP32, len.to_be_bytes())
        }
    }

    // -------------------------------------------------------------------------
    // Extensions

    /// Writes an extension value, preferring the `fixext` forms.
    pub fn pack_ext(&mut self, type_code: i8, data: &[u8]) -> Result<()> {
        if self.options.prohibit_extensions() {
            return Err(MessagePackError::schema(
                "ExtensionValue",
                "extension types are prohibited by the packer compatibility options",
            ));
        }
        let tc = type_code as u8;
        match data.len() {
            1 => self.write(&[code::FIXEXT1, tc])?,
            2 => self.write(&[code::FIXEXT2, tc])?,
            4 => self.write(&[code::FIXEXT4, tc])?,
            8 => self.write(&[code::FIXEXT8, tc])?,
            16 => self.write(&[code::FIXEXT16, tc])?,
            len => {
                if let Ok(len) = u8::try_from(len) {
                    self.write(&[code::EXT8, len, tc])?;
                } else if let Ok(len) = u16::try_from(len) {
                    self.write_code_be(code::EXT16, len.to_be_bytes())?;
                    self.write(&[tc])?;
                } else {
                    let len = Self::len32(len)?;
                    self.write_code_be(code::EXT32, len.to_be_bytes())?;
                    self.write(&[tc])?;
                }
            }
        }
        self.write(data)
    }

    /// Writes a timestamp as extension type `-1` in its narrowest layout.
    pub fn pack_timestamp(&mut self, value: Timestamp) -> Result<()> {
        let mut buf = [0_u8; 12];
        let payload = value.encode(&mut buf);
        self.pack_ext(code::TIMESTAMP_EXT, payload)
    }

    // -------------------------------------------------------------------------
    // Values

    /// Writes a whole [`Value`] tree.
    pub fn pack_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Nil => self.pack_nil(),
            Value::Boolean(v) => self.pack_bool(*v),
            Value::Integer(v) => self.pack_integer(*v),
            Value::Float32(v) => self.pack_f32(*v),
            Value::Float64(v) => self.pack_f64(*v),
            Value::String(bytes) => {
                self.pack_str_header(bytes.len())?;
                self.write(bytes)
            }
            Value::Binary(bytes) => self.pack_bin(bytes),
            Value::Array(items) => {
                self.pack_array_header(items.len())?;
                items.iter().try_for_each(|item| self.pack_value(item))
            }
            Value::Map(entries) => {
                self.pack_map_header(entries.len())?;
                entries.iter().try_for_each(|(k, v)| {
                    self.pack_value(k)?;
                    self.pack_value(v)
                })
            }
            Value::Extension(ext) => self.pack_ext(ext.type_code, &ext.data),
        }
    }

    #[inline]
    fn len32(len: usize) -> Result<u32> {
        u32::try_from(len).map_err(|_| MessagePackError::LengthOverflow { len })
    }
}
