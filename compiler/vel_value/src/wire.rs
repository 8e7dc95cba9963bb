//! Reader for the protobuf binary encoding.
//!
//! Only what the well-known type deserializers need: walking the fields of
//! one message and interpreting scalar payloads. Unknown fields are skipped
//! by callers; groups are rejected.

use crate::errors::{invalid_argument, Result, Status};

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum WireValue<'a> {
    Varint(u64),
    Fixed64(u64),
    LengthDelimited(&'a [u8]),
    Fixed32(u32),
}

#[cold]
fn malformed(what: &str) -> Status {
    invalid_argument(format!("malformed protobuf data: {what}"))
}

pub(crate) struct WireReader<'a> {
    buf: &'a [u8],
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        WireReader { buf }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(malformed("truncated field"));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_varint(&mut self) -> Result<u64> {
        let mut value = 0_u64;
        for shift in (0..64).step_by(7) {
            let byte = self.take(1)?[0];
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(malformed("varint too long"))
    }

    /// The next `(field number, payload)`, or `None` at the end of input.
    pub(crate) fn next_field(&mut self) -> Result<Option<(u32, WireValue<'a>)>> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        let tag = self.read_varint()?;
        let number = u32::try_from(tag >> 3).map_err(|_| malformed("field number"))?;
        if number == 0 {
            return Err(malformed("field number 0"));
        }
        let value = match tag & 0x7 {
            0 => WireValue::Varint(self.read_varint()?),
            1 => {
                let bytes = self.take(8)?;
                let mut raw = [0_u8; 8];
                raw.copy_from_slice(bytes);
                WireValue::Fixed64(u64::from_le_bytes(raw))
            }
            2 => {
                let len = usize::try_from(self.read_varint()?)
                    .map_err(|_| malformed("length overflow"))?;
                WireValue::LengthDelimited(self.take(len)?)
            }
            5 => {
                let bytes = self.take(4)?;
                let mut raw = [0_u8; 4];
                raw.copy_from_slice(bytes);
                WireValue::Fixed32(u32::from_le_bytes(raw))
            }
            other => return Err(malformed(&format!("unsupported wire type {other}"))),
        };
        Ok(Some((number, value)))
    }
}

impl<'a> WireValue<'a> {
    pub(crate) fn as_varint(self) -> Result<u64> {
        match self {
            WireValue::Varint(v) => Ok(v),
            _ => Err(malformed("expected varint")),
        }
    }

    pub(crate) fn as_bool(self) -> Result<bool> {
        Ok(self.as_varint()? != 0)
    }

    #[allow(clippy::cast_possible_wrap)]
    pub(crate) fn as_i64(self) -> Result<i64> {
        Ok(self.as_varint()? as i64)
    }

    /// `int32` fields are sign-extended on the wire and truncated on read.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn as_i32(self) -> Result<i32> {
        Ok(self.as_i64()? as i32)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn as_u32(self) -> Result<u32> {
        Ok(self.as_varint()? as u32)
    }

    pub(crate) fn as_f64(self) -> Result<f64> {
        match self {
            WireValue::Fixed64(bits) => Ok(f64::from_bits(bits)),
            _ => Err(malformed("expected fixed64")),
        }
    }

    pub(crate) fn as_f32(self) -> Result<f32> {
        match self {
            WireValue::Fixed32(bits) => Ok(f32::from_bits(bits)),
            _ => Err(malformed("expected fixed32")),
        }
    }

    pub(crate) fn as_bytes(self) -> Result<&'a [u8]> {
        match self {
            WireValue::LengthDelimited(bytes) => Ok(bytes),
            _ => Err(malformed("expected length-delimited field")),
        }
    }

    pub(crate) fn as_str(self) -> Result<&'a str> {
        std::str::from_utf8(self.as_bytes()?).map_err(|_| malformed("invalid UTF-8 in string"))
    }
}
