#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! Python `marshal` codec, limited to the value types profile statistics use
//!
//! Decoding accepts what CPython 3 writes for a `pstats` dump, including
//! back-references. Encoding emits reference-free data, which every CPython 3
//! reader accepts.
//!
//! Layout of one encoded value:
//! ```text
//! +-----------------------+-----------------------------+
//! | type code (1 byte)    | payload (little-endian)     |
//! | bit 7: back-ref slot  |                             |
//! +-----------------------+-----------------------------+
//! ```

use proctime_core::{Error, Result};

/// Set on a type code when the object is stored for later back-references
const FLAG_REF: u8 = 0x80;

const TYPE_NULL: u8 = b'0';
const TYPE_NONE: u8 = b'N';
const TYPE_FALSE: u8 = b'F';
const TYPE_TRUE: u8 = b'T';
const TYPE_INT: u8 = b'i';
const TYPE_LONG: u8 = b'l';
const TYPE_FLOAT: u8 = b'f';
const TYPE_BINARY_FLOAT: u8 = b'g';
const TYPE_STRING: u8 = b's';
const TYPE_INTERNED: u8 = b't';
const TYPE_REF: u8 = b'r';
const TYPE_TUPLE: u8 = b'(';
const TYPE_DICT: u8 = b'{';
const TYPE_UNICODE: u8 = b'u';
const TYPE_ASCII: u8 = b'a';
const TYPE_ASCII_INTERNED: u8 = b'A';
const TYPE_SMALL_TUPLE: u8 = b')';
const TYPE_SHORT_ASCII: u8 = b'z';
const TYPE_SHORT_ASCII_INTERNED: u8 = b'Z';

/// Arbitrary-precision ints are stored as base 2**15 digits, least significant first
const LONG_DIGIT_BITS: u32 = 15;
const LONG_DIGIT_BASE: i64 = 0x8000;
const LONG_DIGIT_MASK: u64 = 0x7fff;

/// A decoded Python object
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
    /// Entries in stream order
    Dict(Vec<(Value, Value)>),
}

impl Value {
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric value as a float; ints are widened
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_tuple(&self) -> Option<&[Self]> {
        match self {
            Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_dict(&self) -> Option<&[(Self, Self)]> {
        match self {
            Self::Dict(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Decode exactly one value from `bytes`
///
/// # Errors
///
/// Returns [`Error::ProfileFormat`] if the data is truncated, uses a type
/// this codec does not read, holds a dangling back-reference, or has
/// trailing bytes.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    let mut decoder = Decoder {
        input: bytes,
        refs: Vec::new(),
    };
    let value = decoder.value()?;

    if decoder.input.is_empty() {
        Ok(value)
    } else {
        Err(Error::profile_format(format!(
            "{} trailing bytes after value",
            decoder.input.len()
        )))
    }
}

/// Encode `value` without back-references
///
/// # Errors
///
/// Returns [`Error::ProfileFormat`] if a string or container is longer than
/// the format's 32-bit length field.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_value(&mut out, value)?;
    Ok(out)
}

struct Decoder<'a> {
    input: &'a [u8],
    /// Back-reference table; a slot is `None` while its object is being read
    refs: Vec<Option<Value>>,
}

impl<'a> Decoder<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let (head, rest) = self
            .input
            .split_at_checked(len)
            .ok_or_else(|| Error::profile_format("unexpected end of data"))?;
        self.input = rest;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.take(N)?
            .try_into()
            .map_err(|_| Error::profile_format("unexpected end of data"))
    }

    fn byte(&mut self) -> Result<u8> {
        Ok(u8::from_le_bytes(self.array()?))
    }

    fn int(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn length(&mut self) -> Result<usize> {
        let raw = self.int()?;
        usize::try_from(raw).map_err(|_| Error::profile_format(format!("negative length {raw}")))
    }

    fn text(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::profile_format(e.to_string()))
    }

    fn value(&mut self) -> Result<Value> {
        let code = self.byte()?;
        let slot = if code & FLAG_REF == 0 {
            None
        } else {
            // Slots are numbered in the order objects start, not finish
            self.refs.push(None);
            self.refs.len().checked_sub(1)
        };

        let value = match code & !FLAG_REF {
            TYPE_NONE => Value::None,
            TYPE_FALSE => Value::Bool(false),
            TYPE_TRUE => Value::Bool(true),
            TYPE_INT => Value::Int(i64::from(self.int()?)),
            TYPE_LONG => Value::Int(self.long()?),
            TYPE_BINARY_FLOAT => Value::Float(f64::from_le_bytes(self.array()?)),
            TYPE_FLOAT => {
                let len = usize::from(self.byte()?);
                let text = self.text(len)?;
                Value::Float(
                    text.parse()
                        .map_err(|_| Error::profile_format(format!("invalid float {text:?}")))?,
                )
            }
            TYPE_STRING => {
                let len = self.length()?;
                Value::Str(String::from_utf8_lossy(self.take(len)?).into_owned())
            }
            TYPE_UNICODE | TYPE_INTERNED | TYPE_ASCII | TYPE_ASCII_INTERNED => {
                let len = self.length()?;
                Value::Str(self.text(len)?)
            }
            TYPE_SHORT_ASCII | TYPE_SHORT_ASCII_INTERNED => {
                let len = usize::from(self.byte()?);
                Value::Str(self.text(len)?)
            }
            TYPE_SMALL_TUPLE => {
                let len = usize::from(self.byte()?);
                Value::Tuple(self.items(len)?)
            }
            TYPE_TUPLE => {
                let len = self.length()?;
                Value::Tuple(self.items(len)?)
            }
            TYPE_DICT => Value::Dict(self.entries()?),
            TYPE_REF => return self.back_reference(),
            other => {
                return Err(Error::profile_format(format!(
                    "unsupported type code {other:#04x}"
                )));
            }
        };

        if let Some(entry) = slot.and_then(|index| self.refs.get_mut(index)) {
            *entry = Some(value.clone());
        }
        Ok(value)
    }

    fn long(&mut self) -> Result<i64> {
        let size = self.int()?;
        let count = usize::try_from(size.unsigned_abs())
            .map_err(|_| Error::profile_format("integer too large"))?;

        let mut digits = Vec::new();
        for _ in 0..count {
            digits.push(u16::from_le_bytes(self.array()?));
        }

        let magnitude = digits
            .iter()
            .rev()
            .try_fold(0_i64, |acc, digit| {
                acc.checked_mul(LONG_DIGIT_BASE)?
                    .checked_add(i64::from(*digit))
            })
            .ok_or_else(|| Error::profile_format("integer does not fit in 64 bits"))?;

        Ok(if size.is_negative() {
            magnitude.saturating_neg()
        } else {
            magnitude
        })
    }

    // Lengths come from untrusted input, so nothing is preallocated
    fn items(&mut self, len: usize) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        for _ in 0..len {
            items.push(self.value()?);
        }
        Ok(items)
    }

    fn entries(&mut self) -> Result<Vec<(Value, Value)>> {
        let mut entries = Vec::new();
        loop {
            if self.input.first() == Some(&TYPE_NULL) {
                self.take(1)?;
                return Ok(entries);
            }
            let key = self.value()?;
            let value = self.value()?;
            entries.push((key, value));
        }
    }

    fn back_reference(&mut self) -> Result<Value> {
        let index = self.length()?;
        self.refs
            .get(index)
            .cloned()
            .flatten()
            .ok_or_else(|| Error::profile_format(format!("invalid back-reference {index}")))
    }
}

fn write_length(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let len = i32::try_from(len).map_err(|_| Error::profile_format("object too large to encode"))?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

fn write_long(out: &mut Vec<u8>, value: i64) {
    let mut magnitude = value.unsigned_abs();
    let mut digits: Vec<u16> = Vec::new();
    while magnitude != 0 {
        digits.push(u16::try_from(magnitude & LONG_DIGIT_MASK).unwrap_or_default());
        magnitude = magnitude.checked_shr(LONG_DIGIT_BITS).unwrap_or(0);
    }

    // At most five digits for 64 bits
    let count = i32::try_from(digits.len()).unwrap_or_default();
    let size = if value.is_negative() {
        count.saturating_neg()
    } else {
        count
    };

    out.push(TYPE_LONG);
    out.extend_from_slice(&size.to_le_bytes());
    for digit in digits {
        out.extend_from_slice(&digit.to_le_bytes());
    }
}

fn write_value(out: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::None => out.push(TYPE_NONE),
        Value::Bool(true) => out.push(TYPE_TRUE),
        Value::Bool(false) => out.push(TYPE_FALSE),
        Value::Int(number) => match i32::try_from(*number) {
            Ok(small) => {
                out.push(TYPE_INT);
                out.extend_from_slice(&small.to_le_bytes());
            }
            Err(_) => write_long(out, *number),
        },
        Value::Float(number) => {
            out.push(TYPE_BINARY_FLOAT);
            out.extend_from_slice(&number.to_le_bytes());
        }
        Value::Str(text) => {
            out.push(TYPE_UNICODE);
            write_length(out, text.len())?;
            out.extend_from_slice(text.as_bytes());
        }
        Value::Tuple(items) => {
            out.push(TYPE_TUPLE);
            write_length(out, items.len())?;
            for item in items {
                write_value(out, item)?;
            }
        }
        Value::Dict(entries) => {
            out.push(TYPE_DICT);
            for (key, item) in entries {
                write_value(out, key)?;
                write_value(out, item)?;
            }
            out.push(TYPE_NULL);
        }
    }
    Ok(())
}
