//! Opaque octet containers, fixed and variable.
//!
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::codec::{json_hex, take, take_mut, Codec};
use crate::error::{Error, Result};
use crate::varint;

/// Fixed 16-byte value.
pub type Bytes16 = [u8; 16];
/// Fixed 32-byte value.
pub type Bytes32 = [u8; 32];
/// Fixed 64-byte value.
pub type Bytes64 = [u8; 64];
/// Fixed 128-byte value.
pub type Bytes128 = [u8; 128];
/// Fixed 256-byte value.
pub type Bytes256 = [u8; 256];
/// Fixed 512-byte value.
pub type Bytes512 = [u8; 512];
/// Fixed 1024-byte value.
pub type Bytes1024 = [u8; 1024];

// A byte array of statically known size goes over the wire as its payload
// alone. The length is part of the type, so no prefix is written.
impl<const N: usize> Codec for [u8; N] {
    const WIDTH: Option<usize> = Some(N);
    const JSON_STRING: bool = true;

    fn encoded_size(&self) -> usize {
        N
    }

    fn encode_into(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        take_mut(buf, offset, N)?.copy_from_slice(self);
        Ok(N)
    }

    fn decode_from(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut out = [0u8; N];
        out.copy_from_slice(take(buf, offset, N)?);
        Ok((out, N))
    }

    fn to_json(&self) -> Value {
        Value::String(hex::encode(self))
    }

    fn from_json(json: &Value) -> Result<Self> {
        let raw = json_hex(json)?;
        if raw.len() != N {
            return Err(Error::BadLength {
                len: raw.len(),
                min: N,
                max: N,
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&raw);
        Ok(out)
    }
}

/// An octet sequence whose length is bounded to `[MIN, MAX]`.
///
/// On the wire a `ByteSeq` is a varint length prefix followed by its payload,
/// except when the bounds pin the length to a single nonzero value, in which
/// case the prefix is omitted. [`VarBytes`](crate::VarBytes) is the unbounded
/// alias most callers want.
///
/// Mutations check the resulting length against the bounds first and leave
/// the container untouched when they refuse.
///
/// The JSON form is the payload as a lowercase hex string without a `0x`
/// prefix; a `0x` is stripped on input for tolerance.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSeq<const MIN: usize, const MAX: usize> {
    raw: Vec<u8>,
}

/// Byte container with no length bounds.
pub type VarBytes = ByteSeq<0, { usize::MAX }>;

impl<const MAX: usize> Default for ByteSeq<0, MAX> {
    fn default() -> Self {
        Self { raw: Vec::new() }
    }
}

impl<const MIN: usize, const MAX: usize> ByteSeq<MIN, MAX> {
    /// True when the bounds pin the length and the wire form drops its prefix.
    pub const FIXED: bool = MIN == MAX && MAX != 0;

    fn check_len(len: usize) -> Result<()> {
        if len < MIN || len > MAX {
            Err(Error::BadLength {
                len,
                min: MIN,
                max: MAX,
            })
        } else {
            Ok(())
        }
    }

    /// Build from a byte slice, checking the length bounds.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        Self::check_len(raw.len())?;
        Ok(Self { raw: raw.to_vec() })
    }

    /// Build from an owned vector, checking the length bounds.
    pub fn from_vec(raw: Vec<u8>) -> Result<Self> {
        Self::check_len(raw.len())?;
        Ok(Self { raw })
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// True if no bytes are held.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// View the payload.
    pub fn as_slice(&self) -> &[u8] {
        &self.raw
    }

    /// Append one byte.
    pub fn push(&mut self, byte: u8) -> Result<()> {
        Self::check_len(self.raw.len() + 1)?;
        self.raw.push(byte);
        Ok(())
    }

    /// Remove and return the last byte.
    pub fn pop(&mut self) -> Result<u8> {
        let last = self.raw.last().copied().ok_or(Error::BadLength {
            len: 0,
            min: 1,
            max: MAX,
        })?;
        Self::check_len(self.raw.len() - 1)?;
        self.raw.truncate(self.raw.len() - 1);
        Ok(last)
    }

    /// Insert a byte at `at`, shifting everything after it.
    ///
    /// # Panics
    /// Panics if `at > len`, like [`Vec::insert`].
    pub fn insert(&mut self, at: usize, byte: u8) -> Result<()> {
        assert!(at <= self.raw.len(), "insertion index out of bounds");
        Self::check_len(self.raw.len() + 1)?;
        self.raw.insert(at, byte);
        Ok(())
    }

    /// Remove and return the byte at `at`.
    ///
    /// # Panics
    /// Panics if `at >= len`, like [`Vec::remove`].
    pub fn remove(&mut self, at: usize) -> Result<u8> {
        assert!(at < self.raw.len(), "removal index out of bounds");
        Self::check_len(self.raw.len() - 1)?;
        Ok(self.raw.remove(at))
    }

    /// Append every byte of `other`.
    pub fn extend_from_slice(&mut self, other: &[u8]) -> Result<()> {
        Self::check_len(self.raw.len() + other.len())?;
        self.raw.extend_from_slice(other);
        Ok(())
    }

    /// Overwrite the byte at `at`.
    ///
    /// # Panics
    /// Panics if `at >= len`.
    pub fn set(&mut self, at: usize, byte: u8) {
        self.raw[at] = byte;
    }

    /// The byte at `at`, if in bounds.
    pub fn get(&self, at: usize) -> Option<u8> {
        self.raw.get(at).copied()
    }
}

impl<const MIN: usize, const MAX: usize> Codec for ByteSeq<MIN, MAX> {
    const WIDTH: Option<usize> = if MIN == MAX && MAX != 0 {
        Some(MIN)
    } else {
        None
    };
    const JSON_STRING: bool = true;

    fn encoded_size(&self) -> usize {
        if Self::FIXED {
            self.raw.len()
        } else {
            varint::size(self.raw.len() as u64) + self.raw.len()
        }
    }

    fn encode_into(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let mut written = 0;
        if !Self::FIXED {
            written += varint::encode_into(self.raw.len() as u64, buf, offset)?;
        }
        take_mut(buf, offset + written, self.raw.len())?.copy_from_slice(&self.raw);
        Ok(written + self.raw.len())
    }

    fn decode_from(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (len, mut consumed) = if Self::FIXED {
            (MIN, 0)
        } else {
            let (len, n) = varint::decode_from(buf, offset)?;
            let len = usize::try_from(len)
                .map_err(|_| Error::Malformed("length prefix exceeds the address space".into()))?;
            Self::check_len(len)?;
            (len, n)
        };
        let raw = take(buf, offset + consumed, len)?.to_vec();
        consumed += len;
        Ok((Self { raw }, consumed))
    }

    fn to_json(&self) -> Value {
        Value::String(hex::encode(&self.raw))
    }

    fn from_json(json: &Value) -> Result<Self> {
        Self::from_vec(json_hex(json)?)
    }
}

impl<const MIN: usize, const MAX: usize> Deref for ByteSeq<MIN, MAX> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.raw
    }
}

impl<const MIN: usize, const MAX: usize> AsRef<[u8]> for ByteSeq<MIN, MAX> {
    fn as_ref(&self) -> &[u8] {
        &self.raw
    }
}

impl<const MIN: usize, const MAX: usize> TryFrom<Vec<u8>> for ByteSeq<MIN, MAX> {
    type Error = Error;

    fn try_from(raw: Vec<u8>) -> Result<Self> {
        Self::from_vec(raw)
    }
}

impl<const MIN: usize, const MAX: usize> From<ByteSeq<MIN, MAX>> for Vec<u8> {
    fn from(b: ByteSeq<MIN, MAX>) -> Self {
        b.raw
    }
}

impl FromIterator<u8> for ByteSeq<0, { usize::MAX }> {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self {
            raw: iter.into_iter().collect(),
        }
    }
}

impl<const MIN: usize, const MAX: usize> fmt::Debug for ByteSeq<MIN, MAX> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ByteSeq({})", hex::encode(&self.raw))
    }
}

impl<const MIN: usize, const MAX: usize> fmt::LowerHex for ByteSeq<MIN, MAX> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&hex::encode(&self.raw))
    }
}

impl<const MIN: usize, const MAX: usize> Serialize for ByteSeq<MIN, MAX> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.raw))
    }
}

impl<'de, const MIN: usize, const MAX: usize> Deserialize<'de> for ByteSeq<MIN, MAX> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_json(&Value::String(s)).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VarBytes;

    #[test]
    fn variable_wire_form() {
        let b = VarBytes::from_slice(b"ab").unwrap();
        assert_eq!(b.encode(), [0x02, 0x61, 0x62]);
        assert_eq!(b.encoded_size(), 3);

        let b = VarBytes::from_slice(&[0x00, 0xFF]).unwrap();
        assert_eq!(b.encode(), [0x02, 0x00, 0xFF]);
        let back = VarBytes::decode(&b.encode()).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn fixed_wire_form() {
        let b: [u8; 4] = *b"abcd";
        assert_eq!(b.encode(), *b"abcd");
        assert_eq!(<[u8; 4]>::decode(b"abcdXYZ").unwrap(), *b"abcd");
        assert!(matches!(
            <[u8; 4]>::decode(b"ab"),
            Err(Error::BufferTooSmall { .. })
        ));

        // Pinned bounds drop the prefix too.
        let b = ByteSeq::<4, 4>::from_slice(b"abcd").unwrap();
        assert_eq!(b.encode(), *b"abcd");
        assert_eq!(ByteSeq::<4, 4>::decode(b"abcd").unwrap(), b);
    }

    #[test]
    fn bounds_enforced() {
        assert!(ByteSeq::<2, 4>::from_slice(b"a").is_err());
        assert!(ByteSeq::<2, 4>::from_slice(b"abcde").is_err());

        let mut b = ByteSeq::<2, 4>::from_slice(b"abcd").unwrap();
        assert_eq!(
            b.push(b'e'),
            Err(Error::BadLength {
                len: 5,
                min: 2,
                max: 4
            })
        );
        assert_eq!(b.as_slice(), b"abcd", "failed push must not change the value");

        let mut b = ByteSeq::<2, 4>::from_slice(b"ab").unwrap();
        assert!(b.pop().is_err());
        assert_eq!(b.as_slice(), b"ab");

        // Decoding checks the prefix against the bounds as well.
        assert!(matches!(
            ByteSeq::<2, 4>::decode(&[0x01, 0x61]),
            Err(Error::BadLength { .. })
        ));
    }

    #[test]
    fn mutation() {
        let mut b = VarBytes::default();
        b.push(0x61).unwrap();
        b.extend_from_slice(b"bc").unwrap();
        b.insert(0, 0x5F).unwrap();
        assert_eq!(b.as_slice(), b"_abc");
        assert_eq!(b.remove(0).unwrap(), 0x5F);
        assert_eq!(b.pop().unwrap(), b'c');
        b.set(0, b'z');
        assert_eq!(b.as_slice(), b"zb");
        assert_eq!(b.get(7), None);
    }

    #[test]
    fn json_hex_forms() {
        let b = VarBytes::from_slice(&[0xA0, 0x01]).unwrap();
        assert_eq!(b.to_json(), Value::from("a001"));
        assert_eq!(VarBytes::from_json(&Value::from("a001")).unwrap(), b);
        assert_eq!(VarBytes::from_json(&Value::from("0xA001")).unwrap(), b);

        let f: [u8; 2] = [0xA0, 0x01];
        assert_eq!(f.to_json(), Value::from("a001"));
        assert_eq!(<[u8; 2]>::from_json(&Value::from("a001")).unwrap(), f);
        assert_eq!(
            <[u8; 2]>::from_json(&Value::from("a0")),
            Err(Error::BadLength {
                len: 1,
                min: 2,
                max: 2
            })
        );
    }

    #[test]
    fn serde_mirrors_json_form() {
        let b = VarBytes::from_slice(&[0xBE, 0xEF]).unwrap();
        assert_eq!(serde_json::to_value(&b).unwrap(), Value::from("beef"));
        let back: VarBytes = serde_json::from_value(Value::from("beef")).unwrap();
        assert_eq!(back, b);
    }
}
