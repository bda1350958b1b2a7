//! Packed boolean sequences with a selectable on-wire bit order.
//!
use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::codec::{json_hex, take, take_mut, Codec};
use crate::error::{Error, Result};
use crate::varint;

/// On-wire placement of each group of eight logical bits within its byte.
///
/// The backing storage is always packed least-significant-bit first; the
/// order only changes how bytes look on the wire (and in the hex JSON form).
pub trait BitOrder {
    /// True when logical bit 0 of a byte group lands in bit position 7.
    const MSB_FIRST: bool;
}

/// Logical bit 0 of each byte group at the least significant position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lsb0 {}

/// Logical bit 0 of each byte group at the most significant position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Msb0 {}

impl BitOrder for Lsb0 {
    const MSB_FIRST: bool = false;
}

impl BitOrder for Msb0 {
    const MSB_FIRST: bool = true;
}

/// An ordered sequence of booleans with packed storage and length bounds.
///
/// Logical bit `8b + i` lives in byte `b` of the backing store at position
/// `i`; the [`BitOrder`] parameter decides whether that byte is emitted as-is
/// (`Lsb0`) or bit-reversed (`Msb0`). Unused positions in the final byte are
/// kept at zero, and decoding rejects payloads that violate that.
///
/// On the wire a varint *bit count* prefix precedes the packed bytes, unless
/// the bounds pin the length to a single nonzero value, in which case only
/// the `⌈N/8⌉` packed bytes appear. See [`BitSeq`] and [`BitArray`] for the
/// common instantiations.
///
/// The JSON form is the lowercase hex of the full wire image, so a length
/// that isn't a multiple of eight survives the round trip.
#[derive(Clone, PartialEq, Eq)]
pub struct Bits<O: BitOrder, const MIN: usize, const MAX: usize> {
    len: usize,
    // Invariant: raw.len() == (len + 7) / 8, bits at positions >= len are 0.
    raw: Vec<u8>,
    order: PhantomData<O>,
}

/// Bit sequence with no length bounds.
pub type BitSeq<O> = Bits<O, 0, { usize::MAX }>;

/// Bit sequence pinned to exactly `N` bits; no length prefix on the wire.
pub type BitArray<O, const N: usize> = Bits<O, N, N>;

fn pack(bits: impl Iterator<Item = bool>) -> (usize, Vec<u8>) {
    let mut len = 0;
    let mut raw = Vec::new();
    for bit in bits {
        if len % 8 == 0 {
            raw.push(0);
        }
        if bit {
            raw[len / 8] |= 1 << (len % 8);
        }
        len += 1;
    }
    (len, raw)
}

impl<O: BitOrder, const MIN: usize, const MAX: usize> Bits<O, MIN, MAX> {
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

    /// Build from a slice of booleans, checking the length bounds.
    pub fn from_bools(bits: &[bool]) -> Result<Self> {
        Self::check_len(bits.len())?;
        let (len, raw) = pack(bits.iter().copied());
        Ok(Self {
            len,
            raw,
            order: PhantomData,
        })
    }

    /// A sequence of `len` copies of `bit`.
    pub fn repeat(bit: bool, len: usize) -> Result<Self> {
        Self::check_len(len)?;
        let (len, raw) = pack(std::iter::repeat(bit).take(len));
        Ok(Self {
            len,
            raw,
            order: PhantomData,
        })
    }

    /// Number of bits held.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no bits are held.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The bit at `at`, if in bounds.
    pub fn get(&self, at: usize) -> Option<bool> {
        if at >= self.len {
            return None;
        }
        Some(self.raw[at / 8] >> (at % 8) & 1 == 1)
    }

    /// Overwrite the bit at `at`.
    ///
    /// # Panics
    /// Panics if `at >= len`.
    pub fn set(&mut self, at: usize, bit: bool) {
        assert!(at < self.len, "bit index out of bounds");
        if bit {
            self.raw[at / 8] |= 1 << (at % 8);
        } else {
            self.raw[at / 8] &= !(1 << (at % 8));
        }
    }

    fn push_raw(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.raw.push(0);
        }
        if bit {
            self.raw[self.len / 8] |= 1 << (self.len % 8);
        }
        self.len += 1;
    }

    /// Append one bit.
    pub fn push(&mut self, bit: bool) -> Result<()> {
        Self::check_len(self.len + 1)?;
        self.push_raw(bit);
        Ok(())
    }

    /// Remove and return the last bit.
    pub fn pop(&mut self) -> Result<bool> {
        if self.len == 0 {
            return Err(Error::BadLength {
                len: 0,
                min: 1,
                max: MAX,
            });
        }
        Self::check_len(self.len - 1)?;
        let at = self.len - 1;
        let bit = self.raw[at / 8] >> (at % 8) & 1 == 1;
        self.raw[at / 8] &= !(1 << (at % 8));
        self.len -= 1;
        self.raw.truncate((self.len + 7) / 8);
        Ok(bit)
    }

    /// Insert a bit at `at`, shifting everything at and after it up.
    ///
    /// # Panics
    /// Panics if `at > len`.
    pub fn insert(&mut self, at: usize, bit: bool) -> Result<()> {
        assert!(at <= self.len, "insertion index out of bounds");
        Self::check_len(self.len + 1)?;
        if self.len % 8 == 0 {
            self.raw.push(0);
        }
        let first = at / 8;
        let low_mask = (1u8 << (at % 8)) - 1;
        let b = self.raw[first];
        let mut carry = b >> 7;
        self.raw[first] = (b & low_mask) | ((bit as u8) << (at % 8)) | ((b & !low_mask) << 1);
        for b in self.raw[first + 1..].iter_mut() {
            let next = *b >> 7;
            *b = (*b << 1) | carry;
            carry = next;
        }
        self.len += 1;
        Ok(())
    }

    /// Remove and return the bit at `at`, shifting everything after it down.
    ///
    /// # Panics
    /// Panics if `at >= len`.
    pub fn remove(&mut self, at: usize) -> Result<bool> {
        assert!(at < self.len, "removal index out of bounds");
        Self::check_len(self.len - 1)?;
        let bit = self.raw[at / 8] >> (at % 8) & 1 == 1;
        let first = at / 8;
        let mut carry = 0u8;
        for idx in (first + 1..self.raw.len()).rev() {
            let b = self.raw[idx];
            self.raw[idx] = (b >> 1) | (carry << 7);
            carry = b & 1;
        }
        let b = self.raw[first];
        let low_mask = (1u8 << (at % 8)) - 1;
        self.raw[first] = (b & low_mask) | ((b >> 1) & !low_mask) | (carry << 7);
        self.len -= 1;
        self.raw.truncate((self.len + 7) / 8);
        Ok(bit)
    }

    /// Append every bit the iterator yields.
    pub fn extend<I>(&mut self, bits: I) -> Result<()>
    where
        I: IntoIterator<Item = bool>,
        I::IntoIter: ExactSizeIterator,
    {
        let bits = bits.into_iter();
        Self::check_len(self.len + bits.len())?;
        for bit in bits {
            self.push_raw(bit);
        }
        Ok(())
    }

    /// Iterate the bits in logical order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.raw[i / 8] >> (i % 8) & 1 == 1)
    }

    /// Copy a sub-range out into an unbounded sequence.
    ///
    /// # Panics
    /// Panics if the range falls outside `0..len`.
    pub fn slice(&self, range: Range<usize>) -> BitSeq<O> {
        assert!(
            range.start <= range.end && range.end <= self.len,
            "slice range out of bounds"
        );
        let (len, raw) = pack(range.map(|i| self.raw[i / 8] >> (i % 8) & 1 == 1));
        Bits {
            len,
            raw,
            order: PhantomData,
        }
    }

    /// Overwrite a run of bits starting at `start`. The length is unchanged.
    ///
    /// # Panics
    /// Panics if `start + bits.len() > len`.
    pub fn set_slice(&mut self, start: usize, bits: &[bool]) {
        assert!(
            bits.len() <= self.len && start <= self.len - bits.len(),
            "slice range out of bounds"
        );
        for (i, &bit) in bits.iter().enumerate() {
            self.set(start + i, bit);
        }
    }
}

impl<O: BitOrder, const MAX: usize> Default for Bits<O, 0, MAX> {
    fn default() -> Self {
        Self {
            len: 0,
            raw: Vec::new(),
            order: PhantomData,
        }
    }
}

impl<O: BitOrder> FromIterator<bool> for BitSeq<O> {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let (len, raw) = pack(iter.into_iter());
        Self {
            len,
            raw,
            order: PhantomData,
        }
    }
}

impl<O: BitOrder, const MIN: usize, const MAX: usize> Codec for Bits<O, MIN, MAX> {
    const WIDTH: Option<usize> = if MIN == MAX && MAX != 0 {
        Some((MAX + 7) / 8)
    } else {
        None
    };
    const JSON_STRING: bool = true;

    fn encoded_size(&self) -> usize {
        let body = (self.len + 7) / 8;
        if Self::FIXED {
            body
        } else {
            varint::size(self.len as u64) + body
        }
    }

    fn encode_into(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let mut written = 0;
        if !Self::FIXED {
            written += varint::encode_into(self.len as u64, buf, offset)?;
        }
        let out = take_mut(buf, offset + written, self.raw.len())?;
        if O::MSB_FIRST {
            for (o, b) in out.iter_mut().zip(&self.raw) {
                *o = b.reverse_bits();
            }
        } else {
            out.copy_from_slice(&self.raw);
        }
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
        let body = (len + 7) / 8;
        let wire = take(buf, offset + consumed, body)?;
        consumed += body;
        let raw: Vec<u8> = if O::MSB_FIRST {
            wire.iter().map(|b| b.reverse_bits()).collect()
        } else {
            wire.to_vec()
        };
        if len % 8 != 0 {
            if let Some(&last) = raw.last() {
                if last >> (len % 8) != 0 {
                    return Err(Error::Malformed(
                        "bit padding positions must be zero".into(),
                    ));
                }
            }
        }
        Ok((
            Self {
                len,
                raw,
                order: PhantomData,
            },
            consumed,
        ))
    }

    fn to_json(&self) -> Value {
        Value::String(hex::encode(self.encode()))
    }

    fn from_json(json: &Value) -> Result<Self> {
        let raw = json_hex(json)?;
        let (v, n) = Self::decode_from(&raw, 0)?;
        if n != raw.len() {
            return Err(Error::Malformed("trailing bytes after bit sequence".into()));
        }
        Ok(v)
    }
}

impl<O: BitOrder, const MIN: usize, const MAX: usize> fmt::Debug for Bits<O, MIN, MAX> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Bits[")?;
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        f.write_str("]")
    }
}

impl<O: BitOrder, const MIN: usize, const MAX: usize> Serialize for Bits<O, MIN, MAX> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.encode()))
    }
}

impl<'de, O: BitOrder, const MIN: usize, const MAX: usize> Deserialize<'de>
    for Bits<O, MIN, MAX>
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_json(&Value::String(s)).map_err(serde::de::Error::custom)
    }
}
