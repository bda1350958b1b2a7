//! Homogeneous sequences: packed fixed-width integer vectors and the general
//! per-element sequence.
//!
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::codec::{take, take_mut, Codec};
use crate::error::{Error, Result};
use crate::int::FixedInt;
use crate::varint;

/// An ordered sequence of fixed-width unsigned integers with length bounds.
///
/// Elements are stored pre-packed little-endian in one contiguous byte
/// buffer, `len · WIDTH` bytes in all, so the wire payload is a single copy
/// in both directions regardless of host byte order. Capacity grows
/// geometrically through the backing vector.
///
/// On the wire a varint *element count* prefix precedes the payload, unless
/// the bounds pin the length to a single nonzero value. See [`VarSeq`] and
/// [`FixedSeq`] for the common instantiations.
#[derive(Clone, PartialEq, Eq)]
pub struct Seq<T: FixedInt, const MIN: usize, const MAX: usize> {
    // Invariant: raw.len() is a multiple of T::WIDTH.
    raw: Vec<u8>,
    elem: PhantomData<T>,
}

impl<T: FixedInt, const MAX: usize> Default for Seq<T, 0, MAX> {
    fn default() -> Self {
        Self {
            raw: Vec::new(),
            elem: PhantomData,
        }
    }
}

/// Integer sequence with no length bounds.
pub type VarSeq<T> = Seq<T, 0, { usize::MAX }>;

/// Integer sequence pinned to exactly `N` elements; no prefix on the wire.
pub type FixedSeq<T, const N: usize> = Seq<T, N, N>;

impl<T: FixedInt, const MIN: usize, const MAX: usize> Seq<T, MIN, MAX> {
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

    /// Build from a slice of elements, checking the length bounds.
    pub fn from_slice(elems: &[T]) -> Result<Self> {
        Self::check_len(elems.len())?;
        let mut raw = vec![0u8; elems.len() * T::WIDTH];
        for (chunk, &v) in raw.chunks_exact_mut(T::WIDTH).zip(elems) {
            v.write_le(chunk);
        }
        Ok(Self {
            raw,
            elem: PhantomData,
        })
    }

    /// Build from wide integers, rejecting any that overflow the element
    /// width before anything is stored.
    pub fn try_from_u64s<I: IntoIterator<Item = u64>>(values: I) -> Result<Self> {
        let mut out = Vec::new();
        for v in values {
            out.push(T::from_u64(v).ok_or(Error::OutOfRange {
                value: v as i128,
                width: T::WIDTH,
            })?);
        }
        Self::from_slice(&out)
    }

    /// Number of elements held.
    pub fn len(&self) -> usize {
        self.raw.len() / T::WIDTH
    }

    /// True if no elements are held.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The element at `at`, if in bounds.
    pub fn get(&self, at: usize) -> Option<T> {
        if at >= self.len() {
            return None;
        }
        Some(T::read_le(&self.raw[at * T::WIDTH..(at + 1) * T::WIDTH]))
    }

    /// Overwrite the element at `at`.
    ///
    /// # Panics
    /// Panics if `at >= len`.
    pub fn set(&mut self, at: usize, value: T) {
        assert!(at < self.len(), "element index out of bounds");
        value.write_le(&mut self.raw[at * T::WIDTH..(at + 1) * T::WIDTH]);
    }

    /// Append one element.
    pub fn push(&mut self, value: T) -> Result<()> {
        Self::check_len(self.len() + 1)?;
        let at = self.raw.len();
        self.raw.resize(at + T::WIDTH, 0);
        value.write_le(&mut self.raw[at..]);
        Ok(())
    }

    /// Append a wide integer, rejecting it if it overflows the element width.
    pub fn try_push_u64(&mut self, value: u64) -> Result<()> {
        let value = T::from_u64(value).ok_or(Error::OutOfRange {
            value: value as i128,
            width: T::WIDTH,
        })?;
        self.push(value)
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Result<T> {
        let len = self.len();
        if len == 0 {
            return Err(Error::BadLength {
                len: 0,
                min: 1,
                max: MAX,
            });
        }
        Self::check_len(len - 1)?;
        let value = T::read_le(&self.raw[(len - 1) * T::WIDTH..]);
        self.raw.truncate((len - 1) * T::WIDTH);
        Ok(value)
    }

    /// Insert an element at `at`, shifting everything after it.
    ///
    /// # Panics
    /// Panics if `at > len`.
    pub fn insert(&mut self, at: usize, value: T) -> Result<()> {
        let len = self.len();
        assert!(at <= len, "insertion index out of bounds");
        Self::check_len(len + 1)?;
        let pos = at * T::WIDTH;
        let end = self.raw.len();
        self.raw.resize(end + T::WIDTH, 0);
        self.raw.copy_within(pos..end, pos + T::WIDTH);
        value.write_le(&mut self.raw[pos..pos + T::WIDTH]);
        Ok(())
    }

    /// Remove and return the element at `at`.
    ///
    /// # Panics
    /// Panics if `at >= len`.
    pub fn remove(&mut self, at: usize) -> Result<T> {
        let len = self.len();
        assert!(at < len, "removal index out of bounds");
        Self::check_len(len - 1)?;
        let pos = at * T::WIDTH;
        let value = T::read_le(&self.raw[pos..pos + T::WIDTH]);
        self.raw.copy_within(pos + T::WIDTH.., pos);
        self.raw.truncate(self.raw.len() - T::WIDTH);
        Ok(value)
    }

    /// Append every element of `other`.
    pub fn extend_from_slice(&mut self, other: &[T]) -> Result<()> {
        Self::check_len(self.len() + other.len())?;
        let at = self.raw.len();
        self.raw.resize(at + other.len() * T::WIDTH, 0);
        for (chunk, &v) in self.raw[at..].chunks_exact_mut(T::WIDTH).zip(other) {
            v.write_le(chunk);
        }
        Ok(())
    }

    /// Iterate the elements in order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.raw.chunks_exact(T::WIDTH).map(T::read_le)
    }

    /// Collect the elements into a plain vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    fn parse_elem(json: &Value) -> Result<T> {
        match json.as_u64() {
            Some(n) => T::from_u64(n).ok_or(Error::OutOfRange {
                value: n as i128,
                width: T::WIDTH,
            }),
            None => match json.as_i64() {
                Some(n) => Err(Error::OutOfRange {
                    value: n as i128,
                    width: T::WIDTH,
                }),
                None => Err(Error::TypeMismatch {
                    expected: "unsigned integer",
                }),
            },
        }
    }
}

impl<T: FixedInt, const MIN: usize, const MAX: usize> Codec for Seq<T, MIN, MAX> {
    const WIDTH: Option<usize> = if MIN == MAX && MAX != 0 {
        Some(MAX * T::WIDTH)
    } else {
        None
    };

    fn encoded_size(&self) -> usize {
        if Self::FIXED {
            self.raw.len()
        } else {
            varint::size(self.len() as u64) + self.raw.len()
        }
    }

    fn encode_into(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let mut written = 0;
        if !Self::FIXED {
            written += varint::encode_into(self.len() as u64, buf, offset)?;
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
        let body = len
            .checked_mul(T::WIDTH)
            .ok_or_else(|| Error::Malformed("length prefix exceeds the address space".into()))?;
        let raw = take(buf, offset + consumed, body)?.to_vec();
        consumed += body;
        Ok((
            Self {
                raw,
                elem: PhantomData,
            },
            consumed,
        ))
    }

    fn to_json(&self) -> Value {
        Value::Array(self.iter().map(|v| Value::from(v.to_u64())).collect())
    }

    fn from_json(json: &Value) -> Result<Self> {
        let arr = json.as_array().ok_or(Error::TypeMismatch {
            expected: "array",
        })?;
        let mut elems = Vec::with_capacity(arr.len());
        for v in arr {
            elems.push(Self::parse_elem(v)?);
        }
        Self::from_slice(&elems)
    }
}

impl<T: FixedInt> FromIterator<T> for VarSeq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut raw = Vec::new();
        for v in iter {
            let at = raw.len();
            raw.resize(at + T::WIDTH, 0);
            v.write_le(&mut raw[at..]);
        }
        Self {
            raw,
            elem: PhantomData,
        }
    }
}

impl<T: FixedInt, const MIN: usize, const MAX: usize> fmt::Debug for Seq<T, MIN, MAX> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: FixedInt, const MIN: usize, const MAX: usize> Serialize for Seq<T, MIN, MAX> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|v| v.to_u64()))
    }
}

impl<'de, T: FixedInt, const MIN: usize, const MAX: usize> Deserialize<'de>
    for Seq<T, MIN, MAX>
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<u64>::deserialize(deserializer)?;
        Self::try_from_u64s(values).map_err(serde::de::Error::custom)
    }
}

// The general homogeneous sequence: any codable element, one codec call per
// element. A varint element count always precedes the payload.
impl<T: Codec> Codec for Vec<T> {
    fn encoded_size(&self) -> usize {
        let body: usize = match T::WIDTH {
            Some(w) => self.len() * w,
            None => self.iter().map(Codec::encoded_size).sum(),
        };
        varint::size(self.len() as u64) + body
    }

    fn encode_into(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let mut written = varint::encode_into(self.len() as u64, buf, offset)?;
        for v in self {
            written += v.encode_into(buf, offset + written)?;
        }
        Ok(written)
    }

    fn decode_from(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (len, mut consumed) = varint::decode_from(buf, offset)?;
        let len = usize::try_from(len)
            .map_err(|_| Error::Malformed("length prefix exceeds the address space".into()))?;
        let mut out = Vec::new();
        for _ in 0..len {
            let (v, n) = T::decode_from(buf, offset + consumed)?;
            consumed += n;
            out.push(v);
        }
        Ok((out, consumed))
    }

    fn to_json(&self) -> Value {
        Value::Array(self.iter().map(Codec::to_json).collect())
    }

    fn from_json(json: &Value) -> Result<Self> {
        let arr = json.as_array().ok_or(Error::TypeMismatch {
            expected: "array",
        })?;
        arr.iter().map(T::from_json).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_forms() {
        let v = VarSeq::<u16>::from_slice(&[1, 0x0102]).unwrap();
        assert_eq!(v.encode(), [0x02, 0x01, 0x00, 0x02, 0x01]);
        assert_eq!(VarSeq::<u16>::decode(&v.encode()).unwrap(), v);

        let v = FixedSeq::<u8, 3>::from_slice(&[7, 8, 9]).unwrap();
        assert_eq!(v.encode(), [0x07, 0x08, 0x09]);
        assert_eq!(FixedSeq::<u8, 3>::decode(&[0x07, 0x08, 0x09]).unwrap(), v);

        assert_eq!(VarSeq::<u64>::from_slice(&[]).unwrap().encode(), [0x00]);
    }

    #[test]
    fn element_width_enforced() {
        let mut v = VarSeq::<u16>::from_slice(&[1]).unwrap();
        assert_eq!(
            v.try_push_u64(70000),
            Err(Error::OutOfRange {
                value: 70000,
                width: 2
            })
        );
        assert_eq!(v.len(), 1, "failed push must not change the value");
        v.try_push_u64(65535).unwrap();
        assert_eq!(v.get(1), Some(65535));

        assert!(VarSeq::<u8>::try_from_u64s([1, 2, 256]).is_err());
    }

    #[test]
    fn length_bounds() {
        assert!(Seq::<u8, 2, 3>::from_slice(&[1]).is_err());
        let mut v = Seq::<u8, 2, 3>::from_slice(&[1, 2, 3]).unwrap();
        assert_eq!(
            v.push(4),
            Err(Error::BadLength {
                len: 4,
                min: 2,
                max: 3
            })
        );
        v.pop().unwrap();
        assert!(v.pop().is_err());

        assert!(matches!(
            Seq::<u8, 2, 3>::decode(&[0x04, 1, 2, 3, 4]),
            Err(Error::BadLength { .. })
        ));
    }

    #[test]
    fn mutation() {
        let mut v = VarSeq::<u32>::default();
        v.push(10).unwrap();
        v.extend_from_slice(&[20, 30]).unwrap();
        v.insert(1, 15).unwrap();
        assert_eq!(v.to_vec(), [10, 15, 20, 30]);
        assert_eq!(v.remove(1).unwrap(), 15);
        assert_eq!(v.pop().unwrap(), 30);
        v.set(0, 11);
        assert_eq!(v.to_vec(), [11, 20]);
        assert_eq!(v.get(5), None);
    }

    #[test]
    fn round_trips() {
        let v: VarSeq<u64> = (0..50u64).map(|i| i.wrapping_mul(0x9E3779B97F4A7C15)).collect();
        let enc = v.encode();
        assert_eq!(enc.len(), v.encoded_size());
        let (back, used) = VarSeq::<u64>::decode_from(&enc, 0).unwrap();
        assert_eq!(back, v);
        assert_eq!(used, enc.len());
    }

    #[test]
    fn json_forms() {
        let v = VarSeq::<u16>::from_slice(&[5, 10]).unwrap();
        assert_eq!(v.to_json(), serde_json::json!([5, 10]));
        assert_eq!(VarSeq::<u16>::from_json(&serde_json::json!([5, 10])).unwrap(), v);
        assert_eq!(
            VarSeq::<u16>::from_json(&serde_json::json!([70000])),
            Err(Error::OutOfRange {
                value: 70000,
                width: 2
            })
        );
        assert_eq!(
            VarSeq::<u16>::from_json(&serde_json::json!("nope")),
            Err(Error::TypeMismatch { expected: "array" })
        );
    }

    #[test]
    fn truncated_input() {
        assert!(matches!(
            VarSeq::<u32>::decode(&[0x02, 0x01, 0x00]),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn general_sequences() {
        let v = vec![String::from("a"), String::from("bc")];
        assert_eq!(v.encode(), [0x02, 0x01, 0x61, 0x02, 0x62, 0x63]);
        assert_eq!(Vec::<String>::decode(&v.encode()).unwrap(), v);
        assert_eq!(v.to_json(), serde_json::json!(["a", "bc"]));

        let v = vec![Some(3u8), None];
        assert_eq!(v.encode(), [0x02, 0x01, 0x03, 0x00]);
        assert_eq!(Vec::<Option<u8>>::decode(&v.encode()).unwrap(), v);
    }
}
