//! Integer codecs: little-endian fixed-width scalars and the compact [`Uint`].
//!
use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use num_traits::NumCast;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{take, take_mut, Codec};
use crate::error::{Error, Result};
use crate::varint;

/// A fixed-width unsigned integer.
///
/// These are the element types of [`Seq`](crate::Seq) and the types that give
/// dictionaries their fixed-width fast path. Implemented for `u8`, `u16`,
/// `u32` and `u64`; the encoded form is always exactly [`WIDTH`](Self::WIDTH)
/// little-endian bytes.
pub trait FixedInt: Copy + Ord + fmt::Debug {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Widen to `u64` without loss.
    fn to_u64(self) -> u64;

    /// Narrow from `u64`, or `None` if the value doesn't fit.
    fn from_u64(v: u64) -> Option<Self>;

    /// Write exactly [`WIDTH`](Self::WIDTH) little-endian bytes into `out`.
    fn write_le(self, out: &mut [u8]);

    /// Read exactly [`WIDTH`](Self::WIDTH) little-endian bytes from `raw`.
    fn read_le(raw: &[u8]) -> Self;
}

macro_rules! impl_fixed_uint {
    ($t:ty, $w:expr) => {
        impl FixedInt for $t {
            const WIDTH: usize = $w;

            #[inline]
            fn to_u64(self) -> u64 {
                self as u64
            }

            #[inline]
            fn from_u64(v: u64) -> Option<Self> {
                NumCast::from(v)
            }

            #[inline]
            fn write_le(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn read_le(raw: &[u8]) -> Self {
                LittleEndian::read_uint(raw, $w) as $t
            }
        }

        impl Codec for $t {
            const WIDTH: Option<usize> = Some($w);

            fn encoded_size(&self) -> usize {
                $w
            }

            fn encode_into(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
                FixedInt::write_le(*self, take_mut(buf, offset, $w)?);
                Ok($w)
            }

            fn decode_from(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
                Ok((<$t as FixedInt>::read_le(take(buf, offset, $w)?), $w))
            }

            fn to_json(&self) -> Value {
                Value::from(*self)
            }

            fn from_json(json: &Value) -> Result<Self> {
                match json.as_u64() {
                    Some(n) => NumCast::from(n).ok_or(Error::OutOfRange {
                        value: n as i128,
                        width: $w,
                    }),
                    None => match json.as_i64() {
                        Some(n) => Err(Error::OutOfRange {
                            value: n as i128,
                            width: $w,
                        }),
                        None => Err(Error::TypeMismatch {
                            expected: "unsigned integer",
                        }),
                    },
                }
            }
        }
    };
}

impl_fixed_uint!(u8, 1);
impl_fixed_uint!(u16, 2);
impl_fixed_uint!(u32, 4);
impl_fixed_uint!(u64, 8);

// Signed scalars go over the wire biased by 2^(bits−1), which reduces to a
// flip of the sign bit and keeps the byte image order-preserving.
macro_rules! impl_fixed_int {
    ($t:ty, $u:ty, $w:expr) => {
        impl Codec for $t {
            const WIDTH: Option<usize> = Some($w);

            fn encoded_size(&self) -> usize {
                $w
            }

            fn encode_into(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
                let biased = (*self as $u).wrapping_add(1 << ($w * 8 - 1));
                FixedInt::write_le(biased, take_mut(buf, offset, $w)?);
                Ok($w)
            }

            fn decode_from(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
                let biased = <$u as FixedInt>::read_le(take(buf, offset, $w)?);
                Ok((biased.wrapping_sub(1 << ($w * 8 - 1)) as $t, $w))
            }

            fn to_json(&self) -> Value {
                Value::from(*self)
            }

            fn from_json(json: &Value) -> Result<Self> {
                match json.as_i64() {
                    Some(n) => NumCast::from(n).ok_or(Error::OutOfRange {
                        value: n as i128,
                        width: $w,
                    }),
                    None => match json.as_u64() {
                        Some(n) => Err(Error::OutOfRange {
                            value: n as i128,
                            width: $w,
                        }),
                        None => Err(Error::TypeMismatch {
                            expected: "signed integer",
                        }),
                    },
                }
            }
        }
    };
}

impl_fixed_int!(i8, u8, 1);
impl_fixed_int!(i16, u16, 2);
impl_fixed_int!(i32, u32, 4);
impl_fixed_int!(i64, u64, 8);

/// A natural number in `[0, 2⁶⁴ − 1]` carried in the compact varint form.
///
/// Small values take a single byte on the wire; see the [`varint`] module for
/// the exact layout. In JSON a `Uint` is a plain number.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Uint(pub u64);

impl Uint {
    /// The wrapped value.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Uint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

macro_rules! impl_uint_from {
    ($t:ty) => {
        impl From<$t> for Uint {
            fn from(n: $t) -> Self {
                Uint(n as u64)
            }
        }
    };
}

impl_uint_from!(u8);
impl_uint_from!(u16);
impl_uint_from!(u32);
impl_uint_from!(u64);
impl_uint_from!(usize);

impl From<Uint> for u64 {
    fn from(n: Uint) -> Self {
        n.0
    }
}

impl Codec for Uint {
    fn encoded_size(&self) -> usize {
        varint::size(self.0)
    }

    fn encode_into(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        varint::encode_into(self.0, buf, offset)
    }

    fn decode_from(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (v, n) = varint::decode_from(buf, offset)?;
        Ok((Uint(v), n))
    }

    fn to_json(&self) -> Value {
        Value::from(self.0)
    }

    fn from_json(json: &Value) -> Result<Self> {
        json.as_u64().map(Uint).ok_or(Error::TypeMismatch {
            expected: "unsigned integer",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_wire_form() {
        let v: u16 = 0x0102;
        assert_eq!(v.encode(), [0x02, 0x01]);
        assert_eq!(u16::decode(&[0x02, 0x01]).unwrap(), 258);
    }

    #[test]
    fn unsigned_round_trips() {
        for s in 0..64 {
            let v = 1u64 << s;
            assert_eq!(u64::decode(&v.encode()).unwrap(), v);
            if let Some(v) = u32::from_u64(v) {
                assert_eq!(u32::decode(&v.encode()).unwrap(), v);
            }
            if let Some(v) = u16::from_u64(v) {
                assert_eq!(u16::decode(&v.encode()).unwrap(), v);
            }
        }
    }

    #[test]
    fn signed_bias() {
        assert_eq!((-128i8).encode(), [0x00]);
        assert_eq!((-1i8).encode(), [0x7F]);
        assert_eq!(0i8.encode(), [0x80]);
        assert_eq!(127i8.encode(), [0xFF]);
        assert_eq!((-1i16).encode(), [0xFF, 0x7F]);
        assert_eq!(i64::MIN.encode(), [0, 0, 0, 0, 0, 0, 0, 0]);

        for v in [i32::MIN, -70000, -1, 0, 1, 70000, i32::MAX] {
            assert_eq!(i32::decode(&v.encode()).unwrap(), v);
        }
    }

    #[test]
    fn biased_bytes_preserve_order() {
        let mut last: Option<Vec<u8>> = None;
        for v in [i16::MIN, -300, -1, 0, 1, 300, i16::MAX] {
            let enc = {
                let mut e = v.encode();
                e.reverse(); // big-endian image for lexicographic comparison
                e
            };
            if let Some(prev) = &last {
                assert!(prev < &enc, "encodings should sort like the values");
            }
            last = Some(enc);
        }
    }

    #[test]
    fn json_numbers() {
        assert_eq!(77u8.to_json(), Value::from(77));
        assert_eq!(u8::from_json(&Value::from(77)).unwrap(), 77);
        assert_eq!(
            u8::from_json(&Value::from(300)),
            Err(Error::OutOfRange {
                value: 300,
                width: 1
            })
        );
        assert_eq!(
            u8::from_json(&Value::from(-1)),
            Err(Error::OutOfRange {
                value: -1,
                width: 1
            })
        );
        assert_eq!(
            i8::from_json(&Value::from(-128)).unwrap(),
            -128,
        );
        assert_eq!(
            i8::from_json(&Value::from("nope")),
            Err(Error::TypeMismatch {
                expected: "signed integer"
            })
        );
        assert_eq!(u64::from_json(&Value::from(u64::MAX)).unwrap(), u64::MAX);
    }

    #[test]
    fn uint_wire_and_json() {
        assert_eq!(Uint(0).encode(), [0x00]);
        assert_eq!(Uint(128).encode(), [0x80, 0x80]);
        assert_eq!(Uint::decode(&[0x80, 0x80]).unwrap(), Uint(128));
        assert_eq!(Uint(1 << 60).encoded_size(), 9);
        assert_eq!(Uint::from_json(&Value::from(u64::MAX)).unwrap().get(), u64::MAX);
        let json = serde_json::to_value(Uint(12)).unwrap();
        assert_eq!(json, Value::from(12));
    }

    #[test]
    fn truncated_scalar() {
        assert!(matches!(
            u32::decode(&[0x01, 0x02]),
            Err(Error::BufferTooSmall { .. })
        ));
        let mut buf = [0u8; 3];
        assert!(matches!(
            0x01020304u32.encode_into(&mut buf, 0),
            Err(Error::BufferTooSmall { .. })
        ));
    }
}
