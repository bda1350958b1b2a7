//! The simple sums: the null unit value and optional values.
//!
use serde_json::Value;

use crate::codec::{take, take_mut, Codec};
use crate::error::{Error, Result};

// The null value encodes to nothing at all.
impl Codec for () {
    const WIDTH: Option<usize> = Some(0);

    fn encoded_size(&self) -> usize {
        0
    }

    fn encode_into(&self, _buf: &mut [u8], _offset: usize) -> Result<usize> {
        Ok(0)
    }

    fn decode_from(_buf: &[u8], _offset: usize) -> Result<(Self, usize)> {
        Ok(((), 0))
    }

    fn to_json(&self) -> Value {
        Value::Null
    }

    fn from_json(json: &Value) -> Result<Self> {
        if json.is_null() {
            Ok(())
        } else {
            Err(Error::TypeMismatch { expected: "null" })
        }
    }
}

/// An optional value: one discriminator byte (`0` absent, `1` present),
/// followed by the payload when present.
///
/// The JSON form is `null` or the inner form. A present inner value whose own
/// JSON form is `null` (such as `Some(())`) is therefore indistinguishable
/// from absence in JSON; the binary form has no such ambiguity.
impl<T: Codec> Codec for Option<T> {
    fn encoded_size(&self) -> usize {
        match self {
            None => 1,
            Some(v) => 1 + v.encoded_size(),
        }
    }

    fn encode_into(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        match self {
            None => {
                take_mut(buf, offset, 1)?[0] = 0;
                Ok(1)
            }
            Some(v) => {
                take_mut(buf, offset, 1)?[0] = 1;
                Ok(1 + v.encode_into(buf, offset + 1)?)
            }
        }
    }

    fn decode_from(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
        match take(buf, offset, 1)?[0] {
            0 => Ok((None, 1)),
            1 => {
                let (v, n) = T::decode_from(buf, offset + 1)?;
                Ok((Some(v), 1 + n))
            }
            d => Err(Error::Malformed(format!(
                "invalid option discriminator {}",
                d
            ))),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            None => Value::Null,
            Some(v) => v.to_json(),
        }
    }

    fn from_json(json: &Value) -> Result<Self> {
        if json.is_null() {
            Ok(None)
        } else {
            Ok(Some(T::from_json(json)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_empty() {
        assert_eq!(().encode(), [] as [u8; 0]);
        assert_eq!(().encoded_size(), 0);
        assert_eq!(<()>::decode(&[]).unwrap(), ());
        assert_eq!(().to_json(), Value::Null);
        assert!(<()>::from_json(&Value::from(3)).is_err());
    }

    #[test]
    fn option_wire_forms() {
        let absent: Option<u8> = None;
        assert_eq!(absent.encode(), [0x00]);
        let present = Some(7u8);
        assert_eq!(present.encode(), [0x01, 0x07]);
        let present = Some(255u8);
        assert_eq!(present.encode(), [0x01, 0xFF]);

        assert_eq!(Option::<u8>::decode(&[0x00]).unwrap(), None);
        assert_eq!(Option::<u8>::decode(&[0x01, 0xFF]).unwrap(), Some(255));
    }

    #[test]
    fn option_discriminator_is_strict() {
        assert!(matches!(
            Option::<u8>::decode(&[0x02, 0x07]),
            Err(Error::Malformed(_))
        ));
        assert!(matches!(
            Option::<u8>::decode(&[]),
            Err(Error::BufferTooSmall { .. })
        ));
        assert!(matches!(
            Option::<u8>::decode(&[0x01]),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn option_json_forms() {
        assert_eq!(Some(7u8).to_json(), Value::from(7));
        assert_eq!(Option::<u8>::to_json(&None), Value::Null);
        assert_eq!(Option::<u8>::from_json(&Value::Null).unwrap(), None);
        assert_eq!(Option::<u8>::from_json(&Value::from(7)).unwrap(), Some(7));
    }

    #[test]
    fn nested_composition() {
        let v: Option<Vec<String>> = Some(vec!["a".into(), "b".into()]);
        assert_eq!(
            v.encode(),
            [0x01, 0x02, 0x01, 0x61, 0x01, 0x62]
        );
        assert_eq!(Option::<Vec<String>>::decode(&v.encode()).unwrap(), v);
    }
}
