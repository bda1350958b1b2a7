//! The shared encode/decode contract every tidepack type implements.
//!
use serde_json::Value;

use crate::error::{Error, Result};

/// The uniform codec contract.
///
/// Every tidepack value type implements this trait, and composite types
/// (options, choices, sequences, dictionaries, records) recursively invoke the
/// implementations of their element types. The wire format is deterministic:
/// for a given value there is exactly one encoding, independent of host byte
/// order or map insertion order.
///
/// The buffer-level operations follow one discipline:
///
/// - [`encoded_size`](Codec::encoded_size) reports the exact byte length of
///   the encoding.
/// - [`encode_into`](Codec::encode_into) writes at an offset into a caller
///   buffer and never allocates.
/// - [`encode`](Codec::encode) performs exactly one allocation, sized by
///   `encoded_size`.
/// - [`decode_from`](Codec::decode_from) parses at an offset and reports the
///   bytes consumed; no reference into the input buffer is retained.
pub trait Codec: Sized {
    /// The fixed encoded width in bytes, if every value of this type encodes
    /// to the same length. `None` for types whose encoding length depends on
    /// the value.
    const WIDTH: Option<usize> = None;

    /// True if [`to_json`](Codec::to_json) always yields a JSON string, which
    /// makes values of this type usable as JSON object keys.
    const JSON_STRING: bool = false;

    /// Exact length in bytes of this value's encoding.
    fn encoded_size(&self) -> usize;

    /// Serialize into `buf` starting at `offset`, returning the number of
    /// bytes written. Fails with [`Error::BufferTooSmall`] if the buffer
    /// can't hold the encoding; the buffer may then hold a partial image.
    fn encode_into(&self, buf: &mut [u8], offset: usize) -> Result<usize>;

    /// Parse a value from `buf` starting at `offset`, returning it together
    /// with the number of bytes consumed.
    fn decode_from(buf: &[u8], offset: usize) -> Result<(Self, usize)>;

    /// Serialize into a freshly allocated, exactly-sized byte vector.
    fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.encoded_size()];
        let written = self
            .encode_into(&mut buf, 0)
            .expect("a buffer sized with encoded_size holds the encoding");
        debug_assert_eq!(written, buf.len());
        buf
    }

    /// Parse a value from the start of `buf`. Trailing bytes are ignored.
    fn decode(buf: &[u8]) -> Result<Self> {
        Self::decode_from(buf, 0).map(|(v, _)| v)
    }

    /// The JSON form of this value. Integers stay numbers, bytes and bits
    /// become lowercase hex strings, options become `null` or the inner form,
    /// choices become `{"tag": ..., "value": ...}` objects, records become
    /// objects keyed by field name.
    fn to_json(&self) -> Value;

    /// Rebuild a value from its JSON form.
    fn from_json(json: &Value) -> Result<Self>;
}

/// Borrow `needed` bytes of `buf` at `offset`, or report how short it ran.
pub(crate) fn take(buf: &[u8], offset: usize, needed: usize) -> Result<&[u8]> {
    match buf.get(offset..).and_then(|b| b.get(..needed)) {
        Some(b) => Ok(b),
        None => Err(Error::BufferTooSmall {
            needed,
            available: buf.len().saturating_sub(offset),
        }),
    }
}

/// Mutable counterpart of [`take`].
pub(crate) fn take_mut(buf: &mut [u8], offset: usize, needed: usize) -> Result<&mut [u8]> {
    let available = buf.len().saturating_sub(offset);
    match buf.get_mut(offset..).and_then(|b| b.get_mut(..needed)) {
        Some(b) => Ok(b),
        None => Err(Error::BufferTooSmall { needed, available }),
    }
}

/// Option-aware width sum, used to fold per-field widths into a record width.
pub const fn sum_width(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        _ => None,
    }
}

/// Decode the hex-string JSON form shared by byte and bit containers. A
/// leading `0x`/`0X` is tolerated on input but never produced on output.
pub(crate) fn json_hex(json: &Value) -> Result<Vec<u8>> {
    let s = json.as_str().ok_or(Error::TypeMismatch {
        expected: "hex string",
    })?;
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(s).map_err(|e| Error::Malformed(format!("bad hex string: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_reports_shortfall() {
        let buf = [0u8; 4];
        assert_eq!(take(&buf, 0, 4).unwrap().len(), 4);
        assert_eq!(
            take(&buf, 2, 4),
            Err(Error::BufferTooSmall {
                needed: 4,
                available: 2
            })
        );
        // Offsets past the end aren't a panic, just an empty remainder.
        assert_eq!(
            take(&buf, 9, 1),
            Err(Error::BufferTooSmall {
                needed: 1,
                available: 0
            })
        );
    }

    #[test]
    fn hex_tolerates_prefix() {
        assert_eq!(json_hex(&Value::from("0xa0ff")).unwrap(), vec![0xA0, 0xFF]);
        assert_eq!(json_hex(&Value::from("a0ff")).unwrap(), vec![0xA0, 0xFF]);
        assert!(json_hex(&Value::from("a0f")).is_err());
        assert!(json_hex(&Value::from(12)).is_err());
    }

    #[test]
    fn width_folding() {
        assert_eq!(sum_width(Some(1), Some(2)), Some(3));
        assert_eq!(sum_width(Some(1), None), None);
        assert_eq!(sum_width(None, Some(2)), None);
    }
}
