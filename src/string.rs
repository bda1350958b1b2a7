//! UTF-8 text with a varint byte-length prefix.
//!
use serde_json::Value;

use crate::codec::{take, take_mut, Codec};
use crate::error::{Error, Result};
use crate::varint;

impl Codec for String {
    const JSON_STRING: bool = true;

    fn encoded_size(&self) -> usize {
        varint::size(self.len() as u64) + self.len()
    }

    fn encode_into(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let written = varint::encode_into(self.len() as u64, buf, offset)?;
        take_mut(buf, offset + written, self.len())?.copy_from_slice(self.as_bytes());
        Ok(written + self.len())
    }

    fn decode_from(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (len, consumed) = varint::decode_from(buf, offset)?;
        let len = usize::try_from(len)
            .map_err(|_| Error::Malformed("length prefix exceeds the address space".into()))?;
        let raw = take(buf, offset + consumed, len)?;
        let s = std::str::from_utf8(raw)
            .map_err(|e| Error::Malformed(format!("invalid UTF-8: {}", e)))?;
        Ok((s.to_string(), consumed + len))
    }

    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_json(json: &Value) -> Result<Self> {
        json.as_str()
            .map(str::to_string)
            .ok_or(Error::TypeMismatch { expected: "string" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form() {
        let s = String::from("hi");
        assert_eq!(s.encode(), [0x02, 0x68, 0x69]);
        assert_eq!(String::decode(&[0x02, 0x68, 0x69]).unwrap(), "hi");
        assert_eq!(String::from("").encode(), [0x00]);
    }

    #[test]
    fn length_counts_bytes_not_chars() {
        let s = String::from("héllo");
        assert_eq!(s.encoded_size(), 1 + 6);
        assert_eq!(String::decode(&s.encode()).unwrap(), s);
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(matches!(
            String::decode(&[0x02, 0xC3, 0x28]),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn truncated_input() {
        assert!(matches!(
            String::decode(&[0x05, 0x68]),
            Err(Error::BufferTooSmall { .. })
        ));
    }
}
