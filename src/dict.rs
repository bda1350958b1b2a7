//! Deterministic sorted-key dictionaries.
//!
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::varint;

/// A finite mapping with unique keys and a deterministic wire form.
///
/// On the wire: a varint entry count, then each key followed by its value,
/// with the keys in ascending order. The backing store is a [`BTreeMap`], so
/// the sorted walk falls out of iteration and the encoding depends only on
/// the (key, value) set, never on insertion order. Decoding does not require
/// the input to be sorted, but duplicate keys are rejected.
///
/// When both the key and value types have a fixed width the encoded size is
/// computed without walking the entries, and the encode loop compiles down to
/// fixed-width stores; the same holds for string keys with fixed-width
/// values once the key lengths are summed.
///
/// The JSON form is an object when the key type's JSON form is a string
/// (strings, bytes, bits); otherwise it is a list of
/// `{"key": ..., "value": ...}` records.
#[derive(Clone, PartialEq, Eq)]
pub struct Dict<K: Ord, V> {
    map: BTreeMap<K, V>,
}

impl<K: Ord, V> Dict<K, V> {
    /// An empty dictionary.
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if no entries are held.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Insert an entry, returning the value previously under that key.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    /// Remove the entry under `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.map.remove(key)
    }

    /// The value under `key`, if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    /// True if an entry exists under `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Iterate entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter()
    }

    /// Iterate keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }

    /// Iterate values in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.map.values()
    }
}

impl<K: Ord, V> Default for Dict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> From<BTreeMap<K, V>> for Dict<K, V> {
    fn from(map: BTreeMap<K, V>) -> Self {
        Self { map }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for Dict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

impl<K: Ord, V> IntoIterator for Dict<K, V> {
    type Item = (K, V);
    type IntoIter = std::collections::btree_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

impl<K: Codec + Ord, V: Codec> Codec for Dict<K, V> {
    fn encoded_size(&self) -> usize {
        let prefix = varint::size(self.map.len() as u64);
        let body = match (K::WIDTH, V::WIDTH) {
            // Every entry has the same size; skip the walk.
            (Some(kw), Some(vw)) => self.map.len() * (kw + vw),
            (None, Some(vw)) => {
                self.map.len() * vw + self.map.keys().map(Codec::encoded_size).sum::<usize>()
            }
            _ => self
                .map
                .iter()
                .map(|(k, v)| k.encoded_size() + v.encoded_size())
                .sum(),
        };
        prefix + body
    }

    fn encode_into(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let mut written = varint::encode_into(self.map.len() as u64, buf, offset)?;
        for (k, v) in &self.map {
            written += k.encode_into(buf, offset + written)?;
            written += v.encode_into(buf, offset + written)?;
        }
        Ok(written)
    }

    fn decode_from(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (len, mut consumed) = varint::decode_from(buf, offset)?;
        let len = usize::try_from(len)
            .map_err(|_| Error::Malformed("length prefix exceeds the address space".into()))?;
        let mut map = BTreeMap::new();
        for _ in 0..len {
            let (k, n) = K::decode_from(buf, offset + consumed)?;
            consumed += n;
            let (v, n) = V::decode_from(buf, offset + consumed)?;
            consumed += n;
            if map.insert(k, v).is_some() {
                return Err(Error::Malformed("duplicate dictionary key".into()));
            }
        }
        Ok((Self { map }, consumed))
    }

    fn to_json(&self) -> Value {
        if K::JSON_STRING {
            let mut out = Map::with_capacity(self.map.len());
            for (k, v) in &self.map {
                let key = match k.to_json() {
                    Value::String(s) => s,
                    _ => unreachable!("JSON_STRING key types produce string forms"),
                };
                out.insert(key, v.to_json());
            }
            Value::Object(out)
        } else {
            Value::Array(
                self.map
                    .iter()
                    .map(|(k, v)| {
                        let mut entry = Map::with_capacity(2);
                        entry.insert("key".to_string(), k.to_json());
                        entry.insert("value".to_string(), v.to_json());
                        Value::Object(entry)
                    })
                    .collect(),
            )
        }
    }

    fn from_json(json: &Value) -> Result<Self> {
        let mut map = BTreeMap::new();
        if K::JSON_STRING {
            let obj = json.as_object().ok_or(Error::TypeMismatch {
                expected: "object",
            })?;
            for (key, value) in obj {
                let k = K::from_json(&Value::String(key.clone()))?;
                let v = V::from_json(value)?;
                if map.insert(k, v).is_some() {
                    return Err(Error::Malformed("duplicate dictionary key".into()));
                }
            }
        } else {
            let arr = json.as_array().ok_or(Error::TypeMismatch {
                expected: "array of key/value records",
            })?;
            for entry in arr {
                let entry = entry.as_object().ok_or(Error::TypeMismatch {
                    expected: "key/value record",
                })?;
                let key = entry
                    .get("key")
                    .ok_or_else(|| Error::Malformed("record is missing its key".into()))?;
                let value = entry
                    .get("value")
                    .ok_or_else(|| Error::Malformed("record is missing its value".into()))?;
                if entry.len() != 2 {
                    return Err(Error::Malformed(
                        "record must hold exactly a key and a value".into(),
                    ));
                }
                let k = K::from_json(key)?;
                let v = V::from_json(value)?;
                if map.insert(k, v).is_some() {
                    return Err(Error::Malformed("duplicate dictionary key".into()));
                }
            }
        }
        Ok(Self { map })
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for Dict<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}

impl<K: Codec + Ord, V: Codec> Serialize for Dict<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de, K: Codec + Ord, V: Codec> Deserialize<'de> for Dict<K, V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Value::deserialize(deserializer)?;
        Self::from_json(&json).map_err(serde::de::Error::custom)
    }
}
