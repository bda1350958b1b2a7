//! Typed binary values with a deterministic, length-prefixed wire format and
//! a mirrored JSON form.
//!
//! Every value type in this crate implements one contract, [`Codec`]:
//! exact-size reporting, allocation-free writes into caller buffers,
//! offset-based reads that report their consumption, and a symmetric JSON
//! form. Composite types — options, choices, sequences, dictionaries,
//! records — recursively invoke the codecs of their element types, so any
//! composition of the building blocks is itself codable.
//!
//! The wire format is deterministic and little-endian throughout. Small
//! numbers and every length prefix use the compact [`varint`] form.
//! Dictionaries encode their entries in ascending key order regardless of how
//! they were built, and packed bit sequences pick their on-wire bit order
//! through a type parameter.
//!
//! ```
//! use tidepack::{record, Codec, Dict};
//!
//! record! {
//!     pub struct Entry {
//!         pub kind: u8,
//!         pub offset: u32,
//!     }
//! }
//!
//! let mut index: Dict<String, Entry> = Dict::new();
//! index.insert("b".into(), Entry { kind: 1, offset: 64 });
//! index.insert("a".into(), Entry { kind: 0, offset: 0 });
//!
//! let wire = index.encode();
//! assert_eq!(wire.len(), index.encoded_size());
//! assert_eq!(Dict::decode(&wire).unwrap(), index);
//!
//! // "a" sorts first no matter the insertion order above.
//! assert_eq!(wire[1..3], [0x01, 0x61]);
//! ```
//!
//! Scalars are covered by direct implementations on `u8`–`u64`, `i8`–`i64`
//! (biased on the wire), `String`, `()`, `Option<T>`, `Vec<T>` and `[u8; N]`.
//! The crate's own containers add length bounds and packed storage:
//! [`ByteSeq`], [`Bits`], [`Seq`] and [`Dict`]. Records and choices are
//! declared with the [`record!`] and [`choice!`] macros.

mod bits;
mod bytes;
pub mod codec;
mod dict;
mod error;
mod int;
mod macros;
mod seq;
mod string;
mod sum;
pub mod varint;

pub use self::bits::{BitArray, BitOrder, BitSeq, Bits, Lsb0, Msb0};
pub use self::bytes::{
    ByteSeq, Bytes1024, Bytes128, Bytes16, Bytes256, Bytes32, Bytes512, Bytes64, VarBytes,
};
pub use self::codec::Codec;
pub use self::dict::Dict;
pub use self::error::{Error, Result};
pub use self::int::{FixedInt, Uint};
pub use self::seq::{FixedSeq, Seq, VarSeq};

#[doc(hidden)]
pub mod export {
    pub use serde_json::{Map, Value};
}
