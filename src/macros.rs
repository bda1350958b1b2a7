//! Declaration macros for records and choices.
//!

/// Declare a record: an ordered, heterogeneous tuple of named codable fields.
///
/// The wire form concatenates each field's encoding in declaration order with
/// no separators or padding; each field frames itself. The JSON form is an
/// object keyed by field name, and rebuilding from JSON requires every
/// declared field and rejects unknown ones. A record whose fields all have a
/// fixed width is itself fixed-width.
///
/// The macro derives `Clone`, `Debug` and `PartialEq` on the generated
/// struct; don't add those yourself.
///
/// ```
/// use tidepack::{record, Codec, VarBytes};
///
/// record! {
///     pub struct Greeting {
///         pub code: u8,
///         pub body: VarBytes,
///     }
/// }
///
/// let g = Greeting {
///     code: 7,
///     body: VarBytes::from_slice(b"hi").unwrap(),
/// };
/// assert_eq!(g.encode(), [0x07, 0x02, 0x68, 0x69]);
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field : $fty, )+
        }

        impl $crate::Codec for $name {
            const WIDTH: ::core::option::Option<usize> = {
                let w = ::core::option::Option::Some(0usize);
                $( let w = $crate::codec::sum_width(w, <$fty as $crate::Codec>::WIDTH); )+
                w
            };

            fn encoded_size(&self) -> usize {
                0usize $( + $crate::Codec::encoded_size(&self.$field) )+
            }

            fn encode_into(&self, buf: &mut [u8], offset: usize) -> $crate::Result<usize> {
                let mut written = 0usize;
                $( written += $crate::Codec::encode_into(&self.$field, buf, offset + written)?; )+
                Ok(written)
            }

            fn decode_from(buf: &[u8], offset: usize) -> $crate::Result<(Self, usize)> {
                let mut consumed = 0usize;
                $(
                    let ($field, used) = <$fty as $crate::Codec>::decode_from(buf, offset + consumed)?;
                    consumed += used;
                )+
                Ok((Self { $( $field ),+ }, consumed))
            }

            fn to_json(&self) -> $crate::export::Value {
                let mut out = $crate::export::Map::new();
                $(
                    out.insert(
                        ::std::string::String::from(::core::stringify!($field)),
                        $crate::Codec::to_json(&self.$field),
                    );
                )+
                $crate::export::Value::Object(out)
            }

            fn from_json(json: &$crate::export::Value) -> $crate::Result<Self> {
                const FIELDS: &[&str] = &[ $( ::core::stringify!($field) ),+ ];
                let map = match json {
                    $crate::export::Value::Object(map) => map,
                    _ => return Err($crate::Error::TypeMismatch { expected: "object" }),
                };
                for key in map.keys() {
                    if !FIELDS.contains(&key.as_str()) {
                        return Err($crate::Error::Malformed(
                            ::std::format!("unknown field `{}`", key),
                        ));
                    }
                }
                $(
                    let $field = match map.get(::core::stringify!($field)) {
                        Some(v) => <$fty as $crate::Codec>::from_json(v)?,
                        None => {
                            return Err($crate::Error::Malformed(::std::format!(
                                "missing field `{}`",
                                ::core::stringify!($field)
                            )))
                        }
                    };
                )+
                Ok(Self { $( $field ),+ })
            }
        }
    };
}

/// Declare a choice: exactly one of several named, codable alternatives.
///
/// Every alternative carries one payload type; use `()` for alternatives with
/// nothing to say. The wire form is a varint discriminator holding the
/// zero-based declaration index, followed by the chosen payload. Unknown
/// discriminators fail decoding. The JSON form is
/// `{"tag": "<name>", "value": <payload>}`.
///
/// The macro derives `Clone`, `Debug` and `PartialEq` on the generated enum;
/// don't add those yourself.
///
/// ```
/// use tidepack::{choice, Codec};
///
/// choice! {
///     pub enum Frame {
///         Heartbeat(()),
///         Data(Vec<u8>),
///         Close(u32),
///     }
/// }
///
/// assert_eq!(Frame::Heartbeat(()).encode(), [0x00]);
/// assert_eq!(Frame::Close(2).encode(), [0x02, 0x02, 0x00, 0x00, 0x00]);
/// ```
#[macro_export]
macro_rules! choice {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident ( $vty:ty ) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant($vty), )+
        }

        const _: () = {
            // Fieldless mirror of the alternatives; hands out each one's
            // declaration index as a discriminant.
            #[repr(u64)]
            enum __Tag { $( $variant ),+ }

            impl $crate::Codec for $name {
                fn encoded_size(&self) -> usize {
                    match self {
                        $( $name::$variant(inner) => {
                            $crate::varint::size(__Tag::$variant as u64)
                                + $crate::Codec::encoded_size(inner)
                        } )+
                    }
                }

                fn encode_into(&self, buf: &mut [u8], offset: usize) -> $crate::Result<usize> {
                    match self {
                        $( $name::$variant(inner) => {
                            let mut written =
                                $crate::varint::encode_into(__Tag::$variant as u64, buf, offset)?;
                            written += $crate::Codec::encode_into(inner, buf, offset + written)?;
                            Ok(written)
                        } )+
                    }
                }

                fn decode_from(buf: &[u8], offset: usize) -> $crate::Result<(Self, usize)> {
                    let (tag, consumed) = $crate::varint::decode_from(buf, offset)?;
                    $(
                        if tag == __Tag::$variant as u64 {
                            let (inner, used) =
                                <$vty as $crate::Codec>::decode_from(buf, offset + consumed)?;
                            return Ok(($name::$variant(inner), consumed + used));
                        }
                    )+
                    Err($crate::Error::Malformed(::std::format!(
                        "unknown discriminator {}",
                        tag
                    )))
                }

                fn to_json(&self) -> $crate::export::Value {
                    match self {
                        $( $name::$variant(inner) => {
                            let mut out = $crate::export::Map::new();
                            out.insert(
                                ::std::string::String::from("tag"),
                                $crate::export::Value::String(::std::string::String::from(
                                    ::core::stringify!($variant),
                                )),
                            );
                            out.insert(
                                ::std::string::String::from("value"),
                                $crate::Codec::to_json(inner),
                            );
                            $crate::export::Value::Object(out)
                        } )+
                    }
                }

                fn from_json(json: &$crate::export::Value) -> $crate::Result<Self> {
                    let map = match json {
                        $crate::export::Value::Object(map) => map,
                        _ => return Err($crate::Error::TypeMismatch { expected: "object" }),
                    };
                    for key in map.keys() {
                        if key != "tag" && key != "value" {
                            return Err($crate::Error::Malformed(
                                ::std::format!("unknown field `{}`", key),
                            ));
                        }
                    }
                    let tag = map
                        .get("tag")
                        .and_then(|t| t.as_str())
                        .ok_or_else(|| $crate::Error::Malformed(
                            "choice needs a string `tag`".into(),
                        ))?;
                    let value = map.get("value").ok_or_else(|| {
                        $crate::Error::Malformed("choice needs a `value`".into())
                    })?;
                    $(
                        if tag == ::core::stringify!($variant) {
                            return Ok($name::$variant(
                                <$vty as $crate::Codec>::from_json(value)?,
                            ));
                        }
                    )+
                    Err($crate::Error::Malformed(::std::format!(
                        "unknown tag `{}`",
                        tag
                    )))
                }
            }
        };
    };
}

#[cfg(test)]
mod tests {
    use crate::{Codec, Error, VarBytes};
    use serde_json::json;

    record! {
        struct Pair {
            a: u8,
            b: u16,
        }
    }

    record! {
        struct Framed {
            code: u8,
            body: VarBytes,
        }
    }

    choice! {
        enum Message {
            Heartbeat(()),
            Data(VarBytes),
            Seq(u16),
        }
    }

    #[test]
    fn record_wire_form() {
        let p = Pair { a: 1, b: 0x0203 };
        assert_eq!(p.encode(), [0x01, 0x03, 0x02]);
        assert_eq!(Pair::decode(&[0x01, 0x03, 0x02]).unwrap(), p);

        let f = Framed {
            code: 7,
            body: VarBytes::from_slice(b"hi").unwrap(),
        };
        assert_eq!(f.encode(), [0x07, 0x02, 0x68, 0x69]);
        assert_eq!(Framed::decode(&f.encode()).unwrap(), f);
    }

    #[test]
    fn record_width_folds() {
        assert_eq!(Pair::WIDTH, Some(3));
        assert_eq!(Framed::WIDTH, None);
    }

    #[test]
    fn record_json_forms() {
        let p = Pair { a: 1, b: 0x0203 };
        assert_eq!(p.to_json(), json!({"a": 1, "b": 515}));
        assert_eq!(Pair::from_json(&json!({"a": 1, "b": 515})).unwrap(), p);

        assert!(matches!(
            Pair::from_json(&json!({"a": 1})),
            Err(Error::Malformed(_))
        ));
        assert!(matches!(
            Pair::from_json(&json!({"a": 1, "b": 2, "c": 3})),
            Err(Error::Malformed(_))
        ));
        assert!(matches!(
            Pair::from_json(&json!(17)),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn record_truncation() {
        assert!(matches!(
            Pair::decode(&[0x01, 0x03]),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn consecutive_encodings_compose() {
        let a = Pair { a: 1, b: 2 };
        let b = Framed {
            code: 9,
            body: VarBytes::from_slice(&[0xAB]).unwrap(),
        };
        let mut wire = a.encode();
        wire.extend(b.encode());

        let (got_a, n) = Pair::decode_from(&wire, 0).unwrap();
        assert_eq!(got_a, a);
        assert_eq!(n, a.encoded_size());
        let (got_b, n2) = Framed::decode_from(&wire, n).unwrap();
        assert_eq!(got_b, b);
        assert_eq!(n + n2, wire.len());
    }

    #[test]
    fn choice_wire_form() {
        assert_eq!(Message::Heartbeat(()).encode(), [0x00]);
        let m = Message::Data(VarBytes::from_slice(b"ok").unwrap());
        assert_eq!(m.encode(), [0x01, 0x02, 0x6F, 0x6B]);
        assert_eq!(Message::Seq(516).encode(), [0x02, 0x04, 0x02]);

        assert_eq!(Message::decode(&[0x00]).unwrap(), Message::Heartbeat(()));
        assert_eq!(Message::decode(&m.encode()).unwrap(), m);
    }

    #[test]
    fn choice_unknown_discriminator() {
        assert!(matches!(
            Message::decode(&[0x03, 0x00]),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn choice_json_forms() {
        let m = Message::Seq(5);
        assert_eq!(m.to_json(), json!({"tag": "Seq", "value": 5}));
        assert_eq!(
            Message::from_json(&json!({"tag": "Seq", "value": 5})).unwrap(),
            m
        );
        assert_eq!(
            Message::from_json(&json!({"tag": "Heartbeat", "value": null})).unwrap(),
            Message::Heartbeat(())
        );
        assert!(matches!(
            Message::from_json(&json!({"tag": "Nope", "value": 1})),
            Err(Error::Malformed(_))
        ));
        assert!(matches!(
            Message::from_json(&json!({"tag": "Seq"})),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn records_nest_in_dictionaries() {
        use crate::Dict;

        let mut d: Dict<String, Pair> = Dict::new();
        d.insert("k".into(), Pair { a: 1, b: 2 });
        let enc = d.encode();
        // Fixed-width record values let the size come straight off the count.
        assert_eq!(enc.len(), d.encoded_size());
        assert_eq!(Dict::<String, Pair>::decode(&enc).unwrap(), d);
    }
}
