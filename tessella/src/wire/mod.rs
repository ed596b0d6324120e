//! The binary wire format: deterministic, self-describing encoding of any
//! value.
//!
//! Layout (order matters, all counts are 8-byte little-endian):
//! - 1-byte top-level code: [`TOP_NON_PARAMETRIC`] or [`TOP_PARAMETRIC`].
//! - Non-parametric payload: 1 byte, the stable [`NpTerm`] discriminant.
//! - Parametric payload: the recursively-serialized abstract type (types are
//!   data, handled by this same protocol), followed by tag-dispatched
//!   content. Content encodes only what the abstract type does not already
//!   pin down: an array whose abstract type fixes its length omits the
//!   length field, one whose abstract type does not carries an explicit
//!   count before its elements.
//!
//! End-of-stream while expecting a non-parametric tag byte decodes as the
//! [`NpTerm::EndOfFile`] singleton, a valid terminal value rather than an
//! error. Everywhere else, truncation is [`Error::MalformedStream`].
use std::io::{self, Read, Write};

use crate::{
    containers::{
        array::{ArrayConstraint, ArrayTerm},
        map::{MapConstraint, MapTerm},
        tuple::TupleTerm,
        union::UnionTerm,
    },
    error::{Error, Result},
    ops,
    registry::Registry,
    tag::NpTerm,
    value::Value,
};

/// Top-level code of a non-parametric singleton.
pub const TOP_NON_PARAMETRIC: u8 = 0;
/// Top-level code of a parametric value.
pub const TOP_PARAMETRIC: u8 = 1;

/// Serialize `value` into `writer`.
///
/// References are transparent here as everywhere: the resolved referent is
/// what hits the wire. Extension kinds need a registered serializer (and an
/// extension abstract type) or this fails with `UnregisteredCapability`.
pub fn serialize(registry: &Registry, value: &Value, writer: &mut dyn Write) -> Result<()> {
    let value = match value {
        Value::Ref(r) => r.resolved()?,
        other => other.clone(),
    };

    if let Value::Np(np) = &value {
        writer.write_all(&[TOP_NON_PARAMETRIC, np.discriminant()])?;
        return Ok(());
    }

    writer.write_all(&[TOP_PARAMETRIC])?;
    let abstract_type = ops::abstract_type_of(registry, &value)?;
    serialize(registry, &abstract_type, writer)?;

    match &value {
        Value::Np(_) | Value::Ref(_) => unreachable!("handled above"),

        Value::Sint8(x) => writer.write_all(&x.to_le_bytes())?,
        Value::Sint16(x) => writer.write_all(&x.to_le_bytes())?,
        Value::Sint32(x) => writer.write_all(&x.to_le_bytes())?,
        Value::Sint64(x) => writer.write_all(&x.to_le_bytes())?,
        Value::Uint8(x) => writer.write_all(&x.to_le_bytes())?,
        Value::Uint16(x) => writer.write_all(&x.to_le_bytes())?,
        Value::Uint32(x) => writer.write_all(&x.to_le_bytes())?,
        Value::Uint64(x) => writer.write_all(&x.to_le_bytes())?,
        Value::Float32(x) => writer.write_all(&x.to_le_bytes())?,
        Value::Float64(x) => writer.write_all(&x.to_le_bytes())?,

        Value::Text(s) => {
            write_count(writer, s.len() as u64)?;
            writer.write_all(s.as_bytes())?;
        }

        Value::Array(a) => {
            // The abstract type already pins the length for ES/S flavors.
            if a.constraint().and_then(ArrayConstraint::length).is_none() {
                write_count(writer, a.len() as u64)?;
            }
            for element in a.iter() {
                serialize(registry, element, writer)?;
            }
        }
        Value::Map(m) => {
            write_count(writer, m.len() as u64)?;
            // Canonical sorted-by-key order.
            for (k, v) in m.iter() {
                serialize(registry, k, writer)?;
                serialize(registry, v, writer)?;
            }
        }
        Value::Tuple(t) => {
            write_count(writer, t.len() as u64)?;
            for element in t.iter() {
                serialize(registry, element, writer)?;
            }
        }
        Value::Union(u) => {
            write_count(writer, u.len() as u64)?;
            for member in u.members() {
                serialize(registry, member, writer)?;
            }
        }

        Value::ArrayType(c) => {
            writer.write_all(&[c.kind().discriminant()])?;
            if let Some(ty) = c.element_type() {
                serialize(registry, ty, writer)?;
            }
            if let Some(len) = c.length() {
                write_count(writer, len)?;
            }
        }
        Value::MapType(c) => {
            writer.write_all(&[c.kind().discriminant()])?;
            if let Some(ty) = c.domain_type() {
                serialize(registry, ty, writer)?;
            }
            if let Some(ty) = c.codomain_type() {
                serialize(registry, ty, writer)?;
            }
        }

        Value::Ext(x) => match registry.serializer(x.tag()) {
            Some(f) => f(registry, x, writer)?,
            None => {
                return Err(Error::UnregisteredCapability {
                    capability: "serialize",
                    operand: ops::display_lossy(registry, &value),
                });
            }
        },
    }
    Ok(())
}

/// Serialize into a fresh byte buffer.
pub fn to_bytes(registry: &Registry, value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    serialize(registry, value, &mut buf)?;
    Ok(buf)
}

/// Decode a single value from `reader`.
///
/// A reader that is already exhausted yields the `EndOfFile` singleton.
pub fn deserialize(registry: &Registry, reader: &mut dyn Read) -> Result<Value> {
    decode_value(registry, reader, true)
}

/// Decode a single value from `bytes`, requiring the whole slice to be
/// consumed; trailing bytes are a [`Error::MalformedStream`].
pub fn from_bytes(registry: &Registry, bytes: &[u8]) -> Result<Value> {
    let mut cursor = io::Cursor::new(bytes);
    let value = deserialize(registry, &mut cursor)?;
    let consumed = cursor.position() as usize;
    if consumed != bytes.len() {
        return Err(Error::MalformedStream {
            reason: format!("{} trailing byte(s) after a complete value", bytes.len() - consumed),
        });
    }
    Ok(value)
}

/// `allow_eof` is true only at a position where the stream may legitimately
/// end (the outermost top-level code or a non-parametric tag byte); inside a
/// composite payload, running dry is a malformed stream.
fn decode_value(registry: &Registry, reader: &mut dyn Read, allow_eof: bool) -> Result<Value> {
    let code = match read_byte(reader)? {
        Some(code) => code,
        None if allow_eof => return Ok(Value::Np(NpTerm::EndOfFile)),
        None => {
            return Err(Error::MalformedStream {
                reason: "unexpected end of stream at top-level code".into(),
            });
        }
    };

    match code {
        TOP_NON_PARAMETRIC => {
            let tag = match read_byte(reader)? {
                Some(tag) => tag,
                // The reserved sentinel case: the tag byte position doubles
                // as the end-of-stream marker.
                None if allow_eof => return Ok(Value::Np(NpTerm::EndOfFile)),
                None => {
                    return Err(Error::MalformedStream {
                        reason: "unexpected end of stream at singleton tag".into(),
                    });
                }
            };
            NpTerm::from_repr(tag).map(Value::Np).ok_or_else(|| {
                Error::MalformedStream {
                    reason: format!("unknown singleton tag {tag:#04x}"),
                }
            })
        }
        TOP_PARAMETRIC => {
            let abstract_type = decode_value(registry, reader, false)?;
            decode_content(registry, reader, abstract_type)
        }
        other => Err(Error::MalformedStream {
            reason: format!("unknown top-level code {other:#04x}"),
        }),
    }
}

/// Decode the content of a parametric value, dispatched by its
/// already-decoded abstract type.
fn decode_content(registry: &Registry, reader: &mut dyn Read, abstract_type: Value) -> Result<Value> {
    match abstract_type {
        Value::Np(np) => decode_np_typed(registry, reader, np),

        Value::ArrayType(c) => {
            let count = match c.length() {
                Some(len) => len,
                None => read_count(reader)?,
            };
            let elements = decode_sequence(registry, reader, count)?;
            Ok(Value::Array(ArrayTerm::with_constraint(
                registry, c, elements,
            )?))
        }
        Value::MapType(c) => {
            let count = read_count(reader)?;
            let pairs = decode_pairs(registry, reader, count)?;
            Ok(Value::Map(MapTerm::with_constraint(registry, c, pairs)?))
        }

        Value::Ext(x) => match registry.deserializer(x.tag()) {
            Some(f) => f(registry, reader),
            None => Err(Error::UnregisteredCapability {
                capability: "deserialize",
                operand: ops::display_lossy(registry, &Value::Ext(x)),
            }),
        },

        other => Err(Error::MalformedStream {
            reason: format!(
                "value {} cannot appear as an abstract type",
                ops::display_lossy(registry, &other)
            ),
        }),
    }
}

fn decode_np_typed(registry: &Registry, reader: &mut dyn Read, np: NpTerm) -> Result<Value> {
    match np {
        NpTerm::Sint8 => Ok(Value::Sint8(i8::from_le_bytes(read_array(reader)?))),
        NpTerm::Sint16 => Ok(Value::Sint16(i16::from_le_bytes(read_array(reader)?))),
        NpTerm::Sint32 => Ok(Value::Sint32(i32::from_le_bytes(read_array(reader)?))),
        NpTerm::Sint64 => Ok(Value::Sint64(i64::from_le_bytes(read_array(reader)?))),
        NpTerm::Uint8 => Ok(Value::Uint8(u8::from_le_bytes(read_array(reader)?))),
        NpTerm::Uint16 => Ok(Value::Uint16(u16::from_le_bytes(read_array(reader)?))),
        NpTerm::Uint32 => Ok(Value::Uint32(u32::from_le_bytes(read_array(reader)?))),
        NpTerm::Uint64 => Ok(Value::Uint64(u64::from_le_bytes(read_array(reader)?))),
        NpTerm::Float32 => Ok(Value::Float32(f32::from_le_bytes(read_array(reader)?))),
        NpTerm::Float64 => Ok(Value::Float64(f64::from_le_bytes(read_array(reader)?))),

        NpTerm::Utf8String => {
            let len = read_count(reader)?;
            // The length field is untrusted; allocation must be bounded by
            // the bytes actually present in the stream.
            let mut buf = Vec::with_capacity(len.min(1024) as usize);
            let got = reader.take(len).read_to_end(&mut buf)?;
            if (got as u64) < len {
                return Err(Error::MalformedStream {
                    reason: format!("string payload truncated ({got} of {len} bytes)"),
                });
            }
            String::from_utf8(buf)
                .map(Value::Text)
                .map_err(|_| Error::MalformedStream {
                    reason: "string payload is not valid UTF-8".into(),
                })
        }

        NpTerm::Array => {
            let count = read_count(reader)?;
            let elements = decode_sequence(registry, reader, count)?;
            Ok(Value::Array(ArrayTerm::new(elements)))
        }
        NpTerm::OrderedMap => {
            let count = read_count(reader)?;
            let pairs = decode_pairs(registry, reader, count)?;
            Ok(Value::Map(MapTerm::from_pairs(registry, pairs)))
        }
        NpTerm::Tuple => {
            let count = read_count(reader)?;
            let elements = decode_sequence(registry, reader, count)?;
            Ok(Value::Tuple(TupleTerm::new(elements)))
        }
        NpTerm::Union => {
            let count = read_count(reader)?;
            let members = decode_sequence(registry, reader, count)?;
            Ok(Value::Union(UnionTerm::new(members)))
        }

        NpTerm::ArrayType => {
            let kind = read_kind(reader)?;
            match kind {
                NpTerm::ArrayES => {
                    let element_type = decode_value(registry, reader, false)?;
                    let length = read_count(reader)?;
                    Ok(Value::ArrayType(ArrayConstraint::element_and_length(
                        element_type,
                        length,
                    )))
                }
                NpTerm::ArrayE => {
                    let element_type = decode_value(registry, reader, false)?;
                    Ok(Value::ArrayType(ArrayConstraint::element(element_type)))
                }
                NpTerm::ArrayS => {
                    let length = read_count(reader)?;
                    Ok(Value::ArrayType(ArrayConstraint::length_only(length)))
                }
                other => Err(Error::MalformedStream {
                    reason: format!("invalid array constraint kind {other}"),
                }),
            }
        }
        NpTerm::OrderedMapType => {
            let kind = read_kind(reader)?;
            match kind {
                NpTerm::OrderedMapDC => {
                    let domain = decode_value(registry, reader, false)?;
                    let codomain = decode_value(registry, reader, false)?;
                    Ok(Value::MapType(MapConstraint::domain_and_codomain(
                        domain, codomain,
                    )))
                }
                NpTerm::OrderedMapD => {
                    let domain = decode_value(registry, reader, false)?;
                    Ok(Value::MapType(MapConstraint::domain(domain)))
                }
                NpTerm::OrderedMapC => {
                    let codomain = decode_value(registry, reader, false)?;
                    Ok(Value::MapType(MapConstraint::codomain(codomain)))
                }
                other => Err(Error::MalformedStream {
                    reason: format!("invalid map constraint kind {other}"),
                }),
            }
        }

        other => Err(Error::MalformedStream {
            reason: format!("singleton {other} cannot type a parametric payload"),
        }),
    }
}

fn decode_sequence(registry: &Registry, reader: &mut dyn Read, count: u64) -> Result<Vec<Value>> {
    let mut elements = Vec::with_capacity(count.min(1024) as usize);
    for _ in 0..count {
        elements.push(decode_value(registry, reader, false)?);
    }
    Ok(elements)
}

fn decode_pairs(
    registry: &Registry,
    reader: &mut dyn Read,
    count: u64,
) -> Result<Vec<(Value, Value)>> {
    let mut pairs = Vec::with_capacity(count.min(1024) as usize);
    for _ in 0..count {
        let key = decode_value(registry, reader, false)?;
        let value = decode_value(registry, reader, false)?;
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn read_kind(reader: &mut dyn Read) -> Result<NpTerm> {
    let byte: [u8; 1] = read_array(reader)?;
    NpTerm::from_repr(byte[0]).ok_or_else(|| Error::MalformedStream {
        reason: format!("unknown constraint kind byte {:#04x}", byte[0]),
    })
}

fn write_count(writer: &mut dyn Write, count: u64) -> Result<()> {
    writer.write_all(&count.to_le_bytes())?;
    Ok(())
}

fn read_count(reader: &mut dyn Read) -> Result<u64> {
    Ok(u64::from_le_bytes(read_array(reader)?))
}

/// Read a single byte; `Ok(None)` on a clean end of stream.
fn read_byte(reader: &mut dyn Read) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn read_exact(reader: &mut dyn Read, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::MalformedStream {
                reason: "stream ended inside a fixed-size payload".into(),
            }
        } else {
            e.into()
        }
    })
}

fn read_array<const N: usize>(reader: &mut dyn Read) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    read_exact(reader, &mut buf)?;
    Ok(buf)
}
