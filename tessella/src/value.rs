//! The polymorphic value cell.
//!
//! [`Value`] is the universal currency of the algebra: a closed sum of every
//! known primitive and structural kind, plus one open [`Ext`](Value::Ext)
//! variant carrying a trait object for registry-dispatched extension kinds.
//!
//! Values are value-semantic: `Clone` duplicates the underlying content.
//! Sharing is only possible through the reference layer (see
//! [`refs`](crate::refs)). All semantic operations (equality, ordering,
//! inhabitation, printing, ...) live in [`ops`](crate::ops) and take the
//! [`Registry`](crate::registry::Registry) explicitly.
use crate::{
    containers::{
        array::{ArrayConstraint, ArrayTerm},
        map::{MapConstraint, MapTerm},
        tuple::TupleTerm,
        union::UnionTerm,
    },
    refs::RefTerm,
    registry::ExtValue,
    tag::{NpTerm, Tag},
};

/// A single value of the algebra together with its runtime kind.
#[derive(Debug, Clone)]
pub enum Value {
    /// One of the ~75 non-parametric singletons.
    Np(NpTerm),

    Sint8(i8),
    Sint16(i16),
    Sint32(i32),
    Sint64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),

    /// A UTF-8 string; its abstract type is [`NpTerm::Utf8String`].
    Text(String),

    /// An ordered sequence, possibly carrying a declared constraint.
    Array(ArrayTerm),
    /// A first-class array type constraint (`ArrayES` / `ArrayE` / `ArrayS`).
    ArrayType(ArrayConstraint),
    /// A key-sorted map, possibly carrying a declared constraint.
    Map(MapTerm),
    /// A first-class map type constraint (`OrderedMapDC` / `D` / `C`).
    MapType(MapConstraint),
    /// A fixed-arity heterogeneous positional sequence.
    Tuple(TupleTerm),
    /// An ordered, non-deduplicated sequence of member types.
    Union(UnionTerm),

    /// A transparent reference (memory, global-symbol, or local-symbol).
    Ref(RefTerm),

    /// An open extension value, dispatched through the registry.
    Ext(ExtValue),
}

impl Value {
    /// The runtime dispatch tag of this value.
    ///
    /// Structural values report their representation kind (`Array`,
    /// `OrderedMap`, `Tuple`, ...) regardless of any declared constraint;
    /// constraint objects report their constructor kind (`ArrayES`, ...).
    pub fn tag(&self) -> Tag {
        match self {
            Value::Np(np) => Tag::Np(*np),
            Value::Sint8(_) => Tag::Np(NpTerm::Sint8),
            Value::Sint16(_) => Tag::Np(NpTerm::Sint16),
            Value::Sint32(_) => Tag::Np(NpTerm::Sint32),
            Value::Sint64(_) => Tag::Np(NpTerm::Sint64),
            Value::Uint8(_) => Tag::Np(NpTerm::Uint8),
            Value::Uint16(_) => Tag::Np(NpTerm::Uint16),
            Value::Uint32(_) => Tag::Np(NpTerm::Uint32),
            Value::Uint64(_) => Tag::Np(NpTerm::Uint64),
            Value::Float32(_) => Tag::Np(NpTerm::Float32),
            Value::Float64(_) => Tag::Np(NpTerm::Float64),
            Value::Text(_) => Tag::Np(NpTerm::Utf8String),
            Value::Array(_) => Tag::Np(NpTerm::Array),
            Value::ArrayType(c) => Tag::Np(c.kind()),
            Value::Map(_) => Tag::Np(NpTerm::OrderedMap),
            Value::MapType(c) => Tag::Np(c.kind()),
            Value::Tuple(_) => Tag::Np(NpTerm::Tuple),
            Value::Union(_) => Tag::Np(NpTerm::Union),
            Value::Ref(r) => Tag::Np(r.kind()),
            Value::Ext(e) => Tag::Ext(e.tag()),
        }
    }

    /// True for the non-parametric singletons, false for everything carrying
    /// runtime content.
    pub fn is_non_parametric(&self) -> bool {
        matches!(self, Value::Np(_))
    }

    /// True if this value is a reference of any kind.
    pub fn is_ref(&self) -> bool {
        matches!(self, Value::Ref(_))
    }

    /// The void singleton.
    pub const fn void() -> Self {
        Value::Np(NpTerm::Void)
    }

    /// The universal top type.
    pub const fn term() -> Self {
        Value::Np(NpTerm::Term)
    }
}

macro_rules! value_from {
    ($typ:ty, $lbl:ident) => {
        impl From<$typ> for Value {
            fn from(value: $typ) -> Self {
                Value::$lbl(value)
            }
        }
    };
}

value_from! { i8, Sint8 }
value_from! { i16, Sint16 }
value_from! { i32, Sint32 }
value_from! { i64, Sint64 }
value_from! { u8, Uint8 }
value_from! { u16, Uint16 }
value_from! { u32, Uint32 }
value_from! { u64, Uint64 }
value_from! { f32, Float32 }
value_from! { f64, Float64 }
value_from! { String, Text }
value_from! { ArrayTerm, Array }
value_from! { ArrayConstraint, ArrayType }
value_from! { MapTerm, Map }
value_from! { MapConstraint, MapType }
value_from! { TupleTerm, Tuple }
value_from! { UnionTerm, Union }
value_from! { RefTerm, Ref }
value_from! { NpTerm, Np }

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        if value {
            Value::Np(NpTerm::True)
        } else {
            Value::Np(NpTerm::False)
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}
