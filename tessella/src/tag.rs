//! Runtime tags: the non-parametric singleton enumeration and the dispatch key.
//!
//! Every value in the algebra carries a [`Tag`]: either one of the fixed
//! [`NpTerm`] singletons (a closed set with stable `u8` discriminants, used
//! verbatim on the wire) or an [`ExtTag`] issued by a
//! [`RegistryBuilder`](crate::registry::RegistryBuilder) for open extension
//! kinds.
//!
//! The discriminant values are part of the serialization format and MUST NOT
//! be reordered or reused.
use strum::{Display, EnumCount, FromRepr, IntoStaticStr};

/// The non-parametric terms: singletons carrying no runtime data beyond their
/// identity.
///
/// Families, in discriminant order:
/// - top-level sentinels (`Term`, `NonParametricTerm`, `Type`, ...)
/// - value singletons (`Void`, `True`, `False`)
/// - concrete numeric type descriptors (`Sint8` ... `Float64`) and their
///   types-of-types (`Sint8Type` ... `Float64Type`)
/// - abstract numeric families (`Sint`, `Uint`, `Float`)
/// - string, container, and reference type descriptors
/// - stream-control singletons (`Output`, `EndOfFile`, ...)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumCount,
    FromRepr,
    IntoStaticStr,
)]
#[repr(u8)]
pub enum NpTerm {
    /// The universal top type; every term inhabits it.
    Term = 0,
    /// The type of all non-parametric terms.
    NonParametricTerm = 1,
    /// The type of all parametric terms.
    ParametricTerm = 2,
    /// The type of all types.
    Type = 3,
    NonParametricType = 4,
    ParametricType = 5,

    /// The unit value.
    Void = 6,
    True = 7,
    False = 8,
    /// The type inhabited exactly by `Void`.
    VoidType = 9,
    TrueType = 10,
    FalseType = 11,
    /// The type inhabited by `True` and `False`.
    Bool = 12,
    BoolType = 13,

    Sint8 = 14,
    Sint16 = 15,
    Sint32 = 16,
    Sint64 = 17,
    Uint8 = 18,
    Uint16 = 19,
    Uint32 = 20,
    Uint64 = 21,
    Float32 = 22,
    Float64 = 23,

    Sint8Type = 24,
    Sint16Type = 25,
    Sint32Type = 26,
    Sint64Type = 27,
    Uint8Type = 28,
    Uint16Type = 29,
    Uint32Type = 30,
    Uint64Type = 31,
    Float32Type = 32,
    Float64Type = 33,

    /// Abstract family of all signed-integer values, any width.
    Sint = 34,
    SintType = 35,
    /// Abstract family of all unsigned-integer values, any width.
    Uint = 36,
    UintType = 37,
    /// Abstract family of all floating-point values, any width.
    Float = 38,
    FloatType = 39,

    Utf8String = 40,
    Utf8StringType = 41,

    /// Unconstrained array type; also the representation tag of array values.
    Array = 42,
    /// Array type constructor fixing element type and length.
    ArrayES = 43,
    /// Array type constructor fixing element type only.
    ArrayE = 44,
    /// Array type constructor fixing length only.
    ArrayS = 45,
    /// The type of all array types.
    ArrayType = 46,

    /// Unconstrained ordered-map type; also the representation tag of map values.
    OrderedMap = 47,
    /// Map type constructor fixing domain and codomain.
    OrderedMapDC = 48,
    /// Map type constructor fixing domain only.
    OrderedMapD = 49,
    /// Map type constructor fixing codomain only.
    OrderedMapC = 50,
    OrderedMapType = 51,

    Tuple = 52,
    TupleType = 53,
    Union = 54,
    UnionType = 55,

    /// Type of direct in-memory references; also their representation tag.
    MemRef = 56,
    GlobalSymRef = 57,
    LocalSymRef = 58,
    /// The type of all reference types.
    RefType = 59,

    /// Generic dispatch key standing for "any value cell"; used as the
    /// fallback component in pair-keyed registry lookups.
    ValueCell = 60,
    ValueCellType = 61,

    Output = 62,
    OutputType = 63,
    ClearOutput = 64,
    ClearOutputType = 65,
    RequestSyncInput = 66,
    RequestSyncInputType = 67,
    /// Terminal singleton produced when a decoder reaches end-of-stream while
    /// expecting a non-parametric tag byte. A valid value, not an error.
    EndOfFile = 68,
    EndOfFileType = 69,

    /// The uninhabited type; no value inhabits it.
    EmptyType = 70,
}

impl NpTerm {
    /// Returns true if this singleton is a type descriptor, i.e. can appear on
    /// the right-hand side of `inhabits`.
    ///
    /// The only non-types are the plain value singletons (`Void`, `True`,
    /// `False`) and the stream-control values.
    pub const fn is_type(self) -> bool {
        !matches!(
            self,
            NpTerm::Void
                | NpTerm::True
                | NpTerm::False
                | NpTerm::Output
                | NpTerm::ClearOutput
                | NpTerm::RequestSyncInput
                | NpTerm::EndOfFile
        )
    }

    /// The most specific type descriptor classifying this singleton.
    ///
    /// Soundness invariant: `np.inhabits_np(np.abstract_type())` holds for
    /// every singleton (checked by the test suite over the whole enumeration).
    pub const fn abstract_type(self) -> NpTerm {
        use NpTerm::*;
        match self {
            Void => VoidType,
            True => TrueType,
            False => FalseType,
            Bool => BoolType,
            Sint8 => Sint8Type,
            Sint16 => Sint16Type,
            Sint32 => Sint32Type,
            Sint64 => Sint64Type,
            Uint8 => Uint8Type,
            Uint16 => Uint16Type,
            Uint32 => Uint32Type,
            Uint64 => Uint64Type,
            Float32 => Float32Type,
            Float64 => Float64Type,
            Sint => SintType,
            Uint => UintType,
            Float => FloatType,
            Utf8String => Utf8StringType,
            Array | ArrayES | ArrayE | ArrayS => ArrayType,
            OrderedMap | OrderedMapDC | OrderedMapD | OrderedMapC => OrderedMapType,
            Tuple => TupleType,
            Union => UnionType,
            MemRef | GlobalSymRef | LocalSymRef => RefType,
            ValueCell => ValueCellType,
            Output => OutputType,
            ClearOutput => ClearOutputType,
            RequestSyncInput => RequestSyncInputType,
            EndOfFile => EndOfFileType,
            // Every remaining singleton is itself a type; `Type` classifies it.
            _ => Type,
        }
    }

    /// Inhabitation between singletons: does `self` inhabit the type `ty`?
    ///
    /// Closed-world: anything not listed here does not inhabit. `Term` and the
    /// generic `ValueCell` key accept every singleton.
    pub fn inhabits_np(self, ty: NpTerm) -> bool {
        use NpTerm::*;
        if matches!(ty, Term | NonParametricTerm | ValueCell) {
            return true;
        }
        if self.abstract_type() == ty {
            return true;
        }
        match (self, ty) {
            (_, Type) | (_, NonParametricType) => self.is_type(),
            (True | False, Bool) => true,
            (Sint8 | Sint16 | Sint32 | Sint64, SintType) => true,
            (Uint8 | Uint16 | Uint32 | Uint64, UintType) => true,
            (Float32 | Float64, FloatType) => true,
            _ => false,
        }
    }

    /// Stable wire discriminant of this singleton.
    pub const fn discriminant(self) -> u8 {
        self as u8
    }
}

/// Tag issued for an open extension kind by a
/// [`RegistryBuilder`](crate::registry::RegistryBuilder).
///
/// Tags are ordered by declaration order within the builder; they have no
/// meaning across distinct registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtTag(pub(crate) u32);

impl std::fmt::Display for ExtTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ext#{}", self.0)
    }
}

/// The runtime dispatch key of a value: a closed singleton or an extension tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    Np(NpTerm),
    Ext(ExtTag),
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tag::Np(np) => write!(f, "{np}"),
            Tag::Ext(ext) => write!(f, "{ext}"),
        }
    }
}

impl From<NpTerm> for Tag {
    fn from(np: NpTerm) -> Self {
        Tag::Np(np)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::EnumCount;

    #[test]
    fn discriminants_are_dense_and_stable() {
        for d in 0..NpTerm::COUNT as u8 {
            let np = NpTerm::from_repr(d).expect("dense discriminants");
            assert_eq!(np.discriminant(), d);
        }
        assert!(NpTerm::from_repr(NpTerm::COUNT as u8).is_none());
    }

    #[test]
    fn singleton_soundness() {
        for d in 0..NpTerm::COUNT as u8 {
            let np = NpTerm::from_repr(d).unwrap();
            assert!(
                np.inhabits_np(np.abstract_type()),
                "{np} does not inhabit its abstract type {}",
                np.abstract_type()
            );
        }
    }

    #[test]
    fn value_singletons_are_not_types() {
        assert!(!NpTerm::True.is_type());
        assert!(!NpTerm::EndOfFile.is_type());
        assert!(NpTerm::Bool.is_type());
        assert!(NpTerm::EmptyType.is_type());
        assert!(!NpTerm::True.inhabits_np(NpTerm::Type));
    }

    #[test]
    fn nothing_inhabits_empty_type() {
        for d in 0..NpTerm::COUNT as u8 {
            let np = NpTerm::from_repr(d).unwrap();
            assert!(!np.inhabits_np(NpTerm::EmptyType));
        }
    }
}
