//! Tessella: a runtime term/type algebra with first-class type descriptors.
//!
//! Every runtime datum is a [`value::Value`]: either one of roughly seventy
//! non-parametric singletons (unit, booleans, type descriptors, stream
//! sentinels) or a parametric value carrying content (numbers, strings,
//! arrays, maps, tuples, unions, references). Types are ordinary values, so
//! the same machinery that stores and serializes data stores and serializes
//! the types that classify it.
//!
//! Design shape
//!  - Generic operations (`equals`, `compare`, `abstract_type_of`,
//!    `inhabits`, `render`, `serialize`, ...) dispatch exhaustively over the
//!    closed [`value::Value`] enum; an open extension variant falls back to
//!    the capability tables of an explicit, immutable
//!    [`registry::Registry`] built once at startup.
//!  - References (direct cell, global symbol, scoped symbol) are transparent
//!    in every generic operation: operands are resolved to their final
//!    referent before the operation applies.
//!  - `inhabits` answers `false` for anything it does not know, while
//!    `abstract_type_of` fails; the two defaults are deliberately different.
//!
//! Example
//! ```
//! use tessella::prelude::*;
//!
//! let registry = Registry::new();
//!
//! let numbers = array_of([10i32, 20, 30]);
//! assert!(inhabits(&registry, &numbers, &Value::Np(NpTerm::Array)));
//!
//! // Values round-trip through the self-describing wire format.
//! let bytes = to_bytes(&registry, &numbers).unwrap();
//! let back = from_bytes(&registry, &bytes).unwrap();
//! assert!(equals(&registry, &numbers, &back));
//!
//! // Constraint objects are first-class values and act as constructors.
//! let pair = ArrayConstraint::element_and_length(Value::Np(NpTerm::Sint32), 2);
//! let built = construct_inhabitant_of(
//!     &registry,
//!     &Value::ArrayType(pair.clone()),
//!     tuple_of([10i32, 20]),
//! )
//! .unwrap();
//! assert!(inhabits(&registry, &built, &Value::ArrayType(pair)));
//! ```

/// Structural containers: arrays, ordered maps, tuples, unions, and their
/// constraint objects.
pub mod containers;
/// Classification of primitive numeric coercions by information loss.
pub mod convert;
/// Crate-wide error type.
pub mod error;
/// Generic operations over values: comparison, hashing, typing, rendering,
/// construction, element access.
pub mod ops;
/// Transparent references and hierarchical symbol tables.
pub mod refs;
/// Capability tables for extension kinds.
pub mod registry;
/// Runtime type tags.
pub mod tag;
/// The polymorphic value cell.
pub mod value;
/// Binary serialization of any value.
pub mod wire;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::containers::{
        array::{ArrayConstraint, ArrayTerm, array_of},
        map::{MapConstraint, MapTerm},
        tuple::{TupleTerm, tuple_of},
        union::{UnionTerm, union_of},
    };
    pub use crate::convert::{ConversionFlags, Quality, Strictness, convert_to, quality_check};
    pub use crate::error::{Error, Result};
    pub use crate::ops::{
        TermOrdering, abstract_type_of, compare, construct_inhabitant_of, display_lossy, element_of,
        equals, hash64, inhabits, render,
    };
    pub use crate::refs::{
        GlobalSymRef, LocalSymRef, MemRef, RefTerm, TransparentRef, resolved_value,
        symbol::{SharedTable, SymbolTable, global_table},
    };
    pub use crate::registry::{ExtensionTerm, ExtValue, Registry, RegistryBuilder};
    pub use crate::tag::{ExtTag, NpTerm, Tag};
    pub use crate::value::Value;
    pub use crate::wire::{deserialize, from_bytes, serialize, to_bytes};
}
