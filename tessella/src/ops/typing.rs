//! Abstract-type computation and the inhabitation relation.
//!
//! The two defaults are deliberately asymmetric:
//! - [`abstract_type_of`] fails loudly (`UnregisteredCapability`) for an
//!   extension kind with no registered implementation;
//! - [`inhabits`] is closed-world and quietly answers `false` for any pair
//!   it knows nothing about.
//!
//! Preserve both; unifying them changes observable behavior.
use crate::{
    error::{Error, Result},
    ops::{display_lossy, resolve_or_self},
    registry::Registry,
    tag::{NpTerm, Tag},
    value::Value,
};

/// The most specific runtime type descriptor classifying `value`.
///
/// References are transparent: the referent's type is computed. Structural
/// containers report their declared constraint when they carry one, the free
/// container type otherwise.
pub fn abstract_type_of(registry: &Registry, value: &Value) -> Result<Value> {
    match value {
        Value::Ref(r) => abstract_type_of(registry, &r.resolved()?),

        Value::Np(np) => Ok(Value::Np(np.abstract_type())),

        Value::Sint8(_) => Ok(Value::Np(NpTerm::Sint8)),
        Value::Sint16(_) => Ok(Value::Np(NpTerm::Sint16)),
        Value::Sint32(_) => Ok(Value::Np(NpTerm::Sint32)),
        Value::Sint64(_) => Ok(Value::Np(NpTerm::Sint64)),
        Value::Uint8(_) => Ok(Value::Np(NpTerm::Uint8)),
        Value::Uint16(_) => Ok(Value::Np(NpTerm::Uint16)),
        Value::Uint32(_) => Ok(Value::Np(NpTerm::Uint32)),
        Value::Uint64(_) => Ok(Value::Np(NpTerm::Uint64)),
        Value::Float32(_) => Ok(Value::Np(NpTerm::Float32)),
        Value::Float64(_) => Ok(Value::Np(NpTerm::Float64)),
        Value::Text(_) => Ok(Value::Np(NpTerm::Utf8String)),

        Value::Array(a) => Ok(a.declared_type()),
        Value::Map(m) => Ok(m.declared_type()),
        Value::ArrayType(_) => Ok(Value::Np(NpTerm::ArrayType)),
        Value::MapType(_) => Ok(Value::Np(NpTerm::OrderedMapType)),
        Value::Tuple(_) => Ok(Value::Np(NpTerm::Tuple)),
        Value::Union(_) => Ok(Value::Np(NpTerm::Union)),

        Value::Ext(x) => match registry.abstract_type_fn(x.tag()) {
            Some(f) => Ok(f(registry, x)),
            None => Err(Error::UnregisteredCapability {
                capability: "abstract_type_of",
                operand: display_lossy(registry, value),
            }),
        },
    }
}

/// Does `value` inhabit the type `ty`?
///
/// Trivially true when `ty` is the universal top type `Term`. Otherwise
/// closed-world: any pair without a defined (or registered) relation is
/// simply `false`, never an error. Both operands are dereferenced first;
/// a reference that cannot be resolved inhabits nothing but `Term`.
pub fn inhabits(registry: &Registry, value: &Value, ty: &Value) -> bool {
    let ty = resolve_or_self(ty);
    if matches!(ty, Value::Np(NpTerm::Term)) {
        return true;
    }
    let value = resolve_or_self(value);
    if value.is_ref() || ty.is_ref() {
        return false;
    }

    match &ty {
        Value::Np(np_ty) => inhabits_np_type(registry, &value, *np_ty),
        // Existential over members, first match wins.
        Value::Union(u) => u.accepts(registry, &value),
        // Structural check of the actual contents against the constraint,
        // regardless of the candidate's own declared constraint.
        Value::ArrayType(c) => match &value {
            Value::Array(a) => c.verify(registry, a.elements()).is_ok(),
            _ => false,
        },
        Value::MapType(c) => match &value {
            Value::Map(m) => m
                .iter()
                .all(|(k, v)| c.verify_pair(registry, k, v).is_ok()),
            _ => false,
        },
        Value::Ext(x) => {
            let key = (value.tag(), Tag::Ext(x.tag()));
            if let Some(f) = registry.inhabits_fn(key) {
                return f(registry, &value, &ty);
            }
            let fallback = (Tag::Np(NpTerm::ValueCell), Tag::Ext(x.tag()));
            match registry.inhabits_fn(fallback) {
                Some(f) => f(registry, &value, &ty),
                None => false,
            }
        }
        // Values that are not types classify nothing.
        _ => false,
    }
}

/// Inhabitation against a non-parametric type descriptor.
fn inhabits_np_type(registry: &Registry, value: &Value, ty: NpTerm) -> bool {
    use NpTerm::*;
    // The generic "any value cell" key accepts everything.
    if matches!(ty, Term | ValueCell) {
        return true;
    }
    match value {
        Value::Np(np) => np.inhabits_np(ty),

        Value::Sint8(_) => matches!(ty, Sint8 | Sint | ParametricTerm),
        Value::Sint16(_) => matches!(ty, Sint16 | Sint | ParametricTerm),
        Value::Sint32(_) => matches!(ty, Sint32 | Sint | ParametricTerm),
        Value::Sint64(_) => matches!(ty, Sint64 | Sint | ParametricTerm),
        Value::Uint8(_) => matches!(ty, Uint8 | Uint | ParametricTerm),
        Value::Uint16(_) => matches!(ty, Uint16 | Uint | ParametricTerm),
        Value::Uint32(_) => matches!(ty, Uint32 | Uint | ParametricTerm),
        Value::Uint64(_) => matches!(ty, Uint64 | Uint | ParametricTerm),
        Value::Float32(_) => matches!(ty, Float32 | Float | ParametricTerm),
        Value::Float64(_) => matches!(ty, Float64 | Float | ParametricTerm),
        Value::Text(_) => matches!(ty, Utf8String | ParametricTerm),

        // Any array inhabits the free `Array` type; constraints are checked
        // structurally by the `ArrayType` arm of `inhabits`.
        Value::Array(_) => matches!(ty, Array | ParametricTerm),
        Value::Map(_) => matches!(ty, OrderedMap | ParametricTerm),
        Value::Tuple(_) => matches!(ty, Tuple | ParametricTerm),

        // Constraint objects and unions are themselves parametric types.
        Value::ArrayType(_) => {
            matches!(ty, ArrayType | Type | ParametricType | ParametricTerm)
        }
        Value::MapType(_) => {
            matches!(ty, OrderedMapType | Type | ParametricType | ParametricTerm)
        }
        Value::Union(_) => {
            matches!(ty, Union | UnionType | Type | ParametricType | ParametricTerm)
        }

        Value::Ref(_) => false,

        Value::Ext(x) => {
            let key = (Tag::Ext(x.tag()), Tag::Np(ty));
            if let Some(f) = registry.inhabits_fn(key) {
                return f(registry, value, &Value::Np(ty));
            }
            let fallback = (Tag::Np(NpTerm::ValueCell), Tag::Np(ty));
            match registry.inhabits_fn(fallback) {
                Some(f) => f(registry, value, &Value::Np(ty)),
                None => false,
            }
        }
    }
}
