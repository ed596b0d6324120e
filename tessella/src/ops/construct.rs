//! Applying type objects as constructors, and generic element access.
use crate::{
    containers::{array::ArrayTerm, map::MapTerm},
    error::{Error, Result},
    ops::{display_lossy, inhabits, resolve_or_self},
    registry::Registry,
    tag::{NpTerm, Tag},
    value::Value,
};

/// Apply the type `ty` as a constructor to `argument`, producing a verified
/// inhabitant.
///
/// `Term` is the identity constructor. Constraint objects rewrap the
/// argument's elements under the constraint (this is where
/// `ArrayES(Sint32, 2)(10, 20, 30)` fails with `ConstraintViolation`).
/// Every other built-in type uses the structural default: verify
/// `inhabits(argument, ty)` and return the argument unchanged, else fail
/// with `ConstructionFailed`. Extension types dispatch through the registry
/// by `(type-tag, argument-tag)` with a `(type-tag, ValueCell)` fallback;
/// no entry at all is `UnregisteredCapability`.
pub fn construct_inhabitant_of(registry: &Registry, ty: &Value, argument: Value) -> Result<Value> {
    let ty = resolve_or_self(ty);
    let argument = resolve_or_self(&argument);

    match &ty {
        Value::Np(NpTerm::Term) => Ok(argument),

        // The free Array type accepts any positional contents.
        Value::Np(NpTerm::Array) => match argument {
            Value::Array(a) => Ok(Value::Array(a)),
            Value::Tuple(t) => Ok(Value::Array(ArrayTerm::new(t.into_elements()))),
            other => Err(construction_failed(registry, &ty, &other)),
        },
        Value::Np(NpTerm::OrderedMap) => match argument {
            Value::Map(m) => Ok(Value::Map(m)),
            other => Err(construction_failed(registry, &ty, &other)),
        },

        // Structural default for every other built-in type descriptor.
        Value::Np(np) if np.is_type() => {
            if inhabits(registry, &argument, &ty) {
                Ok(argument)
            } else {
                Err(construction_failed(registry, &ty, &argument))
            }
        }

        // Applying a non-type singleton is a configuration error, not a
        // failed check.
        Value::Np(_) => Err(Error::UnregisteredCapability {
            capability: "construct_inhabitant_of",
            operand: display_lossy(registry, &ty),
        }),

        Value::ArrayType(c) => {
            let elements = match argument {
                Value::Array(a) => a.into_elements(),
                Value::Tuple(t) => t.into_elements(),
                other => return Err(construction_failed(registry, &ty, &other)),
            };
            Ok(Value::Array(ArrayTerm::with_constraint(
                registry,
                c.clone(),
                elements,
            )?))
        }
        Value::MapType(c) => match argument {
            Value::Map(m) => {
                let pairs: Vec<_> = m.iter().cloned().collect();
                Ok(Value::Map(MapTerm::with_constraint(
                    registry,
                    c.clone(),
                    pairs,
                )?))
            }
            other => Err(construction_failed(registry, &ty, &other)),
        },
        Value::Union(_) => {
            if inhabits(registry, &argument, &ty) {
                Ok(argument)
            } else {
                Err(construction_failed(registry, &ty, &argument))
            }
        }

        Value::Ext(x) => {
            let key = (Tag::Ext(x.tag()), argument.tag());
            if let Some(f) = registry.constructor(key) {
                return f(registry, &ty, argument);
            }
            let fallback = (Tag::Ext(x.tag()), Tag::Np(NpTerm::ValueCell));
            match registry.constructor(fallback) {
                Some(f) => f(registry, &ty, argument),
                None => Err(Error::UnregisteredCapability {
                    capability: "construct_inhabitant_of",
                    operand: display_lossy(registry, &ty),
                }),
            }
        }

        // Plain values are not constructors.
        _ => Err(Error::UnregisteredCapability {
            capability: "construct_inhabitant_of",
            operand: display_lossy(registry, &ty),
        }),
    }
}

fn construction_failed(registry: &Registry, ty: &Value, argument: &Value) -> Error {
    Error::ConstructionFailed {
        ty: display_lossy(registry, ty),
        argument: display_lossy(registry, argument),
    }
}

/// Generic element access, dispatched by `(container-tag, index-tag)`.
///
/// Arrays and tuples index by any integer kind with negative wraparound;
/// maps index by key under the canonical order. Unsupported pairs are
/// `UnregisteredCapability`; invalid indices are `IndexOutOfRange`.
pub fn element_of(registry: &Registry, container: &Value, index: &Value) -> Result<Value> {
    let container = resolve_or_self(container);
    let index = resolve_or_self(index);

    match &container {
        Value::Array(a) => {
            let wide =
                integer_index(&index).ok_or_else(|| unsupported(registry, &container, &index))?;
            Ok(a.get(narrow_index(registry, &index, wide, a.len())?)?.clone())
        }
        Value::Tuple(t) => {
            let wide =
                integer_index(&index).ok_or_else(|| unsupported(registry, &container, &index))?;
            Ok(t.get(narrow_index(registry, &index, wide, t.len())?)?.clone())
        }
        Value::Map(m) => match m.get(registry, &index) {
            Some(v) => Ok(v.clone()),
            None => Err(Error::IndexOutOfRange {
                index: display_lossy(registry, &index),
                len: m.len(),
            }),
        },
        Value::Ext(x) => {
            let key = (Tag::Ext(x.tag()), index.tag());
            match registry.element_fn(key) {
                Some(f) => f(registry, &container, &index),
                None => Err(unsupported(registry, &container, &index)),
            }
        }
        _ => Err(unsupported(registry, &container, &index)),
    }
}

fn unsupported(registry: &Registry, container: &Value, index: &Value) -> Error {
    Error::UnregisteredCapability {
        capability: "element_of",
        operand: format!(
            "({}, {})",
            display_lossy(registry, container),
            display_lossy(registry, index)
        ),
    }
}

/// Extract a widened index from any integer value kind. `None` means the
/// value is not an integer at all, which is an unsupported dispatch pair;
/// range problems are reported separately by [`narrow_index`].
fn integer_index(index: &Value) -> Option<i128> {
    match index {
        Value::Sint8(x) => Some(*x as i128),
        Value::Sint16(x) => Some(*x as i128),
        Value::Sint32(x) => Some(*x as i128),
        Value::Sint64(x) => Some(*x as i128),
        Value::Uint8(x) => Some(*x as i128),
        Value::Uint16(x) => Some(*x as i128),
        Value::Uint32(x) => Some(*x as i128),
        Value::Uint64(x) => Some(*x as i128),
        _ => None,
    }
}

/// An integer index too wide for `i64` can never address an element; that is
/// out of range for the container, not an unsupported index kind.
fn narrow_index(registry: &Registry, index: &Value, wide: i128, len: usize) -> Result<i64> {
    i64::try_from(wide).map_err(|_| Error::IndexOutOfRange {
        index: display_lossy(registry, index),
        len,
    })
}
