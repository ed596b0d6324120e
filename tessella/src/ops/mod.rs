//! Generic operations over value cells.
//!
//! Every operation takes the [`Registry`] explicitly and dispatches
//! exhaustively over the closed [`Value`] variants; only the open `Ext`
//! variant consults the registry tables. References are resolved before
//! tag-based dispatch (recursively, since a reference may point at another
//! reference), which is what makes them transparent under every operation
//! here.
//!
//! Two operations deliberately never fail:
//! - [`inhabits`](typing::inhabits) treats unknown pairs as "does not
//!   inhabit";
//! - [`compare`] degrades to [`TermOrdering::Unspecified`] instead of
//!   inventing an order for unrelated kinds.
//!
//! `abstract_type_of`, by contrast, errors on unregistered extension tags.
//! The asymmetry is deliberate and load-bearing; do not unify the defaults.
use std::cmp::Ordering;
use std::hash::{DefaultHasher, Hash, Hasher};

use log::debug;

use crate::{
    error::{Error, Result},
    registry::Registry,
    tag::Tag,
    value::Value,
};

pub mod construct;
pub mod render;
pub mod typing;

pub use construct::{construct_inhabitant_of, element_of};
pub use render::{display_lossy, render};
pub use typing::{abstract_type_of, inhabits};

/// Outcome of the public three-way comparison.
///
/// `Unspecified` replaces the silent descriptor-identity fallback of older
/// designs: it signals "no meaningful order is registered for this pair"
/// instead of producing a stable-but-meaningless answer. Ordered containers
/// use [`compare_total`] internally, which never degrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermOrdering {
    Less,
    Equal,
    Greater,
    /// The operands have no registered comparator (unrelated representation
    /// kinds, or an extension kind without a `compare` capability).
    Unspecified,
}

impl From<Ordering> for TermOrdering {
    fn from(ord: Ordering) -> Self {
        match ord {
            Ordering::Less => TermOrdering::Less,
            Ordering::Equal => TermOrdering::Equal,
            Ordering::Greater => TermOrdering::Greater,
        }
    }
}

/// Total rank of a tag, used when a stable cross-kind order is required:
/// singleton discriminants first, extension tags after.
fn tag_rank(tag: Tag) -> u64 {
    match tag {
        Tag::Np(np) => np.discriminant() as u64,
        Tag::Ext(ext) => 0x1000 + ext.0 as u64,
    }
}

/// Resolve a reference operand to its final referent, or return the operand
/// unchanged (cloned) if it is not a reference or cannot be resolved.
///
/// Unresolvable symbolic references stay as-is so the caller can decide how
/// to degrade; every non-erroring operation treats them as a kind of their
/// own.
pub(crate) fn resolve_or_self(value: &Value) -> Value {
    match value {
        Value::Ref(r) => r.resolved().unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}

/// Structural equality with transparent dereferencing.
///
/// Tag mismatch means "not equal" without consulting the registry: distinct
/// representations are never equal. Two references resolving to the same
/// storage location are equal before any structural comparison. Extension
/// values without an equality or comparison capability are never equal.
pub fn equals(registry: &Registry, a: &Value, b: &Value) -> bool {
    if let (Value::Ref(x), Value::Ref(y)) = (a, b)
        && let (Ok(i), Ok(j)) = (x.storage_id(), y.storage_id())
        && i == j
    {
        return true;
    }
    let a = resolve_or_self(a);
    let b = resolve_or_self(b);
    if a.is_ref() || b.is_ref() {
        // At least one unresolvable reference survived; without a storage
        // location match there is nothing to compare.
        return false;
    }
    if a.tag() != b.tag() {
        return false;
    }
    if let (Value::Ext(x), Value::Ext(y)) = (&a, &b) {
        if let Some(eq) = registry.eq_fn(x.tag()) {
            return eq(registry, x, y);
        }
        if let Some(cmp) = registry.cmp_fn(x.tag()) {
            return cmp(registry, x, y) == Ordering::Equal;
        }
        return false;
    }
    compare_total(registry, &a, &b) == Ordering::Equal
}

/// Public three-way comparison.
///
/// Meaningful (`Less`/`Equal`/`Greater`) only for operands of the same
/// representation kind with a comparator; everything else is
/// [`TermOrdering::Unspecified`]. Consistent with [`equals`]:
/// `compare(a, b) == Equal` iff `equals(a, b)` for every comparable pair.
pub fn compare(registry: &Registry, a: &Value, b: &Value) -> TermOrdering {
    let a = resolve_or_self(a);
    let b = resolve_or_self(b);
    if a.is_ref() || b.is_ref() {
        return TermOrdering::Unspecified;
    }
    if a.tag() != b.tag() {
        return TermOrdering::Unspecified;
    }
    if let (Value::Ext(x), Value::Ext(_)) = (&a, &b)
        && registry.cmp_fn(x.tag()).is_none()
    {
        debug!(
            "no comparator registered for extension {}; ordering unspecified",
            x.tag()
        );
        return TermOrdering::Unspecified;
    }
    compare_total(registry, &a, &b).into()
}

/// Total order over all values, used by ordered maps as their key order and
/// available wherever a canonical arrangement is required.
///
/// Cross-kind operands order by tag rank; floats use IEEE total ordering (so
/// NaN participates and equals itself, keeping maps usable); extension kinds
/// without a comparator fall back to payload address, which is stable within
/// a process run and nothing more.
pub fn compare_total(registry: &Registry, a: &Value, b: &Value) -> Ordering {
    let a = resolve_or_self(a);
    let b = resolve_or_self(b);
    let (ta, tb) = (a.tag(), b.tag());
    if ta != tb {
        return tag_rank(ta).cmp(&tag_rank(tb));
    }
    match (&a, &b) {
        // Same tag means the same singleton.
        (Value::Np(_), Value::Np(_)) => Ordering::Equal,

        (Value::Sint8(x), Value::Sint8(y)) => x.cmp(y),
        (Value::Sint16(x), Value::Sint16(y)) => x.cmp(y),
        (Value::Sint32(x), Value::Sint32(y)) => x.cmp(y),
        (Value::Sint64(x), Value::Sint64(y)) => x.cmp(y),
        (Value::Uint8(x), Value::Uint8(y)) => x.cmp(y),
        (Value::Uint16(x), Value::Uint16(y)) => x.cmp(y),
        (Value::Uint32(x), Value::Uint32(y)) => x.cmp(y),
        (Value::Uint64(x), Value::Uint64(y)) => x.cmp(y),
        (Value::Float32(x), Value::Float32(y)) => x.total_cmp(y),
        (Value::Float64(x), Value::Float64(y)) => x.total_cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),

        // Containers compare their contents only; declared constraints do
        // not participate (the documented weak equality).
        (Value::Array(x), Value::Array(y)) => {
            compare_slices(registry, x.elements(), y.elements())
        }
        (Value::Tuple(x), Value::Tuple(y)) => {
            compare_slices(registry, x.elements(), y.elements())
        }
        (Value::Union(x), Value::Union(y)) => {
            compare_slices(registry, x.members(), y.members())
        }
        (Value::Map(x), Value::Map(y)) => {
            for ((ka, va), (kb, vb)) in x.iter().zip(y.iter()) {
                let key_ord = compare_total(registry, ka, kb);
                if key_ord != Ordering::Equal {
                    return key_ord;
                }
                let value_ord = compare_total(registry, va, vb);
                if value_ord != Ordering::Equal {
                    return value_ord;
                }
            }
            x.len().cmp(&y.len())
        }

        // Equal tags guarantee equal constraint kinds, so the optional
        // fields below line up.
        (Value::ArrayType(x), Value::ArrayType(y)) => {
            if let (Some(ex), Some(ey)) = (x.element_type(), y.element_type()) {
                let ord = compare_total(registry, ex, ey);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.length().cmp(&y.length())
        }
        (Value::MapType(x), Value::MapType(y)) => {
            if let (Some(dx), Some(dy)) = (x.domain_type(), y.domain_type()) {
                let ord = compare_total(registry, dx, dy);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            if let (Some(cx), Some(cy)) = (x.codomain_type(), y.codomain_type()) {
                let ord = compare_total(registry, cx, cy);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        }

        // Unresolvable symbolic references order among themselves by name.
        (Value::Ref(x), Value::Ref(y)) => ref_sort_key(x).cmp(&ref_sort_key(y)),

        (Value::Ext(x), Value::Ext(y)) => match registry.cmp_fn(x.tag()) {
            Some(cmp) => cmp(registry, x, y),
            None => {
                debug!(
                    "falling back to payload-address order for extension {}",
                    x.tag()
                );
                ext_addr(x).cmp(&ext_addr(y))
            }
        },

        // A singleton shares its tag with the values it classifies (the
        // `Sint32` descriptor vs a sint32 value, `Array` vs an array). The
        // descriptor sorts before every carrier of the same tag.
        (Value::Np(_), _) => Ordering::Less,
        (_, Value::Np(_)) => Ordering::Greater,

        _ => unreachable!("tag-equal values with mismatched representations"),
    }
}

fn compare_slices(registry: &Registry, a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = compare_total(registry, x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn ref_sort_key(r: &crate::refs::RefTerm) -> (u8, String) {
    use crate::refs::RefTerm;
    match r {
        RefTerm::Mem(m) => (0, format!("{:p}", std::rc::Rc::as_ptr(&m.cell()))),
        RefTerm::Global(g) => (1, g.name().to_owned()),
        RefTerm::Local(l) => (2, l.name().to_owned()),
    }
}

fn ext_addr(v: &crate::registry::ExtValue) -> usize {
    // Thin part of the trait-object pointer; stable for the lifetime of the
    // payload allocation.
    v.downcast_addr()
}

/// Feed `value` into a hasher, consistently with [`equals`]: equal values
/// hash identically (declared container constraints are excluded, floats
/// hash by bit pattern).
///
/// Fails with [`Error::UnregisteredCapability`] for an extension kind
/// without a hash capability, and propagates resolution failures from
/// dangling symbolic references.
pub fn hash_value<H: Hasher>(registry: &Registry, value: &Value, state: &mut H) -> Result<()> {
    let value = match value {
        Value::Ref(r) => r.resolved()?,
        other => other.clone(),
    };
    state.write_u64(tag_rank(value.tag()));
    match &value {
        Value::Np(_) => {}
        Value::Sint8(x) => x.hash(state),
        Value::Sint16(x) => x.hash(state),
        Value::Sint32(x) => x.hash(state),
        Value::Sint64(x) => x.hash(state),
        Value::Uint8(x) => x.hash(state),
        Value::Uint16(x) => x.hash(state),
        Value::Uint32(x) => x.hash(state),
        Value::Uint64(x) => x.hash(state),
        Value::Float32(x) => x.to_bits().hash(state),
        Value::Float64(x) => x.to_bits().hash(state),
        Value::Text(x) => x.hash(state),
        Value::Array(x) => {
            for element in x.iter() {
                hash_value(registry, element, state)?;
            }
        }
        Value::Tuple(x) => {
            for element in x.iter() {
                hash_value(registry, element, state)?;
            }
        }
        Value::Union(x) => {
            for member in x.members() {
                hash_value(registry, member, state)?;
            }
        }
        Value::Map(x) => {
            for (k, v) in x.iter() {
                hash_value(registry, k, state)?;
                hash_value(registry, v, state)?;
            }
        }
        Value::ArrayType(c) => {
            if let Some(ty) = c.element_type() {
                hash_value(registry, ty, state)?;
            }
            c.length().hash(state);
        }
        Value::MapType(c) => {
            if let Some(ty) = c.domain_type() {
                hash_value(registry, ty, state)?;
            }
            if let Some(ty) = c.codomain_type() {
                hash_value(registry, ty, state)?;
            }
        }
        Value::Ref(_) => unreachable!("references are resolved above"),
        Value::Ext(x) => match registry.hasher(x.tag()) {
            Some(h) => state.write_u64(h(registry, x)),
            None => {
                return Err(Error::UnregisteredCapability {
                    capability: "hash",
                    operand: display_lossy(registry, &value),
                });
            }
        },
    }
    Ok(())
}

/// Convenience 64-bit hash via [`DefaultHasher`].
pub fn hash64(registry: &Registry, value: &Value) -> Result<u64> {
    let mut hasher = DefaultHasher::new();
    hash_value(registry, value, &mut hasher)?;
    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::NpTerm;

    #[test]
    fn descriptor_is_distinct_from_its_carriers() {
        let registry = Registry::new();
        // The `Sint32` singleton and a sint32 value share a dispatch tag but
        // are different values with a stable relative order.
        let descriptor = Value::Np(NpTerm::Sint32);
        let carrier = Value::from(5i32);
        assert!(!equals(&registry, &descriptor, &carrier));
        assert_eq!(
            compare_total(&registry, &descriptor, &carrier),
            Ordering::Less
        );
        assert_eq!(
            compare_total(&registry, &carrier, &descriptor),
            Ordering::Greater
        );
    }

    #[test]
    fn cross_kind_total_order_is_antisymmetric() {
        let registry = Registry::new();
        let a = Value::from(1i32);
        let b = Value::from("text");
        assert_eq!(
            compare_total(&registry, &a, &b),
            compare_total(&registry, &b, &a).reverse()
        );
        assert_eq!(compare(&registry, &a, &b), TermOrdering::Unspecified);
    }
}
