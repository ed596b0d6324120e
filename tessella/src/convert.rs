//! The type-conversion catalog: a small auxiliary registry classifying
//! primitive numeric coercions by information-loss category.
//!
//! Unlike the capability registry this one is closed: it covers exactly the
//! ten concrete numeric kinds (`Sint8..Sint64`, `Uint8..Uint64`, `Float32`,
//! `Float64`). Each (source, target) pair carries a set of
//! [`ConversionFlags`]; pairs marked conditionally lossy are additionally
//! judged per value by [`quality_check`], so that `2.0f64 -> Sint64` is exact
//! while `2.5f64 -> Sint64` is not.
use bitflags::bitflags;

use crate::{
    error::{Error, Result},
    ops,
    registry::Registry,
    tag::NpTerm,
    value::Value,
};

bitflags! {
    /// Static classification of a primitive coercion.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConversionFlags: u8 {
        /// Source and target are the same kind; the conversion is the
        /// identity.
        const SAME_TYPE = 1 << 0;
        /// Every source value maps to a distinct target value; no
        /// information is ever lost.
        const INJECTIVE = 1 << 1;
        /// Every target value is reachable from some source value.
        const SURJECTIVE = 1 << 2;
        /// Information is lost for every non-trivial input.
        const LOSSY = 1 << 3;
        /// Whether information is lost depends on the particular value;
        /// consult [`quality_check`].
        const CONDITIONALLY_LOSSY = 1 << 4;
    }
}

/// Per-value verdict for a conditionally-lossy conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    NotLossy,
    Lossy,
}

/// Whether a lossy outcome aborts the conversion or is carried out anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Refuse with [`Error::LossyConversionRejected`] when information would
    /// be lost.
    #[default]
    Strict,
    /// Perform the conversion regardless. Fractional parts truncate toward
    /// zero and out-of-range values saturate at the target bounds.
    Permissive,
}

/// Uniform intermediate representation of the ten numeric kinds. `i128`
/// holds every integer kind exactly.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i128),
    Float(f64),
}

fn numeric_value(value: &Value) -> Option<(NpTerm, Num)> {
    Some(match value {
        Value::Sint8(x) => (NpTerm::Sint8, Num::Int(*x as i128)),
        Value::Sint16(x) => (NpTerm::Sint16, Num::Int(*x as i128)),
        Value::Sint32(x) => (NpTerm::Sint32, Num::Int(*x as i128)),
        Value::Sint64(x) => (NpTerm::Sint64, Num::Int(*x as i128)),
        Value::Uint8(x) => (NpTerm::Uint8, Num::Int(*x as i128)),
        Value::Uint16(x) => (NpTerm::Uint16, Num::Int(*x as i128)),
        Value::Uint32(x) => (NpTerm::Uint32, Num::Int(*x as i128)),
        Value::Uint64(x) => (NpTerm::Uint64, Num::Int(*x as i128)),
        Value::Float32(x) => (NpTerm::Float32, Num::Float(*x as f64)),
        Value::Float64(x) => (NpTerm::Float64, Num::Float(*x)),
        _ => return None,
    })
}

/// Bit width, signedness, and float-ness of a numeric kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shape {
    bits: u32,
    signed: bool,
    float: bool,
}

fn shape(kind: NpTerm) -> Option<Shape> {
    let (bits, signed, float) = match kind {
        NpTerm::Sint8 => (8, true, false),
        NpTerm::Sint16 => (16, true, false),
        NpTerm::Sint32 => (32, true, false),
        NpTerm::Sint64 => (64, true, false),
        NpTerm::Uint8 => (8, false, false),
        NpTerm::Uint16 => (16, false, false),
        NpTerm::Uint32 => (32, false, false),
        NpTerm::Uint64 => (64, false, false),
        NpTerm::Float32 => (32, false, true),
        NpTerm::Float64 => (64, false, true),
        _ => return None,
    };
    Some(Shape {
        bits,
        signed,
        float,
    })
}

/// Number of integer bits a float kind represents exactly (mantissa plus the
/// implicit leading bit).
fn exact_int_bits(float_bits: u32) -> u32 {
    if float_bits == 32 { 24 } else { 53 }
}

/// Classify the coercion from `from` to `to`.
///
/// Returns `None` when either side is not one of the ten concrete numeric
/// kinds; the catalog has no entry for such a pair.
pub fn classify(from: NpTerm, to: NpTerm) -> Option<ConversionFlags> {
    let f = shape(from)?;
    let t = shape(to)?;

    if from == to {
        return Some(
            ConversionFlags::SAME_TYPE | ConversionFlags::INJECTIVE | ConversionFlags::SURJECTIVE,
        );
    }

    Some(match (f.float, t.float) {
        // Integer to integer: exact when the target range contains the
        // source range, otherwise dependent on the value.
        (false, false) => {
            let widening = if f.signed == t.signed {
                t.bits > f.bits
            } else if t.signed {
                // Unsigned fits in a strictly wider signed kind.
                !f.signed && t.bits > f.bits
            } else {
                false
            };
            if widening {
                ConversionFlags::INJECTIVE
            } else {
                ConversionFlags::CONDITIONALLY_LOSSY | ConversionFlags::SURJECTIVE
            }
        }
        // Integer to float: exact when the mantissa covers the whole source
        // range.
        (false, true) => {
            if f.bits <= exact_int_bits(t.bits) {
                ConversionFlags::INJECTIVE
            } else {
                ConversionFlags::CONDITIONALLY_LOSSY
            }
        }
        // Float to integer: truncation, lossy exactly when the value has a
        // fractional part or falls outside the target range.
        (true, false) => ConversionFlags::CONDITIONALLY_LOSSY | ConversionFlags::SURJECTIVE,
        // Float to float: f32 embeds exactly into f64; the narrowing
        // direction rounds.
        (true, true) => {
            if t.bits > f.bits {
                ConversionFlags::INJECTIVE
            } else {
                ConversionFlags::CONDITIONALLY_LOSSY | ConversionFlags::SURJECTIVE
            }
        }
    })
}

fn int_bounds(target: Shape) -> (i128, i128) {
    if target.signed {
        let max = (1i128 << (target.bits - 1)) - 1;
        (-max - 1, max)
    } else {
        (0, (1i128 << target.bits) - 1)
    }
}

/// Per-value loss predicate for a (value, target-kind) pair.
///
/// Conversions classified `INJECTIVE` or `SAME_TYPE` always report
/// [`Quality::NotLossy`]; for conditionally-lossy pairs the value itself
/// decides.
pub fn quality_check(value: &Value, to: NpTerm) -> Option<Quality> {
    let (from, num) = numeric_value(value)?;
    let flags = classify(from, to)?;
    if !flags.contains(ConversionFlags::CONDITIONALLY_LOSSY) {
        return Some(if flags.contains(ConversionFlags::LOSSY) {
            Quality::Lossy
        } else {
            Quality::NotLossy
        });
    }

    let target = shape(to)?;
    let lossy = match (num, target.float) {
        (Num::Int(i), false) => {
            let (lo, hi) = int_bounds(target);
            i < lo || i > hi
        }
        (Num::Int(i), true) => {
            // Exact iff the float round-trips to the same integer.
            if target.bits == 32 {
                (i as f32) as i128 != i
            } else {
                (i as f64) as i128 != i
            }
        }
        (Num::Float(x), false) => {
            if !x.is_finite() || x.fract() != 0.0 {
                true
            } else {
                let (lo, hi) = int_bounds(target);
                let i = x as i128;
                i < lo || i > hi
            }
        }
        (Num::Float(x), true) => {
            // NaN narrows to NaN; that is not a loss.
            !x.is_nan() && (x as f32) as f64 != x
        }
    };
    Some(if lossy { Quality::Lossy } else { Quality::NotLossy })
}

/// Convert `value` to the numeric kind `to`.
///
/// Under [`Strictness::Strict`] any information loss, as judged by
/// [`quality_check`], is refused with [`Error::LossyConversionRejected`].
/// Under [`Strictness::Permissive`] the conversion always proceeds:
/// fractional parts truncate toward zero and out-of-range values saturate.
/// References are transparent: the resolved referent is converted.
pub fn convert_to(
    registry: &Registry,
    to: NpTerm,
    value: &Value,
    strictness: Strictness,
) -> Result<Value> {
    let resolved = match value {
        Value::Ref(r) => r.resolved()?,
        other => other.clone(),
    };

    let Some((from, num)) = numeric_value(&resolved) else {
        return Err(Error::UnregisteredCapability {
            capability: "convert",
            operand: ops::display_lossy(registry, &resolved),
        });
    };
    let Some(flags) = classify(from, to) else {
        return Err(Error::UnregisteredCapability {
            capability: "convert",
            operand: format!("({from}, {to})"),
        });
    };

    if flags.contains(ConversionFlags::SAME_TYPE) {
        return Ok(resolved);
    }

    if strictness == Strictness::Strict {
        let lossy = flags.contains(ConversionFlags::LOSSY)
            || quality_check(&resolved, to) == Some(Quality::Lossy);
        if lossy {
            return Err(Error::LossyConversionRejected {
                from: from.into(),
                to: to.into(),
                value: ops::display_lossy(registry, &resolved),
            });
        }
    }

    Ok(apply(num, to))
}

fn apply(num: Num, to: NpTerm) -> Value {
    let int = |target: NpTerm| {
        let bounds = int_bounds(shape(target).expect("numeric kind"));
        to_int(num).clamp(bounds.0, bounds.1)
    };
    match to {
        NpTerm::Sint8 => Value::Sint8(int(to) as i8),
        NpTerm::Sint16 => Value::Sint16(int(to) as i16),
        NpTerm::Sint32 => Value::Sint32(int(to) as i32),
        NpTerm::Sint64 => Value::Sint64(int(to) as i64),
        NpTerm::Uint8 => Value::Uint8(int(to) as u8),
        NpTerm::Uint16 => Value::Uint16(int(to) as u16),
        NpTerm::Uint32 => Value::Uint32(int(to) as u32),
        NpTerm::Uint64 => Value::Uint64(int(to) as u64),
        NpTerm::Float32 => Value::Float32(match num {
            Num::Int(i) => i as f32,
            Num::Float(x) => x as f32,
        }),
        NpTerm::Float64 => Value::Float64(match num {
            Num::Int(i) => i as f64,
            Num::Float(x) => x,
        }),
        other => unreachable!("{other} is not a numeric kind"),
    }
}

/// Integer view of the intermediate; [`apply`] clamps the result to the
/// target bounds before the final cast.
fn to_int(num: Num) -> i128 {
    match num {
        Num::Int(i) => i,
        // Saturating, truncating toward zero; NaN goes to zero.
        Num::Float(x) => {
            if x.is_nan() {
                0
            } else {
                x as i128
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn identity_is_exact() {
        let flags = classify(NpTerm::Sint32, NpTerm::Sint32).unwrap();
        assert!(flags.contains(ConversionFlags::SAME_TYPE));
        assert!(flags.contains(ConversionFlags::INJECTIVE));
    }

    #[test]
    fn widening_is_injective() {
        for (from, to) in [
            (NpTerm::Sint8, NpTerm::Sint64),
            (NpTerm::Uint8, NpTerm::Uint32),
            (NpTerm::Uint32, NpTerm::Sint64),
            (NpTerm::Sint32, NpTerm::Float64),
            (NpTerm::Float32, NpTerm::Float64),
        ] {
            let flags = classify(from, to).unwrap();
            assert!(flags.contains(ConversionFlags::INJECTIVE), "{from} -> {to}");
            assert!(
                !flags.contains(ConversionFlags::CONDITIONALLY_LOSSY),
                "{from} -> {to}"
            );
        }
    }

    #[test]
    fn narrowing_and_float_to_int_are_conditional() {
        for (from, to) in [
            (NpTerm::Sint64, NpTerm::Sint8),
            (NpTerm::Sint32, NpTerm::Uint32),
            (NpTerm::Float64, NpTerm::Sint64),
            (NpTerm::Sint64, NpTerm::Float64),
            (NpTerm::Float64, NpTerm::Float32),
        ] {
            let flags = classify(from, to).unwrap();
            assert!(
                flags.contains(ConversionFlags::CONDITIONALLY_LOSSY),
                "{from} -> {to}"
            );
        }
    }

    #[test]
    fn non_numeric_kinds_have_no_entry() {
        assert!(classify(NpTerm::Bool, NpTerm::Sint32).is_none());
        assert!(classify(NpTerm::Sint32, NpTerm::Utf8String).is_none());
    }

    #[test]
    fn strict_rejects_fractional_float_to_int() {
        let registry = Registry::new();
        let err = convert_to(
            &registry,
            NpTerm::Sint64,
            &Value::Float64(2.5),
            Strictness::Strict,
        )
        .unwrap_err();
        assert!(err.is_lossy_conversion_rejected());
    }

    #[test]
    fn strict_accepts_integral_float_to_int() {
        let registry = Registry::new();
        let converted = convert_to(
            &registry,
            NpTerm::Sint64,
            &Value::Float64(2.0),
            Strictness::Strict,
        )
        .unwrap();
        assert!(matches!(converted, Value::Sint64(2)));
    }

    #[test]
    fn permissive_truncates_toward_zero() {
        let registry = Registry::new();
        let converted = convert_to(
            &registry,
            NpTerm::Sint32,
            &Value::Float64(-2.75),
            Strictness::Permissive,
        )
        .unwrap();
        assert!(matches!(converted, Value::Sint32(-2)));
    }

    #[test]
    fn strict_rejects_out_of_range_narrowing() {
        let registry = Registry::new();
        let err = convert_to(
            &registry,
            NpTerm::Sint8,
            &Value::Sint32(1000),
            Strictness::Strict,
        )
        .unwrap_err();
        assert!(err.is_lossy_conversion_rejected());

        let ok = convert_to(
            &registry,
            NpTerm::Sint8,
            &Value::Sint32(100),
            Strictness::Strict,
        )
        .unwrap();
        assert!(matches!(ok, Value::Sint8(100)));
    }

    #[test]
    fn large_int_to_float_quality_depends_on_value() {
        // 2^53 is exactly representable; 2^53 + 1 is not.
        let exact = Value::Sint64(1i64 << 53);
        let inexact = Value::Sint64((1i64 << 53) + 1);
        assert_eq!(
            quality_check(&exact, NpTerm::Float64),
            Some(Quality::NotLossy)
        );
        assert_eq!(
            quality_check(&inexact, NpTerm::Float64),
            Some(Quality::Lossy)
        );
    }

    #[test]
    fn negative_to_unsigned_is_lossy() {
        assert_eq!(
            quality_check(&Value::Sint32(-1), NpTerm::Uint32),
            Some(Quality::Lossy)
        );
        assert_eq!(
            quality_check(&Value::Sint32(7), NpTerm::Uint32),
            Some(Quality::NotLossy)
        );
    }
}
