//! Rendering values to human-readable text.
//!
//! Printing is the one generic operation that deliberately breaks full
//! reference transparency, for termination: it tracks the storage locations
//! it has already entered and prints `<previously-visited>` instead of
//! recursing, so cyclic reference graphs always print in finite time.
use std::fmt::Write;

use smallvec::SmallVec;

use crate::{
    error::{Error, Result},
    registry::Registry,
    value::Value,
};

/// Render `value`, failing with
/// [`Error::UnregisteredCapability`](crate::error::Error::UnregisteredCapability)
/// for extension kinds without a printer and propagating resolution failures
/// from dangling symbolic references.
pub fn render(registry: &Registry, value: &Value) -> Result<String> {
    let mut out = String::new();
    let mut visited = SmallVec::<[usize; 8]>::new();
    write_value(registry, value, &mut out, &mut visited, true)?;
    Ok(out)
}

/// Infallible rendering for diagnostics: unprintable extension values and
/// unresolvable references render as placeholders instead of failing.
pub fn display_lossy(registry: &Registry, value: &Value) -> String {
    let mut out = String::new();
    let mut visited = SmallVec::<[usize; 8]>::new();
    // The lossy mode never produces an error.
    let _ = write_value(registry, value, &mut out, &mut visited, false);
    out
}

fn write_value(
    registry: &Registry,
    value: &Value,
    out: &mut String,
    visited: &mut SmallVec<[usize; 8]>,
    strict: bool,
) -> Result<()> {
    match value {
        Value::Np(np) => {
            let _ = write!(out, "{np}");
        }

        Value::Sint8(x) => {
            let _ = write!(out, "Sint8({x})");
        }
        Value::Sint16(x) => {
            let _ = write!(out, "Sint16({x})");
        }
        Value::Sint32(x) => {
            let _ = write!(out, "Sint32({x})");
        }
        Value::Sint64(x) => {
            let _ = write!(out, "Sint64({x})");
        }
        Value::Uint8(x) => {
            let _ = write!(out, "Uint8({x})");
        }
        Value::Uint16(x) => {
            let _ = write!(out, "Uint16({x})");
        }
        Value::Uint32(x) => {
            let _ = write!(out, "Uint32({x})");
        }
        Value::Uint64(x) => {
            let _ = write!(out, "Uint64({x})");
        }
        Value::Float32(x) => {
            let _ = write!(out, "Float32({x})");
        }
        Value::Float64(x) => {
            let _ = write!(out, "Float64({x})");
        }
        Value::Text(x) => {
            let _ = write!(out, "{x:?}");
        }

        Value::Array(a) => {
            if let Some(c) = a.constraint() {
                write_value(registry, &Value::ArrayType(c.clone()), out, visited, strict)?;
            } else {
                out.push_str("Array");
            }
            write_list(registry, a.elements(), out, visited, strict)?;
        }
        Value::ArrayType(c) => {
            let _ = write!(out, "{}(", c.kind());
            if let Some(ty) = c.element_type() {
                write_value(registry, ty, out, visited, strict)?;
                if c.length().is_some() {
                    out.push_str(", ");
                }
            }
            if let Some(len) = c.length() {
                let _ = write!(out, "{len}");
            }
            out.push(')');
        }
        Value::Map(m) => {
            if let Some(c) = m.constraint() {
                write_value(registry, &Value::MapType(c.clone()), out, visited, strict)?;
            } else {
                out.push_str("OrderedMap");
            }
            out.push('(');
            for (i, (k, v)) in m.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push('(');
                write_value(registry, k, out, visited, strict)?;
                out.push_str(", ");
                write_value(registry, v, out, visited, strict)?;
                out.push(')');
            }
            out.push(')');
        }
        Value::MapType(c) => {
            let _ = write!(out, "{}(", c.kind());
            if let Some(ty) = c.domain_type() {
                write_value(registry, ty, out, visited, strict)?;
                if c.codomain_type().is_some() {
                    out.push_str(", ");
                }
            }
            if let Some(ty) = c.codomain_type() {
                write_value(registry, ty, out, visited, strict)?;
            }
            out.push(')');
        }
        Value::Tuple(t) => {
            out.push_str("Tuple");
            write_list(registry, t.elements(), out, visited, strict)?;
        }
        Value::Union(u) => {
            out.push_str("Union");
            write_list(registry, u.members(), out, visited, strict)?;
        }

        // One cell per step, so the visited check fires before any cycle can
        // be chased to a (nonexistent) final referent.
        Value::Ref(r) => match r.referenced_cell() {
            Ok(cell) => {
                let id = std::rc::Rc::as_ptr(&cell) as usize;
                if visited.contains(&id) {
                    out.push_str("<previously-visited>");
                } else {
                    visited.push(id);
                    let referent = cell.borrow().clone();
                    write_value(registry, &referent, out, visited, strict)?;
                }
            }
            Err(e) if strict => return Err(e),
            Err(_) => {
                let _ = write!(out, "<unresolved {}>", r.kind());
            }
        },

        Value::Ext(x) => match registry.printer(x.tag()) {
            Some(p) => out.push_str(&p(registry, x)),
            None if strict => {
                return Err(Error::UnregisteredCapability {
                    capability: "print",
                    operand: match registry.ext_name(x.tag()) {
                        Some(name) => name.to_owned(),
                        None => x.tag().to_string(),
                    },
                });
            }
            None => {
                let _ = write!(
                    out,
                    "<{}>",
                    registry
                        .ext_name(x.tag())
                        .map(str::to_owned)
                        .unwrap_or_else(|| x.tag().to_string())
                );
            }
        },
    }
    Ok(())
}

fn write_list(
    registry: &Registry,
    elements: &[Value],
    out: &mut String,
    visited: &mut SmallVec<[usize; 8]>,
    strict: bool,
) -> Result<()> {
    out.push('(');
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_value(registry, element, out, visited, strict)?;
    }
    out.push(')');
    Ok(())
}
