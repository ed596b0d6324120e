//! Structural container types: arrays, ordered maps, tuples, and unions.
//!
//! Containers whose element/key/value types and/or lengths are fixed at the
//! type level carry their constraint as first-class data (the constraint
//! objects are ordinary [`Value`](crate::value::Value)s). Membership against
//! the declared constraint is verified on construction and on every mutation;
//! a violation surfaces as
//! [`Error::ConstraintViolation`](crate::error::Error::ConstraintViolation).
use crate::error::{Error, Result};

pub mod array;
pub mod map;
pub mod tuple;
pub mod union;

/// Resolve a possibly-negative index against a container of length `len`.
///
/// Index `-1` addresses the last element; indices more than one full length
/// before the start, or at/after the length, are out of range.
pub(crate) fn resolve_index(index: i64, len: usize) -> Result<usize> {
    let resolved = if index < 0 {
        index + len as i64
    } else {
        index
    };
    if resolved < 0 || resolved as usize >= len {
        return Err(Error::IndexOutOfRange {
            index: index.to_string(),
            len,
        });
    }
    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_wraparound() {
        assert_eq!(resolve_index(0, 3).unwrap(), 0);
        assert_eq!(resolve_index(2, 3).unwrap(), 2);
        assert_eq!(resolve_index(-1, 3).unwrap(), 2);
        assert_eq!(resolve_index(-3, 3).unwrap(), 0);
        assert!(resolve_index(3, 3).is_err());
        assert!(resolve_index(-4, 3).is_err());
        assert!(resolve_index(0, 0).is_err());
    }
}
