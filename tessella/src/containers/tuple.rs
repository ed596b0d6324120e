//! Fixed-arity heterogeneous tuples.
use crate::{containers::resolve_index, error::Result, value::Value};

/// A position-indexed sequence of heterogeneous values.
///
/// Equality and ordering are positional and require equal arity; both are
/// implemented in [`ops`](crate::ops).
#[derive(Debug, Clone, Default)]
pub struct TupleTerm {
    elements: Vec<Value>,
}

impl TupleTerm {
    pub fn new(elements: Vec<Value>) -> Self {
        Self { elements }
    }

    /// Arity of the tuple.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.elements.iter()
    }

    /// Bounds-checked positional access with negative-index wraparound.
    pub fn get(&self, index: i64) -> Result<&Value> {
        let i = resolve_index(index, self.elements.len())?;
        Ok(&self.elements[i])
    }

    pub(crate) fn into_elements(self) -> Vec<Value> {
        self.elements
    }
}

/// Build a tuple value from anything convertible to `Value`.
pub fn tuple_of<I, T>(elements: I) -> Value
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    Value::Tuple(TupleTerm::new(
        elements.into_iter().map(Into::into).collect(),
    ))
}
