//! Discriminated (existential) unions of member types.
use crate::{ops, registry::Registry, value::Value};

/// An ordered, non-deduplicated sequence of member types.
///
/// A term inhabits a union iff it inhabits at least one member. Member order
/// matters only for avoiding redundant checks (the first structural match
/// wins), never for semantics.
#[derive(Debug, Clone, Default)]
pub struct UnionTerm {
    members: Vec<Value>,
}

impl UnionTerm {
    pub fn new(members: Vec<Value>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[Value] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Existential membership test, short-circuiting at the first success.
    pub fn accepts(&self, registry: &Registry, value: &Value) -> bool {
        self.members
            .iter()
            .any(|member| ops::inhabits(registry, value, member))
    }
}

/// Build a union type from member types.
pub fn union_of<I, T>(members: I) -> Value
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    Value::Union(UnionTerm::new(
        members.into_iter().map(Into::into).collect(),
    ))
}
