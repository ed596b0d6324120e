//! Arrays and the array constraint family.
//!
//! Four constraint flavors exist: fully free (`Array`, the singleton),
//! element-type + length (`ArrayES`), element-type only (`ArrayE`), and
//! length only (`ArrayS`). The free flavor is the [`NpTerm::Array`] singleton
//! itself; the other three are [`ArrayConstraint`] values.
use crate::{
    containers::resolve_index,
    error::{Error, Result},
    ops,
    registry::Registry,
    tag::NpTerm,
    value::Value,
};

/// A first-class array type constraint.
///
/// Constraints are ordinary values: they can be compared, printed,
/// serialized, and applied as constructors.
#[derive(Debug, Clone)]
pub enum ArrayConstraint {
    /// `ArrayES(T, n)`: element type and exact length both fixed.
    ElementAndLength { element_type: Box<Value>, length: u64 },
    /// `ArrayE(T)`: element type fixed, any length.
    Element { element_type: Box<Value> },
    /// `ArrayS(n)`: exact length fixed, any element type.
    Length { length: u64 },
}

impl ArrayConstraint {
    /// `ArrayES`: fix both the element type and the length.
    pub fn element_and_length(element_type: Value, length: u64) -> Self {
        ArrayConstraint::ElementAndLength {
            element_type: Box::new(element_type),
            length,
        }
    }

    /// `ArrayE`: fix the element type only.
    pub fn element(element_type: Value) -> Self {
        ArrayConstraint::Element {
            element_type: Box::new(element_type),
        }
    }

    /// `ArrayS`: fix the length only.
    pub fn length_only(length: u64) -> Self {
        ArrayConstraint::Length { length }
    }

    /// The constructor singleton this constraint is an application of.
    pub fn kind(&self) -> NpTerm {
        match self {
            ArrayConstraint::ElementAndLength { .. } => NpTerm::ArrayES,
            ArrayConstraint::Element { .. } => NpTerm::ArrayE,
            ArrayConstraint::Length { .. } => NpTerm::ArrayS,
        }
    }

    /// Declared element type, if this flavor fixes one.
    pub fn element_type(&self) -> Option<&Value> {
        match self {
            ArrayConstraint::ElementAndLength { element_type, .. }
            | ArrayConstraint::Element { element_type } => Some(element_type),
            ArrayConstraint::Length { .. } => None,
        }
    }

    /// Declared length, if this flavor fixes one.
    pub fn length(&self) -> Option<u64> {
        match self {
            ArrayConstraint::ElementAndLength { length, .. }
            | ArrayConstraint::Length { length } => Some(*length),
            ArrayConstraint::Element { .. } => None,
        }
    }

    /// Check `elements` against this constraint, reporting the first
    /// violation.
    pub fn verify(&self, registry: &Registry, elements: &[Value]) -> Result<()> {
        if let Some(expected) = self.length()
            && elements.len() as u64 != expected
        {
            return Err(Error::ConstraintViolation {
                reason: format!(
                    "expected exactly {expected} element(s), got {}",
                    elements.len()
                ),
            });
        }
        if let Some(ty) = self.element_type() {
            for (i, element) in elements.iter().enumerate() {
                if !ops::inhabits(registry, element, ty) {
                    return Err(Error::ConstraintViolation {
                        reason: format!(
                            "element {i} ({}) does not inhabit declared element type {}",
                            ops::display_lossy(registry, element),
                            ops::display_lossy(registry, ty),
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// An ordered sequence of values, optionally carrying a declared constraint.
#[derive(Debug, Clone)]
pub struct ArrayTerm {
    elements: Vec<Value>,
    constraint: Option<ArrayConstraint>,
}

impl ArrayTerm {
    /// Build an unconstrained array. Never fails.
    pub fn new(elements: Vec<Value>) -> Self {
        Self {
            elements,
            constraint: None,
        }
    }

    /// Build an array under `constraint`, verifying membership first.
    pub fn with_constraint(
        registry: &Registry,
        constraint: ArrayConstraint,
        elements: Vec<Value>,
    ) -> Result<Self> {
        constraint.verify(registry, &elements)?;
        Ok(Self {
            elements,
            constraint: Some(constraint),
        })
    }

    /// The declared type of this array: its constraint if any, the free
    /// `Array` singleton otherwise.
    pub fn declared_type(&self) -> Value {
        match &self.constraint {
            Some(c) => Value::ArrayType(c.clone()),
            None => Value::Np(NpTerm::Array),
        }
    }

    pub fn constraint(&self) -> Option<&ArrayConstraint> {
        self.constraint.as_ref()
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.elements.iter()
    }

    /// Bounds-checked access with negative-index wraparound (`-1` is the last
    /// element).
    pub fn get(&self, index: i64) -> Result<&Value> {
        let i = resolve_index(index, self.elements.len())?;
        Ok(&self.elements[i])
    }

    /// Replace an element, re-verifying the declared constraint first.
    ///
    /// The length cannot change through this operation, so only the element
    /// type (if declared) is re-checked.
    pub fn checked_set(&mut self, registry: &Registry, index: i64, value: Value) -> Result<()> {
        let i = resolve_index(index, self.elements.len())?;
        if let Some(ty) = self.constraint.as_ref().and_then(|c| c.element_type())
            && !ops::inhabits(registry, &value, ty)
        {
            return Err(Error::ConstraintViolation {
                reason: format!(
                    "replacement element {} does not inhabit declared element type {}",
                    ops::display_lossy(registry, &value),
                    ops::display_lossy(registry, ty),
                ),
            });
        }
        self.elements[i] = value;
        Ok(())
    }

    /// Append an element, re-verifying the declared constraint.
    ///
    /// Fails on length-constrained arrays (the length would change) and on
    /// element-type violations.
    pub fn checked_push(&mut self, registry: &Registry, value: Value) -> Result<()> {
        if let Some(c) = &self.constraint {
            let mut candidate: Vec<Value> = Vec::with_capacity(self.elements.len() + 1);
            candidate.extend_from_slice(&self.elements);
            candidate.push(value.clone());
            c.verify(registry, &candidate)?;
        }
        self.elements.push(value);
        Ok(())
    }

    pub(crate) fn into_elements(self) -> Vec<Value> {
        self.elements
    }
}

/// Convenience constructor used pervasively in tests and by callers:
/// `array_of([1, 2, 3])` builds an unconstrained array from anything
/// convertible to `Value`.
pub fn array_of<I, T>(elements: I) -> Value
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    Value::Array(ArrayTerm::new(
        elements.into_iter().map(Into::into).collect(),
    ))
}
