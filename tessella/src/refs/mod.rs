//! The reference-transparency layer.
//!
//! A reference must be indistinguishable from its referent under every
//! generic operation (equality, inhabitation, printing, indexing), while
//! still being inspectable as a first-class value when explicitly requested.
//! Three implementations exist:
//!
//! - [`MemRef`]: a shared storage cell (reference-counted, so the pointee
//!   cannot dangle; aliasing the same cell yields references that compare
//!   equal by location).
//! - [`GlobalSymRef`]: a name resolved against the process-wide symbol table.
//! - [`LocalSymRef`]: a name plus a handle to a specific table instance.
//!
//! Dereferencing is recursive, since a reference may point at another
//! reference. Printing is the one operation that deliberately breaks full
//! transparency: it tracks visited storage locations and prints
//! `<previously-visited>` instead of recursing forever on cyclic graphs
//! (see [`ops::render`](crate::ops::render)). No other operation guards
//! against reference cycles; not constructing them is a caller contract.
use std::rc::Rc;

use crate::{
    error::Result,
    refs::symbol::{BindingCell, SharedTable, global_table},
    tag::NpTerm,
    value::Value,
};

pub mod symbol;

/// The shared contract of every reference kind: expose the storage cell of
/// the immediate referent.
pub trait TransparentRef {
    /// Storage cell holding the referent. Symbolic kinds perform the table
    /// lookup here and fail with
    /// [`Error::UnresolvedSymbol`](crate::error::Error::UnresolvedSymbol).
    fn referenced_cell(&self) -> Result<BindingCell>;
}

/// A direct reference to a shared in-memory storage cell.
#[derive(Debug, Clone)]
pub struct MemRef {
    cell: BindingCell,
}

impl MemRef {
    /// Allocate a fresh storage cell holding `value` and reference it.
    pub fn new(value: Value) -> Self {
        Self {
            cell: Rc::new(std::cell::RefCell::new(value)),
        }
    }

    /// Reference an existing cell. Two references built from the same cell
    /// compare equal by storage location.
    pub fn from_cell(cell: BindingCell) -> Self {
        Self { cell }
    }

    /// The underlying storage cell.
    pub fn cell(&self) -> BindingCell {
        Rc::clone(&self.cell)
    }
}

impl TransparentRef for MemRef {
    fn referenced_cell(&self) -> Result<BindingCell> {
        Ok(Rc::clone(&self.cell))
    }
}

/// A reference resolved by name against the process-wide symbol table.
#[derive(Debug, Clone)]
pub struct GlobalSymRef {
    name: String,
}

impl GlobalSymRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TransparentRef for GlobalSymRef {
    fn referenced_cell(&self) -> Result<BindingCell> {
        global_table().borrow().resolve(&self.name)
    }
}

/// A reference resolved by name against a specific symbol table instance.
#[derive(Debug, Clone)]
pub struct LocalSymRef {
    name: String,
    table: SharedTable,
}

impl LocalSymRef {
    pub fn new(name: impl Into<String>, table: SharedTable) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> SharedTable {
        Rc::clone(&self.table)
    }
}

impl TransparentRef for LocalSymRef {
    fn referenced_cell(&self) -> Result<BindingCell> {
        self.table.borrow().resolve(&self.name)
    }
}

/// Any reference value.
#[derive(Debug, Clone)]
pub enum RefTerm {
    Mem(MemRef),
    Global(GlobalSymRef),
    Local(LocalSymRef),
}

impl RefTerm {
    /// The representation tag of this reference kind.
    pub fn kind(&self) -> NpTerm {
        match self {
            RefTerm::Mem(_) => NpTerm::MemRef,
            RefTerm::Global(_) => NpTerm::GlobalSymRef,
            RefTerm::Local(_) => NpTerm::LocalSymRef,
        }
    }

    /// Storage cell of the immediate referent.
    pub fn referenced_cell(&self) -> Result<BindingCell> {
        match self {
            RefTerm::Mem(r) => r.referenced_cell(),
            RefTerm::Global(r) => r.referenced_cell(),
            RefTerm::Local(r) => r.referenced_cell(),
        }
    }

    /// Storage cell of the final, non-reference referent, chasing chained
    /// references.
    pub fn final_cell(&self) -> Result<BindingCell> {
        let mut cell = self.referenced_cell()?;
        loop {
            let next = match &*cell.borrow() {
                Value::Ref(inner) => Some(inner.referenced_cell()?),
                _ => None,
            };
            match next {
                Some(next) => cell = next,
                None => return Ok(cell),
            }
        }
    }

    /// Stable identity of the final storage location, used for location-based
    /// equality and the printer's cycle guard.
    pub fn storage_id(&self) -> Result<usize> {
        Ok(Rc::as_ptr(&self.final_cell()?) as usize)
    }

    /// A copy of the final referent value.
    pub fn resolved(&self) -> Result<Value> {
        Ok(self.final_cell()?.borrow().clone())
    }

    /// Replace the final referent through this reference.
    ///
    /// Mutation through a reference into a constrained container goes through
    /// the container's own checked operations; assigning a whole cell here is
    /// unconditional.
    pub fn assign(&self, value: Value) -> Result<()> {
        *self.final_cell()?.borrow_mut() = value;
        Ok(())
    }
}

/// Resolve `value` to a non-reference value, copying out of the storage cell.
/// Non-references are returned as-is (cloned).
pub fn resolved_value(value: &Value) -> Result<Value> {
    match value {
        Value::Ref(r) => r.resolved(),
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chained_refs_resolve_to_final_referent() {
        let inner = MemRef::new(Value::from(7i32));
        let outer = RefTerm::Mem(MemRef::new(Value::Ref(RefTerm::Mem(inner.clone()))));
        assert!(matches!(outer.resolved().unwrap(), Value::Sint32(7)));
        assert_eq!(
            outer.storage_id().unwrap(),
            RefTerm::Mem(inner).storage_id().unwrap()
        );
    }

    #[test]
    fn assign_writes_through_the_chain() {
        let target = MemRef::new(Value::from(1i32));
        let alias = RefTerm::Mem(MemRef::from_cell(target.cell()));
        alias.assign(Value::from(2i32)).unwrap();
        assert!(matches!(
            RefTerm::Mem(target).resolved().unwrap(),
            Value::Sint32(2)
        ));
    }
}
