//! Hierarchical symbol tables with shadowing.
//!
//! A table maps names to storage cells and optionally chains to a shared
//! parent table. Child tables may outlive the scope that created them (they
//! are reference-counted), which is what lets local symbol references stay
//! valid after their defining scope unwinds.
use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use log::debug;

use crate::{
    error::{Error, Result},
    value::Value,
};

/// Shared handle to a symbol table.
pub type SharedTable = Rc<RefCell<SymbolTable>>;

/// Storage cell for a single binding. Every binding has a stable storage
/// location, which is what reference equality compares.
pub type BindingCell = Rc<RefCell<Value>>;

/// A mapping from names to values plus an optional parent table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    bindings: BTreeMap<String, BindingCell>,
    parent: Option<SharedTable>,
}

impl SymbolTable {
    /// A fresh root table with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh shared root table.
    pub fn shared() -> SharedTable {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Create a child table whose parent is `parent`, for lexical scoping.
    pub fn push_child(parent: &SharedTable) -> SharedTable {
        Rc::new(RefCell::new(Self {
            bindings: BTreeMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    /// Bind `name` in this table.
    ///
    /// Fails with [`Error::DuplicateSymbol`] if `name` already exists in
    /// *this* table specifically; shadowing a parent's binding is allowed.
    pub fn define(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        if self.bindings.contains_key(&name) {
            return Err(Error::DuplicateSymbol { name });
        }
        debug!("defining symbol `{name}`");
        self.bindings
            .insert(name, Rc::new(RefCell::new(value)));
        Ok(())
    }

    /// Resolve `name`, walking up the parent chain.
    pub fn resolve(&self, name: &str) -> Result<BindingCell> {
        if let Some(cell) = self.bindings.get(name) {
            return Ok(Rc::clone(cell));
        }
        match &self.parent {
            Some(parent) => parent.borrow().resolve(name),
            None => Err(Error::UnresolvedSymbol {
                name: name.to_owned(),
            }),
        }
    }

    /// True if `name` resolves anywhere in the chain.
    pub fn is_defined(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// True if `name` is bound in this table itself, ignoring parents.
    pub fn is_defined_locally(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Reset to an empty table with no parent.
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.parent = None;
    }

    /// Number of bindings in this table itself.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

thread_local! {
    static GLOBAL_TABLE: SharedTable = SymbolTable::shared();
}

/// Handle to the process-wide (thread-local) global symbol table that
/// [`GlobalSymRef`](crate::refs::GlobalSymRef) resolves against.
pub fn global_table() -> SharedTable {
    GLOBAL_TABLE.with(Rc::clone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_and_parent_chain() {
        let parent = SymbolTable::shared();
        parent.borrow_mut().define("x", Value::from(1i32)).unwrap();

        let child = SymbolTable::push_child(&parent);
        // Resolves through the parent chain.
        assert!(child.borrow().resolve("x").is_ok());

        // Shadowing the parent binding is allowed.
        child.borrow_mut().define("x", Value::from(2i32)).unwrap();
        let cell = child.borrow().resolve("x").unwrap();
        assert!(matches!(&*cell.borrow(), Value::Sint32(2)));

        // Redefinition in the same table is not.
        let err = child.borrow_mut().define("x", Value::from(3i32)).unwrap_err();
        assert!(err.is_duplicate_symbol());
    }

    #[test]
    fn clear_detaches_parent() {
        let parent = SymbolTable::shared();
        parent.borrow_mut().define("y", Value::void()).unwrap();
        let child = SymbolTable::push_child(&parent);
        child.borrow_mut().clear();
        assert!(child.borrow().resolve("y").is_err());
    }
}
