//! The capability registry for open extension kinds.
//!
//! The closed part of the algebra (every [`Value`](crate::value::Value)
//! variant except [`Ext`](crate::value::Value::Ext)) dispatches exhaustively
//! in Rust `match` arms inside [`ops`](crate::ops); the registry only carries
//! implementations for extension kinds, keyed by one or two tags.
//!
//! A [`Registry`] is an explicit, immutable value built once at program start
//! through [`RegistryBuilder`] with an ordered list of registration calls,
//! then passed by reference into every generic operation. There is no
//! ambient global registry and no static-initialization ordering to get
//! wrong. Registration is append-only: a second registration for the same
//! key is a fatal configuration error and aborts during building, never at
//! runtime.
use std::{any::Any, collections::BTreeMap, io};

use log::debug;

use crate::{
    error::Result,
    tag::{ExtTag, Tag},
    value::Value,
};

/// Behavior an extension value must provide on its own; everything else
/// (printing, equality, inhabitation, serialization, ...) is registered as a
/// capability against the extension's tag.
pub trait ExtensionTerm: std::fmt::Debug {
    /// Clone into a fresh box; extension values keep value semantics.
    fn clone_box(&self) -> Box<dyn ExtensionTerm>;

    /// Downcasting support for capability implementations.
    fn as_any(&self) -> &dyn Any;
}

/// An extension value: a registry-issued tag plus the boxed payload.
#[derive(Debug)]
pub struct ExtValue {
    tag: ExtTag,
    inner: Box<dyn ExtensionTerm>,
}

impl ExtValue {
    pub fn new(tag: ExtTag, inner: Box<dyn ExtensionTerm>) -> Self {
        Self { tag, inner }
    }

    pub fn tag(&self) -> ExtTag {
        self.tag
    }

    /// Borrow the payload, downcast to a concrete extension type.
    pub fn downcast_ref<T: ExtensionTerm + 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Address of the boxed payload; used as a last-resort stable order for
    /// extension kinds without a registered comparator.
    pub(crate) fn downcast_addr(&self) -> usize {
        self.inner.as_ref() as *const dyn ExtensionTerm as *const u8 as usize
    }
}

impl Clone for ExtValue {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag,
            inner: self.inner.clone_box(),
        }
    }
}

pub type PrintFn = Box<dyn Fn(&Registry, &ExtValue) -> String>;
pub type HashFn = Box<dyn Fn(&Registry, &ExtValue) -> u64>;
pub type EqFn = Box<dyn Fn(&Registry, &ExtValue, &ExtValue) -> bool>;
pub type CmpFn = Box<dyn Fn(&Registry, &ExtValue, &ExtValue) -> std::cmp::Ordering>;
pub type AbstractTypeFn = Box<dyn Fn(&Registry, &ExtValue) -> Value>;
/// Pair-keyed inhabitation predicate: `(value, type) -> bool`.
pub type InhabitsFn = Box<dyn Fn(&Registry, &Value, &Value) -> bool>;
/// Pair-keyed constructor: `(type, argument) -> inhabitant`.
pub type ConstructFn = Box<dyn Fn(&Registry, &Value, Value) -> Result<Value>>;
/// Pair-keyed element access: `(container, index) -> element`.
pub type ElementFn = Box<dyn Fn(&Registry, &Value, &Value) -> Result<Value>>;
pub type SerializeFn = Box<dyn Fn(&Registry, &ExtValue, &mut dyn io::Write) -> Result<()>>;
pub type DeserializeFn = Box<dyn Fn(&Registry, &mut dyn io::Read) -> Result<Value>>;

/// Immutable set of capability tables for extension kinds.
///
/// An empty registry (no extensions) is fully functional for the closed part
/// of the algebra: [`Registry::new`] is all most programs need.
#[derive(Default)]
pub struct Registry {
    ext_names: BTreeMap<ExtTag, String>,
    printers: BTreeMap<ExtTag, PrintFn>,
    hashers: BTreeMap<ExtTag, HashFn>,
    eq_fns: BTreeMap<ExtTag, EqFn>,
    cmp_fns: BTreeMap<ExtTag, CmpFn>,
    abstract_types: BTreeMap<ExtTag, AbstractTypeFn>,
    inhabits_fns: BTreeMap<(Tag, Tag), InhabitsFn>,
    constructors: BTreeMap<(Tag, Tag), ConstructFn>,
    element_fns: BTreeMap<(Tag, Tag), ElementFn>,
    serializers: BTreeMap<ExtTag, SerializeFn>,
    deserializers: BTreeMap<ExtTag, DeserializeFn>,
}

impl Registry {
    /// A registry with no extensions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a registry with extensions.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            registry: Self::default(),
            next_ext: 0,
        }
    }

    /// Declared name of an extension tag, if it belongs to this registry.
    pub fn ext_name(&self, tag: ExtTag) -> Option<&str> {
        self.ext_names.get(&tag).map(String::as_str)
    }

    pub(crate) fn printer(&self, tag: ExtTag) -> Option<&PrintFn> {
        self.printers.get(&tag)
    }

    pub(crate) fn hasher(&self, tag: ExtTag) -> Option<&HashFn> {
        self.hashers.get(&tag)
    }

    pub(crate) fn eq_fn(&self, tag: ExtTag) -> Option<&EqFn> {
        self.eq_fns.get(&tag)
    }

    pub(crate) fn cmp_fn(&self, tag: ExtTag) -> Option<&CmpFn> {
        self.cmp_fns.get(&tag)
    }

    pub(crate) fn abstract_type_fn(&self, tag: ExtTag) -> Option<&AbstractTypeFn> {
        self.abstract_types.get(&tag)
    }

    pub(crate) fn inhabits_fn(&self, key: (Tag, Tag)) -> Option<&InhabitsFn> {
        self.inhabits_fns.get(&key)
    }

    pub(crate) fn constructor(&self, key: (Tag, Tag)) -> Option<&ConstructFn> {
        self.constructors.get(&key)
    }

    pub(crate) fn element_fn(&self, key: (Tag, Tag)) -> Option<&ElementFn> {
        self.element_fns.get(&key)
    }

    pub(crate) fn serializer(&self, tag: ExtTag) -> Option<&SerializeFn> {
        self.serializers.get(&tag)
    }

    pub(crate) fn deserializer(&self, tag: ExtTag) -> Option<&DeserializeFn> {
        self.deserializers.get(&tag)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("extensions", &self.ext_names)
            .finish_non_exhaustive()
    }
}

macro_rules! insert_once {
    ($table:expr, $key:expr, $value:expr, $what:literal) => {{
        let key = $key;
        if $table.insert(key, $value).is_some() {
            // Startup configuration error; aborting beats running with a
            // silently clobbered capability table.
            panic!(
                concat!("duplicate ", $what, " registration for key {:?}"),
                key
            );
        }
    }};
}

/// Ordered, fail-fast construction of a [`Registry`].
///
/// All `register_*` methods panic on a duplicate key: registrations happen
/// once, at startup, and clobbering an existing entry is a build defect.
pub struct RegistryBuilder {
    registry: Registry,
    next_ext: u32,
}

impl RegistryBuilder {
    /// Declare a new extension kind, yielding its dispatch tag.
    pub fn declare_extension(&mut self, name: impl Into<String>) -> ExtTag {
        let tag = ExtTag(self.next_ext);
        self.next_ext += 1;
        let name = name.into();
        debug!("declared extension `{name}` as {tag}");
        self.registry.ext_names.insert(tag, name);
        tag
    }

    pub fn register_printer(&mut self, tag: ExtTag, f: PrintFn) -> &mut Self {
        insert_once!(self.registry.printers, tag, f, "printer");
        self
    }

    pub fn register_hasher(&mut self, tag: ExtTag, f: HashFn) -> &mut Self {
        insert_once!(self.registry.hashers, tag, f, "hasher");
        self
    }

    pub fn register_eq(&mut self, tag: ExtTag, f: EqFn) -> &mut Self {
        insert_once!(self.registry.eq_fns, tag, f, "equality");
        self
    }

    pub fn register_compare(&mut self, tag: ExtTag, f: CmpFn) -> &mut Self {
        insert_once!(self.registry.cmp_fns, tag, f, "comparator");
        self
    }

    pub fn register_abstract_type(&mut self, tag: ExtTag, f: AbstractTypeFn) -> &mut Self {
        insert_once!(self.registry.abstract_types, tag, f, "abstract-type");
        self
    }

    /// Register an inhabitation predicate for the `(value-tag, type-tag)`
    /// pair. Use [`NpTerm::ValueCell`](crate::tag::NpTerm::ValueCell) as the
    /// value tag for a generic fallback entry.
    pub fn register_inhabits(&mut self, key: (Tag, Tag), f: InhabitsFn) -> &mut Self {
        insert_once!(self.registry.inhabits_fns, key, f, "inhabitation");
        self
    }

    pub fn register_constructor(&mut self, key: (Tag, Tag), f: ConstructFn) -> &mut Self {
        insert_once!(self.registry.constructors, key, f, "constructor");
        self
    }

    pub fn register_element_of(&mut self, key: (Tag, Tag), f: ElementFn) -> &mut Self {
        insert_once!(self.registry.element_fns, key, f, "element-access");
        self
    }

    pub fn register_serializer(&mut self, tag: ExtTag, f: SerializeFn) -> &mut Self {
        insert_once!(self.registry.serializers, tag, f, "serializer");
        self
    }

    pub fn register_deserializer(&mut self, tag: ExtTag, f: DeserializeFn) -> &mut Self {
        insert_once!(self.registry.deserializers, tag, f, "deserializer");
        self
    }

    /// Freeze into an immutable registry.
    pub fn build(self) -> Registry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Marker;

    impl ExtensionTerm for Marker {
        fn clone_box(&self) -> Box<dyn ExtensionTerm> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn extension_tags_are_ordered_by_declaration() {
        let mut builder = Registry::builder();
        let a = builder.declare_extension("a");
        let b = builder.declare_extension("b");
        assert!(a < b);
        let registry = builder.build();
        assert_eq!(registry.ext_name(a), Some("a"));
    }

    #[test]
    #[should_panic(expected = "duplicate printer registration")]
    fn duplicate_registration_aborts() {
        let mut builder = Registry::builder();
        let tag = builder.declare_extension("dup");
        builder.register_printer(tag, Box::new(|_, _| "x".into()));
        builder.register_printer(tag, Box::new(|_, _| "y".into()));
    }

    #[test]
    fn ext_value_downcasts() {
        let mut builder = Registry::builder();
        let tag = builder.declare_extension("marker");
        let _registry = builder.build();
        let v = ExtValue::new(tag, Box::new(Marker));
        assert!(v.downcast_ref::<Marker>().is_some());
    }
}
