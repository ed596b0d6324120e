//! Ordered maps and the map constraint family.
//!
//! Maps are backed by a key-sorted pair vector using
//! [`ops::compare_total`](crate::ops::compare_total) as the total order, so
//! iteration and serialization order is canonical (sorted) regardless of
//! insertion order.
//!
//! Equality between two maps compares only the key/value pairs, not the
//! declared constraint. This is a deliberate weak equality.
use crate::{
    error::{Error, Result},
    ops,
    registry::Registry,
    tag::NpTerm,
    value::Value,
};

/// A first-class ordered-map type constraint.
#[derive(Debug, Clone)]
pub enum MapConstraint {
    /// `OrderedMapDC(D, C)`: domain and codomain both fixed.
    DomainAndCodomain { domain: Box<Value>, codomain: Box<Value> },
    /// `OrderedMapD(D)`: domain fixed only.
    Domain { domain: Box<Value> },
    /// `OrderedMapC(C)`: codomain fixed only.
    Codomain { codomain: Box<Value> },
}

impl MapConstraint {
    pub fn domain_and_codomain(domain: Value, codomain: Value) -> Self {
        MapConstraint::DomainAndCodomain {
            domain: Box::new(domain),
            codomain: Box::new(codomain),
        }
    }

    pub fn domain(domain: Value) -> Self {
        MapConstraint::Domain {
            domain: Box::new(domain),
        }
    }

    pub fn codomain(codomain: Value) -> Self {
        MapConstraint::Codomain {
            codomain: Box::new(codomain),
        }
    }

    /// The constructor singleton this constraint is an application of.
    pub fn kind(&self) -> NpTerm {
        match self {
            MapConstraint::DomainAndCodomain { .. } => NpTerm::OrderedMapDC,
            MapConstraint::Domain { .. } => NpTerm::OrderedMapD,
            MapConstraint::Codomain { .. } => NpTerm::OrderedMapC,
        }
    }

    pub fn domain_type(&self) -> Option<&Value> {
        match self {
            MapConstraint::DomainAndCodomain { domain, .. }
            | MapConstraint::Domain { domain } => Some(domain),
            MapConstraint::Codomain { .. } => None,
        }
    }

    pub fn codomain_type(&self) -> Option<&Value> {
        match self {
            MapConstraint::DomainAndCodomain { codomain, .. }
            | MapConstraint::Codomain { codomain } => Some(codomain),
            MapConstraint::Domain { .. } => None,
        }
    }

    /// Check a single pair against this constraint.
    pub fn verify_pair(&self, registry: &Registry, key: &Value, value: &Value) -> Result<()> {
        if let Some(domain) = self.domain_type()
            && !ops::inhabits(registry, key, domain)
        {
            return Err(Error::ConstraintViolation {
                reason: format!(
                    "key {} does not inhabit declared domain {}",
                    ops::display_lossy(registry, key),
                    ops::display_lossy(registry, domain),
                ),
            });
        }
        if let Some(codomain) = self.codomain_type()
            && !ops::inhabits(registry, value, codomain)
        {
            return Err(Error::ConstraintViolation {
                reason: format!(
                    "value {} does not inhabit declared codomain {}",
                    ops::display_lossy(registry, value),
                    ops::display_lossy(registry, codomain),
                ),
            });
        }
        Ok(())
    }
}

/// An ordered key/value map, optionally carrying a declared constraint.
///
/// Pairs are kept sorted by key under the crate's total order; a later insert
/// of an existing key replaces the earlier value.
#[derive(Debug, Clone, Default)]
pub struct MapTerm {
    pairs: Vec<(Value, Value)>,
    constraint: Option<MapConstraint>,
}

impl MapTerm {
    /// An empty, unconstrained map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an unconstrained map from pairs in any order.
    pub fn from_pairs<I>(registry: &Registry, pairs: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut map = Self::new();
        for (k, v) in pairs {
            // Unconstrained inserts cannot fail.
            map.insert(registry, k, v).expect("unconstrained insert");
        }
        map
    }

    /// Build a map under `constraint`, verifying every pair.
    pub fn with_constraint<I>(
        registry: &Registry,
        constraint: MapConstraint,
        pairs: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut map = Self {
            pairs: Vec::new(),
            constraint: Some(constraint),
        };
        for (k, v) in pairs {
            map.insert(registry, k, v)?;
        }
        Ok(map)
    }

    /// The declared type of this map: its constraint if any, the free
    /// `OrderedMap` singleton otherwise.
    pub fn declared_type(&self) -> Value {
        match &self.constraint {
            Some(c) => Value::MapType(c.clone()),
            None => Value::Np(NpTerm::OrderedMap),
        }
    }

    pub fn constraint(&self) -> Option<&MapConstraint> {
        self.constraint.as_ref()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in canonical (key-sorted) order.
    pub fn iter(&self) -> std::slice::Iter<'_, (Value, Value)> {
        self.pairs.iter()
    }

    fn position(&self, registry: &Registry, key: &Value) -> std::result::Result<usize, usize> {
        self.pairs
            .binary_search_by(|(k, _)| ops::compare_total(registry, k, key))
    }

    /// Insert a pair, verifying the declared constraint first. Replaces the
    /// value if the key is already present.
    pub fn insert(&mut self, registry: &Registry, key: Value, value: Value) -> Result<()> {
        if let Some(c) = &self.constraint {
            c.verify_pair(registry, &key, &value)?;
        }
        match self.position(registry, &key) {
            Ok(i) => self.pairs[i].1 = value,
            Err(i) => self.pairs.insert(i, (key, value)),
        }
        Ok(())
    }

    /// Look up the value bound to `key`, if any.
    pub fn get(&self, registry: &Registry, key: &Value) -> Option<&Value> {
        self.position(registry, key).ok().map(|i| &self.pairs[i].1)
    }

    /// Membership test on keys, defined in terms of the sorted order.
    pub fn is_member_key(&self, registry: &Registry, key: &Value) -> bool {
        self.position(registry, key).is_ok()
    }

    /// Remove a key, returning its value if it was present.
    pub fn remove(&mut self, registry: &Registry, key: &Value) -> Option<Value> {
        match self.position(registry, key) {
            Ok(i) => Some(self.pairs.remove(i).1),
            Err(_) => None,
        }
    }
}
