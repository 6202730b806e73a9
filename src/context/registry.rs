//! Name and alias registry.
//!
//! Builder names and aliases share one namespace, `used_names`, which maps
//! every name in use to the canonical builder name that owns it. Reservations
//! go through the `DashMap` entry API, so two registrations racing for the same
//! name cannot both succeed; a registration that fails half way releases what
//! it reserved.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::builder::Builder;
use crate::core::error_builders::{builder_not_found, cycle_path};
use crate::core::{Result, WireError};
use crate::meta::{TypeRef, TypeRegistry};

#[derive(Debug, Default)]
pub(crate) struct Registry {
    builders: DashMap<String, Arc<Builder>>,
    aliases: DashMap<String, String>,
    used_names: DashMap<String, String>,
    sequence: AtomicU64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserve `name` for `owner`, failing if it is taken.
    fn reserve(&self, name: &str, owner: &str) -> Result<()> {
        match self.used_names.entry(name.to_string()) {
            Entry::Occupied(_) => Err(WireError::DuplicateName {
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(owner.to_string());
                Ok(())
            }
        }
    }

    fn release(&self, names: &[&str]) {
        for name in names {
            self.used_names.remove(*name);
        }
    }

    /// Register `builder` under its name and aliases.
    pub(crate) fn insert(&self, mut builder: Builder) -> Result<Arc<Builder>> {
        let name = builder.name().to_string();
        if name.is_empty() {
            return Err(WireError::config("Builder name must not be empty"));
        }
        self.reserve(&name, &name)?;

        let mut reserved = vec![name.as_str()];
        let aliases = builder.aliases().to_vec();
        for alias in &aliases {
            if let Err(error) = self.reserve(alias, &name) {
                self.release(&reserved);
                return Err(error);
            }
            reserved.push(alias.as_str());
        }

        builder.set_sequence(self.sequence.fetch_add(1, Ordering::Relaxed));
        let builder = Arc::new(builder);
        self.builders.insert(name.clone(), Arc::clone(&builder));
        for alias in aliases {
            self.aliases.insert(alias, name.clone());
        }
        Ok(builder)
    }

    /// Make `alias` refer to `target`, which may itself be an alias.
    pub(crate) fn insert_alias(&self, alias: &str, target: &str) -> Result<()> {
        let owner = self.canonical_name(target)?;
        if !self.builders.contains_key(&owner) {
            return Err(builder_not_found(target, self.names()));
        }
        self.reserve(alias, &owner)?;
        self.aliases.insert(alias.to_string(), target.to_string());
        Ok(())
    }

    /// Remove a builder together with every alias that leads to it.
    pub(crate) fn remove(&self, name: &str) -> Option<Arc<Builder>> {
        let canonical = self.canonical_name(name).ok()?;
        let (_, builder) = self.builders.remove(&canonical)?;

        let owned: Vec<String> = self
            .used_names
            .iter()
            .filter(|entry| entry.value() == &canonical)
            .map(|entry| entry.key().clone())
            .collect();
        for owned_name in owned {
            self.aliases.remove(&owned_name);
            self.used_names.remove(&owned_name);
        }
        Some(builder)
    }

    /// Follow the alias chain from `name`.
    ///
    /// Names that are neither aliases nor builders are returned unchanged.
    pub(crate) fn canonical_name(&self, name: &str) -> Result<String> {
        let mut current = name.to_string();
        let mut chain = vec![current.clone()];
        let mut seen = HashSet::from([current.clone()]);
        while let Some(next) = self.aliases.get(&current).map(|target| target.value().clone()) {
            chain.push(next.clone());
            if !seen.insert(next.clone()) {
                return Err(WireError::AliasCycle {
                    name: name.to_string(),
                    chain: cycle_path(&chain),
                });
            }
            current = next;
        }
        Ok(current)
    }

    pub(crate) fn get(&self, canonical: &str) -> Option<Arc<Builder>> {
        self.builders.get(canonical).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn contains(&self, canonical: &str) -> bool {
        self.builders.contains_key(canonical)
    }

    /// Builder names, in registration order.
    pub(crate) fn names(&self) -> Vec<String> {
        let mut builders = self.all();
        builders.sort_by_key(|builder| builder.sequence());
        builders.into_iter().map(|builder| builder.name().to_string()).collect()
    }

    /// Every name in use, builder names and aliases alike.
    pub(crate) fn used_names(&self) -> Vec<String> {
        self.used_names.iter().map(|entry| entry.key().clone()).collect()
    }

    pub(crate) fn all(&self) -> Vec<Arc<Builder>> {
        self.builders.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.builders.len()
    }

    /// Builders whose target type is assignable to `ty`: highest order first,
    /// then registration order.
    pub(crate) fn for_type(&self, types: &TypeRegistry, ty: &TypeRef) -> Vec<Arc<Builder>> {
        let mut matches: Vec<Arc<Builder>> = self
            .builders
            .iter()
            .filter(|entry| types.is_assignable(entry.value().type_name(), ty))
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        matches.sort_by(|a, b| {
            b.order().cmp(&a.order()).then_with(|| a.sequence().cmp(&b.sequence()))
        });
        matches
    }
}
