//! Symbol table shared between compilation threads
//!
//! Resolution takes the table's read lock. Parameterization goes through a
//! cache of once-cells keyed by canonical identity: the first request for an
//! identity creates and populates the instantiation under the write lock,
//! and every concurrent request for the same identity waits on the same
//! cell. An instantiation id is only handed out after population finished.

use crate::config::EngineConfig;
use crate::error::SymbolError;
use crate::generics::{canonical_name, Parameterizer};
use crate::matching::CoercionRegistry;
use crate::resolve::{Resolvable, Resolver};
use crate::scope::ScopeId;
use crate::search::SymbolSearch;
use crate::span::Span;
use crate::symbol::SymbolId;
use crate::table::SymbolTable;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Thread-safe wrapper around a [`SymbolTable`]
pub struct SharedSymbolTable {
    table: RwLock<SymbolTable>,
    coercions: CoercionRegistry,
    config: EngineConfig,
    /// Canonical identity of a request to its published instantiation
    instances: DashMap<String, Arc<OnceCell<SymbolId>>>,
}

impl SharedSymbolTable {
    pub fn new(table: SymbolTable, coercions: CoercionRegistry, config: EngineConfig) -> Self {
        Self {
            table: RwLock::new(table),
            coercions,
            config,
            instances: DashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn read(&self) -> RwLockReadGuard<'_, SymbolTable> {
        self.table.read()
    }

    /// Exclusive access for a definition pass
    pub fn write(&self) -> RwLockWriteGuard<'_, SymbolTable> {
        self.table.write()
    }

    /// Get or create the populated instantiation of `generic`
    ///
    /// Must not be called while the caller holds a guard from
    /// [`read`](Self::read) or [`write`](Self::write).
    pub fn parameterize(&self, generic: SymbolId, arguments: &[SymbolId], span: Span) -> Result<SymbolId, SymbolError> {
        let identity = canonical_name(&self.table.read(), generic, arguments)?;
        let cell = self.instances.entry(identity).or_default().clone();

        let id = cell.get_or_try_init(|| {
            let mut table = self.table.write();
            Parameterizer::new(&mut table, &self.config.generics).parameterize(generic, arguments, span)
        })?;
        Ok(*id)
    }

    pub fn resolve(&self, scope: ScopeId, search: &SymbolSearch) -> Option<SymbolId> {
        let table = self.table.read();
        Resolver::new(&table, &self.coercions, &self.config.matching).resolve(scope, search)
    }

    pub fn resolve_detailed(&self, scope: ScopeId, search: &SymbolSearch) -> Result<SymbolId, SymbolError> {
        let table = self.table.read();
        Resolver::new(&table, &self.coercions, &self.config.matching).resolve_detailed(scope, search)
    }

    /// Instantiations created in the underlying table
    pub fn instantiations_created(&self) -> usize {
        self.table.read().instantiations_created()
    }

    /// Number of request identities seen so far
    pub fn cached_requests(&self) -> usize {
        self.instances.len()
    }

    pub fn into_inner(self) -> SymbolTable {
        self.table.into_inner()
    }
}
