//! Generic parameterization
//!
//! A [`Parameterizer`] binds a generic type or function to an argument list
//! and produces the canonical instantiation for that pair. Instantiations are
//! registered under their canonical name before any member is substituted,
//! so a generic that refers back to itself, directly or through another
//! generic, finds the pending instantiation instead of creating a new one.
//!
//! Every public operation runs inside a table checkpoint: if it fails, every
//! symbol, scope and registration it made is rolled back.

mod creator;
pub mod mapping;
pub mod naming;
mod substitution;

pub use mapping::{ConceptualFlatteningMapping, ConceptualLookupMapping, MappingError};
pub use naming::canonical_name;
pub use substitution::TypeSubstitution;

use crate::config::GenericsConfig;
use crate::error::SymbolError;
use crate::span::Span;
use crate::symbol::{SymbolId, TypeArgument};
use crate::table::SymbolTable;
use creator::ParameterizedSymbolCreator;
use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};

/// Creates and populates instantiations in a [`SymbolTable`]
pub struct Parameterizer<'a> {
    table: &'a mut SymbolTable,
    config: &'a GenericsConfig,
    depth: usize,
}

impl<'a> Parameterizer<'a> {
    pub fn new(table: &'a mut SymbolTable, config: &'a GenericsConfig) -> Self {
        Parameterizer { table, config, depth: 0 }
    }

    /// Create (or find) the instantiation without populating its members
    ///
    /// Used by the definition pass, which only needs the instantiation's
    /// identity.
    pub fn outline(&mut self, generic: SymbolId, arguments: &[SymbolId], span: Span) -> Result<SymbolId, SymbolError> {
        self.transaction(|p| {
            let (base, arguments) = p.normalize(generic, arguments, span)?;
            p.instantiate(base, &arguments, span)
        })
    }

    /// Create (or find) the instantiation and populate its members
    ///
    /// `arguments` must have one entry per type parameter of `generic`. When
    /// `generic` is itself a partial instantiation this is the same as
    /// [`complete`](Self::complete).
    pub fn parameterize(&mut self, generic: SymbolId, arguments: &[SymbolId], span: Span) -> Result<SymbolId, SymbolError> {
        self.transaction(|p| {
            let (base, arguments) = p.normalize(generic, arguments, span)?;
            p.parameterize_resolved(base, &arguments, span)
        })
    }

    /// Bind the remaining conceptual slots of `partial`
    ///
    /// `arguments` has one entry per conceptual slot, left to right. The
    /// result is the same symbol a direct parameterization of the base
    /// generic with the combined arguments gives.
    pub fn complete(&mut self, partial: SymbolId, arguments: &[SymbolId], span: Span) -> Result<SymbolId, SymbolError> {
        self.transaction(|p| {
            let (base, arguments) = p.flatten(partial, arguments, span)?;
            p.parameterize_resolved(base, &arguments, span)
        })
    }

    /// Record that `owner`'s definition uses `dependent`, a generic that is
    /// still bound to one of `owner`'s conceptual parameters
    ///
    /// Returns `false` (and records nothing) when `dependent` is concrete,
    /// does not involve `owner`'s parameters, is `owner` itself, or is
    /// already recorded.
    pub fn add_dependent_reference(&mut self, owner: SymbolId, dependent: SymbolId) -> Result<bool, SymbolError> {
        self.record_dependent(owner, dependent)
    }

    pub fn table(&self) -> &SymbolTable {
        self.table
    }

    fn transaction<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, SymbolError>) -> Result<T, SymbolError> {
        let checkpoint = self.table.begin();
        match f(self) {
            Ok(value) => {
                self.table.commit(checkpoint);
                Ok(value)
            }
            Err(e) => {
                warn!(code = e.code().as_str(), error = %e, "rolling back failed parameterization");
                self.table.rollback(checkpoint);
                self.depth = 0;
                Err(e)
            }
        }
    }

    /// Base generic and full argument list for a request
    fn normalize(
        &mut self,
        generic: SymbolId,
        arguments: &[SymbolId],
        span: Span,
    ) -> Result<(SymbolId, Vec<SymbolId>), SymbolError> {
        match self.table.symbol(generic)?.generic_info() {
            Some(info) if info.generic_type().is_some() => self.flatten(generic, arguments, span),
            _ => Ok((generic, arguments.to_vec())),
        }
    }

    /// Bind `partial`'s open type parameters to `arguments`
    ///
    /// The open parameters are the distinct type parameters in `partial`'s
    /// argument list, nested ones included, in order of first appearance.
    /// Entries still generic through one of them are re-parameterized with
    /// the bound arguments, so `Box of (List of T)` completed with `String`
    /// becomes `Box of (List of (String))`.
    fn flatten(
        &mut self,
        partial: SymbolId,
        arguments: &[SymbolId],
        span: Span,
    ) -> Result<(SymbolId, Vec<SymbolId>), SymbolError> {
        let symbol = self.table.symbol(partial)?;
        let name = symbol.name.clone();
        let info = self.table.generic_info(partial)?;
        let base = info.generic_type().unwrap_or(partial);
        let current = info.parameter_symbols();

        let slots = self.open_parameters(&current)?;
        let slot_entries = type_arguments(self.table, &slots)?;
        let mapping = ConceptualLookupMapping::positional(&slot_entries, arguments).map_err(|e| match e {
            MappingError::LengthMismatch { expected, actual } => SymbolError::ArityMismatch {
                generic: name.clone(),
                expected,
                actual,
                span,
            },
        })?;
        let substitution = TypeSubstitution::new(mapping);

        let mut flattened = Vec::with_capacity(current.len());
        for &entry in &current {
            flattened.push(self.replacement_type(entry, &substitution, span)?);
        }

        if !slots.is_empty() && flattened == current {
            return Err(SymbolError::NoProgress {
                generic: name,
                reason: "binding leaves every conceptual slot unchanged".to_string(),
                span,
            });
        }
        Ok((base, flattened))
    }

    /// Distinct type parameters reachable through `entries`, in order
    fn open_parameters(&self, entries: &[SymbolId]) -> Result<Vec<SymbolId>, SymbolError> {
        let mut found = Vec::new();
        let mut visited = FxHashSet::default();
        let mut pending: Vec<SymbolId> = entries.iter().rev().copied().collect();

        while let Some(entry) = pending.pop() {
            if !visited.insert(entry) {
                continue;
            }
            let symbol = self.table.symbol(entry)?;
            if symbol.is_type_parameter() {
                found.push(entry);
            } else if let Some(info) = symbol.generic_info().filter(|i| i.is_generic_in_nature()) {
                pending.extend(info.parameters().iter().rev().map(|p| p.symbol));
            }
        }
        Ok(found)
    }

    /// Instantiate and populate; `generic` must be a base generic
    pub(crate) fn parameterize_resolved(
        &mut self,
        generic: SymbolId,
        arguments: &[SymbolId],
        span: Span,
    ) -> Result<SymbolId, SymbolError> {
        if self.depth >= self.config.max_depth {
            return Err(SymbolError::NoProgress {
                generic: self.table.symbol(generic)?.name.clone(),
                reason: format!("parameterization nested deeper than {}", self.config.max_depth),
                span,
            });
        }

        self.depth += 1;
        let result = self
            .instantiate(generic, arguments, span)
            .and_then(|id| self.populate(id, span).map(|()| id));
        self.depth -= 1;
        result
    }

    /// Find or create the empty instantiation of `generic` with `arguments`
    fn instantiate(&mut self, generic: SymbolId, arguments: &[SymbolId], span: Span) -> Result<SymbolId, SymbolError> {
        let symbol = self.table.symbol(generic)?;
        let info = match symbol.generic_info() {
            Some(info) if !info.parameters().is_empty() => info,
            _ => {
                return Err(SymbolError::NotGeneric {
                    name: symbol.name.clone(),
                    span,
                })
            }
        };
        if info.parameters().len() != arguments.len() {
            return Err(SymbolError::ArityMismatch {
                generic: symbol.name.clone(),
                expected: info.parameters().len(),
                actual: arguments.len(),
                span,
            });
        }
        if info.parameters().iter().map(|p| p.symbol).eq(arguments.iter().copied()) {
            return Ok(generic);
        }

        let owner = symbol.enclosing_scope().ok_or_else(|| SymbolError::NotScoped {
            name: symbol.name.clone(),
            span,
        })?;
        let generic_name = symbol.name.clone();
        let identity = canonical_name(self.table, generic, arguments)?;

        if let Some(&existing) = self.table.scope(owner)?.lookup(&identity).first() {
            trace!(generic = %generic_name, identity = %identity, "reusing instantiation");
            return Ok(existing);
        }

        let id = ParameterizedSymbolCreator::new(self.table).create(generic, &identity, arguments)?;
        debug!(generic = %generic_name, identity = %identity, "created instantiation");
        Ok(id)
    }

    fn record_dependent(&mut self, owner: SymbolId, dependent: SymbolId) -> Result<bool, SymbolError> {
        if owner == dependent {
            return Ok(false);
        }
        let owner_info = self.table.generic_info(owner)?;
        if owner_info.dependents().contains(&dependent) {
            return Ok(false);
        }
        let owner_parameters = owner_info.conceptual_parameters();
        if !self.depends_on(dependent, &owner_parameters)? {
            return Ok(false);
        }

        self.table.update(owner, |s| {
            if let Some(info) = s.generic_info_mut() {
                info.dependents.push(dependent);
            }
        })?;
        trace!(owner = %owner, dependent = %dependent, "recorded dependent reference");
        Ok(true)
    }

    /// True if `candidate` is still generic through one of `parameters`
    fn depends_on(&self, candidate: SymbolId, parameters: &[SymbolId]) -> Result<bool, SymbolError> {
        let Some(info) = self.table.symbol(candidate)?.generic_info() else {
            return Ok(false);
        };
        if !info.is_generic_in_nature() {
            return Ok(false);
        }
        for entry in info.parameters().iter().filter(|e| e.conceptual) {
            if parameters.contains(&entry.symbol) || self.depends_on(entry.symbol, parameters)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Type arguments for `symbols`, marking conceptual entries
pub fn type_arguments(table: &SymbolTable, symbols: &[SymbolId]) -> Result<Vec<TypeArgument>, SymbolError> {
    symbols.iter().map(|&s| table.type_argument(s)).collect()
}
