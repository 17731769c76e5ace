//! Member substitution for instantiations

use super::mapping::{ConceptualLookupMapping, MappingError};
use super::Parameterizer;
use crate::error::SymbolError;
use crate::span::Span;
use crate::symbol::{PopulationState, SymbolId};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// Replacement of a generic's conceptual parameters by bound arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeSubstitution {
    mapping: FxHashMap<SymbolId, SymbolId>,
}

impl TypeSubstitution {
    pub fn new(mapping: FxHashMap<SymbolId, SymbolId>) -> Self {
        TypeSubstitution { mapping }
    }

    pub fn get(&self, parameter: SymbolId) -> Option<SymbolId> {
        self.mapping.get(&parameter).copied()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

impl Parameterizer<'_> {
    /// Substitute the generic's members into an empty instantiation
    ///
    /// Does nothing for base generics, for populated instantiations, and for
    /// instantiations already being populated further up the stack.
    pub(crate) fn populate(&mut self, instantiation: SymbolId, span: Span) -> Result<(), SymbolError> {
        let symbol = self.table.symbol(instantiation)?;
        let Some(info) = symbol.generic_info() else {
            return Ok(());
        };
        let Some(generic) = info.generic_type() else {
            return Ok(());
        };
        if info.population() != PopulationState::Empty {
            return Ok(());
        }
        let arguments = info.parameter_symbols();
        let identity = symbol.name.clone();

        self.set_population(instantiation, PopulationState::Populating)?;
        debug!(identity = %identity, "populating instantiation");

        let parameters = self.table.generic_info(generic)?.parameters().to_vec();
        let mapping = ConceptualLookupMapping::positional(&parameters, &arguments).map_err(|e| match e {
            MappingError::LengthMismatch { expected, actual } => SymbolError::ArityMismatch {
                generic: identity.clone(),
                expected,
                actual,
                span,
            },
        })?;
        let substitution = TypeSubstitution::new(mapping);

        let target = self.table.member_scope(instantiation)?;
        let members = self.table.members(generic)?.to_vec();
        let mut copies = FxHashMap::default();
        for member in members {
            let copy = self.table.clone_symbol(member, target)?;
            self.substitute_member(copy, instantiation, &identity, &substitution, span)?;
            self.table.define(target, copy)?;
            copies.insert(member, copy);
        }

        let source = self.table.symbol(generic)?;
        let call_parameters: Vec<SymbolId> = source
            .call_parameters()
            .iter()
            .map(|p| copies.get(p).copied().unwrap_or(*p))
            .collect();
        let type_ref = source.type_ref;
        let hierarchy = source.aggregate().map(|a| (a.super_type, a.traits.clone()));

        let type_ref = self.replace(type_ref, &substitution, span)?;
        let hierarchy = match hierarchy {
            Some((super_type, traits)) => {
                let super_type = self.replace(super_type, &substitution, span)?;
                let traits = traits
                    .into_iter()
                    .map(|t| self.replacement_type(t, &substitution, span))
                    .collect::<Result<Vec<_>, _>>()?;
                Some((super_type, traits))
            }
            None => None,
        };
        self.table.update(instantiation, |s| {
            s.type_ref = type_ref;
            if s.callable().is_some() {
                s.set_call_parameters(call_parameters);
            }
            if let (Some(detail), Some((super_type, traits))) = (s.aggregate_mut(), hierarchy) {
                detail.super_type = super_type;
                detail.traits = traits;
            }
        })?;

        self.check_duplicate_operations(instantiation, span)?;

        let dependents = self.table.generic_info(generic)?.dependents().to_vec();
        for dependent in dependents {
            let replaced = self.replacement_type(dependent, &substitution, span)?;
            if self.table.symbol(replaced)?.is_generic_in_nature() {
                self.record_dependent(instantiation, replaced)?;
            }
        }

        self.set_population(instantiation, PopulationState::Populated)?;
        debug!(identity = %identity, "populated instantiation");
        Ok(())
    }

    /// Type to use in place of `ty` under `substitution`
    ///
    /// Mapped parameters are replaced; types still generic through a mapped
    /// parameter are parameterized with their replaced arguments; anything
    /// else is returned unchanged.
    pub(crate) fn replacement_type(
        &mut self,
        ty: SymbolId,
        substitution: &TypeSubstitution,
        span: Span,
    ) -> Result<SymbolId, SymbolError> {
        if let Some(mapped) = substitution.get(ty) {
            return Ok(mapped);
        }

        let Some(info) = self.table.symbol(ty)?.generic_info() else {
            return Ok(ty);
        };
        if !info.is_generic_in_nature() {
            return Ok(ty);
        }
        let origin = info.generic_type().unwrap_or(ty);
        let current = info.parameter_symbols();

        let mut changed = false;
        let mut arguments = Vec::with_capacity(current.len());
        for argument in current {
            let replaced = self.replacement_type(argument, substitution, span)?;
            changed |= replaced != argument;
            arguments.push(replaced);
        }
        if !changed {
            return Ok(ty);
        }
        self.parameterize_resolved(origin, &arguments, span)
    }

    fn replace(
        &mut self,
        ty: Option<SymbolId>,
        substitution: &TypeSubstitution,
        span: Span,
    ) -> Result<Option<SymbolId>, SymbolError> {
        ty.map(|t| self.replacement_type(t, substitution, span)).transpose()
    }

    /// Rewrite a copied member's types; constructors take the
    /// instantiation's name and return it
    fn substitute_member(
        &mut self,
        copy: SymbolId,
        instantiation: SymbolId,
        identity: &str,
        substitution: &TypeSubstitution,
        span: Span,
    ) -> Result<(), SymbolError> {
        let symbol = self.table.symbol(copy)?;
        let type_ref = symbol.type_ref;
        let is_constructor = symbol.flags.is_constructor;
        let parameters = symbol.call_parameters().to_vec();

        for parameter in parameters {
            let declared = self.table.symbol(parameter)?.type_ref;
            let replaced = self.replace(declared, substitution, span)?;
            self.table.update(parameter, |s| s.type_ref = replaced)?;
        }

        if is_constructor {
            let name = identity.to_string();
            return self.table.update(copy, |s| {
                s.name = name;
                s.type_ref = Some(instantiation);
            });
        }
        let replaced = self.replace(type_ref, substitution, span)?;
        self.table.update(copy, |s| s.type_ref = replaced)
    }

    /// Substituted operations must still have distinct signatures
    fn check_duplicate_operations(&self, instantiation: SymbolId, span: Span) -> Result<(), SymbolError> {
        let mut seen = FxHashSet::default();
        for &member in self.table.members(instantiation)? {
            let symbol = self.table.symbol(member)?;
            if !symbol.category().is_callable() {
                continue;
            }
            let signature = (symbol.name.as_str(), self.table.parameter_types(member)?);
            if !seen.insert(signature) {
                return Err(SymbolError::DuplicateOperation {
                    generic: self.table.display_name(instantiation)?,
                    operation: symbol.name.clone(),
                    span,
                });
            }
        }
        Ok(())
    }

    fn set_population(&mut self, id: SymbolId, state: PopulationState) -> Result<(), SymbolError> {
        self.table.update(id, |s| {
            if let Some(info) = s.generic_info_mut() {
                info.population = state;
            }
        })
    }
}
