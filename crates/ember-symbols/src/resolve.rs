//! Name and signature resolution
//!
//! Resolution starts in the given scope and walks outward through enclosing
//! scopes until the module scope. Signature searches rank every same-name,
//! same-arity callable of a scope with the [`TypeMatcher`]; a tie at the
//! lowest weight in the nearest scope with candidates is ambiguous and stops
//! the walk.

use crate::config::MatchConfig;
use crate::error::SymbolError;
use crate::matching::{CoercionRegistry, MethodMatches, TypeMatcher, NOT_ASSIGNABLE};
use crate::scope::ScopeId;
use crate::search::SymbolSearch;
use crate::symbol::SymbolId;
use crate::table::SymbolTable;
use rustc_hash::FxHashSet;
use tracing::debug;

/// Something that can answer a [`SymbolSearch`]
pub trait Resolvable {
    /// Best match, or `None` when nothing matches or the match is ambiguous
    fn resolve(&self, scope: ScopeId, search: &SymbolSearch) -> Option<SymbolId>;

    /// Like [`resolve`](Self::resolve), but says why nothing was found
    fn resolve_detailed(&self, scope: ScopeId, search: &SymbolSearch) -> Result<SymbolId, SymbolError>;
}

enum ScopeMatch {
    Found(SymbolId),
    Ambiguous(Vec<SymbolId>),
    NotFound,
}

/// Resolves searches against a [`SymbolTable`]
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    table: &'a SymbolTable,
    matcher: TypeMatcher<'a>,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a SymbolTable, coercions: &'a CoercionRegistry, config: &'a MatchConfig) -> Self {
        Resolver {
            table,
            matcher: TypeMatcher::new(table, coercions, config),
        }
    }

    pub fn matcher(&self) -> &TypeMatcher<'a> {
        &self.matcher
    }

    /// Search a single scope without walking outward
    pub fn resolve_in_scope(&self, scope: ScopeId, search: &SymbolSearch) -> Result<Option<SymbolId>, SymbolError> {
        match self.search_scope(scope, &search.name, search)? {
            ScopeMatch::Found(id) => Ok(Some(id)),
            ScopeMatch::Ambiguous(candidates) => Err(self.ambiguous(search, candidates)),
            ScopeMatch::NotFound => Ok(None),
        }
    }

    /// Candidate methods of `aggregate` and its super types
    ///
    /// A method overrides a same-signature method further up the hierarchy,
    /// so only the most derived one is collected.
    pub fn resolve_matching_methods(
        &self,
        aggregate: SymbolId,
        search: &SymbolSearch,
    ) -> Result<MethodMatches, SymbolError> {
        let mut matches = MethodMatches::new(self.matcher.config().ambiguity_tolerance);
        let mut signatures: Vec<Vec<Option<SymbolId>>> = Vec::new();
        let mut visited = FxHashSet::default();
        let mut pending = vec![aggregate];

        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            let scope = self.table.member_scope(current)?;
            let mut declared = Vec::new();
            for &candidate in self.table.scope(scope)?.lookup(&search.name) {
                let signature = self.table.parameter_types(candidate)?;
                if signatures.contains(&signature) {
                    continue;
                }
                matches.add(candidate, self.candidate_weight(candidate, search)?);
                declared.push(signature);
            }
            signatures.extend(declared);
            let mut supers = self.table.super_types(current)?;
            supers.reverse();
            pending.extend(supers);
        }
        Ok(matches)
    }

    fn walk(&self, scope: ScopeId, search: &SymbolSearch) -> Result<SymbolId, SymbolError> {
        if let Some((module, name)) = search.qualified_parts() {
            let Some(module_scope) = self.table.module(module) else {
                return Err(self.unresolved(search));
            };
            return match self.search_scope(module_scope, name, search)? {
                ScopeMatch::Found(id) => Ok(id),
                ScopeMatch::Ambiguous(candidates) => Err(self.ambiguous(search, candidates)),
                ScopeMatch::NotFound => Err(self.unresolved(search)),
            };
        }

        let mut current = Some(scope);
        while let Some(id) = current {
            match self.search_scope(id, &search.name, search)? {
                ScopeMatch::Found(found) => return Ok(found),
                ScopeMatch::Ambiguous(candidates) => return Err(self.ambiguous(search, candidates)),
                ScopeMatch::NotFound => {}
            }

            let enclosing = self.table.scope(id)?.enclosing();
            current = match enclosing {
                Some(next) if search.limit_to_blocks && !self.table.scope(next)?.kind.is_block() => None,
                other => other,
            };
        }
        Err(self.unresolved(search))
    }

    fn search_scope(&self, scope_id: ScopeId, name: &str, search: &SymbolSearch) -> Result<ScopeMatch, SymbolError> {
        let scope = self.table.scope(scope_id)?;
        let candidates = scope.lookup(name);

        if search.is_signature_search() {
            let mut matches = MethodMatches::new(self.matcher.config().ambiguity_tolerance);
            for &candidate in candidates {
                let weight = self.candidate_weight(candidate, search)?;
                matches.add(candidate, weight);
            }
            if matches.is_empty() {
                return Ok(ScopeMatch::NotFound);
            }
            if matches.is_ambiguous() {
                return Ok(ScopeMatch::Ambiguous(matches.best_candidates()));
            }
            return Ok(matches.single_best().map_or(ScopeMatch::NotFound, ScopeMatch::Found));
        }

        for &candidate in candidates {
            let symbol = self.table.symbol(candidate)?;
            if !search.accepts(symbol.category()) {
                continue;
            }
            if let Some(expected) = search.returning {
                let actual = if symbol.category().is_type_like() && symbol.type_ref.is_none() {
                    Some(candidate)
                } else {
                    symbol.type_ref
                };
                if self.matcher.weight_of(actual, Some(expected)) < 0.0 {
                    continue;
                }
            }
            return Ok(ScopeMatch::Found(candidate));
        }

        // conceptual parameters of the generic that owns this scope
        if search.accepts_types() {
            if let Some(owner) = scope.owner() {
                if let Some(generic) = self.table.symbol(owner)?.generic_info() {
                    for entry in generic.parameters() {
                        let parameter = self.table.symbol(entry.symbol)?;
                        if parameter.is_type_parameter() && parameter.name == name {
                            return Ok(ScopeMatch::Found(entry.symbol));
                        }
                    }
                }
            }
        }
        Ok(ScopeMatch::NotFound)
    }

    /// Parameter-list weight plus the return weight when a result type is
    /// required
    fn candidate_weight(&self, candidate: SymbolId, search: &SymbolSearch) -> Result<f64, SymbolError> {
        let symbol = self.table.symbol(candidate)?;
        if !symbol.category().is_callable() || !search.accepts(symbol.category()) {
            return Ok(NOT_ASSIGNABLE);
        }
        let Some(arguments) = &search.parameters else {
            return Ok(NOT_ASSIGNABLE);
        };

        let parameters = self.table.parameter_types(candidate)?;
        let mut weight = self.matcher.parameter_list_weight(arguments, &parameters);
        if weight < 0.0 {
            return Ok(NOT_ASSIGNABLE);
        }
        if let Some(expected) = search.returning {
            let returned = self.matcher.weight_of(symbol.type_ref, Some(expected));
            if returned < 0.0 {
                return Ok(NOT_ASSIGNABLE);
            }
            weight += returned;
        }
        Ok(weight)
    }

    fn unresolved(&self, search: &SymbolSearch) -> SymbolError {
        SymbolError::Unresolved {
            name: search.name.clone(),
            span: search.span,
        }
    }

    fn ambiguous(&self, search: &SymbolSearch, candidates: Vec<SymbolId>) -> SymbolError {
        debug!(name = %search.name, candidates = candidates.len(), "ambiguous overload");
        SymbolError::AmbiguousOverload {
            name: search.name.clone(),
            candidates,
            span: search.span,
        }
    }
}

impl Resolvable for Resolver<'_> {
    fn resolve(&self, scope: ScopeId, search: &SymbolSearch) -> Option<SymbolId> {
        self.walk(scope, search).ok()
    }

    fn resolve_detailed(&self, scope: ScopeId, search: &SymbolSearch) -> Result<SymbolId, SymbolError> {
        self.walk(scope, search)
    }
}
