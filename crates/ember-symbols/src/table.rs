//! Symbol table arena
//!
//! The [`SymbolTable`] owns every [`Symbol`] and [`Scope`] of a compilation
//! and hands out [`SymbolId`]/[`ScopeId`] handles. Scopes reference their
//! parents by handle only, so the scope tree has no ownership cycles.
//!
//! Mutations made while a [`Checkpoint`] is open are journaled and can be
//! undone with [`SymbolTable::rollback`].

use crate::error::SymbolError;
use crate::scope::{Scope, ScopeId, ScopeKind};
use crate::span::Span;
use crate::symbol::{GenericInfo, Symbol, SymbolCategory, SymbolGenus, SymbolId, TypeArgument};
use rustc_hash::FxHashMap;

/// Marker returned by [`SymbolTable::begin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    symbols: usize,
    scopes: usize,
    journal: usize,
    instantiations: usize,
}

#[derive(Debug, Clone)]
enum JournalEntry {
    Defined { scope: ScopeId, name: String, id: SymbolId },
    Module { name: String },
    Restore { id: SymbolId, previous: Box<Symbol> },
}

/// Arena of symbols and scopes for one compilation
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    modules: FxHashMap<String, ScopeId>,
    journal: Vec<JournalEntry>,
    /// Symbol count at each open checkpoint, innermost last
    floors: Vec<usize>,
    instantiations_created: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the module scope called `name`
    pub fn add_module(&mut self, name: &str) -> ScopeId {
        if let Some(&id) = self.modules.get(name) {
            return id;
        }

        let id = self.alloc_scope(ScopeKind::Module, name, None, None);
        self.modules.insert(name.to_string(), id);
        if !self.floors.is_empty() {
            self.journal.push(JournalEntry::Module { name: name.to_string() });
        }
        id
    }

    pub fn module(&self, name: &str) -> Option<ScopeId> {
        self.modules.get(name).copied()
    }

    /// Create a nested scope. It carries the enclosing scope's name.
    pub fn push_scope(&mut self, kind: ScopeKind, enclosing: ScopeId) -> Result<ScopeId, SymbolError> {
        let name = self.scope(enclosing)?.name.clone();
        Ok(self.alloc_scope(kind, name, Some(enclosing), None))
    }

    /// Store a symbol in the arena without defining it in any scope
    pub fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        self.alloc_symbol(symbol)
    }

    /// Create a type with its own member scope. The type is not defined
    /// anywhere yet; call [`define`](Self::define) to make it resolvable.
    pub fn create_type(
        &mut self,
        enclosing: ScopeId,
        name: &str,
        genus: SymbolGenus,
        span: Span,
    ) -> Result<SymbolId, SymbolError> {
        self.scope(enclosing)?;
        let scope = self.alloc_scope(ScopeKind::Aggregate, name, Some(enclosing), None);
        let mut symbol = Symbol::new_aggregate(name, genus, scope, span);
        symbol.enclosing = Some(enclosing);
        let id = self.alloc_symbol(symbol);
        self.scopes[scope.index()].owner = Some(id);
        Ok(id)
    }

    /// Create a free-standing function with its own parameter scope
    pub fn create_function(&mut self, enclosing: ScopeId, name: &str, span: Span) -> Result<SymbolId, SymbolError> {
        self.scope(enclosing)?;
        Ok(self.create_callable(enclosing, name, SymbolCategory::Function, span))
    }

    /// Create a method and define it in `aggregate`'s member scope
    pub fn create_method(&mut self, aggregate: SymbolId, name: &str, span: Span) -> Result<SymbolId, SymbolError> {
        let scope = self.member_scope(aggregate)?;
        let id = self.create_callable(scope, name, SymbolCategory::Method, span);
        self.define(scope, id)?;
        Ok(id)
    }

    fn create_callable(&mut self, enclosing: ScopeId, name: &str, category: SymbolCategory, span: Span) -> SymbolId {
        let scope = self.alloc_scope(ScopeKind::Callable, name, Some(enclosing), None);
        let mut symbol = Symbol::new_callable(name, category, scope, span);
        symbol.enclosing = Some(enclosing);
        let id = self.alloc_symbol(symbol);
        self.scopes[scope.index()].owner = Some(id);
        id
    }

    /// Create a conceptual parameter `name` and append it to `generic`'s
    /// type-parameter list
    pub fn create_type_parameter(&mut self, generic: SymbolId, name: &str, span: Span) -> Result<SymbolId, SymbolError> {
        let scope = self.member_scope(generic)?;
        let mut symbol = Symbol::type_parameter(name, span);
        symbol.enclosing = Some(scope);
        let id = self.alloc_symbol(symbol);
        self.add_type_parameter(generic, id)?;
        Ok(id)
    }

    /// Append an existing type to `generic`'s type-parameter list
    pub fn add_type_parameter(&mut self, generic: SymbolId, parameter: SymbolId) -> Result<(), SymbolError> {
        let entry = self.type_argument(parameter)?;
        let symbol = self.symbol(generic)?;
        if symbol.generic_info().is_none() {
            return Err(SymbolError::NotGeneric {
                name: symbol.name.clone(),
                span: symbol.span,
            });
        }
        self.update(generic, |s| s.push_type_parameter(entry))
    }

    /// Declare a call parameter on a function or method
    pub fn add_call_parameter(
        &mut self,
        callable: SymbolId,
        name: &str,
        type_ref: Option<SymbolId>,
        span: Span,
    ) -> Result<SymbolId, SymbolError> {
        let scope = self.member_scope(callable)?;
        let mut parameter = Symbol::variable(name, type_ref, span);
        parameter.mutable = false;
        let id = self.declare(scope, parameter)?;
        self.update(callable, |s| {
            let mut parameters = s.call_parameters().to_vec();
            parameters.push(id);
            s.set_call_parameters(parameters);
        })?;
        Ok(id)
    }

    pub fn set_super_type(&mut self, aggregate: SymbolId, super_type: SymbolId) -> Result<(), SymbolError> {
        self.aggregate_update(aggregate, |s| {
            if let Some(detail) = s.aggregate_mut() {
                detail.super_type = Some(super_type);
            }
        })
    }

    pub fn add_trait(&mut self, aggregate: SymbolId, trait_type: SymbolId) -> Result<(), SymbolError> {
        self.aggregate_update(aggregate, |s| {
            if let Some(detail) = s.aggregate_mut() {
                detail.traits.push(trait_type);
            }
        })
    }

    fn aggregate_update(&mut self, id: SymbolId, f: impl FnOnce(&mut Symbol)) -> Result<(), SymbolError> {
        let symbol = self.symbol(id)?;
        if symbol.aggregate().is_none() {
            return Err(SymbolError::NotScoped {
                name: symbol.name.clone(),
                span: symbol.span,
            });
        }
        self.update(id, f)
    }

    /// Define `id` in `scope`
    ///
    /// Methods and operators are overloadable. Functions conflict only with
    /// an identical parameter-type list; every other symbol conflicts with
    /// any same-named symbol of the same kind already in the scope.
    pub fn define(&mut self, scope: ScopeId, id: SymbolId) -> Result<(), SymbolError> {
        self.scope(scope)?;
        if let Some(existing) = self.conflicting_definition(scope, id)? {
            let original = self.symbol(existing)?;
            let duplicate = self.symbol(id)?;
            return Err(SymbolError::DuplicateDefinition {
                name: duplicate.name.clone(),
                original: original.span,
                duplicate: duplicate.span,
            });
        }

        let name = self.symbol(id)?.name.clone();
        self.update(id, |s| s.enclosing = Some(scope))?;
        self.scopes[scope.index()].insert(&name, id);
        if !self.floors.is_empty() {
            self.journal.push(JournalEntry::Defined { scope, name, id });
        }
        Ok(())
    }

    /// Add `symbol` to the arena and define it in `scope`
    pub fn declare(&mut self, scope: ScopeId, symbol: Symbol) -> Result<SymbolId, SymbolError> {
        let id = self.alloc_symbol(symbol);
        if let Err(e) = self.define(scope, id) {
            self.symbols.pop();
            return Err(e);
        }
        Ok(id)
    }

    fn conflicting_definition(&self, scope: ScopeId, id: SymbolId) -> Result<Option<SymbolId>, SymbolError> {
        let candidate = self.symbol(id)?;
        if candidate.category() == SymbolCategory::Method || candidate.flags.is_operator {
            return Ok(None);
        }

        for &existing in self.scope(scope)?.lookup(&candidate.name) {
            if existing == id {
                return Ok(Some(existing));
            }
            let other = self.symbol(existing)?;
            if !same_definition_kind(other.category(), candidate.category()) {
                continue;
            }
            if candidate.category().is_callable() {
                if self.parameter_types(existing)? == self.parameter_types(id)? {
                    return Ok(Some(existing));
                }
            } else {
                return Ok(Some(existing));
            }
        }
        Ok(None)
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn symbol(&self, id: SymbolId) -> Result<&Symbol, SymbolError> {
        self.symbols.get(id.index()).ok_or(SymbolError::UnknownSymbol(id))
    }

    /// Direct mutable access for the definition pass. Changes made here are
    /// not journaled.
    pub fn symbol_mut(&mut self, id: SymbolId) -> Result<&mut Symbol, SymbolError> {
        self.symbols.get_mut(id.index()).ok_or(SymbolError::UnknownSymbol(id))
    }

    pub fn scope(&self, id: ScopeId) -> Result<&Scope, SymbolError> {
        self.scopes.get(id.index()).ok_or(SymbolError::UnknownScope(id))
    }

    /// Member scope of an aggregate or callable
    pub fn member_scope(&self, id: SymbolId) -> Result<ScopeId, SymbolError> {
        let symbol = self.symbol(id)?;
        symbol.scope().ok_or_else(|| SymbolError::NotScoped {
            name: symbol.name.clone(),
            span: symbol.span,
        })
    }

    /// Members of an aggregate or callable in definition order
    pub fn members(&self, id: SymbolId) -> Result<&[SymbolId], SymbolError> {
        let scope = self.member_scope(id)?;
        Ok(self.scope(scope)?.symbols())
    }

    pub fn generic_info(&self, id: SymbolId) -> Result<&GenericInfo, SymbolError> {
        let symbol = self.symbol(id)?;
        symbol.generic_info().ok_or_else(|| SymbolError::NotGeneric {
            name: symbol.name.clone(),
            span: symbol.span,
        })
    }

    /// Declared types of a callable's parameters, in order
    pub fn parameter_types(&self, id: SymbolId) -> Result<Vec<Option<SymbolId>>, SymbolError> {
        self.symbol(id)?
            .call_parameters()
            .iter()
            .map(|&p| self.symbol(p).map(|s| s.type_ref))
            .collect()
    }

    /// Super type and traits of an aggregate
    pub fn super_types(&self, id: SymbolId) -> Result<Vec<SymbolId>, SymbolError> {
        Ok(match self.symbol(id)?.aggregate() {
            Some(detail) => detail.super_type.iter().chain(detail.traits.iter()).copied().collect(),
            None => Vec::new(),
        })
    }

    /// `id` as an entry for a type-parameter or type-argument list
    pub fn type_argument(&self, id: SymbolId) -> Result<TypeArgument, SymbolError> {
        let symbol = self.symbol(id)?;
        Ok(TypeArgument {
            symbol: id,
            conceptual: symbol.is_conceptual(),
        })
    }

    /// Module scope that `scope` belongs to
    pub fn module_of(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scopes.get(id.index())?;
            if scope.kind == ScopeKind::Module {
                return Some(id);
            }
            current = scope.enclosing;
        }
        None
    }

    /// `module::Owner::name`, qualified through every type or callable
    /// between the symbol and its module
    ///
    /// Callables carry their parameter types, so overloads (and the type
    /// parameters they declare) get distinct names. Symbols in anonymous
    /// blocks are qualified by the block's scope id.
    pub fn fully_qualified_name(&self, id: SymbolId) -> Result<String, SymbolError> {
        self.qualified_name(id, true)
    }

    fn qualified_name(&self, id: SymbolId, with_signature: bool) -> Result<String, SymbolError> {
        let symbol = self.symbol(id)?;
        let mut name = match symbol.enclosing {
            Some(scope) => format!("{}::{}", self.scope_path(scope)?, symbol.name),
            None => symbol.name.clone(),
        };
        if with_signature && symbol.category().is_callable() {
            name.push_str(&self.signature(id)?);
        }
        Ok(name)
    }

    /// Qualifier for symbols defined in `id`
    fn scope_path(&self, id: ScopeId) -> Result<String, SymbolError> {
        let scope = self.scope(id)?;
        if let Some(owner) = scope.owner {
            return self.fully_qualified_name(owner);
        }
        match (scope.kind, scope.enclosing) {
            (ScopeKind::Module, _) | (_, None) => Ok(scope.name.clone()),
            (_, Some(enclosing)) => Ok(format!("{}::{{{}}}", self.scope_path(enclosing)?, id.0)),
        }
    }

    /// `(T, lib::Integer)`; types declared inside the callable keep their
    /// plain name and callable types are named without their own signature
    fn signature(&self, callable: SymbolId) -> Result<String, SymbolError> {
        let own = self.member_scope(callable)?;
        let mut parts = Vec::new();
        for parameter in self.parameter_types(callable)? {
            parts.push(match parameter {
                Some(ty) if self.is_declared_within(ty, own) => self.symbol(ty)?.name.clone(),
                Some(ty) => self.qualified_name(ty, false)?,
                None => "_".to_string(),
            });
        }
        Ok(format!("({})", parts.join(", ")))
    }

    fn is_declared_within(&self, id: SymbolId, scope: ScopeId) -> bool {
        let mut current = self.get(id).and_then(|s| s.enclosing);
        while let Some(candidate) = current {
            if candidate == scope {
                return true;
            }
            current = self.scopes.get(candidate.index()).and_then(Scope::enclosing);
        }
        false
    }

    /// Human-oriented name; instantiations render as `Box of (String)`
    pub fn display_name(&self, id: SymbolId) -> Result<String, SymbolError> {
        let symbol = self.symbol(id)?;
        if let Some(generic) = symbol.generic_info() {
            if let Some(base) = generic.generic_type() {
                let arguments = generic
                    .parameters()
                    .iter()
                    .map(|a| self.display_name(a.symbol))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(format!("{} of ({})", self.symbol(base)?.name, arguments.join(", ")));
            }
        }
        Ok(symbol.name.clone())
    }

    /// Deep copy of `id` rebound to `enclosing`
    ///
    /// Flags, metadata and nested members are copied; the copy's member
    /// scope is new and its call parameters point at the copied parameter
    /// symbols. The copy is not defined in `enclosing`. The source is left
    /// untouched.
    pub fn clone_symbol(&mut self, id: SymbolId, enclosing: ScopeId) -> Result<SymbolId, SymbolError> {
        self.scope(enclosing)?;
        let mut copy = self.symbol(id)?.clone();
        copy.enclosing = Some(enclosing);
        let member_scope = copy.scope();
        let copy_id = self.alloc_symbol(copy);

        if let Some(scope) = member_scope {
            let (new_scope, remap) = self.clone_scope_into(scope, Some(enclosing), Some(copy_id))?;
            self.symbols[copy_id.index()].rebind(new_scope, &remap);
        }
        Ok(copy_id)
    }

    /// Deep copy of a scope and all its symbols, rebound to `enclosing`
    pub fn clone_scope(&mut self, scope: ScopeId, enclosing: Option<ScopeId>) -> Result<ScopeId, SymbolError> {
        if let Some(enclosing) = enclosing {
            self.scope(enclosing)?;
        }
        let owner = self.scope(scope)?.owner;
        Ok(self.clone_scope_into(scope, enclosing, owner)?.0)
    }

    fn clone_scope_into(
        &mut self,
        scope: ScopeId,
        enclosing: Option<ScopeId>,
        owner: Option<SymbolId>,
    ) -> Result<(ScopeId, FxHashMap<SymbolId, SymbolId>), SymbolError> {
        let source = self.scope(scope)?;
        let members = source.symbols().to_vec();
        let new_id = ScopeId(self.scopes.len() as u32);
        let mut copy = source.empty_copy(new_id, enclosing);
        copy.owner = owner;
        self.scopes.push(copy);

        let mut remap = FxHashMap::default();
        for member in members {
            let cloned = self.clone_symbol(member, new_id)?;
            let name = self.symbols[cloned.index()].name.clone();
            self.scopes[new_id.index()].insert(&name, cloned);
            remap.insert(member, cloned);
        }
        Ok((new_id, remap))
    }

    /// Number of symbols in the arena
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Instantiations created by parameterization so far
    pub fn instantiations_created(&self) -> usize {
        self.instantiations_created
    }

    /// Open a checkpoint. Checkpoints nest and must be closed innermost
    /// first with [`commit`](Self::commit) or [`rollback`](Self::rollback).
    pub fn begin(&mut self) -> Checkpoint {
        self.floors.push(self.symbols.len());
        Checkpoint {
            symbols: self.symbols.len(),
            scopes: self.scopes.len(),
            journal: self.journal.len(),
            instantiations: self.instantiations_created,
        }
    }

    /// Keep every change made since `checkpoint`
    pub fn commit(&mut self, _checkpoint: Checkpoint) {
        self.floors.pop();
        if self.floors.is_empty() {
            self.journal.clear();
        }
    }

    /// Undo every change made since `checkpoint`
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.journal {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            match entry {
                JournalEntry::Defined { scope, name, id } => {
                    if let Some(scope) = self.scopes.get_mut(scope.index()) {
                        scope.remove_last(&name, id);
                    }
                }
                JournalEntry::Module { name } => {
                    self.modules.remove(&name);
                }
                JournalEntry::Restore { id, previous } => {
                    if let Some(slot) = self.symbols.get_mut(id.index()) {
                        *slot = *previous;
                    }
                }
            }
        }

        self.symbols.truncate(checkpoint.symbols);
        self.scopes.truncate(checkpoint.scopes);
        self.instantiations_created = checkpoint.instantiations;
        self.floors.pop();
        if self.floors.is_empty() {
            self.journal.clear();
        }
    }

    /// Journaled mutation of an existing symbol
    pub(crate) fn update(&mut self, id: SymbolId, f: impl FnOnce(&mut Symbol)) -> Result<(), SymbolError> {
        let journaled = self.floors.last().is_some_and(|&floor| id.index() < floor);
        let symbol = self.symbols.get_mut(id.index()).ok_or(SymbolError::UnknownSymbol(id))?;
        if journaled {
            self.journal.push(JournalEntry::Restore {
                id,
                previous: Box::new(symbol.clone()),
            });
        }
        f(symbol);
        Ok(())
    }

    pub(crate) fn alloc_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub(crate) fn alloc_scope(
        &mut self,
        kind: ScopeKind,
        name: impl Into<String>,
        enclosing: Option<ScopeId>,
        owner: Option<SymbolId>,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        let mut scope = Scope::new(id, kind, name, enclosing);
        scope.owner = owner;
        self.scopes.push(scope);
        id
    }

    pub(crate) fn set_scope_owner(&mut self, scope: ScopeId, owner: SymbolId) -> Result<(), SymbolError> {
        let scope = self.scopes.get_mut(scope.index()).ok_or(SymbolError::UnknownScope(scope))?;
        scope.owner = Some(owner);
        Ok(())
    }

    pub(crate) fn record_instantiation(&mut self) {
        self.instantiations_created += 1;
    }
}

/// Categories that collide when they share a name in one scope
fn same_definition_kind(a: SymbolCategory, b: SymbolCategory) -> bool {
    use SymbolCategory::*;

    a == b
        || matches!(
            (a, b),
            (Type | TemplateType, Type | TemplateType) | (Function | TemplateFunction, Function | TemplateFunction)
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(line: u32) -> Span {
        Span::new(0, 0, line, 1)
    }

    #[test]
    fn test_duplicate_constant() {
        let mut table = SymbolTable::new();
        let module = table.add_module("main");

        table.declare(module, Symbol::constant("PI", None, span(1))).unwrap();
        let err = table.declare(module, Symbol::constant("PI", None, span(2))).unwrap_err();

        assert_eq!(err.span(), span(2));
        assert!(matches!(err, SymbolError::DuplicateDefinition { ref name, original, .. } if name == "PI" && original == span(1)));
        assert_eq!(table.scope(module).unwrap().lookup("PI").len(), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_methods_overload() {
        let mut table = SymbolTable::new();
        let module = table.add_module("main");
        let integer = table.create_type(module, "Integer", SymbolGenus::Class, span(1)).unwrap();
        let boxed = table.create_type(module, "Box", SymbolGenus::Class, span(2)).unwrap();

        let first = table.create_method(boxed, "add", span(3)).unwrap();
        table.add_call_parameter(first, "x", Some(integer), span(3)).unwrap();
        let second = table.create_method(boxed, "add", span(4)).unwrap();
        table.add_call_parameter(second, "x", Some(integer), span(4)).unwrap();

        assert_eq!(table.members(boxed).unwrap(), &[first, second]);
    }

    #[test]
    fn test_functions_conflict_only_on_same_signature() {
        let mut table = SymbolTable::new();
        let module = table.add_module("main");
        let integer = table.create_type(module, "Integer", SymbolGenus::Class, span(1)).unwrap();
        let string = table.create_type(module, "String", SymbolGenus::Class, span(1)).unwrap();

        let f1 = table.create_function(module, "f", span(2)).unwrap();
        table.add_call_parameter(f1, "a", Some(integer), span(2)).unwrap();
        table.define(module, f1).unwrap();

        let f2 = table.create_function(module, "f", span(3)).unwrap();
        table.add_call_parameter(f2, "a", Some(string), span(3)).unwrap();
        table.define(module, f2).unwrap();

        let f3 = table.create_function(module, "f", span(4)).unwrap();
        table.add_call_parameter(f3, "a", Some(integer), span(4)).unwrap();
        assert!(matches!(table.define(module, f3), Err(SymbolError::DuplicateDefinition { .. })));
    }

    #[test]
    fn test_type_and_variable_may_share_name() {
        let mut table = SymbolTable::new();
        let module = table.add_module("main");
        let t = table.create_type(module, "value", SymbolGenus::Class, span(1)).unwrap();
        table.define(module, t).unwrap();
        table.declare(module, Symbol::variable("value", Some(t), span(2))).unwrap();
        assert_eq!(table.scope(module).unwrap().lookup("value").len(), 2);
    }

    #[test]
    fn test_type_parameters_make_template() {
        let mut table = SymbolTable::new();
        let module = table.add_module("lib");
        let boxed = table.create_type(module, "Box", SymbolGenus::Class, span(1)).unwrap();
        let t = table.create_type_parameter(boxed, "T", span(1)).unwrap();

        assert_eq!(table.symbol(boxed).unwrap().category(), SymbolCategory::TemplateType);
        assert_eq!(table.generic_info(boxed).unwrap().parameter_symbols(), vec![t]);
        assert_eq!(table.fully_qualified_name(boxed).unwrap(), "lib::Box");
        assert_eq!(table.fully_qualified_name(t).unwrap(), "lib::Box::T");
    }

    #[test]
    fn test_type_parameter_on_plain_symbol_fails() {
        let mut table = SymbolTable::new();
        let module = table.add_module("main");
        let x = table.declare(module, Symbol::variable("x", None, span(1))).unwrap();
        assert!(matches!(table.create_type_parameter(x, "T", span(1)), Err(SymbolError::NotScoped { .. })));
    }

    #[test]
    fn test_clone_symbol_is_deep() {
        let mut table = SymbolTable::new();
        let module = table.add_module("main");
        let other = table.add_module("other");
        let integer = table.create_type(module, "Integer", SymbolGenus::Class, span(1)).unwrap();
        let boxed = table.create_type(module, "Box", SymbolGenus::Class, span(2)).unwrap();
        table.symbol_mut(boxed).unwrap().put_metadata("origin", "test");
        let method = table.create_method(boxed, "size", span(3)).unwrap();
        let param = table.add_call_parameter(method, "n", Some(integer), span(3)).unwrap();

        let copy = table.clone_symbol(boxed, other).unwrap();
        let copy_symbol = table.symbol(copy).unwrap();
        assert_eq!(copy_symbol.metadata("origin"), Some("test"));
        assert_eq!(copy_symbol.enclosing_scope(), Some(other));
        assert_ne!(copy_symbol.scope(), table.symbol(boxed).unwrap().scope());

        let copied_members = table.members(copy).unwrap().to_vec();
        assert_eq!(copied_members.len(), 1);
        assert_ne!(copied_members[0], method);
        let copied_params = table.symbol(copied_members[0]).unwrap().call_parameters().to_vec();
        assert_eq!(copied_params.len(), 1);
        assert_ne!(copied_params[0], param);
        assert_eq!(table.symbol(copied_params[0]).unwrap().type_ref, Some(integer));

        // source untouched
        assert_eq!(table.members(boxed).unwrap(), &[method]);
        assert_eq!(table.symbol(method).unwrap().call_parameters(), &[param]);
    }

    #[test]
    fn test_clone_scope_rebinds_members() {
        let mut table = SymbolTable::new();
        let module = table.add_module("main");
        let other = table.add_module("other");
        let integer = table.create_type(module, "Integer", SymbolGenus::Class, span(1)).unwrap();
        let block = table.push_scope(ScopeKind::Block, module).unwrap();
        let x = table.declare(block, Symbol::constant("x", Some(integer), span(2))).unwrap();
        let f = table.create_function(block, "f", span(3)).unwrap();
        table.add_call_parameter(f, "n", Some(integer), span(3)).unwrap();
        table.define(block, f).unwrap();

        let copy = table.clone_scope(block, Some(other)).unwrap();

        let scope = table.scope(copy).unwrap();
        assert_ne!(copy, block);
        assert_eq!(scope.kind, ScopeKind::Block);
        assert_eq!(scope.enclosing(), Some(other));
        assert_eq!(scope.len(), 2);

        let copied_x = scope.lookup("x")[0];
        let copied_f = scope.lookup("f")[0];
        assert_ne!(copied_x, x);
        assert!(table.symbol(copied_x).unwrap().flags.is_constant);
        assert_eq!(table.symbol(copied_x).unwrap().enclosing_scope(), Some(copy));
        assert_ne!(table.symbol(copied_f).unwrap().call_parameters(), table.symbol(f).unwrap().call_parameters());
        assert_eq!(table.parameter_types(copied_f).unwrap(), vec![Some(integer)]);

        // source untouched
        assert_eq!(table.scope(block).unwrap().symbols(), &[x, f]);
        assert!(table.clone_scope(block, Some(ScopeId(999))).is_err());
    }

    #[test]
    fn test_rollback_restores_state() {
        let mut table = SymbolTable::new();
        let module = table.add_module("main");
        let boxed = table.create_type(module, "Box", SymbolGenus::Class, span(1)).unwrap();
        table.define(module, boxed).unwrap();
        let symbols = table.len();
        let scopes = table.scope_count();

        let checkpoint = table.begin();
        table.create_type_parameter(boxed, "T", span(1)).unwrap();
        table.declare(module, Symbol::variable("x", None, span(2))).unwrap();
        table.add_module("scratch");
        table.rollback(checkpoint);

        assert_eq!(table.len(), symbols);
        assert_eq!(table.scope_count(), scopes);
        assert!(table.module("scratch").is_none());
        assert!(table.scope(module).unwrap().lookup("x").is_empty());
        assert_eq!(table.symbol(boxed).unwrap().category(), SymbolCategory::Type);
        assert!(table.generic_info(boxed).unwrap().parameters().is_empty());
    }

    #[test]
    fn test_commit_keeps_state() {
        let mut table = SymbolTable::new();
        let module = table.add_module("main");

        let checkpoint = table.begin();
        table.declare(module, Symbol::variable("x", None, span(1))).unwrap();
        table.commit(checkpoint);

        assert_eq!(table.scope(module).unwrap().lookup("x").len(), 1);
    }

    #[test]
    fn test_overloads_have_distinct_qualified_names() {
        let mut table = SymbolTable::new();
        let module = table.add_module("lib");
        let integer = table.create_type(module, "Integer", SymbolGenus::Class, span(1)).unwrap();
        table.define(module, integer).unwrap();

        let f1 = table.create_function(module, "f", span(2)).unwrap();
        let t1 = table.create_type_parameter(f1, "T", span(2)).unwrap();
        table.add_call_parameter(f1, "x", Some(t1), span(2)).unwrap();
        table.define(module, f1).unwrap();

        let f2 = table.create_function(module, "f", span(3)).unwrap();
        let t2 = table.create_type_parameter(f2, "T", span(3)).unwrap();
        table.add_call_parameter(f2, "x", Some(t2), span(3)).unwrap();
        table.add_call_parameter(f2, "y", Some(integer), span(3)).unwrap();
        table.define(module, f2).unwrap();

        assert_eq!(table.fully_qualified_name(f1).unwrap(), "lib::f(T)");
        assert_eq!(table.fully_qualified_name(f2).unwrap(), "lib::f(T, lib::Integer)");
        assert_eq!(table.fully_qualified_name(t1).unwrap(), "lib::f(T)::T");
        assert_ne!(table.fully_qualified_name(t1).unwrap(), table.fully_qualified_name(t2).unwrap());
    }

    #[test]
    fn test_nested_types_are_qualified_by_owner_and_block() {
        let mut table = SymbolTable::new();
        let module = table.add_module("lib");
        let outer = table.create_type(module, "Outer", SymbolGenus::Class, span(1)).unwrap();
        table.define(module, outer).unwrap();
        let members = table.member_scope(outer).unwrap();
        let inner = table.create_type(members, "Node", SymbolGenus::Record, span(2)).unwrap();
        table.define(members, inner).unwrap();

        let first = table.push_scope(ScopeKind::Block, module).unwrap();
        let second = table.push_scope(ScopeKind::Block, module).unwrap();
        let a = table.create_type(first, "Node", SymbolGenus::Record, span(3)).unwrap();
        table.define(first, a).unwrap();
        let b = table.create_type(second, "Node", SymbolGenus::Record, span(4)).unwrap();
        table.define(second, b).unwrap();

        assert_eq!(table.fully_qualified_name(inner).unwrap(), "lib::Outer::Node");
        assert_ne!(table.fully_qualified_name(a).unwrap(), table.fully_qualified_name(b).unwrap());
        assert!(table.fully_qualified_name(a).unwrap().starts_with("lib::{"));
    }

    #[test]
    fn test_function_types_in_signatures_do_not_recurse() {
        let mut table = SymbolTable::new();
        let module = table.add_module("lib");
        let f = table.create_function(module, "f", span(1)).unwrap();
        let g = table.create_function(module, "g", span(2)).unwrap();
        table.add_call_parameter(f, "callback", Some(g), span(1)).unwrap();
        table.add_call_parameter(g, "callback", Some(f), span(2)).unwrap();
        table.define(module, f).unwrap();
        table.define(module, g).unwrap();

        assert_eq!(table.fully_qualified_name(f).unwrap(), "lib::f(lib::g)");
        assert_eq!(table.fully_qualified_name(g).unwrap(), "lib::g(lib::f)");
    }

    #[test]
    fn test_display_name_plain() {
        let mut table = SymbolTable::new();
        let module = table.add_module("main");
        let t = table.create_type(module, "String", SymbolGenus::Class, span(1)).unwrap();
        assert_eq!(table.display_name(t).unwrap(), "String");
    }
}
