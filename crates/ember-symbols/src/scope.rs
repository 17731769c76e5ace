//! Scopes: ordered, overload-aware containers of symbols

use crate::symbol::SymbolId;
use rustc_hash::FxHashMap;
use std::fmt;

/// Scope identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) u32);

impl ScopeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({})", self.0)
    }
}

/// Scope kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Module (global) scope, the root of a scope tree
    Module,
    /// Members of a class, record, trait, ...
    Aggregate,
    /// Parameters and body of a function or method
    Callable,
    /// Nested block
    Block,
}

impl ScopeKind {
    /// Block-limited searches only walk outward through block scopes
    pub fn is_block(self) -> bool {
        matches!(self, ScopeKind::Callable | ScopeKind::Block)
    }
}

/// Scope in the scope tree
///
/// Symbols are kept both in insertion order and indexed by name; a name
/// maps to a list so overloads can share it. `enclosing` is a navigational
/// handle only.
#[derive(Debug, Clone)]
pub struct Scope {
    /// Scope ID
    pub id: ScopeId,
    /// Scope kind
    pub kind: ScopeKind,
    /// Scope name (the module name for module scopes)
    pub name: String,
    pub(crate) enclosing: Option<ScopeId>,
    pub(crate) owner: Option<SymbolId>,
    by_name: FxHashMap<String, Vec<SymbolId>>,
    ordered: Vec<SymbolId>,
}

impl Scope {
    /// Create a new scope
    pub fn new(id: ScopeId, kind: ScopeKind, name: impl Into<String>, enclosing: Option<ScopeId>) -> Self {
        Scope {
            id,
            kind,
            name: name.into(),
            enclosing,
            owner: None,
            by_name: FxHashMap::default(),
            ordered: Vec::new(),
        }
    }

    pub fn enclosing(&self) -> Option<ScopeId> {
        self.enclosing
    }

    /// The type or function whose members live in this scope
    pub fn owner(&self) -> Option<SymbolId> {
        self.owner
    }

    /// All symbols in definition order
    pub fn symbols(&self) -> &[SymbolId] {
        &self.ordered
    }

    /// Symbols defined under `name`, in definition order
    pub fn lookup(&self, name: &str) -> &[SymbolId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub(crate) fn insert(&mut self, name: &str, id: SymbolId) {
        self.by_name.entry(name.to_string()).or_default().push(id);
        self.ordered.push(id);
    }

    /// Undo the most recent `insert` of `id` under `name`
    pub(crate) fn remove_last(&mut self, name: &str, id: SymbolId) {
        if let Some(list) = self.by_name.get_mut(name) {
            if let Some(pos) = list.iter().rposition(|&s| s == id) {
                list.remove(pos);
            }
            if list.is_empty() {
                self.by_name.remove(name);
            }
        }
        if let Some(pos) = self.ordered.iter().rposition(|&s| s == id) {
            self.ordered.remove(pos);
        }
    }

    /// Copy of this scope's header under a new id, with no symbols
    pub(crate) fn empty_copy(&self, id: ScopeId, enclosing: Option<ScopeId>) -> Self {
        Scope::new(id, self.kind, self.name.clone(), enclosing)
    }
}
