//! Symbol representation
//!
//! A [`Symbol`] is a single tagged record for every declared entity. Its
//! [`SymbolCategory`] says how it takes part in resolution; the optional
//! [`SymbolDetail`] carries the capabilities only some symbols have: a member
//! scope ([`Scoped`]) and a type-parameter list ([`Genericizable`]).
//!
//! Symbols reference each other (and scopes) through [`SymbolId`] and
//! [`ScopeId`] handles into a [`SymbolTable`](crate::SymbolTable) arena.

use crate::scope::ScopeId;
use crate::span::Span;
use rustc_hash::FxHashMap;
use std::fmt;

/// Handle to a symbol in a [`SymbolTable`](crate::SymbolTable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

/// How a symbol participates in resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolCategory {
    /// Variables, constants, properties and parameters
    Variable,
    /// Free-standing function
    Function,
    /// Method on an aggregate
    Method,
    /// Concrete type
    Type,
    /// Type with at least one conceptual parameter
    TemplateType,
    /// Function with at least one conceptual parameter
    TemplateFunction,
    /// Control construct (if, switch, try, ...)
    Control,
    /// Matches every category in a search
    Any,
}

impl SymbolCategory {
    /// Categories that can be used where a type is expected
    pub const TYPES: [SymbolCategory; 4] = [
        SymbolCategory::Type,
        SymbolCategory::TemplateType,
        SymbolCategory::Function,
        SymbolCategory::TemplateFunction,
    ];

    pub fn is_type_like(self) -> bool {
        Self::TYPES.contains(&self)
    }

    pub fn is_callable(self) -> bool {
        matches!(
            self,
            SymbolCategory::Function | SymbolCategory::TemplateFunction | SymbolCategory::Method
        )
    }
}

/// The kind of construct a symbol was declared as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SymbolGenus {
    #[default]
    Value,
    Class,
    Trait,
    Record,
    Enumeration,
    Component,
    Service,
    Function,
    Text,
    Program,
    /// A conceptual placeholder such as `T`
    TypeParameter,
}

/// Symbol flags for additional metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolFlags {
    pub is_abstract: bool,
    pub is_pure: bool,
    pub is_override: bool,
    pub is_constant: bool,
    pub is_injectable: bool,
    pub is_operator: bool,
    pub is_constructor: bool,
}

/// Lifecycle of an instantiation's members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopulationState {
    /// Registered but no members substituted yet
    #[default]
    Empty,
    /// Substitution is running
    Populating,
    /// Members substituted
    Populated,
}

/// One entry in a type-parameter (or type-argument) list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeArgument {
    /// The type in this position
    pub symbol: SymbolId,
    /// Whether the type is a conceptual placeholder, or itself still generic
    pub conceptual: bool,
}

impl TypeArgument {
    pub fn concrete(symbol: SymbolId) -> Self {
        Self {
            symbol,
            conceptual: false,
        }
    }

    pub fn conceptual(symbol: SymbolId) -> Self {
        Self {
            symbol,
            conceptual: true,
        }
    }
}

/// Generic state shared by aggregates and callables
///
/// For a generic definition `parameters` holds its conceptual placeholders;
/// for an instantiation it holds the bound arguments and `generic_type`
/// points back to the definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericInfo {
    pub(crate) parameters: Vec<TypeArgument>,
    pub(crate) generic_type: Option<SymbolId>,
    pub(crate) dependents: Vec<SymbolId>,
    pub(crate) population: PopulationState,
}

impl GenericInfo {
    pub fn parameters(&self) -> &[TypeArgument] {
        &self.parameters
    }

    pub fn generic_type(&self) -> Option<SymbolId> {
        self.generic_type
    }

    pub fn dependents(&self) -> &[SymbolId] {
        &self.dependents
    }

    pub fn population(&self) -> PopulationState {
        self.population
    }

    pub fn is_generic_in_nature(&self) -> bool {
        self.parameters.iter().any(|p| p.conceptual)
    }

    /// Symbols of the still-conceptual entries, in order
    pub fn conceptual_parameters(&self) -> Vec<SymbolId> {
        self.parameters
            .iter()
            .filter(|p| p.conceptual)
            .map(|p| p.symbol)
            .collect()
    }

    /// Symbols of all entries, in order
    pub fn parameter_symbols(&self) -> Vec<SymbolId> {
        self.parameters.iter().map(|p| p.symbol).collect()
    }
}

/// A symbol that owns a member scope
pub trait Scoped {
    fn scope(&self) -> ScopeId;
}

/// A symbol that carries a type-parameter list
pub trait Genericizable {
    fn generic(&self) -> &GenericInfo;

    fn type_parameters(&self) -> &[TypeArgument] {
        self.generic().parameters()
    }

    fn is_generic_in_nature(&self) -> bool {
        self.generic().is_generic_in_nature()
    }

    /// The definition this symbol is an instantiation of
    fn generic_type(&self) -> Option<SymbolId> {
        self.generic().generic_type()
    }

    fn is_parameterized(&self) -> bool {
        self.generic_type().is_some()
    }
}

/// Type-like symbol with members (class, record, trait, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateDetail {
    pub(crate) scope: ScopeId,
    pub(crate) generic: GenericInfo,
    pub super_type: Option<SymbolId>,
    pub traits: Vec<SymbolId>,
}

impl Scoped for AggregateDetail {
    fn scope(&self) -> ScopeId {
        self.scope
    }
}

impl Genericizable for AggregateDetail {
    fn generic(&self) -> &GenericInfo {
        &self.generic
    }
}

/// Function or method; the return type lives in the symbol's `type_ref`
#[derive(Debug, Clone, PartialEq)]
pub struct CallableDetail {
    pub(crate) scope: ScopeId,
    pub(crate) generic: GenericInfo,
    pub(crate) parameters: Vec<SymbolId>,
}

impl CallableDetail {
    /// Parameter symbols in declaration order
    pub fn parameters(&self) -> &[SymbolId] {
        &self.parameters
    }
}

impl Scoped for CallableDetail {
    fn scope(&self) -> ScopeId {
        self.scope
    }
}

impl Genericizable for CallableDetail {
    fn generic(&self) -> &GenericInfo {
        &self.generic
    }
}

/// Capability data by symbol kind
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolDetail {
    Plain,
    Aggregate(AggregateDetail),
    Callable(CallableDetail),
}

/// A declared program entity
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Symbol name (canonical internal name for instantiations)
    pub name: String,
    category: SymbolCategory,
    pub genus: SymbolGenus,
    /// Declared or inferred type; return type for callables
    pub type_ref: Option<SymbolId>,
    /// Source location
    pub span: Span,
    pub mutable: bool,
    pub flags: SymbolFlags,
    metadata: FxHashMap<String, String>,
    pub(crate) enclosing: Option<ScopeId>,
    type_parameter: bool,
    detail: SymbolDetail,
}

impl Symbol {
    fn new(name: impl Into<String>, category: SymbolCategory, span: Span, detail: SymbolDetail) -> Self {
        Symbol {
            name: name.into(),
            category,
            genus: SymbolGenus::Value,
            type_ref: None,
            span,
            mutable: false,
            flags: SymbolFlags::default(),
            metadata: FxHashMap::default(),
            enclosing: None,
            type_parameter: false,
            detail,
        }
    }

    /// A mutable variable
    pub fn variable(name: impl Into<String>, type_ref: Option<SymbolId>, span: Span) -> Self {
        let mut symbol = Self::new(name, SymbolCategory::Variable, span, SymbolDetail::Plain);
        symbol.type_ref = type_ref;
        symbol.mutable = true;
        symbol
    }

    /// An immutable constant
    pub fn constant(name: impl Into<String>, type_ref: Option<SymbolId>, span: Span) -> Self {
        let mut symbol = Self::new(name, SymbolCategory::Variable, span, SymbolDetail::Plain);
        symbol.type_ref = type_ref;
        symbol.flags.is_constant = true;
        symbol
    }

    pub fn control(name: impl Into<String>, span: Span) -> Self {
        Self::new(name, SymbolCategory::Control, span, SymbolDetail::Plain)
    }

    pub(crate) fn new_aggregate(name: impl Into<String>, genus: SymbolGenus, scope: ScopeId, span: Span) -> Self {
        let mut symbol = Self::new(
            name,
            SymbolCategory::Type,
            span,
            SymbolDetail::Aggregate(AggregateDetail {
                scope,
                generic: GenericInfo::default(),
                super_type: None,
                traits: Vec::new(),
            }),
        );
        symbol.genus = genus;
        symbol
    }

    pub(crate) fn new_callable(name: impl Into<String>, category: SymbolCategory, scope: ScopeId, span: Span) -> Self {
        let mut symbol = Self::new(
            name,
            category,
            span,
            SymbolDetail::Callable(CallableDetail {
                scope,
                generic: GenericInfo::default(),
                parameters: Vec::new(),
            }),
        );
        symbol.genus = SymbolGenus::Function;
        symbol
    }

    pub(crate) fn type_parameter(name: impl Into<String>, span: Span) -> Self {
        let mut symbol = Self::new(name, SymbolCategory::Type, span, SymbolDetail::Plain);
        symbol.genus = SymbolGenus::TypeParameter;
        symbol.type_parameter = true;
        symbol
    }

    pub fn category(&self) -> SymbolCategory {
        self.category
    }

    pub fn detail(&self) -> &SymbolDetail {
        &self.detail
    }

    /// Scope this symbol was defined in
    pub fn enclosing_scope(&self) -> Option<ScopeId> {
        self.enclosing
    }

    /// True for placeholders such as `T`
    pub fn is_type_parameter(&self) -> bool {
        self.type_parameter
    }

    /// True for placeholders and for symbols still generic in nature
    pub fn is_conceptual(&self) -> bool {
        self.type_parameter || self.is_generic_in_nature()
    }

    pub fn is_generic_in_nature(&self) -> bool {
        self.generic_info().is_some_and(GenericInfo::is_generic_in_nature)
    }

    pub fn as_scoped(&self) -> Option<&dyn Scoped> {
        match &self.detail {
            SymbolDetail::Aggregate(a) => Some(a),
            SymbolDetail::Callable(c) => Some(c),
            SymbolDetail::Plain => None,
        }
    }

    pub fn as_generic(&self) -> Option<&dyn Genericizable> {
        match &self.detail {
            SymbolDetail::Aggregate(a) => Some(a),
            SymbolDetail::Callable(c) => Some(c),
            SymbolDetail::Plain => None,
        }
    }

    /// Member scope, if this symbol has one
    pub fn scope(&self) -> Option<ScopeId> {
        self.as_scoped().map(Scoped::scope)
    }

    pub fn generic_info(&self) -> Option<&GenericInfo> {
        self.as_generic().map(Genericizable::generic)
    }

    pub(crate) fn generic_info_mut(&mut self) -> Option<&mut GenericInfo> {
        match &mut self.detail {
            SymbolDetail::Aggregate(a) => Some(&mut a.generic),
            SymbolDetail::Callable(c) => Some(&mut c.generic),
            SymbolDetail::Plain => None,
        }
    }

    pub fn aggregate(&self) -> Option<&AggregateDetail> {
        match &self.detail {
            SymbolDetail::Aggregate(a) => Some(a),
            _ => None,
        }
    }

    pub fn aggregate_mut(&mut self) -> Option<&mut AggregateDetail> {
        match &mut self.detail {
            SymbolDetail::Aggregate(a) => Some(a),
            _ => None,
        }
    }

    pub fn callable(&self) -> Option<&CallableDetail> {
        match &self.detail {
            SymbolDetail::Callable(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn callable_mut(&mut self) -> Option<&mut CallableDetail> {
        match &mut self.detail {
            SymbolDetail::Callable(c) => Some(c),
            _ => None,
        }
    }

    /// Parameter symbols for callables; empty otherwise
    pub fn call_parameters(&self) -> &[SymbolId] {
        self.callable().map(CallableDetail::parameters).unwrap_or(&[])
    }

    pub(crate) fn push_type_parameter(&mut self, entry: TypeArgument) {
        if let Some(generic) = self.generic_info_mut() {
            generic.parameters.push(entry);
        }
        self.recompute_category();
    }

    pub(crate) fn set_type_parameters(&mut self, entries: Vec<TypeArgument>) {
        if let Some(generic) = self.generic_info_mut() {
            generic.parameters = entries;
        }
        self.recompute_category();
    }

    /// Keep the template categories in step with the parameter list
    fn recompute_category(&mut self) {
        use SymbolCategory::*;

        let generic = self.is_generic_in_nature();
        self.category = match (self.category, generic) {
            (Type | TemplateType, true) => TemplateType,
            (Type | TemplateType, false) => Type,
            (Function | TemplateFunction, true) => TemplateFunction,
            (Function | TemplateFunction, false) => Function,
            (other, _) => other,
        };
    }

    /// Point a copied symbol at its copied member scope
    pub(crate) fn rebind(&mut self, scope: ScopeId, remap: &FxHashMap<SymbolId, SymbolId>) {
        match &mut self.detail {
            SymbolDetail::Aggregate(a) => a.scope = scope,
            SymbolDetail::Callable(c) => {
                c.scope = scope;
                for parameter in &mut c.parameters {
                    if let Some(&copy) = remap.get(parameter) {
                        *parameter = copy;
                    }
                }
            }
            SymbolDetail::Plain => {}
        }
    }

    pub(crate) fn set_call_parameters(&mut self, parameters: Vec<SymbolId>) {
        if let Some(callable) = self.callable_mut() {
            callable.parameters = parameters;
        }
    }

    /// Store out-of-band data against this symbol
    pub fn put_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}
