//! Search queries issued against scopes

use crate::span::Span;
use crate::symbol::{SymbolCategory, SymbolId};

/// What to look for in a scope chain
///
/// A search with `parameters` set is a signature search: candidates must be
/// callables of the same arity and are ranked by parameter-list weight.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSearch {
    /// Plain name or `module::Name`
    pub name: String,
    /// Accepted categories; empty accepts every category
    pub categories: Vec<SymbolCategory>,
    /// Argument types for method/operator/function lookups
    pub parameters: Option<Vec<SymbolId>>,
    /// Required result type
    pub returning: Option<SymbolId>,
    /// Only walk outward through block scopes
    pub limit_to_blocks: bool,
    /// Location of the reference, used in errors
    pub span: Span,
}

impl SymbolSearch {
    pub fn new(name: impl Into<String>) -> Self {
        SymbolSearch {
            name: name.into(),
            categories: Vec::new(),
            parameters: None,
            returning: None,
            limit_to_blocks: false,
            span: Span::synthetic(),
        }
    }

    /// Signature search for a method or operator
    pub fn method(name: impl Into<String>, parameters: Vec<SymbolId>) -> Self {
        let mut search = Self::new(name);
        search.categories = vec![SymbolCategory::Method];
        search.parameters = Some(parameters);
        search
    }

    /// Signature search for a free-standing function
    pub fn function(name: impl Into<String>, parameters: Vec<SymbolId>) -> Self {
        let mut search = Self::new(name);
        search.categories = vec![SymbolCategory::Function, SymbolCategory::TemplateFunction];
        search.parameters = Some(parameters);
        search
    }

    /// Any symbol usable as a type
    pub fn any_type(name: impl Into<String>) -> Self {
        let mut search = Self::new(name);
        search.categories = SymbolCategory::TYPES.to_vec();
        search
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(name).of_category(SymbolCategory::Variable)
    }

    pub fn of_category(mut self, category: SymbolCategory) -> Self {
        self.categories = vec![category];
        self
    }

    pub fn with_return(mut self, type_ref: SymbolId) -> Self {
        self.returning = Some(type_ref);
        self
    }

    pub fn block_limited(mut self) -> Self {
        self.limit_to_blocks = true;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn accepts(&self, category: SymbolCategory) -> bool {
        self.categories.is_empty()
            || self.categories.contains(&SymbolCategory::Any)
            || self.categories.contains(&category)
    }

    pub fn is_signature_search(&self) -> bool {
        self.parameters.is_some()
    }

    /// True when conceptual type parameters can satisfy this search
    pub fn accepts_types(&self) -> bool {
        self.accepts(SymbolCategory::Type)
    }

    /// Splits `module::Name` into its module and simple name
    pub fn qualified_parts(&self) -> Option<(&str, &str)> {
        self.name.rsplit_once("::")
    }
}
