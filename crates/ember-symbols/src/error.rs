//! Error types for symbol definition, resolution and parameterization
//!
//! Every failure carries the source location it should be reported at and
//! enough of the symbols involved for a diagnostic renderer. This crate never
//! formats user-facing messages itself: callers take the `(Span, ErrorCode)`
//! pair from [`SymbolError::report`] and hand it to their reporter.

use crate::scope::ScopeId;
use crate::span::Span;
use crate::symbol::SymbolId;
use thiserror::Error;

/// Classification code for a symbol error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Errors raised by the symbol table and the generic engine
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SymbolError {
    /// Non-overloadable symbol defined twice in the same scope
    #[error("Duplicate definition of '{name}'")]
    DuplicateDefinition {
        /// Symbol name
        name: String,
        /// Location of the original definition
        original: Span,
        /// Location of the redefinition
        duplicate: Span,
    },

    /// Search found nothing
    #[error("Unresolved name '{name}'")]
    Unresolved {
        /// Name searched for
        name: String,
        /// Location of the reference
        span: Span,
    },

    /// Two or more candidates share the best match weight
    #[error("Ambiguous reference to '{name}' ({} candidates)", .candidates.len())]
    AmbiguousOverload {
        /// Name searched for
        name: String,
        /// The tied candidates
        candidates: Vec<SymbolId>,
        /// Location of the reference
        span: Span,
    },

    /// Argument list length differs from the generic's parameter list
    #[error("'{generic}' expects {expected} type argument(s), got {actual}")]
    ArityMismatch {
        /// Generic symbol name
        generic: String,
        /// Number of type parameters
        expected: usize,
        /// Number of supplied arguments
        actual: usize,
        /// Location that triggered the parameterization
        span: Span,
    },

    /// Parameterization or flattening stopped reducing conceptual entries
    #[error("Parameterization of '{generic}' makes no progress: {reason}")]
    NoProgress {
        /// Generic symbol name
        generic: String,
        /// What failed to converge
        reason: String,
        /// Location that triggered the parameterization
        span: Span,
    },

    /// Symbol cannot be parameterized
    #[error("'{name}' is not a generic type or function")]
    NotGeneric {
        /// Symbol name
        name: String,
        /// Location that triggered the parameterization
        span: Span,
    },

    /// Substitution produced two operations with the same signature
    #[error("Parameterization of '{generic}' produces duplicate operation '{operation}'")]
    DuplicateOperation {
        /// Instantiation name
        generic: String,
        /// Operation name
        operation: String,
        /// Location that triggered the parameterization
        span: Span,
    },

    /// Symbol has no member scope
    #[error("'{name}' has no member scope")]
    NotScoped {
        /// Symbol name
        name: String,
        /// Location of the symbol
        span: Span,
    },

    /// Handle does not refer to a symbol in this table
    #[error("Unknown symbol {0:?}")]
    UnknownSymbol(SymbolId),

    /// Handle does not refer to a scope in this table
    #[error("Unknown scope {0:?}")]
    UnknownScope(ScopeId),
}

impl SymbolError {
    /// Location the error should be reported at
    pub fn span(&self) -> Span {
        use SymbolError::*;

        match self {
            DuplicateDefinition { duplicate, .. } => *duplicate,
            Unresolved { span, .. }
            | AmbiguousOverload { span, .. }
            | ArityMismatch { span, .. }
            | NoProgress { span, .. }
            | NotGeneric { span, .. }
            | DuplicateOperation { span, .. }
            | NotScoped { span, .. } => *span,
            UnknownSymbol(_) | UnknownScope(_) => Span::synthetic(),
        }
    }

    /// Classification code for the error reporter
    pub fn code(&self) -> ErrorCode {
        use SymbolError::*;

        match self {
            DuplicateDefinition { .. } => ErrorCode("S1001"),
            Unresolved { .. } => ErrorCode("S1002"),
            AmbiguousOverload { .. } => ErrorCode("S1003"),
            ArityMismatch { .. } => ErrorCode("S1004"),
            NoProgress { .. } => ErrorCode("S1005"),
            NotGeneric { .. } => ErrorCode("S1006"),
            DuplicateOperation { .. } => ErrorCode("S1007"),
            UnknownSymbol(_) => ErrorCode("S1008"),
            UnknownScope(_) => ErrorCode("S1009"),
            NotScoped { .. } => ErrorCode("S1010"),
        }
    }

    /// The `(location, classification)` pair handed to the error reporter
    pub fn report(&self) -> (Span, ErrorCode) {
        (self.span(), self.code())
    }

    /// True for failures that indicate a compiler defect rather than a
    /// problem in the source program
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SymbolError::ArityMismatch { .. }
                | SymbolError::NotScoped { .. }
                | SymbolError::UnknownSymbol(_)
                | SymbolError::UnknownScope(_)
        )
    }
}
