//! Ember symbol engine
//!
//! Symbols, scopes, name and overload resolution, assignability weights and
//! generic parameterization for the Ember front end.

pub mod config;
pub mod error;
pub mod generics;
pub mod matching;
pub mod resolve;
pub mod scope;
pub mod search;
pub mod shared;
pub mod span;
pub mod symbol;
pub mod table;

pub use config::{EngineConfig, GenericsConfig, MatchConfig};
pub use error::{ErrorCode, SymbolError};
pub use generics::{
    canonical_name, ConceptualFlatteningMapping, ConceptualLookupMapping, MappingError, Parameterizer,
    TypeSubstitution,
};
pub use matching::{CoercionRegistry, MethodMatches, TypeMatcher, WeightedMatch, NOT_ASSIGNABLE};
pub use resolve::{Resolvable, Resolver};
pub use scope::{Scope, ScopeId, ScopeKind};
pub use search::SymbolSearch;
pub use shared::SharedSymbolTable;
pub use span::Span;
pub use symbol::{
    AggregateDetail, CallableDetail, GenericInfo, Genericizable, PopulationState, Scoped, Symbol, SymbolCategory,
    SymbolDetail, SymbolFlags, SymbolGenus, SymbolId, TypeArgument,
};
pub use table::{Checkpoint, SymbolTable};
