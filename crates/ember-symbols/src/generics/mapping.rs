//! Parameter-to-argument mappings
//!
//! Both mappings are pure functions over type-argument lists; they never
//! touch the symbol table.

use crate::symbol::{SymbolId, TypeArgument};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Mapping failure
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MappingError {
    /// Argument list length does not match the slots it binds
    #[error("expected {expected} argument(s), got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Positional binding of a generic's parameters to arguments
pub struct ConceptualLookupMapping;

impl ConceptualLookupMapping {
    /// Map each conceptual parameter to the argument in the same position
    ///
    /// Concrete parameters are fixed and never become keys.
    pub fn positional(
        parameters: &[TypeArgument],
        arguments: &[SymbolId],
    ) -> Result<FxHashMap<SymbolId, SymbolId>, MappingError> {
        if parameters.len() != arguments.len() {
            return Err(MappingError::LengthMismatch {
                expected: parameters.len(),
                actual: arguments.len(),
            });
        }

        Ok(parameters
            .iter()
            .zip(arguments)
            .filter(|(parameter, _)| parameter.conceptual)
            .map(|(parameter, &argument)| (parameter.symbol, argument))
            .collect())
    }
}

/// Layered binding for partial parameterization
pub struct ConceptualFlatteningMapping;

impl ConceptualFlatteningMapping {
    /// Replace the conceptual entries of `parameters`, left to right, with
    /// `arguments`; concrete entries pass through
    ///
    /// `arguments` must have exactly one entry per conceptual slot. A list
    /// without conceptual slots flattened with no arguments is returned as is.
    pub fn apply(parameters: &[TypeArgument], arguments: &[TypeArgument]) -> Result<Vec<TypeArgument>, MappingError> {
        let slots = parameters.iter().filter(|p| p.conceptual).count();
        if slots != arguments.len() {
            return Err(MappingError::LengthMismatch {
                expected: slots,
                actual: arguments.len(),
            });
        }

        let mut supplied = arguments.iter();
        Ok(parameters
            .iter()
            .map(|parameter| {
                if parameter.conceptual {
                    supplied.next().copied().unwrap_or(*parameter)
                } else {
                    *parameter
                }
            })
            .collect())
    }

    /// Apply each layer in turn
    pub fn compose(parameters: &[TypeArgument], layers: &[Vec<TypeArgument>]) -> Result<Vec<TypeArgument>, MappingError> {
        layers
            .iter()
            .try_fold(parameters.to_vec(), |current, layer| Self::apply(&current, layer))
    }
}
