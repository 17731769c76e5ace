//! Creation of empty instantiations

use crate::error::SymbolError;
use crate::symbol::{PopulationState, SymbolId};
use crate::table::SymbolTable;
use rustc_hash::FxHashMap;

/// Builds the empty shell of an instantiation from its generic
pub(crate) struct ParameterizedSymbolCreator<'t> {
    table: &'t mut SymbolTable,
}

impl<'t> ParameterizedSymbolCreator<'t> {
    pub(crate) fn new(table: &'t mut SymbolTable) -> Self {
        ParameterizedSymbolCreator { table }
    }

    /// Copy `generic`'s shape under `name`, bind it to `arguments` and define
    /// it next to the generic
    ///
    /// The copy keeps the generic's genus, flags and metadata. Its member
    /// scope is new and empty, and its population state is `Empty`.
    pub(crate) fn create(self, generic: SymbolId, name: &str, arguments: &[SymbolId]) -> Result<SymbolId, SymbolError> {
        let entries = arguments
            .iter()
            .map(|&argument| self.table.type_argument(argument))
            .collect::<Result<Vec<_>, _>>()?;

        let source = self.table.symbol(generic)?;
        let owner = source.enclosing_scope().ok_or_else(|| SymbolError::NotScoped {
            name: source.name.clone(),
            span: source.span,
        })?;
        let kind = self.table.scope(self.table.member_scope(generic)?)?.kind;
        let mut shape = source.clone();

        let scope = self.table.alloc_scope(kind, name, Some(owner), None);
        shape.name = name.to_string();
        shape.enclosing = Some(owner);
        shape.rebind(scope, &FxHashMap::default());
        shape.set_call_parameters(Vec::new());
        if let Some(info) = shape.generic_info_mut() {
            info.generic_type = Some(generic);
            info.dependents.clear();
            info.population = PopulationState::Empty;
        }
        shape.set_type_parameters(entries);

        let id = self.table.alloc_symbol(shape);
        self.table.set_scope_owner(scope, id)?;
        self.table.define(owner, id)?;
        self.table.record_instantiation();
        Ok(id)
    }
}
