//! Canonical names for instantiations

use crate::error::SymbolError;
use crate::symbol::SymbolId;
use crate::table::SymbolTable;
use sha2::{Digest, Sha256};

/// Name of the instantiation of `generic` with `arguments`
///
/// `_<Name>_<DIGEST>`, where the digest is the upper-case hex SHA-256 of the
/// generic's and arguments' fully qualified names joined by `_`. Equal
/// argument lists always give equal names.
pub fn canonical_name(table: &SymbolTable, generic: SymbolId, arguments: &[SymbolId]) -> Result<String, SymbolError> {
    let mut key = table.fully_qualified_name(generic)?;
    for &argument in arguments {
        key.push('_');
        key.push_str(&table.fully_qualified_name(argument)?);
    }

    let digest = Sha256::digest(key.as_bytes());
    Ok(format!("_{}_{}", table.symbol(generic)?.name, hex::encode_upper(digest)))
}
