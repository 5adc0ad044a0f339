//! Lexical scope for pattern variables.
//!
//! The surrounding match planner owns variable binding; the expression
//! core only reads it. A binding pairs the SQL identifier a variable
//! was bound to with the data type of the bound value, which is what
//! disambiguates entity comparisons from scalar comparisons.

use std::collections::HashMap;

use crate::pgsql::{DataType, Identifier};

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub identifier: Identifier,
    pub data_type: DataType,
}

#[derive(Debug, Default)]
pub struct Scope {
    by_identifier: HashMap<Identifier, Binding>,
    by_symbol: HashMap<String, Identifier>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a source symbol using the symbol itself as the SQL
    /// identifier.
    pub fn bind(&mut self, symbol: impl Into<String>, data_type: DataType) {
        let symbol = symbol.into();
        let identifier = Identifier::from(symbol.clone());
        self.bind_aliased(symbol, identifier, data_type);
    }

    /// Bind a source symbol to a planner-chosen SQL identifier.
    pub fn bind_aliased(
        &mut self,
        symbol: impl Into<String>,
        identifier: Identifier,
        data_type: DataType,
    ) {
        let symbol = symbol.into();
        self.by_symbol.insert(symbol, identifier.clone());
        self.by_identifier.insert(
            identifier.clone(),
            Binding {
                identifier,
                data_type,
            },
        );
    }

    pub fn lookup(&self, identifier: &Identifier) -> Option<&Binding> {
        self.by_identifier.get(identifier)
    }

    pub fn lookup_string(&self, symbol: &str) -> Option<&Binding> {
        self.by_symbol
            .get(symbol)
            .and_then(|identifier| self.by_identifier.get(identifier))
    }
}
