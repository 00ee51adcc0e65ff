//! column attribute tracking
//!
//! the binary log never transmits column names, signedness or the
//! value lists of SET/ENUM columns. the tracker reconstructs them by
//! feeding every CREATE TABLE / ALTER TABLE statement observed in
//! query events through an external DDL parser and replaying the
//! column mutations on its own schema -> table -> columns map.
use crate::error::Result;
use smol_str::SmolStr;
use std::collections::HashMap;

/// reconstructed attributes of one column
#[derive(Debug, Clone)]
pub struct ColumnAttr {
    pub name: SmolStr,
    /// normalized type name as written in the DDL, e.g. "int", "set"
    pub type_name: SmolStr,
    /// numeric columns only; false when unknown
    pub unsigned: bool,
    /// ordered value list for SET/ENUM columns
    pub set_values: Vec<String>,
}

pub type TableAttr = Vec<ColumnAttr>;

/// schema name -> table name -> ordered column list
#[derive(Debug, Clone, Default)]
pub struct SchemaAttrs {
    tables: HashMap<SmolStr, HashMap<SmolStr, TableAttr>>,
}

impl SchemaAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, schema: &str, table: &str) -> Option<&TableAttr> {
        self.tables.get(schema).and_then(|t| t.get(table))
    }

    pub fn column_at(&self, schema: &str, table: &str, idx: usize) -> Option<&ColumnAttr> {
        self.table(schema, table).and_then(|cols| cols.get(idx))
    }

    /// replay one parsed DDL statement
    pub fn apply(&mut self, ddl: &DdlTable) {
        let cols = self
            .tables
            .entry(ddl.schema.clone())
            .or_insert_with(HashMap::new)
            .entry(ddl.table.clone())
            .or_insert_with(Vec::new);
        match ddl.action {
            DdlAction::Create => {
                cols.clear();
                cols.extend(ddl.cols.iter().map(ColumnAttr::from_ddl));
            }
            DdlAction::Alter => {
                for col in &ddl.cols {
                    if col.drop {
                        if let Some(idx) = cols.iter().position(|c| c.name == col.name) {
                            cols.remove(idx);
                        }
                        continue;
                    }
                    let attr = ColumnAttr::from_ddl(col);
                    match &col.position {
                        ColumnPosition::First => cols.insert(0, attr),
                        ColumnPosition::After(name) => {
                            match cols.iter().position(|c| &c.name == name) {
                                Some(idx) => cols.insert(idx + 1, attr),
                                None => cols.push(attr),
                            }
                        }
                        ColumnPosition::Tail => cols.push(attr),
                    }
                }
            }
        }
    }
}

impl ColumnAttr {
    fn from_ddl(col: &DdlColumn) -> Self {
        ColumnAttr {
            name: col.name.clone(),
            type_name: col.type_name.clone(),
            unsigned: col.unsigned,
            set_values: col.set_values.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DdlAction {
    Create,
    Alter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnPosition {
    First,
    After(SmolStr),
    Tail,
}

/// one column as reported by the DDL parser
#[derive(Debug, Clone)]
pub struct DdlColumn {
    pub name: SmolStr,
    pub type_name: SmolStr,
    pub unsigned: bool,
    pub set_values: Vec<String>,
    pub position: ColumnPosition,
    pub drop: bool,
}

impl DdlColumn {
    pub fn new(name: impl Into<SmolStr>, type_name: impl Into<SmolStr>) -> Self {
        DdlColumn {
            name: name.into(),
            type_name: type_name.into(),
            unsigned: false,
            set_values: Vec::new(),
            position: ColumnPosition::Tail,
            drop: false,
        }
    }

    pub fn dropped(name: impl Into<SmolStr>) -> Self {
        DdlColumn {
            name: name.into(),
            type_name: SmolStr::default(),
            unsigned: false,
            set_values: Vec::new(),
            position: ColumnPosition::Tail,
            drop: true,
        }
    }
}

/// one CREATE TABLE or ALTER TABLE statement as reported by the parser
#[derive(Debug, Clone)]
pub struct DdlTable {
    pub action: DdlAction,
    pub schema: SmolStr,
    pub table: SmolStr,
    pub cols: Vec<DdlColumn>,
}

/// contract of the external SQL parser collaborator: extract table and
/// column metadata from CREATE TABLE / ALTER TABLE statements. any
/// other statement yields an empty list or an error, both of which the
/// caller treats as "nothing to track".
pub trait DdlParser {
    fn parse(&self, sql: &str) -> Result<Vec<DdlTable>>;
}
