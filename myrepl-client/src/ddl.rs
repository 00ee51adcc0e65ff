//! default DDL parser collaborator, backed by the `sqlparser` crate
//!
//! only CREATE TABLE and ALTER TABLE ADD/DROP COLUMN are extracted;
//! everything else, including statements the MySQL dialect cannot
//! parse at all, yields an empty list and is ignored by the tracker.
use myrepl_core::schema::{ColumnPosition, DdlAction, DdlColumn, DdlParser, DdlTable};
use myrepl_core::{Error, Result};
use smol_str::SmolStr;
use sqlparser::ast::{
    AlterTableOperation, ColumnDef, DataType, MySQLColumnPosition, ObjectName, Statement,
};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

#[derive(Debug, Default)]
pub struct SqlDdlParser;

impl DdlParser for SqlDdlParser {
    fn parse(&self, sql: &str) -> Result<Vec<DdlTable>> {
        // most query events are DML or transaction control; skip the
        // parser for those
        let upper = sql.to_ascii_uppercase();
        if !upper.contains("CREATE TABLE") && !upper.contains("ALTER TABLE") {
            return Ok(Vec::new());
        }
        let statements = Parser::parse_sql(&MySqlDialect {}, sql)
            .map_err(|e| Error::DdlParseError(e.to_string()))?;
        let mut tables = Vec::new();
        for stmt in &statements {
            match stmt {
                Statement::CreateTable { name, columns, .. } => {
                    let (schema, table) = split_name(name);
                    tables.push(DdlTable {
                        action: DdlAction::Create,
                        schema,
                        table,
                        cols: columns.iter().map(column_from_def).collect(),
                    });
                }
                Statement::AlterTable {
                    name, operations, ..
                } => {
                    let (schema, table) = split_name(name);
                    let mut cols = Vec::new();
                    for op in operations {
                        match op {
                            AlterTableOperation::AddColumn {
                                column_def,
                                column_position,
                                ..
                            } => {
                                let mut col = column_from_def(column_def);
                                col.position = match column_position {
                                    Some(MySQLColumnPosition::First) => ColumnPosition::First,
                                    Some(MySQLColumnPosition::After(ident)) => {
                                        ColumnPosition::After(SmolStr::from(ident.value.as_str()))
                                    }
                                    None => ColumnPosition::Tail,
                                };
                                cols.push(col);
                            }
                            AlterTableOperation::DropColumn { column_name, .. } => {
                                cols.push(DdlColumn::dropped(column_name.value.as_str()));
                            }
                            // CHANGE/MODIFY and the rest are not
                            // reconstructible from here
                            _ => continue,
                        }
                    }
                    tables.push(DdlTable {
                        action: DdlAction::Alter,
                        schema,
                        table,
                        cols,
                    });
                }
                _ => continue,
            }
        }
        Ok(tables)
    }
}

fn split_name(name: &ObjectName) -> (SmolStr, SmolStr) {
    match name.0.as_slice() {
        [schema, table] => (
            SmolStr::from(schema.value.as_str()),
            SmolStr::from(table.value.as_str()),
        ),
        [table] => (SmolStr::default(), SmolStr::from(table.value.as_str())),
        _ => (SmolStr::default(), SmolStr::default()),
    }
}

fn column_from_def(def: &ColumnDef) -> DdlColumn {
    let (type_name, unsigned, set_values) = map_data_type(&def.data_type);
    let mut col = DdlColumn::new(def.name.value.as_str(), type_name);
    col.unsigned = unsigned;
    col.set_values = set_values;
    col
}

fn map_data_type(dt: &DataType) -> (SmolStr, bool, Vec<String>) {
    let (name, unsigned): (&str, bool) = match dt {
        DataType::TinyInt(_) => ("tinyint", false),
        DataType::UnsignedTinyInt(_) => ("tinyint", true),
        DataType::SmallInt(_) => ("smallint", false),
        DataType::UnsignedSmallInt(_) => ("smallint", true),
        DataType::MediumInt(_) => ("mediumint", false),
        DataType::UnsignedMediumInt(_) => ("mediumint", true),
        DataType::Int(_) | DataType::Integer(_) => ("int", false),
        DataType::UnsignedInt(_) | DataType::UnsignedInteger(_) => ("int", true),
        DataType::BigInt(_) => ("bigint", false),
        DataType::UnsignedBigInt(_) => ("bigint", true),
        DataType::Float(_) => ("float", false),
        DataType::Double | DataType::DoublePrecision | DataType::Real => ("double", false),
        DataType::Decimal(_) | DataType::Numeric(_) | DataType::Dec(_) => ("decimal", false),
        DataType::Char(_) | DataType::Character(_) => ("char", false),
        DataType::Varchar(_) | DataType::CharacterVarying(_) | DataType::CharVarying(_) => {
            ("varchar", false)
        }
        DataType::Text => ("text", false),
        DataType::Blob(_) => ("blob", false),
        DataType::Binary(_) => ("binary", false),
        DataType::Varbinary(_) => ("varbinary", false),
        DataType::Date => ("date", false),
        DataType::Time(_, _) => ("time", false),
        DataType::Datetime(_) => ("datetime", false),
        DataType::Timestamp(_, _) => ("timestamp", false),
        DataType::Bool | DataType::Boolean => ("tinyint", false),
        DataType::Enum(values) => {
            return (SmolStr::from("enum"), false, values.clone());
        }
        DataType::Set(values) => {
            return (SmolStr::from("set"), false, values.clone());
        }
        // YEAR, GEOMETRY and friends come through as custom types
        DataType::Custom(name, _) => {
            let lowered = name
                .0
                .last()
                .map(|i| i.value.to_ascii_lowercase())
                .unwrap_or_default();
            return (SmolStr::from(lowered), false, Vec::new());
        }
        _ => ("", false),
    };
    (SmolStr::from(name), unsigned, Vec::new())
}
