use myrepl_core::binlog::{RowsCommand, RowsEvent};
use myrepl_core::value::ColumnValue;
use smol_str::SmolStr;

/// one changed row; `before` holds the only image for inserts and
/// deletes, updates carry both
#[derive(Debug, Clone)]
pub struct RowImage {
    pub before: Vec<ColumnValue>,
    pub after: Vec<ColumnValue>,
}

/// the rows of one row event, resolved to their table
#[derive(Debug, Clone)]
pub struct TableRows {
    pub schema: SmolStr,
    pub table: SmolStr,
    pub rows: Vec<RowImage>,
}

impl TableRows {
    pub(crate) fn from_event(ev: &RowsEvent) -> (RowsCommand, Self) {
        let rows = ev
            .rows
            .iter()
            .map(|r| RowImage {
                before: r.values.clone(),
                after: r.after_values.clone(),
            })
            .collect();
        (
            ev.command,
            TableRows {
                schema: ev.schema_name.clone(),
                table: ev.table_name.clone(),
                rows,
            },
        )
    }
}

/// what the embedding application implements to receive the stream
pub trait Callback {
    /// a statement was executed on the master
    fn on_query(&mut self, sql: &str);

    fn on_insert(&mut self, rows: &TableRows);

    fn on_update(&mut self, rows: &TableRows);

    fn on_delete(&mut self, rows: &TableRows);

    /// the log is exhausted; return true to stop replicating, false
    /// to keep waiting for new events
    fn on_idle(&mut self) -> bool;

    /// a row referenced a column the schema tracker knows nothing
    /// about (its CREATE TABLE predates the stream); the embedder may
    /// supply the attributes out of band
    fn on_missing_column_attr(&mut self, schema: &str, table: &str, col_idx: usize);
}
