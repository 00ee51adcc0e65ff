use crate::bitmap;
use crate::binlog::LogEventType;
use crate::col::ColumnType;
use crate::context::ServerContext;
use crate::error::{Error, Result};
use crate::value::{read_value, ColumnData, ColumnValue};
use bytes::{Buf, Bytes};
use smol_str::SmolStr;
use wirebytes::{ReadBytesExt, ReadMyEnc};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowsCommand {
    Insert,
    Update,
    Delete,
}

/// one changed row; `after_values` is populated for updates only
#[derive(Debug, Clone)]
pub struct RowsEventRow {
    pub values: Vec<ColumnValue>,
    pub after_values: Vec<ColumnValue>,
}

/// decoded write/update/delete event
#[derive(Debug, Clone)]
pub struct RowsEvent {
    pub version: u8,
    pub command: RowsCommand,
    pub table_id: u64,
    pub flags: u16,
    /// v2 events may carry an opaque extra-data block
    pub extra_data: Bytes,
    pub n_cols: usize,
    pub schema_name: SmolStr,
    pub table_name: SmolStr,
    pub rows: Vec<RowsEventRow>,
    /// column indices the schema tracker had no attributes for
    pub missing_attr_cols: Vec<usize>,
    /// set when the payload was consumed without decoding rows
    /// (unknown table id or a column kind we cannot decode)
    pub skipped: bool,
}

fn command_of(event_type: LogEventType) -> (u8, RowsCommand) {
    match event_type {
        LogEventType::WriteRowsEventV0 => (0, RowsCommand::Insert),
        LogEventType::UpdateRowsEventV0 => (0, RowsCommand::Update),
        LogEventType::DeleteRowsEventV0 => (0, RowsCommand::Delete),
        LogEventType::WriteRowsEventV1 => (1, RowsCommand::Insert),
        LogEventType::UpdateRowsEventV1 => (1, RowsCommand::Update),
        LogEventType::DeleteRowsEventV1 => (1, RowsCommand::Delete),
        LogEventType::WriteRowsEventV2 => (2, RowsCommand::Insert),
        LogEventType::UpdateRowsEventV2 => (2, RowsCommand::Update),
        LogEventType::DeleteRowsEventV2 => (2, RowsCommand::Delete),
        // callers dispatch on is_row_event first
        _ => (0, RowsCommand::Insert),
    }
}

/// decode a row event body (CRC trailer already stripped)
pub fn read_rows_event(
    input: &mut Bytes,
    type_code: u8,
    ctx: &ServerContext,
) -> Result<RowsEvent> {
    let event_type = LogEventType::from(type_code);
    let (version, command) = command_of(event_type);
    let table_id = if ctx.post_header_length(type_code) == Some(6) {
        input.read_le_u32()? as u64
    } else {
        input.read_le_u48()?
    };
    let flags = input.read_le_u16()?;
    let extra_data = if version == 2 {
        let extra_len = input.read_le_u16()?;
        if extra_len > 2 {
            input.read_len(extra_len as usize - 2)?
        } else {
            Bytes::new()
        }
    } else {
        Bytes::new()
    };
    let n_cols = input
        .read_len_enc_int()?
        .to_u64()
        .ok_or_else(|| Error::BinlogEventError("invalid column count".to_owned()))?
        as usize;
    let bitmap_len = (n_cols + 7) / 8;
    let present_before = input.read_len(bitmap_len)?;
    let present_after = if command == RowsCommand::Update {
        input.read_len(bitmap_len)?
    } else {
        present_before.clone()
    };

    let mut event = RowsEvent {
        version,
        command,
        table_id,
        flags,
        extra_data,
        n_cols,
        schema_name: SmolStr::default(),
        table_name: SmolStr::default(),
        rows: Vec::new(),
        missing_attr_cols: Vec::new(),
        skipped: false,
    };

    let table_map = match ctx.table_maps.get(&table_id) {
        Some(tm) => tm,
        None => {
            // no table map in a well-formed stream means we lost the
            // announcement; drop the payload, keep the connection
            log::warn!("row event for unknown table id {}, skipping", table_id);
            input.advance(input.remaining());
            event.skipped = true;
            return Ok(event);
        }
    };
    event.schema_name = table_map.schema_name.clone();
    event.table_name = table_map.table_name.clone();
    if n_cols > table_map.col_types.len() {
        return Err(Error::BinlogEventError(format!(
            "row event declares {} columns but table map has {}",
            n_cols,
            table_map.col_types.len()
        )));
    }
    if table_map.has_unsupported_column() {
        // decoding past an unknown-width column would corrupt every
        // later column, so the whole event is dropped
        log::warn!(
            "unsupported column type in {}.{}, skipping row event",
            table_map.schema_name,
            table_map.table_name
        );
        input.advance(input.remaining());
        event.skipped = true;
        return Ok(event);
    }

    let server_5_6 = ctx.compare_version("5.6.0") != Ordering::Less;
    let mut missing = Vec::new();
    while input.has_remaining() {
        let values = read_row(
            input,
            table_map,
            &present_before,
            n_cols,
            ctx,
            server_5_6,
            &mut missing,
        )?;
        let after_values = if command == RowsCommand::Update {
            read_row(
                input,
                table_map,
                &present_after,
                n_cols,
                ctx,
                server_5_6,
                &mut missing,
            )?
        } else {
            Vec::new()
        };
        event.rows.push(RowsEventRow {
            values,
            after_values,
        });
    }
    event.missing_attr_cols = missing;
    Ok(event)
}

fn read_row(
    input: &mut Bytes,
    table_map: &crate::binlog::TableMap,
    present: &Bytes,
    n_cols: usize,
    ctx: &ServerContext,
    server_5_6: bool,
    missing: &mut Vec<usize>,
) -> Result<Vec<ColumnValue>> {
    // the null bitmap covers only the columns marked present
    let present_cnt = bitmap::count_set(present, n_cols);
    let null_bitmap = input.read_len((present_cnt + 7) / 8)?;
    let mut values = Vec::with_capacity(present_cnt);
    let mut present_idx = 0;
    for i in 0..n_cols {
        if !bitmap::index(present, i) {
            continue;
        }
        let col_type = table_map.col_types[i];
        let is_null = bitmap::index(&null_bitmap, present_idx);
        present_idx += 1;
        let attr = ctx
            .columns
            .column_at(&table_map.schema_name, &table_map.table_name, i);
        if attr.is_none() && !missing.contains(&i) {
            missing.push(i);
        }
        if is_null || col_type == ColumnType::Null {
            values.push(ColumnValue::null(col_type));
            continue;
        }
        let unsigned = attr.map(|a| a.unsigned).unwrap_or(false);
        let data = read_value(
            input,
            col_type,
            &table_map.col_metas[i],
            unsigned,
            server_5_6,
        )?;
        values.push(ColumnValue {
            col_type,
            is_null: matches!(data, ColumnData::Null),
            data,
        });
    }
    Ok(values)
}
