use crate::col::{parse_col_metas, ColumnMeta, ColumnType};
use crate::context::ServerContext;
use bytes::Bytes;
use smol_str::SmolStr;
use std::convert::TryFrom;
use wirebytes::{Error, ReadBytesExt, ReadFromBytesWithContext, ReadMyEnc, Result};

const TABLE_MAP_EVENT_CODE: u8 = 19;

/// associates a numeric table id with a schema/table/column layout;
/// row events reference the id. a re-announcement under the same id
/// supersedes the previous map.
#[derive(Debug, Clone)]
pub struct TableMap {
    pub table_id: u64,
    pub flags: u16,
    pub schema_name: SmolStr,
    pub table_name: SmolStr,
    pub col_types: Vec<ColumnType>,
    pub col_metas: Vec<ColumnMeta>,
    /// columns that allow NULL
    pub null_bitmap: Vec<u8>,
}

impl<'c> ReadFromBytesWithContext<'c> for TableMap {
    type Context = &'c ServerContext;

    fn read_with_ctx(input: &mut Bytes, ctx: Self::Context) -> Result<Self> {
        // the declared post-header length decides the table-id width;
        // old servers used 4 bytes
        let table_id = if ctx.post_header_length(TABLE_MAP_EVENT_CODE) == Some(6) {
            input.read_le_u32()? as u64
        } else {
            input.read_le_u48()?
        };
        let flags = input.read_le_u16()?;
        let schema_name_len = input.read_u8()?;
        let schema_raw = input.read_len(schema_name_len as usize)?;
        input.read_len(1)?;
        let table_name_len = input.read_u8()?;
        let table_raw = input.read_len(table_name_len as usize)?;
        input.read_len(1)?;
        let col_cnt = input
            .read_len_enc_int()?
            .to_u64()
            .ok_or_else(|| Error::ConstraintError("invalid column count".to_owned()))?
            as usize;
        let type_raw = input.read_len(col_cnt)?;
        let mut col_types = Vec::with_capacity(col_cnt);
        for code in type_raw.as_ref() {
            col_types.push(
                ColumnType::try_from(*code)
                    .map_err(|e| Error::ConstraintError(e.to_string()))?,
            );
        }
        let meta_len = input
            .read_len_enc_int()?
            .to_u64()
            .ok_or_else(|| Error::ConstraintError("invalid metadata length".to_owned()))?
            as usize;
        let mut meta_raw = input.read_len(meta_len)?;
        let col_metas = parse_col_metas(&col_types, &mut meta_raw)
            .map_err(|e| Error::ConstraintError(e.to_string()))?;
        let null_bitmap = Vec::from(&input.read_len((col_cnt + 7) / 8)?[..]);
        Ok(TableMap {
            table_id,
            flags,
            schema_name: SmolStr::from(String::from_utf8_lossy(&schema_raw).as_ref()),
            table_name: SmolStr::from(String::from_utf8_lossy(&table_raw).as_ref()),
            col_types,
            col_metas,
            null_bitmap,
        })
    }
}

impl TableMap {
    pub fn has_unsupported_column(&self) -> bool {
        self.col_types.contains(&ColumnType::Geometry)
    }
}

/// build a table-map event payload, used to replay recorded streams
#[cfg(test)]
pub(crate) fn encode_table_map(
    table_id: u64,
    schema: &str,
    table: &str,
    col_types: &[u8],
    col_metas: &[u8],
    null_bitmap: &[u8],
) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&table_id.to_le_bytes()[..6]);
    payload.extend_from_slice(&1u16.to_le_bytes());
    payload.push(schema.len() as u8);
    payload.extend_from_slice(schema.as_bytes());
    payload.push(0);
    payload.push(table.len() as u8);
    payload.extend_from_slice(table.as_bytes());
    payload.push(0);
    payload.push(col_types.len() as u8);
    payload.extend_from_slice(col_types);
    payload.push(col_metas.len() as u8);
    payload.extend_from_slice(col_metas);
    payload.extend_from_slice(null_bitmap);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_table_map() {
        // t1(a INT, b VARCHAR(20) utf8)
        let payload = encode_table_map(
            13,
            "test",
            "t1",
            &[ColumnType::Long.code(), ColumnType::Varchar.code()],
            &[60, 0],
            &[0x02],
        );
        let ctx = ServerContext::new();
        let mut input = Bytes::from(payload);
        let tm = TableMap::read_with_ctx(&mut input, &ctx).unwrap();
        assert_eq!(13, tm.table_id);
        assert_eq!("test", tm.schema_name);
        assert_eq!("t1", tm.table_name);
        assert_eq!(
            vec![ColumnType::Long, ColumnType::Varchar],
            tm.col_types
        );
        assert_eq!(ColumnMeta::Varchar { max_len: 60 }, tm.col_metas[1]);
        assert_eq!(vec![0x02], tm.null_bitmap);
        assert!(!tm.has_unsupported_column());
    }

    #[test]
    fn test_four_byte_table_id_for_old_header() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&13u32.to_le_bytes());
        payload.extend_from_slice(&1u16.to_le_bytes());
        payload.push(1);
        payload.extend_from_slice(b"d");
        payload.push(0);
        payload.push(1);
        payload.extend_from_slice(b"t");
        payload.push(0);
        payload.push(1);
        payload.push(ColumnType::Long.code());
        payload.push(0);
        payload.push(0x01);
        let mut ctx = ServerContext::new();
        let mut lengths = vec![0u8; 19];
        lengths[18] = 6; // table map event declares a 6-byte post header
        ctx.post_header_lengths = lengths;
        let mut input = Bytes::from(payload);
        let tm = TableMap::read_with_ctx(&mut input, &ctx).unwrap();
        assert_eq!(13, tm.table_id);
        assert!(input.is_empty());
    }
}
