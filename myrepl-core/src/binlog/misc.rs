//! small event payloads without structure worth a module of their own
use bytes::{Buf, Bytes};
use wirebytes::{ReadBytesExt, ReadFromBytes, Result};

/// INSERT_ID / LAST_INSERT_ID carried ahead of the statement
#[derive(Debug, Clone)]
pub struct IntvarData {
    pub key: u8,
    pub value: u64,
}

impl ReadFromBytes for IntvarData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let key = input.read_u8()?;
        let value = input.read_le_u64()?;
        Ok(IntvarData { key, value })
    }
}

#[derive(Debug, Clone)]
pub struct RandData {
    pub seed1: u64,
    pub seed2: u64,
}

impl ReadFromBytes for RandData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let seed1 = input.read_le_u64()?;
        let seed2 = input.read_le_u64()?;
        Ok(RandData { seed1, seed2 })
    }
}

#[derive(Debug, Clone)]
pub struct UserVarData {
    pub name: Bytes,
    pub is_null: bool,
    pub value_type: u8,
    pub charset: u32,
    pub value: Bytes,
    pub flags: u8,
}

impl ReadFromBytes for UserVarData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let name_len = input.read_le_u32()?;
        let name = input.read_len(name_len as usize)?;
        let is_null = input.read_u8()? != 0;
        if is_null {
            return Ok(UserVarData {
                name,
                is_null,
                value_type: 0,
                charset: 0,
                value: Bytes::new(),
                flags: 0,
            });
        }
        let value_type = input.read_u8()?;
        let charset = input.read_le_u32()?;
        let value_len = input.read_le_u32()?;
        let value = input.read_len(value_len as usize)?;
        // flags byte appears only on newer servers
        let flags = if input.has_remaining() {
            input.read_u8()?
        } else {
            0
        };
        Ok(UserVarData {
            name,
            is_null,
            value_type,
            charset,
            value,
            flags,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IncidentData {
    pub incident_type: u16,
    pub message: Bytes,
}

impl ReadFromBytes for IncidentData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let incident_type = input.read_le_u16()?;
        let message_len = input.read_u8()?;
        let message = input.read_len(message_len as usize)?;
        Ok(IncidentData {
            incident_type,
            message,
        })
    }
}

/// statement text attached ahead of its row events when
/// binlog_rows_query_log_events is on
#[derive(Debug, Clone)]
pub struct RowsQueryData {
    pub length: u8,
    pub query: Bytes,
}

impl ReadFromBytes for RowsQueryData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let length = input.read_u8()?;
        let query = input.split_to(input.remaining());
        Ok(RowsQueryData { length, query })
    }
}
