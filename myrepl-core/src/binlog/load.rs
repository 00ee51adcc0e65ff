//! LOAD DATA INFILE event family
//!
//! these kinds still appear in streams replayed from old masters, so
//! they are decoded structurally even though this client only passes
//! them through.
use bytes::{Buf, Bytes};
use wirebytes::{ReadBytesExt, ReadFromBytes, Result};

#[derive(Debug, Clone)]
pub struct LoadData {
    pub slave_proxy_id: u32,
    pub execution_time: u32,
    pub skip_lines: u32,
    pub num_fields: u32,
    pub field_term: u8,
    pub enclosed_by: u8,
    pub line_term: u8,
    pub line_start: u8,
    pub escaped_by: u8,
    pub opt_flags: u8,
    pub empty_flags: u8,
    pub field_names: Vec<Bytes>,
    pub table_name: Bytes,
    pub schema_name: Bytes,
    pub file_name: Bytes,
}

impl ReadFromBytes for LoadData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let slave_proxy_id = input.read_le_u32()?;
        let execution_time = input.read_le_u32()?;
        let skip_lines = input.read_le_u32()?;
        let _table_name_len = input.read_u8()?;
        let _schema_len = input.read_u8()?;
        let num_fields = input.read_le_u32()?;
        let field_term = input.read_u8()?;
        let enclosed_by = input.read_u8()?;
        let line_term = input.read_u8()?;
        let line_start = input.read_u8()?;
        let escaped_by = input.read_u8()?;
        let opt_flags = input.read_u8()?;
        let empty_flags = input.read_u8()?;
        let _field_name_lengths = input.read_len(num_fields as usize)?;
        let mut field_names = Vec::with_capacity(num_fields as usize);
        for _ in 0..num_fields {
            field_names.push(input.read_until(0, false)?);
        }
        let table_name = input.read_until(0, false)?;
        let schema_name = input.read_until(0, false)?;
        let file_name = input.split_to(input.remaining());
        Ok(LoadData {
            slave_proxy_id,
            execution_time,
            skip_lines,
            num_fields,
            field_term,
            enclosed_by,
            line_term,
            line_start,
            escaped_by,
            opt_flags,
            empty_flags,
            field_names,
            table_name,
            schema_name,
            file_name,
        })
    }
}

/// the 5.0 replacement with length-prefixed terminators
#[derive(Debug, Clone)]
pub struct NewLoadData {
    pub slave_proxy_id: u32,
    pub execution_time: u32,
    pub skip_lines: u32,
    pub num_fields: u32,
    pub field_term: Bytes,
    pub enclosed_by: Bytes,
    pub line_term: Bytes,
    pub line_start: Bytes,
    pub escaped_by: Bytes,
    pub opt_flags: u8,
    pub field_names: Vec<Bytes>,
    pub table_name: Bytes,
    pub schema_name: Bytes,
    pub file_name: Bytes,
}

impl ReadFromBytes for NewLoadData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let slave_proxy_id = input.read_le_u32()?;
        let execution_time = input.read_le_u32()?;
        let skip_lines = input.read_le_u32()?;
        let _table_name_len = input.read_u8()?;
        let _schema_len = input.read_u8()?;
        let num_fields = input.read_le_u32()?;
        let field_term = read_len_prefixed(input)?;
        let enclosed_by = read_len_prefixed(input)?;
        let line_term = read_len_prefixed(input)?;
        let line_start = read_len_prefixed(input)?;
        let escaped_by = read_len_prefixed(input)?;
        let opt_flags = input.read_u8()?;
        let _field_name_lengths = input.read_len(num_fields as usize)?;
        let mut field_names = Vec::with_capacity(num_fields as usize);
        for _ in 0..num_fields {
            field_names.push(input.read_until(0, false)?);
        }
        let table_name = input.read_until(0, false)?;
        let schema_name = input.read_until(0, false)?;
        let file_name = input.split_to(input.remaining());
        Ok(NewLoadData {
            slave_proxy_id,
            execution_time,
            skip_lines,
            num_fields,
            field_term,
            enclosed_by,
            line_term,
            line_start,
            escaped_by,
            opt_flags,
            field_names,
            table_name,
            schema_name,
            file_name,
        })
    }
}

fn read_len_prefixed(input: &mut Bytes) -> Result<Bytes> {
    let len = input.read_u8()?;
    input.read_len(len as usize)
}

#[derive(Debug, Clone)]
pub struct CreateFileData {
    pub file_id: u32,
    pub block_data: Bytes,
}

impl ReadFromBytes for CreateFileData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let file_id = input.read_le_u32()?;
        let block_data = input.split_to(input.remaining());
        Ok(CreateFileData {
            file_id,
            block_data,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppendBlockData {
    pub file_id: u32,
    pub block_data: Bytes,
}

impl ReadFromBytes for AppendBlockData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let file_id = input.read_le_u32()?;
        let block_data = input.split_to(input.remaining());
        Ok(AppendBlockData {
            file_id,
            block_data,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExecLoadData {
    pub file_id: u32,
}

impl ReadFromBytes for ExecLoadData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        Ok(ExecLoadData {
            file_id: input.read_le_u32()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DeleteFileData {
    pub file_id: u32,
}

impl ReadFromBytes for DeleteFileData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        Ok(DeleteFileData {
            file_id: input.read_le_u32()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BeginLoadQueryData {
    pub file_id: u32,
    pub block_data: Bytes,
}

impl ReadFromBytes for BeginLoadQueryData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let file_id = input.read_le_u32()?;
        let block_data = input.split_to(input.remaining());
        Ok(BeginLoadQueryData {
            file_id,
            block_data,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExecuteLoadQueryData {
    pub slave_proxy_id: u32,
    pub execution_time: u32,
    pub schema_len: u8,
    pub error_code: u16,
    pub status_vars_len: u16,
    pub file_id: u32,
    pub start_pos: u32,
    pub end_pos: u32,
    pub dup_handling_flags: u8,
}

impl ReadFromBytes for ExecuteLoadQueryData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        Ok(ExecuteLoadQueryData {
            slave_proxy_id: input.read_le_u32()?,
            execution_time: input.read_le_u32()?,
            schema_len: input.read_u8()?,
            error_code: input.read_le_u16()?,
            status_vars_len: input.read_le_u16()?,
            file_id: input.read_le_u32()?,
            start_pos: input.read_le_u32()?,
            end_pos: input.read_le_u32()?,
            dup_handling_flags: input.read_u8()?,
        })
    }
}
