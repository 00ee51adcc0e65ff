//! column type vocabulary and table-map metadata
use crate::error::{Error, Result};
use bytes::Bytes;
use std::convert::TryFrom;
use wirebytes::ReadBytesExt;

/// column type codes as they appear in table-map events
///
/// reference: https://dev.mysql.com/doc/internals/en/table-map-event.html
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Decimal,
    Tiny,
    Short,
    Long,
    Float,
    Double,
    Null,
    Timestamp,
    LongLong,
    Int24,
    Date,
    Time,
    DateTime,
    Year,
    NewDate,
    Varchar,
    Bit,
    Timestamp2,
    DateTime2,
    Time2,
    NewDecimal,
    Enum,
    Set,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Blob,
    VarString,
    String,
    Geometry,
}

impl TryFrom<u8> for ColumnType {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        let ct = match code {
            0x00 => ColumnType::Decimal,
            0x01 => ColumnType::Tiny,
            0x02 => ColumnType::Short,
            0x03 => ColumnType::Long,
            0x04 => ColumnType::Float,
            0x05 => ColumnType::Double,
            0x06 => ColumnType::Null,
            0x07 => ColumnType::Timestamp,
            0x08 => ColumnType::LongLong,
            0x09 => ColumnType::Int24,
            0x0a => ColumnType::Date,
            0x0b => ColumnType::Time,
            0x0c => ColumnType::DateTime,
            0x0d => ColumnType::Year,
            0x0e => ColumnType::NewDate,
            0x0f => ColumnType::Varchar,
            0x10 => ColumnType::Bit,
            0x11 => ColumnType::Timestamp2,
            0x12 => ColumnType::DateTime2,
            0x13 => ColumnType::Time2,
            0xf6 => ColumnType::NewDecimal,
            0xf7 => ColumnType::Enum,
            0xf8 => ColumnType::Set,
            0xf9 => ColumnType::TinyBlob,
            0xfa => ColumnType::MediumBlob,
            0xfb => ColumnType::LongBlob,
            0xfc => ColumnType::Blob,
            0xfd => ColumnType::VarString,
            0xfe => ColumnType::String,
            0xff => ColumnType::Geometry,
            _ => return Err(Error::InvalidColumnTypeCode(code)),
        };
        Ok(ct)
    }
}

impl ColumnType {
    pub fn code(self) -> u8 {
        match self {
            ColumnType::Decimal => 0x00,
            ColumnType::Tiny => 0x01,
            ColumnType::Short => 0x02,
            ColumnType::Long => 0x03,
            ColumnType::Float => 0x04,
            ColumnType::Double => 0x05,
            ColumnType::Null => 0x06,
            ColumnType::Timestamp => 0x07,
            ColumnType::LongLong => 0x08,
            ColumnType::Int24 => 0x09,
            ColumnType::Date => 0x0a,
            ColumnType::Time => 0x0b,
            ColumnType::DateTime => 0x0c,
            ColumnType::Year => 0x0d,
            ColumnType::NewDate => 0x0e,
            ColumnType::Varchar => 0x0f,
            ColumnType::Bit => 0x10,
            ColumnType::Timestamp2 => 0x11,
            ColumnType::DateTime2 => 0x12,
            ColumnType::Time2 => 0x13,
            ColumnType::NewDecimal => 0xf6,
            ColumnType::Enum => 0xf7,
            ColumnType::Set => 0xf8,
            ColumnType::TinyBlob => 0xf9,
            ColumnType::MediumBlob => 0xfa,
            ColumnType::LongBlob => 0xfb,
            ColumnType::Blob => 0xfc,
            ColumnType::VarString => 0xfd,
            ColumnType::String => 0xfe,
            ColumnType::Geometry => 0xff,
        }
    }

}

/// decoded per-column metadata
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnMeta {
    None,
    /// float/double/blob family/geometry: length-prefix width or pack length
    Pack { len: u8 },
    Varchar { max_len: u16 },
    Bit { bits: u8, bytes: u8 },
    Decimal { precision: u8, scale: u8 },
    /// fractional-second precision, carried but not interpreted
    Fsp { fsp: u8 },
    /// raw pair for string-family kinds whose first byte doubles as a
    /// real-type discriminator
    String { meta0: u8, meta1: u8 },
}

/// consume the packed metadata block of a table map
pub fn parse_col_metas(col_types: &[ColumnType], meta: &mut Bytes) -> Result<Vec<ColumnMeta>> {
    let mut out = Vec::with_capacity(col_types.len());
    for &ct in col_types {
        let m = match ct {
            ColumnType::Float | ColumnType::Double | ColumnType::Geometry => ColumnMeta::Pack {
                len: meta.read_u8()?,
            },
            ColumnType::TinyBlob
            | ColumnType::MediumBlob
            | ColumnType::LongBlob
            | ColumnType::Blob => ColumnMeta::Pack {
                len: meta.read_u8()?,
            },
            ColumnType::Varchar => ColumnMeta::Varchar {
                max_len: meta.read_le_u16()?,
            },
            ColumnType::Bit => {
                let bits = meta.read_u8()?;
                let bytes = meta.read_u8()?;
                ColumnMeta::Bit { bits, bytes }
            }
            ColumnType::Decimal | ColumnType::NewDecimal => {
                let precision = meta.read_u8()?;
                let scale = meta.read_u8()?;
                ColumnMeta::Decimal { precision, scale }
            }
            ColumnType::DateTime2 | ColumnType::Time2 => ColumnMeta::Fsp {
                fsp: meta.read_u8()?,
            },
            ColumnType::String | ColumnType::VarString | ColumnType::Enum | ColumnType::Set => {
                let meta0 = meta.read_u8()?;
                let meta1 = meta.read_u8()?;
                ColumnMeta::String { meta0, meta1 }
            }
            _ => ColumnMeta::None,
        };
        out.push(m);
    }
    Ok(out)
}
