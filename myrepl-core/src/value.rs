//! per-type column value decoding
//!
//! metadata byte widths and bit layouts verified against live 5.5.62
//! and 5.6.46 streams; the published protocol documentation disagrees
//! in several places (compact date, Bit metadata, CHAR max length).
use crate::col::{ColumnMeta, ColumnType};
use crate::decimal::MyDecimal;
use crate::error::{Error, Result};
use crate::time::{MyDateTime, MyDuration};
use bytes::Bytes;
use wirebytes::{ReadBytesExt, ReadMyEnc};

/// one decoded column, tagged with its wire type
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue {
    pub col_type: ColumnType,
    pub is_null: bool,
    pub data: ColumnData,
}

impl ColumnValue {
    pub fn null(col_type: ColumnType) -> Self {
        ColumnValue {
            col_type,
            is_null: true,
            data: ColumnData::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Null,
    Signed(i64),
    Unsigned(u64),
    Float(f32),
    Double(f64),
    Bytes(Bytes),
    /// normalized decimal string, sign prefix and zeros trimmed
    Decimal(String),
    DateTime(MyDateTime),
    Duration(MyDuration),
    /// indices of the set bits of a SET value
    SetIndices(Vec<u16>),
}

/// decode one non-null column value, leaving the cursor exactly past
/// its encoding
///
/// `unsigned` comes from the schema tracker (the wire does not carry
/// signedness); `server_5_6` selects the CHAR max-length formula.
pub fn read_value(
    input: &mut Bytes,
    col_type: ColumnType,
    meta: &ColumnMeta,
    unsigned: bool,
    server_5_6: bool,
) -> Result<ColumnData> {
    let data = match col_type {
        ColumnType::Tiny => {
            if unsigned {
                ColumnData::Unsigned(input.read_u8()? as u64)
            } else {
                ColumnData::Signed(input.read_i8()? as i64)
            }
        }
        ColumnType::Short => {
            if unsigned {
                ColumnData::Unsigned(input.read_le_u16()? as u64)
            } else {
                ColumnData::Signed(input.read_le_i16()? as i64)
            }
        }
        ColumnType::Int24 => {
            if unsigned {
                ColumnData::Unsigned(input.read_le_u24()? as u64)
            } else {
                ColumnData::Signed(input.read_le_i24()? as i64)
            }
        }
        ColumnType::Long => {
            if unsigned {
                ColumnData::Unsigned(input.read_le_u32()? as u64)
            } else {
                ColumnData::Signed(input.read_le_i32()? as i64)
            }
        }
        ColumnType::LongLong => {
            if unsigned {
                ColumnData::Unsigned(input.read_le_u64()?)
            } else {
                ColumnData::Signed(input.read_le_i64()?)
            }
        }
        ColumnType::Float => ColumnData::Float(input.read_le_f32()?),
        ColumnType::Double => ColumnData::Double(input.read_le_f64()?),
        ColumnType::Null => ColumnData::Null,
        ColumnType::Year => {
            let v = input.read_u8()?;
            // 0 means year zero; anything else is offset from 1900
            let year = if v == 0 { 0 } else { 1900 + v as i64 };
            ColumnData::Signed(year)
        }
        ColumnType::Timestamp => ColumnData::DateTime(MyDateTime::from_unix(input.read_le_u32()?)),
        // same epoch seconds as the legacy form, but big-endian
        ColumnType::Timestamp2 => {
            ColumnData::DateTime(MyDateTime::from_unix(input.read_be_u32()?))
        }
        ColumnType::Date | ColumnType::NewDate => ColumnData::DateTime(read_compact_date(input)?),
        ColumnType::Time => ColumnData::Duration(read_legacy_time(input)?),
        ColumnType::Time2 => ColumnData::Duration(read_time2(input)?),
        ColumnType::DateTime => ColumnData::DateTime(read_legacy_datetime(input)?),
        ColumnType::DateTime2 => ColumnData::DateTime(read_datetime2(input)?),
        ColumnType::Decimal => match input.read_len_enc_str()?.into_bytes() {
            Some(bs) => ColumnData::Bytes(bs),
            None => ColumnData::Null,
        },
        ColumnType::NewDecimal => {
            let (precision, scale) = match meta {
                ColumnMeta::Decimal { precision, scale } => (*precision, *scale),
                _ => {
                    return Err(Error::BinlogEventError(
                        "missing decimal metadata".to_owned(),
                    ))
                }
            };
            if scale > precision {
                return Err(Error::BinlogEventError(format!(
                    "decimal scale {} exceeds precision {}",
                    scale, precision
                )));
            }
            let d = MyDecimal::read_from(input, precision - scale, scale)?;
            ColumnData::Decimal(d.to_string())
        }
        ColumnType::Varchar => {
            let max_len = match meta {
                ColumnMeta::Varchar { max_len } => *max_len as u32,
                _ => {
                    return Err(Error::BinlogEventError(
                        "missing varchar metadata".to_owned(),
                    ))
                }
            };
            ColumnData::Bytes(read_bytes_with_max(input, max_len)?)
        }
        ColumnType::Bit => {
            let (bits, bytes) = match meta {
                ColumnMeta::Bit { bits, bytes } => (*bits, *bytes),
                _ => return Err(Error::BinlogEventError("missing bit metadata".to_owned())),
            };
            let len = bytes as usize + (bits as usize + 7) / 8;
            ColumnData::Bytes(input.read_len(len)?)
        }
        ColumnType::TinyBlob
        | ColumnType::MediumBlob
        | ColumnType::LongBlob
        | ColumnType::Blob => {
            let pack_len = match meta {
                ColumnMeta::Pack { len } => *len,
                _ => return Err(Error::BinlogEventError("missing blob metadata".to_owned())),
            };
            let len = match pack_len {
                1 => input.read_u8()? as usize,
                2 => input.read_le_u16()? as usize,
                3 => input.read_le_u24()? as usize,
                4 => input.read_le_u32()? as usize,
                n => {
                    return Err(Error::BinlogEventError(format!(
                        "invalid blob length-prefix width {}",
                        n
                    )))
                }
            };
            ColumnData::Bytes(input.read_len(len)?)
        }
        // under their own type codes the payload is a plain
        // length-prefixed byte sequence
        ColumnType::Enum | ColumnType::Set | ColumnType::VarString => {
            match input.read_len_enc_str()?.into_bytes() {
                Some(bs) => ColumnData::Bytes(bs),
                None => ColumnData::Null,
            }
        }
        ColumnType::String => read_string_family(input, meta, server_5_6)?,
        ColumnType::Geometry => {
            return Err(Error::BinlogEventError(
                "geometry columns are not supported".to_owned(),
            ))
        }
    };
    Ok(data)
}

/// the 0xFE type code covers CHAR, SET and ENUM; the first metadata
/// byte tells them apart
fn read_string_family(input: &mut Bytes, meta: &ColumnMeta, server_5_6: bool) -> Result<ColumnData> {
    let (meta0, meta1) = match meta {
        ColumnMeta::String { meta0, meta1 } => (*meta0, *meta1),
        _ => {
            return Err(Error::BinlogEventError(
                "missing string metadata".to_owned(),
            ))
        }
    };
    if meta0 == ColumnType::Set.code() {
        // meta1 bytes of bitset; emit the indices of set bits
        let buf = input.read_len(meta1 as usize)?;
        let mut indices = Vec::new();
        for (i, b) in buf.iter().enumerate() {
            for j in 0..8 {
                if b & (1 << j) != 0 {
                    indices.push((i * 8 + j) as u16);
                }
            }
        }
        return Ok(ColumnData::SetIndices(indices));
    }
    if meta0 == ColumnType::Enum.code() {
        // meta1 bytes of little-endian ordinal
        let idx = match meta1 {
            1 => input.read_u8()? as u64,
            2 => input.read_le_u16()? as u64,
            n => {
                return Err(Error::BinlogEventError(format!(
                    "invalid enum width {}",
                    n
                )))
            }
        };
        return Ok(ColumnData::Unsigned(idx));
    }
    // CHAR: reconstruct the max byte length, then the usual 1/2-byte
    // length prefix. the packing changed in 5.6.
    let max_len = if server_5_6 {
        (((!meta0 & 0x30) as u32) << 4) | meta1 as u32
    } else {
        ((((meta0 & 0x30) ^ 0x30) as u32) << 8) | meta1 as u32
    };
    Ok(ColumnData::Bytes(read_bytes_with_max(input, max_len)?))
}

/// length prefix width is decided by the column's declared maximum
fn read_bytes_with_max(input: &mut Bytes, max_bytes: u32) -> Result<Bytes> {
    let len = if max_bytes > 0xff_ffff {
        input.read_le_u32()? as usize
    } else if max_bytes > 0xffff {
        input.read_le_u24()? as usize
    } else if max_bytes > 0xff {
        input.read_le_u16()? as usize
    } else {
        input.read_u8()? as usize
    };
    input.read_len(len).map_err(Into::into)
}

/// 3 bytes packing year/month/day: MMMD DDDD  YYYY YYYM  NYYY YYYY
/// (low byte first); layout verified against calibrated samples
fn read_compact_date(input: &mut Bytes) -> Result<MyDateTime> {
    let buf = input.read_len(3)?;
    let year = (((buf[2] & 0x7f) as u16) << 8 | buf[1] as u16) >> 1;
    let month = ((buf[1] & 0x01) << 3) | (buf[0] >> 5);
    let day = buf[0] & 0x1f;
    if year == 0 && month == 0 && day == 0 {
        return Ok(MyDateTime::zero());
    }
    Ok(MyDateTime::date(year, month, day))
}

/// 8-byte integer whose decimal digits spell YYYYMMDDhhmmss
fn read_legacy_datetime(input: &mut Bytes) -> Result<MyDateTime> {
    let v = input.read_le_u64()?;
    Ok(MyDateTime::date_time(
        (v / 10_000_000_000 % 10_000) as u16,
        (v / 100_000_000 % 100) as u8,
        (v / 1_000_000 % 100) as u8,
        (v / 10_000 % 100) as u8,
        (v / 100 % 100) as u8,
        (v % 100) as u8,
    ))
}

/// 5 bytes big-endian: 1 sign bit, 17 bits year*13+month, 5 bits day,
/// 5 bits hour, 6 bits minute, 6 bits second
fn read_datetime2(input: &mut Bytes) -> Result<MyDateTime> {
    let buf = input.read_len(5)?;
    let second = buf[4] & 0x3f;
    let minute = (buf[4] >> 6) | ((buf[3] & 0x0f) << 2);
    let hour = ((buf[3] & 0xf0) >> 4) | ((buf[2] & 0x01) << 4);
    let day = (buf[2] & 0x3e) >> 1;
    let year_month = (((buf[0] & 0x3f) as u32) << 10) | ((buf[1] as u32) << 2)
        | (((buf[2] & 0xc0) >> 6) as u32);
    let year = (year_month / 13) as u16;
    let month = (year_month % 13) as u8;
    if year == 0 && month == 0 && day == 0 && hour == 0 && minute == 0 && second == 0 {
        return Ok(MyDateTime::zero());
    }
    Ok(MyDateTime::date_time(year, month, day, hour, minute, second))
}

/// 3 bytes of packed decimal Hhhmmss, hours up to +-838
fn read_legacy_time(input: &mut Bytes) -> Result<MyDuration> {
    let v = input.read_le_i24()?;
    let negative = v < 0;
    let a = v.unsigned_abs();
    Ok(MyDuration::new(
        negative,
        a / 10_000,
        (a / 100 % 100) as u8,
        (a % 100) as u8,
    ))
}

/// 3 bytes, hour<<12 | minute<<6 | second; a set top bit marks a
/// non-negative value stored directly, negatives are two's-complement
fn read_time2(input: &mut Bytes) -> Result<MyDuration> {
    let buf = input.read_len(3)?;
    let (negative, v) = if buf[0] & 0x80 != 0 {
        let v = (((buf[0] & 0x7f) as u32) << 16) | ((buf[1] as u32) << 8) | buf[2] as u32;
        (false, v as i32)
    } else {
        let raw = 0xff00_0000u32
            | (((buf[0] | 0x80) as u32) << 16)
            | ((buf[1] as u32) << 8)
            | buf[2] as u32;
        (true, -(raw as i32))
    };
    Ok(MyDuration::new(
        negative,
        (v >> 12) as u32,
        ((v & 0xfc0) >> 6) as u8,
        (v & 0x3f) as u8,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TemporalFormat;
    use bytes::Buf;

    fn value(
        bytes: &'static [u8],
        col_type: ColumnType,
        meta: ColumnMeta,
        unsigned: bool,
        server_5_6: bool,
    ) -> ColumnData {
        let mut input = Bytes::from_static(bytes);
        let v = read_value(&mut input, col_type, &meta, unsigned, server_5_6).unwrap();
        assert!(!input.has_remaining(), "decoder left residue");
        v
    }

    #[test]
    fn test_integers_signedness() {
        assert_eq!(
            ColumnData::Signed(-1),
            value(&[0xff], ColumnType::Tiny, ColumnMeta::None, false, false)
        );
        assert_eq!(
            ColumnData::Unsigned(255),
            value(&[0xff], ColumnType::Tiny, ColumnMeta::None, true, false)
        );
        assert_eq!(
            ColumnData::Signed(-2),
            value(
                &[0xfe, 0xff, 0xff, 0xff],
                ColumnType::Long,
                ColumnMeta::None,
                false,
                false
            )
        );
        assert_eq!(
            ColumnData::Signed(-1),
            value(
                &[0xff, 0xff, 0xff],
                ColumnType::Int24,
                ColumnMeta::None,
                false,
                false
            )
        );
        assert_eq!(
            ColumnData::Unsigned(0xff_ffff),
            value(
                &[0xff, 0xff, 0xff],
                ColumnType::Int24,
                ColumnMeta::None,
                true,
                false
            )
        );
    }

    #[test]
    fn test_legacy_datetime_digits() {
        // 0x5AF105D18777 == 99991231235959
        let v = value(
            &[0x77, 0x87, 0xd1, 0x05, 0xf1, 0x5a, 0x00, 0x00],
            ColumnType::DateTime,
            ColumnMeta::None,
            false,
            false,
        );
        match v {
            ColumnData::DateTime(dt) => assert_eq!("9999-12-31 23:59:59", dt.to_string()),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_datetime2_bit_layout() {
        let v = value(
            &[0x8c, 0xb3, 0x82, 0xc7, 0xed],
            ColumnType::DateTime2,
            ColumnMeta::Fsp { fsp: 0 },
            false,
            true,
        );
        match v {
            ColumnData::DateTime(dt) => assert_eq!("1000-06-01 12:31:45", dt.to_string()),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_timestamp2_big_endian_utc() {
        let v = value(
            &[0x01, 0xe0, 0xc3, 0x00],
            ColumnType::Timestamp2,
            ColumnMeta::None,
            false,
            true,
        );
        // epoch 31507200 normalized in UTC
        match v {
            ColumnData::DateTime(dt) => assert_eq!("1970-12-31 16:00:00", dt.to_string()),
            other => panic!("unexpected value {:?}", other),
        }
        // zero keeps the literal zero format
        let v = value(
            &[0, 0, 0, 0],
            ColumnType::Timestamp2,
            ColumnMeta::None,
            false,
            true,
        );
        match v {
            ColumnData::DateTime(dt) => assert_eq!(TemporalFormat::Zero, dt.format),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_compact_date_samples() {
        let samples: &[(&[u8], &str)] = &[
            (&[0x9f, 0x1f, 0x4e], "9999-12-31"),
            (&[0x47, 0xc8, 0x0f], "2020-02-07"),
            (&[0x66, 0xc8, 0x0f], "2020-03-06"),
            (&[0x86, 0xcb, 0x0f], "2021-12-06"),
        ];
        for (bytes, expected) in samples {
            let mut input = Bytes::copy_from_slice(bytes);
            let dt = read_compact_date(&mut input).unwrap();
            assert_eq!(*expected, dt.to_string());
        }
        let mut input = Bytes::from_static(&[0, 0, 0]);
        assert_eq!(
            TemporalFormat::Zero,
            read_compact_date(&mut input).unwrap().format
        );
    }

    #[test]
    fn test_time2_vectors() {
        let v = value(
            &[0xb4, 0x6e, 0xfb],
            ColumnType::Time2,
            ColumnMeta::Fsp { fsp: 0 },
            false,
            true,
        );
        assert_eq!(ColumnData::Duration(MyDuration::new(false, 838, 59, 59)), v);
        let v = value(
            &[0x4b, 0x91, 0x05],
            ColumnType::Time2,
            ColumnMeta::Fsp { fsp: 0 },
            false,
            true,
        );
        assert_eq!(ColumnData::Duration(MyDuration::new(true, 838, 59, 59)), v);
        let v = value(
            &[0x80, 0x10, 0x00],
            ColumnType::Time2,
            ColumnMeta::Fsp { fsp: 0 },
            false,
            true,
        );
        assert_eq!(ColumnData::Duration(MyDuration::new(false, 1, 0, 0)), v);
    }

    #[test]
    fn test_legacy_time_packed_decimal() {
        // 8385959 => 838:59:59
        let mut out = Vec::from(&8385959i32.to_le_bytes()[..3]);
        let mut input = Bytes::from(out.clone());
        assert_eq!(
            MyDuration::new(false, 838, 59, 59),
            read_legacy_time(&mut input).unwrap()
        );
        out = Vec::from(&(-8385959i32).to_le_bytes()[..3]);
        let mut input = Bytes::from(out);
        assert_eq!(
            MyDuration::new(true, 838, 59, 59),
            read_legacy_time(&mut input).unwrap()
        );
    }

    #[test]
    fn test_year() {
        assert_eq!(
            ColumnData::Signed(0),
            value(&[0], ColumnType::Year, ColumnMeta::None, false, false)
        );
        assert_eq!(
            ColumnData::Signed(2020),
            value(&[120], ColumnType::Year, ColumnMeta::None, false, false)
        );
    }

    #[test]
    fn test_varchar_prefix_width() {
        let v = value(
            &[5, b'h', b'e', b'l', b'l', b'o'],
            ColumnType::Varchar,
            ColumnMeta::Varchar { max_len: 60 },
            false,
            false,
        );
        assert_eq!(ColumnData::Bytes(Bytes::from_static(b"hello")), v);
        // a max above 255 switches to a two-byte prefix
        let v = value(
            &[5, 0, b'h', b'e', b'l', b'l', b'o'],
            ColumnType::Varchar,
            ColumnMeta::Varchar { max_len: 300 },
            false,
            false,
        );
        assert_eq!(ColumnData::Bytes(Bytes::from_static(b"hello")), v);
    }

    #[test]
    fn test_blob_prefix_from_metadata() {
        let v = value(
            &[3, 0, b'a', b'b', b'c'],
            ColumnType::Blob,
            ColumnMeta::Pack { len: 2 },
            false,
            false,
        );
        assert_eq!(ColumnData::Bytes(Bytes::from_static(b"abc")), v);
    }

    #[test]
    fn test_bit_length() {
        // bit(50): 6 whole bytes plus one byte for the 2 spare bits
        let v = value(
            &[1, 2, 3, 4, 5, 6, 7],
            ColumnType::Bit,
            ColumnMeta::Bit { bits: 2, bytes: 6 },
            false,
            false,
        );
        assert_eq!(
            ColumnData::Bytes(Bytes::from_static(&[1, 2, 3, 4, 5, 6, 7])),
            v
        );
    }

    #[test]
    fn test_string_family_set() {
        // SET under the string code: meta0 is the set type code
        let v = value(
            &[0b0000_0101],
            ColumnType::String,
            ColumnMeta::String {
                meta0: 0xf8,
                meta1: 1,
            },
            false,
            false,
        );
        assert_eq!(ColumnData::SetIndices(vec![0, 2]), v);
    }

    #[test]
    fn test_string_family_enum() {
        let v = value(
            &[2],
            ColumnType::String,
            ColumnMeta::String {
                meta0: 0xf7,
                meta1: 1,
            },
            false,
            false,
        );
        assert_eq!(ColumnData::Unsigned(2), v);
    }

    #[test]
    fn test_string_family_char_5_6() {
        // utf8 CHAR(170): 510 max bytes encoded as meta EE FE
        let mut input = Bytes::from(
            [&[5u8, 0][..], b"hello"].concat(),
        );
        let v = read_value(
            &mut input,
            ColumnType::String,
            &ColumnMeta::String {
                meta0: 0xee,
                meta1: 0xfe,
            },
            false,
            true,
        )
        .unwrap();
        assert_eq!(ColumnData::Bytes(Bytes::from_static(b"hello")), v);
        assert!(!input.has_remaining());
    }

    #[test]
    fn test_string_family_char_5_5() {
        // plain CHAR on 5.5: meta0 is the string type code itself
        let v = value(
            &[2, b'o', b'k'],
            ColumnType::String,
            ColumnMeta::String {
                meta0: 0xfe,
                meta1: 60,
            },
            false,
            false,
        );
        assert_eq!(ColumnData::Bytes(Bytes::from_static(b"ok")), v);
    }

    #[test]
    fn test_new_decimal_through_value_path() {
        let v = value(
            &[0x81, 0x0d, 0xfb, 0x38, 0xd2, 0x04, 0xd2],
            ColumnType::NewDecimal,
            ColumnMeta::Decimal {
                precision: 14,
                scale: 4,
            },
            false,
            false,
        );
        assert_eq!(ColumnData::Decimal("1234567890.1234".to_owned()), v);
    }

    #[test]
    fn test_geometry_aborts() {
        let mut input = Bytes::from_static(&[0]);
        assert!(read_value(
            &mut input,
            ColumnType::Geometry,
            &ColumnMeta::Pack { len: 1 },
            false,
            false
        )
        .is_err());
    }
}
