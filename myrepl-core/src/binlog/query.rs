use bytes::{Buf, Bytes};
use smol_str::SmolStr;
use wirebytes::{Error, ReadBytesExt, ReadFromBytes, Result};

// status variable keys
pub const Q_FLAGS2_CODE: u8 = 0x00;
pub const Q_SQL_MODE_CODE: u8 = 0x01;
pub const Q_CATALOG: u8 = 0x02;
pub const Q_AUTO_INCREMENT: u8 = 0x03;
pub const Q_CHARSET_CODE: u8 = 0x04;
pub const Q_TIME_ZONE_CODE: u8 = 0x05;
pub const Q_CATALOG_NZ_CODE: u8 = 0x06;
pub const Q_LC_TIME_NAMES_CODE: u8 = 0x07;
pub const Q_CHARSET_DATABASE_CODE: u8 = 0x08;
pub const Q_TABLE_MAP_FOR_UPDATE_CODE: u8 = 0x09;
pub const Q_MASTER_DATA_WRITTEN_CODE: u8 = 0x0a;
pub const Q_INVOKERS: u8 = 0x0b;
pub const Q_UPDATED_DB_NAMES: u8 = 0x0c;
pub const Q_MICROSECONDS: u8 = 0x0d;

/// one entry of the query event's status variable block
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatusVar {
    Flags2(u32),
    SqlMode(u64),
    /// old form with a trailing NUL
    Catalog(Bytes),
    AutoIncrement { increment: u16, offset: u16 },
    Charset { client: u16, connection: u16, server: u16 },
    TimeZone(Bytes),
    CatalogNz(Bytes),
    LcTimeNames(u16),
    CharsetDatabase(u16),
    TableMapForUpdate(u64),
    MasterDataWritten(u32),
    Invoker { username: Bytes, hostname: Bytes },
    UpdatedDbNames(Vec<Bytes>),
    Microseconds(u32),
}

/// statement executed on the master
#[derive(Debug, Clone)]
pub struct QueryData {
    pub slave_proxy_id: u32,
    pub execution_time: u32,
    pub error_code: u16,
    pub status_vars: Vec<QueryStatusVar>,
    pub schema: SmolStr,
    pub query: Bytes,
}

impl QueryData {
    pub fn query_str(&self) -> String {
        String::from_utf8_lossy(&self.query).into_owned()
    }
}

impl ReadFromBytes for QueryData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let slave_proxy_id = input.read_le_u32()?;
        let execution_time = input.read_le_u32()?;
        let schema_len = input.read_u8()?;
        let error_code = input.read_le_u16()?;
        let status_vars_len = input.read_le_u16()?;
        let mut block = input.read_len(status_vars_len as usize)?;
        let status_vars = read_status_vars(&mut block)?;
        let schema_raw = input.read_len(schema_len as usize)?;
        let schema = SmolStr::from(String::from_utf8_lossy(&schema_raw).as_ref());
        // NUL between schema and statement
        input.read_u8()?;
        let query = input.split_to(input.remaining());
        Ok(QueryData {
            slave_proxy_id,
            execution_time,
            error_code,
            status_vars,
            schema,
            query,
        })
    }
}

fn read_status_vars(block: &mut Bytes) -> Result<Vec<QueryStatusVar>> {
    let mut vars = Vec::new();
    while block.has_remaining() {
        let key = block.read_u8()?;
        let var = match key {
            Q_FLAGS2_CODE => QueryStatusVar::Flags2(block.read_le_u32()?),
            Q_SQL_MODE_CODE => QueryStatusVar::SqlMode(block.read_le_u64()?),
            Q_CATALOG => {
                let n = block.read_u8()?;
                let catalog = block.read_len(n as usize)?;
                let nul = block.read_u8()?;
                if nul != 0 {
                    return Err(Error::ConstraintError(
                        "catalog status variable missing terminator".to_owned(),
                    ));
                }
                QueryStatusVar::Catalog(catalog)
            }
            Q_AUTO_INCREMENT => QueryStatusVar::AutoIncrement {
                increment: block.read_le_u16()?,
                offset: block.read_le_u16()?,
            },
            Q_CHARSET_CODE => QueryStatusVar::Charset {
                client: block.read_le_u16()?,
                connection: block.read_le_u16()?,
                server: block.read_le_u16()?,
            },
            Q_TIME_ZONE_CODE => {
                let n = block.read_u8()?;
                QueryStatusVar::TimeZone(block.read_len(n as usize)?)
            }
            Q_CATALOG_NZ_CODE => {
                let n = block.read_u8()?;
                QueryStatusVar::CatalogNz(block.read_len(n as usize)?)
            }
            Q_LC_TIME_NAMES_CODE => QueryStatusVar::LcTimeNames(block.read_le_u16()?),
            Q_CHARSET_DATABASE_CODE => QueryStatusVar::CharsetDatabase(block.read_le_u16()?),
            Q_TABLE_MAP_FOR_UPDATE_CODE => {
                QueryStatusVar::TableMapForUpdate(block.read_le_u64()?)
            }
            Q_MASTER_DATA_WRITTEN_CODE => QueryStatusVar::MasterDataWritten(block.read_le_u32()?),
            Q_INVOKERS => {
                let n = block.read_u8()?;
                let username = block.read_len(n as usize)?;
                let n = block.read_u8()?;
                let hostname = block.read_len(n as usize)?;
                QueryStatusVar::Invoker { username, hostname }
            }
            Q_UPDATED_DB_NAMES => {
                let count = block.read_u8()?;
                let mut names = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    names.push(block.read_until(0, false)?);
                }
                QueryStatusVar::UpdatedDbNames(names)
            }
            Q_MICROSECONDS => QueryStatusVar::Microseconds(block.read_le_u24()?),
            other => {
                // a newer server sent a key this client does not know;
                // the length of its payload is unknowable, so the rest
                // of the block is dropped
                log::warn!("unknown query status variable key {:#04x}, skipping block", other);
                block.advance(block.remaining());
                break;
            }
        };
        vars.push(var);
    }
    Ok(vars)
}
