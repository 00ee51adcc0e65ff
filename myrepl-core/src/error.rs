use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid column type code: {0}")]
    InvalidColumnTypeCode(u8),
    #[error("binlog event error: {0}")]
    BinlogEventError(String),
    #[error("binlog checksum mismatch: expected={0}, actual={1}")]
    BinlogChecksumMismatch(u32, u32),
    #[error("ddl parse error: {0}")]
    DdlParseError(String),
    #[error("parse error: {0}")]
    ParseError(#[from] wirebytes::Error),
}
