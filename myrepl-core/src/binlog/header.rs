use bytes::Bytes;
use wirebytes::{ReadBytesExt, ReadFromBytes, Result};

/// length of the common event header in binlog version 4
pub const EVENT_HEADER_LEN: u32 = 19;

/// the 19-byte header every event starts with
#[derive(Debug, Clone)]
pub struct EventHeader {
    pub timestamp: u32,
    pub type_code: u8,
    pub server_id: u32,
    pub event_size: u32,
    pub log_pos: u32,
    pub flags: u16,
}

impl ReadFromBytes for EventHeader {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let timestamp = input.read_le_u32()?;
        let type_code = input.read_u8()?;
        let server_id = input.read_le_u32()?;
        let event_size = input.read_le_u32()?;
        let log_pos = input.read_le_u32()?;
        let flags = input.read_le_u16()?;
        Ok(EventHeader {
            timestamp,
            type_code,
            server_id,
            event_size,
            log_pos,
            flags,
        })
    }
}

impl EventHeader {
    pub fn data_len(&self) -> u32 {
        self.event_size - EVENT_HEADER_LEN
    }
}
