use bytes::{Buf, Bytes};
use wirebytes::{ReadBytesExt, ReadFromBytes, Result};

/// format description, always the first event of every binary log
///
/// the trailing per-event-type header length table is authoritative
/// for the server that wrote the log; later events must be decoded
/// against it (table-id width in particular).
#[derive(Debug, Clone)]
pub struct FormatDescriptionData {
    pub binlog_version: u16,
    /// 50-byte field, NUL padded
    pub server_version: String,
    pub create_timestamp: u32,
    pub event_header_length: u8,
    /// indexed by event type code - 1; shorter on servers that predate
    /// the newest event kinds
    pub event_type_header_lengths: Vec<u8>,
}

impl ReadFromBytes for FormatDescriptionData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let binlog_version = input.read_le_u16()?;
        let version_raw = input.read_len(50)?;
        let server_version = String::from_utf8_lossy(&version_raw)
            .trim_end_matches('\0')
            .to_owned();
        let create_timestamp = input.read_le_u32()?;
        let event_header_length = input.read_u8()?;
        let event_type_header_lengths = Vec::from(&input.split_to(input.remaining())[..]);
        Ok(FormatDescriptionData {
            binlog_version,
            server_version,
            create_timestamp,
            event_header_length,
            event_type_header_lengths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fde() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&4u16.to_le_bytes());
        let mut ver = [0u8; 50];
        ver[..10].copy_from_slice(b"5.5.62-log");
        payload.extend_from_slice(&ver);
        payload.extend_from_slice(&0u32.to_le_bytes());
        payload.push(19);
        // header lengths for the first five event kinds
        payload.extend_from_slice(&[56, 13, 0, 8, 0]);
        let mut input = Bytes::from(payload);
        let fde = FormatDescriptionData::read_from(&mut input).unwrap();
        assert_eq!(4, fde.binlog_version);
        assert_eq!("5.5.62-log", fde.server_version);
        assert_eq!(19, fde.event_header_length);
        assert_eq!(vec![56, 13, 0, 8, 0], fde.event_type_header_lengths);
    }
}
