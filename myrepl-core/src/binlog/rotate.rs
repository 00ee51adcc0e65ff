use bytes::{Buf, Bytes};
use wirebytes::{ReadBytesExt, ReadFromBytes, Result};

/// written as the last event of a log file, pointing at the next one;
/// also sent as the first (artificial) event of a dump
#[derive(Debug, Clone)]
pub struct RotateData {
    pub position: u64,
    pub next_file: Bytes,
}

impl ReadFromBytes for RotateData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let position = input.read_le_u64()?;
        let next_file = input.split_to(input.remaining());
        Ok(RotateData {
            position,
            next_file,
        })
    }
}

impl RotateData {
    pub fn next_file_str(&self) -> String {
        String::from_utf8_lossy(&self.next_file).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rotate() {
        let mut payload = Vec::from(&4u64.to_le_bytes()[..]);
        payload.extend_from_slice(b"mysql-bin.000002");
        let mut input = Bytes::from(payload);
        let rotate = RotateData::read_from(&mut input).unwrap();
        assert_eq!(4, rotate.position);
        assert_eq!("mysql-bin.000002", rotate.next_file_str());
    }
}
