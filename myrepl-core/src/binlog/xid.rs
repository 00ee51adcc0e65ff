use bytes::Bytes;
use wirebytes::{ReadBytesExt, ReadFromBytes, Result};

/// written wherever a COMMIT is expected
#[derive(Debug, Clone)]
pub struct XidData {
    pub xid: u64,
}

impl ReadFromBytes for XidData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let xid = input.read_le_u64()?;
        Ok(XidData { xid })
    }
}
