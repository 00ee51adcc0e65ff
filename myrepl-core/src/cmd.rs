use crate::Command;
use bytes::BytesMut;
use wirebytes::{Result, WriteBytesExt, WriteToBytes};

/// COM_QUERY: plain statement text
#[derive(Debug, Clone)]
pub struct ComQuery {
    pub cmd: Command,
    pub query: String,
}

impl ComQuery {
    pub fn new(query: impl Into<String>) -> Self {
        ComQuery {
            cmd: Command::Query,
            query: query.into(),
        }
    }
}

impl WriteToBytes for ComQuery {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = 0;
        len += out.write_u8(self.cmd.to_byte())?;
        len += out.write_bytes(self.query.as_bytes())?;
        Ok(len)
    }
}

/// COM_REGISTER_SLAVE
///
/// this client registers anonymously: hostname, user and password are
/// zero-length so the follower does not show up as a nameable replica
#[derive(Debug, Clone)]
pub struct ComRegisterSlave {
    pub cmd: Command,
    pub server_id: u32,
    pub slave_hostname: String,
    pub slave_user: String,
    pub slave_password: String,
    pub slave_port: u16,
    pub replication_rank: u32,
    pub master_id: u32,
}

impl ComRegisterSlave {
    pub fn anonymous(server_id: u32) -> Self {
        ComRegisterSlave {
            cmd: Command::RegisterSlave,
            server_id,
            slave_hostname: String::new(),
            slave_user: String::new(),
            slave_password: String::new(),
            slave_port: 0,
            replication_rank: 0,
            master_id: 0,
        }
    }
}

impl WriteToBytes for ComRegisterSlave {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = 0;
        len += out.write_u8(self.cmd.to_byte())?;
        len += out.write_le_u32(self.server_id)?;
        len += out.write_u8(self.slave_hostname.len() as u8)?;
        len += out.write_bytes(self.slave_hostname.as_bytes())?;
        len += out.write_u8(self.slave_user.len() as u8)?;
        len += out.write_bytes(self.slave_user.as_bytes())?;
        len += out.write_u8(self.slave_password.len() as u8)?;
        len += out.write_bytes(self.slave_password.as_bytes())?;
        len += out.write_le_u16(self.slave_port)?;
        len += out.write_le_u32(self.replication_rank)?;
        len += out.write_le_u32(self.master_id)?;
        Ok(len)
    }
}

/// COM_BINLOG_DUMP flag: return EOF instead of blocking when the log
/// is exhausted
pub const BINLOG_DUMP_NON_BLOCK: u16 = 0x01;

/// COM_BINLOG_DUMP
#[derive(Debug, Clone)]
pub struct ComBinlogDump {
    pub cmd: Command,
    pub binlog_pos: u32,
    pub flags: u16,
    pub server_id: u32,
    pub binlog_filename: String,
}

impl ComBinlogDump {
    pub fn new(server_id: u32, binlog_filename: impl Into<String>, binlog_pos: u32) -> Self {
        ComBinlogDump {
            cmd: Command::BinlogDump,
            binlog_pos,
            flags: 0,
            server_id,
            binlog_filename: binlog_filename.into(),
        }
    }

    pub fn non_block(mut self, non_block: bool) -> Self {
        if non_block {
            self.flags |= BINLOG_DUMP_NON_BLOCK;
        } else {
            self.flags &= !BINLOG_DUMP_NON_BLOCK;
        }
        self
    }
}

impl WriteToBytes for ComBinlogDump {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = 0;
        len += out.write_u8(self.cmd.to_byte())?;
        len += out.write_le_u32(self.binlog_pos)?;
        len += out.write_le_u16(self.flags)?;
        len += out.write_le_u32(self.server_id)?;
        len += out.write_bytes(self.binlog_filename.as_bytes())?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_com_query_layout() {
        let mut out = BytesMut::new();
        ComQuery::new("SET @master_binlog_checksum='NONE'")
            .write_to(&mut out)
            .unwrap();
        assert_eq!(0x03, out[0]);
        assert_eq!(b"SET @master_binlog_checksum='NONE'", &out[1..]);
    }

    #[test]
    fn test_com_register_slave_layout() {
        let mut out = BytesMut::new();
        let len = ComRegisterSlave::anonymous(2).write_to(&mut out).unwrap();
        // com + server id + three empty lenenc names + port + rank + master id
        assert_eq!(1 + 4 + 1 + 1 + 1 + 2 + 4 + 4, len);
        assert_eq!(0x15, out[0]);
        assert_eq!(&[2, 0, 0, 0], &out[1..5]);
        assert!(out[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_com_binlog_dump_layout() {
        let mut out = BytesMut::new();
        ComBinlogDump::new(2, "mysql-bin.000001", 4)
            .non_block(true)
            .write_to(&mut out)
            .unwrap();
        assert_eq!(0x12, out[0]);
        assert_eq!(&[4, 0, 0, 0], &out[1..5]);
        assert_eq!(&[1, 0], &out[5..7]);
        assert_eq!(&[2, 0, 0, 0], &out[7..11]);
        assert_eq!(b"mysql-bin.000001", &out[11..]);
    }
}
