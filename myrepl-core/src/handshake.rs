use crate::flag::{CapabilityFlags, CHARSET_UTF8MB4};
use bytes::{Buf, Bytes, BytesMut};
use wirebytes::{
    Error, LenEncInt, ReadBytesExt, ReadFromBytes, Result, WriteBytesExt, WriteToBytes,
};

/// initial handshake sent by the server right after TCP connect
///
/// reference: https://dev.mysql.com/doc/internals/en/connection-phase-packets.html
/// servers older than 4.1 stop after the lower capability bytes, so
/// everything past that point is read only while payload bytes remain.
#[derive(Debug, Clone)]
pub struct HandshakeV10 {
    pub protocol_version: u8,
    pub server_version: Bytes,
    pub connection_id: u32,
    pub auth_plugin_data_1: Bytes,
    // filler 0x00
    pub charset: u8,
    pub status_flags: u16,
    // lower and upper halves combined
    pub capability_flags: u32,
    pub auth_plugin_data_len: u8,
    // 10 reserved bytes
    pub auth_plugin_data_2: Bytes,
    pub auth_plugin_name: Bytes,
}

impl ReadFromBytes for HandshakeV10 {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let protocol_version = input.read_u8()?;
        let server_version = input.read_until(0, false)?;
        let connection_id = input.read_le_u32()?;
        let auth_plugin_data_1 = input.read_len(8)?;
        input.read_len(1)?;
        let capability_flags_lower = input.read_le_u16()?;
        let mut charset = 0u8;
        let mut status_flags = 0u16;
        let mut capability_flags = capability_flags_lower as u32;
        let mut auth_plugin_data_len = 0u8;
        let mut auth_plugin_data_2 = Bytes::new();
        let mut auth_plugin_name = Bytes::new();
        // the pre-4.1 short form ends here
        if input.has_remaining() {
            charset = input.read_u8()?;
            status_flags = input.read_le_u16()?;
            let capability_flags_upper = input.read_le_u16()?;
            capability_flags |= (capability_flags_upper as u32) << 16;
            let cap_flags = CapabilityFlags::from_bits_truncate(capability_flags);
            auth_plugin_data_len = input.read_u8()?;
            if !cap_flags.contains(CapabilityFlags::PLUGIN_AUTH) {
                auth_plugin_data_len = 0;
            }
            input.read_len(10)?;
            let part2_len = std::cmp::max(13, auth_plugin_data_len as i32 - 8) as usize;
            auth_plugin_data_2 = input.read_len(part2_len)?;
            if cap_flags.contains(CapabilityFlags::PLUGIN_AUTH) {
                // the terminating NUL is missing on servers older than
                // 5.5.10 / 5.6.2 (Bug#59453)
                auth_plugin_name = match input.iter().position(|&c| c == 0) {
                    Some(_) => input.read_until(0, false)?,
                    None => input.split_to(input.remaining()),
                };
            }
        }
        Ok(HandshakeV10 {
            protocol_version,
            server_version,
            connection_id,
            auth_plugin_data_1,
            charset,
            status_flags,
            capability_flags,
            auth_plugin_data_len,
            auth_plugin_data_2,
            auth_plugin_name,
        })
    }
}

impl HandshakeV10 {
    /// auth challenge: part 1 and part 2 concatenated, without the
    /// trailing NUL that part 2 carries on modern servers
    pub fn challenge(&self) -> Vec<u8> {
        let mut seed = Vec::with_capacity(20);
        seed.extend_from_slice(&self.auth_plugin_data_1);
        seed.extend_from_slice(&self.auth_plugin_data_2);
        if let Some(0x00) = seed.last() {
            seed.pop();
        }
        seed
    }

    pub fn server_version_str(&self) -> String {
        String::from_utf8_lossy(&self.server_version).into_owned()
    }

    pub fn auth_plugin_name_str(&self) -> String {
        String::from_utf8_lossy(&self.auth_plugin_name).into_owned()
    }
}

/// handshake response of client protocol 4.1
///
/// constructed by the client from the server handshake; the database
/// field is kept for wire-format completeness but never transmitted
/// because CONNECT_WITH_DB is always cleared.
#[derive(Debug, Clone)]
pub struct HandshakeResponse41 {
    pub capability_flags: CapabilityFlags,
    pub max_packet_size: u32,
    pub charset: u8,
    // 23 bytes of 0x00 reserved
    pub username: String,
    pub auth_response: Vec<u8>,
    pub database: String,
    pub auth_plugin_name: String,
    pub connect_attrs: Vec<ConnectAttr>,
}

impl Default for HandshakeResponse41 {
    fn default() -> Self {
        HandshakeResponse41 {
            capability_flags: CapabilityFlags::empty(),
            max_packet_size: 1 << 20,
            charset: CHARSET_UTF8MB4,
            username: String::new(),
            auth_response: Vec::new(),
            database: String::new(),
            auth_plugin_name: String::new(),
            connect_attrs: Vec::new(),
        }
    }
}

impl HandshakeResponse41 {
    pub fn add_connect_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.connect_attrs.push(ConnectAttr {
            key: key.into(),
            value: value.into(),
        });
    }
}

impl WriteToBytes for HandshakeResponse41 {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = 0;
        len += self.capability_flags.write_to(out)?;
        len += out.write_le_u32(self.max_packet_size)?;
        len += out.write_u8(self.charset)?;
        len += out.write_bytes(&[0u8; 23])?;
        len += out.write_bytes(self.username.as_bytes())?;
        len += out.write_u8(0)?;
        if self
            .capability_flags
            .contains(CapabilityFlags::PLUGIN_AUTH_LENENC_CLIENT_DATA)
        {
            len += LenEncInt::from(self.auth_response.len() as u64).write_to(out)?;
            len += out.write_bytes(&self.auth_response)?;
        } else if self
            .capability_flags
            .contains(CapabilityFlags::SECURE_CONNECTION)
        {
            len += out.write_u8(self.auth_response.len() as u8)?;
            len += out.write_bytes(&self.auth_response)?;
        } else {
            len += out.write_bytes(&self.auth_response)?;
            len += out.write_u8(0)?;
        }
        if self
            .capability_flags
            .contains(CapabilityFlags::CONNECT_WITH_DB)
        {
            len += out.write_bytes(self.database.as_bytes())?;
            len += out.write_u8(0)?;
        }
        if self.capability_flags.contains(CapabilityFlags::PLUGIN_AUTH) {
            len += out.write_bytes(self.auth_plugin_name.as_bytes())?;
            len += out.write_u8(0)?;
        }
        if self
            .capability_flags
            .contains(CapabilityFlags::CONNECT_ATTRS)
        {
            let mut attrs = BytesMut::new();
            for attr in &self.connect_attrs {
                LenEncInt::from(attr.key.len() as u64).write_to(&mut attrs)?;
                attrs.write_bytes(attr.key.as_bytes())?;
                LenEncInt::from(attr.value.len() as u64).write_to(&mut attrs)?;
                attrs.write_bytes(attr.value.as_bytes())?;
            }
            len += LenEncInt::from(attrs.len() as u64).write_to(out)?;
            len += out.write_bytes(&attrs)?;
        }
        Ok(len)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectAttr {
    pub key: String,
    pub value: String,
}

/// auth method switch: 0xfe, plugin name, challenge to end of payload
#[derive(Debug, Clone)]
pub struct AuthSwitchRequest {
    pub header: u8,
    pub plugin_name: Bytes,
    pub auth_plugin_data: Bytes,
}

impl ReadFromBytes for AuthSwitchRequest {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let header = input.read_u8()?;
        if header != 0xfe {
            return Err(Error::ConstraintError(format!(
                "auth switch header mismatch: expected=0xfe, actual={:02x}",
                header
            )));
        }
        let plugin_name = input.read_until(0, false)?;
        let auth_plugin_data = input.split_to(input.remaining());
        Ok(AuthSwitchRequest {
            header,
            plugin_name,
            auth_plugin_data,
        })
    }
}

/// pre-4.1 auth switch: a bare 0xfe byte
#[derive(Debug, Clone)]
pub struct OldAuthSwitchRequest {
    pub header: u8,
}

impl ReadFromBytes for OldAuthSwitchRequest {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let header = input.read_u8()?;
        Ok(OldAuthSwitchRequest { header })
    }
}

/// response to an auth switch: the plugin output to end of payload
#[derive(Debug, Clone)]
pub struct AuthSwitchResponse {
    pub auth_plugin_response: Vec<u8>,
}

impl WriteToBytes for AuthSwitchResponse {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_bytes(&self.auth_plugin_response)
    }
}
