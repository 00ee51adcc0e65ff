use crate::flag::{CapabilityFlags, StatusFlags};
use crate::handshake::{AuthSwitchRequest, HandshakeV10, OldAuthSwitchRequest};
use bytes::{Buf, Bytes};
use wirebytes::{
    Error, LenEncStr, Needed, ReadBytesExt, ReadFromBytes, ReadFromBytesWithContext, ReadMyEnc,
    Result,
};

/// Ok packet
///
/// reference: https://dev.mysql.com/doc/internals/en/packet-OK_Packet.html
#[derive(Debug, Clone)]
pub struct OkPacket {
    pub header: u8,
    pub affected_rows: u64,
    pub last_insert_id: u64,
    // if PROTOCOL_41 or TRANSACTIONS enabled
    pub status_flags: StatusFlags,
    // if PROTOCOL_41 enabled
    pub warnings: u16,
    // len-enc-str if SESSION_TRACK, EOF-terminated otherwise
    pub info: Bytes,
    // if SESSION_TRACK and SESSION_STATE_CHANGED enabled
    pub session_state_changes: Bytes,
}

impl<'c> ReadFromBytesWithContext<'c> for OkPacket {
    type Context = &'c CapabilityFlags;

    fn read_with_ctx(input: &mut Bytes, cap_flags: Self::Context) -> Result<Self> {
        let header = input.read_u8()?;
        let affected_rows = input
            .read_len_enc_int()?
            .to_u64()
            .ok_or_else(|| Error::ConstraintError("invalid affected rows".to_owned()))?;
        let last_insert_id = input
            .read_len_enc_int()?
            .to_u64()
            .ok_or_else(|| Error::ConstraintError("invalid last insert id".to_owned()))?;
        let status_flags = if cap_flags.contains(CapabilityFlags::PROTOCOL_41)
            || cap_flags.contains(CapabilityFlags::TRANSACTIONS)
        {
            StatusFlags::from_bits_truncate(input.read_le_u16()?)
        } else {
            StatusFlags::empty()
        };
        let warnings = if cap_flags.contains(CapabilityFlags::PROTOCOL_41) {
            input.read_le_u16()?
        } else {
            0
        };
        let (info, session_state_changes) = if cap_flags.contains(CapabilityFlags::SESSION_TRACK) {
            let info = match input.read_len_enc_str()? {
                LenEncStr::Bytes(bs) => bs,
                _ => Bytes::new(),
            };
            let changes = if status_flags.contains(StatusFlags::SESSION_STATE_CHANGED) {
                match input.read_len_enc_str()? {
                    LenEncStr::Bytes(bs) => bs,
                    _ => Bytes::new(),
                }
            } else {
                Bytes::new()
            };
            (info, changes)
        } else {
            (input.split_to(input.remaining()), Bytes::new())
        };
        Ok(OkPacket {
            header,
            affected_rows,
            last_insert_id,
            status_flags,
            warnings,
            info,
            session_state_changes,
        })
    }
}

/// Err packet
///
/// reference: https://dev.mysql.com/doc/internals/en/packet-ERR_Packet.html
#[derive(Debug, Clone)]
pub struct ErrPacket {
    pub header: u8,
    pub error_code: u16,
    // if PROTOCOL_41 enabled: string[1]
    pub sql_state_marker: u8,
    // if PROTOCOL_41 enabled: string[5]
    pub sql_state: Bytes,
    // EOF-terminated string
    pub error_message: Bytes,
}

impl ErrPacket {
    pub fn message(&self) -> String {
        String::from_utf8_lossy(&self.error_message).into_owned()
    }
}

impl<'c> ReadFromBytesWithContext<'c> for ErrPacket {
    type Context = (&'c CapabilityFlags, bool);

    fn read_with_ctx(input: &mut Bytes, (cap_flags, sql): Self::Context) -> Result<Self> {
        let header = input.read_u8()?;
        let error_code = input.read_le_u16()?;
        let (sql_state_marker, sql_state) =
            if sql && cap_flags.contains(CapabilityFlags::PROTOCOL_41) {
                let marker = input.read_u8()?;
                let state = input.read_len(5)?;
                (marker, state)
            } else {
                (0u8, Bytes::new())
            };
        let error_message = input.split_to(input.remaining());
        Ok(ErrPacket {
            header,
            error_code,
            sql_state_marker,
            sql_state,
            error_message,
        })
    }
}

/// Eof packet
///
/// reference: https://dev.mysql.com/doc/internals/en/packet-EOF_Packet.html
#[derive(Debug, Clone)]
pub struct EofPacket {
    pub header: u8,
    pub warnings: u16,
    pub status_flags: StatusFlags,
}

impl<'c> ReadFromBytesWithContext<'c> for EofPacket {
    type Context = &'c CapabilityFlags;

    fn read_with_ctx(input: &mut Bytes, cap_flags: Self::Context) -> Result<Self> {
        let header = input.read_u8()?;
        let (warnings, status_flags) = if cap_flags.contains(CapabilityFlags::PROTOCOL_41) {
            let warnings = input.read_le_u16()?;
            let status_flags = StatusFlags::from_bits_truncate(input.read_le_u16()?);
            (warnings, status_flags)
        } else {
            (0, StatusFlags::empty())
        };
        Ok(EofPacket {
            header,
            warnings,
            status_flags,
        })
    }
}

/// one decoded server payload
#[derive(Debug, Clone)]
pub enum ServerReply {
    Ok(OkPacket),
    Err(ErrPacket),
    Eof(EofPacket),
    Handshake(HandshakeV10),
    AuthSwitch(AuthSwitchRequest),
    OldAuthSwitch(OldAuthSwitchRequest),
    /// binlog event envelope with the historical leading 0x00 stripped
    Event(Bytes),
}

impl ServerReply {
    /// dispatch on the first payload byte
    ///
    /// the byte is peeked, not consumed: each decoder reads its payload
    /// whole, tag byte included. disambiguation rules:
    /// - 0x00 in an event stream is the event envelope; outside it, Ok
    /// - 0xfe with a 1-byte payload is the old auth switch, with a
    ///   5-byte payload an Eof, anything longer the new auth switch
    pub fn read_with_ctx(
        input: &mut Bytes,
        cap_flags: &CapabilityFlags,
        event_stream: bool,
    ) -> Result<Self> {
        if !input.has_remaining() {
            return Err(Error::InputIncomplete(Needed::Unknown));
        }
        let reply = match input[0] {
            0x00 if event_stream => {
                input.read_u8()?;
                ServerReply::Event(input.split_to(input.remaining()))
            }
            0x00 => ServerReply::Ok(OkPacket::read_with_ctx(input, cap_flags)?),
            0x0a => ServerReply::Handshake(HandshakeV10::read_from(input)?),
            0xff => ServerReply::Err(ErrPacket::read_with_ctx(input, (cap_flags, true))?),
            0xfe if input.remaining() == 1 => {
                ServerReply::OldAuthSwitch(OldAuthSwitchRequest::read_from(input)?)
            }
            0xfe if input.remaining() == 5 => {
                ServerReply::Eof(EofPacket::read_with_ctx(input, cap_flags)?)
            }
            0xfe => ServerReply::AuthSwitch(AuthSwitchRequest::read_from(input)?),
            c => {
                return Err(Error::ConstraintError(format!(
                    "invalid packet header {:02x}",
                    c
                )))
            }
        };
        Ok(reply)
    }
}
