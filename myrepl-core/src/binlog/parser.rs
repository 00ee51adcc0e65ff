use crate::binlog::{
    fde::FormatDescriptionData, header::EventHeader, load::*, misc::*, query::QueryData,
    rotate::RotateData, rows::*, table_map::TableMap, xid::XidData, LogEventType,
};
use crate::context::ServerContext;
use crate::error::{Error, Result};
use bytes::{Buf, Bytes};
use crc_any::CRCu32;
use wirebytes::{ReadFromBytes, ReadFromBytesWithContext};

/// decoded event payload, one variant per recognized kind
#[derive(Debug, Clone)]
pub enum EventData {
    Query(QueryData),
    Stop,
    Rotate(RotateData),
    Intvar(IntvarData),
    Load(LoadData),
    CreateFile(CreateFileData),
    AppendBlock(AppendBlockData),
    ExecLoad(ExecLoadData),
    DeleteFile(DeleteFileData),
    NewLoad(NewLoadData),
    Rand(RandData),
    UserVar(UserVarData),
    FormatDescription(FormatDescriptionData),
    Xid(XidData),
    BeginLoadQuery(BeginLoadQueryData),
    ExecuteLoadQuery(ExecuteLoadQueryData),
    TableMap(TableMap),
    Rows(RowsEvent),
    Incident(IncidentData),
    Heartbeat,
    Ignorable,
    RowsQuery(RowsQueryData),
    /// GTID bookkeeping kinds are acknowledged but not interpreted
    Gtid(Bytes),
    AnonymousGtid(Bytes),
    PreviousGtids(Bytes),
    Slave,
    /// an event type code with no decoder; its body was consumed
    Unknown { type_code: u8 },
}

#[derive(Debug, Clone)]
pub struct BinlogEvent {
    pub header: EventHeader,
    pub data: EventData,
}

/// binlog version 4 event dispatcher
///
/// reads the 19-byte header, hands the body (minus the CRC trailer
/// when the server appends one) to the per-kind decoder, and discards
/// whatever a newer server appended after the fields this client
/// understands.
#[derive(Debug, Default)]
pub struct BinlogParser {
    pub validate_checksum: bool,
}

impl BinlogParser {
    pub fn new(validate_checksum: bool) -> Self {
        BinlogParser { validate_checksum }
    }

    /// decode one event from a full event payload (the envelope 0x00
    /// already stripped)
    pub fn parse_event(&self, input: &mut Bytes, ctx: &ServerContext) -> Result<BinlogEvent> {
        let raw = input.clone();
        let header = EventHeader::read_from(input)?;
        let mut body = input.split_to(input.remaining());
        if ctx.crc_size() > 0 && body.remaining() >= ctx.crc_size() {
            let crc = body.split_off(body.remaining() - ctx.crc_size());
            if self.validate_checksum {
                let expected =
                    u32::from_le_bytes([crc[0], crc[1], crc[2], crc[3]]);
                let mut hasher = CRCu32::crc32();
                hasher.digest(&raw[..raw.len() - ctx.crc_size()]);
                let actual = hasher.get_crc();
                if expected != actual {
                    return Err(Error::BinlogChecksumMismatch(expected, actual));
                }
            }
        }
        let event_type = LogEventType::from(header.type_code);
        let data = match event_type {
            LogEventType::QueryEvent => EventData::Query(QueryData::read_from(&mut body)?),
            LogEventType::StopEvent => EventData::Stop,
            LogEventType::RotateEvent => EventData::Rotate(RotateData::read_from(&mut body)?),
            LogEventType::IntvarEvent => EventData::Intvar(IntvarData::read_from(&mut body)?),
            LogEventType::LoadEvent => EventData::Load(LoadData::read_from(&mut body)?),
            LogEventType::CreateFileEvent => {
                EventData::CreateFile(CreateFileData::read_from(&mut body)?)
            }
            LogEventType::AppendBlockEvent => {
                EventData::AppendBlock(AppendBlockData::read_from(&mut body)?)
            }
            LogEventType::ExecLoadEvent => {
                EventData::ExecLoad(ExecLoadData::read_from(&mut body)?)
            }
            LogEventType::DeleteFileEvent => {
                EventData::DeleteFile(DeleteFileData::read_from(&mut body)?)
            }
            LogEventType::NewLoadEvent => EventData::NewLoad(NewLoadData::read_from(&mut body)?),
            LogEventType::RandEvent => EventData::Rand(RandData::read_from(&mut body)?),
            LogEventType::UserVarEvent => EventData::UserVar(UserVarData::read_from(&mut body)?),
            LogEventType::FormatDescriptionEvent => {
                EventData::FormatDescription(FormatDescriptionData::read_from(&mut body)?)
            }
            LogEventType::XidEvent => EventData::Xid(XidData::read_from(&mut body)?),
            LogEventType::BeginLoadQueryEvent => {
                EventData::BeginLoadQuery(BeginLoadQueryData::read_from(&mut body)?)
            }
            LogEventType::ExecuteLoadQueryEvent => {
                EventData::ExecuteLoadQuery(ExecuteLoadQueryData::read_from(&mut body)?)
            }
            LogEventType::TableMapEvent => {
                EventData::TableMap(TableMap::read_with_ctx(&mut body, ctx)?)
            }
            LogEventType::WriteRowsEventV0
            | LogEventType::UpdateRowsEventV0
            | LogEventType::DeleteRowsEventV0
            | LogEventType::WriteRowsEventV1
            | LogEventType::UpdateRowsEventV1
            | LogEventType::DeleteRowsEventV1
            | LogEventType::WriteRowsEventV2
            | LogEventType::UpdateRowsEventV2
            | LogEventType::DeleteRowsEventV2 => {
                EventData::Rows(read_rows_event(&mut body, header.type_code, ctx)?)
            }
            LogEventType::IncidentEvent => {
                EventData::Incident(IncidentData::read_from(&mut body)?)
            }
            LogEventType::HeartbeatLogEvent => EventData::Heartbeat,
            LogEventType::IgnorableLogEvent => EventData::Ignorable,
            LogEventType::RowsQueryLogEvent => {
                EventData::RowsQuery(RowsQueryData::read_from(&mut body)?)
            }
            LogEventType::GtidLogEvent => {
                EventData::Gtid(body.split_to(body.remaining()))
            }
            LogEventType::AnonymousGtidLogEvent => {
                EventData::AnonymousGtid(body.split_to(body.remaining()))
            }
            LogEventType::PreviousGtidsLogEvent => {
                EventData::PreviousGtids(body.split_to(body.remaining()))
            }
            LogEventType::SlaveEvent => EventData::Slave,
            LogEventType::Unknown | LogEventType::StartEventV3 | LogEventType::Invalid => {
                log::warn!(
                    "no decoder for event type {:#04x}, discarding {} bytes",
                    header.type_code,
                    body.remaining()
                );
                body.advance(body.remaining());
                EventData::Unknown {
                    type_code: header.type_code,
                }
            }
        };
        // a newer server may have appended fields this client does not
        // know about; they do not affect the decoded prefix
        if body.has_remaining() {
            log::warn!(
                "discarding {} residual bytes after {:?}",
                body.remaining(),
                event_type
            );
            body.advance(body.remaining());
        }
        Ok(BinlogEvent { header, data })
    }
}

#[cfg(test)]
pub(crate) fn encode_event(type_code: u8, body: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.push(type_code);
    payload.extend_from_slice(&2u32.to_le_bytes());
    payload.extend_from_slice(&(19 + body.len() as u32).to_le_bytes());
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.extend_from_slice(&0u16.to_le_bytes());
    payload.extend_from_slice(body);
    payload
}
