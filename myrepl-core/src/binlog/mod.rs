//! binlog event decoding, protocol version 4
pub mod fde;
pub mod header;
pub mod load;
pub mod misc;
pub mod parser;
pub mod query;
pub mod rotate;
pub mod rows;
pub mod table_map;
pub mod xid;

pub use fde::FormatDescriptionData;
pub use header::EventHeader;
pub use load::{
    AppendBlockData, BeginLoadQueryData, CreateFileData, DeleteFileData, ExecLoadData,
    ExecuteLoadQueryData, LoadData, NewLoadData,
};
pub use misc::{IncidentData, IntvarData, RandData, RowsQueryData, UserVarData};
pub use parser::{BinlogEvent, BinlogParser, EventData};
pub use query::{QueryData, QueryStatusVar};
pub use rotate::RotateData;
pub use rows::{RowsCommand, RowsEvent, RowsEventRow};
pub use table_map::TableMap;
pub use xid::XidData;

/// event type vocabulary of binlog version 4
///
/// reference: https://dev.mysql.com/doc/internals/en/binlog-event-type.html
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEventType {
    Unknown,
    StartEventV3,
    QueryEvent,
    StopEvent,
    RotateEvent,
    IntvarEvent,
    LoadEvent,
    SlaveEvent,
    CreateFileEvent,
    AppendBlockEvent,
    ExecLoadEvent,
    DeleteFileEvent,
    NewLoadEvent,
    RandEvent,
    UserVarEvent,
    FormatDescriptionEvent,
    XidEvent,
    BeginLoadQueryEvent,
    ExecuteLoadQueryEvent,
    TableMapEvent,
    // v0 row events served 5.1.0 ~ 5.1.17
    WriteRowsEventV0,
    UpdateRowsEventV0,
    DeleteRowsEventV0,
    // v1 row events served 5.1.18 ~ 5.6.x
    WriteRowsEventV1,
    UpdateRowsEventV1,
    DeleteRowsEventV1,
    IncidentEvent,
    HeartbeatLogEvent,
    IgnorableLogEvent,
    RowsQueryLogEvent,
    // v2 row events arrived with 5.6
    WriteRowsEventV2,
    UpdateRowsEventV2,
    DeleteRowsEventV2,
    GtidLogEvent,
    AnonymousGtidLogEvent,
    PreviousGtidsLogEvent,
    /// any code this client has no decoder for
    Invalid,
}

impl From<u8> for LogEventType {
    fn from(code: u8) -> LogEventType {
        match code {
            0 => LogEventType::Unknown,
            1 => LogEventType::StartEventV3,
            2 => LogEventType::QueryEvent,
            3 => LogEventType::StopEvent,
            4 => LogEventType::RotateEvent,
            5 => LogEventType::IntvarEvent,
            6 => LogEventType::LoadEvent,
            7 => LogEventType::SlaveEvent,
            8 => LogEventType::CreateFileEvent,
            9 => LogEventType::AppendBlockEvent,
            10 => LogEventType::ExecLoadEvent,
            11 => LogEventType::DeleteFileEvent,
            12 => LogEventType::NewLoadEvent,
            13 => LogEventType::RandEvent,
            14 => LogEventType::UserVarEvent,
            15 => LogEventType::FormatDescriptionEvent,
            16 => LogEventType::XidEvent,
            17 => LogEventType::BeginLoadQueryEvent,
            18 => LogEventType::ExecuteLoadQueryEvent,
            19 => LogEventType::TableMapEvent,
            20 => LogEventType::WriteRowsEventV0,
            21 => LogEventType::UpdateRowsEventV0,
            22 => LogEventType::DeleteRowsEventV0,
            23 => LogEventType::WriteRowsEventV1,
            24 => LogEventType::UpdateRowsEventV1,
            25 => LogEventType::DeleteRowsEventV1,
            26 => LogEventType::IncidentEvent,
            27 => LogEventType::HeartbeatLogEvent,
            28 => LogEventType::IgnorableLogEvent,
            29 => LogEventType::RowsQueryLogEvent,
            30 => LogEventType::WriteRowsEventV2,
            31 => LogEventType::UpdateRowsEventV2,
            32 => LogEventType::DeleteRowsEventV2,
            33 => LogEventType::GtidLogEvent,
            34 => LogEventType::AnonymousGtidLogEvent,
            35 => LogEventType::PreviousGtidsLogEvent,
            _ => LogEventType::Invalid,
        }
    }
}

impl LogEventType {
    pub fn is_row_event(self) -> bool {
        matches!(
            self,
            LogEventType::WriteRowsEventV0
                | LogEventType::UpdateRowsEventV0
                | LogEventType::DeleteRowsEventV0
                | LogEventType::WriteRowsEventV1
                | LogEventType::UpdateRowsEventV1
                | LogEventType::DeleteRowsEventV1
                | LogEventType::WriteRowsEventV2
                | LogEventType::UpdateRowsEventV2
                | LogEventType::DeleteRowsEventV2
        )
    }
}
