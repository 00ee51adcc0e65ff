use crate::callback::{Callback, TableRows};
use crate::config::{Config, DumpFrom};
use crate::conn::Conn;
use crate::ddl::SqlDdlParser;
use crate::error::{Error, Result};
use crate::storage::Storage;
use async_net::TcpStream;
use bytes::Bytes;
use futures::io::{AsyncRead, AsyncWrite};
use myrepl_core::binlog::{BinlogParser, EventData, LogEventType, RowsCommand};
use myrepl_core::cmd::{ComBinlogDump, ComQuery, ComRegisterSlave};
use myrepl_core::context::ServerContext;
use myrepl_core::packet::ServerReply;
use myrepl_core::schema::DdlParser;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Unconnected,
    Connected,
    Handshaked,
}

/// the replication follower session
///
/// lifecycle: `connect` (TCP), `open` (handshake), `replicate`
/// (register as replica, dump, deliver events), `close`.
pub struct MysqlServer {
    config: Config,
    storage: Option<Box<dyn Storage>>,
    ddl_parser: Box<dyn DdlParser>,
    state: State,
    conn: Option<Conn<TcpStream>>,
    ctx: ServerContext,
}

impl MysqlServer {
    pub fn new(config: Config, storage: Option<Box<dyn Storage>>) -> Self {
        MysqlServer {
            config,
            storage,
            ddl_parser: Box::new(SqlDdlParser),
            state: State::Unconnected,
            conn: None,
            ctx: ServerContext::new(),
        }
    }

    /// swap in a different DDL parser collaborator
    pub fn with_ddl_parser(mut self, parser: Box<dyn DdlParser>) -> Self {
        self.ddl_parser = parser;
        self
    }

    pub fn context(&self) -> &ServerContext {
        &self.ctx
    }

    pub async fn connect(&mut self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let stream = TcpStream::connect(addr.as_str())
            .await
            .map_err(Error::ConnectFailed)?;
        log::debug!("connected to {}", addr);
        self.conn = Some(Conn::new(stream, self.config.log_tags));
        self.state = State::Connected;
        Ok(())
    }

    /// run the handshake; must be called after `connect`
    pub async fn open(&mut self) -> Result<()> {
        if self.state != State::Connected {
            return Err(Error::NotConnected);
        }
        let conn = self.conn.as_mut().ok_or(Error::NotConnected)?;
        conn.handshake(&mut self.ctx, &self.config.user, &self.config.password)
            .await?;
        self.state = State::Handshaked;
        Ok(())
    }

    /// subscribe as a replica and deliver the stream to the callback
    /// until the callback stops it or the connection fails
    pub async fn replicate(&mut self, callback: &mut dyn Callback) -> Result<()> {
        if self.state != State::Handshaked {
            return Err(Error::NotHandshaked);
        }
        let conn = self.conn.as_mut().ok_or(Error::NotConnected)?;
        replicate_on(
            conn,
            &mut self.ctx,
            &self.config,
            self.storage.as_deref_mut(),
            self.ddl_parser.as_ref(),
            callback,
        )
        .await
    }

    pub fn close(&mut self) {
        // dropping the connection closes the socket
        self.conn = None;
        self.state = State::Unconnected;
    }
}

/// the replication preamble and event loop, generic over the stream
/// so recorded exchanges can drive it in tests
pub(crate) async fn replicate_on<S>(
    conn: &mut Conn<S>,
    ctx: &mut ServerContext,
    config: &Config,
    mut storage: Option<&mut (dyn Storage + 'static)>,
    ddl_parser: &dyn DdlParser,
    callback: &mut dyn Callback,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // the client opts out of CRC; the server-side flag stays recorded
    // because some paths still emit trailing checksum bytes
    if ctx.compare_version("5.6.2") != Ordering::Less {
        conn.send_cmd(ComQuery::new("SET @master_binlog_checksum='NONE'"))
            .await?;
        expect_ok(conn).await?;
    }

    conn.send_cmd(ComRegisterSlave::anonymous(config.server_id))
        .await?;
    expect_ok(conn).await?;

    let (filename, position) = starting_position(config, ctx, storage.as_deref());
    log::debug!("dumping binlog from {} at {}", filename, position);
    conn.send_cmd(
        ComBinlogDump::new(config.server_id, filename.clone(), position).non_block(true),
    )
    .await?;
    ctx.binlog_filename = filename;
    ctx.binlog_position = position;

    let parser = BinlogParser::new(false);
    loop {
        let mut payload = conn.recv_payload().await?;
        match ServerReply::read_with_ctx(&mut payload, &conn.cap_flags, true)? {
            ServerReply::Eof(_) => {
                if callback.on_idle() {
                    return Ok(());
                }
            }
            ServerReply::Err(err) => {
                log::error!(
                    "server aborted the stream: {} ({})",
                    err.message(),
                    err.error_code
                );
                return Err(err.into());
            }
            ServerReply::Event(mut body) => {
                let type_code = event_type_code(&body);
                match parser.parse_event(&mut body, ctx) {
                    Ok(event) => {
                        dispatch_event(event.data, ctx, ddl_parser, callback);
                        ctx.binlog_position = event.header.log_pos;
                        if let Some(storage) = storage.as_deref_mut() {
                            storage.persist(&ctx.binlog_filename, ctx.binlog_position);
                        }
                    }
                    Err(e) => {
                        // a malformed row event costs that event only;
                        // anything else leaves the stream unreadable
                        let row_event = type_code
                            .map(|c| LogEventType::from(c).is_row_event())
                            .unwrap_or(false);
                        if row_event {
                            log::warn!("abandoning undecodable row event: {}", e);
                            continue;
                        }
                        return Err(e.into());
                    }
                }
            }
            other => {
                return Err(Error::UnexpectedPacket(format!(
                    "unexpected packet in event stream: {:?}",
                    other
                )))
            }
        }
    }
}

fn dispatch_event(
    data: EventData,
    ctx: &mut ServerContext,
    ddl_parser: &dyn DdlParser,
    callback: &mut dyn Callback,
) {
    match data {
        EventData::FormatDescription(fde) => {
            log::debug!(
                "format description from server {} ({} header lengths)",
                fde.server_version,
                fde.event_type_header_lengths.len()
            );
            ctx.post_header_lengths = fde.event_type_header_lengths;
        }
        EventData::TableMap(tm) => {
            ctx.table_maps.insert(tm.table_id, tm);
        }
        EventData::Rotate(rotate) => {
            ctx.binlog_filename = rotate.next_file_str();
            ctx.binlog_position = rotate.position as u32;
        }
        EventData::Rows(ev) => {
            for idx in &ev.missing_attr_cols {
                callback.on_missing_column_attr(&ev.schema_name, &ev.table_name, *idx);
            }
            if ev.skipped {
                return;
            }
            let (command, rows) = TableRows::from_event(&ev);
            match command {
                RowsCommand::Insert => callback.on_insert(&rows),
                RowsCommand::Update => callback.on_update(&rows),
                RowsCommand::Delete => callback.on_delete(&rows),
            }
        }
        EventData::Query(q) => {
            track_ddl(&q, ctx, ddl_parser);
            callback.on_query(&q.query_str());
        }
        // transaction markers and bookkeeping kinds need no handling
        _ => {}
    }
}

fn track_ddl(
    query: &myrepl_core::binlog::QueryData,
    ctx: &mut ServerContext,
    ddl_parser: &dyn DdlParser,
) {
    let tables = match ddl_parser.parse(&query.query_str()) {
        Ok(tables) => tables,
        Err(e) => {
            // not every statement parses (nor needs to)
            log::debug!("ddl parse skipped: {}", e);
            return;
        }
    };
    for mut table in tables {
        // 5.5.62 occasionally leaves the event's schema empty; fall
        // back to the schema written in the statement itself
        if !query.schema.is_empty() {
            table.schema = query.schema.clone();
        }
        ctx.columns.apply(&table);
    }
}

async fn expect_ok<S>(conn: &mut Conn<S>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut payload = conn.recv_payload().await?;
    match ServerReply::read_with_ctx(&mut payload, &conn.cap_flags, false)? {
        ServerReply::Ok(_) => Ok(()),
        ServerReply::Err(err) => Err(err.into()),
        other => Err(Error::UnexpectedPacket(format!(
            "expected Ok, got {:?}",
            other
        ))),
    }
}

/// starting-position policy: persisted state wins when continuation is
/// requested; otherwise the configured mode applies, with the position
/// forced back to 4 whenever the file is not the one whose
/// format-description event we hold (the first record of any log must
/// be that event)
fn starting_position(
    config: &Config,
    ctx: &ServerContext,
    storage: Option<&dyn Storage>,
) -> (String, u32) {
    if config.continue_from_persisted {
        if let Some(saved) = storage.and_then(|s| s.restore()) {
            if !saved.filename.is_empty() {
                return (saved.filename, saved.position);
            }
        }
    }
    let (filename, mut position) = match config.dump_from {
        DumpFrom::Beginning => ("mysql-bin.000001".to_owned(), 4),
        DumpFrom::Position | DumpFrom::Latest => (
            config.binlog_position.filename.clone(),
            config.binlog_position.position,
        ),
    };
    if filename != ctx.binlog_filename {
        position = 4;
    }
    (filename, position)
}

fn event_type_code(body: &Bytes) -> Option<u8> {
    // the type code sits after the 4-byte timestamp
    body.get(4).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BinlogPosition;
    use crate::conn::tests::{frame, MockStream};
    use crate::storage::MemoryStorage;
    use myrepl_core::col::ColumnType;
    use smol_str::SmolStr;

    /// wrap an event body in the 19-byte header
    fn encode_event(type_code: u8, body: &[u8]) -> Vec<u8> {
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

    #[derive(Debug, Default)]
    struct RecordingCallback {
        queries: Vec<String>,
        inserts: Vec<(SmolStr, usize)>,
        updates: Vec<TableRows>,
        deletes: Vec<(SmolStr, usize)>,
        missing: Vec<(String, String, usize)>,
        idle_calls: usize,
    }

    impl Callback for RecordingCallback {
        fn on_query(&mut self, sql: &str) {
            self.queries.push(sql.to_owned());
        }
        fn on_insert(&mut self, rows: &TableRows) {
            self.inserts.push((rows.table.clone(), rows.rows.len()));
        }
        fn on_update(&mut self, rows: &TableRows) {
            self.updates.push(rows.clone());
        }
        fn on_delete(&mut self, rows: &TableRows) {
            self.deletes.push((rows.table.clone(), rows.rows.len()));
        }
        fn on_idle(&mut self) -> bool {
            self.idle_calls += 1;
            true
        }
        fn on_missing_column_attr(&mut self, schema: &str, table: &str, col_idx: usize) {
            self.missing
                .push((schema.to_owned(), table.to_owned(), col_idx));
        }
    }

    const OK_PAYLOAD: &[u8] = &[0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00];
    const EOF_PAYLOAD: &[u8] = &[0xfe, 0x00, 0x00, 0x02, 0x00];

    fn fde_body() -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&4u16.to_le_bytes());
        let mut ver = [0u8; 50];
        ver[..10].copy_from_slice(b"5.5.62-log");
        body.extend_from_slice(&ver);
        body.extend_from_slice(&0u32.to_le_bytes());
        body.push(19);
        // post-header lengths for event codes 1..=27 as 5.5 sends them
        body.extend_from_slice(&[
            56, 13, 0, 8, 0, 18, 0, 4, 4, 4, 4, 18, 0, 0, 84, 0, 4, 26, 8, 0, 0, 0, 8, 8, 8, 2,
            0,
        ]);
        body
    }

    fn query_body(schema: &str, sql: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&3u32.to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.push(schema.len() as u8);
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(schema.as_bytes());
        body.push(0);
        body.extend_from_slice(sql.as_bytes());
        body
    }

    fn table_map_body(table_id: u64, schema: &str, table: &str) -> Vec<u8> {
        // t1(a INT, b VARCHAR(20))
        let mut body = Vec::new();
        body.extend_from_slice(&table_id.to_le_bytes()[..6]);
        body.extend_from_slice(&1u16.to_le_bytes());
        body.push(schema.len() as u8);
        body.extend_from_slice(schema.as_bytes());
        body.push(0);
        body.push(table.len() as u8);
        body.extend_from_slice(table.as_bytes());
        body.push(0);
        body.push(2);
        body.push(ColumnType::Long.code());
        body.push(ColumnType::Varchar.code());
        body.push(2);
        body.extend_from_slice(&[60, 0]);
        body.push(0x02);
        body
    }

    fn write_rows_body(table_id: u64, rows: &[(i32, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&table_id.to_le_bytes()[..6]);
        body.extend_from_slice(&1u16.to_le_bytes());
        body.push(2);
        body.push(0b0000_0011);
        for (a, b) in rows {
            body.push(0);
            body.extend_from_slice(&a.to_le_bytes());
            body.push(b.len() as u8);
            body.extend_from_slice(b.as_bytes());
        }
        body
    }

    /// server side of a 5.5.62 replication exchange: reply to
    /// register-slave, then stream the given events, then EOF
    fn script_5_5(events: Vec<Vec<u8>>) -> Vec<u8> {
        let mut input = Vec::new();
        // response to COM_REGISTER_SLAVE
        input.extend_from_slice(&frame(OK_PAYLOAD, 1));
        // responses to COM_BINLOG_DUMP: each event in its own packet
        let mut seq = 1;
        for event in events {
            let mut payload = vec![0x00];
            payload.extend_from_slice(&event);
            input.extend_from_slice(&frame(&payload, seq));
            seq += 1;
        }
        input.extend_from_slice(&frame(EOF_PAYLOAD, seq));
        input
    }

    fn ctx_5_5() -> ServerContext {
        let mut ctx = ServerContext::new();
        ctx.set_version("5.5.62-log");
        ctx
    }

    fn run_replication(
        input: Vec<u8>,
        config: &Config,
        ctx: &mut ServerContext,
        callback: &mut RecordingCallback,
    ) -> (Result<()>, MockStream) {
        let mut conn = Conn::new(MockStream::with_input(input), config.log_tags);
        let result = smol::block_on(replicate_on(
            &mut conn,
            ctx,
            config,
            None,
            &SqlDdlParser,
            callback,
        ));
        (result, conn.into_inner())
    }

    #[test]
    fn test_replicate_from_recorded_stream() {
        // E1: one format description, then BEGIN
        let input = script_5_5(vec![
            encode_event(15, &fde_body()),
            encode_event(2, &query_body("test", "BEGIN")),
        ]);
        let config = Config::default();
        let mut ctx = ctx_5_5();
        let mut callback = RecordingCallback::default();
        let (result, stream) = run_replication(input, &config, &mut ctx, &mut callback);
        result.unwrap();
        assert_eq!(vec!["BEGIN"], callback.queries);
        assert_eq!(1, callback.idle_calls);
        // the format description table was installed
        assert_eq!(Some(13), ctx.post_header_length(2));
        // no 5.6 checksum query on 5.5: first written command is
        // register-slave
        assert_eq!(0x15, stream.written[4]);
    }

    #[test]
    fn test_replicate_create_insert_sequence() {
        // E2: CREATE TABLE, then a table map and three inserts
        let create = "CREATE TABLE t1(a INT, b VARCHAR(20))";
        let input = script_5_5(vec![
            encode_event(15, &fde_body()),
            encode_event(2, &query_body("test", create)),
            encode_event(19, &table_map_body(13, "test", "t1")),
            encode_event(23, &write_rows_body(13, &[(1, "a")])),
            encode_event(23, &write_rows_body(13, &[(2, "b")])),
            encode_event(23, &write_rows_body(13, &[(3, "c")])),
        ]);
        let config = Config::default();
        let mut ctx = ctx_5_5();
        let mut callback = RecordingCallback::default();
        let (result, _) = run_replication(input, &config, &mut ctx, &mut callback);
        result.unwrap();
        assert_eq!(vec![create.to_owned()], callback.queries);
        assert_eq!(3, callback.inserts.len());
        assert!(callback
            .inserts
            .iter()
            .all(|(table, rows)| table == "t1" && *rows == 1));
        assert!(callback.missing.is_empty());
        // tracked attributes came from the DDL
        assert_eq!(
            "a",
            ctx.columns.column_at("test", "t1", 0).unwrap().name
        );
    }

    #[test]
    fn test_replicate_update_before_after() {
        // E3: an update touching both columns
        let mut body = Vec::new();
        body.extend_from_slice(&13u64.to_le_bytes()[..6]);
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&2u16.to_le_bytes());
        body.push(2);
        body.push(0b0000_0011);
        body.push(0b0000_0011);
        body.push(0);
        body.extend_from_slice(&1i32.to_le_bytes());
        body.push(3);
        body.extend_from_slice(b"old");
        body.push(0);
        body.extend_from_slice(&1i32.to_le_bytes());
        body.push(3);
        body.extend_from_slice(b"new");
        let input = script_5_5(vec![
            encode_event(15, &fde_body()),
            encode_event(2, &query_body("test", "CREATE TABLE t1(a INT, b VARCHAR(20))")),
            encode_event(19, &table_map_body(13, "test", "t1")),
            encode_event(31, &body),
        ]);
        let config = Config::default();
        let mut ctx = ctx_5_5();
        let mut callback = RecordingCallback::default();
        let (result, _) = run_replication(input, &config, &mut ctx, &mut callback);
        result.unwrap();
        assert_eq!(1, callback.updates.len());
        let rows = &callback.updates[0];
        assert_eq!(1, rows.rows.len());
        assert_eq!(2, rows.rows[0].before.len());
        assert_eq!(2, rows.rows[0].after.len());
    }

    #[test]
    fn test_rotate_advances_filename() {
        // E4
        let mut rotate = Vec::from(&4u64.to_le_bytes()[..]);
        rotate.extend_from_slice(b"mysql-bin.000002");
        let input = script_5_5(vec![
            encode_event(15, &fde_body()),
            encode_event(4, &rotate),
        ]);
        let config = Config::default();
        let mut ctx = ctx_5_5();
        let mut callback = RecordingCallback::default();
        let (result, _) = run_replication(input, &config, &mut ctx, &mut callback);
        result.unwrap();
        assert_eq!("mysql-bin.000002", ctx.binlog_filename);
    }

    #[test]
    fn test_unknown_event_kind_stream_continues() {
        // E6: an event kind from the future with a 30-byte body
        let input = script_5_5(vec![
            encode_event(15, &fde_body()),
            encode_event(0x40, &[0u8; 30]),
            encode_event(2, &query_body("test", "BEGIN")),
        ]);
        let config = Config::default();
        let mut ctx = ctx_5_5();
        let mut callback = RecordingCallback::default();
        let (result, _) = run_replication(input, &config, &mut ctx, &mut callback);
        result.unwrap();
        assert_eq!(vec!["BEGIN"], callback.queries);
    }

    #[test]
    fn test_missing_column_attr_advisory() {
        // no CREATE TABLE observed: attributes are unrecoverable
        let input = script_5_5(vec![
            encode_event(15, &fde_body()),
            encode_event(19, &table_map_body(13, "test", "t1")),
            encode_event(23, &write_rows_body(13, &[(1, "a")])),
        ]);
        let config = Config::default();
        let mut ctx = ctx_5_5();
        let mut callback = RecordingCallback::default();
        let (result, _) = run_replication(input, &config, &mut ctx, &mut callback);
        result.unwrap();
        assert_eq!(
            vec![
                ("test".to_owned(), "t1".to_owned(), 0),
                ("test".to_owned(), "t1".to_owned(), 1)
            ],
            callback.missing
        );
        // the insert is still delivered
        assert_eq!(1, callback.inserts.len());
    }

    #[test]
    fn test_mid_stream_err_is_fatal() {
        let mut input = Vec::new();
        input.extend_from_slice(&frame(OK_PAYLOAD, 1));
        let mut err_payload = vec![0xff, 0xd4, 0x04, b'#'];
        err_payload.extend_from_slice(b"HY000");
        err_payload.extend_from_slice(b"gone away");
        input.extend_from_slice(&frame(&err_payload, 1));
        let config = Config::default();
        let mut ctx = ctx_5_5();
        ctx.capability_flags = myrepl_core::flag::CapabilityFlags::PROTOCOL_41;
        let mut callback = RecordingCallback::default();
        let mut conn = Conn::new(
            MockStream::with_input(input),
            config.log_tags,
        );
        conn.cap_flags = myrepl_core::flag::CapabilityFlags::PROTOCOL_41;
        let result = smol::block_on(replicate_on(
            &mut conn,
            &mut ctx,
            &config,
            None,
            &SqlDdlParser,
            &mut callback,
        ));
        match result.unwrap_err() {
            Error::ServerError { code, message } => {
                assert_eq!(1236, code);
                assert_eq!("gone away", message);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_starting_position_policy() {
        let mut config = Config::default();
        let ctx = ctx_5_5();
        // beginning
        assert_eq!(
            ("mysql-bin.000001".to_owned(), 4),
            starting_position(&config, &ctx, None)
        );
        // explicit position, file unknown to us: forced back to 4
        config.dump_from = DumpFrom::Position;
        config.binlog_position = BinlogPosition {
            filename: "mysql-bin.000007".to_owned(),
            position: 1234,
        };
        assert_eq!(
            ("mysql-bin.000007".to_owned(), 4),
            starting_position(&config, &ctx, None)
        );
        // explicit position matching the recorded format-description
        // file is honored
        let mut ctx2 = ctx_5_5();
        ctx2.binlog_filename = "mysql-bin.000007".to_owned();
        assert_eq!(
            ("mysql-bin.000007".to_owned(), 1234),
            starting_position(&config, &ctx2, None)
        );
        // persisted state overrides everything when continuation is on
        config.continue_from_persisted = true;
        let mut storage = MemoryStorage::default();
        storage.persist("mysql-bin.000009", 420);
        assert_eq!(
            ("mysql-bin.000009".to_owned(), 420),
            starting_position(&config, &ctx, Some(&storage as &dyn Storage))
        );
    }

    #[test]
    fn test_persisted_position_advances() {
        let input = script_5_5(vec![
            encode_event(15, &fde_body()),
            encode_event(2, &query_body("test", "BEGIN")),
        ]);
        let config = Config::default();
        let mut ctx = ctx_5_5();
        let mut callback = RecordingCallback::default();
        let mut storage = MemoryStorage::default();
        let mut conn = Conn::new(MockStream::with_input(input), config.log_tags);
        smol::block_on(replicate_on(
            &mut conn,
            &mut ctx,
            &config,
            Some(&mut storage as &mut dyn Storage),
            &SqlDdlParser,
            &mut callback,
        ))
        .unwrap();
        let saved = storage.restore().unwrap();
        assert_eq!("mysql-bin.000001", saved.filename);
    }

    #[test]
    fn test_checksum_opt_out_sent_on_5_6() {
        let mut input = Vec::new();
        // response to SET @master_binlog_checksum
        input.extend_from_slice(&frame(OK_PAYLOAD, 1));
        // response to register-slave
        input.extend_from_slice(&frame(OK_PAYLOAD, 1));
        input.extend_from_slice(&frame(EOF_PAYLOAD, 1));
        let config = Config::default();
        let mut ctx = ServerContext::new();
        ctx.set_version("5.6.46");
        let mut callback = RecordingCallback::default();
        let (result, stream) = run_replication(input, &config, &mut ctx, &mut callback);
        result.unwrap();
        let written = stream.written;
        assert_eq!(0x03, written[4]);
        let sql_end = 4 + 1 + "SET @master_binlog_checksum='NONE'".len();
        assert_eq!(
            b"SET @master_binlog_checksum='NONE'",
            &written[5..sql_end]
        );
    }
}
