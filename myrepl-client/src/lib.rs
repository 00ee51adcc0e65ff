//! a client that impersonates a MySQL replication follower
//!
//! `MysqlServer` drives the whole lifecycle: TCP connect, handshake,
//! replica registration, binlog dump, and delivery of decoded events
//! to the embedding application's [`Callback`].
pub mod auth;
pub mod callback;
pub mod config;
pub mod conn;
pub mod ddl;
pub mod error;
pub mod repl;
pub mod storage;

pub use callback::{Callback, RowImage, TableRows};
pub use config::{BinlogPosition, Config, DumpFrom, LogTags};
pub use conn::Conn;
pub use ddl::SqlDdlParser;
pub use error::{Error, Result};
pub use repl::MysqlServer;
pub use storage::{MemoryStorage, Storage};
