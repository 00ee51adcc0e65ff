//! wire structures of the MySQL replication protocol
//!
//! everything in this crate decodes from or encodes to reassembled
//! logical payloads; packet framing and socket handling live in the
//! client crate.
pub mod binlog;
pub mod cmd;
pub mod col;
pub mod context;
pub mod decimal;
pub mod error;
pub mod flag;
pub mod handshake;
pub mod packet;
pub mod schema;
pub mod time;
pub mod value;
mod bitmap;

pub use crate::error::{Error, Result};

/// command byte vocabulary, restricted to what a replication follower sends
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Quit,
    Query,
    BinlogDump,
    RegisterSlave,
}

impl Command {
    pub fn to_byte(self) -> u8 {
        match self {
            Command::Quit => 0x01,
            Command::Query => 0x03,
            Command::BinlogDump => 0x12,
            Command::RegisterSlave => 0x15,
        }
    }
}
