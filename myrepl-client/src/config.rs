use bitflags::bitflags;
use serde_derive::{Deserialize, Serialize};

/// where to start the dump when no persisted position overrides it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DumpFrom {
    /// first record of the first log file
    Beginning,
    /// the configured explicit position
    Position,
    /// the server's current position; probing it is not implemented,
    /// so this behaves like `Position` with the configured values
    Latest,
}

/// a (log file, byte offset) pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinlogPosition {
    pub filename: String,
    pub position: u32,
}

bitflags! {
    #[derive(Serialize, Deserialize)]
    pub struct LogTags: u32 {
        const ERROR      = 0x0000_0001;
        const WARNING    = 0x0000_0002;
        const PACKET     = 0x0000_0004;
        const TCP_STREAM = 0x0000_0008;
        const VARIABLE   = 0x0000_0010;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// non-zero id used in replica registration and the dump command
    pub server_id: u32,
    pub dump_from: DumpFrom,
    /// used when dump_from is Position or Latest
    pub binlog_position: BinlogPosition,
    /// when set and storage has state, it overrides dump_from
    pub continue_from_persisted: bool,
    pub log_tags: LogTags,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: String::new(),
            port: 3306,
            user: String::new(),
            password: String::new(),
            server_id: 2,
            dump_from: DumpFrom::Beginning,
            binlog_position: BinlogPosition::default(),
            continue_from_persisted: false,
            log_tags: LogTags::ERROR | LogTags::WARNING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let c = Config::default();
        assert_eq!(3306, c.port);
        assert_eq!(DumpFrom::Beginning, c.dump_from);
        assert!(c.log_tags.contains(LogTags::ERROR));
        assert!(!c.log_tags.contains(LogTags::TCP_STREAM));
    }
}
