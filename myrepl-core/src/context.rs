use crate::binlog::table_map::TableMap;
use crate::flag::{CapabilityFlags, StatusFlags};
use crate::schema::SchemaAttrs;
use std::cmp::Ordering;
use std::collections::HashMap;

/// per-connection decoder state
///
/// owned by the replication session; nothing in here is shared, which
/// is what makes the lock-free two-worker split of the stream safe.
#[derive(Debug)]
pub struct ServerContext {
    /// dotted server version, e.g. "5.5.62-log"
    pub version: String,
    pub capability_flags: CapabilityFlags,
    pub status_flags: StatusFlags,
    /// fixed to 4 for every supported server
    pub binlog_version: u8,
    /// per-event-type post-header lengths from the first
    /// format-description event, indexed by type code - 1
    pub post_header_lengths: Vec<u8>,
    /// servers from 5.6.0 append a CRC32 trailer to every event
    pub crc32_enabled: bool,
    pub binlog_filename: String,
    pub binlog_position: u32,
    /// table id -> latest table map, superseded on re-announcement
    pub table_maps: HashMap<u64, TableMap>,
    pub columns: SchemaAttrs,
}

impl Default for ServerContext {
    fn default() -> Self {
        ServerContext {
            version: String::new(),
            capability_flags: CapabilityFlags::empty(),
            status_flags: StatusFlags::empty(),
            binlog_version: 4,
            post_header_lengths: Vec::new(),
            crc32_enabled: false,
            binlog_filename: String::new(),
            binlog_position: 0,
            table_maps: HashMap::new(),
            columns: SchemaAttrs::new(),
        }
    }
}

impl ServerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// record the server version and derive the CRC32 flag from it
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
        if self.compare_version("5.6.0") != Ordering::Less {
            self.crc32_enabled = true;
        }
    }

    /// trailing bytes of every event that belong to the checksum
    pub fn crc_size(&self) -> usize {
        if self.crc32_enabled {
            4
        } else {
            0
        }
    }

    /// component-wise integer comparison of dotted versions; trailing
    /// tags like "-log" are ignored
    pub fn compare_version(&self, other: &str) -> Ordering {
        let mine: Vec<i64> = self.version.split('.').map(version_component).collect();
        let theirs: Vec<i64> = other.split('.').map(version_component).collect();
        for (a, b) in mine.iter().zip(theirs.iter()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }

    /// post-header length for an event type code; the table starts at
    /// code 1 (start-event-v3)
    pub fn post_header_length(&self, type_code: u8) -> Option<u8> {
        if type_code == 0 {
            return None;
        }
        self.post_header_lengths.get(type_code as usize - 1).copied()
    }
}

fn version_component(comp: &str) -> i64 {
    comp.trim_matches(|c: char| !c.is_ascii_digit())
        .parse()
        .unwrap_or(0)
}
