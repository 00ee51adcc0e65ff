use crate::config::BinlogPosition;

/// persistence for resumable replication
///
/// `persist` may be called after every fully dispatched event;
/// `restore` is consulted once at the start of a session.
pub trait Storage {
    fn persist(&mut self, filename: &str, position: u32);

    fn restore(&self) -> Option<BinlogPosition>;
}

/// keeps the position in memory only; useful for tests and for
/// embedders that do not need resumption
#[derive(Debug, Default)]
pub struct MemoryStorage {
    saved: Option<BinlogPosition>,
}

impl Storage for MemoryStorage {
    fn persist(&mut self, filename: &str, position: u32) {
        self.saved = Some(BinlogPosition {
            filename: filename.to_owned(),
            position,
        });
    }

    fn restore(&self) -> Option<BinlogPosition> {
        self.saved.clone()
    }
}
