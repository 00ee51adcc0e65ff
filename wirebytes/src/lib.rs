//! essential byte-cursor parsing for the MySQL wire protocol
//!
//! all multi-byte integers are little-endian unless the method name
//! says otherwise; the big-endian readers exist for the few binlog
//! encodings (timestamp2, datetime2, decimal fragments) that flip
//! byte order.
pub mod buf;
pub mod error;
pub mod my;

pub use buf::{ReadBytesExt, WriteBytesExt};
pub use error::{Error, Needed, Result};
pub use my::{LenEncInt, LenEncStr, ReadMyEnc};

use bytes::{Bytes, BytesMut};

/// read an object from a byte cursor
pub trait ReadFromBytes: Sized {
    fn read_from(input: &mut Bytes) -> Result<Self>;
}

/// read an object that needs external context, e.g. capability flags
pub trait ReadFromBytesWithContext<'c>: Sized {
    type Context: 'c;

    fn read_with_ctx(input: &mut Bytes, ctx: Self::Context) -> Result<Self>;
}

/// write an object to an output buffer, returning the number of bytes written
pub trait WriteToBytes {
    fn write_to(self, out: &mut BytesMut) -> Result<usize>;
}

impl WriteToBytes for Bytes {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let len = self.len();
        out.extend_from_slice(&self);
        Ok(len)
    }
}
