use crate::error::{Error, Needed, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// fallible reads on a `Bytes` cursor
///
/// every method checks the remaining length first and fails with
/// `InputIncomplete` instead of panicking like the `Buf` getters do
pub trait ReadBytesExt {
    fn read_u8(&mut self) -> Result<u8>;

    fn read_le_u16(&mut self) -> Result<u16>;

    fn read_le_u24(&mut self) -> Result<u32>;

    fn read_le_u32(&mut self) -> Result<u32>;

    fn read_le_u48(&mut self) -> Result<u64>;

    fn read_le_u64(&mut self) -> Result<u64>;

    fn read_be_u16(&mut self) -> Result<u16>;

    fn read_be_u24(&mut self) -> Result<u32>;

    fn read_be_u32(&mut self) -> Result<u32>;

    fn read_be_u40(&mut self) -> Result<u64>;

    /// take exactly n bytes off the cursor
    fn read_len(&mut self, n: usize) -> Result<Bytes>;

    /// read up to the first occurrence of b, which is always consumed;
    /// the terminator is included in the result only if keep is set
    fn read_until(&mut self, b: u8, keep: bool) -> Result<Bytes>;

    #[inline]
    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    #[inline]
    fn read_le_i16(&mut self) -> Result<i16> {
        Ok(self.read_le_u16()? as i16)
    }

    /// 3 bytes sign-extended to 32 bits
    #[inline]
    fn read_le_i24(&mut self) -> Result<i32> {
        let n = self.read_le_u24()?;
        Ok(((n << 8) as i32) >> 8)
    }

    #[inline]
    fn read_le_i32(&mut self) -> Result<i32> {
        Ok(self.read_le_u32()? as i32)
    }

    /// 6 bytes sign-extended to 64 bits
    #[inline]
    fn read_le_i48(&mut self) -> Result<i64> {
        let n = self.read_le_u48()?;
        Ok(((n << 16) as i64) >> 16)
    }

    #[inline]
    fn read_le_i64(&mut self) -> Result<i64> {
        Ok(self.read_le_u64()? as i64)
    }

    #[inline]
    fn read_le_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_le_u32()?))
    }

    #[inline]
    fn read_le_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_le_u64()?))
    }
}

macro_rules! ensure_remaining {
    ($input:expr, $n:expr) => {
        if $input.remaining() < $n {
            return Err(Error::InputIncomplete(Needed::Size(
                $n - $input.remaining(),
            )));
        }
    };
}

impl ReadBytesExt for Bytes {
    fn read_u8(&mut self) -> Result<u8> {
        ensure_remaining!(self, 1);
        Ok(self.get_u8())
    }

    fn read_le_u16(&mut self) -> Result<u16> {
        ensure_remaining!(self, 2);
        Ok(self.get_u16_le())
    }

    fn read_le_u24(&mut self) -> Result<u32> {
        ensure_remaining!(self, 3);
        let b0 = self.get_u8() as u32;
        let b1 = self.get_u8() as u32;
        let b2 = self.get_u8() as u32;
        Ok(b0 | (b1 << 8) | (b2 << 16))
    }

    fn read_le_u32(&mut self) -> Result<u32> {
        ensure_remaining!(self, 4);
        Ok(self.get_u32_le())
    }

    fn read_le_u48(&mut self) -> Result<u64> {
        ensure_remaining!(self, 6);
        let lo = self.get_u32_le() as u64;
        let hi = self.get_u16_le() as u64;
        Ok(lo | (hi << 32))
    }

    fn read_le_u64(&mut self) -> Result<u64> {
        ensure_remaining!(self, 8);
        Ok(self.get_u64_le())
    }

    fn read_be_u16(&mut self) -> Result<u16> {
        ensure_remaining!(self, 2);
        Ok(self.get_u16())
    }

    fn read_be_u24(&mut self) -> Result<u32> {
        ensure_remaining!(self, 3);
        let b0 = self.get_u8() as u32;
        let b1 = self.get_u8() as u32;
        let b2 = self.get_u8() as u32;
        Ok((b0 << 16) | (b1 << 8) | b2)
    }

    fn read_be_u32(&mut self) -> Result<u32> {
        ensure_remaining!(self, 4);
        Ok(self.get_u32())
    }

    fn read_be_u40(&mut self) -> Result<u64> {
        ensure_remaining!(self, 5);
        let hi = self.get_u8() as u64;
        let lo = self.get_u32() as u64;
        Ok((hi << 32) | lo)
    }

    fn read_len(&mut self, n: usize) -> Result<Bytes> {
        ensure_remaining!(self, n);
        Ok(self.split_to(n))
    }

    fn read_until(&mut self, b: u8, keep: bool) -> Result<Bytes> {
        match self.iter().position(|&c| c == b) {
            Some(pos) => {
                let out = if keep {
                    self.split_to(pos + 1)
                } else {
                    let out = self.split_to(pos);
                    self.advance(1);
                    out
                };
                Ok(out)
            }
            None => Err(Error::InputIncomplete(Needed::Unknown)),
        }
    }
}

/// infallible-in-practice writes on a growable output buffer
pub trait WriteBytesExt {
    fn write_u8(&mut self, n: u8) -> Result<usize>;

    fn write_le_u16(&mut self, n: u16) -> Result<usize>;

    fn write_le_u24(&mut self, n: u32) -> Result<usize>;

    fn write_le_u32(&mut self, n: u32) -> Result<usize>;

    fn write_le_u48(&mut self, n: u64) -> Result<usize>;

    fn write_le_u64(&mut self, n: u64) -> Result<usize>;

    fn write_bytes(&mut self, bs: &[u8]) -> Result<usize>;
}

impl WriteBytesExt for BytesMut {
    fn write_u8(&mut self, n: u8) -> Result<usize> {
        self.put_u8(n);
        Ok(1)
    }

    fn write_le_u16(&mut self, n: u16) -> Result<usize> {
        self.put_u16_le(n);
        Ok(2)
    }

    fn write_le_u24(&mut self, n: u32) -> Result<usize> {
        debug_assert!(n <= 0xff_ffff);
        self.put_slice(&n.to_le_bytes()[..3]);
        Ok(3)
    }

    fn write_le_u32(&mut self, n: u32) -> Result<usize> {
        self.put_u32_le(n);
        Ok(4)
    }

    fn write_le_u48(&mut self, n: u64) -> Result<usize> {
        debug_assert!(n <= 0xffff_ffff_ffff);
        self.put_slice(&n.to_le_bytes()[..6]);
        Ok(6)
    }

    fn write_le_u64(&mut self, n: u64) -> Result<usize> {
        self.put_u64_le(n);
        Ok(8)
    }

    fn write_bytes(&mut self, bs: &[u8]) -> Result<usize> {
        self.put_slice(bs);
        Ok(bs.len())
    }
}
