use crate::buf::{ReadBytesExt, WriteBytesExt};
use crate::error::{Error, Needed, Result};
use crate::{ReadFromBytes, WriteToBytes};
use bytes::{Buf, Bytes, BytesMut};

/// read MySQL length-encoded types
pub trait ReadMyEnc {
    fn read_len_enc_int(&mut self) -> Result<LenEncInt>;

    fn read_len_enc_str(&mut self) -> Result<LenEncStr>;
}

impl ReadMyEnc for Bytes {
    fn read_len_enc_int(&mut self) -> Result<LenEncInt> {
        let len = self.read_u8()?;
        match len {
            0xfb => Ok(LenEncInt::Null),
            0xfc => {
                let n = self.read_le_u16()?;
                Ok(LenEncInt::Len3(n))
            }
            0xfd => {
                let n = self.read_le_u24()?;
                Ok(LenEncInt::Len4(n))
            }
            // 8-byte form; the pre-3.22 4-byte form is not supported
            0xfe => {
                let n = self.read_le_u64()?;
                Ok(LenEncInt::Len9(n))
            }
            0xff => Ok(LenEncInt::Err),
            _ => Ok(LenEncInt::Len1(len)),
        }
    }

    fn read_len_enc_str(&mut self) -> Result<LenEncStr> {
        let lei = self.read_len_enc_int()?;
        match lei {
            LenEncInt::Err => Ok(LenEncStr::Err),
            LenEncInt::Null => Ok(LenEncStr::Null),
            _ => {
                // length variants always carry a value
                let len = lei.to_u64().unwrap() as usize;
                if self.remaining() < len {
                    return Err(Error::InputIncomplete(Needed::Size(
                        len - self.remaining(),
                    )));
                }
                Ok(LenEncStr::Bytes(self.split_to(len)))
            }
        }
    }
}

/// MySQL length-encoded integer
///
/// the 0xfb and 0xff lead bytes are not integers at all: 0xfb marks SQL
/// NULL and 0xff marks the start of an error packet. both are surfaced
/// as their own variants so the caller can re-dispatch instead of
/// unwinding across the protocol decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum LenEncInt {
    Null,
    Err,
    Len1(u8),
    Len3(u16),
    Len4(u32),
    Len9(u64),
}

impl LenEncInt {
    pub fn to_u64(&self) -> Option<u64> {
        match self {
            LenEncInt::Len1(n) => Some(*n as u64),
            LenEncInt::Len3(n) => Some(*n as u64),
            LenEncInt::Len4(n) => Some(*n as u64),
            LenEncInt::Len9(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_u32(&self) -> Option<u32> {
        self.to_u64().map(|n| n as u32)
    }
}

impl ReadFromBytes for LenEncInt {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        input.read_len_enc_int()
    }
}

impl WriteToBytes for LenEncInt {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let len = match self {
            LenEncInt::Null => {
                out.write_u8(0xfb)?;
                1
            }
            LenEncInt::Err => {
                out.write_u8(0xff)?;
                1
            }
            LenEncInt::Len1(n) => {
                out.write_u8(n)?;
                1
            }
            LenEncInt::Len3(n) => {
                out.write_u8(0xfc)?;
                out.write_le_u16(n)?;
                3
            }
            LenEncInt::Len4(n) => {
                out.write_u8(0xfd)?;
                out.write_le_u24(n)?;
                4
            }
            LenEncInt::Len9(n) => {
                out.write_u8(0xfe)?;
                out.write_le_u64(n)?;
                9
            }
        };
        Ok(len)
    }
}

impl From<u64> for LenEncInt {
    fn from(src: u64) -> Self {
        if src < 0xfb {
            LenEncInt::Len1(src as u8)
        } else if src <= 0xffff {
            LenEncInt::Len3(src as u16)
        } else if src <= 0xff_ffff {
            LenEncInt::Len4(src as u32)
        } else {
            LenEncInt::Len9(src)
        }
    }
}

impl From<u32> for LenEncInt {
    fn from(src: u32) -> Self {
        Self::from(src as u64)
    }
}

#[derive(Debug, Clone)]
pub enum LenEncStr {
    Null,
    Err,
    Bytes(Bytes),
}

impl LenEncStr {
    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bs) => Some(bs),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Self::Bytes(bs) => Some(bs),
            _ => None,
        }
    }

    /// convert into owned string, empty string if null or err
    pub fn into_string(self) -> std::result::Result<String, std::string::FromUtf8Error> {
        match self {
            Self::Bytes(bs) => String::from_utf8(Vec::from(bs.as_ref())),
            _ => Ok(String::new()),
        }
    }
}

impl ReadFromBytes for LenEncStr {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        input.read_len_enc_str()
    }
}

impl WriteToBytes for LenEncStr {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let len = match self {
            LenEncStr::Null => {
                out.write_u8(0xfb)?;
                1
            }
            LenEncStr::Err => {
                out.write_u8(0xff)?;
                1
            }
            LenEncStr::Bytes(bs) => {
                let blen = bs.len();
                let lei_len = LenEncInt::from(blen as u64).write_to(out)?;
                out.write_bytes(&bs)?;
                lei_len + blen
            }
        };
        Ok(len)
    }
}
