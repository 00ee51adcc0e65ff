//! binary DECIMAL decoding
//!
//! integer and fractional digits are packed separately into big-endian
//! groups of 9 decimal digits (4 bytes each); a leftover group takes
//! 1..4 bytes according to `DIG_TO_BYTES`. the high bit of the first
//! byte is the sign (set = non-negative); a negative value stores the
//! complement of every byte.
use bytes::{Buf, Bytes, BytesMut};
use wirebytes::{Error, ReadBytesExt, Result, WriteBytesExt};
use std::fmt;

const DIG_PER_GROUP: u8 = 9;
const DIG_TO_BYTES: [usize; 10] = [0, 1, 1, 2, 2, 3, 3, 4, 4, 4];

#[derive(Debug, Clone, PartialEq)]
pub struct MyDecimal {
    // digit count before the point (precision - scale)
    pub intg: u8,
    // digit count after the point
    pub frac: u8,
    pub negative: bool,
    // exactly intg / frac chars, zero padded
    int_digits: String,
    frac_digits: String,
}

impl MyDecimal {
    pub fn zero(intg: u8, frac: u8) -> Self {
        MyDecimal {
            intg,
            frac,
            negative: false,
            int_digits: "0".repeat(intg as usize),
            frac_digits: "0".repeat(frac as usize),
        }
    }

    /// parse a plain decimal string into a value of the given precision
    /// and scale, zero-padding both sides
    pub fn parse(s: &str, precision: u8, scale: u8) -> Result<Self> {
        let intg = precision - scale;
        let (negative, s) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (int_part, frac_part) = match s.find('.') {
            Some(pos) => (&s[..pos], &s[pos + 1..]),
            None => (s, ""),
        };
        if int_part.len() > intg as usize || frac_part.len() > scale as usize {
            return Err(Error::ConstraintError(format!(
                "decimal {} does not fit precision {} scale {}",
                s, precision, scale
            )));
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(Error::ConstraintError(format!("invalid decimal {}", s)));
        }
        let mut int_digits = "0".repeat(intg as usize - int_part.len());
        int_digits.push_str(int_part);
        let mut frac_digits = String::from(frac_part);
        frac_digits.push_str(&"0".repeat(scale as usize - frac_part.len()));
        let all_zero =
            int_digits.bytes().all(|b| b == b'0') && frac_digits.bytes().all(|b| b == b'0');
        Ok(MyDecimal {
            intg,
            frac: scale,
            negative: negative && !all_zero,
            int_digits,
            frac_digits,
        })
    }

    /// decode a value with intg digits before the point and frac after
    pub fn read_from(input: &mut Bytes, intg: u8, frac: u8) -> Result<Self> {
        if !input.has_remaining() {
            return Ok(Self::zero(intg, frac));
        }
        // non-negative values store the sign bit set
        let negative = input[0] & 0x80 != 0x80;
        let mut first = true;
        let mut int_digits = String::with_capacity(intg as usize);
        let mut frac_digits = String::with_capacity(frac as usize);
        let intg0x = intg % DIG_PER_GROUP;
        let frac0x = frac % DIG_PER_GROUP;
        if intg0x > 0 {
            let v = read_group(input, DIG_TO_BYTES[intg0x as usize], negative, &mut first)?;
            push_digits(&mut int_digits, v, intg0x as usize);
        }
        for _ in 0..intg / DIG_PER_GROUP {
            let v = read_group(input, 4, negative, &mut first)?;
            push_digits(&mut int_digits, v, DIG_PER_GROUP as usize);
        }
        for _ in 0..frac / DIG_PER_GROUP {
            let v = read_group(input, 4, negative, &mut first)?;
            push_digits(&mut frac_digits, v, DIG_PER_GROUP as usize);
        }
        if frac0x > 0 {
            let v = read_group(input, DIG_TO_BYTES[frac0x as usize], negative, &mut first)?;
            push_digits(&mut frac_digits, v, frac0x as usize);
        }
        Ok(MyDecimal {
            intg,
            frac,
            negative,
            int_digits,
            frac_digits,
        })
    }

    pub fn write_to(&self, out: &mut BytesMut) -> Result<usize> {
        let start = out.len();
        let intg0x = self.intg % DIG_PER_GROUP;
        let frac0x = self.frac % DIG_PER_GROUP;
        let mut int_iter = self.int_digits.as_str();
        if intg0x > 0 {
            let (head, rest) = int_iter.split_at(intg0x as usize);
            write_group(out, head, DIG_TO_BYTES[intg0x as usize])?;
            int_iter = rest;
        }
        while !int_iter.is_empty() {
            let (head, rest) = int_iter.split_at(DIG_PER_GROUP as usize);
            write_group(out, head, 4)?;
            int_iter = rest;
        }
        let mut frac_iter = self.frac_digits.as_str();
        for _ in 0..self.frac / DIG_PER_GROUP {
            let (head, rest) = frac_iter.split_at(DIG_PER_GROUP as usize);
            write_group(out, head, 4)?;
            frac_iter = rest;
        }
        if frac0x > 0 {
            write_group(out, frac_iter, DIG_TO_BYTES[frac0x as usize])?;
        }
        // sign bit lives in the very first byte
        out[start] |= 0x80;
        if self.negative {
            for b in &mut out[start..] {
                *b = !*b;
            }
        }
        Ok(out.len() - start)
    }
}

fn read_group(input: &mut Bytes, n: usize, negative: bool, first: &mut bool) -> Result<u32> {
    let mut buf = [0u8; 4];
    let bs = input.read_len(n)?;
    buf[4 - n..].copy_from_slice(&bs);
    if negative {
        for b in &mut buf[4 - n..] {
            *b = !*b;
        }
    }
    if *first {
        buf[4 - n] &= 0x7f;
        *first = false;
    }
    Ok(u32::from_be_bytes(buf))
}

fn write_group(out: &mut BytesMut, digits: &str, n: usize) -> Result<usize> {
    // digit substrings are at most 9 chars, checked at construction
    let v: u32 = digits.parse().map_err(|_| {
        Error::ConstraintError(format!("invalid decimal digit group {:?}", digits))
    })?;
    out.write_bytes(&v.to_be_bytes()[4 - n..])
}

fn push_digits(out: &mut String, v: u32, width: usize) {
    out.push_str(&format!("{:0width$}", v, width = width));
}

impl fmt::Display for MyDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int_zero = self.int_digits.bytes().all(|b| b == b'0');
        let frac_zero = self.frac_digits.bytes().all(|b| b == b'0');
        if int_zero && frac_zero {
            return write!(f, "0");
        }
        if self.negative {
            write!(f, "-")?;
        }
        if frac_zero {
            return write!(f, "{}", self.int_digits.trim_start_matches('0'));
        }
        if int_zero {
            return write!(f, "0.{}", self.frac_digits.trim_end_matches('0'));
        }
        write!(
            f,
            "{}.{}",
            self.int_digits.trim_start_matches('0'),
            self.frac_digits.trim_end_matches('0')
        )
    }
}
