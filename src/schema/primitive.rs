//! Little-endian unsigned/signed integers, fixed-length blobs, and
//! null-padded fixed-length UTF-8 strings — the leaf primitives every
//! structure's `FromCursor`/`ToBytes` impl is built from.

use super::cursor::Cursor;
use crate::error::{ReconError, Result};

macro_rules! le_int_reader {
    ($name:ident, $ty:ty, $n:expr) => {
        pub fn $name(cur: &mut Cursor, path: &str) -> Result<$ty> {
            let bytes = cur.take($n).map_err(|_| {
                ReconError::parse(path, cur.tell(), format!("short read for {}", stringify!($ty)))
            })?;
            let arr: [u8; $n] = bytes.try_into().expect("take() returned exact length");
            Ok(<$ty>::from_le_bytes(arr))
        }
    };
}

le_int_reader!(read_u8, u8, 1);
le_int_reader!(read_u16_le, u16, 2);
le_int_reader!(read_u32_le, u32, 4);
le_int_reader!(read_u64_le, u64, 8);
le_int_reader!(read_i64_le, i64, 8);

pub fn write_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

pub fn write_u16_le(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn write_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn write_u64_le(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn write_i64_le(out: &mut Vec<u8>, v: i64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Fixed-length byte blob.
pub fn read_bytes<'a>(cur: &mut Cursor<'a>, path: &str, n: usize) -> Result<&'a [u8]> {
    cur.take(n)
        .map_err(|_| ReconError::parse(path, cur.tell(), format!("short read for {n}-byte blob")))
}

pub fn read_array<const N: usize>(cur: &mut Cursor, path: &str) -> Result<[u8; N]> {
    let bytes = read_bytes(cur, path, N)?;
    Ok(bytes.try_into().expect("read_bytes returned exact length"))
}

pub fn write_array<const N: usize>(out: &mut Vec<u8>, arr: &[u8; N]) {
    out.extend_from_slice(arr);
}

/// Fixed-length, null-padded UTF-8 string (as used by `label`).
pub fn read_fixed_str(cur: &mut Cursor, path: &str, n: usize) -> Result<String> {
    let bytes = read_bytes(cur, path, n)?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end])
        .map(|s| s.to_string())
        .map_err(|e| ReconError::parse(path, cur.tell() as u64, format!("invalid utf8: {e}")))
}

/// Writes `s` into a fixed-width, null-padded field of `n` bytes.
pub fn write_fixed_str(out: &mut Vec<u8>, s: &str, n: usize) {
    let bytes = s.as_bytes();
    let take = bytes.len().min(n);
    out.extend_from_slice(&bytes[..take]);
    out.resize(out.len() + (n - take), 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_u64() {
        let mut buf = Vec::new();
        write_u64_le(&mut buf, 0x1122_3344_5566_7788);
        let mut cur = Cursor::new(&buf);
        assert_eq!(read_u64_le(&mut cur, "x").unwrap(), 0x1122_3344_5566_7788);
    }

    #[test]
    fn fixed_str_strips_padding() {
        let mut buf = vec![b'h', b'i', 0, 0, 0];
        buf.resize(5, 0);
        let mut cur = Cursor::new(&buf);
        assert_eq!(read_fixed_str(&mut cur, "label", 5).unwrap(), "hi");
    }

    #[test]
    fn short_read_errors() {
        let buf = [0u8; 3];
        let mut cur = Cursor::new(&buf);
        assert!(read_u64_le(&mut cur, "x").is_err());
    }
}
