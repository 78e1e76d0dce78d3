//! Compact length codec.
//!
//! Lengths and counts in the message format are written with a shortened
//! variable-width prefix:
//!
//! ```text
//!   0x00..=0xfc      1 byte, the value itself
//!   0xfd..=0xffff    0xfd, then the value as a little-endian u16
//! ```
//!
//! The `0xfe` (u32) and `0xff` (u64) prefixes are not part of the
//! transaction format. Encoding anything above `0xffff` fails, and decoding
//! either prefix fails, instead of guessing a wider layout.

use crate::error::{TxError, TxResult};

/// Largest value representable in a single byte.
const SINGLE_BYTE_MAX: usize = 0xfc;

/// Prefix byte announcing a little-endian u16.
const U16_PREFIX: u8 = 0xfd;

/// Largest length the format can carry.
pub const MAX_COMPACT_LENGTH: usize = 0xffff;

/// Encode `n` as a compact length.
pub fn encode_length(n: usize) -> TxResult<Vec<u8>> {
    let mut out = Vec::with_capacity(3);
    write_length(&mut out, n)?;
    Ok(out)
}

/// Append the compact encoding of `n` to `buf`.
pub fn write_length(buf: &mut Vec<u8>, n: usize) -> TxResult<()> {
    if n <= SINGLE_BYTE_MAX {
        buf.push(n as u8);
    } else if n <= MAX_COMPACT_LENGTH {
        buf.push(U16_PREFIX);
        buf.extend_from_slice(&(n as u16).to_le_bytes());
    } else {
        return Err(TxError::EncodingError(format!(
            "length {n} exceeds compact maximum {MAX_COMPACT_LENGTH:#x}"
        )));
    }
    Ok(())
}

/// Number of bytes [`encode_length`] produces for `n`.
pub fn encoded_len(n: usize) -> TxResult<usize> {
    match n {
        0..=SINGLE_BYTE_MAX => Ok(1),
        _ if n <= MAX_COMPACT_LENGTH => Ok(3),
        _ => Err(TxError::EncodingError(format!(
            "length {n} exceeds compact maximum {MAX_COMPACT_LENGTH:#x}"
        ))),
    }
}

/// Decode a compact length from the front of `data`.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode_length(data: &[u8]) -> TxResult<(usize, usize)> {
    let first = *data.first().ok_or_else(|| {
        TxError::MalformedInput("unexpected end of data while decoding compact length".into())
    })?;

    match first {
        0..=0xfc => Ok((first as usize, 1)),
        U16_PREFIX => {
            let bytes: [u8; 2] = data
                .get(1..3)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(|| {
                    TxError::MalformedInput(format!(
                        "compact length prefix 0xfd needs 2 more bytes, {} available",
                        data.len() - 1
                    ))
                })?;
            let value = u16::from_le_bytes(bytes) as usize;
            if value <= SINGLE_BYTE_MAX {
                return Err(TxError::MalformedInput(format!(
                    "non-canonical compact length: {value} encoded with 0xfd prefix"
                )));
            }
            Ok((value, 3))
        }
        prefix => Err(TxError::EncodingError(format!(
            "unsupported compact length prefix {prefix:#04x}"
        ))),
    }
}

/// Append a compact-length-prefixed byte string.
pub fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> TxResult<()> {
    write_length(buf, bytes.len())?;
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Cursor over a byte slice used by the deserializers.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn read_u8(&mut self, what: &str) -> TxResult<u8> {
        Ok(self.read_slice(1, what)?[0])
    }

    pub(crate) fn read_length(&mut self) -> TxResult<usize> {
        let (value, consumed) = decode_length(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    pub(crate) fn read_slice(&mut self, len: usize, what: &str) -> TxResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(TxError::MalformedInput(format!(
                "{what}: need {len} bytes at offset {}, {} available",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub(crate) fn read_array<const N: usize>(&mut self, what: &str) -> TxResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N, what)?);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- encoding -----------------------------------------------------------

    #[test]
    fn encode_zero() {
        assert_eq!(encode_length(0).unwrap(), vec![0x00]);
    }

    #[test]
    fn encode_single_byte_max() {
        assert_eq!(encode_length(0xfc).unwrap(), vec![0xfc]);
    }

    #[test]
    fn encode_first_two_byte_value() {
        // 0xfd itself no longer fits in one byte.
        assert_eq!(encode_length(0xfd).unwrap(), vec![0xfd, 0xfd, 0x00]);
    }

    #[test]
    fn encode_u16_little_endian() {
        assert_eq!(encode_length(0x1234).unwrap(), vec![0xfd, 0x34, 0x12]);
    }

    #[test]
    fn encode_max_value() {
        assert_eq!(encode_length(0xffff).unwrap(), vec![0xfd, 0xff, 0xff]);
    }

    #[test]
    fn encode_above_u16_fails() {
        let err = encode_length(0x1_0000).unwrap_err();
        assert!(matches!(err, TxError::EncodingError(_)));
    }

    #[test]
    fn encoded_len_matches_encode() {
        for n in [0usize, 1, 0x7f, 0x80, 0xfc, 0xfd, 0x100, 0xffff] {
            assert_eq!(encoded_len(n).unwrap(), encode_length(n).unwrap().len());
        }
        assert!(encoded_len(0x1_0000).is_err());
    }

    // -- decoding -----------------------------------------------------------

    #[test]
    fn round_trip_full_range() {
        for n in 0..=MAX_COMPACT_LENGTH {
            let encoded = encode_length(n).unwrap();
            assert_eq!(
                decode_length(&encoded).unwrap(),
                (n, encoded.len()),
                "round trip failed for {n}"
            );
        }
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        assert_eq!(decode_length(&[0x03, 0xaa, 0xbb]).unwrap(), (3, 1));
        assert_eq!(decode_length(&[0xfd, 0x00, 0x01, 0xaa]).unwrap(), (256, 3));
    }

    #[test]
    fn decode_empty_input_fails() {
        assert!(matches!(
            decode_length(&[]).unwrap_err(),
            TxError::MalformedInput(_)
        ));
    }

    #[test]
    fn decode_truncated_u16_fails() {
        assert!(matches!(
            decode_length(&[0xfd]).unwrap_err(),
            TxError::MalformedInput(_)
        ));
        assert!(matches!(
            decode_length(&[0xfd, 0x01]).unwrap_err(),
            TxError::MalformedInput(_)
        ));
    }

    #[test]
    fn decode_non_canonical_fails() {
        assert!(matches!(
            decode_length(&[0xfd, 0x05, 0x00]).unwrap_err(),
            TxError::MalformedInput(_)
        ));
    }

    #[test]
    fn decode_wide_prefixes_unsupported() {
        for prefix in [0xfe, 0xff] {
            let err = decode_length(&[prefix, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
            assert!(matches!(err, TxError::EncodingError(_)));
        }
    }

    // -- helpers ------------------------------------------------------------

    #[test]
    fn write_bytes_prefixes_length() {
        let mut buf = Vec::new();
        write_bytes(&mut buf, &[9, 8, 7]).unwrap();
        assert_eq!(buf, vec![3, 9, 8, 7]);
    }

    #[test]
    fn reader_reports_short_reads() {
        let mut reader = Reader::new(&[1, 2]);
        assert_eq!(reader.read_u8("first").unwrap(), 1);
        let err = reader.read_slice(4, "payload").unwrap_err();
        assert!(err.to_string().contains("payload"));
        assert_eq!(reader.remaining(), 1);
    }
}
