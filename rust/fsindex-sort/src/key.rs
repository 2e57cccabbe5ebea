//! Scratch entry encoding.
//!
//! A (key, value) pair is flattened into a single byte string whose byte-wise
//! order equals the (key, value) lexicographic order:
//!
//! ```text
//! escaped(key) 0x00 0x00 presence [value]
//! ```
//!
//! Inside the key, `0x00` is written as `0x00 0xFF`, so the `0x00 0x00`
//! terminator sorts below any continuation of the key. `presence` is `0` for a
//! missing value and `1` when value bytes follow.

use fsindex_common::{Result, error::Error};

const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xFF;
const TERMINATOR: u8 = 0x00;

pub fn encode_entry(key: &[u8], value: Option<&[u8]>) -> Vec<u8> {
    let mut buf =
        Vec::with_capacity(key.len() + 3 + value.map(<[u8]>::len).unwrap_or_default());
    for &b in key {
        buf.push(b);
        if b == ESCAPE {
            buf.push(ESCAPED_ZERO);
        }
    }
    buf.push(ESCAPE);
    buf.push(TERMINATOR);
    match value {
        Some(value) => {
            buf.push(1);
            buf.extend_from_slice(value);
        }
        None => buf.push(0),
    }
    buf
}

/// Splits an encoded entry back into its key and optional value.
pub fn decode_entry(entry: &[u8]) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
    let mut key = Vec::with_capacity(entry.len());
    let mut pos = 0;
    loop {
        let Some(&b) = entry.get(pos) else {
            return Err(Error::invalid_format("scratch entry", "unterminated key"));
        };
        pos += 1;
        if b != ESCAPE {
            key.push(b);
            continue;
        }
        match entry.get(pos) {
            Some(&ESCAPED_ZERO) => {
                key.push(0);
                pos += 1;
            }
            Some(&TERMINATOR) => {
                pos += 1;
                break;
            }
            _ => return Err(Error::invalid_format("scratch entry", "bad escape sequence")),
        }
    }
    match entry.get(pos) {
        Some(0) if pos + 1 == entry.len() => Ok((key, None)),
        Some(1) => Ok((key, Some(entry[pos + 1..].to_vec()))),
        _ => Err(Error::invalid_format("scratch entry", "bad value marker")),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_entry, encode_entry};

    #[test]
    fn test_entry_roundtrip_with_zero_bytes() {
        let cases: Vec<(&[u8], Option<&[u8]>)> = vec![
            (&b"cat"[..], Some(&[0u8, 0, 0, 1][..])),
            (&b""[..], None),
            (&b"a\0b"[..], Some(&b""[..])),
            (&b"\0\0"[..], None),
            (&b"dog"[..], Some(&[0xFFu8, 0x00][..])),
        ];
        for (key, value) in cases {
            let encoded = encode_entry(key, value);
            let (k, v) = decode_entry(&encoded).unwrap();
            assert_eq!(k, key);
            assert_eq!(v.as_deref(), value);
        }
    }

    #[test]
    fn test_encoded_order_is_key_major() {
        let mut pairs: Vec<(&[u8], u64)> = vec![
            (&b"b"[..], 1),
            (&b"a\0"[..], 0),
            (&b"a"[..], 9),
            (&b"ab"[..], 3),
            (&b"a"[..], 2),
            (&b""[..], 5),
            (&b"a\x01"[..], 4),
        ];
        let mut encoded: Vec<Vec<u8>> = pairs
            .iter()
            .map(|(k, v)| encode_entry(k, Some(&v.to_be_bytes()[..])))
            .collect();
        encoded.sort();
        pairs.sort();
        let decoded: Vec<(Vec<u8>, u64)> = encoded
            .iter()
            .map(|e| {
                let (k, v) = decode_entry(e).unwrap();
                (k, u64::from_be_bytes(v.unwrap().try_into().unwrap()))
            })
            .collect();
        let expected: Vec<(Vec<u8>, u64)> = pairs.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_entry(b"abc").is_err());
        assert!(decode_entry(&[b'a', 0, 7]).is_err());
        assert!(decode_entry(&[b'a', 0, 0]).is_err());
        assert!(decode_entry(&[b'a', 0, 0, 0, 9]).is_err());
    }
}
