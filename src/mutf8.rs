//! Codec for HotSpot's Modified UTF-8 symbol encoding.
//!
//! Identical to the standard `DataInput` UTF-8 serialization minus the
//! 2-byte length prefix: 1-byte ASCII excluding NUL, an overlong 2-byte
//! form for NUL and U+0080-U+07FF, a 3-byte form for U+0800-U+FFFF (and,
//! as in CESU-8, for each half of a UTF-16 surrogate pair representing a
//! supplementary character). 4-byte sequences are never produced and are
//! rejected on decode.

use crate::error::{HprofRedactError, Result};

/// Decodes a Modified UTF-8 byte sequence.
///
/// A stray `0x00` byte (not the overlong `0xC0 0x80` HotSpot actually
/// writes for NUL) is tolerated and decodes to U+0000; this is purely
/// defensive, since HotSpot never emits a bare NUL.
pub fn decode(bytes: &[u8]) -> Result<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b0 = bytes[i];
        if b0 == 0x00 {
            units.push(0);
            i += 1;
        } else if b0 & 0x80 == 0 {
            units.push(b0 as u16);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = continuation_byte(bytes, i + 1)?;
            let cp = (((b0 & 0x1F) as u16) << 6) | (b1 as u16);
            units.push(cp);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = continuation_byte(bytes, i + 1)?;
            let b2 = continuation_byte(bytes, i + 2)?;
            let cp = (((b0 & 0x0F) as u16) << 12) | ((b1 as u16) << 6) | (b2 as u16);
            units.push(cp);
            i += 3;
        } else {
            // Either a lone continuation byte or a 4+-byte lead: both rejected.
            return Err(invalid_encoding());
        }
    }

    char::decode_utf16(units.into_iter())
        .collect::<std::result::Result<String, _>>()
        .map_err(|_| HprofRedactError::InvalidMutf8("lone surrogate code unit".to_string()))
}

fn continuation_byte(bytes: &[u8], idx: usize) -> Result<u8> {
    let b = *bytes.get(idx).ok_or_else(invalid_encoding)?;
    if b & 0xC0 != 0x80 {
        return Err(invalid_encoding());
    }
    Ok(b & 0x3F)
}

fn invalid_encoding() -> HprofRedactError {
    HprofRedactError::InvalidMutf8("truncated or mis-tagged continuation byte".to_string())
}

/// Encodes a string to Modified UTF-8.
///
/// Takes a fast path when every character is in U+0001-U+007F, the
/// common case for class/field/method symbols.
pub fn encode(s: &str) -> Vec<u8> {
    if s.chars().all(|c| matches!(c as u32, 0x01..=0x7F)) {
        return s.as_bytes().to_vec();
    }

    let mut out = Vec::with_capacity(s.len() + 4);
    for c in s.chars() {
        let cp = c as u32;
        if matches!(cp, 0x01..=0x7F) {
            out.push(cp as u8);
        } else if cp == 0 || matches!(cp, 0x80..=0x7FF) {
            push_2_byte(&mut out, cp as u16);
        } else if cp <= 0xFFFF {
            push_3_byte(&mut out, cp as u16);
        } else {
            // Supplementary character: split into a UTF-16 surrogate pair and
            // encode each half as its own (otherwise-invalid-standalone) 3-byte form.
            let v = cp - 0x10000;
            let hi = 0xD800 + (v >> 10);
            let lo = 0xDC00 + (v & 0x3FF);
            push_3_byte(&mut out, hi as u16);
            push_3_byte(&mut out, lo as u16);
        }
    }
    out
}

fn push_2_byte(out: &mut Vec<u8>, cp: u16) {
    out.push(0xC0 | ((cp >> 6) as u8));
    out.push(0x80 | ((cp & 0x3F) as u8));
}

fn push_3_byte(out: &mut Vec<u8>, cp: u16) {
    out.push(0xE0 | ((cp >> 12) as u8));
    out.push(0x80 | (((cp >> 6) & 0x3F) as u8));
    out.push(0x80 | ((cp & 0x3F) as u8));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips_on_fast_path() {
        let encoded = encode("MyClass");
        assert_eq!(encoded, b"MyClass");
        assert_eq!(decode(&encoded).unwrap(), "MyClass");
    }

    #[test]
    fn nul_uses_overlong_two_byte_form() {
        let encoded = encode("\u{0}");
        assert_eq!(encoded, vec![0xC0, 0x80]);
        assert_eq!(decode(&encoded).unwrap(), "\u{0}");
    }

    #[test]
    fn stray_nul_byte_is_tolerated_on_decode() {
        assert_eq!(decode(&[0x00]).unwrap(), "\u{0}");
    }

    #[test]
    fn three_byte_range_round_trips() {
        // U+0800-U+FFFF, e.g. a CJK character.
        let s = "\u{4E2D}";
        let encoded = encode(s);
        assert_eq!(encoded.len(), 3);
        assert_eq!(decode(&encoded).unwrap(), s);
    }

    #[test]
    fn standard_utf8_of_cafe_is_valid_mutf8_and_round_trips() {
        // "Caf\xC3\xA9" is standard UTF-8 for "Café", which happens to also
        // be valid MUTF-8 since all code points are below U+0800.
        let bytes = "Caf\u{e9}".as_bytes();
        let decoded = decode(bytes).unwrap();
        assert_eq!(decoded, "Caf\u{e9}");
        assert_eq!(encode(&decoded).len(), bytes.len());
    }

    #[test]
    fn supplementary_character_round_trips_via_surrogate_pair() {
        let s = "\u{1F600}"; // outside the BMP
        let encoded = encode(s);
        assert_eq!(encoded.len(), 6); // two 3-byte halves
        assert_eq!(decode(&encoded).unwrap(), s);
    }

    #[test]
    fn four_byte_lead_byte_is_rejected() {
        let bytes = [0xF0, 0x9F, 0x98, 0x80];
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn truncated_continuation_is_rejected() {
        assert!(decode(&[0xC2]).is_err());
        assert!(decode(&[0xE4, 0xB8]).is_err());
    }

    #[test]
    fn mis_tagged_continuation_is_rejected() {
        assert!(decode(&[0xC2, 0x00]).is_err());
    }
}
