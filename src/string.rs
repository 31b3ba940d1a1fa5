//! String literals (EXI §7.1.10).
//!
//! Without restricted character sets a string is a sequence of Unicode code
//! points, each an Unsigned Integer. The length usually arrives separately,
//! offset by the string table miss encoding (EXI §7.3.2, 7.3.3).

use crate::bitstream::BitReader;
use crate::{Error, Result, unsigned_integer};

/// Decodes `len` code points into a `String` (EXI §7.1.10).
///
/// Returns [`Error::InvalidCodePoint`] for surrogates and values above U+10FFFF.
pub fn decode_chars(reader: &mut BitReader, len: usize) -> Result<String> {
    // Jeder Code Point belegt mindestens ein Oktett: Laenge gegen Restdaten
    // pruefen, bevor eine boesartige Laenge eine riesige Allokation ausloest.
    if len > reader.remaining_bits() / 8 {
        return Err(Error::PrematureEndOfStream);
    }
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let cp = unsigned_integer::decode(reader)?;
        let ch = u32::try_from(cp)
            .ok()
            .and_then(char::from_u32)
            .ok_or(Error::InvalidCodePoint(cp))?;
        out.push(ch);
    }
    Ok(out)
}

/// Decodes a length-prefixed string (EXI §7.1.10).
pub fn decode(reader: &mut BitReader) -> Result<String> {
    let len = unsigned_integer::decode_usize(reader)?;
    decode_chars(reader, len)
}
