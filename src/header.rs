//! EXI Header Decoding (EXI §5, 5.1, 5.2, 5.3).
//!
//! Der EXI Header hat folgende Struktur:
//! - [EXI Cookie] (optional): `$EXI` als 4 ASCII-Bytes (EXI §5.1)
//! - Distinguishing Bits: `10` (EXI §5.2)
//! - Presence Bit: 1 = Options-Dokument folgt (EXI §5)
//! - EXI Format Version: Preview-Bit + 4-Bit-Chunks (EXI §5.3)
//! - [Padding Bits]: bei byte-alignment (EXI §5)
//!
//! Das Options-Dokument selbst liest [`crate::options_codec`]; Padding
//! folgt erst danach und haengt vom decodierten Alignment ab.
//!
//! # Beispiel
//!
//! ```
//! use eximl::bitstream::BitReader;
//! use eximl::header;
//!
//! let mut reader = BitReader::new(&[0x80]);
//! let header = header::decode(&mut reader, false).unwrap();
//! assert!(!header.cookie());
//! assert_eq!(header.version(), 1);
//! ```

use crate::bitstream::BitReader;
use crate::{Error, Result};

/// EXI Cookie als ASCII-Bytes: "$EXI"
const EXI_COOKIE: [u8; 4] = *b"$EXI";

/// Distinguishing Bits: `10` (EXI §5.2)
const DISTINGUISHING_BITS: u8 = 0b10;

/// Decoded EXI header (EXI §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExiHeader {
    cookie: bool,
    options_present: bool,
    version: u16,
}

impl ExiHeader {
    /// EXI Cookie vorhanden (EXI §5.1).
    pub fn cookie(&self) -> bool {
        self.cookie
    }

    /// Presence Bit: ein Options-Dokument folgt dem Header (EXI §5.4).
    pub fn options_present(&self) -> bool {
        self.options_present
    }

    /// Format-Versionsnummer, ab 1 (EXI §5.3).
    pub fn version(&self) -> u16 {
        self.version
    }
}

/// Decodiert den EXI Header (EXI §5).
///
/// `needs_padding`: Padding-Bits bis zur Bytegrenze ueberspringen
/// (byte-alignment). Folgt ein Options-Dokument, `false` uebergeben und
/// nach den Options padden.
///
/// # Errors
///
/// - [`Error::InvalidDistinguishingBits`] wenn die Bits nicht `10` sind
/// - [`Error::UnsupportedVersion`] fuer Preview- oder Nicht-1-Versionen
/// - [`Error::PrematureEndOfStream`] bei unerwartetem Stream-Ende
pub fn decode(reader: &mut BitReader, needs_padding: bool) -> Result<ExiHeader> {
    let cookie = try_decode_cookie(reader)?;

    let dist_bits = reader.read_bits(2)? as u8;
    if dist_bits != DISTINGUISHING_BITS {
        return Err(Error::InvalidDistinguishingBits(dist_bits));
    }

    let options_present = reader.read_bit()?;

    let (preview, version) = decode_version(reader)?;
    if preview || version != 1 {
        return Err(Error::UnsupportedVersion);
    }
    if needs_padding {
        reader.align_to_byte();
    }

    Ok(ExiHeader { cookie, options_present, version })
}

/// Versucht den EXI Cookie zu decodieren (EXI §5.1).
///
/// Ohne Cookie bleibt der Reader unveraendert. Beginnt der Stream mit `$`
/// und endet vor dem vierten Byte, ist das ein abgeschnittener Cookie.
fn try_decode_cookie(reader: &mut BitReader) -> Result<bool> {
    let cp = reader.save_checkpoint();
    let mut bytes = [0u8; 4];
    for (i, byte) in bytes.iter_mut().enumerate() {
        match reader.read_bits(8) {
            Ok(b) => *byte = b as u8,
            Err(e) => {
                if i > 0 && bytes[0] == EXI_COOKIE[0] {
                    return Err(e);
                }
                reader.restore_checkpoint(cp);
                return Ok(false);
            }
        }
    }
    if bytes == EXI_COOKIE {
        Ok(true)
    } else {
        reader.restore_checkpoint(cp);
        Ok(false)
    }
}

/// Decodiert die EXI Format Version (EXI §5.3).
///
/// 4-Bit-Chunks werden summiert, 15 signalisiert Fortsetzung.
fn decode_version(reader: &mut BitReader) -> Result<(bool, u16)> {
    let preview = reader.read_bit()?;
    let mut version: u16 = 1;
    loop {
        let chunk = reader.read_bits(4)? as u16;
        version = version.saturating_add(chunk);
        if chunk <= 14 {
            break;
        }
    }
    Ok((preview, version))
}
