//! EXI options document in the header (EXI §5.4, Appendix C), decoder side.
//!
//! Das Options-Dokument ist ein EXI Body ohne Header, bit-packed und durch
//! das feste Options-Schema aus Appendix C mit `strict=true` informiert.
//! SD, ED und alle EE ohne Alternative kosten 0 Bits:
//! ```text
//! [SD] → SE(header)[1 bit] → Header-Content → [EE(header)] → [ED]
//! ```
//!
//! Gelesen wird die schema-lose Teilmenge. Optionen die eine andere
//! Grammatik oder Kompression verlangen werden mit
//! [`Error::UnsupportedOption`] abgelehnt.

use log::debug;

use crate::bitstream::BitReader;
use crate::options::{Alignment, ExiOptions, SchemaId};
use crate::{Error, Result, string, unsigned_integer};

/// Decodes the options document following a header with presence bit 1.
///
/// # Errors
///
/// - [`Error::UnsupportedOption`] for compression, pre-compression,
///   fragment, selfContained, datatypeRepresentationMap and
///   preserve.{dtd, comments, pis}
/// - [`Error::InvalidEventCode`] for codes outside the options grammar
/// - [`Error::PrematureEndOfStream`] bei unerwartetem Stream-Ende
pub fn decode(reader: &mut BitReader) -> Result<ExiOptions> {
    let mut options = ExiOptions::default();
    // DocContent: SE(header)=0, SE(*)=1
    if code(reader, 1)? != 0 {
        return Err(Error::invalid_event_code("SE(*)", "options/DocContent"));
    }
    decode_header_content(reader, &mut options)?;
    debug!("EXI options from header: {options:?}");
    Ok(options)
}

#[inline]
fn code(reader: &mut BitReader, bits: u8) -> Result<u64> {
    reader.read_bits(bits)
}

/// header: lesscommon?, common?, strict?
fn decode_header_content(reader: &mut BitReader, opts: &mut ExiOptions) -> Result<()> {
    // SE(lesscommon)=0, SE(common)=1, SE(strict)=2, EE=3
    let mut next = code(reader, 2)?;
    if next == 0 {
        decode_lesscommon_content(reader, opts)?;
        // SE(common)=0, SE(strict)=1, EE=2
        next = code(reader, 2)? + 1;
    }
    if next == 1 {
        decode_common_content(reader, opts)?;
        // SE(strict)=0, EE=1
        next = code(reader, 1)? + 2;
    }
    match next {
        2 => {
            // strict wirkt nur auf schema-informed Grammatiken
            debug!("strict option ignored for schema-less decoding");
            Ok(())
        }
        3 => Ok(()),
        _ => Err(Error::invalid_event_code(next.to_string(), "options/header")),
    }
}

/// lesscommon: uncommon?, preserve?, blockSize?
fn decode_lesscommon_content(reader: &mut BitReader, opts: &mut ExiOptions) -> Result<()> {
    // SE(uncommon)=0, SE(preserve)=1, SE(blockSize)=2, EE=3
    let mut next = code(reader, 2)?;
    if next == 0 {
        decode_uncommon_content(reader, opts)?;
        next = code(reader, 2)? + 1;
    }
    if next == 1 {
        decode_preserve_content(reader, opts)?;
        next = code(reader, 1)? + 2;
    }
    match next {
        2 => {
            // blockSize gilt nur mit Kompression
            let block_size = decode_unsigned_int_u32(reader)?;
            debug!("blockSize {block_size} ignored without compression");
            Ok(())
        }
        3 => Ok(()),
        _ => Err(Error::invalid_event_code(next.to_string(), "options/lesscommon")),
    }
}

/// uncommon: alignment?, selfContained?, valueMaxLength?,
/// valuePartitionCapacity?, datatypeRepresentationMap*
///
/// Geordnete Events, Code = Ordinal - erstes noch moegliches Ordinal.
fn decode_uncommon_content(reader: &mut BitReader, opts: &mut ExiOptions) -> Result<()> {
    // (erstes moegliches Ordinal, Bits) je Zustand
    let mut state: (u64, u8) = (0, 3);
    loop {
        let ordinal = code(reader, state.1)? + state.0;
        state = match ordinal {
            0 => {
                opts.alignment = decode_alignment_content(reader)?;
                (1, 3)
            }
            1 => return Err(Error::UnsupportedOption("selfContained")),
            2 => {
                opts.value_max_length = Some(decode_unsigned_int_u32(reader)?);
                (3, 2)
            }
            3 => {
                opts.value_partition_capacity = Some(decode_unsigned_int_u32(reader)?);
                (4, 1)
            }
            4 => return Err(Error::UnsupportedOption("datatypeRepresentationMap")),
            5 => return Ok(()),
            _ => return Err(Error::invalid_event_code(ordinal.to_string(), "options/uncommon")),
        };
    }
}

/// alignment: byte | pre-compress
fn decode_alignment_content(reader: &mut BitReader) -> Result<Alignment> {
    match code(reader, 1)? {
        0 => Ok(Alignment::ByteAlignment),
        _ => Err(Error::UnsupportedOption("pre-compress")),
    }
}

/// preserve: dtd?, prefixes?, lexicalValues?, comments?, pis?
fn decode_preserve_content(reader: &mut BitReader, opts: &mut ExiOptions) -> Result<()> {
    let mut state: (u64, u8) = (0, 3);
    loop {
        let ordinal = code(reader, state.1)? + state.0;
        state = match ordinal {
            0 => return Err(Error::UnsupportedOption("preserve.dtd")),
            1 => {
                opts.preserve_prefixes = true;
                (2, 2)
            }
            2 => {
                // Ohne Schema sind alle Values ohnehin Strings
                debug!("preserve.lexicalValues has no effect without a schema");
                (3, 2)
            }
            3 => return Err(Error::UnsupportedOption("preserve.comments")),
            4 => return Err(Error::UnsupportedOption("preserve.pis")),
            5 => return Ok(()),
            _ => return Err(Error::invalid_event_code(ordinal.to_string(), "options/preserve")),
        };
    }
}

/// common: compression?, fragment?, schemaId?
fn decode_common_content(reader: &mut BitReader, opts: &mut ExiOptions) -> Result<()> {
    // SE(compression)=0, SE(fragment)=1, SE(schemaId)=2, EE=3
    match code(reader, 2)? {
        0 => Err(Error::UnsupportedOption("compression")),
        1 => Err(Error::UnsupportedOption("fragment")),
        2 => {
            opts.schema_id = Some(decode_schema_id_content(reader)?);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// schemaId: CH | AT(xsi:nil) [CH] | EE
///
/// Leerer String heisst BuiltinOnly, `xsi:nil="true"` heisst None.
fn decode_schema_id_content(reader: &mut BitReader) -> Result<SchemaId> {
    // Erste Ebene: CH=0 (1 Bit), dann AT(xsi:nil)=10, EE=11
    if code(reader, 1)? == 0 {
        return decode_schema_id_value(reader);
    }
    if code(reader, 1)? == 1 {
        return Ok(SchemaId::BuiltinOnly);
    }
    let nil = code(reader, 1)? == 1;
    // Nach AT(xsi:nil): CH=0, EE=1
    let has_content = code(reader, 1)? == 0;
    match (nil, has_content) {
        (true, false) => Ok(SchemaId::None),
        (false, true) => decode_schema_id_value(reader),
        (true, true) => Err(Error::invalid_event_code("CH", "options/schemaId nil")),
        (false, false) => Err(Error::invalid_event_code("EE", "options/schemaId")),
    }
}

fn decode_schema_id_value(reader: &mut BitReader) -> Result<SchemaId> {
    // Value-Kodierung: 0/1 waeren String-Table-Hits, die Tabelle ist hier leer
    let indicator = unsigned_integer::decode_usize(reader)?;
    let Some(len) = indicator.checked_sub(2) else {
        return Err(Error::InvalidCompactId(indicator));
    };
    let id = string::decode_chars(reader, len)?;
    Ok(if id.is_empty() { SchemaId::BuiltinOnly } else { SchemaId::Id(id) })
}

fn decode_unsigned_int_u32(reader: &mut BitReader) -> Result<u32> {
    u32::try_from(unsigned_integer::decode(reader)?).map_err(|_| Error::IntegerOverflow)
}
