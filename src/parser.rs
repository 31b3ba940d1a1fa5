//! Entry points: a complete EXI stream in memory → tree.
//!
//! Ablauf wie bei jedem Decoder-Lauf: Init → Header → Schema → Body. Jeder
//! Fehler wird einmal mit der Phase geloggt und als [`Error::Parse`]
//! zurueckgegeben; ein halb gebautes Dokument verlaesst die Funktion nie.

use log::{debug, error};

use crate::builder::{BuilderState, TreeBuilder};
use crate::decoder::{ContentHandler, Decoder, Progress};
use crate::error::Phase;
use crate::options::{ExiOptions, SchemaId};
use crate::sink::TreeSink;
use crate::tree::Document;
use crate::{Error, Result};

/// Decodes a schema-less EXI stream with default options.
///
/// # Errors
///
/// [`Error::Parse`] naming the failing phase.
pub fn parse(data: &[u8]) -> Result<Document> {
    parse_with_options(data, ExiOptions::default())
}

/// Decodes a schema-less EXI stream with out-of-band options.
pub fn parse_with_options(data: &[u8], options: ExiOptions) -> Result<Document> {
    parse_into(data, options, Document::new())
}

/// Decodes into any [`TreeSink`] and returns it once the document is complete.
pub fn parse_into<S: TreeSink>(data: &[u8], options: ExiOptions, sink: S) -> Result<S> {
    let mut builder = TreeBuilder::new(sink);
    match drive(data, options, &mut builder) {
        Ok(()) => builder.finish().map_err(|e| failed(Phase::Body, e)),
        Err((phase, e)) => {
            if phase == Phase::Body && builder.state() != BuilderState::Aborted {
                // Fehler aus dem Builder selbst: der Decoder meldet ihn nicht
                builder.fatal_error(&e);
            }
            builder.abort();
            Err(failed(phase, e))
        }
    }
}

fn drive<S: TreeSink>(
    data: &[u8],
    options: ExiOptions,
    builder: &mut TreeBuilder<S>,
) -> std::result::Result<(), (Phase, Error)> {
    let mut decoder = Decoder::new(data, options).map_err(|e| (Phase::Init, e))?;
    decoder.parse_header().map_err(|e| (Phase::Header, e))?;
    // schemaId aus den Options, sonst schema-los
    let schema = decoder.options().schema_id().cloned().unwrap_or(SchemaId::None);
    decoder.set_schema(schema).map_err(|e| (Phase::Schema, e))?;
    debug!("decoding EXI body ({} bytes)", data.len());
    loop {
        match decoder.parse_next(builder) {
            Ok(Progress::Continue) => {}
            Ok(Progress::Complete) => return Ok(()),
            Err(e) => return Err((Phase::Body, e)),
        }
    }
}

fn failed(phase: Phase, source: Error) -> Error {
    error!("Failed to parse EXI {phase}: {source}");
    Error::Parse { phase, source: Box::new(source) }
}
