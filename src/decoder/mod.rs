//! Schema-less EXI body decoder – EXI §4, 5, 6, 8.4
//!
//! Pull-Decoder ueber einen vollstaendig im Speicher liegenden Stream. Jeder
//! Aufruf von [`Decoder::parse_next`] decodiert genau ein Event und ruft den
//! passenden Callback des [`ContentHandler`] auf.
//!
//! # Beispiel
//!
//! ```
//! use eximl::decoder::{ContentHandler, Decoder, Progress};
//! use eximl::options::{ExiOptions, SchemaId};
//! use eximl::qname::QName;
//!
//! #[derive(Default)]
//! struct Names(Vec<String>);
//!
//! impl ContentHandler for Names {
//!     fn start_element(&mut self, qname: &QName) -> eximl::Result<()> {
//!         self.0.push(qname.to_string());
//!         Ok(())
//!     }
//! }
//!
//! // Header 0x80, dann <a/>: URI-Hit "" (01), Laenge 1+1, 'a', EE (00)
//! let stream = [0x80, 0b0100_0000, 0b1001_1000, 0b0100_0000];
//! let mut decoder = Decoder::new(&stream, ExiOptions::default()).unwrap();
//! decoder.parse_header().unwrap();
//! decoder.set_schema(SchemaId::None).unwrap();
//! let mut names = Names::default();
//! while decoder.parse_next(&mut names).unwrap() == Progress::Continue {}
//! assert_eq!(names.0, ["a"]);
//! ```

mod handler;
mod qname;
mod value;
pub use handler::{ContentHandler, NamespaceDeclaration};

use log::{debug, trace};

use crate::bitstream::BitReader;
use crate::grammar::{self, ElementGrammar, Matched, NonTerminal, Production};
use crate::header::{self, ExiHeader};
use crate::options::{ExiOptions, SchemaId};
use crate::qname::QName;
use crate::string_table::{NameKey, StringTable};
use crate::{Error, FastHashMap, Result, options_codec, unsigned_integer};

/// Outcome of one [`Decoder::parse_next`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// An event was decoded; more follow.
    Continue,
    /// ED was decoded. Unique success terminal.
    Complete,
}

/// Position des Decoders im Stream-Lebenszyklus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Created,
    HeaderRead,
    /// Schema gebunden, SD steht aus.
    Ready,
    /// DocContent: SE(*) des Wurzelelements steht aus.
    DocContent,
    /// Mindestens ein Element offen.
    Elements,
    /// DocEnd: ED steht aus.
    DocEnd,
    Complete,
    Failed,
}

/// Offenes Element mit seiner aktuellen Grammar-Position.
struct OpenElement {
    key: NameKey,
    nt: NonTerminal,
}

/// Fehlerquelle eines Schritts: nur Decoder-Fehler gehen an `fatal_error`.
enum Failure {
    Decode(Error),
    Handler(Error),
}

impl From<Error> for Failure {
    fn from(e: Error) -> Self {
        Self::Decode(e)
    }
}

#[inline]
fn emit(result: Result<()>) -> std::result::Result<(), Failure> {
    result.map_err(Failure::Handler)
}

/// Schema-less EXI decoder over an in-memory buffer.
pub struct Decoder<'a> {
    reader: BitReader<'a>,
    options: ExiOptions,
    table: StringTable,
    /// Built-in Element-Grammatiken, eine pro expandiertem Namen (EXI §8.4.3).
    grammars: FastHashMap<NameKey, ElementGrammar>,
    stack: Vec<OpenElement>,
    stage: Stage,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over the complete EXI stream.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyStream`] when `data` holds no bytes.
    pub fn new(data: &'a [u8], options: ExiOptions) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::EmptyStream);
        }
        let table = StringTable::new(options.value_max_length(), options.value_partition_capacity());
        Ok(Self {
            reader: BitReader::new(data),
            options,
            table,
            grammars: FastHashMap::default(),
            stack: Vec::new(),
            stage: Stage::Created,
        })
    }

    /// Decodes the EXI header (EXI §5) and the options document it may carry.
    ///
    /// Options aus dem Header ersetzen die out-of-band uebergebenen.
    pub fn parse_header(&mut self) -> Result<ExiHeader> {
        self.expect_stage(Stage::Created, "parse_header")?;
        let header = header::decode(&mut self.reader, false)?;
        debug!(
            "EXI header decoded: cookie={} options={} version={}",
            header.cookie(),
            header.options_present(),
            header.version()
        );
        if header.options_present() {
            self.options = options_codec::decode(&mut self.reader)?;
            self.table = StringTable::new(
                self.options.value_max_length(),
                self.options.value_partition_capacity(),
            );
        }
        // Padding erst nach dem Options-Dokument (EXI §5)
        if self.options.byte_aligned() {
            self.reader.align_to_byte();
        }
        self.stage = Stage::HeaderRead;
        Ok(header)
    }

    /// Options in effect: out-of-band ones, or those read from the header.
    pub fn options(&self) -> &ExiOptions {
        &self.options
    }

    /// Binds the schema for the body. Only schema-less decoding is supported.
    pub fn set_schema(&mut self, schema: SchemaId) -> Result<()> {
        self.expect_stage(Stage::HeaderRead, "set_schema")?;
        if let SchemaId::Id(id) = schema {
            return Err(Error::UnsupportedSchema(id));
        }
        debug!("schema-less decoding ({schema:?})");
        self.stage = Stage::Ready;
        Ok(())
    }

    /// Decodes one event and hands it to `handler`.
    ///
    /// Decoding faults are reported to [`ContentHandler::fatal_error`] and
    /// returned; errors returned by a callback are returned unchanged. After
    /// any failure the decoder refuses further calls.
    pub fn parse_next(&mut self, handler: &mut impl ContentHandler) -> Result<Progress> {
        match self.stage {
            Stage::Complete => return Ok(Progress::Complete),
            Stage::Created | Stage::HeaderRead | Stage::Failed => {
                return Err(Error::ordering_violation(
                    "header and schema before body",
                    format!("parse_next in stage {:?}", self.stage),
                ));
            }
            _ => {}
        }
        match self.step(handler) {
            Ok(progress) => Ok(progress),
            Err(Failure::Decode(e)) => {
                self.stage = Stage::Failed;
                handler.fatal_error(&e);
                Err(e)
            }
            Err(Failure::Handler(e)) => {
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }

    /// Depth of currently open elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn expect_stage(&self, expected: Stage, call: &'static str) -> Result<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(Error::ordering_violation(format!("{expected:?}"), format!("{call} in stage {:?}", self.stage)))
        }
    }

    fn step(&mut self, handler: &mut impl ContentHandler) -> std::result::Result<Progress, Failure> {
        let byte_aligned = self.options.byte_aligned();
        match self.stage {
            Stage::Ready => {
                grammar::read_document_event(&mut self.reader, byte_aligned)?;
                trace!("SD");
                self.stage = Stage::DocContent;
                emit(handler.start_document())?;
            }
            Stage::DocContent => {
                grammar::read_document_event(&mut self.reader, byte_aligned)?;
                let (qname, key) = self.decode_qname()?;
                self.stage = Stage::Elements;
                self.open_element(handler, &qname, key)?;
            }
            Stage::Elements => self.step_element(handler)?,
            Stage::DocEnd => {
                grammar::read_document_event(&mut self.reader, byte_aligned)?;
                trace!("ED");
                self.stage = Stage::Complete;
                emit(handler.end_document())?;
                return Ok(Progress::Complete);
            }
            Stage::Created | Stage::HeaderRead | Stage::Complete | Stage::Failed => {
                return Err(Failure::Decode(Error::ordering_violation("body stage", format!("{:?}", self.stage))));
            }
        }
        Ok(Progress::Continue)
    }

    fn step_element(&mut self, handler: &mut impl ContentHandler) -> std::result::Result<(), Failure> {
        let Some(top) = self.stack.last() else {
            return Err(Failure::Decode(Error::invalid_event_code("", "no open element")));
        };
        let (key, nt) = (top.key, top.nt);
        let Matched { production, multi_part } = self.grammars.entry(key).or_default().read_event(
            &mut self.reader,
            nt,
            self.options.preserve_prefixes(),
            self.options.byte_aligned(),
        )?;

        match production {
            Production::EndElement => {
                if multi_part && nt == NonTerminal::StartTagContent {
                    self.learn(key, nt, Production::EndElement);
                }
                trace!("EE");
                self.stack.pop();
                if self.stack.is_empty() {
                    self.stage = Stage::DocEnd;
                }
                emit(handler.end_element())?;
            }
            Production::AttributeAny => {
                let (qname, at_key) = self.decode_qname()?;
                self.learn(key, NonTerminal::StartTagContent, Production::Attribute(qname.clone(), at_key));
                self.attribute(handler, &qname, at_key)?;
            }
            Production::Attribute(qname, at_key) => {
                let qname = self.with_decoded_prefix(&qname, at_key)?;
                self.attribute(handler, &qname, at_key)?;
            }
            Production::NamespaceDeclaration => {
                let ns = self.decode_namespace_declaration()?;
                trace!("NS {}={}", ns.prefix, ns.uri);
                emit(handler.namespace_declaration(&ns))?;
            }
            Production::StartElementAny => {
                let (qname, child_key) = self.decode_qname()?;
                self.learn(key, nt, Production::StartElement(qname.clone(), child_key));
                self.enter_content();
                self.open_element(handler, &qname, child_key)?;
            }
            Production::StartElement(qname, child_key) => {
                let qname = self.with_decoded_prefix(&qname, child_key)?;
                self.enter_content();
                self.open_element(handler, &qname, child_key)?;
            }
            Production::Characters => {
                if multi_part {
                    self.learn(key, nt, Production::Characters);
                }
                let value = self.decode_value(key)?;
                trace!("CH {:?}", &*value);
                self.enter_content();
                emit(handler.string_data(&value))?;
            }
        }
        Ok(())
    }

    fn open_element(
        &mut self,
        handler: &mut impl ContentHandler,
        qname: &QName,
        key: NameKey,
    ) -> std::result::Result<(), Failure> {
        trace!("SE {qname}");
        self.stack.try_reserve(1).map_err(Error::from)?;
        self.stack.push(OpenElement { key, nt: NonTerminal::StartTagContent });
        emit(handler.start_element(qname))
    }

    fn attribute(
        &mut self,
        handler: &mut impl ContentHandler,
        qname: &QName,
        key: NameKey,
    ) -> std::result::Result<(), Failure> {
        let (value, type_ns) = self.decode_attribute_value(qname, key)?;
        if let Some(ns) = type_ns {
            trace!("NS {}={} (xsi:type)", ns.prefix, ns.uri);
            emit(handler.namespace_declaration(&ns))?;
        }
        trace!("AT {qname}={:?}", &*value);
        emit(handler.attribute(qname))?;
        emit(handler.string_data(&value))
    }

    /// Aktuelles Element wechselt nach SE/CH in ElementContent.
    fn enter_content(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            top.nt = NonTerminal::ElementContent;
        }
    }

    fn learn(&mut self, key: NameKey, nt: NonTerminal, production: Production) {
        self.grammars.entry(key).or_default().learn(nt, production);
    }

    /// Liest n-Bit Unsigned Integer unter Beachtung des Alignments.
    fn decode_n_bit(&mut self, n: u8) -> Result<u64> {
        unsigned_integer::decode_n_bit(&mut self.reader, n, self.options.byte_aligned())
    }
}
