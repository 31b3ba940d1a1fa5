//! eximl – schema-less EXI 1.0 streams to XML document trees
//!
//! Ein Pull-Decoder liefert Events an den [`TreeBuilder`](builder::TreeBuilder),
//! der Start-Tags zurueckhaelt bis alle Attribute bekannt sind und daraus
//! Notifications fuer eine [`TreeSink`] macht. Die Standard-Sink ist das
//! Arena-Dokument [`Document`].
//!
//! # Beispiel
//!
//! ```
//! // Header 0x80, dann <a/> bit-packed
//! let stream = [0x80, 0b0100_0000, 0b1001_1000, 0b0100_0000];
//! let doc = eximl::parse(&stream).unwrap();
//! let root = doc.root_element().unwrap();
//! assert_eq!(doc.local_name(root), Some("a"));
//! assert_eq!(doc.to_xml().unwrap(), "<a/>");
//! ```

pub mod bit_width;
pub mod bitstream;
pub mod builder;
pub mod decoder;
pub mod error;
pub mod grammar;
pub mod header;
pub mod options;
pub mod options_codec;
pub mod parser;
pub mod qname;
pub mod sink;
pub mod string;
pub mod string_table;
pub mod tree;
pub mod typed_value;
pub mod unsigned_integer;

pub use error::{Error, Inconsistency, Phase, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent — für interne Datenstrukturen).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// IndexSet mit ahash (stabile Ids in Einfuegereihenfolge).
pub(crate) type FastIndexSet<K> = indexmap::IndexSet<K, ahash::RandomState>;

// Public API: Entry Points
pub use parser::{parse, parse_into, parse_with_options};

// Public API: Options
pub use options::{Alignment, ExiOptions, SchemaId};

// Public API: Header
pub use header::ExiHeader;

// Public API: Builder, Decoder, Sink
pub use builder::{BuilderState, StartTag, TreeBuilder};
pub use decoder::{ContentHandler, Decoder, NamespaceDeclaration, Progress};
pub use sink::{AttributeRef, NameRef, NamespaceRef, TreeSink};

// Public API: Types
pub use qname::QName;
pub use tree::{Children, Document, NodeId, NodeKind};
pub use typed_value::{DateTime, DateTimeKind, Decimal, Float};
