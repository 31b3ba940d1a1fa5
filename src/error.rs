//! Central error types for the EXI decoder and the tree builder.
//!
//! Decoder variants reference the relevant W3C EXI 1.0 Second Edition section.
//! Builder variants describe violations of the event ordering contract.

use core::fmt;
use std::borrow::Cow;

/// Lifecycle phase of a parse, used to tag failures at the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Decoder and stream window construction.
    Init,
    /// EXI header (cookie, distinguishing bits, version).
    Header,
    /// Schema binding.
    Schema,
    /// Body events up to ED.
    Body,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::Header => "header",
            Self::Schema => "schema",
            Self::Body => "body",
        })
    }
}

/// Why the builder rejected an event (inconsistent processing state).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Inconsistency {
    /// End-element with an empty element stack.
    UnmatchedEndElement,
    /// Attribute event outside a pending start tag.
    AttributeOutsideStartTag,
    /// A second value for an attribute that already has one.
    DuplicateValue,
    /// Event not allowed in the current builder state.
    UnexpectedEvent {
        event: &'static str,
        state: &'static str,
    },
    /// Event after a fatal error was reported.
    Aborted,
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedEndElement => write!(f, "end element without open element"),
            Self::AttributeOutsideStartTag => write!(f, "attribute outside of a start tag"),
            Self::DuplicateValue => write!(f, "attribute value already assigned"),
            Self::UnexpectedEvent { event, state } => {
                write!(f, "{event} not allowed in state {state}")
            }
            Self::Aborted => write!(f, "builder aborted after fatal error"),
        }
    }
}

/// All error kinds produced while decoding an EXI stream into a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The input buffer holds no bytes.
    EmptyStream,
    /// EXI version number is not supported (EXI §5.3).
    UnsupportedVersion,
    /// The EXI distinguishing bits are not `10` (EXI §5.2).
    InvalidDistinguishingBits(u8),
    /// An EXI option outside the schema-less subset was requested (EXI §5.4).
    UnsupportedOption(&'static str),
    /// Schema-informed decoding was requested (EXI §8.5).
    UnsupportedSchema(String),
    /// The EXI stream ended before a complete structure was decoded (EXI §6).
    PrematureEndOfStream,
    /// An event code does not match any production in the current grammar (EXI §6.1, 6.2).
    InvalidEventCode {
        /// Der Event Code der nicht passte.
        event_code: Cow<'static, str>,
        /// Der Grammar-Zustand in dem der Fehler auftrat.
        grammar_state: Cow<'static, str>,
    },
    /// An integer value exceeds the representable range (EXI §7.1.5, 7.1.6).
    IntegerOverflow,
    /// A Unicode code point is invalid: surrogate (U+D800..U+DFFF) or > U+10FFFF (EXI §7.1.10).
    InvalidCodePoint(u64),
    /// A compact identifier is invalid or was evicted (EXI §7.3).
    InvalidCompactId(usize),
    /// Decoder API called out of order (header, schema, body).
    OrderingViolation {
        expected: Cow<'static, str>,
        found: Cow<'static, str>,
    },
    /// Builder received an event inconsistent with its processing state.
    Inconsistent(Inconsistency),
    /// Event kind the builder does not support (binary content).
    NotImplemented(&'static str),
    /// A frame or attribute array could not be allocated.
    OutOfMemory,
    /// The downstream tree sink rejected a notification.
    Sink(String),
    /// Writing serialised XML failed.
    IoError(String),
    /// A parse failed in the given phase.
    Parse { phase: Phase, source: Box<Error> },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyStream => write!(f, "empty EXI stream"),
            Self::UnsupportedVersion => write!(f, "unsupported EXI version (EXI §5.3)"),
            Self::InvalidDistinguishingBits(bits) => {
                write!(f, "invalid distinguishing bits {bits:02b}, expected 10 (EXI §5.2)")
            }
            Self::UnsupportedOption(name) => {
                write!(f, "EXI option '{name}' is not supported (EXI §5.4)")
            }
            Self::UnsupportedSchema(id) => {
                write!(f, "schema-informed decoding not supported, schemaId '{id}' (EXI §8.5)")
            }
            Self::PrematureEndOfStream => write!(f, "premature end of EXI stream (EXI §6)"),
            Self::InvalidEventCode { event_code, grammar_state } => {
                if grammar_state.is_empty() {
                    write!(f, "invalid event code '{event_code}' (EXI §6.1, 6.2)")
                } else {
                    write!(f, "invalid event code '{event_code}' in state '{grammar_state}' (EXI §6.1, 6.2)")
                }
            }
            Self::IntegerOverflow => write!(f, "integer overflow (EXI §7.1.5, 7.1.6)"),
            Self::InvalidCodePoint(cp) => write!(f, "invalid Unicode code point U+{cp:X} (EXI §7.1.10)"),
            Self::InvalidCompactId(id) => write!(f, "invalid or evicted compact identifier {id} (EXI §7.3)"),
            Self::OrderingViolation { expected, found } => {
                write!(f, "call ordering violation: expected '{expected}', found '{found}'")
            }
            Self::Inconsistent(reason) => write!(f, "inconsistent processing state: {reason}"),
            Self::NotImplemented(what) => write!(f, "not implemented: {what}"),
            Self::OutOfMemory => write!(f, "out of memory while building tree"),
            Self::Sink(msg) => write!(f, "tree sink error: {msg}"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
            Self::Parse { phase, source } => write!(f, "{phase} phase failed: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<Inconsistency> for Error {
    fn from(reason: Inconsistency) -> Self {
        Self::Inconsistent(reason)
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

impl Error {
    /// Erstellt einen `InvalidEventCode` Fehler mit Kontext.
    pub fn invalid_event_code(event_code: impl Into<Cow<'static, str>>, grammar_state: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidEventCode {
            event_code: event_code.into(),
            grammar_state: grammar_state.into(),
        }
    }

    /// Erstellt einen `OrderingViolation` Fehler mit Kontext.
    pub fn ordering_violation(expected: impl Into<Cow<'static, str>>, found: impl Into<Cow<'static, str>>) -> Self {
        Self::OrderingViolation {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Kurzform fuer `UnexpectedEvent`.
    pub fn unexpected(event: &'static str, state: &'static str) -> Self {
        Self::Inconsistent(Inconsistency::UnexpectedEvent { event, state })
    }

    /// Phase in der ein `Parse`-Fehler auftrat.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Parse { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Innerster Fehler (ohne `Parse`-Huelle).
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Parse { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
