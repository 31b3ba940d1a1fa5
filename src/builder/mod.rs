//! Event-driven tree builder.
//!
//! [`TreeBuilder`] implements [`ContentHandler`] and turns the decoder's
//! event stream into [`TreeSink`] notifications. The start tag of an element
//! is deferred until its attributes are complete: attributes arrive as
//! separate events after the start-element event, the sink wants them in a
//! single `start_element` call. The deferred start is flushed by the next
//! child start-element, by the matching end-element or by the first event
//! that is neither an attribute nor an attribute value.
//!
//! ```text
//!                 start_document           start_element
//!   NoDocument ─────────────────▶ DocumentRoot ─────────▶ ElementOpen(Deferred)
//!       ▲                              ▲                     │        ▲
//!       │ end_document                 │ end_element     attribute   value
//!       └──────────────────────────────┤  (stack empty)      ▼        │
//!                                      │                  AttributeOpen
//!                                      └── ElementOpen(Emitted) ◀── flush
//! ```
//!
//! Frames live in owned stacks; [`TreeBuilder::abort`] and `Drop` release
//! whatever a failed parse left on them.

mod frame;

use log::{debug, trace};

use crate::decoder::{ContentHandler, NamespaceDeclaration};
use crate::error::Inconsistency;
use crate::qname::QName;
use crate::sink::{AttributeRef, NamespaceRef, TreeSink};
use crate::typed_value::{DateTime, Decimal, Float};
use crate::{Error, Result};
use frame::{AttributeFrame, ElementFrame, NamespaceFrame, QualifiedName};

/// Whether the start tag of the innermost open element reached the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartTag {
    /// Attributes may still follow; nothing was sent downstream yet.
    Deferred,
    /// Flushed; the element accepts children and text.
    Emitted,
}

/// What the builder expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    NoDocument,
    /// Document open, no element pending (before the root or after it closed).
    DocumentRoot,
    ElementOpen(StartTag),
    /// Attribute name pushed, value awaited.
    AttributeOpen,
    /// A fatal error was reported; terminal.
    Aborted,
}

impl BuilderState {
    pub fn name(self) -> &'static str {
        match self {
            Self::NoDocument => "NoDocument",
            Self::DocumentRoot => "DocumentRoot",
            Self::ElementOpen(StartTag::Deferred) => "ElementOpen(Deferred)",
            Self::ElementOpen(StartTag::Emitted) => "ElementOpen(Emitted)",
            Self::AttributeOpen => "AttributeOpen",
            Self::Aborted => "Aborted",
        }
    }

    fn start_deferred(self) -> bool {
        matches!(self, Self::ElementOpen(StartTag::Deferred) | Self::AttributeOpen)
    }
}

/// Builds a tree in a [`TreeSink`] from decoder callbacks.
pub struct TreeBuilder<S: TreeSink> {
    sink: S,
    state: BuilderState,
    elements: Vec<ElementFrame>,
    /// Attribute des noch nicht gemeldeten Start-Tags, in Deklarationsreihenfolge.
    attributes: Vec<AttributeFrame>,
    namespaces: Vec<NamespaceFrame>,
}

impl<S: TreeSink> TreeBuilder<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: BuilderState::NoDocument,
            elements: Vec::new(),
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Number of open elements.
    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    /// Attributes buffered for the deferred start tag.
    pub fn pending_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Emits the deferred start tag with its attributes and namespace
    /// declarations. No-op when no start tag is pending.
    pub fn flush(&mut self) -> Result<()> {
        if !self.state.start_deferred() {
            return Ok(());
        }
        let Some(element) = self.elements.last() else {
            return Err(Error::unexpected("flush", self.state.name()));
        };

        let mut attributes: Vec<AttributeRef<'_>> = Vec::new();
        attributes.try_reserve_exact(self.attributes.len())?;
        attributes.extend(self.attributes.iter().map(AttributeFrame::as_attribute_ref));
        let mut namespaces: Vec<NamespaceRef<'_>> = Vec::new();
        namespaces.try_reserve_exact(self.namespaces.len())?;
        namespaces.extend(self.namespaces.iter().map(NamespaceFrame::as_namespace_ref));

        let name = element.name.as_name_ref();
        debug!("flush <{}> with {} attribute(s)", name.local_name, attributes.len());
        let result = self.sink.start_element(&name, &namespaces, &attributes, 0);

        drop(attributes);
        drop(namespaces);
        self.attributes.clear();
        self.namespaces.clear();
        self.state = BuilderState::ElementOpen(StartTag::Emitted);
        result
    }

    /// Releases every frame and enters [`BuilderState::Aborted`].
    pub fn abort(&mut self) {
        if self.state != BuilderState::Aborted {
            debug!(
                "builder aborted with {} open element(s), {} pending attribute(s)",
                self.elements.len(),
                self.attributes.len()
            );
        }
        self.elements = Vec::new();
        self.attributes = Vec::new();
        self.namespaces = Vec::new();
        self.state = BuilderState::Aborted;
    }

    /// Returns the sink once the document is complete.
    pub fn finish(self) -> Result<S> {
        if self.state != BuilderState::NoDocument || !self.elements.is_empty() {
            return Err(Error::unexpected("finish", self.state.name()));
        }
        Ok(self.sink)
    }

    /// Returns the sink regardless of the builder state.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn check_live(&self) -> Result<()> {
        if self.state == BuilderState::Aborted {
            return Err(Inconsistency::Aborted.into());
        }
        Ok(())
    }

    fn set_attribute_value(&mut self, value: &str) -> Result<()> {
        let Some(frame) = self.attributes.last_mut() else {
            return Err(Inconsistency::AttributeOutsideStartTag.into());
        };
        if frame.value.is_some() {
            return Err(Inconsistency::DuplicateValue.into());
        }
        let mut owned = String::new();
        owned.try_reserve_exact(value.len())?;
        owned.push_str(value);
        trace!("attribute value {value:?}");
        frame.value = Some(owned);
        self.state = BuilderState::ElementOpen(StartTag::Deferred);
        Ok(())
    }

    fn text(&mut self, value: &str) -> Result<()> {
        match self.state {
            BuilderState::AttributeOpen => self.set_attribute_value(value),
            BuilderState::Aborted => Err(Inconsistency::Aborted.into()),
            // Auch ohne Dokument geht Text an die Sink, die ihn ablehnen kann
            BuilderState::NoDocument | BuilderState::DocumentRoot | BuilderState::ElementOpen(_) => {
                self.flush()?;
                trace!("characters {value:?}");
                self.sink.characters(value)
            }
        }
    }
}

impl<S: TreeSink> ContentHandler for TreeBuilder<S> {
    fn fatal_error(&mut self, error: &Error) {
        self.sink.fatal_error(&error.to_string());
        self.abort();
    }

    fn start_document(&mut self) -> Result<()> {
        self.check_live()?;
        if self.state != BuilderState::NoDocument {
            return Err(Error::unexpected("start-document", self.state.name()));
        }
        trace!("start-document");
        self.sink.start_document()?;
        self.state = BuilderState::DocumentRoot;
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.check_live()?;
        if self.state != BuilderState::DocumentRoot || !self.elements.is_empty() {
            return Err(Error::unexpected("end-document", self.state.name()));
        }
        trace!("end-document");
        self.sink.end_document()?;
        self.state = BuilderState::NoDocument;
        Ok(())
    }

    fn start_element(&mut self, qname: &QName) -> Result<()> {
        self.check_live()?;
        if self.state == BuilderState::NoDocument {
            return Err(Error::unexpected("start-element", self.state.name()));
        }
        self.flush()?;
        let name = QualifiedName::from_qname(qname)?;
        self.elements.try_reserve(1)?;
        trace!("start-element {qname} (depth {})", self.elements.len());
        self.elements.push(ElementFrame { name });
        self.state = BuilderState::ElementOpen(StartTag::Deferred);
        Ok(())
    }

    fn end_element(&mut self) -> Result<()> {
        self.check_live()?;
        self.flush()?;
        let Some(frame) = self.elements.pop() else {
            return Err(Inconsistency::UnmatchedEndElement.into());
        };
        trace!("end-element {}", frame.name.local_name());
        self.state = if self.elements.is_empty() {
            BuilderState::DocumentRoot
        } else {
            BuilderState::ElementOpen(StartTag::Emitted)
        };
        self.sink.end_element(&frame.name.as_name_ref())
    }

    fn attribute(&mut self, qname: &QName) -> Result<()> {
        self.check_live()?;
        // Nur im zurueckgehaltenen Start-Tag und nicht vor dem Value des
        // vorherigen Attributs
        if self.state != BuilderState::ElementOpen(StartTag::Deferred) {
            return Err(Inconsistency::AttributeOutsideStartTag.into());
        }
        let name = QualifiedName::from_qname(qname)?;
        self.attributes.try_reserve(1)?;
        trace!("attribute {qname}");
        self.attributes.push(AttributeFrame { name, value: None });
        self.state = BuilderState::AttributeOpen;
        Ok(())
    }

    fn namespace_declaration(&mut self, ns: &NamespaceDeclaration) -> Result<()> {
        self.check_live()?;
        if self.state != BuilderState::ElementOpen(StartTag::Deferred) {
            return Err(Error::unexpected("namespace-declaration", self.state.name()));
        }
        if ns.local_element_ns {
            if let Some(top) = self.elements.last_mut() {
                top.name = top.name.with_prefix(&ns.prefix)?;
            }
        }
        let prefix = Some(ns.prefix.to_string()).filter(|p| !p.is_empty());
        self.namespaces.try_reserve(1)?;
        self.namespaces.push(NamespaceFrame { prefix, uri: ns.uri.to_string() });
        Ok(())
    }

    fn string_data(&mut self, value: &str) -> Result<()> {
        self.check_live()?;
        self.text(value)
    }

    fn decimal_data(&mut self, value: Decimal) -> Result<()> {
        self.string_data(&value.to_string())
    }

    fn integer_data(&mut self, value: i64) -> Result<()> {
        self.string_data(&value.to_string())
    }

    fn float_data(&mut self, value: Float) -> Result<()> {
        self.string_data(&value.to_string())
    }

    fn boolean_data(&mut self, value: bool) -> Result<()> {
        self.string_data(if value { "true" } else { "false" })
    }

    fn datetime_data(&mut self, value: DateTime) -> Result<()> {
        self.string_data(&value.to_string())
    }

    fn binary_data(&mut self, _value: &[u8]) -> Result<()> {
        Err(Error::NotImplemented("binary data"))
    }
}

#[cfg(test)]
mod tests;
