//! Arena document built from [`TreeSink`] notifications.
//!
//! Knoten liegen in einem `Vec` und werden ueber [`NodeId`] adressiert.
//! Namen, Prefixe und URIs werden einmal interniert; Attribute und
//! Namespace-Deklarationen liegen in eigenen Arenen, jedes Element haelt
//! nur Start und Anzahl.

use std::io::Write;

use log::debug;

use crate::sink::{AttributeRef, NameRef, NamespaceRef, TreeSink};
use crate::string_table::{URI_XML, URI_XSI};
use crate::{Error, FastIndexSet, Result};

/// Index of a node in its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
}

type StrId = u32;

#[derive(Debug, Clone, Copy)]
struct Name {
    local: StrId,
    prefix: Option<StrId>,
    uri: Option<StrId>,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    /// Nur fuer Elemente.
    name: Option<Name>,
    /// Index in `texts`, nur fuer Text-Knoten.
    text: u32,
    attr_start: u32,
    attr_count: u32,
    ns_start: u32,
    ns_count: u32,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
            name: None,
            text: 0,
            attr_start: 0,
            attr_count: 0,
            ns_start: 0,
            ns_count: 0,
        }
    }
}

#[derive(Debug)]
struct AttributeRecord {
    name: Name,
    value: String,
}

#[derive(Debug)]
struct NamespaceRecord {
    prefix: Option<StrId>,
    uri: StrId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Fresh,
    Building,
    Complete,
}

/// In-memory XML document: the handle returned by [`parse`](crate::parse).
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    attributes: Vec<AttributeRecord>,
    namespaces: Vec<NamespaceRecord>,
    texts: Vec<String>,
    strings: FastIndexSet<Box<str>>,
    open: Vec<NodeId>,
    root_element: Option<NodeId>,
    stage: Stage,
    fatal: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn to_u32(n: usize) -> Result<u32> {
    u32::try_from(n).map_err(|_| Error::OutOfMemory)
}

impl Document {
    /// Empty document holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document, None)],
            attributes: Vec::new(),
            namespaces: Vec::new(),
            texts: Vec::new(),
            strings: FastIndexSet::default(),
            open: Vec::new(),
            root_element: None,
            stage: Stage::Fresh,
            fatal: None,
        }
    }

    // === Accessors ===

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_element(&self) -> Option<NodeId> {
        self.root_element
    }

    /// Total number of nodes including the document node.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// `true` once `end_document` was accepted.
    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Complete
    }

    /// Message of the last `fatal_error` notification.
    pub fn fatal_message(&self) -> Option<&str> {
        self.fatal.as_deref()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn str(&self, id: StrId) -> &str {
        self.strings.get_index(id as usize).map_or("", |s| &**s)
    }

    fn name_ref(&self, name: Name) -> NameRef<'_> {
        NameRef {
            local_name: self.str(name.local),
            prefix: name.prefix.map(|p| self.str(p)),
            uri: name.uri.map(|u| self.str(u)),
        }
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children { doc: self, next: self.node(id).and_then(|n| n.first_child) }
    }

    /// Element name; `None` for other node kinds.
    pub fn name(&self, id: NodeId) -> Option<NameRef<'_>> {
        self.node(id)?.name.map(|n| self.name_ref(n))
    }

    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id).map(|n| n.local_name)
    }

    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        self.name(id)?.prefix
    }

    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        self.name(id)?.uri
    }

    /// Attributes of an element in declaration order.
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = AttributeRef<'_>> + '_ {
        let range = self.node(id).map_or(0..0, |n| {
            n.attr_start as usize..(n.attr_start + n.attr_count) as usize
        });
        self.attributes[range]
            .iter()
            .map(|a| AttributeRef { name: self.name_ref(a.name), value: &a.value })
    }

    /// Value of the first attribute with this local name.
    pub fn attribute(&self, id: NodeId, local_name: &str) -> Option<&str> {
        self.attributes(id).find(|a| a.name.local_name == local_name).map(|a| a.value)
    }

    /// Namespace declarations recorded on an element.
    pub fn namespaces(&self, id: NodeId) -> impl Iterator<Item = NamespaceRef<'_>> + '_ {
        let range = self
            .node(id)
            .map_or(0..0, |n| n.ns_start as usize..(n.ns_start + n.ns_count) as usize);
        self.namespaces[range]
            .iter()
            .map(|ns| NamespaceRef { prefix: ns.prefix.map(|p| self.str(p)), uri: self.str(ns.uri) })
    }

    /// Content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        let node = self.node(id)?;
        (node.kind == NodeKind::Text).then(|| self.texts[node.text as usize].as_str())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(text) = self.text(current) {
                out.push_str(text);
            }
            let first = stack.len();
            stack.extend(self.children(current));
            stack[first..].reverse();
        }
        out
    }

    // === Aufbau ===

    fn intern(&mut self, s: &str) -> Result<StrId> {
        if let Some(id) = self.strings.get_index_of(s) {
            return to_u32(id);
        }
        let (id, _) = self.strings.insert_full(s.into());
        to_u32(id)
    }

    fn intern_name(&mut self, name: &NameRef<'_>) -> Result<Name> {
        Ok(Name {
            local: self.intern(name.local_name)?,
            prefix: name.prefix.map(|p| self.intern(p)).transpose()?,
            uri: name.uri.map(|u| self.intern(u)).transpose()?,
        })
    }

    fn push_node(&mut self, node: Node) -> Result<NodeId> {
        self.nodes.try_reserve(1)?;
        let id = NodeId(to_u32(self.nodes.len())?);
        let parent = node.parent;
        self.nodes.push(node);
        if let Some(parent) = parent {
            let p = &mut self.nodes[parent.index()];
            match p.last_child.replace(id) {
                Some(last) => self.nodes[last.index()].next_sibling = Some(id),
                None => p.first_child = Some(id),
            }
        }
        Ok(id)
    }

    fn expect_building(&self, call: &str) -> Result<()> {
        match self.stage {
            Stage::Building => Ok(()),
            Stage::Fresh => Err(Error::Sink(format!("{call} before start_document"))),
            Stage::Complete => Err(Error::Sink(format!("{call} after end_document"))),
        }
    }

    // === Serialisierung ===

    /// Serialises the document as XML (no declaration, no indentation).
    pub fn to_xml(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_xml(&mut buf)?;
        String::from_utf8(buf).map_err(|_| Error::IoError("XML output is not valid UTF-8".into()))
    }

    /// Streams the document as XML into `writer`.
    ///
    /// Namespace declarations are written where the tree needs them: names
    /// with a URI but no usable prefix get the default namespace (elements)
    /// or a generated `nsN` prefix (attributes).
    pub fn write_xml(&self, mut writer: impl Write) -> Result<()> {
        enum Step {
            Open(NodeId),
            Close,
        }
        let mut scope = NamespaceScope::new();
        let mut work: Vec<Step> = Vec::new();
        push_children_rev(&mut work, self.children(self.root()), Step::Open);

        while let Some(step) = work.pop() {
            match step {
                Step::Open(id) => match self.kind(id) {
                    Some(NodeKind::Text) => write_escaped_text(&mut writer, self.text(id).unwrap_or(""))?,
                    Some(NodeKind::Element) => {
                        let empty = self.children(id).next().is_none();
                        self.write_start_tag(&mut writer, id, &mut scope, empty)?;
                        if !empty {
                            work.push(Step::Close);
                            push_children_rev(&mut work, self.children(id), Step::Open);
                        }
                    }
                    _ => {}
                },
                Step::Close => {
                    let tag = scope.leave();
                    w(&mut writer, "</")?;
                    w(&mut writer, &tag)?;
                    w(&mut writer, ">")?;
                }
            }
        }
        writer.flush().map_err(io_err)
    }

    fn write_start_tag(
        &self,
        writer: &mut impl Write,
        id: NodeId,
        scope: &mut NamespaceScope,
        empty: bool,
    ) -> Result<()> {
        let Some(name) = self.name(id) else {
            return Ok(());
        };
        scope.enter();

        // Aufgezeichnete Deklarationen zuerst; Default-Namespace nur wenn er
        // zum Element passt.
        for ns in self.namespaces(id) {
            match ns.prefix {
                Some("xml") => {}
                Some(p) => scope.declare_if_unbound(p, ns.uri),
                None if name.uri == Some(ns.uri) => scope.declare_if_unbound("", ns.uri),
                None => {}
            }
        }

        let tag = scope.element_tag(&name);
        let attrs: Vec<(String, &str)> =
            self.attributes(id).map(|a| (scope.attribute_name(&a.name), a.value)).collect();

        w(writer, "<")?;
        w(writer, &tag)?;
        for (prefix, uri) in scope.declared() {
            if prefix.is_empty() {
                w(writer, " xmlns=\"")?;
            } else {
                w(writer, " xmlns:")?;
                w(writer, prefix)?;
                w(writer, "=\"")?;
            }
            write_escaped_attr(writer, uri)?;
            w(writer, "\"")?;
        }
        for (attr_name, value) in &attrs {
            w(writer, " ")?;
            w(writer, attr_name)?;
            w(writer, "=\"")?;
            write_escaped_attr(writer, value)?;
            w(writer, "\"")?;
        }
        if empty {
            scope.leave();
            w(writer, "/>")
        } else {
            scope.set_tag(tag);
            w(writer, ">")
        }
    }
}

fn push_children_rev<T>(work: &mut Vec<T>, children: Children<'_>, f: impl Fn(NodeId) -> T) {
    let first = work.len();
    work.extend(children.map(f));
    work[first..].reverse();
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.doc.node(id).and_then(|n| n.next_sibling);
        Some(id)
    }
}

impl TreeSink for Document {
    fn start_document(&mut self) -> Result<()> {
        if self.stage != Stage::Fresh {
            return Err(Error::Sink("start_document called twice".into()));
        }
        self.stage = Stage::Building;
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.expect_building("end_document")?;
        if !self.open.is_empty() {
            return Err(Error::Sink(format!("end_document with {} open element(s)", self.open.len())));
        }
        if self.root_element.is_none() {
            return Err(Error::Sink("document without root element".into()));
        }
        debug!("document complete: {} nodes, {} interned names", self.nodes.len(), self.strings.len());
        self.stage = Stage::Complete;
        Ok(())
    }

    fn start_element(
        &mut self,
        name: &NameRef<'_>,
        namespaces: &[NamespaceRef<'_>],
        attributes: &[AttributeRef<'_>],
        _defaulted: usize,
    ) -> Result<()> {
        self.expect_building("start_element")?;
        let parent = match self.open.last() {
            Some(&p) => p,
            None if self.root_element.is_some() => {
                return Err(Error::Sink(format!("second root element <{}>", name.local_name)));
            }
            None => self.root(),
        };

        let mut node = Node::new(NodeKind::Element, Some(parent));
        node.name = Some(self.intern_name(name)?);

        node.attr_start = to_u32(self.attributes.len())?;
        node.attr_count = to_u32(attributes.len())?;
        self.attributes.try_reserve(attributes.len())?;
        for a in attributes {
            let name = self.intern_name(&a.name)?;
            self.attributes.push(AttributeRecord { name, value: a.value.to_owned() });
        }

        node.ns_start = to_u32(self.namespaces.len())?;
        node.ns_count = to_u32(namespaces.len())?;
        self.namespaces.try_reserve(namespaces.len())?;
        for ns in namespaces {
            let prefix = ns.prefix.map(|p| self.intern(p)).transpose()?;
            let uri = self.intern(ns.uri)?;
            self.namespaces.push(NamespaceRecord { prefix, uri });
        }

        let id = self.push_node(node)?;
        if parent == self.root() {
            self.root_element = Some(id);
        }
        self.open.try_reserve(1)?;
        self.open.push(id);
        Ok(())
    }

    fn end_element(&mut self, name: &NameRef<'_>) -> Result<()> {
        self.expect_building("end_element")?;
        let Some(id) = self.open.pop() else {
            return Err(Error::Sink(format!("end_element </{}> without open element", name.local_name)));
        };
        let open_name = self.local_name(id).unwrap_or("");
        if open_name != name.local_name {
            return Err(Error::Sink(format!("end_element </{}> closes <{open_name}>", name.local_name)));
        }
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.expect_building("characters")?;
        let Some(&parent) = self.open.last() else {
            if text.chars().all(char::is_whitespace) {
                return Ok(());
            }
            return Err(Error::Sink("character data outside the root element".into()));
        };
        if text.is_empty() {
            return Ok(());
        }
        // Benachbarte Textknoten zusammenfassen
        if let Some(last) = self.nodes[parent.index()].last_child {
            let last = &self.nodes[last.index()];
            if last.kind == NodeKind::Text {
                let buf = &mut self.texts[last.text as usize];
                buf.try_reserve(text.len())?;
                buf.push_str(text);
                return Ok(());
            }
        }
        let mut owned = String::new();
        owned.try_reserve_exact(text.len())?;
        owned.push_str(text);
        self.texts.try_reserve(1)?;
        let mut node = Node::new(NodeKind::Text, Some(parent));
        node.text = to_u32(self.texts.len())?;
        self.texts.push(owned);
        self.push_node(node)?;
        Ok(())
    }

    fn fatal_error(&mut self, message: &str) {
        self.fatal = Some(message.to_owned());
    }
}

// ============================================================================
// Namespace-Bindings waehrend der Serialisierung
// ============================================================================

struct ScopeFrame {
    /// Erste Bindung die dieses Element deklariert.
    start: usize,
    tag: String,
}

struct NamespaceScope {
    /// (prefix, uri); "" ist der Default-Namespace.
    bindings: Vec<(String, String)>,
    frames: Vec<ScopeFrame>,
    generated: usize,
}

impl NamespaceScope {
    fn new() -> Self {
        Self {
            bindings: vec![(String::new(), String::new()), ("xml".into(), URI_XML.into())],
            frames: Vec::new(),
            generated: 0,
        }
    }

    fn enter(&mut self) {
        self.frames.push(ScopeFrame { start: self.bindings.len(), tag: String::new() });
    }

    fn set_tag(&mut self, tag: String) {
        if let Some(frame) = self.frames.last_mut() {
            frame.tag = tag;
        }
    }

    /// Entfernt die Bindungen des innersten Elements und gibt seinen Tag zurueck.
    fn leave(&mut self) -> String {
        match self.frames.pop() {
            Some(frame) => {
                self.bindings.truncate(frame.start);
                frame.tag
            }
            None => String::new(),
        }
    }

    fn current_start(&self) -> usize {
        self.frames.last().map_or(self.bindings.len(), |f| f.start)
    }

    fn declared(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings[self.current_start()..].iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.bindings.iter().rev().find(|(p, _)| p == prefix).map(|(_, u)| u.as_str())
    }

    fn declared_here(&self, prefix: &str) -> bool {
        self.bindings[self.current_start()..].iter().any(|(p, _)| p == prefix)
    }

    /// Nicht-leerer Prefix der aktuell an `uri` gebunden ist.
    fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(p, u)| !p.is_empty() && u == uri && self.lookup(p) == Some(uri))
            .map(|(p, _)| p.as_str())
    }

    fn declare_if_unbound(&mut self, prefix: &str, uri: &str) {
        if self.lookup(prefix) != Some(uri) && !self.declared_here(prefix) {
            self.bindings.push((prefix.to_owned(), uri.to_owned()));
        }
    }

    fn generate(&mut self, uri: &str) -> String {
        let prefix = loop {
            let candidate = format!("ns{}", self.generated);
            self.generated += 1;
            if self.lookup(&candidate).is_none() {
                break candidate;
            }
        };
        self.bindings.push((prefix.clone(), uri.to_owned()));
        prefix
    }

    fn existing_or_generated(&mut self, uri: &str) -> String {
        match self.prefix_for(uri).map(str::to_owned) {
            Some(prefix) => prefix,
            None => self.generate(uri),
        }
    }

    /// Bindet `prefix` an `uri` falls moeglich, sonst generierter Prefix.
    fn bind_prefix(&mut self, prefix: &str, uri: &str) -> String {
        if self.lookup(prefix) == Some(uri) {
            return prefix.to_owned();
        }
        if !self.declared_here(prefix) {
            self.bindings.push((prefix.to_owned(), uri.to_owned()));
            return prefix.to_owned();
        }
        self.generate(uri)
    }

    fn element_tag(&mut self, name: &NameRef<'_>) -> String {
        let prefix = match (name.uri, name.prefix) {
            (Some(uri), Some(p)) => Some(self.bind_prefix(p, uri)),
            (Some(uri), None) => {
                if self.lookup("") == Some(uri) {
                    None
                } else if !self.declared_here("") {
                    self.bindings.push((String::new(), uri.to_owned()));
                    None
                } else {
                    Some(self.existing_or_generated(uri))
                }
            }
            (None, _) => {
                if self.lookup("").is_some_and(|u| !u.is_empty()) && !self.declared_here("") {
                    self.bindings.push((String::new(), String::new()));
                }
                None
            }
        };
        qualify(prefix.as_deref(), name.local_name)
    }

    fn attribute_name(&mut self, name: &NameRef<'_>) -> String {
        let prefix = match (name.uri, name.prefix) {
            (None, _) => None,
            (Some(URI_XML), _) => Some("xml".to_owned()),
            (Some(URI_XSI), None) => Some(self.bind_prefix("xsi", URI_XSI)),
            (Some(uri), Some(p)) => Some(self.bind_prefix(p, uri)),
            (Some(uri), None) => Some(self.existing_or_generated(uri)),
        };
        qualify(prefix.as_deref(), name.local_name)
    }
}

fn qualify(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}:{local}"),
        _ => local.to_owned(),
    }
}

fn io_err(e: std::io::Error) -> Error {
    Error::IoError(e.to_string())
}

#[inline]
fn w(writer: &mut impl Write, s: &str) -> Result<()> {
    writer.write_all(s.as_bytes()).map_err(io_err)
}

fn escape(byte: u8) -> Option<&'static [u8]> {
    match byte {
        b'&' => Some(b"&amp;"),
        b'<' => Some(b"&lt;"),
        b'>' => Some(b"&gt;"),
        b'"' => Some(b"&quot;"),
        _ => None,
    }
}

/// XML-Escaping mit memchr3: Bloecke ohne Escape-Zeichen in einem Stueck.
fn write_escaped_memchr3(w: &mut impl Write, s: &str, needle: [u8; 3]) -> Result<()> {
    let bytes = s.as_bytes();
    let mut start = 0;
    while let Some(offset) = memchr::memchr3(needle[0], needle[1], needle[2], &bytes[start..]) {
        let pos = start + offset;
        w.write_all(&bytes[start..pos]).map_err(io_err)?;
        w.write_all(escape(bytes[pos]).unwrap_or(&bytes[pos..=pos])).map_err(io_err)?;
        start = pos + 1;
    }
    w.write_all(&bytes[start..]).map_err(io_err)
}

/// Text-Inhalt: & < > → &amp; &lt; &gt;
fn write_escaped_text(w: &mut impl Write, s: &str) -> Result<()> {
    write_escaped_memchr3(w, s, [b'&', b'<', b'>'])
}

/// Attribut-Werte: & < " → &amp; &lt; &quot;
fn write_escaped_attr(w: &mut impl Write, s: &str) -> Result<()> {
    write_escaped_memchr3(w, s, [b'&', b'<', b'"'])
}
