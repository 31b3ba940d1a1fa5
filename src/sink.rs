//! Downstream contract: tree-construction notifications produced by the
//! [`TreeBuilder`](crate::builder::TreeBuilder).
//!
//! Alle Referenzen sind geliehen und gelten nur fuer die Dauer des Aufrufs;
//! eine Sink die Namen behalten will, kopiert oder interniert sie.

use crate::Result;

/// Qualified name as handed to a sink. Empty URIs and prefixes arrive as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRef<'a> {
    pub local_name: &'a str,
    pub prefix: Option<&'a str>,
    pub uri: Option<&'a str>,
}

impl<'a> NameRef<'a> {
    pub fn new(local_name: &'a str) -> Self {
        Self { local_name, prefix: None, uri: None }
    }
}

/// One attribute of a start tag: name plus complete value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRef<'a> {
    pub name: NameRef<'a>,
    pub value: &'a str,
}

/// Namespace declaration carried by a start tag. `prefix == None` declares
/// the default namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceRef<'a> {
    pub prefix: Option<&'a str>,
    pub uri: &'a str,
}

/// Consumer of tree-construction notifications.
///
/// Notifications arrive in document order. `start_element` is called exactly
/// once per element, after all of its attributes are known; attributes come
/// in declaration order. Returning `Err` aborts the parse.
pub trait TreeSink {
    fn start_document(&mut self) -> Result<()>;

    fn end_document(&mut self) -> Result<()>;

    /// `defaulted` counts trailing attributes filled in from a schema
    /// default. Schema-less parsing always passes 0.
    fn start_element(
        &mut self,
        name: &NameRef<'_>,
        namespaces: &[NamespaceRef<'_>],
        attributes: &[AttributeRef<'_>],
        defaulted: usize,
    ) -> Result<()>;

    fn end_element(&mut self, name: &NameRef<'_>) -> Result<()>;

    fn characters(&mut self, text: &str) -> Result<()>;

    /// The parse is being abandoned. No further notification follows.
    fn fatal_error(&mut self, message: &str);
}

impl<S: TreeSink + ?Sized> TreeSink for &mut S {
    fn start_document(&mut self) -> Result<()> {
        (**self).start_document()
    }

    fn end_document(&mut self) -> Result<()> {
        (**self).end_document()
    }

    fn start_element(
        &mut self,
        name: &NameRef<'_>,
        namespaces: &[NamespaceRef<'_>],
        attributes: &[AttributeRef<'_>],
        defaulted: usize,
    ) -> Result<()> {
        (**self).start_element(name, namespaces, attributes, defaulted)
    }

    fn end_element(&mut self, name: &NameRef<'_>) -> Result<()> {
        (**self).end_element(name)
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        (**self).characters(text)
    }

    fn fatal_error(&mut self, message: &str) {
        (**self).fatal_error(message)
    }
}
