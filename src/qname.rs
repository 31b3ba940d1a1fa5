//! Decoded qualified names (EXI §7.1.7).
//!
//! Zwei QNames sind gleich wenn URI und local-name uebereinstimmen, der
//! Prefix zaehlt nicht (EXI §7.1.7).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::string_table::URI_XSI;

/// A qualified name as reported to a [`ContentHandler`](crate::decoder::ContentHandler).
///
/// The components share storage with the string table, so cloning is cheap.
#[derive(Clone)]
pub struct QName {
    pub uri: Rc<str>,
    pub local_name: Rc<str>,
    /// Only present when prefixes are preserved.
    pub prefix: Option<Rc<str>>,
}

impl QName {
    pub fn new(uri: impl Into<Rc<str>>, local_name: impl Into<Rc<str>>) -> Self {
        Self { uri: uri.into(), local_name: local_name.into(), prefix: None }
    }

    pub fn with_prefix(mut self, prefix: impl Into<Rc<str>>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// `xsi:type`: its value is a QName, not a string (EXI §8.4.3).
    pub fn is_xsi_type(&self) -> bool {
        &*self.local_name == "type" && &*self.uri == URI_XSI
    }

    /// Lexical form `prefix:local` or `local`.
    pub fn lexical(&self) -> String {
        match self.prefix.as_deref() {
            Some(p) if !p.is_empty() => format!("{p}:{}", self.local_name),
            _ => self.local_name.to_string(),
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
        self.local_name.hash(state);
    }
}

/// Clark-Notation: `{uri}local`, ohne geschweifte Klammern bei leerer URI.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uri.is_empty() {
            write!(f, "{}", self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.uri, self.local_name)
        }
    }
}

impl fmt::Debug for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix.as_deref() {
            Some(p) => write!(f, "QName({self}, prefix={p:?})"),
            None => write!(f, "QName({self})"),
        }
    }
}
