//! Frames owned by the builder stacks.

use crate::qname::QName;
use crate::sink::{AttributeRef, NameRef, NamespaceRef};
use crate::Result;

/// Qualified name in one contiguous buffer: `local ‖ prefix ‖ uri`.
///
/// Jede Komponente traegt ihre Laenge explizit; fehlende Komponenten haben
/// keine Laenge und belegen keinen Platz. Inhalte sind damit binaer sicher,
/// auch eingebettete NUL-Zeichen bleiben erhalten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QualifiedName {
    bytes: String,
    local_len: usize,
    prefix_len: Option<usize>,
    uri_len: Option<usize>,
}

impl QualifiedName {
    /// Captures the components. Empty prefix and empty URI count as absent.
    pub(crate) fn capture(local_name: &str, prefix: Option<&str>, uri: Option<&str>) -> Result<Self> {
        let prefix = prefix.filter(|p| !p.is_empty());
        let uri = uri.filter(|u| !u.is_empty());
        let total = local_name.len() + prefix.map_or(0, str::len) + uri.map_or(0, str::len);

        let mut bytes = String::new();
        bytes.try_reserve_exact(total)?;
        bytes.push_str(local_name);
        if let Some(p) = prefix {
            bytes.push_str(p);
        }
        if let Some(u) = uri {
            bytes.push_str(u);
        }
        Ok(Self {
            bytes,
            local_len: local_name.len(),
            prefix_len: prefix.map(str::len),
            uri_len: uri.map(str::len),
        })
    }

    pub(crate) fn from_qname(qname: &QName) -> Result<Self> {
        Self::capture(&qname.local_name, qname.prefix.as_deref(), Some(&qname.uri))
    }

    /// Same name with `prefix` replacing the current one.
    pub(crate) fn with_prefix(&self, prefix: &str) -> Result<Self> {
        Self::capture(self.local_name(), Some(prefix), self.uri())
    }

    pub(crate) fn local_name(&self) -> &str {
        &self.bytes[..self.local_len]
    }

    pub(crate) fn prefix(&self) -> Option<&str> {
        let len = self.prefix_len?;
        Some(&self.bytes[self.local_len..self.local_len + len])
    }

    pub(crate) fn uri(&self) -> Option<&str> {
        let len = self.uri_len?;
        let start = self.local_len + self.prefix_len.unwrap_or(0);
        Some(&self.bytes[start..start + len])
    }

    pub(crate) fn as_name_ref(&self) -> NameRef<'_> {
        NameRef { local_name: self.local_name(), prefix: self.prefix(), uri: self.uri() }
    }

    #[cfg(test)]
    pub(crate) fn storage_len(&self) -> usize {
        self.bytes.len()
    }
}

/// One open element.
#[derive(Debug)]
pub(crate) struct ElementFrame {
    pub(crate) name: QualifiedName,
}

/// One attribute of the element whose start tag is still deferred.
#[derive(Debug)]
pub(crate) struct AttributeFrame {
    pub(crate) name: QualifiedName,
    /// Wird genau einmal gesetzt.
    pub(crate) value: Option<String>,
}

impl AttributeFrame {
    pub(crate) fn as_attribute_ref(&self) -> AttributeRef<'_> {
        AttributeRef { name: self.name.as_name_ref(), value: self.value.as_deref().unwrap_or("") }
    }
}

/// Namespace declaration buffered with the deferred start tag.
#[derive(Debug)]
pub(crate) struct NamespaceFrame {
    pub(crate) prefix: Option<String>,
    pub(crate) uri: String,
}

impl NamespaceFrame {
    pub(crate) fn as_namespace_ref(&self) -> NamespaceRef<'_> {
        NamespaceRef { prefix: self.prefix.as_deref(), uri: &self.uri }
    }
}
