//! Decoding options (EXI §5.4, Table 5-1, schema-less subset).
//!
//! Out-of-band uebergeben oder aus dem Header gelesen ([`crate::options_codec`]).
//!
//! # Beispiel
//!
//! ```
//! use eximl::options::{Alignment, ExiOptions};
//!
//! let opts = ExiOptions::default()
//!     .with_alignment(Alignment::ByteAlignment)
//!     .with_preserve_prefixes()
//!     .with_value_max_length(64);
//!
//! assert_eq!(opts.alignment(), Alignment::ByteAlignment);
//! assert!(opts.preserve_prefixes());
//! assert_eq!(opts.value_max_length(), Some(64));
//! ```

/// Alignment of event codes and content items (EXI §5.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Event codes and content are packed in bits without padding (default).
    #[default]
    BitPacked,
    /// Event codes and n-bit integers occupy whole bytes.
    ByteAlignment,
}

/// Schema identification for the EXI body (EXI §5.4).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchemaId {
    /// No schema information is used.
    #[default]
    None,
    /// No user-defined schema; only built-in types.
    BuiltinOnly,
    /// A user-defined schema identifier (not supported).
    Id(String),
}

/// Options controlling how the EXI body is decoded.
///
/// Defaults: bit-packed, prefixes not preserved, unbounded value
/// partitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExiOptions {
    pub(crate) alignment: Alignment,
    pub(crate) preserve_prefixes: bool,
    pub(crate) value_max_length: Option<u32>,
    pub(crate) value_partition_capacity: Option<u32>,
    pub(crate) schema_id: Option<SchemaId>,
}

impl ExiOptions {
    /// Alignment of event codes and content items (EXI §5.4).
    pub fn alignment(&self) -> Alignment { self.alignment }
    /// NS events and QName prefixes are present in the stream (EXI §6.3).
    pub fn preserve_prefixes(&self) -> bool { self.preserve_prefixes }
    /// Longest value (in characters) added to the value partitions (EXI §7.3.3).
    pub fn value_max_length(&self) -> Option<u32> { self.value_max_length }
    /// Size of the global value partition (EXI §7.3.3).
    pub fn value_partition_capacity(&self) -> Option<u32> { self.value_partition_capacity }
    /// Schema named by the options, `None` when absent (EXI §5.4).
    pub fn schema_id(&self) -> Option<&SchemaId> { self.schema_id.as_ref() }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self { self.alignment = alignment; self }
    pub fn with_preserve_prefixes(mut self) -> Self { self.preserve_prefixes = true; self }
    pub fn with_value_max_length(mut self, len: u32) -> Self { self.value_max_length = Some(len); self }
    pub fn with_value_partition_capacity(mut self, cap: u32) -> Self { self.value_partition_capacity = Some(cap); self }
    pub fn with_schema_id(mut self, id: SchemaId) -> Self { self.schema_id = Some(id); self }

    /// True when event codes and n-bit integers are padded to whole bytes.
    pub(crate) fn byte_aligned(&self) -> bool {
        self.alignment == Alignment::ByteAlignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = ExiOptions::default();
        assert_eq!(opts.alignment(), Alignment::BitPacked);
        assert!(!opts.preserve_prefixes());
        assert_eq!(opts.value_max_length(), None);
        assert_eq!(opts.value_partition_capacity(), None);
        assert_eq!(opts.schema_id(), None);
        assert!(!opts.byte_aligned());
    }

    #[test]
    fn builder_setters() {
        let opts = ExiOptions::default()
            .with_alignment(Alignment::ByteAlignment)
            .with_value_partition_capacity(0);
        assert!(opts.byte_aligned());
        assert_eq!(opts.value_partition_capacity(), Some(0));
    }

    #[test]
    fn schema_id_default_is_none() {
        assert_eq!(SchemaId::default(), SchemaId::None);
    }
}
