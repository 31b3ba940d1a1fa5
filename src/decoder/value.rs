use std::rc::Rc;

use crate::bit_width;
use crate::decoder::Decoder;
use crate::decoder::handler::NamespaceDeclaration;
use crate::qname::QName;
use crate::string_table::{NameKey, URI_ID_XML};
use crate::{Result, string, unsigned_integer};

impl<'a> Decoder<'a> {
    /// Decodiert einen Value ueber die Value-Partitionen (EXI §7.3.3).
    ///
    /// - 0: Local Hit, Compact ID der lokalen Partition von `key` folgt
    /// - 1: Global Hit, Compact ID der globalen Partition folgt
    /// - Laenge+2: Miss, String folgt und wird eingetragen
    pub(super) fn decode_value(&mut self, key: NameKey) -> Result<Rc<str>> {
        let discriminator = unsigned_integer::decode_usize(&mut self.reader)?;
        match discriminator {
            0 => {
                let size = self.table.local_value_size_for_bits(key);
                let id = self.decode_n_bit(bit_width::for_count(size))? as usize;
                self.table.local_value(key, id)
            }
            1 => {
                let size = self.table.global_value_size_for_bits();
                let id = self.decode_n_bit(bit_width::for_count(size))? as usize;
                self.table.global_value(id)
            }
            n => {
                let value: Rc<str> = string::decode_chars(&mut self.reader, n - 2)?.into();
                self.table.add_value(key, &value)?;
                Ok(value)
            }
        }
    }

    /// Attribut-Value: xsi:type traegt einen QName statt eines Strings.
    ///
    /// Hat der Typname eine URI aber keinen Prefix (Prefixe nicht erhalten),
    /// wird ein Prefix erzeugt und als NS-Deklaration mitgeliefert, damit der
    /// lexikalische Wert die URI behaelt.
    pub(super) fn decode_attribute_value(
        &mut self,
        qname: &QName,
        key: NameKey,
    ) -> Result<(Rc<str>, Option<NamespaceDeclaration>)> {
        if !qname.is_xsi_type() {
            return Ok((self.decode_value(key)?, None));
        }
        let (type_name, type_key) = self.decode_qname()?;
        if type_name.uri.is_empty() || type_name.prefix.as_deref().is_some_and(|p| !p.is_empty()) {
            return Ok((type_name.lexical().into(), None));
        }
        if type_key.uri == URI_ID_XML {
            return Ok((format!("xml:{}", type_name.local_name).into(), None));
        }
        let prefix = self.table.unused_prefix(type_key.uri);
        let value: Rc<str> = format!("{prefix}:{}", type_name.local_name).into();
        let ns = NamespaceDeclaration { uri: type_name.uri, prefix: prefix.into(), local_element_ns: false };
        Ok((value, Some(ns)))
    }
}
