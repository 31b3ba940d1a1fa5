use std::rc::Rc;

use crate::bit_width;
use crate::decoder::Decoder;
use crate::decoder::handler::NamespaceDeclaration;
use crate::qname::QName;
use crate::string_table::NameKey;
use crate::{Error, Result, string, unsigned_integer};

impl<'a> Decoder<'a> {
    /// Decodiert einen QName mit String Table (EXI §7.1.7, 7.3.2, 7.3.3).
    ///
    /// Reihenfolge: URI -> LocalName -> Prefix (wenn Prefixe erhalten werden)
    pub(super) fn decode_qname(&mut self) -> Result<(QName, NameKey)> {
        let (uri, uri_id) = self.decode_uri()?;
        let (local_name, local_id) = self.decode_local_name(uri_id)?;
        let key = NameKey { uri: uri_id, local: local_id };
        let mut qname = QName::new(uri, local_name);
        qname.prefix = self.decode_qname_prefix(uri_id)?;
        Ok((qname, key))
    }

    /// Prefix eines bereits bekannten QName (gelernte SE/AT Productions).
    pub(super) fn with_decoded_prefix(&mut self, qname: &QName, key: NameKey) -> Result<QName> {
        let mut qname = qname.clone();
        qname.prefix = self.decode_qname_prefix(key.uri)?;
        Ok(qname)
    }

    /// EXI §7.1.7: Prefix nur wenn erhalten und die URI mindestens einen
    /// Prefix hat. Es gibt keinen Miss-Fall.
    fn decode_qname_prefix(&mut self, uri_id: usize) -> Result<Option<Rc<str>>> {
        if !self.options.preserve_prefixes() {
            return Ok(None);
        }
        let count = self.table.prefix_count(uri_id);
        if count == 0 {
            return Ok(None);
        }
        let id = self.decode_n_bit(bit_width::for_count(count))? as usize;
        self.table.prefix(uri_id, id).map(Some)
    }

    /// Decodiert eine URI (EXI §7.3.2): 0 = Miss, i+1 = Hit auf ID i.
    fn decode_uri(&mut self) -> Result<(Rc<str>, usize)> {
        let count = self.table.uri_count();
        let index = self.decode_n_bit(bit_width::for_count(count + 1))? as usize;
        if index == 0 {
            let uri = string::decode(&mut self.reader)?;
            let id = self.table.add_uri(&uri);
            Ok((self.table.uri(id)?, id))
        } else {
            Ok((self.table.uri(index - 1)?, index - 1))
        }
    }

    /// Decodiert einen LocalName (EXI §7.3.3): 0 = Hit, Laenge+1 = Miss.
    fn decode_local_name(&mut self, uri_id: usize) -> Result<(Rc<str>, usize)> {
        let length_or_hit = unsigned_integer::decode_usize(&mut self.reader)?;
        if length_or_hit == 0 {
            let count = self.table.local_name_count(uri_id);
            let id = self.decode_n_bit(bit_width::for_count(count))? as usize;
            Ok((self.table.local_name(uri_id, id)?, id))
        } else {
            let name = string::decode_chars(&mut self.reader, length_or_hit - 1)?;
            let (id, rc) = self.table.add_local_name(uri_id, &name)?;
            Ok((rc, id))
        }
    }

    /// Decodiert NS Content: URI, Prefix mit Miss-Option, local-element-ns Bit.
    pub(super) fn decode_namespace_declaration(&mut self) -> Result<NamespaceDeclaration> {
        let (uri, uri_id) = self.decode_uri()?;

        let count = self.table.prefix_count(uri_id);
        let index = self.decode_n_bit(bit_width::for_count(count + 1))? as usize;
        let prefix = if index == 0 {
            let prefix = string::decode(&mut self.reader)?;
            let id = self.table.add_prefix(uri_id, &prefix)?;
            self.table.prefix(uri_id, id)?
        } else if index > count {
            return Err(Error::InvalidCompactId(index - 1));
        } else {
            self.table.prefix(uri_id, index - 1)?
        };

        let local_element_ns = self.decode_n_bit(1)? == 1;
        Ok(NamespaceDeclaration { uri, prefix, local_element_ns })
    }
}
