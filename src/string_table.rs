//! String Table (EXI §7.3, Appendix D.1), decoder side.
//!
//! Partitions: URI, Prefix (per URI), Local-Name (per URI) and Value
//! (global plus one local partition per attribute/element name).
//!
//! Lifecycle: one table per EXI stream. Der Decoder braucht nur ID → String,
//! deshalb halten die Partitionen keine String → ID Lookups.

use std::rc::Rc;

use log::{trace, warn};

use crate::{Error, FastHashMap, Result};

/// Well-known URIs (Table D-1)
pub const URI_XML: &str = "http://www.w3.org/XML/1998/namespace";
/// XSI Namespace URI, Traeger von xsi:type und xsi:nil.
pub const URI_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Compact ID von [`URI_XML`] in der initialen URI-Partition.
pub(crate) const URI_ID_XML: usize = 1;

/// Table D-3: initiale Local-Names der XML-Namespace-Partition.
const XML_LOCAL_NAMES: [&str; 4] = ["base", "id", "lang", "space"];
/// Table D-4: initiale Local-Names der XSI-Partition.
const XSI_LOCAL_NAMES: [&str; 2] = ["nil", "type"];

/// Compact identity of an expanded name: URI id + local-name id.
///
/// Key fuer lokale Value-Partitionen und die Element-Grammatiken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NameKey {
    pub(crate) uri: usize,
    pub(crate) local: usize,
}

/// Value-Partition mit optionaler Kapazitaet (EXI §7.3.3).
#[derive(Default)]
struct ValueStore {
    /// `None` = evicted.
    entries: Vec<Option<Rc<str>>>,
    next_id: usize,
    capacity: Option<usize>,
    wrapped: bool,
}

impl ValueStore {
    fn bounded(capacity: Option<usize>) -> Self {
        Self { capacity, ..Self::default() }
    }

    fn get(&self, id: usize) -> Option<Rc<str>> {
        self.entries.get(id)?.clone()
    }

    /// Anzahl fuer Bitbreiten-Berechnung: nach dem ersten Wrap die Kapazitaet.
    fn size_for_bits(&self) -> usize {
        match self.capacity {
            Some(cap) if self.wrapped => cap,
            _ => self.next_id,
        }
    }

    /// Speichert am naechsten Slot und gibt dessen ID zurueck.
    fn push(&mut self, value: Rc<str>) -> Result<usize> {
        let id = self.next_id;
        if id < self.entries.len() {
            self.entries[id] = Some(value);
        } else {
            self.entries.try_reserve(1)?;
            self.entries.push(Some(value));
        }
        self.next_id += 1;
        if let Some(cap) = self.capacity
            && self.next_id >= cap
        {
            self.next_id = 0;
            self.wrapped = true;
        }
        Ok(id)
    }

    fn remove(&mut self, id: usize) {
        if let Some(entry) = self.entries.get_mut(id) {
            *entry = None;
        }
    }
}

/// String Table (EXI §7.3).
pub(crate) struct StringTable {
    uris: Vec<Rc<str>>,
    /// Indiziert durch URI-ID.
    prefixes: Vec<Vec<Rc<str>>>,
    /// Indiziert durch URI-ID.
    local_names: Vec<Vec<Rc<str>>>,
    global_values: ValueStore,
    /// Fuer Eviction: welcher lokale Eintrag haengt an welchem Global-Slot.
    global_owners: Vec<Option<(NameKey, usize)>>,
    local_values: FastHashMap<NameKey, ValueStore>,
    value_max_length: Option<usize>,
    value_partition_capacity: Option<usize>,
}

impl StringTable {
    /// Pre-populated table (Appendix D.1) with value partition limits.
    pub(crate) fn new(value_max_length: Option<u32>, value_partition_capacity: Option<u32>) -> Self {
        let rc = |s: &str| -> Rc<str> { s.into() };
        let capacity = value_partition_capacity.map(|c| c as usize);
        Self {
            uris: vec![rc(""), rc(URI_XML), rc(URI_XSI)],
            prefixes: vec![vec![rc("")], vec![rc("xml")], vec![rc("xsi")]],
            local_names: vec![
                Vec::new(),
                XML_LOCAL_NAMES.iter().copied().map(rc).collect(),
                XSI_LOCAL_NAMES.iter().copied().map(rc).collect(),
            ],
            global_values: ValueStore::bounded(capacity),
            global_owners: Vec::new(),
            local_values: FastHashMap::default(),
            value_max_length: value_max_length.map(|l| l as usize),
            value_partition_capacity: capacity,
        }
    }

    // === URI ===

    pub(crate) fn uri_count(&self) -> usize {
        self.uris.len()
    }

    pub(crate) fn uri(&self, id: usize) -> Result<Rc<str>> {
        self.uris.get(id).cloned().ok_or(Error::InvalidCompactId(id))
    }

    /// URI Miss: neue Partitionen fuer Prefixe und Local-Names anlegen.
    pub(crate) fn add_uri(&mut self, uri: &str) -> usize {
        self.uris.push(uri.into());
        self.prefixes.push(Vec::new());
        self.local_names.push(Vec::new());
        self.uris.len() - 1
    }

    // === Prefix ===

    pub(crate) fn prefix_count(&self, uri_id: usize) -> usize {
        self.prefixes.get(uri_id).map_or(0, Vec::len)
    }

    pub(crate) fn prefix(&self, uri_id: usize, id: usize) -> Result<Rc<str>> {
        self.prefixes
            .get(uri_id)
            .and_then(|p| p.get(id))
            .cloned()
            .ok_or(Error::InvalidCompactId(id))
    }

    pub(crate) fn add_prefix(&mut self, uri_id: usize, prefix: &str) -> Result<usize> {
        let partition = self.prefixes.get_mut(uri_id).ok_or(Error::InvalidCompactId(uri_id))?;
        partition.push(prefix.into());
        Ok(partition.len() - 1)
    }

    /// Prefix `ns{uri_id}` (ggf. mit Suffix), der in keiner Partition vorkommt.
    pub(crate) fn unused_prefix(&self, uri_id: usize) -> String {
        let in_use = |p: &str| self.prefixes.iter().flatten().any(|q| &**q == p);
        let base = format!("ns{uri_id}");
        let mut candidate = base.clone();
        let mut n = 0;
        while in_use(&candidate) {
            n += 1;
            candidate = format!("{base}_{n}");
        }
        candidate
    }

    // === Local-Name ===

    pub(crate) fn local_name_count(&self, uri_id: usize) -> usize {
        self.local_names.get(uri_id).map_or(0, Vec::len)
    }

    pub(crate) fn local_name(&self, uri_id: usize, id: usize) -> Result<Rc<str>> {
        self.local_names
            .get(uri_id)
            .and_then(|p| p.get(id))
            .cloned()
            .ok_or(Error::InvalidCompactId(id))
    }

    pub(crate) fn add_local_name(&mut self, uri_id: usize, name: &str) -> Result<(usize, Rc<str>)> {
        let partition = self.local_names.get_mut(uri_id).ok_or(Error::InvalidCompactId(uri_id))?;
        let rc: Rc<str> = name.into();
        partition.push(Rc::clone(&rc));
        Ok((partition.len() - 1, rc))
    }

    // === Value ===

    pub(crate) fn global_value_size_for_bits(&self) -> usize {
        self.global_values.size_for_bits()
    }

    pub(crate) fn local_value_size_for_bits(&self, key: NameKey) -> usize {
        self.local_values.get(&key).map_or(0, ValueStore::size_for_bits)
    }

    pub(crate) fn global_value(&self, id: usize) -> Result<Rc<str>> {
        self.global_values.get(id).ok_or(Error::InvalidCompactId(id))
    }

    pub(crate) fn local_value(&self, key: NameKey, id: usize) -> Result<Rc<str>> {
        self.local_values
            .get(&key)
            .and_then(|p| p.get(id))
            .ok_or(Error::InvalidCompactId(id))
    }

    /// Prueft ob ein Value gemaess Options nicht gespeichert werden soll.
    fn should_skip_value(&self, value: &str) -> bool {
        if self.value_partition_capacity == Some(0) || value.is_empty() {
            return true;
        }
        match self.value_max_length {
            // byte_len <= max impliziert char_count <= max
            Some(max) if value.len() > max && value.chars().count() > max => {
                warn!("value of {} characters exceeds valueMaxLength {max}, not added", value.chars().count());
                true
            }
            _ => false,
        }
    }

    /// Value Miss: in globale und lokale Partition eintragen (EXI §7.3.3).
    ///
    /// Bei begrenzter Kapazitaet wird der bisherige Inhalt des Global-Slots
    /// auch aus seiner lokalen Partition entfernt.
    pub(crate) fn add_value(&mut self, key: NameKey, value: &Rc<str>) -> Result<()> {
        if self.should_skip_value(value) {
            return Ok(());
        }
        let slot = self.global_values.next_id;
        if self.value_partition_capacity.is_some()
            && let Some((old_key, old_local)) = self.global_owners.get_mut(slot).and_then(Option::take)
        {
            trace!("evicting global value slot {slot}");
            if let Some(store) = self.local_values.get_mut(&old_key) {
                store.remove(old_local);
            }
        }

        let local_id = self.local_values.entry(key).or_default().push(Rc::clone(value))?;
        let global_id = self.global_values.push(Rc::clone(value))?;
        if global_id >= self.global_owners.len() {
            self.global_owners.try_reserve(1)?;
            self.global_owners.resize(global_id + 1, None);
        }
        self.global_owners[global_id] = Some((key, local_id));
        Ok(())
    }
}
