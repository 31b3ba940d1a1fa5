//! Built-in element grammars (EXI §8.4.3) for schema-less decoding.
//!
//! Each expanded element name owns one grammar with two non-terminals,
//! StartTagContent and ElementContent. Learned productions sit on the first
//! event code level and are inserted at code 0; the built-in productions
//! (pruned to the preserved fidelity options) sit behind the escape code
//! on the second level:
//!
//! ```text
//! StartTagContent:  learned...          | EE, AT(*), [NS], SE(*), CH
//! ElementContent:   learned..., EE      | SE(*), CH
//! ```

use std::borrow::Cow;

use crate::bit_width;
use crate::bitstream::BitReader;
use crate::qname::QName;
use crate::string_table::NameKey;
use crate::unsigned_integer;
use crate::{Error, Result};

/// Non-terminals of a built-in element grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NonTerminal {
    StartTagContent,
    ElementContent,
}

impl NonTerminal {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::StartTagContent => "StartTagContent",
            Self::ElementContent => "ElementContent",
        }
    }
}

/// Terminal symbol of a production.
#[derive(Debug, Clone)]
pub(crate) enum Production {
    EndElement,
    AttributeAny,
    Attribute(QName, NameKey),
    NamespaceDeclaration,
    StartElementAny,
    StartElement(QName, NameKey),
    Characters,
}

impl Production {
    fn same_terminal(&self, other: &Production) -> bool {
        match (self, other) {
            (Self::Attribute(_, a), Self::Attribute(_, b))
            | (Self::StartElement(_, a), Self::StartElement(_, b)) => a == b,
            (Self::EndElement, Self::EndElement) | (Self::Characters, Self::Characters) => true,
            _ => false,
        }
    }
}

/// Productions hinter dem Escape-Code; datenlos, deshalb `Copy`.
#[derive(Debug, Clone, Copy)]
enum BuiltIn {
    EndElement,
    AttributeAny,
    NamespaceDeclaration,
    StartElementAny,
    Characters,
}

impl From<BuiltIn> for Production {
    fn from(b: BuiltIn) -> Self {
        match b {
            BuiltIn::EndElement => Self::EndElement,
            BuiltIn::AttributeAny => Self::AttributeAny,
            BuiltIn::NamespaceDeclaration => Self::NamespaceDeclaration,
            BuiltIn::StartElementAny => Self::StartElementAny,
            BuiltIn::Characters => Self::Characters,
        }
    }
}

const START_TAG_SECOND: [BuiltIn; 4] =
    [BuiltIn::EndElement, BuiltIn::AttributeAny, BuiltIn::StartElementAny, BuiltIn::Characters];
const START_TAG_SECOND_NS: [BuiltIn; 5] = [
    BuiltIn::EndElement,
    BuiltIn::AttributeAny,
    BuiltIn::NamespaceDeclaration,
    BuiltIn::StartElementAny,
    BuiltIn::Characters,
];
const ELEMENT_CONTENT_SECOND: [BuiltIn; 2] = [BuiltIn::StartElementAny, BuiltIn::Characters];

/// A production matched by an event code.
#[derive(Debug, Clone)]
pub(crate) struct Matched {
    pub(crate) production: Production,
    /// Event code had more than one part (drives CH/EE learning).
    pub(crate) multi_part: bool,
}

/// Built-in grammar of one element name, shared by all its occurrences.
#[derive(Debug, Default)]
pub(crate) struct ElementGrammar {
    /// Gelernte Productions in Lernreihenfolge: die juengste hat Code 0.
    start_tag: Vec<Production>,
    content: Vec<Production>,
}

impl ElementGrammar {
    fn learned(&self, nt: NonTerminal) -> &[Production] {
        match nt {
            NonTerminal::StartTagContent => &self.start_tag,
            NonTerminal::ElementContent => &self.content,
        }
    }

    /// Reads one event code in `nt` and returns the matched production (EXI §6.2).
    pub(crate) fn read_event(
        &self,
        reader: &mut BitReader,
        nt: NonTerminal,
        preserve_prefixes: bool,
        byte_aligned: bool,
    ) -> Result<Matched> {
        let learned = self.learned(nt);
        let fixed_ee = usize::from(nt == NonTerminal::ElementContent);
        let first_len = learned.len() + fixed_ee + 1;

        let code = read_part(reader, first_len, byte_aligned, nt)?;
        if code < learned.len() {
            let production = learned[learned.len() - 1 - code].clone();
            return Ok(Matched { production, multi_part: false });
        }
        if code < learned.len() + fixed_ee {
            return Ok(Matched { production: Production::EndElement, multi_part: false });
        }

        let second: &[BuiltIn] = match nt {
            NonTerminal::StartTagContent if preserve_prefixes => &START_TAG_SECOND_NS,
            NonTerminal::StartTagContent => &START_TAG_SECOND,
            NonTerminal::ElementContent => &ELEMENT_CONTENT_SECOND,
        };
        let code2 = read_part(reader, second.len(), byte_aligned, nt)?;
        Ok(Matched { production: second[code2].into(), multi_part: true })
    }

    /// Inserts `production` at event code 0 of `nt` unless the terminal is
    /// already learned (EXI §8.4.3).
    pub(crate) fn learn(&mut self, nt: NonTerminal, production: Production) {
        let list = match nt {
            NonTerminal::StartTagContent => &mut self.start_tag,
            NonTerminal::ElementContent => &mut self.content,
        };
        if list.iter().any(|p| p.same_terminal(&production)) {
            return;
        }
        list.push(production);
    }

    #[cfg(test)]
    pub(crate) fn learned_count(&self, nt: NonTerminal) -> usize {
        self.learned(nt).len()
    }
}

/// Liest einen Event-Code-Teil mit `count` Alternativen.
fn read_part(reader: &mut BitReader, count: usize, byte_aligned: bool, nt: NonTerminal) -> Result<usize> {
    let bits = bit_width::for_count(count);
    let value = unsigned_integer::decode_n_bit(reader, bits, byte_aligned)?;
    match usize::try_from(value) {
        Ok(v) if v < count => Ok(v),
        _ => Err(Error::invalid_event_code(Cow::Owned(value.to_string()), nt.name())),
    }
}

/// Reads the (pruned, all zero-width) document grammar codes: SD, SE(*), ED.
///
/// Ohne CM/PI/DT hat jede Document-Grammar-Position genau eine Production,
/// der Code belegt 0 Bits. Die Funktion existiert, damit der Decoder den
/// Leseschritt explizit macht.
pub(crate) fn read_document_event(reader: &mut BitReader, byte_aligned: bool) -> Result<()> {
    let bits = bit_width::for_count(1);
    unsigned_integer::decode_n_bit(reader, bits, byte_aligned).map(|_| ())
}
