// Handgebaute EXI-Streams fuer Decoder- und End-to-End-Tests.
//
// Wird per `include!` eingebunden. Benötigte Imports:
//   use <crate>::bitstream::BitWriter;

/// Baut einen schema-losen EXI Stream Bit fuer Bit.
///
/// `code` schreibt Event-Code-Teile und n-Bit-Werte, bei byte-alignment als
/// ganze Bytes (little-endian). Unsigned Integers und Strings sind in beiden
/// Modi Oktett-Folgen.
struct Stream {
    w: BitWriter,
    aligned: bool,
}

#[allow(dead_code)]
impl Stream {
    /// Stream mit minimalem Header (10 0 0 0000).
    fn new() -> Self {
        let mut w = BitWriter::new();
        w.write_byte(0x80);
        Self { w, aligned: false }
    }

    fn byte_aligned() -> Self {
        Self { aligned: true, ..Self::new() }
    }

    /// Header mit Presence Bit (10 1 0 0000) und Options-Dokument `options`
    /// (bit-packed), danach Padding falls `aligned`.
    fn with_header_options(options: &[(u64, u8)], aligned: bool) -> Self {
        let mut w = BitWriter::new();
        w.write_byte(0xA0);
        for &(value, n) in options {
            w.write_bits(value, n);
        }
        if aligned {
            w.align_to_byte();
        }
        Self { w, aligned }
    }

    /// Stream ohne Header (fuer Header-Fehlertests).
    fn raw() -> Self {
        Self { w: BitWriter::new(), aligned: false }
    }

    /// n-Bit-Wert (Event-Code-Teil, Compact ID).
    fn code(&mut self, value: u64, n: u8) -> &mut Self {
        if self.aligned {
            for i in 0..usize::from(n).div_ceil(8) {
                self.w.write_byte((value >> (8 * i)) as u8);
            }
        } else {
            self.w.write_bits(value, n);
        }
        self
    }

    fn bits(&mut self, value: u64, n: u8) -> &mut Self {
        self.w.write_bits(value, n);
        self
    }

    /// Unsigned Integer in 7-Bit-Gruppen, niederwertigste zuerst.
    fn uint(&mut self, mut value: u64) -> &mut Self {
        loop {
            let low = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.w.write_byte(low);
                return self;
            }
            self.w.write_byte(0x80 | low);
        }
    }

    /// Code Points ohne Laengenpraefix.
    fn chars(&mut self, s: &str) -> &mut Self {
        for c in s.chars() {
            self.uint(u64::from(c));
        }
        self
    }

    /// String-Literal mit Laenge + `offset` (0 Praefix/URI, 1 LocalName, 2 Value).
    fn literal(&mut self, s: &str, offset: u64) -> &mut Self {
        self.uint(s.chars().count() as u64 + offset);
        self.chars(s)
    }

    /// URI-Hit: `uri_count` Eintraege, Compact ID `id`.
    fn uri_hit(&mut self, id: u64, uri_count: usize) -> &mut Self {
        self.code(id + 1, width(uri_count + 1))
    }

    /// URI-Miss mit neuem String.
    fn uri_miss(&mut self, uri: &str, uri_count: usize) -> &mut Self {
        self.code(0, width(uri_count + 1));
        self.literal(uri, 0)
    }

    /// Neuer LocalName.
    fn local_miss(&mut self, name: &str) -> &mut Self {
        self.literal(name, 1)
    }

    /// LocalName-Hit in einer Partition mit `count` Eintraegen.
    fn local_hit(&mut self, id: u64, count: usize) -> &mut Self {
        self.uint(0);
        self.code(id, width(count))
    }

    /// Value-Miss (neuer String).
    fn value_miss(&mut self, value: &str) -> &mut Self {
        self.literal(value, 2)
    }

    fn value_local_hit(&mut self, id: u64, count: usize) -> &mut Self {
        self.uint(0);
        self.code(id, width(count))
    }

    fn value_global_hit(&mut self, id: u64, count: usize) -> &mut Self {
        self.uint(1);
        self.code(id, width(count))
    }

    fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.w).into_vec()
    }
}

/// `⌈log₂ n⌉`, 0 fuer n <= 1.
#[allow(dead_code)]
fn width(n: usize) -> u8 {
    if n <= 1 { 0 } else { (usize::BITS - (n - 1).leading_zeros()) as u8 }
}

/// `<root attr="v"><child/>text</root>` im Default-Modus oder byte-aligned.
#[allow(dead_code)]
fn root_attr_child_text(aligned: bool) -> Vec<u8> {
    root_attr_child_text_in(if aligned { Stream::byte_aligned() } else { Stream::new() })
}

/// Options-Dokument: lesscommon/uncommon/alignment/byte, sonst Defaults.
#[allow(dead_code)]
const BYTE_ALIGNMENT_OPTIONS: [(u64, u8); 8] =
    [(0, 1), (0, 2), (0, 2), (0, 3), (0, 1), (4, 3), (2, 2), (2, 2)];

/// Wie [`root_attr_child_text`] byte-aligned, das Alignment steht aber im Header.
#[allow(dead_code)]
fn root_attr_child_text_header_options() -> Vec<u8> {
    root_attr_child_text_in(Stream::with_header_options(&BYTE_ALIGNMENT_OPTIONS, true))
}

/// Body von `<root attr="v"><child/>text</root>` hinter dem Header von `s`.
#[allow(dead_code)]
fn root_attr_child_text_in(mut s: Stream) -> Vec<u8> {
    // SD, SE(*) der Document-Grammatik: 0 Bits
    s.uri_hit(0, 3).local_miss("root");
    // root StartTagContent: Escape (0 Bits), AT(*) = 1 von 4
    s.code(1, 2).uri_hit(0, 3).local_miss("attr").value_miss("v");
    // 1 gelernte Production (AT attr): Escape = 1 von 2, SE(*) = 2 von 4
    s.code(1, 1).code(2, 2).uri_hit(0, 3).local_miss("child");
    // child StartTagContent: Escape, EE = 0 von 4
    s.code(0, 2);
    // root ElementContent: [EE, Escape], CH = 1 von 2
    s.code(1, 1).code(1, 1).value_miss("text");
    // root ElementContent: [CH, EE, Escape], EE = 1 von 3
    s.code(1, 2);
    s.finish()
}

/// `<list><item>x</item><item>x</item></list>`: gelernte SE(item), CH und lokaler Value-Hit.
#[allow(dead_code)]
fn repeated_items() -> Vec<u8> {
    let mut s = Stream::new();
    s.uri_hit(0, 3).local_miss("list");
    // list STC: SE(*) = 2 von 4
    s.code(2, 2).uri_hit(0, 3).local_miss("item");
    // item STC: CH = 3 von 4
    s.code(3, 2).value_miss("x");
    // CH wurde in StartTagContent gelernt; ElementContent bleibt [EE, Esc]
    s.code(0, 1);
    // list ElementContent: [EE, Esc], Esc + SE(*) = 0 von 2; "" hat list(0), item(1)
    s.code(1, 1).code(0, 1).uri_hit(0, 3).local_hit(1, 2);
    // item STC hat gelerntes CH: [CH, Esc], CH = 0; local hit id 0 von 1
    s.code(0, 1).value_local_hit(0, 1);
    s.code(0, 1);
    // list ElementContent: [SE(item), EE, Esc], EE = 1 von 3
    s.code(1, 2);
    s.finish()
}

/// `<r a="shared" b="shared"/>`: zweiter Value ist ein globaler Hit.
#[allow(dead_code)]
fn shared_value_attributes() -> Vec<u8> {
    let mut s = Stream::new();
    s.uri_hit(0, 3).local_miss("r");
    s.code(1, 2).uri_hit(0, 3).local_miss("a").value_miss("shared");
    // STC [AT(a), Esc]: Esc, AT(*) = 1 von 4
    s.code(1, 1).code(1, 2).uri_hit(0, 3).local_miss("b").value_global_hit(0, 1);
    // STC [AT(b), AT(a), Esc] = 2 Bits, Esc = 2, EE = 0 von 4
    s.code(2, 2).code(0, 2);
    s.finish()
}

/// `<r xmlns="urn:x" xsi:type="T"/>`: neue URI, xsi:type als QName-Value.
#[allow(dead_code)]
fn xsi_typed_root() -> Vec<u8> {
    let mut s = Stream::new();
    s.uri_miss("urn:x", 3).local_miss("r");
    // AT(*) xsi:type: URI 2 von 4 (jetzt 4 URIs → 3 Bits), LocalName-Hit type(1) von 2
    s.code(1, 2).uri_hit(2, 4).local_hit(1, 2);
    // Value als QName: URI urn:x (3), LocalName-Miss "T"
    s.uri_hit(3, 4).local_miss("T");
    // STC [AT(xsi:type), Esc]: Esc + EE
    s.code(1, 1).code(0, 2);
    s.finish()
}

/// `<p:r xmlns:p="urn:p"><p:c/></p:r>`, nur mit erhaltenen Prefixen decodierbar.
#[allow(dead_code)]
fn prefixed_child() -> Vec<u8> {
    let mut s = Stream::new();
    // URI-Miss urn:p; Prefix-Partition leer → kein Prefix im QName
    s.uri_miss("urn:p", 3).local_miss("r");
    // STC mit NS: 5 Alternativen = 3 Bits, NS = 2
    s.code(2, 3).uri_hit(3, 4);
    // Prefix-Miss (0 von 1 Alternativen = 0 Bits), String "p", local-element-ns = 1
    s.code(0, 0).literal("p", 0).code(1, 1);
    // SE(*) = 3 von 5; Kind in urn:p hat jetzt Prefix p (1 Eintrag, 0 Bits)
    s.code(3, 3).uri_hit(3, 4).local_miss("c").code(0, 0);
    // c: EE = 0 von 5
    s.code(0, 3);
    // SE(c) wurde in StartTagContent gelernt: r ElementContent ist [EE, Esc]
    s.code(0, 1);
    s.finish()
}
