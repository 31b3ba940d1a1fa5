//! Fehlgeschlagene Parses hinterlassen keine Allokationen.
//!
//! Laeuft ohne libtest-Harness (`harness = false`), damit keine anderen
//! Threads waehrend der Messung allokieren.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicIsize, Ordering};

use eximl::bitstream::BitWriter;
use eximl::{AttributeRef, Error, ExiOptions, NameRef, NamespaceRef, Result, TreeSink, parse, parse_into};

include!("common/stream.rs");
include!("common/recording.rs");

/// Zaehlt lebende Allokationen.
struct Counting;

static LIVE: AtomicIsize = AtomicIsize::new(0);

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            LIVE.fetch_add(1, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        LIVE.fetch_sub(1, Ordering::SeqCst);
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

fn live() -> isize {
    LIVE.load(Ordering::SeqCst)
}

/// Fuehrt `f` aus und liefert die Differenz lebender Allokationen.
fn leaked(f: impl FnOnce()) -> isize {
    let before = live();
    f();
    live() - before
}

fn assert_failed_parse_leaks_nothing(label: &str, data: &[u8]) {
    let diff = leaked(|| {
        let err = parse(data).unwrap_err();
        assert!(matches!(err.root_cause(), Error::PrematureEndOfStream), "{label}: {err}");
    });
    assert_eq!(diff, 0, "{label}: {diff} allocation(s) leaked");
    println!("ok {label}");
}

fn main() {
    let full = root_attr_child_text(false);
    // Einmalige globale Initialisierung (ahash Seed) vor der Messung
    parse(&full).unwrap();
    parse(&full).unwrap();

    // Abbruch im Attributnamen: root offen, Start-Tag zurueckgehalten
    assert_failed_parse_leaks_nothing("inside attribute", &full[..10]);
    // Abbruch im Namen von child: root mit Attribut-Frame offen
    assert_failed_parse_leaks_nothing("inside child name", &full[..20]);
    // Abbruch im Text: root emittiert und offen
    assert_failed_parse_leaks_nothing("inside text", &full[..22]);

    let diff = leaked(|| {
        let mut sink = RecordingSink::failing_on("SE child");
        let err = parse_into(&full, ExiOptions::default(), &mut sink).unwrap_err();
        assert!(matches!(err.root_cause(), Error::Sink(_)), "{err}");
        drop(err);
        drop(sink);
    });
    assert_eq!(diff, 0, "sink rejection: {diff} allocation(s) leaked");
    println!("ok sink rejection");

    let diff = leaked(|| {
        let doc = parse(&full).unwrap();
        drop(doc);
    });
    assert_eq!(diff, 0, "successful parse: {diff} allocation(s) leaked");
    println!("ok successful parse");
}
