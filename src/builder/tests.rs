use std::rc::Rc;

use super::*;
use crate::sink::NameRef;
use crate::typed_value::DateTimeKind;

include!("../../tests/common/recording.rs");

fn q(local: &str) -> QName {
    QName::new("", local)
}

fn builder() -> TreeBuilder<RecordingSink> {
    TreeBuilder::new(RecordingSink::default())
}

fn started() -> TreeBuilder<RecordingSink> {
    let mut b = builder();
    b.start_document().unwrap();
    b
}

fn calls(b: &TreeBuilder<RecordingSink>) -> &[String] {
    &b.sink().calls
}

// ========================================================================
// Flush-Vertrag
// ========================================================================

#[test]
fn root_attr_child_text_sequence() {
    let mut b = started();
    b.start_element(&q("root")).unwrap();
    b.attribute(&q("attr")).unwrap();
    b.string_data("v").unwrap();
    // Start-Tag von root ist noch zurueckgehalten
    assert_eq!(calls(&b), ["SD"]);
    b.start_element(&q("child")).unwrap();
    b.end_element().unwrap();
    b.string_data("text").unwrap();
    b.end_element().unwrap();
    b.end_document().unwrap();
    assert_eq!(
        calls(&b),
        ["SD", "SE root [attr=v]", "SE child []", "EE child", "CH text", "EE root", "ED"]
    );
    assert_eq!(b.state(), BuilderState::NoDocument);
    assert_eq!(b.depth(), 0);
}

#[test]
fn flush_is_idempotent() {
    let mut b = started();
    b.start_element(&q("a")).unwrap();
    b.flush().unwrap();
    b.flush().unwrap();
    assert_eq!(b.sink().count("SE"), 1);
    assert_eq!(b.state(), BuilderState::ElementOpen(StartTag::Emitted));
}

#[test]
fn flush_without_pending_start_is_noop() {
    let mut b = started();
    b.flush().unwrap();
    assert_eq!(calls(&b), ["SD"]);
}

#[test]
fn end_element_flushes_empty_element() {
    let mut b = started();
    b.start_element(&q("e")).unwrap();
    b.end_element().unwrap();
    assert_eq!(calls(&b), ["SD", "SE e []", "EE e"]);
    assert_eq!(b.state(), BuilderState::DocumentRoot);
}

/// Mehrere Attribute landen alle im Start-Tag, in Deklarationsreihenfolge.
#[test]
fn all_attributes_are_flushed_in_declaration_order() {
    let mut b = started();
    b.start_element(&q("e")).unwrap();
    for (name, value) in [("a", "1"), ("b", "2"), ("c", "3")] {
        b.attribute(&q(name)).unwrap();
        b.string_data(value).unwrap();
    }
    assert_eq!(b.pending_attributes(), 3);
    b.end_element().unwrap();
    assert_eq!(calls(&b)[1], "SE e [a=1, b=2, c=3]");
    assert_eq!(b.pending_attributes(), 0);
}

#[test]
fn attribute_without_value_is_flushed_empty() {
    let mut b = started();
    b.start_element(&q("e")).unwrap();
    b.attribute(&q("a")).unwrap();
    b.end_element().unwrap();
    assert_eq!(calls(&b)[1], "SE e [a=]");
}

#[test]
fn attribute_before_previous_value_is_inconsistent() {
    let mut b = started();
    b.start_element(&q("e")).unwrap();
    b.attribute(&q("a")).unwrap();
    assert_eq!(b.attribute(&q("b")), Err(Error::Inconsistent(Inconsistency::AttributeOutsideStartTag)));
    assert_eq!(b.state(), BuilderState::AttributeOpen);
    assert_eq!(b.pending_attributes(), 1);
}

#[test]
fn character_data_flushes_start_tag() {
    let mut b = started();
    b.start_element(&q("e")).unwrap();
    b.attribute(&q("a")).unwrap();
    b.string_data("1").unwrap();
    b.string_data("body").unwrap();
    assert_eq!(calls(&b), ["SD", "SE e [a=1]", "CH body"]);
}

#[test]
fn namespaced_names_reach_the_sink() {
    let mut b = started();
    b.start_element(&QName::new("urn:x", "e").with_prefix("x")).unwrap();
    b.attribute(&QName::new("urn:y", "a")).unwrap();
    b.string_data("1").unwrap();
    b.end_element().unwrap();
    assert_eq!(calls(&b)[1], "SE {urn:x}x:e [{urn:y}a=1]");
    assert_eq!(calls(&b)[2], "EE {urn:x}x:e");
}

#[test]
fn namespace_declarations_are_buffered_with_start_tag() {
    let mut b = started();
    b.start_element(&QName::new("urn:p", "e")).unwrap();
    let ns = NamespaceDeclaration { uri: Rc::from("urn:p"), prefix: Rc::from("p"), local_element_ns: true };
    b.namespace_declaration(&ns).unwrap();
    let default_ns = NamespaceDeclaration { uri: Rc::from("urn:d"), prefix: Rc::from(""), local_element_ns: false };
    b.namespace_declaration(&default_ns).unwrap();
    assert_eq!(calls(&b), ["SD"]);
    b.end_element().unwrap();
    assert_eq!(calls(&b)[1], "SE {urn:p}p:e xmlns:p=urn:p xmlns=urn:d []");
    assert_eq!(calls(&b)[2], "EE {urn:p}p:e");
}

#[test]
fn namespace_declaration_after_flush_is_rejected() {
    let mut b = started();
    b.start_element(&q("e")).unwrap();
    b.flush().unwrap();
    let ns = NamespaceDeclaration { uri: Rc::from("urn:p"), prefix: Rc::from("p"), local_element_ns: false };
    let err = b.namespace_declaration(&ns).unwrap_err();
    assert!(matches!(err, Error::Inconsistent(Inconsistency::UnexpectedEvent { .. })), "{err}");
}

// ========================================================================
// Inkonsistente Zustaende
// ========================================================================

#[test]
fn duplicate_value_fails_without_overwriting() {
    let mut b = started();
    b.start_element(&q("e")).unwrap();
    b.attribute(&q("a")).unwrap();
    b.string_data("first").unwrap();
    // Zustand wie bei einem zweiten Value fuer dasselbe offene Attribut
    b.state = BuilderState::AttributeOpen;
    let err = b.string_data("second").unwrap_err();
    assert_eq!(err, Error::Inconsistent(Inconsistency::DuplicateValue));
    assert_eq!(b.attributes[0].value.as_deref(), Some("first"));
}

#[test]
fn end_element_on_empty_stack_is_inconsistent() {
    let mut b = started();
    assert_eq!(b.end_element(), Err(Error::Inconsistent(Inconsistency::UnmatchedEndElement)));
    assert_eq!(builder().end_element(), Err(Error::Inconsistent(Inconsistency::UnmatchedEndElement)));
    assert_eq!(b.depth(), 0);
}

#[test]
fn attribute_outside_start_tag_is_inconsistent() {
    let mut b = started();
    let outside = Err(Error::Inconsistent(Inconsistency::AttributeOutsideStartTag));
    assert_eq!(b.attribute(&q("a")), outside);
    b.start_element(&q("e")).unwrap();
    b.string_data("text").unwrap();
    assert_eq!(b.attribute(&q("a")), outside);
}

#[test]
fn characters_without_document_go_to_the_sink() {
    let mut b = builder();
    b.string_data("x").unwrap();
    assert_eq!(calls(&b), ["CH x"]);
    assert_eq!(b.state(), BuilderState::NoDocument);

    // Das Arena-Dokument lehnt Text vor start_document ab
    let mut doc = TreeBuilder::new(crate::tree::Document::new());
    assert!(matches!(doc.string_data("x"), Err(Error::Sink(_))));
    assert_eq!(doc.state(), BuilderState::NoDocument);
}

#[test]
fn characters_between_elements_pass_through() {
    let mut b = started();
    b.string_data("\n").unwrap();
    assert_eq!(calls(&b), ["SD", "CH \n"]);
}

#[test]
fn start_element_before_document_is_rejected() {
    let mut b = builder();
    assert_eq!(b.start_element(&q("e")), Err(Error::unexpected("start-element", "NoDocument")));
}

#[test]
fn second_start_document_is_rejected() {
    let mut b = started();
    assert_eq!(b.start_document(), Err(Error::unexpected("start-document", "DocumentRoot")));
}

#[test]
fn end_document_with_open_element_is_rejected() {
    let mut b = started();
    b.start_element(&q("e")).unwrap();
    let err = b.end_document().unwrap_err();
    assert_eq!(err, Error::unexpected("end-document", "ElementOpen(Deferred)"));
}

// ========================================================================
// Typed Data und Binary
// ========================================================================

/// Baut `<e a=VALUE>VALUE</e>` einmal mit einem typed Callback und einmal
/// mit dem lexikalischen String.
fn typed_vs_literal(typed: impl Fn(&mut TreeBuilder<RecordingSink>) -> Result<()>, literal: &str) {
    let run = |data: &dyn Fn(&mut TreeBuilder<RecordingSink>) -> Result<()>| {
        let mut b = started();
        b.start_element(&q("e")).unwrap();
        b.attribute(&q("a")).unwrap();
        data(&mut b).unwrap();
        data(&mut b).unwrap();
        b.end_element().unwrap();
        b.into_sink().calls
    };
    let from_typed = run(&typed);
    let from_literal = run(&|b: &mut TreeBuilder<RecordingSink>| b.string_data(literal));
    assert_eq!(from_typed, from_literal);
    assert_eq!(from_typed[1], format!("SE e [a={literal}]"));
}

#[test]
fn typed_data_matches_literal_strings() {
    typed_vs_literal(|b| b.integer_data(-42), "-42");
    typed_vs_literal(|b| b.boolean_data(true), "true");
    typed_vs_literal(|b| b.boolean_data(false), "false");
    typed_vs_literal(
        |b| b.decimal_data(Decimal { negative: false, integral: 12, fractional: 43 }),
        "12.34",
    );
    typed_vs_literal(|b| b.float_data(Float::Value { mantissa: 15, exponent: -1 }), "15E-1");
    typed_vs_literal(|b| b.float_data(Float::NaN), "NaN");
    let dt = DateTime {
        kind: DateTimeKind::Date,
        year: 25,
        month: 3,
        day: 9,
        hour: 0,
        minute: 0,
        second: 0,
        fractional_secs: None,
        timezone_offset_minutes: Some(0),
    };
    typed_vs_literal(move |b| b.datetime_data(dt), "2025-03-09Z");
}

#[test]
fn binary_data_is_not_implemented_and_changes_nothing() {
    let mut b = started();
    b.start_element(&q("e")).unwrap();
    b.attribute(&q("a")).unwrap();
    let before = (b.state(), b.depth(), b.pending_attributes());
    assert_eq!(b.binary_data(&[1, 2, 3]), Err(Error::NotImplemented("binary data")));
    assert_eq!((b.state(), b.depth(), b.pending_attributes()), before);
    assert_eq!(b.attributes[0].value, None);
    assert_eq!(calls(&b), ["SD"]);
}

// ========================================================================
// Abbruch
// ========================================================================

#[test]
fn fatal_error_forwards_message_and_releases_frames() {
    let mut b = started();
    b.start_element(&q("a")).unwrap();
    b.start_element(&q("b")).unwrap();
    b.attribute(&q("x")).unwrap();
    b.fatal_error(&Error::PrematureEndOfStream);
    assert_eq!(b.state(), BuilderState::Aborted);
    assert_eq!((b.depth(), b.pending_attributes()), (0, 0));
    assert_eq!(b.sink().fatal, [Error::PrematureEndOfStream.to_string()]);
    assert_eq!(b.string_data("x"), Err(Error::Inconsistent(Inconsistency::Aborted)));
    assert_eq!(b.end_element(), Err(Error::Inconsistent(Inconsistency::Aborted)));
}

#[test]
fn abort_is_repeatable() {
    let mut b = started();
    b.start_element(&q("a")).unwrap();
    b.abort();
    b.abort();
    assert_eq!(b.state(), BuilderState::Aborted);
    assert!(b.sink().fatal.is_empty());
}

#[test]
fn sink_error_propagates_and_clears_pending_frames() {
    let mut b = TreeBuilder::new(RecordingSink::failing_on("SE"));
    b.start_document().unwrap();
    b.start_element(&q("e")).unwrap();
    b.attribute(&q("a")).unwrap();
    b.string_data("1").unwrap();
    assert!(matches!(b.end_element(), Err(Error::Sink(_))));
    assert_eq!(b.pending_attributes(), 0);
}

#[test]
fn finish_requires_complete_document() {
    let mut b = started();
    b.start_element(&q("e")).unwrap();
    assert!(b.finish().is_err());

    let mut b = started();
    b.start_element(&q("e")).unwrap();
    b.end_element().unwrap();
    b.end_document().unwrap();
    let sink = b.finish().unwrap();
    assert_eq!(sink.calls.last().map(String::as_str), Some("ED"));
}

#[test]
fn state_names_are_stable() {
    assert_eq!(BuilderState::ElementOpen(StartTag::Emitted).name(), "ElementOpen(Emitted)");
    assert_eq!(BuilderState::AttributeOpen.name(), "AttributeOpen");
}
