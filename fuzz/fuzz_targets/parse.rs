#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = eximl::parse(data) {
        let _ = doc.to_xml();
    }
    let opts = eximl::ExiOptions::default()
        .with_alignment(eximl::Alignment::ByteAlignment)
        .with_preserve_prefixes()
        .with_value_partition_capacity(4);
    let _ = eximl::parse_with_options(data, opts);
});
