#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = eximl::bitstream::BitReader::new(data);
    let _ = eximl::header::decode(&mut reader, true);
});
