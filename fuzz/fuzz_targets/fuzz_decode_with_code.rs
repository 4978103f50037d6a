#![no_main]
use ans_stream::stream;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Byte 0: value count, contexts cycle over 0-3
    let contexts: Vec<usize> = (0..usize::from(data[0])).map(|i| i % 4).collect();
    let _ = stream::decode_with_code(&data[1..], &contexts);
});
