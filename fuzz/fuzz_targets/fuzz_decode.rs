#![no_main]
use ans_stream::{stream, Distribution, EntropyCode, HybridUintConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // Byte 0: value count (0-255)
    let count = usize::from(data[0]);

    // Byte 1: alphabet size of the flat table (1-256)
    let Ok(distribution) = Distribution::flat(usize::from(data[1]) + 1) else {
        return;
    };

    let code = EntropyCode::single(HybridUintConfig::default(), distribution);
    let _ = stream::decode_tokens(&code, &data[2..], &vec![0; count]);
});
