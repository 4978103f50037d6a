#![no_main]
use ans_stream::{stream, EntropyCode, HybridUintConfig, Token};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // Bytes 0-2: hybrid uint config, reduced to a valid one
    let split = u32::from(data[0] % 9);
    let msb = u32::from(data[1]) % (split + 1);
    let lsb = u32::from(data[2]) % (split - msb + 1);
    let Ok(config) = HybridUintConfig::new(split, msb, lsb) else {
        return;
    };

    // Rest: little-endian u16 values, context from the low bit
    let tokens: Vec<Token> = data[3..]
        .chunks_exact(2)
        .map(|pair| {
            let value = u16::from_le_bytes([pair[0], pair[1]]);
            Token::new(usize::from(value & 1), u32::from(value >> 1))
        })
        .collect();

    let Ok(code) = EntropyCode::from_tokens(config, 2, &tokens) else {
        return;
    };
    let bytes = stream::encode_with_code(&code, &tokens).expect("encode with gathered code");
    let contexts: Vec<usize> = tokens.iter().map(|t| t.context).collect();
    let (decoded_code, values) = stream::decode_with_code(&bytes, &contexts).expect("decode");
    assert_eq!(decoded_code, code);
    assert!(values.iter().zip(&tokens).all(|(&v, t)| v == t.value));
});
