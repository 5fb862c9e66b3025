#![no_main]
use libfuzzer_sys::fuzz_target;
use obfid_rs::{Codec, Config};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Ok(config) = Config::new(35) {
        let codec = Codec::new(&config.seed(b"fuzz"));
        if let Ok(plain) = codec.deobfuscate(&text) {
            let code = codec.obfuscate(plain).unwrap();
            assert_eq!(code, text.to_lowercase());
        }
    }
});
