#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text must lex or fail cleanly
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = throwcheck::lexer::lex(s);
    }
});
