#![no_main]

use libfuzzer_sys::fuzz_target;
use imagewarden_policy::{CompiledPatterns, PatternSet};

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let patterns = PatternSet::parse(content);
        for pattern in patterns.iter() {
            assert!(!pattern.is_empty());
            assert!(!pattern.starts_with('#'));
            assert_eq!(pattern, pattern.trim());
        }
        let _ = CompiledPatterns::compile(&patterns);
    }
});
