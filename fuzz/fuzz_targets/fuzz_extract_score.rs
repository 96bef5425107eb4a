//! Fuzz target: score extraction from arbitrary game output.
//!
//! `extract_score` is total; it must never panic, and a sanitized score
//! never exceeds `MAX_SCORE`.
#![no_main]

use arcade_core::{extract_score, sanitize_score, MAX_SCORE};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let score = sanitize_score(extract_score(text));
    assert!(score <= MAX_SCORE);
});
