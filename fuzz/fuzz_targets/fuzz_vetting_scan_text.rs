//! Fuzz target: dangerous-call signature matching.
//!
//! The vetter runs on untrusted payload text and must never panic.
#![no_main]

use std::sync::LazyLock;

use arcade_launcher::StaticVetter;
use libfuzzer_sys::fuzz_target;

static VETTER: LazyLock<StaticVetter> = LazyLock::new(StaticVetter::default);

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let _ = VETTER.first_match(&text);
});
