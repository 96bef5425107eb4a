//! Fuzz target: JSON deserialization of `SetAccessBody`.
//!
//! Arbitrary bytes fed to the body parser must never panic; errors are
//! expected and fine.
#![no_main]

use arcade_gateway::routes::SetAccessBody;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = serde_json::from_slice::<SetAccessBody>(data) {
        let _ = body.games.len();
    }
});
