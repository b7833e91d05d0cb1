//! Fuzz target for layer config parsing.
//!
//! Feeds arbitrary bytes to the config parser and builds a layer from
//! anything that parses, checking for panics in factor validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use randshear::config::from_json_str;
use randshear::RandomShear;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(config) = from_json_str(text) {
        let _ = RandomShear::new(config);
    }
});
