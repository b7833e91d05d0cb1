//! Fuzz target for tensor parsing and shearing.
//!
//! Parses arbitrary bytes as a tensor and, when it is small enough, runs a
//! training call of a fixed layer over it. Any shape must either shear or
//! fail with an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use randshear::config::{FillMode, RandomShearConfig};
use randshear::tensor_io::from_json_str;
use randshear::{ImagePreprocessingLayer, LayerData, RandomShear};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(images) = from_json_str(text) else {
        return;
    };
    if images.len() > 64 * 1024 {
        return;
    }

    let config = RandomShearConfig::new(1.0, 1.0)
        .with_fill_mode(FillMode::Reflect)
        .with_seed(0);
    let Ok(mut layer) = RandomShear::new(config) else {
        return;
    };
    let _ = layer.call(LayerData::new(images), true);
});
