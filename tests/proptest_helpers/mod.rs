#![allow(dead_code)]

use ndarray::{Array4, ArrayD};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

use randshear::config::{DataFormat, FactorSpec, FillMode, Interpolation, RandomShearConfig};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_unit_factor() -> BoxedStrategy<f32> {
    prop_oneof![Just(0.0f32), Just(1.0f32), 0.0f32..=1.0f32].boxed()
}

pub fn arb_factor_spec() -> BoxedStrategy<FactorSpec> {
    prop_oneof![
        arb_unit_factor().prop_map(FactorSpec::Scalar),
        (arb_unit_factor(), arb_unit_factor()).prop_map(|(a, b)| FactorSpec::Range(vec![a, b])),
    ]
    .boxed()
}

pub fn arb_interpolation() -> BoxedStrategy<Interpolation> {
    prop_oneof![Just(Interpolation::Nearest), Just(Interpolation::Bilinear)].boxed()
}

pub fn arb_fill_mode() -> BoxedStrategy<FillMode> {
    prop_oneof![
        Just(FillMode::Constant),
        Just(FillMode::Nearest),
        Just(FillMode::Wrap),
        Just(FillMode::Reflect),
    ]
    .boxed()
}

pub fn arb_data_format() -> BoxedStrategy<DataFormat> {
    prop_oneof![Just(DataFormat::ChannelsLast), Just(DataFormat::ChannelsFirst)].boxed()
}

/// A fully seeded config with valid factors.
pub fn arb_config() -> BoxedStrategy<RandomShearConfig> {
    (
        arb_factor_spec(),
        arb_factor_spec(),
        arb_interpolation(),
        arb_fill_mode(),
        -1.0f32..=1.0f32,
        arb_data_format(),
        any::<u64>(),
    )
        .prop_map(
            |(x_factor, y_factor, interpolation, fill_mode, fill_value, data_format, seed)| {
                RandomShearConfig {
                    name: None,
                    x_factor,
                    y_factor,
                    interpolation,
                    fill_mode,
                    fill_value,
                    data_format,
                    seed: Some(seed),
                }
            },
        )
        .boxed()
}

/// A batch `[batch, height, width, channels]` with distinct pixel values.
pub fn arb_images(
    max_batch: usize,
    max_side: usize,
    max_channels: usize,
) -> BoxedStrategy<Array4<f32>> {
    assert!(max_batch > 0, "max_batch must be > 0");
    assert!(max_side > 0, "max_side must be > 0");
    assert!(max_channels > 0, "max_channels must be > 0");

    (
        1usize..=max_batch,
        1usize..=max_side,
        1usize..=max_side,
        1usize..=max_channels,
    )
        .prop_map(|(batch, height, width, channels)| {
            Array4::from_shape_fn((batch, height, width, channels), |(b, y, x, c)| {
                (((b * height + y) * width + x) * channels + c) as f32
            })
        })
        .boxed()
}

/// Lays a channels-last batch out for `data_format`.
pub fn in_layout(images: &Array4<f32>, data_format: DataFormat) -> ArrayD<f32> {
    match data_format {
        DataFormat::ChannelsLast => images.clone().into_dyn(),
        DataFormat::ChannelsFirst => images
            .view()
            .permuted_axes([0, 3, 1, 2])
            .as_standard_layout()
            .into_owned()
            .into_dyn(),
    }
}
