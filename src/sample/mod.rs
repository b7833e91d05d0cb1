//! Repeated shear factor sampling for inspection.
//!
//! Runs the layer's sampler for a number of steps without touching any
//! image data, which is handy for checking what a config will actually do
//! before it goes into a training pipeline.

pub mod report;

use std::io::Write;

use crate::backend::Backend;
use crate::error::RandShearError;
use crate::layer::RandomShear;

pub use report::{AxisStats, SampleReport, SampledVector};

/// Sampling options.
#[derive(Clone, Debug)]
pub struct SampleOptions {
    pub batch_size: usize,
    pub steps: usize,
}

/// Validate sampling options before running.
pub fn validate_sample_options(opts: &SampleOptions) -> Result<(), RandShearError> {
    if opts.batch_size == 0 {
        return Err(RandShearError::InvalidSampleParams {
            message: "--batch-size must be greater than 0".to_string(),
        });
    }

    if opts.steps == 0 {
        return Err(RandShearError::InvalidSampleParams {
            message: "--steps must be greater than 0".to_string(),
        });
    }

    Ok(())
}

/// Draw `opts.steps` batches of shear vectors from `layer`.
///
/// Each step advances the layer's generator once, exactly as a training
/// call would.
pub fn sample_shear_vectors<B: Backend>(
    layer: &mut RandomShear<B>,
    opts: &SampleOptions,
) -> Result<Vec<SampledVector>, RandShearError> {
    validate_sample_options(opts)?;

    let mut vectors = Vec::with_capacity(opts.batch_size * opts.steps);
    for step in 0..opts.steps {
        let transformation = layer.sample_transformation(opts.batch_size, None)?;
        for (index, ((sign, shear_x), shear_y)) in transformation
            .sign()
            .iter()
            .zip(transformation.shear_x().iter())
            .zip(transformation.shear_y().iter())
            .enumerate()
        {
            vectors.push(SampledVector {
                step,
                index,
                sign: *sign,
                shear_x: *shear_x,
                shear_y: *shear_y,
            });
        }
    }

    Ok(vectors)
}

/// Run the sampler and summarise the result.
pub fn sample_report<B: Backend>(
    layer: &mut RandomShear<B>,
    opts: &SampleOptions,
) -> Result<SampleReport, RandShearError> {
    let vectors = sample_shear_vectors(layer, opts)?;
    Ok(SampleReport::new(layer, opts, vectors))
}

/// Write sampled vectors as CSV with a `step,index,sign,shear_x,shear_y` header.
pub fn write_vectors_csv<W: Write>(
    writer: W,
    vectors: &[SampledVector],
) -> Result<(), RandShearError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for vector in vectors {
        csv_writer.serialize(vector)?;
    }
    csv_writer.flush()?;
    Ok(())
}
