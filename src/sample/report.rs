//! Sample report types and terminal formatting.
//!
//! A [`SampleReport`] describes one sampling run: the layer settings it ran
//! with, per-axis statistics of the drawn shear factors, and the raw
//! vectors. It renders as text (Display) or serializes as JSON.

use serde::Serialize;
use std::fmt;

use super::SampleOptions;
use crate::backend::Backend;
use crate::layer::RandomShear;

/// One sampled shear vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SampledVector {
    /// Sampling step (one layer call) the vector came from.
    pub step: usize,
    /// Image index within the batch.
    pub index: usize,
    /// Sign shared by both axes, `-1` or `1`.
    pub sign: f32,
    pub shear_x: f32,
    pub shear_y: f32,
}

/// Summary statistics of one shear axis.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AxisStats {
    /// Configured sampling range, before sign randomisation.
    pub range: (f32, f32),
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub mean: Option<f64>,
    /// Mean of absolute values.
    pub mean_abs: Option<f64>,
}

impl AxisStats {
    fn from_values(range: (f32, f32), values: &[f32]) -> Self {
        if values.is_empty() {
            return Self {
                range,
                ..Default::default()
            };
        }

        let n = values.len() as f64;
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let sum: f64 = values.iter().map(|v| *v as f64).sum();
        let sum_abs: f64 = values.iter().map(|v| v.abs() as f64).sum();

        Self {
            range,
            min: Some(min),
            max: Some(max),
            mean: Some(sum / n),
            mean_abs: Some(sum_abs / n),
        }
    }
}

/// The result of a sampling run.
#[derive(Clone, Debug, Serialize)]
pub struct SampleReport {
    pub batch_size: usize,
    pub steps: usize,
    /// Layer seed, if the config set one.
    pub seed: Option<u64>,
    pub x: AxisStats,
    pub y: AxisStats,
    /// Images whose shared sign came out negative.
    pub negative: usize,
    /// Images whose shared sign came out positive.
    pub positive: usize,
    pub vectors: Vec<SampledVector>,
}

impl SampleReport {
    pub fn new<B: Backend>(
        layer: &RandomShear<B>,
        opts: &SampleOptions,
        vectors: Vec<SampledVector>,
    ) -> Self {
        let xs: Vec<f32> = vectors.iter().map(|v| v.shear_x).collect();
        let ys: Vec<f32> = vectors.iter().map(|v| v.shear_y).collect();
        let x_range = layer.x_range();
        let y_range = layer.y_range();

        let negative = vectors.iter().filter(|v| v.sign < 0.0).count();

        Self {
            batch_size: opts.batch_size,
            steps: opts.steps,
            seed: layer.config().seed,
            x: AxisStats::from_values((x_range.lower(), x_range.upper()), &xs),
            y: AxisStats::from_values((y_range.lower(), y_range.upper()), &ys),
            negative,
            positive: vectors.len() - negative,
            vectors,
        }
    }

    pub fn total(&self) -> usize {
        self.vectors.len()
    }
}

impl fmt::Display for SampleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Sampled {} shear vector(s): {} step(s) x batch size {}",
            self.total(),
            self.steps,
            self.batch_size
        )?;
        match self.seed {
            Some(seed) => writeln!(f, "Seed: {}", seed)?,
            None => writeln!(f, "Seed: (random)")?,
        }
        writeln!(f)?;
        fmt_axis(f, "x", &self.x)?;
        fmt_axis(f, "y", &self.y)?;
        writeln!(f)?;
        writeln!(
            f,
            "Sign: {} negative, {} positive",
            self.negative, self.positive
        )
    }
}

fn fmt_axis(f: &mut fmt::Formatter<'_>, name: &str, stats: &AxisStats) -> fmt::Result {
    write!(
        f,
        "  shear_{}  range [{:.4}, {:.4}]",
        name, stats.range.0, stats.range.1
    )?;
    match (stats.min, stats.max, stats.mean, stats.mean_abs) {
        (Some(min), Some(max), Some(mean), Some(mean_abs)) => writeln!(
            f,
            "  min {:.4}  max {:.4}  mean {:.4}  mean |s| {:.4}",
            min, max, mean, mean_abs
        ),
        _ => writeln!(f, "  (no samples)"),
    }
}
