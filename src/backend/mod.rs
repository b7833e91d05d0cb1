//! Numeric runtime operations used by the shear layer.
//!
//! The layer never reaches for array operations directly; it goes through a
//! [`Backend`], chosen once when the layer is built. [`NdarrayBackend`] is
//! the default CPU implementation.

pub mod affine;

use ndarray::{Array2, Array4, ArrayView1, ArrayView2, ArrayView4, Axis};
use rand::distr::{Distribution, StandardUniform};
use rand::rngs::StdRng;

use crate::config::{DataFormat, FillMode, Interpolation};
use crate::error::RandShearError;

/// The array operations the shear sampler and applicator need.
pub trait Backend {
    /// Draws a `[rows, 1]` column uniformly from `[minval, maxval)`.
    ///
    /// `minval == maxval` is allowed and yields a constant column.
    fn uniform(&self, rng: &mut StdRng, rows: usize, minval: f32, maxval: f32) -> Array2<f32>;

    /// Elementwise `if value > threshold { if_true } else { if_false }`.
    fn where_greater(
        &self,
        values: ArrayView2<'_, f32>,
        threshold: f32,
        if_true: f32,
        if_false: f32,
    ) -> Array2<f32>;

    /// Stacks equally long 1-D columns side by side into `[len, columns.len()]`.
    fn stack_columns(&self, columns: &[ArrayView1<'_, f32>]) -> Result<Array2<f32>, RandShearError>;

    /// Warps a batch of images, one transform row per image.
    ///
    /// See [`affine::affine_transform`] for the transform convention.
    fn affine_transform(
        &self,
        images: ArrayView4<'_, f32>,
        transforms: ArrayView2<'_, f32>,
        interpolation: Interpolation,
        fill_mode: FillMode,
        fill_value: f32,
        data_format: DataFormat,
    ) -> Result<Array4<f32>, RandShearError>;
}

/// CPU backend built on `ndarray`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NdarrayBackend;

impl Backend for NdarrayBackend {
    fn uniform(&self, rng: &mut StdRng, rows: usize, minval: f32, maxval: f32) -> Array2<f32> {
        Array2::from_shape_simple_fn((rows, 1), || {
            let u: f32 = StandardUniform.sample(&mut *rng);
            minval + (maxval - minval) * u
        })
    }

    fn where_greater(
        &self,
        values: ArrayView2<'_, f32>,
        threshold: f32,
        if_true: f32,
        if_false: f32,
    ) -> Array2<f32> {
        values.mapv(|v| if v > threshold { if_true } else { if_false })
    }

    fn stack_columns(&self, columns: &[ArrayView1<'_, f32>]) -> Result<Array2<f32>, RandShearError> {
        ndarray::stack(Axis(1), columns).map_err(|e| RandShearError::TransformShape {
            expected: "columns of equal length".to_string(),
            actual: e.to_string(),
        })
    }

    fn affine_transform(
        &self,
        images: ArrayView4<'_, f32>,
        transforms: ArrayView2<'_, f32>,
        interpolation: Interpolation,
        fill_mode: FillMode,
        fill_value: f32,
        data_format: DataFormat,
    ) -> Result<Array4<f32>, RandShearError> {
        affine::affine_transform(
            images,
            transforms,
            interpolation,
            fill_mode,
            fill_value,
            data_format,
        )
    }
}
