//! Applying sampled shear vectors to image and mask tensors.
//!
//! Each `(sx, sy)` row becomes the transform row
//!
//! ```text
//! [1, sx, 0, sy, 1, 0, 0, 0]
//! ```
//!
//! which is the top two rows of the 3x3 matrix `[[1, sx, 0], [sy, 1, 0],
//! [0, 0, 1]]` mapping output pixels to source pixels. Unbatched tensors are
//! given a leading batch axis for the duration of the warp and lose it again
//! before they are returned.

use ndarray::{Array1, Array2, ArrayD, Axis, Ix4};

use crate::backend::Backend;
use crate::config::{DataFormat, FillMode, Interpolation, RandomShearConfig};
use crate::error::RandShearError;
use crate::sampler::ShearTransformation;

/// Resampling settings passed through to the affine primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResampleOptions {
    pub interpolation: Interpolation,
    pub fill_mode: FillMode,
    pub fill_value: f32,
    pub data_format: DataFormat,
}

impl From<&RandomShearConfig> for ResampleOptions {
    fn from(config: &RandomShearConfig) -> Self {
        Self {
            interpolation: config.interpolation,
            fill_mode: config.fill_mode,
            fill_value: config.fill_value,
            data_format: config.data_format,
        }
    }
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self::from(&RandomShearConfig::default())
    }
}

/// Builds the `[batch_size, 8]` transform rows for a batch of shear vectors.
pub fn shear_matrix<B: Backend + ?Sized>(
    backend: &B,
    transformation: &ShearTransformation,
) -> Result<Array2<f32>, RandShearError> {
    let n = transformation.batch_size();
    let ones = Array1::<f32>::ones(n);
    let zeros = Array1::<f32>::zeros(n);

    backend.stack_columns(&[
        ones.view(),
        transformation.shear_x(),
        zeros.view(),
        transformation.shear_y(),
        ones.view(),
        zeros.view(),
        zeros.view(),
        zeros.view(),
    ])
}

/// Shears `inputs` (rank 3 or 4) with `transformation`.
///
/// `None` is the inference sentinel and returns `inputs` untouched. The
/// output always has the shape of `inputs`.
///
/// # Errors
/// Returns [`RandShearError::InvalidRank`] for tensors that are neither
/// rank 3 nor 4, and [`RandShearError::TransformShape`] when the number of
/// shear vectors differs from the batch size.
pub fn apply_shear<B: Backend + ?Sized>(
    backend: &B,
    inputs: ArrayD<f32>,
    transformation: Option<&ShearTransformation>,
    options: &ResampleOptions,
) -> Result<ArrayD<f32>, RandShearError> {
    let Some(transformation) = transformation else {
        return Ok(inputs);
    };

    let unbatched = match inputs.ndim() {
        3 => true,
        4 => false,
        rank => return Err(RandShearError::InvalidRank { rank }),
    };
    let inputs = if unbatched {
        inputs.insert_axis(Axis(0))
    } else {
        inputs
    };

    let batch = inputs.len_of(Axis(0));
    if transformation.batch_size() != batch {
        return Err(RandShearError::TransformShape {
            expected: format!("[{}, 2] shear factors", batch),
            actual: format!("{:?}", transformation.shear_factor().shape()),
        });
    }

    let batched = inputs
        .into_dimensionality::<Ix4>()
        .map_err(|_| RandShearError::InvalidRank { rank: 4 })?;
    let matrix = shear_matrix(backend, transformation)?;

    let outputs = backend.affine_transform(
        batched.view(),
        matrix.view(),
        options.interpolation,
        options.fill_mode,
        options.fill_value,
        options.data_format,
    )?;

    let outputs = outputs.into_dyn();
    Ok(if unbatched {
        outputs.index_axis_move(Axis(0), 0)
    } else {
        outputs
    })
}
