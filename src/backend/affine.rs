//! Projective/affine resampling of image batches.
//!
//! Each transform row `[a0, a1, a2, b0, b1, b2, c0, c1]` maps an output
//! pixel `(x, y)` (column, row) to the source point
//!
//! ```text
//! x' = (a0 * x + a1 * y + a2) / k
//! y' = (b0 * x + b1 * y + b2) / k
//! k  = c0 * x + c1 * y + 1
//! ```
//!
//! i.e. the stored matrix is already the output-to-input map. The source
//! point is sampled with nearest or bilinear interpolation; integer source
//! indices that fall outside the image are resolved by the fill mode.

use ndarray::{Array4, ArrayView2, ArrayView3, ArrayView4, ArrayViewMut3, Axis};

use crate::config::{DataFormat, FillMode, Interpolation};
use crate::error::RandShearError;

/// Number of values in one transform row.
pub const TRANSFORM_LEN: usize = 8;

/// Warps every image in `images` with its own row of `transforms`.
///
/// `images` is batched in `data_format` layout; the output has the same
/// shape and layout.
///
/// # Errors
/// Returns [`RandShearError::TransformShape`] if `transforms` is not
/// `[batch, 8]`.
pub fn affine_transform(
    images: ArrayView4<'_, f32>,
    transforms: ArrayView2<'_, f32>,
    interpolation: Interpolation,
    fill_mode: FillMode,
    fill_value: f32,
    data_format: DataFormat,
) -> Result<Array4<f32>, RandShearError> {
    let batch = images.len_of(Axis(0));
    if transforms.dim() != (batch, TRANSFORM_LEN) {
        return Err(RandShearError::TransformShape {
            expected: format!("[{}, {}]", batch, TRANSFORM_LEN),
            actual: format!("{:?}", transforms.shape()),
        });
    }

    // Work in [batch, height, width, channels] and restore the layout at the end.
    let nhwc = match data_format {
        DataFormat::ChannelsLast => images,
        DataFormat::ChannelsFirst => images.permuted_axes([0, 2, 3, 1]),
    };

    let mut output = Array4::<f32>::zeros(nhwc.raw_dim());
    let sampler = Sampler {
        interpolation,
        fill_mode,
        fill_value,
    };

    for ((out, image), row) in output
        .outer_iter_mut()
        .zip(nhwc.outer_iter())
        .zip(transforms.outer_iter())
    {
        let mut matrix = [0.0f32; TRANSFORM_LEN];
        for (slot, value) in matrix.iter_mut().zip(row.iter()) {
            *slot = *value;
        }
        sampler.warp_image(image, out, &matrix);
    }

    Ok(match data_format {
        DataFormat::ChannelsLast => output,
        DataFormat::ChannelsFirst => output
            .permuted_axes([0, 3, 1, 2])
            .as_standard_layout()
            .into_owned(),
    })
}

struct Sampler {
    interpolation: Interpolation,
    fill_mode: FillMode,
    fill_value: f32,
}

impl Sampler {
    /// Fills `out` ([height, width, channels]) from `image`.
    fn warp_image(
        &self,
        image: ArrayView3<'_, f32>,
        mut out: ArrayViewMut3<'_, f32>,
        m: &[f32; TRANSFORM_LEN],
    ) {
        let (height, width, channels) = image.dim();
        if height == 0 || width == 0 || channels == 0 {
            return;
        }

        for y in 0..height {
            for x in 0..width {
                let (xf, yf) = (x as f32, y as f32);
                let k = m[6] * xf + m[7] * yf + 1.0;
                let src_x = (m[0] * xf + m[1] * yf + m[2]) / k;
                let src_y = (m[3] * xf + m[4] * yf + m[5]) / k;

                for c in 0..channels {
                    out[[y, x, c]] = match self.interpolation {
                        Interpolation::Nearest => self.sample_nearest(&image, src_x, src_y, c),
                        Interpolation::Bilinear => self.sample_bilinear(&image, src_x, src_y, c),
                    };
                }
            }
        }
    }

    fn sample_nearest(&self, image: &ArrayView3<'_, f32>, src_x: f32, src_y: f32, c: usize) -> f32 {
        self.pixel(image, src_y.round() as i64, src_x.round() as i64, c)
    }

    fn sample_bilinear(
        &self,
        image: &ArrayView3<'_, f32>,
        src_x: f32,
        src_y: f32,
        c: usize,
    ) -> f32 {
        let x0 = src_x.floor();
        let y0 = src_y.floor();
        let wx = src_x - x0;
        let wy = src_y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let (x1, y1) = (x0.saturating_add(1), y0.saturating_add(1));

        let corners = [
            (y0, x0, (1.0 - wy) * (1.0 - wx)),
            (y0, x1, (1.0 - wy) * wx),
            (y1, x0, wy * (1.0 - wx)),
            (y1, x1, wy * wx),
        ];

        let mut acc = 0.0f32;
        for (row, col, weight) in corners {
            if weight != 0.0 {
                acc += weight * self.pixel(image, row, col, c);
            }
        }
        acc
    }

    /// Reads `image[row, col, c]`, resolving out-of-range indices by fill mode.
    fn pixel(&self, image: &ArrayView3<'_, f32>, row: i64, col: i64, c: usize) -> f32 {
        let (height, width, _) = image.dim();
        match (
            resolve_index(row, height, self.fill_mode),
            resolve_index(col, width, self.fill_mode),
        ) {
            (Some(r), Some(cc)) => image[[r, cc, c]],
            _ => self.fill_value,
        }
    }
}

/// Maps a possibly out-of-range index onto `[0, size)`.
///
/// Returns `None` only for `FillMode::Constant`, where the caller uses the
/// fill value instead. `size` must be non-zero.
pub fn resolve_index(index: i64, size: usize, fill_mode: FillMode) -> Option<usize> {
    let n = size as i64;
    let resolved = match fill_mode {
        FillMode::Constant => {
            if (0..n).contains(&index) {
                index
            } else {
                return None;
            }
        }
        FillMode::Nearest => index.clamp(0, n - 1),
        FillMode::Wrap => index.rem_euclid(n),
        FillMode::Reflect => {
            let m = index.rem_euclid(2 * n);
            if m < n {
                m
            } else {
                2 * n - 1 - m
            }
        }
    };
    Some(resolved as usize)
}
