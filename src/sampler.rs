//! Random shear factor sampling.
//!
//! One call produces one `(shear_x, shear_y)` row per image. The sign is
//! drawn once per image and shared by both axes; the magnitudes are drawn
//! independently from the x and y ranges. All draws of a call read from the
//! single stream of the [`SeedDraw`] passed in, in the order sign, y, x.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::backend::Backend;
use crate::config::ShearRange;
use crate::error::RandShearError;
use crate::seed::SeedDraw;

/// Per-batch shear vectors, shape `[batch_size, 2]`, columns `(x, y)`,
/// together with the sign each image was given.
#[derive(Clone, Debug, PartialEq)]
pub struct ShearTransformation {
    shear_factor: Array2<f32>,
    sign: Array1<f32>,
}

impl ShearTransformation {
    /// Wraps an existing `[batch_size, 2]` array of shear factors.
    ///
    /// The factors are taken as final, so every image gets a sign of `+1`.
    pub fn from_factors(shear_factor: Array2<f32>) -> Result<Self, RandShearError> {
        let sign = Array1::ones(shear_factor.nrows());
        Self::with_sign(shear_factor, sign)
    }

    /// Wraps signed shear factors and the `±1` sign drawn for each image.
    pub fn with_sign(shear_factor: Array2<f32>, sign: Array1<f32>) -> Result<Self, RandShearError> {
        if shear_factor.ncols() != 2 || sign.len() != shear_factor.nrows() {
            return Err(RandShearError::TransformShape {
                expected: format!("[{}, 2] factors and {} signs", sign.len(), sign.len()),
                actual: format!("{:?} factors", shear_factor.shape()),
            });
        }
        Ok(Self { shear_factor, sign })
    }

    pub fn shear_factor(&self) -> ArrayView2<'_, f32> {
        self.shear_factor.view()
    }

    pub fn batch_size(&self) -> usize {
        self.shear_factor.nrows()
    }

    /// Horizontal shear per image.
    pub fn shear_x(&self) -> ArrayView1<'_, f32> {
        self.shear_factor.column(0)
    }

    /// Vertical shear per image.
    pub fn shear_y(&self) -> ArrayView1<'_, f32> {
        self.shear_factor.column(1)
    }

    /// The sign (`-1` or `1`) shared by both axes of each image.
    ///
    /// A factor drawn from a range that straddles zero can be negative under
    /// either sign, so the sign cannot be recovered from the factors.
    pub fn sign(&self) -> ArrayView1<'_, f32> {
        self.sign.view()
    }
}

/// Batch size implied by an image tensor shape.
///
/// Rank 3 is a single unbatched image; rank 4 carries the batch on axis 0.
pub fn batch_size_for(shape: &[usize]) -> Result<usize, RandShearError> {
    match shape.len() {
        3 => Ok(1),
        4 => Ok(shape[0]),
        rank => Err(RandShearError::InvalidRank { rank }),
    }
}

/// Samples one shear vector per image.
pub fn sample_shear_factors<B: Backend + ?Sized>(
    backend: &B,
    batch_size: usize,
    x_range: &ShearRange,
    y_range: &ShearRange,
    draw: SeedDraw,
) -> Result<ShearTransformation, RandShearError> {
    let mut rng = draw.rng();

    let invert = backend.uniform(&mut rng, batch_size, 0.0, 1.0);
    let invert = backend.where_greater(invert.view(), 0.5, -1.0, 1.0);

    let shear_y = backend.uniform(&mut rng, batch_size, y_range.lower(), y_range.upper());
    let shear_x = backend.uniform(&mut rng, batch_size, x_range.lower(), x_range.upper());

    let mut shear_factor =
        backend.stack_columns(&[shear_x.index_axis(Axis(1), 0), shear_y.index_axis(Axis(1), 0)])?;
    shear_factor *= &invert;

    ShearTransformation::with_sign(shear_factor, invert.index_axis_move(Axis(1), 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NdarrayBackend;
    use crate::config::FactorSpec;

    fn range(spec: impl Into<FactorSpec>) -> ShearRange {
        ShearRange::from_spec(&spec.into(), "factor").unwrap()
    }

    #[test]
    fn shape_matches_batch() {
        let t = sample_shear_factors(
            &NdarrayBackend,
            5,
            &range(0.3),
            &range(0.2),
            SeedDraw::from_seed(1),
        )
        .unwrap();
        assert_eq!(t.shear_factor().dim(), (5, 2));
        assert_eq!(t.batch_size(), 5);
    }

    #[test]
    fn sign_is_shared_between_axes() {
        let t = sample_shear_factors(
            &NdarrayBackend,
            64,
            &range((0.1, 0.5)),
            &range((0.2, 0.9)),
            SeedDraw::from_seed(11),
        )
        .unwrap();

        for (sx, sy) in t.shear_x().iter().zip(t.shear_y().iter()) {
            assert_eq!(sx.signum(), sy.signum());
            assert!((0.1..=0.5).contains(&sx.abs()));
            assert!((0.2..=0.9).contains(&sy.abs()));
        }
    }

    #[test]
    fn both_signs_occur() {
        let t = sample_shear_factors(
            &NdarrayBackend,
            128,
            &range((0.2, 0.4)),
            &range((0.2, 0.4)),
            SeedDraw::from_seed(3),
        )
        .unwrap();
        assert!(t.shear_x().iter().any(|v| *v > 0.0));
        assert!(t.shear_x().iter().any(|v| *v < 0.0));
    }

    #[test]
    fn same_draw_reproduces_factors() {
        let draw = SeedDraw { seed: 99, counter: 4 };
        let a = sample_shear_factors(&NdarrayBackend, 8, &range(0.5), &range(0.5), draw).unwrap();
        let b = sample_shear_factors(&NdarrayBackend, 8, &range(0.5), &range(0.5), draw).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_range_gives_zero_shear() {
        let t = sample_shear_factors(
            &NdarrayBackend,
            4,
            &range(0.0),
            &range(0.0),
            SeedDraw::from_seed(0),
        )
        .unwrap();
        assert!(t.shear_factor().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn batch_size_from_rank() {
        assert_eq!(batch_size_for(&[8, 8, 3]).unwrap(), 1);
        assert_eq!(batch_size_for(&[6, 8, 8, 3]).unwrap(), 6);
        assert!(matches!(
            batch_size_for(&[8, 8]),
            Err(RandShearError::InvalidRank { rank: 2 })
        ));
    }

    #[test]
    fn from_factors_requires_two_columns() {
        assert!(ShearTransformation::from_factors(Array2::zeros((3, 2))).is_ok());
        assert!(ShearTransformation::from_factors(Array2::zeros((3, 8))).is_err());
    }

    #[test]
    fn with_sign_requires_one_sign_per_image() {
        assert!(ShearTransformation::with_sign(Array2::zeros((3, 2)), Array1::ones(3)).is_ok());
        assert!(ShearTransformation::with_sign(Array2::zeros((3, 2)), Array1::ones(2)).is_err());
    }

    #[test]
    fn sign_records_the_draw_not_the_factor_sign() {
        let draw = SeedDraw::from_seed(1);
        let t = sample_shear_factors(&NdarrayBackend, 1000, &range(0.3), &range(0.3), draw)
            .unwrap();

        // The sign is the first column drawn from the call's stream.
        let mut rng = draw.rng();
        let u = NdarrayBackend.uniform(&mut rng, 1000, 0.0, 1.0);
        let expected: Vec<f32> = u.iter().map(|v| if *v > 0.5 { -1.0 } else { 1.0 }).collect();

        assert_eq!(t.sign().to_vec(), expected);
        let negative = t.sign().iter().filter(|s| **s < 0.0).count();
        assert!((400..600).contains(&negative), "negative = {}", negative);
    }
}
