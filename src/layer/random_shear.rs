//! The random shear augmentation layer.

use ndarray::ArrayD;
use tracing::{debug, trace};

use super::{BoundingBoxes, ImagePreprocessingLayer};
use crate::backend::{Backend, NdarrayBackend};
use crate::config::{RandomShearConfig, ShearRange};
use crate::error::RandShearError;
use crate::sampler::{batch_size_for, sample_shear_factors, ShearTransformation};
use crate::seed::{SeedDraw, SeedGenerator};
use crate::transform::{apply_shear, ResampleOptions};

/// Randomly shears images (and their segmentation masks) during training.
///
/// Every image in a batch gets its own shear vector `(sx, sy)`: `sx` is
/// drawn from the `x_factor` range, `sy` from the `y_factor` range, and
/// both share one random sign. At inference the layer is an identity.
///
/// # Example
///
/// ```
/// use ndarray::{ArrayD, IxDyn};
/// use randshear::config::RandomShearConfig;
/// use randshear::layer::{ImagePreprocessingLayer, RandomShear};
///
/// let config = RandomShearConfig::new(0.2, 0.1).with_seed(42);
/// let mut layer = RandomShear::new(config).unwrap();
///
/// let images = ArrayD::<f32>::zeros(IxDyn(&[2, 16, 16, 3]));
/// let out = layer.call(images.clone().into(), true).unwrap();
/// assert_eq!(out.images.shape(), images.shape());
/// ```
#[derive(Clone, Debug)]
pub struct RandomShear<B: Backend = NdarrayBackend> {
    config: RandomShearConfig,
    x_range: ShearRange,
    y_range: ShearRange,
    options: ResampleOptions,
    generator: SeedGenerator,
    backend: B,
}

impl RandomShear<NdarrayBackend> {
    /// Builds the layer on the default `ndarray` backend.
    ///
    /// # Errors
    /// Returns an error if either factor is malformed or out of `[0, 1]`.
    pub fn new(config: RandomShearConfig) -> Result<Self, RandShearError> {
        Self::with_backend(config, NdarrayBackend)
    }
}

impl<B: Backend> RandomShear<B> {
    /// Builds the layer on a specific backend.
    pub fn with_backend(config: RandomShearConfig, backend: B) -> Result<Self, RandShearError> {
        let (x_range, y_range) = config.factor_ranges()?;
        let options = ResampleOptions::from(&config);
        let generator = SeedGenerator::from_optional(config.seed);

        debug!(
            x_range = ?(x_range.lower(), x_range.upper()),
            y_range = ?(y_range.lower(), y_range.upper()),
            interpolation = %options.interpolation,
            fill_mode = %options.fill_mode,
            data_format = %options.data_format,
            seed = ?config.seed,
            "built random shear layer"
        );

        Ok(Self {
            config,
            x_range,
            y_range,
            options,
            generator,
            backend,
        })
    }

    /// The configuration the layer was built from.
    pub fn config(&self) -> &RandomShearConfig {
        &self.config
    }

    pub fn x_range(&self) -> ShearRange {
        self.x_range
    }

    pub fn y_range(&self) -> ShearRange {
        self.y_range
    }

    pub fn options(&self) -> &ResampleOptions {
        &self.options
    }

    /// Current state of the layer's random generator.
    pub fn generator(&self) -> SeedGenerator {
        self.generator
    }

    /// Samples shear vectors for `batch_size` images.
    ///
    /// Takes the generator's next draw unless `seed` is given, in which case
    /// the generator is left where it is.
    pub fn sample_transformation(
        &mut self,
        batch_size: usize,
        seed: Option<SeedDraw>,
    ) -> Result<ShearTransformation, RandShearError> {
        let draw = match seed {
            Some(draw) => draw,
            None => {
                let (draw, next) = self.generator.next();
                self.generator = next;
                draw
            }
        };
        trace!(batch_size, seed = draw.seed, counter = draw.counter, "sampling shear factors");

        sample_shear_factors(&self.backend, batch_size, &self.x_range, &self.y_range, draw)
    }
}

impl<B: Backend> ImagePreprocessingLayer for RandomShear<B> {
    type Transformation = ShearTransformation;
    type Config = RandomShearConfig;

    fn get_random_transformation(
        &mut self,
        images: &ArrayD<f32>,
        training: bool,
        seed: Option<SeedDraw>,
    ) -> Result<Option<ShearTransformation>, RandShearError> {
        if !training {
            return Ok(None);
        }

        let batch_size = batch_size_for(images.shape())?;
        self.sample_transformation(batch_size, seed).map(Some)
    }

    fn transform_images(
        &self,
        images: ArrayD<f32>,
        transformation: Option<&ShearTransformation>,
        training: bool,
    ) -> Result<ArrayD<f32>, RandShearError> {
        if !training {
            return Ok(images);
        }
        apply_shear(&self.backend, images, transformation, &self.options)
    }

    fn transform_labels(
        &self,
        labels: ArrayD<f32>,
        _transformation: Option<&ShearTransformation>,
        _training: bool,
    ) -> Result<ArrayD<f32>, RandShearError> {
        Ok(labels)
    }

    fn transform_bounding_boxes(
        &self,
        _bounding_boxes: BoundingBoxes,
        _transformation: Option<&ShearTransformation>,
        _training: bool,
    ) -> Result<BoundingBoxes, RandShearError> {
        Err(RandShearError::NotImplemented(
            "RandomShear does not support bounding box transformation",
        ))
    }

    fn transform_segmentation_masks(
        &self,
        segmentation_masks: ArrayD<f32>,
        transformation: Option<&ShearTransformation>,
        training: bool,
    ) -> Result<ArrayD<f32>, RandShearError> {
        self.transform_images(segmentation_masks, transformation, training)
    }

    fn get_config(&self) -> RandomShearConfig {
        self.config.clone()
    }
}
