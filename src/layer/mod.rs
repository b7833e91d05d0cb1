//! Augmentation layer lifecycle and the random shear layer.
//!
//! [`ImagePreprocessingLayer`] is the contract every augmentation layer
//! fills in: how to draw a random transformation for a batch, and how that
//! one transformation applies to each kind of payload (images, labels,
//! bounding boxes, segmentation masks). The provided [`call`] method runs
//! the whole lifecycle for a [`LayerData`] bundle so that every payload in
//! the bundle sees the same transformation.
//!
//! [`call`]: ImagePreprocessingLayer::call

mod random_shear;

use ndarray::ArrayD;

use crate::error::RandShearError;
use crate::seed::SeedDraw;

pub use random_shear::RandomShear;

/// Bounding boxes with their class labels.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBoxes {
    /// Box coordinates, `[..., 4]`.
    pub boxes: ArrayD<f32>,
    /// One label per box.
    pub labels: ArrayD<f32>,
}

/// The payloads one layer call operates on.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerData {
    /// Image batch (rank 4) or single image (rank 3).
    pub images: ArrayD<f32>,
    pub labels: Option<ArrayD<f32>>,
    pub bounding_boxes: Option<BoundingBoxes>,
    pub segmentation_masks: Option<ArrayD<f32>>,
}

impl LayerData {
    pub fn new(images: ArrayD<f32>) -> Self {
        Self {
            images,
            labels: None,
            bounding_boxes: None,
            segmentation_masks: None,
        }
    }

    pub fn with_labels(mut self, labels: ArrayD<f32>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_bounding_boxes(mut self, bounding_boxes: BoundingBoxes) -> Self {
        self.bounding_boxes = Some(bounding_boxes);
        self
    }

    pub fn with_segmentation_masks(mut self, masks: ArrayD<f32>) -> Self {
        self.segmentation_masks = Some(masks);
        self
    }
}

impl From<ArrayD<f32>> for LayerData {
    fn from(images: ArrayD<f32>) -> Self {
        Self::new(images)
    }
}

/// An image augmentation layer.
pub trait ImagePreprocessingLayer {
    /// Per-call random parameters.
    type Transformation;
    /// Exported constructor parameters.
    type Config;

    /// Draws the random parameters for one call.
    ///
    /// Returns `Ok(None)` when `training` is false without consuming any
    /// randomness. `seed` overrides the layer's own generator for this call.
    fn get_random_transformation(
        &mut self,
        images: &ArrayD<f32>,
        training: bool,
        seed: Option<SeedDraw>,
    ) -> Result<Option<Self::Transformation>, RandShearError>;

    fn transform_images(
        &self,
        images: ArrayD<f32>,
        transformation: Option<&Self::Transformation>,
        training: bool,
    ) -> Result<ArrayD<f32>, RandShearError>;

    fn transform_labels(
        &self,
        labels: ArrayD<f32>,
        transformation: Option<&Self::Transformation>,
        training: bool,
    ) -> Result<ArrayD<f32>, RandShearError>;

    fn transform_bounding_boxes(
        &self,
        bounding_boxes: BoundingBoxes,
        transformation: Option<&Self::Transformation>,
        training: bool,
    ) -> Result<BoundingBoxes, RandShearError>;

    fn transform_segmentation_masks(
        &self,
        segmentation_masks: ArrayD<f32>,
        transformation: Option<&Self::Transformation>,
        training: bool,
    ) -> Result<ArrayD<f32>, RandShearError>;

    fn get_config(&self) -> Self::Config;

    fn compute_output_shape(&self, input_shape: &[usize]) -> Vec<usize> {
        input_shape.to_vec()
    }

    /// Samples once from `data.images` and applies the result to every
    /// payload present in `data`.
    fn call(&mut self, data: LayerData, training: bool) -> Result<LayerData, RandShearError> {
        let transformation = self.get_random_transformation(&data.images, training, None)?;
        let transformation = transformation.as_ref();

        let images = self.transform_images(data.images, transformation, training)?;
        let labels = data
            .labels
            .map(|labels| self.transform_labels(labels, transformation, training))
            .transpose()?;
        let bounding_boxes = data
            .bounding_boxes
            .map(|boxes| self.transform_bounding_boxes(boxes, transformation, training))
            .transpose()?;
        let segmentation_masks = data
            .segmentation_masks
            .map(|masks| self.transform_segmentation_masks(masks, transformation, training))
            .transpose()?;

        Ok(LayerData {
            images,
            labels,
            bounding_boxes,
            segmentation_masks,
        })
    }
}
