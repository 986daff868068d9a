//! Translation of training-time transforms into inference preprocessing steps.
//!
//! The training reader describes its pipeline imperatively; the inference
//! engine wants a declarative, ordered list of steps. The translation is a
//! pure function: skip the leading decode transform, map each remaining
//! transform through a per-kind table, and synthesize at most one
//! `PadStride` step from the first `PadBatch` batch transform.

use crate::config::{BatchTransform, ImageShape, ReaderConfig, SampleTransform};
use crate::infer_cfg::ArchFamily;
use serde::{Deserialize, Serialize};

/// A declarative preprocessing step in the inference vocabulary.
///
/// Serialized with a `type` discriminant, matching the step dictionaries the
/// inference engine parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PreprocessStep {
    /// Decode raw image bytes.
    Decode {
        /// Whether to convert the decoded image to RGB.
        to_rgb: bool,
        /// Whether mixup fields are attached to the sample.
        with_mixup: bool,
    },
    /// Resize the image.
    Resize {
        /// Target size for the shorter side.
        target_size: u32,
        /// Upper bound for the longer side; 0 disables the cap.
        max_size: u32,
        /// Interpolation method id.
        interp: u32,
        /// Whether the OpenCV resize kernel is used.
        use_cv2: bool,
        /// Fixed output dimension; dropped once the image shape is known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_dim: Option<u32>,
        /// `(height, width)` of the model input, when fully specified.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_shape: Option<[u32; 2]>,
    },
    /// Normalize pixel values channel-wise.
    Normalize {
        /// Per-channel mean.
        mean: Vec<f32>,
        /// Per-channel standard deviation.
        std: Vec<f32>,
        /// Whether pixel values are scaled to `[0, 1]` first.
        is_scale: bool,
        /// Whether the input is already channel-first.
        is_channel_first: bool,
    },
    /// Reorder channels and transpose to channel-first layout.
    Permute {
        /// Whether to swap RGB to BGR.
        to_bgr: bool,
        /// Whether to transpose HWC to CHW.
        channel_first: bool,
    },
    /// Pad a single image up to a stride multiple.
    Pad {
        /// Stride the padded dimensions must be a multiple of.
        pad_to_stride: u32,
    },
    /// Pad the batch up to a stride multiple; synthesized from `PadBatch`.
    PadStride {
        /// Stride the padded dimensions must be a multiple of.
        stride: u32,
    },
}

/// Translates the reader's transforms into the ordered inference pipeline.
///
/// The first sample transform is always the raw decode step and is skipped
/// unconditionally. Only the first `PadBatch` batch transform contributes a
/// `PadStride` step; later ones are ignored.
pub fn translate_reader(reader: &ReaderConfig, arch: ArchFamily) -> Vec<PreprocessStep> {
    let shape = reader.inputs_def.image_shape();
    let mut steps: Vec<PreprocessStep> = reader
        .sample_transforms
        .iter()
        .skip(1)
        .map(|transform| translate_sample(transform, arch, shape))
        .collect();

    if let Some(batch_transforms) = &reader.batch_transforms {
        for transform in batch_transforms {
            if let BatchTransform::PadBatch { pad_to_stride, .. } = transform {
                steps.push(PreprocessStep::PadStride {
                    stride: *pad_to_stride,
                });
                break;
            }
        }
    }

    steps
}

fn translate_sample(
    transform: &SampleTransform,
    arch: ArchFamily,
    shape: ImageShape,
) -> PreprocessStep {
    match transform {
        SampleTransform::DecodeImage { to_rgb, with_mixup } => PreprocessStep::Decode {
            to_rgb: *to_rgb,
            with_mixup: *with_mixup,
        },
        SampleTransform::ResizeImage {
            target_size,
            max_size,
            interp,
            use_cv2,
            target_dim,
        } => match shape.fully_defined() {
            Some((height, width)) => {
                // Multi-scale families derive scale from both dimensions;
                // everything else resizes to the fixed height.
                let (target_size, max_size) = if arch.is_multi_scale() {
                    (height.min(width), height.max(width))
                } else {
                    (height, 0)
                };
                PreprocessStep::Resize {
                    target_size,
                    max_size,
                    interp: *interp,
                    use_cv2: *use_cv2,
                    target_dim: None,
                    image_shape: Some([height, width]),
                }
            }
            None => PreprocessStep::Resize {
                target_size: *target_size,
                max_size: *max_size,
                interp: *interp,
                use_cv2: *use_cv2,
                target_dim: *target_dim,
                image_shape: None,
            },
        },
        SampleTransform::NormalizeImage {
            mean,
            std,
            is_scale,
            is_channel_first,
        } => PreprocessStep::Normalize {
            mean: mean.clone(),
            std: std.clone(),
            is_scale: *is_scale,
            is_channel_first: *is_channel_first,
        },
        SampleTransform::Permute {
            to_bgr,
            channel_first,
        } => PreprocessStep::Permute {
            to_bgr: *to_bgr,
            channel_first: *channel_first,
        },
        SampleTransform::PadImage { pad_to_stride } => PreprocessStep::Pad {
            pad_to_stride: *pad_to_stride,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatasetConfig, InputsDef};

    fn reader(
        image_shape: Option<Vec<Option<u32>>>,
        sample_transforms: Vec<SampleTransform>,
        batch_transforms: Option<Vec<BatchTransform>>,
    ) -> ReaderConfig {
        ReaderConfig {
            inputs_def: InputsDef {
                image_shape,
                fields: None,
            },
            dataset: DatasetConfig {
                dataset_dir: None,
                anno_path: None,
                with_background: true,
                use_default_label: false,
            },
            sample_transforms,
            batch_transforms,
        }
    }

    fn decode() -> SampleTransform {
        SampleTransform::DecodeImage {
            to_rgb: true,
            with_mixup: false,
        }
    }

    fn resize(target_size: u32, max_size: u32) -> SampleTransform {
        SampleTransform::ResizeImage {
            target_size,
            max_size,
            interp: 1,
            use_cv2: true,
            target_dim: None,
        }
    }

    fn permute() -> SampleTransform {
        SampleTransform::Permute {
            to_bgr: false,
            channel_first: true,
        }
    }

    #[test]
    fn test_first_transform_is_always_skipped() {
        let reader = reader(None, vec![decode(), permute()], None);
        let steps = translate_reader(&reader, ArchFamily::Yolo);
        assert_eq!(
            steps,
            vec![PreprocessStep::Permute {
                to_bgr: false,
                channel_first: true,
            }]
        );
    }

    #[test]
    fn test_output_length_tracks_input_length() {
        let reader = reader(None, vec![decode(), resize(608, 0), permute()], None);
        let steps = translate_reader(&reader, ArchFamily::Yolo);
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_single_transform_translates_to_nothing() {
        let reader = reader(None, vec![decode()], None);
        assert!(translate_reader(&reader, ArchFamily::Yolo).is_empty());
    }

    #[test]
    fn test_resize_multi_scale_family() {
        let reader = reader(
            Some(vec![Some(3), Some(800), Some(1333)]),
            vec![decode(), resize(500, 900)],
            None,
        );
        let steps = translate_reader(&reader, ArchFamily::Rcnn);
        assert_eq!(
            steps,
            vec![PreprocessStep::Resize {
                target_size: 800,
                max_size: 1333,
                interp: 1,
                use_cv2: true,
                target_dim: None,
                image_shape: Some([800, 1333]),
            }]
        );
    }

    #[test]
    fn test_resize_fixed_scale_family() {
        let reader = reader(
            Some(vec![Some(3), Some(608), Some(608)]),
            vec![decode(), resize(416, 0)],
            None,
        );
        let steps = translate_reader(&reader, ArchFamily::Yolo);
        assert_eq!(
            steps,
            vec![PreprocessStep::Resize {
                target_size: 608,
                max_size: 0,
                interp: 1,
                use_cv2: true,
                target_dim: None,
                image_shape: Some([608, 608]),
            }]
        );
    }

    #[test]
    fn test_resize_drops_target_dim_when_shape_known() {
        let with_dim = SampleTransform::ResizeImage {
            target_size: 416,
            max_size: 0,
            interp: 1,
            use_cv2: true,
            target_dim: Some(416),
        };
        let reader = reader(
            Some(vec![Some(3), Some(416), Some(416)]),
            vec![decode(), with_dim],
            None,
        );
        let steps = translate_reader(&reader, ArchFamily::Yolo);
        match &steps[0] {
            PreprocessStep::Resize { target_dim, .. } => assert!(target_dim.is_none()),
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[test]
    fn test_resize_keeps_parameters_without_shape() {
        let reader = reader(
            Some(vec![Some(3), None, None]),
            vec![decode(), resize(416, 800)],
            None,
        );
        let steps = translate_reader(&reader, ArchFamily::Rcnn);
        assert_eq!(
            steps,
            vec![PreprocessStep::Resize {
                target_size: 416,
                max_size: 800,
                interp: 1,
                use_cv2: true,
                target_dim: None,
                image_shape: None,
            }]
        );
    }

    #[test]
    fn test_first_pad_batch_wins() {
        let reader = reader(
            None,
            vec![decode(), permute()],
            Some(vec![
                BatchTransform::PadBatch {
                    pad_to_stride: 32,
                    use_padded_im_info: true,
                },
                BatchTransform::PadBatch {
                    pad_to_stride: 64,
                    use_padded_im_info: true,
                },
            ]),
        );
        let steps = translate_reader(&reader, ArchFamily::Yolo);
        let strides: Vec<_> = steps
            .iter()
            .filter_map(|step| match step {
                PreprocessStep::PadStride { stride } => Some(*stride),
                _ => None,
            })
            .collect();
        assert_eq!(strides, vec![32]);
    }

    #[test]
    fn test_non_pad_batch_transforms_are_ignored() {
        let reader = reader(
            None,
            vec![decode(), permute()],
            Some(vec![BatchTransform::PadMultiScaleTest { pad_to_stride: 32 }]),
        );
        let steps = translate_reader(&reader, ArchFamily::Yolo);
        assert_eq!(steps.len(), 1);
    }
}
