//! Training-time transform descriptors.
//!
//! These are the closed set of per-sample and per-batch transform kinds the
//! translator understands, each with an explicit parameter record. Parameter
//! defaults mirror the training framework, so sparse configurations
//! deserialize to the same values the training run used. An unknown `type`
//! tag is rejected at deserialization rather than passed through untyped.

use serde::{Deserialize, Serialize};

/// Per-sample transform applied by the training-time reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SampleTransform {
    /// Decode the raw image bytes. Always the first transform of a pipeline.
    DecodeImage {
        /// Whether to convert the decoded image to RGB.
        #[serde(default = "default_true")]
        to_rgb: bool,
        /// Whether mixup fields are attached to the sample.
        #[serde(default)]
        with_mixup: bool,
    },
    /// Resize the image, optionally capping the longer side.
    ResizeImage {
        /// Target size for the shorter side.
        #[serde(default)]
        target_size: u32,
        /// Upper bound for the longer side; 0 disables the cap.
        #[serde(default)]
        max_size: u32,
        /// Interpolation method id.
        #[serde(default = "default_interp")]
        interp: u32,
        /// Whether the OpenCV resize kernel is used.
        #[serde(default = "default_true")]
        use_cv2: bool,
        /// Fixed output dimension used by some single-scale pipelines.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_dim: Option<u32>,
    },
    /// Normalize pixel values channel-wise.
    NormalizeImage {
        /// Per-channel mean.
        #[serde(default = "default_mean")]
        mean: Vec<f32>,
        /// Per-channel standard deviation.
        #[serde(default = "default_std")]
        std: Vec<f32>,
        /// Whether pixel values are scaled to `[0, 1]` first.
        #[serde(default = "default_true")]
        is_scale: bool,
        /// Whether the input is already channel-first.
        #[serde(default)]
        is_channel_first: bool,
    },
    /// Reorder channels and transpose to channel-first layout.
    Permute {
        /// Whether to swap RGB to BGR.
        #[serde(default = "default_true")]
        to_bgr: bool,
        /// Whether to transpose HWC to CHW.
        #[serde(default = "default_true")]
        channel_first: bool,
    },
    /// Pad a single image up to a stride multiple.
    PadImage {
        /// Stride the padded dimensions must be a multiple of.
        #[serde(default = "default_stride")]
        pad_to_stride: u32,
    },
}

/// Per-batch transform applied by the training-time reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BatchTransform {
    /// Pad every image of a batch up to a shared stride multiple.
    PadBatch {
        /// Stride the padded dimensions must be a multiple of.
        #[serde(default)]
        pad_to_stride: u32,
        /// Whether the padded shape is recorded in the image-info tensor.
        #[serde(default = "default_true")]
        use_padded_im_info: bool,
    },
    /// Pad a multi-scale test batch up to a shared stride multiple.
    PadMultiScaleTest {
        /// Stride the padded dimensions must be a multiple of.
        #[serde(default)]
        pad_to_stride: u32,
    },
}

fn default_true() -> bool {
    true
}

fn default_interp() -> u32 {
    1
}

fn default_stride() -> u32 {
    32
}

fn default_mean() -> Vec<f32> {
    vec![0.485, 0.456, 0.406]
}

fn default_std() -> Vec<f32> {
    vec![0.229, 0.224, 0.225]
}
