//! Inference descriptor assembly.
//!
//! Combines architecture metadata, category info, and the translated
//! preprocessing pipeline into the single ordered document the inference
//! engine reads (`infer_cfg.yml`). Top-level key order is part of the
//! contract with downstream consumers, so the descriptor is a struct whose
//! field order is exactly the serialized key order.

use crate::categories::{resolve_categories, MetricKind};
use crate::config::ExportConfig;
use crate::core::{ExportError, ExportResult};
use crate::preprocess::{translate_reader, PreprocessStep};
use serde::{Deserialize, Serialize};

/// Architecture families recognized by the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchFamily {
    /// YOLO-family single-stage detectors.
    #[serde(rename = "YOLO")]
    Yolo,
    /// SSD-family single-stage detectors.
    #[serde(rename = "SSD")]
    Ssd,
    /// R-CNN-family two-stage detectors.
    #[serde(rename = "RCNN")]
    Rcnn,
    /// RetinaNet-family detectors.
    RetinaNet,
    /// Face-detection architectures.
    Face,
    /// TTFNet-family detectors.
    #[serde(rename = "TTFNet")]
    TtfNet,
}

/// Priority-ordered match table; the first key contained in the full
/// architecture name wins.
const FAMILY_TABLE: &[(&str, ArchFamily)] = &[
    ("YOLO", ArchFamily::Yolo),
    ("SSD", ArchFamily::Ssd),
    ("RCNN", ArchFamily::Rcnn),
    ("RetinaNet", ArchFamily::RetinaNet),
    ("Face", ArchFamily::Face),
    ("TTFNet", ArchFamily::TtfNet),
];

impl ArchFamily {
    /// Matches a full architecture name against the family table.
    ///
    /// # Errors
    ///
    /// Returns `UnrecognizedArchitecture` when no table entry matches; the
    /// descriptor would otherwise be incomplete.
    pub fn match_name(architecture: &str) -> ExportResult<Self> {
        FAMILY_TABLE
            .iter()
            .find(|(key, _)| architecture.contains(key))
            .map(|(_, family)| *family)
            .ok_or_else(|| ExportError::UnrecognizedArchitecture {
                architecture: architecture.to_string(),
            })
    }

    /// Minimum subgraph size for the downstream accelerated backend.
    pub fn min_subgraph_size(&self) -> u32 {
        match self {
            Self::Rcnn | Self::RetinaNet => 40,
            Self::Yolo | Self::Ssd | Self::Face | Self::TtfNet => 3,
        }
    }

    /// Families whose resize step derives scale from both image dimensions.
    pub fn is_multi_scale(&self) -> bool {
        matches!(self, Self::Rcnn | Self::RetinaNet)
    }

    /// The family label used in the descriptor.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yolo => "YOLO",
            Self::Ssd => "SSD",
            Self::Rcnn => "RCNN",
            Self::RetinaNet => "RetinaNet",
            Self::Face => "Face",
            Self::TtfNet => "TTFNet",
        }
    }
}

impl std::fmt::Display for ArchFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The final ordered descriptor document.
///
/// Field order is the serialized key order; do not reorder fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceDescriptor {
    /// Always false; the bundle targets the native inference engine.
    pub use_python_inference: bool,
    /// Execution mode tag.
    pub mode: String,
    /// Default visualization threshold.
    pub draw_threshold: f32,
    /// Metric kind the model was trained against.
    pub metric: MetricKind,
    /// Matched architecture family.
    pub arch: ArchFamily,
    /// Minimum subgraph size for the accelerated backend.
    pub min_subgraph_size: u32,
    /// Mask output resolution; present only for Mask architectures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_resolution: Option<u32>,
    /// Whether class id 0 is a background class.
    pub with_background: bool,
    /// Ordered preprocessing pipeline.
    #[serde(rename = "Preprocess")]
    pub preprocess: Vec<PreprocessStep>,
    /// Display names in ascending class-index order.
    pub label_list: Vec<String>,
}

impl InferenceDescriptor {
    /// Assembles the descriptor from the configuration document.
    ///
    /// Deterministic: the same configuration always yields the same
    /// descriptor, field for field.
    pub fn from_config(config: &ExportConfig) -> ExportResult<Self> {
        let metric = MetricKind::parse(&config.metric)?;
        let arch = ArchFamily::match_name(&config.architecture)?;

        let mask_resolution = if config.architecture.contains("Mask") {
            let head = config.mask_head.as_ref().ok_or_else(|| {
                ExportError::config_error(format!(
                    "MaskHead.resolution is required for architecture '{}'",
                    config.architecture
                ))
            })?;
            Some(head.resolution)
        } else {
            None
        };

        let dataset = &config.test_reader.dataset;
        let categories = resolve_categories(
            metric,
            dataset.annotation_file().as_deref(),
            dataset.with_background,
            dataset.use_default_label,
        )?;
        let preprocess = translate_reader(&config.test_reader, arch);

        Ok(Self {
            use_python_inference: false,
            mode: "fluid".to_string(),
            draw_threshold: 0.5,
            metric,
            arch,
            min_subgraph_size: arch.min_subgraph_size(),
            mask_resolution,
            with_background: dataset.with_background,
            preprocess,
            label_list: categories.label_list(),
        })
    }

    /// Serializes the descriptor to YAML with the contract key order.
    pub fn to_yaml(&self) -> ExportResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
