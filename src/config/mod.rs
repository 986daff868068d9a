//! Typed view of the training configuration document.
//!
//! Training configurations carry far more than the export needs; this module
//! deserializes only the keys the export pipeline consumes (`architecture`,
//! `metric`, `TestReader`, `MaskHead`) and leaves everything else untouched.
//! Generic `key=value` overrides are merged into the raw YAML value tree
//! before typed deserialization, so overrides can address any key, not just
//! the ones modeled here.

pub mod transforms;

pub use transforms::{BatchTransform, SampleTransform};

use crate::core::{ExportError, ExportResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration keys consumed by the export pipeline.
///
/// Immutable once loaded; owned by the export orchestrator for the duration
/// of one export run.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Full architecture name, e.g. `CascadeRCNN` or `YOLOv3`.
    pub architecture: String,
    /// Metric kind as written in the configuration; validated against the
    /// supported set when the descriptor is assembled.
    pub metric: String,
    /// Inference-time reader configuration.
    #[serde(rename = "TestReader")]
    pub test_reader: ReaderConfig,
    /// Mask head metadata, present only for instance-segmentation models.
    #[serde(rename = "MaskHead", default)]
    pub mask_head: Option<MaskHeadConfig>,
}

impl ExportConfig {
    /// Loads a configuration document from a YAML file and applies
    /// `key=value` overrides before typed deserialization.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read, a `Yaml` error if
    /// the document or an override does not deserialize, and a `ConfigError`
    /// if the reader section fails validation.
    pub fn load(path: &Path, overrides: &[(String, String)]) -> ExportResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ExportError::config_error(format!(
                "failed to read configuration '{}': {}",
                path.display(),
                e
            ))
        })?;
        let mut value: serde_yaml::Value = serde_yaml::from_str(&text)?;
        apply_overrides(&mut value, overrides)?;
        let config: ExportConfig = serde_yaml::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the invariants the rest of the pipeline relies on.
    pub fn validate(&self) -> ExportResult<()> {
        if self.test_reader.sample_transforms.is_empty() {
            return Err(ExportError::config_error(
                "TestReader.sample_transforms must contain at least one transform (the decode step)",
            ));
        }
        Ok(())
    }
}

/// Inference-time data-reader configuration (`TestReader`).
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    /// Declared model inputs and their shapes.
    pub inputs_def: InputsDef,
    /// Dataset reference for category resolution.
    pub dataset: DatasetConfig,
    /// Ordered training-time per-sample transforms. The first entry is the
    /// raw decode step and is never translated.
    pub sample_transforms: Vec<SampleTransform>,
    /// Ordered training-time per-batch transforms.
    #[serde(default)]
    pub batch_transforms: Option<Vec<BatchTransform>>,
}

/// Declared input shapes, possibly with unresolved dimensions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputsDef {
    /// `(channels, height, width)` where any entry may be unset.
    #[serde(default)]
    pub image_shape: Option<Vec<Option<u32>>>,
    /// Names of the declared feed fields.
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

impl InputsDef {
    /// Returns the declared image shape, defaulting unset entries so that a
    /// missing `image_shape` behaves like `[3, null, null]`.
    pub fn image_shape(&self) -> ImageShape {
        let dims = self.image_shape.as_deref().unwrap_or(&[]);
        let dim = |idx: usize| dims.get(idx).copied().flatten();
        ImageShape {
            channels: dim(0).or(Some(3)),
            height: dim(1),
            width: dim(2),
        }
    }
}

/// The `(channels, height, width)` image shape with optional dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    /// Channel count.
    pub channels: Option<u32>,
    /// Image height.
    pub height: Option<u32>,
    /// Image width.
    pub width: Option<u32>,
}

impl ImageShape {
    /// Returns `(height, width)` when every dimension is resolved.
    pub fn fully_defined(&self) -> Option<(u32, u32)> {
        match (self.channels, self.height, self.width) {
            (Some(_), Some(height), Some(width)) => Some((height, width)),
            _ => None,
        }
    }
}

/// Dataset reference carried by the reader configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// Root directory the annotation path is relative to.
    #[serde(default)]
    pub dataset_dir: Option<PathBuf>,
    /// Annotation file path, relative to `dataset_dir` when both are set.
    #[serde(default)]
    pub anno_path: Option<PathBuf>,
    /// Whether class id 0 is a background class.
    #[serde(default = "default_true")]
    pub with_background: bool,
    /// Whether to use the metric's builtin label table instead of the
    /// annotation source.
    #[serde(default)]
    pub use_default_label: bool,
}

impl DatasetConfig {
    /// Resolves the annotation file path against the dataset directory.
    pub fn annotation_file(&self) -> Option<PathBuf> {
        self.anno_path.as_ref().map(|anno| match &self.dataset_dir {
            Some(dir) => dir.join(anno),
            None => anno.clone(),
        })
    }
}

/// Mask head metadata consumed by instance-segmentation descriptors.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MaskHeadConfig {
    /// Output mask resolution.
    pub resolution: u32,
}

/// Merges dotted-path `key=value` overrides into a YAML value tree.
///
/// Intermediate mappings are created on demand; the leaf value is parsed as
/// YAML so `true`, `0.5`, and quoted strings all keep their natural types.
pub fn apply_overrides(
    value: &mut serde_yaml::Value,
    overrides: &[(String, String)],
) -> ExportResult<()> {
    for (path, raw) in overrides {
        let leaf: serde_yaml::Value = serde_yaml::from_str(raw)?;
        let mut current = &mut *value;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let map = match current {
                serde_yaml::Value::Mapping(map) => map,
                _ => {
                    return Err(ExportError::config_error(format!(
                        "override path '{}' does not address a mapping",
                        path
                    )))
                }
            };
            let key = serde_yaml::Value::String(segment.to_string());
            if segments.peek().is_none() {
                map.insert(key, leaf.clone());
                break;
            }
            current = map
                .entry(key)
                .or_insert_with(|| serde_yaml::Value::Mapping(serde_yaml::Mapping::new()));
        }
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CONFIG_YAML: &str = r#"
architecture: YOLOv3
metric: COCO
TestReader:
  inputs_def:
    image_shape: [3, 608, 608]
  dataset:
    use_default_label: true
    with_background: false
  sample_transforms:
  - type: DecodeImage
    to_rgb: true
  - type: ResizeImage
    target_size: 608
    interp: 2
  - type: NormalizeImage
  - type: Permute
  batch_transforms:
  - type: PadBatch
    pad_to_stride: 32
"#;

    #[test]
    fn test_load_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", CONFIG_YAML).unwrap();

        let config = ExportConfig::load(file.path(), &[]).unwrap();
        assert_eq!(config.architecture, "YOLOv3");
        assert_eq!(config.metric, "COCO");
        assert_eq!(config.test_reader.sample_transforms.len(), 4);
        assert!(config.mask_head.is_none());
        assert!(!config.test_reader.dataset.with_background);
    }

    #[test]
    fn test_load_config_with_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", CONFIG_YAML).unwrap();

        let overrides = vec![
            ("metric".to_string(), "VOC".to_string()),
            (
                "TestReader.dataset.with_background".to_string(),
                "true".to_string(),
            ),
        ];
        let config = ExportConfig::load(file.path(), &overrides).unwrap();
        assert_eq!(config.metric, "VOC");
        assert!(config.test_reader.dataset.with_background);
    }

    #[test]
    fn test_unknown_transform_kind_rejected() {
        let yaml = CONFIG_YAML.replace("DecodeImage", "MixupImage");
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", yaml).unwrap();

        let result = ExportConfig::load(file.path(), &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_sample_transforms_rejected() {
        let yaml = r#"
architecture: YOLOv3
metric: COCO
TestReader:
  inputs_def: {}
  dataset: {}
  sample_transforms: []
"#;
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", yaml).unwrap();

        let result = ExportConfig::load(file.path(), &[]);
        assert!(matches!(result, Err(ExportError::ConfigError { .. })));
    }

    #[test]
    fn test_image_shape_defaults() {
        let inputs = InputsDef::default();
        let shape = inputs.image_shape();
        assert_eq!(shape.channels, Some(3));
        assert_eq!(shape.height, None);
        assert_eq!(shape.fully_defined(), None);
    }

    #[test]
    fn test_image_shape_fully_defined() {
        let inputs = InputsDef {
            image_shape: Some(vec![Some(3), Some(800), Some(1333)]),
            fields: None,
        };
        assert_eq!(inputs.image_shape().fully_defined(), Some((800, 1333)));
    }

    #[test]
    fn test_annotation_file_joins_dataset_dir() {
        let dataset = DatasetConfig {
            dataset_dir: Some(PathBuf::from("dataset/coco")),
            anno_path: Some(PathBuf::from("annotations/instances_val2017.json")),
            with_background: true,
            use_default_label: false,
        };
        assert_eq!(
            dataset.annotation_file(),
            Some(PathBuf::from(
                "dataset/coco/annotations/instances_val2017.json"
            ))
        );
    }

    #[test]
    fn test_apply_overrides_creates_intermediate_maps() {
        let mut value: serde_yaml::Value = serde_yaml::from_str("a: 1").unwrap();
        let overrides = vec![("b.c".to_string(), "2".to_string())];
        apply_overrides(&mut value, &overrides).unwrap();
        let expected: serde_yaml::Value = serde_yaml::from_str("2").unwrap();
        assert_eq!(value["b"]["c"], expected);
    }
}
