//! Metric-specific category resolution.
//!
//! Maps a dataset/metric kind to a label-id mapping. The dispatch lives
//! here; how an annotation source yields category ids is delegated to the
//! per-metric resolvers in the submodules.

mod coco;
mod voc;
mod widerface;

use crate::core::{ExportError, ExportResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The fixed set of supported evaluation metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// COCO-style annotations and category ids.
    #[serde(rename = "COCO")]
    Coco,
    /// Pascal VOC label lists.
    #[serde(rename = "VOC")]
    Voc,
    /// WIDER FACE single-class face detection.
    #[serde(rename = "WIDERFACE")]
    WiderFace,
}

impl MetricKind {
    /// Parses a metric string from the configuration document.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedMetric` for anything outside the supported set;
    /// this is a checked failure, never a silent default.
    pub fn parse(metric: &str) -> ExportResult<Self> {
        match metric {
            "COCO" => Ok(Self::Coco),
            "VOC" => Ok(Self::Voc),
            "WIDERFACE" => Ok(Self::WiderFace),
            other => Err(ExportError::UnsupportedMetric {
                metric: other.to_string(),
            }),
        }
    }

    /// The canonical configuration spelling of the metric.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coco => "COCO",
            Self::Voc => "VOC",
            Self::WiderFace => "WIDERFACE",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label-id mapping derived once per export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
    /// Contiguous class index to external category id.
    pub clsid_to_catid: BTreeMap<u32, u32>,
    /// Category id to display name, in ascending class-index order.
    pub catid_to_name: Vec<(u32, String)>,
}

impl CategoryInfo {
    /// Builds the mapping from ordered `(category id, name)` pairs.
    ///
    /// With a background class, class index 0 maps to category 0
    /// (`background`) and every other class index is shifted up by one.
    pub(crate) fn from_pairs<I>(pairs: I, with_background: bool) -> Self
    where
        I: IntoIterator<Item = (u32, String)>,
    {
        let mut clsid_to_catid = BTreeMap::new();
        let mut catid_to_name = Vec::new();
        if with_background {
            clsid_to_catid.insert(0, 0);
            catid_to_name.push((0, "background".to_string()));
        }
        let offset = u32::from(with_background);
        for (clsid, (catid, name)) in pairs.into_iter().enumerate() {
            clsid_to_catid.insert(clsid as u32 + offset, catid);
            catid_to_name.push((catid, name));
        }
        Self {
            clsid_to_catid,
            catid_to_name,
        }
    }

    /// Display names in ascending class-index order.
    pub fn label_list(&self) -> Vec<String> {
        self.catid_to_name
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }
}

/// Resolves the category mapping for a metric kind.
///
/// `annotation_file` is consulted only when `use_default_label` is false;
/// otherwise the metric's builtin label table is used.
pub fn resolve_categories(
    metric: MetricKind,
    annotation_file: Option<&Path>,
    with_background: bool,
    use_default_label: bool,
) -> ExportResult<CategoryInfo> {
    match metric {
        MetricKind::Coco => coco::category_info(annotation_file, with_background, use_default_label),
        MetricKind::Voc => voc::category_info(annotation_file, with_background, use_default_label),
        MetricKind::WiderFace => Ok(widerface::category_info(with_background)),
    }
}
