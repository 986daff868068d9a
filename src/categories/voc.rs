//! Pascal VOC category resolution.

use super::CategoryInfo;
use crate::core::{ExportError, ExportResult};
use std::path::Path;

/// Resolves VOC categories from a label-list file (one name per line), or
/// from the builtin 20-class table when no label source applies.
pub(super) fn category_info(
    label_file: Option<&Path>,
    with_background: bool,
    use_default_label: bool,
) -> ExportResult<CategoryInfo> {
    match label_file {
        Some(path) if !use_default_label => from_label_list(path, with_background),
        _ => Ok(default_category_info(with_background)),
    }
}

fn from_label_list(path: &Path, with_background: bool) -> ExportResult<CategoryInfo> {
    let content = std::fs::read_to_string(path).map_err(|e| ExportError::InvalidInput {
        message: format!(
            "Failed to read label list from '{}': {}",
            path.display(),
            e
        ),
    })?;
    let names: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if names.is_empty() {
        return Err(ExportError::invalid_input(format!(
            "label list '{}' contains no labels",
            path.display()
        )));
    }
    Ok(CategoryInfo::from_pairs(
        names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| (idx as u32 + 1, name.to_string())),
        with_background,
    ))
}

fn default_category_info(with_background: bool) -> CategoryInfo {
    CategoryInfo::from_pairs(
        VOC_CATEGORIES
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx as u32 + 1, (*name).to_string())),
        with_background,
    )
}

/// The 20 Pascal VOC categories in canonical order.
const VOC_CATEGORIES: &[&str] = &[
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_labels() {
        let info = category_info(None, false, false).unwrap();
        assert_eq!(info.label_list().len(), 20);
        assert_eq!(info.label_list()[0], "aeroplane");
        assert_eq!(info.clsid_to_catid.get(&0), Some(&1));
    }

    #[test]
    fn test_default_labels_with_background() {
        let info = category_info(None, true, true).unwrap();
        assert_eq!(info.label_list().len(), 21);
        assert_eq!(info.label_list()[0], "background");
        assert_eq!(info.clsid_to_catid.get(&1), Some(&1));
    }

    #[test]
    fn test_label_list_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "crack").unwrap();
        writeln!(file, "corrosion").unwrap();
        writeln!(file).unwrap();

        let info = category_info(Some(file.path()), false, false).unwrap();
        assert_eq!(info.label_list(), vec!["crack", "corrosion"]);
        assert_eq!(info.clsid_to_catid.get(&1), Some(&2));
    }

    #[test]
    fn test_empty_label_list_is_an_error() {
        let file = NamedTempFile::new().unwrap();
        let result = category_info(Some(file.path()), false, false);
        assert!(result.is_err());
    }
}
