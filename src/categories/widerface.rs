//! WIDER FACE category resolution.

use super::CategoryInfo;

/// WIDER FACE has a single `face` class; the annotation source never
/// contributes category information.
pub(super) fn category_info(with_background: bool) -> CategoryInfo {
    CategoryInfo::from_pairs([(1, "face".to_string())], with_background)
}
