//! Assigning ROIs to the slices of a stack.

use roi::Roi;

/// ROIs drawn on the 1-based `slice_index` of a stack with `slice_count` slices.
///
/// A single-plane image takes every ROI: they are stored with position 0 and
/// implicitly apply to the only plane. On a stack only ROIs whose position
/// equals `slice_index` are kept. The input order is preserved since it decides
/// which ROI wins an overlap in multi-class masks.
pub fn select_rois_for_slice(rois: &[Roi], slice_index: usize, slice_count: usize) -> Vec<&Roi> {
    if slice_count == 1 {
        return rois.iter().collect();
    }
    rois.iter()
        .filter(|roi| roi.position as usize == slice_index)
        .collect()
}
