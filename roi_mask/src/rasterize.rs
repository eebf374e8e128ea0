//! Compositing the ROIs of one slice into a mask.

use crate::error::Result;
use crate::fill::{FillRule, ScanlineFiller, SpanFiller};
use crate::mask::{Mask, MaskMode};
use roi::Roi;

/// Turns ROI lists into masks of a fixed size.
///
/// ROIs are painted in iteration order. In binary mode every covered pixel
/// becomes 255, so the result does not depend on that order. In multi-class
/// mode a covered pixel is overwritten with `group + 1`, so where ROIs overlap
/// the last one painted decides the class.
#[derive(Debug, Clone)]
pub struct Rasterizer<F = ScanlineFiller> {
    width: usize,
    height: usize,
    mode: MaskMode,
    filler: F,
}

impl Rasterizer {
    /// Rasterizer using the scanline filler with `fill_rule`.
    pub fn new(width: usize, height: usize, mode: MaskMode, fill_rule: FillRule) -> Self {
        Self::with_filler(width, height, mode, ScanlineFiller::new(fill_rule))
    }
}

impl<F: SpanFiller> Rasterizer<F> {
    pub fn with_filler(width: usize, height: usize, mode: MaskMode, filler: F) -> Self {
        Rasterizer {
            width,
            height,
            mode,
            filler,
        }
    }

    /// Paints `rois` onto a fresh all-background mask.
    ///
    /// Fails on the first ROI whose group cannot be represented; the partly
    /// painted mask is dropped.
    pub fn rasterize<'a>(&self, rois: impl IntoIterator<Item = &'a Roi>) -> Result<Mask> {
        let mut mask = Mask::new(self.width, self.height);
        for roi in rois {
            let value = self.mode.label(roi)?;
            self.filler
                .fill_spans(&roi.outline, self.width, self.height, &mut |y, xs| {
                    mask.paint_span(y, xs, value);
                });
        }
        Ok(mask)
    }
}

/// Rasterizes `rois` with the default even-odd scanline filler.
pub fn rasterize(rois: &[&Roi], width: usize, height: usize, mode: MaskMode) -> Result<Mask> {
    Rasterizer::new(width, height, mode, FillRule::default()).rasterize(rois.iter().copied())
}
