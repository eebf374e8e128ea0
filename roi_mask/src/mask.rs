//! Mask rasters and the stack they are collected into.

use crate::error::{MaskError, Result};
use image::{GrayImage, Luma};
use itertools::Itertools;
use ndarray::{s, Array2};
use roi::Roi;
use std::collections::BTreeMap;
use std::ops::Range;
use strum_macros::{Display, EnumString};

/// Value of pixels covered by no ROI.
pub const BACKGROUND: u8 = 0;
/// Value of covered pixels in a binary mask.
pub const FOREGROUND: u8 = u8::MAX;
/// Largest group that can be painted: `group + 1` must fit in a byte.
pub const MAX_GROUP: u32 = FOREGROUND as u32 - 1;

/// How covered pixels are labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum MaskMode {
    /// 255 wherever at least one ROI covers the pixel.
    #[default]
    Binary,
    /// `group + 1` of the last ROI covering the pixel.
    MultiClass,
}

/// Pixel value a multi-class mask uses for `roi`.
pub fn class_label(roi: &Roi) -> Result<u8> {
    if roi.group > MAX_GROUP {
        return Err(MaskError::GroupOutOfRange {
            roi: roi.to_string(),
            group: roi.group,
            max: MAX_GROUP,
        });
    }
    Ok(roi.group as u8 + 1)
}

impl MaskMode {
    /// Pixel value painted for `roi` in this mode.
    pub fn label(self, roi: &Roi) -> Result<u8> {
        match self {
            MaskMode::Binary => Ok(FOREGROUND),
            MaskMode::MultiClass => class_label(roi),
        }
    }
}

/// One 8-bit raster, stored row-major as `[[y, x]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pixels: Array2<u8>,
}

impl Mask {
    /// All-background raster.
    pub fn new(width: usize, height: usize) -> Self {
        Mask {
            pixels: Array2::from_elem((height, width), BACKGROUND),
        }
    }

    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    /// Value at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[[y, x]]
    }

    /// Paints columns `xs` of row `y`, overwriting whatever was there.
    pub(crate) fn paint_span(&mut self, y: usize, xs: Range<usize>, value: u8) {
        self.pixels.slice_mut(s![y, xs]).fill(value);
    }

    pub fn is_background(&self) -> bool {
        self.pixels.iter().all(|&v| v == BACKGROUND)
    }

    /// Number of pixels carrying each non-background value.
    pub fn label_counts(&self) -> BTreeMap<u8, usize> {
        self.pixels
            .iter()
            .copied()
            .filter(|&v| v != BACKGROUND)
            .counts()
            .into_iter()
            .collect()
    }

    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            Luma([self.pixels[[y as usize, x as usize]]])
        })
    }
}

/// Masks of every slice of an image, in slice order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaskStack {
    masks: Vec<Mask>,
}

impl MaskStack {
    pub(crate) fn new(masks: Vec<Mask>) -> Self {
        MaskStack { masks }
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Mask of the 1-based `slice_index`.
    pub fn slice(&self, slice_index: usize) -> Option<&Mask> {
        slice_index
            .checked_sub(1)
            .and_then(|index| self.masks.get(index))
    }

    /// Iterates `(slice_index, mask)` with 1-based indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Mask)> {
        self.masks.iter().enumerate().map(|(ind, mask)| (ind + 1, mask))
    }
}
