//! Rasterization of ROIs into 8-bit mask images.
//!
//! ROIs are assigned to the slices of an image ([`select_rois_for_slice`]),
//! each slice's ROIs are painted onto a fresh mask ([`Rasterizer`]) and the
//! masks are collected in slice order ([`build_masks`]). [`run`] wraps that
//! with the checks and the saving a command-line run needs.

pub mod error;
pub mod fill;
pub mod image_info;
pub mod mask;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod preferences;
pub mod rasterize;
pub mod slice_selector;

pub use error::MaskError;
pub use fill::{FillRule, ScanlineFiller, SpanFiller};
pub use image_info::ImageInfo;
pub use mask::{Mask, MaskMode, MaskStack};
pub use output::OutputFormat;
pub use pipeline::{build_masks, check_preconditions, run, BuildSettings, RunOutcome};
pub use preferences::{MaskOptions, PreferenceStore};
pub use rasterize::{rasterize, Rasterizer};
pub use slice_selector::select_rois_for_slice;
