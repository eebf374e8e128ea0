//! Errors that abort a mask run.

use std::path::PathBuf;

/// Every variant is terminal for the run: no mask is shown or saved.
#[derive(Debug, thiserror::Error)]
pub enum MaskError {
    /// The ROI store was empty.
    #[error("No ROIs were provided.")]
    NoRois,

    /// The image has more than one non-spatial dimension.
    #[error(
        "Hyperstacks are not supported, use a single-slider stack instead \
         (image has {channels} channels, {slices} slices and {frames} frames)."
    )]
    Hyperstack {
        /// number of channels
        channels: usize,
        /// number of z slices
        slices: usize,
        /// number of time frames
        frames: usize,
    },

    /// Saving was requested without an output directory.
    #[error("Saving is selected but no directory was provided.")]
    MissingOutputDirectory,

    /// Saving with these settings would replace the source images.
    #[error(
        "The output directory {0:?} is the directory of the source image and the filename \
         suffix is empty, the masks could overwrite the images. \
         Select another output directory or add a filename suffix."
    )]
    OverwriteRisk(PathBuf),

    /// A group id does not fit an 8-bit label once background takes value 0.
    #[error(
        "{roi} has group {group}, only groups up to {max} are supported since 0 is taken by \
         the background of an 8-bit mask."
    )]
    GroupOutOfRange {
        /// description of the offending ROI
        roi: String,
        /// its group
        group: u32,
        /// largest accepted group
        max: u32,
    },

    /// A slice index outside `[1, slice_count]` was requested.
    #[error("Slice index {index} is outside of the stack range 1..={slice_count}.")]
    SliceOutOfRange {
        /// requested index
        index: usize,
        /// number of slices in the stack
        slice_count: usize,
    },

    /// Width, height or slice count of zero.
    #[error("Image dimensions must be positive, got {width}x{height} with {slice_count} slices.")]
    EmptyImage {
        /// width in pixels
        width: usize,
        /// height in pixels
        height: usize,
        /// number of slices
        slice_count: usize,
    },
}

/// Result of the mask core.
pub type Result<T, E = MaskError> = std::result::Result<T, E>;
