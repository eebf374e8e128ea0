//! Writing masks to disk.

use crate::image_info::ImageInfo;
use crate::mask::{Mask, MaskStack};
use crate::naming::mask_file_name;
use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumIter, EnumString};

/// Raster formats masks can be saved as, named by their extension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Tif,
    Tiff,
    Png,
    Jpg,
    Gif,
    Bmp,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Tif => "tif",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Gif => "gif",
            OutputFormat::Bmp => "bmp",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Tif | OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpg => ImageFormat::Jpeg,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::Bmp => ImageFormat::Bmp,
        }
    }
}

/// Writes one mask as an 8-bit grayscale image.
pub fn save_mask(mask: &Mask, path: &Path, format: OutputFormat) -> Result<()> {
    let gray = DynamicImage::ImageLuma8(mask.to_gray_image());
    // the GIF encoder only takes RGB(A) frames; a palette of grays keeps the values
    let image = match format {
        OutputFormat::Gif => DynamicImage::ImageRgba8(gray.to_rgba8()),
        _ => gray,
    };
    image
        .save_with_format(path, format.image_format())
        .with_context(|| format!("Failed to save mask to {path:?}"))
}

/// Saves every mask of `stack` into `directory`, named after the image or
/// its slices. Returns the written paths in slice order.
pub fn save_stack(
    stack: &MaskStack,
    image: &ImageInfo,
    directory: &Path,
    suffix: &str,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    let paths = stack
        .iter()
        .map(|(slice_index, mask)| {
            let path = directory.join(mask_file_name(image, slice_index, suffix, format)?);
            debug!("Saving mask of slice {slice_index} to {path:?}");
            save_mask(mask, &path, format)?;
            Ok(path)
        })
        .collect::<Result<Vec<_>>>()?;
    info!("Saved {} mask(s) in {directory:?}", paths.len());
    Ok(paths)
}
