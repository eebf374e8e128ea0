//! Filenames of saved masks.
//!
//! A single-plane mask is named after the image, a stack mask after its slice.
//! The extension of that name is replaced by `suffix` followed by the output
//! extension, so `cells.tif` with suffix `_mask` becomes `cells_mask.png`.

use crate::error::{MaskError, Result};
use crate::image_info::{ImageInfo, UNTITLED};
use crate::output::OutputFormat;

/// Name of the image: its original file name, or the first word of its title
/// when it was never saved.
pub fn image_name(image: &ImageInfo) -> String {
    match image.file_name.as_deref() {
        Some(name) if !name.is_empty() && name != UNTITLED => String::from(name),
        _ => image
            .title
            .split_whitespace()
            .next()
            .unwrap_or(UNTITLED)
            .to_owned(),
    }
}

/// Name of the 1-based `slice_index`: the first line of its label, or
/// `Slice <index>` for unlabelled slices.
pub fn slice_name(image: &ImageInfo, slice_index: usize) -> Result<String> {
    let slice_count = image.slice_count();
    if slice_index < 1 || slice_index > slice_count {
        return Err(MaskError::SliceOutOfRange {
            index: slice_index,
            slice_count,
        });
    }
    Ok(match image.slice_label(slice_index) {
        Some(label) => label.lines().next().unwrap_or_default().to_owned(),
        None => format!("Slice {slice_index}"),
    })
}

/// `name` without its last extension. Leading dots do not start an extension.
pub fn strip_extension(name: &str) -> &str {
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name[leading_dots..].rfind('.') {
        Some(dot) => &name[..leading_dots + dot],
        None => name,
    }
}

/// Filename of the mask of `slice_index`.
pub fn mask_file_name(
    image: &ImageInfo,
    slice_index: usize,
    suffix: &str,
    format: OutputFormat,
) -> Result<String> {
    let base = if image.slice_count() == 1 {
        image_name(image)
    } else {
        slice_name(image, slice_index)?
    };
    Ok(format!(
        "{}{suffix}.{}",
        strip_extension(&base),
        format.extension()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_image_name() {
        let saved = ImageInfo::new(1, 1, 1).with_source_file(Path::new("/tmp/cells.tif"));
        assert_eq!(image_name(&saved), "cells.tif");

        let unsaved = ImageInfo::new(1, 1, 1).with_title("blobs.gif (inverting LUT)");
        assert_eq!(image_name(&unsaved), "blobs.gif");

        let mut untitled = unsaved.clone();
        untitled.file_name = Some(String::from(UNTITLED));
        assert_eq!(image_name(&untitled), "blobs.gif");

        let blank = ImageInfo::new(1, 1, 1).with_title("   ");
        assert_eq!(image_name(&blank), UNTITLED);
    }

    #[test]
    fn test_slice_name() {
        let image = ImageInfo::new(1, 1, 3).with_slice_labels(vec![
            Some(String::from("t01.tif\nexposure=20ms")),
            None,
            Some(String::new()),
        ]);
        assert_eq!(slice_name(&image, 1).unwrap(), "t01.tif");
        assert_eq!(slice_name(&image, 2).unwrap(), "Slice 2");
        assert_eq!(slice_name(&image, 3).unwrap(), "");
        assert!(matches!(
            slice_name(&image, 0),
            Err(MaskError::SliceOutOfRange {
                index: 0,
                slice_count: 3
            })
        ));
        assert!(slice_name(&image, 4).is_err());
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("cells.tif"), "cells");
        assert_eq!(strip_extension("cells.ome.tif"), "cells.ome");
        assert_eq!(strip_extension("cells"), "cells");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert_eq!(strip_extension("..a.b"), "..a");
        assert_eq!(strip_extension("Slice 2"), "Slice 2");
    }

    #[test]
    fn test_mask_file_name() {
        let single = ImageInfo::new(1, 1, 1).with_source_file(Path::new("/tmp/cells.tif"));
        assert_eq!(
            mask_file_name(&single, 1, "_mask", OutputFormat::Png).unwrap(),
            "cells_mask.png"
        );
        assert_eq!(
            mask_file_name(&single, 1, "", OutputFormat::Tif).unwrap(),
            "cells.tif"
        );

        let stack = ImageInfo::new(1, 1, 2)
            .with_source_file(Path::new("/tmp/stack.tif"))
            .with_slice_labels(vec![Some(String::from("frame_a.jpg"))]);
        assert_eq!(
            mask_file_name(&stack, 1, "-roi", OutputFormat::Bmp).unwrap(),
            "frame_a-roi.bmp"
        );
        assert_eq!(
            mask_file_name(&stack, 2, "-roi", OutputFormat::Tiff).unwrap(),
            "Slice 2-roi.tiff"
        );
    }
}
