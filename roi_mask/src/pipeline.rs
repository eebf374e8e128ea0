//! Building the mask of every slice, and the checked run around it.

use crate::error::{MaskError, Result};
use crate::fill::FillRule;
use crate::image_info::ImageInfo;
use crate::mask::{class_label, Mask, MaskMode, MaskStack};
use crate::output::save_stack;
use crate::preferences::MaskOptions;
use crate::rasterize::Rasterizer;
use crate::slice_selector::select_rois_for_slice;
use log::{debug, info};
use rayon::prelude::*;
use roi::Roi;
use std::path::{Path, PathBuf};

/// How masks are computed, as opposed to what is done with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildSettings {
    pub mode: MaskMode,
    pub fill_rule: FillRule,
    /// Rasterize slices on the rayon thread pool.
    pub parallel: bool,
}

/// Masks of slices `1..=slice_count`, in slice order.
///
/// In multi-class mode every ROI is checked before anything is painted, so a
/// group that cannot be labelled fails the whole stack even when its ROI sits
/// on a later slice.
pub fn build_masks(
    rois: &[Roi],
    width: usize,
    height: usize,
    slice_count: usize,
    settings: &BuildSettings,
) -> Result<MaskStack> {
    if width == 0 || height == 0 || slice_count == 0 {
        return Err(MaskError::EmptyImage {
            width,
            height,
            slice_count,
        });
    }
    if settings.mode == MaskMode::MultiClass {
        for roi in rois {
            class_label(roi)?;
        }
    }

    info!(
        "Building {slice_count} {} mask(s) of {width}x{height} from {} ROI(s)",
        settings.mode,
        rois.len()
    );
    let rasterizer = Rasterizer::new(width, height, settings.mode, settings.fill_rule);
    let slice_mask = |slice_index: usize| -> Result<Mask> {
        let selected = select_rois_for_slice(rois, slice_index, slice_count);
        debug!("Slice {slice_index}: {} ROI(s)", selected.len());
        rasterizer.rasterize(selected)
    };

    let masks = if settings.parallel {
        (1..=slice_count)
            .into_par_iter()
            .map(slice_mask)
            .collect::<Result<Vec<_>>>()?
    } else {
        (1..=slice_count)
            .map(slice_mask)
            .collect::<Result<Vec<_>>>()?
    };
    Ok(MaskStack::new(masks))
}

/// Rejects runs that cannot or must not produce masks. Checked in order:
/// hyperstack, no ROIs, saving without a directory, saving over the source.
pub fn check_preconditions(rois: &[Roi], image: &ImageInfo, options: &MaskOptions) -> Result<()> {
    if image.is_hyperstack() {
        return Err(MaskError::Hyperstack {
            channels: image.channels,
            slices: image.slices,
            frames: image.frames,
        });
    }
    if rois.is_empty() {
        return Err(MaskError::NoRois);
    }
    if options.save {
        if options.directory.as_os_str().is_empty() {
            return Err(MaskError::MissingOutputDirectory);
        }
        if options.suffix.is_empty() {
            if let Some(source) = &image.directory {
                if same_directory(source, &options.directory) {
                    return Err(MaskError::OverwriteRisk(options.directory.clone()));
                }
            }
        }
    }
    Ok(())
}

/// Path equality, resolving both sides when they exist.
fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// What a run produced.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// The masks, when showing was requested.
    pub shown: Option<MaskStack>,
    /// Files written, in slice order.
    pub saved: Vec<PathBuf>,
}

/// Checks the preconditions, builds every mask, then saves and/or returns
/// them as `options` asks. Nothing is written unless the whole stack was built.
pub fn run(
    rois: &[Roi],
    image: &ImageInfo,
    options: &MaskOptions,
    settings: &BuildSettings,
) -> anyhow::Result<RunOutcome> {
    check_preconditions(rois, image, options)?;
    let stack = build_masks(
        rois,
        image.width,
        image.height,
        image.slice_count(),
        settings,
    )?;

    let saved = if options.save {
        save_stack(
            &stack,
            image,
            &options.directory,
            &options.suffix,
            options.extension,
        )?
    } else {
        Vec::new()
    };
    Ok(RunOutcome {
        shown: options.show.then_some(stack),
        saved,
    })
}
