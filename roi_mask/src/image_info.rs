//! Description of the image the ROIs were drawn on.

use anyhow::{bail, Context, Result};
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, Limits};
use tiff::tags::Tag;

/// ImageJ private tags: byte counts of the metadata blocks, then the blocks.
const IJ_METADATA_BYTE_COUNTS: Tag = Tag::Unknown(50838);
const IJ_METADATA: Tag = Tag::Unknown(50839);
const PAGE_NAME: Tag = Tag::Unknown(285);

/// Window title of images that were never saved.
pub const UNTITLED: &str = "Untitled";

/// What the mask run needs to know about the annotated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub slices: usize,
    pub frames: usize,
    /// Name of the file the image was opened from, if any.
    pub file_name: Option<String>,
    /// Directory of the file the image was opened from, if any.
    pub directory: Option<PathBuf>,
    pub title: String,
    /// Per-slice labels, indexed from slice 1.
    pub slice_labels: Vec<Option<String>>,
}

impl ImageInfo {
    /// Single-channel, single-frame image with `slice_count` planes.
    pub fn new(width: usize, height: usize, slice_count: usize) -> Self {
        ImageInfo {
            width,
            height,
            channels: 1,
            slices: slice_count,
            frames: 1,
            file_name: None,
            directory: None,
            title: String::from(UNTITLED),
            slice_labels: Vec::new(),
        }
    }

    /// Records the file the image came from; the title becomes the file name.
    pub fn with_source_file(mut self, path: &Path) -> Self {
        self.file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.directory = path.parent().map(Path::to_path_buf);
        if let Some(name) = &self.file_name {
            self.title.clone_from(name);
        }
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_slice_labels(mut self, labels: Vec<Option<String>>) -> Self {
        self.slice_labels = labels;
        self
    }

    /// Number of planes in the stack, all dimensions included. Saturates
    /// instead of overflowing.
    pub fn slice_count(&self) -> usize {
        self.channels
            .saturating_mul(self.slices)
            .saturating_mul(self.frames)
    }

    /// More than one of channels, slices and frames is larger than one.
    pub fn is_hyperstack(&self) -> bool {
        [self.channels, self.slices, self.frames]
            .into_iter()
            .filter(|&n| n > 1)
            .count()
            > 1
    }

    /// Label of the 1-based `slice_index`, if one was recorded.
    pub fn slice_label(&self, slice_index: usize) -> Option<&str> {
        slice_index
            .checked_sub(1)
            .and_then(|ind| self.slice_labels.get(ind))
            .and_then(Option::as_deref)
    }

    /// Reads dimensions, stack layout and slice labels from a TIFF file.
    ///
    /// Stack layout comes from an ImageJ `ImageDescription` when present,
    /// otherwise every IFD is counted as one slice. Slice labels come from the
    /// ImageJ metadata tags, otherwise from the `PageName` of each IFD.
    pub fn probe_tiff(path: &Path) -> Result<Self> {
        let mut decoder = Decoder::new(BufReader::new(
            File::open(path).with_context(|| format!("Error opening TIFF image {path:?}."))?,
        ))
        .with_context(|| format!("Error decoding TIFF header of {path:?}."))?
        .with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions()?;
        let description = decoder.get_tag_ascii_string(Tag::ImageDescription).ok();
        let layout = description.as_deref().and_then(ImageJLayout::parse);
        let imagej_labels = match (
            decoder.get_tag_u32_vec(IJ_METADATA_BYTE_COUNTS),
            decoder.get_tag_u8_vec(IJ_METADATA),
        ) {
            (Ok(byte_counts), Ok(data)) => imagej_slice_labels(&byte_counts, &data),
            _ => None,
        };

        let mut info = ImageInfo::new(width as usize, height as usize, 1).with_source_file(path);
        let mut page_names = vec![page_name(&mut decoder)];
        match layout {
            Some(layout) => {
                debug!("{path:?} carries an ImageJ description: {layout:?}");
                if layout.plane_count().is_none() {
                    bail!("Invalid stack layout in the ImageJ description of {path:?}: {layout:?}");
                }
                info.channels = layout.channels;
                info.slices = layout.slices;
                info.frames = layout.frames;
            }
            None => {
                while decoder.more_images() {
                    decoder.next_image()?;
                    page_names.push(page_name(&mut decoder));
                }
                info.slices = page_names.len();
            }
        }

        info.slice_labels = match imagej_labels {
            Some(labels) => labels,
            None if page_names.iter().any(Option::is_some) => page_names,
            None => Vec::new(),
        };
        Ok(info)
    }
}

fn page_name<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<String> {
    decoder
        .get_tag_ascii_string(PAGE_NAME)
        .ok()
        .filter(|name| !name.is_empty())
}

/// Slice labels stored in the `labl` block of ImageJ's metadata tags.
///
/// The data starts with a header: the magic `IJIJ` followed by one
/// `(type, count)` pair of 32-bit integers per block type. Blocks follow in
/// header order, their sizes given by `byte_counts[1..]`. Labels are UTF-16.
/// The magic tells the byte order of the integers and the text.
fn imagej_slice_labels(byte_counts: &[u32], data: &[u8]) -> Option<Vec<Option<String>>> {
    let big_endian = match data.get(..4)? {
        b"IJIJ" => true,
        b"JIJI" => false,
        _ => return None,
    };
    let read_u32 = |pos: usize| -> Option<u32> {
        let bytes: [u8; 4] = data.get(pos..pos + 4)?.try_into().ok()?;
        Some(if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    };
    let labl = u32::from_be_bytes(*b"labl");

    let header_len = *byte_counts.first()? as usize;
    let mut pos = header_len;
    let mut block = 1;
    let mut labels = None;
    for entry in (4..header_len.saturating_sub(7)).step_by(8) {
        let (block_type, count) = (read_u32(entry)?, read_u32(entry + 4)?);
        for _ in 0..count {
            let len = *byte_counts.get(block)? as usize;
            let bytes = data.get(pos..pos.checked_add(len)?)?;
            if block_type == labl {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| {
                        let pair = [c[0], c[1]];
                        if big_endian {
                            u16::from_be_bytes(pair)
                        } else {
                            u16::from_le_bytes(pair)
                        }
                    })
                    .collect();
                let label = String::from_utf16_lossy(&units);
                labels
                    .get_or_insert_with(Vec::new)
                    .push((!label.is_empty()).then_some(label));
            }
            pos += len;
            block += 1;
        }
    }
    labels
}

/// Stack layout stored by ImageJ as `key=value` lines in the TIFF description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ImageJLayout {
    channels: usize,
    slices: usize,
    frames: usize,
}

impl ImageJLayout {
    fn parse(description: &str) -> Option<Self> {
        if !description.starts_with("ImageJ=") {
            return None;
        }
        let field = |key: &str| {
            description.lines().find_map(|line| {
                let (k, v) = line.split_once('=')?;
                (k.trim() == key).then(|| v.trim().parse::<usize>().ok())?
            })
        };
        let channels = field("channels").unwrap_or(1);
        let frames = field("frames").unwrap_or(1);
        // a plain stack may only declare `images`
        let slices = field("slices").unwrap_or_else(|| {
            field("images").map_or(1, |images| {
                images / channels.saturating_mul(frames).max(1)
            })
        });
        Some(ImageJLayout {
            channels,
            slices,
            frames,
        })
    }

    /// Total number of planes, `None` when a dimension is zero or the
    /// product does not fit.
    fn plane_count(&self) -> Option<usize> {
        if [self.channels, self.slices, self.frames].contains(&0) {
            return None;
        }
        self.channels
            .checked_mul(self.slices)?
            .checked_mul(self.frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use crate::naming::mask_file_name;
    use crate::output::OutputFormat;
    use tiff::encoder::{colortype, TiffEncoder};

    fn utf16(text: &str, big_endian: bool) -> Vec<u8> {
        text.encode_utf16()
            .flat_map(|unit| {
                if big_endian {
                    unit.to_be_bytes()
                } else {
                    unit.to_le_bytes()
                }
            })
            .collect()
    }

    /// ImageJ metadata holding only a `labl` block, as `(byte_counts, data)`.
    fn imagej_metadata(labels: &[&str], big_endian: bool) -> (Vec<u32>, Vec<u8>) {
        let int = |v: u32| {
            if big_endian {
                v.to_be_bytes()
            } else {
                v.to_le_bytes()
            }
        };
        let mut data = if big_endian { b"IJIJ".to_vec() } else { b"JIJI".to_vec() };
        data.extend(int(u32::from_be_bytes(*b"labl")));
        data.extend(int(labels.len() as u32));
        let mut byte_counts = vec![data.len() as u32];
        for label in labels {
            let bytes = utf16(label, big_endian);
            byte_counts.push(bytes.len() as u32);
            data.extend(bytes);
        }
        (byte_counts, data)
    }

    #[test]
    fn test_hyperstack() {
        let mut info = ImageInfo::new(4, 4, 10);
        assert!(!info.is_hyperstack());
        assert_eq!(info.slice_count(), 10);
        info.channels = 2;
        assert!(info.is_hyperstack());
        assert_eq!(info.slice_count(), 20);
        info.slices = 1;
        // a channel-only stack has a single slider
        assert!(!info.is_hyperstack());
    }

    #[test]
    fn test_source_file() {
        let info = ImageInfo::new(1, 1, 1).with_source_file(Path::new("/data/run1/cells.tif"));
        assert_eq!(info.file_name.as_deref(), Some("cells.tif"));
        assert_eq!(info.directory.as_deref(), Some(Path::new("/data/run1")));
        assert_eq!(info.title, "cells.tif");
    }

    #[test]
    fn test_slice_labels() {
        let info = ImageInfo::new(1, 1, 3)
            .with_slice_labels(vec![Some(String::from("a")), None, Some(String::from("c"))]);
        assert_eq!(info.slice_label(0), None);
        assert_eq!(info.slice_label(1), Some("a"));
        assert_eq!(info.slice_label(2), None);
        assert_eq!(info.slice_label(3), Some("c"));
        assert_eq!(info.slice_label(4), None);
    }

    #[test]
    fn test_parse_imagej_description() {
        assert_eq!(
            ImageJLayout::parse("ImageJ=1.54f\nimages=24\nchannels=2\nslices=4\nframes=3\n"),
            Some(ImageJLayout {
                channels: 2,
                slices: 4,
                frames: 3
            })
        );
        assert_eq!(
            ImageJLayout::parse("ImageJ=1.53t\nimages=12\nslices=12\nunit=micron\nloop=false\n"),
            Some(ImageJLayout {
                channels: 1,
                slices: 12,
                frames: 1
            })
        );
        assert_eq!(
            ImageJLayout::parse("ImageJ=1.53t\nimages=7\n"),
            Some(ImageJLayout {
                channels: 1,
                slices: 7,
                frames: 1
            })
        );
        assert_eq!(ImageJLayout::parse("Made by a microscope"), None);
    }

    #[test]
    fn test_probe_multipage_tiff() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("stack.tif");
        let data = vec![0u8; 6 * 4];
        {
            let mut encoder = TiffEncoder::new(File::create(&path)?)?;
            for _ in 0..3 {
                encoder.write_image::<colortype::Gray8>(6, 4, &data)?;
            }
        }
        let info = ImageInfo::probe_tiff(&path)?;
        assert_eq!((info.width, info.height), (6, 4));
        assert_eq!(info.slice_count(), 3);
        assert!(!info.is_hyperstack());
        assert_eq!(info.file_name.as_deref(), Some("stack.tif"));
        assert_eq!(info.directory.as_deref(), Some(dir.path()));
        Ok(())
    }

    #[test]
    fn test_probe_imagej_hyperstack() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("hyper.tif");
        let data = vec![0u8; 3 * 2];
        {
            let mut encoder = TiffEncoder::new(File::create(&path)?)?;
            let mut image = encoder.new_image::<colortype::Gray8>(3, 2)?;
            image.encoder().write_tag(
                Tag::ImageDescription,
                "ImageJ=1.54f\nimages=4\nchannels=2\nslices=2\nhyperstack=true\n",
            )?;
            image.write_data(&data)?;
        }
        let info = ImageInfo::probe_tiff(&path)?;
        assert_eq!((info.channels, info.slices, info.frames), (2, 2, 1));
        assert!(info.is_hyperstack());
        Ok(())
    }

    #[test]
    fn test_imagej_labels_either_byte_order() {
        for big_endian in [true, false] {
            let (byte_counts, data) = imagej_metadata(&["a.tif", "", "c"], big_endian);
            assert_eq!(
                imagej_slice_labels(&byte_counts, &data),
                Some(vec![Some(String::from("a.tif")), None, Some(String::from("c"))])
            );
        }
    }

    #[test]
    fn test_imagej_labels_skip_other_blocks() {
        // an `info` block precedes the labels
        let mut data = b"IJIJ".to_vec();
        data.extend(u32::from_be_bytes(*b"info").to_be_bytes());
        data.extend(1u32.to_be_bytes());
        data.extend(u32::from_be_bytes(*b"labl").to_be_bytes());
        data.extend(1u32.to_be_bytes());
        let info = utf16("Exposure=20", true);
        let label = utf16("z1", true);
        let byte_counts = vec![20, info.len() as u32, label.len() as u32];
        data.extend(&info);
        data.extend(&label);
        assert_eq!(
            imagej_slice_labels(&byte_counts, &data),
            Some(vec![Some(String::from("z1"))])
        );
    }

    #[test]
    fn test_imagej_labels_malformed() {
        let (byte_counts, data) = imagej_metadata(&["a.tif", "b.tif"], true);
        assert_eq!(imagej_slice_labels(&byte_counts, &data[..data.len() - 2]), None);
        assert_eq!(imagej_slice_labels(&byte_counts[..2], &data), None);
        assert_eq!(imagej_slice_labels(&byte_counts, b"XXXX"), None);
        assert_eq!(imagej_slice_labels(&[], &data), None);
        // a header listing no labels at all
        let (byte_counts, data) = imagej_metadata(&[], true);
        assert_eq!(imagej_slice_labels(&byte_counts, &data), None);
    }

    #[test]
    fn test_labelled_tiff_names_masks() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("sequence.tif");
        let data = vec![0u8; 2 * 2];
        let (byte_counts, metadata) =
            imagej_metadata(&["t01.tif", "", "t03.tif\nexposure=20ms"], true);
        {
            let mut encoder = TiffEncoder::new(File::create(&path)?)?;
            let mut image = encoder.new_image::<colortype::Gray8>(2, 2)?;
            image
                .encoder()
                .write_tag(Tag::ImageDescription, "ImageJ=1.54f\nimages=3\nslices=3\n")?;
            image
                .encoder()
                .write_tag(IJ_METADATA_BYTE_COUNTS, &byte_counts[..])?;
            image.encoder().write_tag(IJ_METADATA, &metadata[..])?;
            image.write_data(&data)?;
            for _ in 0..2 {
                encoder.write_image::<colortype::Gray8>(2, 2, &data)?;
            }
        }
        let info = ImageInfo::probe_tiff(&path)?;
        assert_eq!(info.slice_count(), 3);
        assert_eq!(info.slice_label(1), Some("t01.tif"));
        assert_eq!(info.slice_label(2), None);

        let names = (1..=3)
            .map(|slice| mask_file_name(&info, slice, "_mask", OutputFormat::Png))
            .collect::<crate::error::Result<Vec<_>>>()?;
        assert_eq!(names, ["t01_mask.png", "Slice 2_mask.png", "t03_mask.png"]);
        Ok(())
    }

    #[test]
    fn test_tiff_page_names() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("pages.tif");
        let data = vec![0u8; 2 * 2];
        {
            let mut encoder = TiffEncoder::new(File::create(&path)?)?;
            for name in ["left.png", "right.png"] {
                let mut image = encoder.new_image::<colortype::Gray8>(2, 2)?;
                image.encoder().write_tag(PAGE_NAME, name)?;
                image.write_data(&data)?;
            }
        }
        let info = ImageInfo::probe_tiff(&path)?;
        assert_eq!(
            info.slice_labels,
            vec![Some(String::from("left.png")), Some(String::from("right.png"))]
        );
        assert_eq!(
            mask_file_name(&info, 2, "", OutputFormat::Tif)?,
            "right.tif"
        );
        Ok(())
    }

    #[test]
    fn test_tiff_rejects_oversized_layout() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("huge.tif");
        {
            let mut encoder = TiffEncoder::new(File::create(&path)?)?;
            let mut image = encoder.new_image::<colortype::Gray8>(1, 1)?;
            image.encoder().write_tag(
                Tag::ImageDescription,
                "ImageJ=1.54f\nchannels=4294967296\nslices=4294967296\nframes=2\n",
            )?;
            image.write_data(&[0u8])?;
        }
        let err = ImageInfo::probe_tiff(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid stack layout"));

        assert_eq!(
            ImageJLayout::parse("ImageJ=1.54f\nchannels=0\nslices=3\n")
                .and_then(|layout| layout.plane_count()),
            None
        );
        Ok(())
    }

    #[test]
    fn test_slice_count_saturates() {
        let mut info = ImageInfo::new(1, 1, 2);
        info.channels = usize::MAX;
        assert_eq!(info.slice_count(), usize::MAX);
    }
}
