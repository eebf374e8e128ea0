//! Reading and writing ROI collections as GeoJSON.
//!
//! Every feature of the collection is one ROI. The geometry must be a
//! `Polygon` or `MultiPolygon`; the feature properties carry
//! `name` (optional), `position` (stack slice, default 0) and `group`
//! (class group, default 0).
#![allow(missing_docs)]

use crate::Roi;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{read_to_string, write};
use std::path::Path;

#[derive(Deserialize)]
struct RoiFeature {
    #[serde(deserialize_with = "geojson::de::deserialize_geometry")]
    geometry: geo_types::Geometry<f64>,
    name: Option<String>,
    #[serde(default, alias = "slice")]
    position: u32,
    #[serde(default, alias = "class")]
    group: u32,
}

#[derive(Serialize)]
struct RoiFeatureOut {
    #[serde(serialize_with = "geojson::ser::serialize_geometry")]
    geometry: geo_types::MultiPolygon<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    position: u32,
    group: u32,
}

/// Parses a GeoJSON feature collection, keeping the feature order.
pub fn read_geojson_collection(geojson_str: &str) -> Result<Vec<Roi>> {
    let features: Vec<RoiFeature> =
        geojson::de::deserialize_feature_collection_str_to_vec(geojson_str)?;

    features
        .into_iter()
        .enumerate()
        .map(|(ind, feature)| {
            let outline = match feature.geometry {
                geo_types::Geometry::Polygon(p) => p.into(),
                geo_types::Geometry::MultiPolygon(m) => m,
                g => bail!("Feature {ind} has a geometry that does not enclose an area: {g:?}"),
            };
            Ok(Roi {
                name: feature.name,
                outline,
                position: feature.position,
                group: feature.group,
            })
        })
        .collect()
}

/// Loads the ROIs stored in a GeoJSON file.
pub fn load_geojson_collection(fname: &Path) -> Result<Vec<Roi>> {
    read_geojson_collection(
        &read_to_string(fname).with_context(|| format!("While reading {fname:?}"))?,
    )
    .with_context(|| format!("While parsing ROIs from {fname:?}"))
}

/// Writes ROIs to a GeoJSON file, one feature per ROI in the given order.
pub fn write_geojson_collection(rois: &[Roi], fname: &Path) -> Result<()> {
    let roi_str = geojson::ser::to_feature_collection_string(
        &rois
            .iter()
            .map(|roi| RoiFeatureOut {
                geometry: roi.outline.clone(),
                name: roi.name.clone(),
                position: roi.position,
                group: roi.group,
            })
            .collect::<Vec<_>>(),
    )?;

    write(fname, roi_str).with_context(|| format!("While writing {fname:?}"))?;

    Ok(())
}
