//!
//! Crate describing ROIs (Regions of Interest) drawn over an image
//!
//! An ROI is an outline together with the stack slice it was drawn on and
//! the class group it was assigned to. Collections of ROIs are read from and
//! written to GeoJSON feature collections.
//!
#![deny(missing_docs)]

pub mod collection;
mod region;

pub use region::Roi;
