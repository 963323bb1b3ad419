// SPDX-License-Identifier: GPL-3.0-or-later
//! Dual-image files.
//!
//! A dual-image file holds two independently positioned regions: the visible image (tagged
//! `"visible"`) and the thermal image (tagged `"infrared"`). Each region has its own data window,
//! and the display window of the whole file is the union of both data windows. Regions are looked
//! up by tag when reading, as the order they are stored in is not guaranteed.
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bincode::Options;
use image::{Luma, Pixel, Rgb};
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::error::StoreError;
use crate::image_buffer::{DualImage, ThermalImage, VisibleImage};

pub const VISIBLE_TAG: &str = "visible";
pub const THERMAL_TAG: &str = "infrared";

/// An inclusive rectangle of pixel coordinates.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Window {
    pub min: (i32, i32),
    pub max: (i32, i32),
}

impl Window {
    fn from_region(offset: (i32, i32), (width, height): (u32, u32)) -> Self {
        Self {
            min: offset,
            max: (offset.0 + width as i32 - 1, offset.1 + height as i32 - 1),
        }
    }

    fn union(&self, other: &Self) -> Self {
        Self {
            min: (self.min.0.min(other.min.0), self.min.1.min(other.min.1)),
            max: (self.max.0.max(other.max.0), self.max.1.max(other.max.1)),
        }
    }

    /// `None` if the window is inside out or too large to address.
    pub fn width(&self) -> Option<u32> {
        extent(self.min.0, self.max.0)
    }

    pub fn height(&self) -> Option<u32> {
        extent(self.min.1, self.max.1)
    }
}

fn extent(min: i32, max: i32) -> Option<u32> {
    let extent = i64::from(max) - i64::from(min) + 1;
    u32::try_from(extent).ok()
}

#[derive(Debug, Deserialize, Serialize)]
enum Samples {
    Rgb(Vec<f32>),
    Temperature(Vec<f32>),
}

#[derive(Debug, Deserialize, Serialize)]
struct Region {
    tag: String,
    data_window: Window,
    samples: Samples,
}

#[derive(Debug, Deserialize, Serialize)]
struct Container {
    display_window: Window,
    regions: Vec<Region>,
}

impl Container {
    fn region(&self, tag: &'static str) -> Result<&Region, StoreError> {
        self.regions
            .iter()
            .find(|region| region.tag == tag)
            .ok_or(StoreError::MissingRegion(tag))
    }
}

fn bincode_options() -> impl Options {
    bincode::options()
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

/// Check that a region's samples fill its data window, returning the window's dimensions.
fn check_len(region: &Region, channels: usize, actual: usize) -> Result<(u32, u32), StoreError> {
    let window = region.data_window;
    let invalid = || StoreError::InvalidWindow {
        tag: region.tag.clone(),
        window,
    };
    let width = window.width().ok_or_else(invalid)?;
    let height = window.height().ok_or_else(invalid)?;
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(channels))
        .ok_or_else(invalid)?;
    if expected != actual {
        return Err(StoreError::DimensionMismatch {
            tag: region.tag.clone(),
            expected,
            actual,
        });
    }
    Ok((width, height))
}

/// Write a visible and thermal image pair to a single file.
///
/// The offsets are the `(x, y)` positions of each image's top left corner.
#[instrument(level = "debug", skip(visible, thermal))]
pub fn write<P: AsRef<Path> + std::fmt::Debug>(
    visible: &VisibleImage,
    thermal: &ThermalImage,
    path: P,
    visible_offset: (i32, i32),
    thermal_offset: (i32, i32),
) -> Result<(), StoreError> {
    let visible_window = Window::from_region(visible_offset, visible.dimensions());
    let thermal_window = Window::from_region(thermal_offset, thermal.dimensions());
    let container = Container {
        display_window: visible_window.union(&thermal_window),
        regions: vec![
            Region {
                tag: VISIBLE_TAG.to_string(),
                data_window: visible_window,
                samples: Samples::Rgb(visible.as_raw().clone()),
            },
            Region {
                tag: THERMAL_TAG.to_string(),
                data_window: thermal_window,
                samples: Samples::Temperature(thermal.as_raw().clone()),
            },
        ],
    };
    let mut writer = BufWriter::new(File::create(path)?);
    bincode_options().serialize_into(&mut writer, &container)?;
    writer.flush()?;
    trace!(display_window = ?container.display_window, "wrote dual image");
    Ok(())
}

/// Read a visible and thermal image pair from a file.
#[instrument(level = "debug")]
pub fn read<P: AsRef<Path> + std::fmt::Debug>(path: P) -> Result<DualImage, StoreError> {
    let reader = BufReader::new(File::open(path)?);
    let container: Container = bincode_options().deserialize_from(reader)?;
    let visible_region = container.region(VISIBLE_TAG)?;
    let thermal_region = container.region(THERMAL_TAG)?;
    let visible = match &visible_region.samples {
        Samples::Rgb(values) => {
            let (width, height) =
                check_len(visible_region, Rgb::<f32>::CHANNEL_COUNT as usize, values.len())?;
            VisibleImage::from_raw(width, height, values.clone())
        }
        Samples::Temperature(_) => None,
    }
    .ok_or(StoreError::MissingRegion(VISIBLE_TAG))?;
    let thermal = match &thermal_region.samples {
        Samples::Temperature(values) => {
            let (width, height) =
                check_len(thermal_region, Luma::<f32>::CHANNEL_COUNT as usize, values.len())?;
            ThermalImage::from_raw(width, height, values.clone())
        }
        Samples::Rgb(_) => None,
    }
    .ok_or(StoreError::MissingRegion(THERMAL_TAG))?;
    Ok(DualImage::new(visible, thermal))
}
