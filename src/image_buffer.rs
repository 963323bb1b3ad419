// SPDX-License-Identifier: GPL-3.0-or-later
use std::sync::Arc;

use image::{ImageBuffer, Luma, Rgb};

/// Images where each point is a temperature in degrees Celsius.
pub type ThermalImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Visible-spectrum images, with each channel in the range 0.0 to 1.0.
pub type VisibleImage = ImageBuffer<Rgb<f32>, Vec<f32>>;

/// A co-registered pair of rasters, as stored in one dual-image file.
///
/// The pair is replaced wholesale whenever a new file (or live frame) is loaded, so the rasters
/// are shared behind [`Arc`]s instead of being copied into every consumer.
#[derive(Clone, Debug)]
pub struct DualImage {
    pub visible: Arc<VisibleImage>,
    pub thermal: Arc<ThermalImage>,
}

impl DualImage {
    pub fn new(visible: VisibleImage, thermal: ThermalImage) -> Self {
        Self {
            visible: Arc::new(visible),
            thermal: Arc::new(thermal),
        }
    }

    /// Example data shown when there is nothing to play back.
    ///
    /// The visible image is a 640x480 color sweep, and the thermal image is 320x240 with
    /// temperatures rising linearly from 20°C to 40°C in row-major order.
    pub fn placeholder() -> Self {
        const VISIBLE_WIDTH: u32 = 640;
        const VISIBLE_HEIGHT: u32 = 480;
        const THERMAL_WIDTH: u32 = 320;
        const THERMAL_HEIGHT: u32 = 240;
        let visible = VisibleImage::from_fn(VISIBLE_WIDTH, VISIBLE_HEIGHT, |x, y| {
            let red = x as f32 / (VISIBLE_WIDTH - 1) as f32;
            let green = y as f32 / (VISIBLE_HEIGHT - 1) as f32;
            let blue = ((x ^ y) & 0x3F) as f32 / 63.0;
            Rgb([red, green, blue])
        });
        let last_index = (THERMAL_WIDTH * THERMAL_HEIGHT - 1) as f32;
        let thermal = ThermalImage::from_fn(THERMAL_WIDTH, THERMAL_HEIGHT, |x, y| {
            let index = (y * THERMAL_WIDTH + x) as f32;
            Luma([20.0 + 20.0 * index / last_index])
        });
        Self::new(visible, thermal)
    }
}
