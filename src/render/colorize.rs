// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::sync::Arc;

use image::{Pixel, Rgb, RgbImage, RgbaImage};
use tracing::{instrument, trace};

use crate::image_buffer::ThermalImage;

/// A function mapping an image of values between 0.0 and 1.0 to colors.
pub(crate) type PaletteFn = dyn Fn(&ThermalImage) -> RgbImage + Send + Sync;

/// Linearly rescale an image to the range 0.0 to 1.0 using its own minimum and maximum.
///
/// A flat image (where the minimum and maximum are equal) becomes all zeros.
pub(crate) fn normalize(image: &ThermalImage) -> ThermalImage {
    let (min, max) = image
        .iter()
        .copied()
        .filter(|value| !value.is_nan())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), value| {
            (min.min(value), max.max(value))
        });
    let range = max - min;
    if !(range > 0.0) || !range.is_finite() {
        return ThermalImage::new(image.width(), image.height());
    }
    let mut normalized = image.clone();
    normalized
        .iter_mut()
        .for_each(|value| *value = (*value - min) / range);
    normalized
}

fn unit_to_u8(value: f32) -> u8 {
    (value.max(0.0).min(1.0) * u8::MAX as f32).round() as u8
}

/// Functions applied to normalized values before they are mapped to colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scale {
    Linear,
    SquareRoot,
    Square,
}

impl Scale {
    pub(crate) const ALL: [Scale; 3] = [Scale::Linear, Scale::SquareRoot, Scale::Square];

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Scale::Linear => "Linear",
            Scale::SquareRoot => "Square root",
            Scale::Square => "Square",
        }
    }

    pub(crate) fn apply(&self, normalized: &mut ThermalImage) {
        match self {
            Scale::Linear => (),
            Scale::SquareRoot => normalized.iter_mut().for_each(|v| *v = v.sqrt()),
            Scale::Square => normalized.iter_mut().for_each(|v| *v = *v * *v),
        }
    }
}

#[derive(Clone)]
enum Transform {
    Gradient(colorous::Gradient),
    Custom(Arc<PaletteFn>),
}

/// A named mapping from normalized values to colors.
#[derive(Clone)]
pub(crate) struct Palette {
    name: String,
    transform: Transform,
}

impl Palette {
    /// Hotter is brighter: `v → (v, v, v)`.
    pub(crate) fn white_hot() -> Self {
        Self::custom("White hot", |normalized: &ThermalImage| grayscale(normalized, |v| v))
    }

    /// Hotter is darker: `v → (1 - v, 1 - v, 1 - v)`.
    pub(crate) fn black_hot() -> Self {
        Self::custom("Black hot", |normalized: &ThermalImage| {
            grayscale(normalized, |v| 1.0 - v)
        })
    }

    pub(crate) fn gradient(name: &str, gradient: colorous::Gradient) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::Gradient(gradient),
        }
    }

    /// A palette backed by any function from a normalized image to an RGB image of the same size.
    pub(crate) fn custom<F>(name: &str, transform: F) -> Self
    where
        F: Fn(&ThermalImage) -> RgbImage + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            transform: Transform::Custom(Arc::new(transform)),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Map an image of values in 0.0 to 1.0 to colors.
    pub(crate) fn apply(&self, normalized: &ThermalImage) -> RgbImage {
        let (width, height) = normalized.dimensions();
        match &self.transform {
            Transform::Gradient(gradient) => RgbImage::from_fn(width, height, |x, y| {
                let v = normalized.get_pixel(x, y)[0].max(0.0).min(1.0);
                Rgb(gradient.eval_continuous(v as f64).as_array())
            }),
            Transform::Custom(transform) => transform(normalized),
        }
    }
}

fn grayscale(normalized: &ThermalImage, map: impl Fn(f32) -> f32) -> RgbImage {
    RgbImage::from_fn(normalized.width(), normalized.height(), |x, y| {
        let v = unit_to_u8(map(normalized.get_pixel(x, y)[0]));
        Rgb([v, v, v])
    })
}

impl fmt::Debug for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Palette").field(&self.name).finish()
    }
}

/// The built in palettes, in display order.
pub(crate) fn default_palettes() -> Vec<Palette> {
    vec![
        Palette::white_hot(),
        Palette::black_hot(),
        Palette::gradient("Turbo", colorous::TURBO),
        Palette::gradient("Inferno", colorous::INFERNO),
        Palette::gradient("Magma", colorous::MAGMA),
        Palette::gradient("Plasma", colorous::PLASMA),
        Palette::gradient("Viridis", colorous::VIRIDIS),
        Palette::gradient("Cividis", colorous::CIVIDIS),
        Palette::gradient("Warm", colorous::WARM),
        Palette::gradient("Cool", colorous::COOL),
        Palette::gradient("Cubehelix", colorous::CUBEHELIX),
        Palette::gradient("Rainbow", colorous::RAINBOW),
        Palette::gradient("Sinebow", colorous::SINEBOW),
        Palette::gradient("Greys", colorous::GREYS),
        Palette::gradient("Spectral", colorous::SPECTRAL),
        Palette::gradient("Red Yellow Blue", colorous::RED_YELLOW_BLUE),
    ]
}

/// An index into a fixed-length list that wraps around in both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Selection {
    index: usize,
    count: usize,
}

impl Selection {
    pub(crate) fn new(index: usize, count: usize) -> Self {
        let count = count.max(1);
        Self {
            index: index % count,
            count,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Move the selection by `delta`, wrapping around at either end.
    pub(crate) fn step(&mut self, delta: i32) -> usize {
        let count = self.count as i64;
        self.index = (self.index as i64 + delta as i64).rem_euclid(count) as usize;
        self.index
    }
}

/// The palette and scale currently used to display thermal images.
#[derive(Clone, Debug)]
pub(crate) struct Colorizer {
    palettes: Vec<Palette>,
    palette: Selection,
    scale: Selection,
}

impl Colorizer {
    pub(crate) fn new(palettes: Vec<Palette>, palette_index: usize, scale_index: usize) -> Self {
        let palette = Selection::new(palette_index, palettes.len());
        let palettes = if palettes.is_empty() {
            vec![Palette::white_hot()]
        } else {
            palettes
        };
        Self {
            palettes,
            palette,
            scale: Selection::new(scale_index, Scale::ALL.len()),
        }
    }

    pub(crate) fn palette(&self) -> &Palette {
        &self.palettes[self.palette.index()]
    }

    pub(crate) fn scale(&self) -> Scale {
        Scale::ALL[self.scale.index()]
    }

    #[cfg(test)]
    pub(crate) fn palette_index(&self) -> usize {
        self.palette.index()
    }

    #[cfg(test)]
    pub(crate) fn scale_index(&self) -> usize {
        self.scale.index()
    }

    pub(crate) fn step_palette(&mut self, delta: i32) -> &Palette {
        self.palette.step(delta);
        trace!(palette = self.palette().name(), "changed palette");
        self.palette()
    }

    pub(crate) fn step_scale(&mut self, delta: i32) -> Scale {
        self.scale.step(delta);
        trace!(scale = self.scale().name(), "changed scale");
        self.scale()
    }

    /// Normalize, scale and color a thermal image.
    #[instrument(level = "trace", skip(self, image))]
    pub(crate) fn colorize(&self, image: &ThermalImage) -> RgbaImage {
        let mut normalized = normalize(image);
        self.scale().apply(&mut normalized);
        let colors = self.palette().apply(&normalized);
        let (width, height) = colors.dimensions();
        RgbaImage::from_fn(width, height, |x, y| colors.get_pixel(x, y).to_rgba())
    }
}

#[cfg(test)]
mod test {
    use float_cmp::{approx_eq, F32Margin};
    use image::{Luma, Rgb, RgbImage};

    use crate::image_buffer::ThermalImage;

    use super::{default_palettes, normalize, Colorizer, Palette, Scale, Selection};

    fn ramp() -> ThermalImage {
        ThermalImage::from_fn(4, 3, |x, y| Luma([-5.0 + (y * 4 + x) as f32 * 2.5]))
    }

    fn min_max(image: &ThermalImage) -> (f32, f32) {
        image
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), v| {
                (min.min(*v), max.max(*v))
            })
    }

    #[test]
    fn normalize_range() {
        let normalized = normalize(&ramp());
        let (min, max) = min_max(&normalized);
        assert!(approx_eq!(f32, min, 0.0, F32Margin::default()));
        assert!(approx_eq!(f32, max, 1.0, F32Margin::default()));
        assert!(approx_eq!(
            f32,
            normalized.get_pixel(1, 0)[0],
            1.0 / 11.0,
            epsilon = 0.00001
        ));
    }

    #[test]
    fn normalize_flat() {
        let flat = ThermalImage::from_pixel(5, 2, Luma([31.5]));
        let normalized = normalize(&flat);
        assert_eq!(normalized.dimensions(), (5, 2));
        assert!(normalized.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn scales() {
        let mut values = ThermalImage::from_pixel(1, 1, Luma([0.25]));
        Scale::SquareRoot.apply(&mut values);
        assert!(approx_eq!(f32, values[(0, 0)][0], 0.5, F32Margin::default()));
        Scale::Square.apply(&mut values);
        assert!(approx_eq!(f32, values[(0, 0)][0], 0.25, F32Margin::default()));
        Scale::Linear.apply(&mut values);
        assert!(approx_eq!(f32, values[(0, 0)][0], 0.25, F32Margin::default()));
    }

    #[test]
    fn analytic_palettes() {
        let values = ThermalImage::from_fn(2, 1, |x, _| Luma([x as f32]));
        let white_hot = Palette::white_hot().apply(&values);
        assert_eq!(white_hot[(0, 0)], Rgb([0, 0, 0]));
        assert_eq!(white_hot[(1, 0)], Rgb([255, 255, 255]));
        let black_hot = Palette::black_hot().apply(&values);
        assert_eq!(black_hot[(0, 0)], Rgb([255, 255, 255]));
        assert_eq!(black_hot[(1, 0)], Rgb([0, 0, 0]));
    }

    #[test]
    fn custom_palette() {
        let palette = Palette::custom("Red channel", |values: &ThermalImage| {
            RgbImage::from_fn(values.width(), values.height(), |x, y| {
                Rgb([(values[(x, y)][0] * 255.0) as u8, 0, 0])
            })
        });
        let colorizer = Colorizer::new(vec![palette], 0, 0);
        let colored = colorizer.colorize(&ramp());
        assert_eq!(colored.dimensions(), (4, 3));
        assert_eq!(colored[(3, 2)].0, [255, 0, 0, 255]);
        assert_eq!(colored[(0, 0)].0, [0, 0, 0, 255]);
    }

    #[test]
    fn selection_wraps() {
        let mut selection = Selection::new(0, 5);
        assert_eq!(selection.step(-1), 4);
        assert_eq!(selection.step(1), 0);
        assert_eq!(selection.step(7), 2);
        assert_eq!(Selection::new(12, 5).index(), 2);
    }

    #[test]
    fn selection_step_inverse() {
        for count in 1..8 {
            for start in 0..count {
                let mut selection = Selection::new(start, count);
                selection.step(1);
                selection.step(-1);
                assert_eq!(selection.index(), start);
                selection.step(-1);
                selection.step(1);
                assert_eq!(selection.index(), start);
            }
        }
    }

    #[test]
    fn colorizer_steps_independently() {
        let palettes = default_palettes();
        let count = palettes.len();
        let mut colorizer = Colorizer::new(palettes, 0, 0);
        assert_eq!(colorizer.step_palette(-1).name(), "Red Yellow Blue");
        assert_eq!(colorizer.palette_index(), count - 1);
        assert_eq!(colorizer.scale(), Scale::Linear);
        assert_eq!(colorizer.step_scale(1), Scale::SquareRoot);
        assert_eq!(colorizer.palette_index(), count - 1);
        assert_eq!(colorizer.step_scale(2), Scale::Linear);
    }
}
