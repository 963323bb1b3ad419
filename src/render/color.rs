// SPDX-License-Identifier: GPL-3.0-or-later
use std::cmp::Ordering;
use std::convert::{From, TryFrom};
use std::fmt;
use std::str::FromStr;

use image::Rgba;
use serde::Deserialize;

/// An 8-bit RGB color, used for markers, text and backgrounds.
///
/// Colors can be parsed from a handful of common names (`"yellow"`, `"cornsilk"`) or from a hex
/// code with a leading '#'. Luminance and contrast ratio use the WCAG 2.0 definitions, which are
/// good enough for picking a readable outline around a marker.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String")]
pub(crate) struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

const NAMED_COLORS: &[(&str, Color)] = &[
    ("black", Color::BLACK),
    ("white", Color::WHITE),
    ("red", Color::new(0xFF, 0x00, 0x00)),
    ("green", Color::new(0x00, 0x80, 0x00)),
    ("lime", Color::new(0x00, 0xFF, 0x00)),
    ("blue", Color::new(0x00, 0x00, 0xFF)),
    ("yellow", Color::new(0xFF, 0xFF, 0x00)),
    ("cyan", Color::new(0x00, 0xFF, 0xFF)),
    ("magenta", Color::new(0xFF, 0x00, 0xFF)),
    ("orange", Color::new(0xFF, 0xA5, 0x00)),
    ("purple", Color::new(0x80, 0x00, 0x80)),
    ("pink", Color::new(0xFF, 0xC0, 0xCB)),
    ("gray", Color::new(0x80, 0x80, 0x80)),
    ("grey", Color::new(0x80, 0x80, 0x80)),
    ("cornsilk", Color::new(0xFF, 0xF8, 0xDC)),
];

impl Color {
    pub(crate) const BLACK: Self = Self::new(u8::MIN, u8::MIN, u8::MIN);

    pub(crate) const WHITE: Self = Self::new(u8::MAX, u8::MAX, u8::MAX);

    /// Create a new [Color] with the given 8-bit color values.
    pub(crate) const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// The relative luminance of the color in the sRGB colorspace, as [defined by the
    /// W3C][w3c-lum].
    /// [w3c-lum]: https://www.w3.org/TR/2008/REC-WCAG20-20081211/#relativeluminancedef
    pub(crate) fn luminance(&self) -> f32 {
        let channels = [self.red, self.green, self.blue];
        let linear = channels.iter().map(|c| {
            let c = *c as f32 / u8::MAX as f32;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        });
        [0.2126, 0.7152, 0.0722]
            .iter()
            .zip(linear)
            .map(|(coefficient, c)| coefficient * c)
            .sum()
    }

    /// Calculate the contrast ratio between this color and another one using the
    /// [W3C definition][w3c-contrast].
    /// [w3c-contrast]: https://www.w3.org/TR/WCAG20/#contrast-ratiodef
    pub(crate) fn contrast_ratio(&self, other: &Self) -> f32 {
        let lum = self.luminance();
        let other_lum = other.luminance();
        (lum.max(other_lum) + 0.05) / (lum.min(other_lum) + 0.05)
    }

    /// Treating this color as the background, pick black or white, whichever contrasts more.
    pub(crate) fn foreground_color(&self) -> Self {
        [Self::WHITE, Self::BLACK]
            .iter()
            .copied()
            .max_by(|l, r| {
                self.contrast_ratio(l)
                    .partial_cmp(&self.contrast_ratio(r))
                    .unwrap_or(Ordering::Equal)
            })
            .unwrap_or(Self::WHITE)
    }

    /// Convert to an opaque [`Rgba`] pixel.
    pub(crate) fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.red, self.green, self.blue, u8::MAX])
    }
}

impl From<colorous::Color> for Color {
    fn from(other_color: colorous::Color) -> Self {
        Color::new(other_color.r, other_color.g, other_color.b)
    }
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        color.to_rgba()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(format!("\"{}\" is not a #rrggbb color", s));
            }
            let component = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16)
                    .map_err(|_| format!("\"{}\" is not a #rrggbb color", s))
            };
            return Ok(Self::new(component(0..2)?, component(2..4)?, component(4..6)?));
        }
        let lowered = s.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lowered)
            .map(|(_, color)| *color)
            .ok_or_else(|| format!("unknown color \"{}\"", s))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
