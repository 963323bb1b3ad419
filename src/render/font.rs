// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;

use image::{GrayImage, Luma};
use tracing::{info, warn};

/// Rasterizes single lines of text into opacity masks.
pub(crate) trait FontRenderer: std::fmt::Debug {
    /// The vertical distance between the tops of two consecutive lines.
    fn line_height(&self) -> u32;

    /// The width of one line of text, in pixels.
    fn line_width(&self, line: &str) -> u32;

    /// Render one line of text onto a mask image.
    ///
    /// The mask is `line_width(line)` pixels wide and `line_height()` pixels tall, and each pixel
    /// is the opacity of the text at that point.
    fn render_line(&self, line: &str) -> GrayImage;
}

/// A renderer with fixed metrics, used when no font file could be loaded.
///
/// Every visible character is drawn as a hollow box. It keeps layout and hit testing working
/// without any font data.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BoxRenderer {
    advance: u32,
    line_height: u32,
}

impl BoxRenderer {
    pub(crate) const fn new(advance: u32, line_height: u32) -> Self {
        Self {
            advance,
            line_height,
        }
    }
}

impl Default for BoxRenderer {
    fn default() -> Self {
        Self::new(10, 20)
    }
}

impl FontRenderer for BoxRenderer {
    fn line_height(&self) -> u32 {
        self.line_height
    }

    fn line_width(&self, line: &str) -> u32 {
        line.chars().count() as u32 * self.advance
    }

    fn render_line(&self, line: &str) -> GrayImage {
        let mut mask = GrayImage::new(self.line_width(line), self.line_height);
        let top = self.line_height / 4;
        let bottom = self.line_height.saturating_sub(self.line_height / 5 + 1);
        let glyph_width = self.advance.saturating_sub(2);
        for (index, _) in line.chars().enumerate().filter(|(_, c)| !c.is_whitespace()) {
            let left = index as u32 * self.advance + 1;
            let right = left + glyph_width.saturating_sub(1);
            for x in left..=right {
                mask.put_pixel(x, top, Luma([u8::MAX]));
                mask.put_pixel(x, bottom, Luma([u8::MAX]));
            }
            for y in top..=bottom {
                mask.put_pixel(left, y, Luma([u8::MAX]));
                mask.put_pixel(right, y, Luma([u8::MAX]));
            }
        }
        mask
    }
}

/// Create a font renderer from the configured font file, falling back to [`BoxRenderer`].
pub(crate) fn default_renderer(font_path: Option<&Path>, size: f32) -> Box<dyn FontRenderer> {
    match font_path {
        Some(path) => match super::cheese::FontdueRenderer::from_file(path, size) {
            Ok(renderer) => {
                info!(path = %path.display(), size, "loaded font");
                Box::new(renderer)
            }
            Err(err) => {
                warn!(path = %path.display(), "unable to load font, using boxes: {:#}", err);
                Box::new(BoxRenderer::default())
            }
        },
        None => Box::new(BoxRenderer::default()),
    }
}
