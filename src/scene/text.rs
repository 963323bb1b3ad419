// SPDX-License-Identifier: GPL-3.0-or-later
use image::{Rgba, RgbaImage};

use crate::render::blend_mask;
use crate::render::color::Color;
use crate::render::font::FontRenderer;

pub(crate) const TEXT_COLOR: Color = Color::new(0xFF, 0xF8, 0xDC);

/// Multi-line text drawn onto a node's surface.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Text {
    pub(super) content: String,
    pub(super) color: Color,
    pub(super) bold: bool,
    pub(super) underline: bool,
}

impl Text {
    pub(crate) fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            color: TEXT_COLOR,
            bold: false,
            underline: false,
        }
    }

    fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }

    fn line_width(&self, font: &dyn FontRenderer, line: &str) -> u32 {
        let width = font.line_width(line);
        // Bold text is drawn twice, one pixel apart.
        if self.bold && width > 0 {
            width + 1
        } else {
            width
        }
    }

    /// The width of the widest line by the combined height of every line, plus a row for
    /// underlines.
    pub(crate) fn required_size(&self, font: &dyn FontRenderer) -> (u32, u32) {
        let width = self
            .lines()
            .map(|line| self.line_width(font, line))
            .max()
            .unwrap_or(0);
        let height = font.line_height() * self.lines().count() as u32 + 1;
        (width, height)
    }

    /// Clear the surface and draw the text onto it.
    pub(crate) fn paint(&self, font: &dyn FontRenderer, surface: &mut RgbaImage) {
        surface
            .pixels_mut()
            .for_each(|pixel| *pixel = Rgba([0, 0, 0, 0]));
        let line_height = font.line_height();
        let last_row = surface.height().saturating_sub(1);
        for (index, line) in self.lines().enumerate() {
            let top = index as u32 * line_height;
            let mask = font.render_line(line);
            blend_mask(surface, &mask, (0, top as i32), self.color);
            if self.bold {
                blend_mask(surface, &mask, (1, top as i32), self.color);
            }
            if self.underline {
                let y = (top + line_height).min(last_row);
                let width = self.line_width(font, line).min(surface.width());
                for x in 0..width {
                    surface.put_pixel(x, y, self.color.to_rgba());
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use image::RgbaImage;

    use crate::render::font::BoxRenderer;

    use super::Text;

    #[test]
    fn size_of_lines() {
        let font = BoxRenderer::new(8, 16);
        let text = Text::new("abc\nde\n");
        assert_eq!(text.required_size(&font), (24, 16 * 3 + 1));
        let mut bold = Text::new("abc");
        bold.bold = true;
        assert_eq!(bold.required_size(&font), (25, 17));
    }

    #[test]
    fn underline_row() {
        let font = BoxRenderer::new(8, 16);
        let mut text = Text::new("ab");
        text.underline = true;
        let (width, height) = text.required_size(&font);
        let mut surface = RgbaImage::new(width, height);
        text.paint(&font, &mut surface);
        assert!((0..width).all(|x| surface[(x, 16)][3] == u8::MAX));
    }
}
