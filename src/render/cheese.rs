// SPDX-License-Identifier: GPL-3.0-or-later
//! This module is a font renderer using the [fontdue] crate. Naming the module 'fontdue' would've
//! been my first choice, but then there'd be a conflict between the module and the crate.
use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context as _};
use fontdue::{Font, FontSettings};
use image::GrayImage;
use lru::LruCache;
use tracing::trace;

use super::font::FontRenderer;

// Labels are mostly re-rendered with the same handful of lines (button text, captions), and only
// the temperature readouts change every frame.
const LINE_CACHE_SIZE: usize = 64;

pub(crate) struct FontdueRenderer {
    font: Font,
    size: f32,
    ascent: f32,
    line_height: u32,
    cache: RefCell<LruCache<String, GrayImage>>,
}

impl FontdueRenderer {
    pub(crate) fn from_file(path: &Path, size: f32) -> anyhow::Result<Self> {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let font = Font::from_bytes(data, FontSettings::default()).map_err(|e| anyhow!(e))?;
        Ok(Self::new(font, size))
    }

    pub(crate) fn new(font: Font, size: f32) -> Self {
        let (ascent, line_height) = match font.horizontal_line_metrics(size) {
            Some(metrics) => (metrics.ascent, metrics.new_line_size.ceil() as u32),
            None => (size, size.ceil() as u32),
        };
        Self {
            font,
            size,
            ascent,
            line_height,
            cache: RefCell::new(LruCache::new(LINE_CACHE_SIZE)),
        }
    }

    fn rasterize(&self, line: &str) -> GrayImage {
        let mut mask = GrayImage::new(self.line_width(line), self.line_height);
        let mut cursor = 0.0f32;
        for c in line.chars() {
            let (metrics, bitmap) = self.font.rasterize(c, self.size);
            // fontdue glyph origins are at the baseline with Y pointing up.
            let left = cursor.round() as i32 + metrics.xmin;
            let top = self.ascent.round() as i32 - metrics.height as i32 - metrics.ymin;
            for (index, coverage) in bitmap.iter().enumerate().filter(|(_, c)| **c != 0) {
                let x = left + (index % metrics.width) as i32;
                let y = top + (index / metrics.width) as i32;
                if x < 0 || y < 0 || x as u32 >= mask.width() || y as u32 >= mask.height() {
                    continue;
                }
                let pixel = mask.get_pixel_mut(x as u32, y as u32);
                pixel[0] = pixel[0].max(*coverage);
            }
            cursor += metrics.advance_width;
        }
        mask
    }
}

impl fmt::Debug for FontdueRenderer {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("FontdueRenderer")
            .field("font", &self.font)
            .field("size", &self.size)
            .field("line_height", &self.line_height)
            .finish()
    }
}

impl FontRenderer for FontdueRenderer {
    fn line_height(&self) -> u32 {
        self.line_height
    }

    fn line_width(&self, line: &str) -> u32 {
        line.chars()
            .map(|c| self.font.metrics(c, self.size).advance_width)
            .sum::<f32>()
            .ceil() as u32
    }

    fn render_line(&self, line: &str) -> GrayImage {
        let mut cache = self.cache.borrow_mut();
        let key = line.to_string();
        if let Some(mask) = cache.get(&key) {
            return mask.clone();
        }
        trace!(line, "line cache miss");
        let mask = self.rasterize(line);
        cache.put(key, mask.clone());
        mask
    }
}
