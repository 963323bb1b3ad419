// SPDX-License-Identifier: GPL-3.0-or-later
use image::{GrayImage, Pixel, Rgba, RgbaImage};

pub(crate) mod cheese;
pub(crate) mod color;
pub(crate) mod colorize;
pub(crate) mod font;

use color::Color;

/// Alpha blend the top left `size` pixels of `source` onto `target` at `position`.
///
/// Anything falling outside of `target` is clipped.
pub(crate) fn blit(
    target: &mut RgbaImage,
    source: &RgbaImage,
    position: (i32, i32),
    size: (u32, u32),
) {
    let width = size.0.min(source.width());
    let height = size.1.min(source.height());
    for source_y in 0..height {
        let target_y = position.1 + source_y as i32;
        if target_y < 0 || target_y as u32 >= target.height() {
            continue;
        }
        for source_x in 0..width {
            let target_x = position.0 + source_x as i32;
            if target_x < 0 || target_x as u32 >= target.width() {
                continue;
            }
            let pixel = source.get_pixel(source_x, source_y);
            let destination = target.get_pixel_mut(target_x as u32, target_y as u32);
            // Fully transparent pixels are the common case for text surfaces.
            match pixel[3] {
                0 => (),
                u8::MAX => *destination = *pixel,
                _ => destination.blend(pixel),
            }
        }
    }
}

/// Paint `color` onto `target` using `mask` as the opacity, with the mask's origin at
/// `position`.
pub(crate) fn blend_mask(
    target: &mut RgbaImage,
    mask: &GrayImage,
    position: (i32, i32),
    color: Color,
) {
    for (mask_x, mask_y, opacity) in mask.enumerate_pixels() {
        if opacity[0] == 0 {
            continue;
        }
        let x = position.0 + mask_x as i32;
        let y = position.1 + mask_y as i32;
        if x < 0 || y < 0 || x as u32 >= target.width() || y as u32 >= target.height() {
            continue;
        }
        let mut paint: Rgba<u8> = color.into();
        let destination = target.get_pixel_mut(x as u32, y as u32);
        if opacity[0] == u8::MAX {
            *destination = paint;
        } else {
            paint.channels_mut()[3] = opacity[0];
            destination.blend(&paint);
        }
    }
}

#[cfg(test)]
mod test {
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    use super::color::Color;

    #[test]
    fn blit_clips_and_limits_size() {
        let mut target = RgbaImage::from_pixel(6, 4, Rgba([0, 0, 0, 255]));
        let source = RgbaImage::from_pixel(3, 3, Rgba([255, 0, 0, 255]));
        super::blit(&mut target, &source, (2, -1), (2, 3));
        assert_eq!(target[(2, 0)], Rgba([255, 0, 0, 255]));
        assert_eq!(target[(3, 1)], Rgba([255, 0, 0, 255]));
        // Only two rows of the source land inside the target
        assert_eq!(target[(2, 2)], Rgba([0, 0, 0, 255]));
        // The third column is outside of the requested size
        assert_eq!(target[(4, 0)], Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn blit_skips_transparent() {
        let mut target = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255]));
        let source = RgbaImage::new(2, 2);
        super::blit(&mut target, &source, (0, 0), (2, 2));
        assert!(target.pixels().all(|p| *p == Rgba([0, 0, 255, 255])));
    }

    #[test]
    fn mask_opacity() {
        let mut target = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(1, 0, Luma([255]));
        super::blend_mask(&mut target, &mask, (0, 0), Color::WHITE);
        assert_eq!(target[(0, 0)], Rgba([0, 0, 0, 255]));
        assert_eq!(target[(1, 0)], Rgba([255, 255, 255, 255]));
    }
}
