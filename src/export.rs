// SPDX-License-Identifier: GPL-3.0-or-later
//! Exporting recorded files as a CSV table of temperatures, or as colorized PNG images.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use itertools::{Itertools, MinMaxResult};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::annotation::{Annotations, Point};
use crate::image_buffer::ThermalImage;
use crate::playback::sequence::FrameName;
use crate::render::color::Color;
use crate::render::colorize::Colorizer;
use crate::store;

/// Marker radius for exported images.
const MARKER_RADIUS: u32 = 3;

/// Which temperatures to write for each file.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Columns {
    pub(crate) point: Option<Point<u32>>,
    pub(crate) min: bool,
    pub(crate) max: bool,
}

impl Columns {
    pub(crate) fn header(&self) -> String {
        let mut header = "timestamp, frame".to_string();
        if let Some(point) = self.point {
            header.push_str(&format!(", t({};{})", point.x, point.y));
        }
        if self.min {
            header.push_str(", min");
        }
        if self.max {
            header.push_str(", max");
        }
        header
    }

    fn row(&self, name: FrameName, image: &ThermalImage) -> anyhow::Result<String> {
        let mut row = format!("{}, {}", name.timestamp, name.frame);
        if let Some(Point { x, y }) = self.point {
            if x >= image.width() || y >= image.height() {
                return Err(anyhow!(
                    "({}, {}) is outside of the {}x{} thermal image",
                    x,
                    y,
                    image.width(),
                    image.height()
                ));
            }
            row.push_str(&format!(", {}", image.get_pixel(x, y)[0]));
        }
        if self.min || self.max {
            let (min, max) = match image.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
                MinMaxResult::NoElements => return Err(anyhow!("the thermal image is empty")),
                MinMaxResult::OneElement(value) => (value, value),
                MinMaxResult::MinMax(min, max) => (min, max),
            };
            if self.min {
                row.push_str(&format!(", {}", min));
            }
            if self.max {
                row.push_str(&format!(", {}", max));
            }
        }
        Ok(row)
    }
}

/// Write one CSV row per file.
#[instrument(level = "debug", skip(files, writer))]
pub(crate) fn write_csv<W: Write>(
    files: &[PathBuf],
    columns: Columns,
    mut writer: W,
) -> anyhow::Result<()> {
    writeln!(writer, "{}", columns.header())?;
    for path in files {
        let name = FrameName::from_path(path)?;
        let images = store::read(path).with_context(|| format!("Unable to read {}", path.display()))?;
        let row = columns
            .row(name, &images.thermal)
            .with_context(|| format!("Unable to export {}", path.display()))?;
        writeln!(writer, "{}", row)?;
    }
    debug!(count = files.len(), "wrote CSV rows");
    Ok(())
}

/// Write a CSV export to a file, creating its directory if needed.
pub(crate) fn export_csv(files: &[PathBuf], columns: Columns, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create {}", parent.display()))?;
    }
    let file = fs::File::create(out).with_context(|| format!("Unable to create {}", out.display()))?;
    write_csv(files, columns, std::io::BufWriter::new(file))?;
    info!(count = files.len(), path = %out.display(), "exported CSV");
    Ok(())
}

fn png_path(directory: &Path, file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    directory.join(format!("{}.png", stem))
}

/// Colorize each file's thermal image and save it as a PNG, with markers on the coldest and
/// hottest pixels (and on `point`, if given). Files are converted in parallel.
#[instrument(level = "debug", skip(files, colorizer))]
pub(crate) fn export_png(
    files: &[PathBuf],
    colorizer: &Colorizer,
    point: Option<Point<u32>>,
    point_color: Color,
    directory: &Path,
) -> anyhow::Result<usize> {
    fs::create_dir_all(directory)
        .with_context(|| format!("Unable to create {}", directory.display()))?;
    let colors = vec![
        Color::new(0x00, 0x00, 0xFF),
        Color::new(0xFF, 0x00, 0x00),
        point_color,
    ];
    let mut template = Annotations::new(colors, MARKER_RADIUS);
    if let Some(point) = point {
        template.add_point(point);
    }
    let written = files
        .par_iter()
        .map(|path| -> anyhow::Result<()> {
            let images =
                store::read(path).with_context(|| format!("Unable to read {}", path.display()))?;
            let mut annotations = template.clone();
            annotations.update_data(Arc::clone(&images.thermal));
            let mut image = colorizer.colorize(&images.thermal);
            annotations.draw(&mut image);
            let out = png_path(directory, path);
            image
                .save(&out)
                .with_context(|| format!("Unable to write {}", out.display()))?;
            debug!(path = %out.display(), "wrote PNG");
            Ok(())
        })
        .collect::<anyhow::Result<Vec<()>>>()?
        .len();
    info!(count = written, path = %directory.display(), "exported PNG images");
    Ok(written)
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use image::{Luma, Rgb};

    use crate::annotation::Point;
    use crate::image_buffer::{ThermalImage, VisibleImage};
    use crate::render::color::Color;
    use crate::render::colorize::{default_palettes, Colorizer};
    use crate::store;

    use super::{export_csv, export_png, write_csv, Columns};

    fn recording(dir: &tempfile::TempDir) -> Vec<PathBuf> {
        [("1000:0001.tdi", 20.0), ("1250:0002.tdi", 22.5)]
            .iter()
            .map(|(name, base)| {
                let path = dir.path().join(name);
                let visible = VisibleImage::from_pixel(4, 4, Rgb([0.0, 0.0, 0.0]));
                let thermal = ThermalImage::from_fn(8, 8, |x, y| Luma([base + (x + y) as f32]));
                store::write(&visible, &thermal, &path, (0, 0), (0, 0)).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn headers() {
        assert_eq!(Columns::default().header(), "timestamp, frame");
        let columns = Columns {
            point: Some(Point::new(3, 7)),
            min: true,
            max: true,
        };
        assert_eq!(columns.header(), "timestamp, frame, t(3;7), min, max");
        let columns = Columns {
            point: None,
            min: false,
            max: true,
        };
        assert_eq!(columns.header(), "timestamp, frame, max");
    }

    #[test]
    fn csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let files = recording(&dir);
        let columns = Columns {
            point: Some(Point::new(1, 2)),
            min: true,
            max: true,
        };
        let mut out = Vec::new();
        write_csv(&files, columns, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "timestamp, frame, t(1;2), min, max\n\
             1000, 1, 23, 20, 34\n\
             1250, 2, 25.5, 22.5, 36.5\n"
        );
    }

    #[test]
    fn point_outside_image() {
        let dir = tempfile::tempdir().unwrap();
        let files = recording(&dir);
        let columns = Columns {
            point: Some(Point::new(8, 0)),
            ..Columns::default()
        };
        assert!(write_csv(&files, columns, Vec::new()).is_err());
    }

    #[test]
    fn csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = recording(&dir);
        let out = dir.path().join("nested").join("export.csv");
        export_csv(&files, Columns::default(), &out).unwrap();
        let contents = std::fs::read_to_string(&out).unwrap();
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn png_images() {
        let dir = tempfile::tempdir().unwrap();
        let files = recording(&dir);
        let out = dir.path().join("png");
        let colorizer = Colorizer::new(default_palettes(), 0, 0);
        let yellow = Color::new(0xFF, 0xFF, 0x00);
        let count = export_png(&files, &colorizer, Some(Point::new(4, 3)), yellow, &out).unwrap();
        assert_eq!(count, 2);
        let image = image::open(out.join("1000:0001.png")).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (8, 8));
        assert_eq!(image[(0, 0)], Color::new(0, 0, 0xFF).to_rgba());
        assert_eq!(image[(7, 7)], Color::new(0xFF, 0, 0).to_rgba());
        assert_eq!(image[(4, 3)], yellow.to_rgba());
        assert!(out.join("1250:0002.png").is_file());
    }
}
