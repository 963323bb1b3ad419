// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;

use serde::Deserialize;

use crate::render::color::Color;

use super::palette::Choice;

fn default_csv_path() -> PathBuf {
    PathBuf::from("export/export.csv")
}

fn default_png_path() -> PathBuf {
    PathBuf::from("export/")
}

fn default_point_color() -> Color {
    Color::new(0xFF, 0xFF, 0x00)
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct ExportSettings {
    /// The file CSV exports are written to unless `--out` is given.
    #[serde(default = "default_csv_path")]
    pub(crate) csv_path: PathBuf,

    /// The directory PNG exports are written to unless `--out` is given.
    #[serde(default = "default_png_path")]
    pub(crate) png_path: PathBuf,

    #[serde(default)]
    pub(crate) color_palette: Choice,

    /// The marker color for the exported point.
    #[serde(default = "default_point_color")]
    pub(crate) point_color: Color,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            png_path: default_png_path(),
            color_palette: Choice::default(),
            point_color: default_point_color(),
        }
    }
}

fn default_write_path() -> PathBuf {
    PathBuf::from("out/")
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct RecorderSettings {
    /// The directory live frames are recorded to.
    #[serde(default = "default_write_path")]
    pub(crate) write_path: PathBuf,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            write_path: default_write_path(),
        }
    }
}
