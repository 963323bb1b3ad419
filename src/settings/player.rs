// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;

use serde::Deserialize;

use crate::render::color::Color;

use super::palette::Choice;

fn default_read_path() -> PathBuf {
    PathBuf::from("out/")
}

fn default_playback_speed() -> f64 {
    1.0
}

fn default_marker_colors() -> Vec<Color> {
    vec![
        Color::new(0x00, 0x00, 0xFF),
        Color::new(0xFF, 0x00, 0x00),
        Color::new(0xFF, 0xFF, 0x00),
        Color::new(0x00, 0xFF, 0x00),
        Color::new(0xFF, 0x00, 0xFF),
        Color::new(0x00, 0xFF, 0xFF),
        Color::new(0xFF, 0xA5, 0x00),
        Color::new(0xFF, 0xC0, 0xCB),
    ]
}

fn default_marker_radius() -> u32 {
    3
}

fn default_font_path() -> Option<PathBuf> {
    Some(PathBuf::from(
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    ))
}

fn default_font_size() -> f32 {
    16.0
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct PlayerSettings {
    /// Start playing as soon as the player opens.
    #[serde(default)]
    pub(crate) auto_play: bool,

    /// Where to look for recordings when no path is given on the command line.
    #[serde(default = "default_read_path")]
    pub(crate) read_path: PathBuf,

    /// The palette to start with, either by its position in the palette list or by name.
    #[serde(default)]
    pub(crate) color_palette: Choice,

    /// The scale to start with (linear, square root or square).
    #[serde(default)]
    pub(crate) color_scale: Choice,

    /// Multiplier for the passage of time during playback.
    #[serde(default = "default_playback_speed")]
    pub(crate) playback_speed: f64,

    /// Marker colors. The first two are used for the min and max points, and the rest are cycled
    /// through for new points.
    #[serde(default = "default_marker_colors")]
    pub(crate) marker_colors: Vec<Color>,

    #[serde(default = "default_marker_radius")]
    pub(crate) marker_radius: u32,

    /// A TrueType font for labels. If it can't be loaded, labels are drawn as boxes.
    #[serde(default = "default_font_path")]
    pub(crate) font_path: Option<PathBuf>,

    #[serde(default = "default_font_size")]
    pub(crate) font_size: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            auto_play: false,
            read_path: default_read_path(),
            color_palette: Choice::default(),
            color_scale: Choice::default(),
            playback_speed: default_playback_speed(),
            marker_colors: default_marker_colors(),
            marker_radius: default_marker_radius(),
            font_path: default_font_path(),
            font_size: default_font_size(),
        }
    }
}
