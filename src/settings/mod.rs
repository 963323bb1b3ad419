// SPDX-License-Identifier: GPL-3.0-or-later
use std::fs;
use std::io;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info, instrument};

mod cli;
mod export;
pub(crate) mod palette;
mod player;

pub(crate) use cli::{Args, Command, ExportArgs, ExportFormat};
pub(crate) use export::{ExportSettings, RecorderSettings};
pub(crate) use player::PlayerSettings;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub(crate) struct Settings {
    /// Settings for the interactive player.
    #[serde(default)]
    pub(crate) player: PlayerSettings,

    /// Settings for CSV and PNG exports.
    #[serde(default)]
    pub(crate) export: ExportSettings,

    /// Settings for recording live frames.
    #[serde(default)]
    pub(crate) recorder: RecorderSettings,
}

impl Settings {
    /// Read settings from a TOML file. A missing file is the same as an empty one.
    #[instrument(level = "debug")]
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        match fs::read(path) {
            Ok(contents) => {
                let settings = toml::from_slice(&contents)
                    .with_context(|| format!("Unable to parse {}", path.display()))?;
                debug!(?settings, "loaded settings");
                Ok(settings)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err).with_context(|| format!("Unable to read {}", path.display())),
        }
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use float_cmp::approx_eq;

    use crate::render::color::Color;

    use super::palette::Choice;
    use super::Settings;

    #[test]
    fn empty_is_default() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.player.auto_play);
        assert_eq!(settings.player.read_path, PathBuf::from("out/"));
        assert_eq!(settings.player.color_palette, Choice::Index(0));
        assert!(approx_eq!(f64, settings.player.playback_speed, 1.0));
        assert_eq!(settings.player.marker_colors.len(), 8);
        assert_eq!(settings.export.csv_path, PathBuf::from("export/export.csv"));
        assert_eq!(settings.export.png_path, PathBuf::from("export/"));
        assert_eq!(settings.export.point_color, Color::new(0xFF, 0xFF, 0x00));
        assert_eq!(settings.recorder.write_path, PathBuf::from("out/"));
    }

    #[test]
    fn partial_sections() {
        let settings: Settings = toml::from_str(
            r##"
            [player]
            auto_play = true
            color_palette = "Red Yellow Blue"
            playback_speed = 2.5
            marker_colors = ["#000080", "red", "white"]
            unknown_key = "ignored"

            [export]
            point_color = "cyan"
            "##,
        )
        .unwrap();
        assert!(settings.player.auto_play);
        assert_eq!(
            settings.player.color_palette,
            Choice::Name("Red Yellow Blue".to_string())
        );
        assert!(approx_eq!(f64, settings.player.playback_speed, 2.5));
        assert_eq!(settings.player.marker_colors[0], Color::new(0, 0, 0x80));
        assert_eq!(settings.player.marker_radius, 3);
        assert_eq!(settings.export.point_color, Color::new(0, 0xFF, 0xFF));
        assert_eq!(settings.export.csv_path, PathBuf::from("export/export.csv"));
    }

    #[test]
    fn example_config() {
        let settings: Settings = toml::from_str(include_str!("../../config_example.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn bad_color() {
        assert!(toml::from_str::<Settings>("[export]\npoint_color = \"plaid\"").is_err());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[recorder]\nwrite_path = \"/tmp/frames\"\n").unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.recorder.write_path, PathBuf::from("/tmp/frames"));
        std::fs::write(&path, "[player\n").unwrap();
        assert!(Settings::load(&path).is_err());
    }
}
