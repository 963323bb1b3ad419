// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;
use std::str::FromStr;

use structopt::StructOpt;

use crate::annotation::Point;

use super::palette::Choice;

#[derive(Debug, StructOpt)]
#[structopt(about = "Record, play back and export dual-spectrum camera footage")]
pub(crate) struct Args {
    /// Path to a configuration file.
    #[structopt(short, long, parse(from_os_str), default_value = "config.toml")]
    pub(crate) config_path: PathBuf,

    #[structopt(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Debug, PartialEq, StructOpt)]
pub(crate) enum Command {
    /// Browse and play back recorded files. This is the default.
    Play {
        /// A recording directory, or a file to start from.
        #[structopt(parse(from_os_str))]
        path: Option<PathBuf>,

        /// The last file to play.
        #[structopt(parse(from_os_str))]
        end: Option<PathBuf>,
    },

    /// Show recorded files as if they were coming from a camera.
    Live {
        /// A recording directory, or a file to start from.
        #[structopt(parse(from_os_str))]
        path: PathBuf,

        /// Record every frame again, to the recorder's write path.
        #[structopt(long)]
        record: bool,
    },

    /// Export temperatures or colorized images from recorded files.
    Export(ExportArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExportFormat {
    Csv,
    Png,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &s.to_lowercase() as &str {
            "csv" => Ok(Self::Csv),
            "png" => Ok(Self::Png),
            _ => Err(format!("unknown export format \"{}\"", s)),
        }
    }
}

#[derive(Debug, PartialEq, StructOpt)]
pub(crate) struct ExportArgs {
    /// `csv` for a table of temperatures, `png` for colorized images.
    pub(crate) format: ExportFormat,

    /// The first file to export.
    #[structopt(parse(from_os_str))]
    pub(crate) start: PathBuf,

    /// The last file to export. Defaults to the last file in the directory.
    #[structopt(parse(from_os_str))]
    pub(crate) end: Option<PathBuf>,

    /// Output file (CSV) or directory (PNG).
    #[structopt(short, long, parse(from_os_str))]
    pub(crate) out: Option<PathBuf>,

    /// A point to export, as `x,y`.
    #[structopt(short, long)]
    pub(crate) point: Option<Point<u32>>,

    /// Include the lowest temperature of each file.
    #[structopt(long)]
    pub(crate) min: bool,

    /// Include the highest temperature of each file.
    #[structopt(long)]
    pub(crate) max: bool,

    /// The palette for PNG exports, by index or name.
    #[structopt(short = "c", long)]
    pub(crate) color_palette: Option<Choice>,
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use structopt::StructOpt;

    use crate::annotation::Point;
    use crate::settings::palette::Choice;

    use super::{Args, Command, ExportFormat};

    #[test]
    fn defaults() {
        let args = Args::from_iter_safe(&["thermoview"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("config.toml"));
        assert_eq!(args.command, None);
    }

    #[test]
    fn play() {
        let args = Args::from_iter_safe(&["thermoview", "-c", "other.toml", "play", "out/"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("other.toml"));
        assert_eq!(
            args.command,
            Some(Command::Play {
                path: Some(PathBuf::from("out/")),
                end: None
            })
        );
    }

    #[test]
    fn export() {
        let args = Args::from_iter_safe(&[
            "thermoview",
            "export",
            "csv",
            "out/1000:0001.tdi",
            "out/2000:0002.tdi",
            "-p",
            "10,20",
            "--max",
            "-c",
            "Turbo",
        ])
        .unwrap();
        let export = match args.command {
            Some(Command::Export(export)) => export,
            other => panic!("Expected an export command, got {:?}", other),
        };
        assert_eq!(export.format, ExportFormat::Csv);
        assert_eq!(export.end, Some(PathBuf::from("out/2000:0002.tdi")));
        assert_eq!(export.point, Some(Point::new(10, 20)));
        assert!(!export.min);
        assert!(export.max);
        assert_eq!(export.color_palette, Some(Choice::Name("Turbo".to_string())));
    }

    #[test]
    fn bad_export_format() {
        assert!(Args::from_iter_safe(&["thermoview", "export", "gif", "out/"]).is_err());
    }
}
