// SPDX-License-Identifier: GPL-3.0-or-later
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use structopt::StructOpt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod annotation;
mod capture;
mod error;
mod export;
mod image_buffer;
mod playback;
mod render;
mod scene;
mod settings;
mod store;
mod view;

use crate::capture::{frame_channel, spawn_replay, Recorder};
use crate::playback::sequence::file_range;
use crate::playback::Playback;
use crate::render::colorize::{default_palettes, Colorizer, Palette};
use crate::render::font::default_renderer;
use crate::settings::{Args, Command, ExportArgs, ExportFormat, Settings};
use crate::view::{window, Viewer};

const WINDOW_TITLE: &str = "thermoview";

const WINDOW_SIZE: (usize, usize) = (1280, 720);

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn play(settings: &Settings, path: Option<PathBuf>, end: Option<PathBuf>) -> anyhow::Result<()> {
    let start = path.unwrap_or_else(|| settings.player.read_path.clone());
    let mut playback = Playback::new(Vec::new(), 0, settings.player.playback_speed);
    if let Err(err) = playback.load(&start, end.as_deref()) {
        warn!(path = %start.display(), "unable to list recordings: {}", err);
    }
    let font = default_renderer(
        settings.player.font_path.as_deref(),
        settings.player.font_size,
    );
    let mut viewer = Viewer::new(&settings.player, font, playback, None);
    window::run(&mut viewer, WINDOW_TITLE, WINDOW_SIZE)
}

fn live(settings: &Settings, path: &Path, record: bool) -> anyhow::Result<()> {
    let (files, start) =
        file_range(path, None).with_context(|| format!("Unable to list {}", path.display()))?;
    let recorder = if record {
        let directory = &settings.recorder.write_path;
        fs::create_dir_all(directory)
            .with_context(|| format!("Unable to create {}", directory.display()))?;
        info!(path = %directory.display(), "recording frames");
        Some(Recorder::new(directory))
    } else {
        None
    };
    let (sender, receiver) = frame_channel();
    let capture = spawn_replay(files[start..].to_vec(), sender, recorder)
        .context("Unable to start the capture thread")?;
    let font = default_renderer(
        settings.player.font_path.as_deref(),
        settings.player.font_size,
    );
    let playback = Playback::new(Vec::new(), 0, settings.player.playback_speed);
    let mut viewer = Viewer::new(&settings.player, font, playback, Some(receiver));
    window::run(&mut viewer, WINDOW_TITLE, WINDOW_SIZE)?;
    // The capture thread stops once it notices the viewer is gone
    drop(viewer);
    capture
        .join()
        .map_err(|_| anyhow!("The capture thread panicked"))
}

fn run_export(settings: &Settings, args: ExportArgs) -> anyhow::Result<()> {
    let (files, start) = file_range(&args.start, args.end.as_deref())
        .with_context(|| format!("Unable to list {}", args.start.display()))?;
    let files = &files[start..];
    match args.format {
        ExportFormat::Csv => {
            let out = args.out.unwrap_or_else(|| settings.export.csv_path.clone());
            let columns = export::Columns {
                point: args.point,
                min: args.min,
                max: args.max,
            };
            export::export_csv(files, columns, &out)
        }
        ExportFormat::Png => {
            let choice = args
                .color_palette
                .as_ref()
                .unwrap_or(&settings.export.color_palette);
            let palettes = default_palettes();
            let palette = choice
                .resolve(palettes.iter().map(Palette::name))
                .ok_or_else(|| anyhow!("Unknown palette {}", choice))?;
            let colorizer = Colorizer::new(palettes, palette, 0);
            let out = args.out.unwrap_or_else(|| settings.export.png_path.clone());
            export::export_png(
                files,
                &colorizer,
                args.point,
                settings.export.point_color,
                &out,
            )
            .map(|_| ())
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::from_args();
    let settings = Settings::load(&args.config_path)?;
    match args.command {
        None => play(&settings, None, None),
        Some(Command::Play { path, end }) => play(&settings, path, end),
        Some(Command::Live { path, record }) => live(&settings, &path, record),
        Some(Command::Export(export)) => run_export(&settings, export),
    }
}
