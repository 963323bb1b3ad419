// SPDX-License-Identifier: GPL-3.0-or-later
//! The player: owns every node in the scene, the playback state and the current images.
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use tracing::{debug, error, info, warn};

use crate::annotation::{Annotations, PointId};
use crate::capture::FrameReceiver;
use crate::image_buffer::{DualImage, VisibleImage};
use crate::playback::{Navigation, Playback, PlaybackState};
use crate::render::color::Color;
use crate::render::colorize::{default_palettes, Colorizer, Palette, Scale};
use crate::render::font::FontRenderer;
use crate::scene::behavior::{HoverPhase, Layout};
use crate::scene::event::{Event, Key, MouseButton, Position};
use crate::scene::rect::Corner;
use crate::scene::{NodeId, Scene};
use crate::settings::PlayerSettings;
use crate::store;

mod thermal;
pub(crate) mod window;

use thermal::ThermalDisplay;

const BACKGROUND: Color = Color::new(0x80, 0x00, 0x80);

/// How long load errors stay on screen.
const ERROR_DURATION: Duration = Duration::from_secs(5);

/// What node handlers ask the viewer to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Message {
    ImageHover(HoverPhase, Position),
    ImageClicked(MouseButton, Position),
    PointClicked(PointId, MouseButton),
    PaletteStep(i32),
    ScaleStep(i32),
    PlayToggled(bool),
}

/// Convert a visible image to 8-bit color.
fn visible_surface(image: &VisibleImage) -> RgbaImage {
    let to_byte = |channel: f32| (channel * 255.0).round().max(0.0).min(255.0) as u8;
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y);
        Rgba([to_byte(pixel[0]), to_byte(pixel[1]), to_byte(pixel[2]), u8::MAX])
    })
}

fn initial_colorizer(settings: &PlayerSettings) -> Colorizer {
    let palettes = default_palettes();
    let palette = settings
        .color_palette
        .resolve(palettes.iter().map(Palette::name))
        .unwrap_or_else(|| {
            warn!(palette = %settings.color_palette, "unknown palette, using the first one");
            0
        });
    let scale = settings
        .color_scale
        .resolve(Scale::ALL.iter().map(Scale::name))
        .unwrap_or_else(|| {
            warn!(scale = %settings.color_scale, "unknown scale, using the first one");
            0
        });
    Colorizer::new(palettes, palette, scale)
}

fn file_description(path: &Path, index: usize, count: usize) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("{} ({}/{})", name, index + 1, count)
}

#[derive(Debug)]
pub(crate) struct Viewer {
    scene: Scene<Message>,
    visible: NodeId,
    error_label: NodeId,
    file_label: NodeId,
    play_button: NodeId,
    thermal: ThermalDisplay,
    playback: Playback,
    frames: Option<FrameReceiver>,
    current: DualImage,
    running: bool,
}

impl Viewer {
    /// Build the player around a sequence of recorded files, and optionally a source of live
    /// frames.
    pub(crate) fn new(
        settings: &PlayerSettings,
        font: Box<dyn FontRenderer>,
        mut playback: Playback,
        frames: Option<FrameReceiver>,
    ) -> Self {
        let mut scene = Scene::new(font);
        let visible = scene.add_node(None, RgbaImage::new(0, 0));
        let visible_caption = scene.add_label(None, "Visible");
        scene.set_layout(visible_caption, Layout::Below(visible));
        let error_label = scene.add_label(None, "");
        scene.set_text_color(error_label, Color::new(0xFF, 0x45, 0x00));
        scene.set_layout(error_label, Layout::Below(visible_caption));
        scene.set_visible(error_label, false);
        let annotations = Annotations::new(settings.marker_colors.clone(), settings.marker_radius);
        let thermal = ThermalDisplay::new(
            &mut scene,
            Some(visible),
            initial_colorizer(settings),
            annotations,
        );
        let file_label = scene.add_label(None, "");
        scene.set_layout(
            file_label,
            Layout::anchor(Corner::BottomRight, |(width, height)| {
                (width as i32, height as i32)
            }),
        );
        playback.set_playing(settings.auto_play);
        let play_button = scene.add_toggle(None, "Play", settings.auto_play, |on| {
            Some(Message::PlayToggled(on))
        });
        scene.set_layout(
            play_button,
            Layout::anchor(Corner::BottomLeft, |(_, height)| (0, height as i32)),
        );
        let mut viewer = Self {
            scene,
            visible,
            error_label,
            file_label,
            play_button,
            thermal,
            playback,
            frames,
            current: DualImage::placeholder(),
            running: true,
        };
        if viewer.frames.is_some() {
            viewer.show(DualImage::placeholder(), "Waiting for frames");
        } else if viewer.playback.is_empty() {
            info!("no recorded files found, showing example data");
            viewer.show(
                DualImage::placeholder(),
                "No files found! Showing example data",
            );
        } else {
            viewer.load_current();
        }
        viewer
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    #[cfg(test)]
    pub(crate) fn playback(&self) -> &Playback {
        &self.playback
    }

    #[cfg(test)]
    /// The images currently on screen.
    pub(crate) fn current(&self) -> &DualImage {
        &self.current
    }

    /// Run one iteration of the player: handle input, pick up a live frame, move playback
    /// forward and draw everything onto `target`.
    pub(crate) fn frame(&mut self, events: &[Event], elapsed: Duration, target: &mut RgbaImage) {
        for event in events {
            self.handle_event(event);
        }
        if let Some(frame) = self.frames.as_mut().and_then(FrameReceiver::take_latest) {
            self.show(frame, "Live");
        }
        let was_playing = self.playback.is_playing();
        match self.playback.advance(elapsed) {
            Ok(Some(_)) => self.load_current(),
            Ok(None) => (),
            Err(err) => {
                error!("playback stopped: {}", err);
                self.show_error(&format!("Playback stopped: {}", err));
            }
        }
        if was_playing && self.playback.state() == PlaybackState::Stopped {
            self.scene.set_toggle(self.play_button, false);
        }
        self.scene.tick(elapsed);
        let background = BACKGROUND.to_rgba();
        target.pixels_mut().for_each(|pixel| *pixel = background);
        self.scene.render(target);
    }

    fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Quit => {
                info!("window closed");
                self.running = false;
            }
            Event::KeyReleased(key) => self.handle_key(*key),
            _ => (),
        }
        for message in self.scene.handle_event(event) {
            self.apply(message);
        }
    }

    fn handle_key(&mut self, key: Key) {
        let navigation = match key {
            Key::Q => {
                info!("quitting");
                self.running = false;
                return;
            }
            Key::Space => {
                let playing = self.playback.toggle() == PlaybackState::Playing;
                self.scene.set_toggle(self.play_button, playing);
                return;
            }
            Key::Right => Navigation::Step(1),
            Key::Left => Navigation::Step(-1),
            Key::Up => Navigation::Step(5),
            Key::Down => Navigation::Step(-5),
            Key::Home => Navigation::First,
            Key::End => Navigation::Last,
        };
        if self.playback.navigate(navigation).is_some() {
            self.load_current();
        }
    }

    fn apply(&mut self, message: Message) {
        debug!(?message, "applying message");
        match message {
            Message::ImageHover(phase, position) => {
                self.thermal.hover(&mut self.scene, phase, position)
            }
            Message::ImageClicked(button, position) => {
                self.thermal.click_image(&mut self.scene, button, position);
            }
            Message::PointClicked(id, button) => {
                self.thermal.click_point(&mut self.scene, id, button);
            }
            Message::PaletteStep(delta) => self.thermal.step_palette(&mut self.scene, delta),
            Message::ScaleStep(delta) => self.thermal.step_scale(&mut self.scene, delta),
            Message::PlayToggled(on) => self.playback.set_playing(on),
        }
    }

    /// Load the file under the playback cursor. On failure the current images stay on screen.
    fn load_current(&mut self) {
        let path = match self.playback.current() {
            Some(path) => path.to_path_buf(),
            None => return,
        };
        let description = file_description(&path, self.playback.cursor(), self.playback.len());
        match store::read(&path) {
            Ok(images) => self.show(images, &description),
            Err(err) => {
                error!(path = %path.display(), "unable to load file: {}", err);
                self.scene.set_text(self.file_label, &description);
                self.show_error(&format!("Unable to load file: {}", err));
            }
        }
    }

    fn show(&mut self, images: DualImage, description: &str) {
        self.scene
            .set_surface(self.visible, visible_surface(&images.visible));
        self.thermal
            .update(&mut self.scene, Arc::clone(&images.thermal));
        self.scene.set_text(self.file_label, description);
        self.current = images;
    }

    fn show_error(&mut self, message: &str) {
        self.scene.set_text(self.error_label, message);
        self.scene.show_for(self.error_label, ERROR_DURATION);
    }
}
