// SPDX-License-Identifier: GPL-3.0-or-later
//! Runs a [`Viewer`] in a desktop window.
use std::time::{Duration, Instant};

use anyhow::Context;
use image::RgbaImage;
use minifb::{MouseMode, Window, WindowOptions};
use tracing::{debug, info};

use crate::scene::event::{Event, Key, MouseButton, Position};

use super::Viewer;

const FRAME_RATE: u32 = 60;

fn translate_key(key: minifb::Key) -> Option<Key> {
    match key {
        minifb::Key::Q => Some(Key::Q),
        minifb::Key::Space => Some(Key::Space),
        minifb::Key::Left => Some(Key::Left),
        minifb::Key::Right => Some(Key::Right),
        minifb::Key::Up => Some(Key::Up),
        minifb::Key::Down => Some(Key::Down),
        minifb::Key::Home => Some(Key::Home),
        minifb::Key::End => Some(Key::End),
        _ => None,
    }
}

const BUTTONS: [(minifb::MouseButton, MouseButton); 3] = [
    (minifb::MouseButton::Left, MouseButton::Left),
    (minifb::MouseButton::Middle, MouseButton::Middle),
    (minifb::MouseButton::Right, MouseButton::Right),
];

/// Where the pointer is reported once it leaves the window, so hovered nodes see it go.
const OUTSIDE: Position = (-1, -1);

/// The input state read from the window in one poll.
#[derive(Debug, Default)]
struct Snapshot {
    open: bool,
    position: Option<Position>,
    buttons: [bool; 3],
    scroll: f32,
    keys: Vec<Key>,
}

impl Snapshot {
    fn read(window: &Window) -> Self {
        let mut buttons = [false; 3];
        for (down, (window_button, _)) in buttons.iter_mut().zip(BUTTONS.iter()) {
            *down = window.get_mouse_down(*window_button);
        }
        Self {
            open: window.is_open(),
            position: window
                .get_mouse_pos(MouseMode::Discard)
                .map(|(x, y)| (x as i32, y as i32)),
            buttons,
            scroll: window.get_scroll_wheel().map_or(0.0, |(_, scroll)| scroll),
            keys: window
                .get_keys_released()
                .into_iter()
                .filter_map(translate_key)
                .collect(),
        }
    }
}

/// Turns the window's polled input state into discrete events.
#[derive(Debug, Default)]
struct InputState {
    position: Option<Position>,
    buttons: [bool; 3],
}

impl InputState {
    fn poll(&mut self, window: &Window) -> Vec<Event> {
        self.update(Snapshot::read(window))
    }

    fn update(&mut self, snapshot: Snapshot) -> Vec<Event> {
        let mut events = Vec::new();
        if !snapshot.open {
            events.push(Event::Quit);
            return events;
        }
        match (self.position, snapshot.position) {
            (Some(_), None) => events.push(Event::PointerMoved(OUTSIDE)),
            (previous, Some(position)) if previous != Some(position) => {
                events.push(Event::PointerMoved(position))
            }
            _ => (),
        }
        if let Some(position) = snapshot.position {
            for (index, (_, button)) in BUTTONS.iter().enumerate() {
                match (self.buttons[index], snapshot.buttons[index]) {
                    (false, true) => events.push(Event::ButtonPressed {
                        position,
                        button: *button,
                    }),
                    (true, false) => events.push(Event::ButtonReleased {
                        position,
                        button: *button,
                    }),
                    _ => (),
                }
            }
            let wheel = if snapshot.scroll > 0.0 {
                Some(MouseButton::WheelUp)
            } else if snapshot.scroll < 0.0 {
                Some(MouseButton::WheelDown)
            } else {
                None
            };
            if let Some(button) = wheel {
                events.push(Event::ButtonPressed { position, button });
                events.push(Event::ButtonReleased { position, button });
            }
        }
        self.position = snapshot.position;
        if snapshot.position.is_some() {
            self.buttons = snapshot.buttons;
        }
        events.extend(snapshot.keys.into_iter().map(Event::KeyReleased));
        events
    }
}

/// Convert to the `0RGB` pixels the window expects.
fn fill_buffer(image: &RgbaImage, buffer: &mut Vec<u32>) {
    buffer.clear();
    buffer.extend(
        image
            .pixels()
            .map(|pixel| u32::from_be_bytes([0, pixel[0], pixel[1], pixel[2]])),
    );
}

/// Open a window and run `viewer` in it until it quits or the window is closed.
pub(crate) fn run(viewer: &mut Viewer, title: &str, size: (usize, usize)) -> anyhow::Result<()> {
    let (width, height) = size;
    let mut window = Window::new(
        title,
        width,
        height,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )
    .context("Unable to open a window")?;
    window.limit_update_rate(Some(Duration::from_secs(1) / FRAME_RATE));
    info!(width, height, "opened window");
    let mut input = InputState::default();
    let mut target = RgbaImage::new(width as u32, height as u32);
    let mut buffer = Vec::with_capacity(width * height);
    let mut last_frame = Instant::now();
    while viewer.is_running() {
        let events = input.poll(&window);
        let now = Instant::now();
        let elapsed = now.duration_since(last_frame);
        last_frame = now;
        let (width, height) = window.get_size();
        if target.dimensions() != (width as u32, height as u32) {
            debug!(width, height, "window resized");
            target = RgbaImage::new(width as u32, height as u32);
        }
        viewer.frame(&events, elapsed, &mut target);
        if !viewer.is_running() {
            break;
        }
        fill_buffer(&target, &mut buffer);
        window
            .update_with_buffer(&buffer, width, height)
            .context("Unable to update the window")?;
    }
    Ok(())
}
