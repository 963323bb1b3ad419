// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::SequenceError;

pub(crate) mod sequence;

use sequence::FrameName;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PlaybackState {
    Stopped,
    Playing,
}

/// Manual movements of the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Navigation {
    Step(isize),
    First,
    Last,
}

/// A sorted list of recorded files, and a cursor that moves through them in real time.
#[derive(Clone, Debug)]
pub(crate) struct Playback {
    files: Vec<PathBuf>,
    cursor: usize,
    state: PlaybackState,
    accumulator: Duration,
    speed: f64,
}

impl Playback {
    /// Create a stopped playback over `files` (which should already be sorted).
    ///
    /// `speed` multiplies the passage of time, so 2.0 plays back twice as fast as recorded.
    pub(crate) fn new(files: Vec<PathBuf>, cursor: usize, speed: f64) -> Self {
        let speed = if speed.is_finite() && speed >= 0.0 {
            speed
        } else {
            warn!(speed, "invalid playback speed, using 1.0");
            1.0
        };
        Self {
            cursor: cursor.min(files.len().saturating_sub(1)),
            files,
            state: PlaybackState::Stopped,
            accumulator: Duration::ZERO,
            speed,
        }
    }

    /// Replace the sequence with the recorded files around `start`, see
    /// [`sequence::file_range`].
    pub(crate) fn load(&mut self, start: &Path, end: Option<&Path>) -> Result<(), SequenceError> {
        let (files, cursor) = sequence::file_range(start, end)?;
        info!(count = files.len(), path = %start.display(), "loaded sequence");
        self.cursor = cursor.min(files.len().saturating_sub(1));
        self.files = files;
        self.accumulator = Duration::ZERO;
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.files.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    /// The file under the cursor, if there are any files.
    pub(crate) fn current(&self) -> Option<&Path> {
        self.files.get(self.cursor).map(PathBuf::as_path)
    }

    pub(crate) fn state(&self) -> PlaybackState {
        self.state
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    #[cfg(test)]
    pub(crate) fn accumulator(&self) -> Duration {
        self.accumulator
    }

    pub(crate) fn set_playing(&mut self, playing: bool) {
        self.state = if playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        };
    }

    pub(crate) fn toggle(&mut self) -> PlaybackState {
        self.set_playing(!self.is_playing());
        self.state
    }

    /// The recorded time between the file under the cursor and the next one.
    fn delta(&self) -> Result<Duration, SequenceError> {
        let current = FrameName::from_path(&self.files[self.cursor])?;
        let next = FrameName::from_path(&self.files[self.cursor + 1])?;
        Ok(Duration::from_millis(
            next.timestamp.saturating_sub(current.timestamp),
        ))
    }

    /// Move time forward by `elapsed`, returning the new cursor if it moved.
    ///
    /// Playback stops when the cursor is on the last file, and when a file name can't be parsed
    /// (in which case the error is returned and the cursor stays where it is).
    pub(crate) fn advance(&mut self, elapsed: Duration) -> Result<Option<usize>, SequenceError> {
        if !self.is_playing() {
            return Ok(None);
        }
        if self.cursor + 1 >= self.files.len() {
            info!("reached the end of the sequence, stopping");
            self.state = PlaybackState::Stopped;
            return Ok(None);
        }
        self.accumulator += elapsed.mul_f64(self.speed);
        let delta = match self.delta() {
            Ok(delta) => delta,
            Err(err) => {
                self.state = PlaybackState::Stopped;
                return Err(err);
            }
        };
        if self.accumulator >= delta {
            self.accumulator -= delta;
            self.cursor += 1;
            debug!(cursor = self.cursor, "advanced playback");
            Ok(Some(self.cursor))
        } else {
            Ok(None)
        }
    }

    /// Move the cursor, clamped to the sequence. Returns the new cursor if it moved.
    ///
    /// The accumulated time is always reset.
    pub(crate) fn navigate(&mut self, navigation: Navigation) -> Option<usize> {
        self.accumulator = Duration::ZERO;
        let last = self.files.len().checked_sub(1)?;
        let target = match navigation {
            Navigation::Step(step) => {
                let target = self.cursor as isize + step;
                target.clamp(0, last as isize) as usize
            }
            Navigation::First => 0,
            Navigation::Last => last,
        };
        if target == self.cursor {
            None
        } else {
            self.cursor = target;
            Some(target)
        }
    }
}
