// SPDX-License-Identifier: GPL-3.0-or-later
//! Live frames, and recording them to disk.
//!
//! Capture runs on its own thread and hands each new frame to the viewer through a
//! [`FrameSender`]. Only the most recent frame is kept; if the viewer hasn't picked up a frame by
//! the time the next one arrives, the older one is dropped.
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::error::StoreError;
use crate::image_buffer::{DualImage, ThermalImage, VisibleImage};
use crate::playback::sequence::FrameName;
use crate::store;

/// Delay used between replayed frames when their names don't say how far apart they are.
const FALLBACK_FRAME_DELAY: Duration = Duration::from_millis(100);

pub(crate) fn frame_channel() -> (FrameSender, FrameReceiver) {
    let (sender, receiver) = watch::channel(None);
    (
        FrameSender(Arc::new(sender)),
        FrameReceiver {
            receiver,
            last: None,
        },
    )
}

#[derive(Clone, Debug)]
pub(crate) struct FrameSender(Arc<watch::Sender<Option<DualImage>>>);

impl FrameSender {
    /// Hand a new frame to the viewer, replacing any frame it hasn't picked up yet.
    ///
    /// Returns `false` once the viewer has gone away.
    pub(crate) fn submit_frame<V, T>(&self, visible: V, thermal: T) -> bool
    where
        V: Into<Arc<VisibleImage>>,
        T: Into<Arc<ThermalImage>>,
    {
        let frame = DualImage {
            visible: visible.into(),
            thermal: thermal.into(),
        };
        self.0.send(Some(frame)).is_ok()
    }
}

#[derive(Debug)]
pub(crate) struct FrameReceiver {
    receiver: watch::Receiver<Option<DualImage>>,
    /// The thermal image of the last frame handed out.
    last: Option<Arc<ThermalImage>>,
}

impl FrameReceiver {
    /// The newest frame, if one has arrived since the last call.
    pub(crate) fn take_latest(&mut self) -> Option<DualImage> {
        let frame = match self.receiver.has_changed() {
            Ok(true) => self.receiver.borrow_and_update().clone(),
            Ok(false) => None,
            // The sender is gone, but the last frame it sent may not have been taken yet
            Err(_) => self.receiver.borrow().clone(),
        }?;
        let seen = self
            .last
            .as_ref()
            .map_or(false, |last| Arc::ptr_eq(last, &frame.thermal));
        if seen {
            return None;
        }
        self.last = Some(Arc::clone(&frame.thermal));
        Some(frame)
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_millis() as u64)
        .unwrap_or_default()
}

/// Writes frames to a directory, named with the time they were recorded and a frame counter.
#[derive(Clone, Debug)]
pub(crate) struct Recorder {
    directory: PathBuf,
    frame_counter: u32,
}

impl Recorder {
    pub(crate) fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            frame_counter: 1,
        }
    }

    fn next_path(&mut self, timestamp: u64) -> PathBuf {
        let name = FrameName::new(timestamp, self.frame_counter);
        self.frame_counter += 1;
        self.directory.join(name.file_name())
    }

    /// Write a frame, returning the path it was written to.
    pub(crate) fn record(&mut self, frame: &DualImage) -> Result<PathBuf, StoreError> {
        let path = self.next_path(unix_millis());
        store::write(&*frame.visible, &*frame.thermal, &path, (0, 0), (0, 0))?;
        trace!(path = %path.display(), "recorded frame");
        Ok(path)
    }
}

/// Play recorded files back as if they were coming from a camera.
///
/// Each file is submitted as a live frame, spaced out by the time between their recorded
/// timestamps. Frames are also recorded again if a [`Recorder`] is given, with the time spent
/// writing taken out of the delay. The thread stops at the end of the files, or when the viewer
/// goes away.
pub(crate) fn spawn_replay(
    files: Vec<PathBuf>,
    sender: FrameSender,
    mut recorder: Option<Recorder>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("capture".to_string())
        .spawn(move || {
            for (index, path) in files.iter().enumerate() {
                let started = Instant::now();
                let frame = match store::read(path) {
                    Ok(frame) => frame,
                    Err(err) => {
                        warn!(path = %path.display(), "skipping unreadable frame: {}", err);
                        continue;
                    }
                };
                if let Some(recorder) = recorder.as_mut() {
                    if let Err(err) = recorder.record(&frame) {
                        warn!("failed to record frame: {}", err);
                    }
                }
                if !sender.submit_frame(frame.visible, frame.thermal) {
                    info!("viewer closed, stopping capture");
                    break;
                }
                if let Some(next) = files.get(index + 1) {
                    let delay = match (FrameName::from_path(path), FrameName::from_path(next)) {
                        (Ok(current), Ok(next)) => {
                            Duration::from_millis(next.timestamp.saturating_sub(current.timestamp))
                        }
                        _ => FALLBACK_FRAME_DELAY,
                    };
                    thread::sleep(delay.saturating_sub(started.elapsed()));
                }
            }
            debug!("capture finished");
        })
}

#[cfg(test)]
mod test {
    use image::{Luma, Rgb};

    use crate::image_buffer::{DualImage, ThermalImage, VisibleImage};
    use crate::playback::sequence::FrameName;
    use crate::store;

    use super::{frame_channel, spawn_replay, Recorder};

    fn frame(value: f32) -> (VisibleImage, ThermalImage) {
        (
            VisibleImage::from_pixel(4, 3, Rgb([0.5, 0.25, value / 100.0])),
            ThermalImage::from_pixel(2, 2, Luma([value])),
        )
    }

    #[test]
    fn latest_frame_wins() {
        let (sender, mut receiver) = frame_channel();
        assert!(receiver.take_latest().is_none());
        let (visible, thermal) = frame(20.0);
        assert!(sender.submit_frame(visible, thermal));
        let (visible, thermal) = frame(30.0);
        assert!(sender.submit_frame(visible, thermal));
        let latest = receiver.take_latest().unwrap();
        assert_eq!(latest.thermal[(0, 0)], Luma([30.0]));
        assert!(receiver.take_latest().is_none());
    }

    #[test]
    fn last_frame_after_sender_closes() {
        let (sender, mut receiver) = frame_channel();
        let (visible, thermal) = frame(20.0);
        assert!(sender.submit_frame(visible, thermal));
        assert!(receiver.take_latest().is_some());
        let (visible, thermal) = frame(25.0);
        assert!(sender.submit_frame(visible, thermal));
        drop(sender);
        let latest = receiver.take_latest().unwrap();
        assert_eq!(latest.thermal[(0, 0)], Luma([25.0]));
        assert!(receiver.take_latest().is_none());
    }

    #[test]
    fn nothing_sent_before_close() {
        let (sender, mut receiver) = frame_channel();
        drop(sender);
        assert!(receiver.take_latest().is_none());
    }

    #[test]
    fn closed_receiver() {
        let (sender, receiver) = frame_channel();
        drop(receiver);
        let (visible, thermal) = frame(20.0);
        assert!(!sender.submit_frame(visible, thermal));
    }

    #[test]
    fn recorder_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = Recorder::new(dir.path());
        let (visible, thermal) = frame(25.0);
        let frame = DualImage::new(visible, thermal);
        let first = recorder.record(&frame).unwrap();
        let second = recorder.record(&frame).unwrap();
        assert_eq!(FrameName::from_path(&first).unwrap().frame, 1);
        assert_eq!(FrameName::from_path(&second).unwrap().frame, 2);
        let read_back = store::read(&second).unwrap();
        assert_eq!(*read_back.thermal, *frame.thermal);
    }

    #[test]
    fn replay_submits_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = Vec::new();
        for (name, value) in &[("1000:0001.tdi", 20.0), ("1010:0002.tdi", 21.5)] {
            let path = dir.path().join(name);
            let (visible, thermal) = frame(*value);
            store::write(&visible, &thermal, &path, (0, 0), (0, 0)).unwrap();
            files.push(path);
        }
        let (sender, mut receiver) = frame_channel();
        let record_dir = tempfile::tempdir().unwrap();
        let handle = spawn_replay(files, sender, Some(Recorder::new(record_dir.path()))).unwrap();
        handle.join().unwrap();
        let latest = receiver.take_latest().unwrap();
        assert_eq!(latest.thermal[(1, 1)], Luma([21.5]));
        assert!(receiver.take_latest().is_none());
        assert_eq!(std::fs::read_dir(record_dir.path()).unwrap().count(), 2);
    }
}
