// SPDX-License-Identifier: GPL-3.0-or-later
//! Naming and listing of recorded dual-image files.
//!
//! Files are named `{timestamp}:{frame}.tdi`, where the timestamp is in milliseconds since the
//! Unix epoch and the frame is a counter, zero padded to four digits.
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, instrument};

use crate::error::SequenceError;

pub(crate) const EXTENSION: &str = "tdi";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct FrameName {
    pub(crate) timestamp: u64,
    pub(crate) frame: u32,
}

impl FrameName {
    pub(crate) fn new(timestamp: u64, frame: u32) -> Self {
        Self { timestamp, frame }
    }

    pub(crate) fn from_path(path: &Path) -> Result<Self, SequenceError> {
        let malformed = || {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            SequenceError::MalformedName(name)
        };
        path.file_stem()
            .and_then(OsStr::to_str)
            .ok_or_else(malformed)?
            .parse()
            .map_err(|_| malformed())
    }

    pub(crate) fn file_name(&self) -> String {
        format!("{}.{}", self, EXTENSION)
    }
}

impl fmt::Display for FrameName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:04}", self.timestamp, self.frame)
    }
}

impl FromStr for FrameName {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SequenceError::MalformedName(s.to_string());
        let (timestamp, frame) = s.split_once(':').ok_or_else(malformed)?;
        Ok(Self {
            timestamp: timestamp.parse().map_err(|_| malformed())?,
            frame: frame.parse().map_err(|_| malformed())?,
        })
    }
}

/// Sort paths by the timestamp and frame in their names.
///
/// Paths that aren't named like recorded files go after the rest, ordered by name.
pub(crate) fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|path| {
        let name = FrameName::from_path(path).ok();
        (name.is_none(), name, path.file_name().map(OsStr::to_os_string))
    });
}

/// List the recorded files around `start`.
///
/// If `start` is a directory, every recorded file in it is listed and the returned index is 0. If
/// it is a file, its siblings are listed and the index is the position of `start` in the list (or
/// 0 if it isn't a recorded file). If `end` is given, the list stops at that file.
#[instrument(level = "debug")]
pub(crate) fn file_range(
    start: &Path,
    end: Option<&Path>,
) -> Result<(Vec<PathBuf>, usize), SequenceError> {
    let (directory, start_file) = if start.is_file() {
        let start_file = start.canonicalize()?;
        let directory = start_file
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| SequenceError::InvalidPath(start.to_path_buf()))?;
        (directory, Some(start_file))
    } else if start.is_dir() {
        (start.canonicalize()?, None)
    } else {
        return Err(SequenceError::InvalidPath(start.to_path_buf()));
    };
    let mut files = fs::read_dir(&directory)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && path.extension() == Some(OsStr::new(EXTENSION)))
        .collect::<Vec<_>>();
    sort_paths(&mut files);
    if let Some(end) = end {
        if !end.is_file() {
            return Err(SequenceError::InvalidPath(end.to_path_buf()));
        }
        let end = end.canonicalize()?;
        if let Some(end_index) = files.iter().position(|path| *path == end) {
            files.truncate(end_index + 1);
        }
    }
    let start_index = start_file
        .and_then(|start_file| files.iter().position(|path| *path == start_file))
        .unwrap_or(0);
    debug!(count = files.len(), start_index, "listed recorded files");
    Ok((files, start_index))
}

#[cfg(test)]
mod test {
    use std::fs::File;
    use std::path::{Path, PathBuf};

    use crate::error::SequenceError;

    use super::{file_range, sort_paths, FrameName};

    #[test]
    fn parse_names() {
        assert_eq!(
            FrameName::from_path(Path::new("/tmp/out/1000:0001.tdi")).unwrap(),
            FrameName::new(1000, 1)
        );
        assert_eq!(
            "1684154321123:0042".parse::<FrameName>().unwrap(),
            FrameName::new(1684154321123, 42)
        );
        for bad in &["1000.tdi", "abc:0001.tdi", "1000:x.tdi", ":.tdi"] {
            assert!(matches!(
                FrameName::from_path(Path::new(bad)),
                Err(SequenceError::MalformedName(_))
            ));
        }
    }

    #[test]
    fn file_names() {
        assert_eq!(FrameName::new(1500, 2).file_name(), "1500:0002.tdi");
        assert_eq!(FrameName::new(1500, 12345).file_name(), "1500:12345.tdi");
    }

    #[test]
    fn sorts_numerically() {
        let mut paths: Vec<PathBuf> = ["junk.tdi", "900:0003.tdi", "1000:0010.tdi", "1000:0002.tdi"]
            .iter()
            .map(PathBuf::from)
            .collect();
        sort_paths(&mut paths);
        let names: Vec<_> = paths.iter().map(|p| p.to_str().unwrap()).collect();
        assert_eq!(
            names,
            vec!["900:0003.tdi", "1000:0002.tdi", "1000:0010.tdi", "junk.tdi"]
        );
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in &["1000:0001.tdi", "1500:0002.tdi", "2500:0003.tdi", "notes.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }
        dir
    }

    #[test]
    fn range_from_directory() {
        let dir = fixture();
        let (files, index) = file_range(dir.path(), None).unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(index, 0);
        assert!(files[0].ends_with("1000:0001.tdi"));
        assert!(files[2].ends_with("2500:0003.tdi"));
    }

    #[test]
    fn range_from_file() {
        let dir = fixture();
        let (files, index) = file_range(&dir.path().join("1500:0002.tdi"), None).unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(index, 1);
    }

    #[test]
    fn range_with_end() {
        let dir = fixture();
        let (files, index) = file_range(
            &dir.path().join("1500:0002.tdi"),
            Some(&dir.path().join("1500:0002.tdi")),
        )
        .unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(index, 1);
        assert!(matches!(
            file_range(dir.path(), Some(dir.path())),
            Err(SequenceError::InvalidPath(_))
        ));
    }

    #[test]
    fn invalid_start() {
        let dir = fixture();
        assert!(matches!(
            file_range(&dir.path().join("missing"), None),
            Err(SequenceError::InvalidPath(_))
        ));
    }
}
