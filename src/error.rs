// SPDX-License-Identifier: GPL-3.0-or-later
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::store::Window;

/// Errors from building or stepping through a sequence of recorded files.
#[derive(Debug)]
pub enum SequenceError {
    /// A file name did not follow the `{timestamp}:{frame}.ext` convention.
    MalformedName(String),

    /// The given path is neither a file nor a directory.
    InvalidPath(PathBuf),

    /// Listing a directory failed.
    Io(io::Error),
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedName(name) => {
                write!(f, "\"{}\" is not named like \"{{timestamp}}:{{frame}}\"", name)
            }
            Self::InvalidPath(path) => write!(f, "{} is not a valid path", path.display()),
            Self::Io(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for SequenceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::MalformedName(_) | Self::InvalidPath(_) => None,
            Self::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for SequenceError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Errors from reading or writing dual-image files.
#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),

    Encoding(bincode::Error),

    /// The file does not contain a region with the given tag.
    MissingRegion(&'static str),

    /// A region's sample count does not match its data window.
    DimensionMismatch {
        tag: String,
        expected: usize,
        actual: usize,
    },

    /// A region's data window is inside out or too large.
    InvalidWindow { tag: String, window: Window },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "{}", e),
            Self::Encoding(e) => write!(f, "{}", e),
            Self::MissingRegion(tag) => write!(f, "no \"{}\" region in file", tag),
            Self::DimensionMismatch {
                tag,
                expected,
                actual,
            } => write!(
                f,
                "region \"{}\" should have {} samples, but has {}",
                tag, expected, actual
            ),
            Self::InvalidWindow { tag, window } => write!(
                f,
                "region \"{}\" has an invalid data window from {:?} to {:?}",
                tag, window.min, window.max
            ),
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Encoding(e) => Some(e.as_ref()),
            Self::MissingRegion(_)
            | Self::DimensionMismatch { .. }
            | Self::InvalidWindow { .. } => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        Self::Encoding(e)
    }
}
