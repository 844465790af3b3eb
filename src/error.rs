// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Error types

use crate::database::Tags;
use crate::Symbol;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`Error`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Resource not found, unreadable or malformed
    Database,
    /// No usable font, or a malformed font-related table
    Font,
}

/// Library error
#[derive(Error, Debug)]
pub enum Error {
    /// No resource is registered under these tags
    #[error("no such resource: {0}")]
    NotFound(Tags),
    /// The resource has no readable backing file
    #[error("resource file for {0} is unavailable")]
    Unavailable(Tags),
    /// Reading or writing a file failed
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The content of a resource could not be parsed
    #[error("malformed {context} at line {line}: {msg}")]
    Malformed {
        context: &'static str,
        line: u32,
        msg: String,
    },
    /// Another writer holds the advisory lock
    #[error("resource is locked by another writer: {}", .0.display())]
    Locked(PathBuf),
    /// `save` or `unlock` was called without holding the lock
    #[error("resource is not locked")]
    NotLocked,
    /// No user directory is configured to write resources into
    #[error("no writable resource directory")]
    NoWritableDir,
    /// A charset name could not be resolved
    #[error("unknown charset: {0}")]
    UnknownCharset(Symbol),
    /// No font driver could produce a candidate
    #[error("no font match")]
    NoFontMatch,
    /// A font driver failed to open a font
    #[error("failed to open font: {0}")]
    Open(String),
    /// An invalid argument was passed to a font operation
    #[error("invalid font parameter: {0}")]
    InvalidFont(&'static str),
    /// A fontset of this name already exists
    #[error("fontset {0} already exists")]
    FontsetExists(Symbol),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_)
            | Error::Unavailable(_)
            | Error::Io { .. }
            | Error::Malformed { .. }
            | Error::Locked(_)
            | Error::NotLocked
            | Error::NoWritableDir => ErrorKind::Database,
            Error::UnknownCharset(_)
            | Error::NoFontMatch
            | Error::Open(_)
            | Error::InvalidFont(_)
            | Error::FontsetExists(_) => ErrorKind::Font,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;
