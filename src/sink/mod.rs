// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sinks and the controller that flushes buffered records into them.

use std::fmt;
use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use jiff::Zoned;

use crate::Error;

pub use self::controller::Controller;
pub use self::discard::Discard;

mod controller;
mod discard;

// Device paths that are never renamed.
const STDIO_PATHS: [&str; 3] = ["/dev/stdout", "/dev/stdin", "/dev/stderr"];

/// The destination of flushed records.
///
/// A sink is either a file opened from a path, which can take part in size-based rotation, or
/// any writer supplied by the caller.
pub struct Sink {
    writer: Box<dyn Write + Send>,
    rotate: bool,
    noop_close: bool,
    written: u64,
    file: Option<FileTarget>,
}

#[derive(Debug)]
struct FileTarget {
    path: PathBuf,
    created: Zoned,
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("rotate", &self.rotate)
            .field("noop_close", &self.noop_close)
            .field("written", &self.written)
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

impl Sink {
    /// Wrap a caller-supplied writer.
    ///
    /// Rotation renames a file by its path, so a writer only counts bytes and never rotates.
    /// Passing `rotate = true` is reported to the trap once the sink is installed and otherwise
    /// ignored; use [`Sink::file`] for a rotating sink. If `noop_close` is set, closing the
    /// logger flushes the writer but keeps it alive.
    pub fn writer(writer: impl Write + Send + 'static, rotate: bool, noop_close: bool) -> Self {
        Self {
            writer: Box::new(writer),
            rotate,
            noop_close,
            written: 0,
            file: None,
        }
    }

    /// The standard output of the process.
    pub fn stdout() -> Self {
        Sink::writer(io::stdout(), false, true)
    }

    /// The standard error of the process.
    pub fn stderr() -> Self {
        Sink::writer(io::stderr(), false, true)
    }

    /// A sink that accepts and drops everything.
    pub fn discard() -> Self {
        Sink::writer(Discard, false, true)
    }

    /// Open `root/topic/name` in append mode, creating missing directories and the file.
    ///
    /// An existing file is appended to, and its current length counts toward the rotation
    /// threshold.
    pub fn file(
        root: impl AsRef<Path>,
        topic: impl AsRef<Path>,
        name: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        let name = name.as_ref();
        if name.as_os_str().is_empty() {
            return Err(Error::new("log file name must not be empty"));
        }

        let path = root.as_ref().join(topic.as_ref()).join(name);
        if !is_stdio(&path) {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).map_err(|err| {
                    Error::new("failed to create log directory")
                        .with_context("path", dir.display())
                        .with_source(err)
                })?;
            }
        }
        Sink::open_file(path, Zoned::now())
    }

    pub(crate) fn open_file(path: PathBuf, created: Zoned) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|err| {
                Error::new("failed to open log file")
                    .with_context("path", path.display())
                    .with_source(err)
            })?;
        let written = file.metadata().map(|m| m.len()).map_err(|err| {
            Error::new("failed to read log file metadata")
                .with_context("path", path.display())
                .with_source(err)
        })?;

        Ok(Self {
            writer: Box::new(file),
            rotate: !is_stdio(&path),
            noop_close: false,
            written,
            file: Some(FileTarget { path, created }),
        })
    }

    /// Enable or disable size-based rotation. File sinks rotate by default.
    #[must_use]
    pub fn rotating(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    /// The file path of this sink, if it was opened from one.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|target| target.path.as_path())
    }

    fn should_rotate(&self, max_file_size: u64) -> bool {
        self.rotate && self.file.is_some() && self.written >= max_file_size
    }
}

fn is_stdio(path: &Path) -> bool {
    STDIO_PATHS.iter().any(|stdio| path == Path::new(stdio))
}

/// The name a rotated file is renamed to: `.<created>_<now>` inserted before the extension,
/// plus a counter if that name is already taken.
fn archive_path(path: &Path, created: &str, now: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|s| format!(".{}", s.to_string_lossy()))
        .unwrap_or_default();

    let mut candidate = path.with_file_name(format!("{stem}.{created}_{now}{ext}"));
    let mut count = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{stem}.{created}_{now}.{count}{ext}"));
        count += 1;
    }
    candidate
}
