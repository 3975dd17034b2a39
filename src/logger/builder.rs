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

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use crate::Error;
use crate::Level;
use crate::Logger;
use crate::Meta;
use crate::RecordFormat;
use crate::Trap;
use crate::buffer::BufferPool;
use crate::buffer::Selector;
use crate::hook;
use crate::hook::HookFn;
use crate::hook::Hooks;
use crate::logger::Pipeline;
use crate::sink::Controller;
use crate::sink::Sink;
use crate::trap::DefaultTrap;

const DEFAULT_MAX_FILE_SIZE: u64 = 1 << 30;
const DEFAULT_MAX_SYNC_SIZE: usize = 1 << 20;
const DEFAULT_MAX_RECORD_SIZE: usize = 10 << 10;
const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Create a [`LoggerBuilder`] with default settings.
pub fn builder() -> LoggerBuilder {
    LoggerBuilder::new()
}

#[derive(Debug)]
enum SinkSpec {
    Sink(Sink),
    File {
        root: PathBuf,
        topic: PathBuf,
        name: PathBuf,
    },
}

/// A builder to configure and create a [`Logger`].
///
/// Defaults: minimum level debug, direct mode on, 1 GiB files, 1 MiB sync buffers,
/// 10 KiB records, a one second flush interval, one buffer pair, stdout.
///
/// ```
/// use std::time::Duration;
///
/// use batchlog::Level;
/// use batchlog::LoggerBuilder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let logger = LoggerBuilder::new()
///     .level(Level::Info)
///     .direct(false)
///     .sync_interval(Duration::from_millis(200))
///     .max_file_size(64 * 1024 * 1024)
///     .file(dir.path(), "orders", "app.log")
///     .build()
///     .unwrap();
/// logger.info("started", &[]);
/// logger.sync();
/// ```
#[must_use = "call `build` to create the logger"]
pub struct LoggerBuilder {
    level: Level,
    max_file_size: u64,
    max_sync_size: usize,
    max_record_size: usize,
    sync_interval: Duration,
    direct: bool,
    trap: Box<dyn Trap>,
    hooks: Vec<Box<HookFn>>,
    buffers: usize,
    selector: Selector,
    format: RecordFormat,
    sink: Option<SinkSpec>,
}

impl fmt::Debug for LoggerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerBuilder")
            .field("level", &self.level)
            .field("max_file_size", &self.max_file_size)
            .field("max_sync_size", &self.max_sync_size)
            .field("max_record_size", &self.max_record_size)
            .field("sync_interval", &self.sync_interval)
            .field("direct", &self.direct)
            .field("trap", &self.trap)
            .field("hooks", &self.hooks.len())
            .field("buffers", &self.buffers)
            .field("selector", &self.selector)
            .field("format", &self.format)
            .field("sink", &self.sink)
            .finish()
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerBuilder {
    /// Create a new [`LoggerBuilder`] with default settings.
    pub fn new() -> Self {
        Self {
            level: Level::Debug,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_sync_size: DEFAULT_MAX_SYNC_SIZE,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            direct: true,
            trap: Box::new(DefaultTrap::default()),
            hooks: vec![],
            buffers: 1,
            selector: Selector::default(),
            format: RecordFormat::default(),
            sink: None,
        }
    }

    /// Set the minimum level of records to write.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the file size in bytes that triggers a rotation.
    pub fn max_file_size(mut self, n: u64) -> Self {
        self.max_file_size = n;
        self
    }

    /// Set the number of buffered bytes that triggers an inline flush.
    pub fn max_sync_size(mut self, n: usize) -> Self {
        self.max_sync_size = n;
        self
    }

    /// Set the record size in bytes past which custom fields are dropped.
    pub fn max_record_size(mut self, n: usize) -> Self {
        self.max_record_size = n;
        self
    }

    /// Set the interval of the background flusher. Zero is raised to one millisecond.
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Flush on every call instead of buffering until the threshold or the next tick.
    pub fn direct(mut self, direct: bool) -> Self {
        self.direct = direct;
        self
    }

    /// Set the trap receiving errors from the sink.
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Add a hook contributing a field to every record.
    pub fn hook(mut self, hook: impl Fn() -> Meta + Send + Sync + 'static) -> Self {
        self.hooks.push(hook::boxed(hook));
        self
    }

    /// Set the number of buffer pairs. At least one pair is always created.
    ///
    /// Records from different pairs reach the sink in no particular order.
    pub fn buffers(mut self, n: usize) -> Self {
        self.buffers = n;
        self
    }

    /// Set how a call picks its buffer pair.
    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Set the layout of the common fields.
    pub fn format(mut self, format: RecordFormat) -> Self {
        self.format = format;
        self
    }

    /// Write to the file `root/topic/name`. Directories are created by
    /// [`build`](LoggerBuilder::build).
    pub fn file(
        mut self,
        root: impl Into<PathBuf>,
        topic: impl Into<PathBuf>,
        name: impl Into<PathBuf>,
    ) -> Self {
        self.sink = Some(SinkSpec::File {
            root: root.into(),
            topic: topic.into(),
            name: name.into(),
        });
        self
    }

    /// Write to a caller-supplied writer. See [`Sink::writer`].
    ///
    /// Writers never rotate. A `rotate` of `true` is reported to the trap when the logger is
    /// built.
    pub fn writer(
        self,
        writer: impl Write + Send + 'static,
        rotate: bool,
        noop_close: bool,
    ) -> Self {
        self.sink(Sink::writer(writer, rotate, noop_close))
    }

    /// Write to the given sink.
    pub fn sink(mut self, sink: Sink) -> Self {
        self.sink = Some(SinkSpec::Sink(sink));
        self
    }

    /// Write to stdout. This is the default.
    pub fn stdout(self) -> Self {
        self.sink(Sink::stdout())
    }

    /// Write to stderr.
    pub fn stderr(self) -> Self {
        self.sink(Sink::stderr())
    }

    /// Drop every record.
    pub fn discard(self) -> Self {
        self.sink(Sink::discard())
    }

    /// Build the [`Logger`].
    ///
    /// # Errors
    ///
    /// Return an error if the configured file cannot be created or opened.
    pub fn build(mut self) -> Result<Logger, Error> {
        let sink = match self.sink.take() {
            None => Sink::stdout(),
            Some(SinkSpec::Sink(sink)) => sink,
            Some(SinkSpec::File { root, topic, name }) => Sink::file(root, topic, name)?,
        };
        Ok(self.build_with_sink(sink))
    }

    pub(crate) fn build_with_sink(self, sink: Sink) -> Logger {
        let Self {
            level,
            max_file_size,
            max_sync_size,
            max_record_size,
            sync_interval,
            direct,
            trap,
            hooks,
            buffers,
            selector,
            format,
            sink: _,
        } = self;

        let controller = Controller::new(sink, max_file_size, format.time_format.clone(), trap);
        let pool = BufferPool::new(buffers, max_record_size, max_sync_size, selector);
        let pipeline = Pipeline::new(pool, controller, format);
        Logger::new(level, direct, Hooks::new(hooks), pipeline, sync_interval)
    }
}
