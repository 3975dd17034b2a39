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

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::Error;
use crate::Level;
use crate::Meta;
use crate::RecordFormat;
use crate::buffer::BufferPool;
use crate::flusher::FlusherGuard;
use crate::hook;
use crate::hook::Hooks;
use crate::sink::Controller;
use crate::sink::Sink;

/// The buffers, the sink controller and the record layout shared by a logger and its flusher.
#[derive(Debug)]
pub(crate) struct Pipeline {
    pub(crate) pool: BufferPool,
    pub(crate) controller: Controller,
    pub(crate) format: RecordFormat,
}

impl Pipeline {
    pub(crate) fn new(pool: BufferPool, controller: Controller, format: RecordFormat) -> Self {
        Self {
            pool,
            controller,
            format,
        }
    }

    /// Drain every buffer pair into the sink.
    pub(crate) fn flush(&self) {
        self.controller
            .flush_from(self.pool.pairs().iter().map(|pair| pair.sync()));
    }
}

/// A structured logger writing delimited records through a pool of buffers.
///
/// Cloning is cheap; clones share the same buffers and sink. The background flusher stops,
/// and whatever is still buffered is written, when the last clone is dropped.
///
/// ```
/// use batchlog::Logger;
/// use batchlog::encode;
///
/// let logger = Logger::builder().discard().build().unwrap();
/// logger.info("user signed in", &[encode::int("uid", 12)]);
/// logger.sync();
/// ```
#[derive(Debug, Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    level: AtomicU8,
    direct: bool,
    hooks: Hooks,
    pipeline: Arc<Pipeline>,
    flusher: Mutex<Option<FlusherGuard>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let flusher = self
            .flusher
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(mut flusher) = flusher.take() {
            flusher.stop();
        }
        self.pipeline.flush();
    }
}

impl Logger {
    /// Create a [`LoggerBuilder`](crate::LoggerBuilder) with default settings.
    pub fn builder() -> crate::LoggerBuilder {
        crate::LoggerBuilder::new()
    }

    pub(crate) fn new(
        level: Level,
        direct: bool,
        hooks: Hooks,
        pipeline: Pipeline,
        interval: Duration,
    ) -> Self {
        let pipeline = Arc::new(pipeline);

        // every call flushes inline in direct mode, so the timer would have nothing to do
        let flusher = if direct {
            None
        } else {
            match FlusherGuard::spawn(pipeline.clone(), interval) {
                Ok(flusher) => Some(flusher),
                Err(err) => {
                    pipeline.controller.trap(err);
                    None
                }
            }
        };

        let inner = Inner {
            level: AtomicU8::new(level as u8),
            direct: direct || flusher.is_none(),
            hooks,
            pipeline,
            flusher: Mutex::new(flusher),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// The minimum level of records this logger writes.
    pub fn level(&self) -> Level {
        Level::from_u8(self.inner.level.load(Ordering::Relaxed))
    }

    /// Change the minimum level.
    pub fn set_level(&self, level: Level) {
        self.inner.level.store(level as u8, Ordering::Relaxed);
    }

    /// Whether a record at `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Register a hook whose field is appended to every record after the message.
    ///
    /// Hooks run on every call, in registration order, after the hooks registered through
    /// [`global::hook`](crate::global::hook).
    pub fn hook(&self, hook: impl Fn() -> Meta + Send + Sync + 'static) {
        self.inner.hooks.push(hook::boxed(hook));
    }

    /// Write a record at `level`.
    pub fn log(&self, level: Level, message: &str, fields: &[Meta]) {
        if !self.enabled(level) {
            return;
        }

        let mut hooks = hook::GLOBAL_HOOKS.fields();
        self.inner.hooks.append_fields(&mut hooks);
        let pipeline = &self.inner.pipeline;
        let pair = pipeline.pool.select();
        let crossed = pair
            .record()
            .write(level, message, &hooks, fields, &pipeline.format, |record| {
                pair.sync().write(record)
            });
        if crossed || self.inner.direct {
            pipeline.controller.flush_from([pair.sync()]);
        }
    }

    /// Write a record at [`Level::Debug`].
    pub fn debug(&self, message: &str, fields: &[Meta]) {
        self.log(Level::Debug, message, fields);
    }

    /// Write a record at [`Level::Info`].
    pub fn info(&self, message: &str, fields: &[Meta]) {
        self.log(Level::Info, message, fields);
    }

    /// Write a record at [`Level::Warn`].
    pub fn warn(&self, message: &str, fields: &[Meta]) {
        self.log(Level::Warn, message, fields);
    }

    /// Write a record at [`Level::Error`].
    pub fn error(&self, message: &str, fields: &[Meta]) {
        self.log(Level::Error, message, fields);
    }

    /// Write a record at [`Level::Panic`], with the current stack trace attached.
    ///
    /// This does not unwind; the caller decides what happens next.
    pub fn panic(&self, message: &str, fields: &[Meta]) {
        self.log(Level::Panic, message, fields);
    }

    /// Write a record at [`Level::Fatal`], drain and close the sink, then exit the process
    /// with status 1.
    pub fn fatal(&self, message: &str, fields: &[Meta]) -> ! {
        self.log(Level::Fatal, message, fields);
        self.sync();
        std::process::exit(1)
    }

    /// Write everything buffered to the sink without closing it.
    pub fn flush(&self) {
        self.inner.pipeline.flush();
    }

    /// Write everything buffered to the sink and close it.
    ///
    /// Records logged afterwards are reported to the trap and dropped, unless the sink is
    /// one whose close is a no-op, like stdout.
    pub fn sync(&self) {
        self.flush();
        self.inner.pipeline.controller.close();
    }

    /// Stop the background flusher, then [`sync`](Logger::sync).
    pub fn shutdown(&self) {
        let flusher = self
            .inner
            .flusher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut flusher) = flusher {
            flusher.stop();
        }
        self.sync();
    }

    /// Drain buffered records into the current sink, then switch to `sink`.
    pub fn replace_sink(&self, sink: Sink) {
        self.flush();
        self.inner.pipeline.controller.replace(sink);
    }

    /// Switch to the file `root/topic/name`, creating directories as needed.
    pub fn set_file(
        &self,
        root: impl AsRef<Path>,
        topic: impl AsRef<Path>,
        name: impl AsRef<Path>,
    ) -> Result<(), Error> {
        let sink = Sink::file(root, topic, name)?;
        self.replace_sink(sink);
        Ok(())
    }
}
