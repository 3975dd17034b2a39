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

use std::cell::Cell;
use std::fs;
use std::io::Write;
use std::mem;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::Error;
use crate::TimeFormat;
use crate::Trap;
use crate::buffer::SyncBuffer;
use crate::clock::Clock;
use crate::sink::Sink;
use crate::sink::archive_path;
use crate::trap::DefaultTrap;

#[derive(Debug)]
enum SinkState {
    Open(Sink),
    // the file was closed for rotation and could not be opened again
    Reopen(PathBuf),
    Closed,
}

#[derive(Debug)]
struct State {
    sink: SinkState,
    clock: Clock,
    // swapped with sync buffers so neither side loses its capacity
    scratch: Vec<u8>,
}

thread_local! {
    static REPORTING: Cell<bool> = const { Cell::new(false) };
}

/// Owns the sink, writes flushed bytes into it and rotates files that grow past the size
/// limit.
///
/// Every write, rotation and close happens under one lock, so the byte count always matches
/// what reached the current file. Failures are handed to the [`Trap`] after the lock is
/// released and never returned.
#[derive(Debug)]
pub struct Controller {
    state: Mutex<State>,
    max_file_size: u64,
    time_format: TimeFormat,
    trap: Box<dyn Trap>,
}

impl Controller {
    /// Create a controller writing into `sink`.
    ///
    /// `time_format` decides how rotated files are stamped: epoch formats stamp seconds, others
    /// a compact local date and time.
    pub fn new(
        sink: Sink,
        max_file_size: u64,
        time_format: TimeFormat,
        trap: impl Into<Box<dyn Trap>>,
    ) -> Self {
        let ignored = ignored_rotation(&sink);
        let controller = Self {
            state: Mutex::new(State {
                sink: SinkState::Open(sink),
                clock: Clock::DefaultClock,
                scratch: vec![],
            }),
            max_file_size,
            time_format,
            trap: trap.into(),
        };
        controller.report(ignored.into_iter().collect());
        controller
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: Clock) -> Self {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clock = clock;
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write `bytes` into the sink and rotate if the file reached its size limit.
    ///
    /// Empty input does nothing at all.
    pub fn flush(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let mut errors = vec![];
        let mut state = self.lock();
        self.write_locked(&mut state, bytes, &mut errors);
        drop(state);
        self.report(errors);
    }

    /// Take the content of each buffer and write it, holding the sink lock across all of them.
    ///
    /// Taking the bytes under the same lock keeps the records of one buffer in order even
    /// when several threads flush it at once.
    pub fn flush_from<'a>(&self, buffers: impl IntoIterator<Item = &'a SyncBuffer>) {
        let mut errors = vec![];
        let mut state = self.lock();
        let mut scratch = mem::take(&mut state.scratch);
        for buffer in buffers {
            buffer.swap_into(&mut scratch);
            if !scratch.is_empty() {
                self.write_locked(&mut state, &scratch, &mut errors);
            }
        }
        scratch.clear();
        state.scratch = scratch;
        drop(state);
        self.report(errors);
    }

    /// Install a new sink. The previous one is flushed and dropped.
    pub fn replace(&self, sink: Sink) {
        let mut errors = ignored_rotation(&sink).into_iter().collect::<Vec<_>>();
        let mut state = self.lock();
        let old = mem::replace(&mut state.sink, SinkState::Open(sink));
        if let SinkState::Open(old) = old {
            close_sink(old, &mut errors);
        }
        drop(state);
        self.report(errors);
    }

    /// Flush and release the sink. Later writes are reported to the trap and dropped.
    ///
    /// Sinks marked as no-op close, such as stdout, are flushed and stay open.
    pub fn close(&self) {
        let mut errors = vec![];
        let mut state = self.lock();
        let noop_close = match &mut state.sink {
            SinkState::Open(sink) if sink.noop_close => {
                if let Err(err) = sink.writer.flush() {
                    errors.push(Error::new("failed to flush log sink").with_source(err));
                }
                true
            }
            _ => false,
        };
        if !noop_close {
            if let SinkState::Open(sink) = mem::replace(&mut state.sink, SinkState::Closed) {
                close_sink(sink, &mut errors);
            }
        }
        drop(state);
        self.report(errors);
    }

    /// Report an error through the trap of this controller.
    pub(crate) fn trap(&self, err: Error) {
        self.report(vec![err]);
    }

    /// Hand errors to the trap. Must be called without holding the state lock.
    ///
    /// A trap that logs through the same logger can fail again; those nested failures go to
    /// stderr instead of back into the trap.
    fn report(&self, errors: Vec<Error>) {
        if errors.is_empty() {
            return;
        }
        if REPORTING.with(Cell::get) {
            for err in errors {
                DefaultTrap::default().trap(&err);
            }
            return;
        }

        REPORTING.with(|reporting| reporting.set(true));
        for err in errors {
            self.trap.trap(&err);
        }
        REPORTING.with(|reporting| reporting.set(false));
    }

    /// The number of bytes in the current sink, counting what the file held when opened.
    pub fn written(&self) -> u64 {
        match &self.lock().sink {
            SinkState::Open(sink) => sink.written,
            SinkState::Reopen(_) | SinkState::Closed => 0,
        }
    }

    fn write_locked(&self, state: &mut State, bytes: &[u8], errors: &mut Vec<Error>) {
        if matches!(state.sink, SinkState::Reopen(_)) {
            reopen(state, errors);
        }

        let sink = match &mut state.sink {
            SinkState::Open(sink) => sink,
            SinkState::Reopen(path) => {
                errors.push(
                    Error::new("log file is unavailable, records dropped")
                        .with_context("path", path.display())
                        .with_context("bytes", bytes.len()),
                );
                return;
            }
            SinkState::Closed => {
                errors.push(
                    Error::new("log sink is closed, records dropped")
                        .with_context("bytes", bytes.len()),
                );
                return;
            }
        };

        match sink.writer.write_all(bytes).and_then(|()| sink.writer.flush()) {
            Ok(()) => sink.written += bytes.len() as u64,
            Err(err) => errors.push(Error::new("failed to write log records").with_source(err)),
        }

        if sink.should_rotate(self.max_file_size) {
            self.rotate(state, errors);
        }
    }

    fn rotate(&self, state: &mut State, errors: &mut Vec<Error>) {
        let now = state.clock.now();
        let (path, archive) = match &state.sink {
            SinkState::Open(Sink {
                file: Some(target), ..
            }) => {
                let archive = archive_path(
                    &target.path,
                    &self.time_format.rename_stamp(&target.created),
                    &self.time_format.rename_stamp(&now),
                );
                (target.path.clone(), archive)
            }
            _ => return,
        };

        let old = mem::replace(&mut state.sink, SinkState::Reopen(path.clone()));
        if let SinkState::Open(sink) = old {
            close_sink(sink, errors);
        }

        if let Err(err) = fs::rename(&path, &archive) {
            errors.push(
                Error::new("failed to rename log file")
                    .with_context("from", path.display())
                    .with_context("to", archive.display())
                    .with_source(err),
            );
        }
        reopen(state, errors);
    }
}

fn reopen(state: &mut State, errors: &mut Vec<Error>) {
    let SinkState::Reopen(path) = &state.sink else {
        return;
    };
    match Sink::open_file(path.clone(), state.clock.now()) {
        Ok(sink) => state.sink = SinkState::Open(sink),
        Err(err) => errors.push(err),
    }
}

fn close_sink(mut sink: Sink, errors: &mut Vec<Error>) {
    if let Err(err) = sink.writer.flush() {
        errors.push(Error::new("failed to flush log sink").with_source(err));
    }
    // the file handle is released when the sink drops
    drop(sink);
}

fn ignored_rotation(sink: &Sink) -> Option<Error> {
    if sink.rotate && sink.file.is_none() {
        Some(Error::new("only file sinks rotate, the rotate flag of this writer is ignored"))
    } else {
        None
    }
}
