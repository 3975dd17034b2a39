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

use std::mem;
use std::sync::Mutex;
use std::sync::PoisonError;

/// An accumulating buffer of finished records waiting to be flushed.
///
/// Appends and takes share one lock, so a flush only ever observes whole records.
#[derive(Debug)]
pub struct SyncBuffer {
    buf: Mutex<Vec<u8>>,
    max_size: usize,
}

impl SyncBuffer {
    /// Create a sync buffer that asks for a flush once it holds `max_size` bytes.
    pub fn new(max_size: usize) -> Self {
        Self {
            buf: Mutex::new(Vec::new()),
            max_size,
        }
    }

    /// Append bytes. Return `true` if the buffered length reached the flush threshold.
    pub fn write(&self, bytes: &[u8]) -> bool {
        let mut buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        buf.extend_from_slice(bytes);
        buf.len() >= self.max_size
    }

    /// Take everything buffered so far, leaving the buffer empty.
    pub fn flush_as_bytes(&self) -> Vec<u8> {
        let mut buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        mem::take(&mut *buf)
    }

    /// Exchange the buffered bytes with `spare`, which is cleared first.
    ///
    /// The buffer keeps the allocation of `spare`, so a flusher that hands the same vector
    /// back on every call stops allocating once both sides have grown.
    pub fn swap_into(&self, spare: &mut Vec<u8>) {
        spare.clear();
        let mut buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        mem::swap(&mut *buf, spare);
    }

    /// The number of bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
