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

//! The two-stage buffers between a log call and the sink.
//!
//! A [`RecordBuffer`] serializes one call into one record; a [`SyncBuffer`] accumulates
//! finished records until they are flushed. A [`BufferPool`] holds several such pairs so that
//! concurrent callers rarely contend on the same lock.

pub use self::pool::BufferPair;
pub use self::pool::BufferPool;
pub use self::pool::Selector;
pub use self::record::RecordBuffer;
pub use self::sync::SyncBuffer;

mod pool;
mod record;
mod sync;
