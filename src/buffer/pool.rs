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

use std::hash::BuildHasher;
use std::hash::RandomState;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use rand::Rng;

use crate::buffer::RecordBuffer;
use crate::buffer::SyncBuffer;

/// How a log call picks the buffer pair it writes through.
#[derive(Debug, Default)]
#[non_exhaustive]
pub enum Selector {
    /// A uniformly random pair per call.
    #[default]
    Random,
    /// Pairs in turn.
    RoundRobin,
    /// A pair derived from the calling thread, so one thread always uses the same pair.
    PerThread,
}

/// A record buffer and the sync buffer its records are appended to.
#[derive(Debug)]
pub struct BufferPair {
    pub(crate) record: RecordBuffer,
    pub(crate) sync: SyncBuffer,
}

impl BufferPair {
    /// The record buffer of this pair.
    pub fn record(&self) -> &RecordBuffer {
        &self.record
    }

    /// The sync buffer of this pair.
    pub fn sync(&self) -> &SyncBuffer {
        &self.sync
    }
}

/// A fixed set of buffer pairs.
///
/// Records written through the same pair keep their order and are never split. There is no
/// ordering between pairs: two records from different pairs may reach the sink in either order.
#[derive(Debug)]
pub struct BufferPool {
    pairs: Vec<BufferPair>,
    selector: Selector,
    next: AtomicUsize,
    hasher: RandomState,
}

impl BufferPool {
    /// Create a pool of `n` pairs. A pool always holds at least one pair.
    pub fn new(n: usize, max_record_size: usize, max_sync_size: usize, selector: Selector) -> Self {
        let pairs = (0..n.max(1))
            .map(|_| BufferPair {
                record: RecordBuffer::new(max_record_size),
                sync: SyncBuffer::new(max_sync_size),
            })
            .collect();
        Self {
            pairs,
            selector,
            next: AtomicUsize::new(0),
            hasher: RandomState::new(),
        }
    }

    /// Pick the pair for the current call.
    pub fn select(&self) -> &BufferPair {
        let n = self.pairs.len();
        if n == 1 {
            return &self.pairs[0];
        }
        let index = match self.selector {
            Selector::Random => rand::rng().random_range(0..n),
            Selector::RoundRobin => self.next.fetch_add(1, Ordering::Relaxed) % n,
            Selector::PerThread => {
                let id = std::thread::current().id();
                (self.hasher.hash_one(id) as usize) % n
            }
        };
        &self.pairs[index]
    }

    /// All pairs, in creation order.
    pub fn pairs(&self) -> &[BufferPair] {
        &self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(pool: &BufferPool, pair: &BufferPair) -> usize {
        pool.pairs()
            .iter()
            .position(|p| std::ptr::eq(p, pair))
            .unwrap()
    }

    #[test]
    fn test_pool_never_empty() {
        let pool = BufferPool::new(0, 128, 128, Selector::Random);
        assert_eq!(pool.pairs().len(), 1);
    }

    #[test]
    fn test_round_robin() {
        let pool = BufferPool::new(3, 128, 128, Selector::RoundRobin);
        let picked = (0..6)
            .map(|_| index_of(&pool, pool.select()))
            .collect::<Vec<_>>();
        assert_eq!(picked, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_random_stays_in_range() {
        let pool = BufferPool::new(4, 128, 128, Selector::Random);
        for _ in 0..100 {
            assert!(index_of(&pool, pool.select()) < 4);
        }
    }

    #[test]
    fn test_per_thread_is_stable() {
        let pool = BufferPool::new(8, 128, 128, Selector::PerThread);
        let first = index_of(&pool, pool.select());
        for _ in 0..10 {
            assert_eq!(index_of(&pool, pool.select()), first);
        }
    }
}
