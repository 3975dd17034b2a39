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

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use batchlog::Logger;
use batchlog::RecordFormat;
use batchlog::buffer::Selector;
use batchlog::encode;
use rand::Rng;
use rand::distr::Alphanumeric;
use tempfile::TempDir;

const THREADS: usize = 8;
const RECORDS: usize = 500;

fn payload() -> String {
    let len = rand::rng().random_range(1..200);
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn run(logger: Logger) {
    let logger = Arc::new(logger);
    let handles = (0..THREADS)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for seq in 0..RECORDS {
                    logger.info(
                        "concurrent",
                        &[
                            encode::uint("thread", t as u64),
                            encode::uint("seq", seq as u64),
                            encode::string("payload", payload()),
                        ],
                    );
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.sync();
}

/// Parse `"thread":T,"seq":S` out of every record and check each is whole.
fn check(content: &str, per_thread_order: bool) {
    assert!(content.ends_with('\n'));
    let lines = content.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), THREADS * RECORDS);

    let mut last_seq = HashMap::new();
    let mut seen = vec![0usize; THREADS];
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["level"], "info");
        assert_eq!(value["msg"], "concurrent");
        let thread = value["thread"].as_u64().unwrap() as usize;
        let seq = value["seq"].as_u64().unwrap();
        seen[thread] += 1;

        if per_thread_order {
            if let Some(last) = last_seq.insert(thread, seq) {
                assert!(seq > last, "thread {thread}: {seq} after {last}");
            }
        }
    }
    assert!(seen.iter().all(|n| *n == RECORDS));
}

#[test]
fn test_direct_mode_under_contention() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::builder()
        .file(dir.path(), "", "app.log")
        .format(RecordFormat::default().time_field(false))
        .buffers(4)
        .build()
        .unwrap();
    run(logger);

    let content = fs::read_to_string(dir.path().join("app.log")).unwrap();
    check(&content, true);
}

#[test]
fn test_buffered_mode_under_contention() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::builder()
        .file(dir.path(), "", "app.log")
        .format(RecordFormat::default().time_field(false))
        .direct(false)
        .sync_interval(Duration::from_millis(5))
        .max_sync_size(4096)
        .buffers(4)
        .selector(Selector::PerThread)
        .build()
        .unwrap();
    run(logger);

    let content = fs::read_to_string(dir.path().join("app.log")).unwrap();
    check(&content, true);
}

#[test]
fn test_rotation_under_contention() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::builder()
        .file(dir.path(), "", "app.log")
        .format(RecordFormat::default().time_field(false))
        .direct(false)
        .max_sync_size(8192)
        .max_file_size(64 * 1024)
        .buffers(4)
        .selector(Selector::RoundRobin)
        .build()
        .unwrap();
    run(logger);

    let mut paths = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect::<Vec<_>>();
    assert!(paths.len() > 1);
    paths.sort();

    let content = paths
        .iter()
        .map(|path| fs::read_to_string(path).unwrap())
        .collect::<String>();
    check(&content, false);
}
