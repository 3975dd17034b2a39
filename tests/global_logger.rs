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

use std::fs;

use batchlog::Logger;
use batchlog::RecordFormat;
use batchlog::encode;
use batchlog::global;
use tempfile::TempDir;

#[test]
fn test_global_logger_and_log_crate_bridge() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::builder()
        .file(dir.path(), "global", "app.log")
        .format(RecordFormat::default().time_field(false))
        .build()
        .unwrap();
    global::init(logger).unwrap();
    batchlog::bridge::setup_log_crate();

    let another = Logger::builder().discard().build().unwrap();
    assert!(global::init(another).is_err());

    global::hook(|| encode::string("service", "orders"));
    global::info("from global", &[encode::int("uid", 12)]);
    log::warn!(uid = 7, ok = true; "from log {}", "crate");
    log::trace!("trace maps to debug");
    global::shutdown();

    let content = fs::read_to_string(dir.path().join("global").join("app.log")).unwrap();
    assert_eq!(
        content,
        concat!(
            "{\"level\":\"info\",\"msg\":\"from global\",\"service\":\"orders\",\"uid\":12}\n",
            "{\"level\":\"warn\",\"msg\":\"from log crate\",\"service\":\"orders\",\"uid\":7,\"ok\":true}\n",
            "{\"level\":\"debug\",\"msg\":\"trace maps to debug\",\"service\":\"orders\"}\n",
        )
    );
}
