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

//! Batchlog is a lightweight structured logger that serializes each call into one compact,
//! delimited record and batches records before they reach the sink.
//!
//! # Overview
//!
//! A log call is checked against the minimum level, rendered into a record buffer, and
//! appended to a sync buffer. The sync buffer is written to the sink inline when it reaches
//! its size threshold or when direct mode is on; otherwise a background thread drains it at a
//! fixed interval. File sinks are renamed and reopened once they grow past a size limit.
//!
//! Records look like this:
//!
//! ```text
//! {"time":"2024-08-10 17:12:52","level":"info","msg":"infomsg","uid":12,"detail":"x"}
//! ```
//!
//! # Examples
//!
//! ```
//! use batchlog::Logger;
//! use batchlog::encode;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let logger = Logger::builder()
//!     .file(dir.path(), "topic", "app.log")
//!     .build()
//!     .unwrap();
//!
//! logger.info(
//!     "infomsg",
//!     &[encode::int("uid", 12), encode::string("detail", "x")],
//! );
//! logger.sync();
//! ```
//!
//! Forward the `log` crate into the default logger:
//!
//! ```
//! batchlog::bridge::setup_log_crate();
//!
//! log::info!(uid = 12; "This is an info message.");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod buffer;
pub mod encode;
pub mod global;
pub mod sink;
pub mod trap;

#[cfg(feature = "bridge-log")]
pub mod bridge;

mod clock;
mod error;
mod flusher;
mod format;
mod hook;
mod level;
mod logger;

pub use self::encode::Meta;
pub use self::error::Error;
pub use self::format::RecordFormat;
pub use self::format::TimeFormat;
pub use self::level::Level;
pub use self::logger::Logger;
pub use self::logger::LoggerBuilder;
pub use self::logger::builder;
pub use self::trap::Trap;
