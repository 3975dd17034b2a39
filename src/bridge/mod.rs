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

//! Bridge the [`log`] crate facade into the default logger.

use crate::Level;
use crate::Logger;
use crate::Meta;
use crate::encode;
use crate::global::default_logger;

struct LogCrateLogger(());

impl log::Log for LogCrateLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        log::Log::enabled(default_logger(), metadata)
    }

    fn log(&self, record: &log::Record) {
        log::Log::log(default_logger(), record);
    }

    fn flush(&self) {
        log::Log::flush(default_logger());
    }
}

/// Set up the log crate global logger to forward records to the default logger.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
pub fn try_setup_log_crate() -> Result<(), log::SetLoggerError> {
    static LOGGER: LogCrateLogger = LogCrateLogger(());
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Set up the log crate global logger to forward records to the default logger.
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
pub fn setup_log_crate() {
    try_setup_log_crate().expect(
        "batchlog::bridge::setup_log_crate must be called before the log crate global logger initialized",
    )
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Logger::enabled(self, metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        let level = Level::from(record.level());
        if !Logger::enabled(self, level) {
            return;
        }

        struct KeyValueVisitor<'a> {
            fields: &'a mut Vec<Meta>,
        }

        impl<'kvs> log::kv::VisitSource<'kvs> for KeyValueVisitor<'_> {
            fn visit_pair(
                &mut self,
                key: log::kv::Key<'kvs>,
                value: log::kv::Value<'kvs>,
            ) -> Result<(), log::kv::Error> {
                self.fields.push(to_meta(key.as_str(), &value));
                Ok(())
            }
        }

        let mut fields = vec![];
        let mut visitor = KeyValueVisitor {
            fields: &mut fields,
        };
        // the visitor itself never fails
        let _ = record.key_values().visit(&mut visitor);

        match record.args().as_str() {
            Some(message) => Logger::log(self, level, message, &fields),
            None => Logger::log(self, level, &record.args().to_string(), &fields),
        }
    }

    fn flush(&self) {
        Logger::flush(self);
    }
}

fn to_meta(key: &str, value: &log::kv::Value) -> Meta {
    if let Some(b) = value.to_bool() {
        encode::bool(key, b)
    } else if let Some(n) = value.to_i64() {
        encode::int(key, n)
    } else if let Some(n) = value.to_u64() {
        encode::uint(key, n)
    } else if let Some(n) = value.to_f64() {
        encode::float(key, n)
    } else if let Some(s) = value.to_borrowed_str() {
        encode::string(key, s)
    } else {
        encode::string(key, value.to_string())
    }
}
