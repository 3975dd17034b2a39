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

use std::backtrace::Backtrace;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::Level;
use crate::Meta;
use crate::RecordFormat;

// `}` and the trailing newline.
const RECORD_TAIL: usize = 2;

/// A single-slot scratch buffer that serializes one log call into one record.
///
/// Each call holds the buffer lock from the opening brace until the finished bytes have been
/// handed to the consumer. The buffer is cleared before the lock is released.
#[derive(Debug)]
pub struct RecordBuffer {
    buf: Mutex<Vec<u8>>,
    max_size: usize,
}

impl RecordBuffer {
    /// Create a record buffer. Custom fields that would make a record longer than
    /// `max_size` bytes are dropped.
    pub fn new(max_size: usize) -> Self {
        Self {
            buf: Mutex::new(Vec::with_capacity(max_size.min(4096))),
            max_size,
        }
    }

    /// Serialize a record and pass the finished bytes to `consume`.
    ///
    /// The common fields (time, level, message and hooks) are always written. Custom fields
    /// follow in order until one no longer fits the record budget; it and every field after
    /// it are dropped.
    pub fn write<R>(
        &self,
        level: Level,
        message: &str,
        hooks: &[Meta],
        fields: &[Meta],
        format: &RecordFormat,
        consume: impl FnOnce(&[u8]) -> R,
    ) -> R {
        let mut buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        // a consumer that panicked leaves the previous record behind
        buf.clear();

        buf.push(b'{');
        if let Some(time) = format.time_meta() {
            put_field(&mut buf, &time);
        }
        put_text(&mut buf, &format.level_key, level.name().as_bytes());
        put_text(&mut buf, &format.message_key, message.as_bytes());
        for hook in hooks {
            put_field(&mut buf, hook);
        }

        for field in fields {
            if buf.len() + 1 + field.encoded_len() + RECORD_TAIL > self.max_size {
                break;
            }
            put_field(&mut buf, field);
        }

        if level == Level::Panic {
            put_text(&mut buf, &format.stack_key, stack_trace().as_bytes());
        }
        buf.extend_from_slice(b"}\n");

        let result = consume(&buf);
        buf.clear();
        result
    }
}

fn put_field(buf: &mut Vec<u8>, meta: &Meta) {
    put_raw(buf, meta.key(), meta.value(), meta.needs_quoting());
}

fn put_text(buf: &mut Vec<u8>, key: &str, value: &[u8]) {
    put_raw(buf, key, value, true);
}

fn put_raw(buf: &mut Vec<u8>, key: &str, value: &[u8], quoted: bool) {
    if buf.len() > 1 {
        buf.push(b',');
    }
    buf.push(b'"');
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(b"\":");
    if quoted {
        buf.push(b'"');
        buf.extend_from_slice(value);
        buf.push(b'"');
    } else {
        buf.extend_from_slice(value);
    }
}

/// The current call stack as a single line, frames joined with `->`.
fn stack_trace() -> String {
    Backtrace::force_capture()
        .to_string()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.replace('"', "'"))
        .collect::<Vec<_>>()
        .join("->")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;

    fn no_time() -> RecordFormat {
        RecordFormat::default().time_field(false)
    }

    fn record(buffer: &RecordBuffer, level: Level, msg: &str, fields: &[Meta]) -> String {
        buffer.write(level, msg, &[], fields, &no_time(), |bytes| {
            String::from_utf8(bytes.to_vec()).unwrap()
        })
    }

    #[test]
    fn test_record_layout() {
        let buffer = RecordBuffer::new(10 * 1024);
        let fields = [encode::int("uid", 12), encode::string("detail", "x")];
        assert_eq!(
            record(&buffer, Level::Info, "infomsg", &fields),
            "{\"level\":\"info\",\"msg\":\"infomsg\",\"uid\":12,\"detail\":\"x\"}\n"
        );
    }

    #[test]
    fn test_hooks_come_before_custom_fields() {
        let buffer = RecordBuffer::new(1024);
        let hooks = [encode::string("host", "a1")];
        let fields = [encode::bool("ok", true)];
        let out = buffer.write(Level::Warn, "m", &hooks, &fields, &no_time(), |bytes| {
            String::from_utf8(bytes.to_vec()).unwrap()
        });
        assert_eq!(
            out,
            "{\"level\":\"warn\",\"msg\":\"m\",\"host\":\"a1\",\"ok\":true}\n"
        );
    }

    #[test]
    fn test_buffer_is_cleared_after_consume() {
        let buffer = RecordBuffer::new(1024);
        let first = record(&buffer, Level::Debug, "one", &[]);
        let second = record(&buffer, Level::Debug, "two", &[]);
        assert_eq!(first, "{\"level\":\"debug\",\"msg\":\"one\"}\n");
        assert_eq!(second, "{\"level\":\"debug\",\"msg\":\"two\"}\n");
        assert!(buffer.buf.lock().unwrap().is_empty());
    }

    #[test]
    fn test_fields_beyond_budget_are_dropped() {
        // {"level":"info","msg":"m","a":1} plus the newline is exactly 33 bytes.
        let buffer = RecordBuffer::new(33);
        let fields = [
            encode::int("a", 1),
            encode::string("b", "does not fit"),
            encode::int("c", 3),
        ];
        assert_eq!(
            record(&buffer, Level::Info, "m", &fields),
            "{\"level\":\"info\",\"msg\":\"m\",\"a\":1}\n"
        );

        let buffer = RecordBuffer::new(32);
        assert_eq!(
            record(&buffer, Level::Info, "m", &fields),
            "{\"level\":\"info\",\"msg\":\"m\"}\n"
        );
    }

    #[test]
    fn test_stack_only_at_panic_level() {
        let buffer = RecordBuffer::new(1 << 20);
        let out = record(&buffer, Level::Panic, "boom", &[]);
        assert!(out.starts_with("{\"level\":\"panic\",\"msg\":\"boom\",\"stack\":\""));
        assert!(out.ends_with("\"}\n"));
        assert_eq!(out.matches('\n').count(), 1);

        let out = record(&buffer, Level::Error, "boom", &[]);
        assert!(!out.contains("\"stack\""));
    }

    #[test]
    fn test_time_field_first() {
        let buffer = RecordBuffer::new(1024);
        let format = RecordFormat::default().time_format(crate::TimeFormat::Unix);
        let out = buffer.write(Level::NoLevel, "m", &[], &[], &format, |bytes| {
            String::from_utf8(bytes.to_vec()).unwrap()
        });
        assert!(out.starts_with("{\"time\":1"));
        assert!(out.ends_with(",\"level\":\"\",\"msg\":\"m\"}\n"));
    }
}
