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

//! Layout of the common fields of a record.

use std::convert::Infallible;
use std::str::FromStr;

use jiff::Zoned;

use crate::encode;
use crate::encode::Meta;

const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RENAME_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// How the `time` field of a record is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeFormat {
    /// Seconds since the Unix epoch, as a bare integer.
    Unix,
    /// Milliseconds since the Unix epoch, as a bare integer.
    UnixMilli,
    /// Microseconds since the Unix epoch, as a bare integer.
    UnixMicro,
    /// Nanoseconds since the Unix epoch, as a bare integer.
    UnixNano,
    /// A quoted local time rendered with a `strftime`-style format string.
    Custom(String),
}

impl Default for TimeFormat {
    fn default() -> Self {
        TimeFormat::Custom(DEFAULT_TIME_FORMAT.to_string())
    }
}

impl FromStr for TimeFormat {
    type Err = Infallible;

    /// Parse `unix`, `unixmilli`, `unixmicro` or `unixnano`; anything else is taken as a
    /// custom format string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "unix" => TimeFormat::Unix,
            "unixmilli" => TimeFormat::UnixMilli,
            "unixmicro" => TimeFormat::UnixMicro,
            "unixnano" => TimeFormat::UnixNano,
            custom => TimeFormat::Custom(custom.to_string()),
        })
    }
}

impl TimeFormat {
    /// Whether the format renders an epoch integer.
    pub fn is_epoch(&self) -> bool {
        !matches!(self, TimeFormat::Custom(_))
    }

    pub(crate) fn meta_at(&self, key: &str, now: &Zoned) -> Meta {
        let ts = now.timestamp();
        match self {
            TimeFormat::Unix => encode::int(key, ts.as_second()),
            TimeFormat::UnixMilli => encode::int(key, ts.as_millisecond()),
            TimeFormat::UnixMicro => encode::int(key, ts.as_microsecond()),
            TimeFormat::UnixNano => Meta::new(key, ts.as_nanosecond().to_string(), false),
            TimeFormat::Custom(format) => encode::string(key, strftime(format, now)),
        }
    }

    /// The timestamp used in the name of a rotated file.
    ///
    /// Epoch formats use seconds; custom formats use a compact form without characters that
    /// are awkward in file names.
    pub(crate) fn rename_stamp(&self, t: &Zoned) -> String {
        if self.is_epoch() {
            t.timestamp().as_second().to_string()
        } else {
            t.strftime(RENAME_TIME_FORMAT).to_string()
        }
    }
}

fn strftime(format: &str, now: &Zoned) -> String {
    jiff::fmt::strtime::format(format, now)
        .unwrap_or_else(|_| now.strftime(DEFAULT_TIME_FORMAT).to_string())
}

/// The names and presence of the fields every record starts with.
///
/// ```
/// use batchlog::RecordFormat;
/// use batchlog::TimeFormat;
///
/// let format = RecordFormat::default()
///     .time_format(TimeFormat::UnixMilli)
///     .message_key("message");
/// ```
#[derive(Debug, Clone)]
pub struct RecordFormat {
    pub(crate) time_enabled: bool,
    pub(crate) time_key: String,
    pub(crate) time_format: TimeFormat,
    pub(crate) level_key: String,
    pub(crate) message_key: String,
    pub(crate) stack_key: String,
}

impl Default for RecordFormat {
    fn default() -> Self {
        Self {
            time_enabled: true,
            time_key: "time".to_string(),
            time_format: TimeFormat::default(),
            level_key: "level".to_string(),
            message_key: "msg".to_string(),
            stack_key: "stack".to_string(),
        }
    }
}

impl RecordFormat {
    /// Enable or disable the time field.
    #[must_use]
    pub fn time_field(mut self, enabled: bool) -> Self {
        self.time_enabled = enabled;
        self
    }

    /// Set the key of the time field. Default to `time`.
    #[must_use]
    pub fn time_key(mut self, key: impl Into<String>) -> Self {
        self.time_key = key.into();
        self
    }

    /// Set how the time field is rendered.
    #[must_use]
    pub fn time_format(mut self, format: TimeFormat) -> Self {
        self.time_format = format;
        self
    }

    /// Set the key of the level field. Default to `level`.
    #[must_use]
    pub fn level_key(mut self, key: impl Into<String>) -> Self {
        self.level_key = key.into();
        self
    }

    /// Set the key of the message field. Default to `msg`.
    #[must_use]
    pub fn message_key(mut self, key: impl Into<String>) -> Self {
        self.message_key = key.into();
        self
    }

    /// Set the key of the stack trace field. Default to `stack`.
    #[must_use]
    pub fn stack_key(mut self, key: impl Into<String>) -> Self {
        self.stack_key = key.into();
        self
    }

    pub(crate) fn time_meta(&self) -> Option<Meta> {
        if !self.time_enabled {
            return None;
        }
        Some(self.time_format.meta_at(&self.time_key, &Zoned::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> Zoned {
        "2024-08-10T17:12:52.123456789[UTC]".parse().unwrap()
    }

    fn value(meta: &Meta) -> &str {
        std::str::from_utf8(meta.value()).unwrap()
    }

    #[test]
    fn test_epoch_formats() {
        let now = at();
        let meta = TimeFormat::Unix.meta_at("time", &now);
        assert_eq!(value(&meta), "1723309972");
        assert!(!meta.needs_quoting());
        assert_eq!(
            value(&TimeFormat::UnixMilli.meta_at("time", &now)),
            "1723309972123"
        );
        assert_eq!(
            value(&TimeFormat::UnixMicro.meta_at("time", &now)),
            "1723309972123456"
        );
        assert_eq!(
            value(&TimeFormat::UnixNano.meta_at("time", &now)),
            "1723309972123456789"
        );
    }

    #[test]
    fn test_custom_format() {
        let now = at();
        let meta = TimeFormat::default().meta_at("ts", &now);
        assert_eq!(meta.key(), "ts");
        assert_eq!(value(&meta), "2024-08-10 17:12:52");
        assert!(meta.needs_quoting());

        let meta = TimeFormat::Custom("%H:%M".to_string()).meta_at("ts", &now);
        assert_eq!(value(&meta), "17:12");
    }

    #[test]
    fn test_parse_time_format() {
        assert_eq!("unix".parse::<TimeFormat>().unwrap(), TimeFormat::Unix);
        assert_eq!("unixnano".parse::<TimeFormat>().unwrap(), TimeFormat::UnixNano);
        assert_eq!(
            "%Y".parse::<TimeFormat>().unwrap(),
            TimeFormat::Custom("%Y".to_string())
        );
    }

    #[test]
    fn test_rename_stamp() {
        let now = at();
        assert_eq!(TimeFormat::Unix.rename_stamp(&now), "1723309972");
        assert_eq!(TimeFormat::default().rename_stamp(&now), "20240810171252");
    }

    #[test]
    fn test_disabled_time_field() {
        let format = RecordFormat::default().time_field(false);
        assert!(format.time_meta().is_none());
        let format = RecordFormat::default().time_format(TimeFormat::Unix);
        assert_eq!(format.time_meta().unwrap().key(), "time");
    }
}
