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

//! The process-wide default logger.
//!
//! Until [`init`] installs a logger, the first use of the default logger creates one with
//! default settings writing to stdout.
//!
//! ```
//! use batchlog::encode;
//! use batchlog::global;
//!
//! let logger = batchlog::Logger::builder().discard().build().unwrap();
//! if global::init(logger).is_err() {
//!     eprintln!("the default logger was already set");
//! }
//!
//! global::info("ready", &[encode::string("mode", "demo")]);
//! global::shutdown();
//! ```

use std::sync::OnceLock;

use crate::Logger;
use crate::LoggerBuilder;
use crate::Meta;
use crate::hook::GLOBAL_HOOKS;
use crate::hook::boxed;
use crate::sink::Sink;

static DEFAULT_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Install `logger` as the default logger.
///
/// # Errors
///
/// Return the logger back if a default logger was already installed or created.
pub fn init(logger: Logger) -> Result<(), Logger> {
    DEFAULT_LOGGER.set(logger)
}

/// The default logger, created on first use if [`init`] was never called.
pub fn default_logger() -> &'static Logger {
    DEFAULT_LOGGER.get_or_init(|| LoggerBuilder::new().build_with_sink(Sink::stdout()))
}

/// Stop the background flusher of the default logger, drain it and close its sink.
///
/// Does nothing if the default logger was never used.
pub fn shutdown() {
    if let Some(logger) = DEFAULT_LOGGER.get() {
        logger.shutdown();
    }
}

/// Register a hook that runs for every logger in the process, not only the default one.
///
/// Process-wide hooks run before the hooks of each logger. Registering one does not create the
/// default logger, so [`init`] can still be called afterwards.
pub fn hook(hook: impl Fn() -> Meta + Send + Sync + 'static) {
    GLOBAL_HOOKS.push(boxed(hook));
}

/// Write a debug record through the default logger.
pub fn debug(message: &str, fields: &[Meta]) {
    default_logger().debug(message, fields);
}

/// Write an info record through the default logger.
pub fn info(message: &str, fields: &[Meta]) {
    default_logger().info(message, fields);
}

/// Write a warn record through the default logger.
pub fn warn(message: &str, fields: &[Meta]) {
    default_logger().warn(message, fields);
}

/// Write an error record through the default logger.
pub fn error(message: &str, fields: &[Meta]) {
    default_logger().error(message, fields);
}

/// Write a panic record, with a stack trace, through the default logger.
pub fn panic(message: &str, fields: &[Meta]) {
    default_logger().panic(message, fields);
}

/// Write a fatal record through the default logger, then exit the process.
pub fn fatal(message: &str, fields: &[Meta]) -> ! {
    default_logger().fatal(message, fields)
}
