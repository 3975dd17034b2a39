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

//! Traps for errors raised while writing or rotating the sink.
//!
//! Logging must never fail audibly, so the flush path reports every failure to a [`Trap`]
//! instead of returning it to the code that issued the log call.

use std::fmt;

use crate::Error;

pub use self::default::DefaultTrap;

mod default;

/// An error handler for failures that cannot be returned to the caller.
pub trait Trap: fmt::Debug + Send + Sync + 'static {
    /// Handle an error raised on the logging path.
    fn trap(&self, err: &Error);
}

impl<T: Trap> From<T> for Box<dyn Trap> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

type TrapFunction = dyn Fn(&Error) + Send + Sync + 'static;

/// A trap that forwards errors to a closure.
///
/// ```
/// use batchlog::trap::FnTrap;
///
/// let trap = FnTrap::new(|err| eprintln!("log failure: {err}"));
/// ```
pub struct FnTrap {
    f: Box<TrapFunction>,
}

impl fmt::Debug for FnTrap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FnTrap {{ ... }}")
    }
}

impl FnTrap {
    /// Create a trap from the given closure.
    pub fn new(f: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        FnTrap { f: Box::new(f) }
    }
}

impl Trap for FnTrap {
    fn trap(&self, err: &Error) {
        (self.f)(err)
    }
}
