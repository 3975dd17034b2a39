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

//! Hooks contribute fields computed fresh for every record.

use std::fmt;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::Meta;

pub(crate) type HookFn = dyn Fn() -> Meta + Send + Sync + 'static;

/// Hooks registered through [`crate::global::hook`]. Every logger runs them before its own.
pub(crate) static GLOBAL_HOOKS: Hooks = Hooks::empty();

/// An ordered list of hook callbacks.
#[derive(Default)]
pub(crate) struct Hooks {
    hooks: RwLock<Vec<Box<HookFn>>>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hooks {{ len: {} }}", self.read().len())
    }
}

impl Hooks {
    pub(crate) const fn empty() -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn new(hooks: Vec<Box<HookFn>>) -> Self {
        Self {
            hooks: RwLock::new(hooks),
        }
    }

    pub(crate) fn push(&self, hook: Box<HookFn>) {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }

    /// Run every hook in registration order.
    pub(crate) fn fields(&self) -> Vec<Meta> {
        let mut fields = vec![];
        self.append_fields(&mut fields);
        fields
    }

    /// Run every hook in registration order, appending to `fields`.
    pub(crate) fn append_fields(&self, fields: &mut Vec<Meta>) {
        fields.extend(self.read().iter().map(|hook| hook()));
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Box<HookFn>>> {
        self.hooks.read().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn boxed(hook: impl Fn() -> Meta + Send + Sync + 'static) -> Box<HookFn> {
    Box::new(hook)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicI64;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::encode;

    #[test]
    fn test_hooks_run_in_order_every_time() {
        let hooks = Hooks::default();
        let counter = Arc::new(AtomicI64::new(0));
        hooks.push(boxed(|| encode::string("host", "a1")));
        hooks.push(boxed(move || {
            encode::int("seq", counter.fetch_add(1, Ordering::Relaxed))
        }));

        let first = hooks.fields();
        assert_eq!(first[0].key(), "host");
        assert_eq!(first[1].value(), b"0");
        assert_eq!(hooks.fields()[1].value(), b"1");
    }
}
