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

//! Field encoders turning a key and a typed value into a [`Meta`].
//!
//! Every encoder is infallible. Values that cannot be rendered degrade to `null` (absent
//! scalars and objects) or `[]` (absent arrays) instead of raising an error.
//!
//! ```
//! use batchlog::encode;
//!
//! let uid = encode::int("uid", 12);
//! assert_eq!(uid.value(), b"12");
//! assert!(!uid.needs_quoting());
//!
//! let detail = encode::string("detail", "x");
//! assert_eq!(detail.value(), b"x");
//! assert!(detail.needs_quoting());
//! ```

use serde::Serialize;

pub use self::value::ToValue;
pub use self::value::Value;

mod value;

/// One encoded field: the key, the value already rendered as text, and whether the value
/// must be wrapped in quotes when embedded in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    key: String,
    value: Vec<u8>,
    needs_quoting: bool,
}

impl Meta {
    /// Create a field from its parts.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>, needs_quoting: bool) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            needs_quoting,
        }
    }

    /// The key of the field.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The rendered value, without surrounding quotes.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Whether the value is quoted in the record.
    pub fn needs_quoting(&self) -> bool {
        self.needs_quoting
    }

    /// The number of bytes `"key":value` takes in a record, quotes included.
    pub(crate) fn encoded_len(&self) -> usize {
        let quotes = if self.needs_quoting { 2 } else { 0 };
        self.key.len() + 3 + self.value.len() + quotes
    }

    fn from_value(key: impl Into<String>, value: &Value) -> Self {
        let mut rendered = vec![];
        value.render(&mut rendered);
        Meta::new(key, rendered, value.needs_quoting())
    }
}

/// Encode a signed integer.
pub fn int(key: impl Into<String>, n: impl Into<i64>) -> Meta {
    let n: i64 = n.into();
    Meta::new(key, n.to_string(), false)
}

/// Encode an unsigned integer.
pub fn uint(key: impl Into<String>, n: impl Into<u64>) -> Meta {
    let n: u64 = n.into();
    Meta::new(key, n.to_string(), false)
}

/// Encode a float with five significant digits.
pub fn float(key: impl Into<String>, n: impl Into<f64>) -> Meta {
    let mut rendered = vec![];
    value::format_float(n.into(), &mut rendered);
    Meta::new(key, rendered, false)
}

/// Encode a boolean as `true` or `false`.
pub fn bool(key: impl Into<String>, b: bool) -> Meta {
    Meta::new(key, if b { "true" } else { "false" }, false)
}

/// Encode a string. The bytes pass through unchanged and are quoted in the record.
pub fn string(key: impl Into<String>, s: impl AsRef<str>) -> Meta {
    Meta::new(key, s.as_ref().as_bytes(), true)
}

/// Encode a byte blob. Behaves like [`string`].
pub fn bytes(key: impl Into<String>, b: impl AsRef<[u8]>) -> Meta {
    Meta::new(key, b.as_ref(), true)
}

/// Encode an explicit `null`.
pub fn null(key: impl Into<String>) -> Meta {
    Meta::new(key, "null", false)
}

/// Encode an optional value: `None` renders as `null`, never as a zero value.
pub fn optional<T: ToValue>(key: impl Into<String>, v: Option<T>) -> Meta {
    any(key, &v)
}

/// Encode a slice of signed integers as `[v0,v1,...]`.
pub fn ints<T: Copy + Into<i64>>(key: impl Into<String>, items: &[T]) -> Meta {
    join_array(key, items.iter().map(|n| Into::<i64>::into(*n).to_string().into_bytes()))
}

/// Encode a slice of unsigned integers as `[v0,v1,...]`.
pub fn uints<T: Copy + Into<u64>>(key: impl Into<String>, items: &[T]) -> Meta {
    join_array(key, items.iter().map(|n| Into::<u64>::into(*n).to_string().into_bytes()))
}

/// Encode a slice of floats as `[v0,v1,...]`.
pub fn floats<T: Copy + Into<f64>>(key: impl Into<String>, items: &[T]) -> Meta {
    join_array(
        key,
        items.iter().map(|n| {
            let mut rendered = vec![];
            value::format_float((*n).into(), &mut rendered);
            rendered
        }),
    )
}

/// Encode a slice of booleans as `[true,false,...]`.
pub fn bools(key: impl Into<String>, items: &[bool]) -> Meta {
    join_array(
        key,
        items.iter().map(|b| if *b { b"true".to_vec() } else { b"false".to_vec() }),
    )
}

/// Encode a slice of strings as `["v0","v1",...]`.
pub fn strings<S: AsRef<str>>(key: impl Into<String>, items: &[S]) -> Meta {
    join_array(
        key,
        items.iter().map(|s| {
            let s = s.as_ref();
            let mut quoted = Vec::with_capacity(s.len() + 2);
            quoted.push(b'"');
            quoted.extend_from_slice(s.as_bytes());
            quoted.push(b'"');
            quoted
        }),
    )
}

/// Encode an optional array. An absent array renders as `[]`, like an empty one.
pub fn array<T: ToValue>(key: impl Into<String>, items: Option<&[T]>) -> Meta {
    match items {
        Some(items) => any(key, items),
        None => Meta::new(key, "[]", false),
    }
}

/// Encode any value implementing [`ToValue`].
pub fn any<T: ToValue + ?Sized>(key: impl Into<String>, v: &T) -> Meta {
    Meta::from_value(key, &v.to_value())
}

/// Encode a structured value through its `serde::Serialize` implementation.
///
/// Structs render their named members as `{"name":value,...}`. A value that fails to
/// serialize renders as `null`.
///
/// ```
/// use batchlog::encode;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User {
///     name: String,
///     age: u32,
/// }
///
/// let user = User { name: "tanzy".to_string(), age: 18 };
/// let meta = encode::object("user", &user);
/// assert_eq!(meta.value(), br#"{"name":"tanzy","age":18}"#);
/// ```
pub fn object<T: Serialize + ?Sized>(key: impl Into<String>, v: &T) -> Meta {
    let value = serde_json::to_value(v).map_or(Value::Null, Value::from_json);
    Meta::from_value(key, &value)
}

/// Encode an error's message under the `err` key.
pub fn err(e: &dyn std::error::Error) -> Meta {
    err_with_key("err", e)
}

/// Encode an error's message under the given key.
pub fn err_with_key(key: impl Into<String>, e: &dyn std::error::Error) -> Meta {
    Meta::new(key, e.to_string(), true)
}

fn join_array(key: impl Into<String>, items: impl Iterator<Item = Vec<u8>>) -> Meta {
    let mut rendered = vec![b'['];
    for (i, item) in items.enumerate() {
        if i > 0 {
            rendered.push(b',');
        }
        rendered.extend_from_slice(&item);
    }
    rendered.push(b']');
    Meta::new(key, rendered, false)
}
