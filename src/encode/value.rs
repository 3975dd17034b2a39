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

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

/// Significant digits kept when rendering floats.
const FLOAT_PRECISION: usize = 5;

/// A loggable value.
///
/// This is the closed set of shapes a field value can take. Scalars render as bare tokens,
/// strings and byte blobs are wrapped in quotes when embedded in a record, and the container
/// variants render recursively.
///
/// * [`Value::Map`] holds entries keyed by any value. Keys that are not strings are rendered
///   with the scalar encoder and then quoted, so `{1: 18}` renders as `{"1":18}`.
/// * [`Value::Object`] holds named members of a record-like type, rendered in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value, rendered as `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    I64(i64),
    /// An unsigned integer.
    U64(u64),
    /// A float, rendered with five significant digits.
    F64(f64),
    /// A string, passed through as raw bytes.
    Str(String),
    /// A byte blob, treated like a string.
    Bytes(Vec<u8>),
    /// An ordered sequence.
    Array(Vec<Value>),
    /// Entries keyed by arbitrary values.
    Map(Vec<(Value, Value)>),
    /// Named members of a structured value.
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Build an [`Value::Object`] from named members.
    ///
    /// ```
    /// use batchlog::encode::ToValue;
    /// use batchlog::encode::Value;
    ///
    /// struct User {
    ///     name: String,
    ///     age: u32,
    /// }
    ///
    /// impl ToValue for User {
    ///     fn to_value(&self) -> Value {
    ///         Value::object([("name", self.name.to_value()), ("age", self.age.to_value())])
    ///     }
    /// }
    /// ```
    pub fn object<I, K>(members: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Whether the value must be wrapped in quotes when embedded in a record.
    pub fn needs_quoting(&self) -> bool {
        matches!(self, Value::Str(_) | Value::Bytes(_))
    }

    /// Render the bare form of the value: strings without their surrounding quotes.
    pub(crate) fn render(&self, out: &mut Vec<u8>) {
        match self {
            Value::Null => out.extend_from_slice(b"null"),
            Value::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
            Value::I64(n) => out.extend_from_slice(n.to_string().as_bytes()),
            Value::U64(n) => out.extend_from_slice(n.to_string().as_bytes()),
            Value::F64(n) => format_float(*n, out),
            Value::Str(s) => out.extend_from_slice(s.as_bytes()),
            Value::Bytes(b) => out.extend_from_slice(b),
            Value::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    item.render_nested(out);
                }
                out.push(b']');
            }
            Value::Map(entries) => {
                out.push(b'{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    out.push(b'"');
                    key.render(out);
                    out.push(b'"');
                    out.push(b':');
                    value.render_nested(out);
                }
                out.push(b'}');
            }
            Value::Object(members) => {
                out.push(b'{');
                for (i, (name, value)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    out.push(b'"');
                    out.extend_from_slice(name.as_bytes());
                    out.push(b'"');
                    out.push(b':');
                    value.render_nested(out);
                }
                out.push(b'}');
            }
        }
    }

    /// Render the value as an element of a container, quoting it if needed.
    fn render_nested(&self, out: &mut Vec<u8>) {
        if self.needs_quoting() {
            out.push(b'"');
            self.render(out);
            out.push(b'"');
        } else {
            self.render(out);
        }
    }

    /// Convert a JSON value produced by serde into a [`Value`].
    pub(crate) fn from_json(value: serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(n) = n.as_u64() {
                    Value::U64(n)
                } else if let Some(n) = n.as_i64() {
                    Value::I64(n)
                } else {
                    n.as_f64().map_or(Value::Null, Value::F64)
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(members) => Value::Object(
                members
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Render a float like `%g` with five significant digits.
///
/// Exponents below -4 or at least 5 switch to scientific notation (`1.2346e+05`); otherwise
/// the fixed form is used with trailing zeros removed (`1.01`, `64`). Non-finite floats render
/// as `null`.
pub(crate) fn format_float(n: f64, out: &mut Vec<u8>) {
    if !n.is_finite() {
        out.extend_from_slice(b"null");
        return;
    }
    if n == 0.0 {
        out.push(b'0');
        return;
    }

    // rounding to the precision first decides the exponent, e.g. 99999.9 becomes 1.0000e5
    let sci = format!("{:.*e}", FLOAT_PRECISION - 1, n);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        out.extend_from_slice(sci.as_bytes());
        return;
    };
    let exp = exp.parse::<i32>().unwrap_or(0);

    if exp < -4 || exp >= FLOAT_PRECISION as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        let mantissa = trim_fraction(mantissa);
        out.extend_from_slice(format!("{mantissa}e{sign}{:02}", exp.abs()).as_bytes());
    } else {
        let decimals = (FLOAT_PRECISION as i32 - 1 - exp) as usize;
        let fixed = format!("{n:.decimals$}");
        out.extend_from_slice(trim_fraction(&fixed).as_bytes());
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Conversion into a loggable [`Value`].
///
/// This is the extension point for structured types: implement it to log a type of your
/// own with [`any`](crate::encode::any). Types implementing `serde::Serialize` can be logged
/// with [`object`](crate::encode::object) instead.
pub trait ToValue {
    /// Convert `self` into a [`Value`].
    fn to_value(&self) -> Value;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::from_json(self.clone())
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! impl_to_value_for_signed {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::I64(*self as i64)
                }
            }
        )*
    };
}

macro_rules! impl_to_value_for_unsigned {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::U64(*self as u64)
                }
            }
        )*
    };
}

impl_to_value_for_signed!(i8, i16, i32, i64, isize);
impl_to_value_for_unsigned!(u8, u16, u32, u64, usize);

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::F64(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::F64(*self)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Str(self.to_owned())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl ToValue for Cow<'_, str> {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Rc<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Arc<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<K: ToValue, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }
}

impl<K: ToValue, V: ToValue, S> ToValue for HashMap<K, V, S> {
    fn to_value(&self) -> Value {
        let mut entries = self
            .iter()
            .map(|(k, v)| {
                let key = k.to_value();
                let mut rendered = vec![];
                key.render(&mut rendered);
                (rendered, key, v.to_value())
            })
            .collect::<Vec<_>>();
        // hash maps have no stable order; sort by the rendered key so records are reproducible
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Value::Map(entries.into_iter().map(|(_, k, v)| (k, v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(v: &Value) -> String {
        let mut out = vec![];
        v.render(&mut out);
        String::from_utf8(out).unwrap()
    }

    fn float(n: f64) -> String {
        let mut out = vec![];
        format_float(n, &mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_format_float() {
        assert_eq!(float(1.0), "1");
        assert_eq!(float(1.01), "1.01");
        assert_eq!(float(f64::from(1.01f32)), "1.01");
        assert_eq!(float(-2.0), "-2");
        assert_eq!(float(5.01), "5.01");
        assert_eq!(float(0.0), "0");
        assert_eq!(float(64.0), "64");
        assert_eq!(float(3.14159265), "3.1416");
        assert_eq!(float(0.0001234), "0.0001234");
        assert_eq!(float(0.00001234), "1.234e-05");
        assert_eq!(float(123456.0), "1.2346e+05");
        assert_eq!(float(99999.9), "1e+05");
        assert_eq!(float(12345.0), "12345");
        assert_eq!(float(f64::NAN), "null");
        assert_eq!(float(f64::INFINITY), "null");
    }

    #[test]
    fn test_render_arrays() {
        assert_eq!(render(&vec![1i32, -2, 3].to_value()), "[1,-2,3]");
        assert_eq!(render(&[1i32, -2, 3].to_value()), "[1,-2,3]");
        assert_eq!(render(&Vec::<u8>::new().to_value()), "[]");
        assert_eq!(render(&vec!["中文", "abc"].to_value()), r#"["中文","abc"]"#);
        assert_eq!(
            render(&vec![true, false, true, true].to_value()),
            "[true,false,true,true]"
        );
        assert_eq!(
            render(&vec![1.0f32, -2.0, 3.0, 4.0, 5.01, 0.0].to_value()),
            "[1,-2,3,4,5.01,0]"
        );
    }

    #[test]
    fn test_render_nil_and_empty() {
        assert_eq!(render(&Option::<i32>::None.to_value()), "null");
        assert_eq!(render(&Some(0i32).to_value()), "0");
        assert_eq!(render(&Option::<Vec<i32>>::None.to_value()), "null");
        assert_eq!(render(&Some(Vec::<i32>::new()).to_value()), "[]");
        assert_eq!(render(&BTreeMap::<i32, i32>::new().to_value()), "{}");
    }

    #[test]
    fn test_render_maps() {
        let map = BTreeMap::from([("name", "tanzy")]);
        assert_eq!(render(&map.to_value()), r#"{"name":"tanzy"}"#);

        let map = HashMap::from([(1, 18)]);
        assert_eq!(render(&map.to_value()), r#"{"1":18}"#);

        let map = BTreeMap::from([("first", BTreeMap::from([(1, "A")]))]);
        assert_eq!(render(&map.to_value()), r#"{"first":{"1":"A"}}"#);

        let map = HashMap::from([("b", 2), ("a", 1), ("c", 3)]);
        assert_eq!(render(&map.to_value()), r#"{"a":1,"b":2,"c":3}"#);
    }

    #[test]
    fn test_render_mixed_array() {
        let value = Value::Array(vec![
            Value::Null,
            1i32.to_value(),
            "str".to_value(),
            false.to_value(),
            BTreeMap::from([("name", "map")]).to_value(),
            vec![1i32, 2].to_value(),
            Value::Array(vec![
                2i32.to_value(),
                "str2".to_value(),
                Value::object([
                    ("Name", "tanzy".to_value()),
                    ("Age", 19i32.to_value()),
                    ("Flag", false.to_value()),
                ]),
            ]),
        ]);
        assert_eq!(
            render(&value),
            r#"[null,1,"str",false,{"name":"map"},[1,2],[2,"str2",{"Name":"tanzy","Age":19,"Flag":false}]]"#
        );
    }

    #[test]
    fn test_needs_quoting() {
        assert!("s".to_value().needs_quoting());
        assert!(Value::Bytes(b"raw".to_vec()).needs_quoting());
        assert!(!1i32.to_value().needs_quoting());
        assert!(!1.5f64.to_value().needs_quoting());
        assert!(!true.to_value().needs_quoting());
        assert!(!vec!["a"].to_value().needs_quoting());
        assert!(!Value::object([("a", Value::Null)]).needs_quoting());
        assert!(!Value::Null.needs_quoting());
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"name": "tanzy", "age": 18, "score": -1, "ratio": 0.5});
        assert_eq!(
            render(&Value::from_json(json)),
            r#"{"name":"tanzy","age":18,"score":-1,"ratio":0.5}"#
        );
    }
}
