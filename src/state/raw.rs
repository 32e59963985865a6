// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One raw JSON state snapshot from the observe stream.

use serde_json::{Map, Value};

use crate::error::ParseError;

/// The most recent JSON object received from the device, keyed by wire
/// field names.
///
/// Firmware revisions disagree about field types (`pwr` arrives both as
/// `"1"` and `1`), so all accessors are tolerant of strings and numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSnapshot(Map<String, Value>);

impl RawSnapshot {
    /// Parses one observe-stream line.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the line is not a JSON object.
    pub fn parse_line(line: &str) -> Result<Self, ParseError> {
        match serde_json::from_str::<Value>(line)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ParseError::NotAnObject),
        }
    }

    /// Returns the raw value for a wire field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns a field rendered as its wire string form.
    #[must_use]
    pub fn str_field(&self, field: &str) -> Option<String> {
        self.get(field).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Returns a numeric field, accepting numbers and numeric strings.
    #[must_use]
    pub fn u32_field(&self, field: &str) -> Option<u32> {
        match self.get(field)? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Returns a floating-point field, accepting numbers and numeric strings.
    #[must_use]
    pub fn f64_field(&self, field: &str) -> Option<f64> {
        match self.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// String-compares a field against an expected wire value.
    ///
    /// Missing fields never match.
    #[must_use]
    pub fn matches(&self, field: &str, expected: &str) -> bool {
        self.str_field(field).is_some_and(|v| v == expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_line() {
        let snap = RawSnapshot::parse_line(r#"{"pwr":"1","om":"2"}"#).unwrap();
        assert_eq!(snap.str_field("pwr").as_deref(), Some("1"));
    }

    #[test]
    fn rejects_non_object() {
        assert!(matches!(
            RawSnapshot::parse_line("[1,2]"),
            Err(ParseError::NotAnObject)
        ));
        assert!(matches!(
            RawSnapshot::parse_line("{oops"),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn numeric_fields_accept_strings() {
        let snap = RawSnapshot::parse_line(r#"{"iaql":"7","pm25":12,"temp":"21.5"}"#).unwrap();
        assert_eq!(snap.u32_field("iaql"), Some(7));
        assert_eq!(snap.u32_field("pm25"), Some(12));
        assert_eq!(snap.f64_field("temp"), Some(21.5));
    }

    #[test]
    fn matches_string_compares() {
        let snap = RawSnapshot::parse_line(r#"{"om":1,"mode":"M"}"#).unwrap();
        assert!(snap.matches("om", "1"));
        assert!(snap.matches("mode", "M"));
        assert!(!snap.matches("om", "2"));
        assert!(!snap.matches("absent", "1"));
    }
}
