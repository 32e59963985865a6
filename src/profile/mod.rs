// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-model wire-protocol profiles.
//!
//! A [`ModelProfile`] is pure data: the attribute name mapping, the value
//! codecs, and the ordered discrete speed table for one device family. It
//! is selected once at engine construction from the configured model and
//! the sleep-speed flag, so the rest of the engine never dispatches on
//! model strings.
//!
//! The mapping is permissive in both directions: attributes without an
//! entry pass through unchanged, because device firmware routinely reports
//! extra fields.
//!
//! # Examples
//!
//! ```
//! use aircontrol_lib::profile::{Model, ModelProfile};
//! use serde_json::json;
//!
//! let profile = ModelProfile::select(Model::Ac2729, false);
//!
//! let (field, value) = profile.to_raw("power", &json!(true));
//! assert_eq!((field.as_str(), value.as_str()), ("pwr", "1"));
//!
//! assert_eq!(profile.step_size(), 25);
//! ```

mod models;

pub use models::Model;

use serde_json::{Map, Value};

use crate::state::RawSnapshot;

/// One discrete speed step: the raw field/value pairs that select it.
pub type SpeedStep = &'static [(&'static str, &'static str)];

/// Bidirectional value codec for attributes whose wire encoding differs
/// from the normalized boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCodec {
    /// Boolean as `"1"` / `"0"`.
    Digit,
    /// Boolean as `"True"` / `"False"`.
    TrueFalse,
}

impl ValueCodec {
    /// Encodes a normalized boolean as the wire value.
    #[must_use]
    pub fn encode(self, value: bool) -> &'static str {
        match (self, value) {
            (Self::Digit, true) => "1",
            (Self::Digit, false) => "0",
            (Self::TrueFalse, true) => "True",
            (Self::TrueFalse, false) => "False",
        }
    }

    /// Decodes a wire value back to the normalized boolean.
    ///
    /// Firmware is inconsistent about types, so JSON booleans, numbers and
    /// digit strings are all accepted.
    #[must_use]
    pub fn decode(self, raw: &Value) -> Option<bool> {
        match raw {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.as_str() {
                "1" | "True" | "true" => Some(true),
                "0" | "False" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Static wire-protocol description for one device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelProfile {
    model: Model,
    sleep_speed: bool,
    /// Normalized attribute name to raw wire field name.
    attribute_map: &'static [(&'static str, &'static str)],
    /// Normalized attribute name to value codec.
    value_maps: &'static [(&'static str, ValueCodec)],
    /// Speed steps ordered from lowest to highest airflow.
    speed_table: &'static [SpeedStep],
}

impl ModelProfile {
    pub(crate) const fn new(
        model: Model,
        sleep_speed: bool,
        attribute_map: &'static [(&'static str, &'static str)],
        value_maps: &'static [(&'static str, ValueCodec)],
        speed_table: &'static [SpeedStep],
    ) -> Self {
        Self {
            model,
            sleep_speed,
            attribute_map,
            value_maps,
            speed_table,
        }
    }

    /// Selects the profile for a configured model and sleep-speed flag.
    #[must_use]
    pub fn select(model: Model, sleep_speed: bool) -> Self {
        models::profile_for(model, sleep_speed)
    }

    /// Returns the model this profile describes.
    #[must_use]
    pub fn model(&self) -> Model {
        self.model
    }

    /// Returns whether the speed table includes the sleep step.
    #[must_use]
    pub fn has_sleep_speed(&self) -> bool {
        self.sleep_speed
    }

    /// Returns the raw wire field name for a normalized attribute.
    ///
    /// Falls back to the attribute name itself when no mapping exists.
    #[must_use]
    pub fn raw_name<'a>(&self, attr: &'a str) -> &'a str {
        self.attribute_map
            .iter()
            .find(|(norm, _)| *norm == attr)
            .map_or(attr, |(_, raw)| raw)
    }

    /// Translates a normalized attribute/value pair into a wire field/value
    /// pair.
    ///
    /// Unknown attributes and values without a codec pass through unchanged.
    #[must_use]
    pub fn to_raw(&self, attr: &str, value: &Value) -> (String, String) {
        let field = self.raw_name(attr).to_string();

        let codec = self
            .value_maps
            .iter()
            .find(|(norm, _)| *norm == attr)
            .map(|(_, codec)| *codec);

        let raw_value = match (codec, value.as_bool()) {
            (Some(codec), Some(b)) => codec.encode(b).to_string(),
            _ => render_wire(value),
        };

        (field, raw_value)
    }

    /// Translates a raw snapshot into a normalized-keyed map.
    ///
    /// Every key with an `attribute_map` entry is renamed (and decoded
    /// through its codec when one exists); all other keys pass through under
    /// their raw name.
    #[must_use]
    pub fn to_normalized(&self, snapshot: &RawSnapshot) -> Map<String, Value> {
        let mut out = Map::new();

        for (key, value) in snapshot.as_map() {
            let normalized = self
                .attribute_map
                .iter()
                .find(|(_, raw)| raw == key)
                .map(|(norm, _)| *norm);

            match normalized {
                Some(attr) => {
                    let decoded = self
                        .value_maps
                        .iter()
                        .find(|(norm, _)| *norm == attr)
                        .and_then(|(_, codec)| codec.decode(value))
                        .map_or_else(|| value.clone(), Value::Bool);
                    out.insert(attr.to_string(), decoded);
                }
                None => {
                    out.insert(key.clone(), value.clone());
                }
            }
        }

        out
    }

    /// Decodes a boolean attribute from a raw snapshot.
    #[must_use]
    pub fn decode_bool(&self, attr: &str, snapshot: &RawSnapshot) -> Option<bool> {
        let value = snapshot.get(self.raw_name(attr))?;
        match self.value_maps.iter().find(|(norm, _)| *norm == attr) {
            Some((_, codec)) => codec.decode(value),
            None => ValueCodec::Digit.decode(value),
        }
    }

    /// Returns the speed table.
    #[must_use]
    pub fn speed_table(&self) -> &'static [SpeedStep] {
        self.speed_table
    }

    /// Returns the rotation-speed percentage granularity.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn step_size(&self) -> u8 {
        (100 / self.speed_table.len()) as u8
    }

    /// Finds the first speed step fully matching the raw snapshot.
    ///
    /// All raw values are string-compared; a non-matching snapshot (auto
    /// mode, or a speed the table does not describe) yields `None`.
    #[must_use]
    pub fn match_speed(&self, snapshot: &RawSnapshot) -> Option<usize> {
        self.speed_table.iter().position(|step| {
            step.iter()
                .all(|(field, value)| snapshot.matches(field, value))
        })
    }

    /// Computes the rotation-speed percentage for a raw snapshot.
    ///
    /// The result is always a multiple of [`step_size`](Self::step_size);
    /// 0 means off or no discrete speed selected.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn speed_percent(&self, snapshot: &RawSnapshot) -> u8 {
        self.match_speed(snapshot)
            .map_or(0, |index| (index as u8 + 1) * self.step_size())
    }
}

/// Renders a JSON value as its wire string form.
fn render_wire(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(json: Value) -> RawSnapshot {
        RawSnapshot::parse_line(&json.to_string()).unwrap()
    }

    #[test]
    fn codec_round_trips() {
        for codec in [ValueCodec::Digit, ValueCodec::TrueFalse] {
            for value in [true, false] {
                let wire = codec.encode(value);
                assert_eq!(codec.decode(&json!(wire)), Some(value));
            }
        }
    }

    #[test]
    fn codec_decodes_loose_types() {
        assert_eq!(ValueCodec::Digit.decode(&json!(1)), Some(true));
        assert_eq!(ValueCodec::Digit.decode(&json!(0)), Some(false));
        assert_eq!(ValueCodec::TrueFalse.decode(&json!(true)), Some(true));
        assert_eq!(ValueCodec::Digit.decode(&json!("garbage")), None);
    }

    #[test]
    fn to_raw_maps_known_attributes() {
        let profile = ModelProfile::select(Model::Ac2889, false);

        assert_eq!(
            profile.to_raw("power", &json!(true)),
            ("pwr".to_string(), "1".to_string())
        );
        assert_eq!(
            profile.to_raw("lock", &json!(false)),
            ("cl".to_string(), "False".to_string())
        );
        assert_eq!(
            profile.to_raw("target_humidity", &json!(60)),
            ("rhset".to_string(), "60".to_string())
        );
    }

    #[test]
    fn to_raw_passes_unknown_attributes_through() {
        let profile = ModelProfile::select(Model::Ac2889, false);
        assert_eq!(
            profile.to_raw("ddp", &json!("1")),
            ("ddp".to_string(), "1".to_string())
        );
    }

    #[test]
    fn to_normalized_inverts_value_maps() {
        let profile = ModelProfile::select(Model::Ac2729, false);
        let snap = snapshot(json!({"pwr": "1", "cl": false, "extra": 7}));

        let normalized = profile.to_normalized(&snap);
        assert_eq!(normalized.get("power"), Some(&json!(true)));
        assert_eq!(normalized.get("lock"), Some(&json!(false)));
        // Unmapped keys pass through under their raw name.
        assert_eq!(normalized.get("extra"), Some(&json!(7)));
    }

    #[test]
    fn round_trip_through_value_maps() {
        // toNormalized(toRaw(attr, v)) == v for every codec-mapped attribute.
        let profile = ModelProfile::select(Model::Ac2889, false);
        for attr in ["power", "lock", "ui_light"] {
            for value in [true, false] {
                let (field, wire) = profile.to_raw(attr, &json!(value));
                let snap = snapshot(json!({ field: wire }));
                let normalized = profile.to_normalized(&snap);
                assert_eq!(normalized.get(attr), Some(&json!(value)), "attr {attr}");
            }
        }
    }

    #[test]
    fn step_size_from_table_length() {
        assert_eq!(ModelProfile::select(Model::Generic, false).step_size(), 25);
        assert_eq!(ModelProfile::select(Model::Ac1214, true).step_size(), 20);
    }

    #[test]
    fn speed_percent_per_step() {
        let profile = ModelProfile::select(Model::Ac2889, false);
        let step = profile.step_size();

        for (index, pairs) in profile.speed_table().iter().enumerate() {
            let mut map = Map::new();
            for (field, value) in *pairs {
                map.insert((*field).to_string(), json!(value));
            }
            let snap = snapshot(Value::Object(map));
            #[allow(clippy::cast_possible_truncation)]
            let expected = (index as u8 + 1) * step;
            assert_eq!(profile.speed_percent(&snap), expected);
        }
    }

    #[test]
    fn speed_percent_zero_when_unmatched() {
        let profile = ModelProfile::select(Model::Ac2889, false);
        let snap = snapshot(json!({"mode": "P"}));
        assert_eq!(profile.speed_percent(&snap), 0);
    }

    #[test]
    fn speed_table_string_compares_numbers() {
        // Firmware reports om as a number on some models.
        let profile = ModelProfile::select(Model::Ac2889, false);
        let snap = snapshot(json!({"om": 2}));
        assert_eq!(profile.speed_percent(&snap), 50);
    }

    #[test]
    fn sleep_table_lowest_step() {
        let profile = ModelProfile::select(Model::Ac1214, true);
        let snap = snapshot(json!({"om": "s"}));
        assert_eq!(profile.speed_percent(&snap), 20);
    }
}
