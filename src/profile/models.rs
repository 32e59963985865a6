// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The closed set of supported device families and their profile data.

use serde::{Deserialize, Serialize};

use super::{ModelProfile, SpeedStep, ValueCodec};

/// Supported device model families.
///
/// The set is closed on purpose: a profile is a constant data value picked
/// at construction time, never a string-keyed runtime lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    /// AC1214 purifier (commonly run with the sleep speed enabled).
    Ac1214,
    /// AC2729 purifier/humidifier combo.
    Ac2729,
    /// AC2889 purifier.
    Ac2889,
    /// AC3829 purifier/humidifier combo.
    Ac3829,
    /// Unknown family; wire fields are taken as already normalized.
    Generic,
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ac1214 => "AC1214",
            Self::Ac2729 => "AC2729",
            Self::Ac2889 => "AC2889",
            Self::Ac3829 => "AC3829",
            Self::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Attribute mapping shared by the CoAP-dialect families.
const COAP_ATTRIBUTES: &[(&str, &str)] = &[
    ("power", "pwr"),
    ("mode", "mode"),
    ("speed", "om"),
    ("lock", "cl"),
    ("light_level", "aqil"),
    ("ui_light", "uil"),
    ("air_quality", "iaql"),
    ("pm25", "pm25"),
    ("temperature", "temp"),
    ("humidity", "rh"),
    ("target_humidity", "rhset"),
    ("function", "func"),
    ("water_level", "wl"),
];

/// Value codecs shared by the CoAP-dialect families.
const COAP_VALUES: &[(&str, ValueCodec)] = &[
    ("power", ValueCodec::Digit),
    ("lock", ValueCodec::TrueFalse),
    ("ui_light", ValueCodec::Digit),
];

/// Four-step speed table: 1, 2, 3, turbo.
const SPEEDS_STANDARD: &[SpeedStep] = &[
    &[("om", "1")],
    &[("om", "2")],
    &[("om", "3")],
    &[("om", "t")],
];

/// Five-step speed table with the sleep speed as the lowest step.
const SPEEDS_SLEEP: &[SpeedStep] = &[
    &[("om", "s")],
    &[("om", "1")],
    &[("om", "2")],
    &[("om", "3")],
    &[("om", "t")],
];

/// Returns the constant profile for a model and sleep-speed flag.
pub(super) fn profile_for(model: Model, sleep_speed: bool) -> ModelProfile {
    let speed_table = if sleep_speed {
        SPEEDS_SLEEP
    } else {
        SPEEDS_STANDARD
    };

    let (attributes, values): (&[(&str, &str)], &[(&str, ValueCodec)]) = match model {
        Model::Generic => (&[], &[]),
        Model::Ac1214 | Model::Ac2729 | Model::Ac2889 | Model::Ac3829 => {
            (COAP_ATTRIBUTES, COAP_VALUES)
        }
    };

    ModelProfile::new(model, sleep_speed, attributes, values, speed_table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_profile_is_identity() {
        let profile = ModelProfile::select(Model::Generic, false);
        assert_eq!(profile.raw_name("power"), "power");
        assert_eq!(
            profile.to_raw("power", &serde_json::json!("1")),
            ("power".to_string(), "1".to_string())
        );
    }

    #[test]
    fn coap_profile_maps_power() {
        let profile = ModelProfile::select(Model::Ac3829, false);
        assert_eq!(profile.raw_name("power"), "pwr");
        assert_eq!(profile.model(), Model::Ac3829);
    }

    #[test]
    fn sleep_flag_selects_five_steps() {
        assert_eq!(
            ModelProfile::select(Model::Ac1214, true).speed_table().len(),
            5
        );
        assert_eq!(
            ModelProfile::select(Model::Ac1214, false)
                .speed_table()
                .len(),
            4
        );
    }

    #[test]
    fn model_display() {
        assert_eq!(Model::Ac2729.to_string(), "AC2729");
        assert_eq!(Model::Generic.to_string(), "generic");
    }
}
