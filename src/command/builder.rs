// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translation of normalized actions into control-program invocations.

use serde_json::json;

use crate::profile::ModelProfile;

use super::action::{Action, TargetMode, quantize_speed};

/// One one-shot `set` invocation of the control program.
///
/// Assignments belonging to one logical action are bundled into a single
/// invocation; attributes the protocol requires flagged as immediate get
/// their own invocation carrying the `-I` argument. Which attributes need
/// which is model/attribute-specific and encoded in the builder, not a
/// global rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Raw `field=value` assignments, in order.
    pub assignments: Vec<(String, String)>,
    /// Whether the invocation carries the immediate-apply flag.
    pub immediate: bool,
}

impl Invocation {
    fn new(assignments: Vec<(String, String)>) -> Self {
        Self {
            assignments,
            immediate: false,
        }
    }

    fn immediate(assignments: Vec<(String, String)>) -> Self {
        Self {
            assignments,
            immediate: true,
        }
    }

    /// Renders the full argument list for the control program.
    #[must_use]
    pub fn to_args(&self, host: &str, port: u16) -> Vec<String> {
        let mut args = vec![
            "-H".to_string(),
            host.to_string(),
            "-P".to_string(),
            port.to_string(),
            "set".to_string(),
        ];
        for (field, value) in &self.assignments {
            args.push(format!("{field}={value}"));
        }
        if self.immediate {
            args.push("-I".to_string());
        }
        args
    }
}

/// Builds control-program invocations for normalized actions.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    profile: ModelProfile,
    allergen_mode: bool,
}

impl CommandBuilder {
    /// Creates a builder for one device.
    #[must_use]
    pub fn new(profile: ModelProfile, allergen_mode: bool) -> Self {
        Self {
            profile,
            allergen_mode,
        }
    }

    /// Translates one action into its invocation sequence.
    ///
    /// An empty sequence means the action needs no device write (speed 0 is
    /// expressed through power or mode, never as a speed command).
    #[must_use]
    pub fn build(&self, action: &Action) -> Vec<Invocation> {
        match *action {
            Action::SetPower(on) => vec![Invocation::new(vec![self.raw("power", on)])],
            Action::SetTargetMode(mode) => {
                let wire = match mode {
                    TargetMode::Auto => "P",
                    TargetMode::Manual if self.allergen_mode => "A",
                    TargetMode::Manual => "M",
                };
                vec![Invocation::new(vec![(
                    self.profile.raw_name("mode").to_string(),
                    wire.to_string(),
                )])]
            }
            Action::SetLock(locked) => vec![Invocation::new(vec![self.raw("lock", locked)])],
            Action::SetRotationSpeed(percent) => self.build_speed(percent),
            Action::SetLightOn(on) => self.build_light(if on { 100 } else { 0 }),
            Action::SetLightBrightness(value) => self.build_light(value.min(100)),
            Action::SetHumidifierActive(active) => {
                vec![Invocation::new(vec![self.function(active)])]
            }
            Action::SetHumidityTarget(percent) => self.build_humidity_target(percent),
        }
    }

    /// Speed writes select manual mode and the step's raw pairs in one
    /// invocation.
    fn build_speed(&self, percent: u8) -> Vec<Invocation> {
        if percent == 0 {
            return Vec::new();
        }

        let table = self.profile.speed_table();
        let quantized = quantize_speed(percent.min(100), self.profile.step_size());
        let index = usize::from(quantized / self.profile.step_size() - 1).min(table.len() - 1);

        let mut assignments = vec![(self.profile.raw_name("mode").to_string(), "M".to_string())];
        for (field, value) in table[index] {
            assignments.push(((*field).to_string(), (*value).to_string()));
        }
        vec![Invocation::new(assignments)]
    }

    /// Light level and UI-light enable are always two sequential
    /// invocations, the level flagged immediate.
    fn build_light(&self, level: u8) -> Vec<Invocation> {
        vec![
            Invocation::immediate(vec![self.raw("light_level", json!(level))]),
            Invocation::new(vec![self.raw("ui_light", level > 0)]),
        ]
    }

    fn build_humidity_target(&self, percent: u8) -> Vec<Invocation> {
        let band = humidity_band_percent(percent);
        let rhset = humidity_band_rhset(percent);

        vec![
            Invocation::new(vec![self.function(band > 0)]),
            Invocation::immediate(vec![(
                self.profile.raw_name("target_humidity").to_string(),
                rhset.to_string(),
            )]),
        ]
    }

    fn function(&self, humidifying: bool) -> (String, String) {
        (
            self.profile.raw_name("function").to_string(),
            if humidifying { "PH" } else { "P" }.to_string(),
        )
    }

    fn raw(&self, attr: &str, value: impl Into<serde_json::Value>) -> (String, String) {
        self.profile.to_raw(attr, &value.into())
    }
}

/// Quantizes a requested humidity percentage to its 25% band.
pub(crate) fn humidity_band_percent(percent: u8) -> u8 {
    match percent {
        0 => 0,
        1..=25 => 25,
        26..=50 => 50,
        51..=75 => 75,
        _ => 100,
    }
}

/// Maps a requested humidity percentage to the raw `rhset` value.
fn humidity_band_rhset(percent: u8) -> u8 {
    match percent {
        26..=50 => 50,
        51..=75 => 60,
        76.. => 70,
        // The device default; sent even when the band is 0.
        _ => 40,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Model;

    fn builder(sleep_speed: bool, allergen: bool) -> CommandBuilder {
        CommandBuilder::new(ModelProfile::select(Model::Ac2729, sleep_speed), allergen)
    }

    fn assignments(invocation: &Invocation) -> Vec<String> {
        invocation
            .assignments
            .iter()
            .map(|(f, v)| format!("{f}={v}"))
            .collect()
    }

    #[test]
    fn power_invocation() {
        let invs = builder(false, false).build(&Action::SetPower(true));
        assert_eq!(invs.len(), 1);
        assert_eq!(assignments(&invs[0]), ["pwr=1"]);
        assert!(!invs[0].immediate);
    }

    #[test]
    fn lock_uses_true_false_codec() {
        let invs = builder(false, false).build(&Action::SetLock(true));
        assert_eq!(assignments(&invs[0]), ["cl=True"]);
    }

    #[test]
    fn target_mode_wire_values() {
        let auto = builder(false, false).build(&Action::SetTargetMode(TargetMode::Auto));
        assert_eq!(assignments(&auto[0]), ["mode=P"]);

        let manual = builder(false, false).build(&Action::SetTargetMode(TargetMode::Manual));
        assert_eq!(assignments(&manual[0]), ["mode=M"]);

        let allergen = builder(false, true).build(&Action::SetTargetMode(TargetMode::Manual));
        assert_eq!(assignments(&allergen[0]), ["mode=A"]);
    }

    #[test]
    fn speed_bundles_mode_and_step() {
        let invs = builder(false, false).build(&Action::SetRotationSpeed(50));
        assert_eq!(invs.len(), 1);
        assert_eq!(assignments(&invs[0]), ["mode=M", "om=2"]);
    }

    #[test]
    fn speed_rounds_up_and_saturates_at_turbo() {
        let invs = builder(false, false).build(&Action::SetRotationSpeed(80));
        assert_eq!(assignments(&invs[0]), ["mode=M", "om=t"]);

        let invs = builder(false, false).build(&Action::SetRotationSpeed(100));
        assert_eq!(assignments(&invs[0]), ["mode=M", "om=t"]);
    }

    #[test]
    fn sleep_speed_lowest_step() {
        let invs = builder(true, false).build(&Action::SetRotationSpeed(20));
        assert_eq!(assignments(&invs[0]), ["mode=M", "om=s"]);

        // Second step of the five-step table is om=1.
        let invs = builder(true, false).build(&Action::SetRotationSpeed(40));
        assert_eq!(assignments(&invs[0]), ["mode=M", "om=1"]);
    }

    #[test]
    fn speed_zero_builds_nothing() {
        assert!(builder(false, false)
            .build(&Action::SetRotationSpeed(0))
            .is_empty());
    }

    #[test]
    fn light_on_is_two_invocations() {
        let invs = builder(false, false).build(&Action::SetLightOn(true));
        assert_eq!(invs.len(), 2);
        assert_eq!(assignments(&invs[0]), ["aqil=100"]);
        assert!(invs[0].immediate);
        assert_eq!(assignments(&invs[1]), ["uil=1"]);
        assert!(!invs[1].immediate);
    }

    #[test]
    fn light_off_zeroes_both() {
        let invs = builder(false, false).build(&Action::SetLightOn(false));
        assert_eq!(assignments(&invs[0]), ["aqil=0"]);
        assert_eq!(assignments(&invs[1]), ["uil=0"]);
    }

    #[test]
    fn brightness_follows_value() {
        let invs = builder(false, false).build(&Action::SetLightBrightness(25));
        assert_eq!(assignments(&invs[0]), ["aqil=25"]);
        assert_eq!(assignments(&invs[1]), ["uil=1"]);
    }

    #[test]
    fn humidifier_function_values() {
        let on = builder(false, false).build(&Action::SetHumidifierActive(true));
        assert_eq!(assignments(&on[0]), ["func=PH"]);

        let off = builder(false, false).build(&Action::SetHumidifierActive(false));
        assert_eq!(assignments(&off[0]), ["func=P"]);
    }

    #[test]
    fn humidity_target_sequence() {
        let invs = builder(false, false).build(&Action::SetHumidityTarget(60));
        assert_eq!(invs.len(), 2);
        assert_eq!(assignments(&invs[0]), ["func=PH"]);
        assert!(!invs[0].immediate);
        assert_eq!(assignments(&invs[1]), ["rhset=60"]);
        assert!(invs[1].immediate);
    }

    #[test]
    fn humidity_target_zero_disengages() {
        let invs = builder(false, false).build(&Action::SetHumidityTarget(0));
        assert_eq!(assignments(&invs[0]), ["func=P"]);
        assert_eq!(assignments(&invs[1]), ["rhset=40"]);
    }

    #[test]
    fn invocation_argument_grammar() {
        let invs = builder(false, false).build(&Action::SetLightOn(true));
        let args = invs[0].to_args("192.168.1.42", 5683);
        assert_eq!(
            args,
            ["-H", "192.168.1.42", "-P", "5683", "set", "aqil=100", "-I"]
        );

        let args = invs[1].to_args("192.168.1.42", 5683);
        assert_eq!(args, ["-H", "192.168.1.42", "-P", "5683", "set", "uil=1"]);
    }
}
