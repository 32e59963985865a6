// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translation of raw snapshots into the normalized attribute model.
//!
//! Besides the per-attribute mapping driven by the [`ModelProfile`], the
//! translator derives the computed attributes: rotation-speed percentage
//! from the discrete speed table, the 1-5 air quality scale, the humidity
//! threshold band, per-filter life ratios, and the effective water level.
//!
//! The zero-water corrective action lives here too: when the effective
//! water level transitions to 0 while the humidifier function is engaged,
//! the translator emits one auto-generated action switching the device out
//! of humidifying mode. The transition guard re-arms only after a non-empty
//! observation, so a device repeatedly reporting an empty tank cannot
//! cause a command storm.

use crate::command::{Action, TargetMode};
use crate::config::DeviceConfig;
use crate::error::ParseError;
use crate::profile::ModelProfile;
use crate::types::{AirQuality, FanMode, FilterKind};

use super::normalized::{FilterStatus, NormalizedState};
use super::raw::RawSnapshot;

/// Wire value of `func` when the humidifier function is engaged.
const FUNC_HUMIDIFYING: &str = "PH";

/// The result of interpreting one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    /// The full normalized state derived from the snapshot.
    pub state: NormalizedState,
    /// An auto-generated corrective action, if the snapshot demands one.
    pub corrective: Option<Action>,
}

/// Translates raw observe snapshots into [`NormalizedState`] values.
///
/// Holds the raw-state baseline (the last interpreted snapshot) and the
/// water-level carry-over used to detect empty-tank transitions.
#[derive(Debug)]
pub struct StateTranslator {
    profile: ModelProfile,
    humidifier: bool,
    last: Option<RawSnapshot>,
    water_was_empty: bool,
}

impl StateTranslator {
    /// Creates a translator for one device.
    #[must_use]
    pub fn new(profile: ModelProfile, device: &DeviceConfig) -> Self {
        Self {
            profile,
            humidifier: device.humidifier,
            last: None,
            water_was_empty: false,
        }
    }

    /// Returns the last interpreted raw snapshot.
    #[must_use]
    pub fn last_raw(&self) -> Option<&RawSnapshot> {
        self.last.as_ref()
    }

    /// Parses and interprets one observe line.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the line is not a JSON object. Callers drop
    /// and log such lines; they are never fatal.
    pub fn translate_line(&mut self, line: &str) -> Result<Translation, ParseError> {
        let snapshot = RawSnapshot::parse_line(line)?;
        Ok(self.translate(snapshot))
    }

    /// Interprets one parsed snapshot and advances the raw-state baseline.
    pub fn translate(&mut self, snapshot: RawSnapshot) -> Translation {
        let profile = &self.profile;

        let power = profile.decode_bool("power", &snapshot).unwrap_or(false);
        let brightness = snapshot
            .u32_field(profile.raw_name("light_level"))
            .map_or(0, |v| u8::try_from(v.min(100)).unwrap_or(100));

        let func = snapshot.str_field(profile.raw_name("function"));
        let humidifying = func.as_deref() == Some(FUNC_HUMIDIFYING);
        let tank_empty =
            humidifying && snapshot.u32_field(profile.raw_name("water_level")) == Some(0);
        let humidifier_active = power && humidifying && !tank_empty;

        let mut state = NormalizedState {
            power,
            mode: snapshot
                .str_field(profile.raw_name("mode"))
                .and_then(|m| FanMode::from_wire(&m)),
            lock: profile.decode_bool("lock", &snapshot).unwrap_or(false),
            rotation_speed: profile.speed_percent(&snapshot),
            light_on: power && brightness > 0,
            light_brightness: brightness,
            humidifier_active,
            target_humidity: if humidifier_active {
                humidity_band(snapshot.u32_field(profile.raw_name("target_humidity")))
            } else {
                0
            },
            water_level: if tank_empty { 0 } else { 100 },
            air_quality: snapshot
                .u32_field(profile.raw_name("air_quality"))
                .map(AirQuality::from_iaql),
            pm25: snapshot.f64_field(profile.raw_name("pm25")),
            temperature: snapshot.f64_field(profile.raw_name("temperature")),
            humidity: snapshot.f64_field(profile.raw_name("humidity")),
            ..NormalizedState::default()
        };

        for kind in FilterKind::ALL {
            if kind == FilterKind::Wick && !self.humidifier {
                continue;
            }
            if let Some(status) = filter_status(&snapshot, kind) {
                state.set_filter(kind, status);
            }
        }

        // At most one corrective write per empty-tank transition.
        let corrective = if self.humidifier && tank_empty && !self.water_was_empty {
            Some(Action::SetTargetMode(TargetMode::Auto))
        } else {
            None
        };

        self.water_was_empty = tank_empty;
        self.last = Some(snapshot);

        Translation { state, corrective }
    }
}

/// Maps the raw `rhset` threshold onto the accessory's 25-step band.
///
/// Any value outside the known set means the threshold is not applicable.
fn humidity_band(rhset: Option<u32>) -> u8 {
    match rhset {
        Some(40) => 25,
        Some(50) => 50,
        Some(60) => 75,
        Some(70) => 100,
        _ => 0,
    }
}

/// Computes the status of one filter from its raw counters.
fn filter_status(snapshot: &RawSnapshot, kind: FilterKind) -> Option<FilterStatus> {
    let counter = snapshot.u32_field(kind.counter_field())?;
    let total = kind
        .total_field()
        .and_then(|field| snapshot.u32_field(field))
        .filter(|total| *total > 0)
        .unwrap_or_else(|| kind.default_total());

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let life_percent = ((f64::from(counter) / f64::from(total)) * 100.0)
        .round()
        .clamp(0.0, 100.0) as u8;

    Some(FilterStatus {
        change_due: counter == 0,
        life_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Model;
    use serde_json::json;

    fn translator(humidifier: bool, sleep_speed: bool) -> StateTranslator {
        let device = DeviceConfig::new("test", "127.0.0.1")
            .unwrap()
            .with_model(Model::Ac2729)
            .with_humidifier(humidifier)
            .with_sleep_speed(sleep_speed);
        let profile = ModelProfile::select(device.model, device.sleep_speed);
        StateTranslator::new(profile, &device)
    }

    fn translate(tr: &mut StateTranslator, value: serde_json::Value) -> Translation {
        tr.translate_line(&value.to_string()).unwrap()
    }

    #[test]
    fn basic_purifier_fields() {
        let mut tr = translator(false, false);
        let t = translate(
            &mut tr,
            json!({"pwr":"1","mode":"M","om":"2","cl":true,"aqil":50}),
        );

        assert!(t.state.power);
        assert_eq!(t.state.mode, Some(FanMode::Manual));
        assert!(t.state.lock);
        assert_eq!(t.state.rotation_speed, 50);
        assert!(t.state.light_on);
        assert_eq!(t.state.light_brightness, 50);
        assert!(t.corrective.is_none());
    }

    #[test]
    fn light_off_while_powered_down() {
        let mut tr = translator(false, false);
        let t = translate(&mut tr, json!({"pwr":"0","aqil":75}));
        assert!(!t.state.light_on);
        assert_eq!(t.state.light_brightness, 75);
    }

    #[test]
    fn auto_mode_has_zero_speed() {
        let mut tr = translator(false, false);
        let t = translate(&mut tr, json!({"pwr":"1","mode":"P"}));
        assert_eq!(t.state.mode, Some(FanMode::Auto));
        assert_eq!(t.state.rotation_speed, 0);
    }

    #[test]
    fn sleep_speed_step() {
        let mut tr = translator(false, true);
        let t = translate(&mut tr, json!({"pwr":"1","mode":"M","om":"s"}));
        assert_eq!(t.state.rotation_speed, 20);
    }

    #[test]
    fn empty_tank_forces_water_level_zero() {
        let mut tr = translator(true, false);
        let t = translate(&mut tr, json!({"pwr":"1","func":"PH","wl":0,"rhset":50}));

        assert_eq!(t.state.water_level, 0);
        assert!(!t.state.humidifier_active);
        assert_eq!(t.state.target_humidity, 0);
    }

    #[test]
    fn water_level_full_when_not_humidifying() {
        let mut tr = translator(true, false);
        let t = translate(&mut tr, json!({"pwr":"1","func":"P","wl":0}));
        assert_eq!(t.state.water_level, 100);
        assert!(!t.state.humidifier_active);
    }

    #[test]
    fn humidity_threshold_bands() {
        let mut tr = translator(true, false);
        for (rhset, expected) in [(40, 25), (50, 50), (60, 75), (70, 100), (45, 0)] {
            let t = translate(
                &mut tr,
                json!({"pwr":"1","func":"PH","wl":100,"rhset":rhset}),
            );
            assert_eq!(t.state.target_humidity, expected, "rhset {rhset}");
            assert!(t.state.humidifier_active);
        }
    }

    #[test]
    fn filter_life_exact_half() {
        let mut tr = translator(false, false);
        let t = translate(&mut tr, json!({"fltsts2":2400,"flttotal2":4800}));

        let carbon = t.state.filter(FilterKind::Carbon).unwrap();
        assert_eq!(carbon.life_percent, 50);
        assert!(!carbon.change_due);
    }

    #[test]
    fn filter_change_due_at_zero() {
        let mut tr = translator(false, false);
        let t = translate(&mut tr, json!({"fltsts0":0,"flttotal0":999}));

        let pre = t.state.filter(FilterKind::Pre).unwrap();
        assert!(pre.change_due);
        assert_eq!(pre.life_percent, 0);
    }

    #[test]
    fn filter_default_totals() {
        let mut tr = translator(true, false);
        let t = translate(&mut tr, json!({"fltsts0":180,"fltsts1":1200,"wicksts":4800}));

        assert_eq!(t.state.filter(FilterKind::Pre).unwrap().life_percent, 50);
        assert_eq!(t.state.filter(FilterKind::Hepa).unwrap().life_percent, 25);
        assert_eq!(t.state.filter(FilterKind::Wick).unwrap().life_percent, 100);
    }

    #[test]
    fn wick_filter_ignored_without_humidifier() {
        let mut tr = translator(false, false);
        let t = translate(&mut tr, json!({"wicksts":2400}));
        assert_eq!(t.state.filter(FilterKind::Wick), None);
    }

    #[test]
    fn air_quality_from_iaql() {
        let mut tr = translator(false, false);
        let t = translate(&mut tr, json!({"iaql":7,"pm25":12}));
        assert_eq!(t.state.air_quality.unwrap().level(), 3);
        assert_eq!(t.state.pm25, Some(12.0));
    }

    #[test]
    fn corrective_action_once_per_transition() {
        let mut tr = translator(true, false);

        // Transition to empty: one corrective action.
        let t = translate(&mut tr, json!({"pwr":"1","func":"PH","wl":0}));
        assert_eq!(t.corrective, Some(Action::SetTargetMode(TargetMode::Auto)));

        // Repeated empty reports: no further actions.
        let t = translate(&mut tr, json!({"pwr":"1","func":"PH","wl":0}));
        assert!(t.corrective.is_none());
        let t = translate(&mut tr, json!({"pwr":"1","func":"PH","wl":0}));
        assert!(t.corrective.is_none());

        // Refill re-arms the guard.
        let t = translate(&mut tr, json!({"pwr":"1","func":"PH","wl":100}));
        assert!(t.corrective.is_none());
        let t = translate(&mut tr, json!({"pwr":"1","func":"PH","wl":0}));
        assert!(t.corrective.is_some());
    }

    #[test]
    fn no_corrective_without_humidifier_feature() {
        let mut tr = translator(false, false);
        let t = translate(&mut tr, json!({"pwr":"1","func":"PH","wl":0}));
        assert!(t.corrective.is_none());
    }

    #[test]
    fn baseline_superseded_per_snapshot() {
        let mut tr = translator(false, false);
        translate(&mut tr, json!({"pwr":"1","om":"2"}));
        translate(&mut tr, json!({"pwr":"0"}));

        // The second snapshot replaces the first; om is gone.
        assert!(tr.last_raw().unwrap().get("om").is_none());
    }
}
