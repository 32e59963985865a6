// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalized accessory actions and their conflict groups.

use serde::{Deserialize, Serialize};

use crate::state::NormalizedState;
use crate::types::FanMode;

/// Target purifier mode requested by the accessory layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetMode {
    /// Manual speed control.
    Manual,
    /// Automatic control (allergen mode when so configured).
    Auto,
}

/// One user-initiated (or auto-generated) attribute change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Turn the purifier on or off.
    SetPower(bool),
    /// Switch between manual and automatic operation.
    SetTargetMode(TargetMode),
    /// Lock or unlock the physical controls.
    SetLock(bool),
    /// Select a discrete fan speed by percentage (0 builds no command).
    SetRotationSpeed(u8),
    /// Turn the display light on or off.
    SetLightOn(bool),
    /// Set the display light brightness percentage.
    SetLightBrightness(u8),
    /// Engage or disengage the humidifier function.
    SetHumidifierActive(bool),
    /// Set the target humidity percentage (quantized to 25% bands).
    SetHumidityTarget(u8),
}

/// Attributes whose writes must never be concurrently in flight.
///
/// Groups are declared here, next to the actions, so a new action states
/// its membership instead of growing another ad hoc busy boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictGroup {
    /// Power, mode, lock and speed writes.
    Purifier,
    /// Humidifier function and threshold writes.
    Humidifier,
    /// Display light on/off and brightness writes. These interleave into
    /// incoherent device state, hence one shared group.
    Light,
}

impl ConflictGroup {
    /// All conflict groups.
    pub const ALL: [Self; 3] = [Self::Purifier, Self::Humidifier, Self::Light];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Purifier => 0,
            Self::Humidifier => 1,
            Self::Light => 2,
        }
    }
}

impl std::fmt::Display for ConflictGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Purifier => "purifier",
            Self::Humidifier => "humidifier",
            Self::Light => "light",
        };
        f.write_str(name)
    }
}

impl Action {
    /// Returns the conflict group this action writes to.
    #[must_use]
    pub fn conflict_group(&self) -> ConflictGroup {
        match self {
            Self::SetPower(_)
            | Self::SetTargetMode(_)
            | Self::SetLock(_)
            | Self::SetRotationSpeed(_) => ConflictGroup::Purifier,
            Self::SetHumidifierActive(_) | Self::SetHumidityTarget(_) => ConflictGroup::Humidifier,
            Self::SetLightOn(_) | Self::SetLightBrightness(_) => ConflictGroup::Light,
        }
    }

    /// Applies the optimistic precondition update for this action.
    ///
    /// The accessory layer sees the intended state immediately; the next
    /// real observe snapshot overwrites it.
    pub(crate) fn apply_precondition(
        &self,
        state: &mut NormalizedState,
        step_size: u8,
        allergen_mode: bool,
    ) {
        match *self {
            Self::SetPower(on) => state.power = on,
            Self::SetTargetMode(TargetMode::Auto) => {
                state.mode = Some(FanMode::Auto);
                state.rotation_speed = 0;
            }
            Self::SetTargetMode(TargetMode::Manual) => {
                state.mode = Some(if allergen_mode {
                    FanMode::Allergen
                } else {
                    FanMode::Manual
                });
            }
            Self::SetLock(locked) => state.lock = locked,
            Self::SetRotationSpeed(percent) => {
                if percent > 0 {
                    state.mode = Some(FanMode::Manual);
                    state.rotation_speed = quantize_speed(percent, step_size);
                }
            }
            Self::SetLightOn(on) => {
                state.light_on = on;
                state.light_brightness = if on { 100 } else { 0 };
            }
            Self::SetLightBrightness(value) => {
                state.light_on = value > 0;
                state.light_brightness = value;
            }
            Self::SetHumidifierActive(active) => {
                state.humidifier_active = active;
                if !active {
                    state.target_humidity = 0;
                }
            }
            Self::SetHumidityTarget(percent) => {
                let band = super::builder::humidity_band_percent(percent);
                state.humidifier_active = band > 0;
                state.target_humidity = band;
            }
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetPower(on) => write!(f, "power {}", on_off(*on)),
            Self::SetTargetMode(TargetMode::Manual) => write!(f, "mode manual"),
            Self::SetTargetMode(TargetMode::Auto) => write!(f, "mode auto"),
            Self::SetLock(locked) => write!(f, "lock {}", on_off(*locked)),
            Self::SetRotationSpeed(p) => write!(f, "rotation speed {p}%"),
            Self::SetLightOn(on) => write!(f, "light {}", on_off(*on)),
            Self::SetLightBrightness(v) => write!(f, "light brightness {v}%"),
            Self::SetHumidifierActive(on) => write!(f, "humidifier {}", on_off(*on)),
            Self::SetHumidityTarget(p) => write!(f, "humidity target {p}%"),
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

/// Rounds a requested percentage up to the next discrete step.
pub(crate) fn quantize_speed(percent: u8, step_size: u8) -> u8 {
    (percent.div_ceil(step_size) * step_size).min(100)
}
