// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device-agnostic attribute model consumed by the accessory layer.

use serde::{Deserialize, Serialize};

use crate::types::{AirQuality, FanMode, FilterKind};

/// Change-due flag and remaining life for one filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStatus {
    /// True when the filter must be replaced or cleaned now.
    pub change_due: bool,
    /// Remaining life as a percentage of the filter's total.
    pub life_percent: u8,
}

/// Normalized device state, recomputed from each raw snapshot.
///
/// This is a read-only derived view; the engine publishes a full copy after
/// every observe line, and applies optimistic updates to it when an action
/// is dispatched (overwritten by the next real snapshot).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedState {
    /// Main power.
    pub power: bool,
    /// Fan operating mode, when the device reports one.
    pub mode: Option<FanMode>,
    /// Physical controls lock.
    pub lock: bool,
    /// Rotation speed percentage. Always a multiple of the profile's step
    /// size; 0 means off or auto.
    pub rotation_speed: u8,
    /// Display light on/off. Always off while the device is powered down.
    pub light_on: bool,
    /// Display light brightness percentage.
    pub light_brightness: u8,
    /// Humidifier function engaged and usable.
    pub humidifier_active: bool,
    /// Target humidity band percentage (0, 25, 50, 75 or 100).
    pub target_humidity: u8,
    /// Effective water level: 100, or 0 when the tank is empty while the
    /// humidifier function is engaged.
    pub water_level: u8,
    /// Air quality on the 1-5 accessory scale.
    pub air_quality: Option<AirQuality>,
    /// PM2.5 density in µg/m³.
    pub pm25: Option<f64>,
    /// Current temperature in °C.
    pub temperature: Option<f64>,
    /// Current relative humidity percentage.
    pub humidity: Option<f64>,
    /// Pre-filter status.
    pub pre_filter: Option<FilterStatus>,
    /// Active carbon filter status.
    pub carbon_filter: Option<FilterStatus>,
    /// HEPA filter status.
    pub hepa_filter: Option<FilterStatus>,
    /// Wick filter status.
    pub wick_filter: Option<FilterStatus>,
}

impl NormalizedState {
    /// Returns the status of one filter.
    #[must_use]
    pub fn filter(&self, kind: FilterKind) -> Option<FilterStatus> {
        match kind {
            FilterKind::Pre => self.pre_filter,
            FilterKind::Carbon => self.carbon_filter,
            FilterKind::Hepa => self.hepa_filter,
            FilterKind::Wick => self.wick_filter,
        }
    }

    pub(crate) fn set_filter(&mut self, kind: FilterKind, status: FilterStatus) {
        let slot = match kind {
            FilterKind::Pre => &mut self.pre_filter,
            FilterKind::Carbon => &mut self.carbon_filter,
            FilterKind::Hepa => &mut self.hepa_filter,
            FilterKind::Wick => &mut self.wick_filter,
        };
        *slot = Some(status);
    }
}
