// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core value types shared across the library.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an engine instance.
///
/// Used to correlate log lines when multiple devices run in one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Creates a new random device ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fan operating mode reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FanMode {
    /// Manual speed selection (`mode=M`).
    Manual,
    /// Automatic mode (`mode=P`).
    Auto,
    /// Allergen mode (`mode=A`).
    Allergen,
    /// Sleep mode (`mode=S`).
    Sleep,
}

impl FanMode {
    /// Decodes the raw `mode` field value.
    #[must_use]
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "M" => Some(Self::Manual),
            "P" => Some(Self::Auto),
            "A" => Some(Self::Allergen),
            "S" => Some(Self::Sleep),
            _ => None,
        }
    }

    /// Encodes this mode as the raw `mode` field value.
    #[must_use]
    pub fn to_wire(self) -> &'static str {
        match self {
            Self::Manual => "M",
            Self::Auto => "P",
            Self::Allergen => "A",
            Self::Sleep => "S",
        }
    }
}

/// The filters tracked by the device, in accessory display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    /// Washable pre-filter.
    Pre,
    /// Active carbon filter.
    Carbon,
    /// HEPA filter.
    Hepa,
    /// Humidifier wick filter.
    Wick,
}

impl FilterKind {
    /// All filter kinds.
    pub const ALL: [Self; 4] = [Self::Pre, Self::Carbon, Self::Hepa, Self::Wick];

    /// Returns the raw field carrying the remaining-hours counter.
    #[must_use]
    pub fn counter_field(self) -> &'static str {
        match self {
            Self::Pre => "fltsts0",
            Self::Hepa => "fltsts1",
            Self::Carbon => "fltsts2",
            Self::Wick => "wicksts",
        }
    }

    /// Returns the raw field carrying the filter's total life, if the
    /// firmware reports one.
    #[must_use]
    pub fn total_field(self) -> Option<&'static str> {
        match self {
            Self::Pre => Some("flttotal0"),
            Self::Hepa => Some("flttotal1"),
            Self::Carbon => Some("flttotal2"),
            Self::Wick => None,
        }
    }

    /// Returns the total life assumed when the firmware reports none.
    #[must_use]
    pub fn default_total(self) -> u32 {
        match self {
            Self::Pre => 360,
            Self::Carbon | Self::Hepa | Self::Wick => 4800,
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pre => "pre-filter",
            Self::Carbon => "active carbon filter",
            Self::Hepa => "HEPA filter",
            Self::Wick => "wick filter",
        };
        f.write_str(name)
    }
}

/// Air quality on the accessory layer's 1-5 scale (1 = excellent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AirQuality(u8);

impl AirQuality {
    /// Derives the accessory-scale air quality from the raw `iaql` index.
    ///
    /// The device reports `iaql` on a 1-12 scale; the accessory scale is
    /// `ceil(iaql / 3)`, clamped to 1-5 for out-of-range firmware values.
    #[must_use]
    pub fn from_iaql(iaql: u32) -> Self {
        let level = iaql.div_ceil(3);
        Self(u8::try_from(level.clamp(1, 5)).unwrap_or(5))
    }

    /// Returns the 1-5 level.
    #[must_use]
    pub fn level(self) -> u8 {
        self.0
    }
}
