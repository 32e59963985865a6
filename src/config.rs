// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device and engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::profile::Model;

/// Default CoAP port used by the devices.
pub const DEFAULT_PORT: u16 = 5683;

/// Configuration for one physical device.
///
/// Mirrors the per-device accessory configuration: which optional services
/// the device exposes and how its speed scale is laid out.
///
/// # Examples
///
/// ```
/// use aircontrol_lib::config::DeviceConfig;
/// use aircontrol_lib::profile::Model;
///
/// let device = DeviceConfig::new("Living Room", "192.168.1.42")?
///     .with_model(Model::Ac2729)
///     .with_humidifier(true)
///     .with_sleep_speed(true);
///
/// assert_eq!(device.port, 5683);
/// # Ok::<(), aircontrol_lib::error::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Display name used in logs.
    pub name: String,
    /// Device IP address.
    pub host: String,
    /// Device port.
    pub port: u16,
    /// Device model family, selects the wire-protocol profile.
    pub model: Model,
    /// Whether the device exposes the display light.
    pub light: bool,
    /// Whether the device reports temperature.
    pub temperature: bool,
    /// Whether the device reports relative humidity.
    pub humidity: bool,
    /// Whether the device has a humidifier function.
    pub humidifier: bool,
    /// Whether manual mode should select allergen mode instead.
    pub allergen_mode: bool,
    /// Whether the device has a dedicated sleep speed (5-step speed scale).
    pub sleep_speed: bool,
}

impl DeviceConfig {
    /// Creates a configuration for a device at `host` with defaults matching
    /// a plain purifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHost`] if `host` is not an IP address.
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Result<Self, ConfigError> {
        let host = host.into();
        if host.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::InvalidHost(host));
        }

        Ok(Self {
            name: name.into(),
            host,
            port: DEFAULT_PORT,
            model: Model::Generic,
            light: false,
            temperature: false,
            humidity: false,
            humidifier: false,
            allergen_mode: false,
            sleep_speed: false,
        })
    }

    /// Sets the device port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the device model family.
    #[must_use]
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Enables the display light service.
    #[must_use]
    pub fn with_light(mut self, light: bool) -> Self {
        self.light = light;
        self
    }

    /// Enables the temperature sensor.
    #[must_use]
    pub fn with_temperature(mut self, temperature: bool) -> Self {
        self.temperature = temperature;
        self
    }

    /// Enables the humidity sensor.
    #[must_use]
    pub fn with_humidity(mut self, humidity: bool) -> Self {
        self.humidity = humidity;
        self
    }

    /// Enables the humidifier function.
    #[must_use]
    pub fn with_humidifier(mut self, humidifier: bool) -> Self {
        self.humidifier = humidifier;
        self
    }

    /// Selects allergen mode instead of auto when leaving manual control.
    #[must_use]
    pub fn with_allergen_mode(mut self, allergen_mode: bool) -> Self {
        self.allergen_mode = allergen_mode;
        self
    }

    /// Enables the dedicated sleep speed step.
    #[must_use]
    pub fn with_sleep_speed(mut self, sleep_speed: bool) -> Self {
        self.sleep_speed = sleep_speed;
        self
    }
}

/// The external control program invoked per device.
///
/// The program is a black box with a fixed argument grammar: every
/// invocation starts with `-H <host> -P <port>`, followed by either
/// `set <field=value>... [-I]` (one-shot) or `status-observe -J`
/// (long-running JSON-lines stream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlProgram {
    /// Path to the executable.
    pub program: PathBuf,
    /// Arguments inserted before the host/port selectors, e.g. the script
    /// path when the program is an interpreter.
    pub leading_args: Vec<String>,
}

impl ControlProgram {
    /// Creates a control program description.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Adds arguments placed before the host/port selectors.
    #[must_use]
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Builds a [`tokio::process::Command`] with the leading args applied.
    pub(crate) fn command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.leading_args);
        cmd
    }
}

/// Engine tuning knobs.
///
/// The defaults match the observed behavior of the original integration;
/// tests shorten the durations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long one observe session runs before the subprocess is killed
    /// and respawned, guarding against silent stalls.
    pub observe_session: Duration,
    /// Sessions shorter than this count as immediate failures.
    pub failure_threshold: Duration,
    /// Initial pause after an immediate failure.
    pub failure_backoff: Duration,
    /// Upper bound for the failure pause as the streak grows.
    pub failure_backoff_max: Duration,
    /// Capacity of the snapshot channel between supervisor and engine.
    pub snapshot_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            observe_session: Duration::from_secs(60),
            failure_threshold: Duration::from_secs(2),
            failure_backoff: Duration::from_millis(500),
            failure_backoff_max: Duration::from_secs(30),
            snapshot_capacity: 16,
        }
    }
}
