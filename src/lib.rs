// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `AirControl` Lib - device state synchronization and command translation
//! for Philips-style smart air purifiers.
//!
//! This library supervises a per-device external control program (the
//! black-box CLI speaking the appliance's wire protocol), translates its
//! JSON observe stream into a normalized attribute model, and translates
//! user actions back into one-shot `set` invocations.
//!
//! # What it does
//!
//! - **Process supervision**: the long-running `status-observe -J` child is
//!   rotated on a fixed cadence and restarted on unexpected exit, with a
//!   bounded backoff when it starts failing immediately.
//! - **Protocol mapping**: per-model [`profile::ModelProfile`] data maps
//!   raw wire fields and values to normalized attributes, including the
//!   discrete fan-speed table, filter-life ratios and humidity thresholds.
//! - **Write arbitration**: conflicting writes (light on/off vs.
//!   brightness) are serialized per conflict group; a request against a
//!   busy group is dropped, never queued.
//!
//! # Quick Start
//!
//! ```no_run
//! use aircontrol_lib::{Action, ControlProgram, DeviceConfig, Engine, EngineConfig};
//! use aircontrol_lib::profile::Model;
//!
//! #[tokio::main]
//! async fn main() -> aircontrol_lib::Result<()> {
//!     let device = DeviceConfig::new("Living Room", "192.168.1.42")?
//!         .with_model(Model::Ac3829)
//!         .with_humidifier(true)
//!         .with_light(true);
//!
//!     let program = ControlProgram::new("python3")
//!         .with_leading_args(["/opt/pyaircontrol.py"]);
//!
//!     let engine = Engine::start(device, program, EngineConfig::default());
//!
//!     // Normalized state after every observe line.
//!     let sub = engine.on_state_changed(|state| {
//!         println!("speed {}%, AQI {:?}", state.rotation_speed, state.air_quality);
//!     });
//!
//!     // Fire-and-forget; failures are logged, never thrown.
//!     engine.apply_action(Action::SetPower(true));
//!     engine.apply_action(Action::SetRotationSpeed(75));
//!
//!     engine.unsubscribe(sub);
//!     engine.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod config;
mod engine;
pub mod error;
pub mod process;
pub mod profile;
pub mod state;
pub mod subscription;
pub mod types;

pub use command::{Action, CommandBuilder, CommandSerializer, ConflictGroup, Invocation, TargetMode};
pub use config::{ControlProgram, DeviceConfig, EngineConfig};
pub use engine::Engine;
pub use error::{CommandError, ConfigError, Error, ParseError, Result};
pub use process::{ProcessSupervisor, SetInvoker, SupervisorHandle, SupervisorState};
pub use state::{FilterStatus, NormalizedState, RawSnapshot, StateTranslator, Translation};
pub use subscription::{CallbackRegistry, SubscriptionId};
pub use types::{AirQuality, DeviceId, FanMode, FilterKind};
