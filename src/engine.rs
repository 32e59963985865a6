// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-device engine composing profile, supervisor, translator and
//! serializer.
//!
//! One engine owns one device: its model profile, its raw/normalized state
//! baseline, and its observe-subprocess supervisor. Nothing is shared
//! between engines; each is independently lifecycled.
//!
//! The public contract is deliberately small: [`apply_action`] is
//! fire-and-forget (failures are logged, never thrown at the accessory
//! layer), state flows out through a watch channel and optional callbacks,
//! and [`shutdown`] is idempotent and terminal.
//!
//! [`apply_action`]: Engine::apply_action
//! [`shutdown`]: Engine::shutdown

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::command::{Action, CommandSerializer, Invoke};
use crate::config::{ControlProgram, DeviceConfig, EngineConfig};
use crate::process::{ProcessSupervisor, SetInvoker, SupervisorHandle, SupervisorState};
use crate::profile::ModelProfile;
use crate::state::{NormalizedState, StateTranslator};
use crate::subscription::{CallbackRegistry, SubscriptionId};
use crate::types::DeviceId;

/// State synchronization and command translation engine for one device.
///
/// # Examples
///
/// ```no_run
/// use aircontrol_lib::{Action, ControlProgram, DeviceConfig, Engine, EngineConfig};
/// use aircontrol_lib::profile::Model;
///
/// #[tokio::main]
/// async fn main() -> aircontrol_lib::Result<()> {
///     let device = DeviceConfig::new("Living Room", "192.168.1.42")?
///         .with_model(Model::Ac2729)
///         .with_humidifier(true);
///     let program = ControlProgram::new("python3")
///         .with_leading_args(["/opt/pyaircontrol.py"]);
///
///     let engine = Engine::start(device, program, EngineConfig::default());
///
///     let mut state = engine.watch_state();
///     tokio::spawn(async move {
///         while state.changed().await.is_ok() {
///             println!("power: {}", state.borrow().power);
///         }
///     });
///
///     engine.apply_action(Action::SetRotationSpeed(50));
///
///     engine.shutdown().await;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Engine {
    id: DeviceId,
    name: String,
    step_size: u8,
    allergen_mode: bool,
    state_tx: watch::Sender<NormalizedState>,
    callbacks: Arc<CallbackRegistry>,
    serializer: Arc<CommandSerializer<SetInvoker>>,
    supervisor: SupervisorHandle,
    translator_task: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Starts the engine for one device.
    ///
    /// Spawns the observe supervisor and the translation task; must be
    /// called within a tokio runtime.
    #[must_use]
    pub fn start(device: DeviceConfig, program: ControlProgram, cfg: EngineConfig) -> Self {
        let id = DeviceId::new();
        let profile = ModelProfile::select(device.model, device.sleep_speed);

        tracing::info!(
            device = %device.name,
            id = %id,
            model = %device.model,
            "starting engine"
        );

        let serializer = Arc::new(CommandSerializer::new(
            SetInvoker::new(
                program.clone(),
                device.host.clone(),
                device.port,
                device.name.clone(),
            ),
            profile,
            device.allergen_mode,
            device.name.clone(),
        ));

        let (supervisor, snapshots) = ProcessSupervisor::spawn(
            program,
            device.host.clone(),
            device.port,
            device.name.clone(),
            &cfg,
        );

        let (state_tx, _) = watch::channel(NormalizedState::default());
        let callbacks = Arc::new(CallbackRegistry::new());

        let translator_task = tokio::spawn(translate_loop(
            StateTranslator::new(profile, &device),
            snapshots,
            device.name.clone(),
            state_tx.clone(),
            Arc::clone(&callbacks),
            Arc::clone(&serializer),
        ));

        Self {
            id,
            name: device.name,
            step_size: profile.step_size(),
            allergen_mode: device.allergen_mode,
            state_tx,
            callbacks,
            serializer,
            supervisor,
            translator_task: Mutex::new(Some(translator_task)),
        }
    }

    /// Returns the engine's identifier.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Returns the configured device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies a normalized action, fire-and-forget.
    ///
    /// The normalized state immediately reflects the intended outcome (the
    /// next real snapshot overwrites it); the device write happens on a
    /// background task. Failures and conflict drops are logged, never
    /// surfaced to the caller.
    pub fn apply_action(&self, action: Action) {
        tracing::info!(device = %self.name, action = %action, "applying action");

        let step_size = self.step_size;
        let allergen_mode = self.allergen_mode;
        self.state_tx
            .send_modify(|state| action.apply_precondition(state, step_size, allergen_mode));

        let serializer = Arc::clone(&self.serializer);
        let device = self.name.clone();
        tokio::spawn(async move {
            dispatch_logged(&serializer, &device, action).await;
        });
    }

    /// Returns a copy of the current normalized state.
    #[must_use]
    pub fn current_state(&self) -> NormalizedState {
        self.state_tx.borrow().clone()
    }

    /// Returns a watcher over normalized-state updates.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<NormalizedState> {
        self.state_tx.subscribe()
    }

    /// Registers a callback delivered a full snapshot after every observe
    /// line.
    pub fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&NormalizedState) + Send + Sync + 'static,
    {
        self.callbacks.subscribe(callback)
    }

    /// Removes a state-changed callback.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.unsubscribe(id)
    }

    /// Returns the supervisor's current lifecycle state.
    #[must_use]
    pub fn supervisor_state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    /// Shuts the engine down: kills the observe subprocess, cancels the
    /// session timer, and stops all tasks. Idempotent.
    pub async fn shutdown(&self) {
        tracing::info!(device = %self.name, "shutting down engine");
        self.supervisor.shutdown().await;

        // The translation task ends once the supervisor drops its sender.
        let task = self.translator_task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

/// Consumes snapshots from the supervisor and publishes normalized state.
async fn translate_loop<I: Invoke>(
    mut translator: StateTranslator,
    mut snapshots: tokio::sync::mpsc::Receiver<crate::state::RawSnapshot>,
    device: String,
    state_tx: watch::Sender<NormalizedState>,
    callbacks: Arc<CallbackRegistry>,
    serializer: Arc<CommandSerializer<I>>,
) {
    while let Some(snapshot) = snapshots.recv().await {
        let translation = translator.translate(snapshot);

        state_tx.send_replace(translation.state.clone());
        callbacks.notify(&translation.state);

        if let Some(action) = translation.corrective {
            tracing::warn!(
                device = %device,
                action = %action,
                "water tank empty, leaving humidifier mode"
            );
            dispatch_logged(&serializer, &device, action).await;
        }
    }

    tracing::debug!(device = %device, "translation task finished");
}

/// Dispatches one action and logs the outcome.
async fn dispatch_logged<I: Invoke>(
    serializer: &CommandSerializer<I>,
    device: &str,
    action: Action,
) {
    match serializer.dispatch(action).await {
        Ok(true) => tracing::debug!(device = %device, action = %action, "action sent"),
        Ok(false) => {
            tracing::debug!(device = %device, action = %action, "action dropped (conflict)");
        }
        Err(e) => tracing::warn!(device = %device, action = %action, error = %e, "action failed"),
    }
}
