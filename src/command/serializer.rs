// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Write-conflict arbitration and sequential command dispatch.
//!
//! The device accepts only one command transaction at a time, and
//! interleaved writes to related attributes (light on/off vs. brightness)
//! produce incoherent results. The serializer keeps a busy flag per
//! [`ConflictGroup`]: while a group is busy, a new request for that group
//! is dropped — not queued, not retried, the last writer silently loses.
//! Requests to different groups proceed independently.

use std::future::Future;

use parking_lot::Mutex;

use crate::error::CommandError;
use crate::profile::ModelProfile;

use super::action::{Action, ConflictGroup};
use super::builder::{CommandBuilder, Invocation};

/// Executes one one-shot invocation of the control program.
///
/// The seam between arbitration and process execution; tests substitute a
/// fake that records invocations instead of spawning anything.
pub trait Invoke: Send + Sync {
    /// Runs the invocation to completion.
    fn invoke(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = Result<(), CommandError>> + Send;
}

/// Per-group busy flags.
///
/// Only ever read-modify-written under the mutex, and never held across an
/// await point.
#[derive(Debug, Default)]
struct BusyFlags([bool; ConflictGroup::ALL.len()]);

impl BusyFlags {
    /// Attempts to mark a group busy; false if it already was.
    fn try_acquire(&mut self, group: ConflictGroup) -> bool {
        let flag = &mut self.0[group.index()];
        if *flag {
            false
        } else {
            *flag = true;
            true
        }
    }

    fn release(&mut self, group: ConflictGroup) {
        self.0[group.index()] = false;
    }
}

/// Arbitrates and dispatches command invocations for one device.
#[derive(Debug)]
pub struct CommandSerializer<I> {
    invoker: I,
    builder: CommandBuilder,
    busy: Mutex<BusyFlags>,
    device: String,
}

impl<I: Invoke> CommandSerializer<I> {
    /// Creates a serializer dispatching through `invoker`.
    pub fn new(invoker: I, profile: ModelProfile, allergen_mode: bool, device: String) -> Self {
        Self {
            invoker,
            builder: CommandBuilder::new(profile, allergen_mode),
            busy: Mutex::new(BusyFlags::default()),
            device,
        }
    }

    /// Dispatches one action's invocation sequence.
    ///
    /// Returns `Ok(true)` when the sequence ran, `Ok(false)` when it was
    /// dropped because a conflicting write was in flight. The busy flag is
    /// cleared on completion whether the sequence succeeded or failed.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when an invocation fails to spawn or exits
    /// non-zero. Failed sequences are never retried.
    pub async fn dispatch(&self, action: Action) -> Result<bool, CommandError> {
        let group = action.conflict_group();

        if !self.busy.lock().try_acquire(group) {
            tracing::debug!(
                device = %self.device,
                group = %group,
                action = %action,
                "conflicting write in flight, dropping request"
            );
            return Ok(false);
        }

        let result = self.run(&action).await;
        self.busy.lock().release(group);

        result.map(|()| true)
    }

    /// Runs the invocations for one action strictly in sequence.
    async fn run(&self, action: &Action) -> Result<(), CommandError> {
        for invocation in self.builder.build(action) {
            tracing::debug!(
                device = %self.device,
                action = %action,
                immediate = invocation.immediate,
                "sending set command"
            );
            self.invoker.invoke(&invocation).await?;
        }
        Ok(())
    }
}
