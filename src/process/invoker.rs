// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One-shot `set` invocations of the control program.

use std::future::Future;
use std::process::Stdio;

use crate::command::{Invocation, Invoke};
use crate::config::ControlProgram;
use crate::error::CommandError;

/// Runs one-shot `set` invocations against a single device.
#[derive(Debug, Clone)]
pub struct SetInvoker {
    program: ControlProgram,
    host: String,
    port: u16,
    device: String,
}

impl SetInvoker {
    /// Creates an invoker for one device.
    #[must_use]
    pub fn new(program: ControlProgram, host: String, port: u16, device: String) -> Self {
        Self {
            program,
            host,
            port,
            device,
        }
    }

    async fn run(&self, invocation: &Invocation) -> Result<(), CommandError> {
        let args = invocation.to_args(&self.host, self.port);
        tracing::debug!(device = %self.device, args = ?args, "running control program");

        let output = self
            .program
            .command()
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(CommandError::Spawn)?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            tracing::debug!(device = %self.device, stderr = %stderr.trim(), "control program stderr");
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(CommandError::Failed {
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

impl Invoke for SetInvoker {
    fn invoke(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = Result<(), CommandError>> + Send {
        self.run(invocation)
    }
}
