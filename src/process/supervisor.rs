// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Supervision of the long-running observe subprocess.
//!
//! The supervisor owns exactly one `status-observe -J` child at a time and
//! walks the state machine `Stopped -> Starting -> Running ->
//! (Restarting | Stopped)`:
//!
//! - every observe session is rotated after a fixed duration even when the
//!   stream looks healthy, guarding against the control program or device
//!   silently stalling without exiting;
//! - an unexpected child exit before the timer cancels the timer and
//!   reconnects immediately, with a bounded pause once exits start failing
//!   right after spawn;
//! - `shutdown` kills the child, suppresses all restart logic, and is
//!   terminal.
//!
//! A new `Starting` always waits for the previous child handle to be
//! reaped first, so two observe processes can never overlap.

use std::process::Stdio;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::{ControlProgram, EngineConfig};
use crate::state::RawSnapshot;

/// The supervisor's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Not running. Terminal once shutdown has been requested.
    Stopped,
    /// Spawning the observe child.
    Starting,
    /// Child spawned; snapshots flow until the session ends.
    Running,
    /// Between sessions after a rotation or an unexpected exit.
    Restarting,
}

/// Why the inner session loop ended.
enum SessionEnd {
    /// Session timer expired; proactive rotation.
    Rotate,
    /// Child exited or closed its stdout before the timer.
    ChildExit,
    /// Deliberate shutdown, or the snapshot receiver went away.
    Shutdown,
}

/// Handle to a running supervision task.
///
/// Dropping the handle does not stop supervision; call
/// [`shutdown`](Self::shutdown).
#[derive(Debug)]
pub struct SupervisorHandle {
    shutdown_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<SupervisorState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SupervisorHandle {
    /// Requests shutdown and waits for the supervision task to finish.
    ///
    /// Idempotent: later calls return immediately.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SupervisorState {
        *self.state_rx.borrow()
    }

    /// Returns a watcher over lifecycle state transitions.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SupervisorState> {
        self.state_rx.clone()
    }
}

/// Spawns and supervises the observe subprocess for one device.
pub struct ProcessSupervisor;

impl ProcessSupervisor {
    /// Starts supervision; snapshots arrive on the returned channel.
    #[must_use]
    pub fn spawn(
        program: ControlProgram,
        host: String,
        port: u16,
        device: String,
        cfg: &EngineConfig,
    ) -> (SupervisorHandle, mpsc::Receiver<RawSnapshot>) {
        let (snapshot_tx, snapshot_rx) = mpsc::channel(cfg.snapshot_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(SupervisorState::Stopped);

        let cfg = cfg.clone();
        let task = tokio::spawn(supervise(
            program,
            host,
            port,
            device,
            cfg,
            snapshot_tx,
            shutdown_rx,
            state_tx,
        ));

        (
            SupervisorHandle {
                shutdown_tx,
                state_rx,
                task: Mutex::new(Some(task)),
            },
            snapshot_rx,
        )
    }
}

#[allow(clippy::too_many_arguments)]
async fn supervise(
    program: ControlProgram,
    host: String,
    port: u16,
    device: String,
    cfg: EngineConfig,
    snapshot_tx: mpsc::Sender<RawSnapshot>,
    mut shutdown_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<SupervisorState>,
) {
    let observe_args = [
        "-H",
        host.as_str(),
        "-P",
        &port.to_string(),
        "status-observe",
        "-J",
    ]
    .map(String::from);

    let mut failure_streak: u32 = 0;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let _ = state_tx.send(SupervisorState::Starting);
        tracing::info!(device = %device, "starting observe process");

        let mut command = program.command();
        command
            .args(&observe_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(device = %device, error = %e, "failed to spawn observe process");
                failure_streak += 1;
                if !pause(&mut shutdown_rx, backoff(&cfg, failure_streak)).await {
                    break;
                }
                continue;
            }
        };

        let started = Instant::now();
        let _ = state_tx.send(SupervisorState::Running);

        let stderr_task = child.stderr.take().map(|stderr| {
            let device = device.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(device = %device, line = %line, "observe stderr");
                }
            })
        });

        let end = match child.stdout.take() {
            Some(stdout) => {
                run_session(
                    stdout,
                    &device,
                    cfg.observe_session,
                    &snapshot_tx,
                    &mut shutdown_rx,
                )
                .await
            }
            None => {
                tracing::warn!(device = %device, "observe process has no stdout");
                SessionEnd::ChildExit
            }
        };

        // Kill and reap before any new Starting; never two observe children.
        let _ = child.start_kill();
        let _ = child.wait().await;
        if let Some(task) = stderr_task {
            task.abort();
        }

        match end {
            SessionEnd::Shutdown => break,
            SessionEnd::Rotate => {
                tracing::debug!(device = %device, "observe session expired, rotating");
                failure_streak = 0;
                let _ = state_tx.send(SupervisorState::Restarting);
            }
            SessionEnd::ChildExit => {
                tracing::warn!(device = %device, "observe process exited, reconnecting");
                let _ = state_tx.send(SupervisorState::Restarting);
                if started.elapsed() < cfg.failure_threshold {
                    failure_streak += 1;
                    if !pause(&mut shutdown_rx, backoff(&cfg, failure_streak)).await {
                        break;
                    }
                } else {
                    failure_streak = 0;
                }
            }
        }
    }

    let _ = state_tx.send(SupervisorState::Stopped);
    tracing::info!(device = %device, "observe supervision stopped");
}

/// Reads one observe session until the timer, child exit, or shutdown.
async fn run_session(
    stdout: tokio::process::ChildStdout,
    device: &str,
    session: Duration,
    snapshot_tx: &mpsc::Sender<RawSnapshot>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let mut lines = BufReader::new(stdout).lines();
    let timer = tokio::time::sleep(session);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            () = &mut timer => return SessionEnd::Rotate,

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    return SessionEnd::Shutdown;
                }
            }

            line = lines.next_line() => match line {
                Ok(Some(line)) => match RawSnapshot::parse_line(&line) {
                    Ok(snapshot) => {
                        tracing::trace!(device = %device, "observe snapshot");
                        if snapshot_tx.send(snapshot).await.is_err() {
                            // Receiver gone; the engine is shutting down.
                            return SessionEnd::Shutdown;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(device = %device, error = %e, "dropping malformed observe line");
                    }
                },
                Ok(None) => return SessionEnd::ChildExit,
                Err(e) => {
                    tracing::warn!(device = %device, error = %e, "observe stream read failed");
                    return SessionEnd::ChildExit;
                }
            },
        }
    }
}

/// Bounded exponential pause for immediate-failure streaks.
fn backoff(cfg: &EngineConfig, streak: u32) -> Duration {
    let factor = 2u32.saturating_pow(streak.saturating_sub(1));
    cfg.failure_backoff
        .saturating_mul(factor)
        .min(cfg.failure_backoff_max)
}

/// Sleeps unless shutdown arrives first; false means stop supervising.
async fn pause(shutdown_rx: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    tokio::select! {
        () = tokio::time::sleep(duration) => true,
        changed = shutdown_rx.changed() => {
            changed.is_ok() && !*shutdown_rx.borrow()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_program(script: &str) -> ControlProgram {
        ControlProgram::new("sh").with_leading_args(["-c", script, "observe"])
    }

    fn test_cfg(session_ms: u64) -> EngineConfig {
        EngineConfig {
            observe_session: Duration::from_millis(session_ms),
            failure_threshold: Duration::from_millis(10),
            failure_backoff: Duration::from_millis(5),
            failure_backoff_max: Duration::from_millis(20),
            snapshot_capacity: 16,
        }
    }

    #[test]
    fn backoff_is_bounded() {
        let cfg = test_cfg(1000);
        assert_eq!(backoff(&cfg, 1), Duration::from_millis(5));
        assert_eq!(backoff(&cfg, 2), Duration::from_millis(10));
        assert_eq!(backoff(&cfg, 3), Duration::from_millis(20));
        assert_eq!(backoff(&cfg, 10), Duration::from_millis(20));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn forwards_snapshots_and_drops_garbage() {
        let program = fake_program(r#"echo '{"pwr":"1"}'; echo 'not json'; echo '{"pwr":"0"}'; sleep 60"#);
        let (handle, mut snapshots) =
            ProcessSupervisor::spawn(program, "127.0.0.1".into(), 5683, "test".into(), &test_cfg(5000));

        let first = snapshots.recv().await.unwrap();
        assert_eq!(first.str_field("pwr").as_deref(), Some("1"));

        // The malformed line is dropped; the next snapshot still arrives.
        let second = snapshots.recv().await.unwrap();
        assert_eq!(second.str_field("pwr").as_deref(), Some("0"));

        handle.shutdown().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn session_timer_rotates_process() {
        // Each session emits exactly one line, so a third snapshot proves
        // at least two rotations.
        let program = fake_program(r#"echo '{"n":1}'; sleep 60"#);
        let (handle, mut snapshots) =
            ProcessSupervisor::spawn(program, "127.0.0.1".into(), 5683, "test".into(), &test_cfg(100));

        for _ in 0..3 {
            assert!(snapshots.recv().await.is_some());
        }

        handle.shutdown().await;
        assert_eq!(handle.state(), SupervisorState::Stopped);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn early_exit_restarts_without_waiting_for_timer() {
        // The child exits immediately, long before the 60s-scale session.
        let program = fake_program(r#"echo '{"n":1}'"#);
        let (handle, mut snapshots) = ProcessSupervisor::spawn(
            program,
            "127.0.0.1".into(),
            5683,
            "test".into(),
            &test_cfg(60_000),
        );

        let start = std::time::Instant::now();
        for _ in 0..3 {
            assert!(snapshots.recv().await.is_some());
        }
        assert!(start.elapsed() < Duration::from_secs(10));

        handle.shutdown().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shutdown_is_terminal_and_idempotent() {
        let program = fake_program(r#"echo '{"pwr":"1"}'; sleep 60"#);
        let (handle, mut snapshots) =
            ProcessSupervisor::spawn(program, "127.0.0.1".into(), 5683, "test".into(), &test_cfg(5000));

        assert!(snapshots.recv().await.is_some());
        handle.shutdown().await;
        handle.shutdown().await;

        assert_eq!(handle.state(), SupervisorState::Stopped);
        // The task is gone; no restart refills the channel.
        assert!(snapshots.recv().await.is_none());
    }

    #[tokio::test]
    async fn spawn_failure_keeps_retrying_until_shutdown() {
        let program = ControlProgram::new("/nonexistent/aircontrol");
        let (handle, _snapshots) = ProcessSupervisor::spawn(
            program,
            "127.0.0.1".into(),
            5683,
            "test".into(),
            &test_cfg(5000),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_ne!(handle.state(), SupervisorState::Stopped);

        handle.shutdown().await;
        assert_eq!(handle.state(), SupervisorState::Stopped);
    }
}
