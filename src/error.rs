// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `AirControl` library.
//!
//! This module provides the error hierarchy for handling failures across the
//! library: configuration validation, one-shot command execution, and
//! observe-stream decoding. Observe-subprocess lifecycle failures are not
//! errors at all: the supervisor contains them and reconnects.
//!
//! Two conditions that look like errors deliberately are not:
//!
//! - A write request dropped because a conflicting write is already in
//!   flight. The serializer reports this as a non-dispatched result, never
//!   as an `Err`.
//! - A malformed observe line. The supervisor logs and skips it; the stream
//!   keeps running.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Device configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A one-shot `set` invocation failed.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// A raw state snapshot could not be decoded.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Errors related to device configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configured host is not a valid IP address.
    #[error("invalid host address: {0}")]
    InvalidHost(String),

    /// A percentage value is outside 0-100.
    #[error("percentage {0} is out of range [0, 100]")]
    InvalidPercent(u8),
}

/// Errors related to one-shot `set` invocations.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The control program could not be started.
    #[error("failed to spawn control program: {0}")]
    Spawn(#[source] std::io::Error),

    /// The control program exited with a non-zero status.
    ///
    /// The exit code is `None` when the process was terminated by a signal.
    #[error("control program exited with status {code:?}: {stderr}")]
    Failed {
        /// The process exit code, if any.
        code: Option<i32>,
        /// Captured standard error output.
        stderr: String,
    },
}

/// Errors related to decoding observe-stream snapshots.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The line is not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The line is valid JSON but not an object.
    #[error("snapshot is not a JSON object")]
    NotAnObject,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
