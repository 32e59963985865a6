// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalized actions, the command builder, and the write serializer.
//!
//! An [`Action`] is one logical user intent ("set fan speed to 75%"). The
//! [`CommandBuilder`] turns it into one or more [`Invocation`]s of the
//! external control program; the [`CommandSerializer`] arbitrates
//! conflicting writes and dispatches the invocations strictly in sequence.

mod action;
mod builder;
mod serializer;

pub use action::{Action, ConflictGroup, TargetMode};
pub use builder::{CommandBuilder, Invocation};
pub use serializer::{CommandSerializer, Invoke};
