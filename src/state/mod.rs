// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state: raw snapshots, the normalized model, and the translator
//! between them.

mod normalized;
mod raw;
mod translator;

pub use normalized::{FilterStatus, NormalizedState};
pub use raw::RawSnapshot;
pub use translator::{StateTranslator, Translation};
