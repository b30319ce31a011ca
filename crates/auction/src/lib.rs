// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod auction;
mod clearing;
mod engine;

pub use auction::*;
pub use clearing::*;
pub use engine::*;
