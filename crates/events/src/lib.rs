// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod auction_id;
mod chain_event;
mod ciphertext;
mod context;
mod error;
mod event_id;
mod eventbus;
mod handle;
mod operation;
mod traits;
mod value_type;

pub use alloy_primitives::{Address, B256, U256};
pub use auction_id::*;
pub use chain_event::*;
pub use ciphertext::*;
pub use context::*;
pub use error::*;
pub use event_id::*;
pub use eventbus::*;
pub use handle::*;
pub use operation::*;
pub use traits::*;
pub use value_type::*;
