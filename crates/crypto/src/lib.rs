// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod ecies;
mod error;
mod shares;
mod wallet;
pub use ecies::*;
pub use error::*;
pub use shares::*;
pub use wallet::*;
