// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod acl;
mod clock;
mod credential;
mod host_chain;
mod ops;

pub use acl::*;
pub use clock::*;
pub use credential::*;
pub use host_chain::*;
pub use ops::*;
