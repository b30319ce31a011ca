// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod accounts;
mod http_env;
mod test_env;

pub use accounts::*;
pub use http_env::*;
pub use test_env::*;
