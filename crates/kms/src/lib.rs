// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod error;
mod http;
mod local;
mod network;
mod protocol;
mod server;
mod viewer;

pub use error::*;
pub use http::*;
pub use local::*;
pub use network::*;
pub use protocol::*;
pub use server::*;
pub use viewer::*;
