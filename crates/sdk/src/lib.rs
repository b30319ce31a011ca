// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod client;
mod deployment;

pub use client::*;
pub use deployment::*;

pub use cv_auction as auction;
pub use cv_disclosure as disclosure;
pub use cv_encrypt as encrypt;
pub use cv_events as events;
pub use cv_kms as kms;
pub use cv_ledger as ledger;
