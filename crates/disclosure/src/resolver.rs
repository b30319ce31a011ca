// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use cv_events::Handle;
use cv_host::{HandleRecord, HostChain};

/// Read access to the chain state a disclosure is checked against
pub trait HandleResolver: Send + Sync + 'static {
    fn chain_id(&self) -> u64;
    fn resolve(&self, handle: &Handle) -> Option<HandleRecord>;
    fn is_allowed(&self, handle: &Handle, account: &Address) -> bool;
}

impl HandleResolver for HostChain {
    fn chain_id(&self) -> u64 {
        HostChain::chain_id(self)
    }

    fn resolve(&self, handle: &Handle) -> Option<HandleRecord> {
        self.handle_record(handle)
    }

    fn is_allowed(&self, handle: &Handle, account: &Address) -> bool {
        HostChain::is_allowed(self, handle, account)
    }
}
