// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use cv_events::Handle;
use std::collections::{HashMap, HashSet};

/// Which accounts may use or disclose a handle
#[derive(Debug, Default, Clone)]
pub struct Acl {
    grants: HashMap<Handle, HashSet<Address>>,
    public: HashSet<Handle>,
}

impl Acl {
    pub fn allow(&mut self, handle: Handle, account: Address) {
        self.grants.entry(handle).or_default().insert(account);
    }

    pub fn allow_public(&mut self, handle: Handle) {
        self.public.insert(handle);
    }

    pub fn is_allowed(&self, handle: &Handle, account: &Address) -> bool {
        self.public.contains(handle)
            || self
                .grants
                .get(handle)
                .is_some_and(|accounts| accounts.contains(account))
    }

    pub fn is_public(&self, handle: &Handle) -> bool {
        self.public.contains(handle)
    }
}
