// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::fmt::{Debug, Display};

/// Trait that must be implemented by events used with EventBus
pub trait Event: Clone + Debug + Display + Send + Sync + 'static {
    /// Name of the variant, used for filtering and as part of the event id
    fn event_type(&self) -> String;

    /// Canonical bytes of the event payload
    fn payload(&self) -> Vec<u8>;
}
