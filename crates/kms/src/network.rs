// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DisclosureRequest, DisclosureResponse, NetworkError};
use async_trait::async_trait;

/// A key management network able to re-encrypt the value behind a handle for one requester
#[async_trait]
pub trait DecryptionNetwork: Send + Sync + 'static {
    async fn disclose(
        &self,
        request: DisclosureRequest,
    ) -> Result<DisclosureResponse, NetworkError>;
}
