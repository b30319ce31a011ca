// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{viewer_digest, Credential};
use alloy_primitives::Address;
use cv_crypto::{EciesPublicKey, Wallet};
use cv_events::{ConfidentialError, Context};
use cv_host::ContractCredential;

/// Anyone who can ask the network for a value: an account holding a wallet or a contract
/// holding its host credential
pub trait Viewer: Send + Sync {
    fn address(&self) -> Address;

    /// Produces the credential presented alongside a request from `requester`
    fn authorize(
        &self,
        requester: &Context,
        reencryption_key: &EciesPublicKey,
    ) -> Result<Credential, ConfidentialError>;
}

impl Viewer for Wallet {
    fn address(&self) -> Address {
        Wallet::address(self)
    }

    fn authorize(
        &self,
        requester: &Context,
        reencryption_key: &EciesPublicKey,
    ) -> Result<Credential, ConfidentialError> {
        let signature = self
            .sign_prehash(&viewer_digest(requester, reencryption_key))
            .map_err(|e| ConfidentialError::Unauthorized(e.to_string()))?;
        Ok(Credential::Viewer { signature })
    }
}

impl Viewer for ContractCredential {
    fn address(&self) -> Address {
        self.address
    }

    fn authorize(
        &self,
        _requester: &Context,
        _reencryption_key: &EciesPublicKey,
    ) -> Result<Credential, ConfidentialError> {
        Ok(Credential::Contract {
            credential: self.clone(),
        })
    }
}
