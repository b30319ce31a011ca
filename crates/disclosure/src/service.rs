// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::HandleResolver;
use alloy_primitives::{Address, U256};
use cv_config::DisclosureConfig;
use cv_crypto::EciesSecretKey;
use cv_events::{ConfidentialError, Context, Handle, ValueType};
use cv_kms::{DecryptionNetwork, DisclosureRequest, DisclosureResponse, NetworkError, Viewer};
use cv_utils::{retry_with_backoff, to_failure, to_retry, RetryFailure};
use futures::future::try_join_all;
use rand::rngs::OsRng;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info_span, trace, Instrument};

/// Recovers plaintext values behind handles for authorized viewers.
///
/// The only place plaintext re-enters the system. Values are returned to the caller and
/// never logged.
#[derive(Clone)]
pub struct DisclosureService {
    network: Arc<dyn DecryptionNetwork>,
    resolver: Arc<dyn HandleResolver>,
    config: DisclosureConfig,
    next_correlation: Arc<AtomicU64>,
}

impl DisclosureService {
    pub fn new(
        network: Arc<dyn DecryptionNetwork>,
        resolver: Arc<dyn HandleResolver>,
        config: DisclosureConfig,
    ) -> Self {
        Self {
            network,
            resolver,
            config,
            next_correlation: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn config(&self) -> &DisclosureConfig {
        &self.config
    }

    /// The context `viewer` reads `handle` under: this chain, the contract holding the handle
    pub fn requester_for(
        &self,
        handle: &Handle,
        viewer: Address,
    ) -> Result<Context, ConfidentialError> {
        let record = self
            .resolver
            .resolve(handle)
            .ok_or(ConfidentialError::HandleNotReady(*handle))?;
        Ok(Context::new(self.resolver.chain_id(), record.contract, viewer))
    }

    /// Discloses `handle` to `viewer` acting as `requester`.
    ///
    /// Local checks run first and are never retried: a handle unknown to the chain is
    /// `HandleNotReady`, a requester naming another chain or contract is `ContextMismatch`, a
    /// viewer that is not the requester or not on the ACL is `Unauthorized`. The network round
    /// trip is bounded by the request timeout and transient failures are retried with backoff
    /// until the attempt ceiling, after which the call fails with `DisclosureUnavailable`.
    pub async fn disclose(
        &self,
        handle: Handle,
        requester: &Context,
        viewer: &dyn Viewer,
    ) -> Result<U256, ConfidentialError> {
        let record = self
            .resolver
            .resolve(&handle)
            .ok_or(ConfidentialError::HandleNotReady(handle))?;
        if requester.chain_id != self.resolver.chain_id() {
            return Err(ConfidentialError::ContextMismatch(format!(
                "requester on chain {}, handle on chain {}",
                requester.chain_id,
                self.resolver.chain_id()
            )));
        }
        if requester.contract != record.contract {
            return Err(ConfidentialError::ContextMismatch(format!(
                "handle {handle} is held by {}, requested through {}",
                record.contract, requester.contract
            )));
        }
        if viewer.address() != requester.user {
            return Err(ConfidentialError::Unauthorized(format!(
                "{} cannot request as {}",
                viewer.address(),
                requester.user
            )));
        }
        if !self.resolver.is_allowed(&handle, &requester.user) {
            return Err(ConfidentialError::Unauthorized(format!(
                "{} is not allowed to read {handle}",
                requester.user
            )));
        }

        let secret = EciesSecretKey::random(&mut OsRng);
        let reencryption_key = secret.public_key();
        let credential = viewer.authorize(requester, &reencryption_key)?;
        let correlation_id = self.next_correlation.fetch_add(1, Ordering::SeqCst);
        let request = DisclosureRequest {
            correlation_id,
            handle,
            requester: *requester,
            credential,
            reencryption_key,
        };

        let span = info_span!("disclose", correlation_id, handle = %handle);
        let response = self.round_trip(&request).instrument(span).await?;
        let value = response.open(&handle, &secret, requester)?;
        debug!(correlation_id, handle = %handle, viewer = %requester.user, "handle disclosed");
        Ok(value)
    }

    async fn round_trip(
        &self,
        request: &DisclosureRequest,
    ) -> Result<DisclosureResponse, ConfidentialError> {
        let request_timeout = self.config.request_timeout();
        let result = retry_with_backoff(
            || {
                let network = Arc::clone(&self.network);
                let request = request.clone();
                async move {
                    match timeout(request_timeout, network.disclose(request)).await {
                        Ok(Ok(response)) => Ok(response),
                        Ok(Err(e)) if e.is_transient() => Err(to_retry(e)),
                        Ok(Err(e)) => Err(to_failure(e)),
                        Err(_) => Err(to_retry(NetworkError::Unavailable(format!(
                            "no response within {}ms",
                            request_timeout.as_millis()
                        )))),
                    }
                }
            },
            self.config.backoff(),
        )
        .await;

        result.map_err(|failure| match failure {
            RetryFailure::Aborted(e) => e.into(),
            RetryFailure::Exhausted { attempts, last } => ConfidentialError::DisclosureUnavailable(
                format!("gave up after {attempts} attempts: {last}"),
            ),
        })
    }

    /// Like [`disclose`](Self::disclose) but first checks the type carried by the handle
    pub async fn disclose_typed(
        &self,
        handle: Handle,
        requester: &Context,
        viewer: &dyn Viewer,
        expected: ValueType,
    ) -> Result<U256, ConfidentialError> {
        let actual = handle.value_type()?;
        if actual != expected {
            return Err(ConfidentialError::TypeMismatch { expected, actual });
        }
        self.disclose(handle, requester, viewer).await
    }

    /// Discloses a handle that may still be in flight, polling while it is `HandleNotReady`
    /// until the ready timeout elapses.
    pub async fn disclose_when_ready(
        &self,
        handle: Handle,
        requester: &Context,
        viewer: &dyn Viewer,
    ) -> Result<U256, ConfidentialError> {
        let deadline = Instant::now() + self.config.ready_timeout();
        let poll = self.config.ready_poll();
        loop {
            match self.disclose(handle, requester, viewer).await {
                Err(ConfidentialError::HandleNotReady(_)) if Instant::now() + poll < deadline => {
                    trace!(handle = %handle, "handle not ready, polling");
                    sleep(poll).await;
                }
                other => return other,
            }
        }
    }

    /// Discloses every handle concurrently and waits for all of them.
    ///
    /// The first failure cancels the remaining requests and is returned, no partial result is
    /// handed out.
    pub async fn disclose_all(
        &self,
        handles: &[Handle],
        requester: &Context,
        viewer: &dyn Viewer,
    ) -> Result<Vec<U256>, ConfidentialError> {
        try_join_all(
            handles
                .iter()
                .map(|handle| self.disclose_when_ready(*handle, requester, viewer)),
        )
        .await
    }
}
