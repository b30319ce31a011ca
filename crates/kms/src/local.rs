// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    viewer_digest, Credential, DecryptionNetwork, DisclosureRequest, DisclosureResponse,
    NetworkError,
};
use alloy_primitives::U256;
use async_trait::async_trait;
use cv_crypto::{EciesPublicKey, EciesSecretKey};
use cv_encrypt::decrypt_input;
use cv_events::Handle;
use cv_host::{ComputeOp, HostChain};
use rand::rngs::OsRng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Number of covalidator shares a value is split into
pub const DEFAULT_THRESHOLD: u32 = 3;

#[derive(Default)]
struct CoprocessorState {
    processed: usize,
    values: HashMap<Handle, U256>,
    /// Results that can never be produced, eg. ops over a handle the host never registered
    invalid: HashSet<Handle>,
}

struct Inner {
    host: HostChain,
    secret: EciesSecretKey,
    threshold: u32,
    state: Mutex<CoprocessorState>,
    available: AtomicBool,
    delay_ms: AtomicU64,
    synced: watch::Sender<usize>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CoprocessorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Evaluates every op appended to the host log since the last call
    fn process_pending(&self) -> usize {
        let mut state = self.lock();
        for op in self.host.ops_since(state.processed) {
            let result = op.result();
            let value = match &op {
                ComputeOp::Input {
                    ciphertext,
                    context,
                    ..
                } => match decrypt_input(&self.secret, ciphertext, context) {
                    Ok(value) => Some(value),
                    // an input that does not open under its own context is zero
                    Err(e) => {
                        warn!(handle = %result, "undecryptable input taken as zero: {e}");
                        Some(U256::ZERO)
                    }
                },
                _ => op.evaluate(|h| state.values.get(h).copied()),
            };
            match value {
                Some(value) => {
                    state.values.insert(result, value);
                }
                None => {
                    state.invalid.insert(result);
                }
            }
            state.processed += 1;
        }
        let processed = state.processed;
        drop(state);
        self.synced.send_replace(processed);
        processed
    }

    fn authenticate(&self, request: &DisclosureRequest) -> Result<(), NetworkError> {
        let requester = &request.requester;
        let signer = match &request.credential {
            Credential::Viewer { signature } => signature
                .recover(&viewer_digest(requester, &request.reencryption_key))
                .map_err(|e| NetworkError::Denied(e.to_string()))?,
            Credential::Contract { credential } => {
                if !self.host.verify_contract(credential) {
                    return Err(NetworkError::Denied(format!(
                        "{} is not an attested contract",
                        credential.address
                    )));
                }
                credential.address
            }
        };
        if signer != requester.user {
            return Err(NetworkError::Denied(format!(
                "credential of {signer} presented for {}",
                requester.user
            )));
        }
        Ok(())
    }

    fn serve(&self, request: &DisclosureRequest) -> Result<DisclosureResponse, NetworkError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(NetworkError::Unavailable("covalidators offline".to_string()));
        }
        self.authenticate(request)?;

        let requester = &request.requester;
        let handle = request.handle;
        if requester.chain_id != self.host.chain_id() {
            return Err(NetworkError::ContextMismatch(format!(
                "request for chain {} sent to chain {}",
                requester.chain_id,
                self.host.chain_id()
            )));
        }
        let record = self
            .host
            .handle_record(&handle)
            .ok_or(NetworkError::NotReady(handle))?;
        if record.contract != requester.contract {
            return Err(NetworkError::ContextMismatch(format!(
                "handle {handle} belongs to {}, not {}",
                record.contract, requester.contract
            )));
        }
        if !self.host.is_allowed(&handle, &requester.user) {
            return Err(NetworkError::Denied(format!(
                "{} may not read handle {handle}",
                requester.user
            )));
        }

        let state = self.lock();
        let value = match state.values.get(&handle) {
            Some(value) => *value,
            None if state.invalid.contains(&handle) => {
                return Err(NetworkError::Malformed(format!(
                    "handle {handle} has no valid value"
                )))
            }
            None => return Err(NetworkError::NotReady(handle)),
        };
        drop(state);

        DisclosureResponse::seal(request, value, record.value_type, self.threshold, &mut OsRng)
    }
}

async fn follow(inner: Weak<Inner>, mut ops: watch::Receiver<usize>) {
    loop {
        let Some(network) = inner.upgrade() else {
            break;
        };
        let delay = Duration::from_millis(network.delay_ms.load(Ordering::SeqCst));
        drop(network);
        if !delay.is_zero() {
            sleep(delay).await;
        }
        let Some(network) = inner.upgrade() else {
            break;
        };
        let processed = network.process_pending();
        drop(network);
        debug!(processed, "coprocessor caught up");
        if ops.changed().await.is_err() {
            break;
        }
    }
}

/// In process decryption network.
///
/// Holds the network key, follows the host op log in a background task to produce the value
/// behind every handle and answers disclosure requests like the covalidator set would.
/// Must be created inside a tokio runtime.
#[derive(Clone)]
pub struct LocalNetwork {
    inner: Arc<Inner>,
}

impl LocalNetwork {
    pub fn spawn(host: HostChain) -> Self {
        Self::spawn_with_key(host, EciesSecretKey::random(&mut OsRng), DEFAULT_THRESHOLD)
    }

    pub fn spawn_with_key(host: HostChain, secret: EciesSecretKey, threshold: u32) -> Self {
        let (synced, _) = watch::channel(0);
        let ops = host.watch_ops();
        let inner = Arc::new(Inner {
            host,
            secret,
            threshold: threshold.max(1),
            state: Mutex::new(CoprocessorState::default()),
            available: AtomicBool::new(true),
            delay_ms: AtomicU64::new(0),
            synced,
        });
        info!(
            chain_id = inner.host.chain_id(),
            threshold = inner.threshold,
            "local decryption network started"
        );
        tokio::spawn(follow(Arc::downgrade(&inner), ops));
        Self { inner }
    }

    /// Key the encryption gateway encrypts inputs to
    pub fn public_key(&self) -> EciesPublicKey {
        self.inner.secret.public_key()
    }

    pub fn threshold(&self) -> u32 {
        self.inner.threshold
    }

    /// Takes the network offline or back online. Offline requests fail as unavailable.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Latency between an op landing on the host and the coprocessor evaluating it
    pub fn set_delay(&self, delay: Duration) {
        self.inner
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of host ops evaluated so far
    pub fn processed(&self) -> usize {
        self.inner.lock().processed
    }

    /// Resolves once every op on the host at the time of the call has been evaluated
    pub async fn synced(&self) {
        let target = self.inner.host.op_count();
        let mut rx = self.inner.synced.subscribe();
        let _ = rx.wait_for(|processed| *processed >= target).await;
    }
}

#[async_trait]
impl DecryptionNetwork for LocalNetwork {
    async fn disclose(
        &self,
        request: DisclosureRequest,
    ) -> Result<DisclosureResponse, NetworkError> {
        debug!(
            correlation_id = request.correlation_id,
            handle = %request.handle,
            requester = %request.requester,
            "disclosure request"
        );
        self.inner.serve(&request)
    }
}
