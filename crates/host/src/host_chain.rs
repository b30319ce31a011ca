// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::credential::attest;
use crate::ops::derive_result_handle;
use crate::{Acl, Clock, ComputeOp, ContractCredential, SystemClock};
use alloy_primitives::{Address, B256, U256};
use cv_events::{ChainEvent, ConfidentialError, EventBus, Handle, InputCiphertext, ValueType};
use rand::{rngs::OsRng, RngCore};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info};

/// What the host knows about a registered handle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandleRecord {
    pub value_type: ValueType,
    /// Contract whose storage the handle was produced for
    pub contract: Address,
}

struct HostState {
    handles: HashMap<Handle, HandleRecord>,
    consumed: HashSet<Handle>,
    acl: Acl,
    op_log: Vec<ComputeOp>,
    contracts: HashMap<Address, String>,
    deploy_nonces: HashMap<Address, u64>,
    /// Public balances of the native coin, paid along with calls
    native: HashMap<Address, U256>,
}

/// In-process stand-in for the chain the contracts run on.
///
/// It orders every state mutation, keeps the handle registry and ACL, records encrypted
/// operations for the coprocessor and carries the chain event log.
#[derive(Clone)]
pub struct HostChain {
    chain_id: u64,
    secret: B256,
    state: Arc<Mutex<HostState>>,
    op_count: Arc<watch::Sender<usize>>,
    events: EventBus<ChainEvent>,
    clock: Arc<dyn Clock>,
}

impl HostChain {
    pub fn new(chain_id: u64) -> Self {
        Self::with_clock(chain_id, Arc::new(SystemClock))
    }

    pub fn with_clock(chain_id: u64, clock: Arc<dyn Clock>) -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        let (op_count, _) = watch::channel(0);
        Self {
            chain_id,
            secret: B256::from(secret),
            state: Arc::new(Mutex::new(HostState {
                handles: HashMap::new(),
                consumed: HashSet::new(),
                acl: Acl::default(),
                op_log: Vec::new(),
                contracts: HashMap::new(),
                deploy_nonces: HashMap::new(),
                native: HashMap::new(),
            })),
            op_count: Arc::new(op_count),
            events: EventBus::default(),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn events(&self) -> &EventBus<ChainEvent> {
        &self.events
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Current block timestamp
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    //////////////////////////////////////////////////////////////////////////
    // Contracts
    //////////////////////////////////////////////////////////////////////////

    /// Registers a contract deployed by `deployer` and issues its credential
    pub fn deploy(&self, deployer: Address, name: &str) -> ContractCredential {
        let mut state = self.lock();
        let nonce = state.deploy_nonces.entry(deployer).or_insert(0);
        let address = deployer.create(*nonce);
        *nonce += 1;
        state.contracts.insert(address, name.to_string());
        info!(contract = %address, name, "contract deployed");
        ContractCredential {
            address,
            attestation: attest(&self.secret, self.chain_id, &address),
        }
    }

    pub fn verify_contract(&self, credential: &ContractCredential) -> bool {
        self.lock().contracts.contains_key(&credential.address)
            && credential.attestation == attest(&self.secret, self.chain_id, &credential.address)
    }

    pub fn is_contract(&self, address: &Address) -> bool {
        self.lock().contracts.contains_key(address)
    }

    //////////////////////////////////////////////////////////////////////////
    // Handle registry and access control
    //////////////////////////////////////////////////////////////////////////

    pub fn handle_record(&self, handle: &Handle) -> Option<HandleRecord> {
        self.lock().handles.get(handle).copied()
    }

    pub fn allow(&self, handle: Handle, account: Address) -> Result<(), ConfidentialError> {
        let mut state = self.lock();
        ensure_known(&state, &handle)?;
        state.acl.allow(handle, account);
        Ok(())
    }

    pub fn allow_public(&self, handle: Handle) -> Result<(), ConfidentialError> {
        let mut state = self.lock();
        ensure_known(&state, &handle)?;
        state.acl.allow_public(handle);
        Ok(())
    }

    pub fn is_allowed(&self, handle: &Handle, account: &Address) -> bool {
        self.lock().acl.is_allowed(handle, account)
    }

    /// Accepts a client ciphertext submitted to `contract` by `user`.
    ///
    /// Checks run before any state changes: the context must name this chain, the receiving
    /// contract and the submitting user, the handle must be the digest of the ciphertext and
    /// a handle is accepted only once. On success both the user and the contract may use it.
    pub fn verify_input(
        &self,
        contract: Address,
        user: Address,
        input: &InputCiphertext,
    ) -> Result<Handle, ConfidentialError> {
        let handles = self.verify_inputs(contract, user, &[input], U256::ZERO)?;
        Ok(handles[0])
    }

    /// Accepts several ciphertexts of one call together with a native `payment` to `contract`.
    ///
    /// Either every input is accepted and the payment made, or nothing changes: a failing
    /// input or an uncovered payment leaves all inputs unconsumed.
    pub fn verify_inputs(
        &self,
        contract: Address,
        user: Address,
        inputs: &[&InputCiphertext],
        payment: U256,
    ) -> Result<Vec<Handle>, ConfidentialError> {
        for input in inputs {
            self.check_binding(contract, user, input)?;
        }

        let mut state = self.lock();
        let mut seen = HashSet::new();
        for input in inputs {
            if state.consumed.contains(&input.handle) || !seen.insert(input.handle) {
                return Err(ConfidentialError::InputAlreadyConsumed(input.handle));
            }
        }
        move_native(&mut state, user, contract, payment)?;

        let mut handles = Vec::with_capacity(inputs.len());
        let mut count = state.op_log.len();
        for input in inputs {
            let handle = input.handle;
            state.consumed.insert(handle);
            state.handles.insert(
                handle,
                HandleRecord {
                    value_type: input.value_type(),
                    contract,
                },
            );
            state.acl.allow(handle, user);
            state.acl.allow(handle, contract);
            count = push_op(
                &mut state,
                ComputeOp::Input {
                    result: handle,
                    ciphertext: input.ciphertext.clone(),
                    context: input.context,
                },
            );
            handles.push(handle);
        }
        drop(state);
        self.op_count.send_replace(count);
        debug!(inputs = handles.len(), contract = %contract, payment = %payment, "inputs verified");
        Ok(handles)
    }

    fn check_binding(
        &self,
        contract: Address,
        user: Address,
        input: &InputCiphertext,
    ) -> Result<(), ConfidentialError> {
        let context = &input.context;
        if context.chain_id != self.chain_id {
            return Err(ConfidentialError::ContextMismatch(format!(
                "input bound to chain {}, submitted on chain {}",
                context.chain_id, self.chain_id
            )));
        }
        if context.contract != contract {
            return Err(ConfidentialError::ContextMismatch(format!(
                "input bound to contract {}, submitted to {}",
                context.contract, contract
            )));
        }
        if context.user != user {
            return Err(ConfidentialError::ContextMismatch(format!(
                "input bound to user {}, submitted by {}",
                context.user, user
            )));
        }
        if !input.digests_match() {
            return Err(ConfidentialError::InvalidInput(
                "handle is not derived from the ciphertext".to_string(),
            ));
        }
        Ok(())
    }

    //////////////////////////////////////////////////////////////////////////
    // Native balances
    //////////////////////////////////////////////////////////////////////////

    pub fn native_balance(&self, account: &Address) -> U256 {
        self.lock().native.get(account).copied().unwrap_or_default()
    }

    /// Sets the native balance of an account, as a dev chain faucet would
    pub fn set_native_balance(&self, account: Address, amount: U256) {
        self.lock().native.insert(account, amount);
    }

    pub fn transfer_native(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ConfidentialError> {
        move_native(&mut self.lock(), from, to, amount)
    }

    //////////////////////////////////////////////////////////////////////////
    // Symbolic encrypted operations
    //////////////////////////////////////////////////////////////////////////

    /// Handle of a public constant
    pub fn trivial_encrypt(
        &self,
        contract: Address,
        value: U256,
        value_type: ValueType,
    ) -> Result<Handle, ConfidentialError> {
        value_type.check(value)?;
        self.record_op(contract, "trivial_encrypt", &[], value_type, |result| {
            ComputeOp::TrivialEncrypt { result, value }
        })
    }

    pub fn add(
        &self,
        contract: Address,
        lhs: Handle,
        rhs: Handle,
    ) -> Result<Handle, ConfidentialError> {
        let result_type = self.binary_type(&lhs, &rhs)?;
        self.record_op(contract, "add", &[lhs, rhs], result_type, |result| {
            ComputeOp::Add { result, lhs, rhs }
        })
    }

    pub fn sub(
        &self,
        contract: Address,
        lhs: Handle,
        rhs: Handle,
    ) -> Result<Handle, ConfidentialError> {
        let result_type = self.binary_type(&lhs, &rhs)?;
        self.record_op(contract, "sub", &[lhs, rhs], result_type, |result| {
            ComputeOp::Sub { result, lhs, rhs }
        })
    }

    pub fn ge(
        &self,
        contract: Address,
        lhs: Handle,
        rhs: Handle,
    ) -> Result<Handle, ConfidentialError> {
        self.binary_type(&lhs, &rhs)?;
        self.record_op(contract, "ge", &[lhs, rhs], ValueType::Bool, |result| {
            ComputeOp::Ge { result, lhs, rhs }
        })
    }

    pub fn select(
        &self,
        contract: Address,
        condition: Handle,
        if_true: Handle,
        if_false: Handle,
    ) -> Result<Handle, ConfidentialError> {
        let condition_type = self.type_of(&condition)?;
        if condition_type != ValueType::Bool {
            return Err(ConfidentialError::TypeMismatch {
                expected: ValueType::Bool,
                actual: condition_type,
            });
        }
        let result_type = self.binary_type(&if_true, &if_false)?;
        self.record_op(
            contract,
            "select",
            &[condition, if_true, if_false],
            result_type,
            |result| ComputeOp::Select {
                result,
                condition,
                if_true,
                if_false,
            },
        )
    }

    fn type_of(&self, handle: &Handle) -> Result<ValueType, ConfidentialError> {
        self.handle_record(handle)
            .map(|record| record.value_type)
            .ok_or_else(|| ConfidentialError::InvalidInput(format!("unknown handle {handle}")))
    }

    fn binary_type(&self, lhs: &Handle, rhs: &Handle) -> Result<ValueType, ConfidentialError> {
        Ok(self.type_of(lhs)?.widest(self.type_of(rhs)?))
    }

    /// Appends an op computed on behalf of `contract`, which must be allowed to use every
    /// operand. The result is granted to `contract` only.
    fn record_op<F>(
        &self,
        contract: Address,
        name: &str,
        operands: &[Handle],
        result_type: ValueType,
        build: F,
    ) -> Result<Handle, ConfidentialError>
    where
        F: FnOnce(Handle) -> ComputeOp,
    {
        let mut state = self.lock();
        for operand in operands {
            ensure_known(&state, operand)?;
            if !state.acl.is_allowed(operand, &contract) {
                return Err(ConfidentialError::Unauthorized(format!(
                    "{contract} may not use handle {operand}"
                )));
            }
        }
        let sequence = state.op_log.len() as u64;
        let result = derive_result_handle(self.chain_id, sequence, name, operands, result_type);
        state.handles.insert(
            result,
            HandleRecord {
                value_type: result_type,
                contract,
            },
        );
        state.acl.allow(result, contract);
        let count = push_op(&mut state, build(result));
        drop(state);
        self.op_count.send_replace(count);
        debug!(op = name, result = %result, "op recorded");
        Ok(result)
    }

    //////////////////////////////////////////////////////////////////////////
    // Op log
    //////////////////////////////////////////////////////////////////////////

    pub fn op_count(&self) -> usize {
        self.lock().op_log.len()
    }

    /// Ops from `index` onwards, in log order
    pub fn ops_since(&self, index: usize) -> Vec<ComputeOp> {
        let state = self.lock();
        state.op_log.get(index..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Notified with the new log length after every append
    pub fn watch_ops(&self) -> watch::Receiver<usize> {
        self.op_count.subscribe()
    }
}

fn ensure_known(state: &HostState, handle: &Handle) -> Result<(), ConfidentialError> {
    if state.handles.contains_key(handle) {
        Ok(())
    } else {
        Err(ConfidentialError::InvalidInput(format!("unknown handle {handle}")))
    }
}

fn move_native(
    state: &mut HostState,
    from: Address,
    to: Address,
    amount: U256,
) -> Result<(), ConfidentialError> {
    if amount.is_zero() {
        return Ok(());
    }
    let available = state.native.get(&from).copied().unwrap_or_default();
    if available < amount {
        return Err(ConfidentialError::InsufficientFunds {
            account: from,
            required: amount,
            available,
        });
    }
    state.native.insert(from, available - amount);
    let credited = state.native.entry(to).or_default();
    *credited = credited.saturating_add(amount);
    Ok(())
}

fn push_op(state: &mut HostState, op: ComputeOp) -> usize {
    state.op_log.push(op);
    state.op_log.len()
}
