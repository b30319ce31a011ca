// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::{Address, U256};
use cv_disclosure::DisclosureService;
use cv_events::{
    ConfidentialError, Context, Handle, InputCiphertext, Minted, Transferred,
    UserBalanceDecrypted, ValueType,
};
use cv_host::{ContractCredential, HostChain};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Type of every balance handle
pub const BALANCE_TYPE: ValueType = ValueType::Uint256;

/// Handles produced by one transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    pub from_balance: Handle,
    pub to_balance: Handle,
    /// What actually moved: the amount, or zero when the balance did not cover it
    pub moved: Handle,
}

struct LedgerState {
    owner: Address,
    minters: HashSet<Address>,
    /// Every balance handle an account ever had, the last one is current
    balances: HashMap<Address, Vec<Handle>>,
    /// holder -> accounts allowed to move the holder's tokens
    operators: HashMap<Address, HashSet<Address>>,
    total_minted: U256,
}

/// Token ledger whose balances are handles.
///
/// Balances are only ever replaced through symbolic operations on the host, the ledger never
/// sees a plaintext amount apart from public mint amounts.
#[derive(Clone)]
pub struct ConfidentialLedger {
    host: HostChain,
    credential: ContractCredential,
    disclosure: DisclosureService,
    zero: Handle,
    state: Arc<Mutex<LedgerState>>,
}

impl ConfidentialLedger {
    /// Deploys a ledger owned by `owner`
    pub fn deploy(
        host: HostChain,
        disclosure: DisclosureService,
        owner: Address,
    ) -> Result<Self, ConfidentialError> {
        let credential = host.deploy(owner, "ConfidentialLedger");
        let zero = host.trivial_encrypt(credential.address, U256::ZERO, BALANCE_TYPE)?;
        info!(ledger = %credential.address, owner = %owner, "ledger deployed");
        Ok(Self {
            host,
            credential,
            disclosure,
            zero,
            state: Arc::new(Mutex::new(LedgerState {
                owner,
                minters: HashSet::from([owner]),
                balances: HashMap::new(),
                operators: HashMap::new(),
                total_minted: U256::ZERO,
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn address(&self) -> Address {
        self.credential.address
    }

    pub fn owner(&self) -> Address {
        self.lock().owner
    }

    /// Context client ciphertexts for this ledger must be bound to
    pub fn context_for(&self, user: Address) -> Context {
        Context::new(self.host.chain_id(), self.address(), user)
    }

    pub fn add_minter(&self, caller: Address, minter: Address) -> Result<(), ConfidentialError> {
        let mut state = self.lock();
        if caller != state.owner {
            return Err(ConfidentialError::Unauthorized(format!(
                "{caller} is not the ledger owner"
            )));
        }
        state.minters.insert(minter);
        Ok(())
    }

    /// Adds a public `amount` to the balance of `account`.
    ///
    /// The amount becomes a handle and is added to the current balance handle, the old balance
    /// is never decrypted.
    pub fn mint(
        &self,
        caller: Address,
        account: Address,
        amount: U256,
    ) -> Result<Handle, ConfidentialError> {
        let mut state = self.lock();
        if !state.minters.contains(&caller) {
            return Err(ConfidentialError::Unauthorized(format!(
                "{caller} may not mint"
            )));
        }
        non_zero(account)?;

        let ledger = self.address();
        let amount_handle = self.host.trivial_encrypt(ledger, amount, BALANCE_TYPE)?;
        let current = self.current(&state, &account);
        let balance = self.host.add(ledger, current, amount_handle)?;
        self.replace_balance(&mut state, account, balance)?;
        state.total_minted = state.total_minted.saturating_add(amount);
        drop(state);

        self.host.events().publish(Minted { account, balance });
        Ok(balance)
    }

    /// Moves an encrypted amount submitted by `caller` to `to`.
    ///
    /// The input must be bound to this chain, this ledger and `caller`. The amount is guarded
    /// homomorphically: when the balance does not cover it, zero is moved instead.
    pub fn transfer(
        &self,
        caller: Address,
        to: Address,
        amount: &InputCiphertext,
    ) -> Result<TransferReceipt, ConfidentialError> {
        non_zero(to)?;
        let mut state = self.lock();
        let amount = self.host.verify_input(self.address(), caller, amount)?;
        self.move_tokens(&mut state, caller, to, amount)
    }

    /// Moves an amount handle the caller already holds, eg. a contract paying out
    pub fn transfer_handle(
        &self,
        caller: Address,
        to: Address,
        amount: Handle,
    ) -> Result<TransferReceipt, ConfidentialError> {
        non_zero(to)?;
        self.ensure_can_use(&amount, &caller)?;
        let mut state = self.lock();
        self.move_tokens(&mut state, caller, to, amount)
    }

    /// Allows or revokes `operator` moving tokens of `holder`
    pub fn set_operator(&self, holder: Address, operator: Address, approved: bool) {
        let mut state = self.lock();
        let operators = state.operators.entry(holder).or_default();
        if approved {
            operators.insert(operator);
        } else {
            operators.remove(&operator);
        }
        debug!(holder = %holder, operator = %operator, approved, "operator updated");
    }

    pub fn is_operator(&self, holder: &Address, operator: &Address) -> bool {
        self.lock()
            .operators
            .get(holder)
            .is_some_and(|ops| ops.contains(operator))
    }

    /// Moves tokens of `from` on its behalf. `caller` must be `from` or one of its operators.
    pub fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Handle,
    ) -> Result<TransferReceipt, ConfidentialError> {
        non_zero(to)?;
        self.ensure_can_use(&amount, &caller)?;
        let mut state = self.lock();
        let approved = caller == from
            || state
                .operators
                .get(&from)
                .is_some_and(|ops| ops.contains(&caller));
        if !approved {
            return Err(ConfidentialError::Unauthorized(format!(
                "{caller} is not an operator of {from}"
            )));
        }
        self.move_tokens(&mut state, from, to, amount)
    }

    /// Current balance handle, `None` for an account that never held tokens
    pub fn balance_of(&self, account: &Address) -> Option<Handle> {
        self.lock()
            .balances
            .get(account)
            .and_then(|history| history.last().copied())
    }

    /// Every balance handle the account had, oldest first
    pub fn history_of(&self, account: &Address) -> Vec<Handle> {
        self.lock()
            .balances
            .get(account)
            .cloned()
            .unwrap_or_default()
    }

    pub fn holders(&self) -> Vec<Address> {
        self.lock().balances.keys().copied().collect()
    }

    pub fn total_minted(&self) -> U256 {
        self.lock().total_minted
    }

    /// Discloses the balance of `user` in the ledger's own name and publishes
    /// `UserBalanceDecrypted`. Only the owner or the user may ask.
    pub async fn request_balance_disclosure(
        &self,
        caller: Address,
        user: Address,
    ) -> Result<U256, ConfidentialError> {
        if caller != user && caller != self.owner() {
            return Err(ConfidentialError::Unauthorized(format!(
                "{caller} may not request the balance of {user}"
            )));
        }
        let decrypted_amount = match self.balance_of(&user) {
            Some(handle) => {
                let requester = self.context_for(self.address());
                self.disclosure
                    .disclose_when_ready(handle, &requester, &self.credential)
                    .await?
            }
            None => U256::ZERO,
        };
        self.host.events().publish(UserBalanceDecrypted {
            user,
            decrypted_amount,
        });
        Ok(decrypted_amount)
    }

    fn current(&self, state: &LedgerState, account: &Address) -> Handle {
        state
            .balances
            .get(account)
            .and_then(|history| history.last().copied())
            .unwrap_or(self.zero)
    }

    fn replace_balance(
        &self,
        state: &mut LedgerState,
        account: Address,
        balance: Handle,
    ) -> Result<(), ConfidentialError> {
        self.host.allow(balance, account)?;
        state.balances.entry(account).or_default().push(balance);
        Ok(())
    }

    fn ensure_can_use(&self, amount: &Handle, caller: &Address) -> Result<(), ConfidentialError> {
        if !self.host.is_allowed(amount, caller) {
            return Err(ConfidentialError::Unauthorized(format!(
                "{caller} may not use handle {amount}"
            )));
        }
        if !self.host.is_allowed(amount, &self.address()) {
            return Err(ConfidentialError::Unauthorized(format!(
                "ledger was not granted handle {amount}"
            )));
        }
        Ok(())
    }

    fn move_tokens(
        &self,
        state: &mut LedgerState,
        from: Address,
        to: Address,
        amount: Handle,
    ) -> Result<TransferReceipt, ConfidentialError> {
        let ledger = self.address();
        let from_balance = self.current(state, &from);
        let covered = self.host.ge(ledger, from_balance, amount)?;
        let moved = self.host.select(ledger, covered, amount, self.zero)?;

        let new_from = self.host.sub(ledger, from_balance, moved)?;
        self.replace_balance(state, from, new_from)?;
        let new_to = self.host.add(ledger, self.current(state, &to), moved)?;
        self.replace_balance(state, to, new_to)?;

        self.host.allow(moved, from)?;
        self.host.allow(moved, to)?;
        self.host.events().publish(Transferred {
            from,
            to,
            amount: moved,
        });
        Ok(TransferReceipt {
            from_balance: new_from,
            to_balance: new_to,
            moved,
        })
    }
}

fn non_zero(account: Address) -> Result<(), ConfidentialError> {
    if account.is_zero() {
        return Err(ConfidentialError::InvalidInput(
            "zero address cannot hold tokens".to_string(),
        ));
    }
    Ok(())
}
