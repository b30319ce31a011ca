// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Deployment;
use alloy_primitives::{Address, U256};
use cv_auction::{required_escrow, Settlement};
use cv_crypto::Wallet;
use cv_encrypt::Encryptor;
use cv_ledger::TransferReceipt;
use cv_events::{AuctionId, ConfidentialError, Context, Handle, InputCiphertext, Operation, ValueType};
use tracing::debug;

/// Type transfer amounts are encrypted as
pub const AMOUNT_TYPE: ValueType = ValueType::Uint64;
/// Type bid quantities and prices are encrypted as
pub const BID_TYPE: ValueType = ValueType::Uint16;

/// Result of a submitted [`Operation`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Minted(Handle),
    Transferred { from: Handle, to: Handle },
    AuctionCreated(AuctionId),
    BidPlaced(usize),
    AuctionSettled(Settlement),
}

/// One account talking to a deployment
#[derive(Clone)]
pub struct Client {
    wallet: Wallet,
    deployment: Deployment,
    encryptor: Encryptor,
}

impl Client {
    pub fn new(wallet: Wallet, deployment: Deployment) -> Self {
        let encryptor = Encryptor::from_key(deployment.network_key.clone());
        Self {
            wallet,
            deployment,
            encryptor,
        }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    fn context(&self, contract: Address) -> Context {
        Context::new(self.deployment.host.chain_id(), contract, self.address())
    }

    /// Encrypts `value` for submission by this account to `contract`
    pub fn encrypt(
        &self,
        value: U256,
        value_type: ValueType,
        contract: Address,
    ) -> Result<InputCiphertext, ConfidentialError> {
        self.encryptor
            .encrypt(value, value_type, &self.context(contract))
    }

    /// Plaintext behind a handle this account may read, waiting for it to be computed
    pub async fn disclose(&self, handle: Handle) -> Result<U256, ConfidentialError> {
        let disclosure = &self.deployment.disclosure;
        let requester = disclosure.requester_for(&handle, self.address())?;
        disclosure
            .disclose_when_ready(handle, &requester, &self.wallet)
            .await
    }

    pub fn balance_of(&self) -> Option<Handle> {
        self.deployment.ledger.balance_of(&self.address())
    }

    /// Own balance in plaintext, zero for an account that never held tokens
    pub async fn balance(&self) -> Result<U256, ConfidentialError> {
        match self.balance_of() {
            Some(handle) => self.disclose(handle).await,
            None => Ok(U256::ZERO),
        }
    }

    pub fn mint(&self, account: Address, amount: U256) -> Result<Handle, ConfidentialError> {
        self.deployment.ledger.mint(self.address(), account, amount)
    }

    pub fn transfer(&self, to: Address, amount: U256) -> Result<TransferReceipt, ConfidentialError> {
        let ledger = self.deployment.ledger.address();
        let input = self.encrypt(amount, AMOUNT_TYPE, ledger)?;
        self.deployment.ledger.transfer(self.address(), to, &input)
    }

    /// Lets the auction contract take this account's supply when it opens an auction
    pub fn approve_auction(&self) {
        self.deployment
            .ledger
            .set_operator(self.address(), self.deployment.auction.address(), true);
    }

    pub async fn create_auction(
        &self,
        supply: U256,
        duration_secs: u64,
        min_price: U256,
    ) -> Result<AuctionId, ConfidentialError> {
        self.deployment
            .auction
            .create_auction(
                self.address(),
                self.deployment.ledger.address(),
                supply,
                duration_secs,
                min_price,
            )
            .await
    }

    /// Native coin balance of this account, which pays bid escrows
    pub fn native_balance(&self) -> U256 {
        self.deployment.host.native_balance(&self.address())
    }

    /// Places a sealed bid, paying the smallest escrow the auction accepts
    pub fn place_bid(
        &self,
        auction_id: AuctionId,
        quantity: U256,
        price: U256,
    ) -> Result<usize, ConfidentialError> {
        let auction = self.deployment.auction.address();
        let quantity = self.encrypt(quantity, BID_TYPE, auction)?;
        let price = self.encrypt(price, BID_TYPE, auction)?;
        let escrow = required_escrow(&quantity, &price);
        self.deployment
            .auction
            .place_bid(self.address(), auction_id, &quantity, &price, escrow)
    }

    pub async fn end_auction(&self, auction_id: AuctionId) -> Result<Settlement, ConfidentialError> {
        self.deployment
            .auction
            .end_auction(self.address(), auction_id)
            .await
    }

    /// Validates an operation at the boundary and dispatches it as this account
    pub async fn submit(&self, operation: Operation) -> Result<Outcome, ConfidentialError> {
        operation.validate()?;
        debug!(op = operation.kind(), sender = %self.address(), "submitting operation");
        let deployment = &self.deployment;
        let sender = self.address();
        match operation {
            Operation::Mint { account, amount } => deployment
                .ledger
                .mint(sender, account, amount)
                .map(Outcome::Minted),
            Operation::Transfer { to, amount } => deployment
                .ledger
                .transfer(sender, to, &amount)
                .map(|receipt| Outcome::Transferred {
                    from: receipt.from_balance,
                    to: receipt.to_balance,
                }),
            Operation::CreateAuction {
                token,
                supply,
                duration_secs,
                min_price,
            } => deployment
                .auction
                .create_auction(sender, token, supply, duration_secs, min_price)
                .await
                .map(Outcome::AuctionCreated),
            Operation::PlaceBid {
                auction_id,
                quantity,
                price,
                escrow,
            } => deployment
                .auction
                .place_bid(sender, auction_id, &quantity, &price, escrow)
                .map(Outcome::BidPlaced),
            Operation::EndAuction { auction_id } => deployment
                .auction
                .end_auction(sender, auction_id)
                .await
                .map(Outcome::AuctionSettled),
        }
    }
}
