// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{clear, Auction, AuctionState, Bid, ClearingStatus, PlainBid, Settlement};
use alloy_primitives::{Address, U256};
use cv_disclosure::DisclosureService;
use cv_events::{
    AuctionClosed, AuctionCreated, AuctionId, AuctionSettled, BidPlaced, BidSettled,
    ConfidentialError, Context, Handle, InputCiphertext,
};
use cv_host::{ContractCredential, HostChain};
use cv_ledger::{ConfidentialLedger, BALANCE_TYPE};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, info_span, warn, Instrument};

struct EngineState {
    auctions: BTreeMap<AuctionId, Auction>,
    next_id: AuctionId,
}

/// What clearing needs from an auction once the gate let the caller through
struct ClearingRun {
    creator: Address,
    supply: U256,
    min_price: U256,
    bids: Vec<Bid>,
}

/// Escrow a bid must carry: the product of the largest values its handle types can hold.
///
/// The product saturates at `U256::MAX`, so a bid using `Uint256` quantity or price handles
/// needs an escrow no account can pay. Bids are meant to use narrow types such as `Uint16`.
pub fn required_escrow(quantity: &InputCiphertext, price: &InputCiphertext) -> U256 {
    quantity
        .value_type()
        .max()
        .saturating_mul(price.value_type().max())
}

/// Sealed bid auctions of ledger tokens, cleared at a single price.
///
/// Bids stay encrypted until `end_auction`, where the auction contract discloses them in its
/// own name. The `Open -> Closed` transition gates clearing so that at most one run is in
/// flight and a settled auction is never cleared again.
#[derive(Clone)]
pub struct AuctionEngine {
    host: HostChain,
    ledger: ConfidentialLedger,
    disclosure: DisclosureService,
    credential: ContractCredential,
    state: Arc<Mutex<EngineState>>,
}

impl AuctionEngine {
    pub fn deploy(
        host: HostChain,
        ledger: ConfidentialLedger,
        disclosure: DisclosureService,
        deployer: Address,
    ) -> Self {
        let credential = host.deploy(deployer, "SealedBidAuction");
        info!(auction = %credential.address, token = %ledger.address(), "auction deployed");
        Self {
            host,
            ledger,
            disclosure,
            credential,
            state: Arc::new(Mutex::new(EngineState {
                auctions: BTreeMap::new(),
                next_id: AuctionId::new(0),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn address(&self) -> Address {
        self.credential.address
    }

    /// Context bid ciphertexts must be bound to
    pub fn context_for(&self, bidder: Address) -> Context {
        Context::new(self.host.chain_id(), self.address(), bidder)
    }

    pub fn auction(&self, id: AuctionId) -> Option<Auction> {
        self.lock().auctions.get(&id).cloned()
    }

    pub fn state_of(&self, id: AuctionId) -> Option<AuctionState> {
        self.lock().auctions.get(&id).map(|a| a.state)
    }

    /// Opens an auction selling `supply` tokens of the creator.
    ///
    /// The supply moves from the creator into the auction account through the ledger
    /// operator path, so the creator must have approved this contract as operator. The ledger
    /// moves zero when the creator's balance does not cover the supply, so the moved amount is
    /// disclosed in the auction's own name and a shortfall is rejected with `SupplyNotCovered`.
    /// If that disclosure fails, whatever moved goes back to the creator.
    pub async fn create_auction(
        &self,
        creator: Address,
        token: Address,
        supply: U256,
        duration_secs: u64,
        min_price: U256,
    ) -> Result<AuctionId, ConfidentialError> {
        if token != self.ledger.address() {
            return Err(ConfidentialError::InvalidInput(format!(
                "token {token} is not traded here"
            )));
        }
        if supply.is_zero() || duration_secs == 0 {
            return Err(ConfidentialError::InvalidInput(
                "supply and duration must be non zero".to_string(),
            ));
        }
        BALANCE_TYPE.check(supply)?;

        let auction = self.address();
        let requested = self.host.trivial_encrypt(auction, supply, BALANCE_TYPE)?;
        self.host.allow(requested, self.ledger.address())?;
        let escrow = self
            .ledger
            .transfer_from(auction, creator, auction, requested)?
            .moved;

        let span = info_span!("escrow_supply", creator = %creator);
        let escrowed = match self.disclose_escrow(escrow).instrument(span).await {
            Ok(escrowed) => escrowed,
            Err(e) => {
                warn!(creator = %creator, "supply escrow could not be checked: {e}");
                self.ledger.transfer_handle(auction, creator, escrow)?;
                return Err(e);
            }
        };
        if escrowed < supply {
            if !escrowed.is_zero() {
                self.ledger.transfer_handle(auction, creator, escrow)?;
            }
            return Err(ConfidentialError::SupplyNotCovered { supply, escrowed });
        }

        let deadline = self.host.now().saturating_add(duration_secs);
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id = id.next();
        state.auctions.insert(
            id,
            Auction {
                id,
                creator,
                token,
                supply,
                escrow,
                min_price,
                deadline,
                bids: vec![],
                state: AuctionState::Open,
                clearing: ClearingStatus::Idle,
                settlement: None,
            },
        );
        drop(state);

        self.host.events().publish(AuctionCreated {
            auction_id: id,
            creator,
            token,
            supply,
            min_price,
            deadline,
        });
        Ok(id)
    }

    async fn disclose_escrow(&self, escrow: Handle) -> Result<U256, ConfidentialError> {
        let requester = self.disclosure.requester_for(&escrow, self.address())?;
        self.disclosure
            .disclose_when_ready(escrow, &requester, &self.credential)
            .await
    }

    /// Records an encrypted bid and returns its index.
    ///
    /// Both ciphertexts must be bound to this chain, this contract and `bidder`. The escrow
    /// is checked against [`required_escrow`] and then paid from the bidder's native balance
    /// in the same step that consumes both inputs, so a rejected bid leaves them unused.
    pub fn place_bid(
        &self,
        bidder: Address,
        auction_id: AuctionId,
        quantity: &InputCiphertext,
        price: &InputCiphertext,
        escrow: U256,
    ) -> Result<usize, ConfidentialError> {
        let mut state = self.lock();
        let now = self.host.now();
        let auction = state
            .auctions
            .get_mut(&auction_id)
            .ok_or(ConfidentialError::AuctionNotFound(auction_id))?;
        if auction.state != AuctionState::Open || now >= auction.deadline {
            return Err(ConfidentialError::AuctionNotOpen(auction_id));
        }

        let required = required_escrow(quantity, price);
        if escrow < required {
            return Err(ConfidentialError::InsufficientEscrow {
                required,
                provided: escrow,
            });
        }
        if quantity.handle == price.handle {
            return Err(ConfidentialError::InvalidInput(
                "quantity and price must be distinct inputs".to_string(),
            ));
        }
        if quantity.context != price.context {
            return Err(ConfidentialError::ContextMismatch(
                "quantity and price are bound to different contexts".to_string(),
            ));
        }

        let contract = self.credential.address;
        let handles = self
            .host
            .verify_inputs(contract, bidder, &[quantity, price], escrow)?;
        let (quantity, price) = (handles[0], handles[1]);

        let bid_index = auction.bids.len();
        auction.bids.push(Bid {
            auction_id,
            bidder,
            quantity,
            price,
            escrow,
            settled: false,
        });
        drop(state);

        self.host.events().publish(BidPlaced {
            auction_id,
            bidder,
            bid_index,
            quantity,
            price,
            escrow,
        });
        Ok(bid_index)
    }

    /// Passes the gate or fails without touching state
    fn begin_clearing(
        &self,
        caller: Address,
        auction_id: AuctionId,
    ) -> Result<ClearingRun, ConfidentialError> {
        let mut state = self.lock();
        let now = self.host.now();
        let auction = state
            .auctions
            .get_mut(&auction_id)
            .ok_or(ConfidentialError::AuctionNotFound(auction_id))?;

        let closing = match (auction.state, auction.clearing) {
            (AuctionState::Open, _) => {
                if now < auction.deadline && caller != auction.creator {
                    return Err(ConfidentialError::DeadlineNotReached(auction_id));
                }
                true
            }
            (AuctionState::Closed, ClearingStatus::Failed | ClearingStatus::Idle) => false,
            (AuctionState::Closed, ClearingStatus::InFlight) | (AuctionState::Settled, _) => {
                return Err(ConfidentialError::AuctionAlreadySettled(auction_id))
            }
        };

        auction.state = AuctionState::Closed;
        auction.clearing = ClearingStatus::InFlight;
        let run = ClearingRun {
            creator: auction.creator,
            supply: auction.supply,
            min_price: auction.min_price,
            bids: auction.bids.clone(),
        };
        drop(state);

        if closing {
            self.host.events().publish(AuctionClosed { auction_id });
        }
        Ok(run)
    }

    fn fail_clearing(&self, auction_id: AuctionId) {
        if let Some(auction) = self.lock().auctions.get_mut(&auction_id) {
            auction.clearing = ClearingStatus::Failed;
        }
    }

    /// Closes the auction and settles it at a uniform price.
    ///
    /// Any caller may end an auction past its deadline, the creator may end it early. Every
    /// bid is disclosed before clearing starts. Winners receive their tokens, each bidder gets
    /// back the escrow its fill did not use and the creator is paid the proceeds; if any disclosure fails the auction stays
    /// closed and the call can be repeated once the network recovers. An auction without bids
    /// settles at `min_price` with nothing sold and the call reports `NoBids`.
    pub async fn end_auction(
        &self,
        caller: Address,
        auction_id: AuctionId,
    ) -> Result<Settlement, ConfidentialError> {
        let run = self.begin_clearing(caller, auction_id)?;
        let span = info_span!("clearing", auction_id = %auction_id, bids = run.bids.len());

        let plain = match self.disclose_bids(&run.bids).instrument(span).await {
            Ok(plain) => plain,
            Err(e) => {
                warn!(auction_id = %auction_id, "clearing aborted: {e}");
                self.fail_clearing(auction_id);
                return Err(e);
            }
        };

        let clearing = clear(&plain, run.supply, run.min_price);
        let price = clearing.clearing_price;
        let refunds: Vec<U256> = run
            .bids
            .iter()
            .zip(&clearing.fills)
            .map(|(bid, fill)| bid.escrow.saturating_sub(fill.saturating_mul(price)))
            .collect();
        let settlement = Settlement {
            clearing_price: price,
            total_quantity_sold: clearing.total_quantity_sold,
            proceeds: clearing.total_quantity_sold.saturating_mul(price),
            fills: clearing.fills,
            refunds,
        };

        {
            let mut state = self.lock();
            if let Some(auction) = state.auctions.get_mut(&auction_id) {
                auction.state = AuctionState::Settled;
                auction.clearing = ClearingStatus::Idle;
                auction.settlement = Some(settlement.clone());
                for bid in auction.bids.iter_mut() {
                    bid.settled = true;
                }
            }
        }

        self.pay_out(auction_id, &run, &settlement)?;
        info!(
            auction_id = %auction_id,
            clearing_price = %settlement.clearing_price,
            sold = %settlement.total_quantity_sold,
            "auction settled"
        );

        if run.bids.is_empty() {
            return Err(ConfidentialError::NoBids(auction_id));
        }
        Ok(settlement)
    }

    async fn disclose_bids(&self, bids: &[Bid]) -> Result<Vec<PlainBid>, ConfidentialError> {
        let handles: Vec<_> = bids.iter().flat_map(|b| [b.quantity, b.price]).collect();
        let requester = self.context_for(self.address());
        let values = self
            .disclosure
            .disclose_all(&handles, &requester, &self.credential)
            .await?;
        Ok(values
            .chunks_exact(2)
            .enumerate()
            .map(|(index, pair)| PlainBid {
                index,
                quantity: pair[0],
                price: pair[1],
            })
            .collect())
    }

    /// Moves allocations to winners and unsold supply back to the creator, returns unused
    /// escrow to bidders and the proceeds to the creator, then publishes the settlement events
    fn pay_out(
        &self,
        auction_id: AuctionId,
        run: &ClearingRun,
        settlement: &Settlement,
    ) -> Result<(), ConfidentialError> {
        let auction = self.address();
        let pay = |to: Address, amount: U256| -> Result<(), ConfidentialError> {
            if amount.is_zero() {
                return Ok(());
            }
            let handle = self.host.trivial_encrypt(auction, amount, BALANCE_TYPE)?;
            self.host.allow(handle, self.ledger.address())?;
            self.ledger.transfer_handle(auction, to, handle)?;
            Ok(())
        };

        for (bid, fill) in run.bids.iter().zip(&settlement.fills) {
            pay(bid.bidder, *fill)?;
        }
        pay(
            run.creator,
            run.supply.saturating_sub(settlement.total_quantity_sold),
        )?;

        for (bid, refund) in run.bids.iter().zip(&settlement.refunds) {
            self.host.transfer_native(auction, bid.bidder, *refund)?;
        }
        self.host
            .transfer_native(auction, run.creator, settlement.proceeds)?;

        for (bid_index, bid) in run.bids.iter().enumerate() {
            self.host.events().publish(BidSettled {
                auction_id,
                bidder: bid.bidder,
                bid_index,
                quantity_filled: settlement.fills[bid_index],
                refund: settlement.refunds[bid_index],
            });
        }
        self.host.events().publish(AuctionSettled {
            auction_id,
            clearing_price: settlement.clearing_price,
            total_quantity_sold: settlement.total_quantity_sold,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_config::DisclosureConfig;
    use cv_crypto::Wallet;
    use cv_encrypt::Encryptor;
    use cv_events::{ChainEvent, ValueType};
    use cv_host::ManualClock;
    use cv_kms::LocalNetwork;
    use rand::rngs::OsRng;
    use std::time::Duration;

    const ESCROW: u64 = 65_535 * 65_535;
    const FUNDS: u64 = 10 * ESCROW;

    struct Fixture {
        host: HostChain,
        clock: Arc<ManualClock>,
        network: LocalNetwork,
        disclosure: DisclosureService,
        ledger: ConfidentialLedger,
        engine: AuctionEngine,
        alice: Wallet,
        bob: Wallet,
        carol: Wallet,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(1_000));
        let host = HostChain::with_clock(31337, clock.clone());
        let network = LocalNetwork::spawn(host.clone());
        let disclosure = DisclosureService::new(
            Arc::new(network.clone()),
            Arc::new(host.clone()),
            DisclosureConfig::fast(),
        );
        let alice = Wallet::random(&mut OsRng);
        let ledger =
            ConfidentialLedger::deploy(host.clone(), disclosure.clone(), alice.address()).unwrap();
        let engine =
            AuctionEngine::deploy(host.clone(), ledger.clone(), disclosure.clone(), alice.address());
        ledger
            .mint(alice.address(), alice.address(), U256::from(1_000))
            .unwrap();
        ledger.set_operator(alice.address(), engine.address(), true);
        let bob = Wallet::random(&mut OsRng);
        let carol = Wallet::random(&mut OsRng);
        for bidder in [&bob, &carol] {
            host.set_native_balance(bidder.address(), U256::from(FUNDS));
        }
        Fixture {
            host,
            clock,
            network,
            disclosure,
            ledger,
            engine,
            alice,
            bob,
            carol,
        }
    }

    impl Fixture {
        async fn create(&self) -> AuctionId {
            self.engine
                .create_auction(
                    self.alice.address(),
                    self.ledger.address(),
                    U256::from(1_000),
                    3_600,
                    U256::from(2),
                )
                .await
                .unwrap()
        }

        fn encrypt(&self, bidder: &Wallet, value: u64) -> InputCiphertext {
            Encryptor::from_key(self.network.public_key())
                .encrypt(
                    U256::from(value),
                    ValueType::Uint16,
                    &self.engine.context_for(bidder.address()),
                )
                .unwrap()
        }

        fn bid(&self, id: AuctionId, bidder: &Wallet, quantity: u64, price: u64) -> usize {
            self.engine
                .place_bid(
                    bidder.address(),
                    id,
                    &self.encrypt(bidder, quantity),
                    &self.encrypt(bidder, price),
                    U256::from(ESCROW),
                )
                .unwrap()
        }

        async fn balance(&self, wallet: &Wallet) -> U256 {
            let Some(handle) = self.ledger.balance_of(&wallet.address()) else {
                return U256::ZERO;
            };
            self.disclosure
                .disclose_when_ready(handle, &self.ledger.context_for(wallet.address()), wallet)
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_settles_at_uniform_price() {
        let f = fixture();
        let id = f.create().await;
        f.bid(id, &f.bob, 500, 2);
        f.bid(id, &f.carol, 600, 8);
        f.clock.advance(3_600);

        let settlement = f.engine.end_auction(f.bob.address(), id).await.unwrap();
        assert_eq!(settlement.clearing_price, U256::from(2));
        assert_eq!(settlement.total_quantity_sold, U256::from(1_000));
        assert_eq!(settlement.fills, vec![U256::from(400), U256::from(600)]);
        assert_eq!(
            settlement.refunds,
            vec![U256::from(ESCROW - 800), U256::from(ESCROW - 1_200)]
        );
        assert_eq!(settlement.proceeds, U256::from(2_000));
        assert_eq!(f.engine.state_of(id), Some(AuctionState::Settled));

        assert_eq!(f.balance(&f.bob).await, U256::from(400));
        assert_eq!(f.balance(&f.carol).await, U256::from(600));
        assert_eq!(f.balance(&f.alice).await, U256::ZERO);
        assert_eq!(f.host.events().history_of("BidSettled").len(), 2);

        assert_eq!(f.host.native_balance(&f.bob.address()), U256::from(FUNDS - 800));
        assert_eq!(f.host.native_balance(&f.carol.address()), U256::from(FUNDS - 1_200));
        assert_eq!(f.host.native_balance(&f.alice.address()), U256::from(2_000));
        assert_eq!(f.host.native_balance(&f.engine.address()), U256::ZERO);
    }

    #[tokio::test]
    async fn test_bid_pays_escrow() {
        let f = fixture();
        let id = f.create().await;
        f.bid(id, &f.bob, 5, 5);
        assert_eq!(
            f.host.native_balance(&f.bob.address()),
            U256::from(FUNDS - ESCROW)
        );
        assert_eq!(f.host.native_balance(&f.engine.address()), U256::from(ESCROW));

        let broke = Wallet::random(&mut OsRng);
        let quantity = f.encrypt(&broke, 1);
        let price = f.encrypt(&broke, 1);
        assert!(matches!(
            f.engine
                .place_bid(broke.address(), id, &quantity, &price, U256::from(ESCROW)),
            Err(ConfidentialError::InsufficientFunds { .. })
        ));
        f.host.set_native_balance(broke.address(), U256::from(ESCROW));
        assert_eq!(
            f.engine
                .place_bid(broke.address(), id, &quantity, &price, U256::from(ESCROW)),
            Ok(1)
        );
    }

    #[tokio::test]
    async fn test_rejected_price_leaves_quantity_unused() {
        let f = fixture();
        let id = f.create().await;
        let quantity = f.encrypt(&f.bob, 10);
        let price = f.encrypt(&f.bob, 3);
        let used_price = f.encrypt(&f.bob, 4);
        f.host
            .verify_input(f.engine.address(), f.bob.address(), &used_price)
            .unwrap();

        assert_eq!(
            f.engine
                .place_bid(f.bob.address(), id, &quantity, &used_price, U256::from(ESCROW)),
            Err(ConfidentialError::InputAlreadyConsumed(used_price.handle))
        );
        assert_eq!(f.host.native_balance(&f.bob.address()), U256::from(FUNDS));
        assert_eq!(
            f.engine
                .place_bid(f.bob.address(), id, &quantity, &price, U256::from(ESCROW)),
            Ok(0)
        );
    }

    #[tokio::test]
    async fn test_uncovered_supply_is_rejected() {
        let f = fixture();
        f.ledger
            .set_operator(f.bob.address(), f.engine.address(), true);
        let token = f.ledger.address();
        assert_eq!(
            f.engine
                .create_auction(f.bob.address(), token, U256::from(1_000), 3_600, U256::from(1))
                .await,
            Err(ConfidentialError::SupplyNotCovered {
                supply: U256::from(1_000),
                escrowed: U256::ZERO,
            })
        );
        assert!(f.engine.auction(AuctionId::new(0)).is_none());

        // alice covers more than bob asked for, but not this
        assert!(matches!(
            f.engine
                .create_auction(f.alice.address(), token, U256::from(1_001), 3_600, U256::from(1))
                .await,
            Err(ConfidentialError::SupplyNotCovered { .. })
        ));
        assert_eq!(f.balance(&f.alice).await, U256::from(1_000));

        let id = f.create().await;
        assert_eq!(id, AuctionId::new(0));
        assert_eq!(f.balance(&f.alice).await, U256::ZERO);
    }

    #[tokio::test]
    async fn test_escrow_returned_when_unverifiable() {
        let f = fixture();
        f.network.set_available(false);
        let result = f
            .engine
            .create_auction(
                f.alice.address(),
                f.ledger.address(),
                U256::from(300),
                3_600,
                U256::from(1),
            )
            .await;
        assert!(matches!(
            result,
            Err(ConfidentialError::DisclosureUnavailable(_))
        ));
        f.network.set_available(true);
        assert_eq!(f.balance(&f.alice).await, U256::from(1_000));
        assert!(f.engine.auction(AuctionId::new(0)).is_none());
    }

    #[tokio::test]
    async fn test_rebound_bid_clears_as_zero() {
        let f = fixture();
        let id = f.create().await;
        // sealed for carol, relabelled with bob's context so the digests check out
        let quantity = InputCiphertext::new(
            f.encrypt(&f.carol, 900).ciphertext,
            f.engine.context_for(f.bob.address()),
        );
        let price = InputCiphertext::new(
            f.encrypt(&f.carol, 50).ciphertext,
            f.engine.context_for(f.bob.address()),
        );
        f.engine
            .place_bid(f.bob.address(), id, &quantity, &price, U256::from(ESCROW))
            .unwrap();
        f.bid(id, &f.carol, 300, 4);
        f.clock.advance(3_600);

        let settlement = f.engine.end_auction(f.alice.address(), id).await.unwrap();
        assert_eq!(settlement.fills, vec![U256::ZERO, U256::from(300)]);
        assert_eq!(settlement.clearing_price, U256::from(2));
        assert_eq!(f.balance(&f.carol).await, U256::from(300));
        assert_eq!(f.balance(&f.bob).await, U256::ZERO);
        assert_eq!(f.balance(&f.alice).await, U256::from(700));
        assert_eq!(f.host.native_balance(&f.bob.address()), U256::from(FUNDS));
    }

    #[tokio::test]
    async fn test_end_auction_once() {
        let f = fixture();
        let id = f.create().await;
        f.bid(id, &f.bob, 10, 3);

        f.engine.end_auction(f.alice.address(), id).await.unwrap();
        assert_eq!(
            f.engine.end_auction(f.alice.address(), id).await,
            Err(ConfidentialError::AuctionAlreadySettled(id))
        );
        assert_eq!(f.host.events().history_of("AuctionSettled").len(), 1);
        // unsold supply went back
        assert_eq!(f.balance(&f.alice).await, U256::from(990));
    }

    #[tokio::test]
    async fn test_concurrent_end_auction() {
        let f = fixture();
        let id = f.create().await;
        f.bid(id, &f.bob, 10, 3);
        f.clock.advance(3_600);

        let (a, b) = tokio::join!(
            f.engine.end_auction(f.bob.address(), id),
            f.engine.end_auction(f.carol.address(), id)
        );
        assert!(a.is_ok() != b.is_ok());
        let err = a.err().or(b.err()).unwrap();
        assert_eq!(err, ConfidentialError::AuctionAlreadySettled(id));
        assert_eq!(f.host.events().history_of("AuctionSettled").len(), 1);
    }

    #[tokio::test]
    async fn test_empty_auction() {
        let f = fixture();
        let id = f.create().await;
        f.clock.advance(3_600);

        assert_eq!(
            f.engine.end_auction(f.bob.address(), id).await,
            Err(ConfidentialError::NoBids(id))
        );
        let auction = f.engine.auction(id).unwrap();
        assert_eq!(auction.state, AuctionState::Settled);
        let settlement = auction.settlement.unwrap();
        assert_eq!(settlement.clearing_price, U256::from(2));
        assert_eq!(settlement.total_quantity_sold, U256::ZERO);
        assert!(matches!(
            f.host.events().history_of("AuctionSettled")[0],
            ChainEvent::AuctionSettled(AuctionSettled { total_quantity_sold, .. })
                if total_quantity_sold.is_zero()
        ));
        assert_eq!(f.balance(&f.alice).await, U256::from(1_000));
    }

    #[tokio::test]
    async fn test_deadline_and_state_checks() {
        let f = fixture();
        let id = f.create().await;
        assert_eq!(
            f.engine.end_auction(f.bob.address(), id).await,
            Err(ConfidentialError::DeadlineNotReached(id))
        );
        assert_eq!(f.engine.state_of(id), Some(AuctionState::Open));

        f.clock.advance(3_600);
        let quantity = f.encrypt(&f.bob, 1);
        let price = f.encrypt(&f.bob, 1);
        assert_eq!(
            f.engine
                .place_bid(f.bob.address(), id, &quantity, &price, U256::from(ESCROW)),
            Err(ConfidentialError::AuctionNotOpen(id))
        );
        let missing = AuctionId::new(99);
        assert_eq!(
            f.engine.end_auction(f.bob.address(), missing).await,
            Err(ConfidentialError::AuctionNotFound(missing))
        );
    }

    #[tokio::test]
    async fn test_bid_validation() {
        let f = fixture();
        let id = f.create().await;
        let quantity = f.encrypt(&f.bob, 1);
        let price = f.encrypt(&f.bob, 1);

        assert!(matches!(
            f.engine
                .place_bid(f.bob.address(), id, &quantity, &price, U256::from(ESCROW - 1)),
            Err(ConfidentialError::InsufficientEscrow { .. })
        ));
        assert!(matches!(
            f.engine
                .place_bid(f.carol.address(), id, &quantity, &price, U256::from(ESCROW)),
            Err(ConfidentialError::ContextMismatch(_))
        ));
        let carols_price = f.encrypt(&f.carol, 1);
        assert!(matches!(
            f.engine
                .place_bid(f.bob.address(), id, &quantity, &carols_price, U256::from(ESCROW)),
            Err(ConfidentialError::ContextMismatch(_))
        ));
        // nothing consumed by the rejected attempts
        assert_eq!(
            f.engine
                .place_bid(f.bob.address(), id, &quantity, &price, U256::from(ESCROW)),
            Ok(0)
        );
    }

    #[tokio::test]
    async fn test_create_auction_validation() {
        let f = fixture();
        let token = f.ledger.address();
        assert!(matches!(
            f.engine
                .create_auction(f.alice.address(), Address::repeat_byte(1), U256::from(1), 10, U256::ZERO)
                .await,
            Err(ConfidentialError::InvalidInput(_))
        ));
        assert!(matches!(
            f.engine
                .create_auction(f.alice.address(), token, U256::ZERO, 10, U256::ZERO)
                .await,
            Err(ConfidentialError::InvalidInput(_))
        ));
        assert!(matches!(
            f.engine
                .create_auction(f.bob.address(), token, U256::from(1), 10, U256::ZERO)
                .await,
            Err(ConfidentialError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_clearing_can_be_retried() {
        let f = fixture();
        let id = f.create().await;
        f.bid(id, &f.bob, 500, 2);
        f.bid(id, &f.carol, 600, 8);
        f.network.synced().await;
        f.network.set_available(false);

        let err = f.engine.end_auction(f.alice.address(), id).await.unwrap_err();
        assert!(matches!(err, ConfidentialError::DisclosureUnavailable(_)));
        let auction = f.engine.auction(id).unwrap();
        assert_eq!(auction.state, AuctionState::Closed);
        assert_eq!(auction.clearing, ClearingStatus::Failed);
        assert!(f.host.events().history_of("AuctionSettled").is_empty());

        f.network.set_available(true);
        tokio::time::sleep(Duration::from_millis(10)).await;
        let settlement = f.engine.end_auction(f.bob.address(), id).await.unwrap();
        assert_eq!(settlement.total_quantity_sold, U256::from(1_000));
        assert_eq!(f.host.events().history_of("AuctionClosed").len(), 1);
    }
}
