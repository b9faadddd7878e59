// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! An in-memory chain holding the NFT and token contracts, for tests.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use alloy::primitives::{Address, TxHash, B256, U256};
use async_lock::Mutex;
use async_trait::async_trait;

use crate::{
    app::Notifier,
    config::MintPricing,
    error::{classify_rpc_failure, IcoError},
    gateway::{Confirmation, ContractGateway, PendingTransaction},
    view::ViewState,
    wallet::WalletProvider,
};

/// Code used by nodes for reverted calls.
const EXECUTION_REVERTED_CODE: i64 = 3;

/// Number of decimals of the token.
pub fn token_units(tokens: u64) -> U256 {
    U256::from(tokens) * U256::from(10u64).pow(U256::from(18))
}

/// How many times each call reached the chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallCounters {
    pub account_requests: usize,
    pub chain_id_reads: usize,
    pub nft_balance_reads: usize,
    pub token_id_reads: usize,
    pub claimed_flag_reads: usize,
    pub balance_reads: usize,
    pub supply_reads: usize,
    pub submissions: usize,
}

struct ChainState {
    chain_id: u64,
    wallet_present: bool,
    reject_requests: bool,
    fail_reads: bool,
    drop_next: bool,
    revert_next: bool,
    nfts: BTreeMap<Address, Vec<U256>>,
    nft_balance_override: Option<U256>,
    claimed: BTreeSet<U256>,
    balances: BTreeMap<Address, U256>,
    pricing: MintPricing,
    next_transaction: u64,
    block_number: u64,
    counters: CallCounters,
}

impl ChainState {
    fn check_reads(&self) -> Result<(), IcoError> {
        if self.fail_reads {
            return Err(IcoError::ReadFailed("connection refused".into()));
        }
        Ok(())
    }

    fn total_supply(&self) -> U256 {
        self.balances.values().fold(U256::ZERO, |total, balance| total + *balance)
    }

    fn revert(reason: &str) -> IcoError {
        classify_rpc_failure(
            EXECUTION_REVERTED_CODE,
            &format!("execution reverted: {reason}"),
        )
    }
}

/// Plays the wallet, the node and both contracts. The contract rules are the ones of
/// the `MyToken` contract: a fixed price per token, a capped supply, and a fixed
/// number of tokens per unclaimed NFT.
#[derive(Clone)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
    account: Address,
}

impl MockChain {
    pub fn new(chain_id: u64) -> Self {
        let state = ChainState {
            chain_id,
            wallet_present: true,
            reject_requests: false,
            fail_reads: false,
            drop_next: false,
            revert_next: false,
            nfts: BTreeMap::new(),
            nft_balance_override: None,
            claimed: BTreeSet::new(),
            balances: BTreeMap::new(),
            pricing: MintPricing::default(),
            next_transaction: 1,
            block_number: 1,
            counters: CallCounters::default(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            account: Address::repeat_byte(0x11),
        }
    }

    /// The account returned by the wallet.
    pub fn account(&self) -> Address {
        self.account
    }

    pub async fn counters(&self) -> CallCounters {
        self.state.lock().await.counters.clone()
    }

    pub async fn switch_network(&self, chain_id: u64) {
        self.state.lock().await.chain_id = chain_id;
    }

    pub async fn remove_wallet(&self) {
        self.state.lock().await.wallet_present = false;
    }

    /// Makes the wallet decline every request.
    pub async fn reject_requests(&self) {
        self.state.lock().await.reject_requests = true;
    }

    pub async fn fail_reads(&self) {
        self.state.lock().await.fail_reads = true;
    }

    pub async fn drop_next_transaction(&self) {
        self.state.lock().await.drop_next = true;
    }

    pub async fn revert_next_transaction(&self) {
        self.state.lock().await.revert_next = true;
    }

    pub async fn give_nfts(&self, owner: Address, token_ids: impl IntoIterator<Item = u64>) {
        let mut state = self.state.lock().await;
        state
            .nfts
            .entry(owner)
            .or_default()
            .extend(token_ids.into_iter().map(U256::from));
    }

    pub async fn mark_claimed(&self, token_ids: impl IntoIterator<Item = u64>) {
        let mut state = self.state.lock().await;
        state.claimed.extend(token_ids.into_iter().map(U256::from));
    }

    /// Makes the NFT contract report `balance` for every owner.
    pub async fn override_nft_balance(&self, balance: U256) {
        self.state.lock().await.nft_balance_override = Some(balance);
    }

    pub async fn set_token_balance(&self, owner: Address, balance: U256) {
        self.state.lock().await.balances.insert(owner, balance);
    }

    pub async fn token_balance(&self, owner: Address) -> U256 {
        let state = self.state.lock().await;
        state.balances.get(&owner).copied().unwrap_or_default()
    }

    async fn submit(&self, operation: Operation) -> Result<MockPendingTransaction, IcoError> {
        let mut state = self.state.lock().await;
        state.counters.submissions += 1;
        if !state.wallet_present {
            return Err(IcoError::NoWalletFound);
        }
        if state.reject_requests {
            return Err(classify_rpc_failure(
                crate::error::USER_REJECTED_CODE,
                "User denied transaction signature",
            ));
        }
        let tx_hash = B256::left_padding_from(&state.next_transaction.to_be_bytes());
        state.next_transaction += 1;
        Ok(MockPendingTransaction {
            chain: self.clone(),
            tx_hash,
            operation,
        })
    }
}

#[async_trait]
impl WalletProvider for MockChain {
    async fn request_account(&self) -> Result<Address, IcoError> {
        let mut state = self.state.lock().await;
        state.counters.account_requests += 1;
        if !state.wallet_present {
            return Err(IcoError::NoWalletFound);
        }
        if state.reject_requests {
            return Err(IcoError::UserRejected);
        }
        Ok(self.account)
    }

    async fn chain_id(&self) -> Result<u64, IcoError> {
        let mut state = self.state.lock().await;
        state.counters.chain_id_reads += 1;
        Ok(state.chain_id)
    }
}

#[async_trait]
impl ContractGateway for MockChain {
    type Pending = MockPendingTransaction;

    async fn nft_balance_of(&self, owner: Address) -> Result<U256, IcoError> {
        let mut state = self.state.lock().await;
        state.counters.nft_balance_reads += 1;
        state.check_reads()?;
        if let Some(balance) = state.nft_balance_override {
            return Ok(balance);
        }
        let owned = state.nfts.get(&owner).map_or(0, Vec::len);
        Ok(U256::from(owned))
    }

    async fn token_of_owner_by_index(
        &self,
        owner: Address,
        index: U256,
    ) -> Result<U256, IcoError> {
        let mut state = self.state.lock().await;
        state.counters.token_id_reads += 1;
        state.check_reads()?;
        let token_id = usize::try_from(index)
            .ok()
            .and_then(|index| state.nfts.get(&owner)?.get(index).copied());
        token_id.ok_or_else(|| IcoError::ReadFailed("owner index out of bounds".into()))
    }

    async fn is_token_claimed(&self, token_id: U256) -> Result<bool, IcoError> {
        let mut state = self.state.lock().await;
        state.counters.claimed_flag_reads += 1;
        state.check_reads()?;
        Ok(state.claimed.contains(&token_id))
    }

    async fn token_balance_of(&self, owner: Address) -> Result<U256, IcoError> {
        let mut state = self.state.lock().await;
        state.counters.balance_reads += 1;
        state.check_reads()?;
        Ok(state.balances.get(&owner).copied().unwrap_or_default())
    }

    async fn total_supply(&self) -> Result<U256, IcoError> {
        let mut state = self.state.lock().await;
        state.counters.supply_reads += 1;
        state.check_reads()?;
        Ok(state.total_supply())
    }

    async fn mint(
        &self,
        signer: Address,
        amount: U256,
        value: U256,
    ) -> Result<Self::Pending, IcoError> {
        {
            let state = self.state.lock().await;
            let required = state.pricing.required_value(amount)?;
            if value != required {
                return Err(ChainState::revert("Ether sent is incorrect"));
            }
            let units = amount
                .checked_mul(token_units(1))
                .ok_or_else(|| ChainState::revert("arithmetic overflow"))?;
            if state.total_supply() + units > token_units(state.pricing.max_supply) {
                return Err(ChainState::revert("Exceeds the max total supply available."));
            }
        }
        self.submit(Operation::Mint { to: signer, amount }).await
    }

    async fn claim(&self, signer: Address) -> Result<Self::Pending, IcoError> {
        {
            let state = self.state.lock().await;
            let owned = state.nfts.get(&signer).cloned().unwrap_or_default();
            if owned.is_empty() {
                return Err(ChainState::revert("You dont own any Crypto Dev NFT's"));
            }
            if owned.iter().all(|token_id| state.claimed.contains(token_id)) {
                return Err(ChainState::revert("You have already claimed all the tokens"));
            }
        }
        self.submit(Operation::Claim { to: signer }).await
    }
}

enum Operation {
    Mint { to: Address, amount: U256 },
    Claim { to: Address },
}

pub struct MockPendingTransaction {
    chain: MockChain,
    tx_hash: TxHash,
    operation: Operation,
}

#[async_trait]
impl PendingTransaction for MockPendingTransaction {
    fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    async fn await_confirmation(self) -> Result<Confirmation, IcoError> {
        let mut state = self.chain.state.lock().await;
        if std::mem::take(&mut state.drop_next) {
            return Err(IcoError::TransactionDropped(format!(
                "{} was evicted from the mempool",
                self.tx_hash
            )));
        }
        state.block_number += 1;
        if std::mem::take(&mut state.revert_next) {
            return Err(IcoError::TransactionReverted(self.tx_hash.to_string()));
        }
        match self.operation {
            Operation::Mint { to, amount } => {
                *state.balances.entry(to).or_default() += amount * token_units(1);
            }
            Operation::Claim { to } => {
                let owned = state.nfts.get(&to).cloned().unwrap_or_default();
                let unclaimed = owned
                    .into_iter()
                    .filter(|token_id| !state.claimed.contains(token_id))
                    .collect::<Vec<_>>();
                let reward = token_units(state.pricing.tokens_per_nft)
                    * U256::from(unclaimed.len());
                state.claimed.extend(unclaimed);
                *state.balances.entry(to).or_default() += reward;
            }
        }
        Ok(Confirmation {
            tx_hash: self.tx_hash,
            block_number: Some(state.block_number),
        })
    }
}

/// A [`Notifier`] remembering everything it was asked to show.
#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Vec<String>,
    pub frames: Vec<ViewState>,
}

impl Notifier for RecordingNotifier {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn render(&mut self, view: &ViewState) {
        self.frames.push(view.clone());
    }
}
