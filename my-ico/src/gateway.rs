// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed access to the NFT and token contracts.

use alloy::{
    network::Ethereum,
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, PendingTransactionBuilder},
};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    config::ContractAddresses,
    contracts::{IMyNft, IMyToken},
    error::IcoError,
};

/// The outcome of a mined transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// A submitted transaction that has not been observed in a block yet.
#[async_trait]
pub trait PendingTransaction: Send {
    fn tx_hash(&self) -> TxHash;

    /// Waits until the transaction is mined. There is no timeout.
    async fn await_confirmation(self) -> Result<Confirmation, IcoError>;
}

/// Read and write calls against the two contracts.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    type Pending: PendingTransaction;

    /// Number of NFTs owned by `owner`.
    async fn nft_balance_of(&self, owner: Address) -> Result<U256, IcoError>;

    /// The id of the `index`-th NFT owned by `owner`.
    async fn token_of_owner_by_index(&self, owner: Address, index: U256)
        -> Result<U256, IcoError>;

    /// Whether the tokens attached to the NFT `token_id` were already claimed.
    async fn is_token_claimed(&self, token_id: U256) -> Result<bool, IcoError>;

    /// Claimed flags of several NFTs, in order.
    ///
    /// Implementations able to batch reads into one round trip should override this.
    async fn claimed_flags(&self, token_ids: &[U256]) -> Result<Vec<bool>, IcoError> {
        let mut flags = Vec::with_capacity(token_ids.len());
        for token_id in token_ids {
            flags.push(self.is_token_claimed(*token_id).await?);
        }
        Ok(flags)
    }

    /// Token balance of `owner`, in the smallest unit.
    async fn token_balance_of(&self, owner: Address) -> Result<U256, IcoError>;

    /// Total token supply, in the smallest unit.
    async fn total_supply(&self) -> Result<U256, IcoError>;

    /// Mints `amount` tokens for `signer`, attaching `value` wei.
    async fn mint(
        &self,
        signer: Address,
        amount: U256,
        value: U256,
    ) -> Result<Self::Pending, IcoError>;

    /// Claims the tokens owed for the unclaimed NFTs of `signer`.
    async fn claim(&self, signer: Address) -> Result<Self::Pending, IcoError>;
}

/// [`ContractGateway`] over a JSON-RPC node.
pub struct EvmGateway {
    nft: IMyNft::IMyNftInstance<DynProvider>,
    token: IMyToken::IMyTokenInstance<DynProvider>,
    /// The token contract bound to a provider able to send transactions.
    writer: Option<IMyToken::IMyTokenInstance<DynProvider>>,
}

impl EvmGateway {
    pub fn new(read: DynProvider, write: Option<DynProvider>, addresses: ContractAddresses) -> Self {
        let nft = IMyNft::new(addresses.nft, read.clone());
        let token = IMyToken::new(addresses.token, read);
        let writer = write.map(|provider| IMyToken::new(addresses.token, provider));
        Self { nft, token, writer }
    }

    fn writer(&self) -> Result<&IMyToken::IMyTokenInstance<DynProvider>, IcoError> {
        self.writer.as_ref().ok_or(IcoError::NoWalletFound)
    }
}

#[async_trait]
impl ContractGateway for EvmGateway {
    type Pending = EvmPendingTransaction;

    async fn nft_balance_of(&self, owner: Address) -> Result<U256, IcoError> {
        self.nft
            .balanceOf(owner)
            .call()
            .await
            .map_err(IcoError::from_read)
    }

    async fn token_of_owner_by_index(
        &self,
        owner: Address,
        index: U256,
    ) -> Result<U256, IcoError> {
        self.nft
            .tokenOfOwnerByIndex(owner, index)
            .call()
            .await
            .map_err(IcoError::from_read)
    }

    async fn is_token_claimed(&self, token_id: U256) -> Result<bool, IcoError> {
        self.token
            .tokenIdsClaimed(token_id)
            .call()
            .await
            .map_err(IcoError::from_read)
    }

    async fn token_balance_of(&self, owner: Address) -> Result<U256, IcoError> {
        self.token
            .balanceOf(owner)
            .call()
            .await
            .map_err(IcoError::from_read)
    }

    async fn total_supply(&self) -> Result<U256, IcoError> {
        self.token
            .totalSupply()
            .call()
            .await
            .map_err(IcoError::from_read)
    }

    async fn mint(
        &self,
        signer: Address,
        amount: U256,
        value: U256,
    ) -> Result<Self::Pending, IcoError> {
        debug!(%signer, %amount, %value, "Submitting mint");
        let inner = self
            .writer()?
            .mint(amount)
            .value(value)
            .from(signer)
            .send()
            .await
            .map_err(IcoError::from_submission)?;
        info!(tx_hash = %inner.tx_hash(), "Mint submitted");
        Ok(EvmPendingTransaction { inner })
    }

    async fn claim(&self, signer: Address) -> Result<Self::Pending, IcoError> {
        debug!(%signer, "Submitting claim");
        let inner = self
            .writer()?
            .claim()
            .from(signer)
            .send()
            .await
            .map_err(IcoError::from_submission)?;
        info!(tx_hash = %inner.tx_hash(), "Claim submitted");
        Ok(EvmPendingTransaction { inner })
    }
}

pub struct EvmPendingTransaction {
    inner: PendingTransactionBuilder<Ethereum>,
}

#[async_trait]
impl PendingTransaction for EvmPendingTransaction {
    fn tx_hash(&self) -> TxHash {
        *self.inner.tx_hash()
    }

    async fn await_confirmation(self) -> Result<Confirmation, IcoError> {
        let receipt = self.inner.get_receipt().await?;
        let tx_hash = receipt.transaction_hash;
        if !receipt.status() {
            return Err(IcoError::TransactionReverted(tx_hash.to_string()));
        }
        Ok(Confirmation {
            tx_hash,
            block_number: receipt.block_number,
        })
    }
}
