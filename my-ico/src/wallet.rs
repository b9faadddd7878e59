// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Wallet access: obtaining an account, checking the network, and splitting read
//! capabilities from signing capabilities.

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::{ContractAddresses, WalletSource},
    error::IcoError,
    gateway::EvmGateway,
};

/// The external wallet the session talks to.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Asks the wallet for the account to act with. This is the step where a wallet
    /// may prompt the user.
    async fn request_account(&self) -> Result<Address, IcoError>;

    /// Returns the chain id of the network the wallet is currently on.
    async fn chain_id(&self) -> Result<u64, IcoError>;
}

/// The state of the wallet handshake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Connection {
    pub is_connected: bool,
    /// The last chain id observed, if any.
    pub chain_id: Option<u64>,
}

/// A wallet session, created once and passed by reference to every component that
/// needs wallet access.
pub struct WalletSession<W> {
    wallet: W,
    expected_chain_id: u64,
    connection: Connection,
    account: Option<Address>,
}

impl<W: WalletProvider> WalletSession<W> {
    pub fn new(wallet: W, expected_chain_id: u64) -> Self {
        Self {
            wallet,
            expected_chain_id,
            connection: Connection::default(),
            account: None,
        }
    }

    /// Performs the wallet handshake, then checks the network.
    ///
    /// The account is only requested once per session. The network is checked on every
    /// call, since the wallet may have switched networks since the last action.
    pub async fn connect(&mut self) -> Result<Address, IcoError> {
        let account = match self.account {
            Some(account) => account,
            None => {
                let account = self.wallet.request_account().await?;
                info!(%account, "Wallet account obtained");
                self.account = Some(account);
                account
            }
        };
        self.require_network(self.expected_chain_id).await?;
        Ok(account)
    }

    /// Fails with [`IcoError::WrongNetwork`] unless the wallet is on `expected_chain_id`.
    /// A mismatch invalidates the connection; the network is never switched.
    pub async fn require_network(&mut self, expected_chain_id: u64) -> Result<u64, IcoError> {
        let chain_id = self.wallet.chain_id().await?;
        self.connection.chain_id = Some(chain_id);
        if chain_id != expected_chain_id {
            warn!(expected_chain_id, chain_id, "Wallet is on the wrong network");
            self.connection.is_connected = false;
            return Err(IcoError::WrongNetwork {
                expected: expected_chain_id,
                actual: chain_id,
            });
        }
        debug!(chain_id, "Network check passed");
        self.connection.is_connected = self.account.is_some();
        Ok(chain_id)
    }

    /// The account able to sign transactions, once connected.
    pub fn signer(&self) -> Result<Address, IcoError> {
        match self.account {
            Some(account) if self.connection.is_connected => Ok(account),
            _ => Err(IcoError::NotConnected),
        }
    }

    pub fn connection(&self) -> Connection {
        self.connection
    }
}

/// A wallet reached over JSON-RPC, either with a local key or through the node's own
/// accounts.
#[derive(Clone)]
pub struct EvmWallet {
    read: DynProvider,
    /// Provider able to send transactions, with the local signer's address if any.
    write: Option<(DynProvider, Option<Address>)>,
}

impl EvmWallet {
    pub fn new(rpc_url: Url, source: WalletSource) -> Self {
        let read = ProviderBuilder::new().connect_http(rpc_url.clone()).erased();
        let write = match source {
            WalletSource::LocalKey(signer) => {
                let address = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(rpc_url)
                    .erased();
                Some((provider, Some(address)))
            }
            WalletSource::Bridged => Some((read.clone(), None)),
            WalletSource::None => None,
        };
        Self { read, write }
    }

    /// Read-only access to the network.
    pub fn read_provider(&self) -> &DynProvider {
        &self.read
    }

    /// Binds the contracts to this wallet.
    pub fn gateway(&self, addresses: ContractAddresses) -> EvmGateway {
        let write = self.write.as_ref().map(|(provider, _)| provider.clone());
        EvmGateway::new(self.read.clone(), write, addresses)
    }
}

#[async_trait]
impl WalletProvider for EvmWallet {
    async fn request_account(&self) -> Result<Address, IcoError> {
        match &self.write {
            None => Err(IcoError::NoWalletFound),
            Some((_, Some(address))) => Ok(*address),
            Some((provider, None)) => {
                let accounts = provider.get_accounts().await.map_err(IcoError::from_rpc)?;
                accounts.first().copied().ok_or(IcoError::NoWalletFound)
            }
        }
    }

    async fn chain_id(&self) -> Result<u64, IcoError> {
        self.read.get_chain_id().await.map_err(IcoError::from_rpc)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::test_utils::MockChain;

    #[test_log::test(tokio::test)]
    async fn test_connect_requests_the_account_once() {
        let chain = MockChain::new(5);
        let mut session = WalletSession::new(chain.clone(), 5);
        let first = session.connect().await.unwrap();
        let second = session.connect().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(chain.counters().await.account_requests, 1);
        assert!(session.connection().is_connected);
        assert_eq!(session.signer().unwrap(), first);
    }

    #[test_log::test(tokio::test)]
    async fn test_wrong_network_invalidates_the_connection() {
        let chain = MockChain::new(5);
        let mut session = WalletSession::new(chain.clone(), 5);
        session.connect().await.unwrap();

        chain.switch_network(1).await;
        assert_matches!(
            session.connect().await,
            Err(IcoError::WrongNetwork {
                expected: 5,
                actual: 1
            })
        );
        assert!(!session.connection().is_connected);
        assert_eq!(session.connection().chain_id, Some(1));
        assert_matches!(session.signer(), Err(IcoError::NotConnected));
    }

    #[test_log::test(tokio::test)]
    async fn test_require_network_rejects_every_other_chain() {
        for chain_id in [0, 1, 4, 6, 11_155_111] {
            let chain = MockChain::new(chain_id);
            let mut session = WalletSession::new(chain, 5);
            assert_matches!(session.connect().await, Err(IcoError::WrongNetwork { .. }));
            assert!(!session.connection().is_connected);
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_wallet_and_rejection_are_reported() {
        let chain = MockChain::new(5);
        chain.remove_wallet().await;
        let mut session = WalletSession::new(chain.clone(), 5);
        assert_matches!(session.connect().await, Err(IcoError::NoWalletFound));

        let chain = MockChain::new(5);
        chain.reject_requests().await;
        let mut session = WalletSession::new(chain, 5);
        assert_matches!(session.connect().await, Err(IcoError::UserRejected));
        assert!(!session.connection().is_connected);
    }
}
