// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The page controller: runs the connect, mint and claim flows and keeps the
//! [`ViewState`] in sync with the contracts.
//!
//! Every flow follows the same sequence: make sure the wallet is connected to the
//! expected network, submit the transaction, show the loading state until the receipt
//! is observed, then refresh everything from the contracts. Only a network mismatch is
//! reported to the user; other failures are logged and the page returns to its
//! previous state.

use std::collections::VecDeque;

use alloy::primitives::{Address, U256};
use tracing::{debug, error, info, warn};

use crate::{
    config::MintPricing,
    error::IcoError,
    gateway::{Confirmation, ContractGateway, PendingTransaction},
    reconciler::refresh_all,
    view::{parse_mint_amount, ActionKind, PendingAction, ViewState},
    wallet::{WalletProvider, WalletSession},
};

pub const MINT_SUCCESS_MESSAGE: &str = "Successfully minted MyToken tokens";
pub const CLAIM_SUCCESS_MESSAGE: &str = "Successfully claimed MyToken tokens";

/// Receives what has to be shown to the user.
pub trait Notifier: Send {
    /// Shows a blocking message.
    fn alert(&mut self, message: &str);

    /// Shows the page after a state change.
    fn render(&mut self, view: &ViewState);
}

/// Follow-up work scheduled by a flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AppEvent {
    Refresh,
}

pub struct IcoApp<W, G, N> {
    session: WalletSession<W>,
    gateway: G,
    notifier: N,
    network_name: String,
    view: ViewState,
    events: VecDeque<AppEvent>,
}

impl<W, G, N> IcoApp<W, G, N>
where
    W: WalletProvider,
    G: ContractGateway,
    N: Notifier,
{
    pub fn new(
        session: WalletSession<W>,
        gateway: G,
        notifier: N,
        pricing: MintPricing,
        network_name: impl Into<String>,
    ) -> Self {
        let view = ViewState {
            connection: session.connection(),
            ..ViewState::new(pricing)
        };
        Self {
            session,
            gateway,
            notifier,
            network_name: network_name.into(),
            view,
            events: VecDeque::new(),
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Connects the wallet, then refreshes the page once.
    pub async fn connect_wallet(&mut self) -> Result<Address, IcoError> {
        let result = self.ensure_connected().await;
        match &result {
            Ok(_) => {
                self.events.push_back(AppEvent::Refresh);
                self.process_events().await;
            }
            Err(error) => self.report("connect", error),
        }
        result
    }

    /// Re-reads the page state from the contracts.
    pub async fn refresh(&mut self) -> Result<(), IcoError> {
        let result = match self.ensure_connected().await {
            Ok(owner) => self.apply_refresh(owner).await,
            Err(error) => Err(error),
        };
        if let Err(error) = &result {
            self.report("refresh", error);
        }
        result
    }

    /// Updates the amount input. Invalid input leaves the previous amount in place.
    pub fn set_mint_amount(&mut self, input: &str) -> Result<Option<U256>, IcoError> {
        let amount = parse_mint_amount(input)?;
        self.view.mint_amount = amount;
        self.render();
        Ok(amount)
    }

    /// Mints `amount` tokens, paying the unit price for each of them.
    pub async fn mint(&mut self, amount: U256) -> Result<Confirmation, IcoError> {
        let result = self.try_mint(amount).await;
        if let Err(error) = &result {
            self.report("mint", error);
        }
        result
    }

    /// Claims the tokens owed for the connected account's unclaimed NFTs.
    pub async fn claim(&mut self) -> Result<Confirmation, IcoError> {
        let result = self.try_claim().await;
        if let Err(error) = &result {
            self.report("claim", error);
        }
        result
    }

    async fn try_mint(&mut self, amount: U256) -> Result<Confirmation, IcoError> {
        self.ensure_idle()?;
        let signer = self.ensure_connected().await?;
        let value = self.view.pricing.required_value(amount)?;
        let pending = self.gateway.mint(signer, amount, value).await?;
        self.await_pending(ActionKind::Mint, pending).await
    }

    async fn try_claim(&mut self) -> Result<Confirmation, IcoError> {
        self.ensure_idle()?;
        let signer = self.ensure_connected().await?;
        let pending = self.gateway.claim(signer).await?;
        self.await_pending(ActionKind::Claim, pending).await
    }

    /// Refuses a second submission while one transaction is pending. The lock only lives
    /// in the view; the gateway itself accepts concurrent submissions.
    fn ensure_idle(&self) -> Result<(), IcoError> {
        if self.view.is_loading() {
            return Err(IcoError::ActionPending);
        }
        Ok(())
    }

    async fn ensure_connected(&mut self) -> Result<Address, IcoError> {
        let result = self.session.connect().await;
        let connection = self.session.connection();
        if connection != self.view.connection {
            self.view.connection = connection;
            self.render();
        }
        result
    }

    async fn await_pending(
        &mut self,
        kind: ActionKind,
        pending: G::Pending,
    ) -> Result<Confirmation, IcoError> {
        info!(action = %kind, tx_hash = %pending.tx_hash(), "Waiting for the transaction to be mined");
        self.set_pending(Some(PendingAction {
            kind,
            is_loading: true,
        }));
        let outcome = pending.await_confirmation().await;
        self.set_pending(None);
        let confirmation = outcome?;
        info!(
            action = %kind,
            tx_hash = %confirmation.tx_hash,
            block_number = ?confirmation.block_number,
            "Transaction confirmed"
        );
        self.notifier.alert(match kind {
            ActionKind::Mint => MINT_SUCCESS_MESSAGE,
            ActionKind::Claim => CLAIM_SUCCESS_MESSAGE,
        });
        self.events.push_back(AppEvent::Refresh);
        self.process_events().await;
        Ok(confirmation)
    }

    async fn process_events(&mut self) {
        while let Some(event) = self.events.pop_front() {
            match event {
                AppEvent::Refresh => {
                    let Ok(owner) = self.session.signer() else {
                        debug!("Skipping refresh of a disconnected session");
                        continue;
                    };
                    // Failures are logged by `apply_refresh`.
                    let _ = self.apply_refresh(owner).await;
                }
            }
        }
    }

    /// Replaces the token state, or keeps the displayed one if any read fails.
    async fn apply_refresh(&mut self, owner: Address) -> Result<(), IcoError> {
        match refresh_all(&self.gateway, owner).await {
            Ok(tokens) => {
                if tokens != self.view.tokens {
                    self.view.tokens = tokens;
                    self.render();
                }
                Ok(())
            }
            Err(error) => {
                error!(%error, "Failed to refresh the token state, keeping the previous values");
                Err(error)
            }
        }
    }

    fn set_pending(&mut self, pending: Option<PendingAction>) {
        self.view.pending = pending;
        self.render();
    }

    fn render(&mut self) {
        self.notifier.render(&self.view);
    }

    fn report(&mut self, action: &str, error: &IcoError) {
        if error.is_user_facing() {
            self.notifier
                .alert(&format!("Change the network to {}", self.network_name));
        }
        match error {
            IcoError::UserRejected | IcoError::ActionPending => {
                warn!(action, %error, "Action not performed")
            }
            _ => error!(action, %error, "Action failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;
    use assert_matches::assert_matches;

    use super::*;
    use crate::{
        test_utils::{MockChain, RecordingNotifier},
        view::Affordance,
    };

    fn app(chain: &MockChain) -> IcoApp<MockChain, MockChain, RecordingNotifier> {
        let session = WalletSession::new(chain.clone(), 5);
        IcoApp::new(
            session,
            chain.clone(),
            RecordingNotifier::default(),
            MintPricing::default(),
            "Goerli",
        )
    }

    #[test_log::test(tokio::test)]
    async fn test_connect_refreshes_once() {
        let chain = MockChain::new(5);
        let mut app = app(&chain);
        app.connect_wallet().await.unwrap();
        assert_eq!(chain.counters().await.supply_reads, 1);
        assert_eq!(app.view().affordance(), Affordance::MintInput { enabled: false });
    }

    #[test_log::test(tokio::test)]
    async fn test_wrong_network_is_alerted() {
        let chain = MockChain::new(1);
        let mut app = app(&chain);
        assert_matches!(app.connect_wallet().await, Err(IcoError::WrongNetwork { .. }));
        assert_eq!(app.notifier().alerts, ["Change the network to Goerli"]);
        assert_eq!(app.view().affordance(), Affordance::Connect);
        assert_eq!(chain.counters().await.supply_reads, 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_silent_failures_are_not_alerted() {
        let chain = MockChain::new(5);
        let mut app = app(&chain);
        app.connect_wallet().await.unwrap();
        assert_matches!(app.claim().await, Err(IcoError::NothingToClaim(_)));
        assert!(app.notifier().alerts.is_empty());
        assert!(!app.view().is_loading());
    }

    #[test_log::test(tokio::test)]
    async fn test_loading_is_shown_while_pending() {
        let chain = MockChain::new(5);
        let mut app = app(&chain);
        app.connect_wallet().await.unwrap();
        app.mint(U256::from(2)).await.unwrap();
        let frames = &app.notifier().frames;
        let loading = frames
            .iter()
            .position(|frame| frame.affordance() == Affordance::Loading)
            .expect("a loading frame");
        assert!(frames[loading + 1..]
            .iter()
            .all(|frame| frame.affordance() != Affordance::Loading));
        assert_eq!(app.notifier().alerts, [MINT_SUCCESS_MESSAGE]);
    }

    #[test_log::test(tokio::test)]
    async fn test_network_is_checked_before_every_action() {
        let chain = MockChain::new(5);
        chain.give_nfts(chain.account(), [7]).await;
        let mut app = app(&chain);
        app.connect_wallet().await.unwrap();
        assert_eq!(chain.counters().await.chain_id_reads, 1);

        app.mint(U256::from(1)).await.unwrap();
        assert_eq!(chain.counters().await.chain_id_reads, 2);

        app.claim().await.unwrap();
        assert_eq!(chain.counters().await.chain_id_reads, 3);

        app.refresh().await.unwrap();
        let counters = chain.counters().await;
        assert_eq!(counters.chain_id_reads, 4);
        assert_eq!(counters.account_requests, 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_pending_action_blocks_a_second_submission() {
        let chain = MockChain::new(5);
        let mut app = app(&chain);
        app.connect_wallet().await.unwrap();
        app.view.pending = Some(PendingAction {
            kind: ActionKind::Mint,
            is_loading: true,
        });
        assert_matches!(app.mint(U256::from(1)).await, Err(IcoError::ActionPending));
        assert_matches!(app.claim().await, Err(IcoError::ActionPending));
        assert_eq!(chain.counters().await.submissions, 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_refresh_keeps_the_displayed_values() {
        let chain = MockChain::new(5);
        let mut app = app(&chain);
        app.connect_wallet().await.unwrap();
        app.mint(U256::from(3)).await.unwrap();
        let before = app.view().tokens;

        chain.fail_reads().await;
        assert_matches!(app.refresh().await, Err(IcoError::ReadFailed(_)));
        assert_eq!(app.view().tokens, before);
    }

    #[test]
    fn test_mint_amount_input() {
        let chain = MockChain::new(5);
        let mut app = app(&chain);
        assert_eq!(app.set_mint_amount("4").unwrap(), Some(U256::from(4)));
        assert!(app.set_mint_amount("four").is_err());
        assert_eq!(app.view().mint_amount, Some(U256::from(4)));
        assert_eq!(app.set_mint_amount("").unwrap(), None);
    }
}
