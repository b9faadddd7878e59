// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! What the page shows, and which control is offered to the user.

use std::fmt;

use alloy::primitives::{utils::format_ether, U256};

use crate::{config::MintPricing, error::IcoError, reconciler::TokenState, wallet::Connection};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Mint,
    Claim,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Mint => write!(f, "mint"),
            ActionKind::Claim => write!(f, "claim"),
        }
    }
}

/// A transaction waiting for its receipt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingAction {
    pub kind: ActionKind,
    pub is_loading: bool,
}

/// The control offered to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Affordance {
    /// The "Connect your wallet" button.
    Connect,
    /// Replaces every actionable button while a transaction is pending.
    Loading,
    /// The claim button, with the number of tokens it will grant.
    Claim { claimable: u64, tokens: u64 },
    /// The amount input and the mint button, disabled while the input is empty.
    MintInput { enabled: bool },
}

/// Everything needed to render the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewState {
    pub connection: Connection,
    pub tokens: TokenState,
    pub pending: Option<PendingAction>,
    /// Content of the amount input; `None` while it is empty.
    pub mint_amount: Option<U256>,
    pub pricing: MintPricing,
}

impl ViewState {
    pub fn new(pricing: MintPricing) -> Self {
        Self {
            connection: Connection::default(),
            tokens: TokenState::default(),
            pending: None,
            mint_amount: None,
            pricing,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some_and(|pending| pending.is_loading)
    }

    pub fn affordance(&self) -> Affordance {
        if !self.connection.is_connected {
            return Affordance::Connect;
        }
        if self.is_loading() {
            return Affordance::Loading;
        }
        let claimable = self.tokens.claimable_count;
        if claimable > 0 {
            return Affordance::Claim {
                claimable,
                tokens: self.pricing.claimable_tokens(claimable),
            };
        }
        Affordance::MintInput {
            enabled: self.mint_amount.is_some(),
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Welcome to MyToken ICO")?;
        writeln!(f, "You can mint or claim your tokens here")?;
        let affordance = self.affordance();
        if affordance == Affordance::Connect {
            return writeln!(f, "[Connect your wallet]");
        }
        writeln!(
            f,
            "You have minted {} MyToken",
            format_tokens(self.tokens.holder_balance)
        )?;
        writeln!(
            f,
            "Total {}/{} MyToken have been minted",
            format_tokens(self.tokens.minted_supply),
            self.pricing.max_supply
        )?;
        match affordance {
            Affordance::Connect => Ok(()),
            Affordance::Loading => writeln!(f, "[Loading...]"),
            Affordance::Claim { tokens, .. } => {
                writeln!(f, "{tokens} Tokens can be claimed")?;
                writeln!(f, "[Claim MyToken]")
            }
            Affordance::MintInput { enabled } => {
                match self.mint_amount {
                    Some(amount) => writeln!(f, "Amount of tokens: {amount}")?,
                    None => writeln!(f, "Amount of tokens: _")?,
                }
                if enabled {
                    writeln!(f, "[Mint Tokens]")
                } else {
                    writeln!(f, "[Mint Tokens] (disabled)")
                }
            }
        }
    }
}

/// Formats a token amount given in the smallest unit, without trailing zeros in the
/// fraction: `15.0`, `0.5`.
pub fn format_tokens(amount: U256) -> String {
    let formatted = format_ether(amount);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => format!("{formatted}.0"),
    }
}

/// Parses the content of the amount input. An empty input is `None`.
pub fn parse_mint_amount(input: &str) -> Result<Option<U256>, IcoError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    U256::from_str_radix(input, 10)
        .map(Some)
        .map_err(|error| IcoError::InvalidAmount(format!("{input:?}: {error}")))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn connected_view() -> ViewState {
        let mut view = ViewState::new(MintPricing::default());
        view.connection = Connection {
            is_connected: true,
            chain_id: Some(5),
        };
        view
    }

    #[test]
    fn test_disconnected_view_offers_connect() {
        let view = ViewState::new(MintPricing::default());
        assert_eq!(view.affordance(), Affordance::Connect);
        assert!(view.to_string().contains("[Connect your wallet]"));
    }

    #[test]
    fn test_loading_replaces_every_button() {
        let mut view = connected_view();
        view.tokens.claimable_count = 2;
        view.pending = Some(PendingAction {
            kind: ActionKind::Claim,
            is_loading: true,
        });
        assert_eq!(view.affordance(), Affordance::Loading);
        let rendered = view.to_string();
        assert!(rendered.contains("[Loading...]"));
        assert!(!rendered.contains("[Claim MyToken]"));
        assert!(!rendered.contains("[Mint Tokens]"));
    }

    #[test]
    fn test_claim_is_offered_only_when_something_is_claimable() {
        let mut view = connected_view();
        assert_eq!(view.affordance(), Affordance::MintInput { enabled: false });
        view.tokens.claimable_count = 3;
        assert_eq!(
            view.affordance(),
            Affordance::Claim {
                claimable: 3,
                tokens: 30
            }
        );
        assert!(view.to_string().contains("30 Tokens can be claimed"));
    }

    #[test]
    fn test_mint_button_is_enabled_by_the_amount() {
        let mut view = connected_view();
        assert!(view.to_string().contains("[Mint Tokens] (disabled)"));
        view.mint_amount = Some(U256::from(5));
        assert_eq!(view.affordance(), Affordance::MintInput { enabled: true });
        assert!(view.to_string().contains("Amount of tokens: 5\n[Mint Tokens]\n"));
    }

    #[test]
    fn test_amounts_are_rendered_in_ether() {
        let mut view = connected_view();
        view.tokens.minted_supply = U256::from(10u64).pow(U256::from(18)) * U256::from(15u64);
        let rendered = view.to_string();
        assert!(rendered.contains("You have minted 0.0 MyToken\n"));
        assert!(rendered.contains("Total 15.0/10000 MyToken have been minted"));
    }

    #[test_case(0, "0.0" ; "zero")]
    #[test_case(15_000_000_000_000_000_000, "15.0" ; "whole tokens")]
    #[test_case(500_000_000_000_000_000, "0.5" ; "half a token")]
    #[test_case(1_250_000_000_000_000_001, "1.250000000000000001" ; "smallest unit")]
    fn test_format_tokens(amount: u128, expected: &str) {
        assert_eq!(format_tokens(U256::from(amount)), expected);
    }

    #[test_case("", None ; "empty")]
    #[test_case("   ", None ; "blank")]
    #[test_case("5", Some(5) ; "five")]
    #[test_case(" 12 ", Some(12) ; "padded")]
    fn test_parse_mint_amount(input: &str, expected: Option<u64>) {
        assert_eq!(parse_mint_amount(input).unwrap(), expected.map(U256::from));
    }

    #[test_case("-1" ; "negative")]
    #[test_case("1.5" ; "fractional")]
    #[test_case("ten" ; "word")]
    fn test_parse_mint_amount_rejects(input: &str) {
        assert!(parse_mint_amount(input).is_err());
    }
}
