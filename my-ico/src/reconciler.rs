// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Re-reads everything the page shows from the contracts.

use alloy::primitives::{Address, U256};
use tracing::{debug, instrument};

use crate::{eligibility::compute_claimable, error::IcoError, gateway::ContractGateway};

/// Token values shown to the user. Only ever replaced as a whole, with values read
/// from the contracts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenState {
    /// Total supply of the token, in the smallest unit.
    pub minted_supply: U256,
    /// Token balance of the connected account, in the smallest unit.
    pub holder_balance: U256,
    /// Number of NFTs of the connected account that can still be claimed for.
    pub claimable_count: u64,
}

/// Reads balance, supply and claimable count, in this order.
///
/// Nothing is returned unless all three reads succeed, so that a caller never shows a
/// mix of old and new values.
#[instrument(level = "debug", skip(gateway))]
pub async fn refresh_all<G>(gateway: &G, owner: Address) -> Result<TokenState, IcoError>
where
    G: ContractGateway + ?Sized,
{
    let holder_balance = gateway.token_balance_of(owner).await?;
    let minted_supply = gateway.total_supply().await?;
    let claimable_count = compute_claimable(gateway, owner).await?;
    let state = TokenState {
        minted_supply,
        holder_balance,
        claimable_count,
    };
    debug!(?state, "Refreshed token state");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::test_utils::MockChain;

    #[test_log::test(tokio::test)]
    async fn test_refresh_reads_everything() {
        let chain = MockChain::new(5);
        let owner = chain.account();
        chain.give_nfts(owner, [3, 4]).await;
        chain.mark_claimed([4]).await;
        chain.set_token_balance(owner, U256::from(7)).await;

        let state = refresh_all(&chain, owner).await.unwrap();
        assert_eq!(state.holder_balance, U256::from(7));
        assert_eq!(state.minted_supply, U256::from(7));
        assert_eq!(state.claimable_count, 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_refresh_fails_as_a_whole() {
        let chain = MockChain::new(5);
        let owner = chain.account();
        chain.fail_reads().await;
        assert_matches!(refresh_all(&chain, owner).await, Err(IcoError::ReadFailed(_)));
    }
}
