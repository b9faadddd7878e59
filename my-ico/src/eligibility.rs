// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy::primitives::{Address, U256};
use tracing::debug;

use crate::{error::IcoError, gateway::ContractGateway};

/// Counts the NFTs of `owner` whose tokens have not been claimed yet.
///
/// Reads are issued one after the other. The result is a snapshot: a transfer
/// happening during the scan may make it stale.
pub async fn compute_claimable<G>(gateway: &G, owner: Address) -> Result<u64, IcoError>
where
    G: ContractGateway + ?Sized,
{
    let balance = gateway.nft_balance_of(owner).await?;
    if balance.is_zero() {
        return Ok(0);
    }
    let count = u64::try_from(balance)
        .map_err(|_| IcoError::ReadFailed(format!("NFT balance {balance} is out of range")))?;

    let mut token_ids = Vec::new();
    for index in 0..count {
        token_ids.push(
            gateway
                .token_of_owner_by_index(owner, U256::from(index))
                .await?,
        );
    }
    let flags = gateway.claimed_flags(&token_ids).await?;
    let claimable = flags.iter().filter(|claimed| !**claimed).count() as u64;
    debug!(%owner, nfts = count, claimable, "Computed claimable NFTs");
    Ok(claimable)
}
