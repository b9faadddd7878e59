// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Solidity interfaces of the NFT and token contracts used by the ICO.

use alloy::sol;

sol! {
    /// The enumerable NFT collection whose holders may claim tokens.
    #[sol(rpc)]
    interface IMyNft {
        function balanceOf(address owner) external view returns (uint256);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
    }
}

sol! {
    /// The ERC20 token sold by the ICO.
    #[sol(rpc)]
    interface IMyToken {
        function balanceOf(address account) external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function tokenIdsClaimed(uint256 tokenId) external view returns (bool);
        function mint(uint256 amount) external payable;
        function claim() external;
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::{Address, U256},
        sol_types::SolCall,
    };

    use super::{IMyNft, IMyToken};

    #[test]
    fn test_selectors_match_the_deployed_abi() {
        // `bytes4(keccak256("balanceOf(address)"))`, shared by ERC20 and ERC721.
        assert_eq!(IMyToken::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(IMyNft::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(IMyToken::totalSupplyCall::SELECTOR, [0x18, 0x16, 0x0d, 0xdd]);
        assert_eq!(IMyToken::claimCall::SELECTOR, [0x4e, 0x71, 0xd9, 0x2d]);
    }

    #[test]
    fn test_mint_calldata_carries_the_amount() {
        let calldata = IMyToken::mintCall {
            amount: U256::from(5),
        }
        .abi_encode();
        assert_eq!(calldata.len(), 4 + 32);
        assert_eq!(U256::from_be_slice(&calldata[4..]), U256::from(5));

        let calldata = IMyNft::tokenOfOwnerByIndexCall {
            owner: Address::ZERO,
            index: U256::from(2),
        }
        .abi_encode();
        assert_eq!(calldata.len(), 4 + 64);
    }
}
