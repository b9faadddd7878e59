// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command-line and environment configuration of the ICO client and of the deployment
//! script.

use std::path::PathBuf;

use alloy::{
    primitives::{utils::parse_ether, Address, U256},
    signers::local::PrivateKeySigner,
};
use url::Url;

use crate::error::IcoError;

/// Chain id of the Goerli test network.
pub const GOERLI_CHAIN_ID: u64 = 5;

/// Price of one token unit, in ether.
pub const DEFAULT_UNIT_PRICE: &str = "0.0001";

/// Tokens granted for every unclaimed NFT.
pub const DEFAULT_TOKENS_PER_NFT: u64 = 10;

/// Maximal number of tokens the contract will ever mint.
pub const DEFAULT_MAX_SUPPLY: u64 = 10_000;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Name of the token contract, as compiled by Hardhat.
pub const DEFAULT_CONTRACT_NAME: &str = "MyToken";

/// The addresses of the two contracts the client talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractAddresses {
    pub nft: Address,
    pub token: Address,
}

/// The pricing and supply constants of the token contract, mirrored client-side to
/// compute the value attached to a mint and to render the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintPricing {
    /// Price of one token, in wei.
    pub unit_price: U256,
    pub tokens_per_nft: u64,
    pub max_supply: u64,
}

impl Default for MintPricing {
    fn default() -> Self {
        Self {
            // 0.0001 ether.
            unit_price: U256::from(100_000_000_000_000u64),
            tokens_per_nft: DEFAULT_TOKENS_PER_NFT,
            max_supply: DEFAULT_MAX_SUPPLY,
        }
    }
}

impl MintPricing {
    /// The value in wei that has to be attached to a mint of `amount` tokens.
    pub fn required_value(&self, amount: U256) -> Result<U256, IcoError> {
        self.unit_price
            .checked_mul(amount)
            .ok_or_else(|| IcoError::InvalidAmount(format!("{amount} tokens overflow the price")))
    }

    /// The number of tokens granted for `claimable` unclaimed NFTs.
    pub fn claimable_tokens(&self, claimable: u64) -> u64 {
        claimable.saturating_mul(self.tokens_per_nft)
    }
}

/// Where the signing identity of the session comes from.
#[derive(Clone, Debug)]
pub enum WalletSource {
    /// A key held by this process; transactions are signed locally.
    LocalKey(PrivateKeySigner),
    /// Accounts managed by the RPC node; transactions are signed by the node.
    Bridged,
    /// No wallet is available.
    None,
}

/// Options of the ICO client.
#[derive(Clone, Debug, clap::Args)]
pub struct IcoOptions {
    /// JSON-RPC endpoint of the Ethereum node.
    #[arg(long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: Url,

    /// Private key of the account used to sign transactions.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Use the accounts managed by the RPC node instead of a local key.
    #[arg(long, conflicts_with = "private_key")]
    pub bridged_wallet: bool,

    /// The chain id every action requires.
    #[arg(long, default_value_t = GOERLI_CHAIN_ID)]
    pub chain_id: u64,

    /// Human-readable name of the required network, used in alerts.
    #[arg(long, default_value = "Goerli")]
    pub network_name: String,

    /// Address of the NFT contract.
    #[arg(long, env = "NFT_CONTRACT_ADDRESS")]
    pub nft_contract: Address,

    /// Address of the token contract.
    #[arg(long, env = "TOKEN_CONTRACT_ADDRESS")]
    pub token_contract: Address,

    /// Price of one token, in ether.
    #[arg(long, default_value = DEFAULT_UNIT_PRICE, value_parser = parse_price)]
    pub unit_price: U256,

    /// Tokens granted for every unclaimed NFT.
    #[arg(long, default_value_t = DEFAULT_TOKENS_PER_NFT)]
    pub tokens_per_nft: u64,

    /// Maximal token supply, shown on the status page.
    #[arg(long, default_value_t = DEFAULT_MAX_SUPPLY)]
    pub max_supply: u64,
}

impl IcoOptions {
    pub fn contract_addresses(&self) -> ContractAddresses {
        ContractAddresses {
            nft: self.nft_contract,
            token: self.token_contract,
        }
    }

    pub fn pricing(&self) -> MintPricing {
        MintPricing {
            unit_price: self.unit_price,
            tokens_per_nft: self.tokens_per_nft,
            max_supply: self.max_supply,
        }
    }

    pub fn wallet_source(&self) -> Result<WalletSource, IcoError> {
        match &self.private_key {
            Some(key) => Ok(WalletSource::LocalKey(parse_private_key(key)?)),
            None if self.bridged_wallet => Ok(WalletSource::Bridged),
            None => Ok(WalletSource::None),
        }
    }
}

/// Options of the deployment script.
#[derive(Clone, Debug, clap::Parser)]
#[command(
    name = "deploy-my-token",
    about = "Deploys the token contract, bound to an existing NFT contract"
)]
pub struct DeployOptions {
    /// JSON-RPC endpoint of the Ethereum node.
    #[arg(long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: Url,

    /// Private key of the deployer.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// Address of the NFT contract, passed to the token constructor.
    #[arg(long, env = "MY_NFT_CONTRACT_ADDRESS")]
    pub nft_contract: Address,

    /// Name of the contract to deploy.
    #[arg(long, default_value = DEFAULT_CONTRACT_NAME)]
    pub contract_name: String,

    /// Directory holding the Hardhat compilation artifacts.
    #[arg(long, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,
}

impl DeployOptions {
    /// Path of the artifact of the named contract:
    /// `<artifacts>/contracts/<Name>.sol/<Name>.json`.
    pub fn artifact_path(&self) -> PathBuf {
        self.artifacts_dir
            .join("contracts")
            .join(format!("{}.sol", self.contract_name))
            .join(format!("{}.json", self.contract_name))
    }
}

pub fn parse_private_key(key: &str) -> Result<PrivateKeySigner, IcoError> {
    key.trim()
        .parse()
        .map_err(|error| IcoError::Config(format!("invalid private key: {error}")))
}

/// Parses a price given in ether into wei.
pub fn parse_price(price: &str) -> Result<U256, String> {
    parse_ether(price).map_err(|error| format!("invalid price {price:?}: {error}"))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        options: IcoOptions,
    }

    const NFT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const TOKEN: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

    #[test]
    fn test_default_unit_price_is_a_ten_thousandth_of_an_ether() {
        assert_eq!(parse_price(DEFAULT_UNIT_PRICE), Ok(MintPricing::default().unit_price));
    }

    #[test]
    fn test_required_value_for_five_tokens() {
        let pricing = MintPricing::default();
        let value = pricing.required_value(U256::from(5)).unwrap();
        assert_eq!(value, parse_ether("0.0005").unwrap());
    }

    #[test]
    fn test_required_value_overflow() {
        let pricing = MintPricing::default();
        assert!(pricing.required_value(U256::MAX).is_err());
    }

    #[test]
    fn test_options_defaults() {
        let cli = TestCli::try_parse_from([
            "my-ico",
            "--nft-contract",
            NFT,
            "--token-contract",
            TOKEN,
        ])
        .unwrap();
        let options = cli.options;
        assert_eq!(options.chain_id, GOERLI_CHAIN_ID);
        assert_eq!(options.pricing(), MintPricing::default());
        assert_eq!(options.contract_addresses().nft, NFT.parse::<Address>().unwrap());
    }

    #[test]
    fn test_bridged_wallet_conflicts_with_private_key() {
        let result = TestCli::try_parse_from([
            "my-ico",
            "--nft-contract",
            NFT,
            "--token-contract",
            TOKEN,
            "--bridged-wallet",
            "--private-key",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_artifact_path_follows_hardhat_layout() {
        let options = DeployOptions::try_parse_from([
            "deploy-my-token",
            "--private-key",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            "--nft-contract",
            NFT,
        ])
        .unwrap();
        assert_eq!(
            options.artifact_path(),
            PathBuf::from("artifacts/contracts/MyToken.sol/MyToken.json")
        );
    }
}
