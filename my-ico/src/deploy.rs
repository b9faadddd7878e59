// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Deployment of the token contract, bound to an existing NFT contract.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use alloy::{
    network::{EthereumWallet, TransactionBuilder as _},
    primitives::{hex, Address, Bytes, TxHash},
    providers::{DynProvider, PendingTransactionError, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol_types::SolValue as _,
    transports::{RpcError, TransportErrorKind},
};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::error::IcoError;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("failed to read the artifact {path:?}: {error}")]
    ArtifactIo {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("invalid artifact: {0}")]
    InvalidArtifact(#[from] serde_json::Error),

    #[error("the artifact of {0} carries no bytecode")]
    MissingBytecode(String),

    #[error(transparent)]
    FromHexError(#[from] hex::FromHexError),

    #[error(transparent)]
    RpcError(#[from] RpcError<TransportErrorKind>),

    #[error(transparent)]
    PendingTransactionError(#[from] PendingTransactionError),

    #[error("deployment transaction {0} was reverted")]
    Reverted(TxHash),

    #[error("the receipt of {0} carries no contract address")]
    NoContractAddress(TxHash),

    #[error(transparent)]
    Config(#[from] IcoError),

    #[error("failed to print the deployed address: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// The part of a Hardhat compilation artifact needed to deploy a contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub bytecode: Bytes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    bytecode: String,
}

impl ContractArtifact {
    pub fn from_json(json: &str) -> Result<Self, DeployError> {
        let artifact: HardhatArtifact = serde_json::from_str(json)?;
        let bytecode = hex::decode(artifact.bytecode.trim())?;
        // Interfaces and abstract contracts compile to an empty bytecode.
        if bytecode.is_empty() {
            return Err(DeployError::MissingBytecode(artifact.contract_name));
        }
        Ok(Self {
            contract_name: artifact.contract_name,
            bytecode: bytecode.into(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, DeployError> {
        let json = std::fs::read_to_string(path).map_err(|error| DeployError::ArtifactIo {
            path: path.to_path_buf(),
            error,
        })?;
        Self::from_json(&json)
    }

    /// The creation code followed by the ABI-encoded constructor argument.
    pub fn deploy_code(&self, nft_contract: Address) -> Bytes {
        let mut code = self.bytecode.to_vec();
        code.extend_from_slice(&(nft_contract,).abi_encode_params());
        code.into()
    }
}

/// Deploys the token contract.
#[async_trait]
pub trait TokenDeployer: Send + Sync {
    /// Deploys a new instance bound to `nft_contract`, waits for it to be mined, and
    /// returns its address.
    async fn deploy_token(&self, nft_contract: Address) -> Result<Address, DeployError>;
}

/// [`TokenDeployer`] sending the creation transaction to a JSON-RPC node.
pub struct EvmDeployer {
    provider: DynProvider,
    artifact: ContractArtifact,
}

impl EvmDeployer {
    pub fn new(rpc_url: Url, signer: PrivateKeySigner, artifact: ContractArtifact) -> Self {
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(rpc_url)
            .erased();
        Self { provider, artifact }
    }
}

#[async_trait]
impl TokenDeployer for EvmDeployer {
    async fn deploy_token(&self, nft_contract: Address) -> Result<Address, DeployError> {
        let transaction =
            TransactionRequest::default().with_deploy_code(self.artifact.deploy_code(nft_contract));
        let pending = self.provider.send_transaction(transaction).await?;
        let tx_hash = *pending.tx_hash();
        info!(
            contract = %self.artifact.contract_name,
            %nft_contract,
            %tx_hash,
            "Deployment transaction sent"
        );
        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(DeployError::Reverted(tx_hash));
        }
        receipt
            .contract_address
            .ok_or(DeployError::NoContractAddress(tx_hash))
    }
}

/// Deploys the contract and prints its address as a single line on `output`.
pub async fn run_deployment<D>(
    deployer: &D,
    contract_name: &str,
    nft_contract: Address,
    output: &mut impl Write,
) -> Result<Address, DeployError>
where
    D: TokenDeployer + ?Sized,
{
    let address = deployer.deploy_token(nft_contract).await?;
    info!(%address, "{contract_name} deployed");
    writeln!(output, "{contract_name} Contract Address : {address}")?;
    Ok(address)
}

/// The process exit status for the outcome of a deployment.
pub fn exit_status<T>(result: &Result<T, DeployError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
