// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Deploys the token contract and prints its address.

use std::process::ExitCode;

use clap::Parser as _;
use my_ico::{
    config::{parse_private_key, DeployOptions},
    deploy::{exit_status, run_deployment, ContractArtifact, DeployError, EvmDeployer},
    logging,
};
use tracing::error;

fn main() -> ExitCode {
    // A missing `.env` file is not an error.
    let _ = dotenvy::dotenv();
    logging::init("deploy-my-token");

    let options = match DeployOptions::try_parse() {
        Ok(options) => options,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let result = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(deploy(&options)),
        Err(error) => Err(DeployError::Runtime(error)),
    };
    if let Err(error) = &result {
        error!(%error, "Deployment failed");
        eprintln!("Error: {error}");
    }
    ExitCode::from(exit_status(&result))
}

async fn deploy(options: &DeployOptions) -> Result<(), DeployError> {
    let artifact = ContractArtifact::load(&options.artifact_path())?;
    let signer = parse_private_key(&options.private_key)?;
    let deployer = EvmDeployer::new(options.rpc_url.clone(), signer, artifact);
    run_deployment(
        &deployer,
        &options.contract_name,
        options.nft_contract,
        &mut std::io::stdout(),
    )
    .await?;
    Ok(())
}
