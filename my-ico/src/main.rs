// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command-line front end of the MyToken ICO.

use std::io::Write as _;

use alloy::primitives::U256;
use anyhow::{bail, Result};
use clap::Parser;
use my_ico::{
    app::{IcoApp, Notifier},
    config::IcoOptions,
    gateway::EvmGateway,
    logging,
    view::{parse_mint_amount, ViewState},
    wallet::{EvmWallet, WalletSession},
};
use tokio::io::{AsyncBufReadExt as _, BufReader};

/// MyToken ICO client
#[derive(Parser, Debug)]
#[command(name = "my-ico", version)]
enum Cli {
    /// Connect the wallet and show the page
    Status(StatusOptions),
    /// Mint tokens, paying the unit price for each of them
    Mint(MintOptions),
    /// Claim the tokens owed for the unclaimed NFTs of the account
    Claim(StatusOptions),
    /// Read commands from the standard input
    Interactive(StatusOptions),
}

#[derive(clap::Args, Debug, Clone)]
struct StatusOptions {
    #[command(flatten)]
    ico: IcoOptions,
}

#[derive(clap::Args, Debug, Clone)]
struct MintOptions {
    /// Number of tokens to mint
    amount: u64,

    #[command(flatten)]
    ico: IcoOptions,
}

type ConsoleApp = IcoApp<EvmWallet, EvmGateway, ConsoleNotifier>;

/// Prints alerts and pages on the standard output.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&mut self, message: &str) {
        println!("! {message}");
    }

    fn render(&mut self, view: &ViewState) {
        println!("{view}");
    }
}

fn main() -> Result<()> {
    // A missing `.env` file is not an error.
    let _ = dotenvy::dotenv();
    logging::init("my-ico");

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    match cli {
        Cli::Status(options) => runtime.block_on(options.run()),
        Cli::Mint(options) => runtime.block_on(options.run()),
        Cli::Claim(options) => runtime.block_on(options.claim()),
        Cli::Interactive(options) => runtime.block_on(options.interactive()),
    }
}

fn build_app(options: &IcoOptions) -> Result<ConsoleApp> {
    let wallet = EvmWallet::new(options.rpc_url.clone(), options.wallet_source()?);
    let gateway = wallet.gateway(options.contract_addresses());
    let session = WalletSession::new(wallet, options.chain_id);
    Ok(IcoApp::new(
        session,
        gateway,
        ConsoleNotifier,
        options.pricing(),
        options.network_name.clone(),
    ))
}

impl StatusOptions {
    async fn run(&self) -> Result<()> {
        let mut app = build_app(&self.ico)?;
        app.connect_wallet().await?;
        Ok(())
    }

    async fn claim(&self) -> Result<()> {
        let mut app = build_app(&self.ico)?;
        app.connect_wallet().await?;
        let confirmation = app.claim().await?;
        println!("Claim mined in transaction {}", confirmation.tx_hash);
        Ok(())
    }

    async fn interactive(&self) -> Result<()> {
        let mut app = build_app(&self.ico)?;
        println!("{}", app.view());
        print_help();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let mut words = line.split_whitespace();
            let Some(command) = words.next() else {
                continue;
            };
            let argument = words.collect::<Vec<_>>().join(" ");
            // Failures are already logged and alerted by the app.
            match command {
                "connect" => {
                    let _ = app.connect_wallet().await;
                }
                "refresh" | "status" => {
                    let _ = app.refresh().await;
                }
                "amount" => {
                    if let Err(error) = app.set_mint_amount(&argument) {
                        println!("{error}");
                    }
                }
                "mint" => match mint_amount(&app, &argument) {
                    Ok(amount) => {
                        let _ = app.mint(amount).await;
                    }
                    Err(error) => println!("{error}"),
                },
                "claim" => {
                    let _ = app.claim().await;
                }
                "help" => print_help(),
                "quit" | "exit" => break,
                other => println!("Unknown command `{other}`"),
            }
        }
        Ok(())
    }
}

impl MintOptions {
    async fn run(&self) -> Result<()> {
        let mut app = build_app(&self.ico)?;
        app.connect_wallet().await?;
        let confirmation = app.mint(U256::from(self.amount)).await?;
        println!("Mint mined in transaction {}", confirmation.tx_hash);
        Ok(())
    }
}

/// The amount given to `mint`, or the one typed with `amount` before.
fn mint_amount(app: &ConsoleApp, argument: &str) -> Result<U256> {
    match parse_mint_amount(argument)? {
        Some(amount) => Ok(amount),
        None => match app.view().mint_amount {
            Some(amount) => Ok(amount),
            None => bail!("Enter an amount first: `amount <tokens>` or `mint <tokens>`"),
        },
    }
}

fn print_help() {
    println!("Commands:");
    println!("  connect          connect the wallet");
    println!("  status           re-read the balances");
    println!("  amount <tokens>  set the amount to mint");
    println!("  mint [tokens]    mint the given or entered amount");
    println!("  claim            claim the tokens owed for your NFTs");
    println!("  quit             leave");
}
