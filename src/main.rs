//! token_transfer - command line entry point
//!
//! ```text
//! token_transfer [--env dev] --balance <address>
//! token_transfer [--env dev] --to <address> --amount <units>
//! ```
//!
//! The sender is the account of the key named by `transfer.private_key_env`.

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::{Context, Result, bail};

use token_transfer::config::AppConfig;
use token_transfer::{
    Amount, ContractBinding, JsonRpcChainClient, LocalCredential, TokenAccessor,
    TransferOrchestrator, TransferRequest,
};

// ============================================================
// ARGUMENTS
// ============================================================

fn get_arg(names: &[&str]) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if names.contains(&args[i].as_str()) && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

fn get_env() -> String {
    get_arg(&["--env", "-e"]).unwrap_or_else(|| "dev".to_string())
}

fn parse_address(flag: &str, value: &str) -> Result<Address> {
    Address::from_str(value).with_context(|| format!("{} is not a valid address: {}", flag, value))
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  token_transfer [--env <name>] --balance <address>");
    eprintln!("  token_transfer [--env <name>] --to <address> --amount <units>");
}

// ============================================================
// MAIN
// ============================================================

#[tokio::main]
async fn main() -> Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env).with_context(|| format!("loading {} config", env))?;
    let _log_guard = token_transfer::logging::init_logging(&app_config);

    tracing::info!(
        env = %env,
        rpc_url = %app_config.chain.rpc_url,
        token = %app_config.token.address,
        "Starting token_transfer"
    );

    let client = Arc::new(JsonRpcChainClient::new(
        &app_config.chain.rpc_url,
        app_config.chain.request_timeout(),
    )?);

    let binding = match &app_config.token.abi_path {
        Some(path) => ContractBinding::from_file(app_config.token.address, path)?,
        None => ContractBinding::erc20(app_config.token.address)?,
    };
    let token = Arc::new(
        TokenAccessor::new(client.clone(), binding)?
            .with_read_timeout(app_config.transfer.read_timeout()),
    );

    // Read-only mode
    if let Some(account) = get_arg(&["--balance"]) {
        let account = parse_address("--balance", &account)?;
        let balance = token.balance_of(account).await?;
        println!("{} {}", account, balance);
        return Ok(());
    }

    let (Some(to), Some(amount)) = (get_arg(&["--to"]), get_arg(&["--amount"])) else {
        print_usage();
        bail!("either --balance or both --to and --amount are required");
    };
    let receiver = parse_address("--to", &to)?;
    let amount = Amount::from_str(&amount).context("--amount")?;

    let credential = Arc::new(LocalCredential::from_env(
        &app_config.transfer.private_key_env,
    )?);
    let orchestrator = TransferOrchestrator::new(
        client,
        token,
        credential,
        app_config.transfer.settings(),
    );

    let mut request = TransferRequest::new(orchestrator.sender(), receiver, amount);
    if let Some(max) = &app_config.transfer.max_amount {
        request = request.capped(max);
    }

    match orchestrator.transfer(&request).await {
        Ok(outcome) => {
            println!("Transaction:   {}", outcome.tx_hash);
            println!("Block:         {}", outcome.block_number);
            println!(
                "Sender:        {} -> {}",
                outcome.sender_before.amount, outcome.sender_after.amount
            );
            println!(
                "Receiver:      {} -> {}",
                outcome.receiver_before.amount, outcome.receiver_after.amount
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                code = e.code(),
                step = %e.step(),
                tx_hash = ?e.tx_hash(),
                post_broadcast = e.is_post_broadcast(),
                "Transfer failed: {}",
                e
            );
            if e.is_post_broadcast() {
                eprintln!("The transaction may still be included on chain; check before retrying.");
            }
            Err(e.into())
        }
    }
}
