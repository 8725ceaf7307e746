use clap::Parser;
use log::{error, LevelFilter};
use pagechain::cli::{NodeCommand, Opt};
use pagechain::node::{send_command, Command, Node, Response};
use pagechain::wallet::{Address, Wallet};
use pagechain::{ChainError, Config, Result};
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();
    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: NodeCommand) -> Result<()> {
    let config = Config::from_env();

    match command {
        NodeCommand::Start { port, wallet } => {
            let mut config = config;
            if let Some(port) = port {
                config.port = port;
            }

            let wallet = load_or_create_wallet(&wallet.unwrap_or_else(|| config.wallet_path.clone()))?;
            Node::start(wallet.address(), &config)
        }

        NodeCommand::CreateWallet { path } => {
            let path = path.unwrap_or_else(|| config.wallet_path.clone());
            let wallet = Wallet::new()?;
            wallet.save(&path)?;
            println!("Your new address: {}", wallet.address());
            Ok(())
        }

        NodeCommand::Balance { address } => {
            let address = Address::decode(&address)?;
            let response = request(&config, &Command::Balance { address })?;
            println!("Balance: {}", response.balance);
            Ok(())
        }

        NodeCommand::Send { wallet, to, amount } => {
            let wallet = load_wallet(&config, wallet)?;
            let to = Address::decode(&to)?;

            request(
                &config,
                &Command::Send {
                    wallet: wallet.to_pkcs8_der()?,
                    address: to,
                    amount,
                },
            )?;
            println!("Queued transfer of {amount} to {to}");
            Ok(())
        }

        NodeCommand::Page {
            wallet,
            name,
            length,
        } => {
            let wallet = load_wallet(&config, wallet)?;

            request(
                &config,
                &Command::Page {
                    wallet: wallet.to_pkcs8_der()?,
                    name: name.clone(),
                    length,
                    chunks: Vec::new(),
                },
            )?;
            println!("Queued page '{name}'");
            Ok(())
        }

        NodeCommand::Ping => {
            request(&config, &Command::Ping)?;
            println!("Ping sent");
            Ok(())
        }

        NodeCommand::Connect { node_address } => {
            request(&config, &Command::Connect { node_address })?;
            println!("Connected");
            Ok(())
        }

        NodeCommand::Block { id } => {
            let response = request(&config, &Command::Block { id })?;
            match response.block {
                Some(block) => println!("{}", serde_json::to_string_pretty(&block)?),
                None => println!("No block {id}"),
            }
            Ok(())
        }

        NodeCommand::Stats => {
            let response = request(&config, &Command::Stats)?;
            let top = response.block.unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&top)?);
            Ok(())
        }
    }
}

/// Run one command against the local node, turning an error reply into a
/// CLI failure.
fn request(config: &Config, command: &Command) -> Result<Response> {
    let response = send_command(&config.socket_path, command)?;
    if response.is_error() {
        return Err(ChainError::Ipc(response.error));
    }
    Ok(response)
}

fn load_wallet(config: &Config, path: Option<PathBuf>) -> Result<Wallet> {
    Wallet::load(&path.unwrap_or_else(|| config.wallet_path.clone()))
}

fn load_or_create_wallet(path: &Path) -> Result<Wallet> {
    if path.exists() {
        return Wallet::load(path);
    }

    let wallet = Wallet::new()?;
    wallet.save(path)?;
    Ok(wallet)
}
