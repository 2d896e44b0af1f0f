use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use client_core::{
    render_feed, HttpContract, LocalWallet, MissingWalletProvider, SyncController, WalletProvider,
};
use shared::domain::PostId;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod shell;

use config::load_settings;

/// Scan limit when looking for a post to act on.
const MAX_SCAN_PAGES: usize = 100;

#[derive(Parser, Debug)]
#[command(name = "feed_cli", version, about = "Read and write posts on the feed contract")]
struct Args {
    /// TOML config file; `feed.toml` in the working directory is used if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    gateway_url: Option<String>,
    #[arg(long, global = true)]
    page_size: Option<usize>,
    /// Account exposed by the local wallet. Repeatable; without any account
    /// the client runs as if no wallet were installed.
    #[arg(long = "account", global = true)]
    accounts: Vec<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect the wallet and print the profile.
    Profile,
    /// Print the first pages of the feed.
    Feed {
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Create a post.
    Post { text: String },
    /// Toggle like on a post.
    Like { post_id: u64 },
    /// Comment on a post.
    Comment { post_id: u64, text: String },
    /// Interactive session reading commands from stdin.
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("feed_cli=info,client_core=info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(gateway_url) = args.gateway_url {
        settings.gateway_url = gateway_url;
    }
    if let Some(page_size) = args.page_size {
        settings.page_size = page_size;
    }
    if !args.accounts.is_empty() {
        settings.accounts = args.accounts;
    }
    settings.validate()?;
    info!(gateway = %settings.gateway_url, page_size = settings.page_size, "feed_cli starting");

    let contract = Arc::new(HttpContract::with_timeout(
        &settings.gateway_url,
        settings.request_timeout(),
    )?);
    info!(endpoint = %contract.endpoint(), "gateway client ready");
    let accounts = settings.parsed_accounts()?;
    let wallet = (!accounts.is_empty())
        .then(|| Arc::new(LocalWallet::new(accounts, settings.chain_id())));
    let provider: Arc<dyn WalletProvider> = match &wallet {
        Some(wallet) => wallet.clone(),
        None => Arc::new(MissingWalletProvider),
    };
    let controller = SyncController::new(contract, provider.clone(), settings.controller_config());

    match args.command {
        Command::Profile => {
            controller.connect().await?;
            let feed = controller.snapshot().await;
            println!("{}", feed.profile.as_deref().unwrap_or("(profile unavailable)"));
        }
        Command::Feed { pages } => {
            controller.start().await;
            for _ in 1..pages {
                controller.load_next_page().await?;
            }
            print!("{}", render_feed(&controller.snapshot().await));
        }
        Command::Post { text } => {
            controller.connect().await?;
            controller.set_post_draft(text.clone()).await;
            let receipt = controller.create_post(&text).await?;
            println!("post submitted in {}", receipt.transaction_hash);
        }
        Command::Like { post_id } => {
            let post_id = PostId(post_id);
            controller.connect().await?;
            load_until_displayed(&controller, post_id).await?;
            match controller.toggle_like(post_id).await? {
                Some(displayed) => println!("#{post_id} Like ({displayed})"),
                None => println!("#{post_id} like submitted"),
            }
        }
        Command::Comment { post_id, text } => {
            let post_id = PostId(post_id);
            controller.connect().await?;
            load_until_displayed(&controller, post_id).await?;
            controller.set_comment_draft(post_id, text.clone()).await?;
            let receipt = controller.submit_comment(post_id, &text).await?;
            println!("comment submitted in {}", receipt.transaction_hash);
        }
        Command::Shell => {
            println!("{}", shell::HELP);
            shell::run(controller, provider, wallet).await?;
        }
    }

    Ok(())
}

async fn load_until_displayed(controller: &SyncController, post_id: PostId) -> Result<()> {
    for _ in 0..MAX_SCAN_PAGES {
        if controller.snapshot().await.post(post_id).is_some() {
            return Ok(());
        }
        if controller.load_next_page().await? == 0 {
            break;
        }
    }
    if controller.snapshot().await.post(post_id).is_some() {
        Ok(())
    } else {
        Err(anyhow!("post {post_id} not found in the feed"))
    }
}
