//! Line-oriented front-end: stdin actions and wallet notifications are handled
//! one at a time, in arrival order.

use std::sync::Arc;

use anyhow::Result;
use client_core::{render_feed, LocalWallet, SyncController, WalletProvider};
use shared::domain::{Address, ChainId, PostId};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Connect,
    Profile,
    More,
    Like(PostId),
    Comment(PostId, String),
    Post(String),
    Account(Option<Address>),
    Chain(ChainId),
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  connect                 request wallet access
  profile                 refresh the profile
  more                    load the next page of posts
  like <post-id>          toggle like on a displayed post
  comment <post-id> <text>
  post <text>             create a post
  account <address|none>  switch the wallet account
  chain <chain-id>        switch the wallet network (reloads)
  show | help | quit";

pub fn parse_action(line: &str) -> Result<Action, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let post_id = |raw: &str| {
        raw.parse::<u64>()
            .map(PostId)
            .map_err(|_| format!("invalid post id '{raw}'"))
    };

    match verb {
        "connect" => Ok(Action::Connect),
        "profile" => Ok(Action::Profile),
        "more" => Ok(Action::More),
        "show" | "" => Ok(Action::Show),
        "help" => Ok(Action::Help),
        "quit" | "exit" => Ok(Action::Quit),
        "like" => post_id(rest).map(Action::Like),
        "comment" => {
            let (id, text) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: comment <post-id> <text>".to_string())?;
            Ok(Action::Comment(post_id(id)?, text.trim().to_string()))
        }
        "post" if !rest.is_empty() => Ok(Action::Post(rest.to_string())),
        "post" => Err("usage: post <text>".to_string()),
        "account" if rest == "none" => Ok(Action::Account(None)),
        "account" => rest
            .parse::<Address>()
            .map(|address| Action::Account(Some(address)))
            .map_err(|err| err.to_string()),
        "chain" => rest
            .parse::<u64>()
            .map(|id| Action::Chain(ChainId(id)))
            .map_err(|_| format!("invalid chain id '{rest}'")),
        other => Err(format!("unknown command '{other}'; try 'help'")),
    }
}

pub async fn run(
    controller: Arc<SyncController>,
    provider: Arc<dyn WalletProvider>,
    wallet: Option<Arc<LocalWallet>>,
) -> Result<()> {
    let mut notifications = provider.subscribe();
    let mut wallet_open = provider.is_available();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    controller.start().await;
    println!("{}", render_feed(&controller.snapshot().await));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let action = match parse_action(&line) {
                    Ok(action) => action,
                    Err(message) => {
                        println!("{message}");
                        continue;
                    }
                };
                if action == Action::Quit {
                    break;
                }
                apply(&controller, wallet.as_deref(), action).await;
            }
            notification = notifications.recv(), if wallet_open => {
                if !controller.handle_wallet_notification(notification).await {
                    wallet_open = false;
                    continue;
                }
            }
        }
        println!("{}", render_feed(&controller.snapshot().await));
    }
    Ok(())
}

/// Failures are already logged by the controller, so results are dropped.
async fn apply(controller: &SyncController, wallet: Option<&LocalWallet>, action: Action) {
    match action {
        Action::Connect => {
            let _ = controller.connect().await;
        }
        Action::Profile => {
            let _ = controller.refresh_profile().await;
        }
        Action::More => {
            let _ = controller.load_next_page().await;
        }
        Action::Like(post_id) => {
            let _ = controller.toggle_like(post_id).await;
        }
        Action::Comment(post_id, text) => {
            if controller.set_comment_draft(post_id, text.clone()).await.is_ok() {
                let _ = controller.submit_comment(post_id, &text).await;
            } else {
                println!("post {post_id} is not displayed; try 'more'");
            }
        }
        Action::Post(text) => {
            controller.set_post_draft(text.clone()).await;
            let _ = controller.create_post(&text).await;
        }
        Action::Account(account) => match wallet {
            Some(wallet) => wallet.switch_accounts(account.into_iter().collect()).await,
            None => println!("no wallet configured"),
        },
        Action::Chain(chain_id) => match wallet {
            Some(wallet) => wallet.switch_chain(chain_id).await,
            None => println!("no wallet configured"),
        },
        Action::Help => println!("{HELP}"),
        Action::Show | Action::Quit => {}
    }
}
