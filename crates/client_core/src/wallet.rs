//! In-process wallet provider backed by a fixed account list.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Address, ChainId},
    protocol::WalletEvent,
};
use tokio::sync::{broadcast, Mutex};
use tracing::info;

use crate::WalletProvider;

struct LocalWalletState {
    accounts: Vec<Address>,
    chain_id: ChainId,
    approve: bool,
    authorized: bool,
}

/// Wallet used by the terminal front-end and tests. Accounts are only exposed
/// through `accounts()` once a connection request has been approved, matching
/// how injected browser wallets behave.
pub struct LocalWallet {
    state: Mutex<LocalWalletState>,
    events: broadcast::Sender<WalletEvent>,
}

impl LocalWallet {
    pub fn new(accounts: Vec<Address>, chain_id: ChainId) -> Self {
        Self::with_approval(accounts, chain_id, true)
    }

    /// A wallet whose user denies every connection request.
    pub fn denying(accounts: Vec<Address>, chain_id: ChainId) -> Self {
        Self::with_approval(accounts, chain_id, false)
    }

    fn with_approval(accounts: Vec<Address>, chain_id: ChainId, approve: bool) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(LocalWalletState {
                accounts,
                chain_id,
                approve,
                authorized: false,
            }),
            events,
        }
    }

    pub async fn set_approve(&self, approve: bool) {
        self.state.lock().await.approve = approve;
    }

    pub async fn chain_id(&self) -> ChainId {
        self.state.lock().await.chain_id
    }

    pub async fn switch_accounts(&self, accounts: Vec<Address>) {
        let visible = {
            let mut state = self.state.lock().await;
            state.accounts = accounts;
            if state.authorized {
                state.accounts.clone()
            } else {
                Vec::new()
            }
        };
        info!(accounts = visible.len(), "wallet: accounts changed");
        let _ = self.events.send(WalletEvent::AccountsChanged(visible));
    }

    pub async fn switch_chain(&self, chain_id: ChainId) {
        self.state.lock().await.chain_id = chain_id;
        info!(%chain_id, "wallet: chain changed");
        let _ = self.events.send(WalletEvent::ChainChanged(chain_id));
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let mut state = self.state.lock().await;
        if !state.approve {
            return Err(anyhow!("user rejected the request"));
        }
        state.authorized = true;
        Ok(state.accounts.clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        let state = self.state.lock().await;
        if state.authorized {
            Ok(state.accounts.clone())
        } else {
            Ok(Vec::new())
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}
