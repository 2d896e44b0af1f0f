use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    domain::{Address, Post, PostId, UserProfile},
    protocol::{TransactionReceipt, WalletEvent},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{error, info, warn};

pub mod error;
pub mod gateway;
pub mod pagination;
pub mod view;
pub mod wallet;

pub use error::{ClientError, ClientResult};
pub use gateway::HttpContract;
pub use pagination::{fetch_page, PageOutcome, PaginationCursor, DEFAULT_PAGE_SIZE};
pub use view::{profile_label, render_feed, FeedView, PostView};
pub use wallet::LocalWallet;

pub const DEFAULT_FETCH_CONCURRENCY: usize = 1;

/// Read and write surface of the posts contract.
#[async_trait]
pub trait SocialContract: Send + Sync {
    async fn get_user_profile(&self, address: &Address) -> Result<UserProfile>;
    async fn get_post_ids(&self) -> Result<Vec<PostId>>;
    async fn get_post(&self, post_id: PostId) -> Result<Post>;
    async fn create_post(&self, from: &Address, content: &str) -> Result<TransactionReceipt>;
    async fn toggle_like_post(&self, from: &Address, post_id: PostId)
        -> Result<TransactionReceipt>;
    async fn submit_comment(
        &self,
        from: &Address,
        post_id: PostId,
        content: &str,
    ) -> Result<TransactionReceipt>;
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `false` when no wallet is installed at all.
    fn is_available(&self) -> bool {
        true
    }
    async fn request_accounts(&self) -> Result<Vec<Address>>;
    async fn accounts(&self) -> Result<Vec<Address>>;
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}

pub struct MissingWalletProvider;

#[async_trait]
impl WalletProvider for MissingWalletProvider {
    fn is_available(&self) -> bool {
        false
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        Err(anyhow!("wallet provider is unavailable"))
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(Vec::new())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        // The sender is dropped here, so the receiver reports `Closed` at once.
        let (_events, receiver) = broadcast::channel(1);
        receiver
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub page_size: usize,
    /// Post detail reads kept in flight while fetching a page.
    pub fetch_concurrency: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account: Address,
    pub connected_at: DateTime<Utc>,
}

impl Session {
    fn new(account: Address) -> Self {
        Self {
            account,
            connected_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    SessionChanged(Option<Address>),
    ProfileUpdated(Option<String>),
    PostsAppended {
        offset: usize,
        post_ids: Vec<PostId>,
    },
    LikeCountChanged {
        post_id: PostId,
        displayed_likes: u64,
    },
    CommentSubmitted {
        post_id: PostId,
    },
    PostCreated,
    Reloaded,
    Error(String),
}

#[derive(Default)]
struct FeedState {
    session: Option<Session>,
    feed: FeedView,
}

pub struct SyncController {
    contract: Arc<dyn SocialContract>,
    wallet: Arc<dyn WalletProvider>,
    config: ControllerConfig,
    inner: Mutex<FeedState>,
    /// Also the in-flight guard for `load_next_page`.
    cursor: Mutex<PaginationCursor>,
    events: broadcast::Sender<ClientEvent>,
}

impl SyncController {
    pub fn new(
        contract: Arc<dyn SocialContract>,
        wallet: Arc<dyn WalletProvider>,
        config: ControllerConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            contract,
            wallet,
            config,
            inner: Mutex::new(FeedState::default()),
            cursor: Mutex::new(PaginationCursor::new(config.page_size)),
            events,
        })
    }

    pub fn without_wallet(contract: Arc<dyn SocialContract>, config: ControllerConfig) -> Arc<Self> {
        Self::new(contract, Arc::new(MissingWalletProvider), config)
    }

    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> FeedView {
        self.inner.lock().await.feed.clone()
    }

    pub async fn session(&self) -> Option<Session> {
        self.inner.lock().await.session.clone()
    }

    /// Waits for an in-flight page fetch to finish before reading.
    pub async fn cursor(&self) -> PaginationCursor {
        *self.cursor.lock().await
    }

    /// Page-load sequence: connect when a wallet is present, then show the
    /// first page whether or not the connection succeeded.
    pub async fn start(&self) {
        if self.wallet.is_available() {
            let _ = self.connect().await;
        } else {
            let _ = self.report("start", ClientError::ProviderUnavailable);
        }
        let _ = self.load_next_page().await;
    }

    pub async fn connect(&self) -> ClientResult<Address> {
        if !self.wallet.is_available() {
            return Err(self.report("connect", ClientError::ProviderUnavailable));
        }

        let accounts = match self.wallet.request_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                return Err(self.report(
                    "connect",
                    ClientError::ProviderRejected(format!("{err:#}")),
                ))
            }
        };
        let Some(account) = accounts.into_iter().next() else {
            return Err(self.report("connect", ClientError::NoAccounts));
        };

        self.inner.lock().await.session = Some(Session::new(account.clone()));
        info!(account = %account.short(), "connect: wallet connected");
        let _ = self
            .events
            .send(ClientEvent::SessionChanged(Some(account.clone())));

        let _ = self.refresh_profile().await;
        Ok(account)
    }

    /// Reads the active account's profile. A failed read keeps whatever the
    /// profile region showed before.
    pub async fn refresh_profile(&self) -> ClientResult<String> {
        let account = self
            .active_account()
            .await
            .map_err(|err| self.report("refresh_profile", err))?;

        let profile = self
            .contract
            .get_user_profile(&account)
            .await
            .map_err(|err| {
                self.report("refresh_profile", ClientError::read("getUserProfile", err))
            })?;

        let label = profile_label(&profile);
        self.inner.lock().await.feed.profile = Some(label.clone());
        info!(account = %account.short(), posts = profile.posts_count, "profile: refreshed");
        let _ = self
            .events
            .send(ClientEvent::ProfileUpdated(Some(label.clone())));
        Ok(label)
    }

    /// Appends the next page of posts and returns how many views were added.
    ///
    /// Rejected with `PaginationInFlight` while another page is loading. When
    /// a detail read fails, the posts fetched before it stay displayed and the
    /// cursor does not move.
    pub async fn load_next_page(&self) -> ClientResult<usize> {
        let Ok(mut cursor) = self.cursor.try_lock() else {
            return Err(self.report("load_next_page", ClientError::PaginationInFlight));
        };

        let offset = cursor.offset();
        let outcome = fetch_page(
            self.contract.as_ref(),
            *cursor,
            self.config.fetch_concurrency,
        )
        .await;

        let appended: Vec<PostId> = {
            let mut inner = self.inner.lock().await;
            outcome
                .posts
                .into_iter()
                .filter_map(|(post_id, post)| inner.feed.append(post_id, post).then_some(post_id))
                .collect()
        };
        if !appended.is_empty() {
            let _ = self.events.send(ClientEvent::PostsAppended {
                offset,
                post_ids: appended.clone(),
            });
        }

        if let Some(err) = outcome.error {
            error!(
                operation = "load_next_page",
                offset,
                fetched = appended.len(),
                "{err}"
            );
            return Err(self.emit_error("load_next_page", err));
        }
        if let Some(next) = outcome.next {
            *cursor = next;
        }
        info!(
            offset,
            next_offset = cursor.offset(),
            rendered = appended.len(),
            "pagination: page loaded"
        );
        Ok(appended.len())
    }

    /// Toggles the like and bumps the displayed count by one. The new count is
    /// not read back from the contract.
    ///
    /// Returns `None` when the transaction went through but the post was no
    /// longer displayed, e.g. after a reload while it was pending.
    pub async fn toggle_like(&self, post_id: PostId) -> ClientResult<Option<u64>> {
        let account = self
            .active_account()
            .await
            .map_err(|err| self.report("toggle_like", err))?;
        self.ensure_displayed(post_id)
            .await
            .map_err(|err| self.report("toggle_like", err))?;

        let receipt = self
            .contract
            .toggle_like_post(&account, post_id)
            .await
            .map_err(|err| self.report("toggle_like", ClientError::write("toggleLikePost", err)))?;

        let displayed_likes = self.inner.lock().await.feed.post_mut(post_id).map(|view| {
            view.displayed_likes = view.displayed_likes.saturating_add(1);
            view.displayed_likes
        });
        let Some(displayed_likes) = displayed_likes else {
            info!(
                %post_id,
                tx = %receipt.transaction_hash,
                "like: toggled, post no longer displayed"
            );
            return Ok(None);
        };
        info!(
            %post_id,
            displayed_likes,
            tx = %receipt.transaction_hash,
            "like: toggled"
        );
        let _ = self.events.send(ClientEvent::LikeCountChanged {
            post_id,
            displayed_likes,
        });
        Ok(Some(displayed_likes))
    }

    /// Sends a comment. On success the post's comment draft is cleared; the
    /// comment itself is not shown since comments are never read back.
    pub async fn submit_comment(
        &self,
        post_id: PostId,
        text: &str,
    ) -> ClientResult<TransactionReceipt> {
        let account = self
            .active_account()
            .await
            .map_err(|err| self.report("submit_comment", err))?;
        self.ensure_displayed(post_id)
            .await
            .map_err(|err| self.report("submit_comment", err))?;

        let receipt = self
            .contract
            .submit_comment(&account, post_id, text)
            .await
            .map_err(|err| self.report("submit_comment", ClientError::write("submitComment", err)))?;

        if let Some(view) = self.inner.lock().await.feed.post_mut(post_id) {
            view.comment_draft.clear();
        }
        info!(%post_id, tx = %receipt.transaction_hash, "comment: submitted");
        let _ = self.events.send(ClientEvent::CommentSubmitted { post_id });
        Ok(receipt)
    }

    /// Sends a new post. The list only grows through `load_next_page`, so the
    /// post is not inserted locally.
    pub async fn create_post(&self, text: &str) -> ClientResult<TransactionReceipt> {
        let account = self
            .active_account()
            .await
            .map_err(|err| self.report("create_post", err))?;

        let receipt = self
            .contract
            .create_post(&account, text)
            .await
            .map_err(|err| self.report("create_post", ClientError::write("createPost", err)))?;

        self.inner.lock().await.feed.post_draft.clear();
        info!(account = %account.short(), tx = %receipt.transaction_hash, "post: created");
        let _ = self.events.send(ClientEvent::PostCreated);
        Ok(receipt)
    }

    pub async fn set_post_draft(&self, text: impl Into<String>) {
        self.inner.lock().await.feed.post_draft = text.into();
    }

    pub async fn set_comment_draft(
        &self,
        post_id: PostId,
        text: impl Into<String>,
    ) -> ClientResult<()> {
        let mut inner = self.inner.lock().await;
        let view = inner
            .feed
            .post_mut(post_id)
            .ok_or(ClientError::UnknownPost(post_id))?;
        view.comment_draft = text.into();
        Ok(())
    }

    pub async fn handle_wallet_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => self.apply_accounts(accounts).await,
            WalletEvent::ChainChanged(chain_id) => {
                info!(%chain_id, "wallet: chain changed, reloading");
                self.reload().await;
            }
        }
    }

    /// Equivalent of a full page reload: drops the session, every displayed
    /// post and draft, rewinds the cursor, then runs `start` again.
    pub async fn reload(&self) {
        self.cursor.lock().await.reset();
        *self.inner.lock().await = FeedState::default();
        let _ = self.events.send(ClientEvent::Reloaded);
        self.start().await;
    }

    /// Applies wallet notifications one at a time until the provider's
    /// stream closes.
    pub async fn run_wallet_events(&self) {
        self.drive_wallet_events(self.wallet.subscribe()).await;
    }

    /// The subscription is taken before the task is spawned.
    pub fn spawn_wallet_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        let notifications = self.wallet.subscribe();
        tokio::spawn(async move { controller.drive_wallet_events(notifications).await })
    }

    async fn drive_wallet_events(&self, mut notifications: broadcast::Receiver<WalletEvent>) {
        while self
            .handle_wallet_notification(notifications.recv().await)
            .await
        {}
    }

    /// Applies one received notification. After a lag the current accounts
    /// are read back from the provider, since an account change may have been
    /// among the dropped ones. Returns `false` once the stream is closed.
    pub async fn handle_wallet_notification(
        &self,
        notification: Result<WalletEvent, broadcast::error::RecvError>,
    ) -> bool {
        match notification {
            Ok(event) => self.handle_wallet_event(event).await,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "wallet: missed notifications, resyncing accounts");
                match self.wallet.accounts().await {
                    Ok(accounts) => self.apply_accounts(accounts).await,
                    Err(err) => error!("wallet: failed to query accounts: {err:#}"),
                }
            }
            Err(broadcast::error::RecvError::Closed) => return false,
        }
        true
    }

    async fn apply_accounts(&self, accounts: Vec<Address>) {
        let session = accounts.into_iter().next().map(Session::new);
        let account = session.as_ref().map(|session| session.account.clone());
        let connected = session.is_some();
        {
            let mut inner = self.inner.lock().await;
            inner.session = session;
            if !connected {
                inner.feed.profile = None;
            }
        }
        info!(
            account = %account.as_ref().map(Address::short).unwrap_or_default(),
            "wallet: accounts changed"
        );
        let _ = self.events.send(ClientEvent::SessionChanged(account));

        if connected {
            let _ = self.refresh_profile().await;
        } else {
            let _ = self.events.send(ClientEvent::ProfileUpdated(None));
        }
    }

    async fn active_account(&self) -> ClientResult<Address> {
        self.inner
            .lock()
            .await
            .session
            .as_ref()
            .map(|session| session.account.clone())
            .ok_or(ClientError::NotConnected)
    }

    async fn ensure_displayed(&self, post_id: PostId) -> ClientResult<()> {
        if self.inner.lock().await.feed.post(post_id).is_some() {
            Ok(())
        } else {
            Err(ClientError::UnknownPost(post_id))
        }
    }

    fn report(&self, operation: &'static str, err: ClientError) -> ClientError {
        match &err {
            ClientError::PaginationInFlight
            | ClientError::NotConnected
            | ClientError::ProviderRejected(_)
            | ClientError::NoAccounts
            | ClientError::UnknownPost(_) => warn!(operation, "{err}"),
            _ => error!(operation, "{err}"),
        }
        self.emit_error(operation, err)
    }

    fn emit_error(&self, operation: &'static str, err: ClientError) -> ClientError {
        let _ = self
            .events
            .send(ClientEvent::Error(format!("{operation}: {err}")));
        err
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
