use shared::domain::PostId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no wallet provider detected; install a wallet extension")]
    ProviderUnavailable,
    #[error("wallet provider rejected the connection request: {0}")]
    ProviderRejected(String),
    #[error("wallet provider returned no accounts")]
    NoAccounts,
    #[error("no connected account")]
    NotConnected,
    #[error("contract read `{method}` failed: {source:#}")]
    Read {
        method: &'static str,
        source: anyhow::Error,
    },
    #[error("contract write `{method}` failed: {source:#}")]
    Write {
        method: &'static str,
        source: anyhow::Error,
    },
    #[error("a page fetch is already in flight")]
    PaginationInFlight,
    #[error("post {0} is not displayed")]
    UnknownPost(PostId),
}

impl ClientError {
    pub(crate) fn read(method: &'static str, source: anyhow::Error) -> Self {
        Self::Read { method, source }
    }

    pub(crate) fn write(method: &'static str, source: anyhow::Error) -> Self {
        Self::Write { method, source }
    }

    /// Whether the user can recover by repeating the action that failed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ClientError::ProviderUnavailable)
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
