//! `SocialContract` over an HTTP JSON gateway that relays calls to the chain.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{Address, Post, PostId, UserProfile},
    error::{ApiError, ErrorCode},
    protocol::{CallResponse, ContractCall, TransactionReceipt},
};
use tracing::debug;
use url::Url;

use crate::SocialContract;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpContract {
    http: Client,
    endpoint: Url,
}

impl HttpContract {
    pub fn new(gateway_url: &str) -> Result<Self> {
        Self::with_timeout(gateway_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(gateway_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build gateway http client")?;
        Ok(Self {
            http,
            endpoint: call_endpoint(gateway_url)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, call: ContractCall) -> Result<T> {
        let method = call.method_name();
        debug!(method, "gateway: sending contract call");
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&call)
            .send()
            .await
            .with_context(|| format!("failed to reach gateway for {method}"))?;

        let status = response.status();
        if !status.is_success() {
            let api_error = response.json::<ApiError>().await.unwrap_or_else(|_| {
                ApiError::new(
                    ErrorCode::from_status(status.as_u16()),
                    format!("gateway returned {status}"),
                )
            });
            return Err(api_error.into());
        }

        let body: CallResponse<T> = response
            .json()
            .await
            .with_context(|| format!("malformed gateway response for {method}"))?;
        Ok(body.result)
    }
}

fn call_endpoint(gateway_url: &str) -> Result<Url> {
    let mut base = Url::parse(gateway_url.trim())
        .with_context(|| format!("invalid gateway url '{gateway_url}'"))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(anyhow!(
            "gateway url must use http or https, got '{}'",
            base.scheme()
        ));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("call")
        .with_context(|| format!("invalid gateway url '{gateway_url}'"))
}

#[async_trait]
impl SocialContract for HttpContract {
    async fn get_user_profile(&self, address: &Address) -> Result<UserProfile> {
        self.call(ContractCall::GetUserProfile {
            address: address.clone(),
        })
        .await
    }

    async fn get_post_ids(&self) -> Result<Vec<PostId>> {
        self.call(ContractCall::GetPostIds).await
    }

    async fn get_post(&self, post_id: PostId) -> Result<Post> {
        self.call(ContractCall::GetPost { post_id }).await
    }

    async fn create_post(&self, from: &Address, content: &str) -> Result<TransactionReceipt> {
        self.call(ContractCall::CreatePost {
            from: from.clone(),
            content: content.to_string(),
        })
        .await
    }

    async fn toggle_like_post(&self, from: &Address, post_id: PostId) -> Result<TransactionReceipt> {
        self.call(ContractCall::ToggleLikePost {
            from: from.clone(),
            post_id,
        })
        .await
    }

    async fn submit_comment(
        &self,
        from: &Address,
        post_id: PostId,
        content: &str,
    ) -> Result<TransactionReceipt> {
        self.call(ContractCall::SubmitComment {
            from: from.clone(),
            post_id,
            content: content.to_string(),
        })
        .await
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
