//! HTTP seam: every network call in the pipeline goes through [`Upstream`].

use anyhow::{Context, Result};
use std::future::Future;

use crate::utils::config::ApiConsts;

/// Status and raw body of one GET.
#[derive(Clone, Debug)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Anything that can GET an absolute URL. Must be safe to call from many in-flight futures at once.
///
/// `Err` is reserved for transport failures (connect, timeout, body read); HTTP error statuses come
/// back as `Ok` with the status set.
pub trait Upstream {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpReply>>;
}

/// [`Upstream`] over one shared `reqwest::Client` for the whole run.
#[derive(Clone, Debug)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Build the shared client with the per-request timeout and user agent.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(ApiConsts::USER_AGENT)
            .timeout(ApiConsts::REQUEST_TIMEOUT)
            .build()
            .context("build HTTP client")?;
        Ok(Self { client })
    }
}

impl Upstream for HttpUpstream {
    async fn get(&self, url: &str) -> Result<HttpReply> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("read body of {url}"))?;
        Ok(HttpReply { status, body })
    }
}
