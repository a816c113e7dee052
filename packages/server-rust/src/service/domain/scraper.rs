//! The `fetch_page` operation: download a page body as text.

use std::time::Duration;

use anyhow::{bail, Context as _};
use buoy_core::{CallError, ParamDef, Value, ValueType};
use tokio::runtime::Handle;

use crate::service::registry::{CallRegistry, OperationHandler};

/// Name under which [`PageFetcher`] is registered.
pub const FETCH_PAGE: &str = "fetch_page";

/// Largest response body accepted, in bytes.
pub const MAX_RESPONSE_BYTES: usize = 2_000_000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// `fetch_page(url: text) -> text`: GETs `url` and returns the body, decoded
/// as lossy UTF-8.
///
/// Handlers are synchronous, so the request runs on the ambient Tokio
/// runtime through `block_in_place`. That needs the multi-threaded runtime;
/// on a current-thread runtime or with no runtime the call fails with
/// `HandlerFailure`.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl PageFetcher {
    /// Creates a fetcher capped at [`MAX_RESPONSE_BYTES`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_max_bytes(MAX_RESPONSE_BYTES)
    }

    /// Creates a fetcher that refuses bodies longer than `max_bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_max_bytes(max_bytes: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, max_bytes })
    }

    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()?;

        let limit = u64::try_from(self.max_bytes).unwrap_or(u64::MAX);
        if let Some(len) = response.content_length() {
            if len > limit {
                bail!("response of {len} bytes exceeds limit of {}", self.max_bytes);
            }
        }

        // Content-Length may be absent or wrong, so the cap is enforced on
        // the bytes actually read.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                bail!("response exceeds limit of {} bytes", self.max_bytes);
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(url, bytes = body.len(), "page fetched");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl OperationHandler for PageFetcher {
    fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        let url = args
            .first()
            .and_then(Value::as_text)
            .context("fetch_page expects a text argument")?;
        let runtime = Handle::try_current().context("fetch_page needs a Tokio runtime")?;

        let page = tokio::task::block_in_place(|| runtime.block_on(self.fetch(url)))?;
        Ok(Value::Text(page))
    }
}

/// Registers `fetch_page(url: text) -> text`.
///
/// # Errors
///
/// Returns `CallError::DuplicateOperation` if `fetch_page` is already
/// registered, or `CallError::HandlerFailure` if the HTTP client cannot be
/// built.
pub fn register(registry: &mut CallRegistry) -> Result<(), CallError> {
    let fetcher = PageFetcher::new().map_err(|err| CallError::HandlerFailure {
        operation: FETCH_PAGE.to_string(),
        message: format!("{err:#}"),
    })?;
    registry.register(
        FETCH_PAGE,
        vec![ParamDef::new("url", ValueType::Text)],
        ValueType::Text,
        fetcher,
    )
}
