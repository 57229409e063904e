use crate::error::Result;

/// Capability interface over a live browser session.
///
/// This is everything the crawler needs from an automation backend:
/// navigation, a rendered-markup snapshot, bounded element waits, script
/// execution, and screenshots. Any conforming implementation is
/// substitutable; tests use a scripted fake instead of Chromium.
#[async_trait::async_trait]
pub trait Driver: Send + Sync {
    /// Navigate to a URL and wait for the load to settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Snapshot the current rendered markup.
    async fn content(&self) -> Result<String>;

    /// Wait, bounded by `timeout_ms`, for a selector to be present.
    ///
    /// Returns `BrowserError::Timeout` if the element never appears.
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Execute a script against the page and return its JSON result.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Capture a screenshot of the current page.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// The URL the session is currently settled on.
    async fn current_url(&self) -> Result<String>;

    /// Tear down the session, releasing the underlying browser process.
    async fn close(&self) -> Result<()>;
}

#[async_trait::async_trait]
impl<D: Driver + ?Sized> Driver for std::sync::Arc<D> {
    async fn navigate(&self, url: &str) -> Result<()> {
        (**self).navigate(url).await
    }

    async fn content(&self) -> Result<String> {
        (**self).content().await
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        (**self).wait_for_selector(selector, timeout_ms).await
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        (**self).evaluate(script).await
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        (**self).screenshot().await
    }

    async fn current_url(&self) -> Result<String> {
        (**self).current_url().await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}

