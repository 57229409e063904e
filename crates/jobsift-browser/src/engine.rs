use crate::driver::Driver;
use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures_util::stream::StreamExt;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Poll interval for bounded element-presence waits.
const WAIT_POLL_MS: u64 = 100;

/// Browser automation engine backed by Chromium.
///
/// Owns one browser process and one page; the crawl is strictly
/// single-session, single-tab. Dropping the engine kills the child
/// process, but callers should prefer [`Driver::close`] so shutdown is
/// graceful on every exit path.
pub struct BrowserEngine {
    browser: Mutex<Browser>,
    page: Page,
    fingerprint: FingerprintConfig,
}

impl BrowserEngine {
    /// Launch a new browser engine with a randomized fingerprint.
    pub async fn launch(headless: bool) -> Result<Self> {
        Self::launch_with_fingerprint(headless, FingerprintConfig::randomized()).await
    }

    /// Launch a new browser engine with a specific fingerprint.
    pub async fn launch_with_fingerprint(
        headless: bool,
        fingerprint: FingerprintConfig,
    ) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height);
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // Drive browser events until the session ends
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let identity = SetUserAgentOverrideParams::builder()
            .user_agent(fingerprint.user_agent.clone())
            .accept_language(fingerprint.accept_language.clone())
            .platform(fingerprint.platform.clone())
            .build()
            .map_err(BrowserError::Launch)?;
        page.set_user_agent(identity)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        tracing::info!(
            user_agent = %fingerprint.user_agent,
            viewport = format!("{}x{}", fingerprint.viewport_width, fingerprint.viewport_height),
            "browser session established"
        );

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            fingerprint,
        })
    }

    /// The fingerprint this session was launched with.
    #[must_use]
    pub fn fingerprint(&self) -> &FingerprintConfig {
        &self.fingerprint
    }
}

#[async_trait::async_trait]
impl Driver for BrowserEngine {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation(format!("{url}: {e}")))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::Navigation(format!("{url}: {e}")))?;
        tracing::debug!(%url, "navigated");
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "{selector} after {timeout_ms}ms"
                )));
            }
            tokio::time::sleep(Duration::from_millis(WAIT_POLL_MS)).await;
        }
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self.page.evaluate(script).await?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
            )
            .await
            .map_err(|e| BrowserError::Screenshot(e.to_string()))
    }

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await?
            .ok_or_else(|| BrowserError::Navigation("page has no URL".to_string()))
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await?;
        if let Err(e) = browser.wait().await {
            tracing::warn!("browser process did not exit cleanly: {}", e);
        }
        tracing::info!("browser session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires Chrome browser to be installed"]
    async fn test_launch_and_close() {
        let engine = BrowserEngine::launch(true).await.expect("launch browser");
        engine.navigate("about:blank").await.expect("navigate");
        let html = engine.content().await.expect("snapshot");
        assert!(html.contains("<html"));
        engine.close().await.expect("close browser");
    }
}
