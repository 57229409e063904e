//! Scripted driver for exercising the crawl loop without a browser.
//!
//! Each navigation serves the next scripted page; snapshots of the current
//! page can be taken any number of times without consuming the script.
//! Kept in the library (not behind `cfg(test)`) so integration tests and
//! downstream crates can script crawl flows.

use jobsift_browser::{BrowserError, Driver};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// A [`Driver`] that serves pre-scripted pages instead of driving Chromium.
#[derive(Debug)]
pub struct ScriptedDriver {
    pages: Mutex<VecDeque<String>>,
    current: Mutex<String>,
    url: Mutex<String>,
    navigations: Mutex<Vec<String>>,
    fail_navigations: AtomicU32,
    closed: AtomicBool,
}

impl ScriptedDriver {
    /// Script a driver with the pages each successive navigation serves.
    #[must_use]
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            current: Mutex::new(String::new()),
            url: Mutex::new(String::new()),
            navigations: Mutex::new(Vec::new()),
            fail_navigations: AtomicU32::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Make the next `n` navigations fail with a navigation fault.
    pub fn fail_next_navigations(&self, n: u32) {
        self.fail_navigations.store(n, Ordering::SeqCst);
    }

    /// Every URL navigated to, in order.
    #[must_use]
    pub fn navigation_log(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    /// Whether [`Driver::close`] has been called.
    #[must_use]
    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Driver for ScriptedDriver {
    async fn navigate(&self, url: &str) -> jobsift_browser::Result<()> {
        if self.fail_navigations.load(Ordering::SeqCst) > 0 {
            self.fail_navigations.fetch_sub(1, Ordering::SeqCst);
            return Err(BrowserError::Navigation(format!(
                "scripted navigation fault for {url}"
            )));
        }

        self.navigations.lock().unwrap().push(url.to_string());
        *self.url.lock().unwrap() = url.to_string();
        if let Some(page) = self.pages.lock().unwrap().pop_front() {
            *self.current.lock().unwrap() = page;
        }
        Ok(())
    }

    async fn content(&self) -> jobsift_browser::Result<String> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout_ms: u64,
    ) -> jobsift_browser::Result<()> {
        if self.current.lock().unwrap().contains(selector) {
            Ok(())
        } else {
            Err(BrowserError::Timeout(selector.to_string()))
        }
    }

    async fn evaluate(&self, _script: &str) -> jobsift_browser::Result<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    async fn screenshot(&self) -> jobsift_browser::Result<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn current_url(&self) -> jobsift_browser::Result<String> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn close(&self) -> jobsift_browser::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
