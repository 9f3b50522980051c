//! Headless Chromium session shared by the rendered page fetcher and the
//! converter.
//!
//! A session owns the browser process and the task that drives its CDP
//! event stream. It is created per operation and torn down with
//! [`BrowserSession::close`] on every exit path.
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Flags passed to Chromium on every launch.
const DEFAULT_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--disable-features=VizDisplayCompositor",
    "--window-size=1280,720",
];

/// Hides `navigator.webdriver` from page scripts.
const HIDE_WEBDRIVER: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined }); true";

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub user_agent: Option<String>,
    pub extra_args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: None,
            extra_args: Vec::new(),
        }
    }
}

pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder().no_sandbox();
        if !options.headless {
            builder = builder.with_head();
        }
        for arg in DEFAULT_ARGS {
            builder = builder.arg(*arg);
        }
        if let Some(ua) = &options.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        for arg in &options.extra_args {
            builder = builder.arg(arg.as_str());
        }
        let cfg = builder.build().map_err(anyhow::Error::msg)?;

        let (browser, mut handler) = Browser::launch(cfg)
            .await
            .context("failed to launch browser")?;

        // drive the handler in background
        let handler = tokio::spawn(async move { while let Some(_) = handler.next().await {} });

        debug!("Browser launched (headless: {})", options.headless);
        Ok(Self { browser, handler })
    }

    /// Open `url` in a new tab and wait for the navigation to settle.
    pub async fn open(&self, url: &str) -> Result<Page> {
        let page = self
            .browser
            .new_page(url)
            .await
            .with_context(|| format!("failed to open {url}"))?;
        if let Err(e) = page.wait_for_navigation().await {
            debug!("Navigation wait for {url} ended early: {e}");
        }
        if let Err(e) = page.evaluate(HIDE_WEBDRIVER).await {
            debug!("Could not patch navigator.webdriver: {e}");
        }
        Ok(page)
    }

    /// Load `url` and return the rendered document markup.
    pub async fn render(&self, url: &str, settle: Duration) -> Result<String> {
        let page = self.open(url).await?;
        tokio::time::sleep(settle).await;
        let content = page.content().await.context("failed to read page content");
        close_page(page).await;
        content
    }

    /// Best effort: errors are logged, never returned.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser close failed: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Browser wait failed: {e}");
        }
        self.handler.abort();
    }
}

pub async fn close_page(page: Page) {
    if let Err(e) = page.close().await {
        debug!("Page close failed: {e}");
    }
}

/// Fresh single-threaded runtime for one blocking browser operation.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")
}
