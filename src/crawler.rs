//! Web crawling: fetch pages, extract code blocks, pair them and keep the
//! pairs that pass the record validity gate.
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::browser::{self, BrowserOptions, BrowserSession};
use crate::config::CrawlConfig;
use crate::extract::pairing::PairMatcher;
use crate::extract::{CodeExtractor, is_translation_page};
use crate::record::{Example, Rejection};

// ── Fetching ─────────────────────────────────────────────────────────

/// HTTP client settings, built once and handed to the fetcher.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl From<&CrawlConfig> for ClientConfig {
    fn from(cfg: &CrawlConfig) -> Self {
        Self {
            user_agent: cfg.user_agent.clone(),
            timeout: cfg.timeout(),
        }
    }
}

/// Source of page markup.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .context("HTTP client build failed")?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("HTTP request failed: {url}"))?;

        if !resp.status().is_success() {
            bail!("bad status: {} for {url}", resp.status());
        }

        resp.text().context("failed to read response body")
    }
}

/// Fetches through a headless browser so script-built pages have content.
pub struct RenderedFetcher {
    options: BrowserOptions,
    settle: Duration,
}

impl RenderedFetcher {
    pub fn new(options: BrowserOptions, settle: Duration) -> Self {
        Self { options, settle }
    }
}

impl PageFetcher for RenderedFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let rt = browser::runtime()?;
        rt.block_on(async {
            let session = BrowserSession::launch(&self.options).await?;
            let content = session.render(url, self.settle).await;
            session.close().await;
            content
        })
    }
}

// ── Crawler ──────────────────────────────────────────────────────────

/// What happened to one page.
#[derive(Debug, Default)]
pub struct PageOutcome {
    pub translation_page: bool,
    pub vb_blocks: usize,
    pub csharp_blocks: usize,
    pub pairs: usize,
    pub examples: Vec<Example>,
    /// One entry per pair refused by the validity gate.
    pub rejected: Vec<Rejection>,
}

impl PageOutcome {
    /// Rejection counts by reason, in order of first occurrence,
    /// e.g. `2 C# code is 10 chars or shorter, 1 VB.NET and C# code are identical`.
    pub fn rejection_summary(&self) -> String {
        let mut counts: Vec<(Rejection, usize)> = Vec::new();
        for reason in &self.rejected {
            match counts.iter_mut().find(|(r, _)| r == reason) {
                Some((_, n)) => *n += 1,
                None => counts.push((*reason, 1)),
            }
        }
        counts
            .iter()
            .map(|(reason, n)| format!("{n} {reason}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub struct Crawler<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
    extractor: CodeExtractor,
    matcher: PairMatcher,
    translation_keywords: Vec<String>,
    delay: Duration,
}

impl<'a, F: PageFetcher + ?Sized> Crawler<'a, F> {
    pub fn new(fetcher: &'a F, config: &CrawlConfig) -> Self {
        Self {
            fetcher,
            extractor: CodeExtractor::new(),
            matcher: PairMatcher::new(config.max_pair_candidates),
            translation_keywords: config.translation_keywords.clone(),
            delay: config.delay(),
        }
    }

    /// Override the pause between URLs.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Extract, pair and validate the examples on an already fetched page.
    pub fn crawl_html(&self, url: &str, html: &str) -> PageOutcome {
        let mut outcome = PageOutcome::default();
        if !is_translation_page(html, &self.translation_keywords) {
            info!("Skipping {url}: no translation keywords on the page");
            return outcome;
        }
        outcome.translation_page = true;

        let blocks = self.extractor.extract_code_blocks(html);
        outcome.vb_blocks = blocks.vb.len();
        outcome.csharp_blocks = blocks.csharp.len();
        let pairs = self.matcher.find_translation_pairs(&blocks.vb, &blocks.csharp);
        outcome.pairs = pairs.len();

        for (vb, cs) in pairs {
            match Example::crawled(&vb, &cs, url).accept() {
                Ok(example) => outcome.examples.push(example),
                Err(reason) => outcome.rejected.push(reason),
            }
        }

        if outcome.pairs == 0 && (outcome.vb_blocks > 0 || outcome.csharp_blocks > 0) {
            info!(
                "No pairs matched on {url}: {} VB.NET and {} C# blocks extracted",
                outcome.vb_blocks, outcome.csharp_blocks
            );
        }
        if !outcome.rejected.is_empty() {
            info!(
                "Dropped {} pairs from {url}: {}",
                outcome.rejected.len(),
                outcome.rejection_summary()
            );
        }
        outcome
    }

    /// Fetch and process one URL. Fetch failures yield no examples.
    pub fn crawl_url(&self, url: &str) -> Vec<Example> {
        info!("Crawling: {url}");

        let html = match self.fetcher.fetch(url) {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to fetch {url}: {e:#}");
                return Vec::new();
            }
        };

        let examples = self.crawl_html(url, &html).examples;
        info!("Found {} translation examples from {url}", examples.len());
        examples
    }

    /// Crawl every URL in order, pausing between requests.
    pub fn crawl_urls(&self, urls: &[String]) -> Vec<Example> {
        let pb = ProgressBar::new(urls.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("valid template")
                .progress_chars("█▓░"),
        );

        let mut all = Vec::new();
        for (i, url) in urls.iter().enumerate() {
            pb.set_message(url.clone());
            all.extend(self.crawl_url(url));
            pb.inc(1);

            if i + 1 < urls.len() && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
        }
        pb.finish_and_clear();
        all
    }
}

/// One URL per line; blank lines and `#` comments are ignored.
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read URL list: {}", path.display()))?;
    Ok(parse_url_list(&data))
}

fn parse_url_list(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
