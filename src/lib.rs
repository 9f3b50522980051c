//! # vbcs-corpus: VB.NET / C# Paired-Code Dataset Builder
//!
//! Collects equivalent VB.NET and C# snippets into a JSON Lines dataset:
//! scraped from translation pages, converted through an online converter,
//! or typed in by hand. The dataset can then be analyzed, filtered and
//! reviewed record by record.
//!
//! ## Architecture
//!
//! - **[`record`]**: The `Example` record, provenance flags and the validity gate
//! - **[`dataset`]**: JSONL load/save/append, statistics and length/ratio filters
//! - **[`extract`]**: HTML code-block extraction, language heuristics and pairing
//! - **[`crawler`]**: Page fetching (HTTP or rendered) and the crawl loop
//! - **[`browser`]**: Headless Chromium session shared by fetcher and converter
//! - **[`converter`]**: Conversion backends, input limits and batch conversion
//! - **[`curation`]**: Interactive review and manual/converter entry sessions
//! - **[`config`]**: JSON configuration with defaults and validation

pub mod browser;
pub mod config;
pub mod converter;
pub mod crawler;
pub mod curation;
pub mod dataset;
pub mod extract;
pub mod record;
