//! vbcs CLI
//!
//! Build and curate a VB.NET / C# paired-code dataset in JSON Lines format.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vbcs_corpus::browser::BrowserOptions;
use vbcs_corpus::config::{Config, DEFAULT_CONFIG_PATH};
use vbcs_corpus::converter::batch::{self, BatchConverter, BatchSummary};
use vbcs_corpus::converter::browser::BrowserConverter;
use vbcs_corpus::converter::mock::MockConverter;
use vbcs_corpus::converter::{ConverterBackend, InputLimits};
use vbcs_corpus::crawler::{
    ClientConfig, Crawler, HttpFetcher, PageFetcher, RenderedFetcher, load_urls_from_file,
};
use vbcs_corpus::curation::Prompter;
use vbcs_corpus::curation::entry::{self, EntryMode};
use vbcs_corpus::curation::review::{self, ManualFilter, ReviewOptions};
use vbcs_corpus::dataset::{self, filter::FilterConfig, stats};

#[derive(Parser)]
#[command(name = "vbcs")]
#[command(version, about = "Build and curate a VB.NET / C# paired-code dataset", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl web pages for VB.NET / C# translation pairs
    #[command(group(ArgGroup::new("targets").required(true).multiple(true).args(["urls", "url_file"])))]
    Crawl {
        /// URLs to crawl
        #[arg(short, long, num_args = 1..)]
        urls: Vec<String>,

        /// File containing URLs (one per line)
        #[arg(short = 'f', long)]
        url_file: Option<PathBuf>,

        /// Output JSONL file
        #[arg(short, long, default_value = "translations.jsonl")]
        output: PathBuf,

        /// Append to the existing file instead of overwriting
        #[arg(short, long)]
        append: bool,

        /// Fetch pages through a headless browser (script-heavy sites)
        #[arg(long)]
        render: bool,

        /// Pause between requests in milliseconds (defaults to the config value)
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Convert VB.NET to C# with the online converter
    ///
    /// Without a source flag an interactive session is started.
    #[command(group(ArgGroup::new("source").args(["file", "code", "directory", "file_list"])))]
    Convert {
        /// Convert VB.NET code from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Convert a VB.NET code string directly
        #[arg(short, long)]
        code: Option<String>,

        /// Convert all VB files in a directory
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// Convert VB files listed in a text file (one path per line)
        #[arg(short = 'l', long)]
        file_list: Option<PathBuf>,

        /// Only look at the top level of --directory
        #[arg(long)]
        no_recursive: bool,

        /// Output JSONL file
        #[arg(short, long, default_value = "conversions.jsonl")]
        output: PathBuf,

        /// Append to the existing file instead of overwriting
        #[arg(short, long)]
        append: bool,

        /// Delay between conversions in seconds
        #[arg(long, default_value = "1.0")]
        delay: f64,

        /// Use the offline mock converter instead of a browser
        #[arg(long)]
        mock: bool,
    },

    /// Print dataset statistics and optionally filter by length / ratio
    Analyze {
        /// Input JSONL file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file for the filtered records
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum code length (chars, both sides)
        #[arg(long, default_value = "0")]
        min_length: usize,

        /// Maximum code length (chars, both sides)
        #[arg(long)]
        max_length: Option<usize>,

        /// Minimum VB/C# length ratio
        #[arg(long, default_value = "0.0")]
        min_ratio: f64,

        /// Maximum VB/C# length ratio
        #[arg(long)]
        max_ratio: Option<f64>,

        /// Only show statistics, no filtering
        #[arg(long)]
        stats_only: bool,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Review records one by one: keep, delete or skip
    Review {
        /// Input JSONL file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (default: <input>_cleaned.jsonl)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Start from this record (0-indexed, after filtering)
        #[arg(short, long, default_value = "0")]
        start_from: usize,

        /// Skip manually curated records
        #[arg(long, conflicts_with = "manual_only")]
        exclude_manual: bool,

        /// Only review manually curated records
        #[arg(long)]
        manual_only: bool,
    },

    /// Type in translation pairs by hand
    Curate {
        /// Output JSONL file
        #[arg(short, long, default_value = "manual_translations.jsonl")]
        output: PathBuf,

        /// Append to the existing file instead of overwriting
        #[arg(short, long)]
        append: bool,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        #[arg(value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::InitConfig { path } = &cli.command {
        Config::default().save(path)?;
        println!("Wrote default configuration to {path}");
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref().unwrap_or(""))?;
    config.validate().context("invalid configuration")?;

    match cli.command {
        Commands::Crawl {
            urls,
            url_file,
            output,
            append,
            render,
            delay_ms,
        } => run_crawl(&config, urls, url_file, &output, append, render, delay_ms),

        Commands::Convert {
            file,
            code,
            directory,
            file_list,
            no_recursive,
            output,
            append,
            delay,
            mock,
        } => {
            let delay = Duration::try_from_secs_f64(delay)
                .context("--delay must be a non-negative number of seconds")?;
            let backend: Box<dyn ConverterBackend> = if mock {
                Box::new(MockConverter::new())
            } else {
                Box::new(BrowserConverter::new(config.converter.clone()))
            };
            let limits = InputLimits::from(&config.converter);

            let files = if let Some(file) = file {
                require_file(&file)?;
                Some(vec![file])
            } else if let Some(dir) = directory {
                Some(batch::discover_vb_files(&dir, !no_recursive)?)
            } else if let Some(list) = file_list {
                require_file(&list)?;
                Some(batch::load_file_list(&list)?)
            } else {
                None
            };

            let converter = BatchConverter::new(backend.as_ref(), limits, delay);
            if let Some(files) = files {
                if files.is_empty() {
                    println!("No VB files to convert");
                    return Ok(());
                }
                let summary = converter.run(&files);
                finish_batch(&summary, files.len(), &output, append)
            } else if let Some(code) = code {
                let mut summary = BatchSummary::default();
                match converter.convert_code(&code, "Command line input", "Converted from command line")
                {
                    Ok(example) => summary.examples.push(example),
                    Err(e) => summary.failed.push((PathBuf::from("<code>"), format!("{e:#}"))),
                }
                finish_batch(&summary, 1, &output, append)
            } else {
                let mode = EntryMode::Convert(backend.as_ref(), limits);
                run_entry(&mode, &output, append)
            }
        }

        Commands::Analyze {
            input,
            output,
            min_length,
            max_length,
            min_ratio,
            max_ratio,
            stats_only,
            json,
        } => {
            let filter = FilterConfig {
                min_length,
                max_length,
                min_ratio,
                max_ratio,
            };
            run_analyze(&input, output.as_deref(), &filter, stats_only, json)
        }

        Commands::Review {
            input,
            output,
            start_from,
            exclude_manual,
            manual_only,
        } => {
            let mut options = ReviewOptions::new(&config.curation);
            options.start_from = start_from;
            options.manual = if exclude_manual {
                ManualFilter::Exclude
            } else if manual_only {
                ManualFilter::Only
            } else {
                ManualFilter::Include
            };
            let output = output.unwrap_or_else(|| cleaned_path(&input));
            run_review(&input, &output, &options)
        }

        Commands::Curate { output, append } => run_entry(&EntryMode::Manual, &output, append),

        Commands::InitConfig { .. } => Ok(()),
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` for this crate with `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "vbcs=debug,vbcs_corpus=debug,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn require_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("Input file not found: {}", path.display());
    }
    Ok(())
}

/// `data/set.jsonl` → `data/set_cleaned.jsonl`
fn cleaned_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "dataset".to_string());
    input.with_file_name(format!("{stem}_cleaned.jsonl"))
}

fn existing_count(output: &Path, append: bool) -> Result<usize> {
    if !append {
        return Ok(0);
    }
    let existing = dataset::load_if_exists(output)?.len();
    println!("Found {existing} existing examples in {}", output.display());
    Ok(existing)
}

// ── crawl ────────────────────────────────────────────────────────────

fn run_crawl(
    config: &Config,
    mut urls: Vec<String>,
    url_file: Option<PathBuf>,
    output: &Path,
    append: bool,
    render: bool,
    delay_ms: Option<u64>,
) -> Result<()> {
    if let Some(list) = url_file {
        require_file(&list)?;
        urls.extend(load_urls_from_file(&list)?);
    }
    if urls.is_empty() {
        bail!("No URLs to crawl");
    }

    let existing = existing_count(output, append)?;

    let fetcher: Box<dyn PageFetcher> = if render {
        let options = BrowserOptions {
            headless: config.converter.headless,
            user_agent: Some(config.crawl.user_agent.clone()),
            extra_args: Vec::new(),
        };
        Box::new(RenderedFetcher::new(
            options,
            Duration::from_millis(config.converter.settle_ms),
        ))
    } else {
        Box::new(HttpFetcher::new(&ClientConfig::from(&config.crawl))?)
    };

    let mut crawler = Crawler::new(fetcher.as_ref(), &config.crawl);
    if let Some(ms) = delay_ms {
        crawler = crawler.with_delay(Duration::from_millis(ms));
    }

    info!("Crawling {} URLs", urls.len());
    let examples = crawler.crawl_urls(&urls);
    if examples.is_empty() {
        println!("No translation examples found");
        return Ok(());
    }

    dataset::persist(output, &examples, append)?;
    println!(
        "Found {} translation examples, saved to {}",
        examples.len(),
        output.display()
    );
    if append {
        println!("Total examples in file: {}", existing + examples.len());
    }
    Ok(())
}

// ── convert ──────────────────────────────────────────────────────────

fn finish_batch(summary: &BatchSummary, attempted: usize, output: &Path, append: bool) -> Result<()> {
    println!("\nConverted {} of {attempted}", summary.succeeded());
    if !summary.failed.is_empty() {
        println!("Failed ({}):", summary.failed.len());
        for (path, reason) in &summary.failed {
            println!("  {}: {reason}", path.display());
        }
    }
    if summary.examples.is_empty() {
        println!("Nothing to save");
        return Ok(());
    }

    let existing = existing_count(output, append)?;
    dataset::persist(output, &summary.examples, append)?;
    println!(
        "Saved {} conversions to {}",
        summary.examples.len(),
        output.display()
    );
    if append {
        println!("Total examples in file: {}", existing + summary.examples.len());
    }
    Ok(())
}

// ── interactive sessions ─────────────────────────────────────────────

fn run_entry(mode: &EntryMode<'_>, output: &Path, append: bool) -> Result<()> {
    let mut prompter = Prompter::stdio();
    let outcome = entry::run_session(&mut prompter, mode, output, append)?;
    if outcome.saved > 0 && append {
        let total = dataset::load_if_exists(output)?.len();
        println!("Total examples in file: {total}");
    }
    Ok(())
}

fn run_review(input: &Path, output: &Path, options: &ReviewOptions) -> Result<()> {
    require_file(input)?;
    let report = dataset::load(input)?;
    println!("Loaded {} examples from {}", report.len(), input.display());
    if !report.malformed.is_empty() {
        println!("Skipped {} malformed lines", report.malformed.len());
    }

    let entries = review::select_for_review(report.entries, options);
    if entries.is_empty() {
        println!("No examples to review");
        return Ok(());
    }

    let mut prompter = Prompter::stdio();
    let outcome = review::review(&mut prompter, &entries, options)?;

    dataset::save(output, &outcome.kept)?;
    println!("\nReview complete!");
    println!("  Kept: {}", outcome.kept.len() - outcome.skipped);
    println!("  Deleted: {}", outcome.deleted);
    println!("  Skipped: {}", outcome.skipped);
    if outcome.quit {
        let reviewed = outcome.kept.len() + outcome.deleted;
        println!("  Not reviewed: {}", entries.len() - reviewed);
    }
    println!("Saved {} examples to {}", outcome.kept.len(), output.display());
    Ok(())
}

// ── analyze ──────────────────────────────────────────────────────────

fn run_analyze(
    input: &Path,
    output: Option<&Path>,
    filter: &FilterConfig,
    stats_only: bool,
    json: bool,
) -> Result<()> {
    require_file(input)?;
    let examples = dataset::load(input)?.into_examples();
    let summary = stats::analyze(&examples);

    if json {
        let text = serde_json::to_string_pretty(&summary).context("failed to serialize stats")?;
        println!("{text}");
    } else {
        print!("{summary}");
    }

    if stats_only || (!filter.is_active() && output.is_none()) {
        return Ok(());
    }

    let filtered = dataset::filter::filter_examples(&examples, filter);
    let after = stats::analyze(&filtered);
    println!("\n=== Filtering Results ===");
    println!("Original examples: {}", examples.len());
    println!("Filtered examples: {}", filtered.len());
    println!("Average VB.NET code length: {:.1} characters", after.avg_vb_length);
    println!("Average C# code length: {:.1} characters", after.avg_csharp_length);

    if let Some(output) = output {
        dataset::save(output, &filtered)?;
        println!("Saved filtered examples to {}", output.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_review_flags_conflict() {
        let err = Cli::try_parse_from(["vbcs", "review", "in.jsonl", "--exclude-manual", "--manual-only"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_crawl_requires_a_target() {
        assert!(Cli::try_parse_from(["vbcs", "crawl"]).is_err());
        assert!(Cli::try_parse_from(["vbcs", "crawl", "--urls", "https://a.example/"]).is_ok());
    }

    #[test]
    fn test_convert_sources_are_exclusive() {
        assert!(Cli::try_parse_from(["vbcs", "convert", "--file", "a.vb", "--code", "Dim x"]).is_err());
        assert!(Cli::try_parse_from(["vbcs", "convert", "--mock"]).is_ok());
    }

    #[test]
    fn test_cleaned_path() {
        assert_eq!(
            cleaned_path(Path::new("data/set.jsonl")),
            PathBuf::from("data/set_cleaned.jsonl")
        );
    }
}
