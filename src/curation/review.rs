//! Keep / delete / skip review over a loaded dataset.
use std::io::{self, BufRead, Write};

use super::{Prompter, RULE_WIDE, format_code};
use crate::config::CurationConfig;
use crate::dataset::LoadedExample;
use crate::record::Example;

/// Codes shorter than this get a "too short" hint.
const SHORT_HINT_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Delete,
    Skip,
    ToggleFull,
    Quit,
    Help,
}

impl Decision {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "k" => Some(Self::Keep),
            "d" => Some(Self::Delete),
            "s" => Some(Self::Skip),
            "f" => Some(Self::ToggleFull),
            "q" => Some(Self::Quit),
            "h" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Which records take part according to their manual-curation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManualFilter {
    #[default]
    Include,
    Exclude,
    Only,
}

#[derive(Debug, Clone)]
pub struct ReviewOptions {
    /// 0-based index into the filtered records.
    pub start_from: usize,
    pub manual: ManualFilter,
    pub preview_chars: usize,
    pub preview_lines: usize,
}

impl ReviewOptions {
    pub fn new(config: &CurationConfig) -> Self {
        Self {
            start_from: 0,
            manual: ManualFilter::Include,
            preview_chars: config.preview_chars,
            preview_lines: config.preview_lines,
        }
    }
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self::new(&CurationConfig::default())
    }
}

#[derive(Debug, Default)]
pub struct ReviewOutcome {
    pub kept: Vec<Example>,
    pub deleted: usize,
    pub skipped: usize,
    pub quit: bool,
}

/// Apply the manual-curation filter, then drop everything before `start_from`.
pub fn select_for_review(entries: Vec<LoadedExample>, options: &ReviewOptions) -> Vec<LoadedExample> {
    entries
        .into_iter()
        .filter(|e| match options.manual {
            ManualFilter::Include => true,
            ManualFilter::Exclude => !e.example.is_manually_curated(),
            ManualFilter::Only => e.example.is_manually_curated(),
        })
        .skip(options.start_from)
        .collect()
}

/// Things a reviewer may want to look at twice.
pub fn issue_hints(example: &Example) -> Vec<&'static str> {
    let vb = example.vb_code();
    let cs = example.csharp_code();
    let mut issues = Vec::new();
    if vb.chars().count() < SHORT_HINT_CHARS {
        issues.push("VB.NET code too short");
    }
    if cs.chars().count() < SHORT_HINT_CHARS {
        issues.push("C# code too short");
    }
    if vb == cs {
        issues.push("VB.NET and C# code are identical");
    }
    if vb.split('\n').count() < 2 && cs.split('\n').count() < 2 {
        issues.push("Both codes are single lines");
    }
    issues
}

/// Walk `entries` one by one. Quitting (or end of input) keeps the
/// decisions made so far and leaves the rest out.
pub fn review<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    entries: &[LoadedExample],
    options: &ReviewOptions,
) -> io::Result<ReviewOutcome> {
    let mut outcome = ReviewOutcome::default();
    let total = entries.len();

    for (i, entry) in entries.iter().enumerate() {
        let mut show_full = false;
        loop {
            display(prompter, entry, i, total, show_full, options)?;
            let decision = loop {
                show_menu(prompter)?;
                let Some(answer) = prompter.ask("\nEnter your choice: ")? else {
                    break Decision::Quit;
                };
                match Decision::parse(&answer) {
                    Some(decision) => break decision,
                    None => prompter.say("Invalid choice. Please try again.")?,
                }
            };

            match decision {
                Decision::Help => {
                    show_help(prompter)?;
                }
                Decision::ToggleFull => {
                    show_full = !show_full;
                    prompter.say(if show_full {
                        "\nShowing full text"
                    } else {
                        "\nShowing preview"
                    })?;
                }
                Decision::Keep => {
                    outcome.kept.push(entry.example.clone());
                    prompter.say("Kept")?;
                    break;
                }
                Decision::Delete => {
                    outcome.deleted += 1;
                    prompter.say("Deleted")?;
                    break;
                }
                Decision::Skip => {
                    outcome.kept.push(entry.example.clone());
                    outcome.skipped += 1;
                    prompter.say("Skipped")?;
                    break;
                }
                Decision::Quit => {
                    outcome.quit = true;
                    prompter.say("\nSaving progress...")?;
                    return Ok(outcome);
                }
            }
        }
    }
    Ok(outcome)
}

fn display<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    entry: &LoadedExample,
    index: usize,
    total: usize,
    show_full: bool,
    options: &ReviewOptions,
) -> io::Result<()> {
    let ex = &entry.example;
    p.say("")?;
    p.rule(RULE_WIDE)?;
    p.say(format!(
        "Example {} of {total} (Line {})",
        index + 1,
        entry.line_number
    ))?;
    if show_full {
        p.say("FULL TEXT MODE")?;
    }
    if ex.is_manually_curated() {
        p.say("MANUALLY CURATED")?;
    }
    p.rule(RULE_WIDE)?;

    let source = if ex.source_url().is_empty() { "N/A" } else { ex.source_url() };
    p.say(format!("\nSource: {source}"))?;
    if !ex.title().is_empty() {
        p.say(format!("Title: {}", ex.title()))?;
    }
    if !ex.description().is_empty() {
        p.say(format!("Description: {}", ex.description()))?;
    }

    for (label, code) in [("VB.NET", ex.vb_code()), ("C#", ex.csharp_code())] {
        p.say(format!("\n{label} Code ({} chars):", code.chars().count()))?;
        p.say("-".repeat(40))?;
        p.say(format_code(
            code,
            options.preview_chars,
            options.preview_lines,
            show_full,
        ))?;
    }

    p.say(format!(
        "\nStats: VB.NET: {} lines, C#: {} lines",
        ex.vb_code().split('\n').count(),
        ex.csharp_code().split('\n').count()
    ))?;

    let issues = issue_hints(ex);
    if !issues.is_empty() {
        p.say(format!("\nPotential issues: {}", issues.join(", ")))?;
    }
    Ok(())
}

fn show_menu<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> io::Result<()> {
    p.say("\nWhat would you like to do?")?;
    p.say("  [k] Keep this example")?;
    p.say("  [d] Delete this example")?;
    p.say("  [s] Skip for now (keep but mark as reviewed)")?;
    p.say("  [f] View full text (toggle)")?;
    p.say("  [q] Quit and save progress")?;
    p.say("  [h] Show help")
}

fn show_help<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> io::Result<()> {
    p.say("\nHelp:")?;
    p.say("  k - Keep: This example is good quality, keep it in the dataset")?;
    p.say("  d - Delete: This example is poor quality, remove it from the dataset")?;
    p.say("  s - Skip: Keep it without judging it")?;
    p.say("  f - Full text: Toggle between preview and full text view")?;
    p.say("  q - Quit: Save the decisions so far and exit")?;
    p.say("  h - Help: Show this help message")?;
    p.say("\nTips:")?;
    p.say("  - Look for meaningful translations, not just syntax differences")?;
    p.say("  - Avoid examples where VB.NET and C# code are nearly identical")?;
    p.say("  - Prefer examples with multiple lines and meaningful logic")?;
    p.say("  - Use 'f' to see the full code when the preview is too short")
}
