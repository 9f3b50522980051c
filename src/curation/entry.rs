//! Entry sessions: typed-in pairs, or VB.NET pasted and converted by a
//! backend. Accepted records are held in memory until the operator saves.
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Result;

use super::{Prompter, RULE_NARROW, numbered_preview};
use crate::converter::{ConverterBackend, InputLimits, convert_checked};
use crate::dataset;
use crate::extract::keywords::{CSHARP_ENTRY_HINTS, VB_ENTRY_HINTS, contains_any};
use crate::record::{Example, MIN_CODE_CHARS};

const PREVIEW_LINES: usize = 5;

/// Where the C# half of each record comes from.
pub enum EntryMode<'a> {
    /// The operator pastes both halves.
    Manual,
    /// The operator pastes VB.NET; the backend converts it.
    Convert(&'a dyn ConverterBackend, InputLimits),
}

impl EntryMode<'_> {
    fn add_key(&self) -> &'static str {
        match self {
            EntryMode::Manual => "a",
            EntryMode::Convert(..) => "c",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            EntryMode::Manual => "examples",
            EntryMode::Convert(..) => "conversions",
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct EntryOutcome {
    pub saved: usize,
    pub discarded: usize,
}

enum MenuChoice {
    Add,
    Save,
    Quit,
    Help,
}

/// Run the menu loop until the operator saves or quits.
pub fn run_session<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    mode: &EntryMode<'_>,
    output: &Path,
    append: bool,
) -> Result<EntryOutcome> {
    if append {
        let existing = dataset::load_if_exists(output)?;
        p.say(format!("Found {} existing examples", existing.len()))?;
    }

    p.say(match mode {
        EntryMode::Manual => "\nStarting manual curation session",
        EntryMode::Convert(..) => "\nStarting VB.NET to C# conversion session",
    })?;
    p.say(format!("Output file: {}", output.display()))?;
    p.say(format!(
        "Mode: {}",
        if append { "Append" } else { "Create new" }
    ))?;

    let mut pending: Vec<Example> = Vec::new();
    loop {
        p.say("")?;
        p.rule(RULE_NARROW)?;
        p.say("What would you like to do?")?;
        match mode {
            EntryMode::Manual => p.say("  [a] Add a new translation example")?,
            EntryMode::Convert(..) => p.say("  [c] Convert VB.NET to C#")?,
        }
        p.say(format!("  [s] Save current {} and exit", mode.noun()))?;
        p.say("  [q] Quit without saving")?;
        p.say("  [h] Show help")?;

        let Some(answer) = p.ask("\nEnter your choice: ")? else {
            if !pending.is_empty() {
                p.say(format!(
                    "Input closed; {} unsaved {} discarded",
                    pending.len(),
                    mode.noun()
                ))?;
            }
            return Ok(EntryOutcome {
                saved: 0,
                discarded: pending.len(),
            });
        };

        let choice = match answer.trim().to_lowercase().as_str() {
            k if k == mode.add_key() => MenuChoice::Add,
            "s" => MenuChoice::Save,
            "q" => MenuChoice::Quit,
            "h" => MenuChoice::Help,
            _ => {
                p.say("Invalid choice. Please try again.")?;
                continue;
            }
        };

        match choice {
            MenuChoice::Add => match add_single(p, mode)? {
                Some(example) => {
                    pending.push(example);
                    p.say(format!("Added #{}", pending.len()))?;
                }
                None => p.say("Not added")?,
            },
            MenuChoice::Save => {
                if pending.is_empty() {
                    p.say(format!("No {} to save", mode.noun()))?;
                } else {
                    dataset::persist(output, &pending, append)?;
                    p.say(format!(
                        "Saved {} {} to {}",
                        pending.len(),
                        mode.noun(),
                        output.display()
                    ))?;
                }
                return Ok(EntryOutcome {
                    saved: pending.len(),
                    discarded: 0,
                });
            }
            MenuChoice::Quit => {
                if !pending.is_empty() {
                    let prompt = format!(
                        "You have {} unsaved {}. Quit anyway? (y/n): ",
                        pending.len(),
                        mode.noun()
                    );
                    if !p.confirm(&prompt)? {
                        continue;
                    }
                }
                p.say("Goodbye!")?;
                return Ok(EntryOutcome {
                    saved: 0,
                    discarded: pending.len(),
                });
            }
            MenuChoice::Help => show_help(p, mode)?,
        }
    }
}

/// Collect one record. `None` when the operator abandons it or it fails a check.
fn add_single<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    mode: &EntryMode<'_>,
) -> Result<Option<Example>> {
    p.say("")?;
    p.rule(RULE_NARROW)?;
    p.say("Adding new example")?;
    p.rule(RULE_NARROW)?;

    let Some(title) = p.ask("\nTitle (optional, press Enter to skip): ")? else {
        return Ok(None);
    };
    let Some(description) = p.ask("Description (optional, press Enter to skip): ")? else {
        return Ok(None);
    };

    let Some(vb_code) = p.read_block("Please paste your VB.NET code:")? else {
        return Ok(None);
    };
    if !check_code(p, &vb_code, "VB.NET", VB_ENTRY_HINTS)? {
        return Ok(None);
    }

    let example = match mode {
        EntryMode::Manual => {
            let Some(csharp) = p.read_block("Please paste your C# code:")? else {
                return Ok(None);
            };
            if !check_code(p, &csharp, "C#", CSHARP_ENTRY_HINTS)? {
                return Ok(None);
            }
            Example::manual(&vb_code, &csharp)
        }
        EntryMode::Convert(backend, limits) => {
            p.say("\nConverting VB.NET to C#...")?;
            match convert_checked(*backend, limits, &vb_code) {
                Ok(csharp) => {
                    p.say("Conversion successful!")?;
                    Example::converted(&vb_code, &csharp)
                }
                Err(e) => {
                    p.say(format!("Conversion failed: {e}"))?;
                    return Ok(None);
                }
            }
        }
    }
    .with_title(title.trim())
    .with_description(description.trim());

    let example = match example.accept() {
        Ok(example) => example,
        Err(reason) => {
            p.say(format!("Invalid example: {reason}"))?;
            return Ok(None);
        }
    };

    show_preview(p, &example)?;
    if p.confirm("\nSave this example? (y/n): ")? {
        Ok(Some(example))
    } else {
        Ok(None)
    }
}

/// Too-short code is refused; code without typical keywords only warns.
fn check_code<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    code: &str,
    language: &str,
    hints: &[&str],
) -> Result<bool> {
    if code.trim().chars().count() <= MIN_CODE_CHARS {
        p.say(format!(
            "{language} code is too short. Please provide more substantial code."
        ))?;
        return Ok(false);
    }
    if !contains_any(code, hints) {
        p.say(format!(
            "Warning: This doesn't look like typical {language} code."
        ))?;
    }
    Ok(true)
}

fn show_preview<R: BufRead, W: Write>(p: &mut Prompter<R, W>, example: &Example) -> Result<()> {
    p.say("")?;
    p.rule(RULE_NARROW)?;
    p.say("Preview:")?;
    p.rule(RULE_NARROW)?;
    if !example.title().is_empty() {
        p.say(format!("Title: {}", example.title()))?;
    }
    if !example.description().is_empty() {
        p.say(format!("Description: {}", example.description()))?;
    }
    for (label, code) in [("VB.NET", example.vb_code()), ("C#", example.csharp_code())] {
        p.say(format!(
            "\n{label} Code ({} chars, {} words):",
            code.chars().count(),
            code.split_whitespace().count()
        ))?;
        p.say("-".repeat(40))?;
        p.say(numbered_preview(code, PREVIEW_LINES))?;
    }
    Ok(())
}

fn show_help<R: BufRead, W: Write>(p: &mut Prompter<R, W>, mode: &EntryMode<'_>) -> Result<()> {
    p.say("\nHelp:")?;
    match mode {
        EntryMode::Manual => {
            p.say("  a - Add: Add a new VB.NET to C# translation example")?;
        }
        EntryMode::Convert(backend, limits) => {
            p.say(format!(
                "  c - Convert: Convert VB.NET code to C# using the {} converter",
                backend.name()
            ))?;
            p.say(format!(
                "      Limits: {} characters, {} bytes per file",
                limits.max_code_chars, limits.max_file_bytes
            ))?;
        }
    }
    p.say(format!("  s - Save: Save all {} to the JSONL file and exit", mode.noun()))?;
    p.say("  q - Quit: Exit without saving (asks first if anything is unsaved)")?;
    p.say("  h - Help: Show this help message")?;
    p.say("\nTips:")?;
    p.say("  - Provide complete code snippets (functions, classes, etc.)")?;
    p.say("  - Make sure the VB.NET and C# code are actually equivalent")?;
    p.say("  - Code is stripped of leading/trailing whitespace")?;
    Ok(())
}
