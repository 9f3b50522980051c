//! Interactive terminal workflows over a dataset file.
//!
//! Both sessions talk to the operator through a [`Prompter`], which is
//! generic over its reader and writer so tests can script the input.
pub mod entry;
pub mod review;

use std::fmt::Display;
use std::io::{self, BufRead, Stdin, Stdout, Write};

pub const RULE_WIDE: usize = 80;
pub const RULE_NARROW: usize = 60;

/// Line-oriented prompt/read over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    pub fn rule(&mut self, width: usize) -> io::Result<()> {
        writeln!(self.output, "{}", "=".repeat(width))
    }

    /// Print `prompt` and read one line without its line ending.
    /// `None` once the input is exhausted.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        self.read_line()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Read lines until two consecutive blank lines (or end of input).
    /// `None` if the input ended before any line was read.
    pub fn read_block(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.say(format!("\n{prompt}"))?;
        self.say("(Press Enter twice to finish input)")?;
        self.output.flush()?;

        let mut lines: Vec<String> = Vec::new();
        loop {
            let Some(line) = self.read_line()? else {
                if lines.is_empty() {
                    return Ok(None);
                }
                break;
            };
            if line.is_empty() && lines.last().is_some_and(|l| l.is_empty()) {
                lines.pop();
                break;
            }
            lines.push(line);
        }
        Ok(Some(lines.join("\n")))
    }

    /// Ask until the answer is yes or no. End of input counts as no.
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(false);
            };
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("Please enter 'y' or 'n'")?,
            }
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl Prompter<io::StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

// ── Code display ─────────────────────────────────────────────────────

/// Preview of `code`: untouched when short or `full`, otherwise the first
/// `max_lines` lines, or a word-wrapped single line.
pub fn format_code(code: &str, max_chars: usize, max_lines: usize, full: bool) -> String {
    if full || code.chars().count() <= max_chars {
        return code.to_string();
    }

    let lines: Vec<&str> = code.split('\n').collect();
    if lines.len() > 1 {
        let mut out = lines[..lines.len().min(max_lines)].join("\n");
        if lines.len() > max_lines {
            out.push_str("\n...");
        }
        return out;
    }

    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in code.split_whitespace() {
        if current.chars().count() + word.chars().count() < max_chars {
            current.push_str(word);
            current.push(' ');
        } else {
            if !current.is_empty() {
                wrapped.push(current.trim_end().to_string());
            }
            current = format!("{word} ");
        }
    }
    if !current.is_empty() {
        wrapped.push(current.trim_end().to_string());
    }
    wrapped.join("\n")
}

/// First `n` lines, numbered, with a count of what was left out.
pub fn numbered_preview(code: &str, n: usize) -> String {
    let lines: Vec<&str> = code.split('\n').collect();
    let mut out: Vec<String> = lines
        .iter()
        .take(n)
        .enumerate()
        .map(|(i, line)| format!("{:2}: {line}", i + 1))
        .collect();
    if lines.len() > n {
        out.push(format!("    ... ({} more lines)", lines.len() - n));
    }
    out.join("\n")
}
