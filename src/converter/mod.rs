//! VB.NET → C# conversion backends and the policies around them.
//!
//! The browser-driven backend is fragile by nature, so the pieces that can be
//! reasoned about without a browser (input limits, the input retry policy,
//! output stability and plausibility) live here and are tested in isolation.
pub mod batch;
pub mod browser;
pub mod mock;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ConverterConfig;

/// Errors that can occur during a conversion.
#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("VB.NET code cannot be empty")]
    EmptyInput,

    #[error("code is too long ({len} chars > {max} chars)")]
    InputTooLarge { len: usize, max: usize },

    #[error("file {} is too large ({size} bytes > {max} bytes)", .path.display())]
    FileTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("could not find {0}")]
    ElementNotFound(String),

    #[error("input incomplete: only {actual} of {expected} characters entered")]
    InputIncomplete { actual: usize, expected: usize },

    #[error("convert action failed: {0}")]
    ConvertActionFailed(String),

    #[error("no stable output after {0:?}")]
    Timeout(Duration),

    #[error("suspicious output: {0}")]
    SuspiciousOutput(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Anything that turns VB.NET source into C#.
pub trait ConverterBackend: Send + Sync {
    fn convert(&self, vb_code: &str) -> Result<String, ConverterError>;

    /// Short label for logs.
    fn name(&self) -> &str;
}

/// Reject empty or oversized input, then hand it to `backend`.
pub fn convert_checked<B: ConverterBackend + ?Sized>(
    backend: &B,
    limits: &InputLimits,
    vb_code: &str,
) -> Result<String, ConverterError> {
    if vb_code.trim().is_empty() {
        return Err(ConverterError::EmptyInput);
    }
    limits.check_code(vb_code)?;
    debug!("Converting {} chars with {}", vb_code.chars().count(), backend.name());
    backend.convert(vb_code)
}

// ── Input limits ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct InputLimits {
    pub max_code_chars: usize,
    pub max_file_bytes: u64,
}

impl InputLimits {
    pub fn check_code(&self, code: &str) -> Result<(), ConverterError> {
        let len = code.chars().count();
        if len > self.max_code_chars {
            return Err(ConverterError::InputTooLarge {
                len,
                max: self.max_code_chars,
            });
        }
        Ok(())
    }

    /// Checked before the file is read.
    pub fn check_file(&self, path: &Path) -> Result<u64, ConverterError> {
        let size = std::fs::metadata(path)?.len();
        if size > self.max_file_bytes {
            return Err(ConverterError::FileTooLarge {
                path: path.to_path_buf(),
                size,
                max: self.max_file_bytes,
            });
        }
        Ok(size)
    }
}

impl Default for InputLimits {
    fn default() -> Self {
        Self::from(&ConverterConfig::default())
    }
}

impl From<&ConverterConfig> for InputLimits {
    fn from(cfg: &ConverterConfig) -> Self {
        Self {
            max_code_chars: cfg.max_code_chars,
            max_file_bytes: cfg.max_file_bytes,
        }
    }
}

// ── Input retry policy ───────────────────────────────────────────────

/// How source text is put into the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMethod {
    /// The editor's scripting API.
    ScriptApi,
    /// Simulated typing into the editor textarea.
    Keystrokes,
}

impl InputMethod {
    pub fn alternate(self) -> Self {
        match self {
            InputMethod::ScriptApi => InputMethod::Keystrokes,
            InputMethod::Keystrokes => InputMethod::ScriptApi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputVerdict {
    Accepted,
    Retry(InputMethod),
    GiveUp,
}

/// Primary method first, one retry with the alternate, then give up.
#[derive(Debug)]
pub struct InputRetry {
    method: InputMethod,
    retries_left: u32,
    slack: f64,
}

impl InputRetry {
    pub fn new(slack: f64) -> Self {
        Self {
            method: InputMethod::ScriptApi,
            retries_left: 1,
            slack,
        }
    }

    pub fn method(&self) -> InputMethod {
        self.method
    }

    /// Judge a read-back of `actual` chars against `expected` source chars.
    pub fn verify(&mut self, expected: usize, actual: usize) -> InputVerdict {
        if actual > 0 && actual as f64 >= expected as f64 * self.slack {
            return InputVerdict::Accepted;
        }
        if self.retries_left == 0 {
            return InputVerdict::GiveUp;
        }
        self.retries_left -= 1;
        self.method = self.method.alternate();
        InputVerdict::Retry(self.method)
    }
}

// ── Output polling ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Nothing in the output editor yet.
    Empty,
    /// Text present; `stable` consecutive unchanged reads so far.
    Pending { stable: u32 },
    Ready,
}

/// Tracks successive reads of the output editor until the text settles.
#[derive(Debug)]
pub struct StabilityTracker {
    required: u32,
    min_chars: usize,
    previous: Option<String>,
    stable: u32,
}

impl StabilityTracker {
    pub fn new(required: u32, min_chars: usize) -> Self {
        Self {
            required,
            min_chars,
            previous: None,
            stable: 0,
        }
    }

    pub fn from_config(cfg: &ConverterConfig) -> Self {
        Self::new(cfg.required_stable_polls, cfg.min_output_chars)
    }

    pub fn observe(&mut self, text: &str) -> PollState {
        let text = text.trim();
        if text.is_empty() {
            return PollState::Empty;
        }

        if self.previous.as_deref() == Some(text) {
            self.stable += 1;
        } else {
            self.stable = 0;
            self.previous = Some(text.to_string());
        }

        if self.stable >= self.required && looks_like_csharp_output(text, self.min_chars) {
            PollState::Ready
        } else {
            PollState::Pending {
                stable: self.stable,
            }
        }
    }

    /// Last non-empty text seen.
    pub fn latest(&self) -> Option<&str> {
        self.previous.as_deref()
    }
}

/// Superficial C# markers: long enough, braces, and `using`.
pub fn looks_like_csharp_output(text: &str, min_chars: usize) -> bool {
    text.chars().count() > min_chars
        && text.contains('{')
        && text.contains('}')
        && text.to_lowercase().contains("using")
}

/// Final plausibility check on converter output.
///
/// Mismatched braces and leftover VB.NET block terminators fail when
/// `strict`; everything else only warns.
pub fn check_output(text: &str, min_chars: usize, strict: bool) -> Result<(), ConverterError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ConverterError::SuspiciousOutput("output is empty".to_string()));
    }

    let lower = text.to_lowercase();
    if text.chars().count() < min_chars {
        warn!("Converted code seems too short ({} chars)", text.chars().count());
    }
    if !lower.contains("using") && !lower.contains("namespace") {
        warn!("Converted code lacks expected C# keywords");
    }

    let mut problems = Vec::new();
    let opens = text.matches('{').count();
    let closes = text.matches('}').count();
    if opens != closes {
        problems.push(format!("mismatched braces ({opens} '{{' vs {closes} '}}')"));
    }
    if lower.contains("end class") || lower.contains("end namespace") {
        problems.push("contains VB.NET block terminators".to_string());
    }

    if problems.is_empty() {
        return Ok(());
    }
    let summary = problems.join(", ");
    if strict {
        Err(ConverterError::SuspiciousOutput(summary))
    } else {
        warn!("Converted code may be incomplete: {summary}");
        Ok(())
    }
}
