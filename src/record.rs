//! The dataset record: one VB.NET / C# pair plus provenance.
//!
//! Records are immutable after construction. Validity is computed on demand
//! from the code fields, never stored.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Source sentinel for records typed in by hand.
pub const MANUAL_SOURCE: &str = "manual_curation";

/// Source sentinel for records produced by the external converter page.
pub const CONVERTER_SOURCE: &str = "icsharpcode_converter";

/// Both code fields must be strictly longer than this (in chars, trimmed).
pub const MIN_CODE_CHARS: usize = 10;

// ── Record ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    vb_code: String,
    csharp_code: String,

    #[serde(default, alias = "source")]
    source_url: String,

    #[serde(default)]
    title: String,

    #[serde(default)]
    description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    manually_curated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    converted_automatically: Option<bool>,

    /// Fields written by other tools, carried through untouched.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// How a record entered the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Crawled,
    Manual,
    Converted,
}

/// Why a candidate record was refused by [`Example::accept`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    VbTooShort,
    CsharpTooShort,
    Identical,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VbTooShort => write!(f, "VB.NET code is {MIN_CODE_CHARS} chars or shorter"),
            Self::CsharpTooShort => write!(f, "C# code is {MIN_CODE_CHARS} chars or shorter"),
            Self::Identical => write!(f, "VB.NET and C# code are identical"),
        }
    }
}

impl Example {
    /// Build a record, trimming both code fields.
    #[must_use]
    pub fn new(vb_code: &str, csharp_code: &str, source_url: &str) -> Self {
        Self {
            vb_code: vb_code.trim().to_string(),
            csharp_code: csharp_code.trim().to_string(),
            source_url: source_url.to_string(),
            title: String::new(),
            description: String::new(),
            manually_curated: None,
            converted_automatically: None,
            extra: Map::new(),
        }
    }

    /// A pair extracted from a crawled page.
    #[must_use]
    pub fn crawled(vb_code: &str, csharp_code: &str, url: &str) -> Self {
        Self::new(vb_code, csharp_code, url)
    }

    /// A pair typed in during a manual-entry session.
    #[must_use]
    pub fn manual(vb_code: &str, csharp_code: &str) -> Self {
        Self {
            manually_curated: Some(true),
            ..Self::new(vb_code, csharp_code, MANUAL_SOURCE)
        }
    }

    /// A pair whose C# side came from the converter backend.
    #[must_use]
    pub fn converted(vb_code: &str, csharp_code: &str) -> Self {
        Self {
            converted_automatically: Some(true),
            ..Self::new(vb_code, csharp_code, CONVERTER_SOURCE)
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.trim().to_string();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.trim().to_string();
        self
    }

    /// Parse one JSONL line, dropping `_`-prefixed bookkeeping keys.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        let mut example: Self = serde_json::from_str(line)?;
        example.extra.retain(|key, _| !key.starts_with('_'));
        Ok(example)
    }

    /// Serialize as a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn vb_code(&self) -> &str {
        &self.vb_code
    }

    pub fn csharp_code(&self) -> &str {
        &self.csharp_code
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn is_manually_curated(&self) -> bool {
        self.manually_curated.unwrap_or(false)
    }

    pub fn is_converted_automatically(&self) -> bool {
        self.converted_automatically.unwrap_or(false)
    }

    pub fn provenance(&self) -> Provenance {
        if self.is_manually_curated() {
            Provenance::Manual
        } else if self.is_converted_automatically() {
            Provenance::Converted
        } else {
            Provenance::Crawled
        }
    }

    // ── Validity ─────────────────────────────────────────────────────

    /// First invariant this record violates, if any.
    pub fn rejection(&self) -> Option<Rejection> {
        let vb = self.vb_code.trim();
        let cs = self.csharp_code.trim();
        if vb.chars().count() <= MIN_CODE_CHARS {
            Some(Rejection::VbTooShort)
        } else if cs.chars().count() <= MIN_CODE_CHARS {
            Some(Rejection::CsharpTooShort)
        } else if vb == cs {
            Some(Rejection::Identical)
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.rejection().is_none()
    }

    /// The gate every pipeline passes through before persisting.
    pub fn accept(self) -> Result<Self, Rejection> {
        match self.rejection() {
            Some(reason) => Err(reason),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VB: &str = "Dim total As Integer = 0";
    const CS: &str = "int total = 0;  // start";

    #[test]
    fn test_new_trims_code() {
        let ex = Example::new("  Dim x As Integer\n\n", "\n int x = 0; \t", "https://a.example");
        assert_eq!(ex.vb_code(), "Dim x As Integer");
        assert_eq!(ex.csharp_code(), "int x = 0;");
        assert_eq!(ex.provenance(), Provenance::Crawled);
    }

    #[test]
    fn test_validity_length_boundary() {
        // exactly 10 chars is too short, 11 is enough
        let ten = "abcdefghij";
        let eleven = "abcdefghijk";
        assert!(!Example::new(ten, CS, "").is_valid());
        assert!(!Example::new(VB, ten, "").is_valid());
        assert!(Example::new(eleven, CS, "").is_valid());
        assert_eq!(
            Example::new(VB, ten, "").rejection(),
            Some(Rejection::CsharpTooShort)
        );
    }

    #[test]
    fn test_validity_identical() {
        let ex = Example::new(VB, VB, "");
        assert_eq!(ex.rejection(), Some(Rejection::Identical));
        assert!(ex.accept().is_err());
    }

    #[test]
    fn test_validity_counts_chars_not_bytes() {
        // 7 chars, 21 bytes
        let ex = Example::new("日本語のコード", CS, "");
        assert!(!ex.is_valid());
    }

    #[test]
    fn test_manual_and_converted_flags() {
        let manual = Example::manual(VB, CS);
        assert_eq!(manual.source_url(), MANUAL_SOURCE);
        assert!(manual.is_manually_curated());
        assert_eq!(manual.provenance(), Provenance::Manual);

        let converted = Example::converted(VB, CS).with_title(" File: a.vb ");
        assert_eq!(converted.source_url(), CONVERTER_SOURCE);
        assert!(converted.is_converted_automatically());
        assert!(!converted.is_manually_curated());
        assert_eq!(converted.title(), "File: a.vb");
    }

    #[test]
    fn test_crawled_json_omits_flags() {
        let line = Example::crawled(VB, CS, "https://a.example/page")
            .to_json_line()
            .unwrap();
        assert!(!line.contains("manually_curated"));
        assert!(!line.contains("converted_automatically"));
        assert!(line.contains("\"source_url\":\"https://a.example/page\""));
    }

    #[test]
    fn test_from_json_line_accepts_source_alias() {
        let line = r#"{"vb_code": "Dim a As String", "csharp_code": "string a;", "source": "manual_curation"}"#;
        let ex = Example::from_json_line(line).unwrap();
        assert_eq!(ex.source_url(), MANUAL_SOURCE);
        assert_eq!(ex.title(), "");
    }

    #[test]
    fn test_from_json_line_drops_bookkeeping_keeps_extra() {
        let line = r#"{"vb_code": "Dim a", "csharp_code": "int a;", "source_url": "x", "_line_number": 4, "reviewer": "kim"}"#;
        let ex = Example::from_json_line(line).unwrap();
        assert!(ex.extra().get("_line_number").is_none());
        assert_eq!(ex.extra()["reviewer"], "kim");

        let out = ex.to_json_line().unwrap();
        assert!(out.contains("\"reviewer\":\"kim\""));
        assert!(!out.contains("_line_number"));
    }
}
