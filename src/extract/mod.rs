//! HTML code-pair extraction.
//!
//! Three heuristic passes run over the same page and their outputs are
//! concatenated, VB.NET and C# separately:
//!
//! 1. [`table`]: side-by-side comparison tables
//! 2. [`patterns`]: regexes over the raw markup
//! 3. generic `<pre>` / `<code>` elements classified by keyword
//!
//! Nothing is de-duplicated; a block hit by two passes appears twice.
//! Pairing the two lists is the job of [`pairing`].
pub mod keywords;
pub mod pairing;
pub mod patterns;
pub mod table;

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

use keywords::{GENERIC_CSHARP, GENERIC_VB, contains_any};
use patterns::PatternSet;

static CODE_ELEMENTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("pre, code").unwrap());

/// Unpaired code blocks found on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeBlocks {
    pub vb: Vec<String>,
    pub csharp: Vec<String>,
}

impl CodeBlocks {
    pub fn is_empty(&self) -> bool {
        self.vb.is_empty() && self.csharp.is_empty()
    }

    pub fn extend(&mut self, other: CodeBlocks) {
        self.vb.extend(other.vb);
        self.csharp.extend(other.csharp);
    }
}

pub struct CodeExtractor {
    patterns: PatternSet,
}

impl CodeExtractor {
    pub fn new() -> Self {
        Self {
            patterns: PatternSet::new(),
        }
    }

    /// Run every pass over `html`.
    pub fn extract_code_blocks(&self, html: &str) -> CodeBlocks {
        let document = Html::parse_document(html);

        let mut blocks = table::extract_from_tables(&document);
        let table_pairs = blocks.vb.len();

        blocks.vb.extend(self.patterns.vb_matches(html));
        blocks.csharp.extend(self.patterns.csharp_matches(html));

        blocks.extend(extract_from_code_elements(&document));

        debug!(
            "Extracted {} VB.NET / {} C# blocks ({} from tables)",
            blocks.vb.len(),
            blocks.csharp.len(),
            table_pairs
        );
        blocks
    }
}

impl Default for CodeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify every `<pre>` / `<code>` element by its inner text.
pub fn extract_from_code_elements(document: &Html) -> CodeBlocks {
    let mut blocks = CodeBlocks::default();
    for element in document.select(&CODE_ELEMENTS) {
        let text: String = element.text().collect();
        if contains_any(&text, GENERIC_VB) {
            blocks.vb.push(text);
        } else if contains_any(&text, GENERIC_CSHARP) {
            blocks.csharp.push(text);
        }
    }
    blocks
}

/// Does the page mention any of `keywords` (case-insensitive)?
pub fn is_translation_page(html: &str, keywords: &[String]) -> bool {
    let lower = html.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_table_page() {
        let html = "<html><body><table>\
            <tr><th>VB.NET</th><th>C#</th></tr>\
            <tr><td>Dim x As Integer</td><td>int x;</td></tr>\
            </table></body></html>";
        let blocks = CodeExtractor::new().extract_code_blocks(html);
        assert_eq!(blocks.vb, vec!["Dim x As Integer"]);
        assert_eq!(blocks.csharp, vec!["int x;"]);
    }

    #[test]
    fn test_generic_code_elements() {
        let html = "<pre>Private Sub Run()\nEnd Sub</pre>\
            <code>public class Runner { }</code>\
            <code>x = y + 1</code>";
        let blocks = extract_from_code_elements(&Html::parse_document(html));
        assert_eq!(blocks.vb, vec!["Private Sub Run()\nEnd Sub"]);
        assert_eq!(blocks.csharp, vec!["public class Runner { }"]);
    }

    #[test]
    fn test_passes_are_concatenated_without_dedup() {
        // Tagged <pre><code> hits the regex pass twice and the tag pass twice.
        let html = r#"<pre><code class="vb">Dim a As Integer = 1</code></pre>"#;
        let blocks = CodeExtractor::new().extract_code_blocks(html);
        assert_eq!(blocks.vb.len(), 4);
        assert!(blocks.vb.iter().all(|b| b == "Dim a As Integer = 1"));
        assert!(blocks.csharp.is_empty());
    }

    #[test]
    fn test_translation_page_gate() {
        let keywords: Vec<String> = keywords::TRANSLATION_KEYWORDS
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert!(is_translation_page("<h1>VB.NET and C# side by side</h1>", &keywords));
        assert!(!is_translation_page("<h1>Cooking recipes</h1>", &keywords));
    }
}
