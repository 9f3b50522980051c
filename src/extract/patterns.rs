//! Regex pass over the raw markup: fenced blocks, language-tagged
//! `<pre>` / `<code>` elements and plain "VB.NET:" / "C#:" labels.
use regex::Regex;

/// All patterns run case-insensitive with `.` matching newlines. Capture
/// group 1 is the code.
const VB_PATTERNS: &[&str] = &[
    r"```vb(?:\.net)?\s*\n(.*?)\n```",
    r#"<pre><code class="vb(?:\.net)?">(.*?)</code></pre>"#,
    r#"<code class="vb(?:\.net)?">(.*?)</code>"#,
    r#"<pre class="vb(?:\.net)?">(.*?)</pre>"#,
    r"VB\.NET:\s*\n(.*?)(?:\nC#:|\n?\z)",
    r"Visual Basic:\s*\n(.*?)(?:\nC#:|\n?\z)",
];

const CSHARP_PATTERNS: &[&str] = &[
    r"```csharp\s*\n(.*?)\n```",
    r"```cs\s*\n(.*?)\n```",
    r#"<pre><code class="csharp">(.*?)</code></pre>"#,
    r#"<code class="csharp">(.*?)</code>"#,
    r#"<pre class="csharp">(.*?)</pre>"#,
    r"C#:\s*\n(.*?)(?:\nVB\.NET:|\n?\z)",
];

pub struct PatternSet {
    vb: Vec<Regex>,
    csharp: Vec<Regex>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self {
            vb: compile(VB_PATTERNS),
            csharp: compile(CSHARP_PATTERNS),
        }
    }

    /// VB.NET captures, in pattern order then match order.
    pub fn vb_matches(&self, html: &str) -> Vec<String> {
        collect(&self.vb, html)
    }

    /// C# captures, in pattern order then match order.
    pub fn csharp_matches(&self, html: &str) -> Vec<String> {
        collect(&self.csharp, html)
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?is){p}")).unwrap())
        .collect()
}

fn collect(patterns: &[Regex], html: &str) -> Vec<String> {
    let mut out = Vec::new();
    for re in patterns {
        for caps in re.captures_iter(html) {
            if let Some(m) = caps.get(1) {
                out.push(m.as_str().to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_blocks() {
        let text = "intro\n```vb\nDim a As Integer\n```\nthen\n```csharp\nint a;\n```\n```cs\nvar b = 2;\n```";
        let set = PatternSet::new();
        assert_eq!(set.vb_matches(text), vec!["Dim a As Integer"]);
        assert_eq!(set.csharp_matches(text), vec!["int a;", "var b = 2;"]);
    }

    #[test]
    fn test_fenced_vb_net_label() {
        let set = PatternSet::new();
        let text = "```VB.NET\nSub Go()\nEnd Sub\n```";
        assert_eq!(set.vb_matches(text), vec!["Sub Go()\nEnd Sub"]);
    }

    #[test]
    fn test_tagged_elements() {
        let html = r#"<pre><code class="vb.net">Dim s = ""</code></pre><pre class="csharp">var s = "";</pre>"#;
        let set = PatternSet::new();
        // <pre><code class> and bare <code class> both match
        assert_eq!(set.vb_matches(html), vec![r#"Dim s = """#, r#"Dim s = """#]);
        assert_eq!(set.csharp_matches(html), vec![r#"var s = "";"#]);
    }

    #[test]
    fn test_plain_text_labels() {
        let text = "VB.NET:\nDim n As Long\nC#:\nlong n;";
        let set = PatternSet::new();
        assert_eq!(set.vb_matches(text), vec!["Dim n As Long"]);
        assert_eq!(set.csharp_matches(text), vec!["long n;"]);
    }

    #[test]
    fn test_label_block_at_end_drops_trailing_newline() {
        let set = PatternSet::new();
        assert_eq!(set.vb_matches("VB.NET:\nDim a\nDim b\n"), vec!["Dim a\nDim b"]);
        assert_eq!(set.csharp_matches("C#:\nint a;\nint b;\n"), vec!["int a;\nint b;"]);
    }

    #[test]
    fn test_no_matches() {
        let set = PatternSet::new();
        assert!(set.vb_matches("<p>nothing here</p>").is_empty());
        assert!(set.csharp_matches("<p>nothing here</p>").is_empty());
    }
}
