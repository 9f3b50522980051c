//! Summary statistics over a record collection.
use std::collections::BTreeMap;
use std::fmt;

use reqwest::Url;
use serde::Serialize;

use crate::record::Example;

/// Substrings counted (once per record) in the VB.NET side.
pub const VB_KEYWORDS: &[&str] = &[
    "dim",
    "sub",
    "function",
    "end sub",
    "end function",
    "byval",
    "byref",
    "as",
];

/// Substrings counted (once per record) in the C# side.
pub const CSHARP_KEYWORDS: &[&str] = &[
    "var",
    "public",
    "private",
    "class",
    "namespace",
    "using",
    "return",
];

/// Width of one bin in the length histogram.
pub const LENGTH_BUCKET: usize = 100;

const UNKNOWN_DOMAIN: &str = "unknown";
const REPORT_TOP_N: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetStats {
    pub total_examples: usize,
    pub avg_vb_length: f64,
    pub avg_csharp_length: f64,
    pub source_domains: BTreeMap<String, usize>,
    pub vb_keywords: BTreeMap<String, usize>,
    pub csharp_keywords: BTreeMap<String, usize>,
    /// Bucket start (multiple of [`LENGTH_BUCKET`]) → count, keyed on the
    /// shorter of the two code fields.
    pub length_distribution: BTreeMap<usize, usize>,
}

pub fn analyze(examples: &[Example]) -> DatasetStats {
    let mut stats = DatasetStats {
        total_examples: examples.len(),
        ..DatasetStats::default()
    };
    if examples.is_empty() {
        return stats;
    }

    let mut total_vb = 0usize;
    let mut total_cs = 0usize;

    for example in examples {
        let vb_len = example.vb_code().chars().count();
        let cs_len = example.csharp_code().chars().count();
        total_vb += vb_len;
        total_cs += cs_len;

        let bucket = (vb_len.min(cs_len) / LENGTH_BUCKET) * LENGTH_BUCKET;
        *stats.length_distribution.entry(bucket).or_default() += 1;

        *stats
            .source_domains
            .entry(source_domain(example.source_url()))
            .or_default() += 1;

        count_keywords(&mut stats.vb_keywords, VB_KEYWORDS, example.vb_code());
        count_keywords(&mut stats.csharp_keywords, CSHARP_KEYWORDS, example.csharp_code());
    }

    stats.avg_vb_length = total_vb as f64 / examples.len() as f64;
    stats.avg_csharp_length = total_cs as f64 / examples.len() as f64;
    stats
}

/// Network location of a source URL, or `"unknown"`.
pub fn source_domain(source: &str) -> String {
    let Ok(url) = Url::parse(source) else {
        return UNKNOWN_DOMAIN.to_string();
    };
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => UNKNOWN_DOMAIN.to_string(),
    }
}

fn count_keywords(counter: &mut BTreeMap<String, usize>, keywords: &[&str], code: &str) {
    let lower = code.to_lowercase();
    for keyword in keywords {
        if lower.contains(keyword) {
            *counter.entry((*keyword).to_string()).or_default() += 1;
        }
    }
}

/// Entries ordered by descending count, ties broken by key.
pub fn most_common(counter: &BTreeMap<String, usize>, n: usize) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = counter.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.truncate(n);
    entries
}

impl fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Translation Examples Analysis ===")?;
        writeln!(f, "Total examples: {}", self.total_examples)?;
        writeln!(f, "Average VB.NET code length: {:.1} characters", self.avg_vb_length)?;
        writeln!(f, "Average C# code length: {:.1} characters", self.avg_csharp_length)?;

        let sections = [
            ("Source Domains", &self.source_domains),
            ("VB.NET Keywords", &self.vb_keywords),
            ("C# Keywords", &self.csharp_keywords),
        ];
        for (heading, counter) in sections {
            writeln!(f, "\n=== {heading} ===")?;
            for (key, count) in most_common(counter, REPORT_TOP_N) {
                writeln!(f, "  {key}: {count}")?;
            }
        }

        writeln!(f, "\n=== Length Distribution ===")?;
        for (start, count) in &self.length_distribution {
            writeln!(f, "  {start}-{} chars: {count}", start + LENGTH_BUCKET - 1)?;
        }
        Ok(())
    }
}
