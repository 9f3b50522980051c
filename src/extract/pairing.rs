//! Decide which VB.NET block translates to which C# block.
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Default cap on `vb × csharp` candidates for the cross-product fallback.
pub const DEFAULT_MAX_CANDIDATES: usize = 10_000;

const MIN_COMMON_WORDS: usize = 3;
const MAX_LINE_DIFF: usize = 2;

pub struct PairMatcher {
    max_candidates: usize,
}

impl PairMatcher {
    pub fn new(max_candidates: usize) -> Self {
        Self { max_candidates }
    }

    /// Pair blocks positionally when the counts agree, otherwise (or when
    /// positional pairing yields nothing) try every combination.
    pub fn find_translation_pairs(&self, vb: &[String], csharp: &[String]) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if vb.len() == csharp.len() && !vb.is_empty() {
            for (v, c) in vb.iter().zip(csharp) {
                if is_candidate(v, c) {
                    pairs.push((v.clone(), c.clone()));
                }
            }
        }

        if !pairs.is_empty() {
            return pairs;
        }

        let candidates = vb.len().saturating_mul(csharp.len());
        if candidates > self.max_candidates {
            warn!(
                "Skipping cross-product pairing: {} x {} blocks exceeds {} candidates",
                vb.len(),
                csharp.len(),
                self.max_candidates
            );
            return pairs;
        }

        for v in vb {
            for c in csharp {
                if is_candidate(v, c) {
                    pairs.push((v.clone(), c.clone()));
                }
            }
        }
        debug!("Cross-product pairing kept {} of {candidates} candidates", pairs.len());
        pairs
    }
}

impl Default for PairMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CANDIDATES)
    }
}

fn is_candidate(vb: &str, csharp: &str) -> bool {
    vb.trim() != csharp.trim() && looks_like_translation_pair(vb, csharp)
}

/// Heuristic: at least three shared lower-cased words, or a similar line
/// count on a multi-line VB.NET block.
pub fn looks_like_translation_pair(vb: &str, csharp: &str) -> bool {
    let vb_words = word_set(vb);
    let cs_words = word_set(csharp);
    if vb_words.intersection(&cs_words).count() >= MIN_COMMON_WORDS {
        return true;
    }

    let vb_lines = vb.split('\n').count();
    let cs_lines = csharp.split('\n').count();
    vb_lines.abs_diff(cs_lines) <= MAX_LINE_DIFF && vb_lines > 2
}

fn word_set(code: &str) -> HashSet<String> {
    let lower = code.to_lowercase();
    WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}
