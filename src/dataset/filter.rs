//! Length and length-ratio filtering for record collections.
use crate::record::Example;

/// Thresholds for [`filter_examples`]. Lengths are in characters.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub min_length: usize,
    pub max_length: Option<usize>,
    /// Lower bound on `vb_len / cs_len`.
    pub min_ratio: f64,
    pub max_ratio: Option<f64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_length: 0,
            max_length: None,
            min_ratio: 0.0,
            max_ratio: None,
        }
    }
}

impl FilterConfig {
    /// Whether any threshold differs from the pass-everything default.
    pub fn is_active(&self) -> bool {
        self.min_length > 0
            || self.max_length.is_some()
            || self.min_ratio > 0.0
            || self.max_ratio.is_some()
    }
}

/// Check if a record passes the length and ratio thresholds.
pub fn passes_filter(example: &Example, config: &FilterConfig) -> bool {
    let vb_len = example.vb_code().chars().count();
    let cs_len = example.csharp_code().chars().count();

    if vb_len < config.min_length || cs_len < config.min_length {
        return false;
    }

    if let Some(max) = config.max_length {
        if vb_len > max || cs_len > max {
            return false;
        }
    }

    // Ratio is undefined without any C#.
    if cs_len > 0 {
        let ratio = vb_len as f64 / cs_len as f64;
        if ratio < config.min_ratio {
            return false;
        }
        if let Some(max) = config.max_ratio {
            if ratio > max {
                return false;
            }
        }
    }

    true
}

/// Keep the records passing `config`, in their original order.
pub fn filter_examples(examples: &[Example], config: &FilterConfig) -> Vec<Example> {
    examples
        .iter()
        .filter(|ex| passes_filter(ex, config))
        .cloned()
        .collect()
}
