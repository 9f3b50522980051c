/// Deterministic converter for tests and offline runs.
///
/// Emits a small C# class with one comment per non-blank VB.NET line, so the
/// output depends on the input and passes the output checks.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{ConverterBackend, ConverterError};

#[derive(Default)]
pub struct MockConverter {
    /// Inputs containing this marker fail with a timeout.
    fail_marker: Option<String>,
    calls: AtomicUsize,
}

impl MockConverter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `convert` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ConverterBackend for MockConverter {
    fn convert(&self, vb_code: &str) -> Result<String, ConverterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(marker) = &self.fail_marker {
            if vb_code.contains(marker.as_str()) {
                return Err(ConverterError::Timeout(Duration::ZERO));
            }
        }

        let mut out = String::from("using System;\n\npublic class Converted\n{\n");
        let lines = vb_code.lines().map(str::trim).filter(|l| !l.is_empty());
        for (i, line) in lines.enumerate() {
            out.push_str(&format!("    // line {}: {} chars\n", i + 1, line.chars().count()));
        }
        out.push('}');
        Ok(out)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
