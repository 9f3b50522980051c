//! Line-delimited JSON storage for [`Example`] collections.
//!
//! One record per line, insertion order preserved. Malformed lines are
//! logged and skipped; only I/O failures abort a load.
pub mod filter;
pub mod stats;

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::record::Example;

/// A record together with the 1-based file line it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedExample {
    pub line_number: usize,
    pub example: Example,
}

/// A line that could not be parsed as a record.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedLine {
    pub line_number: usize,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub entries: Vec<LoadedExample>,
    pub malformed: Vec<MalformedLine>,
}

impl LoadReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the line annotations.
    pub fn into_examples(self) -> Vec<Example> {
        self.entries.into_iter().map(|e| e.example).collect()
    }
}

// ── Reading ──────────────────────────────────────────────────────────

/// Read records from any buffered source.
pub fn read_examples<R: BufRead>(reader: R) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line.with_context(|| format!("failed to read line {line_number}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match Example::from_json_line(trimmed) {
            Ok(example) => report.entries.push(LoadedExample {
                line_number,
                example,
            }),
            Err(e) => {
                warn!("Error parsing line {line_number}: {e}");
                report.malformed.push(MalformedLine {
                    line_number,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Load a JSONL file. A missing file is an error.
pub fn load(path: &Path) -> Result<LoadReport> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let report = read_examples(BufReader::new(file))?;
    info!(
        "Loaded {} examples from {} ({} malformed lines)",
        report.len(),
        path.display(),
        report.malformed.len()
    );
    Ok(report)
}

/// Load a JSONL file, treating a missing file as empty.
pub fn load_if_exists(path: &Path) -> Result<LoadReport> {
    if !path.exists() {
        debug!("{} does not exist yet", path.display());
        return Ok(LoadReport::default());
    }
    load(path)
}

// ── Writing ──────────────────────────────────────────────────────────

pub fn write_examples<W: Write>(mut writer: W, examples: &[Example]) -> Result<()> {
    for example in examples {
        let line = example.to_json_line().context("failed to serialize example")?;
        writeln!(writer, "{line}").context("failed to write example")?;
    }
    writer.flush().context("failed to flush output")?;
    Ok(())
}

/// Write `examples` to `path`, replacing or appending.
pub fn persist(path: &Path, examples: &[Example], append: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    write_examples(BufWriter::new(file), examples)?;

    let action = if append { "Appended" } else { "Saved" };
    info!("{action} {} examples to {}", examples.len(), path.display());
    Ok(())
}

pub fn save(path: &Path, examples: &[Example]) -> Result<()> {
    persist(path, examples, false)
}

pub fn append(path: &Path, examples: &[Example]) -> Result<()> {
    persist(path, examples, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(n: usize) -> Example {
        Example::crawled(
            &format!("Dim value{n} As Integer = {n}"),
            &format!("int value{n} = {n};"),
            "https://docs.example.com/a",
        )
    }

    #[test]
    fn test_read_skips_blank_lines() {
        let data = format!(
            "{}\n\n   \n{}\n",
            sample(1).to_json_line().unwrap(),
            sample(2).to_json_line().unwrap()
        );
        let report = read_examples(data.as_bytes()).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report.entries[0].line_number, 1);
        assert_eq!(report.entries[1].line_number, 4);
        assert!(report.malformed.is_empty());
    }

    #[test]
    fn test_read_malformed_line_is_skipped() {
        let lines: Vec<String> = (1..=5)
            .map(|i| {
                if i == 3 {
                    "{not json".to_string()
                } else {
                    sample(i).to_json_line().unwrap()
                }
            })
            .collect();
        let report = read_examples(lines.join("\n").as_bytes()).unwrap();
        assert_eq!(report.len(), 4);
        assert_eq!(report.malformed.len(), 1);
        assert_eq!(report.malformed[0].line_number, 3);
        assert_eq!(report.entries[2].line_number, 4);
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.jsonl");
        let examples = vec![
            sample(1),
            Example::manual("Sub Main()\nEnd Sub", "static void Main() { }").with_title("entry"),
            Example::converted("Dim s As String = \"é\"", "string s = \"é\";"),
        ];

        save(&path, &examples).unwrap();
        let loaded = load(&path).unwrap().into_examples();
        assert_eq!(loaded, examples);
    }

    #[test]
    fn test_append_keeps_existing_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        save(&path, &[sample(1), sample(2)]).unwrap();
        append(&path, &[sample(3)]).unwrap();

        let loaded = load(&path).unwrap().into_examples();
        assert_eq!(loaded, vec![sample(1), sample(2), sample(3)]);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        save(&path, &[sample(1), sample(2)]).unwrap();
        save(&path, &[sample(3)]).unwrap();

        assert_eq!(load(&path).unwrap().into_examples(), vec![sample(3)]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.jsonl");
        assert!(load(&path).is_err());
        assert!(load_if_exists(&path).unwrap().is_empty());
    }
}
