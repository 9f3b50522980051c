//! Batch conversion of VB.NET source files.
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use super::{ConverterBackend, InputLimits, convert_checked};
use crate::extract::keywords::{VB_ENTRY_HINTS, contains_any};
use crate::record::{Example, MIN_CODE_CHARS};

pub const VB_EXTENSIONS: &[&str] = &["vb", "vbx", "vbs"];

pub fn has_vb_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| VB_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// VB source files under `dir`, sorted and de-duplicated.
pub fn discover_vb_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let mut builder = WalkBuilder::new(dir);
    builder.standard_filters(false).hidden(true);
    if !recursive {
        builder.max_depth(Some(1));
    }

    let mut files: Vec<PathBuf> = builder
        .build()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && has_vb_extension(p))
        .collect();
    files.sort();
    files.dedup();

    info!("Found {} VB files in {}", files.len(), dir.display());
    Ok(files)
}

/// One path per line; `#` comments, missing files and other extensions are
/// skipped with a warning.
pub fn load_file_list(list: &Path) -> Result<Vec<PathBuf>> {
    let data = std::fs::read_to_string(list)
        .with_context(|| format!("failed to read file list: {}", list.display()))?;

    let mut files = Vec::new();
    for line in data.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let path = PathBuf::from(line);
        match list_entry_problem(&path) {
            None => files.push(path),
            Some(reason) => warn!("Skipping invalid file: {line} ({reason})"),
        }
    }

    info!("Loaded {} VB files from {}", files.len(), list.display());
    Ok(files)
}

/// Why a file-list entry cannot be converted, if it cannot.
fn list_entry_problem(path: &Path) -> Option<&'static str> {
    if !path.exists() {
        Some("not found")
    } else if !path.is_file() {
        Some("not a regular file")
    } else if !has_vb_extension(path) {
        Some("wrong extension, expected .vb, .vbx or .vbs")
    } else {
        None
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub examples: Vec<Example>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.examples.len()
    }
}

pub struct BatchConverter<'a, B: ConverterBackend + ?Sized> {
    backend: &'a B,
    limits: InputLimits,
    delay: Duration,
}

impl<'a, B: ConverterBackend + ?Sized> BatchConverter<'a, B> {
    pub fn new(backend: &'a B, limits: InputLimits, delay: Duration) -> Self {
        Self {
            backend,
            limits,
            delay,
        }
    }

    /// Convert one file into a validated record.
    pub fn convert_file(&self, path: &Path) -> Result<Example> {
        self.limits.check_file(path)?;
        let vb_code = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.convert_code(
            &vb_code,
            &format!("File: {name}"),
            &format!("Converted from file: {}", path.display()),
        )
    }

    /// Convert a snippet and wrap it as a converted record.
    pub fn convert_code(&self, vb_code: &str, title: &str, description: &str) -> Result<Example> {
        if vb_code.trim().chars().count() <= MIN_CODE_CHARS {
            bail!("VB.NET code is too short");
        }
        if !contains_any(vb_code, VB_ENTRY_HINTS) {
            warn!("Input doesn't look like typical VB.NET code");
        }

        let csharp = convert_checked(self.backend, &self.limits, vb_code)?;
        Example::converted(vb_code, &csharp)
            .with_title(title)
            .with_description(description)
            .accept()
            .map_err(|reason| anyhow!("invalid conversion result: {reason}"))
    }

    /// Convert every file in order; failures are recorded, never fatal.
    pub fn run(&self, files: &[PathBuf]) -> BatchSummary {
        info!(
            "Starting batch conversion of {} files with {}",
            files.len(),
            self.backend.name()
        );

        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("valid template")
                .progress_chars("█▓░"),
        );

        let mut summary = BatchSummary::default();
        for (i, path) in files.iter().enumerate() {
            pb.set_message(path.display().to_string());
            match self.convert_file(path) {
                Ok(example) => {
                    info!("Converted {}", path.display());
                    summary.examples.push(example);
                }
                Err(e) => {
                    warn!("Failed to convert {}: {e:#}", path.display());
                    summary.failed.push((path.clone(), format!("{e:#}")));
                }
            }
            pb.inc(1);

            if i + 1 < files.len() && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
        }
        pb.finish_and_clear();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::mock::MockConverter;
    use std::fs;

    const SAMPLE: &str = "Public Sub Greet(name As String)\n    Console.WriteLine(\"Hi \" & name)\nEnd Sub\n";

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_recursive_and_flat() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write(&root.join("b.vb"), SAMPLE);
        write(&root.join("a.VBS"), SAMPLE);
        write(&root.join("notes.txt"), "x");
        write(&root.join("nested/c.vbx"), SAMPLE);

        let all = discover_vb_files(root, true).unwrap();
        let names: Vec<_> = all
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.VBS", "b.vb", "nested/c.vbx"]);

        let flat = discover_vb_files(root, false).unwrap();
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn test_discover_rejects_non_directory() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("x.vb");
        write(&file, SAMPLE);
        assert!(discover_vb_files(&file, true).is_err());
    }

    #[test]
    fn test_load_file_list_skips_invalid_entries() {
        let temp = tempfile::tempdir().unwrap();
        let good = temp.path().join("good.vb");
        let wrong = temp.path().join("wrong.cs");
        write(&good, SAMPLE);
        write(&wrong, "class A {}");

        let list = temp.path().join("files.txt");
        let body = format!(
            "# batch\n{}\n\n{}\n{}\n",
            good.display(),
            wrong.display(),
            temp.path().join("missing.vb").display()
        );
        write(&list, &body);

        assert_eq!(load_file_list(&list).unwrap(), vec![good]);
    }

    #[test]
    fn test_list_entry_problem_names_reason() {
        let temp = tempfile::tempdir().unwrap();
        let good = temp.path().join("good.vb");
        let wrong = temp.path().join("wrong.cs");
        write(&good, SAMPLE);
        write(&wrong, "class A {}");

        assert_eq!(list_entry_problem(&good), None);
        assert_eq!(list_entry_problem(&temp.path().join("missing.vb")), Some("not found"));
        assert_eq!(list_entry_problem(temp.path()), Some("not a regular file"));
        assert!(list_entry_problem(&wrong).unwrap().starts_with("wrong extension"));
    }

    #[test]
    fn test_convert_file_sets_title_and_flags() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("greet.vb");
        write(&path, SAMPLE);

        let backend = MockConverter::new();
        let batch = BatchConverter::new(&backend, InputLimits::default(), Duration::ZERO);
        let example = batch.convert_file(&path).unwrap();

        assert_eq!(example.title(), "File: greet.vb");
        assert_eq!(
            example.description(),
            format!("Converted from file: {}", path.display())
        );
        assert!(example.is_converted_automatically());
        assert_eq!(example.vb_code(), SAMPLE.trim());
    }

    #[test]
    fn test_oversized_file_never_reaches_backend() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("big.vb");
        write(&path, &SAMPLE.repeat(10));

        let backend = MockConverter::new();
        let limits = InputLimits {
            max_code_chars: 40_000,
            max_file_bytes: 64,
        };
        let batch = BatchConverter::new(&backend, limits, Duration::ZERO);
        assert!(batch.convert_file(&path).is_err());
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_short_code_is_rejected_before_conversion() {
        let backend = MockConverter::new();
        let batch = BatchConverter::new(&backend, InputLimits::default(), Duration::ZERO);
        assert!(batch.convert_code("Dim a", "t", "d").is_err());
        // exactly at the record minimum is still refused
        assert!(batch.convert_code("Dim a As X", "t", "d").is_err());
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_run_continues_past_failures() {
        let temp = tempfile::tempdir().unwrap();
        let ok = temp.path().join("ok.vb");
        let bad = temp.path().join("bad.vb");
        let short = temp.path().join("short.vb");
        write(&ok, SAMPLE);
        write(&bad, &format!("{SAMPLE}' BROKEN\n"));
        write(&short, "Dim a");

        let backend = MockConverter::failing_on("BROKEN");
        let batch = BatchConverter::new(&backend, InputLimits::default(), Duration::ZERO);
        let summary = batch.run(&[bad.clone(), ok, short.clone()]);

        assert_eq!(summary.succeeded(), 1);
        let failed: Vec<_> = summary.failed.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(failed, vec![bad, short]);
        assert_eq!(backend.calls(), 2);
    }
}
