/// End-to-end integration tests for the corpus pipeline.
///
/// Tests the complete flow:
///   HTML → Extractor → Matcher → Records → JSONL → Stats/Filter → Review
/// plus batch conversion through the mock backend. No network, no browser.
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::time::Duration;

use anyhow::{Result, bail};
use tempfile::tempdir;
use vbcs_corpus::config::{Config, CrawlConfig};
use vbcs_corpus::converter::batch::{BatchConverter, discover_vb_files};
use vbcs_corpus::converter::mock::MockConverter;
use vbcs_corpus::converter::InputLimits;
use vbcs_corpus::crawler::{Crawler, PageFetcher};
use vbcs_corpus::curation::Prompter;
use vbcs_corpus::curation::review::{self, ReviewOptions};
use vbcs_corpus::dataset::{self, filter, stats};
use vbcs_corpus::extract::CodeExtractor;
use vbcs_corpus::extract::pairing::{PairMatcher, looks_like_translation_pair};
use vbcs_corpus::record::{Example, Provenance};

struct MemoryFetcher {
    pages: HashMap<&'static str, &'static str>,
}

impl PageFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        match self.pages.get(url) {
            Some(html) => Ok(html.to_string()),
            None => bail!("no page for {url}"),
        }
    }
}

const TABLE_PAGE: &str = "<html><body><h1>VB.NET vs C#</h1><table>\
    <tr><th>VB.NET</th><th>C#</th></tr>\
    <tr><td>Dim x As Integer</td><td>int x;</td></tr>\
    </table></body></html>";

const CODE_PAGE: &str = r#"<html><body>
<h1>Converting loops from VB.NET to C#</h1>
<pre><code class="vb">Dim total As Integer = price * quantity</code></pre>
<pre><code class="csharp">int total = price * quantity;</code></pre>
</body></html>"#;

fn crawl_config() -> CrawlConfig {
    CrawlConfig {
        delay_ms: 0,
        ..CrawlConfig::default()
    }
}

/// Comparison table: extraction succeeds, but the pair never reaches the file
#[test]
fn test_table_pair_extracted_but_not_persisted() {
    let blocks = CodeExtractor::new().extract_code_blocks(TABLE_PAGE);
    assert_eq!(blocks.vb, vec!["Dim x As Integer"]);
    assert_eq!(blocks.csharp, vec!["int x;"]);

    let fetcher = MemoryFetcher {
        pages: HashMap::from([("https://docs.example/table", TABLE_PAGE)]),
    };
    let crawler = Crawler::new(&fetcher, &crawl_config());
    let examples = crawler.crawl_urls(&["https://docs.example/table".to_string()]);
    assert!(examples.is_empty(), "Short C# cell must fail validation");

    let temp = tempdir().unwrap();
    let path = temp.path().join("translations.jsonl");
    dataset::save(&path, &examples).unwrap();
    assert!(dataset::load(&path).unwrap().is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

/// Blocks sharing "sum", "for", "each" pair up despite different line counts
#[test]
fn test_shared_words_are_paired() {
    let vb = "Dim sum As Integer = 0\nFor Each n In nums\n    sum += n\nNext".to_string();
    let cs = "int sum = 0; foreach (var n in nums) { sum += n; } // for each".to_string();
    assert!(looks_like_translation_pair(&vb, &cs));

    let pairs = PairMatcher::default().find_translation_pairs(&[vb.clone()], &[cs.clone()]);
    assert_eq!(pairs, vec![(vb, cs)]);
}

/// Five-line file with a broken third line: four records, one reported error
#[test]
fn test_malformed_line_does_not_abort_load() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("mixed.jsonl");

    let mut lines = Vec::new();
    for i in 1..=5 {
        if i == 3 {
            lines.push(r#"{"vb_code": "Dim broken"#.to_string());
        } else {
            let example = Example::crawled(
                &format!("Dim value{i} As Integer = {i}"),
                &format!("int value{i} = {i};"),
                "https://docs.example/",
            );
            lines.push(example.to_json_line().unwrap());
        }
    }
    fs::write(&path, lines.join("\n") + "\n").unwrap();

    let report = dataset::load(&path).unwrap();
    assert_eq!(report.len(), 4);
    assert_eq!(report.malformed.len(), 1);
    assert_eq!(report.malformed[0].line_number, 3);
    let numbers: Vec<usize> = report.entries.iter().map(|e| e.line_number).collect();
    assert_eq!(numbers, vec![1, 2, 4, 5]);
}

/// Crawl → save → load → stats → filter → review → save cleaned
#[test]
fn test_crawl_to_review_pipeline() {
    let fetcher = MemoryFetcher {
        pages: HashMap::from([
            ("https://docs.example/loops", CODE_PAGE),
            ("https://docs.example/table", TABLE_PAGE),
        ]),
    };
    let crawler = Crawler::new(&fetcher, &crawl_config()).with_delay(Duration::ZERO);
    let urls = vec![
        "https://docs.example/loops".to_string(),
        "https://docs.example/missing".to_string(),
        "https://docs.example/table".to_string(),
    ];
    let crawled = crawler.crawl_urls(&urls);
    assert!(!crawled.is_empty(), "Code page should produce pairs");
    assert!(crawled.iter().all(|e| e.is_valid()));
    assert!(crawled.iter().all(|e| e.source_url() == "https://docs.example/loops"));

    // Save and append a manual record, then reload
    let temp = tempdir().unwrap();
    let path = temp.path().join("translations.jsonl");
    dataset::save(&path, &crawled).unwrap();
    let manual = Example::manual(
        "Public Function Twice(x As Integer) As Integer\n    Return x * 2\nEnd Function",
        "public int Twice(int x)\n{\n    return x * 2;\n}",
    );
    dataset::append(&path, std::slice::from_ref(&manual)).unwrap();

    let report = dataset::load(&path).unwrap();
    assert_eq!(report.len(), crawled.len() + 1);
    let loaded: Vec<Example> = report.entries.iter().map(|e| e.example.clone()).collect();
    assert_eq!(&loaded[..crawled.len()], &crawled[..]);
    assert_eq!(loaded.last().unwrap().provenance(), Provenance::Manual);

    // Stats over the loaded collection
    let summary = stats::analyze(&loaded);
    assert_eq!(summary.total_examples, loaded.len());
    assert_eq!(summary.source_domains["docs.example"], crawled.len());
    assert_eq!(summary.vb_keywords["dim"], crawled.len());

    // Filter keeps everything over 20 chars and is idempotent
    let thresholds = filter::FilterConfig {
        min_length: 20,
        ..filter::FilterConfig::default()
    };
    let once = filter::filter_examples(&loaded, &thresholds);
    assert_eq!(once.len(), loaded.len());
    assert_eq!(filter::filter_examples(&once, &thresholds), once);

    // Review: delete the first record, keep the rest
    let mut input = String::from("d\n");
    for _ in 1..report.len() {
        input.push_str("k\n");
    }
    let options = ReviewOptions::default();
    let entries = review::select_for_review(report.entries, &options);
    let mut prompter = Prompter::new(Cursor::new(input.into_bytes()), Vec::new());
    let outcome = review::review(&mut prompter, &entries, &options).unwrap();
    assert!(!outcome.quit);
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.kept.len(), loaded.len() - 1);

    let cleaned = temp.path().join("translations_cleaned.jsonl");
    dataset::save(&cleaned, &outcome.kept).unwrap();
    let reloaded = dataset::load(&cleaned).unwrap().into_examples();
    assert_eq!(reloaded, loaded[1..].to_vec());
}

/// Keyword counts: two of three records mention `Dim`
#[test]
fn test_keyword_statistics() {
    let examples = vec![
        Example::crawled("Dim a As Integer = 1", "int a = 1;", "https://a.example/"),
        Example::crawled("Dim b As String = \"\"", "string b = \"\";", "https://a.example/"),
        Example::crawled("Sub Run()\nEnd Sub", "void Run() { }", "https://b.example/"),
    ];
    let summary = stats::analyze(&examples);
    assert_eq!(summary.vb_keywords["dim"], 2);
    assert_eq!(summary.source_domains["a.example"], 2);
}

/// Directory batch through the mock backend, appended to an existing dataset
#[test]
fn test_batch_conversion_appends_records() {
    let temp = tempdir().unwrap();
    let src = temp.path().join("vb");
    fs::create_dir_all(src.join("nested")).unwrap();
    fs::write(
        src.join("greet.vb"),
        "Public Sub Greet(name As String)\n    Console.WriteLine(name)\nEnd Sub\n",
    )
    .unwrap();
    fs::write(
        src.join("nested/area.vb"),
        "Public Function Area(r As Double) As Double\n    Return Math.PI * r * r\nEnd Function\n",
    )
    .unwrap();
    fs::write(src.join("readme.txt"), "not code").unwrap();

    let files = discover_vb_files(&src, true).unwrap();
    assert_eq!(files.len(), 2);

    let backend = MockConverter::new();
    let converter = BatchConverter::new(&backend, InputLimits::default(), Duration::ZERO);
    let summary = converter.run(&files);
    assert_eq!(summary.succeeded(), 2);
    assert!(summary.failed.is_empty());

    let output = temp.path().join("conversions.jsonl");
    dataset::save(
        &output,
        &[Example::manual("Dim greeting As String = \"hi\"", "string greeting = \"hi\";")],
    )
    .unwrap();
    dataset::append(&output, &summary.examples).unwrap();

    let all = dataset::load(&output).unwrap().into_examples();
    assert_eq!(all.len(), 3);
    assert!(all[1..].iter().all(|e| e.provenance() == Provenance::Converted));
    assert!(all[1].title().starts_with("File: "));
}

#[test]
fn test_config_defaults_and_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.crawl.timeout_secs, 30);
    assert_eq!(config.converter.max_code_chars, 40_000);
    assert_eq!(config.converter.max_file_bytes, 50_000);

    let temp = tempdir().unwrap();
    let path = temp.path().join("vbcs.json");
    let path = path.to_str().unwrap();
    config.save(path).unwrap();
    let reloaded = Config::load(path).unwrap();
    assert_eq!(reloaded.converter.url, config.converter.url);
    assert_eq!(reloaded.curation.preview_lines, config.curation.preview_lines);
}
