//! Side-by-side comparison tables: a header row naming both languages,
//! then one VB.NET / C# pair per data row.
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::CodeBlocks;
use super::keywords::{looks_like_csharp, looks_like_vb};

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").unwrap());

/// Entities that survive as text when pages double-escape their markup.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
];

/// Collect pairs from every qualifying table in `document`.
///
/// Output vectors are index-aligned: `vb[i]` came from the same row as
/// `csharp[i]`.
pub fn extract_from_tables(document: &Html) -> CodeBlocks {
    let mut blocks = CodeBlocks::default();

    for table in document.select(&TABLE) {
        let mut rows = table.select(&ROW);
        let Some(header) = rows.next() else {
            continue;
        };
        if !is_comparison_header(header) {
            continue;
        }

        for row in rows {
            let cells: Vec<ElementRef> = row.select(&CELL).collect();
            if cells.len() < 2 {
                continue;
            }

            let vb = clean_cell_text(cells[0]);
            let cs = clean_cell_text(cells[1]);
            if looks_like_vb(&vb) && looks_like_csharp(&cs) {
                blocks.vb.push(vb);
                blocks.csharp.push(cs);
            }
        }
    }

    blocks
}

/// Header needs at least two cells mentioning VB.NET and C#.
fn is_comparison_header(row: ElementRef) -> bool {
    let cells: Vec<String> = row
        .select(&CELL)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect();
    if cells.len() < 2 {
        return false;
    }

    let text = cells.join(" ").to_lowercase();
    let has_vb = text.contains("vb.net") || text.contains("visual basic");
    has_vb && text.contains("c#")
}

/// Cell text with line breaks kept, blank lines dropped and each line trimmed.
pub fn clean_cell_text(cell: ElementRef) -> String {
    normalize_cell_text(&cell.text().collect::<String>())
}

fn normalize_cell_text(raw: &str) -> String {
    let mut text = raw.to_string();
    for (entity, replacement) in ENTITIES {
        text = text.replace(entity, replacement);
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
