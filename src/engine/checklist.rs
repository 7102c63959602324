use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::error::SchemaError;
use crate::model::{CheckItem, Difficulty, Priority};
use crate::util::sha256_hex;

use super::normalize::normalize_key;

pub const DEFAULT_CHECKLIST: &str = include_str!("../../assets/default_checklist.tsv");

#[derive(Debug, Clone)]
pub struct Checklist {
    pub items: Vec<CheckItem>,
    /// Source lines that carried data but no tip.
    pub skipped_rows: Vec<usize>,
    /// Priority/difficulty cells that fell back to `Medium`.
    pub coerced_cells: usize,
    pub sha256: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Column {
    Category,
    Tip,
    Priority,
    Difficulty,
    Explanation,
}

/// Required columns: reported name plus accepted (normalized) header spellings.
const COLUMNS: [(Column, &str, &[&str]); 5] = [
    (Column::Category, "Categorie", &["categorie", "category"]),
    (Column::Tip, "Tip", &["tip"]),
    (Column::Priority, "Prioriteit", &["prioriteit", "priority"]),
    (
        Column::Difficulty,
        "Moeilijkheidsgraad",
        &["moeilijkheidsgraad", "moeilijkheid", "difficulty"],
    ),
    (Column::Explanation, "Uitleg", &["uitleg", "explanation"]),
];

pub fn load(source: &str) -> Result<Checklist, SchemaError> {
    let text = source.strip_prefix('\u{feff}').unwrap_or(source);
    let header_line = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or(SchemaError::Empty)?;
    let delimiter = detect_delimiter(header_line);

    let mut records = parse_records(text, delimiter)?
        .into_iter()
        .filter(|(_, cells)| cells.iter().any(|cell| !cell.trim().is_empty()));

    let (_, header) = records.next().ok_or(SchemaError::Empty)?;
    let positions = map_columns(&header)?;

    let mut items = Vec::new();
    let mut skipped_rows = Vec::new();
    let mut coerced_cells = 0;

    for (line, cells) in records {
        let cell = |column: Column| -> &str {
            positions
                .iter()
                .find(|(candidate, _)| *candidate == column)
                .and_then(|(_, index)| cells.get(*index))
                .map(|value| value.trim())
                .unwrap_or("")
        };

        let tip = cell(Column::Tip);
        if tip.is_empty() {
            warn!(line, "skipping checklist row without tip");
            skipped_rows.push(line);
            continue;
        }

        let raw_priority = cell(Column::Priority);
        let priority = parse_priority(raw_priority).unwrap_or_else(|| {
            coerced_cells += 1;
            debug!(line, value = %raw_priority, "unrecognized priority; using Medium");
            Priority::Medium
        });

        let raw_difficulty = cell(Column::Difficulty);
        let difficulty = parse_difficulty(raw_difficulty).unwrap_or_else(|| {
            coerced_cells += 1;
            debug!(line, value = %raw_difficulty, "unrecognized difficulty; using Medium");
            Difficulty::Medium
        });

        items.push(CheckItem {
            category: cell(Column::Category).to_string(),
            tip: tip.to_string(),
            priority,
            difficulty,
            explanation: cell(Column::Explanation).to_string(),
            source_row: line,
        });
    }

    info!(
        items = items.len(),
        skipped = skipped_rows.len(),
        coerced = coerced_cells,
        delimiter = ?delimiter,
        "checklist loaded"
    );

    Ok(Checklist {
        items,
        skipped_rows,
        coerced_cells,
        sha256: sha256_hex(source.as_bytes()),
    })
}

pub fn load_path(path: &Path) -> Result<Checklist> {
    let raw = crate::util::read_text_file(path)?;
    load(&raw).with_context(|| format!("invalid checklist {}", path.display()))
}

pub fn load_default() -> Result<Checklist, SchemaError> {
    load(DEFAULT_CHECKLIST)
}

pub fn parse_priority(raw: &str) -> Option<Priority> {
    match normalize_key(raw).as_str() {
        "hoog" | "high" => Some(Priority::High),
        "gemiddeld" | "middel" | "normaal" | "medium" => Some(Priority::Medium),
        "laag" | "low" => Some(Priority::Low),
        _ => None,
    }
}

pub fn parse_difficulty(raw: &str) -> Option<Difficulty> {
    match normalize_key(raw).as_str() {
        "makkelijk" | "eenvoudig" | "easy" | "laag" => Some(Difficulty::Easy),
        "gemiddeld" | "middel" | "medium" => Some(Difficulty::Medium),
        "moeilijk" | "hard" | "difficult" | "hoog" => Some(Difficulty::Hard),
        _ => None,
    }
}

fn map_columns(header: &[String]) -> Result<Vec<(Column, usize)>, SchemaError> {
    let normalized = header
        .iter()
        .map(|cell| normalize_key(cell))
        .collect::<Vec<String>>();

    let mut positions = Vec::with_capacity(COLUMNS.len());
    let mut missing = Vec::new();
    for (column, name, aliases) in COLUMNS {
        match normalized
            .iter()
            .position(|cell| aliases.contains(&cell.as_str()))
        {
            Some(index) => positions.push((column, index)),
            None => missing.push(name),
        }
    }

    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(SchemaError::MissingColumns { missing })
    }
}

fn detect_delimiter(header_line: &str) -> char {
    ['\t', ';', ',']
        .into_iter()
        .max_by_key(|candidate| {
            (
                header_line.matches(*candidate).count(),
                // prefer tab, then semicolon, on equal counts
                match candidate {
                    '\t' => 2,
                    ';' => 1,
                    _ => 0,
                },
            )
        })
        .unwrap_or('\t')
}

/// Splits delimited text into records, honoring RFC 4180 quoting.
/// Each record carries the 1-based line it starts on.
fn parse_records(text: &str, delimiter: char) -> Result<Vec<(usize, Vec<String>)>, SchemaError> {
    let mut records = Vec::new();
    let mut cells = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quote_line = 0;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                other => field.push(other),
            }
            continue;
        }

        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
                quote_line = line;
            }
            '\r' => {}
            '\n' => {
                cells.push(std::mem::take(&mut field));
                records.push((record_line, std::mem::take(&mut cells)));
                line += 1;
                record_line = line;
            }
            c if c == delimiter => cells.push(std::mem::take(&mut field)),
            other => field.push(other),
        }
    }

    if in_quotes {
        return Err(SchemaError::UnterminatedQuote { line: quote_line });
    }
    if !field.is_empty() || !cells.is_empty() {
        cells.push(field);
        records.push((record_line, cells));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const DUTCH_TSV: &str = "Categorie\tTip\tPrioriteit\tMoeilijkheidsgraad\tUitleg\n\
        Techniek\tLogische URL\tHoog\tMakkelijk\tGebruik leesbare paden\n\
        Design\tGebruik van schaduweffecten\tLaag\tGemiddeld\tSubtiele diepte\n";

    #[test]
    fn load_reads_dutch_tab_separated_checklist_in_order() {
        let checklist = load(DUTCH_TSV).expect("valid checklist");
        assert_eq!(checklist.items.len(), 2);
        assert_eq!(checklist.items[0].tip, "Logische URL");
        assert_eq!(checklist.items[0].priority, Priority::High);
        assert_eq!(checklist.items[0].difficulty, Difficulty::Easy);
        assert_eq!(checklist.items[0].source_row, 2);
        assert_eq!(checklist.items[1].category, "Design");
        assert_eq!(checklist.items[1].priority, Priority::Low);
        assert_eq!(checklist.coerced_cells, 0);
        assert_eq!(checklist.sha256.len(), 64);
    }

    #[test]
    fn load_accepts_english_headers_with_odd_case_and_spacing() {
        let raw = " category ; TIP;Priority ;  Difficulty;Explanation\nUX;Favicon;high;easy;Brand icon\n";
        let checklist = load(raw).expect("valid checklist");
        assert_eq!(checklist.items.len(), 1);
        assert_eq!(checklist.items[0].category, "UX");
        assert_eq!(checklist.items[0].explanation, "Brand icon");
    }

    #[test]
    fn load_fails_with_schema_error_when_tip_column_missing() {
        let raw = "Categorie,Prioriteit,Moeilijkheidsgraad,Uitleg\nTechniek,Hoog,Makkelijk,x\n";
        let err = load(raw).expect_err("tip column is required");
        assert_eq!(err, SchemaError::MissingColumns { missing: vec!["Tip"] });
        assert!(err.to_string().contains("Tip"));
    }

    #[test]
    fn load_ignores_utf8_bom() {
        let raw = "\u{feff}Categorie\tTip\tPrioriteit\tMoeilijkheidsgraad\tUitleg\n\
            Techniek\tFavicon\tHoog\tMakkelijk\tMerkicoon\n";
        let checklist = load(raw).expect("bom-prefixed header is accepted");
        assert_eq!(checklist.items.len(), 1);
        assert_eq!(checklist.items[0].category, "Techniek");
        assert_eq!(checklist.items[0].tip, "Favicon");
        assert_eq!(checklist.items[0].source_row, 2);
        assert_eq!(checklist.sha256, crate::util::sha256_hex(raw.as_bytes()));
    }

    #[test]
    fn load_fails_on_empty_source() {
        assert_eq!(load("\n  \n").expect_err("empty"), SchemaError::Empty);
    }

    #[test]
    fn load_skips_rows_without_tip_and_ignores_blank_lines() {
        let raw = "Categorie,Tip,Prioriteit,Moeilijkheidsgraad,Uitleg\n\
            Techniek,,Hoog,Makkelijk,zonder tip\n\
            ,,,,\n\
            \n\
            Techniek,Favicon,Hoog,Makkelijk,x\n";
        let checklist = load(raw).expect("valid checklist");
        assert_eq!(checklist.items.len(), 1);
        assert_eq!(checklist.items[0].tip, "Favicon");
        assert_eq!(checklist.skipped_rows, vec![2]);
    }

    #[test]
    fn load_coerces_unknown_priority_and_difficulty_to_medium() {
        let raw = "Categorie,Tip,Prioriteit,Moeilijkheidsgraad,Uitleg\n\
            Techniek,Favicon,urgent!!,?,x\n";
        let checklist = load(raw).expect("malformed cells must not abort");
        assert_eq!(checklist.items[0].priority, Priority::Medium);
        assert_eq!(checklist.items[0].difficulty, Difficulty::Medium);
        assert_eq!(checklist.coerced_cells, 2);
    }

    #[test]
    fn load_handles_quoted_fields_with_delimiters_and_newlines() {
        let raw = "Categorie,Tip,Prioriteit,Moeilijkheidsgraad,Uitleg\r\n\
            Copy,\"Duidelijke berichten, in de hero\",Hoog,Moeilijk,\"Regel een\nregel \"\"twee\"\"\"\r\n\
            Techniek,Favicon,Laag,Makkelijk,x\r\n";
        let checklist = load(raw).expect("valid checklist");
        assert_eq!(checklist.items.len(), 2);
        assert_eq!(checklist.items[0].tip, "Duidelijke berichten, in de hero");
        assert_eq!(checklist.items[0].explanation, "Regel een\nregel \"twee\"");
        assert_eq!(checklist.items[1].source_row, 4);
    }

    #[test]
    fn load_reports_unterminated_quote() {
        let raw = "Categorie,Tip,Prioriteit,Moeilijkheidsgraad,Uitleg\nA,\"open,Hoog,Laag,x\n";
        assert_eq!(
            load(raw).expect_err("unterminated"),
            SchemaError::UnterminatedQuote { line: 2 }
        );
    }

    #[test]
    fn load_path_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(DUTCH_TSV.as_bytes()).expect("write");
        let checklist = load_path(file.path()).expect("valid checklist");
        assert_eq!(checklist.items.len(), 2);
    }

    #[test]
    fn bundled_default_checklist_loads_cleanly() {
        let checklist = load_default().expect("bundled checklist");
        assert!(checklist.items.len() >= 10);
        assert!(checklist.skipped_rows.is_empty());
        assert_eq!(checklist.coerced_cells, 0);
    }
}
