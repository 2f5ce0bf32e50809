//! `relaydesk ingest`: Build the knowledge document from a CSV export.
//!
//! Columns are matched by header name, case-insensitively: `question` (or
//! `q`), `answer` (or `a`), and the optional `url`, `category`,
//! `subcategory`, `extra`. Rows without a question or answer are dropped.
//! Questions are deduplicated by case-insensitive exact text.

use relaydesk_core::knowledge::{FaqEntry, KnowledgeDocument};
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MergeMode {
    /// Keep existing entries and add new unique questions
    Append,
    /// Discard existing entries first
    Replace,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV has no '{0}' column")]
    MissingColumn(&'static str),

    #[error("Existing knowledge document {path} is not valid: {source}")]
    InvalidExisting {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Counts reported after an ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub rows: usize,
    pub dropped: usize,
    pub duplicates: usize,
    pub added: usize,
    pub total: usize,
}

struct Columns {
    question: usize,
    answer: usize,
    url: Option<usize>,
    category: Option<usize>,
    subcategory: Option<usize>,
    extra: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, IngestError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        Ok(Self {
            question: find(&["question", "q"]).ok_or(IngestError::MissingColumn("question"))?,
            answer: find(&["answer", "a"]).ok_or(IngestError::MissingColumn("answer"))?,
            url: find(&["url"]),
            category: find(&["category"]),
            subcategory: find(&["subcategory"]),
            extra: find(&["extra"]),
        })
    }
}

fn field(record: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    let value = record.get(index?)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Prefix `https://` onto URLs that carry no scheme.
pub fn normalize_url(raw: &str) -> Option<String> {
    let url = raw.trim();
    if url.is_empty() {
        return None;
    }
    if url.contains("://") || url.starts_with("mailto:") {
        return Some(url.to_string());
    }
    Some(format!("https://{}", url.trim_start_matches('/')))
}

/// Parse CSV rows into FAQ entries. Returns the valid entries and the
/// number of rows dropped for lacking a question or answer.
pub fn parse_rows<R: Read>(reader: R) -> Result<(Vec<FaqEntry>, usize), IngestError> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::from_headers(csv.headers()?)?;

    let mut entries = Vec::new();
    let mut dropped = 0;
    for record in csv.records() {
        let record = record?;
        let (Some(question), Some(answer)) = (
            field(&record, Some(columns.question)),
            field(&record, Some(columns.answer)),
        ) else {
            dropped += 1;
            continue;
        };

        entries.push(FaqEntry {
            question,
            answer,
            url: field(&record, columns.url).and_then(|u| normalize_url(&u)),
            category: field(&record, columns.category),
            subcategory: field(&record, columns.subcategory),
            extra: field(&record, columns.extra),
        });
    }
    Ok((entries, dropped))
}

fn question_key(entry: &FaqEntry) -> String {
    entry.question.trim().to_lowercase()
}

/// Merge incoming entries into an existing document. The brand is kept in
/// both modes.
pub fn merge(
    existing: Option<KnowledgeDocument>,
    incoming: Vec<FaqEntry>,
    mode: MergeMode,
) -> (KnowledgeDocument, IngestReport) {
    let mut doc = existing.unwrap_or_default();
    if mode == MergeMode::Replace {
        doc.faq.clear();
    }

    let mut seen: HashSet<String> = doc.faq.iter().map(question_key).collect();
    let mut report = IngestReport {
        rows: incoming.len(),
        ..IngestReport::default()
    };

    for entry in incoming {
        if seen.insert(question_key(&entry)) {
            doc.faq.push(entry);
            report.added += 1;
        } else {
            report.duplicates += 1;
        }
    }
    report.total = doc.faq.len();
    (doc, report)
}

fn load_existing(path: &Path) -> Result<Option<KnowledgeDocument>, IngestError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(IngestError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    KnowledgeDocument::from_json(&text)
        .map(Some)
        .map_err(|source| IngestError::InvalidExisting {
            path: path.to_path_buf(),
            source,
        })
}

/// Run a full ingest: read the CSV, merge into `out`, write it back.
pub fn ingest(csv_path: &Path, mode: MergeMode, out: &Path) -> Result<IngestReport, IngestError> {
    let file = std::fs::File::open(csv_path).map_err(|source| IngestError::Read {
        path: csv_path.to_path_buf(),
        source,
    })?;
    let (entries, dropped) = parse_rows(file)?;
    debug!(rows = entries.len() + dropped, dropped, "CSV parsed");

    let existing = match mode {
        MergeMode::Append => load_existing(out)?,
        // Replace still keeps the brand of a readable document
        MergeMode::Replace => load_existing(out).ok().flatten(),
    };
    let (doc, mut report) = merge(existing, entries, mode);
    report.rows += dropped;
    report.dropped = dropped;

    let write_err = |source| IngestError::Write {
        path: out.to_path_buf(),
        source,
    };
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut json = serde_json::to_string_pretty(&doc)?;
    json.push('\n');
    std::fs::write(out, json).map_err(write_err)?;

    info!(
        out = %out.display(),
        added = report.added,
        duplicates = report.duplicates,
        dropped = report.dropped,
        total = report.total,
        "Knowledge document written"
    );
    Ok(report)
}

pub async fn run(csv_path: &Path, mode: MergeMode, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let report = ingest(csv_path, mode, out)?;

    println!("Ingested {}", csv_path.display());
    println!("   Rows read:        {}", report.rows);
    println!("   Dropped (empty):  {}", report.dropped);
    println!("   Duplicates:       {}", report.duplicates);
    println!("   Added:            {}", report.added);
    println!("   Total entries:    {} in {}", report.total, out.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaydesk_core::knowledge::Brand;

    const CSV: &str = "\
Question,Answer,URL,Category
What are your hours?,9 to 5,www.acme.example.test/hours,General
Do you ship abroad?,\"Yes, to the EU\",https://acme.example.test/shipping,Orders
,Missing question,,
Missing answer,,,
WHAT ARE YOUR HOURS?,duplicate,,
";

    #[test]
    fn parses_rows_and_drops_incomplete() {
        let (entries, dropped) = parse_rows(CSV.as_bytes()).unwrap();
        assert_eq!(dropped, 2);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].answer, "Yes, to the EU");
        assert_eq!(entries[1].category.as_deref(), Some("Orders"));
        assert_eq!(
            entries[0].url.as_deref(),
            Some("https://www.acme.example.test/hours")
        );
        assert!(entries[2].url.is_none());
    }

    #[test]
    fn short_headers_accepted() {
        let (entries, _) = parse_rows("q,a\nHi?,Hello\n".as_bytes()).unwrap();
        assert_eq!(entries, vec![FaqEntry::new("Hi?", "Hello")]);
    }

    #[test]
    fn missing_answer_column_is_an_error() {
        let err = parse_rows("question,url\nHi?,x\n".as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn("answer")));
    }

    #[test]
    fn url_normalization() {
        assert_eq!(normalize_url("acme.example.test").unwrap(), "https://acme.example.test");
        assert_eq!(normalize_url("//acme.example.test").unwrap(), "https://acme.example.test");
        assert_eq!(normalize_url("http://acme.example.test").unwrap(), "http://acme.example.test");
        assert_eq!(normalize_url("mailto:a@b.test").unwrap(), "mailto:a@b.test");
        assert!(normalize_url("  ").is_none());
    }

    #[test]
    fn append_keeps_existing_and_skips_duplicates() {
        let existing = KnowledgeDocument {
            brand: Some(Brand { name: "Acme".into() }),
            faq: vec![FaqEntry::new("What are your hours?", "Old answer")],
        };
        let (entries, _) = parse_rows(CSV.as_bytes()).unwrap();
        let (doc, report) = merge(Some(existing), entries, MergeMode::Append);

        assert_eq!(doc.brand_name(), Some("Acme"));
        assert_eq!(doc.faq.len(), 2);
        assert_eq!(doc.faq[0].answer, "Old answer");
        assert_eq!(doc.faq[1].question, "Do you ship abroad?");
        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates, 2);
    }

    #[test]
    fn replace_discards_existing_entries() {
        let existing = KnowledgeDocument {
            brand: Some(Brand { name: "Acme".into() }),
            faq: vec![FaqEntry::new("Old?", "Old")],
        };
        let (entries, _) = parse_rows(CSV.as_bytes()).unwrap();
        let (doc, report) = merge(Some(existing), entries, MergeMode::Replace);

        assert_eq!(doc.brand_name(), Some("Acme"));
        assert_eq!(doc.faq.len(), 2);
        assert!(doc.faq.iter().all(|e| e.question != "Old?"));
        assert_eq!(report.total, 2);
    }

    #[test]
    fn ingest_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("faq.csv");
        std::fs::write(&csv_path, CSV).unwrap();
        let out = dir.path().join("public").join("kb.json");

        let report = ingest(&csv_path, MergeMode::Append, &out).unwrap();
        assert_eq!(report.rows, 5);
        assert_eq!(report.dropped, 2);
        assert_eq!(report.added, 2);

        let doc = KnowledgeDocument::from_json(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(doc.faq.len(), 2);

        // Second run adds nothing new
        let again = ingest(&csv_path, MergeMode::Append, &out).unwrap();
        assert_eq!(again.added, 0);
        assert_eq!(again.total, 2);
    }

    #[test]
    fn append_refuses_to_clobber_invalid_document() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("faq.csv");
        std::fs::write(&csv_path, CSV).unwrap();
        let out = dir.path().join("kb.json");
        std::fs::write(&out, "{ broken").unwrap();

        let err = ingest(&csv_path, MergeMode::Append, &out).unwrap_err();
        assert!(matches!(err, IngestError::InvalidExisting { .. }));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "{ broken");

        ingest(&csv_path, MergeMode::Replace, &out).unwrap();
        assert!(KnowledgeDocument::from_json(&std::fs::read_to_string(&out).unwrap()).is_ok());
    }
}
