//! One document end to end: open, extract, explode, reconcile, write, persist.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::db;
use crate::error::{Anomaly, Diagnostics};
use crate::export::{self, ExplodedRow, SummaryRow};
use crate::model::VoteRecord;
use crate::pages::open_document;
use crate::parser::{self, Format, FormatHint};
use crate::settings::Settings;
use crate::validate::{self, Reconciliation};

#[derive(Debug, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub meeting_date: String,
    pub format: Format,
    pub records: Vec<VoteRecord>,
    pub reconciliation: Reconciliation,
    pub anomalies: Vec<Anomaly>,
    /// Summary and detail CSV paths; `None` when nothing was extracted.
    pub outputs: Option<(PathBuf, PathBuf)>,
    pub saved: usize,
}

impl DocumentReport {
    pub fn unanimous(&self) -> usize {
        self.records.iter().filter(|r| r.is_unanimous).count()
    }

    pub fn print(&self) {
        if self.records.is_empty() {
            println!("{}: no vote records found", self.path.display());
            return;
        }
        println!(
            "{}: {} vote records ({} unanimous, {} non-unanimous) [{}]",
            self.path.display(),
            self.records.len(),
            self.unanimous(),
            self.records.len() - self.unanimous(),
            self.format,
        );
        if let Some((summary, detailed)) = &self.outputs {
            println!("  summary:  {}", summary.display());
            println!("  detailed: {}", detailed.display());
        }
        if !self.reconciliation.is_clean() {
            println!(
                "  {} motions with name/count mismatches (declared {}, attributed {})",
                self.reconciliation.discrepancies.len(),
                self.reconciliation.declared_total,
                self.reconciliation.attributed_total,
            );
        }
        if !self.anomalies.is_empty() {
            println!("  {} anomalies logged", self.anomalies.len());
        }
    }
}

/// CSVs go to `out_dir`, or next to the document when it is `None`. Rows are
/// saved to `store` when one is given.
pub fn process_document(
    path: &Path,
    hint: FormatHint,
    settings: &Settings,
    out_dir: Option<&Path>,
    store: Option<&Connection>,
) -> Result<DocumentReport> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .with_context(|| format!("no file name in {}", path.display()))?;

    let source = open_document(path).with_context(|| format!("opening {}", path.display()))?;
    let extraction = parser::extract(source.as_ref(), hint, settings);

    let mut diag = Diagnostics::new();
    let meeting_date = export::meeting_date(&stem, &mut diag);
    let mut anomalies = extraction.anomalies;
    anomalies.extend(diag.into_vec());

    let records = extraction.records;
    let mut report = DocumentReport {
        path: path.to_path_buf(),
        meeting_date,
        format: extraction.format,
        records: Vec::new(),
        reconciliation: Reconciliation::default(),
        anomalies,
        outputs: None,
        saved: 0,
    };
    if records.is_empty() {
        info!("{}: no vote records found", path.display());
        return Ok(report);
    }

    let summary: Vec<SummaryRow> = records
        .iter()
        .map(|r| export::summarize(&report.meeting_date, r))
        .collect();
    let per_record: Vec<Vec<ExplodedRow>> = records
        .iter()
        .map(|r| export::explode(&report.meeting_date, r))
        .collect();
    report.reconciliation = validate::reconcile(&records, &per_record);
    let detailed: Vec<ExplodedRow> = per_record.into_iter().flatten().collect();

    let dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    report.outputs = Some(
        export::write_csv(&dir, &stem, &summary, &detailed)
            .with_context(|| format!("writing CSV for {}", path.display()))?,
    );

    if let Some(conn) = store {
        report.saved = db::save_meeting(conn, &report.meeting_date, &summary, &detailed)
            .with_context(|| format!("saving {} to the vote store", report.meeting_date))?;
    }

    info!(
        "{}: {} records, {} member rows",
        path.display(),
        records.len(),
        detailed.len()
    );
    report.records = records;
    Ok(report)
}

pub fn detect_document(path: &Path, settings: &Settings) -> Result<Format> {
    let source = open_document(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(parser::detect_format(source.as_ref(), settings))
}

/// Expand directories into their `.pdf` and `.txt` files, sorted by name.
pub fn collect_documents(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        if !path.is_dir() {
            out.push(path.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = std::fs::read_dir(path)
            .with_context(|| format!("reading {}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf") || e.eq_ignore_ascii_case("txt"))
            })
            .collect();
        found.sort();
        out.extend(found);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("votes-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn approved_document_end_to_end() {
        let dir = scratch("pipeline");
        let doc = dir.join("2025-03-04.txt");
        std::fs::copy("tests/fixtures/approved.txt", &doc).unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let report = process_document(&doc, FormatHint::Auto, &Settings::default(), None, Some(&conn)).unwrap();

        assert_eq!(report.meeting_date, "2025-03-04");
        assert_eq!(report.format, Format::Tabular);
        assert_eq!(report.records.len(), 4);
        assert_eq!(report.saved, 4);
        assert!(report.anomalies.is_empty());
        let (summary, detailed) = report.outputs.clone().unwrap();
        assert_eq!(summary, dir.join("2025-03-04_votes_summary.csv"));
        assert!(detailed.exists());

        let stats = db::get_stats(&conn).unwrap();
        assert_eq!(stats.meetings, 1);
        assert_eq!(stats.motions, 4);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_document_is_not_an_error() {
        let dir = scratch("empty");
        let doc = dir.join("2025-01-07.txt");
        std::fs::write(&doc, "ROLL CALL\x0cPublic comment only\x0c").unwrap();
        let report = process_document(&doc, FormatHint::Auto, &Settings::default(), None, None).unwrap();
        assert!(report.records.is_empty());
        assert!(report.outputs.is_none());
        assert!(!dir.join("2025-01-07_votes_summary.csv").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn undated_stem_is_reported() {
        let dir = scratch("undated");
        let doc = dir.join("minutes.txt");
        std::fs::copy("tests/fixtures/unapproved.txt", &doc).unwrap();
        let out = dir.join("out");
        let report = process_document(&doc, FormatHint::Auto, &Settings::default(), Some(&out), None).unwrap();
        assert_eq!(report.meeting_date, "minutes");
        assert!(report.anomalies.iter().any(|a| matches!(a, Anomaly::BadDate { .. })));
        assert!(out.join("minutes_votes_detailed.csv").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_document_fails_alone() {
        let err = process_document(
            Path::new("/nonexistent/2025-01-01.txt"),
            FormatHint::Auto,
            &Settings::default(),
            None,
            None,
        );
        assert!(err.is_err());
    }

    #[test]
    fn directories_expand_sorted() {
        let dir = scratch("collect");
        for name in ["b.pdf", "a.txt", "notes.md"] {
            std::fs::write(dir.join(name), "").unwrap();
        }
        let found = collect_documents(&[dir.clone()]).unwrap();
        assert_eq!(found, vec![dir.join("a.txt"), dir.join("b.pdf")]);
        std::fs::remove_dir_all(&dir).ok();
    }
}
