//! Flat row shapes for the per-document CSV files and the SQLite store.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Anomaly, Diagnostics, ExtractError};
use crate::model::{MotionKind, VoteRecord, VoteTag, VoteType, ALL_PRESENT, UNANIMOUS_MARKER};

/// One row per motion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub meeting_date: String,
    pub item_number: String,
    pub motion_number: u32,
    pub motion_title: String,
    pub motion_type: MotionKind,
    pub legistar_number: String,
    pub legistar_link: String,
    pub description: String,
    pub is_unanimous: bool,
    pub total_ayes: i64,
    pub total_noes: i64,
    pub total_abstentions: i64,
    pub total_excused: i64,
    pub total_recused: i64,
    pub total_non_voting: i64,
    pub page_number: usize,
}

/// One row per member per motion. A unanimous motion yields a single
/// `ALL_PRESENT` / `UNANIMOUS_AYE` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplodedRow {
    pub date: String,
    pub item_number: String,
    pub motion_number: u32,
    pub motion_type: MotionKind,
    pub legistar_number: String,
    pub member_name: String,
    pub vote_type: VoteTag,
    pub is_unanimous: bool,
}

/// Meeting date from a file stem such as `2025-03-04` or `2025-03-04_approved`.
/// Anything else is reported and the stem itself is used.
pub fn meeting_date(stem: &str, diag: &mut Diagnostics) -> String {
    let token = stem.split(['_', ' ']).next().unwrap_or(stem);
    match NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => {
            diag.report(Anomaly::BadDate {
                token: stem.to_string(),
            });
            stem.to_string()
        }
    }
}

pub fn summarize(date: &str, record: &VoteRecord) -> SummaryRow {
    let total = |vote: VoteType| record.tally(vote).count.value();
    let ayes = record.tally(VoteType::Ayes);
    SummaryRow {
        meeting_date: date.to_string(),
        item_number: record.item_number.clone(),
        motion_number: record.motion_number,
        motion_title: record.motion_title.clone(),
        motion_type: record.motion_kind,
        legistar_number: record.legistar_number.clone(),
        legistar_link: record.legistar_link.clone(),
        description: record.description.trim().to_string(),
        is_unanimous: record.is_unanimous,
        total_ayes: if record.is_unanimous {
            ayes.names.len() as i64
        } else {
            ayes.count.value()
        },
        total_noes: total(VoteType::Noes),
        total_abstentions: total(VoteType::Abstentions),
        total_excused: total(VoteType::Excused),
        total_recused: total(VoteType::Recused),
        total_non_voting: total(VoteType::NonVoting),
        page_number: record.page_number,
    }
}

pub fn explode(date: &str, record: &VoteRecord) -> Vec<ExplodedRow> {
    let row = |member_name: &str, vote_type: VoteTag| ExplodedRow {
        date: date.to_string(),
        item_number: record.item_number.clone(),
        motion_number: record.motion_number,
        motion_type: record.motion_kind,
        legistar_number: record.legistar_number.clone(),
        member_name: member_name.trim().to_string(),
        vote_type,
        is_unanimous: record.is_unanimous,
    };

    if record.is_unanimous {
        return vec![row(ALL_PRESENT, VoteTag::UnanimousAye)];
    }
    record
        .tallies
        .iter()
        .flat_map(|(vote, tally)| {
            tally
                .names
                .iter()
                .filter(|name| name.as_str() != UNANIMOUS_MARKER)
                .map(move |name| (vote, name))
        })
        .map(|(vote, name)| row(name, vote.tag()))
        .collect()
}

/// Write `<stem>_votes_summary.csv` and `<stem>_votes_detailed.csv` into `dir`.
pub fn write_csv(
    dir: &Path,
    stem: &str,
    summary: &[SummaryRow],
    detailed: &[ExplodedRow],
) -> Result<(PathBuf, PathBuf), ExtractError> {
    std::fs::create_dir_all(dir)?;
    let summary_path = dir.join(format!("{}_votes_summary.csv", stem));
    let detailed_path = dir.join(format!("{}_votes_detailed.csv", stem));
    write_rows(&summary_path, summary)?;
    write_rows(&detailed_path, detailed)?;
    Ok((summary_path, detailed_path))
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExtractError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
