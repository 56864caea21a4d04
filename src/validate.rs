//! Reconcile declared counts against the names actually attributed. Nothing
//! here changes a record; mismatches are only reported.

use serde::Serialize;
use tracing::warn;

use crate::export::ExplodedRow;
use crate::model::{VoteRecord, VoteType};

/// Declared vs attributed size of one vote type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub vote: VoteType,
    pub declared: i64,
    pub attributed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub item_number: String,
    pub motion_number: u32,
    pub declared_total: i64,
    pub attributed_total: i64,
    pub breakdown: Vec<TypeCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub discrepancies: Vec<Discrepancy>,
    /// Sums over every non-unanimous record.
    pub declared_total: i64,
    pub attributed_total: i64,
}

impl Reconciliation {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty() && self.declared_total == self.attributed_total
    }
}

/// Compare each non-unanimous record with the exploded rows derived from it.
/// `rows[i]` holds the rows of `records[i]`.
pub fn reconcile(records: &[VoteRecord], rows: &[Vec<ExplodedRow>]) -> Reconciliation {
    let mut out = Reconciliation::default();

    for (record, mine) in records.iter().zip(rows).filter(|(r, _)| !r.is_unanimous) {
        let breakdown: Vec<TypeCount> = VoteType::ALL
            .into_iter()
            .map(|vote| TypeCount {
                vote,
                declared: record.tally(vote).count.value(),
                attributed: mine.iter().filter(|row| row.vote_type == vote.tag()).count() as i64,
            })
            .collect();
        let declared_total = record.tallies.declared_total();
        let attributed_total = mine.len() as i64;
        out.declared_total += declared_total;
        out.attributed_total += attributed_total;

        if breakdown.iter().any(|c| c.declared != c.attributed) {
            let detail: Vec<String> = breakdown
                .iter()
                .filter(|c| c.declared != c.attributed)
                .map(|c| format!("{} {}/{}", c.vote, c.attributed, c.declared))
                .collect();
            warn!(
                "item {} motion {}: names do not match counts ({})",
                record.item_number,
                record.motion_number,
                detail.join(", ")
            );
            out.discrepancies.push(Discrepancy {
                item_number: record.item_number.clone(),
                motion_number: record.motion_number,
                declared_total,
                attributed_total,
                breakdown,
            });
        }
    }

    if out.declared_total != out.attributed_total {
        warn!(
            "document totals differ: {} declared, {} attributed",
            out.declared_total, out.attributed_total
        );
    }
    out
}
