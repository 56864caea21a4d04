//! Tabular ("approved") minutes: motion headers followed directly by
//! labeled vote sections.
//!
//! The scan is a fold over pages. [`step`] takes the current [`ScanState`]
//! and one page and returns the next state plus any finished records. The
//! only thing carried between pages is a single [`PendingVote`]: a motion
//! whose "Ayes:" list ran off the bottom of a page.

use tracing::debug;

use super::builder::{build_record, MotionBlock};
use super::tokens::{has_page_footer, header_kind, mentions, tokenize, within, Token, TokenKind, PAGE_TRIGGERS};
use crate::error::{Anomaly, Diagnostics};
use crate::model::{MotionKind, VoteRecord, VoteType};
use crate::pages::PageText;
use crate::settings::Settings;

/// An incomplete vote block waiting for the next page.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingVote {
    block: MotionBlock,
}

impl PendingVote {
    pub fn item_number(&self) -> &str {
        &self.block.item_number
    }

    pub fn motion_number(&self) -> u32 {
        self.block.motion_number
    }

    pub fn text(&self) -> &str {
        &self.block.text
    }

    fn append(&mut self, text: &str) {
        self.block.text.push('\n');
        self.block.text.push_str(text);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Scanning,
    AwaitingContinuation(PendingVote),
}

/// What one page hands to the next: the scan phase, plus the last motion
/// number used by the most recent item so a repeated header keeps counting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanState {
    pub phase: Phase,
    last_motion: Option<(String, u32)>,
}

impl ScanState {
    pub fn pending(&self) -> Option<&PendingVote> {
        match &self.phase {
            Phase::Scanning => None,
            Phase::AwaitingContinuation(p) => Some(p),
        }
    }

    fn take_pending(&mut self) -> Option<PendingVote> {
        match std::mem::take(&mut self.phase) {
            Phase::Scanning => None,
            Phase::AwaitingContinuation(p) => Some(p),
        }
    }

    fn next_motion(&self, item: &str) -> u32 {
        match &self.last_motion {
            Some((last, n)) if last == item => n + 1,
            _ => 1,
        }
    }
}

pub fn extract_tabular(pages: &[PageText], settings: &Settings, diag: &mut Diagnostics) -> Vec<VoteRecord> {
    let mut state = ScanState::default();
    let mut records = Vec::new();

    for page in pages {
        let (next, emitted) = step(state, page, settings, diag);
        records.extend(emitted);
        state = next;
    }

    if let Some(pending) = state.take_pending() {
        if settings.flush_pending_at_end {
            debug!("item {}: flushing pending vote at end of document", pending.item_number());
            records.extend(build_record(&pending.block, settings, diag));
        } else {
            diag.report(Anomaly::PendingUnresolved {
                item: pending.block.item_number,
                motion: pending.block.motion_number,
            });
        }
    }

    records
}

/// Process one page: `(state, page) -> (state, records)`.
pub fn step(
    mut state: ScanState,
    page: &PageText,
    settings: &Settings,
    diag: &mut Diagnostics,
) -> (ScanState, Vec<VoteRecord>) {
    let text = page.text.as_str();
    if text.trim().is_empty() || !PAGE_TRIGGERS.iter().any(|t| text.contains(t)) {
        debug!("page {}: no motion triggers, skipped", page.number);
        return (state, Vec::new());
    }

    let tokens = tokenize(text);
    let headers: Vec<&Token> = tokens
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::ItemHeader { .. }))
        .collect();

    let mut pending = state.take_pending();
    let mut records = Vec::new();

    for (i, header) in headers.iter().enumerate() {
        let TokenKind::ItemHeader { item, legistar } = &header.kind else {
            continue;
        };
        let span_end = headers.get(i + 1).map_or(text.len(), |next| next.start);
        let scan = ItemScan {
            item,
            legistar,
            text,
            tokens: &tokens,
            page: page.number,
            settings,
        };

        let mut from = header.end;
        let mut first_motion = state.next_motion(item);

        if i == 0 {
            if let Some(mut p) = pending.take() {
                if p.item_number() != item.as_str() {
                    pending = Some(p);
                } else {
                    let next_motion = within(&tokens, header.end, span_end).find(|t| t.is_motion());
                    let cont_end = next_motion.map_or(span_end, |t| t.start);
                    let continuation = &text[header.end..cont_end];
                    p.append(continuation);

                    if continuation_complete(p.text(), continuation, next_motion.is_some()) {
                        debug!("item {}: pending vote completed on page {}", item, page.number);
                        let mut block = p.block;
                        block.page_number = page.number;
                        records.extend(build_record(&block, settings, diag));
                        first_motion = block.motion_number + 1;
                        from = cont_end;
                    } else {
                        debug!("item {}: pending vote still open after page {}", item, page.number);
                        pending = Some(p);
                        continue;
                    }
                }
            }
        }

        let (emitted, incomplete, next_number) = scan.motions(from, span_end, first_motion, diag);
        state.last_motion = Some((item.clone(), next_number - 1));
        records.extend(emitted);
        if let Some(new) = incomplete {
            if let Some(old) = pending.replace(new) {
                diag.report(Anomaly::PendingReplaced {
                    item: old.block.item_number,
                    motion: old.block.motion_number,
                });
            }
        }
    }

    state.phase = match pending {
        Some(p) => Phase::AwaitingContinuation(p),
        None => Phase::Scanning,
    };
    (state, records)
}

/// The merged block has its "Ayes:" section plus either the page footer or a
/// new motion header after it, or it names all four closing labels.
fn continuation_complete(merged: &str, continuation: &str, motion_follows: bool) -> bool {
    let closed = mentions(merged, VoteType::Ayes) && (has_page_footer(continuation) || motion_follows);
    let all_four = [VoteType::Ayes, VoteType::Noes, VoteType::Excused, VoteType::NonVoting]
        .into_iter()
        .all(|v| mentions(merged, v));
    closed || all_four
}

/// A motion block is finished when nothing more can follow its "Ayes:" list.
fn motion_complete(text: &str, unanimous: bool) -> bool {
    !mentions(text, VoteType::Ayes)
        || mentions(text, VoteType::Noes)
        || mentions(text, VoteType::NonVoting)
        || unanimous
        || text.to_lowercase().contains("voice vote")
}

/// A motion header after collapsing adjacent duplicates.
#[derive(Debug, Clone, PartialEq)]
struct MotionHeader {
    start: usize,
    end: usize,
    title: String,
    kind: MotionKind,
    unanimous: bool,
}

struct ItemScan<'a> {
    item: &'a str,
    legistar: &'a str,
    text: &'a str,
    tokens: &'a [Token],
    page: usize,
    settings: &'a Settings,
}

impl ItemScan<'_> {
    /// Finalize every motion in `from..end`. Returns the records and the last
    /// incomplete block, if any.
    fn motions(
        &self,
        from: usize,
        end: usize,
        first_number: u32,
        diag: &mut Diagnostics,
    ) -> (Vec<VoteRecord>, Option<PendingVote>, u32) {
        let headers = self.collapsed_headers(from, end);
        let lead = headers
            .first()
            .map_or("", |h| &self.text[from..h.start])
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let mut records = Vec::new();
        let mut pending: Option<PendingVote> = None;
        let mut number = first_number;

        for (i, header) in headers.iter().enumerate() {
            if i >= self.settings.max_motions_per_item {
                diag.report(Anomaly::MotionLimit {
                    item: self.item.to_string(),
                    limit: self.settings.max_motions_per_item,
                });
                break;
            }

            let block_end = headers.get(i + 1).map_or(end, |next| next.start);
            let block_end = self.trim_after_votes(header.start, block_end);

            let block = MotionBlock {
                item_number: self.item.to_string(),
                legistar_number: self.legistar.to_string(),
                text: self.text[header.start..block_end].to_string(),
                lead: if i == 0 { lead.clone() } else { String::new() },
                page_number: self.page,
                motion_number: number,
                motion_title: header.title.clone(),
                motion_kind: header.kind,
                unanimous: header.unanimous,
                mover: None,
                seconder: None,
            };
            number += 1;

            if motion_complete(&block.text, block.unanimous) {
                records.extend(build_record(&block, self.settings, diag));
            } else {
                debug!(
                    "item {} motion {}: vote runs past page {}",
                    self.item, block.motion_number, self.page
                );
                if let Some(old) = pending.replace(PendingVote { block }) {
                    diag.report(Anomaly::PendingReplaced {
                        item: old.block.item_number,
                        motion: old.block.motion_number,
                    });
                }
            }
        }

        (records, pending, number)
    }

    /// Motion headers in `from..end`, with headers that only repeat the
    /// previous one (nothing but whitespace between, one title containing the
    /// other) folded into it.
    fn collapsed_headers(&self, from: usize, end: usize) -> Vec<MotionHeader> {
        let mut out: Vec<MotionHeader> = Vec::new();
        for token in within(self.tokens, from, end) {
            let TokenKind::Motion { title, kind, unanimous } = &token.kind else {
                continue;
            };
            if let Some(prev) = out.last_mut() {
                let gap = self.text.get(prev.end..token.start).unwrap_or("");
                if gap.trim().is_empty() && overlaps(&prev.title, title) {
                    if title.len() > prev.title.len() {
                        prev.title = title.clone();
                        prev.kind = header_kind(title);
                    }
                    prev.unanimous |= *unanimous;
                    prev.end = token.end;
                    continue;
                }
            }
            out.push(MotionHeader {
                start: token.start,
                end: token.end,
                title: title.clone(),
                kind: *kind,
                unanimous: *unanimous,
            });
        }
        out
    }

    /// With a vote label in `start..end`, stop at the first boundary marker
    /// after that label.
    fn trim_after_votes(&self, start: usize, end: usize) -> usize {
        let Some(label) = within(self.tokens, start, end).find(|t| t.is_vote_label()) else {
            return end;
        };
        within(self.tokens, label.end, end)
            .find(|t| t.is_block_boundary() || t.is_motion())
            .map_or(end, |t| t.start)
    }
}

fn overlaps(a: &str, b: &str) -> bool {
    let norm = |s: &str| -> String {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    };
    let (a, b) = (norm(a), norm(b));
    a.contains(&b) || b.contains(&a)
}
