//! Narrative ("unapproved") minutes, where each vote is a sentence:
//! "A motion was made by X, seconded by Y, to ... . The motion passed ...".

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::builder::{build_record, MotionBlock};
use super::tokens::{tokenize, Token, TokenKind};
use crate::error::{Anomaly, Diagnostics};
use crate::model::{MotionKind, VoteRecord};
use crate::pages::PageText;
use crate::settings::Settings;

static SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^A\s+motion\s+was\s+made\s+by\s+(?P<maker>.+?),\s*(?:seconded\s+by\s+(?P<seconder>.+?),\s*)?to\s+(?P<motion>.+?)\.\s+The\s+motion\s+(?P<result>.*)",
    )
    .unwrap()
});
static FOLLOWING_VOTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)following\s+vote").unwrap());

/// Classify a narrative motion from the words of its motion text.
pub fn narrative_kind(motion: &str) -> MotionKind {
    let lower = motion.to_lowercase();
    if lower.contains("adopt") && lower.contains("amendment") {
        MotionKind::Amendment
    } else if lower.contains("adopt") {
        MotionKind::Adopt
    } else if lower.contains("call the question") || lower.contains("call question") {
        MotionKind::CallTheQuestion
    } else if lower.contains("refer") {
        MotionKind::Refer
    } else if lower.contains("adjourn") {
        MotionKind::Adjourn
    } else {
        MotionKind::MainMotion
    }
}

pub fn extract_narrative(pages: &[PageText], settings: &Settings, diag: &mut Diagnostics) -> Vec<VoteRecord> {
    let mut text = String::new();
    let mut offsets = Vec::with_capacity(pages.len());
    for page in pages {
        if !text.is_empty() {
            text.push('\n');
        }
        offsets.push((text.len(), page.number));
        text.push_str(&page.text);
    }
    // (start, end, number) of the page holding `pos`.
    let page_at = |pos: usize| {
        let i = offsets.iter().rposition(|(start, _)| *start <= pos).unwrap_or(0);
        let (start, number) = offsets.get(i).copied().unwrap_or((0, 1));
        let end = offsets.get(i + 1).map_or(text.len(), |(next, _)| *next);
        (start, end, number)
    };

    let tokens = tokenize(&text);
    let mut per_item: HashMap<String, u32> = HashMap::new();
    let mut records = Vec::new();

    for (i, marker) in tokens.iter().enumerate() {
        if marker.kind != TokenKind::Narrative {
            continue;
        }
        let (page_start, page_end, page) = page_at(marker.start);
        let end = tokens[i + 1..]
            .iter()
            .find(|t| {
                t.start > marker.start
                    && matches!(
                        t.kind,
                        TokenKind::Narrative | TokenKind::ItemHeader { .. } | TokenKind::PageFooter
                    )
            })
            .map_or(page_end, |t| t.start.min(page_end));
        let sentence = &text[marker.start..end];
        let Some(caps) = SENTENCE_RE.captures(sentence) else {
            debug!("offset {}: motion sentence did not parse", marker.start);
            continue;
        };

        let (item, legistar, lead) = match item_before(&tokens, page_start, marker.start) {
            Some((header, item, legistar)) => (item, legistar, lead_in(&text, &tokens, header)),
            None => {
                diag.report(Anomaly::Unattributed { page });
                (String::new(), String::new(), String::new())
            }
        };

        let Some(motion) = caps.name("motion") else {
            continue;
        };
        let result = caps.name("result").map_or("", |m| m.as_str());
        let title = squash(motion.as_str());

        let has_labels = tokens[i + 1..]
            .iter()
            .take_while(|t| t.start < end)
            .any(Token::is_vote_label);
        let explicit = has_labels && FOLLOWING_VOTE_RE.is_match(sentence);
        let lower = result.to_lowercase();
        if !explicit && !(lower.contains("unanimously") || lower.contains("voice vote")) {
            debug!("page {}: motion without a recorded tally, treated as unanimous", page);
        }

        let seq = per_item.entry(item.clone()).or_insert(0);
        let block = MotionBlock {
            item_number: item,
            legistar_number: legistar,
            text: text[marker.start + motion.start()..end].to_string(),
            lead,
            page_number: page,
            motion_number: *seq + 1,
            motion_kind: narrative_kind(&title),
            motion_title: title,
            unanimous: !explicit,
            mover: caps.name("maker").map(|m| squash(m.as_str())),
            seconder: caps.name("seconder").map(|m| squash(m.as_str())),
        };
        if let Some(record) = build_record(&block, settings, diag) {
            *seq += 1;
            records.push(record);
        }
    }

    records
}

/// Closest item header on the page starting at `page_start`, strictly before `pos`.
/// A header match may begin with blank lines from the previous page, so its
/// end decides which page it is on.
fn item_before(tokens: &[Token], page_start: usize, pos: usize) -> Option<(&Token, String, String)> {
    tokens
        .iter()
        .rev()
        .filter(|t| t.end > page_start && t.start < pos)
        .find_map(|t| match &t.kind {
            TokenKind::ItemHeader { item, legistar } => Some((t, item.clone(), legistar.clone())),
            _ => None,
        })
}

/// Item text between its header and the first motion sentence or next item.
fn lead_in(text: &str, tokens: &[Token], header: &Token) -> String {
    let end = tokens
        .iter()
        .find(|t| {
            t.start >= header.end
                && matches!(t.kind, TokenKind::Narrative | TokenKind::ItemHeader { .. } | TokenKind::PageFooter)
        })
        .map_or(text.len(), |t| t.start);
    squash(&text[header.end..end])
}

fn squash(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Count, VoteType, UNANIMOUS_MARKER};
    use crate::pages::{PageSource, TextPages};

    fn run(texts: &[&str]) -> (Vec<VoteRecord>, Diagnostics) {
        let pages: Vec<PageText> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| PageText {
                number: i + 1,
                text: t.to_string(),
            })
            .collect();
        let mut diag = Diagnostics::new();
        let records = extract_narrative(&pages, &Settings::default(), &mut diag);
        (records, diag)
    }

    #[test]
    fn voice_vote_sentence() {
        let (records, diag) = run(&[
            "A motion was made by Smith, seconded by Jones, to Adopt the ordinance. The motion passed unanimously by voice vote/other.",
        ]);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.motion_kind, MotionKind::Adopt);
        assert!(r.is_unanimous);
        assert_eq!(r.tally(VoteType::Ayes).names, vec![UNANIMOUS_MARKER]);
        assert_eq!(r.mover.as_deref(), Some("Smith"));
        assert_eq!(r.seconder.as_deref(), Some("Jones"));
        assert_eq!(r.motion_title, "Adopt the ordinance");
        assert_eq!(r.item_number, "");
        assert!(matches!(diag.anomalies(), [Anomaly::Unattributed { page: 1 }]));
    }

    #[test]
    fn attributed_to_nearest_item() {
        let (records, diag) = run(&[
            "5. 81111 Creating Section 3.14 of the General Ordinances.\nA motion was made by Bennett, seconded by Tishler, to Refer to the PLAN COMMISSION. The motion passed by voice vote/other.\n6. 81112 Accepting the report.\nA motion was made by Conklin, seconded by Benford, to Accept. The motion passed by voice vote/other.",
        ]);
        assert!(diag.is_empty());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].item_number, "5");
        assert_eq!(records[0].legistar_number, "81111");
        assert_eq!(records[0].motion_kind, MotionKind::Refer);
        assert_eq!(records[0].description, "Creating Section 3.14 of the General Ordinances.");
        assert_eq!(records[1].item_number, "6");
        assert_eq!(records[1].motion_kind, MotionKind::MainMotion);
        assert_eq!(records[1].motion_number, 1);
    }

    #[test]
    fn explicit_tally_after_sentence() {
        let (records, _) = run(&[
            "7. 82000 Amending the budget.\nA motion was made by Vidaver, seconded by Conklin, to Adopt the amendment. The motion passed by the following vote:\nAyes: 2 - Vidaver; Conklin\nNoes: 1 - Rummel\nCity of Madison Page 4",
        ]);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert!(!r.is_unanimous);
        assert_eq!(r.motion_kind, MotionKind::Amendment);
        assert_eq!(r.tally(VoteType::Ayes).names, vec!["Vidaver", "Conklin"]);
        assert_eq!(r.tally(VoteType::Noes).count, Count::Declared(1));
        assert_eq!(r.tally(VoteType::Noes).names, vec!["Rummel"]);
    }

    #[test]
    fn numbering_counts_records_per_item() {
        let (records, _) = run(&[
            "8. 83000 Item.\nA motion was made by A, seconded by B, to Call the Question. The motion passed by voice vote/other.\nA motion was made by C, seconded by D, to Adopt. The motion passed by voice vote/other.",
            "8. 83000\nA motion was made by E, seconded by F, to Adopt. The motion passed by voice vote/other.",
        ]);
        let seen: Vec<_> = records
            .iter()
            .map(|r| (r.item_number.as_str(), r.motion_number, r.motion_kind, r.page_number))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("8", 1, MotionKind::CallTheQuestion, 1),
                ("8", 2, MotionKind::Adopt, 1),
                ("8", 3, MotionKind::Adopt, 2),
            ]
        );
    }

    #[test]
    fn headers_on_earlier_pages_are_not_used() {
        let (records, diag) = run(&[
            "3. 88103 Amending the budget.\nA motion was made by A, seconded by B, to Adopt. The motion passed by voice vote/other.",
            "ADJOURNMENT\nA motion was made by C, seconded by D, to Adjourn. The motion passed by voice vote/other.",
        ]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].item_number, "3");
        let adjourn = &records[1];
        assert_eq!(adjourn.item_number, "");
        assert_eq!(adjourn.legistar_number, "");
        assert_eq!(adjourn.motion_number, 1);
        assert_eq!(adjourn.page_number, 2);
        assert!(matches!(diag.anomalies(), [Anomaly::Unattributed { page: 2 }]));
    }

    #[test]
    fn header_after_blank_lines_stays_on_its_page() {
        let (records, diag) = run(&[
            "Public comment.\n\n",
            "\n4. 88104 Accepting the report.\nA motion was made by A, seconded by B, to Accept. The motion passed by voice vote/other.",
        ]);
        assert!(diag.is_empty());
        assert_eq!(records[0].item_number, "4");
        assert_eq!(records[0].page_number, 2);
    }

    #[test]
    fn seconder_is_optional() {
        let (records, _) = run(&["1. 80001 X\nA motion was made by Smith, to Adjourn. The motion passed by voice vote/other."]);
        assert_eq!(records[0].mover.as_deref(), Some("Smith"));
        assert_eq!(records[0].seconder, None);
    }

    #[test]
    fn malformed_sentence_is_skipped() {
        let (records, _) = run(&["1. 80001 X\nA motion was made by Smith and nothing else"]);
        assert!(records.is_empty());
    }

    #[test]
    fn kinds_from_keywords() {
        assert_eq!(narrative_kind("Adopt the Following Amendment"), MotionKind::Amendment);
        assert_eq!(narrative_kind("call question"), MotionKind::CallTheQuestion);
        assert_eq!(narrative_kind("Place on file"), MotionKind::MainMotion);
    }

    #[test]
    fn unapproved_fixture() {
        let dump = std::fs::read_to_string("tests/fixtures/unapproved.txt").unwrap();
        let mut diag = Diagnostics::new();
        let pages = TextPages::from_dump(&dump).pages(&mut diag);
        let records = extract_narrative(&pages, &Settings::default(), &mut diag);

        assert_eq!(records.len(), 5);
        assert!(matches!(diag.anomalies(), [Anomaly::Unattributed { page: 3 }]));
        assert_eq!(records[0].legistar_number, "88101");
        assert!(records[0].is_unanimous);

        let refer = &records[2];
        assert_eq!((refer.item_number.as_str(), refer.motion_number), ("3", 1));
        assert_eq!(refer.motion_kind, MotionKind::Refer);
        assert!(refer.is_unanimous);

        let split = &records[3];
        assert_eq!(split.item_number, "3");
        assert_eq!(split.motion_number, 2);
        assert!(!split.is_unanimous);
        assert_eq!(split.tally(VoteType::Ayes).names.len(), 4);
        assert_eq!(split.tally(VoteType::Excused).names, vec!["Harrington-McKinney"]);
        assert_eq!(split.page_number, 2);

        let adjourn = &records[4];
        assert_eq!(adjourn.motion_kind, MotionKind::Adjourn);
        assert_eq!(adjourn.item_number, "");
        assert_eq!(adjourn.motion_number, 1);
        assert_eq!(adjourn.page_number, 3);
    }
}
