use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::names::parse_names;
use super::sections::split_sections;
use super::tokens::{tokenize, Token, TokenKind};
use crate::error::{Anomaly, Diagnostics};
use crate::model::{Count, MotionKind, Tallies, Tally, VoteRecord, VoteType, UNANIMOUS_MARKER};
use crate::settings::Settings;

static NON_VOTING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Non\s+Voting:\s*\d+\s*-\s*([^;\n]+)").unwrap());

/// A bounded span of minutes text holding one motion, plus what the
/// extractor already knows about it.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionBlock {
    pub item_number: String,
    pub legistar_number: String,
    pub text: String,
    /// Item description text found ahead of the motion.
    pub lead: String,
    pub page_number: usize,
    pub motion_number: u32,
    pub motion_title: String,
    pub motion_kind: MotionKind,
    pub unanimous: bool,
    pub mover: Option<String>,
    pub seconder: Option<String>,
}

/// Turn a motion block into a record. `None` when a non-unanimous block
/// carries no tally at all.
pub fn build_record(block: &MotionBlock, settings: &Settings, diag: &mut Diagnostics) -> Option<VoteRecord> {
    let tallies = if block.unanimous {
        let mut t = Tallies::default();
        t[VoteType::Ayes] = Tally {
            count: Count::Unanimous,
            names: vec![UNANIMOUS_MARKER.to_string()],
        };
        t
    } else {
        let t = read_tallies(block, settings, diag);
        if t.is_empty() {
            debug!(
                "item {} motion {}: no vote information, skipped",
                block.item_number, block.motion_number
            );
            return None;
        }
        t
    };

    Some(VoteRecord {
        item_number: block.item_number.clone(),
        motion_number: block.motion_number,
        motion_title: block.motion_title.trim().to_string(),
        motion_kind: block.motion_kind,
        legistar_number: block.legistar_number.clone(),
        legistar_link: settings.link_for(&block.legistar_number),
        description: describe(&block.lead, &block.text, &block.motion_title),
        mover: block.mover.clone(),
        seconder: block.seconder.clone(),
        is_unanimous: block.unanimous,
        tallies,
        page_number: block.page_number,
    })
}

fn read_tallies(block: &MotionBlock, settings: &Settings, diag: &mut Diagnostics) -> Tallies {
    let tokens = tokenize(&block.text);
    let mut text = block.text.as_str();

    if let Some(end) = vote_section_end(&tokens) {
        let next_break = tokens
            .iter()
            .find(|t| t.start >= end && t.kind == TokenKind::SectionBreak);
        if let Some(brk) = next_break {
            text = &text[..brk.start];
        }
    }

    if text.len() > settings.max_block_chars {
        text = &text[..floor_char_boundary(text, settings.max_block_chars)];
        diag.report(Anomaly::BlockTruncated {
            item: block.item_number.clone(),
            motion: block.motion_number,
            limit: settings.max_block_chars,
        });
    }

    let (sections, capped) = split_sections(text, &tokens, settings.max_sections);
    if capped {
        diag.report(Anomaly::SectionLimit {
            item: block.item_number.clone(),
            motion: block.motion_number,
            limit: settings.max_sections,
        });
    }

    let mut tallies = Tallies::default();
    for section in sections {
        let tally = &mut tallies[section.vote];
        tally.count = Count::Declared(section.count);
        tally.names.extend(parse_names(section.names_text));
    }

    // Truncation can leave a declared non-voting count with its names cut off.
    let non_voting = &tallies[VoteType::NonVoting];
    if matches!(non_voting.count, Count::Declared(n) if n > 0) && non_voting.names.is_empty() {
        if let Some(caps) = NON_VOTING_RE.captures(&block.text) {
            let names = parse_names(&caps[1]);
            debug!("item {}: {} non-voting names on second pass", block.item_number, names.len());
            tallies[VoteType::NonVoting].names = names;
        }
    }

    tallies
}

/// Where the vote sections stop: the first enactment label after the first
/// vote header, or failing that the first page footer after it.
fn vote_section_end(tokens: &[Token]) -> Option<usize> {
    let first = tokens.iter().find(|t| t.is_vote_label())?;
    let after = |kind: TokenKind| {
        tokens
            .iter()
            .find(|t| t.start >= first.end && t.kind == kind)
            .map(|t| t.start)
    };
    after(TokenKind::Enactment).or_else(|| after(TokenKind::PageFooter))
}

fn describe(lead: &str, text: &str, title: &str) -> String {
    let before = match text.find(title) {
        Some(i) if !title.is_empty() => text[..i].trim(),
        _ => "",
    };
    [lead.trim(), before]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn floor_char_boundary(text: &str, max: usize) -> usize {
    let mut cut = max.min(text.len());
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}
