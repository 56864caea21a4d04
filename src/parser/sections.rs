use super::tokens::{Token, TokenKind};
use crate::model::VoteType;

/// One "Label: N - names..." run inside a vote block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteSection<'a> {
    pub vote: VoteType,
    pub count: u32,
    pub names_text: &'a str,
}

/// Split `text` at its vote-label headers. `tokens` must come from `text` (or a
/// longer string it is a prefix of). Text ahead of the first header belongs to
/// no section. Returns the sections and whether `limit` cut the list short.
pub fn split_sections<'a>(text: &'a str, tokens: &[Token], limit: usize) -> (Vec<VoteSection<'a>>, bool) {
    let labels: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.is_vote_label() && t.end <= text.len())
        .collect();
    let capped = labels.len() > limit;

    let sections = labels
        .iter()
        .take(limit)
        .enumerate()
        .filter_map(|(i, label)| {
            let TokenKind::VoteLabel { vote, count } = label.kind else {
                return None;
            };
            let end = labels.get(i + 1).map_or(text.len(), |next| next.start);
            Some(VoteSection {
                vote,
                count,
                names_text: &text[label.end..end],
            })
        })
        .collect();

    (sections, capped)
}
