use std::sync::LazyLock;

use regex::Regex;

use crate::model::{MotionKind, VoteType};

static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*(\d+)\.\s+(\d+)").unwrap());
static MOTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bAdopt the Following Amendment\b|\bAdopt(?:\s+Unanimously)?\b|\b(?:to\s+)?Call the Question\b")
        .unwrap()
});
static VOTE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(Ayes|Noes|Abstentions|Recused|Excused|Non\s+Voting):\s*(\d+)\s*-\s*").unwrap()
});
static NARRATIVE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bA\s+motion\s+was\s+made\s+by\b").unwrap());
static FOOTER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)City\s+of\s+Madison\s+Page").unwrap());
static ENACTMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Enactment\s+No:").unwrap());
static CLOSING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bEnd\s+of\b|\bBusiness\s+Presented\b").unwrap());
static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bROLL\s+CALL\b|\bSWEARING\s+IN\b|\bCONVENE\b|\bADJOURN|\bREFER\s+ALL\b").unwrap()
});

/// Substrings that make a page worth scanning in the tabular layout.
pub const PAGE_TRIGGERS: &[&str] = &["Adopt", "Ayes:", "Noes:"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// "8. 78911" at the start of a line: agenda item number and Legistar number.
    ItemHeader { item: String, legistar: String },
    Motion { title: String, kind: MotionKind, unanimous: bool },
    /// "Ayes: 12 -" with its declared count.
    VoteLabel { vote: VoteType, count: u32 },
    /// Start of "A motion was made by ...".
    Narrative,
    PageFooter,
    Enactment,
    /// "End of ..." or "Business Presented".
    Closing,
    /// ROLL CALL, SWEARING IN, CONVENE, ADJOURN, REFER ALL.
    SectionBreak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// Tokens that end whatever vote block precedes them.
    pub fn is_block_boundary(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::ItemHeader { .. } | TokenKind::Narrative | TokenKind::PageFooter | TokenKind::Closing
        )
    }

    pub fn is_motion(&self) -> bool {
        matches!(self.kind, TokenKind::Motion { .. })
    }

    pub fn is_vote_label(&self) -> bool {
        matches!(self.kind, TokenKind::VoteLabel { .. })
    }
}

/// Flatten `text` into position-ordered typed tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for caps in ITEM_RE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        tokens.push(Token {
            kind: TokenKind::ItemHeader {
                item: caps[1].to_string(),
                legistar: caps[2].to_string(),
            },
            start: m.start(),
            end: m.end(),
        });
    }

    for m in MOTION_RE.find_iter(text) {
        let title = m.as_str();
        tokens.push(Token {
            kind: TokenKind::Motion {
                title: title.to_string(),
                kind: header_kind(title),
                unanimous: title.contains("Unanimously"),
            },
            start: m.start(),
            end: m.end(),
        });
    }

    for caps in VOTE_LABEL_RE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        let (Some(vote), Ok(count)) = (VoteType::from_label(&caps[1]), caps[2].parse::<u32>()) else {
            continue;
        };
        tokens.push(Token {
            kind: TokenKind::VoteLabel { vote, count },
            start: m.start(),
            end: m.end(),
        });
    }

    let simple: [(&Regex, TokenKind); 5] = [
        (&*NARRATIVE_RE, TokenKind::Narrative),
        (&*FOOTER_RE, TokenKind::PageFooter),
        (&*ENACTMENT_RE, TokenKind::Enactment),
        (&*CLOSING_RE, TokenKind::Closing),
        (&*BREAK_RE, TokenKind::SectionBreak),
    ];
    for (re, kind) in simple {
        for m in re.find_iter(text) {
            tokens.push(Token {
                kind: kind.clone(),
                start: m.start(),
                end: m.end(),
            });
        }
    }

    tokens.sort_by_key(|t| (t.start, t.end));
    tokens
}

/// Category of a tabular motion header.
pub fn header_kind(title: &str) -> MotionKind {
    if title.contains("Amendment") {
        MotionKind::Amendment
    } else if title.contains("Call the Question") {
        MotionKind::CallTheQuestion
    } else {
        MotionKind::MainMotion
    }
}

/// Whether `text` contains the bare label (e.g. "Noes:"), with or without a count.
pub fn mentions(text: &str, vote: VoteType) -> bool {
    text.contains(&format!("{}:", vote.label()))
}

pub fn mentions_any_label(text: &str) -> bool {
    VoteType::ALL.into_iter().any(|v| mentions(text, v))
}

pub fn has_page_footer(text: &str) -> bool {
    FOOTER_RE.is_match(text)
}

/// Tokens lying entirely inside `start..end`.
pub fn within(tokens: &[Token], start: usize, end: usize) -> impl Iterator<Item = &Token> {
    tokens.iter().filter(move |t| t.start >= start && t.end <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn item_header() {
        let toks = tokenize("8. 78911 Amending the budget");
        assert_eq!(
            toks[0].kind,
            TokenKind::ItemHeader {
                item: "8".into(),
                legistar: "78911".into()
            }
        );
    }

    #[test]
    fn item_header_must_start_line() {
        assert!(tokenize("see section 8. 78911").iter().all(|t| !matches!(t.kind, TokenKind::ItemHeader { .. })));
    }

    #[test]
    fn motion_headers() {
        let toks = kinds("Adopt Unanimously\nAdopt the Following Amendment\nto Call the Question");
        assert_eq!(
            toks,
            vec![
                TokenKind::Motion {
                    title: "Adopt Unanimously".into(),
                    kind: MotionKind::MainMotion,
                    unanimous: true
                },
                TokenKind::Motion {
                    title: "Adopt the Following Amendment".into(),
                    kind: MotionKind::Amendment,
                    unanimous: false
                },
                TokenKind::Motion {
                    title: "to Call the Question".into(),
                    kind: MotionKind::CallTheQuestion,
                    unanimous: false
                },
            ]
        );
    }

    #[test]
    fn adopted_is_not_a_header() {
        assert!(tokenize("The report was Adopted.").iter().all(|t| !t.is_motion()));
    }

    #[test]
    fn vote_labels_carry_counts() {
        let toks = tokenize("Ayes: 3 - Alice; Bob Non Voting: 1 - Carol");
        let labels: Vec<_> = toks
            .iter()
            .filter_map(|t| match t.kind {
                TokenKind::VoteLabel { vote, count } => Some((vote, count)),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec![(VoteType::Ayes, 3), (VoteType::NonVoting, 1)]);
    }

    #[test]
    fn boundaries_in_order() {
        let toks = kinds("Enactment No: RES-25-1 City of Madison Page 4 ROLL CALL");
        assert_eq!(
            toks,
            vec![TokenKind::Enactment, TokenKind::PageFooter, TokenKind::SectionBreak]
        );
    }

    #[test]
    fn narrative_marker_is_case_insensitive() {
        assert_eq!(kinds("a motion was MADE by Smith"), vec![TokenKind::Narrative]);
    }

    #[test]
    fn mentions_bare_labels() {
        assert!(mentions("Noes: none", VoteType::Noes));
        assert!(!mentions("Noes none", VoteType::Noes));
        assert!(mentions_any_label("Excused: 2 - A; B"));
    }
}
