use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::tokens::{tokenize, TokenKind};
use crate::pages::PageSource;

static MOTION_SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)A\s+motion\s+was\s+made\s+by\s+[^,]+?,\s+seconded\s+by\s+\w").unwrap()
});

/// True when the first `sample` pages contain a "A motion was made by X,
/// seconded by Y" sentence with an item header above it on the same page.
/// Unreadable or empty pages are passed over.
pub fn is_narrative(source: &dyn PageSource, sample: usize) -> bool {
    let sample = sample.min(source.page_count());
    for index in 0..sample {
        let text = match source.page_text(index) {
            Ok(text) => text,
            Err(e) => {
                debug!("detect: skipping page {}: {}", index + 1, e);
                continue;
            }
        };
        if text.trim().is_empty() {
            continue;
        }

        let headers: Vec<usize> = tokenize(&text)
            .into_iter()
            .filter(|t| matches!(t.kind, TokenKind::ItemHeader { .. }))
            .map(|t| t.start)
            .collect();
        for m in MOTION_SENTENCE_RE.find_iter(&text) {
            if headers.iter().any(|&start| start < m.start()) {
                debug!("detect: narrative sentence under an item header on page {}", index + 1);
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::pages::TextPages;

    fn pages(texts: &[&str]) -> TextPages {
        TextPages::new(texts.iter().map(|t| t.to_string()).collect())
    }

    const NARRATIVE: &str =
        "3. 81000 Item\nA motion was made by Smith, seconded by Jones, to Adopt. The motion passed by voice vote/other.";

    #[test]
    fn sentence_under_item_is_narrative() {
        assert!(is_narrative(&pages(&[NARRATIVE]), 5));
    }

    #[test]
    fn sentence_without_item_header_is_not() {
        let src = pages(&["A motion was made by Smith, seconded by Jones, to Adopt."]);
        assert!(!is_narrative(&src, 5));
    }

    #[test]
    fn header_must_be_on_the_same_page() {
        let src = pages(&["3. 81000 Item", "A motion was made by Smith, seconded by Jones, to Adopt."]);
        assert!(!is_narrative(&src, 5));
    }

    #[test]
    fn tabular_and_empty_documents() {
        assert!(!is_narrative(&pages(&["1. 12345 Item\nAdopt\nAyes: 1 - Alice"]), 5));
        assert!(!is_narrative(&pages(&[]), 5));
        assert!(!is_narrative(&pages(&["", "  "]), 5));
    }

    #[test]
    fn only_sample_pages_are_read() {
        let src = pages(&["", "", NARRATIVE]);
        assert!(!is_narrative(&src, 2));
        assert!(is_narrative(&src, 3));
    }

    struct Broken;

    impl PageSource for Broken {
        fn page_count(&self) -> usize {
            2
        }

        fn page_text(&self, index: usize) -> Result<String, ExtractError> {
            match index {
                0 => Err(ExtractError::PageUnreadable {
                    page: 1,
                    reason: "bad xref".into(),
                }),
                _ => Ok(NARRATIVE.to_string()),
            }
        }
    }

    #[test]
    fn failing_page_is_skipped() {
        assert!(is_narrative(&Broken, 5));
    }

    #[test]
    fn deterministic() {
        let src = pages(&[NARRATIVE, "1. 12345 Item\nAdopt"]);
        assert_eq!(is_narrative(&src, 5), is_narrative(&src, 5));
    }
}
