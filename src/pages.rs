//! Per-page text access.
//!
//! Extraction never sees a page failure: [`PageSource::pages`] turns any
//! unreadable page into empty text and records an anomaly.

use std::path::Path;

use lopdf::Document;
use tracing::debug;

use crate::error::{Anomaly, Diagnostics, ExtractError};

const FORM_FEED: char = '\x0c';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number.
    pub number: usize,
    pub text: String,
}

pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Text of the zero-based page `index`.
    fn page_text(&self, index: usize) -> Result<String, ExtractError>;

    fn pages(&self, diag: &mut Diagnostics) -> Vec<PageText> {
        (0..self.page_count())
            .map(|index| {
                let text = match self.page_text(index) {
                    Ok(text) => text,
                    Err(e) => {
                        diag.report(Anomaly::PageUnreadable {
                            page: index + 1,
                            reason: e.to_string(),
                        });
                        String::new()
                    }
                };
                PageText { number: index + 1, text }
            })
            .collect()
    }
}

/// Pages already held as text, e.g. a `pdftotext` dump.
#[derive(Debug, Clone, Default)]
pub struct TextPages {
    pages: Vec<String>,
}

impl TextPages {
    pub fn new(pages: Vec<String>) -> Self {
        TextPages { pages }
    }

    /// Split a dump on form feeds. The empty tail after the final form feed is dropped.
    pub fn from_dump(dump: &str) -> Self {
        let mut pages: Vec<String> = dump.split(FORM_FEED).map(str::to_string).collect();
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }
        TextPages { pages }
    }
}

impl PageSource for TextPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractError> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| ExtractError::PageUnreadable {
                page: index + 1,
                reason: "page out of range".into(),
            })
    }
}

pub struct PdfPages {
    doc: Document,
    numbers: Vec<u32>,
}

impl PdfPages {
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let doc = Document::load(path)?;
        let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        debug!("Opened {} ({} pages)", path.display(), numbers.len());
        Ok(PdfPages { doc, numbers })
    }
}

impl PageSource for PdfPages {
    fn page_count(&self) -> usize {
        self.numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractError> {
        let number = self.numbers.get(index).copied().ok_or_else(|| {
            ExtractError::PageUnreadable {
                page: index + 1,
                reason: "page out of range".into(),
            }
        })?;
        self.doc
            .extract_text(&[number])
            .map_err(|e| ExtractError::PageUnreadable {
                page: index + 1,
                reason: e.to_string(),
            })
    }
}

/// Open a document by extension: `.pdf` through lopdf, anything else as a text dump.
pub fn open_document(path: &Path) -> Result<Box<dyn PageSource>, ExtractError> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        return Ok(Box::new(PdfPages::open(path)?));
    }
    let dump = std::fs::read_to_string(path).map_err(|e| ExtractError::DocumentUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Box::new(TextPages::from_dump(&dump)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flaky;

    impl PageSource for Flaky {
        fn page_count(&self) -> usize {
            3
        }

        fn page_text(&self, index: usize) -> Result<String, ExtractError> {
            if index == 1 {
                Err(ExtractError::PageUnreadable {
                    page: 2,
                    reason: "broken content stream".into(),
                })
            } else {
                Ok(format!("page {}", index + 1))
            }
        }
    }

    #[test]
    fn dump_splits_on_form_feed() {
        let src = TextPages::from_dump("one\x0ctwo\x0c");
        assert_eq!(src.page_count(), 2);
        assert_eq!(src.page_text(1).unwrap(), "two");
    }

    #[test]
    fn single_page_dump() {
        let src = TextPages::from_dump("");
        assert_eq!(src.page_count(), 1);
    }

    #[test]
    fn failed_page_becomes_empty() {
        let mut diag = Diagnostics::new();
        let pages = Flaky.pages(&mut diag);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].text, "page 1");
        assert!(pages[1].text.is_empty());
        assert_eq!(pages[1].number, 2);
        assert_eq!(pages[2].text, "page 3");
        assert_eq!(diag.len(), 1);
        assert!(matches!(diag.anomalies()[0], Anomaly::PageUnreadable { page: 2, .. }));
    }

    #[test]
    fn out_of_range_is_an_error() {
        let src = TextPages::new(vec!["a".into()]);
        assert!(src.page_text(5).is_err());
    }
}
