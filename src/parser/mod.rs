pub mod builder;
pub mod detect;
pub mod names;
pub mod narrative;
pub mod sections;
pub mod tabular;
pub mod tokens;

use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

use crate::error::{Anomaly, Diagnostics};
use crate::model::VoteRecord;
use crate::pages::PageSource;
use crate::settings::Settings;

/// Layout requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatHint {
    #[default]
    Auto,
    Narrative,
    Tabular,
}

/// Layout actually used for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Narrative,
    Tabular,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Narrative => f.write_str("narrative"),
            Format::Tabular => f.write_str("tabular"),
        }
    }
}

#[derive(Debug)]
pub struct Extraction {
    pub format: Format,
    pub records: Vec<VoteRecord>,
    pub anomalies: Vec<Anomaly>,
}

pub fn detect_format(source: &dyn PageSource, settings: &Settings) -> Format {
    if detect::is_narrative(source, settings.sample_pages) {
        Format::Narrative
    } else {
        Format::Tabular
    }
}

/// Two-stage pipeline: pick the layout, then segment every page into vote records.
pub fn extract(source: &dyn PageSource, hint: FormatHint, settings: &Settings) -> Extraction {
    let format = match hint {
        FormatHint::Auto => detect_format(source, settings),
        FormatHint::Narrative => Format::Narrative,
        FormatHint::Tabular => Format::Tabular,
    };

    let mut diag = Diagnostics::new();
    let pages = source.pages(&mut diag);
    let records = match format {
        Format::Narrative => narrative::extract_narrative(&pages, settings, &mut diag),
        Format::Tabular => tabular::extract_tabular(&pages, settings, &mut diag),
    };
    info!(
        "{} layout: {} records from {} pages ({} anomalies)",
        format,
        records.len(),
        pages.len(),
        diag.len()
    );

    Extraction {
        format,
        records,
        anomalies: diag.into_vec(),
    }
}
