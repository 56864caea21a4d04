use std::path::PathBuf;

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("page {page} could not be read: {reason}")]
    PageUnreadable { page: usize, reason: String },

    #[error("document {} could not be opened: {reason}", path.display())]
    DocumentUnreadable { path: PathBuf, reason: String },

    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Non-fatal irregularities found while scanning a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Anomaly {
    #[error("page {page} yielded no text: {reason}")]
    PageUnreadable { page: usize, reason: String },

    #[error("item {item} motion {motion}: vote block truncated to {limit} chars")]
    BlockTruncated { item: String, motion: u32, limit: usize },

    #[error("item {item} motion {motion}: only the first {limit} vote sections were read")]
    SectionLimit { item: String, motion: u32, limit: usize },

    #[error("item {item}: stopped after {limit} motions")]
    MotionLimit { item: String, limit: usize },

    #[error("item {item} motion {motion}: incomplete vote replaced before it was continued")]
    PendingReplaced { item: String, motion: u32 },

    #[error("item {item} motion {motion}: vote never continued before end of document")]
    PendingUnresolved { item: String, motion: u32 },

    #[error("page {page}: narrative motion has no preceding item header")]
    Unattributed { page: usize },

    #[error("could not read a meeting date from {token:?}")]
    BadDate { token: String },
}

impl Serialize for Anomaly {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Collects anomalies for one document, logging each as it arrives.
#[derive(Debug, Default)]
pub struct Diagnostics {
    anomalies: Vec<Anomaly>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, anomaly: Anomaly) {
        warn!("{}", anomaly);
        self.anomalies.push(anomaly);
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn len(&self) -> usize {
        self.anomalies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    pub fn into_vec(self) -> Vec<Anomaly> {
        self.anomalies
    }
}
