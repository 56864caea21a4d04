use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::ExtractError;

pub const DEFAULT_CONFIG_FILE: &str = "votes.toml";

const LEGISTAR_LINK: &str = "https://madison.legistar.com/gateway.aspx?m=l&id=/matter.aspx?key={id}";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pages inspected by the format detector.
    pub sample_pages: usize,
    pub max_motions_per_item: usize,
    pub max_block_chars: usize,
    pub max_sections: usize,
    /// Cross-reference URL; `{id}` is replaced by the Legistar number.
    pub link_template: String,
    pub db_path: PathBuf,
    /// Emit a still-pending vote at end of document instead of dropping it.
    pub flush_pending_at_end: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sample_pages: 5,
            max_motions_per_item: 100,
            max_block_chars: 50_000,
            max_sections: 200,
            link_template: LEGISTAR_LINK.to_string(),
            db_path: PathBuf::from("data/votes.sqlite"),
            flush_pending_at_end: false,
        }
    }
}

impl Settings {
    /// Defaults, then the TOML file (optional unless given explicitly), then `VOTES_*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Settings, ExtractError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("VOTES"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn link_for(&self, legistar_number: &str) -> String {
        self.link_template.replace("{id}", legistar_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.sample_pages, 5);
        assert_eq!(s.max_motions_per_item, 100);
        assert!(!s.flush_pending_at_end);
    }

    #[test]
    fn link_substitutes_id() {
        let s = Settings::default();
        assert_eq!(
            s.link_for("78911"),
            "https://madison.legistar.com/gateway.aspx?m=l&id=/matter.aspx?key=78911"
        );
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("votes-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("votes.toml");
        std::fs::write(&path, "sample_pages = 2\nmax_sections = 10\n").unwrap();
        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.sample_pages, 2);
        assert_eq!(s.max_sections, 10);
        assert_eq!(s.max_block_chars, 50_000);
        std::fs::remove_dir_all(&dir).ok();
    }
}
