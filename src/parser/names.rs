use std::sync::LazyLock;

use regex::Regex;

/// Anything after one of these is not part of the name list.
static STOP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Enactment\s+No:|City\s+of\s+Madison\s+Page|\d{5,6}|REFER\s+ALL|ADJOURN|SWEARING\s+IN|CONVENE|ROLL\s+CALL")
        .unwrap()
});
static AND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*;[\s;]*").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static LABEL_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Ayes|Noes|Abstentions|Recused|Excused|Non\s+Voting):\s*\d*\s*-?\s*").unwrap()
});

const NOT_NAMES: &[&str] = &[
    "city of madison",
    "page",
    "substitute",
    "sponsor",
    "refer",
    "adjourn",
    "swearing",
    "convene",
    "roll call",
];

/// Split a raw run of member names into clean individual names, in source order.
pub fn parse_names(raw: &str) -> Vec<String> {
    let cut = STOP_RE.find(raw).map_or(raw, |m| &raw[..m.start()]);
    let joined = AND_RE.replace_all(cut, ";");
    let separated = SEPARATOR_RE.replace_all(&joined, ";");

    separated.split(';').filter_map(clean_name).collect()
}

fn clean_name(candidate: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(candidate.trim(), " ");
    let unlabeled = LABEL_PREFIX_RE.replace(&collapsed, "");
    let name = unlabeled
        .trim_end_matches(['.', ',', ';'])
        .trim();

    if name.is_empty() {
        return None;
    }
    let lower = name.to_lowercase();
    if NOT_NAMES.iter().any(|kw| lower.contains(kw)) {
        return None;
    }
    Some(name.to_string())
}
