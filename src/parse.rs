//! Parsing the vendor tools' line-oriented output.
//!
//! Two shapes appear in practice: `Key: value` blocks from the `info`
//! subcommands, and whitespace-aligned tables from the registry list
//! subcommands. Both are parsed into plain string maps; every probe
//! produces a fresh map.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Normalized attribute map from single-record output.
pub type StateMap = BTreeMap<String, String>;

/// One row of a registry listing, keyed by the lower-cased header.
pub type TableRow = BTreeMap<String, String>;

/// Lower-case a key and collapse spaces and dashes to underscores, so
/// `DSCC non-secure port` becomes `dscc_non_secure_port`.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Parse `Key: value` output. Lines without a colon (banners, blank
/// lines) are silently ignored; the split is on the first colon only.
pub fn parse_info(raw: &str) -> StateMap {
    let mut state = StateMap::new();
    for line in raw.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        state.insert(normalize_key(key), value.trim().to_string());
    }
    state
}

// Separator rows and the "N agent(s) found" trailer.
fn noise_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^--|(instance|agent|server)\(s\)\s(found|display)")
            .expect("noise pattern compiles")
    })
}

/// Parse a registry listing: the first line is the header, split on
/// whitespace into lower-cased column names; separator and trailer
/// lines are dropped; every remaining line is zipped positionally
/// against the header.
///
/// A value containing embedded whitespace will misalign its row — the
/// vendor tables do not quote, and neither do we guess.
pub fn parse_table(raw: &str) -> Vec<TableRow> {
    let mut lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return Vec::new();
    }
    let header = lines.remove(0);
    let keys: Vec<String> = header
        .split_whitespace()
        .map(|column| column.to_lowercase())
        .collect();

    lines
        .into_iter()
        .filter(|line| !noise_line().is_match(line))
        .map(|line| {
            let values: Vec<&str> = line.split_whitespace().collect();
            zip_hash(&keys, &values)
        })
        .collect()
}

/// Pair two sequences positionally. When `values` runs short the
/// trailing keys are absent from the result; extra values are dropped.
pub fn zip_hash<K: AsRef<str>, V: AsRef<str>>(keys: &[K], values: &[V]) -> BTreeMap<String, String> {
    keys.iter()
        .enumerate()
        .filter_map(|(i, key)| {
            values
                .get(i)
                .map(|value| (key.as_ref().to_string(), value.as_ref().to_string()))
        })
        .collect()
}
