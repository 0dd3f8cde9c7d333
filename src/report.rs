use std::{collections::BTreeMap, fmt};

use regex::Regex;
use tracing::info;

use crate::{
    accumulator::Accumulator,
    error::{Error, Result},
    hash::HashStrategy,
    table::AggregatorTable,
};

/// Rounds half up to one decimal, eg `-0.25` to `-0.2`.
#[inline(always)]
pub fn round1(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}

/// The reported min/mean/max of one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRow {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl ResultRow {
    /// The sum is rounded before it is divided and the mean is rounded again
    /// afterwards; reports are expected to match that exactly.
    pub fn from_accumulator(acc: &Accumulator) -> Self {
        Self {
            min: round1(acc.min),
            mean: round1(round1(acc.sum) / acc.count as f64),
            max: round1(acc.max),
        }
    }
}

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}/{:.1}/{:.1}", self.min, self.mean, self.max)
    }
}

/// Final per-key results, sorted by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    rows: BTreeMap<String, ResultRow>,
}

impl Report {
    pub fn from_accumulators(merged: &BTreeMap<String, Accumulator>) -> Self {
        let rows = merged
            .iter()
            .map(|(name, acc)| (name.clone(), ResultRow::from_accumulator(acc)))
            .collect();
        Self { rows }
    }

    pub fn get(&self, key: &str) -> Option<&ResultRow> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResultRow)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// `{a=min/mean/max, b=min/mean/max}`
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, row)) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={row}")?;
        }
        f.write_str("}")
    }
}

/// Folds per-worker tables into one map keyed by the decoded key.
pub fn merge_tables<H: HashStrategy>(
    tables: impl IntoIterator<Item = AggregatorTable<H>>,
) -> Result<BTreeMap<String, Accumulator>> {
    let mut merged: BTreeMap<String, Accumulator> = BTreeMap::new();
    let mut workers = 0;

    for table in tables {
        workers += 1;
        for (key, acc) in table.iter() {
            let name = std::str::from_utf8(key).map_err(|_| Error::InvalidUtf8 {
                key: String::from_utf8_lossy(key).into_owned(),
            })?;
            match merged.get_mut(name) {
                Some(existing) => existing.merge_with(acc),
                None => {
                    merged.insert(name.to_owned(), *acc);
                }
            }
        }
    }

    info!(workers, keys = merged.len(), "merged");
    return Ok(merged);
}

/// One difference between a produced report and a reference report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    KeyCount { expected: usize, actual: usize },
    Key { expected: String, actual: String },
    Values { key: String, expected: String, actual: String },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::KeyCount { expected, actual } => {
                write!(f, "Incorrect number of keys; expected {expected}, got {actual}!")
            }
            Mismatch::Key { expected, actual } => {
                write!(f, "Key names do not match, expected {expected}, got {actual}!")
            }
            Mismatch::Values { key, expected, actual } => {
                write!(f, "Data does not match for key {key}, expected {expected}, got {actual}!")
            }
        }
    }
}

/// Compares two textual reports entry by entry. Empty means they match.
pub fn compare_reports(actual: &str, expected: &str) -> Vec<Mismatch> {
    let actual = actual.trim();
    let expected = expected.trim();
    if actual == expected {
        return vec![];
    }

    let actual_groups = report_entries(actual);
    let expected_groups = report_entries(expected);

    if actual_groups.len() != expected_groups.len() {
        return vec![Mismatch::KeyCount {
            expected: expected_groups.len(),
            actual: actual_groups.len(),
        }];
    }

    let mut mismatches = vec![];
    for ((a_name, a_data), (e_name, e_data)) in actual_groups.iter().zip(&expected_groups) {
        if a_name != e_name {
            mismatches.push(Mismatch::Key {
                expected: e_name.to_string(),
                actual: a_name.to_string(),
            });
        } else if a_data != e_data {
            mismatches.push(Mismatch::Values {
                key: e_name.to_string(),
                expected: e_data.to_string(),
                actual: a_data.to_string(),
            });
        }
    }
    return mismatches;
}

fn report_entries(report: &str) -> Vec<(&str, &str)> {
    let body = report.strip_prefix('{').unwrap_or(report);
    let body = body.strip_suffix('}').unwrap_or(body);

    // the pattern is a literal and always compiles
    let re = Regex::new(r"(?:^|, )([^=]+)=([^,]+)").expect("valid report pattern");
    re.captures_iter(body)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .collect()
}
