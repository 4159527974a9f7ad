use crate::types::parse_number;
use crate::{DashError, Result, Table, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionPattern {
    Integer,
    Decimal,
    /// A regex; its first capture group is used when present, otherwise the
    /// whole match.
    Custom(String),
}

impl ExtractionPattern {
    fn as_regex(&self) -> &str {
        match self {
            ExtractionPattern::Integer => r"\d+",
            ExtractionPattern::Decimal => r"\d+(?:\.\d+)?",
            ExtractionPattern::Custom(re) => re,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub column: String,
    pub pattern: ExtractionPattern,
}

impl ExtractionRule {
    pub fn new(column: impl Into<String>, pattern: ExtractionPattern) -> Self {
        ExtractionRule {
            column: column.into(),
            pattern,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeRules {
    pub anchor_column: String,
    pub extraction_rules: Vec<ExtractionRule>,
}

pub fn normalize(raw: &Table, rules: &NormalizeRules) -> Result<Table> {
    let anchor_idx = raw
        .column_index(&rules.anchor_column)
        .ok_or_else(|| DashError::Schema(rules.anchor_column.clone()))?;

    let mut extractors = Vec::with_capacity(rules.extraction_rules.len());
    for rule in &rules.extraction_rules {
        let Some(col_idx) = raw.column_index(&rule.column) else {
            warn!("Extraction column '{}' not found, skipping", rule.column);
            continue;
        };
        let re = Regex::new(rule.pattern.as_regex()).map_err(|source| {
            DashError::InvalidPattern {
                column: rule.column.clone(),
                source,
            }
        })?;
        extractors.push((col_idx, re));
    }

    let unique = dedupe(raw.rows().iter());
    let duplicates = raw.row_count() - unique.len();
    if duplicates > 0 {
        debug!("Removed {} duplicate rows", duplicates);
    }

    let coerced: Vec<Vec<Value>> = unique
        .into_iter()
        .map(|row| {
            let mut row = row.clone();
            for (col_idx, re) in &extractors {
                row[*col_idx] = extract_number(re, &row[*col_idx]);
            }
            row[anchor_idx] = coerce_number(&row[anchor_idx]);
            row
        })
        .filter(|row| !row[anchor_idx].is_missing())
        .collect();

    // Distinct raw text can collapse to the same number.
    let rows: Vec<Vec<Value>> = dedupe(coerced.iter()).into_iter().cloned().collect();

    debug!(
        "Normalized {} rows into {} (anchor '{}')",
        raw.row_count(),
        rows.len(),
        rules.anchor_column
    );
    Ok(raw.with_rows(rows))
}

fn dedupe<'a>(rows: impl Iterator<Item = &'a Vec<Value>>) -> Vec<&'a Vec<Value>> {
    let mut seen: HashSet<&Vec<Value>> = HashSet::new();
    rows.filter(|row| seen.insert(*row)).collect()
}

fn extract_number(re: &Regex, value: &Value) -> Value {
    match value {
        Value::Text(text) => re
            .captures(text)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
            .and_then(|m| parse_number(m.as_str()))
            .map_or(Value::Missing, Value::Number),
        other => other.clone(),
    }
}

fn coerce_number(value: &Value) -> Value {
    match value {
        Value::Text(text) => parse_number(text).map_or(Value::Missing, Value::Number),
        other => other.clone(),
    }
}
