use crate::{Result, Table, Value};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// Passes when the cell is one of `allowed`. An empty set passes nothing.
    CategoricalInclusion {
        column: String,
        allowed: HashSet<Value>,
    },
    NumericRange { column: String, low: f64, high: f64 },
    PrefixMatch { column: String, prefix: String },
}

impl FilterSpec {
    pub fn column(&self) -> &str {
        match self {
            FilterSpec::CategoricalInclusion { column, .. }
            | FilterSpec::NumericRange { column, .. }
            | FilterSpec::PrefixMatch { column, .. } => column,
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            FilterSpec::CategoricalInclusion { allowed, .. } => allowed.contains(value),
            FilterSpec::NumericRange { low, high, .. } => value
                .as_number()
                .is_some_and(|n| *low <= n && n <= *high),
            FilterSpec::PrefixMatch { prefix, .. } => match first_token(value) {
                Value::Text(word) => word.starts_with(prefix.as_str()),
                _ => false,
            },
        }
    }
}

pub fn first_token(value: &Value) -> Value {
    match value {
        Value::Missing => Value::Missing,
        other => other
            .to_string()
            .split_whitespace()
            .next()
            .map_or(Value::Missing, Value::text),
    }
}

pub fn apply_filters(table: &Table, specs: &[FilterSpec]) -> Result<Table> {
    let resolved = specs
        .iter()
        .map(|spec| Ok((table.require_column(spec.column())?, spec)))
        .collect::<Result<Vec<_>>>()?;

    if resolved.is_empty() {
        return Ok(table.clone());
    }

    let rows: Vec<Vec<Value>> = table
        .rows()
        .iter()
        .filter(|row| resolved.iter().all(|(col_idx, spec)| spec.matches(&row[*col_idx])))
        .cloned()
        .collect();

    debug!(
        "Filters kept {} of {} rows ({} specs)",
        rows.len(),
        table.row_count(),
        specs.len()
    );
    Ok(table.with_rows(rows))
}

pub fn brand_options(table: &Table, column: &str) -> Result<Vec<String>> {
    let brands: BTreeSet<String> = table
        .column_values(column)?
        .filter_map(|v| match first_token(v) {
            Value::Text(word) => Some(word),
            _ => None,
        })
        .collect();
    Ok(brands.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DashError;
    use pretty_assertions::assert_eq;

    fn cars() -> Table {
        let rows = [
            ("Maruti Swift", "Petrol", 4.5),
            ("Honda City", "Diesel", 8.0),
            ("Maruti Alto", "CNG", 2.1),
            ("Mahindra XUV500", "Diesel", 12.0),
            ("MarutiX Concept", "Petrol", 9.9),
        ];
        Table::new(
            vec!["Name".into(), "Fuel_Type".into(), "Price".into()],
            rows.iter()
                .map(|(n, f, p)| vec![Value::text(*n), Value::text(*f), Value::Number(*p)])
                .collect(),
        )
        .unwrap()
    }

    fn names(table: &Table) -> Vec<String> {
        table.rows().iter().map(|r| r[0].to_string()).collect()
    }

    fn fuels(allowed: &[&str]) -> FilterSpec {
        FilterSpec::CategoricalInclusion {
            column: "Fuel_Type".into(),
            allowed: allowed.iter().map(|f| Value::text(*f)).collect(),
        }
    }

    #[test]
    fn test_no_specs_is_identity() {
        let table = cars();
        assert_eq!(apply_filters(&table, &[]).unwrap(), table);
    }

    #[test]
    fn test_empty_allowed_set_yields_nothing() {
        let out = apply_filters(&cars(), &[fuels(&[])]).unwrap();
        assert_eq!(out.row_count(), 0);
        assert_eq!(out.headers(), cars().headers());
    }

    #[test]
    fn test_conjunction_preserves_order() {
        let specs = [
            fuels(&["Petrol", "Diesel"]),
            FilterSpec::NumericRange {
                column: "Price".into(),
                low: 4.5,
                high: 9.9,
            },
        ];
        let out = apply_filters(&cars(), &specs).unwrap();
        assert_eq!(names(&out), ["Maruti Swift", "Honda City", "MarutiX Concept"]);

        let reversed: Vec<FilterSpec> = specs.iter().rev().cloned().collect();
        assert_eq!(apply_filters(&cars(), &reversed).unwrap(), out);
    }

    #[test]
    fn test_prefix_matches_first_word_only() {
        let spec = FilterSpec::PrefixMatch {
            column: "Name".into(),
            prefix: "Maruti".into(),
        };
        let out = apply_filters(&cars(), &[spec]).unwrap();
        assert_eq!(names(&out), ["Maruti Swift", "Maruti Alto", "MarutiX Concept"]);

        let by_model = FilterSpec::PrefixMatch {
            column: "Name".into(),
            prefix: "Swift".into(),
        };
        assert!(apply_filters(&cars(), &[by_model]).unwrap().is_empty());
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        let lower = FilterSpec::PrefixMatch {
            column: "Name".into(),
            prefix: "maruti".into(),
        };
        assert!(apply_filters(&cars(), &[lower]).unwrap().is_empty());
    }

    #[test]
    fn test_range_rejects_missing_and_text() {
        let table = Table::new(
            vec!["Price".into()],
            vec![
                vec![Value::Number(5.0)],
                vec![Value::Missing],
                vec![Value::text("5")],
            ],
        )
        .unwrap();
        let spec = FilterSpec::NumericRange {
            column: "Price".into(),
            low: 5.0,
            high: 5.0,
        };
        assert_eq!(apply_filters(&table, &[spec]).unwrap().row_count(), 1);
    }

    #[test]
    fn test_unknown_column_fails_even_when_empty() {
        let empty = Table::new(vec!["Name".into()], vec![]).unwrap();
        let err = apply_filters(&empty, &[fuels(&["Petrol"])]).unwrap_err();
        assert!(matches!(err, DashError::UnknownColumn(c) if c == "Fuel_Type"));
    }

    #[test]
    fn test_brand_options_sorted_unique() {
        assert_eq!(
            brand_options(&cars(), "Name").unwrap(),
            ["Honda", "Mahindra", "Maruti", "MarutiX"]
        );
    }

    #[test]
    fn test_first_token() {
        assert_eq!(first_token(&Value::text("  Land Rover ")), Value::text("Land"));
        assert_eq!(first_token(&Value::text("   ")), Value::Missing);
        assert_eq!(first_token(&Value::Number(2015.0)), Value::text("2015"));
        assert_eq!(first_token(&Value::Missing), Value::Missing);
    }
}
