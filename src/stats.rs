use crate::{Result, Table, Value};
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedSeries<T> {
    pub column: String,
    pub entries: Vec<(Value, T)>,
}

pub fn count(table: &Table) -> usize {
    table.row_count()
}

pub fn mean(table: &Table, column: &str) -> Result<Option<f64>> {
    let values: Vec<f64> = table
        .column_values(column)?
        .filter_map(Value::as_number)
        .collect();
    Ok(mean_of(&values))
}

fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

/// Most frequent non-missing value. Ties go to the value seen first.
pub fn mode(table: &Table, column: &str) -> Result<Option<Value>> {
    mode_with(table, column, Value::clone)
}

pub fn mode_with(
    table: &Table,
    column: &str,
    key: impl Fn(&Value) -> Value,
) -> Result<Option<Value>> {
    // value -> (count, first row index)
    let mut counts: HashMap<Value, (usize, usize)> = HashMap::new();
    for (idx, cell) in table.column_values(column)?.enumerate() {
        let val = key(cell);
        if val.is_missing() {
            continue;
        }
        counts.entry(val).or_insert((0, idx)).0 += 1;
    }

    Ok(counts
        .into_iter()
        .max_by(|(_, (ca, fa)), (_, (cb, fb))| ca.cmp(cb).then(fb.cmp(fa)))
        .map(|(val, _)| val))
}

fn group_rows(table: &Table, column: &str) -> Result<Vec<(Value, Vec<usize>)>> {
    let mut slots: HashMap<&Value, usize> = HashMap::new();
    let mut groups: Vec<(Value, Vec<usize>)> = Vec::new();
    for (idx, cell) in table.column_values(column)?.enumerate() {
        let slot = *slots.entry(cell).or_insert_with(|| {
            groups.push((cell.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(idx);
    }
    Ok(groups)
}

/// Mean of `value_column` per distinct `group_column` value, keys ascending.
/// A group without any numeric value has a `None` mean.
pub fn group_mean(
    table: &Table,
    group_column: &str,
    value_column: &str,
) -> Result<GroupedSeries<Option<f64>>> {
    let value_idx = table.require_column(value_column)?;
    let mut entries: Vec<(Value, Option<f64>)> = group_rows(table, group_column)?
        .into_iter()
        .map(|(key, rows)| {
            let values: Vec<f64> = rows
                .iter()
                .filter_map(|&r| table.rows()[r][value_idx].as_number())
                .collect();
            (key, mean_of(&values))
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(GroupedSeries {
        column: group_column.to_string(),
        entries,
    })
}

/// Row count per distinct value. With `sort_by_key` the keys ascend;
/// otherwise the most frequent come first and ties keep first-encounter order.
pub fn group_count(
    table: &Table,
    column: &str,
    sort_by_key: bool,
) -> Result<GroupedSeries<usize>> {
    let mut entries: Vec<(Value, usize)> = group_rows(table, column)?
        .into_iter()
        .map(|(key, rows)| (key, rows.len()))
        .collect();
    if sort_by_key {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
    } else {
        entries.sort_by(|a, b| b.1.cmp(&a.1));
    }

    Ok(GroupedSeries {
        column: column.to_string(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DashError;
    use pretty_assertions::assert_eq;

    fn table(fuel: &[Option<&str>], price: &[Option<f64>]) -> Table {
        Table::new(
            vec!["Fuel_Type".into(), "Price".into()],
            fuel.iter()
                .zip(price)
                .map(|(f, p)| {
                    vec![
                        f.map_or(Value::Missing, Value::text),
                        p.map_or(Value::Missing, Value::Number),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_mean_ignores_missing() {
        let t = table(
            &[Some("a"), Some("b"), Some("c")],
            &[Some(10000.0), Some(20000.0), None],
        );
        assert_eq!(mean(&t, "Price").unwrap(), Some(15000.0));
    }

    #[test]
    fn test_mean_and_mode_undefined_on_empty() {
        let t = table(&[], &[]);
        assert_eq!(count(&t), 0);
        assert_eq!(mean(&t, "Price").unwrap(), None);
        assert_eq!(mode(&t, "Fuel_Type").unwrap(), None);

        let all_missing = table(&[None, None], &[None, None]);
        assert_eq!(mean(&all_missing, "Price").unwrap(), None);
        assert_eq!(mode(&all_missing, "Fuel_Type").unwrap(), None);
    }

    #[test]
    fn test_mode_most_frequent() {
        let t = table(
            &[Some("Petrol"), Some("Diesel"), Some("Petrol")],
            &[None, None, None],
        );
        assert_eq!(mode(&t, "Fuel_Type").unwrap(), Some(Value::text("Petrol")));
    }

    #[test]
    fn test_mode_tie_goes_to_first_seen() {
        let t = table(
            &[None, Some("Diesel"), Some("Petrol"), Some("Petrol"), Some("Diesel")],
            &[None; 5],
        );
        assert_eq!(mode(&t, "Fuel_Type").unwrap(), Some(Value::text("Diesel")));
    }

    #[test]
    fn test_mode_with_key() {
        let t = Table::new(
            vec!["Name".into()],
            ["Honda City", "Maruti Swift", "Maruti Alto"]
                .iter()
                .map(|n| vec![Value::text(*n)])
                .collect(),
        )
        .unwrap();
        let brand = mode_with(&t, "Name", crate::first_token).unwrap();
        assert_eq!(brand, Some(Value::text("Maruti")));
    }

    #[test]
    fn test_unknown_column() {
        let t = table(&[], &[]);
        assert!(matches!(mean(&t, "Year"), Err(DashError::UnknownColumn(_))));
        assert!(matches!(
            group_mean(&t, "Fuel_Type", "Year"),
            Err(DashError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_group_mean_sorted_by_key_with_missing_group() {
        let t = table(
            &[Some("Petrol"), None, Some("Diesel"), Some("Petrol"), Some("CNG")],
            &[Some(4.0), Some(9.0), Some(8.0), Some(6.0), None],
        );
        let series = group_mean(&t, "Fuel_Type", "Price").unwrap();
        assert_eq!(series.column, "Fuel_Type");
        assert_eq!(
            series.entries,
            vec![
                (Value::text("CNG"), None),
                (Value::text("Diesel"), Some(8.0)),
                (Value::text("Petrol"), Some(5.0)),
                (Value::Missing, Some(9.0)),
            ]
        );
    }

    #[test]
    fn test_group_count_by_frequency_then_first_seen() {
        let t = table(
            &[Some("Manual"), Some("Auto"), Some("CVT"), Some("Auto"), Some("CVT"), Some("Manual"), Some("Auto")],
            &[None; 7],
        );
        let series = group_count(&t, "Fuel_Type", false).unwrap();
        assert_eq!(
            series.entries,
            vec![
                (Value::text("Auto"), 3),
                (Value::text("Manual"), 2),
                (Value::text("CVT"), 2),
            ]
        );
    }

    #[test]
    fn test_group_count_sorted_numeric_keys() {
        let t = Table::new(
            vec!["Year".into()],
            [2015.0, 2011.0, 2015.0, 2019.0]
                .iter()
                .map(|y| vec![Value::Number(*y)])
                .collect(),
        )
        .unwrap();
        let series = group_count(&t, "Year", true).unwrap();
        assert_eq!(
            series.entries,
            vec![
                (Value::Number(2011.0), 1),
                (Value::Number(2015.0), 2),
                (Value::Number(2019.0), 1),
            ]
        );
    }
}
