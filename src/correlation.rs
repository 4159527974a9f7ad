use crate::types::ColumnType;
use crate::{DashError, Result, Table};
use serde::Serialize;
use statrs::statistics::Statistics;

/// `None` marks an undefined coefficient: fewer than two rows where both
/// columns hold numbers, or zero variance on either side. The diagonal is
/// `Some(1.0)` for any column with at least two values that vary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    columns: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Vec<Option<f64>>] {
        &self.values
    }

    pub fn get(&self, a: &str, b: &str) -> Result<Option<f64>> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        Ok(self.values[i][j])
    }

    pub fn rounded(&self, decimals: i32) -> CorrelationMatrix {
        let scale = 10f64.powi(decimals);
        CorrelationMatrix {
            columns: self.columns.clone(),
            values: self
                .values
                .iter()
                .map(|row| row.iter().map(|v| v.map(|r| (r * scale).round() / scale)).collect())
                .collect(),
        }
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DashError::UnknownColumn(name.to_string()))
    }
}

pub fn correlate(table: &Table) -> CorrelationMatrix {
    let numeric: Vec<usize> = (0..table.headers().len())
        .filter(|&col_idx| table.column_type(col_idx) == ColumnType::Numeric)
        .collect();
    let n = numeric.len();

    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = diagonal(table, numeric[i]);
        for j in (i + 1)..n {
            let r = pearson(table, numeric[i], numeric[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: numeric.iter().map(|&c| table.headers()[c].clone()).collect(),
        values,
    }
}

fn diagonal(table: &Table, col_idx: usize) -> Option<f64> {
    let values: Vec<f64> = table
        .rows()
        .iter()
        .filter_map(|row| row[col_idx].as_number())
        .collect();
    (values.len() >= 2 && values.iter().std_dev() > 0.0).then_some(1.0)
}

fn pearson(table: &Table, a: usize, b: usize) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = table
        .rows()
        .iter()
        .filter_map(|row| Some((row[a].as_number()?, row[b].as_number()?)))
        .unzip();
    if xs.len() < 2 {
        return None;
    }

    let std_x = xs.iter().std_dev();
    let std_y = ys.iter().std_dev();
    if !(std_x > 0.0 && std_y > 0.0) {
        return None;
    }
    let cov = xs.iter().covariance(ys.iter());
    Some((cov / (std_x * std_y)).clamp(-1.0, 1.0))
}
