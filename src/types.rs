use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

const MISSING_MARKERS: &[&str] = &["na", "n/a", "nan", "null", "none", "-"];

/// Numbers compare and hash by their canonical bits, so `-0.0 == 0.0`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn from_raw(raw: &str) -> Self {
        if is_missing_marker(raw) {
            Value::Missing
        } else {
            Value::Text(raw.to_string())
        }
    }

    fn canonical_bits(n: f64) -> u64 {
        if n == 0.0 { 0.0f64.to_bits() } else { n.to_bits() }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Number(_) => 0,
            Value::Text(_) => 1,
            Value::Missing => 2,
        }
    }
}

pub(crate) fn is_missing_marker(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty()
        || MISSING_MARKERS
            .iter()
            .any(|m| trimmed.eq_ignore_ascii_case(m))
}

pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if is_missing_marker(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                Value::canonical_bits(*a) == Value::canonical_bits(*b)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Missing, Value::Missing) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Number(n) => Value::canonical_bits(*n).hash(state),
            Value::Text(s) => s.hash(state),
            Value::Missing => {}
        }
    }
}

/// Numbers ascending, then text lexicographically, then missing.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                let (a, b) = (Value::canonical_bits(*a), Value::canonical_bits(*b));
                f64::from_bits(a).total_cmp(&f64::from_bits(b))
            }
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Numeric,
    Text,
    Mixed,
    Empty,
}

pub fn infer_type<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
    let mut has_number = false;
    let mut has_text = false;

    for val in values {
        match val {
            Value::Number(_) => has_number = true,
            Value::Text(_) => has_text = true,
            Value::Missing => continue,
        }
        if has_number && has_text {
            return ColumnType::Mixed;
        }
    }

    match (has_number, has_text) {
        (true, false) => ColumnType::Numeric,
        (false, true) => ColumnType::Text,
        (false, false) => ColumnType::Empty,
        (true, true) => ColumnType::Mixed,
    }
}

pub(crate) fn is_numeric_column<'a>(raw: impl IntoIterator<Item = &'a str>) -> bool {
    let mut seen = false;
    for cell in raw {
        if is_missing_marker(cell) {
            continue;
        }
        if parse_number(cell).is_none() {
            return false;
        }
        seen = true;
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_negative_zero_is_same_key() {
        let set: HashSet<Value> = [Value::Number(0.0), Value::Number(-0.0)].into();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_negative_zero_orders_equal() {
        let (pos, neg) = (Value::Number(0.0), Value::Number(-0.0));
        assert_eq!(pos, neg);
        assert_eq!(pos.cmp(&neg), Ordering::Equal);
        assert_eq!(neg.cmp(&pos), Ordering::Equal);
        assert!(Value::Number(-0.5) < neg);
    }

    #[test]
    fn test_ordering_puts_numbers_then_text_then_missing() {
        let mut vals = vec![
            Value::Missing,
            Value::text("b"),
            Value::Number(3.0),
            Value::text("a"),
            Value::Number(-1.0),
        ];
        vals.sort();
        assert_eq!(
            vals,
            vec![
                Value::Number(-1.0),
                Value::Number(3.0),
                Value::text("a"),
                Value::text("b"),
                Value::Missing,
            ]
        );
    }

    #[test]
    fn test_missing_markers() {
        assert!(Value::from_raw("").is_missing());
        assert!(Value::from_raw(" N/A ").is_missing());
        assert!(Value::from_raw("null").is_missing());
        assert_eq!(Value::from_raw("Petrol"), Value::text("Petrol"));
    }

    #[test]
    fn test_numeric_column_detection() {
        assert!(is_numeric_column(["1", "2.5", "", "NA"]));
        assert!(!is_numeric_column(["1", "72 CC"]));
        assert!(!is_numeric_column(["", "NA"]));
        assert!(!is_numeric_column(["inf"]));
    }

    #[test]
    fn test_infer_type_variants() {
        let nums = [Value::Number(1.0), Value::Missing];
        let mixed = [Value::Number(1.0), Value::text("x")];
        assert_eq!(infer_type(&nums), ColumnType::Numeric);
        assert_eq!(infer_type(&mixed), ColumnType::Mixed);
        assert_eq!(infer_type(&[Value::Missing]), ColumnType::Empty);
        assert_eq!(infer_type(&[Value::text("x")]), ColumnType::Text);
    }

    #[test]
    fn test_display_drops_trailing_zero() {
        assert_eq!(Value::Number(72.0).to_string(), "72");
        assert_eq!(Value::Number(19.2).to_string(), "19.2");
        assert_eq!(Value::Missing.to_string(), "");
    }
}
