use crate::Table;
use std::num::NonZeroUsize;

pub fn page_count(rows: usize, page_size: NonZeroUsize) -> usize {
    rows.div_ceil(page_size.get()).max(1)
}

/// 1-based. Page 0 reads as page 1; a page past the end is an empty table.
pub fn paginate(table: &Table, page_size: NonZeroUsize, page_number: usize) -> Table {
    let page = page_number.max(1);
    let start = (page - 1)
        .saturating_mul(page_size.get())
        .min(table.row_count());
    let end = start.saturating_add(page_size.get()).min(table.row_count());
    table.with_rows(table.rows()[start..end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use pretty_assertions::assert_eq;

    fn numbered(n: usize) -> Table {
        Table::new(
            vec!["Id".into()],
            (0..n).map(|i| vec![Value::Number(i as f64)]).collect(),
        )
        .unwrap()
    }

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, size(50)), 1);
        assert_eq!(page_count(50, size(50)), 1);
        assert_eq!(page_count(51, size(50)), 2);
    }

    #[test]
    fn test_short_table_fits_first_page() {
        let table = numbered(30);
        assert_eq!(paginate(&table, size(50), 1), table);
        let second = paginate(&table, size(50), 2);
        assert!(second.is_empty());
        assert_eq!(second.headers(), table.headers());
    }

    #[test]
    fn test_out_of_range_pages() {
        let table = numbered(7);
        assert_eq!(paginate(&table, size(3), 0), paginate(&table, size(3), 1));
        let last = paginate(&table, size(3), 3);
        assert_eq!(last.rows(), [vec![Value::Number(6.0)]]);
        assert!(paginate(&table, size(3), usize::MAX).is_empty());
    }

    #[test]
    fn test_empty_table_gives_empty_page() {
        let table = numbered(0);
        assert!(paginate(&table, size(10), 1).is_empty());
        assert!(paginate(&table, size(10), 5).is_empty());
    }

    #[test]
    fn test_pages_reassemble_table() {
        let table = numbered(23);
        let page_size = size(5);
        let rows: Vec<Vec<Value>> = (1..=page_count(23, page_size))
            .flat_map(|p| paginate(&table, page_size, p).rows().to_vec())
            .collect();
        assert_eq!(rows, table.rows());
    }
}
