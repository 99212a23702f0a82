//! Nearest-bin lookup into tabulated curves.
//!
//! Bin boundaries are the midpoints between consecutive table entries, so a
//! query maps to the closest tabulated value. A query sitting exactly on a
//! midpoint maps to the lower entry.

/// Midpoints between consecutive entries of an ascending table.
pub fn bin_boundaries(table: &[f64]) -> Vec<f64> {
    table.windows(2).map(|w| w[1] - (w[1] - w[0]) / 2.0).collect()
}

/// Index of the table entry closest to `query`, given precomputed boundaries.
#[inline]
pub fn nearest_index_with(boundaries: &[f64], query: f64) -> usize {
    boundaries.partition_point(|&m| m < query)
}

/// Index of the closest table entry for every query.
pub fn nearest_index(table: &[f64], queries: &[f64]) -> Vec<usize> {
    let boundaries = bin_boundaries(table);
    queries
        .iter()
        .map(|&q| nearest_index_with(&boundaries, q))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_values_map_to_themselves() {
        let table = [0.0, 3.5, 4.0, 7.25, 10.0, 25.0];
        let idx = nearest_index(&table, &table);
        assert_eq!(idx, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_nearest_and_ties() {
        let table = [0.0, 2.0, 4.0];
        // Midpoints are 1.0 and 3.0.
        let idx = nearest_index(&table, &[0.9, 1.0, 1.1, 2.9, 3.0, 3.1]);
        assert_eq!(idx, vec![0, 0, 1, 1, 1, 2]);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let table = [1.0, 2.0, 3.0];
        let idx = nearest_index(&table, &[-10.0, 100.0]);
        assert_eq!(idx, vec![0, 2]);
    }

    #[test]
    fn test_single_entry_table() {
        assert_eq!(nearest_index(&[5.0], &[0.0, 5.0, 9.0]), vec![0, 0, 0]);
    }
}
