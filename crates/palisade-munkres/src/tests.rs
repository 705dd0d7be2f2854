#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use crate::error::MunkresError;
    use crate::solver::{solve, Assignment};

    /// Minimum total cost over every one-to-one matching of size min(M, N).
    fn brute_force(costs: &[Vec<f64>]) -> f64 {
        let rows = costs.len();
        let cols = costs[0].len();
        if rows <= cols {
            best_rows_into_cols(costs, 0, &mut vec![false; cols])
        } else {
            let transposed: Vec<Vec<f64>> = (0..cols)
                .map(|c| (0..rows).map(|r| costs[r][c]).collect())
                .collect();
            best_rows_into_cols(&transposed, 0, &mut vec![false; rows])
        }
    }

    fn best_rows_into_cols(costs: &[Vec<f64>], row: usize, used: &mut [bool]) -> f64 {
        if row == costs.len() {
            return 0.0;
        }
        let mut best = f64::INFINITY;
        for c in 0..used.len() {
            if used[c] {
                continue;
            }
            used[c] = true;
            best = best.min(costs[row][c] + best_rows_into_cols(costs, row + 1, used));
            used[c] = false;
        }
        best
    }

    fn assert_valid(costs: &[Vec<f64>], result: &Assignment) {
        let rows = costs.len();
        let cols = costs[0].len();
        assert_eq!(result.len(), rows.min(cols), "pair count");
        let mut row_seen = vec![false; rows];
        let mut col_seen = vec![false; cols];
        for &(r, c) in &result.pairs {
            assert!(!row_seen[r], "row {r} assigned twice");
            assert!(!col_seen[c], "col {c} assigned twice");
            row_seen[r] = true;
            col_seen[c] = true;
        }
    }

    fn random_matrix(rng: &mut ChaCha8Rng, rows: usize, cols: usize, max: u32) -> Vec<Vec<f64>> {
        (0..rows)
            .map(|_| (0..cols).map(|_| rng.gen_range(0..max) as f64).collect())
            .collect()
    }

    // ---- Known answers ----

    #[test]
    fn test_classic_three_by_three() {
        let costs = vec![
            vec![1.0, 2.0, 3.0],
            vec![2.0, 4.0, 6.0],
            vec![3.0, 6.0, 9.0],
        ];
        let result = solve(&costs).unwrap();
        assert_eq!(result.total_cost, 10.0);
        assert_valid(&costs, &result);
    }

    #[test]
    fn test_identity_prefers_diagonal() {
        let costs = vec![
            vec![0.0, 9.0, 9.0],
            vec![9.0, 0.0, 9.0],
            vec![9.0, 9.0, 0.0],
        ];
        let result = solve(&costs).unwrap();
        assert_eq!(result.pairs, vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(
            result.to_matrix(),
            vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]]
        );
    }

    #[test]
    fn test_wide_matrix_leaves_columns_unmatched() {
        let costs = vec![vec![5.0, 1.0, 7.0, 3.0], vec![2.0, 8.0, 1.0, 9.0]];
        let result = solve(&costs).unwrap();
        assert_eq!(result.pairs, vec![(0, 1), (1, 2)]);
        assert_eq!(result.total_cost, 2.0);
        assert_eq!(result.row_for_col(0), None);
    }

    #[test]
    fn test_tall_matrix_leaves_rows_unmatched() {
        let costs = vec![vec![4.0, 9.0], vec![1.0, 7.0], vec![8.0, 2.0]];
        let result = solve(&costs).unwrap();
        assert_eq!(result.pairs, vec![(1, 0), (2, 1)]);
        assert_eq!(result.col_for_row(0), None);
        assert_eq!(result.total_cost, 3.0);
    }

    #[test]
    fn test_negative_costs() {
        let costs = vec![vec![-5.0, 0.0], vec![0.0, -5.0]];
        let result = solve(&costs).unwrap();
        assert_eq!(result.total_cost, -10.0);
    }

    #[test]
    fn test_extreme_finite_costs() {
        let result = solve(&[vec![1e308, -1e308], vec![1e308, -1e308]]).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.total_cost, 0.0);

        let result = solve(&[
            vec![-f64::MAX, f64::MAX, 0.0],
            vec![f64::MAX, 0.0, -f64::MAX],
            vec![0.0, -f64::MAX, f64::MAX],
        ])
        .unwrap();
        assert_eq!(result.pairs, vec![(0, 0), (1, 2), (2, 1)]);

        // Wide inputs keep their shape after rescaling
        let result = solve(&[vec![f64::MAX, -f64::MAX, 1.0]]).unwrap();
        assert_eq!(result.pairs, vec![(0, 1)]);
        assert_eq!(result.total_cost, -f64::MAX);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(solve(&[]).unwrap().is_empty());
        assert!(solve(&[vec![]]).unwrap().is_empty());
        let result = solve(&[vec![3.5]]).unwrap();
        assert_eq!(result.pairs, vec![(0, 0)]);
        assert_eq!(result.total_cost, 3.5);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            solve(&[vec![1.0, 2.0], vec![3.0]]),
            Err(MunkresError::RaggedMatrix {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            solve(&[vec![1.0, f64::INFINITY]]),
            Err(MunkresError::NonFiniteCost { row: 0, col: 1 })
        );
        assert_eq!(
            solve(&[vec![f64::NAN]]),
            Err(MunkresError::NonFiniteCost { row: 0, col: 0 })
        );
    }

    // ---- Determinism ----

    #[test]
    fn test_ties_are_reproducible() {
        let costs = vec![vec![1.0; 4]; 4];
        let first = solve(&costs).unwrap();
        for _ in 0..10 {
            assert_eq!(solve(&costs).unwrap(), first, "tied input gave a different answer");
        }
        assert_eq!(first.total_cost, 4.0);
        assert_valid(&costs, &first);
    }

    // ---- Optimality against brute force ----

    #[test]
    fn test_random_square_matrices_are_optimal() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        for size in [3, 4] {
            for _ in 0..200 {
                // Narrow value range forces plenty of tied minima
                let costs = random_matrix(&mut rng, size, size, 6);
                let result = solve(&costs).unwrap();
                assert_valid(&costs, &result);
                assert_eq!(result.total_cost, brute_force(&costs), "matrix {costs:?}");
            }
        }
    }

    #[test]
    fn test_random_rectangular_matrices_are_optimal() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for (rows, cols) in [(2, 5), (5, 2), (3, 4), (4, 3)] {
            for _ in 0..100 {
                let costs = random_matrix(&mut rng, rows, cols, 50);
                let result = solve(&costs).unwrap();
                assert_valid(&costs, &result);
                assert_eq!(result.total_cost, brute_force(&costs), "matrix {costs:?}");
            }
        }
    }

    fn matrix_strategy() -> impl Strategy<Value = Vec<Vec<f64>>> {
        (1usize..=5, 1usize..=5).prop_flat_map(|(rows, cols)| {
            prop::collection::vec(
                prop::collection::vec((0u32..20).prop_map(f64::from), cols),
                rows,
            )
        })
    }

    proptest! {
        #[test]
        fn prop_matches_brute_force(costs in matrix_strategy()) {
            let result = solve(&costs).unwrap();
            prop_assert_eq!(result.len(), costs.len().min(costs[0].len()));
            prop_assert_eq!(result.total_cost, brute_force(&costs));
        }
    }
}
