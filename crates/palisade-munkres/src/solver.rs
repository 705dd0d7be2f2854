//! Hungarian method driven by an explicit six-step state machine.
//!
//! Works on a copy of the cost matrix with at most as many rows as columns
//! (wider-than-tall inputs are transposed first). Zero searches run in
//! row-major order, so identical input always yields the identical matching.

use crate::error::{MunkresError, MunkresResult};

/// Optimal matching returned by [`solve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    /// (row, col) pairs sorted by row.
    pub pairs: Vec<(usize, usize)>,
    /// Sum of the original costs of the matched cells.
    pub total_cost: f64,
    rows: usize,
    cols: usize,
}

impl Assignment {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn col_for_row(&self, row: usize) -> Option<usize> {
        self.pairs.iter().find(|(r, _)| *r == row).map(|(_, c)| *c)
    }

    pub fn row_for_col(&self, col: usize) -> Option<usize> {
        self.pairs.iter().find(|(_, c)| *c == col).map(|(r, _)| *r)
    }

    /// Dense 0/1 matrix with the input's shape.
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        let mut matrix = vec![vec![0u8; self.cols]; self.rows];
        for &(r, c) in &self.pairs {
            matrix[r][c] = 1;
        }
        matrix
    }
}

/// Minimum-cost assignment over an M×N matrix (lower cost is better).
///
/// Every row and column is used at most once and exactly `min(M, N)` pairs
/// are produced. Costs must be finite; callers encode "forbidden" cells as a
/// large finite sentinel and discard those pairs afterwards.
pub fn solve(costs: &[Vec<f64>]) -> MunkresResult<Assignment> {
    let rows = costs.len();
    let cols = costs.first().map_or(0, Vec::len);

    for (r, row) in costs.iter().enumerate() {
        if row.len() != cols {
            return Err(MunkresError::RaggedMatrix {
                row: r,
                expected: cols,
                found: row.len(),
            });
        }
        if let Some(c) = row.iter().position(|v| !v.is_finite()) {
            return Err(MunkresError::NonFiniteCost { row: r, col: c });
        }
    }

    if rows == 0 || cols == 0 {
        return Ok(Assignment {
            rows,
            cols,
            ..Default::default()
        });
    }

    let transposed = rows > cols;
    let working = if transposed {
        (0..cols)
            .map(|c| (0..rows).map(|r| costs[r][c]).collect())
            .collect()
    } else {
        costs.to_vec()
    };

    let mut working = working;
    rescale_wide_range(&mut working);
    let mut pairs = Solver::new(working).run()?;
    if transposed {
        pairs = pairs.into_iter().map(|(r, c)| (c, r)).collect();
    }
    pairs.sort_unstable();

    let total_cost = pairs.iter().map(|&(r, c)| costs[r][c]).sum();
    Ok(Assignment {
        pairs,
        total_cost,
        rows,
        cols,
    })
}

/// Map costs onto [0, 1] when their spread could overflow during reduction
/// or adjustment. A positive affine map leaves the optimal matching unchanged;
/// narrower matrices are left alone so exact ties stay exact.
fn rescale_wide_range(cost: &mut [Vec<f64>]) {
    let (min, max) = cost
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let steps = cost.len() as f64 + 1.0;
    if ((max - min) * steps).is_finite() {
        return;
    }
    // Halves keep every intermediate finite
    let half_min = min * 0.5;
    let half_span = max * 0.5 - half_min;
    for v in cost.iter_mut().flatten() {
        *v = ((*v * 0.5 - half_min) / half_span).clamp(0.0, 1.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    None,
    Star,
    Prime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    ReduceRows,
    StarZeros,
    CoverColumns,
    PrimeZeros,
    AugmentPath { row: usize, col: usize },
    AdjustMatrix,
    Done,
}

impl Step {
    fn number(self) -> u8 {
        match self {
            Step::ReduceRows => 1,
            Step::StarZeros => 2,
            Step::CoverColumns => 3,
            Step::PrimeZeros => 4,
            Step::AugmentPath { .. } => 5,
            Step::AdjustMatrix => 6,
            Step::Done => 7,
        }
    }
}

struct Solver {
    cost: Vec<Vec<f64>>,
    n: usize,
    m: usize,
    marks: Vec<Vec<Mark>>,
    row_covered: Vec<bool>,
    col_covered: Vec<bool>,
}

impl Solver {
    fn new(cost: Vec<Vec<f64>>) -> Self {
        let n = cost.len();
        let m = cost.first().map_or(0, Vec::len);
        Self {
            cost,
            n,
            m,
            marks: vec![vec![Mark::None; m]; n],
            row_covered: vec![false; n],
            col_covered: vec![false; m],
        }
    }

    fn run(mut self) -> MunkresResult<Vec<(usize, usize)>> {
        // Each augmentation adds a star; between augmentations every step 6
        // is followed by a prime that either covers a row or augments.
        let limit = 8 * (self.n + 1) * (self.n + self.m + 2) + 16;
        let mut step = Step::ReduceRows;
        let mut transitions = 0usize;

        while step != Step::Done {
            transitions += 1;
            if transitions > limit {
                return Err(MunkresError::BadStep(step.number()));
            }
            step = match step {
                Step::ReduceRows => self.reduce_rows(),
                Step::StarZeros => self.star_zeros(),
                Step::CoverColumns => self.cover_columns(),
                Step::PrimeZeros => self.prime_zeros(),
                Step::AugmentPath { row, col } => self.augment_path(row, col)?,
                Step::AdjustMatrix => self.adjust_matrix()?,
                Step::Done => Step::Done,
            };
        }

        let mut pairs = Vec::with_capacity(self.n);
        for (r, row) in self.marks.iter().enumerate() {
            if let Some(c) = row.iter().position(|m| *m == Mark::Star) {
                pairs.push((r, c));
            }
        }
        if pairs.len() != self.n {
            return Err(MunkresError::BadStep(Step::Done.number()));
        }
        Ok(pairs)
    }

    // Step 1
    fn reduce_rows(&mut self) -> Step {
        for row in &mut self.cost {
            let min = row.iter().copied().fold(f64::INFINITY, f64::min);
            for v in row.iter_mut() {
                *v -= min;
            }
        }
        Step::StarZeros
    }

    // Step 2
    fn star_zeros(&mut self) -> Step {
        for r in 0..self.n {
            for c in 0..self.m {
                if self.cost[r][c] == 0.0 && !self.row_covered[r] && !self.col_covered[c] {
                    self.marks[r][c] = Mark::Star;
                    self.row_covered[r] = true;
                    self.col_covered[c] = true;
                }
            }
        }
        self.clear_covers();
        Step::CoverColumns
    }

    // Step 3
    fn cover_columns(&mut self) -> Step {
        let mut covered = 0;
        for c in 0..self.m {
            if (0..self.n).any(|r| self.marks[r][c] == Mark::Star) {
                self.col_covered[c] = true;
                covered += 1;
            }
        }
        if covered >= self.n {
            Step::Done
        } else {
            Step::PrimeZeros
        }
    }

    // Step 4
    fn prime_zeros(&mut self) -> Step {
        loop {
            let Some((r, c)) = self.find_uncovered_zero() else {
                return Step::AdjustMatrix;
            };
            self.marks[r][c] = Mark::Prime;
            match self.star_in_row(r) {
                Some(star_col) => {
                    self.row_covered[r] = true;
                    self.col_covered[star_col] = false;
                }
                None => return Step::AugmentPath { row: r, col: c },
            }
        }
    }

    // Step 5
    fn augment_path(&mut self, row: usize, col: usize) -> MunkresResult<Step> {
        let mut path = vec![(row, col)];
        loop {
            let (_, c) = path[path.len() - 1];
            let Some(r) = self.star_in_col(c) else {
                break;
            };
            path.push((r, c));
            let pc = self.prime_in_row(r).ok_or(MunkresError::BadStep(5))?;
            path.push((r, pc));
        }

        for (r, c) in path {
            self.marks[r][c] = match self.marks[r][c] {
                Mark::Star => Mark::None,
                Mark::Prime => Mark::Star,
                Mark::None => return Err(MunkresError::BadStep(5)),
            };
        }
        self.clear_covers();
        for row in &mut self.marks {
            for mark in row.iter_mut() {
                if *mark == Mark::Prime {
                    *mark = Mark::None;
                }
            }
        }
        Ok(Step::CoverColumns)
    }

    // Step 6
    fn adjust_matrix(&mut self) -> MunkresResult<Step> {
        let mut min = f64::INFINITY;
        for r in (0..self.n).filter(|r| !self.row_covered[*r]) {
            for c in (0..self.m).filter(|c| !self.col_covered[*c]) {
                min = min.min(self.cost[r][c]);
            }
        }
        if !min.is_finite() {
            return Err(MunkresError::BadStep(6));
        }
        for r in 0..self.n {
            for c in 0..self.m {
                if self.row_covered[r] {
                    self.cost[r][c] += min;
                }
                if !self.col_covered[c] {
                    self.cost[r][c] -= min;
                }
            }
        }
        Ok(Step::PrimeZeros)
    }

    fn find_uncovered_zero(&self) -> Option<(usize, usize)> {
        (0..self.n)
            .filter(|r| !self.row_covered[*r])
            .find_map(|r| {
                (0..self.m)
                    .find(|c| !self.col_covered[*c] && self.cost[r][*c] == 0.0)
                    .map(|c| (r, c))
            })
    }

    fn star_in_row(&self, r: usize) -> Option<usize> {
        self.marks[r].iter().position(|m| *m == Mark::Star)
    }

    fn star_in_col(&self, c: usize) -> Option<usize> {
        (0..self.n).find(|r| self.marks[*r][c] == Mark::Star)
    }

    fn prime_in_row(&self, r: usize) -> Option<usize> {
        self.marks[r].iter().position(|m| *m == Mark::Prime)
    }

    fn clear_covers(&mut self) {
        self.row_covered.fill(false);
        self.col_covered.fill(false);
    }
}
