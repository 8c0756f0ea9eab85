// Minimum-cost rectangular assignment solver.
//
// Implements the primal-dual shortest-augmenting-path formulation of the
// Kuhn-Munkres algorithm: columns are inserted one at a time and each
// insertion grows an alternating tree over the rows until an unassigned row
// is reached. Runs in O(cols^2 * rows) and returns the global optimum, not a
// greedy approximation.
//
// Tie-breaking is deterministic: all comparisons are strict, so when two
// rows tie the lowest row index wins. Callers relying on reproducible output
// (candidate ranking) depend on this.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Cost matrix
// ---------------------------------------------------------------------------

/// Rectangular row-major cost matrix. Rows are candidate items (teams),
/// columns are slots to fill (weeks). The solver requires rows >= cols so
/// every column can be covered by a distinct row.
#[derive(Debug, Clone)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl CostMatrix {
    /// Create a matrix with every cell set to `fill`.
    pub fn filled(rows: usize, cols: usize, fill: f64) -> Self {
        CostMatrix {
            rows,
            cols,
            cells: vec![fill; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, cost: f64) {
        self.cells[row * self.cols + col] = cost;
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AssignmentError {
    /// Fewer rows than columns: the horizon cannot be fully covered.
    #[error("infeasible shape: {rows} rows cannot cover {cols} columns")]
    InfeasibleShape { rows: usize, cols: usize },

    /// A cost cell is NaN or infinite. Missing data must be encoded as a
    /// large finite sentinel by the caller, never as a non-finite value.
    #[error("non-finite cost at row {row}, column {col}")]
    NonFiniteCost { row: usize, col: usize },

    /// Pin coordinates outside the matrix.
    #[error("pinned cell ({row}, {col}) is outside a {rows}x{cols} matrix")]
    PinOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

// ---------------------------------------------------------------------------
// Assignment result
// ---------------------------------------------------------------------------

/// A complete assignment of every column to a distinct row.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// `row_for_col[c]` is the row assigned to column `c`.
    pub row_for_col: Vec<usize>,
    /// Sum of the assigned cells' costs.
    pub total_cost: f64,
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Solve the minimum-cost assignment of every column to a distinct row.
pub fn solve(matrix: &CostMatrix) -> Result<Assignment, AssignmentError> {
    let rows = matrix.rows();
    let cols = matrix.cols();

    if rows < cols {
        return Err(AssignmentError::InfeasibleShape { rows, cols });
    }

    for row in 0..rows {
        for col in 0..cols {
            if !matrix.at(row, col).is_finite() {
                return Err(AssignmentError::NonFiniteCost { row, col });
            }
        }
    }

    if cols == 0 {
        return Ok(Assignment {
            row_for_col: Vec::new(),
            total_cost: 0.0,
        });
    }

    // Dual potentials for columns and rows, plus one virtual root row that
    // anchors each alternating tree.
    const UNASSIGNED: usize = usize::MAX;
    let virtual_row = rows;

    let mut col_potential = vec![0.0_f64; cols];
    let mut row_potential = vec![0.0_f64; rows + 1];
    // Column currently matched to each row (UNASSIGNED = free row).
    let mut col_at_row = vec![UNASSIGNED; rows + 1];
    // Predecessor row on the alternating path, per row.
    let mut prev_row = vec![0usize; rows];

    for col in 0..cols {
        col_at_row[virtual_row] = col;
        let mut current = virtual_row;
        let mut min_reduced = vec![f64::INFINITY; rows];
        let mut in_tree = vec![false; rows + 1];

        // Grow the tree until an unassigned row joins it.
        loop {
            in_tree[current] = true;
            let tree_col = col_at_row[current];
            let mut delta = f64::INFINITY;
            let mut next = UNASSIGNED;

            for row in 0..rows {
                if in_tree[row] {
                    continue;
                }
                let reduced =
                    matrix.at(row, tree_col) - col_potential[tree_col] - row_potential[row];
                if reduced < min_reduced[row] {
                    min_reduced[row] = reduced;
                    prev_row[row] = current;
                }
                if min_reduced[row] < delta {
                    delta = min_reduced[row];
                    next = row;
                }
            }

            // rows >= cols guarantees a free row is always reachable.
            debug_assert!(next != UNASSIGNED);

            // Shift potentials to keep reduced costs non-negative.
            for row in 0..=rows {
                if in_tree[row] {
                    if col_at_row[row] != UNASSIGNED {
                        col_potential[col_at_row[row]] += delta;
                    }
                    row_potential[row] -= delta;
                } else if row < rows {
                    min_reduced[row] -= delta;
                }
            }

            current = next;
            if col_at_row[current] == UNASSIGNED {
                break;
            }
        }

        // Augment: flip the matching along the path back to the root.
        loop {
            let parent = prev_row[current];
            col_at_row[current] = col_at_row[parent];
            current = parent;
            if current == virtual_row {
                break;
            }
        }
    }

    let mut row_for_col = vec![0usize; cols];
    for row in 0..rows {
        let col = col_at_row[row];
        if col != UNASSIGNED {
            row_for_col[col] = row;
        }
    }

    let total_cost = row_for_col
        .iter()
        .enumerate()
        .map(|(col, &row)| matrix.at(row, col))
        .sum();

    Ok(Assignment {
        row_for_col,
        total_cost,
    })
}

/// Solve with one (row, column) pair forced into the assignment.
///
/// The pinned row and column are removed, the residual (rows-1)x(cols-1)
/// problem is solved to optimality, and the pinned pair is spliced back at
/// its original indices. The unpinned remainder therefore keeps the full
/// optimality guarantee; no sentinel-cost tricks are involved.
pub fn solve_pinned(
    matrix: &CostMatrix,
    pin_row: usize,
    pin_col: usize,
) -> Result<Assignment, AssignmentError> {
    let rows = matrix.rows();
    let cols = matrix.cols();

    if pin_row >= rows || pin_col >= cols {
        return Err(AssignmentError::PinOutOfBounds {
            row: pin_row,
            col: pin_col,
            rows,
            cols,
        });
    }
    if rows < cols {
        return Err(AssignmentError::InfeasibleShape { rows, cols });
    }

    let mut residual = CostMatrix::filled(rows - 1, cols - 1, 0.0);
    for row in 0..rows {
        if row == pin_row {
            continue;
        }
        let r = if row < pin_row { row } else { row - 1 };
        for col in 0..cols {
            if col == pin_col {
                continue;
            }
            let c = if col < pin_col { col } else { col - 1 };
            residual.set(r, c, matrix.at(row, col));
        }
    }

    let pinned_cost = matrix.at(pin_row, pin_col);
    if !pinned_cost.is_finite() {
        return Err(AssignmentError::NonFiniteCost {
            row: pin_row,
            col: pin_col,
        });
    }

    let inner = solve(&residual)?;

    let mut row_for_col = vec![0usize; cols];
    row_for_col[pin_col] = pin_row;
    for (c, &r) in inner.row_for_col.iter().enumerate() {
        let col = if c < pin_col { c } else { c + 1 };
        let row = if r < pin_row { r } else { r + 1 };
        row_for_col[col] = row;
    }

    Ok(Assignment {
        row_for_col,
        total_cost: inner.total_cost + pinned_cost,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
