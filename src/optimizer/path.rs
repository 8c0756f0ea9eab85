// Path construction: probability table -> cost matrix -> optimal pick path.
//
// To maximize the PRODUCT of weekly win probabilities we minimize the SUM of
// -ln(p) costs, which is exactly what the assignment solver handles. Missing
// (team, week) data is policy, not an error: the cell gets a large sentinel
// cost so the team is disfavored for that week, and any step that decodes to
// a sentinel-level cost is dropped from the result instead of being passed
// off as a real pick.

use tracing::{debug, warn};

use crate::optimizer::assignment::{self, AssignmentError, CostMatrix};
use crate::table::{ProbabilityRecord, ProbabilityTable};

// ---------------------------------------------------------------------------
// Fixed cost-model constants
// ---------------------------------------------------------------------------

/// Floor applied to win probabilities before taking the logarithm, so a
/// degenerate 0.0 entry cannot produce an infinite cost.
pub const MIN_WIN_PROBABILITY: f64 = 1e-3;

/// Cost assigned to a (team, week) cell with no probability record.
pub const SENTINEL_COST: f64 = 999.0;

/// Decoded steps costing more than this were never backed by real data
/// (-ln(MIN_WIN_PROBABILITY) is about 6.9) and are dropped from the path.
pub const MAX_VALID_COST: f64 = 100.0;

// ---------------------------------------------------------------------------
// Path types
// ---------------------------------------------------------------------------

/// One week's pick within a path.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PathStep {
    pub week: u32,
    pub team: String,
    pub win_probability: f64,
    pub pick_percentage: f64,
    pub opponent: Option<String>,
    pub moneyline: Option<i32>,
    pub spread: Option<f64>,
}

impl PathStep {
    fn from_record(record: &ProbabilityRecord) -> Self {
        PathStep {
            week: record.week,
            team: record.team.clone(),
            win_probability: record.win_probability,
            pick_percentage: record.pick_percentage,
            opponent: record.opponent.clone(),
            moneyline: record.moneyline,
            spread: record.spread,
        }
    }
}

/// A week-ordered sequence of distinct-team picks covering (at most) the
/// optimization horizon. Steps whose cost exceeded [`MAX_VALID_COST`] are
/// absent, so `steps.len()` below the horizon length signals degraded data
/// rather than a genuine optimum.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Path {
    pub steps: Vec<PathStep>,
    /// Product of the included steps' win probabilities.
    pub win_out_probability: f64,
}

impl Path {
    /// Number of horizon weeks actually covered by real data.
    pub fn weeks_covered(&self) -> usize {
        self.steps.len()
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// `start_week` past `end_week` leaves no weeks to optimize.
    #[error("empty horizon: start week {start_week} is past end week {end_week}")]
    EmptyHorizon { start_week: u32, end_week: u32 },

    /// Fewer available teams than weeks in the horizon. Fatal for this
    /// horizon: the caller must shorten it.
    #[error("only {available} available teams for a {weeks}-week horizon")]
    InsufficientTeams { available: usize, weeks: usize },

    /// The pin target is not available (already used, unknown, or without a
    /// matchup record for the pinned week). Reported per invocation; batch
    /// callers skip the one candidate.
    #[error("team {team} is not available to pin (used, unknown, or no matchup data)")]
    UnknownOrUsedTeam { team: String },

    #[error(transparent)]
    Assignment(#[from] AssignmentError),
}

// ---------------------------------------------------------------------------
// Path builder
// ---------------------------------------------------------------------------

/// Builds optimal paths over a probability table for a fixed set of
/// already-used teams. Holds only borrowed, read-only inputs, so one builder
/// can serve many (parallel) `optimize_path` calls.
pub struct PathBuilder<'a> {
    table: &'a ProbabilityTable,
    available: Vec<String>,
}

impl<'a> PathBuilder<'a> {
    /// `used_teams` entries that never appear in the table are ignored.
    pub fn new(table: &'a ProbabilityTable, used_teams: &[String]) -> Self {
        let available: Vec<String> = table
            .teams()
            .into_iter()
            .filter(|t| !used_teams.contains(t))
            .collect();
        debug!(
            available = available.len(),
            used = used_teams.len(),
            "path builder initialized"
        );
        PathBuilder { table, available }
    }

    /// Teams still eligible to be picked, sorted by name.
    pub fn available_teams(&self) -> &[String] {
        &self.available
    }

    /// Build the cost matrix for the given weeks: rows = available teams
    /// (in `available_teams()` order), columns = weeks.
    pub fn cost_matrix(&self, weeks: &[u32]) -> CostMatrix {
        let mut matrix = CostMatrix::filled(self.available.len(), weeks.len(), SENTINEL_COST);
        for (row, team) in self.available.iter().enumerate() {
            for (col, &week) in weeks.iter().enumerate() {
                if let Some(record) = self.table.get(week, team) {
                    let p = record.win_probability.max(MIN_WIN_PROBABILITY);
                    matrix.set(row, col, -p.ln());
                }
            }
        }
        matrix
    }

    /// Find the optimal path over `[start_week, end_week]`, optionally
    /// pinning one team to `start_week`.
    pub fn optimize_path(
        &self,
        start_week: u32,
        end_week: u32,
        pinned: Option<&str>,
    ) -> Result<Path, PathError> {
        let weeks: Vec<u32> = (start_week..=end_week).collect();

        // A zero-column matrix has no cells; reject before any matrix access.
        if weeks.is_empty() {
            return Err(PathError::EmptyHorizon {
                start_week,
                end_week,
            });
        }

        if self.available.len() < weeks.len() {
            return Err(PathError::InsufficientTeams {
                available: self.available.len(),
                weeks: weeks.len(),
            });
        }

        let matrix = self.cost_matrix(&weeks);

        let result = match pinned {
            Some(team) => {
                let row = self
                    .available
                    .iter()
                    .position(|t| t == team)
                    .ok_or_else(|| PathError::UnknownOrUsedTeam {
                        team: team.to_string(),
                    })?;
                // A pin only makes sense when the team actually plays the
                // pinned week; a sentinel cell would force a throwaway pick.
                if matrix.at(row, 0) > MAX_VALID_COST {
                    return Err(PathError::UnknownOrUsedTeam {
                        team: team.to_string(),
                    });
                }
                assignment::solve_pinned(&matrix, row, 0)?
            }
            None => assignment::solve(&matrix)?,
        };

        let mut steps = Vec::with_capacity(weeks.len());
        let mut win_out_probability = 1.0;

        for (col, &row) in result.row_for_col.iter().enumerate() {
            let week = weeks[col];
            let team = &self.available[row];
            let cost = matrix.at(row, col);

            if cost > MAX_VALID_COST {
                warn!(week, team = %team, "no matchup data for assigned week, dropping step");
                continue;
            }

            // A finite cost implies the record exists.
            let Some(record) = self.table.get(week, team) else {
                warn!(week, team = %team, "finite-cost cell without a table record, dropping step");
                continue;
            };
            steps.push(PathStep::from_record(record));
            win_out_probability *= record.win_probability;
        }

        if steps.is_empty() {
            win_out_probability = 0.0;
        }

        Ok(Path {
            steps,
            win_out_probability,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
