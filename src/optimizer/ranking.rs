// Candidate ranking: one forced-pick solve per team playing this week.
//
// Each candidate team is pinned to the current week and the remaining
// horizon is re-optimized around it, so the ranking compares best-case
// continuations, not just this week's probabilities. The per-team solves
// share only read-only inputs and run in parallel.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::optimizer::path::{Path, PathBuilder, PathError};
use crate::table::ProbabilityTable;

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A current-week pick together with its optimal continuation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Candidate {
    /// The team forced into the current week.
    pub team: String,
    /// Optimal path through the rest of the horizon with `team` pinned first.
    pub path: Path,
    /// Product of the path's weekly win probabilities.
    pub win_out_probability: f64,
    /// This week's win probability for `team`.
    pub week_win_probability: f64,
    /// Estimated share of the pool picking `team` this week.
    pub week_pick_percentage: f64,
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Rank the top `n` picks for `current_week` by win-out probability.
///
/// Only unused teams with a record for `current_week` are considered: a team
/// on a bye is excluded even though it is nominally available. A candidate
/// whose forced solve fails with [`PathError::UnknownOrUsedTeam`] is skipped;
/// [`PathError::InsufficientTeams`] aborts the whole ranking since no
/// candidate can cover the horizon.
pub fn rank_candidates(
    table: &ProbabilityTable,
    used_teams: &[String],
    current_week: u32,
    end_week: u32,
    n: usize,
) -> Result<Vec<Candidate>, PathError> {
    let builder = PathBuilder::new(table, used_teams);

    let playing: Vec<String> = table
        .teams_playing(current_week)
        .into_iter()
        .filter(|t| builder.available_teams().contains(t))
        .collect();
    info!(
        candidates = playing.len(),
        week = current_week,
        "evaluating teams playing this week"
    );

    let solved: Vec<Result<Option<Candidate>, PathError>> = playing
        .par_iter()
        .map(|team| force_candidate(&builder, team, current_week, end_week))
        .collect();

    let mut candidates = Vec::with_capacity(playing.len());
    for result in solved {
        match result {
            Ok(Some(candidate)) => candidates.push(candidate),
            Ok(None) => {}
            Err(e) => return Err(e),
        }
    }

    // Descending by win-out probability; ties broken by team name so the
    // ranking is reproducible.
    candidates.sort_by(|a, b| {
        b.win_out_probability
            .partial_cmp(&a.win_out_probability)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.team.cmp(&b.team))
    });
    candidates.truncate(n);

    Ok(candidates)
}

/// Solve the horizon with `team` forced into `current_week`. Returns
/// `Ok(None)` for per-candidate failures that should skip the candidate.
fn force_candidate(
    builder: &PathBuilder<'_>,
    team: &str,
    current_week: u32,
    end_week: u32,
) -> Result<Option<Candidate>, PathError> {
    let path = match builder.optimize_path(current_week, end_week, Some(team)) {
        Ok(path) => path,
        Err(PathError::UnknownOrUsedTeam { team }) => {
            warn!(team = %team, "candidate not pinnable, skipping");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    // The pinned solve guarantees this, but a dropped first step would leave
    // a path that starts with a different team; never rank such a candidate
    // under the forced team's name.
    let Some(first) = path.steps.first() else {
        warn!(team, "forced path has no steps, skipping");
        return Ok(None);
    };
    if first.week != current_week || first.team != team {
        warn!(team, "forced path does not start with pinned team, skipping");
        return Ok(None);
    }

    debug!(
        team,
        win_out = path.win_out_probability,
        weeks = path.weeks_covered(),
        "candidate solved"
    );

    Ok(Some(Candidate {
        team: team.to_string(),
        win_out_probability: path.win_out_probability,
        week_win_probability: first.win_probability,
        week_pick_percentage: first.pick_percentage,
        path,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ProbabilityRecord;

    fn record(week: u32, team: &str, p: f64, pick: f64) -> ProbabilityRecord {
        ProbabilityRecord {
            week,
            team: team.to_string(),
            win_probability: p,
            pick_percentage: pick,
            opponent: None,
            moneyline: None,
            spread: None,
        }
    }

    fn three_team_table() -> ProbabilityTable {
        ProbabilityTable::from_records([
            record(7, "A", 0.8, 0.30),
            record(8, "A", 0.7, 0.20),
            record(7, "B", 0.6, 0.10),
            record(8, "B", 0.9, 0.40),
            record(7, "C", 0.7, 0.15),
            record(8, "C", 0.6, 0.05),
        ])
    }

    #[test]
    fn ranked_descending_by_win_out_probability() {
        let table = three_team_table();
        let candidates = rank_candidates(&table, &[], 7, 8, 5).unwrap();

        // Forced A: A(0.8) + B(0.9) = 0.72
        // Forced B: B(0.6) + A(0.7) = 0.42
        // Forced C: C(0.7) + B(0.9) = 0.63
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].team, "A");
        assert_eq!(candidates[1].team, "C");
        assert_eq!(candidates[2].team, "B");
        for pair in candidates.windows(2) {
            assert!(pair[0].win_out_probability >= pair[1].win_out_probability);
        }
    }

    #[test]
    fn each_candidate_path_starts_with_its_team() {
        let table = three_team_table();
        let candidates = rank_candidates(&table, &[], 7, 8, 5).unwrap();
        for candidate in &candidates {
            let first = &candidate.path.steps[0];
            assert_eq!(first.week, 7);
            assert_eq!(first.team, candidate.team);
            assert_eq!(candidate.week_win_probability, first.win_probability);
            assert_eq!(candidate.week_pick_percentage, first.pick_percentage);
        }
    }

    #[test]
    fn top_n_truncates() {
        let table = three_team_table();
        let candidates = rank_candidates(&table, &[], 7, 8, 2).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].team, "A");
        assert_eq!(candidates[1].team, "C");
    }

    #[test]
    fn bye_week_teams_are_not_candidates() {
        // D plays week 8 but not week 7, so it can never be a week-7 pick
        // even though it is unused.
        let mut table = three_team_table();
        table.insert(record(8, "D", 0.95, 0.50));
        let candidates = rank_candidates(&table, &[], 7, 8, 5).unwrap();
        assert!(candidates.iter().all(|c| c.team != "D"));
        // D still strengthens continuations: forced A now pairs with D.
        // A(0.8) + D(0.95) = 0.76.
        assert_eq!(candidates[0].team, "A");
        assert!((candidates[0].win_out_probability - 0.76).abs() < 1e-9);
    }

    #[test]
    fn used_teams_are_not_candidates() {
        let table = three_team_table();
        let candidates = rank_candidates(&table, &["A".to_string()], 7, 8, 5).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.team != "A"));
        // Forced C: C(0.7) + B(0.9) = 0.63 beats forced B: B(0.6) + C(0.6).
        assert_eq!(candidates[0].team, "C");
    }

    #[test]
    fn insufficient_teams_propagates() {
        let table = three_team_table();
        let used: Vec<String> = vec!["A".into(), "B".into()];
        match rank_candidates(&table, &used, 7, 8, 5) {
            Err(PathError::InsufficientTeams { .. }) => {}
            other => panic!("expected InsufficientTeams, got {other:?}"),
        }
    }

    #[test]
    fn empty_horizon_propagates() {
        // current_week past end_week: every forced solve would see zero
        // weeks, so the whole ranking fails up front instead of panicking.
        let table = three_team_table();
        match rank_candidates(&table, &[], 8, 7, 5) {
            Err(PathError::EmptyHorizon { .. }) => {}
            other => panic!("expected EmptyHorizon, got {other:?}"),
        }
    }

    #[test]
    fn every_candidate_has_current_week_record() {
        let table = three_team_table();
        let candidates = rank_candidates(&table, &[], 7, 8, 5).unwrap();
        for candidate in &candidates {
            assert!(table.get(7, &candidate.team).is_some());
        }
    }

    #[test]
    fn ranking_is_deterministic_across_runs() {
        let table = three_team_table();
        let first = rank_candidates(&table, &[], 7, 8, 5).unwrap();
        for _ in 0..5 {
            let again = rank_candidates(&table, &[], 7, 8, 5).unwrap();
            let teams: Vec<&str> = again.iter().map(|c| c.team.as_str()).collect();
            let expected: Vec<&str> = first.iter().map(|c| c.team.as_str()).collect();
            assert_eq!(teams, expected);
        }
    }
}
