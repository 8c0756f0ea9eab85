// Console rendering of ranked recommendations.
//
// The optimizer core returns plain structs; this module turns them into the
// text report the binary prints, or a JSON document for machine consumers.
// Anything fancier (dashboards) belongs outside this repo.

use std::fmt::Write;

use serde::Serialize;

use crate::optimizer::path::PathStep;
use crate::optimizer::pool::{strategy_label, ScoredCandidate};

/// Everything the binary emits for one ranking run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub current_week: u32,
    pub end_week: u32,
    pub pool_size: u32,
    pub strategy: &'static str,
    pub picks: Vec<ScoredCandidate>,
}

impl Report {
    pub fn new(
        current_week: u32,
        end_week: u32,
        pool_size: u32,
        picks: Vec<ScoredCandidate>,
    ) -> Self {
        Report {
            current_week,
            end_week,
            pool_size,
            strategy: strategy_label(pool_size),
            picks,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", "=".repeat(72));
        let _ = writeln!(
            out,
            "TOP {} PICKS FOR WEEK {} (horizon through week {})",
            self.picks.len(),
            self.current_week,
            self.end_week
        );
        let _ = writeln!(out, "{}", "=".repeat(72));
        let _ = writeln!(out, "Pool size: {}", self.pool_size);
        let _ = writeln!(out, "Strategy:  {}", self.strategy);

        for (rank, pick) in self.picks.iter().enumerate() {
            let c = &pick.candidate;
            let _ = writeln!(out);
            let _ = writeln!(out, "#{} PICK: {}", rank + 1, c.team);
            let _ = writeln!(
                out,
                "   This week win probability: {:.1}%",
                c.week_win_probability * 100.0
            );
            let _ = writeln!(
                out,
                "   Overall win-out probability: {:.2}%",
                c.win_out_probability * 100.0
            );
            let _ = writeln!(
                out,
                "   Pick percentage: {:.1}%",
                c.week_pick_percentage * 100.0
            );
            let _ = writeln!(
                out,
                "   Path EV: {:.3}   Composite score: {:.3}",
                pick.path_ev, pick.composite_score
            );
            let _ = writeln!(
                out,
                "   Estimated final pool size: {} (win probability {:.2}%)",
                pick.estimated_final_pool_size,
                pick.estimated_win_probability * 100.0
            );
            let _ = writeln!(out, "   Optimal path:");
            let _ = write!(out, "{}", format_path(&c.path.steps));
        }

        out
    }
}

/// One aligned line per week of a path.
pub fn format_path(steps: &[PathStep]) -> String {
    let mut out = String::new();
    for step in steps {
        let opponent = step
            .opponent
            .as_deref()
            .map(|o| format!(" vs {o}"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "     Week {:2}: {:<25} ({:.1}%){}",
            step.week,
            step.team,
            step.win_probability * 100.0,
            opponent
        );
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
