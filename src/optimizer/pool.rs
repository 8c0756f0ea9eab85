// Pool-size aware expected value.
//
// Raw win-out probability ignores the competition: a pick everyone else also
// makes wins you nothing when it hits. The model here estimates how much of
// the pool survives alongside you each week and rewards picks that are both
// likely to win and unlikely to be duplicated, then blends that EV with the
// raw survival probability using weights chosen by pool size.
//
// The attrition estimate is a stated approximation, not a simulation of the
// real field: the true joint distribution of everyone's picks is unobserved.
// It lives behind a trait so a better model can replace it without touching
// the ranking pipeline.

use tracing::debug;

use crate::optimizer::path::PathStep;
use crate::optimizer::ranking::Candidate;

// ---------------------------------------------------------------------------
// Attrition strategy
// ---------------------------------------------------------------------------

/// Estimates the fraction of the pool surviving a week, given your pick's
/// win probability and its pick share.
pub trait AttritionModel: Send + Sync {
    fn survival_rate(&self, win_probability: f64, pick_percentage: f64) -> f64;
}

/// Default attrition model: assumes the rest of the field picked teams of
/// broadly similar quality, so the pool's survival rate is your pick's win
/// probability regressed toward the mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegressedAttrition;

impl AttritionModel for RegressedAttrition {
    fn survival_rate(&self, win_probability: f64, _pick_percentage: f64) -> f64 {
        0.5 + 0.7 * (win_probability - 0.5)
    }
}

// ---------------------------------------------------------------------------
// Scored candidate
// ---------------------------------------------------------------------------

/// A ranked candidate decorated with pool-model metrics. Produced by
/// [`PoolModel::score_candidates`]; the underlying candidate is untouched.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Average weekly EV across the candidate's path.
    pub path_ev: f64,
    /// Estimated entries left if the path survives to the end.
    pub estimated_final_pool_size: u32,
    /// 1 / estimated_final_pool_size: rough chance of winning outright
    /// conditional on surviving.
    pub estimated_win_probability: f64,
    /// Pool-size weighted blend of win-out probability and path EV. Final
    /// recommendation order sorts on this.
    pub composite_score: f64,
}

/// Per-path EV metrics from walking the attrition model week by week.
#[derive(Debug, Clone)]
pub struct PathEv {
    pub path_ev: f64,
    pub estimated_final_pool_size: u32,
    pub estimated_win_probability: f64,
    pub week_evs: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Pool model
// ---------------------------------------------------------------------------

/// Strategy weights (win-out probability, path EV) by pool-size band:
/// small pools play it safe, large pools chase differentiation.
fn composite_weights(pool_size: u32) -> (f64, f64) {
    if pool_size > 100 {
        (0.4, 0.6)
    } else if pool_size > 20 {
        (0.6, 0.4)
    } else {
        (0.8, 0.2)
    }
}

/// Canned strategy advice by pool size.
pub fn strategy_label(pool_size: u32) -> &'static str {
    if pool_size < 10 {
        "Small pool: Prioritize highest win probabilities. Play it safe."
    } else if pool_size < 50 {
        "Medium pool: Balance safety with some contrarian value picks."
    } else if pool_size < 200 {
        "Large pool: Consider contrarian picks with good value. Look for differentiation."
    } else {
        "Very large pool: Maximize EV with contrarian strategy. Heavy focus on unique paths."
    }
}

/// EV calculator for a pool of a given size. Holds no state across calls
/// beyond the configured size and attrition strategy.
pub struct PoolModel {
    pool_size: u32,
    attrition: Box<dyn AttritionModel>,
}

impl PoolModel {
    pub fn new(pool_size: u32) -> Self {
        Self::with_attrition(pool_size, Box::new(RegressedAttrition))
    }

    pub fn with_attrition(pool_size: u32, attrition: Box<dyn AttritionModel>) -> Self {
        PoolModel {
            pool_size: pool_size.max(1),
            attrition,
        }
    }

    pub fn pool_size(&self) -> u32 {
        self.pool_size
    }

    /// Expected value of one pick for one week.
    ///
    /// `survivors_if_win` estimates how many entries remain if your pick
    /// wins: the share on your team survives with probability `p`, the rest
    /// of the field is approximated as surviving with probability `1 - p`.
    /// Your entry's value scales with how much of the field that removes,
    /// so EV = p * remaining / survivors_if_win.
    pub fn week_ev(&self, win_probability: f64, pick_percentage: f64, remaining: f64) -> f64 {
        let survivors_if_win = remaining
            * (pick_percentage * win_probability
                + (1.0 - pick_percentage) * (1.0 - win_probability));
        win_probability * remaining / survivors_if_win.max(1.0)
    }

    /// Walk a path week by week, shrinking the estimated pool via the
    /// attrition model, and average the weekly EVs.
    pub fn path_ev(&self, steps: &[PathStep]) -> PathEv {
        let mut remaining = self.pool_size as f64;
        let mut week_evs = Vec::with_capacity(steps.len());

        for step in steps {
            let ev = self.week_ev(step.win_probability, step.pick_percentage, remaining);
            week_evs.push(ev);

            let rate = self
                .attrition
                .survival_rate(step.win_probability, step.pick_percentage);
            remaining = (remaining * rate).floor().max(1.0);
        }

        let path_ev = if week_evs.is_empty() {
            0.0
        } else {
            week_evs.iter().sum::<f64>() / week_evs.len() as f64
        };

        let estimated_final_pool_size = remaining as u32;
        PathEv {
            path_ev,
            estimated_final_pool_size,
            estimated_win_probability: 1.0 / estimated_final_pool_size.max(1) as f64,
            week_evs,
        }
    }

    /// Blend win-out probability with path EV using the pool-size band
    /// weights. Monotonic in both inputs.
    pub fn composite_score(&self, win_out_probability: f64, path_ev: f64) -> f64 {
        let (w_prob, w_ev) = composite_weights(self.pool_size);
        w_prob * win_out_probability + w_ev * path_ev
    }

    /// Score ranked candidates and re-sort descending by composite score.
    /// This is the final recommendation order.
    pub fn score_candidates(&self, candidates: Vec<Candidate>) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| {
                let ev = self.path_ev(&candidate.path.steps);
                let composite_score =
                    self.composite_score(candidate.win_out_probability, ev.path_ev);
                debug!(
                    team = %candidate.team,
                    path_ev = ev.path_ev,
                    composite_score,
                    "candidate scored"
                );
                ScoredCandidate {
                    candidate,
                    path_ev: ev.path_ev,
                    estimated_final_pool_size: ev.estimated_final_pool_size,
                    estimated_win_probability: ev.estimated_win_probability,
                    composite_score,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.composite_score
                .partial_cmp(&a.composite_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.candidate.team.cmp(&b.candidate.team))
        });
        scored
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
