// Probability table: the optimizer core's only input data.
//
// One record per (week, team) with a win probability, the estimated share of
// the pool picking that team, and optional matchup metadata. The table is
// supplied by the caller (CSV here; scrapers and odds APIs live outside this
// repo) and is read-only once built.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Pick share assumed when a source provides none. Roughly the share an
/// unremarkable favorite draws in public pick data.
pub const DEFAULT_PICK_PERCENTAGE: f64 = 0.05;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A single (week, team) probability entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbabilityRecord {
    pub week: u32,
    pub team: String,
    /// Probability this team wins its game that week, in [0, 1].
    pub win_probability: f64,
    /// Estimated fraction of the pool picking this team that week, in [0, 1].
    pub pick_percentage: f64,
    pub opponent: Option<String>,
    pub moneyline: Option<i32>,
    pub spread: Option<f64>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("probability table is empty")]
    Empty,
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// All probability records, keyed week -> team. The nested map keeps
/// `get` allocation-free; the path builder calls it once per matrix cell.
///
/// The (week, team) pair is unique: inserting a duplicate replaces the
/// earlier record and logs a warning, so merged sources cannot silently
/// double-count a matchup.
#[derive(Debug, Clone, Default)]
pub struct ProbabilityTable {
    records: HashMap<u32, HashMap<String, ProbabilityRecord>>,
}

impl ProbabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = ProbabilityRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.insert(record);
        }
        table
    }

    /// Insert a record, clamping out-of-range probabilities into [0, 1].
    pub fn insert(&mut self, mut record: ProbabilityRecord) {
        if !(0.0..=1.0).contains(&record.win_probability) {
            warn!(
                team = %record.team,
                week = record.week,
                value = record.win_probability,
                "win probability out of range, clamping"
            );
            record.win_probability = record.win_probability.clamp(0.0, 1.0);
        }
        if !(0.0..=1.0).contains(&record.pick_percentage) {
            warn!(
                team = %record.team,
                week = record.week,
                value = record.pick_percentage,
                "pick percentage out of range, clamping"
            );
            record.pick_percentage = record.pick_percentage.clamp(0.0, 1.0);
        }

        let week = record.week;
        let team = record.team.clone();
        if self
            .records
            .entry(week)
            .or_default()
            .insert(team.clone(), record)
            .is_some()
        {
            warn!(team = %team, week, "duplicate (week, team) record replaced");
        }
    }

    pub fn get(&self, week: u32, team: &str) -> Option<&ProbabilityRecord> {
        self.records.get(&week)?.get(team)
    }

    /// Every team appearing anywhere in the table, sorted.
    pub fn teams(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .records
            .values()
            .flat_map(|teams| teams.keys())
            .map(String::as_str)
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Teams with a record for the given week (teams on a bye are absent),
    /// sorted.
    pub fn teams_playing(&self, week: u32) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .records
            .get(&week)
            .into_iter()
            .flat_map(|teams| teams.keys())
            .map(String::as_str)
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Every week appearing in the table, ascending.
    pub fn weeks(&self) -> Vec<u32> {
        let set: BTreeSet<u32> = self.records.keys().copied().collect();
        set.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.records.values().map(HashMap::len).sum()
    }

    // Weeks are only created on insert, so no inner map is ever empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // -- CSV loading --------------------------------------------------------

    /// Load a table from a CSV file with headers
    /// `week,team,win_probability,pick_percentage,opponent,moneyline,spread`.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| TableError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_csv_reader(file, &path.display().to_string())
    }

    /// Reader-based loader so tests can feed in-memory CSV text.
    pub fn from_csv_reader(reader: impl Read, path: &str) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut table = Self::new();
        let mut skipped = 0usize;

        for row in csv_reader.deserialize::<RawRow>() {
            let raw = match row {
                Ok(raw) => raw,
                Err(e) => {
                    // One malformed row should not discard an otherwise good
                    // table; count it and move on.
                    warn!(path, error = %e, "skipping malformed CSV row");
                    skipped += 1;
                    continue;
                }
            };
            table.insert(raw.into_record());
        }

        if skipped > 0 {
            warn!(path, skipped, "CSV rows skipped during load");
        }
        if table.is_empty() {
            return Err(TableError::Empty);
        }
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Raw CSV serde struct (private)
// ---------------------------------------------------------------------------

/// Raw CSV row. Optional columns deserialize as empty strings or missing
/// fields; `pick_percentage` falls back to the default share.
#[derive(Debug, Deserialize)]
struct RawRow {
    week: u32,
    team: String,
    win_probability: f64,
    #[serde(default)]
    pick_percentage: Option<f64>,
    #[serde(default)]
    opponent: Option<String>,
    #[serde(default)]
    moneyline: Option<i32>,
    #[serde(default)]
    spread: Option<f64>,
}

impl RawRow {
    fn into_record(self) -> ProbabilityRecord {
        ProbabilityRecord {
            week: self.week,
            team: self.team,
            win_probability: self.win_probability,
            pick_percentage: self.pick_percentage.unwrap_or(DEFAULT_PICK_PERCENTAGE),
            opponent: self.opponent.filter(|s| !s.is_empty()),
            moneyline: self.moneyline,
            spread: self.spread,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(week: u32, team: &str, p: f64) -> ProbabilityRecord {
        ProbabilityRecord {
            week,
            team: team.to_string(),
            win_probability: p,
            pick_percentage: 0.10,
            opponent: None,
            moneyline: None,
            spread: None,
        }
    }

    #[test]
    fn lookup_by_week_and_team() {
        let table = ProbabilityTable::from_records([record(7, "Bills", 0.8), record(8, "Bills", 0.6)]);
        assert_eq!(table.get(7, "Bills").unwrap().win_probability, 0.8);
        assert_eq!(table.get(8, "Bills").unwrap().win_probability, 0.6);
        assert!(table.get(9, "Bills").is_none());
        assert!(table.get(7, "Jets").is_none());
    }

    #[test]
    fn duplicate_record_replaces_earlier_one() {
        let mut table = ProbabilityTable::new();
        table.insert(record(7, "Bills", 0.8));
        table.insert(record(7, "Bills", 0.3));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(7, "Bills").unwrap().win_probability, 0.3);
    }

    #[test]
    fn out_of_range_probabilities_are_clamped() {
        let mut table = ProbabilityTable::new();
        table.insert(record(1, "Bills", 1.7));
        let mut low = record(1, "Jets", 0.5);
        low.pick_percentage = -0.2;
        table.insert(low);

        assert_eq!(table.get(1, "Bills").unwrap().win_probability, 1.0);
        assert_eq!(table.get(1, "Jets").unwrap().pick_percentage, 0.0);
    }

    #[test]
    fn len_counts_records_across_weeks() {
        let mut table = ProbabilityTable::new();
        assert!(table.is_empty());
        table.insert(record(7, "Bills", 0.8));
        table.insert(record(7, "Jets", 0.4));
        table.insert(record(8, "Bills", 0.6));
        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
        // Duplicate replaces in place, count unchanged.
        table.insert(record(7, "Bills", 0.5));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn teams_playing_excludes_bye_weeks() {
        let table = ProbabilityTable::from_records([
            record(7, "Bills", 0.8),
            record(7, "Jets", 0.4),
            record(8, "Bills", 0.6),
        ]);
        assert_eq!(table.teams_playing(7), vec!["Bills", "Jets"]);
        assert_eq!(table.teams_playing(8), vec!["Bills"]);
        assert_eq!(table.teams(), vec!["Bills", "Jets"]);
        assert_eq!(table.weeks(), vec![7, 8]);
    }

    #[test]
    fn csv_reader_loads_full_and_sparse_rows() {
        let csv_text = "\
week,team,win_probability,pick_percentage,opponent,moneyline,spread
7,Bills,0.80,0.25,Jets,-350,-7.5
7,Jets,0.20,,Bills,,
8,Bills,0.60,0.10,,,
";
        let table = ProbabilityTable::from_csv_reader(csv_text.as_bytes(), "inline").unwrap();
        assert_eq!(table.len(), 3);

        let bills = table.get(7, "Bills").unwrap();
        assert_eq!(bills.opponent.as_deref(), Some("Jets"));
        assert_eq!(bills.moneyline, Some(-350));
        assert_eq!(bills.spread, Some(-7.5));

        let jets = table.get(7, "Jets").unwrap();
        assert_eq!(jets.pick_percentage, DEFAULT_PICK_PERCENTAGE);
        assert!(jets.moneyline.is_none());
    }

    #[test]
    fn csv_reader_skips_malformed_rows() {
        let csv_text = "\
week,team,win_probability
7,Bills,0.80
oops,Jets,0.20
8,Bills,0.60
";
        let table = ProbabilityTable::from_csv_reader(csv_text.as_bytes(), "inline").unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.get(7, "Jets").is_none());
    }

    #[test]
    fn empty_csv_is_an_error() {
        let csv_text = "week,team,win_probability\n";
        match ProbabilityTable::from_csv_reader(csv_text.as_bytes(), "inline") {
            Err(TableError::Empty) => {}
            other => panic!("expected Empty, got {other:?}"),
        }
    }
}
