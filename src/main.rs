// Survivor pool optimizer entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr; stdout carries the report)
// 2. Load config
// 3. Load the probability table CSV
// 4. Rank candidates for the current week
// 5. Score them against the pool model
// 6. Print the report

use survivor_optimizer::config;
use survivor_optimizer::optimizer::pool::PoolModel;
use survivor_optimizer::optimizer::ranking;
use survivor_optimizer::report::Report;
use survivor_optimizer::table::ProbabilityTable;

use anyhow::Context;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("survivor optimizer starting up");

    let config = config::load_config().context("failed to load configuration")?;
    let today = chrono::Local::now().date_naive();
    let (current_week, end_week) = config
        .horizon(today)
        .context("failed to resolve optimization horizon")?;
    info!(
        current_week,
        end_week,
        pool_size = config.pool.size,
        "config loaded"
    );

    let table = ProbabilityTable::from_csv_path(&config.data.table)
        .with_context(|| format!("failed to load probability table {}", config.data.table))?;
    info!(
        records = table.len(),
        teams = table.teams().len(),
        "probability table loaded"
    );

    let candidates = ranking::rank_candidates(
        &table,
        &config.data.used_teams,
        current_week,
        end_week,
        config.pool.n_picks,
    )
    .context("candidate ranking failed")?;

    let model = PoolModel::new(config.pool.size);
    let scored = model.score_candidates(candidates);
    info!(picks = scored.len(), "ranking complete");

    let report = Report::new(current_week, end_week, config.pool.size, scored);
    match config.output.format {
        config::OutputFormat::Text => print!("{}", report.to_text()),
        config::OutputFormat::Json => {
            let json = report.to_json().context("failed to serialize report")?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Initialize tracing to stderr so the report on stdout stays clean.
fn init_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("survivor_optimizer=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    // A second init (tests) just keeps the existing subscriber.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
