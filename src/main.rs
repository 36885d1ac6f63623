//! ridership-forecast CLI: compare models on a ridership table and forecast ahead.

use anyhow::{bail, Context, Result};
use clap::Parser;
use ridership_forecast::data::{read_observations, SyntheticRidership, INTERVALS_PER_DAY};
use ridership_forecast::evaluation::MapePolicy;
use ridership_forecast::pipeline::{run, PipelineConfig};
use ridership_forecast::report::write_report;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ridership-forecast")]
#[command(author, version)]
#[command(about = "Decompose a ridership series, compare forecasting models and forecast ahead")]
#[command(long_about = "ridership-forecast: STL+ETS, seasonal ARIMA and seasonal naive models \
compared on training and validation windows of a fixed-interval ridership table.

EXAMPLES:
  # Run on a DATE,TIME,DEMAND table
  ridership-forecast --input ridership.csv --output out

  # Run on 28 days of synthetic data and force the final model
  ridership-forecast --synthetic-days 28 --final-model STL+ETS -v")]
struct Cli {
    /// Ridership table with DATE, TIME and DEMAND columns
    #[arg(short, long, conflicts_with = "synthetic_days")]
    input: Option<PathBuf>,

    /// Generate this many days of synthetic ridership instead of reading a file
    #[arg(long)]
    synthetic_days: Option<usize>,

    /// Directory for plots, the forecast CSV and the text report
    #[arg(short, long, default_value = "forecast-output")]
    output: PathBuf,

    /// Intervals per day
    #[arg(long, default_value_t = INTERVALS_PER_DAY)]
    period: usize,

    /// Training days on the whole-dataset series
    #[arg(long, default_value_t = 14)]
    train_days: usize,

    /// Training days on the weekday series
    #[arg(long, default_value_t = 10)]
    weekday_train_days: usize,

    /// Days to forecast past the last observation
    #[arg(long, default_value_t = 3)]
    horizon_days: usize,

    /// Use this model for the final forecast instead of the best by validation RMSE
    #[arg(long)]
    final_model: Option<String>,

    /// Divide MAPE errors by max(|actual|, F) instead of skipping zero actuals
    #[arg(long, value_name = "F")]
    mape_floor: Option<f64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    let observations = match (&cli.input, cli.synthetic_days) {
        (Some(path), _) => read_observations(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(days)) => SyntheticRidership::new(days).with_period(cli.period).generate(),
        (None, None) => bail!("either --input or --synthetic-days is required"),
    };

    let mut config = PipelineConfig::default()
        .with_period(cli.period)
        .with_train_days(cli.train_days)
        .with_weekday_train_days(cli.weekday_train_days)
        .with_horizon_days(cli.horizon_days);
    if let Some(name) = cli.final_model {
        config = config.with_final_model(name);
    }
    if let Some(floor) = cli.mape_floor {
        config = config.with_mape_policy(MapePolicy::Floor(floor));
    }

    let report = run(&observations, &config).context("pipeline failed")?;
    let files = write_report(&report, &cli.output)
        .with_context(|| format!("failed to write report to {}", cli.output.display()))?;

    println!("{}", report.comparison);
    for failure in &report.failures {
        println!("failed: {} on {}: {}", failure.model, failure.series, failure.error);
    }
    println!(
        "final model: {} ({})",
        report.final_forecast.model, report.final_forecast.description
    );
    println!("forecast written to {}", files.forecast_csv.display());

    Ok(())
}
