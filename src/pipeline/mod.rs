//! End-to-end run: build series, compare candidates, forecast with the winner.
//!
//! # Example
//! ```no_run
//! use ridership_forecast::data::SyntheticRidership;
//! use ridership_forecast::pipeline::{run, PipelineConfig};
//!
//! let observations = SyntheticRidership::new(28).generate();
//! let report = run(&observations, &PipelineConfig::default()).unwrap();
//! println!("{}", report.comparison);
//! println!("final model: {}", report.final_forecast.model);
//! ```

mod assemble;
mod config;

pub use assemble::{
    assemble, synthesize_timestamps, CombinedPoint, CombinedSeries, FinalForecast, PointKind,
    TimestampPlan,
};
pub use config::PipelineConfig;

use crate::core::TimeSeries;
use crate::data::{Observation, SeriesBuilder, ALL_DAYS, WEEKDAYS};
use crate::error::{ForecastError, Result};
use crate::evaluation::{evaluate, ComparisonTable, Segment};
use crate::models::{AutoARIMA, ModelRegistry, SeasonalNaive, STLETSForecaster, SARIMA};
use crate::seasonality::{STLResult, STL};
use crate::validation::{train_valid_split, ResidualDiagnostics};
use tracing::{info, warn};

/// A candidate that could not be fitted or evaluated on one series.
#[derive(Debug, Clone, PartialEq)]
pub struct FitFailure {
    pub model: String,
    pub series: String,
    pub error: ForecastError,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub full: TimeSeries,
    pub weekdays: TimeSeries,
    /// Diagnostic decomposition of the whole-dataset series.
    pub decomposition: STLResult,
    pub comparison: ComparisonTable,
    pub failures: Vec<FitFailure>,
    pub final_forecast: FinalForecast,
    /// Residuals of the refit final model, warm-up excluded.
    pub residuals: Vec<f64>,
    pub diagnostics: ResidualDiagnostics,
}

/// The candidates compared in every run, in evaluation order.
pub fn candidates(config: &PipelineConfig) -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry.register(STLETSForecaster::new(config.period).with_window(config.seasonal_window));
    if config.include_auto_arima {
        registry.register(AutoARIMA::seasonal(config.period));
    }
    for spec in &config.manual_orders {
        registry.register(SARIMA::new(*spec));
    }
    registry.register(SeasonalNaive::new(config.period));
    registry
}

/// Run the whole pipeline on an observation table.
pub fn run(observations: &[Observation], config: &PipelineConfig) -> Result<PipelineReport> {
    let builder = SeriesBuilder::new(config.period).with_missing_policy(config.missing_policy);
    let full = builder.build(observations)?;
    let weekdays = builder.build_weekdays(observations)?;
    run_on_series(full, weekdays, config)
}

/// Run the pipeline on already built series.
///
/// The series are relabelled so comparison rows always read
/// `all days` / `weekdays`.
pub fn run_on_series(
    full: TimeSeries,
    weekdays: TimeSeries,
    config: &PipelineConfig,
) -> Result<PipelineReport> {
    let full = full.with_label(ALL_DAYS);
    let weekdays = weekdays.with_label(WEEKDAYS);
    let decomposition = STL::new(config.period)
        .with_window(config.seasonal_window)
        .decompose(full.values())?;
    info!(
        seasonal_strength = decomposition.seasonal_strength(),
        trend_strength = decomposition.trend_strength(),
        "decomposed full series"
    );

    let registry = candidates(config);
    let mut comparison = ComparisonTable::new();
    let mut failures = Vec::new();

    for (name, series, train_days, valid_days) in [
        (ALL_DAYS, &full, config.train_days, config.valid_days),
        (WEEKDAYS, &weekdays, config.weekday_train_days, config.weekday_valid_days),
    ] {
        compare_on(
            &registry,
            name,
            series,
            train_days,
            valid_days,
            config,
            &mut comparison,
            &mut failures,
        )?;
    }

    let chosen = select_final_model(&comparison, &registry, config)?;
    let model = registry
        .get(&chosen)
        .ok_or_else(|| ForecastError::InvalidParameter(format!("unknown model {chosen}")))?;

    info!(model = %chosen, len = weekdays.len(), "refitting final model on weekday series");
    let fitted = model.fit(&weekdays)?;
    let plan = TimestampPlan {
        anchor: config.forecast_anchor,
        step: config.forecast_step,
    };
    let final_forecast = assemble(&chosen, fitted.as_ref(), &weekdays, config.horizon(), plan)?;

    let residuals = fitted
        .residuals()
        .get(fitted.warmup()..)
        .unwrap_or_default()
        .to_vec();
    let diagnostics = ResidualDiagnostics::compute(&residuals, config.period, fitted.num_params());
    if !diagnostics.ljung_box.is_white_noise(0.05) {
        info!(
            q = diagnostics.ljung_box.statistic,
            p = diagnostics.ljung_box.p_value,
            "final model residuals remain autocorrelated"
        );
    }

    Ok(PipelineReport {
        full,
        weekdays,
        decomposition,
        comparison,
        failures,
        final_forecast,
        residuals,
        diagnostics,
    })
}

/// Fit every candidate on the training segment and score both segments.
fn compare_on(
    registry: &ModelRegistry,
    name: &str,
    series: &TimeSeries,
    train_days: usize,
    valid_days: Option<usize>,
    config: &PipelineConfig,
    table: &mut ComparisonTable,
    failures: &mut Vec<FitFailure>,
) -> Result<()> {
    let split = train_valid_split(series, train_days, valid_days)?;
    info!(
        series = name,
        train = split.train.len(),
        valid = split.valid.len(),
        discarded = split.discarded(series.len()),
        "split series"
    );

    for model in registry.iter() {
        let scored = model.fit(&split.train).and_then(|fitted| {
            let skip = fitted.warmup().min(split.train.len());
            let training = if skip < split.train.len() {
                Some(evaluate(
                    &split.train.values()[skip..],
                    &fitted.fitted_values()[skip..],
                    config.mape_policy,
                )?)
            } else {
                None
            };
            let forecast = fitted.forecast(split.valid.len())?;
            let validation = evaluate(split.valid.values(), forecast.values(), config.mape_policy)?;
            Ok((training, validation))
        });

        match scored {
            Ok((training, validation)) => {
                if let Some(m) = training {
                    table.push(model.name(), name, Segment::Training, m);
                }
                info!(
                    model = model.name(),
                    series = name,
                    rmse = validation.rmse,
                    mape = validation.mape,
                    "evaluated candidate"
                );
                table.push(model.name(), name, Segment::Validation, validation);
            }
            Err(error) => {
                warn!(model = model.name(), series = name, %error, "candidate failed");
                failures.push(FitFailure {
                    model: model.name().to_string(),
                    series: name.to_string(),
                    error,
                });
            }
        }
    }
    Ok(())
}

/// The explicit override if configured, otherwise the weekday validation winner.
pub fn select_final_model(
    table: &ComparisonTable,
    registry: &ModelRegistry,
    config: &PipelineConfig,
) -> Result<String> {
    if let Some(name) = &config.final_model {
        if registry.get(name).is_none() {
            return Err(ForecastError::InvalidParameter(format!(
                "final model {name} is not one of {:?}",
                registry.names()
            )));
        }
        return Ok(name.clone());
    }

    table
        .best(WEEKDAYS, Segment::Validation, config.selection_metric)
        .map(|r| r.model.clone())
        .ok_or_else(|| {
            ForecastError::ComputationError(
                "no candidate produced weekday validation metrics".to_string(),
            )
        })
}
