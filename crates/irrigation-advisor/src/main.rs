//! CLI entry point: dataset summary, model training and irrigation schedules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{info, warn};

use irrigation_advisor::forecast::{ForecastProvider, SimulatedForecast};
use irrigation_advisor::{
    AdvisorConfig, ModelMoisture, MoistureStrategy, Schedule, ScheduleGenerator,
};
use irrigation_learning::{
    ClassificationEngine, FeatureImportance, ModelSummary, PcaInfo, ProgressCallback,
    ProgressUpdate, RegressionEngine, SplitStrategy, TrainingConfig, TrainingData,
};
use irrigation_processing::{
    DatasetConfig, FeaturePreprocessor, Task, filter_by_crop, read_csv, summarize,
};

/// Which engines `train` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliTask {
    /// Soil moisture regression
    Regression,
    /// Relay activation classification
    Classification,
    /// Both, regression first
    Both,
}

impl CliTask {
    fn tasks(self) -> Vec<Task> {
        match self {
            CliTask::Regression => vec![Task::Regression],
            CliTask::Classification => vec![Task::Classification],
            CliTask::Both => vec![Task::Regression, Task::Classification],
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Irrigation decision support from sensor data and weather forecasts",
    long_about = "Trains soil-moisture and relay models on sensor exports and turns a \
                  weather forecast into a daily irrigation schedule.\n\n\
                  EXAMPLES:\n  \
                  # Inspect a dataset\n  \
                  irrigation-advisor summary -i dados_irrigacao.csv\n\n  \
                  # Train both tasks for one crop and save the models\n  \
                  irrigation-advisor train -i dados_irrigacao.csv --crop SOJA --save-dir models/\n\n  \
                  # 7-day schedule from the simulated forecast\n  \
                  irrigation-advisor schedule -i dados_irrigacao.csv --city Campinas --crop SOJA --offline"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print JSON to stdout instead of tables
    ///
    /// Disables all logging so the output can be piped: `... --json | jq .rows`
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Row count, crops, period and columns of a dataset
    Summary {
        /// Path to the CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Only rows of this crop
        #[arg(long)]
        crop: Option<String>,
    },

    /// Train the model roster, select the best model and rank features
    Train {
        /// Path to the CSV file
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, value_enum, default_value = "both")]
        task: CliTask,

        /// Only rows of this crop
        #[arg(long)]
        crop: Option<String>,

        /// Project scaled features onto N principal components
        #[arg(long)]
        pca: Option<usize>,

        /// Write the selected models, scalers and schemas here
        #[arg(long)]
        save_dir: Option<PathBuf>,
    },

    /// Daily irrigation schedule for a city and crop
    Schedule {
        /// Path to the CSV file the moisture model is trained on
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        city: String,

        #[arg(long)]
        crop: String,

        /// Forecast days (defaults to the configured window)
        #[arg(long)]
        days: Option<usize>,

        /// Use the simulated forecast instead of Open-Meteo
        #[arg(long)]
        offline: bool,

        /// Seed for the simulated forecast
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Initialize the tracing subscriber.
///
/// With `json_output` no subscriber is installed, so stdout carries only
/// the JSON document.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet, cli.json);
    dotenv().ok();

    let dataset = DatasetConfig::default();
    match &cli.command {
        Command::Summary { input, crop } => run_summary(&cli, &dataset, input, crop.as_deref()),
        Command::Train {
            input,
            task,
            crop,
            pca,
            save_dir,
        } => {
            let mut builder = TrainingConfig::builder();
            if let Some(n) = pca {
                builder = builder.pca_components(*n);
            }
            let training = builder.build()?;
            let df = load_dataset(input, &dataset, crop.as_deref())?;
            run_train(&cli, &dataset, &training, &df, *task, save_dir.as_deref())
        }
        Command::Schedule {
            input,
            city,
            crop,
            days,
            offline,
            seed,
        } => {
            let advisor = AdvisorConfig::default();
            let days = days.unwrap_or(advisor.forecast_days);
            let df = load_dataset(input, &dataset, None)?;
            run_schedule(&cli, &dataset, &advisor, &df, city, crop, days, *offline, *seed)
        }
    }
}

fn load_dataset(input: &Path, dataset: &DatasetConfig, crop: Option<&str>) -> Result<DataFrame> {
    if !input.exists() {
        return Err(anyhow!("Input file not found: {}", input.display()));
    }
    info!("Loading dataset from: {}", input.display());
    let df = read_csv(input)?;
    info!("Dataset loaded: {:?}", df.shape());

    match crop {
        Some(crop) => {
            let filtered = filter_by_crop(&df, dataset, crop)?;
            if filtered.height() == 0 {
                return Err(anyhow!("No rows for crop '{}'", crop));
            }
            Ok(filtered)
        }
        None => Ok(df),
    }
}

fn progress_logger() -> ProgressCallback {
    Arc::new(|update: ProgressUpdate| {
        info!(
            "[{:.0}%] {}: {}",
            update.progress * 100.0,
            update.stage.as_str(),
            update.message
        );
    })
}

fn training_data(dataset: &DatasetConfig, df: &DataFrame, task: Task) -> Result<TrainingData> {
    let prepared = FeaturePreprocessor::new(dataset.clone()).prepare(df, task)?;
    info!(
        "Prepared {} data: {} rows x {} features ({} rows dropped)",
        task,
        prepared.n_rows(),
        prepared.n_features(),
        prepared.report.rows_dropped
    );
    Ok(TrainingData::try_from(&prepared)?)
}

fn train_regression(
    cli: &Cli,
    dataset: &DatasetConfig,
    training: &TrainingConfig,
    df: &DataFrame,
) -> Result<RegressionEngine> {
    let data = training_data(dataset, df, Task::Regression)?;
    let mut engine = RegressionEngine::new(training.clone());
    if !cli.quiet && !cli.json {
        engine = engine.on_progress(progress_logger());
    }
    engine.train(&data)?;
    Ok(engine)
}

fn train_classification(
    cli: &Cli,
    dataset: &DatasetConfig,
    training: &TrainingConfig,
    df: &DataFrame,
) -> Result<ClassificationEngine> {
    let data = training_data(dataset, df, Task::Classification)?;
    let mut engine = ClassificationEngine::new(training.clone());
    if !cli.quiet && !cli.json {
        engine = engine.on_progress(progress_logger());
    }
    engine.train(&data)?;
    Ok(engine)
}

// =============================================================================
// summary
// =============================================================================

fn run_summary(cli: &Cli, dataset: &DatasetConfig, input: &Path, crop: Option<&str>) -> Result<()> {
    let df = load_dataset(input, dataset, crop)?;
    let summary = summarize(&df, dataset)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("DATASET SUMMARY");
    println!("{}\n", "=".repeat(80));
    println!("  File: {}", input.display());
    if let Some(crop) = crop {
        println!("  Crop filter: {}", crop);
    }
    println!("  Rows: {}", summary.total_rows);
    println!("  Crops: {}", summary.crops.join(", "));
    match &summary.period {
        Some(period) => println!("  Period: {} to {}", period.start, period.end),
        None => println!("  Period: unknown"),
    }
    println!("  Columns ({}):", summary.columns.len());
    for column in &summary.columns {
        println!("    - {}", column);
    }
    println!("{}", "=".repeat(80));
    Ok(())
}

// =============================================================================
// train
// =============================================================================

/// Outcome of one task, printed as a table or as JSON.
#[derive(Debug, Serialize)]
struct TrainReport {
    task: Task,
    roster: Vec<ModelSummary>,
    best_model: Option<String>,
    feature_importance: FeatureImportance,
    pca: Option<PcaInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    split_strategy: Option<SplitStrategy>,
}

fn run_train(
    cli: &Cli,
    dataset: &DatasetConfig,
    training: &TrainingConfig,
    df: &DataFrame,
    task: CliTask,
    save_dir: Option<&Path>,
) -> Result<()> {
    if let Some(dir) = save_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut reports = Vec::new();
    for task in task.tasks() {
        info!("{}", "=".repeat(80));
        info!("Training {} models...", task);
        info!("{}", "=".repeat(80));

        let report = match task {
            Task::Regression => {
                let engine = train_regression(cli, dataset, training, df)?;
                if let Some(dir) = save_dir {
                    engine.save(dir)?;
                    info!("Saved regression model to {}", dir.display());
                }
                TrainReport {
                    task,
                    roster: engine.summaries(),
                    best_model: engine.best_model_name().map(str::to_string),
                    feature_importance: engine.feature_importance(),
                    pca: engine.pca_info(),
                    split_strategy: None,
                }
            }
            Task::Classification => {
                let engine = train_classification(cli, dataset, training, df)?;
                if let Some(dir) = save_dir {
                    engine.save(dir)?;
                    info!("Saved classification model to {}", dir.display());
                }
                TrainReport {
                    task,
                    roster: engine.summaries(),
                    best_model: engine.best_model_name().map(str::to_string),
                    feature_importance: engine.feature_importance(),
                    pca: engine.pca_info(),
                    split_strategy: engine.split_strategy(),
                }
            }
        };
        reports.push(report);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_train_report(report);
        }
    }
    Ok(())
}

fn print_train_report(report: &TrainReport) {
    println!("\n{}", "=".repeat(80));
    println!("{} MODELS", report.task.as_str().to_uppercase());
    println!("{}\n", "=".repeat(80));

    println!(
        "{:<22} {:>10} {:>10} {:>10} {:<10}",
        "Model", "Test", "Train", "Time (s)", "Overfit"
    );
    println!("{}", "-".repeat(66));
    for row in &report.roster {
        let marker = if report.best_model.as_deref() == Some(row.name.as_str()) {
            " *"
        } else {
            ""
        };
        println!(
            "{:<22} {:>10.4} {:>10.4} {:>10.2} {:<10}{}",
            row.name,
            row.test_score,
            row.train_score,
            row.training_time_seconds,
            row.overfitting_risk,
            marker
        );
    }
    if let Some(metric) = report.roster.first().map(|r| r.metric.as_str()) {
        println!("\n  Scores are {} on the held-out partition.", metric);
    }
    if let Some(best) = &report.best_model {
        println!("  Best model: {}", best);
    }
    if let Some(strategy) = report.split_strategy {
        println!("  Split: {:?}", strategy);
    }
    if let Some(pca) = &report.pca {
        println!(
            "  PCA: {} components, {:.1}% variance explained",
            pca.n_components,
            pca.total_explained_variance * 100.0
        );
    }

    println!("\nFEATURE IMPORTANCE");
    println!("{}", "-".repeat(40));
    match &report.feature_importance {
        FeatureImportance::Ranked { model, scores } => {
            println!("  Source: {}", model);
            for score in scores.iter().take(10) {
                println!("  {:<32} {:>6.1}%", score.feature, score.importance_percent);
            }
        }
        FeatureImportance::Unavailable => {
            println!("  Not available for the selected model");
        }
    }
}

// =============================================================================
// schedule
// =============================================================================

#[cfg(feature = "http")]
fn live_forecast(advisor: &AdvisorConfig, simulated: SimulatedForecast) -> Result<Box<dyn ForecastProvider>> {
    use irrigation_advisor::forecast::{FallbackForecast, OpenMeteoForecast};

    let live = OpenMeteoForecast::new(advisor)?;
    Ok(Box::new(FallbackForecast::new(Box::new(live), simulated)))
}

#[cfg(not(feature = "http"))]
fn live_forecast(_advisor: &AdvisorConfig, simulated: SimulatedForecast) -> Result<Box<dyn ForecastProvider>> {
    warn!("HTTP support not compiled in. Using simulated forecast.");
    warn!("Compile with --features http to enable Open-Meteo.");
    Ok(Box::new(simulated))
}

#[allow(clippy::too_many_arguments)]
fn run_schedule(
    cli: &Cli,
    dataset: &DatasetConfig,
    advisor: &AdvisorConfig,
    df: &DataFrame,
    city: &str,
    crop: &str,
    days: usize,
    offline: bool,
    seed: Option<u64>,
) -> Result<()> {
    if !advisor.is_registered(city) {
        warn!("'{}' is not a registered municipality; using default coordinates", city);
    }

    let engine = train_regression(cli, dataset, &TrainingConfig::default(), df)?;
    let moisture = match ModelMoisture::new(&engine, dataset, advisor) {
        Ok(model) => MoistureStrategy::Model(model),
        Err(e) => {
            warn!("Moisture model unavailable ({}); using empirical formula", e);
            MoistureStrategy::default()
        }
    };

    let simulated = seed.map_or_else(SimulatedForecast::new, SimulatedForecast::with_seed);
    let forecast = if offline {
        info!("Offline mode: using simulated forecast");
        Box::new(simulated) as Box<dyn ForecastProvider>
    } else {
        live_forecast(advisor, simulated)?
    };

    let schedule = ScheduleGenerator::new(forecast.as_ref(), advisor)
        .with_moisture(moisture)
        .generate(city, crop, days);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        print_schedule(&schedule);
    }
    Ok(())
}

fn print_schedule(schedule: &Schedule) {
    println!("\n{}", "=".repeat(80));
    println!("IRRIGATION SCHEDULE - {} / {}", schedule.location, schedule.crop);
    println!("{}\n", "=".repeat(80));

    if schedule.is_empty() {
        println!("  No forecast available; no schedule generated.");
        println!("{}", "=".repeat(80));
        return;
    }
    if let Some(provider) = &schedule.provider {
        println!("  Forecast: {}\n", provider);
    }

    println!(
        "{:<11} {:<8} {:>6} {:>7} {:>7} {:>8} {:<8} {:<6}",
        "Date", "Day", "Temp", "Rain%", "Rain mm", "Moist%", "Irrigate", "Time"
    );
    println!("{}", "-".repeat(70));
    for row in &schedule.rows {
        println!(
            "{:<11} {:<8} {:>6.1} {:>7.1} {:>7.1} {:>8.1} {:<8} {:<6}",
            row.date,
            row.weekday,
            row.temperature,
            row.rain_probability,
            row.rain_mm,
            row.predicted_moisture,
            if row.should_irrigate { "yes" } else { "no" },
            row.recommended_time.as_deref().unwrap_or("-")
        );
    }

    println!("\nRECOMMENDATIONS");
    println!("{}", "-".repeat(40));
    for row in &schedule.rows {
        println!("  {} ({}): {}", row.date, row.moisture_source, row.recommendation);
        println!("      {}", row.justification);
    }

    println!("\n{}", "=".repeat(80));
    println!(
        "{} of {} days need irrigation",
        schedule.irrigation_days().count(),
        schedule.len()
    );
    println!("{}", "=".repeat(80));
}
