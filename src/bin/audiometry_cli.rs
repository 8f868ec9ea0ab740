use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use audiometry_engine::config::AppConfig;
use audiometry_engine::estimator::ThresholdEstimator;
use audiometry_engine::fit_test::{FitReading, FitTestEvaluator};
use audiometry_engine::result::AudiometryTestResult;
use audiometry_engine::testing::{run_to_completion, SimulatedListener};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "audiometry_cli",
    about = "Deterministic session harness for the audiometry engine"
)]
struct Cli {
    /// Override path to a JSON config file (defaults to built-in config)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a simulated screening session and print the result as JSON
    Simulate {
        /// Flat true threshold of the simulated listener, in dBHL
        #[arg(long, default_value_t = 25.0)]
        threshold: f64,
        /// Probability of missing an audible tone
        #[arg(long, default_value_t = 0.0)]
        lapse_rate: f64,
        /// RNG seed for the lapse model
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Write the result JSON to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Evaluate one fit-test reading against the configured thresholds
    FitTest {
        #[arg(long)]
        seal_left: f64,
        #[arg(long)]
        seal_right: f64,
        #[arg(long)]
        confidence_left: f64,
        #[arg(long)]
        confidence_right: f64,
    },
    /// Print the default configuration as JSON
    DumpConfig,
}

fn main() -> ExitCode {
    audiometry_engine::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Simulate {
            threshold,
            lapse_rate,
            seed,
            output,
        } => run_simulate(config, threshold, lapse_rate, seed, output),
        Commands::FitTest {
            seal_left,
            seal_right,
            confidence_left,
            confidence_right,
        } => run_fit_test(
            config,
            FitReading {
                seal_left_ear: seal_left,
                seal_right_ear: seal_right,
                confidence_left_ear: confidence_left,
                confidence_right_ear: confidence_right,
            },
        ),
        Commands::DumpConfig => run_dump_config(config),
    }
}

fn run_simulate(
    config: AppConfig,
    threshold: f64,
    lapse_rate: f64,
    seed: u64,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let mut estimator = ThresholdEstimator::new(config.tone_test)
        .context("step configuration rejected")?;
    let mut listener = SimulatedListener::flat(threshold).with_lapses(lapse_rate, seed);

    let result = run_to_completion(&mut estimator, &mut listener);
    let untestable = result
        .samples
        .iter()
        .filter(|sample| !sample.has_valid_threshold())
        .count();

    let json = serde_json::to_string_pretty(&AudiometryTestResult::Screener(result))
        .context("failed to serialize result")?;
    match output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("failed to write {path:?}"))?;
            println!("Result written to {}", path.display());
        }
        None => println!("{json}"),
    }

    if untestable > 0 {
        eprintln!("{untestable} frequency(ies) untestable");
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_fit_test(config: AppConfig, reading: FitReading) -> Result<ExitCode> {
    let evaluator = FitTestEvaluator::new(&config.fit_test);
    let sample = evaluator.evaluate(reading);

    let json = serde_json::to_string_pretty(&sample).context("failed to serialize sample")?;
    println!("{json}");

    let pass = sample.left_seal_success && sample.right_seal_success && !sample.low_confidence;
    Ok(if pass {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn run_dump_config(config: AppConfig) -> Result<ExitCode> {
    let json = serde_json::to_string_pretty(&config).context("failed to serialize config")?;
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}
