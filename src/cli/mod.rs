//! Crop Advisor CLI Module
//!
//! Command-line interface for training, prediction and dataset inspection.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::feature_engineering::SoilSample;
use crate::inference::CropRecommender;
use crate::optimizer::ParamGrid;
use crate::preprocessing::OutlierScan;
use crate::training::{TrainEngine, TrainingConfig};
use crate::utils::DatasetLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

/// Print a multi-line block indented under the current section
fn block(text: &str) {
    for line in text.lines() {
        println!("  {}", line);
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "crop-advisor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and query a crop recommendation model")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model and write the artifacts
    Train(TrainArgs),

    /// Recommend a crop for one set of readings
    Predict(PredictArgs),

    /// Show dataset statistics and outliers
    Info {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Input CSV file
    #[arg(short, long)]
    pub data: PathBuf,

    /// Directory for the model bundle and metadata
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// JSON training config; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of cross-validation folds
    #[arg(long)]
    pub cv_folds: Option<usize>,

    /// Fraction of rows held out for evaluation
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Stop the grid search after this many candidates
    #[arg(long)]
    pub max_trials: Option<usize>,

    /// Stop the grid search after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<f64>,

    /// Worker threads
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Use a small grid for smoke runs
    #[arg(long)]
    pub quick: bool,
}

impl TrainArgs {
    /// Merge flags over the config file (or the defaults)
    pub fn to_config(&self) -> anyhow::Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::from_json_file(path)?,
            None => TrainingConfig::default(),
        };
        config.data_path = self.data.clone();
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(seed) = self.seed {
            config.random_state = seed;
        }
        if let Some(folds) = self.cv_folds {
            config.cv_folds = folds;
        }
        if let Some(test_size) = self.test_size {
            config.test_size = test_size;
        }
        if let Some(n) = self.max_trials {
            config.budget.max_trials = Some(n);
        }
        if let Some(secs) = self.timeout_secs {
            config.budget.timeout_secs = Some(secs);
        }
        if let Some(jobs) = self.jobs {
            config.n_jobs = Some(jobs);
        }
        if self.quick {
            config.grid = ParamGrid::quick();
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Model bundle produced by `train`
    #[arg(short, long)]
    pub model: PathBuf,

    /// Nitrogen
    #[arg(long = "n", allow_negative_numbers = true)]
    pub n: f64,

    /// Phosphorus
    #[arg(long = "p", allow_negative_numbers = true)]
    pub p: f64,

    /// Potassium
    #[arg(long = "k", allow_negative_numbers = true)]
    pub k: f64,

    /// Temperature (°C)
    #[arg(long, allow_negative_numbers = true)]
    pub temperature: f64,

    /// Relative humidity (%)
    #[arg(long)]
    pub humidity: f64,

    /// Soil pH
    #[arg(long)]
    pub ph: f64,

    /// Rainfall (mm)
    #[arg(long)]
    pub rainfall: f64,

    /// Also list this many alternatives
    #[arg(long, default_value = "3")]
    pub top: usize,
}

impl PredictArgs {
    pub fn sample(&self) -> SoilSample {
        SoilSample::new(self.n, self.p, self.k, self.temperature, self.humidity, self.ph, self.rainfall)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(args: &TrainArgs) -> anyhow::Result<()> {
    section("Train");

    let config = args.to_config()?;
    println!("  {:<16} {}", muted("Data"), config.data_path.display());
    println!("  {:<16} {}", muted("Output"), config.output_dir.display());
    println!("  {:<16} {}", muted("Candidates"), config.grid.len());
    println!("  {:<16} {}", muted("CV folds"), config.cv_folds);
    println!();

    step_run("Training");
    let start = Instant::now();
    let outcome = TrainEngine::new(config).run()?;
    step_done(&format!("{:.1?}", start.elapsed()));

    println!();
    block(&outcome.report.generate_report());

    if let Some(paths) = &outcome.artifacts {
        section("Artifacts");
        println!("  {} {}", ok("✓"), paths.bundle.display());
        println!("  {} {}", ok("✓"), paths.metadata.display());
    }

    println!();
    println!(
        "  {:<16} {}",
        muted("Accuracy"),
        format!("{:.4}", outcome.report.test_accuracy).white().bold()
    );
    println!();

    Ok(())
}

pub fn cmd_predict(args: &PredictArgs) -> anyhow::Result<()> {
    section("Predict");

    step_run(&format!("Loading {}", args.model.display()));
    let recommender = CropRecommender::load(&args.model)?;
    step_done(&format!("{} crops", recommender.crops().len()));

    let sample = args.sample();
    let best = recommender.recommend(&sample)?;

    println!();
    println!(
        "  {:<16} {} {}",
        muted("Recommended"),
        best.crop.white().bold(),
        dim(&format!("({:.1}%)", best.confidence * 100.0))
    );

    if args.top > 1 {
        println!();
        for (rank, alt) in recommender.top_k(&sample, args.top)?.iter().enumerate() {
            println!("  {:>2}. {:<16} {:>6.1}%", rank + 1, alt.crop, alt.confidence * 100.0);
        }
    }

    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let dataset = DatasetLoader::new().load(data_path)?;
    let report = dataset.describe();

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!();
    block(&report.to_string());

    section("Outliers (IQR)");
    let scan = OutlierScan::default().scan(dataset.features(), dataset.feature_names())?;
    for summary in &scan {
        println!("  {}", summary);
    }

    println!();
    Ok(())
}
