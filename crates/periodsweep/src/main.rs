use std::path::PathBuf;

use clap::Parser;
use periodsweep::config::parse_range;
use periodsweep::export::write_json;
use periodsweep::headless::{run_headless, summary_line};
use periodsweep::{App, AppConfig, SweepOverrides, init_logging};

#[derive(Parser, Debug)]
#[command(name = "periodsweep")]
#[command(about = "Parallel period sweep of a nonlinear oscillator with a live heatmap")]
struct Args {
    /// Path to the data directory (default: ~/.periodsweep/)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Sweep configuration file (default: {data_dir}/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker pool profile from the configuration file
    #[arg(short, long)]
    profile: Option<String>,

    /// Number of worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// mu range
    #[arg(long, num_args = 3, value_names = ["START", "END", "COUNT"], allow_negative_numbers = true)]
    mu: Option<Vec<f64>>,

    /// nu range
    #[arg(long, num_args = 3, value_names = ["START", "END", "COUNT"], allow_negative_numbers = true)]
    nu: Option<Vec<f64>>,

    /// Minimum milliseconds between plot redraws
    #[arg(long)]
    redraw_ms: Option<u64>,

    /// Log progress instead of drawing the terminal UI
    #[arg(long)]
    headless: bool,

    /// Write the final plot as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Leave the terminal UI as soon as the sweep completes
    #[arg(long)]
    exit_on_complete: bool,
}

impl Args {
    fn overrides(&self) -> color_eyre::Result<SweepOverrides> {
        Ok(SweepOverrides {
            profile: self.profile.clone(),
            workers: self.workers,
            mu: self.mu.as_deref().map(parse_range).transpose()?,
            nu: self.nu.as_deref().map(parse_range).transpose()?,
            redraw_ms: self.redraw_ms,
        })
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".periodsweep")
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let data_dir = args.data_dir.clone().unwrap_or_else(default_data_dir);

    init_logging(&data_dir, &args.log_level, args.headless)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| AppConfig::path(&data_dir));
    let (sweep, profile) = AppConfig::load(&config_path)?.resolve(&args.overrides()?)?;

    tracing::info!(
        rows = sweep.mu.count,
        cols = sweep.nu.count,
        workers = profile.workers,
        headless = args.headless,
        "Starting periodsweep"
    );

    let report = if args.headless {
        run_headless(&sweep, &profile)?
    } else {
        let mut app = App::new(sweep, profile, args.exit_on_complete);
        let report = ratatui::run(|terminal| app.run(terminal));

        if let Err(err) = ratatui::try_restore() {
            tracing::error!("Failed to restore terminal: {err}");
        }

        let report = report?;
        println!("{}", summary_line(&report));
        report
    };

    if let Some(path) = &args.output {
        write_json(path, &report)?;
    }

    tracing::info!("periodsweep shutting down");
    Ok(())
}
