/// Tunefeed session simulator - replays scripted browsing sessions
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tunefeed_sim::{Runner, Script, SimConfig};

#[derive(Parser)]
#[command(name = "tunefeed-sim")]
#[command(about = "Replay scripted browsing sessions against the video session coordinator", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TUNEFEED_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script and print the report as JSON
    Run {
        /// Script file (JSON)
        script: PathBuf,
        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing; logs go to stderr so the report stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tunefeed_playback=debug,tunefeed_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = SimConfig::load(cli.config.as_deref()).context("loading configuration")?;
    config.validate()?;

    match cli.command {
        Commands::Run { script, pretty } => run(&config, &script, pretty)?,
        Commands::Config => print!("{}", config.to_toml()?),
    }

    Ok(())
}

fn run(config: &SimConfig, path: &Path, pretty: bool) -> anyhow::Result<()> {
    let script =
        Script::load(path).with_context(|| format!("loading script {}", path.display()))?;

    let mut runner = Runner::new(config)?;
    let report = runner.run(&script)?;

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    if !report.passed() {
        anyhow::bail!(
            "{} expectation(s) failed:\n{}",
            report.failed_expectations.len(),
            report.failed_expectations.join("\n")
        );
    }
    Ok(())
}
