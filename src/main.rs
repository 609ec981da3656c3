use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use stagemerge::app::App;
use stagemerge::config::Config;
use stagemerge::merge::{ExitReason, MergeOptions};
use stagemerge::{logging, replay, stage_file};

#[derive(Parser)]
#[command(name = "stagemerge")]
#[command(about = "Manually merge workflow stages")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open an interactive merge session over a stage file
    Edit {
        /// JSON array of stages
        input: PathBuf,

        /// Where to write the merged stages (default: overwrite input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply a scripted list of gestures without a terminal
    Replay {
        /// JSON array of stages
        input: PathBuf,

        /// JSON array of script steps
        #[arg(short, long)]
        script: PathBuf,

        /// Where to write the merged stages (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let is_tui_mode = matches!(cli.command, Commands::Edit { .. });
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    match cli.command {
        Commands::Edit { input, output } => {
            let result = cmd_edit(&config, &input, output.as_deref());
            print_log_location(logging_handle.log_file_path.as_deref());
            result?;
        }
        Commands::Replay {
            input,
            script,
            output,
        } => {
            cmd_replay(&config, &input, &script, output.as_deref())?;
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn cmd_edit(config: &Config, input: &Path, output: Option<&Path>) -> Result<()> {
    let stages = stage_file::read_stages(input)?;
    let host = App::new(&stages, config).run()?;

    match (host.exit, host.saved) {
        (Some(ExitReason::Committed), Some(saved)) => {
            let target = output.unwrap_or(input);
            stage_file::write_stages(target, &saved)?;
            eprintln!(
                "Saved {} stage(s) to {} (was {})",
                saved.len(),
                target.display(),
                stages.len()
            );
        }
        _ => eprintln!("Exited without saving"),
    }
    Ok(())
}

fn cmd_replay(config: &Config, input: &Path, script: &Path, output: Option<&Path>) -> Result<()> {
    let stages = stage_file::read_stages(input)?;
    let steps = replay::load_script(script)?;
    let report = replay::replay(&stages, &steps, MergeOptions::from(&config.merge))?;

    tracing::info!(
        outcomes = report.outcomes.len(),
        pruned = report.pruned.len(),
        exit = ?report.exit,
        "Replay finished"
    );

    match report.saved {
        Some(saved) => match output {
            Some(path) => stage_file::write_stages(path, &saved)?,
            None => stage_file::print_stages(&saved)?,
        },
        None => eprintln!("Script did not commit; nothing written"),
    }
    Ok(())
}

/// Print log file path on exit if logs were written
fn print_log_location(log_file_path: Option<&Path>) {
    if let Some(log_path) = log_file_path {
        if let Ok(metadata) = log_path.metadata() {
            if metadata.len() > 0 {
                eprintln!("Session log: {}", log_path.display());
            }
        }
    }
}
