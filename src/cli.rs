use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Config, PatientSelection};
use crate::error::EaResult;

#[derive(Debug, Parser)]
#[command(name = "ecog_align")]
#[command(about = "Batch forced-alignment pipeline for ECoG speech-task recordings")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the batch pipeline over the configured patients.
    Run(RunArgs),
    /// Standalone conversions between flat interval text and TextGrid.
    Convert {
        #[command(subcommand)]
        command: ConvertCommand,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the pipeline configuration file (JSON).
    #[arg(long)]
    pub config: PathBuf,

    /// Override the configured patient selection: `all` or a
    /// comma-separated list of identifiers.
    #[arg(long)]
    pub patients: Option<String>,

    /// Halt on the first per-patient failure instead of isolating it.
    #[arg(long)]
    pub debug: bool,

    /// Stop each patient after stimulus annotation.
    #[arg(long)]
    pub only_stims: bool,

    /// Print the end-of-run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Load the config file and apply CLI overrides.
    pub fn load_config(&self) -> EaResult<Config> {
        let mut config = Config::load(&self.config)?;
        if let Some(spec) = &self.patients {
            let prefixes = match &config.patients {
                PatientSelection::All { prefixes } => prefixes.clone(),
                PatientSelection::List(_) => Vec::new(),
            };
            config.patients = PatientSelection::from_spec(spec, prefixes);
        }
        if self.debug {
            config.debug_mode = true;
        }
        if self.only_stims {
            config.only_stims = true;
        }
        Ok(config)
    }
}

#[derive(Debug, Subcommand)]
pub enum ConvertCommand {
    /// Convert a flat interval text file to a single-tier TextGrid.
    ToTextgrid {
        /// Flat interval text input.
        input: PathBuf,

        /// Output path (defaults to the input with a .TextGrid extension).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Name of the interval tier to create.
        #[arg(long, default_value = "words")]
        tier: String,

        /// Override the grid end time (e.g. the recording duration).
        #[arg(long)]
        xmax: Option<f64>,
    },
    /// Extract tiers of a TextGrid into flat interval text files.
    ToText {
        /// TextGrid input.
        input: PathBuf,

        /// Output directory (defaults to the TextGrid's directory).
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Output filename prefix; files are named `<prefix>_<tier>.txt`.
        #[arg(long, default_value = "mfa_resp")]
        prefix: String,

        /// Comma-separated tier names to extract.
        #[arg(long, default_value = "words,phones")]
        tiers: String,
    },
}
