use std::path::{Path, PathBuf};

use clap::Parser;

use ecog_align::cli::{Cli, Command, ConvertCommand, RunArgs};
use ecog_align::codec;
use ecog_align::error::{EaError, EaResult};
use ecog_align::logging;
use ecog_align::orchestrator::Engine;
use ecog_align::textgrid::TextGrid;

fn main() {
    logging::init();
    if let Err(error) = run() {
        eprintln!("error [{}]: {error}", error.error_code());
        std::process::exit(1);
    }
}

fn run() -> EaResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run_batch(&args),
        Command::Convert { command } => match command {
            ConvertCommand::ToTextgrid {
                input,
                output,
                tier,
                xmax,
            } => convert_to_textgrid(&input, output, &tier, xmax),
            ConvertCommand::ToText {
                input,
                out_dir,
                prefix,
                tiers,
            } => convert_to_text(&input, out_dir, &prefix, &tiers),
        },
    }
}

fn run_batch(args: &RunArgs) -> EaResult<()> {
    let config = args.load_config()?;
    let engine = Engine::new(config)?;
    let report = engine.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !report.failed.is_empty() {
        println!(
            "Errors occurred for the following patients: {}",
            report.failed.join(", ")
        );
    }
    println!(
        "Processed {} patients ({} failed) in {:.1}s",
        report.processed,
        report.failed.len(),
        report.elapsed_secs
    );
    Ok(())
}

fn convert_to_textgrid(
    input: &Path,
    output: Option<PathBuf>,
    tier: &str,
    xmax: Option<f64>,
) -> EaResult<()> {
    let intervals = codec::read_intervals(input)?;
    let mut grid = TextGrid::from_intervals(tier, &intervals);
    if let Some(xmax) = xmax {
        grid = grid.with_xmax(xmax);
    }
    let output = output.unwrap_or_else(|| input.with_extension("TextGrid"));
    grid.write(&output)?;
    println!("wrote {}", output.display());
    Ok(())
}

fn convert_to_text(
    input: &Path,
    out_dir: Option<PathBuf>,
    prefix: &str,
    tiers: &str,
) -> EaResult<()> {
    let grid = TextGrid::read(input)?;
    let dir = out_dir
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    for tier_name in tiers.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let tier = grid.tier(tier_name).ok_or_else(|| {
            EaError::InvalidRequest(format!(
                "tier `{tier_name}` not found in `{}`",
                input.display()
            ))
        })?;
        let path = dir.join(format!("{prefix}_{tier_name}.txt"));
        codec::write_intervals(&path, &tier.labeled_intervals())?;
        println!("wrote {}", path.display());
    }
    Ok(())
}
