//! Area Load Engine CLI Application

use anyhow::Context;
use area_load_engine::engine::{compute_entries_with_progress, compute_instance};
use area_load_engine::io::{read_batch, LoadReport};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

mod cli;
use cli::{Cli, Commands, SettingsArgs};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Info { input, settings } => cmd_info(input, settings),
        Commands::Compute {
            input,
            output,
            settings,
        } => cmd_compute(input, output, settings),
    }
}

fn cmd_info(input: PathBuf, settings: SettingsArgs) -> anyhow::Result<()> {
    println!("Reading batch file: {}", input.display());

    let config = settings.resolve(&input, None)?;
    let entries = read_batch(&input)
        .with_context(|| format!("Failed to read batch file {}", input.display()))?;

    println!("\n{}", "=".repeat(60));
    println!("BATCH INFORMATION");
    println!("{}", "=".repeat(60));
    println!();
    println!("  Instances:    {}", entries.len());
    println!(
        "  Settings:     tolerance {} deg, two-way {:?}, even fallback {}",
        config.settings.angular_tolerance,
        config.settings.two_way_rule,
        config.settings.even_fallback
    );
    println!();

    for entry in &entries {
        let instance = match entry {
            Ok(instance) => instance,
            Err(rejected) => {
                println!(
                    "  - {} [{}, case {}]",
                    rejected.name,
                    rejected.category.code(),
                    rejected.case_id
                );
                println!("      Error:       {}", rejected.error);
                continue;
            }
        };

        println!(
            "  - {} [{} {}, case {}]",
            instance.name,
            instance.load.category().code(),
            instance.load.method().name(),
            instance.load.case_id()
        );

        match compute_instance(instance, &config.settings) {
            Ok(report) => {
                println!("      Area:        {:.6}", report.area.unwrap_or(0.0));
                println!(
                    "      Pressure:    {:.6}",
                    report.effective_pressure.unwrap_or(0.0)
                );
                let weights: Vec<String> =
                    report.weights.iter().map(|w| format!("{:.4}", w)).collect();
                println!("      Weights:     [{}]", weights.join(", "));
                println!("      Records:     {}", report.records.len());
                for diagnostic in &report.diagnostics {
                    println!("      Note:        {}", diagnostic);
                }
            }
            Err(e) => println!("      Error:       {}", e),
        }
    }

    println!();
    println!("{}", "=".repeat(60));

    Ok(())
}

fn cmd_compute(
    input: PathBuf,
    output: Option<PathBuf>,
    settings: SettingsArgs,
) -> anyhow::Result<()> {
    let config = settings.resolve(&input, output.as_deref())?;

    let entries = read_batch(&input)
        .with_context(|| format!("Failed to read batch file {}", input.display()))?;

    let progress = ProgressBar::new(entries.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} instances ({elapsed})")?
            .progress_chars("=> "),
    );

    let reports = compute_entries_with_progress(&entries, &config.settings, |report| {
        if report.is_failed() {
            progress.println(format!("Instance '{}' failed", report.name));
        }
        progress.inc(1);
    });
    progress.finish_and_clear();

    let mut load_report = LoadReport::new(config.input_file.clone(), &config.settings);
    for report in &reports {
        load_report.add_instance(report);
    }

    let output_path = config.output_path();
    load_report
        .export(&output_path)
        .with_context(|| format!("Failed to write report {}", output_path.display()))?;

    let summary = &load_report.summary;
    println!(
        "Computed {} instance(s): {} failed, {} nodal records, {} diagnostics",
        summary.num_instances, summary.num_failed, summary.num_records, summary.num_diagnostics
    );
    println!("Report written to {}", output_path.display());

    Ok(())
}
