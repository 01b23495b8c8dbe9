//! CLI commands and interface

use anyhow::Context;
use area_load_engine::config::BatchConfig;
use area_load_engine::loads::TwoWayRule;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "alc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize surfaces, pressures and edge weights of a batch file
    Info {
        /// Path to the JSON batch file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Compute nodal loads for every instance in a batch file
    Compute {
        /// Path to the JSON batch file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output report path (defaults to <input>_loads.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Distribution settings shared by every command that computes loads
#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Configuration file (JSON) with distribution settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Angular tolerance in degrees
    #[arg(long)]
    pub angular_tolerance: Option<f64>,

    /// Spread one-way loads evenly when fewer than two support lines qualify
    #[arg(long)]
    pub even_fallback: bool,

    /// Two-way group share rule
    #[arg(long, value_enum)]
    pub two_way_rule: Option<RuleArg>,
}

impl SettingsArgs {
    /// Batch configuration for `input`: config file first, then flag overrides
    pub fn resolve(&self, input: &Path, output: Option<&Path>) -> anyhow::Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => BatchConfig::new(input.display().to_string(), None),
        };
        config.input_file = input.display().to_string();
        if let Some(output) = output {
            config.output_file = Some(output.display().to_string());
        }

        Ok(config.with_overrides(
            self.angular_tolerance,
            self.even_fallback,
            self.two_way_rule.map(Into::into),
        )?)
    }
}

/// Command-line names for [`TwoWayRule`]
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RuleArg {
    /// Share by the other groups' edge length
    Length,
    /// Share by span^-4
    Slab,
}

impl From<RuleArg> for TwoWayRule {
    fn from(arg: RuleArg) -> Self {
        match arg {
            RuleArg::Length => TwoWayRule::LengthProportional,
            RuleArg::Slab => TwoWayRule::SlabAnalogy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use area_load_engine::loads::DistributionSettings;
    use tempfile::tempdir;

    fn settings_of(command: Commands) -> SettingsArgs {
        match command {
            Commands::Info { settings, .. } | Commands::Compute { settings, .. } => settings,
        }
    }

    #[test]
    fn test_info_accepts_settings_flags() {
        let cli = Cli::try_parse_from([
            "alc",
            "info",
            "batch.json",
            "--angular-tolerance",
            "5",
            "--even-fallback",
            "--two-way-rule",
            "slab",
        ])
        .unwrap();

        let config = settings_of(cli.command)
            .resolve(Path::new("batch.json"), None)
            .unwrap();
        assert_eq!(
            config.settings,
            DistributionSettings::new(5.0)
                .with_even_fallback(true)
                .with_two_way_rule(TwoWayRule::SlabAnalogy)
        );
    }

    #[test]
    fn test_info_and_compute_resolve_alike() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = BatchConfig::new("other.json".to_string(), None);
        config.settings = DistributionSettings::new(12.0);
        config.to_file(&path).unwrap();
        let config_arg = path.display().to_string();

        let info = Cli::try_parse_from(["alc", "info", "batch.json", "-c", &config_arg]).unwrap();
        let compute = Cli::try_parse_from([
            "alc",
            "compute",
            "batch.json",
            "--config",
            &config_arg,
        ])
        .unwrap();

        let from_info = settings_of(info.command)
            .resolve(Path::new("batch.json"), None)
            .unwrap();
        let from_compute = settings_of(compute.command)
            .resolve(Path::new("batch.json"), None)
            .unwrap();

        assert_eq!(from_info.settings, from_compute.settings);
        assert_eq!(from_info.settings.angular_tolerance, 12.0);
        assert_eq!(from_info.input_file, "batch.json");
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli =
            Cli::try_parse_from(["alc", "info", "batch.json", "--angular-tolerance", "50"]).unwrap();
        assert!(settings_of(cli.command)
            .resolve(Path::new("batch.json"), None)
            .is_err());
    }
}
