use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::ExecutionMode;
use crate::detection::FocusArea;

/// How far `decruft run` goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum RunMode {
    /// Phase 1 only
    DetectionOnly,
    /// Phases 1 and 2
    AssessmentOnly,
    /// Describe every step without changing anything
    DryRun,
    /// Execute SAFE removals only
    SafeOnly,
    /// Execute every step, halting on the first failure
    BatchExecution,
    /// Execute every step with a confirmation per step
    ManualReview,
}

impl RunMode {
    /// Executor mode, `None` for the non-executing modes.
    pub fn execution_mode(&self) -> Option<ExecutionMode> {
        match self {
            RunMode::DetectionOnly | RunMode::AssessmentOnly => None,
            RunMode::DryRun => Some(ExecutionMode::DryRun),
            RunMode::SafeOnly => Some(ExecutionMode::SafeOnly),
            RunMode::BatchExecution => Some(ExecutionMode::BatchExecution),
            RunMode::ManualReview => Some(ExecutionMode::ManualReview),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "decruft")]
#[command(about = "Find, assess and remove legacy technology from a repository", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colours and Unicode table borders
    #[arg(long, global = true, env = "DECRUFT_PLAIN")]
    pub plain: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Phase 1: scan for legacy libraries, directories, files and configs
    Detect {
        /// Repository root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Configuration file (defaults to the nearest .decruft.yml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Run directory (defaults to legacy-removal-output/<session-id>)
        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,

        /// Scanners to run: dependencies, dirs, files, configs
        #[arg(long, value_delimiter = ',')]
        focus: Vec<FocusArea>,
    },

    /// Phase 2: assess impact and write a removal plan
    Assess {
        /// Repository root
        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Inventory CSV from `detect`; scans afresh when omitted
        #[arg(long)]
        inventory: Option<PathBuf>,

        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,
    },

    /// Phase 3: execute a removal plan
    Execute {
        /// Repository root
        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Removal plan CSV from `assess`
        #[arg(long)]
        plan: PathBuf,

        /// dry_run, safe_only, batch_execution or manual_review
        #[arg(long)]
        mode: Option<ExecutionMode>,

        /// Maximum steps per batch
        #[arg(long = "batch-size")]
        batch_size: Option<usize>,

        /// Validate after every step
        #[arg(long, overrides_with = "no_validate")]
        validate: bool,

        /// Skip validation
        #[arg(long = "no-validate", overrides_with = "validate")]
        no_validate: bool,

        /// Answer yes to every confirmation
        #[arg(short = 'y', long)]
        yes: bool,

        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,
    },

    /// Run every phase up to the chosen mode
    Run {
        /// Repository root
        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "detection_only")]
        mode: RunMode,

        /// Scanners to run: dependencies, dirs, files, configs
        #[arg(long, value_delimiter = ',')]
        focus: Vec<FocusArea>,

        /// Skip safety confirmation prompts
        #[arg(long = "no-confirmation")]
        no_confirmation: bool,

        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,
    },

    /// Initialize configuration file
    Init {
        /// Directory to write .decruft.yml into
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Force overwrite existing config
        #[arg(short = 'f', long)]
        force: bool,
    },
}

/// `--validate` / `--no-validate` as an override of the configured value.
pub fn validate_override(validate: bool, no_validate: bool) -> Option<bool> {
    match (validate, no_validate) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_run_command() {
        let cli = Cli::parse_from([
            "decruft",
            "run",
            "/repo",
            "--mode",
            "dry_run",
            "--focus",
            "dependencies,dirs",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run {
                path, mode, focus, ..
            } => {
                assert_eq!(path, PathBuf::from("/repo"));
                assert_eq!(mode, RunMode::DryRun);
                assert_eq!(focus, vec![FocusArea::Dependencies, FocusArea::Dirs]);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parsing_execute_command() {
        let cli = Cli::parse_from([
            "decruft",
            "execute",
            "--plan",
            "removal-plan.csv",
            "--mode",
            "batch-execution",
            "--batch-size",
            "2",
            "--no-validate",
            "--yes",
        ]);
        match cli.command {
            Commands::Execute {
                path,
                plan,
                mode,
                batch_size,
                validate,
                no_validate,
                yes,
                ..
            } => {
                assert_eq!(path, PathBuf::from("."));
                assert_eq!(plan, PathBuf::from("removal-plan.csv"));
                assert_eq!(mode, Some(ExecutionMode::BatchExecution));
                assert_eq!(batch_size, Some(2));
                assert_eq!(validate_override(validate, no_validate), Some(false));
                assert!(yes);
            }
            _ => panic!("Expected Execute command"),
        }
    }

    #[test]
    fn test_cli_parsing_init_command() {
        let cli = Cli::parse_from(["decruft", "init", "--force"]);
        match cli.command {
            Commands::Init { force, path } => {
                assert!(force);
                assert_eq!(path, PathBuf::from("."));
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_unknown_focus_is_rejected() {
        assert!(Cli::try_parse_from(["decruft", "detect", "--focus", "hex"]).is_err());
    }

    #[test]
    fn test_run_mode_mapping() {
        assert_eq!(RunMode::AssessmentOnly.execution_mode(), None);
        assert_eq!(
            RunMode::ManualReview.execution_mode(),
            Some(ExecutionMode::ManualReview)
        );
    }
}
