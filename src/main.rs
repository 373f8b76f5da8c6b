use anyhow::Result;
use clap::Parser;
use decruft::cli::{validate_override, Cli, Commands};
use decruft::commands::{self, AssessConfig, DetectConfig, ExecuteConfig, RunConfig};
use decruft::observability::{init_logging, install_panic_hook};

fn main() -> Result<()> {
    install_panic_hook();
    let cli = Cli::parse();

    if cli.plain {
        colored::control::set_override(false);
    }
    init_logging(cli.verbose, !cli.plain);

    match cli.command {
        Commands::Detect {
            path,
            config,
            output_dir,
            focus,
        } => commands::detect_legacy(DetectConfig {
            path,
            config,
            output_dir,
            focus,
            plain: cli.plain,
        }),
        Commands::Assess {
            path,
            config,
            inventory,
            output_dir,
        } => commands::assess_legacy(AssessConfig {
            path,
            config,
            inventory,
            output_dir,
            plain: cli.plain,
        }),
        Commands::Execute {
            path,
            config,
            plan,
            mode,
            batch_size,
            validate,
            no_validate,
            yes,
            output_dir,
        } => commands::execute_plan(ExecuteConfig {
            path,
            config,
            plan,
            mode,
            batch_size,
            validate: validate_override(validate, no_validate),
            yes,
            output_dir,
            plain: cli.plain,
        }),
        Commands::Run {
            path,
            config,
            mode,
            focus,
            no_confirmation,
            output_dir,
        } => commands::run_pipeline(RunConfig {
            path,
            config,
            output_dir,
            mode,
            focus,
            no_confirmation,
            plain: cli.plain,
        })
        .map(|_| ()),
        Commands::Init { path, force } => commands::init_config(&path, force),
    }
}
