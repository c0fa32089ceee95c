use clap::Parser;
use run_report::cli::commands::{cmd_generate, cmd_history};
use run_report::cli::config::{Cli, Commands, load_config};
use run_report::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let file_options = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Generate { events, overrides } => {
            let outcome = cmd_generate(&events, file_options, &overrides)?;
            if !outcome.report.all_passed() {
                std::process::exit(1);
            }
        }
        Commands::History { path, all } => {
            cmd_history(path.as_deref(), all, file_options);
        }
    }

    Ok(())
}
