mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // stdout is the hook response channel, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::HookPreCompact { directory } => {
            commands::hooks::hook_pre_compact(directory.as_deref())
        }
        Commands::Filter {
            analysis,
            directory,
        } => commands::filter::run(&analysis, directory.as_deref()),
        Commands::Status { directory } => commands::status::run(directory.as_deref()),
        Commands::Version => commands::version::run(),
    }
}
