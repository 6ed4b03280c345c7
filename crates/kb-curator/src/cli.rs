use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kb-curator")]
#[command(version)]
#[command(about = "Curates knowledge-base recommendations from compacted conversations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Hook: analyze the history window before compaction (stdin/stdout JSON)
    #[command(name = "hook:pre-compact")]
    HookPreCompact {
        /// Project root (defaults to the payload's workspace, then the current directory)
        #[arg(short, long)]
        directory: Option<String>,
    },

    /// Run the novelty filter over a saved analysis
    Filter {
        /// Path to an analysis JSON file or a saved backend response
        #[arg(short, long)]
        analysis: String,

        /// Project root (defaults to the current directory)
        #[arg(short, long)]
        directory: Option<String>,
    },

    /// Show effective configuration and the recommendation queue
    Status {
        /// Project root (defaults to the current directory)
        #[arg(short, long)]
        directory: Option<String>,
    },

    /// Print version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::try_parse_from(["kb-curator", "version"]);
        assert!(cli.is_ok());
        assert!(matches!(cli.unwrap().command, Commands::Version));
    }

    #[test]
    fn test_cli_parse_hook_pre_compact() {
        let cli = Cli::try_parse_from(["kb-curator", "hook:pre-compact"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::HookPreCompact { directory: None }
        ));

        let cli = Cli::try_parse_from(["kb-curator", "hook:pre-compact", "--directory", "/work"])
            .unwrap();
        if let Commands::HookPreCompact { directory } = cli.command {
            assert_eq!(directory, Some("/work".to_string()));
        } else {
            panic!("Expected HookPreCompact command");
        }
    }

    #[test]
    fn test_cli_parse_filter() {
        let cli = Cli::try_parse_from(["kb-curator", "filter", "--analysis", "analysis.json"]);
        assert!(cli.is_ok());
        if let Commands::Filter {
            analysis,
            directory,
        } = cli.unwrap().command
        {
            assert_eq!(analysis, "analysis.json");
            assert!(directory.is_none());
        } else {
            panic!("Expected Filter command");
        }
    }

    #[test]
    fn test_cli_filter_requires_analysis() {
        assert!(Cli::try_parse_from(["kb-curator", "filter"]).is_err());
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::try_parse_from(["kb-curator", "status", "-d", "/work"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Status { directory: Some(ref d) } if d == "/work"
        ));
    }
}
