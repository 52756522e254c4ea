use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "convotrim")]
#[command(version)]
#[command(about = "Trim chat history to what the next model call needs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Optimize a request (stdin/stdout JSON)
    Optimize {
        /// Read the request from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show how a query would be classified
    Inspect {
        query: String,

        /// Number of messages in the hypothetical history
        #[arg(long, default_value_t = 30)]
        history_len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_optimize_defaults() {
        let cli = Cli::try_parse_from(["convotrim", "optimize"]);
        assert!(cli.is_ok());
        if let Commands::Optimize { input, config } = cli.unwrap().command {
            assert!(input.is_none());
            assert!(config.is_none());
        } else {
            panic!("Expected Optimize command");
        }
    }

    #[test]
    fn test_cli_parse_optimize_files() {
        let cli = Cli::try_parse_from([
            "convotrim",
            "optimize",
            "--input",
            "request.json",
            "--config",
            "convotrim.json",
        ]);
        if let Commands::Optimize { input, config } = cli.unwrap().command {
            assert_eq!(input, Some(PathBuf::from("request.json")));
            assert_eq!(config, Some(PathBuf::from("convotrim.json")));
        } else {
            panic!("Expected Optimize command");
        }
    }

    #[test]
    fn test_cli_parse_inspect() {
        let cli = Cli::try_parse_from(["convotrim", "inspect", "explain message 3", "--history-len", "12"]);
        if let Commands::Inspect { query, history_len } = cli.unwrap().command {
            assert_eq!(query, "explain message 3");
            assert_eq!(history_len, 12);
        } else {
            panic!("Expected Inspect command");
        }
    }

    #[test]
    fn test_cli_inspect_requires_query() {
        assert!(Cli::try_parse_from(["convotrim", "inspect"]).is_err());
    }
}
