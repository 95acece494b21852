use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueHint};

#[derive(Parser, Debug)]
#[command(name = "trellis", author, version, about = "Query and browse a knowledge graph", long_about = None)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "debug", "trellis_ui_common=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Application config file; skips the default search locations
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory datasets and query documents are read from
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub data_root: Option<PathBuf>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Give up after this many seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Log every bus event as it is rebroadcast to legacy listeners
    #[arg(long, global = true)]
    pub legacy_events: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a query document from the data root
    Query {
        /// Path of the document, relative to the data root
        path: String,
        /// Ask the fetcher to skip any cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Run query text given on the command line
    Exec {
        /// Query or update text
        text: String,
    },
    /// List the configured datasets
    Datasets {
        /// Bootstrap the store and report when it was loaded
        #[arg(long)]
        load: bool,
    },
    /// Inspect or change persisted configuration overrides
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Mount the built-in panes, activate them and print what they show
    Panes {
        /// Views to activate, in order (defaults to every registered view)
        views: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Persist a JSON overrides object
    Set {
        /// e.g. '{"datasets":[{"path":"a.ttl","base":"urn:a#"}]}'
        #[arg(id = "overrides_json", value_name = "JSON")]
        json: String,
    },
    /// Remove persisted overrides
    Reset,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        build_cli_command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "trellis", "query", "queries/nodes.rq", "--json", "--timeout", "5",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(!cli.legacy_events);
        assert_eq!(cli.timeout, Some(5));
        assert!(matches!(
            cli.command,
            Commands::Query { ref path, no_cache: false } if path == "queries/nodes.rq"
        ));
    }

    #[test]
    fn legacy_events_is_a_global_switch() {
        let cli = Cli::try_parse_from(["trellis", "panes", "--legacy-events"]).unwrap();
        assert!(cli.legacy_events);
    }

    #[test]
    fn config_set_takes_raw_json() {
        let cli = Cli::try_parse_from(["trellis", "config", "set", r#"{"mimeType":"text/n3"}"#])
            .unwrap();
        match cli.command {
            Commands::Config {
                command: ConfigCommands::Set { json },
            } => assert!(json.contains("mimeType")),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
