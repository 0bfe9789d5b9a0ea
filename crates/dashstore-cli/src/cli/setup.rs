use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dashstore",
    bin_name = "dashstore",
    version,
    disable_help_subcommand = true,
    after_help = "Logging goes to stderr; set RUST_LOG to override the level."
)]
#[command(about = "Inspect, edit and back up dashboard collections", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Read settings from this TOML file
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Directory holding collection files (overrides config)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Directory holding backup archives (overrides config)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub backup_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create every missing dashboard collection with its defaults
    #[command(display_order = 1)]
    Init,

    /// List existing collections
    #[command(alias = "ls", display_order = 2)]
    Collections,

    /// Print every document of a collection
    #[command(display_order = 3)]
    List { collection: String },

    /// Print one document
    #[command(display_order = 4)]
    Get { collection: String, id: String },

    /// Add a document (JSON object, or - for stdin)
    #[command(alias = "add", display_order = 10)]
    Create {
        collection: String,
        document: String,

        /// Insert at the head instead of the tail
        #[arg(long)]
        head: bool,

        /// Require caller-supplied string ids instead of assigning numbers
        #[arg(long)]
        text_ids: bool,
    },

    /// Shallow-merge fields into a document
    #[command(display_order = 11)]
    Update {
        collection: String,
        id: String,
        /// JSON object of fields to set, or - for stdin
        fields: String,
    },

    /// Remove a document
    #[command(alias = "rm", display_order = 12)]
    Delete { collection: String, id: String },

    /// Replace a collection with a JSON array (or - for stdin)
    #[command(display_order = 13)]
    Replace { collection: String, documents: String },

    /// Write a backup archive (defaults to the dashboard collections)
    #[command(display_order = 20)]
    Backup { collections: Vec<String> },

    /// List backup archives, oldest first
    #[command(display_order = 21)]
    Backups,

    /// Restore an archive by id, or `latest`
    #[command(display_order = 22)]
    Restore { archive: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_create_with_policy_flags() {
        let cli = Cli::try_parse_from([
            "dashstore",
            "create",
            "alerts",
            r#"{"id":"a-1"}"#,
            "--head",
            "--text-ids",
        ])
        .unwrap();
        match cli.command {
            Commands::Create {
                collection,
                head,
                text_ids,
                ..
            } => {
                assert_eq!(collection, "alerts");
                assert!(head);
                assert!(text_ids);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn global_options_follow_subcommands() {
        let cli = Cli::try_parse_from(["dashstore", "backups", "--backup-dir", "/tmp/b", "-v"])
            .unwrap();
        assert_eq!(cli.backup_dir, Some(PathBuf::from("/tmp/b")));
        assert!(cli.verbose);
    }

    #[test]
    fn backup_without_names_is_allowed() {
        let cli = Cli::try_parse_from(["dashstore", "backup"]).unwrap();
        assert!(matches!(cli.command, Commands::Backup { collections } if collections.is_empty()));
    }
}
