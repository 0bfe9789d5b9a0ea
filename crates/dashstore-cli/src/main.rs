//! # dashstore CLI
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, while this
//! file only invokes `cli::run()` and turns the outcome into a process exit code.
//!
//! ## Workspace Structure
//!
//! - `crates/dashstore/`: the library (collection store, backups, dashboard catalog)
//! - `crates/dashstore-cli/`: this operator tool, depends on the library
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/dashstore-cli/src/cli/)                  │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - config + logging wiring, dispatch (commands.rs)          │
//! │  - one function per subcommand (handlers.rs)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Library (crates/dashstore/src/)                            │
//! │  - CollectionStore, BackupManager, catalog                  │
//! │  - No knowledge of stdout/stderr or process exits           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers return JSON values; the CLI prints them pretty-printed on stdout.
//! Logs go to stderr so stdout stays machine-readable.
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | success |
//! | 1 | usage or unclassified error |
//! | 2 | partial backup or restore |
//! | 3 | not found |
//! | 4 | validation |
//! | 5 | corrupt data |
//! | 6 | conflict (lock timeout) |
//! | 7 | I/O |

mod cli;

fn main() {
    match cli::run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(cli::exit_code(&e));
        }
    }
}
