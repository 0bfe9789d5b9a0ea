//! # CLI Behavior
//!
//! This is an operator tool over the store, not the dashboard itself. It is the
//! only place that knows about terminal I/O, exit codes and output formatting.
//!
//! ## Collection Policy
//!
//! `create` uses the dashboard catalog when the collection is one of its own:
//! `notifications` always prepends and requires a string id, `rebels-ranking`
//! assigns numeric ids. For other collections `--head` and `--text-ids`
//! choose the policy.
//!
//! ## Identifiers
//!
//! `get`, `update` and `delete` take the id verbatim as a string for catalog
//! collections with string ids (`notifications`). Elsewhere the id is parsed
//! as an integer when possible and as a string otherwise; `1` and `"1"` are
//! different ids in the store.
//!
//! ## JSON Arguments
//!
//! Document arguments are JSON text. `-` reads the document from stdin.
//!
//! ## Module Structure
//!
//! - `setup`: argument parsing via clap
//! - `commands`: config, logging, dispatch and exit codes
//! - `handlers`: one function per subcommand, returning JSON

mod commands;
mod handlers;
pub mod setup;

pub use commands::{exit_code, run};
