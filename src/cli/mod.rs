//! # CLI Module
//!
//! Command-line interface of the `apigen` binary.
//!
//! ```bash
//! apigen [-p <package>] [-o <file>|-] [--check] [-v] {src_dir | <src_file>...}
//! ```
//!
//! - positional arguments name one directory, or files that all live in the
//!   same directory; files ending in `_apigen.rs` are never read
//! - `-p` selects the package when the inputs hold more than one
//! - `-o -` prints to stdout; by default the output goes to
//!   `<dir>/<package>_apigen.rs`
//! - `--check` compares instead of writing and fails when the file is stale
//! - `-v` enables debug logging on stderr
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use apigen::cli::{run, Cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse_from(["apigen", "-o", "-", "src/service"]);
//! run(&cli)?;
//! ```

mod commands;

pub use commands::{run, run_cli, Cli};
