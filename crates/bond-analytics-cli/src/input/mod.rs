//! Input sources for bondcalc subcommands: a JSON file named with
//! `--input`, or the same object piped on stdin.

pub mod file;
pub mod stdin;
