#![doc = "rmcloud2pdf: mirror a reMarkable cloud tree and convert notebooks to PDF."]

//! The pipeline, leaves first:
//!
//! - [`listing`] parses the `rmapi find` output into directories and files.
//! - [`mirror`] recreates the directories under the output root.
//! - [`download`] fetches one archive into its mirrored location.
//! - [`archive`] and [`classify`] unpack an archive and decide its shape.
//! - [`reconstruct`] and [`merge`] render notebook pages and join them.
//! - [`preprocess`] runs the per-archive conversion, [`synchronise`] the whole run.
//!
//! External tools are reached through the traits in [`contract`].

pub mod archive;
pub mod classify;
pub mod cli;
pub mod command;
pub mod config;
pub mod contract;
pub mod convert;
pub mod download;
pub mod listing;
pub mod load_config;
pub mod merge;
pub mod mirror;
pub mod preprocess;
pub mod reconstruct;
pub mod remote;
pub mod scoped;
pub mod synchronise;

pub use cli::{run, Cli, Commands};
