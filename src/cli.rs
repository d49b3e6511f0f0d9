//! Defines command-line interface options using `clap` for the blockwise tool.

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Block-parallel analytics on one variable of a NetCDF file
#[derive(Parser, Debug)]
#[command(
    version,
    name = "blockwise",
    about = "Block-parallel unique, relabel, label and statistics on NetCDF variables"
)]
#[command(group(ArgGroup::new("operation").args(["unique", "relabel", "label", "stats"])))]
pub struct Args {
    /// Path to the NetCDF file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Variable to process. Without it, the file's variables are listed.
    #[arg(long, requires = "operation")]
    pub variable: Option<String>,

    /// Block extent per axis, formatted as a,b,c. Defaults to 64 along every axis.
    #[arg(long, value_parser = parse_block_shape)]
    pub block_shape: Option<BlockShape>,

    /// Number of worker threads. Defaults to number of CPU cores.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Compute the distinct values of the variable
    #[arg(long, requires = "variable")]
    pub unique: bool,

    /// Include occurrence counts with --unique
    #[arg(long, requires = "unique")]
    pub counts: bool,

    /// Relabel the variable to consecutive ids
    #[arg(long, requires = "variable")]
    pub relabel: bool,

    /// Number value 0 like any other value instead of pinning it to 0
    #[arg(long, requires = "relabel")]
    pub no_keep_background: bool,

    /// First id handed out by --relabel
    #[arg(long, requires = "relabel", default_value_t = 1)]
    pub start_label: u64,

    /// Label connected components of equal value
    #[arg(long, requires = "variable")]
    pub label: bool,

    /// Treat value 0 as background with --label
    #[arg(long, requires = "label")]
    pub with_background: bool,

    /// Compute mean and standard deviation of the variable
    #[arg(long, requires = "variable")]
    pub stats: bool,

    /// Path to save --relabel / --label results as NetCDF
    #[arg(long)]
    pub output_netcdf: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockShape(pub Vec<usize>);

fn parse_block_shape(s: &str) -> Result<BlockShape, String> {
    let extents = s
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| {
                    format!("Invalid block extent '{}': expected a positive integer", part)
                })
        })
        .collect::<Result<Vec<usize>, String>>()?;
    if extents.contains(&0) {
        return Err("Block extents must be positive".to_string());
    }
    Ok(BlockShape(extents))
}
