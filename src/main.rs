//! Entry point for the blockwise application.
//! Handles CLI parsing, file loading, and dispatches one block-parallel operation.

use blockwise::netcdf_io::{describe_variables, read_labels, read_values, NetCDFWriter};
use blockwise::prelude::*;
use blockwise::get_parallel_info;
use clap::Parser;
use ndarray::ArrayD;
use netcdf::open;
use serde_json::json;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;

use cli::Args;

const DEFAULT_BLOCK_EXTENT: usize = 64;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let file = open(&args.file)?;
    tracing::info!(file = %args.file.display(), "opened NetCDF file");
    if args.verbose {
        get_parallel_info().print_info();
    }

    let Some(var_name) = args.variable.as_deref() else {
        println!("\n===== Variables =====");
        for var in describe_variables(&file) {
            let dims: Vec<String> = var
                .dimensions
                .iter()
                .map(|(name, len)| format!("{}[{}]", name, len))
                .collect();
            println!("- {} ({})", var.name, dims.join(", "));
        }
        return Ok(());
    };

    let options_for = |ndim: usize| {
        let block_shape = args
            .block_shape
            .as_ref()
            .map(|shape| shape.0.clone())
            .unwrap_or_else(|| vec![DEFAULT_BLOCK_EXTENT; ndim]);
        BlockOptions::new(block_shape).with_parallel(ParallelConfig::new(args.threads))
    };

    if args.unique {
        let data = read_labels(&file, var_name)?;
        let options = options_for(data.ndim());
        let result = unique_with_counts(&data.view(), &options)?;
        if args.json {
            let mut report = json!({ "variable": var_name, "values": result.values });
            if args.counts {
                report["counts"] = json!(result.counts);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("✅ {} distinct values in '{}'", result.len(), var_name);
            for (value, count) in result.values.iter().zip(&result.counts).take(20) {
                if args.counts {
                    println!("   {}: {}", value, count);
                } else {
                    println!("   {}", value);
                }
            }
            if result.len() > 20 {
                println!("   ... ({} more values)", result.len() - 20);
            }
        }
    } else if args.relabel {
        let data = read_labels(&file, var_name)?;
        let options = options_for(data.ndim());
        let relabel = RelabelOptions {
            keep_background: !args.no_keep_background,
            start_label: args.start_label,
        };
        let mut relabeled = ArrayD::<i64>::zeros(data.shape());
        let Relabeled { max_id, mapping } =
            relabel_consecutive(&data.view(), relabeled.view_mut(), &relabel, &options)?;

        if let Some(output_path) = &args.output_netcdf {
            let labels = relabeled.mapv(|v| v.to_label().unwrap_or_default());
            let new_var_name = format!("{}_relabeled", var_name);
            write_result(
                &file,
                output_path,
                &labels,
                &new_var_name,
                var_name,
                "consecutive relabeling",
            )?;
        }
        if args.json {
            let pairs: Vec<(i64, i64)> = mapping.iter().collect();
            let report = json!({ "variable": var_name, "max_id": max_id, "mapping": pairs });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("✅ Relabeled '{}': {} values, max id {}", var_name, mapping.len(), max_id);
        }
    } else if args.label {
        let data = read_labels(&file, var_name)?;
        let options = options_for(data.ndim());
        let mut components = ArrayD::<u64>::zeros(data.shape());
        let result = label(&data.view(), components.view_mut(), args.with_background, &options)?;

        if let Some(output_path) = &args.output_netcdf {
            let new_var_name = format!("{}_components", var_name);
            write_result(
                &file,
                output_path,
                &components,
                &new_var_name,
                var_name,
                "connected components",
            )?;
        }
        if args.json {
            let report = json!({ "variable": var_name, "components": result.max_id });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("✅ {} connected components in '{}'", result.max_id, var_name);
        }
    } else if args.stats {
        let data = read_values(&file, var_name)?;
        let options = options_for(data.ndim());
        let merged = moments(&data.view(), &options)?;
        if args.json {
            let report = json!({
                "variable": var_name,
                "count": merged.count,
                "mean": merged.mean(),
                "variance": merged.variance(),
                "std": merged.std(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("\n Summary for Variable: {}", var_name);
            println!("================================");
            println!("   Count: {}", merged.count);
            println!("   Mean: {:.4}", merged.mean());
            println!("   Std Dev: {:.4}", merged.std());
        }
    }

    Ok(())
}

fn write_result(
    file: &netcdf::File,
    output_path: &Path,
    data: &ArrayD<u64>,
    new_var_name: &str,
    var_name: &str,
    description: &str,
) -> blockwise::Result<()> {
    NetCDFWriter::new(file, output_path).write_labels(data, new_var_name, var_name, description)?;
    println!("✅ Saved result to {}", output_path.display());
    Ok(())
}
