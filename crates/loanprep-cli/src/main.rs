// crates/loanprep-cli/src/main.rs

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::Table;
use polars::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use loanprep_core::pipeline::{preprocess, Sources};
use loanprep_core::stats;

/// A CLI for the loan preprocessing pipeline.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct SourceArgs {
    /// Path to the loan origination table (.csv or .csv.gz).
    #[arg(long)]
    loans: PathBuf,

    /// Paths to the unemployment rate series, in mapping order.
    #[arg(long = "unemployment", required = true, num_args = 1..)]
    unemployment: Vec<PathBuf>,

    /// Path to the JSON mapping naming the series columns.
    #[arg(long)]
    state_names: PathBuf,
}

impl From<SourceArgs> for Sources {
    fn from(args: SourceArgs) -> Self {
        Sources {
            loans: args.loans,
            unemployment: args.unemployment,
            state_names: args.state_names,
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Runs the cleaning pipeline and writes the clean table as parquet.
    Preprocess {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output parquet path.
        #[arg(short, long)]
        output: PathBuf,

        /// Cap numeric values beyond this many standard deviations at the
        /// column mean before writing.
        #[arg(long)]
        cap_z: Option<f64>,
    },
    /// Ranks features by point-biserial correlation against the default label.
    Correlate {
        #[command(flatten)]
        sources: SourceArgs,

        /// Number of top features to print.
        #[arg(long, default_value_t = 20)]
        top: usize,

        /// Optional CSV file for the full ranking.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preprocess {
            sources,
            output,
            cap_z,
        } => {
            let mut clean = preprocess(&sources.into())?;
            if let Some(z_threshold) = cap_z {
                // Cap features only; the default label must survive as-is.
                clean = stats::cap_feature_outliers(clean, z_threshold)?;
            }

            let file = File::create(&output)
                .with_context(|| format!("failed to create {}", output.display()))?;
            ParquetWriter::new(file).finish(&mut clean)?;
            info!(rows = clean.height(), path = %output.display(), "clean table written");
        }
        Commands::Correlate {
            sources,
            top,
            output,
        } => {
            let clean = preprocess(&sources.into())?;
            let (features, target) = stats::split_target(clean)?;
            let scores = stats::point_biserial(&features, &target)?;

            let mut table = Table::new();
            table.set_header(vec!["feature", "abs_pointbiserial_corr"]);
            for (feature, score) in scores.iter().take(top) {
                table.add_row(vec![feature.clone(), format!("{score:.4}")]);
            }
            println!("{table}");

            if let Some(path) = output {
                let names: Vec<&str> = scores.iter().map(|(feature, _)| feature.as_str()).collect();
                let values: Vec<f64> = scores.iter().map(|(_, score)| *score).collect();
                let mut ranking = df!(
                    "feature" => names,
                    "abs_pointbiserial_corr" => values,
                )?;

                let file = File::create(&path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                CsvWriter::new(file).finish(&mut ranking)?;
                info!(path = %path.display(), "correlation ranking written");
            }
        }
    }

    Ok(())
}
