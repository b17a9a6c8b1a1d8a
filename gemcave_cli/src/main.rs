use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gemcave_core::scenario::{self, Strategy};
use log::info;
use rayon::prelude::*;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
};

#[derive(Parser, Debug)]
#[command(version, about = "Generates key/gate/diamond puzzle levels as a pipe-delimited dataset")]
struct Args {
    /// Number of scenarios to generate
    #[arg(long = "num_samples", default_value_t = 10_000)]
    num_samples: usize,

    /// Destination file; parent directories are created if missing
    #[arg(long = "export_path", value_name = "FILE")]
    export_path: PathBuf,

    /// Base seed; scenario i is generated from seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Shorthand for `--strategy hard`
    #[arg(long)]
    hard: bool,

    /// How keys, gates, and diamonds are wired together
    #[arg(long, value_enum, default_value_t = StrategyArg::SingleGate)]
    strategy: StrategyArg,
}

/// Command-line names for the placement strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    /// One diamond behind one locked gate
    SingleGate,
    /// Three chained locked gates
    ThreeKey,
    /// Single gate plus extra diamonds, four in total
    Hard,
}

impl Args {
    /// Resolves the requested strategy; `--hard` wins over `--strategy`.
    fn strategy(&self) -> Strategy {
        if self.hard {
            return Strategy::MultiReward;
        }
        match self.strategy {
            StrategyArg::SingleGate => Strategy::SingleGate,
            StrategyArg::ThreeKey => Strategy::ThreeKeyChain,
            StrategyArg::Hard => Strategy::MultiReward,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let strategy = args.strategy();

    // Open the destination before generating anything so a bad export path
    // fails the batch at startup.
    if let Some(parent) = args.export_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating export directory {}", parent.display()))?;
        }
    }
    let file = File::create(&args.export_path)
        .with_context(|| format!("opening {} for writing", args.export_path.display()))?;

    info!(
        "generating {} scenarios ({:?}, base seed {})",
        args.num_samples, strategy, args.seed
    );

    // One worker per scenario index, each with its own derived seed and no
    // shared state. The indexed collect keeps output in submission order;
    // the first generation error aborts the whole batch.
    let lines = (0..args.num_samples)
        .into_par_iter()
        .map(|i| scenario::generate(args.seed + i as u64, strategy).map(|record| record.to_line()))
        .collect::<Result<Vec<_>, _>>()
        .context("scenario generation failed")?;

    let mut writer = BufWriter::new(file);
    for line in &lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush().context("flushing dataset file")?;

    info!(
        "wrote {} lines to {}",
        lines.len(),
        args.export_path.display()
    );
    Ok(())
}
