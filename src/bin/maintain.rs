use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use dtruss::order_labels::DEFAULT_GROUP_CAP;
use dtruss::{io, logging, DynamicTruss, Maintainer, MaintainerConfig};
use log::{info, warn};

type Error = Box<dyn std::error::Error>;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Insert,
    Remove,
}

#[derive(Parser, Debug)]
#[command(version, about = "Applies edge updates to a truss index incrementally")]
struct Args {
    mode: Mode,
    /// Index written by `decompose` for the graph before the updates.
    old_index: PathBuf,
    /// One `v1 v2` pair per line; `#` starts a comment line.
    updates: PathBuf,
    /// Index of the updated graph to check the result against.
    #[arg(long)]
    truth: Option<PathBuf>,
    /// Where to write the updated graph.
    #[arg(long)]
    final_graph: Option<PathBuf>,
    /// Where to write the maintained level as a one-level index.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Flow level to maintain.
    #[arg(long, default_value_t = 0)]
    level: usize,
    /// Maximum number of live edges, twice the initial edge count by default.
    #[arg(long)]
    capacity: Option<usize>,
    #[arg(long, default_value_t = DEFAULT_GROUP_CAP)]
    group_cap: usize,
    /// Updates covering at least this fraction of the edges run as one batch.
    #[arg(long, default_value_t = 0.01)]
    batch_ratio: f64,
}

fn main() -> Result<(), Error> {
    let _logger = logging::start("info")?;
    let args = Args::parse();
    let config = MaintainerConfig {
        level: args.level,
        capacity: args.capacity,
        group_cap: args.group_cap,
        batch_ratio: args.batch_ratio,
    };

    let start = Instant::now();
    let mut maintainer = Maintainer::load_index(&args.old_index, config)?;
    let updates = io::read_updates(&args.updates)?;
    info!(
        "loaded {} edges and {} updates in {:.2?}",
        maintainer.store().m(),
        updates.len(),
        start.elapsed()
    );

    let start = Instant::now();
    match args.mode {
        Mode::Insert => maintainer.insert_edges(&updates)?,
        Mode::Remove => maintainer.remove_edges(&updates)?,
    }
    info!("{:?} of {} edges took {:.2?}", args.mode, updates.len(), start.elapsed());

    if let Some(truth) = &args.truth {
        let index = io::read_index(truth)?;
        if index.m != maintainer.store().m() {
            return Err(format!(
                "ground truth has {} edges, maintained graph has {}",
                index.m,
                maintainer.store().m()
            )
            .into());
        }
        let mut wrong = 0;
        for r in index.layers.get(args.level).into_iter().flatten() {
            let k = maintainer.truss(r.v1, r.v2)?;
            if k != r.support {
                warn!("({}, {}): maintained {k}, expected {}", r.v1, r.v2, r.support);
                wrong += 1;
            }
        }
        if index.layers.len() <= args.level {
            wrong += maintainer.snapshot().iter().filter(|(_, k)| *k > 0).count();
        }
        if wrong > 0 {
            return Err(format!("{wrong} edges disagree with the ground truth").into());
        }
        info!("all truss numbers match {}", truth.display());
    }

    if let Some(path) = &args.output {
        io::write_index_file(path, &maintainer.to_index())?;
        info!("level {} written to {}", args.level, path.display());
    }
    if let Some(path) = &args.final_graph {
        io::write_graph(path, maintainer.store())?;
    }
    Ok(())
}
