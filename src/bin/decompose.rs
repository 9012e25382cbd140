use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use dtruss::{io, logging, Decomposition};
use log::info;

type Error = Box<dyn std::error::Error>;

#[derive(Parser, Debug)]
#[command(version, about = "Full directed truss decomposition of a graph file")]
struct Args {
    /// Graph text file: `n m` then one `v1 v2` line per edge.
    graph: PathBuf,
    /// Binary index to write.
    index: PathBuf,
}

fn main() -> Result<(), Error> {
    let _logger = logging::start("info")?;
    let args = Args::parse();

    let start = Instant::now();
    let store = io::read_graph(&args.graph)?;
    info!(
        "read {} vertices and {} edges in {:.2?}",
        store.n(),
        store.m(),
        start.elapsed()
    );

    let start = Instant::now();
    let decomp = Decomposition::new(store);
    info!(
        "decomposed {} levels (max flow {}) in {:.2?}",
        decomp.layers().len(),
        decomp.max_flow(),
        start.elapsed()
    );

    io::write_index(&args.index, &decomp)?;
    info!("index written to {}", args.index.display());
    Ok(())
}
