//! Graph text files, binary index files and update files.
//!
//! Index layout, all little-endian `u32`: `n m`, then per level `m` records of
//! `v1 v2 support remaining surviving`. The qualifying edges of a level come first in peeling
//! order, followed by the other edges in id order with zeroed counters.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::decomp::Decomposition;
use crate::edge_store::{EdgeStore, VertexId};
use crate::error::{Result, TrussError};

const RECORD_BYTES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    pub v1: VertexId,
    pub v2: VertexId,
    pub support: u32,
    pub remaining: u32,
    pub surviving: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexFile {
    pub n: usize,
    pub m: usize,
    /// One entry per level, each holding exactly `m` records.
    pub layers: Vec<Vec<IndexRecord>>,
}

fn parse_pair(line: &str, lineno: usize) -> Result<(usize, usize)> {
    let mut tokens = line.split_whitespace().map(|t| t.parse::<usize>());
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(Ok(a)), Some(Ok(b)), None) => Ok((a, b)),
        _ => Err(TrussError::Parse(format!(
            "line {lineno}: expected two non-negative integers, got {line:?}"
        ))),
    }
}

/// Parses `n m` followed by `m` edge lines. Ids are assigned in sorted endpoint order and the
/// store holds exactly `m` edges.
pub fn parse_graph(input: impl BufRead) -> Result<EdgeStore> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(i, line)| line.map(|l| (i + 1, l)))
        .filter(|line| !matches!(line, Ok((_, l)) if l.trim().is_empty()));
    let (lineno, header) = lines
        .next()
        .transpose()?
        .ok_or_else(|| TrussError::Parse("empty graph file".into()))?;
    let (n, m) = parse_pair(&header, lineno)?;
    let mut edges = Vec::with_capacity(m);
    for line in lines {
        let (lineno, line) = line?;
        edges.push(parse_pair(&line, lineno)?);
    }
    if edges.len() != m {
        return Err(TrussError::EdgeCountMismatch {
            declared: m,
            found: edges.len(),
        });
    }
    edges.sort_unstable();
    if let Some(w) = edges.windows(2).find(|w| w[0] == w[1]) {
        return Err(TrussError::DuplicateEdge(w[0].0, w[0].1));
    }
    EdgeStore::from_edges(n, m, &edges)
}

pub fn read_graph(path: impl AsRef<Path>) -> Result<EdgeStore> {
    parse_graph(BufReader::new(File::open(path)?))
}

/// Writes the live edges in the graph text format, sorted by endpoints.
pub fn write_graph(path: impl AsRef<Path>, store: &EdgeStore) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let mut edges: Vec<_> = store.edges().map(|(_, ends)| ends).collect();
    edges.sort_unstable();
    writeln!(out, "{} {}", store.n(), edges.len())?;
    for (v1, v2) in edges {
        writeln!(out, "{v1} {v2}")?;
    }
    out.flush()?;
    Ok(())
}

/// Reads `v1 v2` pairs, skipping blank lines and lines starting with `#`.
pub fn read_updates(path: impl AsRef<Path>) -> Result<Vec<(VertexId, VertexId)>> {
    let mut updates = vec![];
    for (i, line) in BufReader::new(File::open(path)?).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        updates.push(parse_pair(trimmed, i + 1)?);
    }
    Ok(updates)
}

fn to_u32(x: usize) -> Result<u32> {
    u32::try_from(x).map_err(|_| TrussError::Invalid("value does not fit in 32 bits"))
}

impl IndexFile {
    /// Every stored level of a decomposition.
    pub fn from_decomposition(decomp: &Decomposition) -> Self {
        let store = decomp.store();
        let layers = decomp
            .layers()
            .iter()
            .map(|layer| {
                let mut listed = vec![false; store.capacity()];
                let mut records = Vec::with_capacity(store.m());
                for &e in &layer.order {
                    let Ok((v1, v2)) = store.get(e) else {
                        unreachable!("peeled dead edge {e}")
                    };
                    listed[e] = true;
                    records.push(IndexRecord {
                        v1,
                        v2,
                        support: layer.support[e],
                        remaining: layer.remaining[e],
                        surviving: layer.surviving[e],
                    });
                }
                records.extend(store.edges().filter(|&(e, _)| !listed[e]).map(|(_, (v1, v2))| {
                    IndexRecord {
                        v1,
                        v2,
                        support: 0,
                        remaining: 0,
                        surviving: 0,
                    }
                }));
                records
            })
            .collect();
        Self {
            n: store.n(),
            m: store.m(),
            layers,
        }
    }
}

pub fn write_index(path: impl AsRef<Path>, decomp: &Decomposition) -> Result<()> {
    write_index_file(path, &IndexFile::from_decomposition(decomp))
}

pub fn encode_index(out: &mut impl Write, decomp: &Decomposition) -> Result<()> {
    encode_index_file(out, &IndexFile::from_decomposition(decomp))
}

pub fn write_index_file(path: impl AsRef<Path>, index: &IndexFile) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    encode_index_file(&mut out, index)?;
    out.flush()?;
    Ok(())
}

/// Fails with `Invalid` unless every level holds exactly `m` records.
pub fn encode_index_file(out: &mut impl Write, index: &IndexFile) -> Result<()> {
    if index.layers.iter().any(|records| records.len() != index.m) {
        return Err(TrussError::Invalid("every level needs one record per edge"));
    }
    let mut put = |x: u32| out.write_all(&x.to_le_bytes());
    put(to_u32(index.n)?)?;
    put(to_u32(index.m)?)?;
    for r in index.layers.iter().flatten() {
        for x in [to_u32(r.v1)?, to_u32(r.v2)?, r.support, r.remaining, r.surviving] {
            put(x)?;
        }
    }
    Ok(())
}

pub fn read_index(path: impl AsRef<Path>) -> Result<IndexFile> {
    let mut bytes = vec![];
    File::open(path)?.read_to_end(&mut bytes)?;
    decode_index(&bytes)
}

pub fn decode_index(bytes: &[u8]) -> Result<IndexFile> {
    let words: Vec<u32> = bytes
        .chunks(4)
        .map(|c| {
            <[u8; 4]>::try_from(c)
                .map(u32::from_le_bytes)
                .map_err(|_| TrussError::CorruptIndex("length is not a multiple of 4"))
        })
        .collect::<Result<_>>()?;
    let [n, m, body @ ..] = &words[..] else {
        return Err(TrussError::CorruptIndex("missing header"));
    };
    let (n, m) = (*n as usize, *m as usize);
    let per_level = m * RECORD_BYTES / 4;
    if per_level == 0 {
        return if body.is_empty() {
            Ok(IndexFile {
                n,
                m,
                layers: vec![],
            })
        } else {
            Err(TrussError::CorruptIndex("records present for an empty graph"))
        };
    }
    if body.len() % per_level != 0 {
        return Err(TrussError::CorruptIndex("truncated level"));
    }
    let layers = body
        .chunks(per_level)
        .map(|level| {
            level
                .chunks(RECORD_BYTES / 4)
                .map(|r| IndexRecord {
                    v1: r[0] as usize,
                    v2: r[1] as usize,
                    support: r[2],
                    remaining: r[3],
                    surviving: r[4],
                })
                .collect()
        })
        .collect();
    Ok(IndexFile { n, m, layers })
}
