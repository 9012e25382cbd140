use crate::edge_store::{EdgeId, VertexId};

#[derive(thiserror::Error, Debug)]
pub enum TrussError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid graph file: {0}")]
    Parse(String),
    #[error("self-loop on vertex {0}")]
    SelfLoop(VertexId),
    #[error("vertex {vertex} out of range for a graph on {n} vertices")]
    VertexOutOfRange { vertex: VertexId, n: usize },
    #[error("graph file declares {declared} edges but contains {found}")]
    EdgeCountMismatch { declared: usize, found: usize },
    #[error("duplicate edge ({0}, {1})")]
    DuplicateEdge(VertexId, VertexId),
    #[error("duplicate adjacency entries at vertex {0} after rectification")]
    DuplicateEdgeFound(VertexId),
    #[error("edge capacity {0} exceeded")]
    CapacityExceeded(usize),
    #[error("invalid edge id {0}")]
    InvalidEdge(EdgeId),
    #[error("edge ({0}, {1}) does not exist")]
    MissingEdge(VertexId, VertexId),
    #[error("corrupt index file: {0}")]
    CorruptIndex(&'static str),
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}

pub type Result<T> = std::result::Result<T, TrussError>;
