pub mod decomp;
pub mod edge_store;
pub mod error;
pub mod heap;
pub mod io;
pub mod lists;
pub mod logging;
pub mod maintainer;
pub mod neighbors;
pub mod order_labels;

pub use decomp::Decomposition;
pub use edge_store::{EdgeId, EdgeStore, VertexId, EMPTY};
pub use error::{Result, TrussError};
pub use maintainer::{DynamicTruss, Maintainer, MaintainerConfig};
