pub mod error;
pub mod gal;
pub mod graph;
pub mod stats;
pub mod weights;

pub use error::{Error, Result};
pub use graph::{Contiguity, GraphSummary, NeighborGraph};
pub use stats::{
    geary_c, geary_mc, geary_test, moran_i, moran_mc, moran_test, Alternative, AnalyticConfig,
    AnalyticTest, GearyResult, MonteCarloConfig, MoranResult, PermutationTest,
};
pub use weights::{Style, WeightMatrix};
