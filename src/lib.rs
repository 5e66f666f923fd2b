//! Density-based (DBSCAN) and centroid-based (K-Means) clustering over tabular
//! numeric data.
//!
//! Every engine consumes a [`Dataset`] and produces one `i32` label per row,
//! aligned with the row order of the input.

pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod cluster;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod metrics;
pub mod neighbors;
pub mod preprocessing;

pub use cluster::{run_dbscan, run_kmeans, DbscanParams, Init, KMeans, KMeansParams, DBSCAN};
pub use dataset::{Dataset, Table};
pub use distance::Metric;
pub use error::{ClusterError, DataError, Result};
pub use neighbors::{BruteForce, GridIndex, NeighborSearch, RegionQuery};
pub use preprocessing::StandardScaler;

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;

/// Per-row cluster labels. DBSCAN uses `-1` for noise.
pub type Labels = Array1<i32>;

/// Label given to DBSCAN noise points.
pub const NOISE: i32 = -1;
