//! Clustering algorithms for unsupervised learning.
//!
//! This module provides:
//! - `KMeans`: partitional clustering around `k` centroids
//! - `DBSCAN`: density-based clustering for arbitrary shaped clusters
//!
//! Both treat every column of the [`Dataset`] as a feature and return one
//! label per row, in row order.
//!
//! # Examples
//!
//! ## K-Means Clustering
//! ```rust
//! use clusterkit::{Dataset, KMeans};
//! use ndarray::array;
//!
//! let x = Dataset::from_matrix(array![
//!     [1.0, 2.0],
//!     [1.0, 4.0],
//!     [1.0, 0.0],
//!     [10.0, 2.0],
//!     [10.0, 4.0],
//!     [10.0, 0.0]
//! ]).unwrap();
//!
//! let mut kmeans = KMeans::new(2).random_state(0).max_iter(100);
//! let labels = kmeans.fit_predict(&x).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[3]);
//!
//! // A run that hit max_iter reports converged == Some(false).
//! assert_eq!(kmeans.converged, Some(true));
//! println!("Inertia: {:.4}", kmeans.inertia.unwrap());
//! ```
//!
//! ## DBSCAN Clustering
//! ```rust
//! use clusterkit::{Dataset, DBSCAN};
//!
//! let x = Dataset::from_rows(&[
//!     [1.0, 2.0],
//!     [2.0, 2.0],
//!     [2.0, 3.0],
//!     [8.0, 7.0],
//!     [8.0, 8.0],
//!     [25.0, 80.0], // Outlier
//! ]).unwrap();
//!
//! let mut dbscan = DBSCAN::new(3.0, 2); // eps=3.0, min_samples=2
//! let labels = dbscan.fit_predict(&x).unwrap();
//! assert_eq!(labels.to_vec(), vec![0, 0, 0, 1, 1, -1]);
//! assert_eq!(dbscan.n_clusters(), Some(2));
//! assert_eq!(dbscan.n_noise_points(), Some(1));
//! ```

mod dbscan;
mod kmeans;

pub use dbscan::{DbscanParams, DBSCAN};
pub use kmeans::{Init, KMeans, KMeansParams, DEFAULT_MAX_ITER, DEFAULT_MAX_RESEEDS, DEFAULT_N_INIT};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::Labels;

/// Clusters `dataset` with DBSCAN using Euclidean distance and a linear-scan
/// neighborhood query. Noise points are labeled `-1`.
pub fn run_dbscan(dataset: &Dataset, eps: f64, min_samples: usize) -> Result<Labels> {
    DBSCAN::new(eps, min_samples).fit_predict(dataset)
}

/// Clusters `dataset` into `k` groups with K-Means seeded by `seed`, using the
/// default initialization and iteration limits.
pub fn run_kmeans(dataset: &Dataset, k: usize, seed: u64) -> Result<Labels> {
    KMeans::new(k).random_state(seed).fit_predict(dataset)
}
