use crate::dataset::Dataset;
use crate::distance::squared_euclidean;
use crate::error::{ClusterError, DataError, Result};
use crate::{Labels, Matrix, NOISE};
use std::collections::BTreeMap;

/// Within-cluster sum of squared distances from each point to the centroid
/// its label points at.
pub fn inertia(dataset: &Dataset, centroids: &Matrix, labels: &Labels) -> Result<f64> {
    if labels.len() != dataset.n_samples() {
        return Err(ClusterError::config(format!(
            "labels has {} entries but dataset has {} samples",
            labels.len(),
            dataset.n_samples()
        )));
    }
    if dataset.n_samples() > 0 && centroids.ncols() != dataset.n_features() {
        return Err(DataError::DimensionMismatch {
            expected: centroids.ncols(),
            found: dataset.n_features(),
        }
        .into());
    }

    let mut total = 0.0;
    for (point, &label) in dataset.rows().zip(labels.iter()) {
        if label < 0 || label as usize >= centroids.nrows() {
            return Err(ClusterError::config(format!(
                "label {} has no centroid ({} centroids)",
                label,
                centroids.nrows()
            )));
        }
        total += squared_euclidean(&point, &centroids.row(label as usize));
    }
    Ok(total)
}

/// Number of points per label, noise (`-1`) included.
pub fn cluster_sizes(labels: &Labels) -> BTreeMap<i32, usize> {
    let mut sizes = BTreeMap::new();
    for &label in labels.iter() {
        *sizes.entry(label).or_insert(0) += 1;
    }
    sizes
}

/// Number of distinct non-noise labels.
pub fn n_clusters(labels: &Labels) -> usize {
    cluster_sizes(labels).keys().filter(|&&label| label != NOISE).count()
}

pub fn n_noise(labels: &Labels) -> usize {
    labels.iter().filter(|&&label| label == NOISE).count()
}
