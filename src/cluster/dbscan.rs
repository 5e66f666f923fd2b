use crate::dataset::Dataset;
use crate::distance::Metric;
use crate::error::{ClusterError, Result};
use crate::neighbors::{BruteForce, GridIndex, NeighborSearch, RegionQuery};
use crate::{Labels, NOISE};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Parameters of a DBSCAN run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbscanParams {
    /// Neighborhood radius. A point at distance exactly `eps` is a neighbor.
    pub eps: f64,
    /// Points (the point itself included) an eps-neighborhood needs for the
    /// point to be a core point.
    pub min_samples: usize,
    pub metric: Metric,
    pub neighbor_search: NeighborSearch,
}

impl Default for DbscanParams {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_samples: 5,
            metric: Metric::default(),
            neighbor_search: NeighborSearch::default(),
        }
    }
}

impl DbscanParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.eps > 0.0 && self.eps.is_finite()) {
            return Err(ClusterError::config(format!(
                "eps must be a finite value > 0, got {}",
                self.eps
            )));
        }
        if self.min_samples == 0 {
            return Err(ClusterError::config("min_samples must be >= 1, got 0"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PointState {
    Unvisited,
    /// Too sparse to seed a cluster. Can still be claimed as a border point.
    Noise,
    Cluster(i32),
}

#[derive(Clone, Debug)]
pub struct DBSCAN {
    pub labels: Option<Labels>,
    pub core_sample_indices: Option<Vec<usize>>,
    params: DbscanParams,
}

impl DBSCAN {
    /// Parameters are checked by [`DBSCAN::fit`], before any point is scanned.
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self::with_params(DbscanParams {
            eps,
            min_samples,
            ..DbscanParams::default()
        })
    }

    pub fn with_params(params: DbscanParams) -> Self {
        Self {
            labels: None,
            core_sample_indices: None,
            params,
        }
    }

    pub fn metric(mut self, metric: Metric) -> Self {
        self.params.metric = metric;
        self
    }

    pub fn neighbor_search(mut self, neighbor_search: NeighborSearch) -> Self {
        self.params.neighbor_search = neighbor_search;
        self
    }

    pub fn params(&self) -> &DbscanParams {
        &self.params
    }

    pub fn fit(&mut self, dataset: &Dataset) -> Result<()> {
        self.params.validate()?;

        match self.params.neighbor_search {
            NeighborSearch::BruteForce => {
                let query = BruteForce::new(dataset, self.params.metric);
                self.fit_with(dataset, &query)
            }
            NeighborSearch::Grid => {
                let query = GridIndex::new(dataset, self.params.metric, self.params.eps)?;
                self.fit_with(dataset, &query)
            }
        }
    }

    /// Runs DBSCAN with a caller-supplied neighborhood query over `dataset`.
    pub fn fit_with<Q: RegionQuery + ?Sized>(&mut self, dataset: &Dataset, query: &Q) -> Result<()> {
        self.params.validate()?;

        let n_samples = dataset.n_samples();
        let mut states = vec![PointState::Unvisited; n_samples];
        let mut core_samples = Vec::new();
        let mut next_cluster = 0;

        for point in 0..n_samples {
            if states[point] != PointState::Unvisited {
                continue;
            }

            let seeds = query.neighbors(point, self.params.eps);
            if seeds.len() < self.params.min_samples {
                states[point] = PointState::Noise;
                continue;
            }

            let cluster = next_cluster;
            next_cluster += 1;
            states[point] = PointState::Cluster(cluster);
            core_samples.push(point);

            // Breadth-first expansion. Only core points push their neighbors.
            let mut frontier: VecDeque<usize> = seeds.into_iter().collect();
            let mut size = 1;
            while let Some(neighbor) = frontier.pop_front() {
                let state = states[neighbor];
                match state {
                    PointState::Cluster(_) => {}
                    PointState::Noise => {
                        states[neighbor] = PointState::Cluster(cluster);
                        size += 1;
                    }
                    PointState::Unvisited => {
                        states[neighbor] = PointState::Cluster(cluster);
                        size += 1;

                        let reachable = query.neighbors(neighbor, self.params.eps);
                        if reachable.len() >= self.params.min_samples {
                            core_samples.push(neighbor);
                            frontier.extend(
                                reachable
                                    .into_iter()
                                    .filter(|&i| !matches!(states[i], PointState::Cluster(_))),
                            );
                        }
                    }
                }
            }

            debug!(cluster, seed = point, size, "expanded cluster");
        }

        core_samples.sort_unstable();
        let labels: Labels = states
            .iter()
            .map(|state| match state {
                PointState::Cluster(cluster) => *cluster,
                PointState::Noise | PointState::Unvisited => NOISE,
            })
            .collect();

        info!(
            n_samples,
            n_clusters = next_cluster,
            n_noise = labels.iter().filter(|&&label| label == NOISE).count(),
            n_core = core_samples.len(),
            "dbscan finished"
        );

        self.labels = Some(labels);
        self.core_sample_indices = Some(core_samples);

        Ok(())
    }

    pub fn fit_predict(&mut self, dataset: &Dataset) -> Result<Labels> {
        self.fit(dataset)?;
        self.labels.clone().ok_or(ClusterError::NotFitted("DBSCAN"))
    }

    pub fn n_clusters(&self) -> Option<usize> {
        self.labels.as_ref().map(crate::metrics::n_clusters)
    }

    pub fn n_noise_points(&self) -> Option<usize> {
        self.labels.as_ref().map(crate::metrics::n_noise)
    }

    pub fn is_core_sample(&self, sample_idx: usize) -> Option<bool> {
        self.core_sample_indices
            .as_ref()
            .map(|core_indices| core_indices.binary_search(&sample_idx).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::StandardScaler;
    use ndarray::{array, Array2};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn dataset(x: Array2<f64>) -> Dataset {
        Dataset::from_matrix(x).unwrap()
    }

    /// Square lattices of `side * side` points, one per center.
    fn lattice_blobs(centers: &[[f64; 2]], side: usize, spacing: f64) -> Dataset {
        let offset = (side - 1) as f64 / 2.0;
        let mut rows = Vec::new();
        for center in centers {
            for i in 0..side {
                for j in 0..side {
                    rows.push([
                        center[0] + (i as f64 - offset) * spacing,
                        center[1] + (j as f64 - offset) * spacing,
                    ]);
                }
            }
        }
        Dataset::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_dbscan_six_points() {
        let x = dataset(array![
            [1.0, 2.0],
            [2.0, 2.0],
            [2.0, 3.0],
            [8.0, 7.0],
            [8.0, 8.0],
            [25.0, 80.0]
        ]);

        let labels = DBSCAN::new(3.0, 2).fit_predict(&x).unwrap();
        assert_eq!(labels.to_vec(), vec![0, 0, 0, 1, 1, -1]);
    }

    #[test]
    fn test_dbscan_basic() {
        let x = dataset(array![
            [1.0, 1.0],
            [1.2, 1.1],
            [1.1, 1.2],
            [8.0, 8.0],
            [8.1, 8.1],
            [8.2, 7.9],
            [15.0, 1.0] // Outlier
        ]);

        let mut dbscan = DBSCAN::new(1.0, 2);
        let labels = dbscan.fit_predict(&x).unwrap();

        assert_eq!(labels.len(), x.n_samples());
        assert_eq!(dbscan.n_clusters(), Some(2));
        assert_eq!(dbscan.n_noise_points(), Some(1));
        assert_eq!(labels[6], NOISE);
        assert_eq!(dbscan.core_sample_indices.as_ref().unwrap(), &vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_dbscan_noise_detection() {
        // Sparse points that should be classified as noise
        let x = dataset(array![[0.0, 0.0], [10.0, 10.0], [20.0, 20.0], [30.0, 30.0]]);

        let mut dbscan = DBSCAN::new(1.0, 2);
        dbscan.fit(&x).unwrap();

        assert_eq!(dbscan.n_noise_points(), Some(x.n_samples()));
        assert_eq!(dbscan.n_clusters(), Some(0));
    }

    #[test]
    fn test_dbscan_single_cluster() {
        let x = dataset(array![
            [1.0, 1.0],
            [1.1, 1.0],
            [1.0, 1.1],
            [1.1, 1.1],
            [1.2, 1.0],
            [1.0, 1.2]
        ]);

        let mut dbscan = DBSCAN::new(0.5, 2);
        let labels = dbscan.fit_predict(&x).unwrap();

        assert_eq!(dbscan.n_clusters(), Some(1));
        assert!(labels.iter().all(|&label| label == 0));
    }

    #[test]
    fn test_dbscan_noise_reclaimed_as_border() {
        // Point 0 is scanned first and is too sparse, but lies within eps of
        // the core point 1.
        let x = dataset(array![[0.0], [1.0], [1.5], [2.0]]);

        let mut dbscan = DBSCAN::new(1.0, 3);
        let labels = dbscan.fit_predict(&x).unwrap();

        assert_eq!(labels.to_vec(), vec![0, 0, 0, 0]);
        assert_eq!(dbscan.is_core_sample(0), Some(false));
        assert_eq!(dbscan.is_core_sample(1), Some(true));
    }

    #[test]
    fn test_dbscan_border_point_does_not_expand() {
        // 2.0 is a border point of the left group. It must not pull in 3.0,
        // which is only reachable through it.
        let x = dataset(array![[0.0], [0.3], [0.6], [1.0], [2.0], [3.0]]);

        let mut dbscan = DBSCAN::new(1.0, 4);
        let labels = dbscan.fit_predict(&x).unwrap();
        assert_eq!(labels.to_vec(), vec![0, 0, 0, 0, 0, NOISE]);
        assert_eq!(dbscan.is_core_sample(4), Some(false));
    }

    #[test]
    fn test_dbscan_min_samples_one() {
        let x = dataset(array![[0.0, 0.0], [0.1, 0.0], [5.0, 5.0]]);

        let labels = DBSCAN::new(0.5, 1).fit_predict(&x).unwrap();
        assert_eq!(labels.to_vec(), vec![0, 0, 1]);
    }

    #[test]
    fn test_dbscan_duplicate_points() {
        let x = dataset(array![[2.0, 2.0], [2.0, 2.0], [9.0, 9.0]]);

        let labels = DBSCAN::new(0.1, 2).fit_predict(&x).unwrap();
        assert_eq!(labels.to_vec(), vec![0, 0, NOISE]);
    }

    #[test]
    fn test_dbscan_manhattan_metric() {
        let x = dataset(array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);

        let mut dbscan = DBSCAN::new(1.5, 2).metric(Metric::Manhattan);
        dbscan.fit(&x).unwrap();
        assert_eq!(dbscan.n_clusters(), Some(1));

        // The diagonal is 2.0 apart in Manhattan distance but ~1.41 in Euclidean.
        let x = dataset(array![[0.0, 0.0], [1.0, 1.0]]);
        let manhattan = DBSCAN::new(1.5, 2).metric(Metric::Manhattan).fit_predict(&x).unwrap();
        let euclidean = DBSCAN::new(1.5, 2).fit_predict(&x).unwrap();
        assert_eq!(manhattan.to_vec(), vec![NOISE, NOISE]);
        assert_eq!(euclidean.to_vec(), vec![0, 0]);
    }

    #[test]
    fn test_dbscan_empty_dataset() {
        let labels = DBSCAN::new(0.5, 3).fit_predict(&Dataset::empty()).unwrap();
        assert!(labels.is_empty());
    }

    #[test]
    fn test_dbscan_invalid_eps() {
        let x = dataset(array![[1.0, 2.0]]);
        for eps in [-1.0, 0.0, f64::NAN, f64::INFINITY] {
            let err = DBSCAN::new(eps, 2).fit(&x).unwrap_err();
            assert!(err.is_config(), "eps={} should be rejected", eps);
        }
    }

    #[test]
    fn test_dbscan_invalid_min_samples() {
        let mut dbscan = DBSCAN::new(1.0, 0);
        let err = dbscan.fit(&Dataset::empty()).unwrap_err();
        assert!(err.is_config());
        assert!(dbscan.labels.is_none());
    }

    #[test]
    fn test_dbscan_core_sample_check() {
        let x = dataset(array![
            [1.0, 1.0],
            [1.1, 1.0],
            [1.2, 1.0],
            [10.0, 10.0] // Isolated point
        ]);

        let mut dbscan = DBSCAN::new(0.5, 2);
        dbscan.fit(&x).unwrap();

        assert_eq!(dbscan.is_core_sample(0), Some(true));
        assert_eq!(dbscan.is_core_sample(1), Some(true));
        assert_eq!(dbscan.is_core_sample(3), Some(false));
    }

    #[test]
    fn test_dbscan_symmetric_blobs() {
        let blobs = lattice_blobs(&[[1.0, 1.0], [-5.0, -5.0], [5.0, -5.0]], 5, 0.1);
        let x = StandardScaler::new().fit_transform(&blobs).unwrap();

        let mut dbscan = DBSCAN::new(0.3, 5);
        dbscan.fit(&x).unwrap();

        let sizes = crate::metrics::cluster_sizes(dbscan.labels.as_ref().unwrap());
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes.get(&0), Some(&25));
        assert_eq!(sizes.get(&1), Some(&25));
        assert_eq!(sizes.get(&2), Some(&25));
    }

    #[test]
    fn test_dbscan_grid_matches_brute_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let x = dataset(Array2::random_using((400, 2), Uniform::new(0.0, 10.0), &mut rng));

        let brute = DBSCAN::new(0.45, 4).fit_predict(&x).unwrap();
        let mut grid = DBSCAN::new(0.45, 4).neighbor_search(NeighborSearch::Grid);
        let labels = grid.fit_predict(&x).unwrap();

        assert_eq!(labels, brute);
        assert!(grid.n_clusters().unwrap() > 0);
    }

    #[test]
    fn test_dbscan_is_deterministic() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let x = dataset(Array2::random_using((250, 3), Uniform::new(-3.0, 3.0), &mut rng));

        let first = DBSCAN::new(0.7, 4).fit_predict(&x).unwrap();
        let second = DBSCAN::new(0.7, 4).fit_predict(&x).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dbscan_density_properties() {
        let (eps, min_samples) = (0.6, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let x = dataset(Array2::random_using((300, 2), Uniform::new(0.0, 8.0), &mut rng));

        let mut dbscan = DBSCAN::new(eps, min_samples);
        let labels = dbscan.fit_predict(&x).unwrap();
        let query = BruteForce::new(&x, Metric::Euclidean);
        let is_core = |i: usize| dbscan.is_core_sample(i).unwrap();

        assert_eq!(labels.len(), x.n_samples());

        // Label ids are contiguous from 0.
        let n_clusters = dbscan.n_clusters().unwrap() as i32;
        assert!(labels.iter().all(|&label| label >= NOISE && label < n_clusters));

        for i in 0..x.n_samples() {
            let neighbors = query.neighbors(i, eps);
            assert_eq!(is_core(i), neighbors.len() >= min_samples);

            if labels[i] == NOISE {
                assert!(neighbors.iter().all(|&j| !is_core(j)));
            } else if is_core(i) {
                // Core points share their label with every neighboring core point.
                for &j in neighbors.iter().filter(|&&j| is_core(j)) {
                    assert_eq!(labels[j], labels[i]);
                }
            } else {
                // Border points sit within eps of a core point of their cluster.
                assert!(neighbors.iter().any(|&j| is_core(j) && labels[j] == labels[i]));
            }
        }

        // Every cluster's core points form one eps-connected component.
        for cluster in 0..n_clusters {
            let cores: Vec<usize> = (0..x.n_samples())
                .filter(|&i| labels[i] == cluster && is_core(i))
                .collect();
            let mut reached = vec![cores[0]];
            let mut frontier = vec![cores[0]];
            while let Some(c) = frontier.pop() {
                for j in query.neighbors(c, eps) {
                    if is_core(j) && !reached.contains(&j) {
                        reached.push(j);
                        frontier.push(j);
                    }
                }
            }
            reached.sort_unstable();
            assert_eq!(reached, cores);
        }
    }

    #[test]
    fn test_dbscan_params_from_json() {
        let params: DbscanParams =
            serde_json::from_str(r#"{"eps": 3.0, "min_samples": 2, "neighbor_search": "grid"}"#)
                .unwrap();

        assert_eq!(params.metric, Metric::Euclidean);
        assert_eq!(params.neighbor_search, NeighborSearch::Grid);

        let x = dataset(array![[1.0, 2.0], [2.0, 2.0], [25.0, 80.0]]);
        let labels = DBSCAN::with_params(params).fit_predict(&x).unwrap();
        assert_eq!(labels.to_vec(), vec![0, 0, NOISE]);
    }
}
