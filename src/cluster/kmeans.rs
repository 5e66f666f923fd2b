use crate::dataset::Dataset;
use crate::distance::{euclidean, squared_euclidean};
use crate::error::{ClusterError, DataError, Result};
use crate::{Labels, Matrix};
use ndarray::{ArrayView1, ArrayView2, Axis};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ITER: usize = 300;
pub const DEFAULT_N_INIT: usize = 10;
pub const DEFAULT_MAX_RESEEDS: usize = 10;

/// How the initial centroids are drawn from the dataset.
///
/// Both strategies read a single [`ChaCha8Rng`] stream created with
/// `ChaCha8Rng::seed_from_u64(random_state)`, and both pick `k` distinct rows:
///
/// * `Random`: partial Fisher-Yates over the row indices. For slot
///   `i in 0..k`, `j = i + next_u64() % (n - i)`, swap `idx[i]` and `idx[j]`,
///   and slot `i` takes row `idx[i]`.
/// * `KMeansPlusPlus`: slot 0 takes row `next_u64() % n`. Each later slot draws
///   `u = (next_u64() >> 11) * 2^-53` and takes the first unchosen row (in
///   index order) whose running sum of squared distances to the nearest chosen
///   centroid exceeds `u * total`. When `total == 0` it takes the lowest
///   unchosen row.
///
/// Restarts (`n_init > 1`) continue the same stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Init {
    Random,
    #[default]
    #[serde(alias = "k-means++", alias = "kmeans++")]
    KMeansPlusPlus,
}

/// Parameters of a K-Means run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansParams {
    pub n_clusters: usize,
    pub random_state: u64,
    /// Upper bound on assignment/update iterations per initialization.
    pub max_iter: usize,
    /// Independent initializations. The run with the lowest inertia wins,
    /// ties going to the earliest run.
    pub n_init: usize,
    /// Upper bound on empty-cluster re-seeds per initialization.
    pub max_reseeds: usize,
    pub init: Init,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            random_state: 0,
            max_iter: DEFAULT_MAX_ITER,
            n_init: DEFAULT_N_INIT,
            max_reseeds: DEFAULT_MAX_RESEEDS,
            init: Init::default(),
        }
    }
}

impl KMeansParams {
    /// Checks the parameters against a dataset of `n_samples` rows. An empty
    /// dataset accepts any `n_clusters >= 1`.
    pub fn validate(&self, n_samples: usize) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(ClusterError::config("n_clusters must be > 0, got 0"));
        }
        if n_samples > 0 && n_samples < self.n_clusters {
            return Err(ClusterError::config(format!(
                "n_samples={} should be >= n_clusters={}",
                n_samples, self.n_clusters
            )));
        }
        if self.max_iter == 0 {
            return Err(ClusterError::config("max_iter must be > 0, got 0"));
        }
        if self.n_init == 0 {
            return Err(ClusterError::config("n_init must be > 0, got 0"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct KMeans {
    pub cluster_centers: Option<Matrix>,
    pub labels: Option<Labels>,
    pub inertia: Option<f64>,
    /// Inertia after initialization and after every iteration of the winning run.
    pub inertia_history: Option<Vec<f64>>,
    pub n_iter: Option<usize>,
    /// `Some(false)` when the winning run stopped at `max_iter` with points
    /// still changing clusters.
    pub converged: Option<bool>,
    pub n_reseeds: Option<usize>,
    params: KMeansParams,
}

/// Result of one initialization followed by Lloyd iterations.
struct Run {
    centroids: Matrix,
    assignment: Vec<usize>,
    inertia_history: Vec<f64>,
    n_iter: usize,
    converged: bool,
    n_reseeds: usize,
}

impl Run {
    fn inertia(&self) -> f64 {
        self.inertia_history.last().copied().unwrap_or(0.0)
    }
}

impl KMeans {
    /// `n_clusters` is checked by [`KMeans::fit`], before any computation.
    pub fn new(n_clusters: usize) -> Self {
        Self::with_params(KMeansParams {
            n_clusters,
            ..KMeansParams::default()
        })
    }

    pub fn with_params(params: KMeansParams) -> Self {
        Self {
            cluster_centers: None,
            labels: None,
            inertia: None,
            inertia_history: None,
            n_iter: None,
            converged: None,
            n_reseeds: None,
            params,
        }
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.params.max_iter = max_iter;
        self
    }

    pub fn random_state(mut self, random_state: u64) -> Self {
        self.params.random_state = random_state;
        self
    }

    pub fn n_init(mut self, n_init: usize) -> Self {
        self.params.n_init = n_init;
        self
    }

    pub fn max_reseeds(mut self, max_reseeds: usize) -> Self {
        self.params.max_reseeds = max_reseeds;
        self
    }

    pub fn init(mut self, init: Init) -> Self {
        self.params.init = init;
        self
    }

    pub fn params(&self) -> &KMeansParams {
        &self.params
    }

    pub fn fit(&mut self, dataset: &Dataset) -> Result<()> {
        self.params.validate(dataset.n_samples())?;

        if dataset.is_empty() {
            self.cluster_centers = None;
            self.labels = Some(Labels::zeros(0));
            self.inertia = Some(0.0);
            self.inertia_history = Some(Vec::new());
            self.n_iter = Some(0);
            self.converged = Some(true);
            self.n_reseeds = Some(0);
            return Ok(());
        }

        let points = dataset.points();
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.random_state);
        let mut best: Option<Run> = None;

        for attempt in 0..self.params.n_init {
            let run = self.lloyd(&points, &mut rng);
            debug!(
                attempt,
                inertia = run.inertia(),
                n_iter = run.n_iter,
                converged = run.converged,
                "k-means initialization finished"
            );
            if best.as_ref().map_or(true, |b| run.inertia() < b.inertia()) {
                best = Some(run);
            }
        }

        let Some(best) = best else {
            return Err(ClusterError::config("n_init must be > 0, got 0"));
        };

        if !best.converged {
            warn!(
                max_iter = self.params.max_iter,
                "k-means stopped at max_iter before assignments stabilized"
            );
        }
        info!(
            n_samples = dataset.n_samples(),
            n_clusters = self.params.n_clusters,
            n_iter = best.n_iter,
            converged = best.converged,
            inertia = best.inertia(),
            "k-means finished"
        );

        self.inertia = Some(best.inertia());
        self.labels = Some(best.assignment.iter().map(|&c| c as i32).collect());
        self.cluster_centers = Some(best.centroids);
        self.inertia_history = Some(best.inertia_history);
        self.n_iter = Some(best.n_iter);
        self.converged = Some(best.converged);
        self.n_reseeds = Some(best.n_reseeds);

        Ok(())
    }

    pub fn fit_predict(&mut self, dataset: &Dataset) -> Result<Labels> {
        self.fit(dataset)?;
        self.labels.clone().ok_or(ClusterError::NotFitted("KMeans"))
    }

    /// Labels new points with their nearest fitted centroid.
    pub fn predict(&self, dataset: &Dataset) -> Result<Labels> {
        let centroids = self.fitted_centers(dataset)?;
        let points = dataset.points();
        Ok(assign(&points, centroids)
            .into_iter()
            .map(|c| c as i32)
            .collect())
    }

    /// Euclidean distance from every point to every centroid, one row per point.
    pub fn transform(&self, dataset: &Dataset) -> Result<Matrix> {
        let centroids = self.fitted_centers(dataset)?;
        let mut distances = Matrix::zeros((dataset.n_samples(), centroids.nrows()));

        for (i, point) in dataset.rows().enumerate() {
            for (k, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
                distances[[i, k]] = euclidean(&point, &centroid);
            }
        }

        Ok(distances)
    }

    fn fitted_centers(&self, dataset: &Dataset) -> Result<&Matrix> {
        let centroids = self
            .cluster_centers
            .as_ref()
            .ok_or(ClusterError::NotFitted("KMeans"))?;

        if dataset.n_samples() > 0 && dataset.n_features() != centroids.ncols() {
            return Err(DataError::DimensionMismatch {
                expected: centroids.ncols(),
                found: dataset.n_features(),
            }
            .into());
        }
        Ok(centroids)
    }

    fn lloyd(&self, points: &ArrayView2<f64>, rng: &mut ChaCha8Rng) -> Run {
        let k = self.params.n_clusters;
        let mut centroids = match self.params.init {
            Init::Random => random_init(points, k, rng),
            Init::KMeansPlusPlus => kmeans_plus_plus_init(points, k, rng),
        };

        let mut assignment = assign(points, &centroids);
        let mut inertia_history = vec![inertia(points, &centroids, &assignment)];
        let mut n_reseeds = 0;
        let mut exhausted_logged = false;

        for iteration in 1..=self.params.max_iter {
            let counts = update_centroids(points, &assignment, &mut centroids);
            let empty: Vec<usize> = counts
                .iter()
                .enumerate()
                .filter(|(_, count)| **count == 0)
                .map(|(c, _)| c)
                .collect();

            if !empty.is_empty() {
                let budget = self.params.max_reseeds - n_reseeds;
                let used = reseed_empty(points, &assignment, &mut centroids, &empty, budget);
                n_reseeds += used;
                if used < empty.len() && !exhausted_logged {
                    warn!(
                        max_reseeds = self.params.max_reseeds,
                        n_empty = empty.len() - used,
                        "empty clusters left after re-seeding budget was exhausted"
                    );
                    exhausted_logged = true;
                }
            }

            let next = assign(points, &centroids);
            let changed = next
                .iter()
                .zip(&assignment)
                .filter(|(new, old)| new != old)
                .count();
            assignment = next;

            let cost = inertia(points, &centroids, &assignment);
            inertia_history.push(cost);
            debug!(iteration, changed, inertia = cost, "k-means iteration");

            if changed == 0 {
                return Run {
                    centroids,
                    assignment,
                    inertia_history,
                    n_iter: iteration,
                    converged: true,
                    n_reseeds,
                };
            }
        }

        Run {
            centroids,
            assignment,
            inertia_history,
            n_iter: self.params.max_iter,
            converged: false,
            n_reseeds,
        }
    }
}

/// Index of the closest centroid and its squared distance. Ties go to the
/// lowest centroid index.
fn nearest_centroid(point: &ArrayView1<f64>, centroids: &Matrix) -> (usize, f64) {
    let mut closest = (0, f64::INFINITY);
    for (k, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
        let distance = squared_euclidean(point, &centroid);
        if distance < closest.1 {
            closest = (k, distance);
        }
    }
    closest
}

fn assign(points: &ArrayView2<f64>, centroids: &Matrix) -> Vec<usize> {
    (0..points.nrows())
        .into_par_iter()
        .map(|i| nearest_centroid(&points.row(i), centroids).0)
        .collect()
}

/// Moves every centroid to the mean of its points and returns the number of
/// points per centroid. Centroids without points are left where they are.
fn update_centroids(points: &ArrayView2<f64>, assignment: &[usize], centroids: &mut Matrix) -> Vec<usize> {
    let mut sums = Matrix::zeros(centroids.raw_dim());
    let mut counts = vec![0usize; centroids.nrows()];

    for (point, &cluster) in points.axis_iter(Axis(0)).zip(assignment) {
        let mut sum = sums.row_mut(cluster);
        sum += &point;
        counts[cluster] += 1;
    }

    for (cluster, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mean = &sums.row(cluster) / count as f64;
            centroids.row_mut(cluster).assign(&mean);
        }
    }

    counts
}

/// Moves each empty centroid onto the point farthest from its own centroid,
/// ties going to the lowest point index. A point is used at most once per
/// call. Returns how many centroids were moved, at most `budget`.
fn reseed_empty(
    points: &ArrayView2<f64>,
    assignment: &[usize],
    centroids: &mut Matrix,
    empty: &[usize],
    budget: usize,
) -> usize {
    let mut spread: Vec<f64> = points
        .axis_iter(Axis(0))
        .zip(assignment)
        .map(|(point, &cluster)| squared_euclidean(&point, &centroids.row(cluster)))
        .collect();

    let mut moved = 0;
    for &slot in empty.iter().take(budget) {
        let mut farthest: Option<(usize, f64)> = None;
        for (i, &d) in spread.iter().enumerate() {
            if d >= 0.0 && farthest.map_or(true, |(_, best)| d > best) {
                farthest = Some((i, d));
            }
        }
        let Some((point, _)) = farthest else {
            break;
        };

        centroids.row_mut(slot).assign(&points.row(point));
        spread[point] = -1.0;
        moved += 1;
        debug!(cluster = slot, point, "re-seeded empty cluster");
    }

    moved
}

fn inertia(points: &ArrayView2<f64>, centroids: &Matrix, assignment: &[usize]) -> f64 {
    points
        .axis_iter(Axis(0))
        .zip(assignment)
        .map(|(point, &cluster)| squared_euclidean(&point, &centroids.row(cluster)))
        .sum()
}

fn random_init(points: &ArrayView2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Matrix {
    let n = points.nrows();
    let mut indices: Vec<usize> = (0..n).collect();

    for i in 0..k {
        let j = i + (rng.next_u64() % (n - i) as u64) as usize;
        indices.swap(i, j);
    }

    points.select(Axis(0), &indices[..k])
}

fn kmeans_plus_plus_init(points: &ArrayView2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Matrix {
    let n = points.nrows();
    let mut chosen = Vec::with_capacity(k);
    let mut taken = vec![false; n];

    let first = (rng.next_u64() % n as u64) as usize;
    chosen.push(first);
    taken[first] = true;

    let mut closest: Vec<f64> = points
        .axis_iter(Axis(0))
        .map(|point| squared_euclidean(&point, &points.row(first)))
        .collect();

    while chosen.len() < k {
        let total: f64 = (0..n).filter(|&i| !taken[i]).map(|i| closest[i]).sum();
        let weighted = if total > 0.0 {
            let target = unit_interval(rng) * total;
            let mut cumulative = 0.0;
            (0..n).filter(|&i| !taken[i]).find(|&i| {
                cumulative += closest[i];
                cumulative > target
            })
        } else {
            None
        };

        // Rounding in the running sum can leave `target` unreached.
        let next = weighted
            .or_else(|| (0..n).rev().find(|&i| !taken[i] && closest[i] > 0.0))
            .or_else(|| (0..n).find(|&i| !taken[i]));
        let Some(next) = next else {
            break;
        };

        chosen.push(next);
        taken[next] = true;
        for (slot, point) in closest.iter_mut().zip(points.axis_iter(Axis(0))) {
            let d = squared_euclidean(&point, &points.row(next));
            if d < *slot {
                *slot = d;
            }
        }
    }

    points.select(Axis(0), &chosen)
}

/// Uniform `f64` in `[0, 1)` from the top 53 bits of one `next_u64()` draw.
fn unit_interval(rng: &mut ChaCha8Rng) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}
