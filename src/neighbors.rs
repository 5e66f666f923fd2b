//! Radius queries over a [`Dataset`].
//!
//! DBSCAN only needs "which points lie within `radius` of point `i`". That
//! contract is the [`RegionQuery`] trait; [`BruteForce`] answers it with a
//! linear scan and [`GridIndex`] with a uniform grid of cells. Both return
//! neighbor indices in ascending order, so clustering results do not depend on
//! which one is used.

use crate::dataset::Dataset;
use crate::distance::Metric;
use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub trait RegionQuery {
    /// Indices of all points whose distance to point `index` is `<= radius`,
    /// including `index` itself, in ascending order.
    fn neighbors(&self, index: usize, radius: f64) -> Vec<usize>;
}

/// Which [`RegionQuery`] implementation DBSCAN builds for a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborSearch {
    #[default]
    BruteForce,
    Grid,
}

/// O(n) scan per query.
#[derive(Clone, Copy, Debug)]
pub struct BruteForce<'a> {
    dataset: &'a Dataset,
    metric: Metric,
}

impl<'a> BruteForce<'a> {
    pub fn new(dataset: &'a Dataset, metric: Metric) -> Self {
        Self { dataset, metric }
    }
}

impl RegionQuery for BruteForce<'_> {
    fn neighbors(&self, index: usize, radius: f64) -> Vec<usize> {
        let point = self.dataset.point(index);
        self.dataset
            .rows()
            .enumerate()
            .filter(|(_, other)| self.metric.distance(&point, other) <= radius)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Buckets points into axis-aligned cells of side `cell_size`.
///
/// A query only measures distances to points whose cells lie within
/// `ceil(radius / cell_size) + 1` cells of the query point's cell on every
/// axis. The extra ring absorbs rounding in the cell coordinates. Building the
/// grid with `cell_size == eps` gives the usual DBSCAN speedup on
/// low-dimensional data.
#[derive(Clone, Debug)]
pub struct GridIndex<'a> {
    dataset: &'a Dataset,
    metric: Metric,
    cell_size: f64,
    point_cells: Vec<Vec<i64>>,
    cells: HashMap<Vec<i64>, Vec<usize>>,
}

impl<'a> GridIndex<'a> {
    pub fn new(dataset: &'a Dataset, metric: Metric, cell_size: f64) -> Result<Self> {
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(ClusterError::config(format!(
                "cell_size must be a finite value > 0, got {}",
                cell_size
            )));
        }

        let point_cells: Vec<Vec<i64>> = dataset
            .rows()
            .map(|row| row.iter().map(|&x| (x / cell_size).floor() as i64).collect())
            .collect();

        let mut cells: HashMap<Vec<i64>, Vec<usize>> = HashMap::new();
        for (i, cell) in point_cells.iter().enumerate() {
            cells.entry(cell.clone()).or_default().push(i);
        }

        tracing::debug!(
            n_points = dataset.n_samples(),
            n_cells = cells.len(),
            cell_size,
            "built grid index"
        );

        Ok(Self {
            dataset,
            metric,
            cell_size,
            point_cells,
            cells,
        })
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }
}

impl RegionQuery for GridIndex<'_> {
    fn neighbors(&self, index: usize, radius: f64) -> Vec<usize> {
        let point = self.dataset.point(index);
        let home = &self.point_cells[index];
        let reach = (radius / self.cell_size).ceil() as i64 + 1;

        let mut found: Vec<usize> = self
            .cells
            .iter()
            .filter(|(cell, _)| {
                cell.iter()
                    .zip(home)
                    .all(|(c, h)| c.saturating_sub(*h).saturating_abs() <= reach)
            })
            .flat_map(|(_, members)| members.iter().copied())
            .filter(|&i| self.metric.distance(&point, &self.dataset.point(i)) <= radius)
            .collect();

        found.sort_unstable();
        found
    }
}
