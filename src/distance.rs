use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Distance used by DBSCAN neighborhood queries. K-Means is always Euclidean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Euclidean,
    Manhattan,
}

impl Metric {
    pub fn distance(&self, a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
        match self {
            Metric::Euclidean => euclidean(a, b),
            Metric::Manhattan => manhattan(a, b),
        }
    }
}

pub fn squared_euclidean(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
}

pub fn euclidean(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    squared_euclidean(a, b).sqrt()
}

pub fn manhattan(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_euclidean() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert_abs_diff_eq!(euclidean(&a.view(), &b.view()), 5.0);
        assert_abs_diff_eq!(squared_euclidean(&a.view(), &b.view()), 25.0);
    }

    #[test]
    fn test_manhattan() {
        let a = array![1.0, -1.0, 2.0];
        let b = array![2.0, 1.0, 2.0];
        assert_abs_diff_eq!(Metric::Manhattan.distance(&a.view(), &b.view()), 3.0);
    }

    #[test]
    fn test_identical_points_have_zero_distance() {
        let a = array![8.0, 7.0];
        assert_eq!(Metric::Euclidean.distance(&a.view(), &a.view()), 0.0);
    }
}
