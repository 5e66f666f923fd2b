use crate::dataset::Dataset;
use crate::error::{ClusterError, DataError, Result};
use crate::Vector;
use ndarray::Axis;

/// Rescales every feature to zero mean and unit variance.
///
/// Constant features are only centered.
#[derive(Clone, Debug, Default)]
pub struct StandardScaler {
    mean: Option<Vector>,
    std: Option<Vector>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
        }
    }

    pub fn fit(&mut self, data: &Dataset) -> Result<()> {
        let points = data.points();
        let mean = points
            .mean_axis(Axis(0))
            .ok_or_else(|| ClusterError::config("cannot fit a scaler on an empty dataset"))?;
        let std = points
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 { s } else { 1.0 });

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    pub fn transform(&self, data: &Dataset) -> Result<Dataset> {
        let mean = self.mean.as_ref().ok_or(ClusterError::NotFitted("StandardScaler"))?;
        let std = self.std.as_ref().ok_or(ClusterError::NotFitted("StandardScaler"))?;

        if data.n_samples() > 0 && data.n_features() != mean.len() {
            return Err(DataError::DimensionMismatch {
                expected: mean.len(),
                found: data.n_features(),
            }
            .into());
        }

        let mut result = data.points().to_owned();
        for mut row in result.axis_iter_mut(Axis(0)) {
            row -= mean;
            row /= std;
        }

        Dataset::from_matrix(result)
    }

    pub fn fit_transform(&mut self, data: &Dataset) -> Result<Dataset> {
        self.fit(data)?;
        self.transform(data)
    }
}
