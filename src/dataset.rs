//! Normalization of tabular input into an indexed sequence of feature vectors.
//!
//! Every column that reaches a [`Dataset`] is treated as a feature dimension.
//! Columns such as ground-truth labels must be removed by the caller (for
//! example with [`Table::drop_columns`]) before the dataset is built; nothing
//! here tries to guess which columns are features.

use crate::error::{DataError, Result};
use crate::Matrix;
use ndarray::{ArrayView1, ArrayView2, Axis};

/// An ordered, immutable set of points. Row `i` is point `i`, and every
/// engine returns labels in the same order.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    points: Matrix,
}

impl Dataset {
    /// Wraps a feature matrix, rejecting NaN and infinite values.
    pub fn from_matrix(points: Matrix) -> Result<Self> {
        if points.nrows() > 0 && points.ncols() == 0 {
            return Err(DataError::NoFeatures(points.nrows()).into());
        }
        for ((row, column), &value) in points.indexed_iter() {
            if !value.is_finite() {
                return Err(DataError::NonFinite { row, column, value }.into());
            }
        }
        Ok(Self { points })
    }

    /// Builds a dataset from row-major slices. All rows must have the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let n_features = rows.first().map_or(0, |row| row.as_ref().len());
        let mut values = Vec::with_capacity(rows.len() * n_features);

        for (row, values_in_row) in rows.iter().enumerate() {
            let values_in_row = values_in_row.as_ref();
            if values_in_row.len() != n_features {
                return Err(DataError::RaggedRow {
                    row,
                    expected: n_features,
                    found: values_in_row.len(),
                }
                .into());
            }
            values.extend_from_slice(values_in_row);
        }

        let points = Matrix::from_shape_vec((rows.len(), n_features), values)
            .map_err(|_| DataError::RaggedRow {
                row: 0,
                expected: n_features,
                found: 0,
            })?;
        Self::from_matrix(points)
    }

    pub fn empty() -> Self {
        Self {
            points: Matrix::zeros((0, 0)),
        }
    }

    pub fn n_samples(&self) -> usize {
        self.points.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.points.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_samples() == 0
    }

    pub fn point(&self, index: usize) -> ArrayView1<'_, f64> {
        self.points.row(index)
    }

    pub fn points(&self) -> ArrayView2<'_, f64> {
        self.points.view()
    }

    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> {
        self.points.axis_iter(Axis(0))
    }

    pub fn into_matrix(self) -> Matrix {
        self.points
    }
}

impl TryFrom<Matrix> for Dataset {
    type Error = crate::ClusterError;

    fn try_from(points: Matrix) -> Result<Self> {
        Self::from_matrix(points)
    }
}

impl TryFrom<&Table> for Dataset {
    type Error = crate::ClusterError;

    /// Parses every cell of every column as `f64`.
    fn try_from(table: &Table) -> Result<Self> {
        let n_features = table.columns.len();
        let mut values = Vec::with_capacity(table.rows.len() * n_features);

        for (row, cells) in table.rows.iter().enumerate() {
            for (column, cell) in table.columns.iter().zip(cells) {
                let cell = cell.trim();
                if cell.is_empty() {
                    return Err(DataError::Missing {
                        row,
                        column: column.clone(),
                    }
                    .into());
                }
                let value = cell.parse::<f64>().map_err(|_| DataError::NonNumeric {
                    row,
                    column: column.clone(),
                    value: cell.to_string(),
                })?;
                values.push(value);
            }
        }

        let points = Matrix::from_shape_vec((table.rows.len(), n_features), values)
            .map_err(|_| DataError::NoFeatures(table.rows.len()))?;
        Dataset::from_matrix(points)
    }
}

/// A row-major table of named text cells, such as a parsed CSV file.
///
/// Cells are only interpreted as numbers when the table is converted into a
/// [`Dataset`], at which point *all* remaining columns become features.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<C, R, S>(columns: C, rows: R) -> Result<Self>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator<Item = Vec<S>>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut table_rows = Vec::new();

        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != columns.len() {
                return Err(DataError::RaggedRow {
                    row,
                    expected: columns.len(),
                    found: cells.len(),
                }
                .into());
            }
            table_rows.push(cells.into_iter().map(Into::into).collect());
        }

        Ok(Self {
            columns,
            rows: table_rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns the raw cells of one column, e.g. a ground-truth label column
    /// kept aside before clustering.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Keeps only the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.project(&indices))
    }

    /// Removes the named columns, keeping the rest in their original order.
    pub fn drop_columns(&self, names: &[&str]) -> Result<Table> {
        for name in names {
            self.column_index(name)?;
        }
        let indices: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| !names.contains(&column.as_str()))
            .map(|(i, _)| i)
            .collect();
        Ok(self.project(&indices))
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| DataError::UnknownColumn(name.to_string()).into())
    }

    fn project(&self, indices: &[usize]) -> Table {
        Table {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }
}
