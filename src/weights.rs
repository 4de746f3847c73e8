use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::graph::NeighborGraph;

/// Weight standardization style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// `"B"`: 1 for every neighbor.
    Binary,
    /// `"W"`: `1 / degree` for every neighbor, so each row sums to 1.
    RowStandardized,
}

impl FromStr for Style {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "B" => Ok(Style::Binary),
            "W" => Ok(Style::RowStandardized),
            other => Err(Error::UnknownStyle(other.to_string())),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Binary => f.write_str("B"),
            Style::RowStandardized => f.write_str("W"),
        }
    }
}

/// Dense `n x n` spatial weights, stored row-major in one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    n: usize,
    style: Style,
    values: Vec<f64>,
    s0: f64,
    isolated: Vec<usize>,
}

impl WeightMatrix {
    pub fn derive(graph: &NeighborGraph, style: Style) -> Self {
        let n = graph.n();
        let mut values = vec![0.0; n * n];
        let mut isolated = Vec::new();

        for (i, list) in graph.lists().iter().enumerate() {
            // 孤立ユニットの行はゼロのまま
            if list.is_empty() {
                isolated.push(i);
                continue;
            }
            let weight = match style {
                Style::Binary => 1.0,
                Style::RowStandardized => 1.0 / list.len() as f64,
            };
            let row = &mut values[i * n..(i + 1) * n];
            for &j in list {
                row[j] = weight;
            }
        }

        if !isolated.is_empty() {
            warn!(
                "{} of {} units have no neighbors, their weight rows are zero: {:?}",
                isolated.len(),
                n,
                isolated
            );
        }
        if !graph.is_symmetric() {
            warn!("Neighbor graph of {} units is not symmetric", n);
        }

        let s0: f64 = values.iter().sum();
        debug!("Derived {} weights for {} units (S0 = {})", style, n, s0);

        Self {
            n,
            style,
            values,
            s0,
            isolated,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Weight of `j` as a neighbor of `i`.
    ///
    /// # Panics
    /// If `i` or `j` is not below `n`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(j < self.n, "column {} out of range for {} units", j, self.n);
        self.values[i * self.n + j]
    }

    /// # Panics
    /// If `i` is not below `n`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact はサイズ0でパニックする
        self.values.chunks_exact(self.n.max(1))
    }

    pub fn row_sums(&self) -> Vec<f64> {
        self.rows().map(|row| row.iter().sum()).collect()
    }

    fn col_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n];
        for row in self.rows() {
            for (sum, w) in sums.iter_mut().zip(row) {
                *sum += w;
            }
        }
        sums
    }

    /// Sum of all weights.
    pub fn s0(&self) -> f64 {
        self.s0
    }

    /// `½ ΣΣ (w_ij + w_ji)²`
    pub fn s1(&self) -> f64 {
        let n = self.n;
        let mut total = 0.0;
        for i in 0..n {
            for j in 0..n {
                let w = self.values[i * n + j] + self.values[j * n + i];
                total += w * w;
            }
        }
        0.5 * total
    }

    /// `Σ_i (w_i. + w_.i)²`
    pub fn s2(&self) -> f64 {
        self.row_sums()
            .iter()
            .zip(self.col_sums())
            .map(|(r, c)| (r + c) * (r + c))
            .sum()
    }

    /// Units with no neighbors, whose rows are all zero.
    pub fn isolated(&self) -> &[usize] {
        &self.isolated
    }

    /// Spatial lag `W * values`; under `"W"` this is the neighbor mean.
    pub fn lag(&self, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.n {
            return Err(Error::DimensionMismatch {
                expected: self.n,
                actual: values.len(),
            });
        }
        Ok(self
            .rows()
            .map(|row| row.iter().zip(values).map(|(w, v)| w * v).sum())
            .collect())
    }
}
