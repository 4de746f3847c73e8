use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Lattice contiguity rule used by [`NeighborGraph::grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contiguity {
    /// Shared edge (4 neighbors).
    Rook,
    /// Shared edge or corner (8 neighbors).
    Queen,
}

/// Adjacency between spatial units, indexed `0..n`.
///
/// Each neighbor list is sorted ascending and holds no duplicates or
/// self-references. Symmetry is assumed by the statistics but not enforced,
/// see [`NeighborGraph::is_symmetric`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborGraph {
    neighbors: Vec<Vec<usize>>,
}

impl NeighborGraph {
    /// Builds a graph from directed links: `(i, j)` makes `j` a neighbor of `i`.
    pub fn build<I>(n: usize, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut neighbors = vec![Vec::new(); n];
        for (i, j) in pairs {
            check_link(n, i, j)?;
            neighbors[i].push(j);
        }
        Ok(Self::normalized(neighbors))
    }

    /// Builds a graph from undirected edges, inserting both directions.
    pub fn from_edges<I>(n: usize, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut neighbors = vec![Vec::new(); n];
        for (i, j) in edges {
            check_link(n, i, j)?;
            neighbors[i].push(j);
            neighbors[j].push(i);
        }
        Ok(Self::normalized(neighbors))
    }

    /// Validates ready-made neighbor lists, one per unit.
    pub fn from_lists(lists: Vec<Vec<usize>>) -> Result<Self> {
        let n = lists.len();
        for (i, list) in lists.iter().enumerate() {
            for &j in list {
                check_link(n, i, j)?;
            }
        }
        Ok(Self::normalized(lists))
    }

    /// Contiguity for a `rows x cols` lattice with row-major unit indices.
    pub fn grid(rows: usize, cols: usize, contiguity: Contiguity) -> Self {
        let mut neighbors = vec![Vec::new(); rows * cols];

        for row in 0..rows {
            for col in 0..cols {
                let list = &mut neighbors[row * cols + col];
                for dr in -1_isize..=1 {
                    for dc in -1_isize..=1 {
                        if dr == 0 && dc == 0 {
                            continue;
                        }
                        // ルークは角を共有するセルを除外
                        if contiguity == Contiguity::Rook && dr != 0 && dc != 0 {
                            continue;
                        }
                        let nr = row as isize + dr;
                        let nc = col as isize + dc;
                        if nr >= 0 && nc >= 0 && (nr as usize) < rows && (nc as usize) < cols {
                            list.push(nr as usize * cols + nc as usize);
                        }
                    }
                }
            }
        }

        Self::normalized(neighbors)
    }

    fn normalized(mut neighbors: Vec<Vec<usize>>) -> Self {
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        Self { neighbors }
    }

    /// Number of units.
    pub fn n(&self) -> usize {
        self.neighbors.len()
    }

    pub fn neighbors_of(&self, i: usize) -> Result<&[usize]> {
        self.neighbors
            .get(i)
            .map(Vec::as_slice)
            .ok_or(Error::InvalidIndex { index: i, n: self.n() })
    }

    pub fn degree(&self, i: usize) -> Result<usize> {
        self.neighbors_of(i).map(<[usize]>::len)
    }

    /// Total number of directed links.
    pub fn link_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum()
    }

    pub fn is_symmetric(&self) -> bool {
        self.neighbors.iter().enumerate().all(|(i, list)| {
            list.iter()
                .all(|&j| self.neighbors[j].binary_search(&i).is_ok())
        })
    }

    pub(crate) fn lists(&self) -> &[Vec<usize>] {
        &self.neighbors
    }

    pub fn summary(&self) -> GraphSummary {
        let n = self.n();
        let links = self.link_count();

        let mut degree_counts = BTreeMap::new();
        for list in &self.neighbors {
            *degree_counts.entry(list.len()).or_insert(0) += 1;
        }

        let min_degree = degree_counts.keys().next().copied().unwrap_or(0);
        let max_degree = degree_counts.keys().next_back().copied().unwrap_or(0);
        let units_with = |degree: usize| -> Vec<usize> {
            self.neighbors
                .iter()
                .enumerate()
                .filter(|(_, list)| list.len() == degree)
                .map(|(i, _)| i)
                .collect()
        };

        let (mean_degree, percent_nonzero) = if n == 0 {
            (0.0, 0.0)
        } else {
            let nf = n as f64;
            (links as f64 / nf, 100.0 * links as f64 / (nf * nf))
        };

        GraphSummary {
            n,
            links,
            percent_nonzero,
            mean_degree,
            least_connected: units_with(min_degree),
            most_connected: units_with(max_degree),
            isolated: units_with(0),
            degree_counts,
        }
    }
}

fn check_link(n: usize, i: usize, j: usize) -> Result<()> {
    if i >= n {
        return Err(Error::InvalidIndex { index: i, n });
    }
    if j >= n {
        return Err(Error::InvalidIndex { index: j, n });
    }
    if i == j {
        return Err(Error::SelfLoop { index: i });
    }
    Ok(())
}

/// Descriptive statistics for sanity-checking a graph before any test is run.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSummary {
    pub n: usize,
    pub links: usize,
    pub percent_nonzero: f64,
    pub mean_degree: f64,
    /// Number of units per degree.
    pub degree_counts: BTreeMap<usize, usize>,
    pub least_connected: Vec<usize>,
    pub most_connected: Vec<usize>,
    pub isolated: Vec<usize>,
}

impl fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of regions: {}", self.n)?;
        writeln!(f, "Number of nonzero links: {}", self.links)?;
        writeln!(f, "Percentage nonzero weights: {}", self.percent_nonzero)?;
        writeln!(f, "Average number of links: {}", self.mean_degree)?;
        if !self.isolated.is_empty() {
            writeln!(f, "{} regions with no links: {:?}", self.isolated.len(), self.isolated)?;
        }
        writeln!(f, "Link number distribution:")?;
        let degrees: Vec<String> = self.degree_counts.keys().map(|d| d.to_string()).collect();
        let counts: Vec<String> = self.degree_counts.values().map(|c| c.to_string()).collect();
        writeln!(f, "  degree: {}", degrees.join(" "))?;
        write!(f, "  units:  {}", counts.join(" "))
    }
}
