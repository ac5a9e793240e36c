// graph.rs - Dense symmetric adjacency structure for observed and generated networks

use crate::error::GraphError;
use nalgebra::DMatrix;

/// A simple undirected graph over `n` labeled nodes, stored as a dense
/// symmetric adjacency matrix with a zero diagonal. Entries are edge
/// weights; every generator in this crate writes 0/1 entries, while
/// observed matrices may carry arbitrary non-negative weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    adj: DMatrix<f64>,
}

impl Graph {
    /// Wrap an adjacency matrix, checking the structural invariants.
    pub fn from_adjacency(adj: DMatrix<f64>) -> Result<Self, GraphError> {
        let (rows, cols) = adj.shape();
        if rows != cols {
            return Err(GraphError::NotSquare { rows, cols });
        }
        for i in 0..rows {
            if adj[(i, i)] != 0.0 {
                return Err(GraphError::NonzeroDiagonal { node: i });
            }
            for j in (i + 1)..cols {
                if (adj[(i, j)] - adj[(j, i)]).abs() > 1e-12 {
                    return Err(GraphError::NotSymmetric { i, j });
                }
            }
        }
        Ok(Self { adj })
    }

    /// Graph on `n` nodes with no edges.
    pub fn empty(n: usize) -> Self {
        Self { adj: DMatrix::zeros(n, n) }
    }

    /// Number of vertices.
    #[inline(always)]
    pub fn n(&self) -> usize {
        self.adj.nrows()
    }

    /// Number of edges (nonzero unordered pairs).
    pub fn m(&self) -> usize {
        let n = self.n();
        let mut count = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                if self.adj[(i, j)] != 0.0 {
                    count += 1;
                }
            }
        }
        count
    }

    /// Insert an undirected unit-weight edge.
    #[inline(always)]
    pub fn add_edge(&mut self, i: usize, j: usize) {
        if i != j {
            self.adj[(i, j)] = 1.0;
            self.adj[(j, i)] = 1.0;
        }
    }

    #[inline(always)]
    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        self.adj[(i, j)] != 0.0
    }

    /// Weighted degree of node `i` (row sum).
    pub fn degree(&self, i: usize) -> f64 {
        self.adj.row(i).sum()
    }

    /// All weighted degrees.
    pub fn degrees(&self) -> Vec<f64> {
        (0..self.n()).map(|i| self.degree(i)).collect()
    }

    /// Borrow the underlying adjacency matrix.
    pub fn adjacency(&self) -> &DMatrix<f64> {
        &self.adj
    }

    /// Iterate over all unordered pairs (i < j), edges and non-edges alike.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.n();
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j)))
    }
}
