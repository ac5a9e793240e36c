// search.rs - Iterative, spectrum-guided search over the logit generative process

use crate::error::{SearchError, SpectralError};
use crate::graph::Graph;
use crate::spectral::{divergence, spectrum, DivergenceKind};
use rand::Rng;
use rand_distr::StandardNormal;

/// The fitted logit generative process: each node carries a latent
/// position in `R^d` and pair (i, j) is an edge with probability
/// `logistic(sigma * <x_i, x_j>)`.
#[derive(Debug, Clone, Copy)]
pub struct GraphModel {
    pub n: usize,
    pub d: usize,
    pub sigma: f64,
    kind: DivergenceKind,
}

/// Trajectory of one search run: every sampled candidate with its
/// divergence to the target spectrum, plus the winning iteration.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub graphs: Vec<Graph>,
    /// One divergence per executed iteration; `INFINITY` marks candidates
    /// whose spectrum was degenerate (isolated node).
    pub divergences: Vec<f64>,
    pub best_spectrum: Vec<f64>,
    pub best_iteration: usize,
}

impl GraphModel {
    /// Model with the default KL guidance divergence.
    pub fn new(n: usize, d: usize, sigma: f64) -> Self {
        Self { n, d, sigma, kind: DivergenceKind::Kl }
    }

    /// Override the divergence guiding the search.
    pub fn with_divergence(mut self, kind: DivergenceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Draw one candidate graph. Latent positions are redrawn fresh from
    /// `N(0, I_d)` on every call; `d = 0` fixes the similarity at 1 so the
    /// process degenerates to a single edge probability `logistic(sigma)`.
    pub fn sample_graph<R: Rng + ?Sized>(&self, rng: &mut R) -> Graph {
        let positions: Vec<Vec<f64>> = (0..self.n)
            .map(|_| (0..self.d).map(|_| rng.sample(StandardNormal)).collect())
            .collect();

        let mut graph = Graph::empty(self.n);
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                let similarity = if self.d == 0 {
                    1.0
                } else {
                    positions[i]
                        .iter()
                        .zip(positions[j].iter())
                        .map(|(a, b)| a * b)
                        .sum()
                };
                let p = logistic(self.sigma * similarity);
                if rng.gen::<f64>() < p {
                    graph.add_edge(i, j);
                }
            }
        }
        graph
    }

    /// Sample candidates until the spectral divergence to `real_graph`
    /// stagnates.
    ///
    /// The first `warm_up` iterations populate the trajectory but are not
    /// eligible as best; afterwards, `patience` consecutive iterations
    /// without a new minimum terminate the search early. Candidates whose
    /// spectrum is degenerate record an infinite divergence and can never
    /// win.
    pub fn populate_edges_spectrum<R: Rng + ?Sized>(
        &self,
        warm_up: usize,
        max_iterations: usize,
        patience: usize,
        real_graph: &Graph,
        rng: &mut R,
    ) -> Result<SearchResult, SearchError> {
        if max_iterations <= warm_up {
            return Err(SearchError::InvalidSearchWindow { warm_up, max_iterations });
        }
        let target = spectrum(real_graph)?;

        let mut graphs: Vec<Graph> = Vec::new();
        let mut divergences: Vec<f64> = Vec::new();
        let mut best_iteration = warm_up;
        let mut stale = 0usize;

        for t in 0..max_iterations {
            let candidate = self.sample_graph(rng);
            let div = match spectrum(&candidate) {
                Ok(s) => divergence(&s, &target, self.kind),
                Err(SpectralError::DegenerateGraph { .. }) => f64::INFINITY,
                Err(e) => return Err(e.into()),
            };
            graphs.push(candidate);
            divergences.push(div);

            if t > warm_up {
                if div < divergences[best_iteration] {
                    best_iteration = t;
                    stale = 0;
                } else {
                    stale += 1;
                    if stale >= patience {
                        break;
                    }
                }
            }
        }

        let best_spectrum = spectrum(&graphs[best_iteration])?;
        Ok(SearchResult { graphs, divergences, best_spectrum, best_iteration })
    }
}

#[inline(always)]
fn logistic(t: f64) -> f64 {
    1.0 / (1.0 + (-t).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn zero_dimension_gives_constant_edge_probability() {
        // sigma = 0, d = 0: every pair independently with probability 1/2
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let model = GraphModel::new(40, 0, 0.0);
        let g = model.sample_graph(&mut rng);
        let pairs = (40 * 39 / 2) as f64;
        let density = g.m() as f64 / pairs;
        assert!((density - 0.5).abs() < 0.1, "density {}", density);
    }

    #[test]
    fn strong_negative_sigma_empties_the_graph() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let model = GraphModel::new(20, 0, -30.0);
        let g = model.sample_graph(&mut rng);
        assert_eq!(g.m(), 0);
    }
}
