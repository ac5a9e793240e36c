// model_selection.rs - Classical random-graph families, parameter search, GIC ranking

use crate::error::{SelectionError, SpectralError};
use crate::gic::GraphInformationCriterion;
use crate::graph::Graph;
use crate::spectral::{spectrum, DivergenceKind};
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

/// Ring-lattice degree used by the Watts-Strogatz generator when the
/// caller does not override it.
pub const DEFAULT_WS_K: usize = 8;

/// Relative tolerance under which two GIC scores count as tied.
const GIC_TIE_TOL: f64 = 1e-12;

/// The closed catalogue of candidate generative mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Erdős–Rényi: independent edges with fixed probability.
    Er,
    /// Watts–Strogatz: rewired ring lattice.
    Ws,
    /// Geometric random graph: proximity in the unit square.
    Grg,
    /// Barabási–Albert: preferential attachment.
    Ba,
    /// The fitted latent logit model.
    Lg,
}

impl ModelKind {
    pub const ALL: [Self; 5] = [Self::Er, Self::Ws, Self::Grg, Self::Ba, Self::Lg];

    pub fn label(self) -> &'static str {
        match self {
            Self::Er => "ER",
            Self::Ws => "WS",
            Self::Grg => "GRG",
            Self::Ba => "BA",
            Self::Lg => "LG",
        }
    }

    /// Free parameters of the family; used by the GIC complexity penalty
    /// and by the simpler-model tie-break.
    pub fn param_count(self) -> usize {
        match self {
            Self::Er | Self::Grg | Self::Ba => 1,
            // WS carries (k, beta); LG carries (d, sigma).
            Self::Ws | Self::Lg => 2,
        }
    }

    fn tag(self) -> u64 {
        match self {
            Self::Er => 1,
            Self::Ws => 2,
            Self::Grg => 3,
            Self::Ba => 4,
            Self::Lg => 5,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModelKind {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ER" => Ok(Self::Er),
            "WS" => Ok(Self::Ws),
            "GRG" => Ok(Self::Grg),
            "BA" => Ok(Self::Ba),
            "LG" => Ok(Self::Lg),
            _ => Err(SelectionError::UnknownModel { name: s.to_string() }),
        }
    }
}

/// Inclusive 1-D search range for a family's parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub lo: f64,
    pub hi: f64,
}

/// Score of one family after its parameter search.
#[derive(Debug, Clone, PartialEq)]
pub struct GicResult {
    pub model: ModelKind,
    pub param: f64,
    pub gic: f64,
}

/// Ranked output of `select_model`, ascending by GIC.
#[derive(Debug, Clone)]
pub struct ModelSelection {
    pub estimates: Vec<GicResult>,
}

impl ModelSelection {
    /// The winning family (minimal GIC).
    pub fn best(&self) -> Option<&GicResult> {
        self.estimates.first()
    }
}

// ---------------------------------------------------------------------------
// Classical generators
// ---------------------------------------------------------------------------

/// Erdős–Rényi G(n, p): each pair independently with probability `p`.
pub fn erdos_renyi<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> Graph {
    let mut g = Graph::empty(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if rng.gen::<f64>() < p {
                g.add_edge(i, j);
            }
        }
    }
    g
}

/// Watts–Strogatz: ring lattice of degree `k`, each right-hand edge
/// rewired with probability `beta` to a uniformly chosen non-neighbor.
pub fn watts_strogatz<R: Rng + ?Sized>(n: usize, k: usize, beta: f64, rng: &mut R) -> Graph {
    let mut g = Graph::empty(n);
    if n < 2 {
        return g;
    }
    let half = (k / 2).max(1).min(n.saturating_sub(1) / 2).max(1);

    for i in 0..n {
        for offset in 1..=half {
            let j = (i + offset) % n;
            if rng.gen::<f64>() < beta {
                // Rewire: keep the source endpoint, redraw the target.
                let mut target = rng.gen_range(0..n);
                let mut attempts = 0;
                while (target == i || g.has_edge(i, target)) && attempts < 4 * n {
                    target = rng.gen_range(0..n);
                    attempts += 1;
                }
                if target != i && !g.has_edge(i, target) {
                    g.add_edge(i, target);
                } else {
                    g.add_edge(i, j);
                }
            } else {
                g.add_edge(i, j);
            }
        }
    }
    g
}

/// Geometric random graph: `n` points uniform in the unit square,
/// connected when within Euclidean distance `radius`.
pub fn random_geometric<R: Rng + ?Sized>(n: usize, radius: f64, rng: &mut R) -> Graph {
    let points: Vec<(f64, f64)> = (0..n).map(|_| (rng.gen::<f64>(), rng.gen::<f64>())).collect();
    let r2 = radius * radius;
    let mut g = Graph::empty(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = points[i].0 - points[j].0;
            let dy = points[i].1 - points[j].1;
            if dx * dx + dy * dy <= r2 {
                g.add_edge(i, j);
            }
        }
    }
    g
}

/// Barabási–Albert preferential attachment: each new node brings `m`
/// edges to existing nodes chosen proportionally to degree.
pub fn barabasi_albert<R: Rng + ?Sized>(n: usize, m: usize, rng: &mut R) -> Graph {
    let mut g = Graph::empty(n);
    if n < 2 {
        return g;
    }
    let m = m.clamp(1, n - 1);

    // Attachment pool: one entry per edge endpoint, so uniform draws from
    // it are degree-proportional.
    let mut pool: Vec<usize> = Vec::with_capacity(2 * m * n);
    let mut targets: Vec<usize> = (0..m).collect();

    for source in m..n {
        for &t in &targets {
            g.add_edge(source, t);
            pool.push(t);
            pool.push(source);
        }
        if source + 1 < n {
            targets.clear();
            let mut attempts = 0;
            while targets.len() < m && attempts < 100 * m {
                let pick = pool[rng.gen_range(0..pool.len())];
                if !targets.contains(&pick) {
                    targets.push(pick);
                }
                attempts += 1;
            }
            // Fill from low-degree nodes if the pool kept repeating.
            let mut fallback = 0;
            while targets.len() < m {
                if !targets.contains(&fallback) {
                    targets.push(fallback);
                }
                fallback += 1;
            }
        }
    }
    g
}

/// Monomorphic graph-sampling function for a classical family.
pub type GraphGenerator = fn(usize, f64, &mut Pcg64) -> Graph;

fn gen_er(n: usize, param: f64, rng: &mut Pcg64) -> Graph {
    erdos_renyi(n, param, rng)
}

fn gen_ws(n: usize, param: f64, rng: &mut Pcg64) -> Graph {
    watts_strogatz(n, DEFAULT_WS_K, param, rng)
}

fn gen_grg(n: usize, param: f64, rng: &mut Pcg64) -> Graph {
    random_geometric(n, param, rng)
}

fn gen_ba(n: usize, param: f64, rng: &mut Pcg64) -> Graph {
    barabasi_albert(n, param.round() as usize, rng)
}

/// Lookup table from family tag to generator. `Lg` has no closed-form
/// `(n, param)` generator (its candidates come from the search) and is
/// reported as unknown here.
pub fn model_function(model: ModelKind) -> Result<GraphGenerator, SelectionError> {
    match model {
        ModelKind::Er => Ok(gen_er),
        ModelKind::Ws => Ok(gen_ws),
        ModelKind::Grg => Ok(gen_grg),
        ModelKind::Ba => Ok(gen_ba),
        ModelKind::Lg => Err(SelectionError::UnknownModel { name: model.label().to_string() }),
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Fits each classical family with a 1-D grid search, scores the fitted
/// latent model's candidate graphs directly, and ranks everything by GIC.
pub struct GraphModelSelection<'a> {
    graph: &'a Graph,
    log_graphs: &'a [Graph],
    log_params: &'a [f64],
    models: Vec<ModelKind>,
    /// One range per classical family, in `models` order (LG excluded).
    parameters: Vec<ParamRange>,
    /// Grid size of the per-family parameter search.
    n_runs: usize,
    dist_type: DivergenceKind,
    ws_k: usize,
    seed: u64,
    penalty_weight: f64,
}

impl<'a> GraphModelSelection<'a> {
    pub fn new(
        graph: &'a Graph,
        log_graphs: &'a [Graph],
        log_params: &'a [f64],
        models: Vec<ModelKind>,
        parameters: Vec<ParamRange>,
        n_runs: usize,
        dist_type: DivergenceKind,
    ) -> Self {
        Self {
            graph,
            log_graphs,
            log_params,
            models,
            parameters,
            n_runs: n_runs.max(1),
            dist_type,
            ws_k: DEFAULT_WS_K,
            seed: 0,
            penalty_weight: 0.0,
        }
    }

    /// Base seed for the per-run RNG streams.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Ring-lattice degree for the WS family.
    pub fn with_ws_k(mut self, k: usize) -> Self {
        self.ws_k = k;
        self
    }

    /// Complexity-penalty weight forwarded to the GIC.
    pub fn with_penalty(mut self, weight: f64) -> Self {
        self.penalty_weight = weight;
        self
    }

    /// Run the full selection: one `GicResult` per requested family,
    /// sorted ascending by GIC (ties go to the simpler family).
    pub fn select_model(&self) -> Result<ModelSelection, SelectionError> {
        // Surface a degenerate observed graph up front; after this, any
        // degenerate spectrum belongs to a sampled candidate and scores
        // INFINITY for that run instead of aborting the scan.
        spectrum(self.graph)?;

        let mut estimates = Vec::with_capacity(self.models.len());
        let mut range_idx = 0;
        for &model in &self.models {
            let result = if model == ModelKind::Lg {
                self.score_logit()?
            } else {
                let range = *self.parameters.get(range_idx).ok_or_else(|| {
                    SelectionError::MissingParameterRange { model: model.label().to_string() }
                })?;
                range_idx += 1;
                self.search_family(model, range)
            };
            estimates.push(result);
        }

        estimates.sort_by(|a, b| {
            a.gic
                .total_cmp(&b.gic)
                .then_with(|| a.model.param_count().cmp(&b.model.param_count()))
        });
        break_near_ties(&mut estimates);

        Ok(ModelSelection { estimates })
    }

    /// Grid search over the family's parameter range; each run draws its
    /// own deterministic RNG stream so the scan parallelizes cleanly.
    fn search_family(&self, model: ModelKind, range: ParamRange) -> GicResult {
        let grid: Vec<f64> = if self.n_runs == 1 {
            vec![range.lo]
        } else {
            let step = (range.hi - range.lo) / (self.n_runs - 1) as f64;
            (0..self.n_runs).map(|i| range.lo + step * i as f64).collect()
        };

        let scored: Vec<(f64, f64)> = grid
            .par_iter()
            .enumerate()
            .map(|(run, &param)| {
                let stream = (model.tag() << 32) | run as u64;
                let mut rng = Pcg64::seed_from_u64(self.seed ^ stream);
                let candidate = self.sample_classical(model, param, &mut rng);
                (param, self.gic_for(&candidate, model))
            })
            .collect();

        let &(param, gic) = scored
            .iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or(&(range.lo, f64::INFINITY));
        GicResult { model, param, gic }
    }

    fn sample_classical(&self, model: ModelKind, param: f64, rng: &mut Pcg64) -> Graph {
        let n = self.graph.n();
        match model {
            ModelKind::Er => erdos_renyi(n, param, rng),
            ModelKind::Ws => watts_strogatz(n, self.ws_k, param, rng),
            ModelKind::Grg => random_geometric(n, param, rng),
            ModelKind::Ba => barabasi_albert(n, param.round() as usize, rng),
            ModelKind::Lg => unreachable!("LG candidates come from the search trajectory"),
        }
    }

    /// Score the already-generated latent-model candidates and keep the
    /// best, mirroring the per-family minimization.
    fn score_logit(&self) -> Result<GicResult, SelectionError> {
        if self.log_graphs.is_empty() {
            return Err(SelectionError::NoLogitCandidates);
        }
        let mut best_gic = f64::INFINITY;
        let mut best_param = self.log_params.first().copied().unwrap_or(f64::NAN);
        for (i, candidate) in self.log_graphs.iter().enumerate() {
            let gic = self.gic_for(candidate, ModelKind::Lg);
            if gic < best_gic {
                best_gic = gic;
                best_param = self.log_params.get(i).copied().unwrap_or(best_param);
            }
        }
        Ok(GicResult { model: ModelKind::Lg, param: best_param, gic: best_gic })
    }

    fn gic_for(&self, candidate: &Graph, model: ModelKind) -> f64 {
        let criterion =
            GraphInformationCriterion::new(self.graph, candidate, model, self.dist_type)
                .with_penalty(self.penalty_weight);
        match criterion.calculate_gic() {
            Ok(v) => v,
            // The observed graph was validated up front, so a degenerate
            // spectrum here is the candidate's.
            Err(SpectralError::DegenerateGraph { .. }) => f64::INFINITY,
            Err(_) => f64::INFINITY,
        }
    }
}

/// Reorder adjacent entries whose GIC scores agree within floating-point
/// tolerance so the family with fewer free parameters comes first.
fn break_near_ties(estimates: &mut [GicResult]) {
    let len = estimates.len();
    for _ in 0..len {
        let mut swapped = false;
        for i in 1..len {
            let (a, b) = (&estimates[i - 1], &estimates[i]);
            let scale = a.gic.abs().max(b.gic.abs()).max(1.0);
            let tied = (a.gic - b.gic).abs() <= GIC_TIE_TOL * scale;
            if tied && b.model.param_count() < a.model.param_count() {
                estimates.swap(i - 1, i);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn ring_lattice_without_rewiring() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let g = watts_strogatz(10, 4, 0.0, &mut rng);
        // beta = 0 keeps the pure ring: every node has degree k
        for i in 0..10 {
            assert_eq!(g.degree(i), 4.0, "node {}", i);
        }
    }

    #[test]
    fn preferential_attachment_edge_count() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let g = barabasi_albert(30, 2, &mut rng);
        // m edges per arriving node, n - m arrivals
        assert_eq!(g.m(), 2 * (30 - 2));
    }

    #[test]
    fn near_tie_prefers_fewer_parameters() {
        let mut estimates = vec![
            GicResult { model: ModelKind::Ws, param: 0.1, gic: 1.0 },
            GicResult { model: ModelKind::Er, param: 0.3, gic: 1.0 + 1e-15 },
        ];
        break_near_ties(&mut estimates);
        assert_eq!(estimates[0].model, ModelKind::Er);
    }
}
