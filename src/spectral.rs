// spectral.rs - Normalized-Laplacian spectra and divergence between spectral densities

use crate::error::SpectralError;
use crate::graph::Graph;
use nalgebra::DMatrix;
use num_complex::Complex64;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Number of grid points used when comparing two spectral densities.
const GRID_POINTS: usize = 256;

/// Floor added to densities before taking ratios in the KL divergence.
const DENSITY_FLOOR: f64 = 1e-12;

/// Distance notion between two spectral densities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergenceKind {
    /// Kullback-Leibler divergence of the first density relative to the second.
    Kl,
    /// L1 distance between the densities.
    L1,
    /// L2 distance between the densities.
    L2,
}

impl DivergenceKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Kl => "KL",
            Self::L1 => "L1",
            Self::L2 => "L2",
        }
    }
}

impl fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DivergenceKind {
    type Err = SpectralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "KL" => Ok(Self::Kl),
            "L1" => Ok(Self::L1),
            "L2" => Ok(Self::L2),
            _ => Err(SpectralError::UnsupportedMetric { name: s.to_string() }),
        }
    }
}

/// Eigenvalues of the normalized Laplacian `I - D^{-1/2} A D^{-1/2}`,
/// sorted ascending. Only the real component of each eigenvalue is kept;
/// a symmetric adjacency yields a real spectrum and any imaginary residue
/// is numerical noise from the general eigensolver.
///
/// Fails with `DegenerateGraph` if any node is isolated, since `D^{-1/2}`
/// is then undefined.
pub fn spectrum(graph: &Graph) -> Result<Vec<f64>, SpectralError> {
    let n = graph.n();
    let degrees = graph.degrees();
    if let Some(node) = degrees.iter().position(|&d| d == 0.0) {
        return Err(SpectralError::DegenerateGraph { node });
    }

    let inv_sqrt: Vec<f64> = degrees.iter().map(|&d| 1.0 / d.sqrt()).collect();
    let adj = graph.adjacency();
    let mut lap = DMatrix::identity(n, n);
    for i in 0..n {
        for j in 0..n {
            if i != j {
                lap[(i, j)] = -inv_sqrt[i] * adj[(i, j)] * inv_sqrt[j];
            }
        }
    }

    let eigen = lap.complex_eigenvalues();
    let mut values: Vec<f64> = eigen.iter().map(|l: &Complex64| l.re).collect();
    values.sort_by(f64::total_cmp);
    Ok(values)
}

/// Divergence between two eigenvalue samples, computed on kernel density
/// estimates over a grid spanning both samples' ranges.
pub fn divergence(a: &[f64], b: &[f64], kind: DivergenceKind) -> f64 {
    let lo = a
        .iter()
        .chain(b.iter())
        .copied()
        .fold(f64::INFINITY, f64::min);
    let hi = a
        .iter()
        .chain(b.iter())
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    // Degenerate span: widen so the grid step stays positive.
    let (lo, hi) = if hi - lo < 1e-9 { (lo - 0.5, hi + 0.5) } else { (lo, hi) };

    let dx = (hi - lo) / (GRID_POINTS - 1) as f64;
    let grid: Vec<f64> = (0..GRID_POINTS).map(|k| lo + k as f64 * dx).collect();

    let p = normalized_density(a, &grid, dx);
    let q = normalized_density(b, &grid, dx);

    match kind {
        DivergenceKind::Kl => p
            .iter()
            .zip(q.iter())
            .map(|(&pi, &qi)| {
                if pi > 0.0 {
                    pi * ((pi + DENSITY_FLOOR) / (qi + DENSITY_FLOOR)).ln() * dx
                } else {
                    0.0
                }
            })
            .sum(),
        DivergenceKind::L1 => p
            .iter()
            .zip(q.iter())
            .map(|(&pi, &qi)| (pi - qi).abs() * dx)
            .sum(),
        DivergenceKind::L2 => p
            .iter()
            .zip(q.iter())
            .map(|(&pi, &qi)| (pi - qi).powi(2) * dx)
            .sum::<f64>()
            .sqrt(),
    }
}

/// Gaussian KDE on `grid`, renormalized to integrate to one.
fn normalized_density(sample: &[f64], grid: &[f64], dx: f64) -> Vec<f64> {
    let mut density = gaussian_kde(sample, grid);
    let total: f64 = density.iter().sum::<f64>() * dx;
    if total > 0.0 {
        for v in &mut density {
            *v /= total;
        }
    }
    density
}

/// Gaussian kernel density estimate with Silverman's rule-of-thumb
/// bandwidth, floored so near-constant samples still get a finite kernel.
fn gaussian_kde(sample: &[f64], grid: &[f64]) -> Vec<f64> {
    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let var = sample.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    let bandwidth = (1.06 * var.sqrt() * n.powf(-0.2)).max(1e-3);

    let norm = 1.0 / (n * bandwidth * (2.0 * PI).sqrt());
    grid.iter()
        .map(|&x| {
            sample
                .iter()
                .map(|&xi| {
                    let u = (x - xi) / bandwidth;
                    (-0.5 * u * u).exp()
                })
                .sum::<f64>()
                * norm
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kde_integrates_to_one() {
        let sample = [0.0, 0.3, 0.7, 1.2, 1.9];
        let dx = 3.0 / 255.0;
        let grid: Vec<f64> = (0..256).map(|k| -0.5 + k as f64 * dx).collect();
        let density = normalized_density(&sample, &grid, dx);
        let total: f64 = density.iter().sum::<f64>() * dx;
        assert!((total - 1.0).abs() < 1e-9, "total mass {}", total);
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("kl".parse::<DivergenceKind>().ok(), Some(DivergenceKind::Kl));
        assert_eq!("L2".parse::<DivergenceKind>().ok(), Some(DivergenceKind::L2));
        assert!(matches!(
            "wasserstein".parse::<DivergenceKind>(),
            Err(SpectralError::UnsupportedMetric { .. })
        ));
    }
}
