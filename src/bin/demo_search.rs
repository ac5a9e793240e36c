use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use specfit::estimator::LogitRegEstimator;
use specfit::model_selection::erdos_renyi;
use specfit::search::GraphModel;
use specfit::spectral::spectrum;

fn main() {
    println!("=== Spectrum-Guided Search Demo ===\n");

    let mut rng = ChaCha20Rng::seed_from_u64(42);
    let n = 20;
    let target = erdos_renyi(n, 0.3, &mut rng);
    println!(
        "Target: {}-node ER graph at p = 0.3 ({} edges)",
        n,
        target.m()
    );

    let estimator = LogitRegEstimator::new(&target, 1);
    let fitted = estimator.fit(1.0, 0.0).expect("fit failed");
    println!(
        "Fitted sigma = {:.4} (p-value {:.4})",
        fitted.sigma, fitted.p_value
    );

    let model = GraphModel::new(n, 1, fitted.sigma);
    let result = model
        .populate_edges_spectrum(50, 500, 50, &target, &mut rng)
        .expect("search failed");

    println!("\nIterations executed: {}", result.divergences.len());
    println!("Best iteration:      {}", result.best_iteration);
    println!(
        "Best divergence:     {:.6}",
        result.divergences[result.best_iteration]
    );

    let target_spectrum = spectrum(&target).expect("target spectrum");
    println!("\nTarget spectrum extremes: [{:.4}, {:.4}]",
        target_spectrum[0],
        target_spectrum[target_spectrum.len() - 1]
    );
    println!(
        "Best spectrum extremes:   [{:.4}, {:.4}]",
        result.best_spectrum[0],
        result.best_spectrum[result.best_spectrum.len() - 1]
    );

    // Coarse view of the divergence trajectory
    println!("\nDivergence every 50 iterations:");
    for (t, div) in result.divergences.iter().enumerate().step_by(50) {
        println!("  t = {:>4}: {:.6}", t, div);
    }
}
